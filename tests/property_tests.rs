use qkd_sim::core::sift::Sifter;
use qkd_sim::{
    ProtocolApi, RandomSource, RunChannelRequest, SeededRandomSource, SessionId, SimConfig,
    StartRequest,
};

use proptest::prelude::*;

// Strategy for requested key lengths within the default maximum
fn key_lengths() -> impl Strategy<Value = i64> {
    1..=64i64
}

// Strategy for generator seeds
fn seeds() -> impl Strategy<Value = u64> {
    any::<u64>()
}

fn seeded_api(seed: u64) -> ProtocolApi {
    ProtocolApi::with_random_source(SimConfig::default(), Box::new(SeededRandomSource::new(seed)))
        .unwrap()
}

fn symbols(encoded: &str) -> Vec<&str> {
    encoded.split(' ').collect()
}

proptest! {
    #[test]
    fn prop_start_oversamples_into_the_two_symbol_domains(
        key_length in key_lengths(),
        seed in seeds(),
    ) {
        let api = seeded_api(seed);
        let id = SessionId::generate();
        let start = api.start(&id, &StartRequest { key_length }).unwrap();

        prop_assert!(start.bits_length >= start.key_length);
        prop_assert_eq!(start.bits_length, start.key_length * 4);

        let bits = symbols(&start.alice_bits);
        let bases = symbols(&start.alice_bases);
        prop_assert_eq!(bits.len(), start.bits_length);
        prop_assert_eq!(bases.len(), start.bits_length);
        prop_assert!(bits.iter().all(|s| *s == "0" || *s == "1"));
        prop_assert!(bases.iter().all(|s| *s == "+" || *s == "x"));
    }

    #[test]
    fn prop_quiet_channel_has_exact_matched_basis_fidelity(
        key_length in key_lengths(),
        seed in seeds(),
    ) {
        let api = seeded_api(seed);
        let id = SessionId::generate();
        let start = api.start(&id, &StartRequest { key_length }).unwrap();
        let channel = api.run_channel(&id, &RunChannelRequest { eavesdrop: false }).unwrap();
        let sift = api.sift(&id).unwrap();

        let alice_bits = symbols(&start.alice_bits);
        let bob_bits = symbols(&channel.bob_bits);
        for row in &sift.comparisons {
            if row.is_match {
                prop_assert_eq!(alice_bits[row.qubit_index], bob_bits[row.qubit_index]);
            }
        }

        let results = api.results(&id).unwrap();
        prop_assert_eq!(results.qber.as_str(), "0.00");
        prop_assert_eq!(results.is_secure, sift.match_count >= start.key_length);
    }

    #[test]
    fn prop_qber_is_always_a_valid_percentage(
        key_length in key_lengths(),
        seed in seeds(),
        eavesdrop in any::<bool>(),
    ) {
        let api = seeded_api(seed);
        let id = SessionId::generate();
        api.start(&id, &StartRequest { key_length }).unwrap();
        api.run_channel(&id, &RunChannelRequest { eavesdrop }).unwrap();
        api.sift(&id).unwrap();
        let results = api.results(&id).unwrap();

        let qber: f64 = results.qber.parse().unwrap();
        prop_assert!((0.0..=100.0).contains(&qber));
        if results.is_secure {
            prop_assert!(results.final_key_alice.is_some());
        } else {
            prop_assert!(results.final_key_alice.is_none());
        }
    }

    #[test]
    fn prop_sifting_is_deterministic_and_aligned(
        len in 1usize..256,
        seed in seeds(),
    ) {
        let mut random = SeededRandomSource::new(seed);
        let alice_bits = random.bits(len);
        let alice_bases = random.bases(len);
        let bob_bases = random.bases(len);
        let bob_bits = random.bits(len);

        let first = Sifter::sift(&alice_bases, &bob_bases, &alice_bits, &bob_bits).unwrap();
        let second = Sifter::sift(&alice_bases, &bob_bases, &alice_bits, &bob_bits).unwrap();
        prop_assert_eq!(&first, &second);

        prop_assert_eq!(first.match_count, first.sifted_indices.len());
        for (k, &i) in first.sifted_indices.iter().enumerate() {
            prop_assert!(i < len);
            if k > 0 {
                prop_assert!(first.sifted_indices[k - 1] < i);
            }
            // Both sifted keys refer to the same raw position
            prop_assert_eq!(first.sifted_alice_key[k], alice_bits[i]);
            prop_assert_eq!(first.sifted_bob_key[k], bob_bits[i]);
            prop_assert_eq!(alice_bases[i], bob_bases[i]);
        }
    }

    #[test]
    fn prop_out_of_order_steps_never_mutate(
        key_length in key_lengths(),
        seed in seeds(),
    ) {
        let api = seeded_api(seed);
        let id = SessionId::generate();

        prop_assert!(api.sift(&id).is_err());
        prop_assert!(api.results(&id).is_err());

        api.start(&id, &StartRequest { key_length }).unwrap();
        prop_assert!(api.results(&id).is_err());
        prop_assert!(api.sift(&id).is_err());

        // The session is still at the start of the run and can proceed
        api.run_channel(&id, &RunChannelRequest { eavesdrop: false }).unwrap();
        api.sift(&id).unwrap();
        api.results(&id).unwrap();
    }
}

#[test]
fn test_mismatched_basis_outcomes_are_statistically_independent() {
    // Over many raw positions, Bob's bit on a basis mismatch agrees with
    // Alice's roughly half the time.
    let api = seeded_api(20_26);
    let id = SessionId::generate();
    let start = api.start(&id, &StartRequest { key_length: 256 }).unwrap();
    let channel = api
        .run_channel(&id, &RunChannelRequest { eavesdrop: false })
        .unwrap();
    let sift = api.sift(&id).unwrap();

    let alice_bits = symbols(&start.alice_bits);
    let bob_bits = symbols(&channel.bob_bits);

    let (mut mismatched, mut agreements) = (0usize, 0usize);
    for row in &sift.comparisons {
        if !row.is_match {
            mismatched += 1;
            if alice_bits[row.qubit_index] == bob_bits[row.qubit_index] {
                agreements += 1;
            }
        }
    }

    assert!(mismatched > 300, "expected ~512 mismatched positions");
    let ratio = agreements as f64 / mismatched as f64;
    assert!((0.4..=0.6).contains(&ratio), "ratio = {ratio}");
}
