/*!
Core value types for the BB84 simulation.

A qubit is never modeled as a physical object: the sender's choice is the
pair (bit, basis), and the receiver's outcome is computed from that pair by
the channel simulator.
*/

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single classical bit carried by a simulated qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bit {
    /// Binary 0
    Zero,
    /// Binary 1
    One,
}

impl Bit {
    /// Whether the two bits disagree. Used for QBER counting.
    pub fn differs(self, other: Bit) -> bool {
        self != other
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        if value { Bit::One } else { Bit::Zero }
    }
}

impl From<Bit> for u8 {
    fn from(bit: Bit) -> Self {
        match bit {
            Bit::Zero => 0,
            Bit::One => 1,
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bit::Zero => write!(f, "0"),
            Bit::One => write!(f, "1"),
        }
    }
}

/// Polarization measurement basis.
///
/// The two conjugate settings of BB84. Rendered with the conventional
/// polarization symbols: `+` for rectilinear, `x` for diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// Rectilinear (0°/90°) basis
    Rectilinear,
    /// Diagonal (45°/135°) basis
    Diagonal,
}

impl From<bool> for Basis {
    fn from(value: bool) -> Self {
        if value {
            Basis::Diagonal
        } else {
            Basis::Rectilinear
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Rectilinear => write!(f, "+"),
            Basis::Diagonal => write!(f, "x"),
        }
    }
}

/// Render a sequence as the space-separated symbol string the dashboard
/// displays (e.g. `"0 1 1 0"` or `"+ x + +"`).
pub fn encode_sequence<T: fmt::Display>(seq: &[T]) -> String {
    let symbols: Vec<String> = seq.iter().map(ToString::to_string).collect();
    symbols.join(" ")
}
