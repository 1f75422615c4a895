/*!
Session layer for the simulation engine.

Holds the per-run artifact record with its stage machine, and the keyed
store that isolates concurrent independent runs.
*/

pub mod state;
pub mod store;

// Re-export commonly used items
pub use state::{SessionState, Stage};
pub use store::{SessionId, SessionStore};
