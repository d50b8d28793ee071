//! Set/lull timing state machine.
//!
//! Two states: `Lull` (low-energy background waves) and `Set` (a cluster of
//! 4-8 larger waves following a build-peak-fade envelope). The state stores only
//! absolute timestamps and the target durations chosen at transition or spawn
//! time. Every countdown is derived on read as `game_time - timestamp`, which
//! keeps save/restore and suspend/resume correct without fix-ups.
//!
//! `update` is pure apart from the injected random source:
//!   1. LULL -> SET once the planned lull length has elapsed
//!   2. SET -> LULL once every planned set wave spawned, or the set time cap hit
//!   3. Independently, spawn a wave when the planned wave spacing has elapsed

pub mod machine;
pub mod persistence;
pub mod state;

pub use machine::{set_envelope, update, SetLullOutcome};
pub use persistence::{set_lull_from_json, set_lull_to_json, PersistedSetLullState};
pub use state::{Countdown, SetLullState, SetState};
