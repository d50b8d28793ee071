//! Grid-based swell energy field.
//!
//! The `EnergyField` is a width x height grid of signed surface heights. Row 0 is
//! the horizon, the last row is the shore. Each non-zero update:
//!   1. Flushes the per-row swell accumulator into the grid
//!   2. Advects heights shoreward at the local shallow-water speed `sqrt(g * depth)`
//!   3. Applies Green's-law shoaling (`amplitude ~ depth^-1/4`)
//!   4. Damps by `coefficient * (1 - depth/deep)^exponent * dt`
//!   5. Spreads a little energy sideways (lateral diffusion)
//!
//! Breaking waves drain energy through `drain_energy_at`, which reports how much
//! was actually removed so callers never invent energy downstream.

pub mod field;
pub mod propagation;


pub use field::{create_energy_field, EnergyField};
pub use propagation::{inject_swells, update_energy_field};
