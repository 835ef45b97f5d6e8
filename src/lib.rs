//! # satprop
//!
//! SGP4/SDP4 satellite propagation core: from a validated set of mean
//! orbital elements, compute Earth-centered-inertial position and velocity
//! at any offset from the element-set epoch. Near-earth orbits (period
//! below 225 minutes) use the secular drag/gravity model; deep-space orbits
//! add lunar/solar perturbations and, when commensurate with Earth's
//! rotation, numerically integrated resonance terms.

pub mod common;
pub mod constants;
pub mod deep_space;
pub mod elements;
pub mod near_earth;
pub mod propagator;
pub mod satprop_errors;
pub mod time;

pub use elements::{OrbitalElements, RawElements};
pub use propagator::{Eci, PropagationMode, Propagator};
pub use satprop_errors::SatpropError;
