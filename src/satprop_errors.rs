use thiserror::Error;

/// Error kinds of the propagation core.
///
/// All variants are terminal for the call that produced them; a failed
/// `propagate` leaves the propagator (including the resonance integrator
/// checkpoint) exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SatpropError {
    /// Eccentricity or inclination outside the physically valid range at
    /// element construction time.
    #[error("invalid orbital elements: {0}")]
    InvalidElements(String),

    /// The short-period state left the elliptical domain (`e² ≥ 1`) or the
    /// semi-latus rectum went negative.
    #[error("Kepler solution diverged: {0}")]
    KeplerDivergence(String),

    /// The instantaneous mean motion dropped to zero or below during the
    /// deep-space secular update.
    #[error("mean motion {0} rad/min is not positive")]
    MeanMotionNonPositive(f64),

    /// The propagated state fell inside the Earth, or drag consumed the
    /// whole eccentricity. This is the expected terminal condition for stale
    /// element sets propagated far past epoch, not a programming error.
    #[error("orbit has decayed: {0}")]
    OrbitDecayed(String),
}
