//! # Constants and type definitions for satprop
//!
//! This module centralizes the **gravity model**, **atmospheric fence**, and
//! **deep-space perturbation** constants used by the SGP4/SDP4 propagation
//! theory, plus the common type aliases shared across the crate.
//!
//! ## Overview
//!
//! - WGS-72 geopotential constants (the historical baseline of the theory)
//! - Atmospheric density fence parameters for the drag terms
//! - Lunar/solar mean-motion and resonance series constants
//! - Core type aliases used across the crate
//!
//! All lengths are expressed in Earth radii and all angular rates in
//! radians per minute unless a name says otherwise.

// -------------------------------------------------------------------------------------------------
// Geopotential model (WGS-72)
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Earth equatorial radius in kilometers (WGS-72)
pub const EARTH_RADIUS_KM: f64 = 6378.135;

/// Earth gravitational parameter in km³/s² (WGS-72)
pub const MU_KM3_S2: f64 = 398_600.8;

/// Square root of the gravitational parameter in Earth-radii^1.5 per minute,
/// i.e. `60 / sqrt(R³/μ)`. Mean motion n and semi-major axis a relate
/// through `n = KE / a^1.5`.
pub const KE: f64 = 0.074_366_916_133_173_42;

/// Half the second zonal harmonic J2: `CK2 = J2 / 2`
pub const CK2: f64 = 5.413_08e-4;

/// `-3/8 · J4`, the fourth zonal harmonic contribution
pub const CK4: f64 = 6.209_887_5e-7;

/// Third zonal harmonic J3 (unnormalized)
pub const J3: f64 = -2.538_81e-6;

/// `(q0 - s)⁴` atmospheric pressure term, in Earth radii⁴ (q0 = 120 km, s = 78 km)
pub const QOMS2T: f64 = 1.880_279_16e-9;

/// Density fence altitude parameter s, in Earth radii (78 km + 1 R⊕)
pub const S_FENCE: f64 = 1.012_229_28;

// -------------------------------------------------------------------------------------------------
// Deep-space lunar/solar series
// -------------------------------------------------------------------------------------------------

/// Solar mean motion seen from the orbit plane, rad/min
pub const ZNS: f64 = 1.194_59e-5;

/// Solar perturbation eccentricity factor
pub const ZES: f64 = 0.016_75;

/// Lunar mean motion seen from the orbit plane, rad/min
pub const ZNL: f64 = 1.583_521_8e-4;

/// Lunar perturbation eccentricity factor
pub const ZEL: f64 = 0.054_90;

/// Solar disturbing-function coefficient
pub const C1SS: f64 = 2.986_479_7e-6;

/// Lunar disturbing-function coefficient
pub const C1L: f64 = 4.796_806_5e-7;

/// Sine of the solar inclination on the ecliptic
pub const ZSINIS: f64 = 0.397_854_16;

/// Cosine of the solar inclination on the ecliptic
pub const ZCOSIS: f64 = 0.917_448_67;

/// Cosine of the solar argument of perigee seed
pub const ZCOSGS: f64 = 0.194_590_5;

/// Sine of the solar argument of perigee seed
pub const ZSINGS: f64 = -0.980_884_58;

// -------------------------------------------------------------------------------------------------
// Resonance geopotential coefficients
// -------------------------------------------------------------------------------------------------

/// 2,2 sectoral coefficient for the synchronous resonance
pub const Q22: f64 = 1.789_167_9e-6;

/// 3,1 sectoral coefficient for the synchronous resonance
pub const Q31: f64 = 2.146_074_8e-6;

/// 3,3 sectoral coefficient for the synchronous resonance
pub const Q33: f64 = 2.212_301_5e-7;

/// Root coefficients of the 12-hour geopotential resonance terms
pub const ROOT22: f64 = 1.789_167_9e-6;
pub const ROOT32: f64 = 3.739_379_2e-7;
pub const ROOT44: f64 = 7.363_695_3e-9;
pub const ROOT52: f64 = 1.142_863_9e-7;
pub const ROOT54: f64 = 2.176_580_3e-9;

/// Earth rotation rate in radians per minute
pub const RPTIM: f64 = 4.375_269_088_011_299_66e-3;

/// Fixed phase offsets of the synchronous-resonance sinusoids, radians
pub const FASX2: f64 = 0.131_309_08;
pub const FASX4: f64 = 2.884_319_8;
pub const FASX6: f64 = 0.374_480_87;

/// Fixed phase offsets of the 12-hour resonance sinusoids, radians
pub const G22: f64 = 5.768_639_6;
pub const G32: f64 = 0.952_408_98;
pub const G44: f64 = 1.801_499_8;
pub const G52: f64 = 1.050_833_0;
pub const G54: f64 = 4.410_889_8;

/// Resonance integrator step, minutes
pub const STEP: f64 = 720.0;

/// Half the squared integrator step (`STEP²/2`), minutes²
pub const STEP2: f64 = 259_200.0;

// -------------------------------------------------------------------------------------------------
// Branch selection thresholds
// -------------------------------------------------------------------------------------------------

/// Orbital period separating the near-earth and deep-space theories, minutes
pub const DEEP_SPACE_PERIOD_MIN: f64 = 225.0;

/// Perigee height under which the truncated near-earth drag model applies, km
pub const SIMPLE_MODEL_PERIGEE_KM: f64 = 220.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Time offset from the element-set epoch, in minutes (may be negative)
pub type MinutesSinceEpoch = f64;
