use hifitime::Epoch;

use crate::constants::{Kilometer, Radian, CK2, DPI, EARTH_RADIUS_KM, KE};
use crate::satprop_errors::SatpropError;

/// Mean orbital elements as extracted from a two-line element set, already
/// converted to the units of the propagation theory.
///
/// Units:
/// * `epoch`: absolute instant of the element set
/// * `eccentricity`: unitless, `0 ≤ e < 1`
/// * `inclination`: radians
/// * `ascending_node_longitude`: radians
/// * `periapsis_argument`: radians
/// * `mean_anomaly`: radians
/// * `mean_motion`: radians per minute (Kozai convention)
/// * `drag_term`: B* in inverse Earth radii
#[derive(Debug, Clone, PartialEq)]
pub struct RawElements {
    pub epoch: Epoch,
    pub eccentricity: f64,
    pub inclination: Radian,
    pub ascending_node_longitude: Radian,
    pub periapsis_argument: Radian,
    pub mean_anomaly: Radian,
    pub mean_motion: f64,
    pub drag_term: f64,
}

/// Raw elements plus the quantities derived once at construction:
/// the Brouwer mean motion recovered from the Kozai value, the mean
/// semi-major axis, the perigee height and the orbital period.
///
/// Construction validates the physical range of the inputs; a successfully
/// built value guarantees `recovered_mean_motion > 0` and `0 ≤ e < 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalElements {
    pub raw: RawElements,
    /// Mean semi-major axis, Earth radii
    pub semi_major_axis: f64,
    /// Brouwer mean motion, rad/min
    pub recovered_mean_motion: f64,
    /// Perigee height above the equatorial radius, km
    pub periapsis_km: Kilometer,
    /// Orbital period, minutes
    pub period_min: f64,
}

impl OrbitalElements {
    /// Derive the mean semi-major axis and Brouwer mean motion from the raw
    /// Kozai elements.
    ///
    /// The recovery is the classical two-pass evaluation: a first guess
    /// `a1 = (KE/n₀)^⅔` is corrected by the J2 oblateness factor δ, the
    /// correction polynomial is re-evaluated at the corrected axis, and the
    /// mean motion is rescaled by the second δ.
    pub fn new(raw: RawElements) -> Result<Self, SatpropError> {
        if !(0.0..=0.999).contains(&raw.eccentricity) {
            return Err(SatpropError::InvalidElements(format!(
                "eccentricity {} outside [0, 0.999]",
                raw.eccentricity
            )));
        }
        if !(0.0..=std::f64::consts::PI).contains(&raw.inclination) {
            return Err(SatpropError::InvalidElements(format!(
                "inclination {} rad outside [0, π]",
                raw.inclination
            )));
        }
        if raw.mean_motion <= 0.0 {
            return Err(SatpropError::InvalidElements(format!(
                "mean motion {} rad/min is not positive",
                raw.mean_motion
            )));
        }

        let cosi = raw.inclination.cos();
        let x3thm1 = 3.0 * cosi * cosi - 1.0;
        let beta3 = (1.0 - raw.eccentricity * raw.eccentricity).powf(1.5);

        let a1 = (KE / raw.mean_motion).powf(2.0 / 3.0);
        let del1 = 1.5 * CK2 * x3thm1 / (beta3 * a1 * a1);
        let a0 = a1 * (1.0 - del1 * (1.0 / 3.0 + del1 * (1.0 + del1 * 134.0 / 81.0)));
        let del0 = 1.5 * CK2 * x3thm1 / (beta3 * a0 * a0);

        let recovered_mean_motion = raw.mean_motion / (1.0 + del0);
        let semi_major_axis = a0 / (1.0 - del0);
        let periapsis_km = (semi_major_axis * (1.0 - raw.eccentricity) - 1.0) * EARTH_RADIUS_KM;
        let period_min = DPI / recovered_mean_motion;

        Ok(OrbitalElements {
            raw,
            semi_major_axis,
            recovered_mean_motion,
            periapsis_km,
            period_min,
        })
    }
}

#[cfg(test)]
mod elements_test {
    use super::*;
    use approx::assert_relative_eq;
    use hifitime::{Epoch, TimeScale};

    fn iss_raw() -> RawElements {
        // ISS-class orbit: e ≈ 0.0007, i = 51.64°, n = 15.72 rev/day
        RawElements {
            epoch: Epoch::from_gregorian(2008, 9, 20, 12, 25, 40, 0, TimeScale::UTC),
            eccentricity: 0.0006703,
            inclination: 51.6416_f64.to_radians(),
            ascending_node_longitude: 247.4627_f64.to_radians(),
            periapsis_argument: 130.5360_f64.to_radians(),
            mean_anomaly: 325.0288_f64.to_radians(),
            mean_motion: 15.721_253_91 * DPI / 1440.0,
            drag_term: -0.11606e-4,
        }
    }

    #[test]
    fn test_kozai_recovery_low_inclination_band() {
        let elements = OrbitalElements::new(iss_raw()).unwrap();

        // Below the critical inclination the J2 correction is positive, so
        // the Brouwer mean motion is slightly smaller than the Kozai value.
        assert!(elements.recovered_mean_motion < elements.raw.mean_motion);
        assert!(elements.recovered_mean_motion > 0.999 * elements.raw.mean_motion);

        // ~91.6 min period, ~6 790 km semi-major axis, ~350 km perigee
        assert_relative_eq!(elements.period_min, 91.59, max_relative = 1e-3);
        assert!(elements.semi_major_axis * EARTH_RADIUS_KM > 6700.0);
        assert!(elements.semi_major_axis * EARTH_RADIUS_KM < 6900.0);
        assert!(elements.periapsis_km > 300.0 && elements.periapsis_km < 450.0);
    }

    #[test]
    fn test_period_is_consistent_with_recovered_motion() {
        let elements = OrbitalElements::new(iss_raw()).unwrap();
        assert_eq!(elements.period_min, DPI / elements.recovered_mean_motion);
    }

    #[test]
    fn test_rejects_out_of_range_eccentricity() {
        let mut raw = iss_raw();
        raw.eccentricity = 0.9995;
        assert!(matches!(
            OrbitalElements::new(raw),
            Err(SatpropError::InvalidElements(_))
        ));

        let mut raw = iss_raw();
        raw.eccentricity = -0.01;
        assert!(matches!(
            OrbitalElements::new(raw),
            Err(SatpropError::InvalidElements(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_inclination() {
        let mut raw = iss_raw();
        raw.inclination = -0.1;
        assert!(matches!(
            OrbitalElements::new(raw),
            Err(SatpropError::InvalidElements(_))
        ));

        let mut raw = iss_raw();
        raw.inclination = std::f64::consts::PI + 0.1;
        assert!(matches!(
            OrbitalElements::new(raw),
            Err(SatpropError::InvalidElements(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_mean_motion() {
        let mut raw = iss_raw();
        raw.mean_motion = 0.0;
        assert!(matches!(
            OrbitalElements::new(raw),
            Err(SatpropError::InvalidElements(_))
        ));
    }
}
