use hifitime::Epoch;

use crate::constants::DPI;

/// Julian date of 1950 January 0.0 (i.e. 1949-12-31 00:00 UT), the epoch
/// origin used by the deep-space lunar/solar theory.
pub const JD_1950: f64 = 2_433_281.5;

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians for a given
/// UT1 Julian date.
///
/// This is the IAU 1982 polynomial expression evaluated directly at the
/// requested instant (not split at 0h UT1), which is the convention the
/// SGP4/SDP4 theory was fitted against.
///
/// # Arguments
/// * `jd_ut1` - Julian date, UT1 time scale
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
pub fn gstime(jd_ut1: f64) -> f64 {
    let tut1 = (jd_ut1 - 2_451_545.0) / 36_525.0;

    // Seconds of sidereal time, cubic in Julian centuries since J2000
    let mut temp = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093_104 * tut1 * tut1
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * tut1
        + 67_310.548_41;

    // 360°/86400 s = 1/240 °/s, then degrees to radians
    temp = (temp * std::f64::consts::PI / 180.0 / 240.0) % DPI;
    if temp < 0.0 {
        temp += DPI;
    }
    temp
}

/// Julian date (UTC) of an epoch.
///
/// The propagation theory treats the element-set epoch as UT1; the sub-second
/// difference between UTC and UT1 is far below the fidelity of the model.
pub fn julian_date(epoch: &Epoch) -> f64 {
    epoch.to_jde_utc_days()
}

/// Days elapsed since 1950 January 0.0 for an epoch, the time argument of the
/// lunar/solar ephemeris series.
pub fn days_since_1950(epoch: &Epoch) -> f64 {
    julian_date(epoch) - JD_1950
}

#[cfg(test)]
mod time_test {
    use super::*;
    use approx::assert_relative_eq;
    use hifitime::{Epoch, TimeScale};

    #[test]
    fn test_gstime_j2000() {
        // GMST at J2000.0 (2000-01-01 12:00 UT1) is 280.46062°
        let gst = gstime(2_451_545.0);
        assert_relative_eq!(gst, 4.894_961_212_823_059, max_relative = 1e-12);
    }

    #[test]
    fn test_gstime_range() {
        for jd in [2_433_281.5, 2_451_723.28495062, 2_460_000.123] {
            let gst = gstime(jd);
            assert!((0.0..DPI).contains(&gst), "gstime {gst} out of [0, 2π)");
        }
    }

    #[test]
    fn test_days_since_1950() {
        let epoch = Epoch::from_gregorian(1949, 12, 31, 0, 0, 0, 0, TimeScale::UTC);
        assert_eq!(days_since_1950(&epoch), 0.0);

        let epoch = Epoch::from_gregorian(1950, 1, 1, 12, 0, 0, 0, TimeScale::UTC);
        assert_eq!(days_since_1950(&epoch), 1.5);
    }
}
