use crate::constants::{CK2, CK4, EARTH_RADIUS_KM, J3, QOMS2T, S_FENCE};
use crate::elements::OrbitalElements;

/// Geometry-dependent constants shared by the near-earth and deep-space
/// branches, derived once from the orbital elements at initialization.
///
/// The public fields are the inclination/eccentricity functions consumed by
/// the propagation paths and the final-state routine; the crate-private
/// fields are drag-model intermediates reused by the branch initializers.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonConstants {
    pub cosio: f64,
    pub sinio: f64,
    /// `3cos²i − 1`
    pub x3thm1: f64,
    /// `1 − cos²i`
    pub x1mth2: f64,
    /// `7cos²i − 1`
    pub x7thm1: f64,
    /// Drag profile shape parameter `a·e / (a − s4)`
    pub eta: f64,
    /// First-order drag coefficient `B*·C2`
    pub c1: f64,
    /// Eccentricity decay coefficient
    pub c4: f64,
    /// Secular rate of the mean anomaly, rad/min
    pub xmdot: f64,
    /// Secular rate of the argument of perigee, rad/min
    pub omgdot: f64,
    /// Secular rate of the ascending node, rad/min
    pub xnodot: f64,
    /// Quadratic node drift coefficient
    pub xnodcf: f64,
    /// `1.5·C1`, the t² coefficient of the mean-longitude integral
    pub t2cof: f64,
    /// Long-period mean-longitude coefficient (J3 term)
    pub xlcof: f64,
    /// Long-period `ayn` coefficient (J3 term)
    pub aycof: f64,
    /// `-J3 / CK2`
    pub a3ovk2: f64,

    // Drag-model intermediates shared with the branch initializers
    pub(crate) s4: f64,
    pub(crate) tsi: f64,
    pub(crate) etasq: f64,
    pub(crate) eeta: f64,
    pub(crate) coef: f64,
    pub(crate) coef1: f64,
    pub(crate) beta02: f64,
}

impl CommonConstants {
    /// Derive the shared constants from validated elements.
    ///
    /// Perigees below 156 km re-anchor the atmospheric fence parameter `s4`
    /// (floored 20 km above the 98 km line) and the pressure term, which
    /// feeds every drag coefficient downstream.
    pub fn new(elements: &OrbitalElements) -> Self {
        let e0 = elements.raw.eccentricity;
        let a0dp = elements.semi_major_axis;
        let xn0dp = elements.recovered_mean_motion;

        let cosio = elements.raw.inclination.cos();
        let sinio = elements.raw.inclination.sin();
        let theta2 = cosio * cosio;
        let theta4 = theta2 * theta2;
        let x3thm1 = 3.0 * theta2 - 1.0;
        let x1mth2 = 1.0 - theta2;
        let x7thm1 = 7.0 * theta2 - 1.0;

        let e0sq = e0 * e0;
        let beta02 = 1.0 - e0sq;
        let beta0 = beta02.sqrt();

        // Atmospheric fence, re-anchored for low perigees
        let mut s4 = S_FENCE;
        let mut qoms24 = QOMS2T;
        if elements.periapsis_km < 156.0 {
            s4 = if elements.periapsis_km < 98.0 {
                20.0
            } else {
                elements.periapsis_km - 78.0
            };
            qoms24 = ((120.0 - s4) / EARTH_RADIUS_KM).powi(4);
            s4 = s4 / EARTH_RADIUS_KM + 1.0;
        }

        let pinvsq = 1.0 / (a0dp * a0dp * beta02 * beta02);
        let tsi = 1.0 / (a0dp - s4);
        let eta = a0dp * e0 * tsi;
        let etasq = eta * eta;
        let eeta = e0 * eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qoms24 * tsi.powi(4);
        let coef1 = coef / psisq.powf(3.5);

        let c2 = coef1
            * xn0dp
            * (a0dp * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.75 * CK2 * tsi / psisq * x3thm1 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let c1 = elements.raw.drag_term * c2;

        let a3ovk2 = -J3 / CK2;

        let cos2omg = (2.0 * elements.raw.periapsis_argument).cos();
        let c4 = 2.0
            * xn0dp
            * coef1
            * a0dp
            * beta02
            * (eta * (2.0 + 0.5 * etasq) + e0 * (0.5 + 2.0 * etasq)
                - 2.0 * CK2 * tsi / (a0dp * psisq)
                    * (-3.0 * x3thm1 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75 * x1mth2 * (2.0 * etasq - eeta * (1.0 + etasq)) * cos2omg));

        let temp1 = 3.0 * CK2 * pinvsq * xn0dp;
        let temp2 = temp1 * CK2 * pinvsq;
        let temp3 = 1.25 * CK4 * pinvsq * pinvsq * xn0dp;

        let xmdot = xn0dp
            + 0.5 * temp1 * beta0 * x3thm1
            + 0.0625 * temp2 * beta0 * (13.0 - 78.0 * theta2 + 137.0 * theta4);
        let x1m5th = 1.0 - 5.0 * theta2;
        let omgdot = -0.5 * temp1 * x1m5th
            + 0.0625 * temp2 * (7.0 - 114.0 * theta2 + 395.0 * theta4)
            + temp3 * (3.0 - 36.0 * theta2 + 49.0 * theta4);
        let xhdot1 = -temp1 * cosio;
        let xnodot = xhdot1
            + (0.5 * temp2 * (4.0 - 19.0 * theta2) + 2.0 * temp3 * (3.0 - 7.0 * theta2)) * cosio;
        let xnodcf = 3.5 * beta02 * xhdot1 * c1;
        let t2cof = 1.5 * c1;

        // Guard against the 1 + cos(i) → 0 singularity at retrograde-polar
        let xlcof = if (1.0 + cosio).abs() > 1.5e-12 {
            0.125 * a3ovk2 * sinio * (3.0 + 5.0 * cosio) / (1.0 + cosio)
        } else {
            0.125 * a3ovk2 * sinio * (3.0 + 5.0 * cosio) / 1.5e-12
        };
        let aycof = 0.25 * a3ovk2 * sinio;

        CommonConstants {
            cosio,
            sinio,
            x3thm1,
            x1mth2,
            x7thm1,
            eta,
            c1,
            c4,
            xmdot,
            omgdot,
            xnodot,
            xnodcf,
            t2cof,
            xlcof,
            aycof,
            a3ovk2,
            s4,
            tsi,
            etasq,
            eeta,
            coef,
            coef1,
            beta02,
        }
    }
}
