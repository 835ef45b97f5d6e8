use crate::common::CommonConstants;
use crate::constants::{MinutesSinceEpoch, SIMPLE_MODEL_PERIGEE_KM};
use crate::elements::OrbitalElements;
use crate::propagator::MeanState;
use crate::satprop_errors::SatpropError;

/// Secular/drag correction coefficients of the near-earth branch
/// (orbital period below 225 minutes).
///
/// When the perigee height is below 220 km the higher-order drag terms are
/// truncated (`simple_model`), matching the reference theory.
#[derive(Debug, Clone, PartialEq)]
pub struct NearEarthConstants {
    pub c5: f64,
    pub omgcof: f64,
    pub xmcof: f64,
    /// `(1 + η·cos M₀)³`, the epoch value of the drag mean-anomaly kernel
    pub delmo: f64,
    pub sinmo: f64,
    pub d2: f64,
    pub d3: f64,
    pub d4: f64,
    pub t3cof: f64,
    pub t4cof: f64,
    pub t5cof: f64,
    pub simple_model: bool,
}

impl NearEarthConstants {
    pub fn new(elements: &OrbitalElements, common: &CommonConstants) -> Self {
        let e0 = elements.raw.eccentricity;
        let a0dp = elements.semi_major_axis;
        let xn0dp = elements.recovered_mean_motion;
        let bstar = elements.raw.drag_term;

        let c5 = 2.0
            * common.coef1
            * a0dp
            * common.beta02
            * (1.0 + 2.75 * (common.etasq + common.eeta) + common.eeta * common.etasq);

        // The J3 drag couplings degenerate for near-circular orbits
        let (c3, xmcof) = if e0 > 1.0e-4 {
            (
                common.coef * common.tsi * common.a3ovk2 * xn0dp * common.sinio / e0,
                -(2.0 / 3.0) * common.coef * bstar / common.eeta,
            )
        } else {
            (0.0, 0.0)
        };
        let omgcof = bstar * c3 * elements.raw.periapsis_argument.cos();

        let delmo_root = 1.0 + common.eta * elements.raw.mean_anomaly.cos();
        let delmo = delmo_root * delmo_root * delmo_root;
        let sinmo = elements.raw.mean_anomaly.sin();

        let simple_model = elements.periapsis_km < SIMPLE_MODEL_PERIGEE_KM;

        let (d2, d3, d4, t3cof, t4cof, t5cof) = if simple_model {
            (0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
        } else {
            let c1sq = common.c1 * common.c1;
            let d2 = 4.0 * a0dp * common.tsi * c1sq;
            let temp = d2 * common.tsi * common.c1 / 3.0;
            let d3 = (17.0 * a0dp + common.s4) * temp;
            let d4 = 0.5 * temp * a0dp * common.tsi * (221.0 * a0dp + 31.0 * common.s4) * common.c1;
            let t3cof = d2 + 2.0 * c1sq;
            let t4cof = 0.25 * (3.0 * d3 + common.c1 * (12.0 * d2 + 10.0 * c1sq));
            let t5cof = 0.2
                * (3.0 * d4
                    + 12.0 * common.c1 * d3
                    + 6.0 * d2 * d2
                    + 15.0 * c1sq * (2.0 * d2 + c1sq));
            (d2, d3, d4, t3cof, t4cof, t5cof)
        };

        NearEarthConstants {
            c5,
            omgcof,
            xmcof,
            delmo,
            sinmo,
            d2,
            d3,
            d4,
            t3cof,
            t4cof,
            t5cof,
            simple_model,
        }
    }

    /// Apply the secular gravity and drag updates for `tsince` minutes past
    /// epoch, producing the mean state handed to the final-state routine.
    pub(crate) fn secular_state(
        &self,
        elements: &OrbitalElements,
        common: &CommonConstants,
        tsince: MinutesSinceEpoch,
    ) -> Result<MeanState, SatpropError> {
        let raw = &elements.raw;

        let xmdf = raw.mean_anomaly + common.xmdot * tsince;
        let omgadf = raw.periapsis_argument + common.omgdot * tsince;
        let xnoddf = raw.ascending_node_longitude + common.xnodot * tsince;
        let tsq = tsince * tsince;
        let xnode = xnoddf + common.xnodcf * tsq;

        let mut tempa = 1.0 - common.c1 * tsince;
        let mut tempe = raw.drag_term * common.c4 * tsince;
        let mut templ = common.t2cof * tsq;
        let mut omega = omgadf;
        let mut xmp = xmdf;

        if !self.simple_model {
            let delomg = self.omgcof * tsince;
            let delm_root = 1.0 + common.eta * xmdf.cos();
            let delm = self.xmcof * (delm_root * delm_root * delm_root - self.delmo);
            let temp = delomg + delm;
            xmp = xmdf + temp;
            omega = omgadf - temp;
            let tcube = tsq * tsince;
            let tfour = tcube * tsince;
            tempa -= self.d2 * tsq + self.d3 * tcube + self.d4 * tfour;
            tempe += raw.drag_term * self.c5 * (xmp.sin() - self.sinmo);
            templ += self.t3cof * tcube + tfour * (self.t4cof + tsince * self.t5cof);
        }

        let a = elements.semi_major_axis * tempa * tempa;
        let mut e = raw.eccentricity - tempe;

        if e >= 1.0 {
            return Err(SatpropError::KeplerDivergence(format!(
                "drag-corrected eccentricity {e} is not elliptical"
            )));
        }
        if e <= -0.001 {
            return Err(SatpropError::OrbitDecayed(format!(
                "drag consumed the eccentricity ({e}) at {tsince} min past epoch"
            )));
        }
        e = e.clamp(1.0e-6, 1.0 - 1.0e-6);

        let xl = xmp + omega + xnode + elements.recovered_mean_motion * templ;

        Ok(MeanState {
            e,
            a,
            omega,
            xl,
            xnode,
            xinc: raw.inclination,
        })
    }
}
