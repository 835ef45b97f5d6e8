//! # Satellite propagation driver
//!
//! [`Propagator`] binds a validated element set to the propagation branch
//! selected at construction (near-earth below a 225-minute period,
//! deep-space at or above it) and produces an Earth-centered-inertial
//! state vector for any offset from the element-set epoch.
//!
//! ## Overview
//!
//! - [`PropagationMode`] — the branch and resonance regime, selected once
//! - [`Propagator::propagate`] — secular/periodic updates of the selected
//!   branch, then the shared Kepler solve and short-period assembly
//! - [`Eci`] — the output state: position (km) and velocity (km/s)
//!
//! The only cross-call mutable state is the resonance integrator checkpoint
//! of resonant deep-space orbits; a failed call leaves it untouched.

use hifitime::{Duration, Epoch};
use nalgebra::Vector3;

use crate::common::CommonConstants;
use crate::constants::{
    CK2, DEEP_SPACE_PERIOD_MIN, DPI, EARTH_RADIUS_KM, KE, MinutesSinceEpoch, Radian,
};
use crate::deep_space::{DeepSpaceConstants, IntegratorState, Resonance};
use crate::elements::OrbitalElements;
use crate::near_earth::NearEarthConstants;
use crate::satprop_errors::SatpropError;

use std::f64::consts::PI;

/// Earth-centered-inertial state at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Eci {
    /// Instant of the state, element-set epoch plus the propagation offset
    pub epoch: Epoch,
    /// Position, km
    pub position: Vector3<f64>,
    /// Velocity, km/s
    pub velocity: Vector3<f64>,
}

/// Mean elements handed by either branch to the final-state assembly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MeanState {
    pub e: f64,
    /// Semi-major axis, Earth radii
    pub a: f64,
    pub omega: Radian,
    /// Mean longitude `M + ω + Ω`
    pub xl: Radian,
    pub xnode: Radian,
    pub xinc: Radian,
}

/// Inclination-dependent terms of the final-state assembly.
///
/// The near-earth branch reuses the epoch values from [`CommonConstants`];
/// the deep-space branch rebuilds them from the perturbed inclination, which
/// the lunar/solar terms move over time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct InclinationGeometry {
    pub cosio: f64,
    pub sinio: f64,
    pub x3thm1: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
    pub xlcof: f64,
    pub aycof: f64,
}

impl InclinationGeometry {
    fn from_inclination(xinc: Radian, a3ovk2: f64) -> Self {
        let cosio = xinc.cos();
        let sinio = xinc.sin();
        let theta2 = cosio * cosio;
        let aycof = 0.25 * a3ovk2 * sinio;
        let xlcof = if (1.0 + cosio).abs() > 1.5e-12 {
            0.125 * a3ovk2 * sinio * (3.0 + 5.0 * cosio) / (1.0 + cosio)
        } else {
            0.125 * a3ovk2 * sinio * (3.0 + 5.0 * cosio) / 1.5e-12
        };
        InclinationGeometry {
            cosio,
            sinio,
            x3thm1: 3.0 * theta2 - 1.0,
            x1mth2: 1.0 - theta2,
            x7thm1: 7.0 * theta2 - 1.0,
            xlcof,
            aycof,
        }
    }
}

impl From<&CommonConstants> for InclinationGeometry {
    fn from(common: &CommonConstants) -> Self {
        InclinationGeometry {
            cosio: common.cosio,
            sinio: common.sinio,
            x3thm1: common.x3thm1,
            x1mth2: common.x1mth2,
            x7thm1: common.x7thm1,
            xlcof: common.xlcof,
            aycof: common.aycof,
        }
    }
}

/// Propagation branch, selected once at construction and immutable after.
#[derive(Debug, Clone, PartialEq)]
pub enum PropagationMode {
    /// Orbital period below 225 minutes
    NearEarth(NearEarthConstants),
    /// Orbital period of 225 minutes or more, with its resonance regime
    DeepSpace(DeepSpaceConstants, Resonance),
}

/// Propagates one satellite from its element set.
///
/// Construction derives every constant of the selected branch; `propagate`
/// is then pure arithmetic except for the resonance integrator checkpoint,
/// which advances across calls (and makes concurrent `propagate` calls on
/// one instance unsupported — use one instance per thread).
#[derive(Debug, Clone, PartialEq)]
pub struct Propagator {
    elements: OrbitalElements,
    common: CommonConstants,
    mode: PropagationMode,
    integrator: Option<IntegratorState>,
}

impl Propagator {
    /// Select the propagation branch and derive its constants.
    pub fn new(elements: OrbitalElements) -> Self {
        let common = CommonConstants::new(&elements);

        if elements.period_min >= DEEP_SPACE_PERIOD_MIN {
            let (deep, resonance) = DeepSpaceConstants::new(&elements, &common);
            let integrator = IntegratorState::new(&resonance, &elements, &common);
            log::debug!(
                "deep-space propagation: period {:.2} min, {} resonance",
                elements.period_min,
                match resonance {
                    Resonance::None => "no",
                    Resonance::Synchronous { .. } => "24-hour synchronous",
                    Resonance::Geopotential { .. } => "12-hour geopotential",
                }
            );
            Propagator {
                elements,
                common,
                mode: PropagationMode::DeepSpace(deep, resonance),
                integrator,
            }
        } else {
            let near = NearEarthConstants::new(&elements, &common);
            log::debug!(
                "near-earth propagation: period {:.2} min, simple drag model: {}",
                elements.period_min,
                near.simple_model
            );
            Propagator {
                elements,
                common,
                mode: PropagationMode::NearEarth(near),
                integrator: None,
            }
        }
    }

    pub fn elements(&self) -> &OrbitalElements {
        &self.elements
    }

    pub fn mode(&self) -> &PropagationMode {
        &self.mode
    }

    /// Propagate to `tsince` minutes past the element-set epoch (negative
    /// offsets propagate backward).
    ///
    /// The resonance integrator checkpoint is committed only when the whole
    /// call succeeds, so a failed call can be retried or followed by another
    /// offset without corrupting cross-call state.
    pub fn propagate(&mut self, tsince: MinutesSinceEpoch) -> Result<Eci, SatpropError> {
        match &self.mode {
            PropagationMode::NearEarth(near) => {
                let state = near.secular_state(&self.elements, &self.common, tsince)?;
                let geometry = InclinationGeometry::from(&self.common);
                assemble_state(&self.elements.raw.epoch, tsince, &state, &geometry)
            }
            PropagationMode::DeepSpace(deep, resonance) => {
                let mut scratch = self.integrator.clone();
                let state = deep_space_state(
                    deep,
                    resonance,
                    scratch.as_mut(),
                    &self.elements,
                    &self.common,
                    tsince,
                )?;
                let geometry =
                    InclinationGeometry::from_inclination(state.xinc, self.common.a3ovk2);
                let eci = assemble_state(&self.elements.raw.epoch, tsince, &state, &geometry)?;
                self.integrator = scratch;
                Ok(eci)
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Deep-space mean state
// -------------------------------------------------------------------------------------------------

/// Run the deep-space secular, resonance and periodic updates for `tsince`.
fn deep_space_state(
    deep: &DeepSpaceConstants,
    resonance: &Resonance,
    integrator: Option<&mut IntegratorState>,
    elements: &OrbitalElements,
    common: &CommonConstants,
    tsince: MinutesSinceEpoch,
) -> Result<MeanState, SatpropError> {
    let raw = &elements.raw;

    // Shared gravity secular rates; deep-space drag is always the truncated
    // model (no higher-order d2..d4 terms)
    let xmdf = raw.mean_anomaly + common.xmdot * tsince;
    let argpdf = raw.periapsis_argument + common.omgdot * tsince;
    let tsq = tsince * tsince;
    let nodedf =
        raw.ascending_node_longitude + common.xnodot * tsince + common.xnodcf * tsq;
    let tempa = 1.0 - common.c1 * tsince;
    let tempe = raw.drag_term * common.c4 * tsince;
    let templ = common.t2cof * tsq;

    let sec = deep.secular(
        resonance, integrator, elements, common, tsince, xmdf, argpdf, nodedf,
    );
    if sec.nm <= 0.0 {
        return Err(SatpropError::MeanMotionNonPositive(sec.nm));
    }

    let am = (KE / sec.nm).powf(2.0 / 3.0) * tempa * tempa;
    let mut em = sec.em - tempe;
    if em >= 1.0 {
        return Err(SatpropError::KeplerDivergence(format!(
            "drag-corrected eccentricity {em} is not elliptical"
        )));
    }
    if em <= -0.001 {
        return Err(SatpropError::OrbitDecayed(format!(
            "drag consumed the eccentricity ({em}) at {tsince} min past epoch"
        )));
    }
    em = em.clamp(1.0e-6, 1.0 - 1.0e-6);

    let mut mm = sec.mm + elements.recovered_mean_motion * templ;
    let mut xlm = mm + sec.argp + sec.node;

    let nodem = if sec.node >= 0.0 {
        sec.node % DPI
    } else {
        -((-sec.node) % DPI)
    };
    let argpm = sec.argp % DPI;
    xlm %= DPI;
    mm = (xlm - argpm - nodem) % DPI;

    // Lunar/solar short-period corrections on the perturbed elements
    let (ep, mut xincp, mut nodep, mut argpp, mp) =
        deep.periodics(tsince, em, sec.xinc, nodem, argpm, mm);

    // Fold a negative perturbed inclination back into [0, π]
    if xincp < 0.0 {
        xincp = -xincp;
        nodep += PI;
        argpp -= PI;
    }
    if !(0.0..=1.0).contains(&ep) {
        return Err(SatpropError::KeplerDivergence(format!(
            "perturbed eccentricity {ep} outside [0, 1]"
        )));
    }

    Ok(MeanState {
        e: ep,
        a: am,
        omega: argpp,
        xl: mp + argpp + nodep,
        xnode: nodep,
        xinc: xincp,
    })
}

// -------------------------------------------------------------------------------------------------
// Final state assembly
// -------------------------------------------------------------------------------------------------

/// Solve Kepler's equation on the long-period-corrected elements, apply the
/// short-period oblateness corrections and rotate to the inertial frame.
fn assemble_state(
    epoch: &Epoch,
    tsince: MinutesSinceEpoch,
    state: &MeanState,
    geometry: &InclinationGeometry,
) -> Result<Eci, SatpropError> {
    let MeanState {
        e,
        a,
        omega,
        xl,
        xnode,
        xinc,
    } = *state;

    // Long-period periodics (J3 terms)
    let axn = e * omega.cos();
    let temp = 1.0 / (a * (1.0 - e * e));
    let ayn = e * omega.sin() + temp * geometry.aycof;
    let xlt = xl + temp * geometry.xlcof * axn;

    let elsq = axn * axn + ayn * ayn;
    if elsq >= 1.0 {
        return Err(SatpropError::KeplerDivergence(format!(
            "squared eccentricity vector {elsq} is not elliptical"
        )));
    }

    // Newton-Raphson on Kepler's equation. The first correction is clamped
    // to 1.25·e to survive high eccentricities; later iterations use the
    // second-order form. Ten iterations without convergence keeps the best
    // estimate rather than failing.
    let capu = (xlt - xnode) % DPI;
    let max_correction = 1.25 * elsq.sqrt();
    let mut epw = capu;
    let mut delta = 0.0;
    for iteration in 0..10 {
        let sinepw = epw.sin();
        let cosepw = epw.cos();
        let esine = axn * sinepw - ayn * cosepw;
        let ecose = axn * cosepw + ayn * sinepw;
        let f = capu - epw + esine;
        if f.abs() < 1.0e-12 {
            break;
        }
        let fdot = 1.0 - ecose;
        delta = if iteration == 0 {
            (f / fdot).clamp(-max_correction, max_correction)
        } else {
            f / (fdot + 0.5 * esine * delta)
        };
        epw += delta;
    }

    let sinepw = epw.sin();
    let cosepw = epw.cos();
    let ecose = axn * cosepw + ayn * sinepw;
    let esine = axn * sinepw - ayn * cosepw;

    // Short-period corrections (J2)
    let pl = a * (1.0 - elsq);
    if pl < 0.0 {
        return Err(SatpropError::KeplerDivergence(format!(
            "semi-latus rectum {pl} is negative"
        )));
    }
    let rl = a * (1.0 - ecose);
    let rdotl = a.sqrt() * esine / rl;
    let rvdotl = pl.sqrt() / rl;
    let betal = (1.0 - elsq).sqrt();
    let temp = esine / (1.0 + betal);
    let sinu = a / rl * (sinepw - ayn - axn * temp);
    let cosu = a / rl * (cosepw - axn + ayn * temp);
    let mut su = sinu.atan2(cosu);
    let sin2u = 2.0 * cosu * sinu;
    let cos2u = 1.0 - 2.0 * sinu * sinu;

    let temp = 1.0 / pl;
    let temp1 = CK2 * temp;
    let temp2 = temp1 * temp;
    let xn = KE / a.powf(1.5);

    let rk =
        rl * (1.0 - 1.5 * temp2 * betal * geometry.x3thm1) + 0.5 * temp1 * geometry.x1mth2 * cos2u;
    if rk < 1.0 {
        return Err(SatpropError::OrbitDecayed(format!(
            "geocentric radius {rk} Earth radii at {tsince} min past epoch"
        )));
    }
    su -= 0.25 * temp2 * geometry.x7thm1 * sin2u;
    let xnodek = xnode + 1.5 * temp2 * geometry.cosio * sin2u;
    let xinck = xinc + 1.5 * temp2 * geometry.cosio * geometry.sinio * cos2u;
    let rdotk = rdotl - xn * temp1 * geometry.x1mth2 * sin2u / KE;
    let rfdotk = rvdotl + xn * temp1 * (geometry.x1mth2 * cos2u + 1.5 * geometry.x3thm1) / KE;

    // Orientation vectors of the orbital plane
    let sinuk = su.sin();
    let cosuk = su.cos();
    let sinnok = xnodek.sin();
    let cosnok = xnodek.cos();
    let sinik = xinck.sin();
    let cosik = xinck.cos();
    let xmx = -sinnok * cosik;
    let xmy = cosnok * cosik;
    let u = Vector3::new(
        xmx * sinuk + cosnok * cosuk,
        xmy * sinuk + sinnok * cosuk,
        sinik * sinuk,
    );
    let v = Vector3::new(
        xmx * cosuk - cosnok * sinuk,
        xmy * cosuk - sinnok * sinuk,
        sinik * cosuk,
    );

    Ok(Eci {
        epoch: *epoch + Duration::from_seconds(tsince * 60.0),
        position: u * (rk * EARTH_RADIUS_KM),
        velocity: (u * rdotk + v * rfdotk) * (EARTH_RADIUS_KM * KE / 60.0),
    })
}

#[cfg(test)]
mod propagator_test {
    use super::*;
    use crate::constants::MU_KM3_S2;
    use crate::elements::RawElements;
    use approx::assert_relative_eq;
    use hifitime::TimeScale;

    /// Satellite 58002B (Vanguard 1), the classical verification case:
    /// 34.27° inclination, e = 0.186, 133-minute period.
    fn vanguard() -> OrbitalElements {
        OrbitalElements::new(RawElements {
            epoch: Epoch::from_gregorian(2000, 6, 27, 18, 50, 19, 733_568_000, TimeScale::UTC),
            eccentricity: 0.185_966_7,
            inclination: 34.2682_f64.to_radians(),
            ascending_node_longitude: 348.7242_f64.to_radians(),
            periapsis_argument: 331.7664_f64.to_radians(),
            mean_anomaly: 19.3264_f64.to_radians(),
            mean_motion: 10.824_191_57 * DPI / 1440.0,
            drag_term: 0.28098e-4,
        })
        .unwrap()
    }

    fn geostationary() -> OrbitalElements {
        OrbitalElements::new(RawElements {
            epoch: Epoch::from_gregorian(2010, 6, 15, 0, 0, 0, 0, TimeScale::UTC),
            eccentricity: 0.0002,
            inclination: 7.0_f64.to_radians(),
            ascending_node_longitude: 64.0_f64.to_radians(),
            periapsis_argument: 160.0_f64.to_radians(),
            mean_anomaly: 45.0_f64.to_radians(),
            mean_motion: 1.002_701 * DPI / 1440.0,
            drag_term: 1.0e-4,
        })
        .unwrap()
    }

    fn elements_with_period(minutes: f64) -> OrbitalElements {
        let mut raw = vanguard().raw;
        raw.mean_motion = DPI / minutes;
        OrbitalElements::new(raw).unwrap()
    }

    #[test]
    fn test_branch_selection_boundary() {
        let short = Propagator::new(elements_with_period(223.0));
        assert!(matches!(short.mode(), PropagationMode::NearEarth(_)));

        let long = Propagator::new(elements_with_period(227.0));
        assert!(matches!(long.mode(), PropagationMode::DeepSpace(_, _)));
    }

    #[test]
    fn test_output_epoch_tracks_offset() {
        let mut propagator = Propagator::new(vanguard());
        let epoch = propagator.elements().raw.epoch;

        let state = propagator.propagate(360.0).unwrap();
        assert_eq!(state.epoch, epoch + Duration::from_seconds(360.0 * 60.0));
    }

    #[test]
    fn test_vis_viva_near_earth() {
        let mut propagator = Propagator::new(vanguard());
        for t in [0.0, 30.0, 120.0, 720.0] {
            let state = propagator.propagate(t).unwrap();
            let r = state.position.norm();
            let vsq = state.velocity.norm_squared();
            // Implied semi-major axis from the energy integral
            let a_implied = 1.0 / (2.0 / r - vsq / MU_KM3_S2);
            let a_mean = propagator.elements().semi_major_axis * EARTH_RADIUS_KM;
            assert_relative_eq!(a_implied, a_mean, max_relative = 5e-3);

            // The speed itself must be the vis-viva one, not a rescaling of it
            let v_expected = (MU_KM3_S2 * (2.0 / r - 1.0 / a_mean)).sqrt();
            assert_relative_eq!(vsq.sqrt(), v_expected, max_relative = 5e-3);
        }
    }

    #[test]
    fn test_integrator_commits_on_success() {
        let mut propagator = Propagator::new(geostationary());
        assert!(propagator.integrator.is_some());

        propagator.propagate(1440.0).unwrap();
        let integrator = propagator.integrator.as_ref().unwrap();
        assert_eq!(integrator.atime, 1440.0);
    }

    #[test]
    fn test_kepler_solution_satisfies_equation() {
        // Moderate-eccentricity state pushed straight through the assembly
        let state = MeanState {
            e: 0.3,
            a: 1.5,
            omega: 1.0,
            xl: 4.0,
            xnode: 0.5,
            xinc: 0.9,
        };
        let geometry = InclinationGeometry::from_inclination(state.xinc, 0.0);
        let epoch = Epoch::from_gregorian(2010, 1, 1, 0, 0, 0, 0, TimeScale::UTC);
        let eci = assemble_state(&epoch, 0.0, &state, &geometry).unwrap();

        // With the J3 coefficients zeroed the radius is the Keplerian one up
        // to the J2 short-period terms, well inside the ellipse bounds
        let r = eci.position.norm() / EARTH_RADIUS_KM;
        assert!(r > state.a * (1.0 - state.e) * 0.99);
        assert!(r < state.a * (1.0 + state.e) * 1.01);
    }

    #[test]
    fn test_non_elliptical_state_rejected() {
        let state = MeanState {
            e: 0.999_999,
            a: 1.5,
            omega: 0.3,
            xl: 1.0,
            xnode: 0.5,
            xinc: 0.9,
        };
        // A large J3 ayn contribution pushes the eccentricity vector past 1
        let geometry = InclinationGeometry {
            aycof: 1.0,
            ..InclinationGeometry::from_inclination(0.9, 0.0)
        };
        let epoch = Epoch::from_gregorian(2010, 1, 1, 0, 0, 0, 0, TimeScale::UTC);
        assert!(matches!(
            assemble_state(&epoch, 0.0, &state, &geometry),
            Err(SatpropError::KeplerDivergence(_))
        ));
    }
}
