//! # Deep-space perturbation model
//!
//! Orbits with periods of 225 minutes or more are propagated with the
//! deep-space extension of the theory: on top of the shared secular
//! gravity/drag rates, the Sun and Moon contribute secular drifts and
//! short-period oscillations to the mean elements, and orbits commensurate
//! with Earth's rotation pick up resonance terms from the tesseral harmonics.
//!
//! ## Overview
//!
//! - [`DeepSpaceConstants`] — lunar/solar secular rates and short-period
//!   amplitude coefficients, derived once at initialization
//! - [`Resonance`] — the resonance regime selected at initialization:
//!   none, 24-hour synchronous, or 12-hour geopotential
//! - [`IntegratorState`] — the mutable checkpoint of the resonance
//!   integrator, advanced in 720-minute steps across `propagate` calls
//!
//! The short-period corrections switch to the Lyddane formulation below
//! 0.2 rad of perturbed inclination to avoid the node singularity.

use crate::common::CommonConstants;
use crate::constants::{
    C1L, C1SS, DPI, FASX2, FASX4, FASX6, G22, G32, G44, G52, G54, KE, MinutesSinceEpoch, Q22, Q31,
    Q33, ROOT22, ROOT32, ROOT44, ROOT52, ROOT54, RPTIM, Radian, STEP, STEP2, ZCOSGS, ZCOSIS, ZEL,
    ZES, ZNL, ZNS, ZSINGS, ZSINIS,
};
use crate::elements::OrbitalElements;
use crate::time::{days_since_1950, gstime, julian_date};

use std::f64::consts::PI;

/// Inclination distance from the equatorial plane under which the lunar/solar
/// node rates are suppressed, rad
const NODE_RATE_INCLINATION_FENCE: f64 = 5.235_987_7e-2;

/// Perturbed inclination under which the Lyddane node update applies, rad
const LYDDANE_INCLINATION_MIN: Radian = 0.2;

// -------------------------------------------------------------------------------------------------
// Third-body disturbing-function coefficients
// -------------------------------------------------------------------------------------------------

/// Disturbing-function coefficients of one perturbing body (Sun or Moon),
/// evaluated in the orbit frame.
struct PerturberCoeffs {
    s1: f64,
    s2: f64,
    s3: f64,
    s4: f64,
    s5: f64,
    s6: f64,
    s7: f64,
    z1: f64,
    z2: f64,
    z3: f64,
    z11: f64,
    z12: f64,
    z13: f64,
    z21: f64,
    z22: f64,
    z23: f64,
    z31: f64,
    z32: f64,
    z33: f64,
}

/// Orientation of a perturbing body relative to the orbit, as direction
/// cosines of its argument of perigee (g), inclination (i) and node (h).
struct PerturberGeometry {
    cc: f64,
    zcosg: f64,
    zsing: f64,
    zcosi: f64,
    zsini: f64,
    zcosh: f64,
    zsinh: f64,
}

impl PerturberCoeffs {
    /// Evaluate the disturbing-function coefficients for one body.
    ///
    /// This is the inner kernel of the classical `DSCOM` block, run once
    /// with the solar geometry and once with the lunar geometry.
    fn new(
        geo: &PerturberGeometry,
        cosim: f64,
        sinim: f64,
        cosomm: f64,
        sinomm: f64,
        em: f64,
        emsq: f64,
        betasq: f64,
        rtemsq: f64,
        xnoi: f64,
    ) -> Self {
        let a1 = geo.zcosg * geo.zcosh + geo.zsing * geo.zcosi * geo.zsinh;
        let a3 = -geo.zsing * geo.zcosh + geo.zcosg * geo.zcosi * geo.zsinh;
        let a7 = -geo.zcosg * geo.zsinh + geo.zsing * geo.zcosi * geo.zcosh;
        let a8 = geo.zsing * geo.zsini;
        let a9 = geo.zsing * geo.zsinh + geo.zcosg * geo.zcosi * geo.zcosh;
        let a10 = geo.zcosg * geo.zsini;
        let a2 = cosim * a7 + sinim * a8;
        let a4 = cosim * a9 + sinim * a10;
        let a5 = -sinim * a7 + cosim * a8;
        let a6 = -sinim * a9 + cosim * a10;

        let x1 = a1 * cosomm + a2 * sinomm;
        let x2 = a3 * cosomm + a4 * sinomm;
        let x3 = -a1 * sinomm + a2 * cosomm;
        let x4 = -a3 * sinomm + a4 * cosomm;
        let x5 = a5 * sinomm;
        let x6 = a6 * sinomm;
        let x7 = a5 * cosomm;
        let x8 = a6 * cosomm;

        let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        let mut z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * emsq;
        let mut z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * emsq;
        let mut z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * emsq;
        let z11 = -6.0 * a1 * a5 + emsq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        let z12 = -6.0 * (a1 * a6 + a3 * a5)
            + emsq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        let z13 = -6.0 * a3 * a6 + emsq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        let z21 = 6.0 * a2 * a5 + emsq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        let z22 = 6.0 * (a4 * a5 + a2 * a6)
            + emsq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        let z23 = 6.0 * a4 * a6 + emsq * (24.0 * x2 * x6 - 6.0 * x4 * x8);
        z1 = z1 + z1 + betasq * z31;
        z2 = z2 + z2 + betasq * z32;
        z3 = z3 + z3 + betasq * z33;

        let s3 = geo.cc * xnoi;
        let s2 = -0.5 * s3 / rtemsq;
        let s4 = s3 * rtemsq;
        let s1 = -15.0 * em * s4;
        let s5 = x1 * x3 + x2 * x4;
        let s6 = x2 * x3 + x1 * x4;
        let s7 = x2 * x4 - x1 * x3;

        PerturberCoeffs {
            s1,
            s2,
            s3,
            s4,
            s5,
            s6,
            s7,
            z1,
            z2,
            z3,
            z11,
            z12,
            z13,
            z21,
            z22,
            z23,
            z31,
            z32,
            z33,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Resonance regime
// -------------------------------------------------------------------------------------------------

/// Resonance regime of a deep-space orbit, selected once at initialization
/// from the recovered mean motion (and eccentricity for the 12-hour band).
#[derive(Debug, Clone, PartialEq)]
pub enum Resonance {
    /// No commensurability with Earth's rotation; lunar/solar secular terms
    /// only, no numerical integration.
    None,
    /// 24-hour synchronous resonance (geostationary band): three sinusoids
    /// of the resonance angle at fixed phase offsets.
    Synchronous {
        del1: f64,
        del2: f64,
        del3: f64,
        /// Resonance angle at epoch, rad
        xlamo: Radian,
        /// Secular rate of the resonance angle minus the mean motion, rad/min
        xfact: f64,
    },
    /// 12-hour geopotential resonance (Molniya band): ten sinusoids of the
    /// resonance angle and the precessing argument of perigee.
    Geopotential {
        d2201: f64,
        d2211: f64,
        d3210: f64,
        d3222: f64,
        d4410: f64,
        d4422: f64,
        d5220: f64,
        d5232: f64,
        d5421: f64,
        d5433: f64,
        /// Resonance angle at epoch, rad
        xlamo: Radian,
        /// Secular rate of the resonance angle minus the mean motion, rad/min
        xfact: f64,
    },
}

impl Resonance {
    pub fn is_resonant(&self) -> bool {
        !matches!(self, Resonance::None)
    }

    /// Resonance angle at epoch; zero for the non-resonant regime.
    pub(crate) fn xlamo(&self) -> Radian {
        match self {
            Resonance::None => 0.0,
            Resonance::Synchronous { xlamo, .. } => *xlamo,
            Resonance::Geopotential { xlamo, .. } => *xlamo,
        }
    }

    /// Evaluate the resonance derivatives at an integrator checkpoint.
    ///
    /// `xli`/`xni` are the resonance angle and mean motion at the checkpoint,
    /// `atime` its offset from epoch (needed by the 12-hour terms, whose
    /// phases follow the precessing argument of perigee).
    fn dot_terms(
        &self,
        xli: Radian,
        xni: f64,
        atime: MinutesSinceEpoch,
        argp0: Radian,
        argpdot: f64,
    ) -> IntegratorValues {
        match *self {
            Resonance::None => IntegratorValues::default(),
            Resonance::Synchronous {
                del1,
                del2,
                del3,
                xfact,
                ..
            } => {
                let xndot = del1 * (xli - FASX2).sin()
                    + del2 * (2.0 * (xli - FASX4)).sin()
                    + del3 * (3.0 * (xli - FASX6)).sin();
                let xldot = xni + xfact;
                let xnddt = (del1 * (xli - FASX2).cos()
                    + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                    + 3.0 * del3 * (3.0 * (xli - FASX6)).cos())
                    * xldot;
                IntegratorValues {
                    xndot,
                    xnddt,
                    xldot,
                }
            }
            Resonance::Geopotential {
                d2201,
                d2211,
                d3210,
                d3222,
                d4410,
                d4422,
                d5220,
                d5232,
                d5421,
                d5433,
                xfact,
                ..
            } => {
                let xomi = argp0 + argpdot * atime;
                let x2omi = xomi + xomi;
                let x2li = xli + xli;
                let xndot = d2201 * (x2omi + xli - G22).sin()
                    + d2211 * (xli - G22).sin()
                    + d3210 * (xomi + xli - G32).sin()
                    + d3222 * (-xomi + xli - G32).sin()
                    + d4410 * (x2omi + x2li - G44).sin()
                    + d4422 * (x2li - G44).sin()
                    + d5220 * (xomi + xli - G52).sin()
                    + d5232 * (-xomi + xli - G52).sin()
                    + d5421 * (xomi + x2li - G54).sin()
                    + d5433 * (-xomi + x2li - G54).sin();
                let xldot = xni + xfact;
                let xnddt = (d2201 * (x2omi + xli - G22).cos()
                    + d2211 * (xli - G22).cos()
                    + d3210 * (xomi + xli - G32).cos()
                    + d3222 * (-xomi + xli - G32).cos()
                    + d5220 * (xomi + xli - G52).cos()
                    + d5232 * (-xomi + xli - G52).cos()
                    + 2.0
                        * (d4410 * (x2omi + x2li - G44).cos()
                            + d4422 * (x2li - G44).cos()
                            + d5421 * (xomi + x2li - G54).cos()
                            + d5433 * (-xomi + x2li - G54).cos()))
                    * xldot;
                IntegratorValues {
                    xndot,
                    xnddt,
                    xldot,
                }
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Resonance integrator
// -------------------------------------------------------------------------------------------------

/// Derivatives of the resonance integration at one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct IntegratorValues {
    /// d(mean motion)/dt, rad/min²
    pub xndot: f64,
    /// d²(mean motion)/dt², rad/min³
    pub xnddt: f64,
    /// d(resonance angle)/dt, rad/min
    pub xldot: f64,
}

/// Mutable checkpoint of the resonance integrator.
///
/// The integrator advances in fixed 720-minute steps from epoch toward the
/// requested time and keeps its last checkpoint across `propagate` calls,
/// so that monotonic time sequences reuse previous work. The checkpoint is
/// rewound to epoch whenever the new offset has the opposite sign of, or a
/// smaller magnitude than, the stored one.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegratorState {
    /// Checkpoint offset from epoch, minutes
    pub(crate) atime: MinutesSinceEpoch,
    /// Mean motion at the checkpoint, rad/min
    pub(crate) xni: f64,
    /// Resonance angle at the checkpoint, rad
    pub(crate) xli: Radian,
    /// Derivatives at epoch, precomputed at initialization
    pub(crate) values_epoch: IntegratorValues,
    /// Derivatives at the current checkpoint
    pub(crate) values_current: IntegratorValues,
}

impl IntegratorState {
    /// Seed the integrator at epoch for a resonant regime.
    ///
    /// Returns `None` for [`Resonance::None`], which needs no integration.
    pub(crate) fn new(
        resonance: &Resonance,
        elements: &OrbitalElements,
        common: &CommonConstants,
    ) -> Option<Self> {
        if !resonance.is_resonant() {
            return None;
        }
        let values_epoch = resonance.dot_terms(
            resonance.xlamo(),
            elements.recovered_mean_motion,
            0.0,
            elements.raw.periapsis_argument,
            common.omgdot,
        );
        Some(IntegratorState {
            atime: 0.0,
            xni: elements.recovered_mean_motion,
            xli: resonance.xlamo(),
            values_epoch,
            values_current: values_epoch,
        })
    }

    /// The checkpoint can only be reused when the new offset lies beyond it
    /// on the same side of epoch.
    fn needs_restart(&self, tsince: MinutesSinceEpoch) -> bool {
        self.atime == 0.0 || tsince * self.atime <= 0.0 || tsince.abs() < self.atime.abs()
    }

    /// Advance the checkpoint toward `tsince` in 720-minute steps and
    /// extrapolate the mean motion and resonance angle over the residual.
    fn integrate(
        &mut self,
        resonance: &Resonance,
        elements: &OrbitalElements,
        common: &CommonConstants,
        tsince: MinutesSinceEpoch,
    ) -> (f64, Radian) {
        let argp0 = elements.raw.periapsis_argument;
        let argpdot = common.omgdot;

        if self.needs_restart(tsince) {
            log::trace!(
                "resonance integrator restart: atime {} -> 0, tsince {}",
                self.atime,
                tsince
            );
            self.atime = 0.0;
            self.xni = elements.recovered_mean_motion;
            self.xli = resonance.xlamo();
            self.values_current = self.values_epoch;
        }

        let delt = if tsince > 0.0 { STEP } else { -STEP };
        while (tsince - self.atime).abs() >= STEP {
            let v = self.values_current;
            self.xli += v.xldot * delt + v.xndot * STEP2;
            self.xni += v.xndot * delt + v.xnddt * STEP2;
            self.atime += delt;
            self.values_current = resonance.dot_terms(self.xli, self.xni, self.atime, argp0, argpdot);
        }

        let ft = tsince - self.atime;
        let v = self.values_current;
        let xn = self.xni + v.xndot * ft + v.xnddt * ft * ft * 0.5;
        let xl = self.xli + v.xldot * ft + v.xndot * ft * ft * 0.5;
        (xn, xl)
    }
}

// -------------------------------------------------------------------------------------------------
// Deep-space constants
// -------------------------------------------------------------------------------------------------

/// Mean elements after the deep-space secular update, before the lunar/solar
/// periodics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DeepSecularState {
    pub em: f64,
    pub xinc: Radian,
    pub argp: Radian,
    pub node: Radian,
    pub mm: Radian,
    pub nm: f64,
}

/// Lunar/solar perturbation coefficients of the deep-space branch, derived
/// once at initialization.
///
/// The `ss*` fields are the secular rates added linearly in time to
/// `(e, i, M, ω, Ω)`; the remaining amplitude coefficients drive the solar
/// (`s*`) and lunar (`e3/ee2/x*`) short-period series evaluated per call.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepSpaceConstants {
    // Secular rates, per minute
    pub sse: f64,
    pub ssi: f64,
    pub ssl: f64,
    pub ssg: f64,
    pub ssh: f64,

    // Solar short-period amplitudes
    pub se2: f64,
    pub se3: f64,
    pub si2: f64,
    pub si3: f64,
    pub sl2: f64,
    pub sl3: f64,
    pub sl4: f64,
    pub sgh2: f64,
    pub sgh3: f64,
    pub sgh4: f64,
    pub sh2: f64,
    pub sh3: f64,

    // Lunar short-period amplitudes
    pub ee2: f64,
    pub e3: f64,
    pub xi2: f64,
    pub xi3: f64,
    pub xl2: f64,
    pub xl3: f64,
    pub xl4: f64,
    pub xgh2: f64,
    pub xgh3: f64,
    pub xgh4: f64,
    pub xh2: f64,
    pub xh3: f64,

    /// Solar mean anomaly at epoch, rad
    pub zmos: Radian,
    /// Lunar mean anomaly at epoch, rad
    pub zmol: Radian,
    /// Greenwich sidereal time at epoch, rad
    pub gsto: Radian,
}

impl DeepSpaceConstants {
    /// Derive the lunar/solar coefficients and select the resonance regime.
    pub fn new(elements: &OrbitalElements, common: &CommonConstants) -> (Self, Resonance) {
        let raw = &elements.raw;
        let e0 = raw.eccentricity;
        let n0dp = elements.recovered_mean_motion;

        let emsq = e0 * e0;
        let betasq = 1.0 - emsq;
        let rtemsq = betasq.sqrt();
        let sinim = common.sinio;
        let cosim = common.cosio;
        let snodm = raw.ascending_node_longitude.sin();
        let cnodm = raw.ascending_node_longitude.cos();
        let sinomm = raw.periapsis_argument.sin();
        let cosomm = raw.periapsis_argument.cos();
        let xnoi = 1.0 / n0dp;

        let gsto = gstime(julian_date(&raw.epoch));

        // Lunar orientation at epoch, referred to 1900 January 0.5
        let day = days_since_1950(&raw.epoch) + 18_261.5;
        let xnodce = (4.523_602_0 - 9.242_202_9e-4 * day) % DPI;
        let stem = xnodce.sin();
        let ctem = xnodce.cos();
        let zcosil = 0.913_751_64 - 0.035_680_96 * ctem;
        let zsinil = (1.0 - zcosil * zcosil).sqrt();
        let zsinhl = 0.089_683_511 * stem / zsinil;
        let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
        let gam = 5.835_151_4 + 0.001_944_368_0 * day;
        let zx = ZSINIS * stem / zsinil;
        let zy = zcoshl * ctem + ZCOSIS * zsinhl * stem;
        let zx = gam + zx.atan2(zy) - xnodce;
        let zcosgl = zx.cos();
        let zsingl = zx.sin();

        let zmol = (4.719_967_2 + 0.229_971_50 * day - gam) % DPI;
        let zmos = (6.256_583_7 + 0.017_201_977 * day) % DPI;

        let solar = PerturberCoeffs::new(
            &PerturberGeometry {
                cc: C1SS,
                zcosg: ZCOSGS,
                zsing: ZSINGS,
                zcosi: ZCOSIS,
                zsini: ZSINIS,
                zcosh: cnodm,
                zsinh: snodm,
            },
            cosim,
            sinim,
            cosomm,
            sinomm,
            e0,
            emsq,
            betasq,
            rtemsq,
            xnoi,
        );
        let lunar = PerturberCoeffs::new(
            &PerturberGeometry {
                cc: C1L,
                zcosg: zcosgl,
                zsing: zsingl,
                zcosi: zcosil,
                zsini: zsinil,
                zcosh: zcoshl * cnodm + zsinhl * snodm,
                zsinh: snodm * zcoshl - cnodm * zsinhl,
            },
            cosim,
            sinim,
            cosomm,
            sinomm,
            e0,
            emsq,
            betasq,
            rtemsq,
            xnoi,
        );

        // Solar short-period amplitudes
        let se2 = 2.0 * solar.s1 * solar.s6;
        let se3 = 2.0 * solar.s1 * solar.s7;
        let si2 = 2.0 * solar.s2 * solar.z12;
        let si3 = 2.0 * solar.s2 * (solar.z13 - solar.z11);
        let sl2 = -2.0 * solar.s3 * solar.z2;
        let sl3 = -2.0 * solar.s3 * (solar.z3 - solar.z1);
        let sl4 = -2.0 * solar.s3 * (-21.0 - 9.0 * emsq) * ZES;
        let sgh2 = 2.0 * solar.s4 * solar.z32;
        let sgh3 = 2.0 * solar.s4 * (solar.z33 - solar.z31);
        let sgh4 = -18.0 * solar.s4 * ZES;
        let sh2 = -2.0 * solar.s2 * solar.z22;
        let sh3 = -2.0 * solar.s2 * (solar.z23 - solar.z21);

        // Lunar short-period amplitudes
        let ee2 = 2.0 * lunar.s1 * lunar.s6;
        let e3 = 2.0 * lunar.s1 * lunar.s7;
        let xi2 = 2.0 * lunar.s2 * lunar.z12;
        let xi3 = 2.0 * lunar.s2 * (lunar.z13 - lunar.z11);
        let xl2 = -2.0 * lunar.s3 * lunar.z2;
        let xl3 = -2.0 * lunar.s3 * (lunar.z3 - lunar.z1);
        let xl4 = -2.0 * lunar.s3 * (-21.0 - 9.0 * emsq) * ZEL;
        let xgh2 = 2.0 * lunar.s4 * lunar.z32;
        let xgh3 = 2.0 * lunar.s4 * (lunar.z33 - lunar.z31);
        let xgh4 = -18.0 * lunar.s4 * ZEL;
        let xh2 = -2.0 * lunar.s2 * lunar.z22;
        let xh3 = -2.0 * lunar.s2 * (lunar.z23 - lunar.z21);

        // Secular rates. The node rates are suppressed near the equatorial
        // singularities of the 1/sin(i) factors.
        let inclm = raw.inclination;
        let near_singular =
            inclm < NODE_RATE_INCLINATION_FENCE || inclm > PI - NODE_RATE_INCLINATION_FENCE;

        let ses = solar.s1 * ZNS * solar.s5;
        let sis = solar.s2 * ZNS * (solar.z11 + solar.z13);
        let sls = -ZNS * solar.s3 * (solar.z1 + solar.z3 - 14.0 - 6.0 * emsq);
        let sghs = solar.s4 * ZNS * (solar.z31 + solar.z33 - 6.0);
        let mut shs = -ZNS * solar.s2 * (solar.z21 + solar.z23);
        if near_singular {
            shs = 0.0;
        }
        if sinim != 0.0 {
            shs /= sinim;
        }
        let sgs = sghs - cosim * shs;

        let sse = ses + lunar.s1 * ZNL * lunar.s5;
        let ssi = sis + lunar.s2 * ZNL * (lunar.z11 + lunar.z13);
        let ssl = sls - ZNL * lunar.s3 * (lunar.z1 + lunar.z3 - 14.0 - 6.0 * emsq);
        let sghl = lunar.s4 * ZNL * (lunar.z31 + lunar.z33 - 6.0);
        let mut shll = -ZNL * lunar.s2 * (lunar.z21 + lunar.z23);
        if near_singular {
            shll = 0.0;
        }
        let mut ssg = sgs + sghl;
        let mut ssh = shs;
        if sinim != 0.0 {
            ssg -= cosim / sinim * shll;
            ssh += shll / sinim;
        }

        let constants = DeepSpaceConstants {
            sse,
            ssi,
            ssl,
            ssg,
            ssh,
            se2,
            se3,
            si2,
            si3,
            sl2,
            sl3,
            sl4,
            sgh2,
            sgh3,
            sgh4,
            sh2,
            sh3,
            ee2,
            e3,
            xi2,
            xi3,
            xl2,
            xl3,
            xl4,
            xgh2,
            xgh3,
            xgh4,
            xh2,
            xh3,
            zmos,
            zmol,
            gsto,
        };
        let resonance = constants.select_resonance(elements, common, sinim, cosim, emsq);
        (constants, resonance)
    }

    /// Classify the resonance regime and derive its amplitude coefficients.
    ///
    /// The 24-hour band is 0.0034906585–0.0052359877 rad/min; the 12-hour
    /// band is 8.26e-3–9.24e-3 rad/min and additionally requires `e ≥ 0.5`.
    fn select_resonance(
        &self,
        elements: &OrbitalElements,
        common: &CommonConstants,
        sinim: f64,
        cosim: f64,
        emsq: f64,
    ) -> Resonance {
        let raw = &elements.raw;
        let n0dp = elements.recovered_mean_motion;
        let e0 = raw.eccentricity;
        let theta = self.gsto;

        let synchronous = n0dp > 0.003_490_658_5 && n0dp < 0.005_235_987_7;
        let geopotential = (0.008_26..=0.009_24).contains(&n0dp) && e0 >= 0.5;

        if !synchronous && !geopotential {
            return Resonance::None;
        }

        // Inverse semi-major axis in Earth radii
        let aonv = (n0dp / KE).powf(2.0 / 3.0);

        if geopotential {
            let eoc = e0 * emsq;
            let cosisq = cosim * cosim;
            let sini2 = sinim * sinim;

            let g201 = -0.306 - (e0 - 0.64) * 0.440;
            let (g211, g310, g322, g410, g422, g520);
            if e0 <= 0.65 {
                g211 = 3.616 - 13.2470 * e0 + 16.2900 * emsq;
                g310 = -19.302 + 117.3900 * e0 - 228.4190 * emsq + 156.5910 * eoc;
                g322 = -18.9068 + 109.7927 * e0 - 214.6334 * emsq + 146.5816 * eoc;
                g410 = -41.122 + 242.6940 * e0 - 471.0940 * emsq + 313.9530 * eoc;
                g422 = -146.407 + 841.8800 * e0 - 1629.014 * emsq + 1083.4350 * eoc;
                g520 = -532.114 + 3017.977 * e0 - 5740.032 * emsq + 3708.2760 * eoc;
            } else {
                g211 = -72.099 + 331.819 * e0 - 508.738 * emsq + 266.724 * eoc;
                g310 = -346.844 + 1582.851 * e0 - 2415.925 * emsq + 1246.113 * eoc;
                g322 = -342.585 + 1554.908 * e0 - 2366.899 * emsq + 1215.972 * eoc;
                g410 = -1052.797 + 4758.686 * e0 - 7193.992 * emsq + 3651.957 * eoc;
                g422 = -3581.690 + 16178.110 * e0 - 24462.770 * emsq + 12422.520 * eoc;
                g520 = if e0 > 0.715 {
                    -5149.66 + 29936.92 * e0 - 54087.36 * emsq + 31324.56 * eoc
                } else {
                    1464.74 - 4664.75 * e0 + 3763.64 * emsq
                };
            }
            let (g533, g521, g532);
            if e0 < 0.7 {
                g533 = -919.227_70 + 4988.61 * e0 - 9064.77 * emsq + 5542.21 * eoc;
                g521 = -822.710_72 + 4568.6173 * e0 - 8491.4146 * emsq + 5337.524 * eoc;
                g532 = -853.666_00 + 4690.25 * e0 - 8624.77 * emsq + 5341.4 * eoc;
            } else {
                g533 = -37995.78 + 161616.52 * e0 - 229838.2 * emsq + 109377.94 * eoc;
                g521 = -51752.104 + 218913.95 * e0 - 309468.16 * emsq + 146349.42 * eoc;
                g532 = -40023.88 + 170470.89 * e0 - 242699.48 * emsq + 115605.82 * eoc;
            }

            let f220 = 0.75 * (1.0 + 2.0 * cosim + cosisq);
            let f221 = 1.5 * sini2;
            let f321 = 1.875 * sinim * (1.0 - 2.0 * cosim - 3.0 * cosisq);
            let f322 = -1.875 * sinim * (1.0 + 2.0 * cosim - 3.0 * cosisq);
            let f441 = 35.0 * sini2 * f220;
            let f442 = 39.375 * sini2 * sini2;
            let f522 = 9.84375
                * sinim
                * (sini2 * (1.0 - 2.0 * cosim - 5.0 * cosisq)
                    + 1.0 / 3.0 * (-2.0 + 4.0 * cosim + 6.0 * cosisq));
            let f523 = sinim
                * (4.921_875_12 * sini2 * (-2.0 - 4.0 * cosim + 10.0 * cosisq)
                    + 6.562_500_12 * (1.0 + 2.0 * cosim - 3.0 * cosisq));
            let f542 = 29.53125
                * sinim
                * (2.0 - 8.0 * cosim + cosisq * (-12.0 + 8.0 * cosim + 10.0 * cosisq));
            let f543 = 29.53125
                * sinim
                * (-2.0 - 8.0 * cosim + cosisq * (12.0 + 8.0 * cosim - 10.0 * cosisq));

            let xno2 = n0dp * n0dp;
            let ainv2 = aonv * aonv;
            let mut temp1 = 3.0 * xno2 * ainv2;
            let mut temp = temp1 * ROOT22;
            let d2201 = temp * f220 * g201;
            let d2211 = temp * f221 * g211;
            temp1 *= aonv;
            temp = temp1 * ROOT32;
            let d3210 = temp * f321 * g310;
            let d3222 = temp * f322 * g322;
            temp1 *= aonv;
            temp = 2.0 * temp1 * ROOT44;
            let d4410 = temp * f441 * g410;
            let d4422 = temp * f442 * g422;
            temp1 *= aonv;
            temp = temp1 * ROOT52;
            let d5220 = temp * f522 * g520;
            let d5232 = temp * f523 * g532;
            temp = 2.0 * temp1 * ROOT54;
            let d5421 = temp * f542 * g521;
            let d5433 = temp * f543 * g533;

            let xlamo =
                (raw.mean_anomaly + 2.0 * raw.ascending_node_longitude - 2.0 * theta) % DPI;
            let xfact = common.xmdot + self.ssl
                + 2.0 * (common.xnodot + self.ssh - RPTIM)
                - n0dp;

            Resonance::Geopotential {
                d2201,
                d2211,
                d3210,
                d3222,
                d4410,
                d4422,
                d5220,
                d5232,
                d5421,
                d5433,
                xlamo,
                xfact,
            }
        } else {
            let g200 = 1.0 + emsq * (-2.5 + 0.8125 * emsq);
            let g310 = 1.0 + 2.0 * emsq;
            let g300 = 1.0 + emsq * (-6.0 + 6.60937 * emsq);
            let f220 = 0.75 * (1.0 + cosim) * (1.0 + cosim);
            let f311 = 0.9375 * sinim * sinim * (1.0 + 3.0 * cosim) - 0.75 * (1.0 + cosim);
            let f330 = 1.875 * (1.0 + cosim).powi(3);

            let delsq = 3.0 * n0dp * n0dp * aonv * aonv;
            let del2 = 2.0 * delsq * f220 * g200 * Q22;
            let del3 = 3.0 * delsq * f330 * g300 * Q33 * aonv;
            let del1 = delsq * f311 * g310 * Q31 * aonv;

            let xlamo = (raw.mean_anomaly
                + raw.ascending_node_longitude
                + raw.periapsis_argument
                - theta)
                % DPI;
            let xpidot = common.omgdot + common.xnodot;
            let xfact =
                common.xmdot + xpidot - RPTIM + self.ssl + self.ssg + self.ssh - n0dp;

            Resonance::Synchronous {
                del1,
                del2,
                del3,
                xlamo,
                xfact,
            }
        }
    }

    /// Sidereal angle `gsto + t·ω⊕`, wrapped to one turn.
    fn sidereal_angle(&self, tsince: MinutesSinceEpoch) -> Radian {
        (self.gsto + tsince * RPTIM) % DPI
    }

    /// Apply the lunar/solar secular drift and, for resonant regimes, the
    /// numerically integrated mean motion and mean anomaly.
    ///
    /// `xmdf`/`argpdf`/`nodedf` carry the shared gravity secular updates
    /// already applied by the caller. The integrator checkpoint advances as
    /// a side effect; the caller owns commit-or-discard semantics.
    pub(crate) fn secular(
        &self,
        resonance: &Resonance,
        integrator: Option<&mut IntegratorState>,
        elements: &OrbitalElements,
        common: &CommonConstants,
        tsince: MinutesSinceEpoch,
        xmdf: Radian,
        argpdf: Radian,
        nodedf: Radian,
    ) -> DeepSecularState {
        let raw = &elements.raw;

        let em = raw.eccentricity + self.sse * tsince;
        let xinc = raw.inclination + self.ssi * tsince;
        let argp = argpdf + self.ssg * tsince;
        let node = nodedf + self.ssh * tsince;
        let mut mm = xmdf + self.ssl * tsince;
        let mut nm = elements.recovered_mean_motion;

        if let Some(integrator) = integrator {
            let (xn, xl) = integrator.integrate(resonance, elements, common, tsince);
            let theta = self.sidereal_angle(tsince);
            mm = match resonance {
                Resonance::Synchronous { .. } => xl - node - argp + theta,
                _ => xl - 2.0 * node + 2.0 * theta,
            };
            nm = xn;
        }

        DeepSecularState {
            em,
            xinc,
            argp,
            node,
            mm,
            nm,
        }
    }

    /// Apply the lunar/solar short-period corrections to the mean elements.
    ///
    /// Below 0.2 rad of perturbed inclination the node and argument updates
    /// go through the Lyddane variables `(alfdp, betdp)` to sidestep the
    /// small-inclination singularity, re-wrapping the recovered node into
    /// the branch of the unperturbed one.
    pub(crate) fn periodics(
        &self,
        tsince: MinutesSinceEpoch,
        em: f64,
        xinc: Radian,
        node: Radian,
        argp: Radian,
        mm: Radian,
    ) -> (f64, Radian, Radian, Radian, Radian) {
        // Solar series
        let zm = self.zmos + ZNS * tsince;
        let zf = zm + 2.0 * ZES * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        let ses = self.se2 * f2 + self.se3 * f3;
        let sis = self.si2 * f2 + self.si3 * f3;
        let sls = self.sl2 * f2 + self.sl3 * f3 + self.sl4 * sinzf;
        let sghs = self.sgh2 * f2 + self.sgh3 * f3 + self.sgh4 * sinzf;
        let shs = self.sh2 * f2 + self.sh3 * f3;

        // Lunar series
        let zm = self.zmol + ZNL * tsince;
        let zf = zm + 2.0 * ZEL * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        let sel = self.ee2 * f2 + self.e3 * f3;
        let sil = self.xi2 * f2 + self.xi3 * f3;
        let sll = self.xl2 * f2 + self.xl3 * f3 + self.xl4 * sinzf;
        let sghl = self.xgh2 * f2 + self.xgh3 * f3 + self.xgh4 * sinzf;
        let shll = self.xh2 * f2 + self.xh3 * f3;

        let pe = ses + sel;
        let pinc = sis + sil;
        let pl = sls + sll;
        let pgh = sghs + sghl;
        let ph = shs + shll;

        let xincp = xinc + pinc;
        let ep = em + pe;
        let sinip = xincp.sin();
        let cosip = xincp.cos();

        if xincp >= LYDDANE_INCLINATION_MIN {
            let ph = ph / sinip;
            let pgh = pgh - cosip * ph;
            (ep, xincp, node + ph, argp + pgh, mm + pl)
        } else {
            // Lyddane modification: perturb the node through its projections
            // on the equatorial plane
            let sinop = node.sin();
            let cosop = node.cos();
            let alfdp = sinip * sinop + ph * cosop + pinc * cosip * sinop;
            let betdp = sinip * cosop - ph * sinop + pinc * cosip * cosop;

            let node_wrapped = if node >= 0.0 {
                node % DPI
            } else {
                -((-node) % DPI)
            };
            let xls = mm + argp + pl + pgh + (cosip - pinc * sinip) * node_wrapped;
            let mut nodep = alfdp.atan2(betdp);
            // Keep the recovered node on the same 2π branch
            if (node_wrapped - nodep).abs() > PI {
                if nodep < node_wrapped {
                    nodep += DPI;
                } else {
                    nodep -= DPI;
                }
            }
            let mp = mm + pl;
            let argpp = xls - mp - cosip * nodep;
            (ep, xincp, nodep, argpp, mp)
        }
    }
}
