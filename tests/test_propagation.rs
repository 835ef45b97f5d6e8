use approx::assert_relative_eq;
use hifitime::{Epoch, TimeScale};

use satprop::constants::DPI;
use satprop::propagator::PropagationMode;
use satprop::{OrbitalElements, Propagator, RawElements, SatpropError};

/// Satellite 58002B (Vanguard 1): the classical near-earth verification case.
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

fn geostationary(inclination_rad: f64) -> OrbitalElements {
    OrbitalElements::new(RawElements {
        epoch: Epoch::from_gregorian(2010, 6, 15, 0, 0, 0, 0, TimeScale::UTC),
        eccentricity: 0.0002,
        inclination: inclination_rad,
        ascending_node_longitude: 64.0_f64.to_radians(),
        periapsis_argument: 160.0_f64.to_radians(),
        mean_anomaly: 45.0_f64.to_radians(),
        mean_motion: 1.002_701 * DPI / 1440.0,
        drag_term: 1.0e-4,
    })
    .unwrap()
}

fn molniya() -> OrbitalElements {
    OrbitalElements::new(RawElements {
        epoch: Epoch::from_gregorian(2010, 6, 15, 0, 0, 0, 0, TimeScale::UTC),
        eccentricity: 0.7411,
        inclination: 63.4_f64.to_radians(),
        ascending_node_longitude: 120.0_f64.to_radians(),
        periapsis_argument: 270.0_f64.to_radians(),
        mean_anomaly: 10.0_f64.to_radians(),
        mean_motion: 2.006 * DPI / 1440.0,
        drag_term: 1.0e-4,
    })
    .unwrap()
}

#[test]
fn test_reference_trajectory_58002b() {
    // Published SGP4 verification vectors for 58002B at 0 and 360 minutes
    let mut propagator = Propagator::new(vanguard());

    let state = propagator.propagate(0.0).unwrap();
    assert_relative_eq!(state.position.x, 7022.465_292_66, epsilon = 1e-2);
    assert_relative_eq!(state.position.y, -1400.082_967_55, epsilon = 1e-2);
    assert_relative_eq!(state.position.z, 0.039_951_55, epsilon = 1e-2);
    assert_relative_eq!(state.velocity.x, 1.893_841_015, epsilon = 1e-5);
    assert_relative_eq!(state.velocity.y, 6.405_893_759, epsilon = 1e-5);
    assert_relative_eq!(state.velocity.z, 4.534_807_250, epsilon = 1e-5);

    let state = propagator.propagate(360.0).unwrap();
    assert_relative_eq!(state.position.x, -7154.031_202_02, epsilon = 5e-2);
    assert_relative_eq!(state.position.y, -3783.176_825_04, epsilon = 5e-2);
    assert_relative_eq!(state.position.z, -3536.194_122_94, epsilon = 5e-2);
    assert_relative_eq!(state.velocity.x, 4.741_887_409, epsilon = 1e-4);
    assert_relative_eq!(state.velocity.y, -4.151_817_765, epsilon = 1e-4);
    assert_relative_eq!(state.velocity.z, -2.093_935_425, epsilon = 1e-4);
}

#[test]
fn test_branch_selection_is_deterministic() {
    for _ in 0..3 {
        let near = Propagator::new(vanguard());
        assert!(matches!(near.mode(), PropagationMode::NearEarth(_)));

        let deep = Propagator::new(geostationary(7.0_f64.to_radians()));
        assert!(matches!(deep.mode(), PropagationMode::DeepSpace(_, _)));
    }
}

#[test]
fn test_deep_space_epoch_consistency() {
    // At tsince = 0 a geostationary orbit sits at its mean radius with the
    // circular velocity, to within the perturbation amplitudes
    let mut propagator = Propagator::new(geostationary(7.0_f64.to_radians()));
    let state = propagator.propagate(0.0).unwrap();

    assert_relative_eq!(state.position.norm(), 42_164.0, epsilon = 150.0);
    assert_relative_eq!(state.velocity.norm(), 3.0747, epsilon = 0.05);
}

#[test]
fn test_resonance_stepping_matches_direct_call() {
    // Walking the integrator forward through intermediate times must land on
    // the same checkpoints, and therefore the same state, as one direct call
    let elements = geostationary(7.0_f64.to_radians());

    let mut stepped = Propagator::new(elements.clone());
    for t in [360.0, 720.0, 1440.0, 2160.0, 2880.0, 3600.0, 4320.0] {
        stepped.propagate(t).unwrap();
    }
    let from_steps = stepped.propagate(5000.0).unwrap();

    let mut direct = Propagator::new(elements);
    let one_shot = direct.propagate(5000.0).unwrap();

    assert_relative_eq!(from_steps.position.x, one_shot.position.x, max_relative = 1e-10);
    assert_relative_eq!(from_steps.position.y, one_shot.position.y, max_relative = 1e-10);
    assert_relative_eq!(from_steps.position.z, one_shot.position.z, max_relative = 1e-10);
    assert_relative_eq!(from_steps.velocity.x, one_shot.velocity.x, max_relative = 1e-10);
}

#[test]
fn test_geopotential_resonance_trajectory_stays_bounded() {
    let mut propagator = Propagator::new(molniya());

    // One week of a Molniya orbit: radius must stay between a perigee above
    // the atmosphere and an apogee below ~47 000 km
    for i in 1..=56 {
        let state = propagator.propagate(i as f64 * 180.0).unwrap();
        let r = state.position.norm();
        assert!((6500.0..47_500.0).contains(&r), "radius {r} km at step {i}");
        let v = state.velocity.norm();
        assert!((1.0..11.0).contains(&v), "speed {v} km/s at step {i}");
    }
}

#[test]
fn test_lyddane_transition_is_continuous() {
    // Inclination pinned right at the 0.2 rad switch of the node update: the
    // lunar/solar periodics wobble the perturbed inclination across the
    // threshold, and the position must never jump between nearby times
    let mut propagator = Propagator::new(geostationary(0.2));

    let mut previous = propagator.propagate(0.0).unwrap();
    let mut t = 5.0;
    while t <= 4320.0 {
        let state = propagator.propagate(t).unwrap();
        let step = (state.position - previous.position).norm();
        // 5 minutes of geostationary motion is ~920 km of arc
        assert!(step < 1500.0, "{step} km jump at t = {t} min");
        previous = state;
        t += 5.0;
    }
}

#[test]
fn test_high_drag_orbit_decays() {
    // Low perigee and an enormous B*: drag must shrink the orbit into the
    // Earth within a few days and report decay, not a garbage vector
    let elements = OrbitalElements::new(RawElements {
        epoch: Epoch::from_gregorian(2010, 6, 15, 0, 0, 0, 0, TimeScale::UTC),
        eccentricity: 0.01,
        inclination: 51.6_f64.to_radians(),
        ascending_node_longitude: 0.0,
        periapsis_argument: 0.0,
        mean_anomaly: 0.0,
        mean_motion: 16.3 * DPI / 1440.0,
        drag_term: 0.1,
    })
    .unwrap();
    let mut propagator = Propagator::new(elements);

    let mut decayed = false;
    let mut t = 0.0;
    while t <= 7200.0 {
        match propagator.propagate(t) {
            Ok(_) => {}
            Err(SatpropError::OrbitDecayed(_)) => {
                decayed = true;
                break;
            }
            Err(other) => panic!("expected decay, got {other}"),
        }
        t += 120.0;
    }
    assert!(decayed, "orbit never decayed within five days");
}

#[test]
fn test_backward_propagation() {
    let mut propagator = Propagator::new(vanguard());
    let state = propagator.propagate(-360.0).unwrap();

    // Same orbit, a few revolutions earlier
    let r = state.position.norm();
    assert!((6900.0..10_500.0).contains(&r), "radius {r} km");
}

#[test]
fn test_failed_call_leaves_propagator_usable() {
    // A decayed call must not poison later calls at valid offsets
    let elements = OrbitalElements::new(RawElements {
        epoch: Epoch::from_gregorian(2010, 6, 15, 0, 0, 0, 0, TimeScale::UTC),
        eccentricity: 0.01,
        inclination: 51.6_f64.to_radians(),
        ascending_node_longitude: 0.0,
        periapsis_argument: 0.0,
        mean_anomaly: 0.0,
        mean_motion: 16.3 * DPI / 1440.0,
        drag_term: 0.1,
    })
    .unwrap();
    let mut propagator = Propagator::new(elements);

    let early = propagator.propagate(1.0).unwrap();
    assert!(propagator.propagate(100_000.0).is_err());
    let retry = propagator.propagate(1.0).unwrap();
    assert_eq!(early.position, retry.position);
    assert_eq!(early.velocity, retry.velocity);
}
