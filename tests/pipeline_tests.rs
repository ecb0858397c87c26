//! End-to-end tests of the stimulus -> diameter -> rheology -> metrics pipeline.

use smartmud::metrics::FluidLossModel;
use smartmud::models::{
    DiameterFormula, KineticConstants, ResponseConstants, RheologyModel, ShearRateRange,
    compute_rheology_curve, run_time_domain_kinetics,
};
use smartmud::{
    ModelError, Parameters, ReferenceConditions, Simulator, StabilityTier, Stimulus, StimulusAxis,
    classify_stability, compute_diameter, compute_metrics, sweep_axis,
};

fn rates() -> Vec<f64> {
    ShearRateRange::default().samples().unwrap()
}

#[test]
fn test_neutral_point_multiplicative_scenario() {
    let reference = ReferenceConditions::default().with_unit_temperature_scale();
    let constants = ResponseConstants::new(50.0, 0.02, 0.002, -0.0015);
    let stimulus = Stimulus::new(5000.0, 90.0, 7.0);

    let d = compute_diameter(&stimulus, &constants, DiameterFormula::Multiplicative, &reference)
        .unwrap();
    assert!((d - 50.0).abs() < 1e-12);

    let simulator = Simulator::new(Parameters::multi_stimulus()).unwrap();
    let evaluation = simulator.evaluate(&stimulus).unwrap();
    assert!((evaluation.metrics.diameter_change_percent).abs() < 1e-12);
}

#[test]
fn test_neutral_point_additive_is_exact() {
    for formula in [DiameterFormula::Additive, DiameterFormula::Multiplicative] {
        let d = compute_diameter(
            &Stimulus::reference(),
            &ResponseConstants::additive_hybrid(),
            formula,
            &ReferenceConditions::default(),
        )
        .unwrap();
        assert_eq!(d, 50.0, "{} formula moved off D0 at the reference point", formula);
    }
}

#[test]
fn test_ph_only_additive_scenario() {
    let evaluation = Simulator::new(Parameters::ph_only())
        .unwrap()
        .evaluate(&Stimulus::new(5000.0, 90.0, 9.0))
        .unwrap();
    assert!((evaluation.diameter - 54.0).abs() < 1e-9);
    assert!((evaluation.metrics.diameter_change_percent - 8.0).abs() < 1e-9);
}

#[test]
fn test_logarithmic_scenario() {
    let d = compute_diameter(
        &Stimulus::new(10000.0, 90.0, 7.0),
        &ResponseConstants::pressure_logarithmic(),
        DiameterFormula::Logarithmic,
        &ReferenceConditions::default(),
    )
    .unwrap();
    assert!((d - 48.96).abs() < 0.005, "got {}", d);

    let negative = compute_diameter(
        &Stimulus::new(-5000.0, 90.0, 7.0),
        &ResponseConstants::pressure_logarithmic(),
        DiameterFormula::Logarithmic,
        &ReferenceConditions::default(),
    );
    assert!(matches!(negative, Err(ModelError::NonPositivePressure { .. })));
}

#[test]
fn test_diameter_monotonic_per_dimension() {
    let params = Parameters::multi_stimulus();
    let cases = [
        (StimulusAxis::Ph, (4..=12).map(|v| v as f64).collect::<Vec<_>>(), 1.0),
        (StimulusAxis::Temperature, (5..=20).map(|v| v as f64 * 10.0).collect(), 1.0),
        (StimulusAxis::Pressure, (2..=15).map(|v| v as f64 * 1000.0).collect(), -1.0),
    ];

    for (axis, values, sign) in cases {
        let points = sweep_axis(&Stimulus::reference(), axis, &values, &params).unwrap();
        for pair in points.windows(2) {
            let delta = pair[1].diameter - pair[0].diameter;
            assert!(delta * sign > 0.0, "{} not monotonic: {:?}", axis, delta);
        }
    }
}

#[test]
fn test_curves_match_rate_grid_and_are_non_decreasing() {
    let rates = rates();
    for name in smartmud::config::PRESET_NAMES {
        let simulator = Simulator::new(Parameters::preset(name).unwrap()).unwrap();
        let evaluation = simulator.evaluate(&Stimulus::new(12000.0, 150.0, 10.0)).unwrap();
        assert_eq!(evaluation.hybrid.len(), rates.len());
        assert_eq!(evaluation.conventional.len(), rates.len());
        for pair in evaluation.hybrid.shear_stresses().windows(2) {
            assert!(pair[1] >= pair[0], "preset {} produced a decreasing curve", name);
        }
    }
}

#[test]
fn test_reference_diameter_reproduces_conventional_curve() {
    let model = RheologyModel::default();
    let rates = rates();
    let reference = ReferenceConditions::default();
    let hybrid =
        compute_rheology_curve(50.0, &reference.stimulus(), &rates, &model, 50.0, &reference)
            .unwrap();
    let conventional = model.conventional_curve(&rates).unwrap();
    assert_eq!(hybrid, conventional);
}

#[test]
fn test_stability_and_fluid_loss_bounds() {
    let rates = rates();
    let base = RheologyModel::default().conventional_curve(&rates).unwrap();

    let mut very_thick = RheologyModel::default();
    very_thick.constants.yield_stress_base = 10000.0;
    let thick = very_thick.conventional_curve(&rates).unwrap();

    let metrics = compute_metrics(&thick, &base, 50.0, 50.0, 100.0).unwrap();
    assert_eq!(metrics.stability_score, 0.0);
    assert_eq!(classify_stability(metrics.stability_score), StabilityTier::Low);
    assert!((0.0..=60.0).contains(&metrics.fluid_loss_reduction_percent));

    for name in smartmud::config::PRESET_NAMES {
        let params = Parameters::preset(name).unwrap();
        let cap = params.metrics.fluid_loss.cap();
        let simulator = Simulator::new(params).unwrap();
        for pressure in [2000.0, 5000.0, 15000.0] {
            for temperature in [50.0, 200.0] {
                for ph in [4.0, 12.0] {
                    let stimulus = Stimulus::new(pressure, temperature, ph);
                    let m = simulator.evaluate(&stimulus).unwrap().metrics;
                    assert!((0.0..=100.0).contains(&m.stability_score));
                    assert!((0.0..=cap).contains(&m.fluid_loss_reduction_percent));
                }
            }
        }
    }
}

#[test]
fn test_saturating_fluid_loss_grows_with_pressure() {
    let simulator = Simulator::new(Parameters::pressure_logarithmic()).unwrap();
    assert!(matches!(
        simulator.parameters().metrics.fluid_loss,
        FluidLossModel::ExponentialSaturation { .. }
    ));
    let low = simulator.evaluate(&Stimulus::new(6000.0, 90.0, 7.0)).unwrap();
    let high = simulator.evaluate(&Stimulus::new(14000.0, 90.0, 7.0)).unwrap();
    assert!(high.metrics.fluid_loss_reduction_percent > low.metrics.fluid_loss_reduction_percent);
    assert!(high.diameter < low.diameter);
}

#[test]
#[cfg(feature = "solvers")]
fn test_kinetics_scenario() {
    let constants = KineticConstants::new(0.05, 80.0, 1.4);
    let trajectory = run_time_domain_kinetics(1.0, 120.0, &constants, 100.0, 500).unwrap();

    assert_eq!(trajectory.first(), Some(&(0.0, 1.0)));
    assert_eq!(trajectory.last().map(|(t, _)| *t), Some(100.0));
    for pair in trajectory.windows(2) {
        assert!(pair[1].1 >= pair[0].1);
    }
    assert!(trajectory.iter().all(|(_, s)| *s <= 1.4));
}

#[test]
fn test_kinetics_rejects_negative_max_expansion() {
    let constants = KineticConstants::new(0.05, 80.0, -1.4);
    assert!(run_time_domain_kinetics(1.0, 120.0, &constants, 100.0, 500).is_err());
}

#[test]
#[cfg(feature = "autodiff")]
fn test_sensitivity_signs_match_coefficients() {
    use smartmud::autodiff::diameter_sensitivity;

    let params = Parameters::multi_stimulus();
    let s = diameter_sensitivity(&Stimulus::reference(), &params.response, &params.reference)
        .unwrap();
    assert!(s.d_ph > 0.0);
    assert!(s.d_temperature > 0.0);
    assert!(s.d_pressure < 0.0);
}
