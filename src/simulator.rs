//! Single-stimulus evaluation of the full pipeline.
//!
//! A [`Simulator`] owns a validated [`Parameters`] bundle and the sampled
//! shear-rate grid. Each call to [`Simulator::evaluate`] runs
//! response, rheology and metrics for one stimulus and returns every
//! intermediate result in an [`Evaluation`].

use crate::config::{ConfigResult, Parameters};
use crate::metrics::{Metrics, PropertyComparison, StabilityTier};
use crate::models::{IndividualResponses, KineticsTrajectory, RheologyCurve, validate_shear_rates};
use crate::solvers::SolverResult;
use crate::sweep::SweepPoint;
use crate::{ModelResult, Stimulus};
use serde::{Deserialize, Serialize};

/// Everything computed for one stimulus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub stimulus: Stimulus,
    /// Hybrid nanoparticle diameter (nm)
    pub diameter: f64,
    /// Diameters with one stimulus applied at a time
    pub individual: IndividualResponses,
    /// Shear-stress curve of the nanoparticle-laden fluid
    pub hybrid: RheologyCurve,
    /// Shear-stress curve of the base fluid
    pub conventional: RheologyCurve,
    pub metrics: Metrics,
    pub tier: StabilityTier,
    pub comparison: PropertyComparison,
}

/// Pipeline runner bound to one configuration.
///
/// # Examples
///
/// ```
/// use smartmud::{Parameters, Simulator, StabilityTier, Stimulus};
///
/// let simulator = Simulator::new(Parameters::ph_only()).unwrap();
/// let evaluation = simulator.evaluate(&Stimulus::reference().with_ph(9.0)).unwrap();
///
/// assert!((evaluation.diameter - 54.0).abs() < 1e-9);
/// assert!((evaluation.metrics.diameter_change_percent - 8.0).abs() < 1e-9);
/// assert_eq!(evaluation.hybrid.len(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct Simulator {
    parameters: Parameters,
    shear_rates: Vec<f64>,
}

impl Simulator {
    /// Validates `parameters` and samples the shear-rate grid.
    pub fn new(parameters: Parameters) -> ConfigResult<Self> {
        parameters.validate()?;
        let shear_rates = parameters.shear_rate_samples()?;
        log::debug!(
            "simulator ready: {} formula, {} shear-rate samples",
            parameters.response.formula,
            shear_rates.len()
        );
        Ok(Simulator { parameters, shear_rates })
    }

    /// Replaces the sampled grid with explicit shear rates.
    pub fn with_shear_rates(mut self, shear_rates: Vec<f64>) -> ModelResult<Self> {
        validate_shear_rates(&shear_rates)?;
        self.shear_rates = shear_rates;
        Ok(self)
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn shear_rates(&self) -> &[f64] {
        &self.shear_rates
    }

    /// Nanoparticle diameter (nm) for `stimulus`.
    pub fn diameter(&self, stimulus: &Stimulus) -> ModelResult<f64> {
        self.parameters.response.diameter(stimulus, &self.parameters.reference)
    }

    /// Hybrid shear-stress curve at `stimulus`, with its diameter.
    pub fn hybrid_curve(&self, stimulus: &Stimulus) -> ModelResult<(f64, RheologyCurve)> {
        let diameter = self.diameter(stimulus)?;
        let curve = self.parameters.rheology.curve(
            diameter,
            self.parameters.response.d0(),
            stimulus,
            &self.parameters.reference,
            &self.shear_rates,
        )?;
        Ok((diameter, curve))
    }

    /// Conventional baseline curve on the simulator's grid.
    pub fn conventional_curve(&self) -> ModelResult<RheologyCurve> {
        self.parameters.rheology.conventional_curve(&self.shear_rates)
    }

    /// Runs response, rheology and metrics for one stimulus.
    pub fn evaluate(&self, stimulus: &Stimulus) -> ModelResult<Evaluation> {
        let params = &self.parameters;
        let d0 = params.response.d0();

        let (diameter, hybrid) = self.hybrid_curve(stimulus)?;
        let individual = params.response.individual_responses(stimulus, &params.reference)?;
        let conventional = self.conventional_curve()?;
        let metrics = params.metrics.evaluate(&hybrid, &conventional, diameter, d0, stimulus)?;
        let comparison = PropertyComparison::new(&hybrid, &conventional, diameter);

        log::debug!(
            "evaluated P = {} psi, T = {} °C, pH = {}: D = {:.4} nm, stability {}",
            stimulus.pressure,
            stimulus.temperature,
            stimulus.ph,
            diameter,
            metrics.tier()
        );

        Ok(Evaluation {
            stimulus: *stimulus,
            diameter,
            individual,
            hybrid,
            conventional,
            tier: metrics.tier(),
            metrics,
            comparison,
        })
    }

    /// Evaluates each stimulus in order.
    pub fn sweep(&self, stimuli: &[Stimulus]) -> ModelResult<Vec<SweepPoint>> {
        log::debug!("sweeping {} stimuli", stimuli.len());
        stimuli
            .iter()
            .map(|stimulus| self.evaluate(stimulus).map(SweepPoint::from))
            .collect()
    }

    /// Time-domain swelling at a constant `temperature` (°C).
    pub fn kinetics(&self, temperature: f64) -> SolverResult<KineticsTrajectory> {
        self.parameters.kinetics.run(temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelError;
    use crate::config::ConfigError;

    #[test]
    fn test_reference_stimulus_reproduces_baseline() {
        let simulator = Simulator::new(Parameters::multi_stimulus()).unwrap();
        let evaluation = simulator.evaluate(&Stimulus::new(5000.0, 90.0, 7.0)).unwrap();

        assert_eq!(evaluation.diameter, 50.0);
        assert_eq!(evaluation.metrics.diameter_change_percent, 0.0);
        assert_eq!(evaluation.hybrid.shear_stresses(), evaluation.conventional.shear_stresses());
        assert_eq!(evaluation.metrics.viscosity_change_percent, 0.0);
        assert_eq!(evaluation.individual.ph, 50.0);
        assert_eq!(evaluation.individual.temperature, 50.0);
        assert_eq!(evaluation.individual.pressure, 50.0);
    }

    #[test]
    fn test_individual_responses_multi_stimulus() {
        let simulator = Simulator::new(Parameters::multi_stimulus()).unwrap();
        let evaluation = simulator.evaluate(&Stimulus::new(15000.0, 150.0, 10.0)).unwrap();

        assert!((evaluation.individual.ph - 53.0).abs() < 1e-9);
        assert!((evaluation.individual.temperature - 56.0).abs() < 1e-9);
        assert!((evaluation.individual.pressure - 49.925).abs() < 1e-9);
        let product = 50.0 * 1.06 * 1.12 * 0.9985;
        assert!((evaluation.diameter - product).abs() < 1e-9);
    }

    #[test]
    fn test_tier_matches_score() {
        let simulator = Simulator::new(Parameters::additive_hybrid()).unwrap();
        let evaluation = simulator.evaluate(&Stimulus::new(12000.0, 160.0, 9.0)).unwrap();
        assert_eq!(evaluation.tier, evaluation.metrics.tier());
        assert!((0.0..=100.0).contains(&evaluation.metrics.stability_score));
        assert!(evaluation.metrics.fluid_loss_reduction_percent <= 50.0);
    }

    #[test]
    fn test_power_law_base_fluid_evaluates() {
        let mut params = Parameters::default();
        params.rheology.constants.yield_stress_base = 0.0;
        let simulator = Simulator::new(params).unwrap();

        let evaluation = simulator.evaluate(&Stimulus::new(8000.0, 120.0, 9.0)).unwrap();
        assert_eq!(evaluation.metrics.yield_stress_change_percent, None);
        assert!(evaluation.metrics.consistency_change_percent.is_some());
        assert!(evaluation.metrics.diameter_change_percent > 0.0);
        assert!(evaluation.metrics.viscosity_change_percent.is_finite());
        assert!((0.0..=60.0).contains(&evaluation.metrics.fluid_loss_reduction_percent));

        let points = simulator.sweep(&[Stimulus::reference(), Stimulus::new(12000.0, 60.0, 5.0)]);
        assert_eq!(points.unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_parameters_rejected_up_front() {
        let mut params = Parameters::default();
        params.shear_rates.start = 0.0;
        assert!(matches!(Simulator::new(params), Err(ConfigError::InvalidConstant { .. })));
    }

    #[test]
    fn test_custom_shear_rates() {
        let simulator = Simulator::new(Parameters::default())
            .unwrap()
            .with_shear_rates(vec![3.0, 6.0, 100.0, 300.0, 600.0])
            .unwrap();
        let evaluation = simulator.evaluate(&Stimulus::reference()).unwrap();
        assert_eq!(evaluation.hybrid.len(), 5);

        let rejected =
            Simulator::new(Parameters::default()).unwrap().with_shear_rates(vec![10.0, 5.0]);
        assert!(matches!(rejected, Err(ModelError::InvalidShearRates(_))));
    }

    #[test]
    fn test_logarithmic_rejects_non_positive_pressure() {
        let simulator = Simulator::new(Parameters::pressure_logarithmic()).unwrap();
        assert!(matches!(
            simulator.evaluate(&Stimulus::new(0.0, 90.0, 7.0)),
            Err(ModelError::NonPositivePressure { .. })
        ));
        let evaluation = simulator.evaluate(&Stimulus::new(10000.0, 90.0, 7.0)).unwrap();
        assert!((evaluation.diameter - 48.9603).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_stimulus_rejected() {
        let simulator = Simulator::new(Parameters::default()).unwrap();
        assert!(matches!(
            simulator.evaluate(&Stimulus::new(f64::INFINITY, 90.0, 7.0)),
            Err(ModelError::NonFiniteInput { .. })
        ));
    }

    #[test]
    #[cfg(feature = "solvers")]
    fn test_kinetics_from_parameters() {
        let simulator = Simulator::new(Parameters::default()).unwrap();
        let trajectory = simulator.kinetics(120.0).unwrap();
        assert_eq!(trajectory.samples.len(), 500);
        assert_eq!(trajectory.temperature, 120.0);
    }
}
