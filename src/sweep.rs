//! Parameter sweeps over lists of stimuli.
//!
//! A sweep evaluates the pipeline once per stimulus and keeps the input
//! order, so the `i`-th point always belongs to the `i`-th input.
//!
//! # Example
//!
//! ```
//! use smartmud::{Parameters, Stimulus, StimulusAxis, sweep_axis};
//!
//! let points = sweep_axis(
//!     &Stimulus::reference(),
//!     StimulusAxis::Temperature,
//!     &[60.0, 90.0, 120.0, 150.0],
//!     &Parameters::temperature_only(),
//! )
//! .unwrap();
//!
//! assert_eq!(points.len(), 4);
//! assert!(points[3].diameter > points[0].diameter);
//! ```

use crate::config::Parameters;
use crate::metrics::Metrics;
use crate::models::RheologyCurve;
use crate::simulator::{Evaluation, Simulator};
use crate::{ModelResult, Stimulus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One stimulus dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusAxis {
    /// Pressure (psi)
    Pressure,
    /// Temperature (°C)
    Temperature,
    /// pH
    Ph,
}

impl StimulusAxis {
    pub const ALL: [StimulusAxis; 3] =
        [StimulusAxis::Pressure, StimulusAxis::Temperature, StimulusAxis::Ph];

    /// `base` with this dimension set to `value`.
    pub fn apply(&self, base: &Stimulus, value: f64) -> Stimulus {
        match self {
            StimulusAxis::Pressure => base.with_pressure(value),
            StimulusAxis::Temperature => base.with_temperature(value),
            StimulusAxis::Ph => base.with_ph(value),
        }
    }

    /// Value of this dimension in `stimulus`.
    pub fn value(&self, stimulus: &Stimulus) -> f64 {
        match self {
            StimulusAxis::Pressure => stimulus.pressure,
            StimulusAxis::Temperature => stimulus.temperature,
            StimulusAxis::Ph => stimulus.ph,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StimulusAxis::Pressure => "pressure",
            StimulusAxis::Temperature => "temperature",
            StimulusAxis::Ph => "ph",
        }
    }
}

impl fmt::Display for StimulusAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one sweep step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub stimulus: Stimulus,
    /// Nanoparticle diameter (nm)
    pub diameter: f64,
    /// Hybrid shear-stress curve
    pub curve: RheologyCurve,
    pub metrics: Metrics,
}

impl From<Evaluation> for SweepPoint {
    fn from(evaluation: Evaluation) -> Self {
        SweepPoint {
            stimulus: evaluation.stimulus,
            diameter: evaluation.diameter,
            curve: evaluation.hybrid,
            metrics: evaluation.metrics,
        }
    }
}

/// Evaluates every stimulus under `parameters`, in input order.
///
/// The first failing stimulus aborts the sweep with its error.
pub fn sweep(stimuli: &[Stimulus], parameters: &Parameters) -> ModelResult<Vec<SweepPoint>> {
    Simulator::new(parameters.clone())?.sweep(stimuli)
}

/// Varies one stimulus dimension over `values`, holding the others at `base`.
pub fn sweep_axis(
    base: &Stimulus,
    axis: StimulusAxis,
    values: &[f64],
    parameters: &Parameters,
) -> ModelResult<Vec<SweepPoint>> {
    log::debug!("sweeping {} over {} values", axis, values.len());
    let stimuli: Vec<Stimulus> = values.iter().map(|&value| axis.apply(base, value)).collect();
    sweep(&stimuli, parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelError;

    #[test]
    fn test_sweep_preserves_order() {
        let stimuli = vec![
            Stimulus::new(15000.0, 90.0, 7.0),
            Stimulus::new(2000.0, 90.0, 7.0),
            Stimulus::new(5000.0, 90.0, 7.0),
        ];
        let points = sweep(&stimuli, &Parameters::pressure_only()).unwrap();
        assert_eq!(points.len(), 3);
        for (point, stimulus) in points.iter().zip(&stimuli) {
            assert_eq!(point.stimulus, *stimulus);
        }
        assert!(points[0].diameter > points[2].diameter);
        assert!(points[1].diameter < points[2].diameter);
        assert_eq!(points[2].diameter, 50.0);
    }

    #[test]
    fn test_sweep_axis_temperatures() {
        let temperatures = [60.0, 90.0, 120.0, 150.0];
        let points = sweep_axis(
            &Stimulus::reference(),
            StimulusAxis::Temperature,
            &temperatures,
            &Parameters::temperature_only(),
        )
        .unwrap();

        for (point, t) in points.iter().zip(temperatures) {
            assert_eq!(point.stimulus.temperature, t);
            assert_eq!(point.stimulus.pressure, 5000.0);
            let expected = 50.0 * (1.0 + 0.002 * (t - 90.0));
            assert!((point.diameter - expected).abs() < 1e-9);
            assert_eq!(point.curve.len(), 100);
        }
        // Thermal thinning outweighs the diameter effect on K
        assert!(points[3].curve.max_stress() < points[0].curve.max_stress());
    }

    #[test]
    fn test_empty_sweep() {
        assert!(sweep(&[], &Parameters::default()).unwrap().is_empty());
    }

    #[test]
    fn test_sweep_stops_at_first_error() {
        let stimuli = [Stimulus::new(5000.0, 90.0, 7.0), Stimulus::new(-1.0, 90.0, 7.0)];
        assert!(matches!(
            sweep(&stimuli, &Parameters::pressure_logarithmic()),
            Err(ModelError::NonPositivePressure { .. })
        ));
    }

    #[test]
    fn test_invalid_parameters_surface_as_config_error() {
        let mut params = Parameters::default();
        params.rheology.constants.flow_behavior_index = 0.0;
        assert!(matches!(sweep(&[Stimulus::reference()], &params), Err(ModelError::Config(_))));
    }

    #[test]
    fn test_axis_apply_and_value() {
        let base = Stimulus::reference();
        for axis in StimulusAxis::ALL {
            let moved = axis.apply(&base, 11.0);
            assert_eq!(axis.value(&moved), 11.0);
        }
        assert_eq!(StimulusAxis::Ph.to_string(), "ph");
    }
}
