//! # Smartmud: Typed Models for Stimulus-Responsive Drilling Fluids
//!
//! A pure-computation library for drilling fluids loaded with hybrid
//! nanoparticles whose size responds to downhole pressure, temperature and pH.
//! Every evaluation runs the same pipeline:
//!
//! ```text
//! Stimulus -> ResponseModel -> diameter -> RheologyModel -> shear-stress curve -> Metrics
//! ```
//!
//! Each stage is a stateless function over explicit configuration values, so the
//! same call with the same inputs always yields the same outputs.
//!
//! ## Example
//!
//! ```
//! use smartmud::{Parameters, Simulator, Stimulus};
//!
//! let simulator = Simulator::new(Parameters::multi_stimulus()).unwrap();
//! let evaluation = simulator.evaluate(&Stimulus::new(5000.0, 90.0, 7.0)).unwrap();
//!
//! // The reference stimulus is the neutral point of every response formula
//! assert!((evaluation.diameter - 50.0).abs() < 1e-12);
//! assert!(evaluation.metrics.diameter_change_percent.abs() < 1e-12);
//! ```
//!
//! Out-of-domain input is reported instead of turning into `NaN`:
//!
//! ```
//! use smartmud::models::{DiameterFormula, ResponseConstants, compute_diameter};
//! use smartmud::{ModelError, ReferenceConditions, Stimulus};
//!
//! let constants = ResponseConstants::pressure_logarithmic();
//! let result = compute_diameter(
//!     &Stimulus::new(-10.0, 90.0, 7.0),
//!     &constants,
//!     DiameterFormula::Logarithmic,
//!     &ReferenceConditions::default(),
//! );
//! assert!(matches!(result, Err(ModelError::NonPositivePressure { .. })));
//! ```
//!
//! ## Optional Features
//!
//! - **`autodiff`**: Stimulus sensitivities using `num-dual`
//! - **`solvers`**: Time-domain swelling kinetics using `differential-equations`
//!
//! Both are enabled by default:
//! ```toml
//! [dependencies]
//! smartmud = { version = "0.1", default-features = false, features = ["solvers"] }
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

// Core modules
pub mod config;
pub mod metrics;
pub mod models;
pub mod simulator;
pub mod sweep;

// Optional feature modules
#[cfg(feature = "autodiff")]
pub mod autodiff;

pub mod solvers;

pub use config::{ConfigError, ConfigResult, Parameters};
pub use metrics::{Metrics, MetricsModel, StabilityTier, classify_stability, compute_metrics};
pub use models::{
    DiameterFormula, NanoparticleState, ResponseConstants, ResponseModel, RheologyConstants,
    RheologyCurve, RheologyModel, ShearRateRange, compute_diameter, compute_rheology_curve,
};
pub use simulator::{Evaluation, Simulator};
pub use sweep::{StimulusAxis, SweepPoint, sweep, sweep_axis};

/// Result type for model evaluations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while evaluating the response, rheology or metric models.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// A logarithm or ratio of pressure was requested for a non-positive pressure
    #[error("Pressure must be positive for {formula}, got {pressure} psi")]
    NonPositivePressure { pressure: f64, formula: &'static str },
    /// An input value was NaN or infinite
    #[error("Input '{name}' must be finite, got {value}")]
    NonFiniteInput { name: &'static str, value: f64 },
    /// A computed quantity came out NaN or infinite
    #[error("Computed '{quantity}' is not finite")]
    NonFiniteResult { quantity: &'static str },
    /// Shear-rate samples were empty, non-positive or not strictly increasing
    #[error("Invalid shear rates: {0}")]
    InvalidShearRates(String),
    /// A percentage change was requested against a zero baseline
    #[error("Cannot compute percentage change of '{quantity}' against a zero baseline")]
    ZeroBaseline { quantity: &'static str },
    /// Invalid configuration reached a computation
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Downhole environmental conditions seen by the nanoparticles.
///
/// The model accepts any real value; operating ranges are 2000-15000 psi,
/// 50-200 °C and pH 4-12. Formulas that take a logarithm of pressure reject
/// non-positive pressure explicitly.
///
/// # Examples
///
/// ```
/// use smartmud::Stimulus;
///
/// let stimulus = Stimulus::new(10000.0, 150.0, 9.5);
/// assert_eq!(stimulus.pressure, 10000.0);
/// assert_eq!(Stimulus::reference().ph, 7.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    /// Pressure (psi)
    pub pressure: f64,
    /// Temperature (°C)
    pub temperature: f64,
    /// pH (dimensionless)
    pub ph: f64,
}

impl Stimulus {
    /// Creates a stimulus from pressure (psi), temperature (°C) and pH.
    pub fn new(pressure: f64, temperature: f64, ph: f64) -> Self {
        Stimulus { pressure, temperature, ph }
    }

    /// The neutral stimulus: 5000 psi, 90 °C, pH 7.
    pub fn reference() -> Self {
        ReferenceConditions::default().stimulus()
    }

    /// Returns a copy with a different pressure.
    pub fn with_pressure(self, pressure: f64) -> Self {
        Stimulus { pressure, ..self }
    }

    /// Returns a copy with a different temperature.
    pub fn with_temperature(self, temperature: f64) -> Self {
        Stimulus { temperature, ..self }
    }

    /// Returns a copy with a different pH.
    pub fn with_ph(self, ph: f64) -> Self {
        Stimulus { ph, ..self }
    }

    /// Rejects NaN or infinite components.
    pub fn ensure_finite(&self) -> ModelResult<()> {
        ensure_finite("pressure", self.pressure)?;
        ensure_finite("temperature", self.temperature)?;
        ensure_finite("ph", self.ph)
    }
}

impl Default for Stimulus {
    fn default() -> Self {
        Self::reference()
    }
}

/// Neutral point of the response and consistency formulas.
///
/// Every stimulus term is written as a normalised deviation from these values,
/// e.g. `(T - temperature) / temperature_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConditions {
    /// Reference temperature Tref (°C)
    pub temperature: f64,
    /// Divisor of the temperature deviation (°C)
    pub temperature_scale: f64,
    /// Reference pressure Pref (psi)
    pub pressure: f64,
    /// Divisor of the pressure deviation (psi)
    pub pressure_scale: f64,
    /// Neutral pH
    pub neutral_ph: f64,
}

impl ReferenceConditions {
    /// The reference point as a stimulus.
    pub fn stimulus(&self) -> Stimulus {
        Stimulus::new(self.pressure, self.temperature, self.neutral_ph)
    }

    /// Same reference point with an unnormalised temperature deviation `(T - Tref)`.
    pub fn with_unit_temperature_scale(self) -> Self {
        ReferenceConditions { temperature_scale: 1.0, ..self }
    }

    pub(crate) fn validate(&self) -> ConfigResult<()> {
        config::require_nonzero("reference.temperature_scale", self.temperature_scale)?;
        config::require_nonzero("reference.pressure_scale", self.pressure_scale)?;
        config::require_finite("reference.temperature", self.temperature)?;
        config::require_finite("reference.pressure", self.pressure)?;
        config::require_finite("reference.neutral_ph", self.neutral_ph)
    }
}

impl Default for ReferenceConditions {
    fn default() -> Self {
        ReferenceConditions {
            temperature: 90.0,
            temperature_scale: 90.0,
            pressure: 5000.0,
            pressure_scale: 10000.0,
            neutral_ph: 7.0,
        }
    }
}

/// Numeric type the closed-form models are written over.
///
/// Implemented for `f64` and, with the `autodiff` feature, for `num_dual::Dual64`
/// so the response formulas can be differentiated without a second copy.
///
/// | Method | Description |
/// |--------|-------------|
/// | `exp(self)` | Exponential function |
/// | `ln(self)` | Natural logarithm |
/// | `powf(self, n)` | Power function |
/// | `re(self)` | Real part (the value itself for `f64`) |
pub trait Scalar:
    Copy
    + From<f64>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
{
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn powf(self, n: f64) -> Self;
    fn re(self) -> f64;
}

impl Scalar for f64 {
    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn powf(self, n: f64) -> Self {
        f64::powf(self, n)
    }

    fn re(self) -> f64 {
        self
    }
}

#[cfg(feature = "autodiff")]
impl Scalar for num_dual::Dual64 {
    fn exp(self) -> Self {
        <Self as num_dual::DualNum<f64>>::exp(&self)
    }

    fn ln(self) -> Self {
        <Self as num_dual::DualNum<f64>>::ln(&self)
    }

    fn powf(self, n: f64) -> Self {
        <Self as num_dual::DualNum<f64>>::powf(&self, n)
    }

    fn re(self) -> f64 {
        self.re
    }
}

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> ModelResult<()> {
    if value.is_finite() { Ok(()) } else { Err(ModelError::NonFiniteInput { name, value }) }
}

pub(crate) fn finite_result(quantity: &'static str, value: f64) -> ModelResult<f64> {
    if value.is_finite() { Ok(value) } else { Err(ModelError::NonFiniteResult { quantity }) }
}

/// Percentage change of `value` relative to `baseline`, sign preserved.
///
/// # Examples
///
/// ```
/// use smartmud::percent_change;
///
/// assert!((percent_change("diameter", 54.0, 50.0).unwrap() - 8.0).abs() < 1e-12);
/// assert!(percent_change("diameter", 1.0, 0.0).is_err());
/// ```
pub fn percent_change(quantity: &'static str, value: f64, baseline: f64) -> ModelResult<f64> {
    if baseline == 0.0 {
        return Err(ModelError::ZeroBaseline { quantity });
    }
    finite_result(quantity, (value - baseline) / baseline * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_stimulus() {
        let stimulus = Stimulus::reference();
        assert_eq!(stimulus, Stimulus::new(5000.0, 90.0, 7.0));
        assert_eq!(Stimulus::default(), stimulus);
    }

    #[test]
    fn test_stimulus_builders() {
        let stimulus = Stimulus::reference().with_pressure(12000.0).with_ph(4.5);
        assert_eq!(stimulus.pressure, 12000.0);
        assert_eq!(stimulus.temperature, 90.0);
        assert_eq!(stimulus.ph, 4.5);
    }

    #[test]
    fn test_non_finite_stimulus_rejected() {
        let stimulus = Stimulus::new(5000.0, f64::NAN, 7.0);
        match stimulus.ensure_finite() {
            Err(ModelError::NonFiniteInput { name, .. }) => assert_eq!(name, "temperature"),
            other => panic!("Expected NonFiniteInput, got {:?}", other),
        }
    }

    #[test]
    fn test_percent_change_sign_preserved() {
        assert!((percent_change("viscosity", 45.0, 50.0).unwrap() + 10.0).abs() < 1e-12);
        assert_eq!(
            percent_change("viscosity", 1.0, 0.0),
            Err(ModelError::ZeroBaseline { quantity: "viscosity" })
        );
    }

    #[test]
    fn test_reference_conditions_validation() {
        assert!(ReferenceConditions::default().validate().is_ok());

        let broken = ReferenceConditions { pressure_scale: 0.0, ..Default::default() };
        assert!(broken.validate().is_err());

        let unit = ReferenceConditions::default().with_unit_temperature_scale();
        assert_eq!(unit.temperature_scale, 1.0);
        assert_eq!(unit.temperature, 90.0);
    }

    #[test]
    fn test_scalar_f64_matches_std() {
        let x: f64 = 2.5;
        assert_eq!(Scalar::exp(x), x.exp());
        assert_eq!(Scalar::ln(x), x.ln());
        assert_eq!(Scalar::powf(x, 0.7), x.powf(0.7));
        assert_eq!(Scalar::re(x), x);
    }
}
