//! Herschel-Bulkley rheology modulated by nanoparticle size and downhole conditions.
//!
//! # Constitutive Law
//! `tau(gamma) = tau_y + K * gamma^n`
//!
//! # Couplings
//! - Yield stress: constant, fractional `tau_y0 * (1 + beta*(D - D0)/D0)` or
//!   absolute `tau_y0 * (1 + beta*(D - D0))`
//! - Consistency index: `K0 * (1 + beta_K*(D - D0)) * thermal factor`, where the
//!   thermal factor is `1`, `exp(-aT*(T - Tref)) * (1 + aP*(P - Pref)/Pscale)` or
//!   `(1 + aT*(T - Tref)/Tscale) * (1 + aP*(P - Pref)/Pscale)`
//!
//! The conventional fluid is the same law with no nanoparticle effect:
//! `tau = tau_y0 + K0 * gamma^n`.
//!
//! # Example
//!
//! ```
//! use smartmud::models::{RheologyModel, ShearRateRange};
//! use smartmud::{ReferenceConditions, Stimulus};
//!
//! let model = RheologyModel::default();
//! let rates = ShearRateRange::default().samples().unwrap();
//! let curve = model
//!     .curve(55.0, 50.0, &Stimulus::reference(), &ReferenceConditions::default(), &rates)
//!     .unwrap();
//!
//! assert_eq!(curve.len(), 100);
//! assert!(curve.yield_stress() > model.constants.yield_stress_base);
//! ```

use crate::config::{self, ConfigResult};
use crate::{ModelError, ModelResult, ReferenceConditions, Stimulus, finite_result};
use serde::{Deserialize, Serialize};

/// Herschel-Bulkley parameters of the base (conventional) fluid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RheologyConstants {
    /// Yield stress tau_y0 (Pa)
    pub yield_stress_base: f64,
    /// Consistency index K0 (Pa·s^n)
    pub consistency_index: f64,
    /// Flow behaviour index n, in (0, 1]
    pub flow_behavior_index: f64,
}

impl RheologyConstants {
    pub fn new(yield_stress_base: f64, consistency_index: f64, flow_behavior_index: f64) -> Self {
        RheologyConstants { yield_stress_base, consistency_index, flow_behavior_index }
    }

    /// Water-based mud used across the calculators (Gokapai et al. 2024).
    pub fn water_based_mud() -> Self {
        Self::new(5.0, 0.02, 0.7)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        config::require_finite("rheology.yield_stress_base", self.yield_stress_base)?;
        config::require_finite("rheology.consistency_index", self.consistency_index)?;
        if self.yield_stress_base < 0.0 {
            return Err(config::invalid(
                "rheology.yield_stress_base",
                self.yield_stress_base,
                "must be non-negative",
            ));
        }
        if self.consistency_index < 0.0 {
            return Err(config::invalid(
                "rheology.consistency_index",
                self.consistency_index,
                "must be non-negative",
            ));
        }
        // A fluid with neither term has no stress to compare against
        if self.yield_stress_base == 0.0 && self.consistency_index == 0.0 {
            return Err(config::invalid(
                "rheology.consistency_index",
                self.consistency_index,
                "must be positive when the base yield stress is zero",
            ));
        }
        let n = self.flow_behavior_index;
        if !(n > 0.0 && n <= 1.0) {
            return Err(config::invalid("rheology.flow_behavior_index", n, "must lie in (0, 1]"));
        }
        Ok(())
    }
}

impl Default for RheologyConstants {
    fn default() -> Self {
        Self::water_based_mud()
    }
}

/// How the yield stress follows the nanoparticle diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum YieldStressCoupling {
    /// `tau_y = tau_y0`
    Constant,
    /// `tau_y = tau_y0 * (1 + beta * (D - D0) / D0)`
    Fractional { beta: f64 },
    /// `tau_y = tau_y0 * (1 + beta * (D - D0))`
    Absolute { beta: f64 },
}

impl YieldStressCoupling {
    /// Multiplier applied to the base yield stress.
    pub fn factor(&self, diameter: f64, d0: f64) -> f64 {
        match *self {
            YieldStressCoupling::Constant => 1.0,
            YieldStressCoupling::Fractional { beta } => 1.0 + beta * (diameter - d0) / d0,
            YieldStressCoupling::Absolute { beta } => 1.0 + beta * (diameter - d0),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        match *self {
            YieldStressCoupling::Constant => Ok(()),
            YieldStressCoupling::Fractional { beta } | YieldStressCoupling::Absolute { beta } => {
                config::require_finite("rheology.yield_stress.beta", beta)
            }
        }
    }
}

impl Default for YieldStressCoupling {
    fn default() -> Self {
        YieldStressCoupling::Fractional { beta: 0.4 }
    }
}

/// Temperature and pressure modulation of the consistency index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThermalModulation {
    /// No dependence on temperature or pressure
    None,
    /// `exp(-alpha_t * (T - Tref)) * (1 + alpha_p * (P - Pref) / Pscale)`
    Exponential { alpha_t: f64, alpha_p: f64 },
    /// `(1 + alpha_t * (T - Tref) / Tscale) * (1 + alpha_p * (P - Pref) / Pscale)`
    Linear { alpha_t: f64, alpha_p: f64 },
}

impl ThermalModulation {
    pub fn factor(&self, stimulus: &Stimulus, reference: &ReferenceConditions) -> f64 {
        let dp = (stimulus.pressure - reference.pressure) / reference.pressure_scale;
        match *self {
            ThermalModulation::None => 1.0,
            ThermalModulation::Exponential { alpha_t, alpha_p } => {
                (-alpha_t * (stimulus.temperature - reference.temperature)).exp()
                    * (1.0 + alpha_p * dp)
            }
            ThermalModulation::Linear { alpha_t, alpha_p } => {
                let dt =
                    (stimulus.temperature - reference.temperature) / reference.temperature_scale;
                (1.0 + alpha_t * dt) * (1.0 + alpha_p * dp)
            }
        }
    }
}

/// Consistency index model: `K = K0 * (1 + diameter_beta * (D - D0)) * thermal`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyModel {
    /// Sensitivity of K to the absolute diameter change (1/nm)
    #[serde(default)]
    pub diameter_beta: f64,
    pub thermal: ThermalModulation,
}

impl ConsistencyModel {
    /// `K = K0`
    pub fn constant() -> Self {
        ConsistencyModel { diameter_beta: 0.0, thermal: ThermalModulation::None }
    }

    /// `K = K0 * (1 + beta * (D - D0))`
    pub fn diameter_modulated(beta: f64) -> Self {
        ConsistencyModel { diameter_beta: beta, thermal: ThermalModulation::None }
    }

    /// `K = K0 * exp(-alpha_t * (T - Tref)) * (1 + alpha_p * (P - Pref) / Pscale)`
    pub fn thermal_exponential(alpha_t: f64, alpha_p: f64) -> Self {
        ConsistencyModel {
            diameter_beta: 0.0,
            thermal: ThermalModulation::Exponential { alpha_t, alpha_p },
        }
    }

    /// `K = K0 * (1 + alpha_t * (T - Tref) / Tscale) * (1 + alpha_p * (P - Pref) / Pscale)`
    pub fn thermal_linear(alpha_t: f64, alpha_p: f64) -> Self {
        ConsistencyModel {
            diameter_beta: 0.0,
            thermal: ThermalModulation::Linear { alpha_t, alpha_p },
        }
    }

    /// Adds a diameter dependence on top of the thermal modulation.
    pub fn with_diameter_beta(mut self, beta: f64) -> Self {
        self.diameter_beta = beta;
        self
    }

    /// Multiplier applied to the base consistency index.
    pub fn factor(
        &self,
        diameter: f64,
        d0: f64,
        stimulus: &Stimulus,
        reference: &ReferenceConditions,
    ) -> f64 {
        (1.0 + self.diameter_beta * (diameter - d0)) * self.thermal.factor(stimulus, reference)
    }

    fn validate(&self) -> ConfigResult<()> {
        config::require_finite("rheology.consistency.diameter_beta", self.diameter_beta)?;
        match self.thermal {
            ThermalModulation::None => Ok(()),
            ThermalModulation::Exponential { alpha_t, alpha_p }
            | ThermalModulation::Linear { alpha_t, alpha_p } => {
                config::require_finite("rheology.consistency.alpha_t", alpha_t)?;
                config::require_finite("rheology.consistency.alpha_p", alpha_p)
            }
        }
    }
}

impl Default for ConsistencyModel {
    fn default() -> Self {
        Self::thermal_exponential(0.015, 0.01)
    }
}

/// Evenly spaced shear-rate sampling, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShearRateRange {
    /// First sample (1/s), strictly positive
    pub start: f64,
    /// Last sample (1/s)
    pub end: f64,
    /// Number of samples, at least 2
    pub samples: usize,
}

impl ShearRateRange {
    pub fn new(start: f64, end: f64, samples: usize) -> Self {
        ShearRateRange { start, end, samples }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        config::require_positive("shear_rates.start", self.start)?;
        config::require_finite("shear_rates.end", self.end)?;
        if self.end <= self.start {
            return Err(config::invalid("shear_rates.end", self.end, "must exceed start"));
        }
        if self.samples < 2 {
            return Err(config::invalid(
                "shear_rates.samples",
                self.samples as f64,
                "at least two samples are required",
            ));
        }
        Ok(())
    }

    /// The sampled shear rates (1/s).
    ///
    /// # Examples
    ///
    /// ```
    /// use smartmud::models::ShearRateRange;
    ///
    /// let rates = ShearRateRange::new(1.0, 3.0, 5).samples().unwrap();
    /// assert_eq!(rates, vec![1.0, 1.5, 2.0, 2.5, 3.0]);
    /// ```
    pub fn samples(&self) -> ConfigResult<Vec<f64>> {
        self.validate()?;
        let last = self.samples - 1;
        let step = (self.end - self.start) / last as f64;
        Ok((0..self.samples)
            .map(|i| if i == last { self.end } else { self.start + step * i as f64 })
            .collect())
    }
}

impl Default for ShearRateRange {
    fn default() -> Self {
        ShearRateRange { start: 1.0, end: 200.0, samples: 100 }
    }
}

/// Checks that shear rates are non-empty, finite, positive and strictly increasing.
pub fn validate_shear_rates(shear_rates: &[f64]) -> ModelResult<()> {
    if shear_rates.is_empty() {
        return Err(ModelError::InvalidShearRates("no samples".to_string()));
    }
    for (i, &rate) in shear_rates.iter().enumerate() {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ModelError::InvalidShearRates(format!(
                "sample {} is {}, expected a finite positive rate",
                i, rate
            )));
        }
        if i > 0 && rate <= shear_rates[i - 1] {
            return Err(ModelError::InvalidShearRates(format!(
                "sample {} ({}) does not exceed sample {} ({})",
                i,
                rate,
                i - 1,
                shear_rates[i - 1]
            )));
        }
    }
    Ok(())
}

/// Herschel-Bulkley shear stress (Pa) at one shear rate.
pub fn herschel_bulkley(yield_stress: f64, consistency_index: f64, n: f64, shear_rate: f64) -> f64 {
    yield_stress + consistency_index * shear_rate.powf(n)
}

/// Shear-stress curve over an ordered shear-rate grid, with the law that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RheologyCurve {
    shear_rates: Vec<f64>,
    shear_stresses: Vec<f64>,
    yield_stress: f64,
    consistency_index: f64,
    flow_behavior_index: f64,
}

impl RheologyCurve {
    /// Evaluates the Herschel-Bulkley law over `shear_rates`.
    pub fn herschel_bulkley(
        shear_rates: &[f64],
        yield_stress: f64,
        consistency_index: f64,
        flow_behavior_index: f64,
    ) -> ModelResult<Self> {
        validate_shear_rates(shear_rates)?;
        finite_result("yield stress", yield_stress)?;
        finite_result("consistency index", consistency_index)?;
        let shear_stresses = shear_rates
            .iter()
            .map(|&rate| {
                finite_result(
                    "shear stress",
                    herschel_bulkley(yield_stress, consistency_index, flow_behavior_index, rate),
                )
            })
            .collect::<ModelResult<Vec<f64>>>()?;
        Ok(RheologyCurve {
            shear_rates: shear_rates.to_vec(),
            shear_stresses,
            yield_stress,
            consistency_index,
            flow_behavior_index,
        })
    }

    pub fn shear_rates(&self) -> &[f64] {
        &self.shear_rates
    }

    pub fn shear_stresses(&self) -> &[f64] {
        &self.shear_stresses
    }

    /// Yield stress tau_y (Pa).
    pub fn yield_stress(&self) -> f64 {
        self.yield_stress
    }

    /// Consistency index K (Pa·s^n).
    pub fn consistency_index(&self) -> f64 {
        self.consistency_index
    }

    pub fn flow_behavior_index(&self) -> f64 {
        self.flow_behavior_index
    }

    pub fn len(&self) -> usize {
        self.shear_rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shear_rates.is_empty()
    }

    /// `(shear rate, shear stress)` pairs in rate order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.shear_rates.iter().copied().zip(self.shear_stresses.iter().copied())
    }

    /// Shear stress (Pa) of the curve's law at any rate, sampled or not.
    pub fn stress_at(&self, shear_rate: f64) -> f64 {
        herschel_bulkley(
            self.yield_stress,
            self.consistency_index,
            self.flow_behavior_index,
            shear_rate,
        )
    }

    /// Apparent viscosity `tau(gamma) / gamma` (Pa·s).
    pub fn apparent_viscosity(&self, shear_rate: f64) -> ModelResult<f64> {
        if !shear_rate.is_finite() || shear_rate <= 0.0 {
            return Err(ModelError::InvalidShearRates(format!(
                "apparent viscosity needs a finite positive shear rate, got {}",
                shear_rate
            )));
        }
        finite_result("apparent viscosity", self.stress_at(shear_rate) / shear_rate)
    }

    /// Arithmetic mean of the sampled shear stresses (Pa).
    pub fn mean_stress(&self) -> f64 {
        self.shear_stresses.iter().sum::<f64>() / self.shear_stresses.len() as f64
    }

    /// Largest sampled shear stress (Pa).
    pub fn max_stress(&self) -> f64 {
        self.shear_stresses.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Base-fluid constants together with the nanoparticle couplings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RheologyModel {
    pub constants: RheologyConstants,
    pub yield_stress: YieldStressCoupling,
    pub consistency: ConsistencyModel,
}

impl RheologyModel {
    pub fn new(
        constants: RheologyConstants,
        yield_stress: YieldStressCoupling,
        consistency: ConsistencyModel,
    ) -> Self {
        RheologyModel { constants, yield_stress, consistency }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.constants.validate()?;
        self.yield_stress.validate()?;
        self.consistency.validate()
    }

    /// Yield stress (Pa) for a particle diameter.
    pub fn yield_stress(&self, diameter: f64, d0: f64) -> f64 {
        self.constants.yield_stress_base * self.yield_stress.factor(diameter, d0)
    }

    /// Consistency index (Pa·s^n) for a particle diameter and stimulus.
    pub fn consistency_index(
        &self,
        diameter: f64,
        d0: f64,
        stimulus: &Stimulus,
        reference: &ReferenceConditions,
    ) -> f64 {
        self.constants.consistency_index
            * self.consistency.factor(diameter, d0, stimulus, reference)
    }

    /// Shear-stress curve of the nanoparticle-laden fluid.
    pub fn curve(
        &self,
        diameter: f64,
        d0: f64,
        stimulus: &Stimulus,
        reference: &ReferenceConditions,
        shear_rates: &[f64],
    ) -> ModelResult<RheologyCurve> {
        crate::ensure_finite("diameter", diameter)?;
        stimulus.ensure_finite()?;
        if d0 == 0.0 {
            return Err(ModelError::ZeroBaseline { quantity: "diameter" });
        }
        RheologyCurve::herschel_bulkley(
            shear_rates,
            self.yield_stress(diameter, d0),
            self.consistency_index(diameter, d0, stimulus, reference),
            self.constants.flow_behavior_index,
        )
    }

    /// Shear-stress curve of the conventional fluid without nanoparticles.
    pub fn conventional_curve(&self, shear_rates: &[f64]) -> ModelResult<RheologyCurve> {
        RheologyCurve::herschel_bulkley(
            shear_rates,
            self.constants.yield_stress_base,
            self.constants.consistency_index,
            self.constants.flow_behavior_index,
        )
    }
}

/// Computes the hybrid-fluid shear-stress curve for a particle diameter.
///
/// # Arguments
///
/// * `diameter` - Nanoparticle diameter D (nm)
/// * `stimulus` - Conditions driving the thermal modulation of K
/// * `shear_rates` - Strictly increasing, positive shear rates (1/s)
/// * `model` - Base constants and couplings
/// * `d0` - Baseline diameter D0 (nm)
/// * `reference` - Neutral point and normalisation scales
pub fn compute_rheology_curve(
    diameter: f64,
    stimulus: &Stimulus,
    shear_rates: &[f64],
    model: &RheologyModel,
    d0: f64,
    reference: &ReferenceConditions,
) -> ModelResult<RheologyCurve> {
    model.curve(diameter, d0, stimulus, reference, shear_rates)
}
