//! Derived performance metrics of a hybrid drilling fluid.
//!
//! Compares the shear-stress curve of the nanoparticle-laden fluid with the
//! conventional baseline and reduces the pair to a handful of scalars:
//!
//! | Metric | Definition |
//! |--------|------------|
//! | Diameter change | `(D - D0) / D0 * 100` |
//! | Apparent viscosity | `tau(gamma_r) / gamma_r`, in Pa·s and cP |
//! | Viscosity change | relative change of the apparent viscosity or of the mean stress |
//! | Stability score | `clamp(100 - abs(mean(tau) - target) * penalty, 0, 100)` |
//! | Fluid-loss reduction | one of three heuristics, clamped to `[0, cap]` |
//!
//! The stability and fluid-loss numbers are heuristics, not fitted models.
//!
//! # Example
//!
//! ```
//! use smartmud::models::RheologyCurve;
//! use smartmud::{StabilityTier, compute_metrics};
//!
//! let rates = [1.0, 100.0, 200.0];
//! let hybrid = RheologyCurve::herschel_bulkley(&rates, 6.0, 0.02, 0.7).unwrap();
//! let conventional = RheologyCurve::herschel_bulkley(&rates, 5.0, 0.02, 0.7).unwrap();
//!
//! let metrics = compute_metrics(&hybrid, &conventional, 55.0, 50.0, 100.0).unwrap();
//! assert!((metrics.diameter_change_percent - 10.0).abs() < 1e-12);
//! assert!(metrics.viscosity_change_percent > 0.0);
//! assert_eq!(metrics.tier(), StabilityTier::Moderate);
//! ```

use crate::config::{self, ConfigResult};
use crate::models::RheologyCurve;
use crate::{ModelResult, Stimulus, finite_result, percent_change};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantity the viscosity change is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViscosityBasis {
    /// Apparent viscosity at the representative shear rate
    #[default]
    ApparentViscosity,
    /// Mean shear stress over the sampled curve
    MeanStress,
}

/// Distance of the mean hybrid stress from a target, turned into a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityHeuristic {
    /// Mean shear stress regarded as ideal (Pa)
    pub target_stress: f64,
    /// Score lost per Pa of deviation
    pub penalty: f64,
}

impl StabilityHeuristic {
    /// Stability score in `[0, 100]` for a mean shear stress (Pa).
    pub fn score(&self, mean_stress: f64) -> f64 {
        (100.0 - (mean_stress - self.target_stress).abs() * self.penalty).clamp(0.0, 100.0)
    }
}

impl Default for StabilityHeuristic {
    fn default() -> Self {
        StabilityHeuristic { target_stress: 20.0, penalty: 3.0 }
    }
}

/// Fluid-loss reduction heuristic (%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FluidLossModel {
    /// `clamp(base + diameter_weight * dD% + stability_weight * stability, 0, cap)`
    WeightedSum { base: f64, diameter_weight: f64, stability_weight: f64, cap: f64 },
    /// `clamp(ratio * stability, 0, cap)`
    StabilityRatio { ratio: f64, cap: f64 },
    /// `clamp(max_reduction * (1 - exp(-rate * (P - reference_pressure))), 0, max_reduction)`
    ExponentialSaturation { max_reduction: f64, rate: f64, reference_pressure: f64 },
}

impl FluidLossModel {
    pub fn weighted_sum() -> Self {
        FluidLossModel::WeightedSum {
            base: 30.0,
            diameter_weight: 0.5,
            stability_weight: 0.2,
            cap: 60.0,
        }
    }

    pub fn stability_ratio() -> Self {
        FluidLossModel::StabilityRatio { ratio: 0.5, cap: 50.0 }
    }

    pub fn exponential_saturation() -> Self {
        FluidLossModel::ExponentialSaturation {
            max_reduction: 40.0,
            rate: 2e-4,
            reference_pressure: 5000.0,
        }
    }

    /// Upper bound of the reduction (%).
    ///
    /// Negative or NaN caps read as 0.
    pub fn cap(&self) -> f64 {
        let cap = match *self {
            FluidLossModel::WeightedSum { cap, .. }
            | FluidLossModel::StabilityRatio { cap, .. } => cap,
            FluidLossModel::ExponentialSaturation { max_reduction, .. } => max_reduction,
        };
        if cap > 0.0 { cap } else { 0.0 }
    }

    /// Fluid-loss reduction (%) in `[0, cap]`, or NaN when the heuristic is NaN.
    pub fn reduction(&self, diameter_change_percent: f64, stability: f64, pressure: f64) -> f64 {
        let raw = match *self {
            FluidLossModel::WeightedSum { base, diameter_weight, stability_weight, .. } => {
                base + diameter_change_percent * diameter_weight + stability * stability_weight
            }
            FluidLossModel::StabilityRatio { ratio, .. } => stability * ratio,
            FluidLossModel::ExponentialSaturation { max_reduction, rate, reference_pressure } => {
                max_reduction * (1.0 - (-rate * (pressure - reference_pressure)).exp())
            }
        };
        if raw.is_nan() {
            return raw;
        }
        raw.clamp(0.0, self.cap())
    }

    fn validate(&self) -> ConfigResult<()> {
        match *self {
            FluidLossModel::WeightedSum { base, diameter_weight, stability_weight, cap } => {
                config::require_finite("metrics.fluid_loss.base", base)?;
                config::require_finite("metrics.fluid_loss.diameter_weight", diameter_weight)?;
                config::require_finite("metrics.fluid_loss.stability_weight", stability_weight)?;
                require_cap("metrics.fluid_loss.cap", cap)
            }
            FluidLossModel::StabilityRatio { ratio, cap } => {
                config::require_finite("metrics.fluid_loss.ratio", ratio)?;
                require_cap("metrics.fluid_loss.cap", cap)
            }
            FluidLossModel::ExponentialSaturation { max_reduction, rate, reference_pressure } => {
                config::require_finite("metrics.fluid_loss.rate", rate)?;
                config::require_finite(
                    "metrics.fluid_loss.reference_pressure",
                    reference_pressure,
                )?;
                require_cap("metrics.fluid_loss.max_reduction", max_reduction)
            }
        }
    }
}

impl Default for FluidLossModel {
    fn default() -> Self {
        Self::weighted_sum()
    }
}

fn require_cap(name: &'static str, cap: f64) -> ConfigResult<()> {
    config::require_finite(name, cap)?;
    if cap < 0.0 {
        return Err(config::invalid(name, cap, "must not be negative"));
    }
    Ok(())
}

/// Stability classification of a fluid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityTier {
    High,
    Moderate,
    Low,
}

impl StabilityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            StabilityTier::High => "high",
            StabilityTier::Moderate => "moderate",
            StabilityTier::Low => "low",
        }
    }
}

impl fmt::Display for StabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a stability score.
///
/// Scores above 80 are high and above 50 moderate; the boundaries themselves
/// belong to the lower tier.
///
/// ```
/// use smartmud::{StabilityTier, classify_stability};
///
/// assert_eq!(classify_stability(80.0), StabilityTier::Moderate);
/// assert_eq!(classify_stability(80.5), StabilityTier::High);
/// assert_eq!(classify_stability(50.0), StabilityTier::Low);
/// ```
pub fn classify_stability(score: f64) -> StabilityTier {
    if score > 80.0 {
        StabilityTier::High
    } else if score > 50.0 {
        StabilityTier::Moderate
    } else {
        StabilityTier::Low
    }
}

/// Apparent viscosity at one shear rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApparentViscosity {
    /// Pa·s
    pub pa_s: f64,
    /// Centipoise
    pub cp: f64,
}

impl ApparentViscosity {
    /// Apparent viscosity of `curve` at `shear_rate` (1/s).
    pub fn of(curve: &RheologyCurve, shear_rate: f64) -> ModelResult<Self> {
        let pa_s = curve.apparent_viscosity(shear_rate)?;
        Ok(ApparentViscosity { pa_s, cp: pa_s * 1000.0 })
    }
}

/// Scalar summary of a hybrid fluid against its conventional baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub diameter_change_percent: f64,
    /// Sign preserved; negative means the hybrid fluid is thinner
    pub viscosity_change_percent: f64,
    /// In `[0, 100]`
    pub stability_score: f64,
    /// In `[0, cap]` of the fluid-loss model
    pub fluid_loss_reduction_percent: f64,
    pub hybrid_viscosity: ApparentViscosity,
    pub conventional_viscosity: ApparentViscosity,
    /// `None` when the base fluid has no yield stress
    pub yield_stress_change_percent: Option<f64>,
    /// `None` when the base fluid has no consistency index
    pub consistency_change_percent: Option<f64>,
}

impl Metrics {
    pub fn tier(&self) -> StabilityTier {
        classify_stability(self.stability_score)
    }
}

/// Rheological properties of one fluid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidProperties {
    /// Largest sampled shear stress (Pa)
    pub max_shear_stress: f64,
    /// Pa
    pub yield_stress: f64,
    /// Pa·s^n
    pub consistency_index: f64,
    /// Nanoparticle diameter (nm), `None` for the conventional fluid
    pub diameter: Option<f64>,
}

/// Side-by-side properties of the hybrid and conventional fluids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyComparison {
    pub hybrid: FluidProperties,
    pub conventional: FluidProperties,
}

impl PropertyComparison {
    pub fn new(hybrid: &RheologyCurve, conventional: &RheologyCurve, diameter: f64) -> Self {
        PropertyComparison {
            hybrid: FluidProperties {
                max_shear_stress: hybrid.max_stress(),
                yield_stress: hybrid.yield_stress(),
                consistency_index: hybrid.consistency_index(),
                diameter: Some(diameter),
            },
            conventional: FluidProperties {
                max_shear_stress: conventional.max_stress(),
                yield_stress: conventional.yield_stress(),
                consistency_index: conventional.consistency_index(),
                diameter: None,
            },
        }
    }
}

/// Settings of the metric derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsModel {
    /// Shear rate of the apparent viscosity (1/s)
    pub representative_shear_rate: f64,
    #[serde(default)]
    pub viscosity_basis: ViscosityBasis,
    #[serde(default)]
    pub stability: StabilityHeuristic,
    #[serde(default)]
    pub fluid_loss: FluidLossModel,
}

impl MetricsModel {
    /// Default heuristics at a custom representative shear rate.
    pub fn at_shear_rate(representative_shear_rate: f64) -> Self {
        MetricsModel { representative_shear_rate, ..Self::default() }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        config::require_positive(
            "metrics.representative_shear_rate",
            self.representative_shear_rate,
        )?;
        config::require_finite("metrics.stability.target_stress", self.stability.target_stress)?;
        config::require_finite("metrics.stability.penalty", self.stability.penalty)?;
        self.fluid_loss.validate()
    }

    /// Derives all metrics for a hybrid curve against its baseline.
    ///
    /// # Arguments
    ///
    /// * `hybrid` - Shear-stress curve of the nanoparticle-laden fluid
    /// * `conventional` - Baseline curve without nanoparticles
    /// * `diameter` - Hybrid nanoparticle diameter D (nm)
    /// * `d0` - Baseline diameter D0 (nm)
    /// * `stimulus` - Conditions of the evaluation, read by pressure-driven heuristics
    ///
    /// # Errors
    ///
    /// `ZeroBaseline` when D0 or the baseline viscosity is zero. A zero base
    /// yield stress or consistency index only leaves the matching change unset.
    pub fn evaluate(
        &self,
        hybrid: &RheologyCurve,
        conventional: &RheologyCurve,
        diameter: f64,
        d0: f64,
        stimulus: &Stimulus,
    ) -> ModelResult<Metrics> {
        let diameter_change_percent = percent_change("diameter", diameter, d0)?;

        let hybrid_viscosity = ApparentViscosity::of(hybrid, self.representative_shear_rate)?;
        let conventional_viscosity =
            ApparentViscosity::of(conventional, self.representative_shear_rate)?;
        let viscosity_change_percent = match self.viscosity_basis {
            ViscosityBasis::ApparentViscosity => percent_change(
                "apparent viscosity",
                hybrid_viscosity.pa_s,
                conventional_viscosity.pa_s,
            )?,
            ViscosityBasis::MeanStress => percent_change(
                "mean shear stress",
                hybrid.mean_stress(),
                conventional.mean_stress(),
            )?,
        };

        let stability_score =
            finite_result("stability score", self.stability.score(hybrid.mean_stress()))?;
        let fluid_loss_reduction_percent = finite_result(
            "fluid-loss reduction",
            self.fluid_loss.reduction(diameter_change_percent, stability_score, stimulus.pressure),
        )?;

        let metrics = Metrics {
            diameter_change_percent,
            viscosity_change_percent,
            stability_score,
            fluid_loss_reduction_percent,
            hybrid_viscosity,
            conventional_viscosity,
            yield_stress_change_percent: optional_change(
                "yield stress",
                hybrid.yield_stress(),
                conventional.yield_stress(),
            )?,
            consistency_change_percent: optional_change(
                "consistency index",
                hybrid.consistency_index(),
                conventional.consistency_index(),
            )?,
        };
        log::debug!(
            "metrics: dD = {:.3} %, dmu = {:.3} %, stability = {:.1}, fluid loss = {:.2} %",
            metrics.diameter_change_percent,
            metrics.viscosity_change_percent,
            metrics.stability_score,
            metrics.fluid_loss_reduction_percent
        );
        Ok(metrics)
    }
}

/// Percentage change that is undefined, rather than an error, on a zero baseline.
fn optional_change(quantity: &'static str, value: f64, baseline: f64) -> ModelResult<Option<f64>> {
    if baseline == 0.0 {
        return Ok(None);
    }
    percent_change(quantity, value, baseline).map(Some)
}

impl Default for MetricsModel {
    fn default() -> Self {
        MetricsModel {
            representative_shear_rate: 100.0,
            viscosity_basis: ViscosityBasis::ApparentViscosity,
            stability: StabilityHeuristic::default(),
            fluid_loss: FluidLossModel::weighted_sum(),
        }
    }
}

/// Derives metrics with the default heuristics at `representative_shear_rate`.
///
/// Uses the apparent-viscosity basis, the 20 Pa / 3 stability heuristic and
/// the weighted-sum fluid-loss model.
pub fn compute_metrics(
    hybrid: &RheologyCurve,
    conventional: &RheologyCurve,
    diameter: f64,
    d0: f64,
    representative_shear_rate: f64,
) -> ModelResult<Metrics> {
    MetricsModel::at_shear_rate(representative_shear_rate).evaluate(
        hybrid,
        conventional,
        diameter,
        d0,
        &Stimulus::reference(),
    )
}
