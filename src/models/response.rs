//! Nanoparticle size response to downhole stimuli.
//!
//! # Formula Families
//! - Additive: `D = D0 * (1 + kpH*(pH - 7) + kT*(T - Tref)/Tscale + kP*(P - Pref)/Pscale)`
//! - Multiplicative:
//!   `D = D0 * (1 + kpH*(pH - 7)) * (1 + kT*(T - Tref)/Tscale) * (1 + kP*(P - Pref)/Pscale)`
//! - Logarithmic shrinkage: `D = D0 * (1 - alpha*ln(P/Pref))`
//!
//! The result is not constrained in sign or magnitude: diameters below `D0`
//! are shrinkage, not invalid output.
//!
//! # Example
//!
//! ```
//! use smartmud::models::{DiameterFormula, ResponseConstants, compute_diameter};
//! use smartmud::{ReferenceConditions, Stimulus};
//!
//! // pH-only swelling (Zamora-Ledezma et al., 2022)
//! let constants = ResponseConstants::ph_only();
//! let d = compute_diameter(
//!     &Stimulus::reference().with_ph(9.0),
//!     &constants,
//!     DiameterFormula::Additive,
//!     &ReferenceConditions::default(),
//! )
//! .unwrap();
//! assert!((d - 54.0).abs() < 1e-9);
//! ```

use crate::config::{self, ConfigError, ConfigResult};
use crate::{ModelResult, ReferenceConditions, Scalar, Stimulus, finite_result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy used to turn a stimulus into a diameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiameterFormula {
    /// Sum of the normalised stimulus deviations
    Additive,
    /// Product of the per-stimulus swelling factors
    Multiplicative,
    /// Pressure-only logarithmic shrinkage
    Logarithmic,
}

impl DiameterFormula {
    /// Every supported formula, in declaration order.
    pub const ALL: [DiameterFormula; 3] =
        [DiameterFormula::Additive, DiameterFormula::Multiplicative, DiameterFormula::Logarithmic];

    /// Configuration name of the formula.
    pub fn name(&self) -> &'static str {
        match self {
            DiameterFormula::Additive => "additive",
            DiameterFormula::Multiplicative => "multiplicative",
            DiameterFormula::Logarithmic => "logarithmic",
        }
    }
}

impl fmt::Display for DiameterFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DiameterFormula {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiameterFormula::ALL
            .into_iter()
            .find(|formula| formula.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownVariant {
                kind: "diameter formula",
                name: s.to_string(),
            })
    }
}

/// Swelling sensitivities and baseline size of one nanoparticle system.
///
/// The logarithmic constants are optional because only the logarithmic
/// formula uses them; selecting that formula without them is a
/// configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseConstants {
    /// Baseline diameter D0 (nm)
    pub d0: f64,
    /// pH sensitivity kpH (per pH unit)
    pub k_ph: f64,
    /// Temperature sensitivity kT (per normalised temperature deviation)
    pub k_t: f64,
    /// Pressure sensitivity kP (per normalised pressure deviation)
    pub k_p: f64,
    /// Logarithmic shrinkage coefficient alpha
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_alpha: Option<f64>,
    /// Reference pressure of the logarithmic formula (psi)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_reference_pressure: Option<f64>,
}

impl ResponseConstants {
    /// Creates constants for the additive and multiplicative formulas.
    pub fn new(d0: f64, k_ph: f64, k_t: f64, k_p: f64) -> Self {
        ResponseConstants { d0, k_ph, k_t, k_p, log_alpha: None, log_reference_pressure: None }
    }

    /// Adds the logarithmic shrinkage constants.
    pub fn with_logarithmic(mut self, alpha: f64, reference_pressure: f64) -> Self {
        self.log_alpha = Some(alpha);
        self.log_reference_pressure = Some(reference_pressure);
        self
    }

    /// Multi-stimulus hybrid system.
    ///
    /// Sources: kpH Zamora-Ledezma et al. 2022; kT Mahmoud et al. 2017;
    /// kP Gerogiorgis et al. 2017.
    pub fn multi_stimulus() -> Self {
        Self::new(50.0, 0.02, 0.002, -0.0015)
    }

    /// Additive hybrid system used for the interactive visualisation.
    ///
    /// Sources: Zamora-Ledezma et al. 2022; Mahmoud et al. 2017.
    pub fn additive_hybrid() -> Self {
        Self::new(50.0, 0.02, 0.02, 0.015)
    }

    /// pH-responsive particles only (Zamora-Ledezma et al. 2022).
    pub fn ph_only() -> Self {
        Self::new(50.0, 0.04, 0.0, 0.0)
    }

    /// Thermo-responsive particles only (Mahmoud et al. 2017).
    pub fn temperature_only() -> Self {
        Self::new(50.0, 0.0, 0.002, 0.0)
    }

    /// Pressure-responsive particles only (Gerogiorgis et al. 2017).
    pub fn pressure_only() -> Self {
        Self::new(50.0, 0.0, 0.0, 0.015)
    }

    /// Pressure-driven logarithmic shrinkage around 5000 psi.
    pub fn pressure_logarithmic() -> Self {
        Self::new(50.0, 0.0, 0.0, 0.0).with_logarithmic(0.03, 5000.0)
    }

    /// Checks that the constants required by `formula` are present and usable.
    pub fn validate(&self, formula: DiameterFormula) -> ConfigResult<()> {
        config::require_finite("response.d0", self.d0)?;
        config::require_finite("response.k_ph", self.k_ph)?;
        config::require_finite("response.k_t", self.k_t)?;
        config::require_finite("response.k_p", self.k_p)?;
        if formula == DiameterFormula::Logarithmic {
            let (alpha, p_ref) = self.logarithmic()?;
            config::require_finite("response.log_alpha", alpha)?;
            config::require_positive("response.log_reference_pressure", p_ref)?;
        }
        Ok(())
    }

    fn logarithmic(&self) -> ConfigResult<(f64, f64)> {
        let alpha = self.log_alpha.ok_or(ConfigError::MissingConstant("response.log_alpha"))?;
        let p_ref = self
            .log_reference_pressure
            .ok_or(ConfigError::MissingConstant("response.log_reference_pressure"))?;
        Ok((alpha, p_ref))
    }
}

impl Default for ResponseConstants {
    fn default() -> Self {
        Self::multi_stimulus()
    }
}

/// State of a nanoparticle population after responding to its environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NanoparticleState {
    /// Equilibrium size from a closed-form response (nm)
    Sized { diameter: f64 },
    /// Dimensionless expansion factor from the time-domain kinetics
    Expanded { expansion_factor: f64 },
}

impl NanoparticleState {
    /// Diameter in nm, if this is an equilibrium state.
    pub fn diameter(&self) -> Option<f64> {
        match self {
            NanoparticleState::Sized { diameter } => Some(*diameter),
            NanoparticleState::Expanded { .. } => None,
        }
    }

    /// Expansion factor, if this is a time-domain state.
    pub fn expansion_factor(&self) -> Option<f64> {
        match self {
            NanoparticleState::Sized { .. } => None,
            NanoparticleState::Expanded { expansion_factor } => Some(*expansion_factor),
        }
    }
}

/// Diameters obtained by varying one stimulus at a time.
///
/// Each field is the diameter with the named stimulus applied and the other
/// two held at the reference conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndividualResponses {
    pub ph: f64,
    pub temperature: f64,
    pub pressure: f64,
}

/// A diameter formula together with its constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseModel {
    pub formula: DiameterFormula,
    pub constants: ResponseConstants,
}

impl ResponseModel {
    pub fn new(formula: DiameterFormula, constants: ResponseConstants) -> Self {
        ResponseModel { formula, constants }
    }

    /// Baseline diameter D0 (nm).
    pub fn d0(&self) -> f64 {
        self.constants.d0
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.constants.validate(self.formula)
    }

    /// Diameter (nm) for `stimulus`.
    pub fn diameter(
        &self,
        stimulus: &Stimulus,
        reference: &ReferenceConditions,
    ) -> ModelResult<f64> {
        compute_diameter(stimulus, &self.constants, self.formula, reference)
    }

    /// Equilibrium nanoparticle state for `stimulus`.
    pub fn state(
        &self,
        stimulus: &Stimulus,
        reference: &ReferenceConditions,
    ) -> ModelResult<NanoparticleState> {
        Ok(NanoparticleState::Sized { diameter: self.diameter(stimulus, reference)? })
    }

    /// Single-stimulus diameters for `stimulus`.
    pub fn individual_responses(
        &self,
        stimulus: &Stimulus,
        reference: &ReferenceConditions,
    ) -> ModelResult<IndividualResponses> {
        let neutral = reference.stimulus();
        Ok(IndividualResponses {
            ph: self.diameter(&neutral.with_ph(stimulus.ph), reference)?,
            temperature: self.diameter(&neutral.with_temperature(stimulus.temperature), reference)?,
            pressure: self.diameter(&neutral.with_pressure(stimulus.pressure), reference)?,
        })
    }
}

impl Default for ResponseModel {
    fn default() -> Self {
        ResponseModel::new(DiameterFormula::Multiplicative, ResponseConstants::multi_stimulus())
    }
}

/// Computes the nanoparticle diameter (nm) for a stimulus.
///
/// # Arguments
///
/// * `stimulus` - Pressure (psi), temperature (°C) and pH
/// * `constants` - Swelling sensitivities and baseline diameter
/// * `formula` - Formula family to apply
/// * `reference` - Neutral point and normalisation scales
///
/// # Errors
///
/// * `NonFiniteInput` if any stimulus component is NaN or infinite
/// * `NonPositivePressure` for the logarithmic formula when `pressure <= 0`
/// * `Config` if the logarithmic constants are missing
pub fn compute_diameter(
    stimulus: &Stimulus,
    constants: &ResponseConstants,
    formula: DiameterFormula,
    reference: &ReferenceConditions,
) -> ModelResult<f64> {
    stimulus.ensure_finite()?;
    let d = diameter_generic(
        stimulus.pressure,
        stimulus.temperature,
        stimulus.ph,
        constants,
        formula,
        reference,
    )?;
    finite_result("diameter", d)
}

/// Diameter formula written over any [`Scalar`], shared by the plain and
/// dual-number evaluations.
pub(crate) fn diameter_generic<S: Scalar>(
    pressure: S,
    temperature: S,
    ph: S,
    constants: &ResponseConstants,
    formula: DiameterFormula,
    reference: &ReferenceConditions,
) -> ModelResult<S> {
    let d0 = constants.d0;
    match formula {
        DiameterFormula::Additive => {
            let (ph_term, t_term, p_term) =
                stimulus_terms(pressure, temperature, ph, constants, reference);
            Ok((ph_term + t_term + p_term + 1.0) * d0)
        }
        DiameterFormula::Multiplicative => {
            let (ph_term, t_term, p_term) =
                stimulus_terms(pressure, temperature, ph, constants, reference);
            Ok((ph_term + 1.0) * (t_term + 1.0) * (p_term + 1.0) * d0)
        }
        DiameterFormula::Logarithmic => {
            let (alpha, p_ref) = constants.logarithmic()?;
            if pressure.re() <= 0.0 {
                return Err(crate::ModelError::NonPositivePressure {
                    pressure: pressure.re(),
                    formula: "logarithmic shrinkage",
                });
            }
            config::require_positive("response.log_reference_pressure", p_ref)?;
            Ok((-((pressure / p_ref).ln() * alpha) + 1.0) * d0)
        }
    }
}

fn stimulus_terms<S: Scalar>(
    pressure: S,
    temperature: S,
    ph: S,
    constants: &ResponseConstants,
    reference: &ReferenceConditions,
) -> (S, S, S) {
    let ph_term = (ph - reference.neutral_ph) * constants.k_ph;
    let t_term =
        (temperature - reference.temperature) / reference.temperature_scale * constants.k_t;
    let p_term = (pressure - reference.pressure) / reference.pressure_scale * constants.k_p;
    (ph_term, t_term, p_term)
}
