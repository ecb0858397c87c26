//! Simulation parameters and named literature presets.
//!
//! A [`Parameters`] bundle holds every constant the pipeline reads: the
//! reference conditions, the response formula, the rheology couplings, the
//! metric heuristics, the shear-rate grid and the kinetics settings. Bundles
//! are plain serde values, so they can be stored as JSON and reloaded.
//!
//! # Example
//!
//! ```
//! use smartmud::Parameters;
//!
//! let params = Parameters::preset("ph_only").unwrap();
//! let json = params.to_json().unwrap();
//! let reloaded = Parameters::from_json_str(&json).unwrap();
//! assert_eq!(params, reloaded);
//! ```

use crate::ReferenceConditions;
use crate::metrics::{FluidLossModel, MetricsModel, ViscosityBasis};
use crate::models::{
    ConsistencyModel, DiameterFormula, KineticsParameters, ResponseConstants, ResponseModel,
    RheologyConstants, RheologyModel, ShearRateRange, YieldStressCoupling,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building or loading a configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A named strategy or preset does not exist
    #[error("Unknown {kind} '{name}'")]
    UnknownVariant { kind: &'static str, name: String },
    /// A constant required by the selected formula was not provided
    #[error("Missing constant '{0}'")]
    MissingConstant(&'static str),
    /// A constant is outside its admissible range
    #[error("Invalid constant '{name}' = {value}: {reason}")]
    InvalidConstant { name: &'static str, value: f64, reason: String },
    /// The parameter file could not be read
    #[error("Failed to read '{path}': {message}")]
    Io { path: String, message: String },
    /// The parameter file is not valid JSON for this schema
    #[error("Failed to parse parameters: {0}")]
    Parse(String),
}

/// Names accepted by [`Parameters::preset`].
pub const PRESET_NAMES: [&str; 6] = [
    "multi_stimulus",
    "additive_hybrid",
    "ph_only",
    "temperature_only",
    "pressure_only",
    "pressure_logarithmic",
];

pub(crate) fn invalid(name: &'static str, value: f64, reason: &str) -> ConfigError {
    ConfigError::InvalidConstant { name, value, reason: reason.to_string() }
}

pub(crate) fn require_finite(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() { Ok(()) } else { Err(invalid(name, value, "must be finite")) }
}

pub(crate) fn require_positive(name: &'static str, value: f64) -> ConfigResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, value, "must be finite and positive"))
    }
}

pub(crate) fn require_nonzero(name: &'static str, value: f64) -> ConfigResult<()> {
    require_finite(name, value)?;
    if value != 0.0 { Ok(()) } else { Err(invalid(name, value, "must be nonzero")) }
}

/// Complete configuration of one simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub reference: ReferenceConditions,
    pub response: ResponseModel,
    pub rheology: RheologyModel,
    #[serde(default)]
    pub metrics: MetricsModel,
    #[serde(default)]
    pub shear_rates: ShearRateRange,
    #[serde(default)]
    pub kinetics: KineticsParameters,
}

impl Parameters {
    /// Multiplicative pH, temperature and pressure response.
    ///
    /// Swelling constants: kpH from Zamora-Ledezma et al. 2022, kT from
    /// Mahmoud et al. 2017, kP from Gerogiorgis et al. 2017. Herschel-Bulkley
    /// base fluid from Gokapai et al. 2024. The temperature deviation is
    /// unnormalised, `kT * (T - 90)`.
    pub fn multi_stimulus() -> Self {
        Parameters {
            reference: ReferenceConditions::default().with_unit_temperature_scale(),
            response: ResponseModel::new(
                DiameterFormula::Multiplicative,
                ResponseConstants::multi_stimulus(),
            ),
            rheology: RheologyModel::new(
                RheologyConstants::water_based_mud(),
                YieldStressCoupling::Fractional { beta: 0.4 },
                ConsistencyModel::thermal_exponential(0.015, 0.01),
            ),
            metrics: MetricsModel::default(),
            shear_rates: ShearRateRange::default(),
            kinetics: KineticsParameters::default(),
        }
    }

    /// Additive response with linear thermal thinning of K.
    ///
    /// Constants from Zamora-Ledezma et al. 2022 and Mahmoud et al. 2017;
    /// rheology after Gokapai et al. 2024. Viscosity change is measured on the
    /// mean shear stress and fluid loss is half the stability score.
    pub fn additive_hybrid() -> Self {
        Parameters {
            reference: ReferenceConditions::default(),
            response: ResponseModel::new(
                DiameterFormula::Additive,
                ResponseConstants::additive_hybrid(),
            ),
            rheology: RheologyModel::new(
                RheologyConstants::water_based_mud(),
                YieldStressCoupling::Fractional { beta: 0.4 },
                ConsistencyModel::thermal_linear(0.6, 0.1),
            ),
            metrics: MetricsModel {
                viscosity_basis: ViscosityBasis::MeanStress,
                fluid_loss: FluidLossModel::StabilityRatio { ratio: 0.5, cap: 50.0 },
                ..MetricsModel::default()
            },
            shear_rates: ShearRateRange::default(),
            kinetics: KineticsParameters::default(),
        }
    }

    /// pH-only swelling with a diameter-modulated consistency index.
    pub fn ph_only() -> Self {
        Parameters {
            reference: ReferenceConditions::default(),
            response: ResponseModel::new(DiameterFormula::Additive, ResponseConstants::ph_only()),
            rheology: RheologyModel::new(
                RheologyConstants::water_based_mud(),
                YieldStressCoupling::Constant,
                ConsistencyModel::diameter_modulated(0.01),
            ),
            metrics: MetricsModel::default(),
            shear_rates: ShearRateRange::default(),
            kinetics: KineticsParameters::default(),
        }
    }

    /// Temperature-only swelling with exponential thermal thinning (Mahmoud et al. 2017).
    pub fn temperature_only() -> Self {
        Parameters {
            reference: ReferenceConditions::default().with_unit_temperature_scale(),
            response: ResponseModel::new(
                DiameterFormula::Additive,
                ResponseConstants::temperature_only(),
            ),
            rheology: RheologyModel::new(
                RheologyConstants::water_based_mud(),
                YieldStressCoupling::Constant,
                ConsistencyModel::thermal_exponential(0.015, 0.0).with_diameter_beta(0.01),
            ),
            metrics: MetricsModel::default(),
            shear_rates: ShearRateRange::default(),
            kinetics: KineticsParameters::default(),
        }
    }

    /// Pressure-only swelling with an absolute yield-stress coupling (Gerogiorgis et al. 2017).
    pub fn pressure_only() -> Self {
        Parameters {
            reference: ReferenceConditions::default(),
            response: ResponseModel::new(
                DiameterFormula::Additive,
                ResponseConstants::pressure_only(),
            ),
            rheology: RheologyModel::new(
                RheologyConstants::water_based_mud(),
                YieldStressCoupling::Absolute { beta: 0.01 },
                ConsistencyModel::constant(),
            ),
            metrics: MetricsModel::default(),
            shear_rates: ShearRateRange::default(),
            kinetics: KineticsParameters::default(),
        }
    }

    /// Logarithmic pressure shrinkage with saturating fluid-loss reduction.
    pub fn pressure_logarithmic() -> Self {
        Parameters {
            reference: ReferenceConditions::default(),
            response: ResponseModel::new(
                DiameterFormula::Logarithmic,
                ResponseConstants::pressure_logarithmic(),
            ),
            rheology: RheologyModel::new(
                RheologyConstants::water_based_mud(),
                YieldStressCoupling::Fractional { beta: 0.4 },
                ConsistencyModel::constant(),
            ),
            metrics: MetricsModel {
                fluid_loss: FluidLossModel::exponential_saturation(),
                ..MetricsModel::default()
            },
            shear_rates: ShearRateRange::default(),
            kinetics: KineticsParameters::default(),
        }
    }

    /// Looks up a preset by name (see [`PRESET_NAMES`]).
    pub fn preset(name: &str) -> ConfigResult<Self> {
        match name {
            "multi_stimulus" => Ok(Self::multi_stimulus()),
            "additive_hybrid" => Ok(Self::additive_hybrid()),
            "ph_only" => Ok(Self::ph_only()),
            "temperature_only" => Ok(Self::temperature_only()),
            "pressure_only" => Ok(Self::pressure_only()),
            "pressure_logarithmic" => Ok(Self::pressure_logarithmic()),
            _ => Err(ConfigError::UnknownVariant { kind: "preset", name: name.to_string() }),
        }
    }

    /// Checks every constant the pipeline will read.
    pub fn validate(&self) -> ConfigResult<()> {
        self.reference.validate()?;
        self.response.validate()?;
        require_nonzero("response.d0", self.response.d0())?;
        self.rheology.validate()?;
        self.metrics.validate()?;
        self.shear_rates.validate()?;
        self.kinetics.validate()
    }

    /// Parses and validates parameters from a JSON string.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let params: Parameters =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Serializes the parameters as pretty-printed JSON.
    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads and validates parameters from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let params = Self::from_json_str(&contents)?;
        log::info!("Loaded simulation parameters from {:?}", path);
        Ok(params)
    }

    /// Loads parameters from a JSON file, falling back to the default preset.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(params) => params,
            Err(ConfigError::Io { .. }) => {
                log::info!("Parameter file {:?} not found, using defaults", path.as_ref());
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to load simulation parameters: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Shear-rate samples of the configured grid.
    pub fn shear_rate_samples(&self) -> ConfigResult<Vec<f64>> {
        self.shear_rates.samples()
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::multi_stimulus()
    }
}
