//! Time-domain swelling kinetics of thermo-responsive nanoparticles.
//!
//! # State Variable
//! - Expansion factor S (dimensionless, S = 1 at the start of exposure)
//!
//! # Rate Law
//! `dS/dt = k * (T - Tref) * (1 - S / Smax)`
//!
//! Above `Tref` the particles relax towards `Smax`; below it the rate changes
//! sign and they contract. At `T = Tref` every state is stationary.
//!
//! # Example
//!
//! ```
//! use smartmud::models::{KineticConstants, run_time_domain_kinetics};
//!
//! let constants = KineticConstants::default();
//! let trajectory = run_time_domain_kinetics(1.0, 120.0, &constants, 100.0, 500).unwrap();
//!
//! let (t_end, s_end) = *trajectory.last().unwrap();
//! assert_eq!(t_end, 100.0);
//! assert!(s_end > 1.39 && s_end <= constants.max_expansion);
//! ```

use crate::config::{self, ConfigResult};
use crate::models::rheology::{RheologyConstants, herschel_bulkley};
use crate::solvers::{SolverError, SolverResult};
use serde::{Deserialize, Serialize};

#[cfg(feature = "solvers")]
use crate::solvers::integration::{IntegrationMethod, SwellingIntegrator};

/// Rate constants of the swelling law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KineticConstants {
    /// Rate constant k (1/(°C·min))
    pub rate_constant: f64,
    /// Activation temperature Tref (°C)
    pub reference_temperature: f64,
    /// Maximum expansion factor Smax
    pub max_expansion: f64,
}

impl KineticConstants {
    pub fn new(rate_constant: f64, reference_temperature: f64, max_expansion: f64) -> Self {
        KineticConstants { rate_constant, reference_temperature, max_expansion }
    }

    /// Swelling rate dS/dt at expansion `s` and temperature (°C).
    pub fn swelling_rate(&self, s: f64, temperature: f64) -> f64 {
        self.rate_constant
            * (temperature - self.reference_temperature)
            * (1.0 - s / self.max_expansion)
    }

    /// Rejects constants the integrator cannot work with.
    pub fn check(&self) -> SolverResult<()> {
        if !self.rate_constant.is_finite() || !self.reference_temperature.is_finite() {
            return Err(SolverError::InvalidParameter(
                "rate constant and reference temperature must be finite".to_string(),
            ));
        }
        if !(self.max_expansion > 0.0 && self.max_expansion.is_finite()) {
            return Err(SolverError::InvalidParameter(format!(
                "maximum expansion must be finite and positive, got {}",
                self.max_expansion
            )));
        }
        Ok(())
    }
}

impl Default for KineticConstants {
    fn default() -> Self {
        KineticConstants { rate_constant: 0.05, reference_temperature: 80.0, max_expansion: 1.4 }
    }
}

/// Rheology of a fluid whose yield stress follows the expansion factor.
///
/// `tau_y(S) = tau_y0 + influence_coefficient * (S - 1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpansionRheology {
    pub constants: RheologyConstants,
    /// Yield-stress gain per unit expansion (Pa)
    pub influence_coefficient: f64,
}

impl ExpansionRheology {
    /// Yield stress (Pa) at expansion factor `s`.
    pub fn yield_stress(&self, s: f64) -> f64 {
        self.constants.yield_stress_base + self.influence_coefficient * (s - 1.0)
    }

    /// Herschel-Bulkley shear stress (Pa) at expansion factor `s`.
    pub fn shear_stress(&self, shear_rate: f64, s: f64) -> f64 {
        herschel_bulkley(
            self.yield_stress(s),
            self.constants.consistency_index,
            self.constants.flow_behavior_index,
            shear_rate,
        )
    }
}

impl Default for ExpansionRheology {
    fn default() -> Self {
        ExpansionRheology {
            constants: RheologyConstants::new(50.0, 0.1, 0.8),
            influence_coefficient: 20.0,
        }
    }
}

/// Settings of one time-domain run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KineticsParameters {
    pub constants: KineticConstants,
    pub rheology: ExpansionRheology,
    /// Expansion factor at t = 0
    pub initial_expansion: f64,
    /// End of the simulated window (min)
    pub time_horizon: f64,
    /// Number of output samples, both ends included
    pub num_steps: usize,
    #[cfg(feature = "solvers")]
    #[serde(default)]
    pub method: IntegrationMethod,
}

impl KineticsParameters {
    pub fn validate(&self) -> ConfigResult<()> {
        config::require_finite("kinetics.rate_constant", self.constants.rate_constant)?;
        config::require_finite(
            "kinetics.reference_temperature",
            self.constants.reference_temperature,
        )?;
        config::require_positive("kinetics.max_expansion", self.constants.max_expansion)?;
        config::require_finite("kinetics.initial_expansion", self.initial_expansion)?;
        config::require_positive("kinetics.time_horizon", self.time_horizon)?;
        config::require_finite(
            "kinetics.influence_coefficient",
            self.rheology.influence_coefficient,
        )?;
        self.rheology.constants.validate()?;
        if self.num_steps < 2 {
            return Err(config::invalid(
                "kinetics.num_steps",
                self.num_steps as f64,
                "at least two samples are required",
            ));
        }
        Ok(())
    }

    /// Runs the kinetics at `temperature` (°C) with these settings.
    pub fn run(&self, temperature: f64) -> SolverResult<KineticsTrajectory> {
        let grid = time_grid(self.time_horizon, self.num_steps)?;
        #[cfg(feature = "solvers")]
        let samples = integrate_on_grid(
            self.initial_expansion,
            temperature,
            &self.constants,
            &grid,
            self.method,
        )?;
        #[cfg(not(feature = "solvers"))]
        let samples =
            integrate_on_grid(self.initial_expansion, temperature, &self.constants, &grid)?;
        Ok(KineticsTrajectory { temperature, samples })
    }
}

impl Default for KineticsParameters {
    fn default() -> Self {
        KineticsParameters {
            constants: KineticConstants::default(),
            rheology: ExpansionRheology::default(),
            initial_expansion: 1.0,
            time_horizon: 100.0,
            num_steps: 500,
            #[cfg(feature = "solvers")]
            method: IntegrationMethod::default(),
        }
    }
}

/// Expansion history at a fixed temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticsTrajectory {
    /// Exposure temperature (°C)
    pub temperature: f64,
    /// `(time, expansion factor)` samples in time order
    pub samples: Vec<(f64, f64)>,
}

impl KineticsTrajectory {
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|(t, _)| *t).collect()
    }

    pub fn expansion(&self) -> Vec<f64> {
        self.samples.iter().map(|(_, s)| *s).collect()
    }

    /// Expansion state at the end of the window.
    pub fn final_state(&self) -> Option<crate::models::NanoparticleState> {
        self.samples
            .last()
            .map(|(_, s)| crate::models::NanoparticleState::Expanded { expansion_factor: *s })
    }

    /// `(time, yield stress)` evolution under `rheology`.
    pub fn yield_stress_series(&self, rheology: &ExpansionRheology) -> Vec<(f64, f64)> {
        self.samples.iter().map(|(t, s)| (*t, rheology.yield_stress(*s))).collect()
    }
}

/// Evenly spaced output times on `[0, time_horizon]`, both ends included.
pub fn time_grid(time_horizon: f64, num_steps: usize) -> SolverResult<Vec<f64>> {
    if !(time_horizon > 0.0 && time_horizon.is_finite()) {
        return Err(SolverError::InvalidTimeGrid(format!(
            "time horizon must be finite and positive, got {}",
            time_horizon
        )));
    }
    if num_steps < 2 {
        return Err(SolverError::InvalidTimeGrid(format!(
            "at least two output times are required, got {}",
            num_steps
        )));
    }
    let last = num_steps - 1;
    let dt = time_horizon / last as f64;
    Ok((0..num_steps).map(|i| if i == last { time_horizon } else { dt * i as f64 }).collect())
}

/// Integrates the swelling law from `S(0) = initial_expansion` to `time_horizon`.
///
/// # Arguments
///
/// * `initial_expansion` - Expansion factor at t = 0
/// * `temperature` - Exposure temperature (°C), constant over the window
/// * `constants` - Rate constants of the swelling law
/// * `time_horizon` - End of the window (min)
/// * `num_steps` - Number of output samples, both ends included
///
/// # Returns
///
/// `(time, expansion factor)` pairs at the output times.
pub fn run_time_domain_kinetics(
    initial_expansion: f64,
    temperature: f64,
    constants: &KineticConstants,
    time_horizon: f64,
    num_steps: usize,
) -> SolverResult<Vec<(f64, f64)>> {
    let grid = time_grid(time_horizon, num_steps)?;
    #[cfg(feature = "solvers")]
    {
        let method = IntegrationMethod::default();
        integrate_on_grid(initial_expansion, temperature, constants, &grid, method)
    }
    #[cfg(not(feature = "solvers"))]
    {
        integrate_on_grid(initial_expansion, temperature, constants, &grid)
    }
}

#[cfg(feature = "solvers")]
fn integrate_on_grid(
    initial_expansion: f64,
    temperature: f64,
    constants: &KineticConstants,
    grid: &[f64],
    method: IntegrationMethod,
) -> SolverResult<Vec<(f64, f64)>> {
    let mut integrator = SwellingIntegrator::new(*constants, temperature, initial_expansion)?
        .with_method(method);
    integrator.integrate_on_grid(grid)
}

#[cfg(not(feature = "solvers"))]
fn integrate_on_grid(
    _initial_expansion: f64,
    _temperature: f64,
    _constants: &KineticConstants,
    _grid: &[f64],
) -> SolverResult<Vec<(f64, f64)>> {
    Err(SolverError::FeatureNotEnabled)
}
