//! Numerical integration of the swelling kinetics.
//!
//! This module integrates the expansion factor of thermo-responsive
//! nanoparticles over time using the
//! [`differential-equations`](https://docs.rs/differential-equations/)
//! crate. Output times are reached one interval at a time, so every requested
//! sample is an exact solver endpoint rather than an interpolated value.

use crate::models::KineticConstants;
use crate::solvers::{SolverError, SolverResult};
use differential_equations::methods::{ExplicitRungeKutta, ImplicitRungeKutta};
use differential_equations::ode::{ODE, ODEProblem};
use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// One-dimensional state vector holding the expansion factor.
type ExpansionState = SVector<f64, 1>;

/// Relative tolerance of the adaptive methods.
const RTOL: f64 = 1e-6;
/// Absolute tolerance of the adaptive methods.
const ATOL: f64 = 1e-8;

/// Integration methods available for time-stepping.
///
/// For details on each method, refer to the
/// [`differential-equations`](https://docs.rs/differential-equations/) crate documentation.
///
/// # Variants
///
/// - `Dopri5`: Adaptive explicit Dormand-Prince 5(4) method (default)
/// - `Radau5`: Adaptive implicit Radau5 method
/// - `RK4`: Fixed-step explicit 4th-order Runge-Kutta
/// - `Euler`: Fixed-step explicit Forward Euler
/// - `Heun`: Fixed-step explicit Heun method
/// - `Midpoint`: Fixed-step explicit Midpoint method
/// - `Ralston`: Fixed-step explicit Ralston method
///
/// Fixed-step methods take a single step per output interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    // Adaptive explicit methods
    /// Dormand-Prince 5(4) method
    #[default]
    Dopri5,
    // Adaptive implicit methods
    /// Radau5 method
    Radau5,
    // Fixed-step explicit methods
    /// 4th-order Runge-Kutta
    RK4,
    /// Forward Euler
    Euler,
    /// Heun method
    Heun,
    /// Midpoint method
    Midpoint,
    /// Ralston method
    Ralston,
}

/// ODE wrapper for the swelling law `dS/dt = k (T - Tref) (1 - S/Smax)`.
pub struct SwellingODE {
    constants: KineticConstants,
    temperature: f64,
}

impl ODE<f64, ExpansionState> for SwellingODE {
    fn diff(&self, _t: f64, y: &ExpansionState, dydt: &mut ExpansionState) {
        dydt[0] = self.constants.swelling_rate(y[0], self.temperature);
    }
}

/// A stateful integrator for the expansion factor at constant temperature.
///
/// # Examples
///
/// ```
/// use smartmud::models::KineticConstants;
/// use smartmud::solvers::integration::SwellingIntegrator;
///
/// let mut integrator = SwellingIntegrator::new(KineticConstants::default(), 120.0, 1.0).unwrap();
/// integrator.step(1.0).unwrap();
///
/// assert_eq!(integrator.time(), 1.0);
/// assert!(integrator.expansion() > 1.0);
/// ```
pub struct SwellingIntegrator {
    /// Right-hand side of the kinetics
    ode: SwellingODE,
    /// Current expansion factor
    expansion: f64,
    /// Current simulation time
    time: f64,
    /// Integration method to use
    method: IntegrationMethod,
}

impl SwellingIntegrator {
    /// Creates a new integrator at t = 0.
    ///
    /// # Arguments
    ///
    /// * `constants` - Rate constants of the swelling law
    /// * `temperature` - Exposure temperature (°C)
    /// * `initial_expansion` - Expansion factor at t = 0
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when `Smax <= 0` or any input is not finite.
    pub fn new(
        constants: KineticConstants,
        temperature: f64,
        initial_expansion: f64,
    ) -> SolverResult<Self> {
        constants.check()?;
        if !temperature.is_finite() {
            return Err(SolverError::InvalidParameter(format!(
                "temperature must be finite, got {}",
                temperature
            )));
        }
        if !initial_expansion.is_finite() {
            return Err(SolverError::InvalidParameter(format!(
                "initial expansion must be finite, got {}",
                initial_expansion
            )));
        }
        Ok(SwellingIntegrator {
            ode: SwellingODE { constants, temperature },
            expansion: initial_expansion,
            time: 0.0,
            method: IntegrationMethod::Dopri5,
        })
    }

    /// Sets the initial time.
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Sets the integration method.
    pub fn with_method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    /// Gets the current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Gets the current expansion factor.
    pub fn expansion(&self) -> f64 {
        self.expansion
    }

    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    /// Takes a single integration step forward in time.
    ///
    /// Adaptive methods sub-step internally to meet their tolerances; fixed-step
    /// methods take exactly one step of size `dt`.
    pub fn step(&mut self, dt: f64) -> SolverResult<()> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SolverError::InvalidStepSize(dt));
        }

        let y0 = ExpansionState::new(self.expansion);
        let t0 = self.time;
        let tf = self.time + dt;
        let problem = ODEProblem::new(&self.ode, t0, tf, y0);

        // Choose solver based on method
        let solution = match self.method {
            // Adaptive explicit
            IntegrationMethod::Dopri5 => {
                let mut solver = ExplicitRungeKutta::dopri5().rtol(RTOL).atol(ATOL);
                problem.solve(&mut solver)
            }
            // Adaptive implicit
            IntegrationMethod::Radau5 => {
                let mut solver = ImplicitRungeKutta::radau5().rtol(RTOL).atol(ATOL);
                problem.solve(&mut solver)
            }
            // Fixed-step explicit
            IntegrationMethod::RK4 => {
                let mut solver = ExplicitRungeKutta::rk4(dt);
                problem.solve(&mut solver)
            }
            IntegrationMethod::Euler => {
                let mut solver = ExplicitRungeKutta::euler(dt);
                problem.solve(&mut solver)
            }
            IntegrationMethod::Heun => {
                let mut solver = ExplicitRungeKutta::heun(dt);
                problem.solve(&mut solver)
            }
            IntegrationMethod::Midpoint => {
                let mut solver = ExplicitRungeKutta::midpoint(dt);
                problem.solve(&mut solver)
            }
            IntegrationMethod::Ralston => {
                let mut solver = ExplicitRungeKutta::ralston(dt);
                problem.solve(&mut solver)
            }
        };

        let solution = solution.map_err(|e| SolverError::ODESolverFailed(e.to_string()))?;
        let final_y = solution
            .y
            .last()
            .ok_or_else(|| SolverError::ODESolverFailed("solver returned no states".to_string()))?;

        if !final_y[0].is_finite() {
            return Err(SolverError::Diverged { time: tf });
        }

        log::trace!("swelling step t = {:.4} -> {:.4}, S = {:.6}", t0, tf, final_y[0]);
        self.expansion = final_y[0];
        self.time = tf;
        Ok(())
    }

    /// Integrates from current time to specified final time.
    ///
    /// # Arguments
    ///
    /// * `t_final` - Target final time
    /// * `dt` - Output interval
    ///
    /// # Returns
    ///
    /// History of (time, expansion) pairs, starting with the current state.
    pub fn integrate_to(&mut self, t_final: f64, dt: f64) -> SolverResult<Vec<(f64, f64)>> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SolverError::InvalidStepSize(dt));
        }

        let start = self.time;
        let span = t_final - start;
        if span <= 0.0 {
            return Ok(vec![(self.time, self.expansion)]);
        }

        // Last interval may be shorter than dt; it ends exactly on t_final
        let intervals = (span / dt - 1e-9).ceil().max(1.0) as usize;
        let grid: Vec<f64> = (0..=intervals)
            .map(|i| if i == intervals { t_final } else { start + dt * i as f64 })
            .collect();
        self.integrate_on_grid(&grid)
    }

    /// Integrates through the given output times.
    ///
    /// The grid must start at the current time and be strictly increasing; the
    /// returned history has one `(time, expansion)` pair per grid point.
    pub fn integrate_on_grid(&mut self, grid: &[f64]) -> SolverResult<Vec<(f64, f64)>> {
        let Some(&first) = grid.first() else {
            return Err(SolverError::InvalidTimeGrid("no output times".to_string()));
        };
        if first != self.time {
            return Err(SolverError::InvalidTimeGrid(format!(
                "grid starts at {} but the integrator is at {}",
                first, self.time
            )));
        }

        log::debug!(
            "integrating swelling kinetics at {} °C over {} output times with {:?}",
            self.ode.temperature,
            grid.len(),
            self.method
        );

        let mut history = Vec::with_capacity(grid.len());
        history.push((self.time, self.expansion));
        for window in grid.windows(2) {
            let dt = window[1] - window[0];
            if !(dt > 0.0 && dt.is_finite()) {
                return Err(SolverError::InvalidTimeGrid(format!(
                    "output times must be strictly increasing, found {} after {}",
                    window[1], window[0]
                )));
            }
            self.step(dt)?;
            // Land exactly on the requested time rather than the accumulated sum
            self.time = window[1];
            history.push((self.time, self.expansion));
        }

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrator(temperature: f64) -> SwellingIntegrator {
        SwellingIntegrator::new(KineticConstants::default(), temperature, 1.0).unwrap()
    }

    #[test]
    fn test_integrator_creation() {
        let integrator = integrator(120.0);
        assert_eq!(integrator.time(), 0.0);
        assert_eq!(integrator.expansion(), 1.0);
        assert_eq!(integrator.method(), IntegrationMethod::Dopri5);
    }

    #[test]
    fn test_integrator_with_time() {
        let integrator = integrator(120.0).with_time(5.0);
        assert_eq!(integrator.time(), 5.0);
    }

    #[test]
    fn test_integrator_rejects_bad_parameters() {
        let negative_smax = KineticConstants::new(0.05, 80.0, -1.4);
        assert!(matches!(
            SwellingIntegrator::new(negative_smax, 120.0, 1.0),
            Err(SolverError::InvalidParameter(_))
        ));
        assert!(SwellingIntegrator::new(KineticConstants::default(), f64::NAN, 1.0).is_err());
        let unbounded = SwellingIntegrator::new(KineticConstants::default(), 120.0, f64::INFINITY);
        assert!(unbounded.is_err());
    }

    #[test]
    fn test_integrator_rejects_bad_step() {
        let mut integrator = integrator(120.0);
        assert_eq!(integrator.step(0.0), Err(SolverError::InvalidStepSize(0.0)));
        assert!(integrator.step(-1.0).is_err());
        assert!(integrator.integrate_to(1.0, 0.0).is_err());
    }

    #[test]
    fn test_integrator_time_advancement() {
        let mut integrator = integrator(120.0).with_time(5.0);
        integrator.step(0.5).unwrap();
        integrator.step(1.0).unwrap();
        assert!((integrator.time() - 6.5).abs() < 1e-12);
    }

    #[test]
    fn test_integrator_actually_solves_equations() {
        // S(t) = Smax - (Smax - S0) * exp(-k (T - Tref) t / Smax)
        let mut integrator = integrator(120.0);
        let history = integrator.integrate_to(1.0, 0.1).unwrap();

        assert_eq!(history.len(), 11);
        assert!((integrator.time() - 1.0).abs() < 1e-12);

        let expected = 1.4 - 0.4 * (-2.0_f64 / 1.4).exp();
        assert!(
            (integrator.expansion() - expected).abs() < 1e-6,
            "Expected S(1) aprox {}, got {}",
            expected,
            integrator.expansion()
        );
    }

    #[test]
    fn test_integrator_multiple_methods() {
        let expected = 1.4 - 0.4 * (-2.0_f64 / 1.4).exp();
        let methods = vec![
            (IntegrationMethod::Dopri5, 1e-6),
            (IntegrationMethod::Radau5, 1e-4),
            (IntegrationMethod::RK4, 1e-4),
            (IntegrationMethod::Heun, 1e-2),
            (IntegrationMethod::Midpoint, 1e-2),
            (IntegrationMethod::Ralston, 1e-2),
            (IntegrationMethod::Euler, 5e-2),
        ];

        for (method, tolerance) in methods {
            let mut integrator = integrator(120.0).with_method(method);
            integrator.integrate_to(1.0, 0.05).unwrap();
            assert!(
                (integrator.expansion() - expected).abs() < tolerance,
                "Method {:?} gave {}, expected {}",
                method,
                integrator.expansion(),
                expected
            );
        }
    }

    #[test]
    fn test_integrate_on_grid() {
        let mut integrator = integrator(120.0);
        let history = integrator.integrate_on_grid(&[0.0, 0.5, 2.0, 10.0]).unwrap();
        let times: Vec<f64> = history.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0.0, 0.5, 2.0, 10.0]);
        for pair in history.windows(2) {
            assert!(pair[1].1 > pair[0].1);
        }
    }

    #[test]
    fn test_integrate_on_grid_rejects_bad_grids() {
        assert!(integrator(120.0).integrate_on_grid(&[]).is_err());
        assert!(integrator(120.0).integrate_on_grid(&[1.0, 2.0]).is_err());
        assert!(matches!(
            integrator(120.0).integrate_on_grid(&[0.0, 2.0, 1.0]),
            Err(SolverError::InvalidTimeGrid(_))
        ));
    }
}
