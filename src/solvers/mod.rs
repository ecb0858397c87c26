//! Numerical solvers for the time-domain swelling model.
//!
//! The closed-form response and rheology models need no solver. The only
//! dynamic model in the crate, the swelling kinetics in
//! [`models::kinetics`](crate::models::kinetics), is integrated here.
//!
//! # Submodules
//!
//! - [`integration`]: Adaptive and fixed-step Runge-Kutta integration of the
//!   expansion factor using the `differential-equations` crate (feature `solvers`).
//!
//! # Usage Pattern
//!
//! ```ignore
//! use smartmud::solvers::integration::SwellingIntegrator;
//! use smartmud::models::KineticConstants;
//!
//! let mut integrator = SwellingIntegrator::new(KineticConstants::default(), 120.0, 1.0)?;
//! let history = integrator.integrate_to(100.0, 0.2)?;
//! ```

// Submodules
#[cfg(feature = "solvers")]
pub mod integration;

/// Result type for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;

/// Errors that can occur during integration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// Kinetic constants or initial state unusable by the integrator
    #[error("Invalid kinetic parameter: {0}")]
    InvalidParameter(String),
    /// Output time grid is empty, unordered or not finite
    #[error("Invalid time grid: {0}")]
    InvalidTimeGrid(String),
    /// Step size must be positive and finite
    #[error("Step size must be positive and finite, got {0}")]
    InvalidStepSize(f64),
    /// ODE solver failed
    #[error("ODE solver failed: {0}")]
    ODESolverFailed(String),
    /// Solution left the finite range
    #[error("Solution diverged at t = {time}")]
    Diverged { time: f64 },
    /// ODE solver feature not enabled
    #[error("Time-domain kinetics requires the 'solvers' feature to be enabled")]
    FeatureNotEnabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(SolverError::Diverged { time: 2.5 }.to_string(), "Solution diverged at t = 2.5");
        assert_eq!(
            SolverError::ODESolverFailed("step size underflow".to_string()).to_string(),
            "ODE solver failed: step size underflow"
        );
    }
}
