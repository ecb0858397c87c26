//! Stimulus sensitivities using `num-dual`.
//!
//! The response formulas are written over [`Scalar`](crate::Scalar), so the
//! same code evaluates with `Dual64` numbers and yields exact local
//! derivatives of the diameter with respect to each stimulus.
//!
//! # Example
//!
//! ```
//! use smartmud::autodiff::diameter_sensitivity;
//! use smartmud::{ReferenceConditions, ResponseModel, Stimulus};
//!
//! let response = ResponseModel::default();
//! let reference = ReferenceConditions::default().with_unit_temperature_scale();
//! let s = diameter_sensitivity(&Stimulus::reference(), &response, &reference).unwrap();
//!
//! // dD/dpH = D0 * kpH at the neutral point
//! assert!((s.d_ph - 1.0).abs() < 1e-12);
//! assert!(s.d_pressure < 0.0);
//! ```

use crate::models::ResponseModel;
use crate::models::response::diameter_generic;
use crate::{ModelResult, ReferenceConditions, Stimulus, finite_result};
use num_dual::*;
use serde::{Deserialize, Serialize};

/// Computes the gradient of a scalar function using forward-mode automatic differentiation.
///
/// # Arguments
///
/// * `f` - The function taking a slice of variables and returning a single value
/// * `x` - The point at which to evaluate the gradient
///
/// # Returns
///
/// One partial derivative per variable, in the order of `x`.
pub fn compute_gradient<F, E>(f: F, x: &[f64]) -> Result<Vec<f64>, E>
where
    F: Fn(&[Dual64]) -> Result<Dual64, E>,
{
    let mut gradient = Vec::with_capacity(x.len());

    for j in 0..x.len() {
        // Seed variable j, keep the others constant
        let mut x_dual: Vec<Dual64> = x.iter().map(|&v| Dual64::from(v)).collect();
        x_dual[j] = Dual64::from(x[j]).derivative();

        gradient.push(f(&x_dual)?.eps);
    }

    Ok(gradient)
}

/// Local derivatives of the diameter (nm per unit stimulus).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StimulusSensitivity {
    /// dD/dP (nm/psi)
    pub d_pressure: f64,
    /// dD/dT (nm/°C)
    pub d_temperature: f64,
    /// dD/dpH (nm per pH unit)
    pub d_ph: f64,
}

/// Derivatives of the diameter with respect to pressure, temperature and pH at `stimulus`.
pub fn diameter_sensitivity(
    stimulus: &Stimulus,
    response: &ResponseModel,
    reference: &ReferenceConditions,
) -> ModelResult<StimulusSensitivity> {
    stimulus.ensure_finite()?;
    let gradient = compute_gradient(
        |v: &[Dual64]| {
            diameter_generic(v[0], v[1], v[2], &response.constants, response.formula, reference)
        },
        &[stimulus.pressure, stimulus.temperature, stimulus.ph],
    )?;

    Ok(StimulusSensitivity {
        d_pressure: finite_result("dD/dP", gradient[0])?,
        d_temperature: finite_result("dD/dT", gradient[1])?,
        d_ph: finite_result("dD/dpH", gradient[2])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelError;
    use crate::models::{DiameterFormula, ResponseConstants};

    #[test]
    fn test_compute_gradient_simple() {
        // f(x, y) = x^2 * y
        let f = |v: &[Dual64]| -> Result<Dual64, ()> { Ok(v[0] * v[0] * v[1]) };
        let gradient = compute_gradient(f, &[2.0, 3.0]).unwrap();

        assert_eq!(gradient.len(), 2);
        assert!((gradient[0] - 12.0).abs() < 1e-12); // 2xy
        assert!((gradient[1] - 4.0).abs() < 1e-12); // x^2
    }

    #[test]
    fn test_additive_sensitivity_is_constant() {
        let response =
            ResponseModel::new(DiameterFormula::Additive, ResponseConstants::additive_hybrid());
        let reference = ReferenceConditions::default();
        let stimulus = Stimulus::new(12000.0, 150.0, 10.0);
        let s = diameter_sensitivity(&stimulus, &response, &reference).unwrap();

        assert!((s.d_ph - 50.0 * 0.02).abs() < 1e-12);
        assert!((s.d_temperature - 50.0 * 0.02 / 90.0).abs() < 1e-12);
        assert!((s.d_pressure - 50.0 * 0.015 / 10000.0).abs() < 1e-15);
    }

    #[test]
    fn test_signs_follow_coefficients() {
        let response = ResponseModel::default();
        let reference = ReferenceConditions::default().with_unit_temperature_scale();
        let s = diameter_sensitivity(&Stimulus::reference(), &response, &reference).unwrap();

        assert!(s.d_ph > 0.0);
        assert!(s.d_temperature > 0.0);
        assert!(s.d_pressure < 0.0);
        assert!((s.d_temperature - 50.0 * 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_matches_finite_differences() {
        let response = ResponseModel::default();
        let reference = ReferenceConditions::default().with_unit_temperature_scale();
        let stimulus = Stimulus::new(9000.0, 130.0, 8.5);
        let s = diameter_sensitivity(&stimulus, &response, &reference).unwrap();

        let h = 1e-4;
        let d = |st: Stimulus| response.diameter(&st, &reference).unwrap();
        let upper = d(stimulus.with_temperature(130.0 + h));
        let lower = d(stimulus.with_temperature(130.0 - h));
        let fd_t = (upper - lower) / (2.0 * h);
        assert!((s.d_temperature - fd_t).abs() < 1e-6);
    }

    #[test]
    fn test_logarithmic_sensitivity() {
        let response = ResponseModel::new(
            DiameterFormula::Logarithmic,
            ResponseConstants::pressure_logarithmic(),
        );
        let reference = ReferenceConditions::default();
        let stimulus = Stimulus::new(10000.0, 90.0, 7.0);
        let s = diameter_sensitivity(&stimulus, &response, &reference).unwrap();

        // dD/dP = -D0 * alpha / P
        assert!((s.d_pressure + 50.0 * 0.03 / 10000.0).abs() < 1e-15);
        assert_eq!(s.d_temperature, 0.0);
        assert_eq!(s.d_ph, 0.0);

        assert!(matches!(
            diameter_sensitivity(&Stimulus::new(0.0, 90.0, 7.0), &response, &reference),
            Err(ModelError::NonPositivePressure { .. })
        ));
    }
}
