//! Nanoparticle response, fluid rheology and swelling kinetics models.
//!
//! This module provides the closed-form stages of the pipeline together with
//! the optional time-domain model, organized as individual files:
//!
//! - **response**: Stimulus to nanoparticle diameter (additive, multiplicative
//!   and logarithmic-shrinkage formulas)
//! - **rheology**: Diameter and stimulus to a Herschel-Bulkley shear-stress curve,
//!   plus the conventional no-nanoparticle baseline
//! - **kinetics**: Time evolution of the expansion factor at a fixed temperature
//!
//! All models are plain values with no interior state; the same inputs always
//! give the same curve.
//!
//! ## Example
//!
//! ```
//! use smartmud::models::{DiameterFormula, ResponseModel, ResponseConstants, RheologyModel};
//! use smartmud::{ReferenceConditions, Stimulus};
//!
//! let reference = ReferenceConditions::default();
//! let response = ResponseModel::new(DiameterFormula::Additive, ResponseConstants::ph_only());
//! let stimulus = Stimulus::reference().with_ph(9.0);
//!
//! let diameter = response.diameter(&stimulus, &reference).unwrap();
//! assert!((diameter - 54.0).abs() < 1e-9);
//!
//! let rheology = RheologyModel::default();
//! let curve = rheology
//!     .curve(diameter, response.d0(), &stimulus, &reference, &[1.0, 10.0, 100.0])
//!     .unwrap();
//! assert_eq!(curve.len(), 3);
//! ```

pub mod kinetics;
pub mod response;
pub mod rheology;

pub use kinetics::{
    ExpansionRheology, KineticConstants, KineticsParameters, KineticsTrajectory,
    run_time_domain_kinetics, time_grid,
};
pub use response::{
    DiameterFormula, IndividualResponses, NanoparticleState, ResponseConstants, ResponseModel,
    compute_diameter,
};
pub use rheology::{
    ConsistencyModel, RheologyConstants, RheologyCurve, RheologyModel, ShearRateRange,
    ThermalModulation, YieldStressCoupling, compute_rheology_curve, herschel_bulkley,
    validate_shear_rates,
};
