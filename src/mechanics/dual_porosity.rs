//! Dual-porosity (pore + fracture) extension of the poroelastic model
//!
//! Two pressure fields share the pressure index map: the matrix ("pore")
//! pressure p1 and the fracture ("macro") pressure p2. They are coupled through
//! a 2×2 storage matrix and a leak term β(p1 − p2).

use serde::{Deserialize, Serialize};

use super::poroelastic::{Coefficients, PoroelasticProperties};
use crate::error::{PoroError, Result};

/// Constants of the dual-porosity balance equations
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct DualPorosity {
    /// Fracture permeability (m²)
    pub macro_permeability: f64,
    /// Share of the Biot coefficient carried by each pressure, [ψ_pore, ψ_frac]
    pub psi: [f64; 2],
    /// Symmetric storage matrix [[S11, S12], [S12, S22]] (1/Pa)
    pub storage: [[f64; 2]; 2],
    /// Leak coefficient β (1/(Pa·s))
    pub leak: f64,
}

impl DualPorosity {
    /// Derive the constants from a property bundle that carries macro porosity
    /// and macro permeability
    ///
    /// ψ_i is the porosity share of each continuum, S_ii = φ_i c_f + (αψ_i − φ_i) c_s,
    /// S12 = 0 and β = shape_factor · K_pore / μ_f.
    pub fn from_properties(props: &PoroelasticProperties, shape_factor: f64) -> Result<Self> {
        props.validate()?;
        let (phi_frac, k_frac) = match (props.macro_porosity, props.macro_permeability) {
            (Some(phi), Some(k)) => (phi, k),
            _ => {
                return Err(PoroError::config(
                    "dual porosity requires macro_porosity and macro_permeability",
                ))
            }
        };
        if !(shape_factor >= 0.0) {
            return Err(PoroError::config("leak shape factor must be non-negative"));
        }

        let phi_pore = props.porosity;
        let alpha = props.biot_coefficient();
        let c_f = 1.0 / props.fluid_bulk_modulus;
        let c_s = 1.0 / props.solid_bulk_modulus;

        let total = phi_pore + phi_frac;
        let psi = [phi_pore / total, phi_frac / total];
        let s11 = phi_pore * c_f + (alpha * psi[0] - phi_pore) * c_s;
        let s22 = phi_frac * c_f + (alpha * psi[1] - phi_frac) * c_s;

        let dual = Self {
            macro_permeability: k_frac,
            psi,
            storage: [[s11, 0.0], [0.0, s22]],
            leak: shape_factor * props.permeability / props.fluid_viscosity,
        };
        dual.validate()?;
        Ok(dual)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.macro_permeability > 0.0) {
            return Err(PoroError::config("macro permeability must be positive"));
        }
        if self.leak < 0.0 {
            return Err(PoroError::config("leak coefficient must be non-negative"));
        }
        let [[s11, s12], [s21, s22]] = self.storage;
        if (s12 - s21).abs() > 1e-12 * (s11.abs() + s22.abs()).max(f64::MIN_POSITIVE) {
            return Err(PoroError::config("dual-porosity storage matrix must be symmetric"));
        }
        if s11 < 0.0 || s22 < 0.0 {
            return Err(PoroError::config("dual-porosity storage terms must be non-negative"));
        }
        Ok(())
    }
}

/// Number and coupling of the pressure-like fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PorosityModel {
    Single,
    Double(DualPorosity),
}

impl PorosityModel {
    /// Number of pressure-like quantities (1 or 2)
    pub fn pressure_count(&self) -> usize {
        match self {
            PorosityModel::Single => 1,
            PorosityModel::Double(_) => 2,
        }
    }

    /// Biot weight α_k of each pressure in the total stress
    pub fn biot_weights(&self, coefficients: &Coefficients) -> [f64; 2] {
        match self {
            PorosityModel::Single => [coefficients.biot, 0.0],
            PorosityModel::Double(d) => [coefficients.biot * d.psi[0], coefficients.biot * d.psi[1]],
        }
    }

    /// Storage coupling S_kl between pressures k and l
    pub fn storage(&self, coefficients: &Coefficients, k: usize, l: usize) -> f64 {
        match self {
            PorosityModel::Single => {
                if k == 0 && l == 0 {
                    coefficients.storage
                } else {
                    0.0
                }
            }
            PorosityModel::Double(d) => d.storage[k][l],
        }
    }

    /// Mobility K_k / μ_f of pressure k
    pub fn mobility(&self, coefficients: &Coefficients, k: usize) -> f64 {
        match (self, k) {
            (PorosityModel::Double(d), 1) => d.macro_permeability / coefficients.viscosity,
            _ => coefficients.mobility(),
        }
    }

    /// Leak coefficient β (zero for a single porosity)
    pub fn leak(&self) -> f64 {
        match self {
            PorosityModel::Single => 0.0,
            PorosityModel::Double(d) => d.leak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fractured() -> PoroelasticProperties {
        PoroelasticProperties {
            shear_modulus: 6.0e9,
            bulk_modulus: 8.0e9,
            solid_bulk_modulus: 36.0e9,
            solid_density: 2650.0,
            fluid_bulk_modulus: 2.2e9,
            porosity: 0.19 * 2.0 / 3.0,
            permeability: 1.9e-16,
            fluid_viscosity: 1.0e-3,
            fluid_density: 1000.0,
            macro_porosity: Some(0.19 / 3.0),
            macro_permeability: Some(1.9e-13 * 0.999),
        }
    }

    #[test]
    fn test_psi_splits_biot_coefficient() {
        let props = fractured();
        let dual = DualPorosity::from_properties(&props, 1.0).unwrap();
        assert_relative_eq!(dual.psi[0] + dual.psi[1], 1.0, epsilon = 1e-14);
        assert_relative_eq!(dual.psi[0], 2.0 / 3.0, epsilon = 1e-12);

        let c = Coefficients::from_properties(&props, 0.0).unwrap();
        let model = PorosityModel::Double(dual);
        let w = model.biot_weights(&c);
        assert_relative_eq!(w[0] + w[1], c.biot, epsilon = 1e-14);
        assert_eq!(model.pressure_count(), 2);
        assert_relative_eq!(model.mobility(&c, 1), 1.9e-13 * 0.999 / 1.0e-3, max_relative = 1e-12);
    }

    #[test]
    fn test_missing_macro_properties_rejected() {
        let mut props = fractured();
        props.macro_permeability = None;
        assert!(DualPorosity::from_properties(&props, 1.0).is_err());
    }

    #[test]
    fn test_single_porosity_storage() {
        let c = Coefficients::from_properties(&fractured(), 0.0).unwrap();
        let model = PorosityModel::Single;
        assert_eq!(model.storage(&c, 0, 0), c.storage);
        assert_eq!(model.storage(&c, 0, 1), 0.0);
        assert_eq!(model.leak(), 0.0);
    }
}
