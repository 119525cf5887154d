// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Xpoint
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! A single plasma evaluation point.
//!
//! An [`Xpoint`] bundles the electron, the ion list, the local magnetic
//! geometry, run-wide meta values and the normalization options, and
//! exposes one key-based get/set surface that routes to the right
//! sub-record. Derived quantities (Zeff, Nustar, Ti/Te, epsilon) are
//! computed and matched through the same surface. All physical
//! constraint violations are hard errors; nothing is clamped.

use crate::keys::{PointKey, Synthetic};
use qlk_types::error::{QlkError, QlkResult};
use qlk_types::particle::{IonList, Particle, SpeciesField};
use qlk_types::records::{Geometry, Meta, Options, RotAbsVar, RotGradVar};
use serde::{Deserialize, Serialize};

/// Absolute tolerance of the quasineutrality hard check.
const QUASI_TOL: f64 = 1e-5;

/// Collisionality prefactor of the Nustar closed form.
const NUSTAR_C1: f64 = 6.9224e-5;

/// Wrapper for values that need special treatment when writing the
/// flat solver input (the spectral grid is the only member).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Special {
    pub kthetarhos: Vec<f64>,
}

/// A single scan point: species, geometry, meta and options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Xpoint {
    pub meta: Meta,
    pub special: Special,
    pub geometry: Geometry,
    pub elec: Particle,
    pub ions: IonList,
    #[serde(rename = "norm")]
    pub options: Options,
}

impl Xpoint {
    pub fn new(
        kthetarhos: Vec<f64>,
        elec: Particle,
        ions: IonList,
        geometry: Geometry,
        meta: Meta,
        options: Options,
    ) -> QlkResult<Self> {
        if ions.is_empty() {
            return Err(QlkError::UserSpec(
                "an Xpoint needs at least one ion".to_string(),
            ));
        }
        Ok(Xpoint {
            meta,
            special: Special { kthetarhos },
            geometry,
            elec,
            ions,
            options,
        })
    }

    pub fn kthetarhos(&self) -> &[f64] {
        &self.special.kthetarhos
    }

    // ── Quasineutrality ──────────────────────────────────────────────

    /// Set the first ion's density so that Σ n_s Z_s = 1 over all
    /// non-passing ions.
    pub fn normalize_density(&mut self) -> QlkResult<()> {
        let rest: f64 = self
            .ions
            .iter()
            .skip(1)
            .filter(|ion| ion.part.is_traced())
            .map(|ion| ion.part.n * ion.z)
            .sum();
        let n0 = (1.0 - rest) / self.ions[0].z;
        if !(0.0..=1.0).contains(&n0) || n0 == 0.0 {
            return Err(QlkError::UserSpec(format!(
                "Quasineutrality results in unphysical n_0/n_e = {n0} with Z = {:?} and n = {:?}",
                self.ions.iter().map(|i| i.z).collect::<Vec<_>>(),
                self.ions.iter().map(|i| i.part.n).collect::<Vec<_>>(),
            )));
        }
        self.ions[0].part.n = n0;
        Ok(())
    }

    /// Set the first ion's density gradient so that
    /// Σ n_s An_s Z_s = An_e over all non-passing ions.
    pub fn normalize_gradient(&mut self) -> QlkResult<()> {
        let rest: f64 = self
            .ions
            .iter()
            .skip(1)
            .filter(|ion| ion.part.is_traced())
            .map(|ion| ion.part.n * ion.part.an * ion.z)
            .sum();
        let denom = self.ions[0].z * self.ions[0].part.n;
        let an0 = (self.elec.an - rest) / denom;
        if !an0.is_finite() {
            return Err(QlkError::UserSpec(format!(
                "Quasineutrality gradient undefined: n_0 Z_0 = {denom}"
            )));
        }
        self.ions[0].part.an = an0;
        Ok(())
    }

    /// Hard-check quasineutrality of densities and gradients.
    pub fn check_quasineutrality(&self) -> QlkResult<()> {
        let traced = || self.ions.iter().filter(|ion| ion.part.is_traced());
        let quasicheck: f64 = traced().map(|ion| ion.part.n * ion.z).sum::<f64>() - 1.0;
        if quasicheck.abs() > QUASI_TOL {
            return Err(QlkError::ConsistencyViolation(format!(
                "Quasineutrality violated! Σ n_i Z_i - 1 = {quasicheck:e}"
            )));
        }
        let quasicheck_grad: f64 = traced()
            .map(|ion| ion.part.n * ion.part.an * ion.z)
            .sum::<f64>()
            - self.elec.an;
        if quasicheck_grad.abs() > QUASI_TOL {
            return Err(QlkError::ConsistencyViolation(format!(
                "Quasineutrality gradient violated! Σ n_i An_i Z_i - An_e = {quasicheck_grad:e}"
            )));
        }
        Ok(())
    }

    // ── Zeff ─────────────────────────────────────────────────────────

    /// Zeff = Σ n_s Z_s² over non-passing ions.
    pub fn calc_zeff(&self) -> f64 {
        self.ions
            .iter()
            .filter(|ion| ion.part.is_traced())
            .map(|ion| ion.part.n * ion.z * ion.z)
            .sum()
    }

    /// Solve the second ion's density so the point hits `zeff` exactly,
    /// then restore quasineutrality through the first ion.
    pub fn match_zeff(&mut self, zeff: f64) -> QlkResult<()> {
        if self.ions.len() > 1 {
            let z0 = self.ions[0].z;
            let z1 = self.ions[1].z;
            let tail = || self.ions.iter().skip(2).filter(|ion| ion.part.is_traced());
            let sum1: f64 = tail().map(|ion| ion.part.n * ion.z * ion.z).sum();
            let sum2: f64 = tail().map(|ion| ion.part.n * ion.z).sum::<f64>() * z0;
            let n1 = (zeff - z0 - sum1 + sum2) / (z1 * z1 - z1 * z0);
            if !(0.0..=1.0).contains(&n1) || n1 == 0.0 {
                return Err(QlkError::UserSpec(format!(
                    "Zeff = {zeff} results in unphysical n_1/n_e = {n1} with Z = {:?} and n = {:?}",
                    self.ions.iter().map(|i| i.z).collect::<Vec<_>>(),
                    self.ions.iter().map(|i| i.part.n).collect::<Vec<_>>(),
                )));
            }
            self.ions[1].part.n = n1;
            self.normalize_density()?;
        }
        Ok(())
    }

    // ── Nustar ───────────────────────────────────────────────────────

    fn nustar_coefficients(&self) -> (f64, f64) {
        let zeff = self.calc_zeff();
        let g = &self.geometry;
        let c1 = NUSTAR_C1 * zeff * self.elec.n * g.q * g.ro * (g.rmin * g.x / g.ro).powf(-1.5);
        let c2 = 15.2 - 0.5 * (0.1 * self.elec.n).ln();
        (c1, c2)
    }

    /// Normalized collisionality ν* = c1/Te² (c2 + ln Te).
    pub fn calc_nustar(&self) -> f64 {
        let (c1, c2) = self.nustar_coefficients();
        c1 / self.elec.t.powi(2) * (c2 + self.elec.t.ln())
    }

    /// Back-solve the electron temperature for a target ν*.
    ///
    /// The relation has no elementary inverse; Newton from the guess
    /// √(c1 c2 / ν*) converges in a handful of steps on the physical
    /// branch.
    pub fn match_nustar(&mut self, nustar: f64) -> QlkResult<()> {
        if nustar <= 0.0 {
            return Err(QlkError::UserSpec(format!(
                "Nustar target must be positive, got {nustar}"
            )));
        }
        let (c1, c2) = self.nustar_coefficients();
        let mut te = (c1 * c2 / nustar).sqrt();
        for _ in 0..100 {
            let f = c1 / te.powi(2) * (c2 + te.ln()) - nustar;
            if f.abs() < 1e-12 * nustar.max(1.0) {
                self.elec.t = te;
                return Ok(());
            }
            let fprime = c1 * (1.0 - 2.0 * (c2 + te.ln())) / te.powi(3);
            let step = f / fprime;
            te -= step;
            if !te.is_finite() || te <= 0.0 {
                break;
            }
        }
        Err(QlkError::UserSpec(format!(
            "Nustar inversion did not converge for target {nustar}"
        )))
    }

    // ── Ti/Te ────────────────────────────────────────────────────────

    /// Ti/Te; fails when the ions disagree on temperature.
    pub fn calc_tite(&self) -> QlkResult<f64> {
        let ti = self
            .ions
            .get_shared(SpeciesField::T)
            .map_err(|_| QlkError::UserSpec("Ions have non-equal temperatures".to_string()))?;
        Ok(ti / self.elec.t)
    }

    /// Set every ion temperature to `tite` times the electron one.
    pub fn match_tite(&mut self, tite: f64) {
        self.ions.set_shared(SpeciesField::T, tite * self.elec.t);
    }

    // ── Epsilon ──────────────────────────────────────────────────────

    /// Inverse aspect ratio ε = x Rmin / Ro.
    pub fn calc_epsilon(&self) -> f64 {
        self.geometry.x * self.geometry.rmin / self.geometry.ro
    }

    /// Set x to match a target ε.
    pub fn match_epsilon(&mut self, epsilon: f64) {
        self.geometry.x = self.geometry.ro * epsilon / self.geometry.rmin;
    }

    // ── Pure toroidal rotation ───────────────────────────────────────

    /// Derive the dependent rotation variables from the two designated
    /// independents, assuming pure toroidal rotation.
    ///
    /// The families {Machtor, Machpar} and {gammaE, Autor, Aupar} are
    /// linked by Machpar = Machtor/√(1+(ε/q)²), Autor = -gammaE q/ε and
    /// Aupar = Autor/√(1+(ε/q)²). A zero independent gradient produces
    /// zero dependents instead of NaN.
    pub fn set_pure_toroidal_rotation(&mut self) -> QlkResult<()> {
        let epsilon = self.calc_epsilon();
        let q = self.geometry.q;
        let norm = (1.0 + (epsilon / q).powi(2)).sqrt();

        match self.options.puretor_abs_var {
            RotAbsVar::Machtor => self.geometry.machpar = self.geometry.machtor / norm,
            RotAbsVar::Machpar => self.geometry.machtor = self.geometry.machpar * norm,
        }

        let grad = match self.options.puretor_grad_var {
            RotGradVar::GammaE => self.geometry.gamma_e,
            RotGradVar::Autor => self.geometry.autor,
            RotGradVar::Aupar => self.geometry.aupar,
        };
        if grad == 0.0 {
            tracing::warn!(
                independent = ?self.options.puretor_grad_var,
                "pure toroidal rotation with zero independent gradient; \
                 dependent gradients set to zero"
            );
            self.geometry.gamma_e = 0.0;
            self.geometry.autor = 0.0;
            self.geometry.aupar = 0.0;
            return Ok(());
        }
        if epsilon <= 0.0 {
            return Err(QlkError::UserSpec(format!(
                "pure toroidal rotation requires epsilon > 0, got {epsilon}"
            )));
        }
        match self.options.puretor_grad_var {
            RotGradVar::GammaE => {
                self.geometry.autor = -self.geometry.gamma_e * q / epsilon;
                self.geometry.aupar = self.geometry.autor / norm;
            }
            RotGradVar::Autor => {
                self.geometry.gamma_e = -self.geometry.autor * epsilon / q;
                self.geometry.aupar = self.geometry.autor / norm;
            }
            RotGradVar::Aupar => {
                self.geometry.autor = self.geometry.aupar * norm;
                self.geometry.gamma_e = -self.geometry.autor * epsilon / q;
            }
        }
        Ok(())
    }

    // ── Key surface ──────────────────────────────────────────────────

    /// Get a scalar by key.
    pub fn get(&self, key: &str) -> QlkResult<f64> {
        let parsed = PointKey::parse(key)
            .ok_or_else(|| QlkError::NotImplemented(format!("getting of '{key}'")))?;
        match parsed {
            PointKey::Synthetic(Synthetic::Zeff) => Ok(self.calc_zeff()),
            PointKey::Synthetic(Synthetic::Nustar) => Ok(self.calc_nustar()),
            PointKey::Synthetic(Synthetic::TiTeRel) => self.calc_tite(),
            PointKey::Synthetic(Synthetic::Epsilon) => Ok(self.calc_epsilon()),
            PointKey::Geometry(name) => self
                .geometry
                .get(name)
                .ok_or_else(|| QlkError::NotImplemented(format!("getting of '{key}'"))),
            PointKey::Meta(name) => self
                .meta
                .get(name)
                .ok_or_else(|| QlkError::NotImplemented(format!("getting of '{key}'"))),
            PointKey::Option(name) => self
                .options
                .get_flag(name)
                .map(|flag| flag as u8 as f64)
                .ok_or_else(|| QlkError::NotImplemented(format!("getting of '{key}'"))),
            PointKey::Kthetarhos => Err(QlkError::NotImplemented(
                "getting of 'kthetarhos' as a scalar".to_string(),
            )),
            PointKey::Shared(field) => {
                let ionval = self.ions.get_shared(field)?;
                let elecval = self
                    .elec
                    .get(field)
                    .ok_or_else(|| QlkError::NotImplemented(format!("getting of '{key}'")))?;
                if ionval == elecval {
                    Ok(elecval)
                } else {
                    Err(QlkError::UserSpec(format!(
                        "Unequal values for ion/elec key '{key}' = ({ionval}, {elecval})"
                    )))
                }
            }
            PointKey::Electron(field) => self
                .elec
                .get(field)
                .ok_or_else(|| QlkError::NotImplemented(format!("getting of '{key}'"))),
            PointKey::AllIons(field) => self.ions.get_shared(field),
            PointKey::Ion(idx, field) => {
                if idx >= self.ions.len() {
                    return Err(QlkError::UserSpec(format!(
                        "ion index {idx} out of range for {} ions",
                        self.ions.len()
                    )));
                }
                Ok(self.ions[idx].get(field))
            }
        }
    }

    /// Set a scalar by key. Synthetic keys run their match functions.
    pub fn set(&mut self, key: &str, value: f64) -> QlkResult<()> {
        let parsed = PointKey::parse(key)
            .ok_or_else(|| QlkError::NotImplemented(format!("setting of '{key}' = {value}")))?;
        match parsed {
            PointKey::Synthetic(Synthetic::Zeff) => self.match_zeff(value),
            PointKey::Synthetic(Synthetic::Nustar) => self.match_nustar(value),
            PointKey::Synthetic(Synthetic::TiTeRel) => {
                self.match_tite(value);
                Ok(())
            }
            PointKey::Synthetic(Synthetic::Epsilon) => {
                self.match_epsilon(value);
                Ok(())
            }
            PointKey::Geometry(name) => {
                if self.geometry.set(name, value) {
                    Ok(())
                } else {
                    Err(QlkError::NotImplemented(format!(
                        "setting of '{key}' = {value}"
                    )))
                }
            }
            PointKey::Meta(name) => {
                if self.meta.set(name, value) {
                    Ok(())
                } else {
                    Err(QlkError::NotImplemented(format!(
                        "setting of '{key}' = {value}"
                    )))
                }
            }
            PointKey::Option(name) => {
                if self.options.set_flag(name, value != 0.0) {
                    Ok(())
                } else {
                    Err(QlkError::NotImplemented(format!(
                        "setting of '{key}' = {value}"
                    )))
                }
            }
            PointKey::Kthetarhos => Err(QlkError::NotImplemented(
                "setting of 'kthetarhos' as a scalar".to_string(),
            )),
            PointKey::Shared(field) => {
                self.ions.set_shared(field, value);
                if !self.elec.set(field, value) {
                    return Err(QlkError::NotImplemented(format!(
                        "setting of '{key}' = {value}"
                    )));
                }
                Ok(())
            }
            PointKey::Electron(field) => {
                if self.elec.set(field, value) {
                    Ok(())
                } else {
                    Err(QlkError::NotImplemented(format!(
                        "setting of '{key}' = {value}"
                    )))
                }
            }
            PointKey::AllIons(field) => {
                self.ions.set_shared(field, value);
                Ok(())
            }
            PointKey::Ion(idx, field) => {
                if idx >= self.ions.len() {
                    return Err(QlkError::UserSpec(format!(
                        "ion index {idx} out of range for {} ions",
                        self.ions.len()
                    )));
                }
                self.ions[idx].set(field, value);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlk_types::particle::{Ion, TYPE_ACTIVE, TYPE_ADIABATIC, TYPE_PASSING};

    fn base_particle() -> Particle {
        Particle {
            t: 8.0,
            n: 0.1,
            at: 5.0,
            an: 5.0,
            ptype: TYPE_ACTIVE,
            anis: 1.0,
            danisdr: 0.0,
        }
    }

    fn base_point() -> Xpoint {
        let elec = Particle {
            n: 1.0,
            ..base_particle()
        };
        let ion0 = Ion {
            part: Particle {
                n: 0.9,
                ..base_particle()
            },
            a: 2.0,
            z: 1.0,
        };
        let ion1 = Ion {
            part: Particle {
                ptype: TYPE_ADIABATIC,
                ..base_particle()
            },
            a: 12.0,
            z: 6.0,
        };
        let ion2 = Ion {
            part: Particle {
                ptype: TYPE_PASSING,
                ..base_particle()
            },
            a: 12.0,
            z: 6.0,
        };
        let geometry = Geometry {
            x: 0.45,
            rho: 0.45,
            ro: 3.0,
            rmin: 1.0,
            bo: 3.0,
            q: 3.0,
            smag: 1.0,
            alpha: 0.0,
            machtor: 0.0,
            autor: 0.0,
            machpar: 0.0,
            aupar: 0.0,
            gamma_e: 0.0,
        };
        let options = Options {
            ninorm1: false,
            ani1: false,
            qn_grad: false,
            x_rho: false,
            ..Options::default()
        };
        Xpoint::new(
            vec![0.1, 2.2, 4.4, 6.6, 8.8, 11.0, 13.2, 15.4],
            elec,
            IonList::new(vec![ion0, ion1, ion2]),
            geometry,
            Meta::default(),
            options,
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_density() {
        let mut point = base_point();
        point.ions[0].z = 2.0;
        let n0s = [0.05, 0.2, 0.365, 0.497];
        let n1s = [0.15, 0.1, 0.045, 0.001];
        for (n0, n1) in n0s.iter().zip(n1s) {
            point.ions[0].part.n = 0.0;
            point.ions[1].part.n = n1;
            point.normalize_density().unwrap();
            assert!((point.ions[0].part.n - n0).abs() < 1e-12);
        }
        // A third traced ion shares the load.
        point.ions[2].part.ptype = TYPE_ACTIVE;
        for (n0, n1) in n0s.iter().zip(n1s) {
            point.ions[0].part.n = 0.0;
            point.ions[1].part.n = n1 / 3.0;
            point.ions[2].part.n = 2.0 * n1 / 3.0;
            point.normalize_density().unwrap();
            assert!((point.ions[0].part.n - n0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_normalize_density_unphysical() {
        let mut point = base_point();
        point.ions[1].part.n = 0.9;
        let err = point.normalize_density().unwrap_err();
        assert!(err.to_string().contains("unphysical"));
    }

    #[test]
    fn test_normalize_gradient() {
        let mut point = base_point();
        point.ions[0].z = 2.0;
        point.ions[0].part.n = 0.9;
        let an1s = [0.15, 0.1, 0.045, 0.001];
        for an1 in an1s {
            point.ions[0].part.an = 0.0;
            point.ions[1].part.an = an1;
            point.normalize_gradient().unwrap();
            let expected = (5.0 - 0.1 * an1 * 6.0) / 1.8;
            assert!((point.ions[0].part.an - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_check_quasineutrality() {
        let mut point = base_point();
        assert!(point.check_quasineutrality().is_err());
        // n0 Z0 + n1 Z1 = 0.4 + 0.6 = 1; passing ion 2 ignored.
        point.ions[0].part.n = 0.4;
        point.ions[0].part.an = 5.0;
        point.check_quasineutrality().unwrap();
        point.ions[1].part.an = 4.0;
        let err = point.check_quasineutrality().unwrap_err();
        assert!(err.to_string().contains("gradient"));
        point.ions[1].part.an = 5.0;
        point.check_quasineutrality().unwrap();
    }

    #[test]
    fn test_match_zeff_two_ion_values() {
        // Two-ion plasma, Z = [1, 6].
        let mut point = base_point();
        point.ions.0.truncate(2);
        point.ions[1].part.ptype = TYPE_ACTIVE;

        point.match_zeff(1.3).unwrap();
        assert!((point.ions[0].part.n - 0.94).abs() < 1e-12);
        assert!((point.ions[1].part.n - 0.01).abs() < 1e-12);
        assert!((point.calc_zeff() - 1.3).abs() < 1e-12);

        point.match_zeff(1.7).unwrap();
        assert!((point.ions[0].part.n - 0.86).abs() < 1e-12);
        assert!((point.ions[1].part.n - 7.0 / 300.0).abs() < 1e-12);
        assert!((point.calc_zeff() - 1.7).abs() < 1e-12);

        assert!(point.match_zeff(0.1).is_err());
    }

    #[test]
    fn test_match_zeff_degenerate_zero_fraction() {
        let mut point = base_point();
        point.ions.0.truncate(2);
        point.ions[1].part.ptype = TYPE_ACTIVE;
        // Zeff exactly Z0 makes n1 = 0: a degenerate no-op.
        assert!(point.match_zeff(1.0).is_err());
    }

    #[test]
    fn test_nustar_round_trip() {
        // Zeff = 0.9·1 + 0.1·36 = 4.5 with ne = 0.1, q = 3, Ro = 3,
        // Rmin = 1, x = 0.45.
        let mut point = base_point();
        point.ions.0.truncate(2);
        point.ions[1].part.ptype = TYPE_ACTIVE;
        point.elec.n = 0.1;
        point.ions[0].part.n = 0.9;
        point.ions[1].part.n = 0.1;
        assert!((point.calc_zeff() - 4.5).abs() < 1e-12);

        point.match_nustar(0.1).unwrap();
        assert!((point.elec.t - 0.916_764).abs() < 1e-5);
        assert!((point.calc_nustar() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_match_nustar_rejects_nonpositive() {
        let mut point = base_point();
        assert!(point.match_nustar(0.0).is_err());
        assert!(point.match_nustar(-1.0).is_err());
    }

    #[test]
    fn test_tite() {
        let mut point = base_point();
        point.match_tite(0.5);
        assert!((point.calc_tite().unwrap() - 0.5).abs() < 1e-12);
        for ion in point.ions.iter() {
            assert_eq!(ion.part.t, 4.0);
        }
        point.ions[0].part.t = 5.0;
        assert!(point.calc_tite().is_err());
    }

    #[test]
    fn test_epsilon() {
        let mut point = base_point();
        assert!((point.calc_epsilon() - 0.15).abs() < 1e-12);
        point.match_epsilon(0.3);
        assert!((point.geometry.x - 0.9).abs() < 1e-12);
        assert!((point.calc_epsilon() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_pure_toroidal_rotation_from_gamma_e() {
        let mut point = base_point();
        point.geometry.machtor = 0.3;
        point.geometry.gamma_e = 0.1;
        point.set_pure_toroidal_rotation().unwrap();

        let epsilon = 0.15f64;
        let norm = (1.0f64 + (epsilon / 3.0).powi(2)).sqrt();
        assert!((point.geometry.machpar - 0.3 / norm).abs() < 1e-12);
        let autor = -0.1 * 3.0 / epsilon;
        assert!((point.geometry.autor - autor).abs() < 1e-12);
        assert!((point.geometry.aupar - autor / norm).abs() < 1e-12);
    }

    #[test]
    fn test_pure_toroidal_rotation_from_aupar() {
        let mut point = base_point();
        point.options.puretor_abs_var = RotAbsVar::Machpar;
        point.options.puretor_grad_var = RotGradVar::Aupar;
        point.geometry.machpar = 0.2;
        point.geometry.aupar = -1.5;
        point.set_pure_toroidal_rotation().unwrap();

        let epsilon = 0.15f64;
        let norm = (1.0f64 + (epsilon / 3.0).powi(2)).sqrt();
        assert!((point.geometry.machtor - 0.2 * norm).abs() < 1e-12);
        let autor = -1.5 * norm;
        assert!((point.geometry.autor - autor).abs() < 1e-12);
        assert!((point.geometry.gamma_e - (-autor * epsilon / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_pure_toroidal_rotation_zero_gradient() {
        let mut point = base_point();
        point.geometry.gamma_e = 0.0;
        point.geometry.autor = 7.0;
        point.geometry.aupar = 7.0;
        point.set_pure_toroidal_rotation().unwrap();
        assert_eq!(point.geometry.autor, 0.0);
        assert_eq!(point.geometry.aupar, 0.0);
        assert_eq!(point.geometry.gamma_e, 0.0);
        assert!(point.geometry.machpar.is_finite());
    }

    #[test]
    fn test_pure_toroidal_rotation_zero_epsilon_rejected() {
        let mut point = base_point();
        point.geometry.x = 0.0;
        point.geometry.gamma_e = 0.1;
        assert!(point.set_pure_toroidal_rotation().is_err());
    }

    #[test]
    fn test_key_surface_singles() {
        let mut point = base_point();
        let keys = [
            "Te", "Ti1", "ne", "ni1", "Ate", "Ati1", "Ane", "Ani2", "typee", "typei1", "anise",
            "anisi1", "danisdre", "danisdri1", "Ai1", "Zi1", "x", "rho", "Ro", "Rmin", "Bo", "q",
            "smag", "alpha", "Machtor", "Autor", "Machpar", "Aupar", "gammaE", "numsols",
            "relacc1", "R0",
        ];
        for key in keys {
            point.set(key, 50.0).unwrap();
            assert_eq!(point.get(key).unwrap(), 50.0, "{key}");
        }
        for flag in ["ninorm1", "Ani1", "QN_grad", "x_rho"] {
            point.set(flag, 1.0).unwrap();
            assert_eq!(point.get(flag).unwrap(), 1.0, "{flag}");
        }
    }

    #[test]
    fn test_key_surface_all_ions() {
        let mut point = base_point();
        for key in ["Ti", "ni", "Ati", "Ani", "typei", "anisi", "danisdri", "Ai", "Zi"] {
            point.set(key, 50.0).unwrap();
            assert_eq!(point.get(key).unwrap(), 50.0, "{key}");
        }
    }

    #[test]
    fn test_key_surface_shared() {
        let mut point = base_point();
        point.set("T", 6.0).unwrap();
        assert_eq!(point.get("T").unwrap(), 6.0);
        assert_eq!(point.elec.t, 6.0);
        point.elec.t = 7.0;
        assert!(point.get("T").is_err());
    }

    #[test]
    fn test_key_surface_unknown() {
        let mut point = base_point();
        assert!(matches!(
            point.get("made up"),
            Err(QlkError::NotImplemented(_))
        ));
        assert!(matches!(
            point.get("made upi"),
            Err(QlkError::NotImplemented(_))
        ));
        assert!(matches!(
            point.set("made up", 50.0),
            Err(QlkError::NotImplemented(_))
        ));
        // Electron mass/charge does not exist.
        assert!(matches!(point.get("Ae"), Err(QlkError::NotImplemented(_))));
        // Recalc flags are construction-time only.
        assert!(matches!(
            point.set("recalc_Nustar", 1.0),
            Err(QlkError::NotImplemented(_))
        ));
        assert_eq!(point.get("recalc_Nustar").unwrap(), 0.0);
    }

    #[test]
    fn test_set_zeff_via_key() {
        let mut point = base_point();
        point.ions.0.truncate(2);
        point.ions[1].part.ptype = TYPE_ACTIVE;
        point.set("Zeff", 1.1).unwrap();
        assert!((point.get("Zeff").unwrap() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_ion_index_out_of_range() {
        let point = base_point();
        assert!(matches!(point.get("Ti7"), Err(QlkError::UserSpec(_))));
    }
}
