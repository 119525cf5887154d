// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Point Records
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-point geometry, run-wide meta values and normalization options.
//!
//! Field names in the serialized plan document follow the solver's own
//! catalogue (`Ro`, `Rmin`, `gammaE`, `ETGmult`, ...), so plans written
//! by older tooling keep loading.

use serde::{Deserialize, Serialize};

/// Magnetic-geometry and flow scalars that change per scan point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Radial normalized coordinate [-].
    pub x: f64,
    /// Normalized toroidal flux coordinate [-].
    pub rho: f64,
    /// Major radius [m].
    #[serde(rename = "Ro")]
    pub ro: f64,
    /// Minor radius [m].
    #[serde(rename = "Rmin")]
    pub rmin: f64,
    /// Magnetic field at the magnetic axis [T].
    #[serde(rename = "Bo")]
    pub bo: f64,
    /// Local safety factor.
    pub q: f64,
    /// Local magnetic shear s = r q'/q.
    pub smag: f64,
    /// Local MHD alpha.
    pub alpha: f64,
    /// Normalized toroidal velocity.
    #[serde(rename = "Machtor")]
    pub machtor: f64,
    /// Toroidal velocity gradient.
    #[serde(rename = "Autor")]
    pub autor: f64,
    /// Normalized parallel velocity.
    #[serde(rename = "Machpar")]
    pub machpar: f64,
    /// Parallel velocity gradient.
    #[serde(rename = "Aupar")]
    pub aupar: f64,
    /// Normalized perpendicular ExB flow shear.
    #[serde(rename = "gammaE")]
    pub gamma_e: f64,
}

impl Geometry {
    /// Solver input names, in the order the flat buffers are laid out.
    pub const IN_ARGS: [&'static str; 13] = [
        "x", "rho", "Ro", "Rmin", "Bo", "q", "smag", "alpha", "Machtor", "Autor", "Machpar",
        "Aupar", "gammaE",
    ];

    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "x" => Some(self.x),
            "rho" => Some(self.rho),
            "Ro" => Some(self.ro),
            "Rmin" => Some(self.rmin),
            "Bo" => Some(self.bo),
            "q" => Some(self.q),
            "smag" => Some(self.smag),
            "alpha" => Some(self.alpha),
            "Machtor" => Some(self.machtor),
            "Autor" => Some(self.autor),
            "Machpar" => Some(self.machpar),
            "Aupar" => Some(self.aupar),
            "gammaE" => Some(self.gamma_e),
            _ => None,
        }
    }

    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match name {
            "x" => self.x = value,
            "rho" => self.rho = value,
            "Ro" => self.ro = value,
            "Rmin" => self.rmin = value,
            "Bo" => self.bo = value,
            "q" => self.q = value,
            "smag" => self.smag = value,
            "alpha" => self.alpha = value,
            "Machtor" => self.machtor = value,
            "Autor" => self.autor = value,
            "Machpar" => self.machpar = value,
            "Aupar" => self.aupar = value,
            "gammaE" => self.gamma_e = value,
            _ => return false,
        }
        true
    }
}

/// Run-wide solver knobs, constant over a scan.
///
/// Everything is stored as `f64` because the solver consumes its whole
/// input as flat double-precision buffers, boolean flags included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Flag for additional calculation of output parameters.
    pub phys_meth: f64,
    /// Flag for collisionality.
    pub coll_flag: f64,
    /// Flag for rotation.
    pub rot_flag: f64,
    /// Output verbosity flag.
    pub verbose: f64,
    /// Toggle output of separate ITG/TEM/ETG fluxes.
    pub separateflux: f64,
    /// Write solver primitives to file.
    pub write_primi: f64,
    /// Number of requested solutions.
    pub numsols: f64,
    /// Relative accuracy of 1D integrals.
    pub relacc1: f64,
    /// Relative accuracy of 2D integrals.
    pub relacc2: f64,
    /// Runs jumping directly to Newton between contour checks.
    pub maxruns: f64,
    /// Integrand evaluations allowed in the 2D integral.
    pub maxpts: f64,
    /// Upper time limit [s] per wavenumber/scan point.
    pub timeout: f64,
    /// Multiplier for the ETG saturation level.
    #[serde(rename = "ETGmult")]
    pub etg_mult: f64,
    /// Multiplier for collisionality.
    #[serde(rename = "collmult")]
    pub coll_mult: f64,
    /// Geometric major radius [m] used for normalizations.
    #[serde(rename = "R0")]
    pub r0: f64,
}

impl Meta {
    /// Solver input names, in buffer layout order.
    pub const KEYNAMES: [&'static str; 15] = [
        "phys_meth",
        "coll_flag",
        "rot_flag",
        "verbose",
        "separateflux",
        "write_primi",
        "numsols",
        "relacc1",
        "relacc2",
        "maxruns",
        "maxpts",
        "timeout",
        "ETGmult",
        "collmult",
        "R0",
    ];

    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "phys_meth" => Some(self.phys_meth),
            "coll_flag" => Some(self.coll_flag),
            "rot_flag" => Some(self.rot_flag),
            "verbose" => Some(self.verbose),
            "separateflux" => Some(self.separateflux),
            "write_primi" => Some(self.write_primi),
            "numsols" => Some(self.numsols),
            "relacc1" => Some(self.relacc1),
            "relacc2" => Some(self.relacc2),
            "maxruns" => Some(self.maxruns),
            "maxpts" => Some(self.maxpts),
            "timeout" => Some(self.timeout),
            "ETGmult" => Some(self.etg_mult),
            "collmult" => Some(self.coll_mult),
            "R0" => Some(self.r0),
            _ => None,
        }
    }

    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match name {
            "phys_meth" => self.phys_meth = value,
            "coll_flag" => self.coll_flag = value,
            "rot_flag" => self.rot_flag = value,
            "verbose" => self.verbose = value,
            "separateflux" => self.separateflux = value,
            "write_primi" => self.write_primi = value,
            "numsols" => self.numsols = value,
            "relacc1" => self.relacc1 = value,
            "relacc2" => self.relacc2 = value,
            "maxruns" => self.maxruns = value,
            "maxpts" => self.maxpts = value,
            "timeout" => self.timeout = value,
            "ETGmult" => self.etg_mult = value,
            "collmult" => self.coll_mult = value,
            "R0" => self.r0 = value,
            _ => return false,
        }
        true
    }
}

impl Default for Meta {
    fn default() -> Self {
        Meta {
            phys_meth: 2.0,
            coll_flag: 1.0,
            rot_flag: 0.0,
            verbose: 1.0,
            separateflux: 0.0,
            write_primi: 1.0,
            numsols: 3.0,
            relacc1: 1e-3,
            relacc2: 2e-2,
            maxruns: 1.0,
            maxpts: 5e5,
            timeout: 60.0,
            etg_mult: 1.0,
            coll_mult: 1.0,
            r0: 3.0,
        }
    }
}

/// The absolute-velocity variable treated as independent under pure
/// toroidal rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotAbsVar {
    #[default]
    #[serde(rename = "Machtor")]
    Machtor,
    #[serde(rename = "Machpar")]
    Machpar,
}

/// The gradient variable treated as independent under pure toroidal
/// rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotGradVar {
    #[default]
    #[serde(rename = "gammaE")]
    GammaE,
    #[serde(rename = "Autor")]
    Autor,
    #[serde(rename = "Aupar")]
    Aupar,
}

fn default_true() -> bool {
    true
}

/// Flags controlling which derived quantities are auto-solved during
/// scan expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Re-solve the first ion's density for quasineutrality.
    pub ninorm1: bool,
    /// Re-solve the first ion's density gradient for quasineutrality.
    #[serde(rename = "Ani1")]
    pub ani1: bool,
    /// Hard-check quasineutrality (value and gradient) per point.
    #[serde(rename = "QN_grad")]
    pub qn_grad: bool,
    /// Keep rho equal to x.
    pub x_rho: bool,
    /// Hold Nustar constant across the scan by back-solving Te.
    #[serde(rename = "recalc_Nustar", default)]
    pub recalc_nustar: bool,
    /// Hold Ti/Te constant across the scan by back-solving Ti.
    #[serde(rename = "recalc_Ti_Te_rel", default)]
    pub recalc_tite: bool,
    /// Assume pure toroidal rotation; derive the dependent rotation
    /// variables per point.
    #[serde(default = "default_true")]
    pub assume_tor_rot: bool,
    /// Which absolute-velocity variable is independent.
    #[serde(default)]
    pub puretor_abs_var: RotAbsVar,
    /// Which gradient variable is independent.
    #[serde(default)]
    pub puretor_grad_var: RotGradVar,
}

impl Options {
    /// Flag names visible through the point key surface.
    pub const FLAG_NAMES: [&'static str; 7] = [
        "ninorm1",
        "Ani1",
        "QN_grad",
        "x_rho",
        "recalc_Nustar",
        "recalc_Ti_Te_rel",
        "assume_tor_rot",
    ];

    /// Flags that may be toggled through `set()`; the recalc flags and
    /// the rotation assumption are construction-time decisions.
    pub const SETTABLE_NAMES: [&'static str; 4] = ["ninorm1", "Ani1", "QN_grad", "x_rho"];

    pub fn get_flag(&self, name: &str) -> Option<bool> {
        match name {
            "ninorm1" => Some(self.ninorm1),
            "Ani1" => Some(self.ani1),
            "QN_grad" => Some(self.qn_grad),
            "x_rho" => Some(self.x_rho),
            "recalc_Nustar" => Some(self.recalc_nustar),
            "recalc_Ti_Te_rel" => Some(self.recalc_tite),
            "assume_tor_rot" => Some(self.assume_tor_rot),
            _ => None,
        }
    }

    pub fn set_flag(&mut self, name: &str, value: bool) -> bool {
        match name {
            "ninorm1" => self.ninorm1 = value,
            "Ani1" => self.ani1 = value,
            "QN_grad" => self.qn_grad = value,
            "x_rho" => self.x_rho = value,
            _ => return false,
        }
        true
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            ninorm1: true,
            ani1: true,
            qn_grad: true,
            x_rho: true,
            recalc_nustar: false,
            recalc_tite: false,
            assume_tor_rot: true,
            puretor_abs_var: RotAbsVar::default(),
            puretor_grad_var: RotGradVar::default(),
        }
    }
}
