// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Particles
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Plasma species records: one electron and a list of ions per scan point.

use crate::error::{QlkError, QlkResult};
use serde::{Deserialize, Serialize};

/// Species type flag: takes part in the dispersion relation.
pub const TYPE_ACTIVE: f64 = 1.0;
/// Species type flag: adiabatic response only.
pub const TYPE_ADIABATIC: f64 = 2.0;
/// Species type flag: passing at ion scales; excluded from
/// quasineutrality and Zeff bookkeeping.
pub const TYPE_PASSING: f64 = 3.0;

/// A field on a species, by the solver's own short name.
///
/// `A` and `Z` exist on ions only; the other seven exist on every species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeciesField {
    T,
    N,
    At,
    An,
    Type,
    Anis,
    Danisdr,
    A,
    Z,
}

impl SpeciesField {
    /// Field names shared by electrons and ions, in solver order.
    pub const PARTICLE_NAMES: [&'static str; 7] =
        ["T", "n", "At", "An", "type", "anis", "danisdr"];
    /// Ion-only field names, in solver order.
    pub const ION_NAMES: [&'static str; 2] = ["A", "Z"];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "T" => Some(Self::T),
            "n" => Some(Self::N),
            "At" => Some(Self::At),
            "An" => Some(Self::An),
            "type" => Some(Self::Type),
            "anis" => Some(Self::Anis),
            "danisdr" => Some(Self::Danisdr),
            "A" => Some(Self::A),
            "Z" => Some(Self::Z),
            _ => None,
        }
    }

    pub fn is_ion_only(self) -> bool {
        matches!(self, Self::A | Self::Z)
    }
}

/// One plasma species at a single scan point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Temperature [keV].
    #[serde(rename = "T")]
    pub t: f64,
    /// Density: 10^19 m^-3 for electrons, fraction of the electron
    /// density for ions.
    pub n: f64,
    /// Normalized logarithmic temperature gradient -(R/T)(dT/dr).
    #[serde(rename = "At")]
    pub at: f64,
    /// Normalized logarithmic density gradient -(R/n)(dn/dr).
    #[serde(rename = "An")]
    pub an: f64,
    /// Species type flag (1 active, 2 adiabatic, 3 passing at ion scales).
    #[serde(rename = "type")]
    pub ptype: f64,
    /// Temperature anisotropy T_perp / T_para at the LFS.
    pub anis: f64,
    /// Radial gradient of the temperature anisotropy.
    pub danisdr: f64,
}

impl Particle {
    /// Value of a shared field; `None` for the ion-only fields.
    pub fn get(&self, field: SpeciesField) -> Option<f64> {
        match field {
            SpeciesField::T => Some(self.t),
            SpeciesField::N => Some(self.n),
            SpeciesField::At => Some(self.at),
            SpeciesField::An => Some(self.an),
            SpeciesField::Type => Some(self.ptype),
            SpeciesField::Anis => Some(self.anis),
            SpeciesField::Danisdr => Some(self.danisdr),
            SpeciesField::A | SpeciesField::Z => None,
        }
    }

    /// Set a shared field; `false` for the ion-only fields.
    pub fn set(&mut self, field: SpeciesField, value: f64) -> bool {
        match field {
            SpeciesField::T => self.t = value,
            SpeciesField::N => self.n = value,
            SpeciesField::At => self.at = value,
            SpeciesField::An => self.an = value,
            SpeciesField::Type => self.ptype = value,
            SpeciesField::Anis => self.anis = value,
            SpeciesField::Danisdr => self.danisdr = value,
            SpeciesField::A | SpeciesField::Z => return false,
        }
        true
    }

    /// Counts towards quasineutrality and Zeff (not passing at ion scales).
    pub fn is_traced(&self) -> bool {
        self.ptype < TYPE_PASSING
    }
}

/// An ion species: the shared particle fields plus mass and charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ion {
    #[serde(flatten)]
    pub part: Particle,
    /// Mass [amu].
    #[serde(rename = "A")]
    pub a: f64,
    /// Charge [e].
    #[serde(rename = "Z")]
    pub z: f64,
}

impl Ion {
    pub fn get(&self, field: SpeciesField) -> f64 {
        match field {
            SpeciesField::A => self.a,
            SpeciesField::Z => self.z,
            other => self.part.get(other).unwrap_or(f64::NAN),
        }
    }

    pub fn set(&mut self, field: SpeciesField, value: f64) {
        match field {
            SpeciesField::A => self.a = value,
            SpeciesField::Z => self.z = value,
            other => {
                self.part.set(other, value);
            }
        }
    }
}

/// The ion population of a scan point.
///
/// Bulk get succeeds only when all ions agree on the requested field;
/// bulk set writes the field on every ion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IonList(pub Vec<Ion>);

impl IonList {
    pub fn new(ions: Vec<Ion>) -> Self {
        Self(ions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ion> {
        self.0.iter()
    }

    /// The shared value of `field` over all ions.
    pub fn get_shared(&self, field: SpeciesField) -> QlkResult<f64> {
        let values: Vec<f64> = self.0.iter().map(|ion| ion.get(field)).collect();
        match values.first() {
            None => Err(QlkError::UserSpec("ion list is empty".to_string())),
            Some(&first) if values.iter().all(|&v| v == first) => Ok(first),
            Some(_) => Err(QlkError::UserSpec(format!(
                "Unequal values for ion key {field:?} = {values:?}"
            ))),
        }
    }

    /// Write `field` on every ion.
    pub fn set_shared(&mut self, field: SpeciesField, value: f64) {
        for ion in &mut self.0 {
            ion.set(field, value);
        }
    }
}

impl std::ops::Index<usize> for IonList {
    type Output = Ion;
    fn index(&self, idx: usize) -> &Ion {
        &self.0[idx]
    }
}

impl std::ops::IndexMut<usize> for IonList {
    fn index_mut(&mut self, idx: usize) -> &mut Ion {
        &mut self.0[idx]
    }
}
