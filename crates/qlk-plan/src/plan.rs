// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Scan Plan
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Expansion of a scan plan into the solver's flat input buffers.
//!
//! A [`Plan`] is a base point plus an ordered map of scanned keys to
//! value lists and a combination rule. `setup` enumerates the concrete
//! points, runs the per-point consistency chain and lays the result
//! out in the species-major buffers the solver binary reads.

use crate::binary::InputBuffers;
use crate::xpoint::Xpoint;
use indexmap::IndexMap;
use qlk_types::error::{QlkError, QlkResult};
use qlk_types::particle::SpeciesField;
use qlk_types::records::{Geometry, Meta};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the scanned value lists combine into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanType {
    /// Star pattern: every point keeps all scanned keys at their first
    /// value and varies exactly one of them.
    #[serde(rename = "hyperedge")]
    Hyperedge,
    /// Cartesian product, row-major with the first key outermost.
    #[serde(rename = "hyperrect")]
    Hyperrect,
    /// Zipped: point i takes the i-th value of every list.
    #[serde(rename = "parallel")]
    Parallel,
}

impl FromStr for ScanType {
    type Err = QlkError;

    fn from_str(name: &str) -> QlkResult<Self> {
        match name {
            "hyperedge" => Ok(ScanType::Hyperedge),
            "hyperrect" => Ok(ScanType::Hyperrect),
            "parallel" => Ok(ScanType::Parallel),
            other => Err(QlkError::UserSpec(format!("unknown scan type '{other}'"))),
        }
    }
}

/// A scan plan: base point, scanned keys and the combination rule.
///
/// `scan_dict` insertion order is part of the contract; it decides
/// both the hyperedge segment order and the hyperrect nesting order,
/// and survives JSON round trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub scan_dict: IndexMap<String, Vec<f64>>,
    pub scan_type: ScanType,
    pub xpoint_base: Xpoint,
}

impl Plan {
    /// Number of scan points this plan expands into.
    pub fn calculate_dimx(&self) -> QlkResult<usize> {
        let lens: Vec<usize> = self.scan_dict.values().map(Vec::len).collect();
        match self.scan_type {
            ScanType::Hyperedge => Ok(lens.iter().sum()),
            ScanType::Hyperrect => Ok(lens.iter().product()),
            ScanType::Parallel => match lens.first() {
                Some(&first) if lens.iter().all(|&l| l == first) => Ok(first),
                Some(_) => Err(QlkError::UserSpec(format!(
                    "parallel scan needs equal-length value lists, got {lens:?}"
                ))),
                None => Ok(0),
            },
        }
    }

    /// dimx times the number of spectral grid points.
    pub fn calculate_dimxn(&self) -> QlkResult<usize> {
        Ok(self.calculate_dimx()? * self.xpoint_base.kthetarhos().len())
    }

    /// The (key, value) overrides of scan point `index`.
    pub fn scan_values(&self, index: usize) -> QlkResult<Vec<(&str, f64)>> {
        match self.scan_type {
            ScanType::Hyperedge => {
                let mut offset = index;
                let mut active = None;
                for (key, values) in &self.scan_dict {
                    if active.is_none() {
                        if offset < values.len() {
                            active = Some((key.as_str(), values[offset]));
                        } else {
                            offset -= values.len();
                        }
                    }
                }
                let (active_key, active_value) = active.ok_or_else(|| {
                    QlkError::UserSpec(format!("scan point index {index} out of range"))
                })?;
                Ok(self
                    .scan_dict
                    .iter()
                    .map(|(key, values)| {
                        if key == active_key {
                            (key.as_str(), active_value)
                        } else {
                            (key.as_str(), values[0])
                        }
                    })
                    .collect())
            }
            ScanType::Hyperrect => {
                let mut remainder = index;
                let mut reversed = Vec::with_capacity(self.scan_dict.len());
                for (key, values) in self.scan_dict.iter().rev() {
                    reversed.push((key.as_str(), values[remainder % values.len()]));
                    remainder /= values.len();
                }
                if remainder != 0 {
                    return Err(QlkError::UserSpec(format!(
                        "scan point index {index} out of range"
                    )));
                }
                reversed.reverse();
                Ok(reversed)
            }
            ScanType::Parallel => self
                .scan_dict
                .iter()
                .map(|(key, values)| {
                    values
                        .get(index)
                        .map(|&v| (key.as_str(), v))
                        .ok_or_else(|| {
                            QlkError::UserSpec(format!("scan point index {index} out of range"))
                        })
                })
                .collect(),
        }
    }

    /// Heuristic ordering checks on the scanned keys. All advisory.
    fn check_scan_sanity(&self) {
        let keys: Vec<&str> = self.scan_dict.keys().map(String::as_str).collect();
        let position = |name: &str| keys.iter().position(|k| *k == name);

        if let Some(zeff_at) = position("Zeff") {
            for (at, key) in keys.iter().enumerate() {
                if at > zeff_at && key.starts_with("ni") {
                    tracing::warn!(
                        "'{key}' is scanned after 'Zeff'; the density overrides \
                         undo the Zeff match"
                    );
                }
            }
        }
        if let Some(nustar_at) = position("Nustar") {
            for prereq in ["Zeff", "ne", "q", "Ro", "Rmin", "x"] {
                if matches!(position(prereq), Some(at) if at > nustar_at) {
                    tracing::warn!(
                        "'{prereq}' is scanned after 'Nustar'; the Nustar match \
                         used the stale value"
                    );
                }
            }
        }
        if let Some(tite_at) = position("Ti_Te_rel") {
            for prereq in ["Te", "Nustar"] {
                if matches!(position(prereq), Some(at) if at > tite_at) {
                    tracing::warn!(
                        "'{prereq}' is scanned after 'Ti_Te_rel'; the ion \
                         temperatures no longer track the ratio"
                    );
                }
            }
        }
        if self.xpoint_base.options.recalc_nustar && position("Nustar").is_some() {
            tracing::warn!("scanning 'Nustar' while recalc_Nustar holds it constant");
        }
        if self.xpoint_base.options.recalc_tite && position("Ti_Te_rel").is_some() {
            tracing::warn!("scanning 'Ti_Te_rel' while recalc_Ti_Te_rel holds it constant");
        }
    }

    /// Apply the per-point consistency chain after the scan overrides.
    fn settle(
        point: &mut Xpoint,
        nustar_target: f64,
        tite_target: Option<f64>,
    ) -> QlkResult<()> {
        if point.options.assume_tor_rot {
            point.set_pure_toroidal_rotation()?;
        }
        if point.options.x_rho {
            point.geometry.rho = point.geometry.x;
        }
        if point.options.ninorm1 {
            point.normalize_density()?;
        }
        if point.options.ani1 {
            point.normalize_gradient()?;
        }
        if point.options.recalc_nustar {
            point.match_nustar(nustar_target)?;
        }
        if point.options.recalc_tite {
            if let Some(ratio) = tite_target {
                point.match_tite(ratio);
            }
        }
        if point.options.qn_grad {
            point.check_quasineutrality()?;
        }
        Ok(())
    }

    /// Expand the plan into the solver's flat input buffers.
    ///
    /// Ion buffers are species-major: entry `j * dimx + i` holds ion j
    /// at point i. The solver depends on that layout.
    pub fn setup(&self) -> QlkResult<InputBuffers> {
        self.check_scan_sanity();
        let dimx = self.calculate_dimx()?;
        let dimn = self.xpoint_base.kthetarhos().len();
        let nions = self.xpoint_base.ions.len();
        if dimx == 0 {
            return Err(QlkError::UserSpec("empty scan expands to no points".to_string()));
        }

        let nustar_target = self.xpoint_base.calc_nustar();
        let tite_target = if self.xpoint_base.options.recalc_tite {
            Some(self.xpoint_base.calc_tite()?)
        } else {
            None
        };

        let mut buffers = IndexMap::new();
        buffers.insert("dimx".to_string(), vec![dimx as f64]);
        buffers.insert("dimn".to_string(), vec![dimn as f64]);
        buffers.insert("nions".to_string(), vec![nions as f64]);
        for name in Meta::KEYNAMES {
            let value = self.xpoint_base.meta.get(name).ok_or_else(|| {
                QlkError::NotImplemented(format!("meta key '{name}'"))
            })?;
            buffers.insert(name.to_string(), vec![value]);
        }
        buffers.insert(
            "kthetarhos".to_string(),
            self.xpoint_base.kthetarhos().to_vec(),
        );
        for name in Geometry::IN_ARGS {
            buffers.insert(name.to_string(), vec![0.0; dimx]);
        }
        for name in SpeciesField::PARTICLE_NAMES {
            if name == "type" {
                // The electron type flag is a run-wide scalar.
                buffers.insert("typee".to_string(), vec![self.xpoint_base.elec.ptype]);
            } else {
                buffers.insert(format!("{name}e"), vec![0.0; dimx]);
            }
        }
        for name in SpeciesField::PARTICLE_NAMES {
            buffers.insert(ion_buffer_name(name), vec![0.0; dimx * nions]);
        }
        for name in SpeciesField::ION_NAMES {
            buffers.insert(format!("{name}i"), vec![0.0; dimx * nions]);
        }

        for i in 0..dimx {
            let mut point = self.xpoint_base.clone();
            for (key, value) in self.scan_values(i)? {
                point.set(key, value)?;
            }
            Self::settle(&mut point, nustar_target, tite_target)?;

            for name in Geometry::IN_ARGS {
                let value = point.geometry.get(name).ok_or_else(|| {
                    QlkError::NotImplemented(format!("geometry key '{name}'"))
                })?;
                buffers[name][i] = value;
            }
            for (name, field) in SpeciesField::PARTICLE_NAMES
                .iter()
                .zip(particle_fields())
            {
                if *name == "type" {
                    continue;
                }
                let value = point.elec.get(field).ok_or_else(|| {
                    QlkError::NotImplemented(format!("electron key '{name}'"))
                })?;
                buffers[&format!("{name}e")][i] = value;
            }
            for (j, ion) in point.ions.iter().enumerate() {
                for (name, field) in SpeciesField::PARTICLE_NAMES
                    .iter()
                    .zip(particle_fields())
                {
                    buffers[&ion_buffer_name(name)][j * dimx + i] = ion.get(field);
                }
                buffers["Ai"][j * dimx + i] = ion.a;
                buffers["Zi"][j * dimx + i] = ion.z;
            }
        }

        Ok(InputBuffers::new(buffers))
    }

    pub fn to_json(&self) -> QlkResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> QlkResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Solver buffer name of an ion field; the density fraction is the
/// one irregular rename.
fn ion_buffer_name(field_name: &str) -> String {
    if field_name == "n" {
        "normni".to_string()
    } else {
        format!("{field_name}i")
    }
}

fn particle_fields() -> [SpeciesField; 7] {
    [
        SpeciesField::T,
        SpeciesField::N,
        SpeciesField::At,
        SpeciesField::An,
        SpeciesField::Type,
        SpeciesField::Anis,
        SpeciesField::Danisdr,
    ]
}
