// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Point Keys
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The string key surface of an [`crate::xpoint::Xpoint`].
//!
//! Keys follow the suffix convention the serialized plan format uses:
//! a bare species field (`T`) addresses electron and all ions at once,
//! `Te` the electron, `Ti` all ions, `Ti1` ion 1. Synthetic keys route
//! through a compute/match pair. The enumeration is closed: anything
//! unrecognized is rejected, never guessed.

use qlk_types::particle::SpeciesField;
use qlk_types::records::{Geometry, Meta, Options};

/// A derived quantity with a compute/match function pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthetic {
    Zeff,
    Nustar,
    TiTeRel,
    Epsilon,
}

/// A parsed point key.
#[derive(Debug, Clone, PartialEq)]
pub enum PointKey {
    Synthetic(Synthetic),
    Geometry(&'static str),
    Kthetarhos,
    Meta(&'static str),
    Option(&'static str),
    /// Bare species field: electron and all ions together.
    Shared(SpeciesField),
    /// `e` suffix.
    Electron(SpeciesField),
    /// `i` suffix without index.
    AllIons(SpeciesField),
    /// `i<digit>` suffix.
    Ion(usize, SpeciesField),
}

impl PointKey {
    /// Parse a key string. Dispatch order matters and mirrors the
    /// serialized-plan contract: synthetic keys, then the sub-record
    /// namespaces, then bare species fields, then suffixed ones.
    /// `Ani1` is an options flag, not ion 1's density gradient.
    pub fn parse(key: &str) -> Option<PointKey> {
        match key {
            "Zeff" => return Some(PointKey::Synthetic(Synthetic::Zeff)),
            "Nustar" => return Some(PointKey::Synthetic(Synthetic::Nustar)),
            "Ti_Te_rel" => return Some(PointKey::Synthetic(Synthetic::TiTeRel)),
            "epsilon" => return Some(PointKey::Synthetic(Synthetic::Epsilon)),
            "kthetarhos" => return Some(PointKey::Kthetarhos),
            _ => {}
        }
        if let Some(name) = Geometry::IN_ARGS.iter().find(|n| **n == key) {
            return Some(PointKey::Geometry(name));
        }
        if let Some(name) = Meta::KEYNAMES.iter().find(|n| **n == key) {
            return Some(PointKey::Meta(name));
        }
        if let Some(name) = Options::FLAG_NAMES.iter().find(|n| **n == key) {
            return Some(PointKey::Option(name));
        }
        if let Some(field) = SpeciesField::parse(key) {
            return Some(PointKey::Shared(field));
        }
        let bytes = key.as_bytes();
        if bytes.len() >= 3 && bytes[bytes.len() - 1].is_ascii_digit() {
            if bytes[bytes.len() - 2] == b'i' {
                let idx = (bytes[bytes.len() - 1] - b'0') as usize;
                let field = SpeciesField::parse(&key[..key.len() - 2])?;
                return Some(PointKey::Ion(idx, field));
            }
            return None;
        }
        if let Some(stem) = key.strip_suffix('i') {
            let field = SpeciesField::parse(stem)?;
            return Some(PointKey::AllIons(field));
        }
        if let Some(stem) = key.strip_suffix('e') {
            let field = SpeciesField::parse(stem)?;
            return Some(PointKey::Electron(field));
        }
        None
    }
}
