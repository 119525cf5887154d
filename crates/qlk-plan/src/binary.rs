// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Input Binaries
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flat binary input files for the solver.
//!
//! One `<name>.bin` file per buffer, raw little-endian doubles, no
//! header. The solver memory-maps these directly.

use indexmap::IndexMap;
use qlk_types::error::QlkResult;
use std::fs;
use std::io::Write;
use std::path::Path;

/// The fully expanded solver input: buffer name to flat values.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBuffers(IndexMap<String, Vec<f64>>);

impl InputBuffers {
    pub fn new(buffers: IndexMap<String, Vec<f64>>) -> Self {
        Self(buffers)
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Write every buffer as `<dir>/<name>.bin`.
    pub fn write(&self, dir: &Path) -> QlkResult<()> {
        fs::create_dir_all(dir)?;
        for (name, values) in &self.0 {
            let mut file = fs::File::create(dir.join(format!("{name}.bin")))?;
            let mut bytes = Vec::with_capacity(values.len() * 8);
            for value in values {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            file.write_all(&bytes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        std::env::temp_dir().join(format!("qlk_bin_{tag}_{}_{nanos}", std::process::id()))
    }

    #[test]
    fn test_write_little_endian_doubles() {
        let mut map = IndexMap::new();
        map.insert("q".to_string(), vec![1.5, -2.0]);
        map.insert("dimx".to_string(), vec![2.0]);
        let buffers = InputBuffers::new(map);

        let dir = scratch_dir("le");
        buffers.write(&dir).unwrap();

        let bytes = fs::read(dir.join("q.bin")).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(f64::from_le_bytes(bytes[..8].try_into().unwrap()), 1.5);
        assert_eq!(f64::from_le_bytes(bytes[8..].try_into().unwrap()), -2.0);
        assert_eq!(fs::read(dir.join("dimx.bin")).unwrap().len(), 8);

        fs::remove_dir_all(&dir).unwrap();
    }
}
