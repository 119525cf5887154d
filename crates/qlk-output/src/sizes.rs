// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Output Sizes
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The four sizes every reshape depends on, read from `debug/`.

use crate::catalogue::SUFFIX;
use crate::loader::read_floats;
use qlk_types::error::{QlkError, QlkResult};
use std::path::Path;

/// Dimension sizes of one solver run. All four are mandatory; nothing
/// else can be folded without them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizes {
    /// Number of scan points.
    pub dimx: usize,
    /// Number of spectral grid points.
    pub dimn: usize,
    /// Number of ion species.
    pub nions: usize,
    /// Number of requested eigenmode solutions.
    pub numsols: usize,
}

impl Sizes {
    /// Read the sizes from `<rundir>/debug/`.
    pub fn from_rundir(rundir: &Path) -> QlkResult<Self> {
        let debug_dir = rundir.join("debug");
        Ok(Sizes {
            dimx: read_size(&debug_dir, "dimx")?,
            dimn: read_size(&debug_dir, "dimn")?,
            nions: read_size(&debug_dir, "nions")?,
            numsols: read_size(&debug_dir, "numsols")?,
        })
    }
}

fn read_size(debug_dir: &Path, name: &str) -> QlkResult<usize> {
    let path = debug_dir.join(format!("{name}{SUFFIX}"));
    let values = read_floats(&path, false)?;
    match values.as_slice() {
        [single] if *single >= 1.0 && single.fract() == 0.0 => Ok(*single as usize),
        _ => Err(QlkError::UserSpec(format!(
            "'{}' does not hold a single positive integer",
            path.display()
        ))),
    }
}
