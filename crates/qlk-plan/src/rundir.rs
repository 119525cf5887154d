// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Run Directory
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! On-disk layout of a single solver run.
//!
//! A run directory carries `parameters.json` (the serialized plan),
//! `input/` with the flat binaries, `output/`, `output/primitive/` and
//! `debug/` for the solver to fill. The plan file is the source of
//! truth; a run can always be reconstructed from its directory.

use crate::plan::Plan;
use qlk_types::error::{QlkError, QlkResult};
use std::fs;
use std::path::{Path, PathBuf};

/// The serialized plan inside a run directory.
pub const PARAMETERS_FILE: &str = "parameters.json";

/// Output file whose presence marks a finished solver run.
const DONE_MARKER: &str = "vfi_GB.dat";

/// Probe file for an already generated input set.
const INPUT_MARKER: &str = "R0.bin";

/// What to do when the run directory already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    /// Remove the existing directory and start fresh.
    Force,
    /// Refuse and report a conflict.
    Abort,
}

/// A plan bound to its on-disk run directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    rundir: PathBuf,
    pub plan: Plan,
}

impl Run {
    /// Bind `plan` to `<runsdir>/<name>`. `runsdir` must be absolute so
    /// generated job scripts stay valid regardless of the submit cwd.
    pub fn new(runsdir: &Path, name: &str, plan: Plan) -> QlkResult<Self> {
        if !runsdir.is_absolute() {
            return Err(QlkError::UserSpec(format!(
                "runs directory must be an absolute path, got '{}'",
                runsdir.display()
            )));
        }
        Ok(Run {
            rundir: runsdir.join(name),
            plan,
        })
    }

    /// Reconstruct a run from its directory's `parameters.json`.
    pub fn from_dir(rundir: &Path) -> QlkResult<Self> {
        let json = fs::read_to_string(rundir.join(PARAMETERS_FILE))?;
        Ok(Run {
            rundir: rundir.to_path_buf(),
            plan: Plan::from_json(&json)?,
        })
    }

    pub fn rundir(&self) -> &Path {
        &self.rundir
    }

    pub fn input_dir(&self) -> PathBuf {
        self.rundir.join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.rundir.join("output")
    }

    pub fn primitive_dir(&self) -> PathBuf {
        self.rundir.join("output").join("primitive")
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.rundir.join("debug")
    }

    /// Create the directory skeleton and write `parameters.json`.
    pub fn prepare(&self, overwrite: Overwrite) -> QlkResult<()> {
        if self.rundir.exists() {
            match overwrite {
                Overwrite::Force => fs::remove_dir_all(&self.rundir)?,
                Overwrite::Abort => {
                    return Err(QlkError::OverwriteConflict(self.rundir.clone()));
                }
            }
        }
        fs::create_dir_all(self.input_dir())?;
        fs::create_dir_all(self.primitive_dir())?;
        fs::create_dir_all(self.debug_dir())?;
        fs::write(self.rundir.join(PARAMETERS_FILE), self.plan.to_json()?)?;
        Ok(())
    }

    /// Expand the plan and write the flat binaries under `input/`.
    pub fn generate_input(&self) -> QlkResult<()> {
        let buffers = self.plan.setup()?;
        buffers.write(&self.input_dir())
    }

    pub fn input_binaries_exist(&self) -> bool {
        self.input_dir().join(INPUT_MARKER).exists()
    }

    pub fn is_done(&self) -> bool {
        self.output_dir().join(DONE_MARKER).exists()
    }

    /// Remove solver output (`.dat` files) while keeping the plan and
    /// the generated input.
    pub fn clean(&self) -> QlkResult<()> {
        for dir in [self.output_dir(), self.primitive_dir(), self.debug_dir()] {
            if !dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "dat") {
                    fs::remove_file(&path)?;
                }
            }
        }
        Ok(())
    }
}
