// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Dataset Persistence
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Dataset persistence: a compressed `.npz` archive for the array
//! payload and a JSON manifest carrying what NumPy archives cannot,
//! the dimension names per array, the coordinate/variable split and
//! the run attributes. The manifest sits next to the archive with a
//! `.manifest.json` extension.

use crate::dataset::{DataArray, Dataset};
use indexmap::IndexMap;
use ndarray::IxDyn;
use ndarray_npy::{NpzReader, NpzWriter};
use qlk_types::error::{QlkError, QlkResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

const COORD_PREFIX: &str = "coord__";
const VAR_PREFIX: &str = "var__";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    coords: IndexMap<String, Vec<String>>,
    data_vars: IndexMap<String, Vec<String>>,
    attrs: IndexMap<String, f64>,
}

fn manifest_path(path: &Path) -> PathBuf {
    path.with_extension("manifest.json")
}

/// Write the dataset as `<path>` (npz) plus its manifest.
pub fn save(ds: &Dataset, path: &Path) -> QlkResult<()> {
    let mut npz = NpzWriter::new_compressed(File::create(path)?);
    for (name, array) in &ds.coords {
        npz.add_array(format!("{COORD_PREFIX}{name}"), &array.values)
            .map_err(|e| QlkError::Archive(format!("writing coordinate '{name}': {e}")))?;
    }
    for (name, array) in &ds.data_vars {
        npz.add_array(format!("{VAR_PREFIX}{name}"), &array.values)
            .map_err(|e| QlkError::Archive(format!("writing variable '{name}': {e}")))?;
    }
    npz.finish()
        .map_err(|e| QlkError::Archive(format!("finishing '{}': {e}", path.display())))?;

    let manifest = Manifest {
        coords: ds
            .coords
            .iter()
            .map(|(name, array)| (name.clone(), array.dims.clone()))
            .collect(),
        data_vars: ds
            .data_vars
            .iter()
            .map(|(name, array)| (name.clone(), array.dims.clone()))
            .collect(),
        attrs: ds.attrs.clone(),
    };
    serde_json::to_writer_pretty(File::create(manifest_path(path))?, &manifest)?;
    Ok(())
}

/// Load a dataset saved with [`save`].
pub fn load(path: &Path) -> QlkResult<Dataset> {
    let manifest: Manifest = serde_json::from_reader(File::open(manifest_path(path))?)?;
    let mut npz = NpzReader::new(File::open(path)?)
        .map_err(|e| QlkError::Archive(format!("opening '{}': {e}", path.display())))?;

    let mut ds = Dataset::new();
    for (name, dims) in manifest.coords {
        let values = read_entry(&mut npz, COORD_PREFIX, &name)?;
        ds.add_coord(&name, DataArray::new(dims, values)?)?;
    }
    for (name, dims) in manifest.data_vars {
        let values = read_entry(&mut npz, VAR_PREFIX, &name)?;
        ds.add_var(&name, DataArray::new(dims, values)?)?;
    }
    ds.attrs = manifest.attrs;
    Ok(ds)
}

fn read_entry(
    npz: &mut NpzReader<File>,
    prefix: &str,
    name: &str,
) -> QlkResult<ndarray::ArrayD<f64>> {
    npz.by_name::<ndarray::OwnedRepr<f64>, IxDyn>(&format!("{prefix}{name}.npy"))
        .or_else(|_| npz.by_name::<ndarray::OwnedRepr<f64>, IxDyn>(&format!("{prefix}{name}")))
        .map_err(|e| QlkError::Archive(format!("reading '{prefix}{name}': {e}")))
}
