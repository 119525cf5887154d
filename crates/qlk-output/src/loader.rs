// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Output Loader
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Folding of the solver's flat ASCII files into a [`Dataset`].
//!
//! Every file is a whitespace-separated list of doubles; the shape
//! comes from the catalogue plus the four sizes. Files are stored with
//! the slowest-varying axis first (solutions, then species); the
//! folded arrays put the scan point axis first, matching how the
//! results are consumed. Absent files are skipped, since which files
//! exist depends on the run's output method flags. A length that does
//! not factor into the expected shape aborts before any array is
//! built.

use crate::catalogue::{self, SUFFIX};
use crate::dataset::{DataArray, Dataset};
use crate::sizes::Sizes;
use ndarray::{ArrayD, IxDyn};
use qlk_types::error::{QlkError, QlkResult};
use std::fs;
use std::path::Path;

/// Read a flat list of doubles. With `coerce_nan`, unparsable tokens
/// load as NaN instead of failing, mirroring how half-written solver
/// output is usually salvaged.
pub fn read_floats(path: &Path, coerce_nan: bool) -> QlkResult<Vec<f64>> {
    let text = fs::read_to_string(path)?;
    let mut values = Vec::new();
    for token in text.split_whitespace() {
        match token.parse::<f64>() {
            Ok(value) => values.push(value),
            Err(_) if coerce_nan => values.push(f64::NAN),
            Err(_) => {
                return Err(QlkError::MalformedNumber {
                    file: path.display().to_string(),
                    token: token.to_string(),
                })
            }
        }
    }
    Ok(values)
}

/// Read a catalogued file, `None` when it does not exist.
fn try_read(dir: &Path, name: &str, coerce_nan: bool) -> QlkResult<Option<Vec<f64>>> {
    let path = dir.join(format!("{name}{SUFFIX}"));
    match read_floats(&path, coerce_nan) {
        Ok(values) => Ok(Some(values)),
        Err(QlkError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(name, "output file absent, skipping");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Fold `data` into `shape`, checked before construction.
fn reshape(name: &str, data: Vec<f64>, shape: &[usize]) -> QlkResult<ArrayD<f64>> {
    let expected: usize = shape.iter().product();
    if data.len() != expected {
        return Err(QlkError::SizeMismatch {
            name: name.to_string(),
            len: data.len(),
            expected: shape.to_vec(),
        });
    }
    Ok(ArrayD::from_shape_vec(IxDyn(shape), data)
        .expect("length checked against shape product"))
}

/// Fold, then move the axes into the given order.
fn reshape_permuted(
    name: &str,
    data: Vec<f64>,
    shape: &[usize],
    order: &[usize],
) -> QlkResult<ArrayD<f64>> {
    let array = reshape(name, data, shape)?;
    Ok(array
        .permuted_axes(order.to_vec())
        .as_standard_layout()
        .to_owned())
}

fn dims_of(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// An ion-like quantity: (dimx, nions), with the single-ion case
/// arriving without the species axis.
fn fold_ionlike(name: &str, data: Vec<f64>, sizes: &Sizes) -> QlkResult<ArrayD<f64>> {
    if sizes.nions == 1 {
        reshape(name, data, &[sizes.dimx, 1])
    } else {
        reshape(name, data, &[sizes.dimx, sizes.nions])
    }
}

/// Load the echoed inputs from `<rundir>/debug/` as coordinates.
pub fn load_debug(sizes: &Sizes, rundir: &Path, coerce_nan: bool) -> QlkResult<Dataset> {
    let dir = rundir.join("debug");
    let mut ds = Dataset::new();
    for name in catalogue::debug_names() {
        // The four sizes are carried implicitly by the dimensions.
        if ["dimx", "dimn", "nions", "numsols"].contains(&name) {
            continue;
        }
        let Some(data) = try_read(&dir, name, coerce_nan)? else {
            continue;
        };
        let array = if catalogue::DEBUG_ELECLIKE.contains(&name) {
            DataArray::new(dims_of(&["dimx"]), reshape(name, data, &[sizes.dimx])?)?
        } else if catalogue::DEBUG_IONLIKE.contains(&name) {
            DataArray::new(
                dims_of(&["dimx", "nions"]),
                fold_ionlike(name, data, sizes)?,
            )?
        } else if catalogue::DEBUG_SPECIAL.contains(&name) {
            DataArray::new(dims_of(&["dimn"]), reshape(name, data, &[sizes.dimn])?)?
        } else {
            match data.as_slice() {
                [single] => DataArray::scalar(*single),
                _ => {
                    return Err(QlkError::SizeMismatch {
                        name: name.to_string(),
                        len: data.len(),
                        expected: vec![1],
                    })
                }
            }
        };
        ds.add_coord(name, array)?;
    }
    // Nothing in debug spans the solution axis; label it for later.
    ds.add_coord(
        "numsols",
        DataArray::from_vec("numsols", (0..sizes.numsols).map(|s| s as f64).collect()),
    )?;
    Ok(ds)
}

/// Load the flux and coefficient files from `<rundir>/output/`.
pub fn load_output(
    ds: &mut Dataset,
    sizes: &Sizes,
    rundir: &Path,
    coerce_nan: bool,
) -> QlkResult<()> {
    let dir = rundir.join("output");
    let &Sizes {
        dimx,
        dimn,
        nions,
        numsols,
    } = sizes;
    for name in catalogue::output_names() {
        let Some(data) = try_read(&dir, name, coerce_nan)? else {
            continue;
        };
        let array = match name {
            "gam_GB" | "ome_GB" => DataArray::new(
                dims_of(&["dimx", "dimn", "numsols"]),
                reshape_permuted(name, data, &[numsols, dimx, dimn], &[1, 2, 0])?,
            )?,
            "cke" | "ceke" => DataArray::new(dims_of(&["dimx"]), reshape(name, data, &[dimx])?)?,
            "cki" | "ceki" => DataArray::new(
                dims_of(&["dimx", "nions"]),
                fold_ionlike(name, data, sizes)?,
            )?,
            "efi_cm" => DataArray::new(
                dims_of(&["dimx", "dimn", "nions"]),
                reshape_permuted(name, data, &[nions, dimx, dimn], &[1, 2, 0])?,
            )?,
            other => {
                let stem = flux_stem(other)?;
                if stem.ends_with('e') {
                    DataArray::new(dims_of(&["dimx"]), reshape(other, data, &[dimx])?)?
                } else {
                    DataArray::new(
                        dims_of(&["dimx", "nions"]),
                        fold_ionlike(other, data, sizes)?,
                    )?
                }
            }
        };
        ds.add_var(name, array)?;
    }
    Ok(())
}

/// The species letter of a flux name: unit suffix off, instability
/// branch off.
fn flux_stem(name: &str) -> QlkResult<&str> {
    let stem = name
        .strip_suffix("_GB")
        .or_else(|| name.strip_suffix("_SI"))
        .ok_or_else(|| QlkError::UserSpec(format!("could not process output '{name}'")))?;
    let stem = ["ETG", "ITG", "TEM"]
        .iter()
        .find_map(|branch| stem.strip_suffix(branch))
        .unwrap_or(stem);
    if stem.ends_with('e') || stem.ends_with('i') {
        Ok(stem)
    } else {
        Err(QlkError::UserSpec(format!(
            "could not process output '{name}'"
        )))
    }
}

/// Load the dispersion-relation primitives from
/// `<rundir>/output/primitive/`.
pub fn load_primitive(
    ds: &mut Dataset,
    sizes: &Sizes,
    rundir: &Path,
    coerce_nan: bool,
) -> QlkResult<()> {
    let dir = rundir.join("output").join("primitive");
    let &Sizes {
        dimx,
        dimn,
        nions,
        numsols,
    } = sizes;
    for name in catalogue::primitive_names() {
        let Some(data) = try_read(&dir, name, coerce_nan)? else {
            continue;
        };
        let array = if name.ends_with('i') {
            DataArray::new(
                dims_of(&["dimx", "dimn", "nions", "numsols"]),
                reshape_permuted(name, data, &[numsols, nions, dimx, dimn], &[2, 3, 1, 0])?,
            )?
        } else if name.ends_with('e') || catalogue::PRIMI_RESHAPES.contains(&name) {
            DataArray::new(
                dims_of(&["dimx", "dimn", "numsols"]),
                reshape_permuted(name, data, &[numsols, dimx, dimn], &[1, 2, 0])?,
            )?
        } else {
            DataArray::new(dims_of(&["dimx", "dimn"]), reshape(name, data, &[dimx, dimn])?)?
        };
        ds.add_var(name, array)?;
    }
    Ok(())
}

/// Fold a whole run directory: sizes, debug, output and primitives.
pub fn load_run(rundir: &Path, coerce_nan: bool) -> QlkResult<Dataset> {
    let sizes = Sizes::from_rundir(rundir)?;
    let mut ds = load_debug(&sizes, rundir, coerce_nan)?;
    load_output(&mut ds, &sizes, rundir, coerce_nan)?;
    load_primitive(&mut ds, &sizes, rundir, coerce_nan)?;
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: Sizes = Sizes {
        dimx: 2,
        dimn: 3,
        nions: 2,
        numsols: 2,
    };

    fn scratch_rundir(tag: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        let dir =
            std::env::temp_dir().join(format!("qlk_load_{tag}_{}_{nanos}", std::process::id()));
        for sub in ["debug", "output", "output/primitive"] {
            fs::create_dir_all(dir.join(sub)).unwrap();
        }
        dir
    }

    fn write_counting(path: &Path, len: usize) {
        let text: Vec<String> = (0..len).map(|i| format!("{}.0", i)).collect();
        fs::write(path, text.join(" ")).unwrap();
    }

    fn write_sizes(rundir: &Path) {
        for (name, value) in [("dimx", 2), ("dimn", 3), ("nions", 2), ("numsols", 2)] {
            fs::write(
                rundir.join("debug").join(format!("{name}.dat")),
                format!("{value}"),
            )
            .unwrap();
        }
    }

    #[test]
    fn test_read_floats_malformed_token() {
        let rundir = scratch_rundir("malformed");
        let path = rundir.join("output").join("efe_GB.dat");
        fs::write(&path, "1.0 oops 3.0").unwrap();

        let err = read_floats(&path, false).unwrap_err();
        assert!(matches!(err, QlkError::MalformedNumber { ref token, .. } if token == "oops"));

        let coerced = read_floats(&path, true).unwrap();
        assert_eq!(coerced.len(), 3);
        assert!(coerced[1].is_nan());

        fs::remove_dir_all(&rundir).unwrap();
    }

    #[test]
    fn test_size_mismatch_before_construction() {
        let rundir = scratch_rundir("mismatch");
        let mut ds = Dataset::new();
        // efe_GB should hold dimx = 2 values.
        write_counting(&rundir.join("output").join("efe_GB.dat"), 5);
        let err = load_output(&mut ds, &SIZES, &rundir, false).unwrap_err();
        assert!(matches!(err, QlkError::SizeMismatch { len: 5, .. }));
        assert!(ds.data_vars.is_empty());
        fs::remove_dir_all(&rundir).unwrap();
    }

    #[test]
    fn test_debug_folds_coords() {
        let rundir = scratch_rundir("debug");
        write_sizes(&rundir);
        write_counting(&rundir.join("debug").join("x.dat"), 2);
        write_counting(&rundir.join("debug").join("Ati.dat"), 4);
        write_counting(&rundir.join("debug").join("kthetarhos.dat"), 3);
        fs::write(rundir.join("debug").join("R0.dat"), "3.0").unwrap();

        let ds = load_debug(&SIZES, &rundir, false).unwrap();
        assert_eq!(ds.coords["x"].dims, vec!["dimx"]);
        assert_eq!(ds.coords["Ati"].dims, vec!["dimx", "nions"]);
        assert_eq!(ds.coords["Ati"].values[[1, 0]], 2.0);
        assert_eq!(ds.coords["kthetarhos"].dims, vec!["dimn"]);
        assert_eq!(ds.coords["R0"].scalar_value(), Some(3.0));
        assert!(ds.is_dim_coord("numsols"));
        assert_eq!(ds.dim_len("numsols"), Some(2));
        // Absent catalogue entries are simply not there.
        assert!(ds.coords.get("Zeff").is_none());
        fs::remove_dir_all(&rundir).unwrap();
    }

    #[test]
    fn test_output_transposes_solution_major_files() {
        let rundir = scratch_rundir("output");
        let mut ds = Dataset::new();
        // gam_GB arrives as (numsols, dimx, dimn) row-major.
        write_counting(&rundir.join("output").join("gam_GB.dat"), 2 * 2 * 3);
        // efi_cm arrives as (nions, dimx, dimn).
        write_counting(&rundir.join("output").join("efi_cm.dat"), 2 * 2 * 3);
        write_counting(&rundir.join("output").join("efe_GB.dat"), 2);
        write_counting(&rundir.join("output").join("efiITG_GB.dat"), 4);

        load_output(&mut ds, &SIZES, &rundir, false).unwrap();

        let gam = &ds.data_vars["gam_GB"];
        assert_eq!(gam.dims, vec!["dimx", "dimn", "numsols"]);
        for s in 0..2 {
            for x in 0..2 {
                for n in 0..3 {
                    assert_eq!(gam.values[[x, n, s]], (s * 6 + x * 3 + n) as f64);
                }
            }
        }
        let efi_cm = &ds.data_vars["efi_cm"];
        assert_eq!(efi_cm.dims, vec!["dimx", "dimn", "nions"]);
        assert_eq!(efi_cm.values[[1, 2, 0]], 5.0);
        assert_eq!(efi_cm.values[[0, 0, 1]], 6.0);

        assert_eq!(ds.data_vars["efe_GB"].dims, vec!["dimx"]);
        assert_eq!(ds.data_vars["efiITG_GB"].dims, vec!["dimx", "nions"]);
        fs::remove_dir_all(&rundir).unwrap();
    }

    #[test]
    fn test_primitive_shapes() {
        let rundir = scratch_rundir("primi");
        let mut ds = Dataset::new();
        let dir = rundir.join("output").join("primitive");
        // Ion primitive: (numsols, nions, dimx, dimn).
        write_counting(&dir.join("Lcirci.dat"), 2 * 2 * 2 * 3);
        // rsol reshapes like an electron primitive.
        write_counting(&dir.join("rsol.dat"), 2 * 2 * 3);
        write_counting(&dir.join("ntor.dat"), 2 * 3);

        load_primitive(&mut ds, &SIZES, &rundir, false).unwrap();

        let lcirci = &ds.data_vars["Lcirci"];
        assert_eq!(lcirci.dims, vec!["dimx", "dimn", "nions", "numsols"]);
        // Raw index (s, j, x, n) = s*12 + j*6 + x*3 + n.
        assert_eq!(lcirci.values[[1, 2, 1, 0]], 11.0);
        assert_eq!(lcirci.values[[0, 0, 0, 1]], 12.0);

        assert_eq!(ds.data_vars["rsol"].dims, vec!["dimx", "dimn", "numsols"]);
        assert_eq!(ds.data_vars["ntor"].dims, vec!["dimx", "dimn"]);
        fs::remove_dir_all(&rundir).unwrap();
    }

    #[test]
    fn test_load_run_combines_everything() {
        let rundir = scratch_rundir("run");
        write_sizes(&rundir);
        write_counting(&rundir.join("debug").join("x.dat"), 2);
        write_counting(&rundir.join("output").join("efe_GB.dat"), 2);
        write_counting(
            &rundir.join("output").join("primitive").join("ntor.dat"),
            6,
        );

        let ds = load_run(&rundir, false).unwrap();
        assert!(ds.coords.contains_key("x"));
        assert!(ds.data_vars.contains_key("efe_GB"));
        assert!(ds.data_vars.contains_key("ntor"));
        assert_eq!(ds.dim_len("dimx"), Some(2));
        fs::remove_dir_all(&rundir).unwrap();
    }

    #[test]
    fn test_flux_stem() {
        assert_eq!(flux_stem("efe_GB").unwrap(), "efe");
        assert_eq!(flux_stem("dfiTEM_GB").unwrap(), "dfi");
        assert_eq!(flux_stem("chiee_SI").unwrap(), "chiee");
        assert!(flux_stem("gam_GB").is_err());
    }
}
