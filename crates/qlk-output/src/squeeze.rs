// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Dataset Squeezing
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Redundancy removal on a freshly folded dataset.
//!
//! A scan echoes every input at every point, so most coordinates are
//! heavily duplicated, and some pairs are algebraically dependent
//! (Ti with Te, Te with Nustar, ion densities with Zeff). Squeezing
//! demotes the dependent ones to data variables, collapses duplicates
//! and leaves a coordinate set fit for orthogonalization.

use crate::catalogue::DEBUG_SINGLE;
use crate::dataset::{DataArray, Dataset};
use ndarray::Axis;
use qlk_types::error::QlkResult;

const ION_EQ_ATOL: f64 = 1e-8;
const ION_EQ_RTOL: f64 = 1e-5;

fn allclose(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| (x - y).abs() <= ION_EQ_ATOL + ION_EQ_RTOL * y.abs())
}

fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

/// Demote coordinates that depend on each other, keeping one
/// representative per algebraic family.
pub fn remove_dependent_axes(ds: &mut Dataset) -> QlkResult<()> {
    // Ion densities are captured by Zeff.
    ds.demote_coord("normni");

    // Ion temperatures are captured by the Ti/Te ratio.
    if ds.coords.contains_key("Te") && ds.coords.contains_key("Ti") {
        let te = ds.coords["Te"].clone();
        let ti = &ds.coords["Ti"];
        if ti.dims.first().map(String::as_str) == Some("dimx") && te.dims == ["dimx"] {
            let mut ratio = ti.values.clone();
            for (x, mut lane) in ratio.axis_iter_mut(Axis(0)).enumerate() {
                let te_x = te.values[[x]];
                lane.mapv_inplace(|v| round5(v / te_x));
            }
            let ratio = DataArray::new(ti.dims.clone(), ratio)?;
            ds.add_coord("Ti_Te", ratio)?;
            ds.demote_coord("Ti");
        }
    }

    // The electron temperature is captured by Nustar.
    if ds.coords.contains_key("Te") {
        ds.demote_coord("Te");
    }

    // Label the spectral axis by its physical values.
    if ds.has_dim("dimn") && ds.coords.contains_key("kthetarhos") {
        ds.rename_dim("dimn", "kthetarhos");
    }
    Ok(())
}

/// Full squeeze: dependent axes out, duplicates collapsed, run-wide
/// scalars moved to attributes.
pub fn squeeze_dataset(mut ds: Dataset) -> QlkResult<Dataset> {
    remove_dependent_axes(&mut ds)?;

    // Collapse the species axis of coordinates all ions agree on.
    let ion_coords: Vec<String> = ds
        .coords
        .iter()
        .filter(|(_, c)| c.dims == ["dimx", "nions"])
        .map(|(name, _)| name.clone())
        .collect();
    for name in ion_coords {
        let coord = &ds.coords[&name];
        let nions = coord.values.len_of(Axis(1));
        if nions < 2 {
            continue;
        }
        let first: Vec<f64> = coord.values.index_axis(Axis(1), 0).iter().copied().collect();
        let all_equal = (1..nions).all(|j| {
            let column: Vec<f64> = coord.values.index_axis(Axis(1), j).iter().copied().collect();
            allclose(&column, &first)
        });
        if all_equal {
            ds.add_coord(&name, DataArray::from_vec("dimx", first))?;
        }
    }

    // Electron and ion gradients that track each other fold into one.
    for (elec, ion, merged) in [("Ane", "Ani", "An"), ("Ate", "Ati", "At")] {
        let equal = matches!(
            (ds.coords.get(elec), ds.coords.get(ion)),
            (Some(a), Some(b)) if a == b
        );
        if equal {
            let folded = ds.coords[elec].clone();
            ds.add_coord(merged, folded)?;
            ds.drop_coord(elec);
            ds.drop_coord(ion);
        }
    }

    // Coordinates constant across the scan lose their point axis.
    let point_coords: Vec<String> = ds
        .coords
        .iter()
        .filter(|(_, c)| c.dims == ["dimx"] || c.dims == ["dimx", "nions"])
        .map(|(name, _)| name.clone())
        .collect();
    for name in point_coords {
        let coord = &ds.coords[&name];
        if coord.dims == ["dimx"] {
            let first = coord.values[[0]];
            if coord.values.iter().all(|&v| v == first) {
                ds.add_coord(&name, DataArray::scalar(first))?;
            }
        } else {
            let row0: Vec<f64> = coord.values.index_axis(Axis(0), 0).iter().copied().collect();
            let constant = coord
                .values
                .axis_iter(Axis(0))
                .all(|row| row.iter().zip(&row0).all(|(a, b)| a == b));
            if constant {
                ds.add_coord(&name, DataArray::from_vec("nions", row0))?;
            }
        }
    }

    // Run-wide scalars become attributes.
    let singles: Vec<String> = ds
        .coords
        .iter()
        .filter(|(name, coord)| {
            DEBUG_SINGLE.contains(&name.as_str()) && coord.is_scalar()
        })
        .map(|(name, _)| name.clone())
        .collect();
    for name in singles {
        if let Some(value) = ds.coords[&name].scalar_value() {
            ds.attrs.insert(name.clone(), value);
            ds.drop_coord(&name);
        }
    }

    Ok(ds)
}
