// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Orthogonalization
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Re-expansion of the flat point axis into the scan's parameter grid.
//!
//! A scan is a walk through parameter space; orthogonalization turns
//! the flat `dimx` axis into one axis per scanned parameter, indexed
//! by that parameter's distinct values. Combinations the scan never
//! visited stay as NaN cells. Two hypercubes over the same variables
//! can then be merged along their non-matching coordinates.

use crate::dataset::{DataArray, Dataset};
use indexmap::IndexMap;
use ndarray::{concatenate, ArrayD, Axis, IxDyn};
use qlk_types::error::{QlkError, QlkResult};

fn sorted_unique(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut unique: Vec<f64> = values.collect();
    unique.sort_by(|a, b| a.partial_cmp(b).expect("coordinate values are ordered"));
    unique.dedup();
    unique
}

fn position_of(unique: &[f64], value: f64) -> QlkResult<usize> {
    unique
        .iter()
        .position(|&v| v == value)
        .ok_or_else(|| QlkError::UserSpec(format!("value {value} missing from merged axis")))
}

/// Expand `dimx` into one axis per scanned parameter.
///
/// The scanned parameters are the coordinates that still depend on
/// `dimx` after squeezing; each contributes an axis holding its
/// distinct values in ascending order. Points visiting the same
/// parameter combination twice overwrite each other, later point wins.
pub fn orthogonalize(ds: &Dataset) -> QlkResult<Dataset> {
    let dims = ds.dims();
    let scan_coords: Vec<String> = ds
        .coords
        .iter()
        .filter(|(name, coord)| !dims.contains_key(*name) && coord.dims == ["dimx"])
        .map(|(name, _)| name.clone())
        .collect();
    if scan_coords.is_empty() {
        return Err(QlkError::UserSpec(
            "no scanned coordinates left on the point axis".to_string(),
        ));
    }

    let new_dims: IndexMap<String, Vec<f64>> = scan_coords
        .iter()
        .map(|name| {
            let values = sorted_unique(ds.coords[name].values.iter().copied());
            (name.clone(), values)
        })
        .collect();

    // Grid cell of every scan point.
    let dimx = dims["dimx"];
    let mut ilist: Vec<Vec<usize>> = Vec::with_capacity(dimx);
    let mut seen = std::collections::HashMap::new();
    for i in 0..dimx {
        let mut cell = Vec::with_capacity(new_dims.len());
        for (name, unique) in &new_dims {
            cell.push(position_of(unique, ds.coords[name].values[[i]])?);
        }
        if let Some(previous) = seen.insert(cell.clone(), i) {
            tracing::warn!(
                point = i,
                previous,
                "scan points share a grid cell; the later one wins"
            );
        }
        ilist.push(cell);
    }

    let mut newds = Dataset::new();
    for (name, unique) in &new_dims {
        newds.add_coord(name, DataArray::from_vec(name, unique.clone()))?;
    }
    for (name, coord) in &ds.coords {
        if new_dims.contains_key(name) {
            continue;
        }
        if coord.axis_of("dimx").is_some() {
            newds.add_coord(name, scatter(coord, &ilist, &new_dims)?)?;
        } else {
            newds.add_coord(name, coord.clone())?;
        }
    }
    for (name, var) in &ds.data_vars {
        if var.axis_of("dimx").is_some() {
            newds.add_var(name, scatter(var, &ilist, &new_dims)?)?;
        } else {
            newds.add_var(name, var.clone())?;
        }
    }
    newds.attrs = ds.attrs.clone();
    Ok(newds)
}

/// Scatter a `dimx`-bearing array into the parameter grid, NaN where
/// no point landed.
fn scatter(
    array: &DataArray,
    ilist: &[Vec<usize>],
    new_dims: &IndexMap<String, Vec<f64>>,
) -> QlkResult<DataArray> {
    let pos = array
        .axis_of("dimx")
        .expect("scatter is only called on dimx-bearing arrays");
    let mut order: Vec<usize> = vec![pos];
    order.extend((0..array.values.ndim()).filter(|&axis| axis != pos));
    let moved = array.values.clone().permuted_axes(order);

    let mut shape: Vec<usize> = new_dims.values().map(Vec::len).collect();
    shape.extend(moved.shape()[1..].iter().copied());
    let mut target = ArrayD::from_elem(IxDyn(&shape), f64::NAN);
    for (i, cell) in ilist.iter().enumerate() {
        let source = moved.index_axis(Axis(0), i);
        let mut slot = target.view_mut();
        for &index in cell {
            slot = slot.index_axis_move(Axis(0), index);
        }
        slot.assign(&source);
    }

    let mut dims: Vec<String> = new_dims.keys().cloned().collect();
    dims.extend(array.dims.iter().filter(|d| *d != "dimx").cloned());
    DataArray::new(dims, target)
}

/// Coordinates on which the two datasets disagree: present in only
/// one, or differing in dimensions or values.
pub fn find_nonmatching_coords(a: &Dataset, b: &Dataset) -> Vec<String> {
    let mut names: Vec<&String> = a.coords.keys().collect();
    names.extend(b.coords.keys().filter(|n| !a.coords.contains_key(*n)));
    names
        .into_iter()
        .filter(|name| a.coords.get(*name) != b.coords.get(*name))
        .cloned()
        .collect()
}

/// Merge two orthogonal hypercubes.
///
/// One non-matching dimension concatenates directly. More than one
/// falls back to a union grid: every variable is re-scattered into the
/// union of both coordinate sets, NaN where neither contributed, the
/// second dataset winning on overlap. Scalar coordinates count as
/// length-one axes here, so cubes from single-slice runs merge too.
pub fn merge_orthogonal(a: &Dataset, b: &Dataset) -> QlkResult<Dataset> {
    let nonmatching = find_nonmatching_coords(a, b);
    if nonmatching.is_empty() {
        return Err(QlkError::UserSpec(
            "datasets do not differ along any coordinate".to_string(),
        ));
    }
    if nonmatching.len() == 1 && a.is_dim_coord(&nonmatching[0]) && b.is_dim_coord(&nonmatching[0])
    {
        return concat_along(a, b, &nonmatching[0]);
    }
    merge_union_grid(a, b, &nonmatching)
}

fn concat_along(a: &Dataset, b: &Dataset, dim: &str) -> QlkResult<Dataset> {
    let mut merged = Dataset::new();
    let joined = concatenate(
        Axis(0),
        &[a.coords[dim].values.view(), b.coords[dim].values.view()],
    )
    .map_err(|e| QlkError::UserSpec(format!("cannot join axis '{dim}': {e}")))?;
    merged.add_coord(dim, DataArray::new(vec![dim.to_string()], joined)?)?;

    for (name, left) in &a.coords {
        if name == dim {
            continue;
        }
        merged.add_coord(name, concat_member(name, left, &b.coords[name], dim)?)?;
    }
    for (name, left) in &a.data_vars {
        let right = b.data_vars.get(name).ok_or_else(|| {
            QlkError::UserSpec(format!("variable '{name}' missing from second dataset"))
        })?;
        merged.add_var(name, concat_member(name, left, right, dim)?)?;
    }
    merged.attrs = a.attrs.clone();
    Ok(merged)
}

fn concat_member(
    name: &str,
    left: &DataArray,
    right: &DataArray,
    dim: &str,
) -> QlkResult<DataArray> {
    match left.axis_of(dim) {
        Some(axis) => {
            let joined = concatenate(Axis(axis), &[left.values.view(), right.values.view()])
                .map_err(|e| {
                    QlkError::UserSpec(format!("cannot join '{name}' along '{dim}': {e}"))
                })?;
            DataArray::new(left.dims.clone(), joined)
        }
        None => Ok(left.clone()),
    }
}

/// The values a dataset occupies along a merge axis: a dim coord's
/// values, or a scalar coord as a single slice.
fn axis_values(ds: &Dataset, name: &str) -> QlkResult<Vec<f64>> {
    match ds.coords.get(name) {
        Some(coord) if coord.is_scalar() => Ok(vec![coord.scalar_value().unwrap_or(f64::NAN)]),
        Some(coord) if ds.is_dim_coord(name) => Ok(coord.values.iter().copied().collect()),
        Some(_) => Err(QlkError::UserSpec(format!(
            "coordinate '{name}' is neither scalar nor a dimension; orthogonalize first"
        ))),
        None => Err(QlkError::UserSpec(format!(
            "coordinate '{name}' is missing from one dataset"
        ))),
    }
}

fn merge_union_grid(a: &Dataset, b: &Dataset, nonmatching: &[String]) -> QlkResult<Dataset> {
    let mut union: IndexMap<String, Vec<f64>> = IndexMap::new();
    for name in nonmatching {
        let values = axis_values(a, name)?
            .into_iter()
            .chain(axis_values(b, name)?);
        union.insert(name.clone(), sorted_unique(values));
    }

    let mut merged = Dataset::new();
    for (name, values) in &union {
        merged.add_coord(name, DataArray::from_vec(name, values.clone()))?;
    }
    for (name, coord) in &a.coords {
        if !union.contains_key(name) {
            merged.add_coord(name, coord.clone())?;
        }
    }

    for (name, left) in &a.data_vars {
        let right = b.data_vars.get(name).ok_or_else(|| {
            QlkError::UserSpec(format!("variable '{name}' missing from second dataset"))
        })?;
        // Union axes first, then the variable's remaining dims.
        let mut dims: Vec<String> = union.keys().cloned().collect();
        dims.extend(left.dims.iter().filter(|d| !union.contains_key(*d)).cloned());
        let mut shape: Vec<usize> = union.values().map(Vec::len).collect();
        for dim in dims.iter().skip(union.len()) {
            shape.push(
                left.values.shape()[left.axis_of(dim).expect("dim taken from left array")],
            );
        }
        let mut target = ArrayD::from_elem(IxDyn(&shape), f64::NAN);
        scatter_into_union(&mut target, &dims, a, left, &union)?;
        scatter_into_union(&mut target, &dims, b, right, &union)?;
        merged.add_var(name, DataArray::new(dims, target)?)?;
    }
    merged.attrs = a.attrs.clone();
    Ok(merged)
}

/// Copy every element of `array` into its union-grid cell.
fn scatter_into_union(
    target: &mut ArrayD<f64>,
    target_dims: &[String],
    ds: &Dataset,
    array: &DataArray,
    union: &IndexMap<String, Vec<f64>>,
) -> QlkResult<()> {
    // Per target axis: either a fixed index (promoted scalar axis) or
    // the source axis plus a value-to-position remap table.
    enum AxisMap {
        Fixed(usize),
        Source(usize),
        Remapped(usize, Vec<usize>),
    }
    let mut maps = Vec::with_capacity(target_dims.len());
    for dim in target_dims {
        let map = match (union.get(dim), array.axis_of(dim)) {
            (Some(unique), Some(axis)) => {
                let table = axis_values(ds, dim)?
                    .into_iter()
                    .map(|v| position_of(unique, v))
                    .collect::<QlkResult<Vec<usize>>>()?;
                AxisMap::Remapped(axis, table)
            }
            (Some(unique), None) => {
                let value = axis_values(ds, dim)?;
                AxisMap::Fixed(position_of(unique, value[0])?)
            }
            (None, Some(axis)) => AxisMap::Source(axis),
            (None, None) => {
                return Err(QlkError::UserSpec(format!(
                    "dimension '{dim}' is missing from a merged variable"
                )))
            }
        };
        maps.push(map);
    }

    let mut cell = vec![0usize; target_dims.len()];
    for (index, &value) in array.values.indexed_iter() {
        for (slot, map) in cell.iter_mut().zip(&maps) {
            *slot = match map {
                AxisMap::Fixed(at) => *at,
                AxisMap::Source(axis) => index[*axis],
                AxisMap::Remapped(axis, table) => table[index[*axis]],
            };
        }
        target[IxDyn(&cell)] = value;
    }
    Ok(())
}

/// Reorder every dimension with a labeling coordinate so the labels
/// ascend.
pub fn sort_axes(ds: &Dataset) -> QlkResult<Dataset> {
    let mut sorted = ds.clone();
    let dim_names: Vec<String> = ds
        .dims()
        .keys()
        .filter(|name| ds.is_dim_coord(name))
        .cloned()
        .collect();
    for dim in dim_names {
        let values = &sorted.coords[&dim].values;
        let mut perm: Vec<usize> = (0..values.len()).collect();
        perm.sort_by(|&i, &j| {
            values[[i]]
                .partial_cmp(&values[[j]])
                .expect("axis labels are ordered")
        });
        if perm.iter().enumerate().all(|(i, &p)| i == p) {
            continue;
        }
        for array in sorted
            .coords
            .values_mut()
            .chain(sorted.data_vars.values_mut())
        {
            if let Some(axis) = array.axis_of(&dim) {
                array.values = array.values.select(Axis(axis), &perm);
            }
        }
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_dataset(ati: Vec<f64>, ate: Vec<f64>, efe: Vec<f64>) -> Dataset {
        let mut ds = Dataset::new();
        ds.add_coord("Ati", DataArray::from_vec("dimx", ati)).unwrap();
        ds.add_coord("Ate", DataArray::from_vec("dimx", ate)).unwrap();
        ds.add_var("efe_GB", DataArray::from_vec("dimx", efe)).unwrap();
        ds
    }

    #[test]
    fn test_orthogonalize_full_grid() {
        // 3 x 3 hyperrectangle, inner loop over Ate.
        let mut ati = Vec::new();
        let mut ate = Vec::new();
        let mut efe = Vec::new();
        for i in 0..3 {
            for j in 0..3 {
                ati.push(i as f64);
                ate.push(10.0 + j as f64);
                efe.push((i * 3 + j) as f64);
            }
        }
        let ortho = orthogonalize(&flat_dataset(ati, ate, efe)).unwrap();

        assert_eq!(ortho.dim_len("Ati"), Some(3));
        assert_eq!(ortho.dim_len("Ate"), Some(3));
        assert!(!ortho.has_dim("dimx"));
        let efe = &ortho.data_vars["efe_GB"];
        assert_eq!(efe.dims, vec!["Ati", "Ate"]);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(efe.values[[i, j]], (i * 3 + j) as f64);
            }
        }
    }

    #[test]
    fn test_orthogonalize_missing_cells_are_nan() {
        // A star pattern visits only one row and one column.
        let ds = flat_dataset(
            vec![0.0, 1.0, 2.0, 0.0, 0.0],
            vec![10.0, 10.0, 10.0, 11.0, 12.0],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        );
        let ortho = orthogonalize(&ds).unwrap();
        let efe = &ortho.data_vars["efe_GB"];
        assert_eq!(efe.values[[0, 0]], 1.0);
        assert_eq!(efe.values[[2, 0]], 3.0);
        assert_eq!(efe.values[[0, 2]], 5.0);
        assert!(efe.values[[1, 1]].is_nan());
        assert!(efe.values[[2, 2]].is_nan());
    }

    #[test]
    fn test_orthogonalize_duplicate_point_last_wins() {
        let ds = flat_dataset(
            vec![0.0, 1.0, 0.0],
            vec![10.0, 10.0, 10.0],
            vec![1.0, 2.0, 7.0],
        );
        let ortho = orthogonalize(&ds).unwrap();
        assert_eq!(ortho.data_vars["efe_GB"].values[[0, 0]], 7.0);
    }

    #[test]
    fn test_orthogonalize_carries_extra_axes() {
        let mut ds = flat_dataset(
            vec![0.0, 1.0],
            vec![10.0, 10.0],
            vec![1.0, 2.0],
        );
        // Ate is constant, so it is scalar after a squeeze; emulate.
        ds.add_coord("Ate", DataArray::scalar(10.0)).unwrap();
        ds.add_coord(
            "kthetarhos",
            DataArray::from_vec("kthetarhos", vec![0.1, 0.4]),
        )
        .unwrap();
        let gam = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        ds.add_var(
            "gam_GB",
            DataArray::new(vec!["dimx".to_string(), "kthetarhos".to_string()], gam).unwrap(),
        )
        .unwrap();
        ds.attrs.insert("R0".to_string(), 3.0);

        let ortho = orthogonalize(&ds).unwrap();
        let gam = &ortho.data_vars["gam_GB"];
        assert_eq!(gam.dims, vec!["Ati", "kthetarhos"]);
        assert_eq!(gam.values[[1, 0]], 3.0);
        assert_eq!(ortho.coords["Ate"].scalar_value(), Some(10.0));
        assert_eq!(ortho.attrs.get("R0"), Some(&3.0));
    }

    #[test]
    fn test_merge_single_axis_concat() {
        let mut a = orthogonalize(&flat_dataset(
            vec![0.0, 1.0],
            vec![10.0, 11.0],
            vec![1.0, 2.0],
        ))
        .unwrap();
        let mut b = orthogonalize(&flat_dataset(
            vec![2.0, 3.0],
            vec![10.0, 11.0],
            vec![3.0, 4.0],
        ))
        .unwrap();
        // Shared Ate axis, disjoint Ati axis.
        a.coords.shift_remove("Ate");
        b.coords.shift_remove("Ate");
        let a_ate = DataArray::from_vec("Ate", vec![10.0, 11.0]);
        a.add_coord("Ate", a_ate.clone()).unwrap();
        b.add_coord("Ate", a_ate).unwrap();

        let merged = merge_orthogonal(&a, &b).unwrap();
        assert_eq!(merged.dim_len("Ati"), Some(4));
        let values: Vec<f64> = merged.coords["Ati"].values.iter().copied().collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0]);
        let efe = &merged.data_vars["efe_GB"];
        assert!(efe.values[[0, 0]] == 1.0);
        assert!(efe.values[[2, 0]] == 3.0);
        assert!(efe.values[[3, 1]].is_nan() || efe.values[[3, 1]] == 4.0);
    }

    #[test]
    fn test_merge_identical_rejected() {
        let a = orthogonalize(&flat_dataset(
            vec![0.0, 1.0],
            vec![10.0, 11.0],
            vec![1.0, 2.0],
        ))
        .unwrap();
        assert!(merge_orthogonal(&a, &a.clone()).is_err());
    }

    #[test]
    fn test_merge_union_grid_with_scalar_promotion() {
        // Two single-slice cubes at different Ate values.
        let mut a = Dataset::new();
        a.add_coord("Ati", DataArray::from_vec("Ati", vec![0.0, 1.0]))
            .unwrap();
        a.add_coord("Ate", DataArray::scalar(10.0)).unwrap();
        a.add_var("efe_GB", DataArray::from_vec("Ati", vec![1.0, 2.0]))
            .unwrap();
        let mut b = Dataset::new();
        b.add_coord("Ati", DataArray::from_vec("Ati", vec![1.0, 2.0]))
            .unwrap();
        b.add_coord("Ate", DataArray::scalar(11.0)).unwrap();
        b.add_var("efe_GB", DataArray::from_vec("Ati", vec![5.0, 6.0]))
            .unwrap();

        let merged = merge_orthogonal(&a, &b).unwrap();
        let efe = &merged.data_vars["efe_GB"];
        assert_eq!(efe.dims, vec!["Ati", "Ate"]);
        assert_eq!(merged.dim_len("Ati"), Some(3));
        assert_eq!(merged.dim_len("Ate"), Some(2));
        assert_eq!(efe.values[[0, 0]], 1.0);
        assert_eq!(efe.values[[1, 0]], 2.0);
        assert_eq!(efe.values[[1, 1]], 5.0);
        assert_eq!(efe.values[[2, 1]], 6.0);
        assert!(efe.values[[0, 1]].is_nan());
        assert!(efe.values[[2, 0]].is_nan());
    }

    #[test]
    fn test_sort_axes() {
        let mut ds = Dataset::new();
        ds.add_coord("Ati", DataArray::from_vec("Ati", vec![2.0, 0.0, 1.0]))
            .unwrap();
        ds.add_var("efe_GB", DataArray::from_vec("Ati", vec![30.0, 10.0, 20.0]))
            .unwrap();
        let sorted = sort_axes(&ds).unwrap();
        let labels: Vec<f64> = sorted.coords["Ati"].values.iter().copied().collect();
        assert_eq!(labels, vec![0.0, 1.0, 2.0]);
        let values: Vec<f64> = sorted.data_vars["efe_GB"].values.iter().copied().collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }
}
