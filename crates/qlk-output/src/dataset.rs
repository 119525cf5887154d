// ─────────────────────────────────────────────────────────────────────
// SCPN QuaLiKiz Tools — Dataset
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Labeled multi-dimensional arrays and the dataset holding them.
//!
//! A [`DataArray`] is a dynamic-rank array with one dimension name per
//! axis; a [`Dataset`] groups coordinates, data variables and scalar
//! attributes that share dimensions. Dimensions are derived from the
//! member arrays: a name maps to the axis length every member agrees
//! on, and membership of the coordinate map versus the variable map is
//! the distinction the folding pipeline moves arrays across.

use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn};
use qlk_types::error::{QlkError, QlkResult};

/// A named-axis array of dynamic rank. Rank zero is a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub dims: Vec<String>,
    pub values: ArrayD<f64>,
}

impl DataArray {
    pub fn new(dims: Vec<String>, values: ArrayD<f64>) -> QlkResult<Self> {
        if dims.len() != values.ndim() {
            return Err(QlkError::SizeMismatch {
                name: dims.join(","),
                len: values.ndim(),
                expected: values.shape().to_vec(),
            });
        }
        Ok(DataArray { dims, values })
    }

    pub fn scalar(value: f64) -> Self {
        DataArray {
            dims: Vec::new(),
            values: ArrayD::from_elem(IxDyn(&[]), value),
        }
    }

    /// A rank-1 array over `dim`.
    pub fn from_vec(dim: &str, values: Vec<f64>) -> Self {
        let len = values.len();
        DataArray {
            dims: vec![dim.to_string()],
            values: ArrayD::from_shape_vec(IxDyn(&[len]), values)
                .expect("1-D shape always matches its own length"),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// The scalar value, when rank is zero.
    pub fn scalar_value(&self) -> Option<f64> {
        if self.is_scalar() {
            self.values.first().copied()
        } else {
            None
        }
    }

    /// Axis position of `dim` in this array.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn rename_dim(&mut self, from: &str, to: &str) {
        for dim in &mut self.dims {
            if dim == from {
                *dim = to.to_string();
            }
        }
    }
}

/// Coordinates, data variables and run attributes over shared
/// dimensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub coords: IndexMap<String, DataArray>,
    pub data_vars: IndexMap<String, DataArray>,
    pub attrs: IndexMap<String, f64>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension lengths, in first-appearance order over coordinates
    /// then variables.
    pub fn dims(&self) -> IndexMap<String, usize> {
        let mut dims = IndexMap::new();
        for array in self.coords.values().chain(self.data_vars.values()) {
            for (dim, &len) in array.dims.iter().zip(array.values.shape()) {
                dims.entry(dim.clone()).or_insert(len);
            }
        }
        dims
    }

    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.dims().get(dim).copied()
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.dims().contains_key(dim)
    }

    /// A coordinate labeling its own dimension.
    pub fn is_dim_coord(&self, name: &str) -> bool {
        self.coords
            .get(name)
            .is_some_and(|coord| coord.dims.len() == 1 && coord.dims[0] == name)
    }

    fn check_dims(&self, name: &str, array: &DataArray) -> QlkResult<()> {
        // The array being replaced does not constrain its successor.
        let mut dims: IndexMap<&str, usize> = IndexMap::new();
        for (member, existing) in self.coords.iter().chain(self.data_vars.iter()) {
            if member == name {
                continue;
            }
            for (dim, &len) in existing.dims.iter().zip(existing.values.shape()) {
                dims.entry(dim.as_str()).or_insert(len);
            }
        }
        for (dim, &len) in array.dims.iter().zip(array.values.shape()) {
            if let Some(&known) = dims.get(dim.as_str()) {
                if known != len {
                    return Err(QlkError::SizeMismatch {
                        name: name.to_string(),
                        len,
                        expected: vec![known],
                    });
                }
            }
        }
        Ok(())
    }

    pub fn add_coord(&mut self, name: &str, array: DataArray) -> QlkResult<()> {
        self.check_dims(name, &array)?;
        self.data_vars.shift_remove(name);
        self.coords.insert(name.to_string(), array);
        Ok(())
    }

    pub fn add_var(&mut self, name: &str, array: DataArray) -> QlkResult<()> {
        self.check_dims(name, &array)?;
        self.coords.shift_remove(name);
        self.data_vars.insert(name.to_string(), array);
        Ok(())
    }

    /// Either map, coordinates first.
    pub fn get(&self, name: &str) -> Option<&DataArray> {
        self.coords.get(name).or_else(|| self.data_vars.get(name))
    }

    /// Move a coordinate into the data variables.
    pub fn demote_coord(&mut self, name: &str) -> bool {
        match self.coords.shift_remove(name) {
            Some(array) => {
                self.data_vars.insert(name.to_string(), array);
                true
            }
            None => false,
        }
    }

    pub fn drop_coord(&mut self, name: &str) -> bool {
        self.coords.shift_remove(name).is_some()
    }

    /// Rename dimension `from` to `to` in every member array.
    pub fn rename_dim(&mut self, from: &str, to: &str) {
        for array in self.coords.values_mut().chain(self.data_vars.values_mut()) {
            array.rename_dim(from, to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rank_must_match_dims() {
        let values = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
        assert!(DataArray::new(vec!["dimx".to_string()], values.clone()).is_err());
        let arr =
            DataArray::new(vec!["dimx".to_string(), "nions".to_string()], values).unwrap();
        assert_eq!(arr.axis_of("nions"), Some(1));
        assert!(!arr.is_scalar());
    }

    #[test]
    fn test_dims_derived_and_checked() {
        let mut ds = Dataset::new();
        ds.add_coord("x", DataArray::from_vec("dimx", vec![0.1, 0.2, 0.3]))
            .unwrap();
        ds.add_var(
            "efe_GB",
            DataArray::from_vec("dimx", vec![1.0, 2.0, 3.0]),
        )
        .unwrap();
        assert_eq!(ds.dim_len("dimx"), Some(3));

        let err = ds
            .add_var("bad", DataArray::from_vec("dimx", vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, QlkError::SizeMismatch { .. }));
    }

    #[test]
    fn test_dim_coord_detection() {
        let mut ds = Dataset::new();
        ds.add_coord("numsols", DataArray::from_vec("numsols", vec![0.0, 1.0]))
            .unwrap();
        ds.add_coord("x", DataArray::from_vec("dimx", vec![0.1, 0.2]))
            .unwrap();
        assert!(ds.is_dim_coord("numsols"));
        assert!(!ds.is_dim_coord("x"));
    }

    #[test]
    fn test_demote_moves_between_maps() {
        let mut ds = Dataset::new();
        ds.add_coord("normni", DataArray::from_vec("dimx", vec![0.9, 0.9]))
            .unwrap();
        assert!(ds.demote_coord("normni"));
        assert!(ds.coords.get("normni").is_none());
        assert!(ds.data_vars.get("normni").is_some());
        assert!(!ds.demote_coord("normni"));
    }

    #[test]
    fn test_rename_dim() {
        let mut ds = Dataset::new();
        ds.add_coord(
            "kthetarhos",
            DataArray::from_vec("dimn", vec![0.1, 0.4, 1.6]),
        )
        .unwrap();
        ds.rename_dim("dimn", "kthetarhos");
        assert!(ds.is_dim_coord("kthetarhos"));
    }

    #[test]
    fn test_scalar_array() {
        let scalar = DataArray::scalar(2.5);
        assert!(scalar.is_scalar());
        assert_eq!(scalar.scalar_value(), Some(2.5));
        assert_eq!(DataArray::from_vec("dimx", vec![1.0]).scalar_value(), None);
    }
}
