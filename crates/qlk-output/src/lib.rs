//! Folding of the solver's flat output files into labeled hypercubes.
//!
//! The solver writes one flat ASCII file per quantity; the dimension
//! sizes live in `debug/`. [`loader::load_run`] folds everything into
//! a [`dataset::Dataset`], [`squeeze`] strips the redundancy a scan
//! produces, and [`ortho`] re-expands the flat point axis into the
//! orthogonal parameter grid the scan implies.

pub mod catalogue;
pub mod dataset;
pub mod loader;
pub mod ortho;
pub mod persist;
pub mod sizes;
pub mod squeeze;
