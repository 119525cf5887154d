//! Scan-plan expansion for the QuaLiKiz solver binary.
//!
//! A [`plan::Plan`] combines a base [`xpoint::Xpoint`] with an ordered
//! set of parameter scans and expands them into the flat
//! double-precision input buffers the solver reads.

pub mod binary;
pub mod keys;
pub mod plan;
pub mod rundir;
pub mod xpoint;
