//! Core types and CDEC access for snow course and snow sensor data.
//!
//! The network client lives behind the `api` feature; everything else
//! (boundary loading, response parsing) works offline.

pub mod boundary;
#[cfg(feature = "api")]
pub mod client;
pub mod crs;
pub mod error;
pub mod observation;
pub mod search;
pub mod source;
pub mod station;
pub mod variable;
