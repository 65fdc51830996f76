//! Data reshaping for SnowModel station files.
//!
//! This crate turns located CDEC stations and their raw inch-based
//! observations into the fixed legacy CSV layout: one metadata table for
//! the snow courses and one observation file per station.

pub mod error;
pub mod metadata;
pub mod snowmodel;

/// Unit conversion and snow density.
pub mod units {
    /// Millimeters per inch (SWE)
    pub const MM_PER_INCH: f64 = 25.4;
    /// Centimeters per inch (snow depth)
    pub const CM_PER_INCH: f64 = 2.54;
    /// Density of pure water, kg/m³
    pub const WATER_DENSITY: f64 = 997.0;

    pub fn inches_to_mm(inches: f64) -> f64 {
        inches * MM_PER_INCH
    }

    pub fn inches_to_cm(inches: f64) -> f64 {
        inches * CM_PER_INCH
    }

    /// Bulk snow density in kg/m³ from SWE (mm) and depth (cm).
    ///
    /// Only defined when both are strictly positive.
    pub fn density(swe_mm: f64, depth_cm: f64) -> Option<f64> {
        if swe_mm > 0.0 && depth_cm > 0.0 {
            Some(WATER_DENSITY * 0.001 * swe_mm / (0.01 * depth_cm))
        } else {
            None
        }
    }

}
