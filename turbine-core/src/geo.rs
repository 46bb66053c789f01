//! Planar survey coordinates -> WGS84, for map placement.
//!
//! This is presentation-layer data prep: rows failing the validity predicate
//! are dropped, never raised, and the whole pass is recomputed per chart
//! generation.

use serde::{Deserialize, Serialize};

use crate::SurveyRow;

/// Danish records are surveyed in UTM zone 32, northern hemisphere.
pub const UTM_ZONE: u8 = 32;
pub const UTM_ZONE_LETTER: char = 'U';

/// Valid easting window; values outside are survey artifacts.
pub const EASTING_MIN: f64 = 100_000.0;
pub const EASTING_MAX: f64 = 999_999.0;
/// Efficiency at or below this is a placeholder reading, not a measurement.
pub const MIN_EFFICIENCY: f64 = 1.0;

/// A validated planar sample ready for projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyPoint {
    pub easting: f64,
    pub northing: f64,
    pub efficiency: f64,
}

/// A projected map sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub efficiency: f64,
}

/// Drop incomplete rows coming straight off the database join.
pub fn survey_points(rows: &[SurveyRow]) -> Vec<SurveyPoint> {
    rows.iter()
        .filter_map(|r| {
            Some(SurveyPoint {
                easting: r.easting?,
                northing: r.northing?,
                efficiency: r.efficiency?,
            })
        })
        .collect()
}

/// Project valid samples to (lat, lon), order-preserving.
///
/// A sample is valid when its easting lies strictly inside the survey window
/// and its efficiency is above the placeholder threshold. Output length is
/// at most the input length.
pub fn project_survey(points: &[SurveyPoint]) -> Vec<GeoPoint> {
    points
        .iter()
        .filter_map(|p| {
            if p.easting <= EASTING_MIN || p.easting >= EASTING_MAX {
                return None;
            }
            if p.efficiency <= MIN_EFFICIENCY {
                return None;
            }
            let (lat, lon) =
                utm::wsg84_utm_to_lat_lon(p.easting, p.northing, UTM_ZONE, UTM_ZONE_LETTER)
                    .ok()?;
            Some(GeoPoint {
                lat,
                lon,
                efficiency: p.efficiency,
            })
        })
        .collect()
}
