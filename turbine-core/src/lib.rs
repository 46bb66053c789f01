use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub mod geo;

/// Per-fetch ordinal identifier, assigned 0..N-1 in result-set order.
/// Used as the join key when a point selection in one chart filters another.
pub type RowTag = u64;

/// First and last calendar year covered by the derived series.
pub const FIRST_YEAR: i32 = 1977;
pub const LAST_YEAR: i32 = 2020;
/// Number of buckets in a derived series (both endpoints inclusive).
pub const YEAR_SPAN: usize = (LAST_YEAR - FIRST_YEAR + 1) as usize;

/// Accessor for the row tag, implemented by every fetched row type.
pub trait Tagged {
    fn tag(&self) -> RowTag;
}

/// Danish region codes, in the fixed order charts must render them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// North Jutland
    NJ,
    /// Mid Jutland
    MJ,
    /// South Jutland
    SJ,
    /// Funen
    FU,
    /// Zealand
    ZL,
}

/// Render order for region-grouped charts, independent of input row order.
pub const REGION_ORDER: [Region; 5] = [Region::NJ, Region::MJ, Region::SJ, Region::FU, Region::ZL];

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NJ => "NJ",
            Region::MJ => "MJ",
            Region::SJ => "SJ",
            Region::FU => "FU",
            Region::ZL => "ZL",
        }
    }

    /// Discrete trace color paired with this region's position in `REGION_ORDER`.
    pub fn color(&self) -> &'static str {
        match self {
            Region::NJ => "green",
            Region::MJ => "red",
            Region::SJ => "blue",
            Region::FU => "brown",
            Region::ZL => "purple",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRegionError;

impl fmt::Display for ParseRegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown region code")
    }
}

impl std::error::Error for ParseRegionError {}

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NJ" => Ok(Region::NJ),
            "MJ" => Ok(Region::MJ),
            "SJ" => Ok(Region::SJ),
            "FU" => Ok(Region::FU),
            "ZL" => Ok(Region::ZL),
            _ => Err(ParseRegionError),
        }
    }
}

/// Connection/decommission window of one turbine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurbineSpan {
    pub tag: RowTag,
    pub connected: NaiveDate,
    pub decommissioned: Option<NaiveDate>,
}

/// One (year label, produced kWh) reading. The label carries a one-character
/// prefix in front of the four-digit year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionReading {
    pub tag: RowTag,
    pub year_label: String,
    pub kwh: f64,
}

/// Hub height vs rotor diameter sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionSample {
    pub tag: RowTag,
    pub hub_height: f64,
    pub rotor_diameter: f64,
}

/// Capacity/rotor/hub sample for the size-correlation chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeSample {
    pub tag: RowTag,
    pub capacity: f64,
    pub rotor_diameter: f64,
    pub hub_height: f64,
}

/// Efficiency joined with region, pre-validation (either side may be missing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencySample {
    pub tag: RowTag,
    pub efficiency: Option<f64>,
    pub region: Option<Region>,
}

/// Shared row shape of the two linked charts (capacity scatter + violin).
/// Linked selection joins on the tag, so both charts must fetch this same
/// row shape keyed by the same efficiency-table identifier; if the queries
/// diverge the join silently matches nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencyJoinRow {
    pub tag: RowTag,
    pub efficiency: Option<f64>,
    pub capacity: Option<f64>,
    pub region: Option<Region>,
}

/// Raw planar survey coordinates joined with efficiency, pre-validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyRow {
    pub tag: RowTag,
    pub efficiency: Option<f64>,
    pub easting: Option<f64>,
    pub northing: Option<f64>,
}

macro_rules! impl_tagged {
    ($($ty:ty),*) => {
        $(impl Tagged for $ty {
            fn tag(&self) -> RowTag {
                self.tag
            }
        })*
    };
}

impl_tagged!(
    TurbineSpan,
    ProductionReading,
    DimensionSample,
    SizeSample,
    EfficiencySample,
    EfficiencyJoinRow,
    SurveyRow
);

/// One element of a derived fixed-year-range series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearPoint {
    pub year: i32,
    pub value: f64,
}

fn jan_first(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).expect("Jan 1 is a valid date")
}

/// Bucket index for a year inside the fixed range, by direct offset.
fn year_index(year: i32) -> Option<usize> {
    if (FIRST_YEAR..=LAST_YEAR).contains(&year) {
        Some((year - FIRST_YEAR) as usize)
    } else {
        None
    }
}

/// Number of turbines active on Jan 1 of each year in the fixed range.
///
/// A turbine counts as active in year Y when it was connected on or before
/// Jan-1-Y and not yet decommissioned by Jan-1-Y. Always returns exactly
/// `YEAR_SPAN` points in ascending year order, zeros included.
pub fn active_turbine_series(rows: &[TurbineSpan]) -> Vec<YearPoint> {
    (FIRST_YEAR..=LAST_YEAR)
        .map(|year| {
            let cutoff = jan_first(year);
            let active = rows
                .iter()
                .filter(|t| {
                    t.connected <= cutoff
                        && t.decommissioned.map_or(true, |d| d >= cutoff)
                })
                .count();
            YearPoint {
                year,
                value: active as f64,
            }
        })
        .collect()
}

/// Total production in GWh for each year in the fixed range.
///
/// Rows with a malformed year label or a year outside the fixed range are
/// skipped with a warning; one dirty reading must not sink the whole series.
pub fn production_series(rows: &[ProductionReading]) -> Vec<YearPoint> {
    let mut buckets = [0.0f64; YEAR_SPAN];
    for row in rows {
        // The label's first character is a prefix; the rest is the year.
        let parsed = row
            .year_label
            .get(1..)
            .and_then(|s| s.trim().parse::<i32>().ok());
        let Some(year) = parsed else {
            warn!(label = %row.year_label, "skipping production row with malformed year label");
            continue;
        };
        let Some(idx) = year_index(year) else {
            warn!(year, "skipping production row outside {FIRST_YEAR}..={LAST_YEAR}");
            continue;
        };
        buckets[idx] += row.kwh;
    }
    buckets
        .iter()
        .enumerate()
        .map(|(i, kwh)| YearPoint {
            year: FIRST_YEAR + i as i32,
            value: kwh / 1_000_000.0, // kWh -> GWh
        })
        .collect()
}

/// Inner join of `rows` against a set of selected tags.
///
/// Preserves input row order, so re-filtering with the same tag set is
/// idempotent. An empty selection yields an empty result; that is the
/// user-visible "nothing selected" state, not an error.
pub fn filter_by_tags<R: Tagged + Clone>(rows: &[R], selected: &[RowTag]) -> Vec<R> {
    let wanted: HashSet<RowTag> = selected.iter().copied().collect();
    rows.iter()
        .filter(|r| wanted.contains(&r.tag()))
        .cloned()
        .collect()
}

/// All tags present in `rows`, in row order. This is what a "no active
/// selection" event resolves to before the filter runs.
pub fn all_tags<R: Tagged>(rows: &[R]) -> Vec<RowTag> {
    rows.iter().map(|r| r.tag()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn span(tag: RowTag, connected: NaiveDate, decommissioned: Option<NaiveDate>) -> TurbineSpan {
        TurbineSpan {
            tag,
            connected,
            decommissioned,
        }
    }

    #[test]
    fn active_series_empty_input_is_all_zero() {
        let series = active_turbine_series(&[]);
        assert_eq!(series.len(), YEAR_SPAN);
        assert_eq!(series.first().unwrap().year, FIRST_YEAR);
        assert_eq!(series.last().unwrap().year, LAST_YEAR);
        assert!(series.iter().all(|p| p.value == 0.0));
        // ascending year order
        assert!(series.windows(2).all(|w| w[0].year + 1 == w[1].year));
    }

    #[test]
    fn active_series_monotone_until_decommission() {
        let rows = vec![
            span(0, date(1980, 6, 1), None),
            span(1, date(1990, 3, 15), None),
            span(2, date(1985, 1, 1), Some(date(2000, 7, 1))),
        ];
        let series = active_turbine_series(&rows);
        // No decommissions before 2000, so counts never decrease up to there.
        let until_2000 = &series[..(2000 - FIRST_YEAR) as usize];
        assert!(until_2000.windows(2).all(|w| w[0].value <= w[1].value));
        // After the 2000 decommission only two turbines remain.
        let at_2001 = &series[(2001 - FIRST_YEAR) as usize];
        assert_eq!(at_2001.value, 2.0);
    }

    #[test]
    fn active_series_counts_connection_boundary() {
        // Connected exactly on Jan 1 counts that year; decommissioned on
        // Jan 1 still counts that year (the window is inclusive both ends).
        let rows = vec![span(0, date(1990, 1, 1), Some(date(1995, 1, 1)))];
        let series = active_turbine_series(&rows);
        assert_eq!(series[(1990 - FIRST_YEAR) as usize].value, 1.0);
        assert_eq!(series[(1995 - FIRST_YEAR) as usize].value, 1.0);
        assert_eq!(series[(1996 - FIRST_YEAR) as usize].value, 0.0);
        assert_eq!(series[(1989 - FIRST_YEAR) as usize].value, 0.0);
    }

    #[test]
    fn production_series_converts_kwh_to_gwh() {
        let rows = vec![ProductionReading {
            tag: 0,
            year_label: "X1980".to_string(),
            kwh: 500_000.0,
        }];
        let series = production_series(&rows);
        assert_eq!(series.len(), YEAR_SPAN);
        let p1980 = &series[(1980 - FIRST_YEAR) as usize];
        assert_eq!(p1980.value, 0.5);
        let total: f64 = series.iter().map(|p| p.value).sum();
        assert_eq!(total, 0.5);
    }

    #[test]
    fn production_series_accumulates_per_year() {
        let rows = vec![
            ProductionReading {
                tag: 0,
                year_label: "y2001".into(),
                kwh: 1_000_000.0,
            },
            ProductionReading {
                tag: 1,
                year_label: "y2001".into(),
                kwh: 2_000_000.0,
            },
            ProductionReading {
                tag: 2,
                year_label: "y2002".into(),
                kwh: 4_000_000.0,
            },
        ];
        let series = production_series(&rows);
        assert_eq!(series[(2001 - FIRST_YEAR) as usize].value, 3.0);
        assert_eq!(series[(2002 - FIRST_YEAR) as usize].value, 4.0);
    }

    #[test]
    fn production_series_skips_dirty_rows() {
        let rows = vec![
            ProductionReading {
                tag: 0,
                year_label: "x1950".into(), // before the range
                kwh: 9e9,
            },
            ProductionReading {
                tag: 1,
                year_label: "garbage".into(),
                kwh: 9e9,
            },
            ProductionReading {
                tag: 2,
                year_label: "".into(),
                kwh: 9e9,
            },
            ProductionReading {
                tag: 3,
                year_label: "x2010".into(),
                kwh: 2_000_000.0,
            },
        ];
        let series = production_series(&rows);
        let total: f64 = series.iter().map(|p| p.value).sum();
        assert_eq!(total, 2.0);
    }

    #[test]
    fn filter_empty_selection_yields_empty() {
        let rows: Vec<EfficiencyJoinRow> = (0..5)
            .map(|i| EfficiencyJoinRow {
                tag: i,
                efficiency: Some(20.0),
                capacity: Some(600.0),
                region: Some(Region::NJ),
            })
            .collect();
        assert!(filter_by_tags(&rows, &[]).is_empty());
    }

    #[test]
    fn filter_full_selection_is_identity() {
        let rows: Vec<EfficiencyJoinRow> = (0..5)
            .map(|i| EfficiencyJoinRow {
                tag: i,
                efficiency: Some(20.0 + i as f64),
                capacity: Some(600.0),
                region: Some(Region::ZL),
            })
            .collect();
        let tags = all_tags(&rows);
        let filtered = filter_by_tags(&rows, &tags);
        assert_eq!(filtered.len(), rows.len());
        let same_order = filtered.iter().zip(&rows).all(|(a, b)| a.tag == b.tag);
        assert!(same_order);
    }

    #[test]
    fn filter_is_idempotent_and_order_stable() {
        let rows: Vec<EfficiencyJoinRow> = (0..10)
            .map(|i| EfficiencyJoinRow {
                tag: i,
                efficiency: Some(i as f64),
                capacity: None,
                region: None,
            })
            .collect();
        // Selection order must not leak into output order.
        let selected = vec![7, 2, 9, 2];
        let once = filter_by_tags(&rows, &selected);
        let tags: Vec<RowTag> = once.iter().map(|r| r.tag).collect();
        assert_eq!(tags, vec![2, 7, 9]);
        let twice = filter_by_tags(&once, &selected);
        let tags_again: Vec<RowTag> = twice.iter().map(|r| r.tag).collect();
        assert_eq!(tags, tags_again);
    }

    #[test]
    fn region_order_is_fixed() {
        let codes: Vec<&str> = REGION_ORDER.iter().map(|r| r.as_str()).collect();
        assert_eq!(codes, vec!["NJ", "MJ", "SJ", "FU", "ZL"]);
        assert_eq!("MJ".parse::<Region>().unwrap(), Region::MJ);
        assert!("XX".parse::<Region>().is_err());
    }

    #[test]
    fn year_index_is_offset_arithmetic() {
        assert_eq!(year_index(FIRST_YEAR), Some(0));
        assert_eq!(year_index(LAST_YEAR), Some(YEAR_SPAN - 1));
        assert_eq!(year_index(FIRST_YEAR - 1), None);
        assert_eq!(year_index(LAST_YEAR + 1), None);
    }
}
