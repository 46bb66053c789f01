//! Postgres boundary: one read-only query per chart, one connection per call.
//!
//! Every fetch decodes into a private row struct, then maps into the domain
//! type with the row tag assigned in result-set order. Tagging happens here,
//! before anything filters, so tags always reflect position in the original
//! untouched result set. Failure and "no rows" are distinct outcomes: callers
//! get a `Result`, and an empty `Vec` is a valid, silent answer.

use std::env;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{Connection, FromRow, PgConnection};
use thiserror::Error;
use tracing::debug;

use turbine_core::{
    DimensionSample, EfficiencyJoinRow, EfficiencySample, ProductionReading, Region, RowTag,
    SizeSample, SurveyRow, TurbineSpan,
};

/// Connection string env var. Credentials never live in source.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Error)]
pub enum DataError {
    #[error("missing {0} environment variable")]
    MissingConfig(&'static str),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Which turbines the efficiency violin covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationScope {
    #[default]
    All,
    Onshore,
    Offshore,
}

impl LocationScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationScope::All => "all",
            LocationScope::Onshore => "onshore",
            LocationScope::Offshore => "offshore",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLocationScopeError;

impl fmt::Display for ParseLocationScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown location scope")
    }
}

impl std::error::Error for ParseLocationScopeError {}

impl FromStr for LocationScope {
    type Err = ParseLocationScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(LocationScope::All),
            "onshore" => Ok(LocationScope::Onshore),
            "offshore" => Ok(LocationScope::Offshore),
            _ => Err(ParseLocationScopeError),
        }
    }
}

const TURBINE_SPANS_SQL: &str = r#"
    SELECT "date_of_connection", "date_of_decommission"
    FROM "turbines"
"#;

const PRODUCTION_SQL: &str = r#"
    SELECT "year", "kwh"
    FROM "power_year"
"#;

const DIMENSIONS_SQL: &str = r#"
    SELECT "hub_height", "rotor_diameter"
    FROM "turbine_characteristics"
    WHERE "hub_height" > 4 AND "rotor_diameter" > 0
"#;

const SIZES_SQL: &str = r#"
    SELECT "capacity", "rotor_diameter", "hub_height"
    FROM "turbine_characteristics"
    WHERE "capacity" > 5 AND "rotor_diameter" > 0
"#;

const EFFICIENCY_REGION_SQL: &str = r#"
    SELECT "efficiency", "region"
    FROM "efficiency" AS e
    FULL JOIN "turbines" AS t ON e."turbine_id" = t."turbine_id"
"#;

const EFFICIENCY_JOIN_SQL: &str = r#"
    SELECT "efficiency", "capacity", "region"
    FROM "efficiency" AS e
    FULL JOIN "turbine_characteristics" AS t ON e."turbine_id" = t."turbine_id"
    FULL JOIN "turbines" AS t2 ON e."turbine_id" = t2."turbine_id"
    WHERE t."capacity" > 5
"#;

const EFFICIENCY_JOIN_ONSHORE_SQL: &str = r#"
    SELECT "efficiency", "capacity", "region"
    FROM "efficiency" AS e
    FULL JOIN "turbine_characteristics" AS t ON e."turbine_id" = t."turbine_id"
    FULL JOIN "turbines" AS t2 ON e."turbine_id" = t2."turbine_id"
    FULL JOIN "location" AS l ON e."turbine_id" = l."turbine_id"
    WHERE t."capacity" > 5 AND l."type_of_location" = 'Land'
"#;

const EFFICIENCY_JOIN_OFFSHORE_SQL: &str = r#"
    SELECT "efficiency", "capacity", "region"
    FROM "efficiency" AS e
    FULL JOIN "turbine_characteristics" AS t ON e."turbine_id" = t."turbine_id"
    FULL JOIN "turbines" AS t2 ON e."turbine_id" = t2."turbine_id"
    FULL JOIN "location" AS l ON e."turbine_id" = l."turbine_id"
    WHERE t."capacity" > 5 AND l."type_of_location" = 'Hav'
"#;

const SURVEY_SQL: &str = r#"
    SELECT "efficiency", "x_coordinates", "y_coordinates"
    FROM "turbines" AS t
    FULL JOIN "efficiency" AS e ON e."turbine_id" = t."turbine_id"
    WHERE t."date_of_decommission" IS NULL
"#;

#[derive(Debug, FromRow)]
struct TurbineSpanRow {
    date_of_connection: NaiveDate,
    date_of_decommission: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
struct ProductionRow {
    year: String,
    kwh: f64,
}

#[derive(Debug, FromRow)]
struct DimensionRow {
    hub_height: f64,
    rotor_diameter: f64,
}

#[derive(Debug, FromRow)]
struct SizeRow {
    capacity: f64,
    rotor_diameter: f64,
    hub_height: f64,
}

#[derive(Debug, FromRow)]
struct EfficiencyRegionRow {
    efficiency: Option<f64>,
    region: Option<String>,
}

#[derive(Debug, FromRow)]
struct EfficiencyJoinSqlRow {
    efficiency: Option<f64>,
    capacity: Option<f64>,
    region: Option<String>,
}

#[derive(Debug, FromRow)]
struct SurveySqlRow {
    efficiency: Option<f64>,
    x_coordinates: Option<f64>,
    y_coordinates: Option<f64>,
}

fn parse_region(code: Option<String>) -> Option<Region> {
    code.and_then(|s| s.parse().ok())
}

fn map_spans(rows: Vec<TurbineSpanRow>) -> Vec<TurbineSpan> {
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| TurbineSpan {
            tag: i as RowTag,
            connected: r.date_of_connection,
            decommissioned: r.date_of_decommission,
        })
        .collect()
}

fn map_production(rows: Vec<ProductionRow>) -> Vec<ProductionReading> {
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| ProductionReading {
            tag: i as RowTag,
            year_label: r.year,
            kwh: r.kwh,
        })
        .collect()
}

fn map_dimensions(rows: Vec<DimensionRow>) -> Vec<DimensionSample> {
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| DimensionSample {
            tag: i as RowTag,
            hub_height: r.hub_height,
            rotor_diameter: r.rotor_diameter,
        })
        .collect()
}

fn map_sizes(rows: Vec<SizeRow>) -> Vec<SizeSample> {
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| SizeSample {
            tag: i as RowTag,
            capacity: r.capacity,
            rotor_diameter: r.rotor_diameter,
            hub_height: r.hub_height,
        })
        .collect()
}

fn map_efficiency_regions(rows: Vec<EfficiencyRegionRow>) -> Vec<EfficiencySample> {
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| EfficiencySample {
            tag: i as RowTag,
            efficiency: r.efficiency,
            region: parse_region(r.region),
        })
        .collect()
}

fn map_efficiency_join(rows: Vec<EfficiencyJoinSqlRow>) -> Vec<EfficiencyJoinRow> {
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| EfficiencyJoinRow {
            tag: i as RowTag,
            efficiency: r.efficiency,
            capacity: r.capacity,
            region: parse_region(r.region),
        })
        .collect()
}

fn map_survey(rows: Vec<SurveySqlRow>) -> Vec<SurveyRow> {
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| SurveyRow {
            tag: i as RowTag,
            efficiency: r.efficiency,
            easting: r.x_coordinates,
            northing: r.y_coordinates,
        })
        .collect()
}

/// Handle for the wind-turbine database. Cheap to clone; every fetch opens
/// its own connection, runs exactly one query, and closes it again.
#[derive(Debug, Clone)]
pub struct Database {
    url: String,
}

impl Database {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Read the connection string from `DATABASE_URL`.
    pub fn from_env() -> Result<Self, DataError> {
        let url = env::var(DATABASE_URL_ENV)
            .map_err(|_| DataError::MissingConfig(DATABASE_URL_ENV))?;
        Ok(Self::new(url))
    }

    async fn fetch_all<R>(&self, sql: &str) -> Result<Vec<R>, DataError>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut conn = PgConnection::connect(&self.url).await?;
        let rows = sqlx::query_as::<_, R>(sql).fetch_all(&mut conn).await?;
        conn.close().await?;
        debug!(rows = rows.len(), "query complete");
        Ok(rows)
    }

    pub async fn turbine_spans(&self) -> Result<Vec<TurbineSpan>, DataError> {
        Ok(map_spans(self.fetch_all(TURBINE_SPANS_SQL).await?))
    }

    pub async fn production_readings(&self) -> Result<Vec<ProductionReading>, DataError> {
        Ok(map_production(self.fetch_all(PRODUCTION_SQL).await?))
    }

    pub async fn dimension_samples(&self) -> Result<Vec<DimensionSample>, DataError> {
        Ok(map_dimensions(self.fetch_all(DIMENSIONS_SQL).await?))
    }

    pub async fn size_samples(&self) -> Result<Vec<SizeSample>, DataError> {
        Ok(map_sizes(self.fetch_all(SIZES_SQL).await?))
    }

    pub async fn efficiency_samples(&self) -> Result<Vec<EfficiencySample>, DataError> {
        Ok(map_efficiency_regions(
            self.fetch_all(EFFICIENCY_REGION_SQL).await?,
        ))
    }

    /// Efficiency/capacity/region join, the row shape both linked charts
    /// share. The scoped variants drive the violin's radio control.
    pub async fn efficiency_join(
        &self,
        scope: LocationScope,
    ) -> Result<Vec<EfficiencyJoinRow>, DataError> {
        let sql = match scope {
            LocationScope::All => EFFICIENCY_JOIN_SQL,
            LocationScope::Onshore => EFFICIENCY_JOIN_ONSHORE_SQL,
            LocationScope::Offshore => EFFICIENCY_JOIN_OFFSHORE_SQL,
        };
        Ok(map_efficiency_join(self.fetch_all(sql).await?))
    }

    pub async fn survey_rows(&self) -> Result<Vec<SurveyRow>, DataError> {
        Ok(map_survey(self.fetch_all(SURVEY_SQL).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turbine_core::Tagged;

    #[test]
    fn tags_follow_result_set_order() {
        let rows = vec![
            EfficiencyJoinSqlRow {
                efficiency: Some(21.0),
                capacity: Some(600.0),
                region: Some("NJ".into()),
            },
            EfficiencyJoinSqlRow {
                efficiency: None,
                capacity: None,
                region: Some("ZL".into()),
            },
            EfficiencyJoinSqlRow {
                efficiency: Some(45.0),
                capacity: Some(2000.0),
                region: None,
            },
        ];
        let mapped = map_efficiency_join(rows);
        let tags: Vec<RowTag> = mapped.iter().map(|r| r.tag()).collect();
        assert_eq!(tags, vec![0, 1, 2]);
        assert_eq!(mapped[0].region, Some(Region::NJ));
        // missing values survive tagging untouched
        assert_eq!(mapped[1].efficiency, None);
    }

    #[test]
    fn unknown_region_codes_become_none() {
        assert_eq!(parse_region(Some("NJ".into())), Some(Region::NJ));
        assert_eq!(parse_region(Some("??".into())), None);
        assert_eq!(parse_region(None), None);
    }

    #[test]
    fn survey_mapping_keeps_planar_names_straight() {
        let rows = vec![SurveySqlRow {
            efficiency: Some(30.0),
            x_coordinates: Some(512_000.0),
            y_coordinates: Some(6_120_000.0),
        }];
        let mapped = map_survey(rows);
        assert_eq!(mapped[0].easting, Some(512_000.0));
        assert_eq!(mapped[0].northing, Some(6_120_000.0));
    }

    #[test]
    fn location_scope_round_trips() {
        for scope in [
            LocationScope::All,
            LocationScope::Onshore,
            LocationScope::Offshore,
        ] {
            assert_eq!(scope.as_str().parse::<LocationScope>().unwrap(), scope);
        }
        assert!("underwater".parse::<LocationScope>().is_err());
    }

    #[test]
    fn scoped_queries_partition_by_location_type() {
        // 'Land' and 'Hav' are the location table's onshore/offshore markers.
        assert!(EFFICIENCY_JOIN_ONSHORE_SQL.contains("'Land'"));
        assert!(EFFICIENCY_JOIN_OFFSHORE_SQL.contains("'Hav'"));
        assert!(!EFFICIENCY_JOIN_SQL.contains("type_of_location"));
    }

    #[test]
    fn missing_env_is_a_distinct_error() {
        std::env::remove_var(DATABASE_URL_ENV);
        match Database::from_env() {
            Err(DataError::MissingConfig(var)) => assert_eq!(var, DATABASE_URL_ENV),
            other => panic!("expected MissingConfig, got {other:?}"),
        }
    }
}
