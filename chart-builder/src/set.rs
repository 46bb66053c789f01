//! The dashboard's chart set: eight figures built in one shot from freshly
//! fetched rows, plus the retained row table the selection callbacks join
//! against. A new generate action replaces the whole set.

use serde::{Deserialize, Serialize};

use turbine_core::{
    active_turbine_series, filter_by_tags, geo, production_series, DimensionSample,
    EfficiencyJoinRow, EfficiencySample, ProductionReading, RowTag, SizeSample, SurveyRow,
    TurbineSpan, YearPoint,
};

use crate::builders;
use crate::figure::Figure;

/// Bin width of the efficiency histogram, in percentage points.
pub const EFFICIENCY_BIN_WIDTH: f64 = 0.5;

/// How a chart gets its rows: straight from one query, or reduced to a
/// fixed-year series first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSource {
    Direct,
    Derived(SeriesKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    ActiveTurbines,
    Production,
}

impl SeriesKind {
    /// Reduce the raw rows this series is derived from to its fixed-year
    /// points.
    pub fn reduce(&self, inputs: &ChartInputs) -> Vec<YearPoint> {
        match self {
            SeriesKind::ActiveTurbines => active_turbine_series(&inputs.spans),
            SeriesKind::Production => production_series(&inputs.production),
        }
    }
}

/// Year series for a chart, dispatched on how it sources its rows. Direct
/// charts have no year series.
fn derived_series(chart: ChartId, inputs: &ChartInputs) -> Option<Vec<YearPoint>> {
    match chart.source() {
        ChartSource::Derived(kind) => Some(kind.reduce(inputs)),
        ChartSource::Direct => None,
    }
}

/// Stable chart identifiers, used as JSON keys and tab slot references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    ActiveTurbines,
    PowerProduction,
    HubRot,
    CapRotHub,
    EfficiencyHist,
    Map,
    EfficiencyViolin,
    CapacityEfficiency,
}

impl ChartId {
    pub const ALL: [ChartId; 8] = [
        ChartId::ActiveTurbines,
        ChartId::PowerProduction,
        ChartId::HubRot,
        ChartId::CapRotHub,
        ChartId::EfficiencyHist,
        ChartId::Map,
        ChartId::EfficiencyViolin,
        ChartId::CapacityEfficiency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartId::ActiveTurbines => "active_turbines",
            ChartId::PowerProduction => "power_production",
            ChartId::HubRot => "hub_rot",
            ChartId::CapRotHub => "cap_rot_hub",
            ChartId::EfficiencyHist => "efficiency_hist",
            ChartId::Map => "map",
            ChartId::EfficiencyViolin => "efficiency_violin",
            ChartId::CapacityEfficiency => "capacity_efficiency",
        }
    }

    pub fn source(&self) -> ChartSource {
        match self {
            ChartId::ActiveTurbines => ChartSource::Derived(SeriesKind::ActiveTurbines),
            ChartId::PowerProduction => ChartSource::Derived(SeriesKind::Production),
            _ => ChartSource::Direct,
        }
    }
}

/// Raw inputs of one generate action, one row set per query.
#[derive(Debug, Default)]
pub struct ChartInputs {
    pub spans: Vec<TurbineSpan>,
    pub production: Vec<ProductionReading>,
    pub dimensions: Vec<DimensionSample>,
    pub sizes: Vec<SizeSample>,
    pub efficiency: Vec<EfficiencySample>,
    pub joined: Vec<EfficiencyJoinRow>,
    pub survey: Vec<SurveyRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSet {
    pub active_turbines: Figure,
    pub power_production: Figure,
    pub hub_rot: Figure,
    pub cap_rot_hub: Figure,
    pub efficiency_hist: Figure,
    pub map: Figure,
    pub efficiency_violin: Figure,
    pub capacity_efficiency: Figure,
    /// Full tagged row table both linked charts were built from; the
    /// selection callback joins against this, never against the traces.
    #[serde(skip)]
    linked_rows: Vec<EfficiencyJoinRow>,
}

/// The two linked figures, rebuilt from one shared tag selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionUpdate {
    pub capacity_efficiency: Figure,
    pub efficiency_violin: Figure,
}

impl ChartSet {
    /// All-empty placeholder set shown before the first generate action.
    pub fn placeholder() -> Self {
        Self {
            active_turbines: Figure::empty(),
            power_production: Figure::empty(),
            hub_rot: Figure::empty(),
            cap_rot_hub: Figure::empty(),
            efficiency_hist: Figure::empty(),
            map: Figure::empty(),
            efficiency_violin: Figure::empty(),
            capacity_efficiency: Figure::empty(),
            linked_rows: Vec::new(),
        }
    }

    /// Build all eight figures from freshly fetched rows.
    pub fn build(inputs: ChartInputs) -> Self {
        let active = derived_series(ChartId::ActiveTurbines, &inputs).unwrap_or_default();
        let produced = derived_series(ChartId::PowerProduction, &inputs).unwrap_or_default();
        let survey_points = geo::survey_points(&inputs.survey);
        let geo_points = geo::project_survey(&survey_points);

        Self {
            active_turbines: builders::derived_scatter(
                &active,
                "Number of active wind turbines in each year",
                "Year",
                "Quantity",
            ),
            power_production: builders::derived_scatter(
                &produced,
                "Production in each year",
                "Year",
                "Production (GWH)",
            ),
            hub_rot: builders::dimension_scatter(
                &inputs.dimensions,
                "Hub Height vs Rotor Diameter",
                "Hub Height (m)",
                "Rotor Diameter (m)",
            ),
            cap_rot_hub: builders::size_scatter(
                &inputs.sizes,
                "Correlation between size variables",
                "Capacity (kW)",
                "Rotor Diameter (m)",
            ),
            efficiency_hist: builders::efficiency_histogram(
                &inputs.efficiency,
                EFFICIENCY_BIN_WIDTH,
                "Efficiency distribution",
                "Efficiency (%)",
            ),
            map: builders::turbine_map(&geo_points),
            efficiency_violin: builders::efficiency_violin(
                &inputs.joined,
                "Efficiency by Region",
                "Region",
                "Efficiency (%)",
            ),
            capacity_efficiency: builders::capacity_scatter(
                &inputs.joined,
                "Capacity vs Efficiency",
                "Capacity (kW)",
                "Efficiency (%)",
            ),
            linked_rows: inputs.joined,
        }
    }

    /// Rebuild a violin figure for a re-fetched scope variant (radio event).
    pub fn scoped_violin(rows: &[EfficiencyJoinRow]) -> Figure {
        builders::efficiency_violin(rows, "Efficiency by Region", "Region", "Efficiency (%)")
    }

    /// Tags of the full linked row table, the "no active selection" set.
    pub fn linked_tags(&self) -> Vec<RowTag> {
        turbine_core::all_tags(&self.linked_rows)
    }

    /// Apply one tag selection to both linked charts.
    ///
    /// The same tag set filters both figures because they are built from the
    /// same tagged row table; an empty selection legitimately empties both.
    pub fn apply_selection(&self, selected: &[RowTag]) -> SelectionUpdate {
        let subset = filter_by_tags(&self.linked_rows, selected);
        SelectionUpdate {
            capacity_efficiency: builders::capacity_scatter(
                &subset,
                "Capacity vs Efficiency",
                "Capacity (kW)",
                "Efficiency (%)",
            ),
            efficiency_violin: builders::efficiency_violin(
                &subset,
                "Efficiency by Region",
                "Region",
                "Efficiency (%)",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turbine_core::Region;

    fn join_row(tag: u64, eff: f64, cap: f64, region: Region) -> EfficiencyJoinRow {
        EfficiencyJoinRow {
            tag,
            efficiency: Some(eff),
            capacity: Some(cap),
            region: Some(region),
        }
    }

    fn set_with_rows(rows: Vec<EfficiencyJoinRow>) -> ChartSet {
        ChartSet::build(ChartInputs {
            joined: rows,
            ..Default::default()
        })
    }

    #[test]
    fn placeholder_set_has_only_empty_figures() {
        let set = ChartSet::placeholder();
        assert!(set.active_turbines.is_empty());
        assert!(set.map.is_empty());
        assert!(set.linked_tags().is_empty());
    }

    #[test]
    fn build_produces_all_chart_keys() {
        let set = set_with_rows(vec![join_row(0, 30.0, 600.0, Region::NJ)]);
        let json = serde_json::to_value(&set).unwrap();
        for id in ChartId::ALL {
            assert!(
                json.get(id.as_str()).is_some(),
                "missing figure {}",
                id.as_str()
            );
        }
        // the retained row table never leaks over the wire
        assert!(json.get("linked_rows").is_none());
    }

    #[test]
    fn derived_charts_have_fixed_length_series_even_without_rows() {
        let set = set_with_rows(Vec::new());
        assert_eq!(set.active_turbines.data[0].x.len(), turbine_core::YEAR_SPAN);
        assert_eq!(set.power_production.data[0].x.len(), turbine_core::YEAR_SPAN);
    }

    #[test]
    fn empty_selection_empties_both_linked_charts() {
        let set = set_with_rows(vec![
            join_row(0, 30.0, 600.0, Region::NJ),
            join_row(1, 40.0, 900.0, Region::ZL),
        ]);
        let update = set.apply_selection(&[]);
        assert!(update.capacity_efficiency.data.iter().all(|t| t.x.is_empty()));
        assert!(update.efficiency_violin.data.iter().all(|t| t.y.is_empty()));
    }

    #[test]
    fn full_selection_matches_original_figures() {
        let set = set_with_rows(vec![
            join_row(0, 30.0, 600.0, Region::NJ),
            join_row(1, 40.0, 900.0, Region::ZL),
        ]);
        let update = set.apply_selection(&set.linked_tags());
        let original = serde_json::to_value(&set.capacity_efficiency).unwrap();
        let rebuilt = serde_json::to_value(&update.capacity_efficiency).unwrap();
        assert_eq!(original, rebuilt);
    }

    #[test]
    fn partial_selection_filters_by_tag() {
        let set = set_with_rows(vec![
            join_row(0, 30.0, 600.0, Region::NJ),
            join_row(1, 40.0, 900.0, Region::NJ),
            join_row(2, 50.0, 100.0, Region::ZL),
        ]);
        let update = set.apply_selection(&[1]);
        let nj = &update.capacity_efficiency.data[0];
        assert_eq!(nj.customdata, vec![1]);
        let zl = &update.capacity_efficiency.data[4];
        assert!(zl.customdata.is_empty());
    }

    #[test]
    fn derived_series_dispatches_on_chart_source() {
        let inputs = ChartInputs {
            production: vec![ProductionReading {
                tag: 0,
                year_label: "P2000".to_string(),
                kwh: 500_000.0,
            }],
            ..Default::default()
        };
        let series = derived_series(ChartId::PowerProduction, &inputs).unwrap();
        assert_eq!(series, production_series(&inputs.production));
        assert_eq!(series.len(), turbine_core::YEAR_SPAN);
        assert!(derived_series(ChartId::CapacityEfficiency, &inputs).is_none());
    }

    #[test]
    fn chart_ids_declare_their_source() {
        assert_eq!(
            ChartId::ActiveTurbines.source(),
            ChartSource::Derived(SeriesKind::ActiveTurbines)
        );
        assert_eq!(
            ChartId::PowerProduction.source(),
            ChartSource::Derived(SeriesKind::Production)
        );
        assert_eq!(ChartId::CapacityEfficiency.source(), ChartSource::Direct);
    }
}
