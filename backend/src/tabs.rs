//! The five narrative tabs and their fixed content blocks.
//!
//! A tab is markdown commentary interleaved with chart slots; the shell page
//! renders the blocks in order and wires the interactive slots (radio,
//! linked selection) to the callback endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use chart_builder::ChartId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabId {
    Homepage,
    Relevance,
    Correlations,
    Maps,
    Capacity,
}

pub const TAB_ORDER: [TabId; 5] = [
    TabId::Homepage,
    TabId::Relevance,
    TabId::Correlations,
    TabId::Maps,
    TabId::Capacity,
];

impl TabId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabId::Homepage => "homepage",
            TabId::Relevance => "relevance",
            TabId::Correlations => "correlations",
            TabId::Maps => "maps",
            TabId::Capacity => "capacity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TabId::Homepage => "Homepage",
            TabId::Relevance => "Relevance",
            TabId::Correlations => "Correlations",
            TabId::Maps => "Location",
            TabId::Capacity => "Capacity's affect on Efficiency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTabIdError;

impl fmt::Display for ParseTabIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown tab id")
    }
}

impl std::error::Error for ParseTabIdError {}

impl FromStr for TabId {
    type Err = ParseTabIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TAB_ORDER
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(ParseTabIdError)
    }
}

/// One content block of a tab, rendered top to bottom.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Markdown { text: String },
    /// Chart slot; `width` is the grid column span out of 12.
    Chart { chart: ChartId, width: u8 },
    /// The onshore/offshore radio control next to the scoped violin.
    Radio { options: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabMeta {
    pub id: TabId,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabContent {
    pub id: TabId,
    pub label: String,
    pub blocks: Vec<Block>,
}

pub fn tab_index() -> Vec<TabMeta> {
    TAB_ORDER
        .into_iter()
        .map(|id| TabMeta {
            id,
            label: id.label().to_string(),
        })
        .collect()
}

fn md(text: &str) -> Block {
    Block::Markdown {
        text: text.trim().to_string(),
    }
}

fn chart(chart: ChartId, width: u8) -> Block {
    Block::Chart { chart, width }
}

pub fn tab_content(id: TabId) -> TabContent {
    let blocks = match id {
        TabId::Homepage => vec![md(HOMEPAGE_MD)],
        TabId::Relevance => vec![
            md("Below you see two figures that shows the overall development in the wind turbine industry in Denmark from 1977 to 2020."),
            chart(ChartId::ActiveTurbines, 6),
            chart(ChartId::PowerProduction, 6),
            md(RELEVANCE_MD),
        ],
        TabId::Correlations => vec![
            md(CORRELATIONS_INTRO_MD),
            chart(ChartId::CapRotHub, 6),
            chart(ChartId::HubRot, 6),
            md(CORRELATIONS_MD),
        ],
        TabId::Maps => vec![
            md("Below you see three figures that shows information about the location and efficency of wind turbines.\n\nIn the figures it is possible to observe information regarding the optimal locations to get the most efficienct wind turbine."),
            chart(ChartId::Map, 9),
            md(MAP_MD),
            chart(ChartId::EfficiencyHist, 9),
            md(HISTOGRAM_MD),
            chart(ChartId::EfficiencyViolin, 9),
            Block::Radio {
                options: vec!["all".into(), "onshore".into(), "offshore".into()],
            },
            md(VIOLIN_MD),
        ],
        TabId::Capacity => vec![
            md(CAPACITY_INTRO_MD),
            chart(ChartId::CapacityEfficiency, 9),
            chart(ChartId::EfficiencyViolin, 9),
            md(CAPACITY_MD),
        ],
    };
    TabContent {
        id,
        label: id.label().to_string(),
        blocks,
    }
}

const HOMEPAGE_MD: &str = r#"
Welcome to the data visualization application made by group DV3-02.

In the application you will find various figures that support the conlusion in the report.

The problem statement from the report is as follows:

Where in Denmark is the optimal location for a wind turbine and what should the dimensions be to achieve maximum efficiency when considering the dimensions capacity (kW), hub height (m) and rotor diameter (m)?

* How do we measure efficiency?
* Where to place wind turbines to get the biggest electricity production by coordinates?
* How does capacity (kW) affect efficiency?
* How can an interactive data visualization application help a user discover answers to the problem statement?

The data is published by Energistyrelsen and was retrieved on the 6th of September 2021.
"#;

const RELEVANCE_MD: &str = r#"
On the figure to the left you see a steep increase in number of active wind turbines from 1977 to 2002.
In the years around 2002 the danish government introduced a repowering program where they gave turbine manufacturers
incentive to build bigger wind turbines than previously. The repowering program can be observed as the stagnation
of the points after the year 2002.

On the figure to the right you see a rapid increase in power production by wind turbines from 1996 to 2020.
It is interesting that the power production keeps increasing even when the number of active wind turbines is the same
or is decreasing. This indicates that the repowering program was successful, and more high-capacity wind turbines were
built as many low-capacity wind turbines were decommissioned (disconnected from the power grid).

In conclusion, the overall development of wind turbines in Denmark is positive. Wind turbines are getting bigger and more efficient
which results in an increase of power production at a high rate.
"#;

const CORRELATIONS_INTRO_MD: &str = r#"
Below you see two figures that shows the correlation between the size variables of active wind turbines.

* Capacity: The size of the turbine in kW.
* Rotor Diameter: The diameter of the surface area of the wings in meters.
* Hub Height: The height of the turbine tower in meters.

By observing the correlation between the size variables, it is possible to determine the independent variable.
"#;

const CORRELATIONS_MD: &str = r#"
In the figure to the left you can see the correlation between the three size variables.
It can be observed that the correlation between Capacity (kW) and Rotor Diameter (m) is not linear
and the same is the case of Hub Height (m). The correlation between Hub Height (m) and Capacity (kW)
looks very similar to the points plotted, which can be seen by the smooth transitioning of the colors.
The similarity in correlations indicates that the correlation between Rotor Diameter (m) and Hub Height (m) is linear which can be seen
in the figure to the right.

Because of the fact that Rotor Diameter (m) and Hub Height (m) is not linearly correlated to Capacity (kW) suggests
that Capacity (kW) could be the independant variable.
"#;

const MAP_MD: &str = r#"
In the map above it can be seen that wind turbines are located across the country. However, it can be seen that the
efficiency varies from location to location. By zooming on the map and comparing areas it can be observed that
the most efficienct wind turbines are located on the west coast, and more specifically many are located near the north west
coast of Jutland. It can also be observed that offshore wind turbines are generally more efficienct than onshore wind turbines.
"#;

const HISTOGRAM_MD: &str = r#"
Now the distribution of efficiency across regions can be compared in the histogram above.

The regions are named as:

* NJ: North Jutland
* MJ: Mid Jutland
* SJ: South Jutland
* FU: Funen
* ZL: Zealand

By zooming and panning in the histogram, it can be seen that North Jutland and Mid Jutland have a big representation
in the middle and upper part of the distribution. It looks as if the North Jutland has most wind turbines with a
relativly high efficiency compared to the other regions. North Jutland is most represented in wind turbines with an
efficiency greater than 46%.
"#;

const VIOLIN_MD: &str = r#"
Now we can see the distribution of efficiency within each region and compare quartiles between regions. We can also
compare the specific distribution, and see that the distribution of Zealand looks more spread than for example the distribution
of Mid Jutland which has many wind turbines with an efficiency around 21%. However, Mid Jutland has many outliers as well.
We see that North Jutland and Mid Jutland has the wind turbines with the highest max efficiency of around 71% and 77 % respectively.

By choosing back and forth between the "All" and the "Onshore" options in the items on the right, you can see the effect that
offshore wind turbines have on the efficiency in each region. Notice how the interquartile range becomes much bigger in the
Zealand region and the South Jutland region when going from onshore turbines to all turbines.
"#;

const CAPACITY_INTRO_MD: &str = r#"
The two figures below shows information about the correlation between capacity, efficiency and location.

The two figures are linked which means that you can select wind turbines in either of the figures and the other figure will show the corresponding wind turbines.

If you want to reset the selection you can double click in the figure and all wind turbines will be shown again.
"#;

const CAPACITY_MD: &str = r#"
In the figure at the top, you see the correlation between the Capacity (kW) and efficency % grouped by region. As observed in the histogram
in the Location tab, many wind turbines have an efficiency of around 21 %. It can be seen that higher Capacity (kW)
does not equal a higher efficiency.
We see a lot of low-capacity wind turbines with a capacity below 25 kW; these wind turbines are called household wind turbines.
The household wind turbines have a very wide spread efficiency from aroud 2% to around 77%. These wind turbines are not perticularly
interesting in regards to future wind turbines location because private people cannot choose where in the country they deploy
the wind turbine.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_tabs_homepage_first() {
        let index = tab_index();
        assert_eq!(index.len(), 5);
        assert_eq!(index[0].id, TabId::Homepage);
        assert_eq!(index[3].label, "Location");
    }

    #[test]
    fn tab_ids_round_trip() {
        for id in TAB_ORDER {
            assert_eq!(id.as_str().parse::<TabId>().unwrap(), id);
        }
        assert!("unknown".parse::<TabId>().is_err());
    }

    #[test]
    fn maps_tab_carries_radio_next_to_violin() {
        let content = tab_content(TabId::Maps);
        let violin_idx = content
            .blocks
            .iter()
            .position(|b| matches!(b, Block::Chart { chart: ChartId::EfficiencyViolin, .. }))
            .unwrap();
        assert!(matches!(content.blocks[violin_idx + 1], Block::Radio { .. }));
    }

    #[test]
    fn capacity_tab_holds_both_linked_charts() {
        let content = tab_content(TabId::Capacity);
        let charts: Vec<ChartId> = content
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Chart { chart, .. } => Some(*chart),
                _ => None,
            })
            .collect();
        assert_eq!(
            charts,
            vec![ChartId::CapacityEfficiency, ChartId::EfficiencyViolin]
        );
    }

    #[test]
    fn relevance_tab_splits_derived_charts_evenly() {
        let content = tab_content(TabId::Relevance);
        let widths: Vec<u8> = content
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Chart { width, .. } => Some(*width),
                _ => None,
            })
            .collect();
        assert_eq!(widths, vec![6, 6]);
    }

    #[test]
    fn block_json_is_tagged_by_kind() {
        let block = chart(ChartId::Map, 9);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["kind"], "chart");
        assert_eq!(json["chart"], "map");
        assert_eq!(json["width"], 9);
    }
}
