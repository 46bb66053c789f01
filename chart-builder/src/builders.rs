//! Stateless figure builders: rows + fixed field mapping in, `Figure` out.
//!
//! Region-grouped builders always emit one trace per entry of
//! `REGION_ORDER`, so category order and colors never depend on input row
//! order. Selectable charts attach row tags as `customdata`.

use turbine_core::geo::GeoPoint;
use turbine_core::{
    DimensionSample, EfficiencyJoinRow, EfficiencySample, Region, RowTag, SizeSample, YearPoint,
    REGION_ORDER,
};

use crate::figure::{
    Axis, AxisValue, Bins, BoxOverlay, Figure, Layout, LayoutImage, Marker, MarkerColor, Title,
    Trace, TraceKind,
};

/// Single-series trace color, matching the dashboard's house style.
pub const SOLO_COLOR: &str = "darkblue";
/// Violin y axis is pinned so the radio refilter never rescales it.
pub const VIOLIN_Y_RANGE: [f64; 2] = [0.0, 80.0];

/// Geographic bounding box the background raster is anchored to
/// (west, east, south, north), with the raster's own vertical offset folded in.
pub const MAP_WEST: f64 = 7.395_542_795_147_01;
pub const MAP_EAST: f64 = 15.289_272_812_025_047;
pub const MAP_SOUTH: f64 = 54.310_440_037_362_02;
pub const MAP_NORTH: f64 = 58.022_451_977_733_29;
pub const MAP_IMAGE_SOURCE: &str = "/assets/map.png";
pub const MAP_WIDTH: u32 = 1_000;
pub const MAP_HEIGHT: u32 = 700;

fn labeled_layout(title: &str, x_lab: &str, y_lab: &str) -> Layout {
    Layout {
        title: Some(title.into()),
        xaxis: Some(Axis::titled(x_lab)),
        yaxis: Some(Axis::titled(y_lab)),
        ..Default::default()
    }
}

/// Derived fixed-year series as a line+marker scatter.
pub fn derived_scatter(series: &[YearPoint], title: &str, x_lab: &str, y_lab: &str) -> Figure {
    let trace = Trace {
        kind: TraceKind::Scatter,
        mode: Some("lines+markers".to_string()),
        x: series.iter().map(|p| AxisValue::from(p.year)).collect(),
        y: series.iter().map(|p| AxisValue::from(p.value)).collect(),
        marker: Some(Marker {
            color: Some(MarkerColor::Uniform(SOLO_COLOR.to_string())),
            ..Default::default()
        }),
        ..Default::default()
    };
    Figure {
        data: vec![trace],
        layout: labeled_layout(title, x_lab, y_lab),
    }
}

/// Plain two-variable scatter, one uniform-color trace.
pub fn dimension_scatter(rows: &[DimensionSample], title: &str, x_lab: &str, y_lab: &str) -> Figure {
    let trace = Trace {
        kind: TraceKind::Scatter,
        mode: Some("markers".to_string()),
        x: rows.iter().map(|r| AxisValue::from(r.hub_height)).collect(),
        y: rows
            .iter()
            .map(|r| AxisValue::from(r.rotor_diameter))
            .collect(),
        marker: Some(Marker {
            color: Some(MarkerColor::Uniform(SOLO_COLOR.to_string())),
            ..Default::default()
        }),
        ..Default::default()
    };
    Figure {
        data: vec![trace],
        layout: labeled_layout(title, x_lab, y_lab),
    }
}

/// Capacity vs rotor diameter, continuously colored by hub height.
pub fn size_scatter(rows: &[SizeSample], title: &str, x_lab: &str, y_lab: &str) -> Figure {
    let trace = Trace {
        kind: TraceKind::Scatter,
        mode: Some("markers".to_string()),
        x: rows.iter().map(|r| AxisValue::from(r.capacity)).collect(),
        y: rows
            .iter()
            .map(|r| AxisValue::from(r.rotor_diameter))
            .collect(),
        customdata: rows.iter().map(|r| r.tag).collect(),
        marker: Some(Marker {
            color: Some(MarkerColor::PerPoint(
                rows.iter().map(|r| r.hub_height).collect(),
            )),
            colorscale: Some("Viridis".to_string()),
            showscale: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut layout = labeled_layout(title, x_lab, y_lab);
    layout.dragmode = Some("select".to_string());
    Figure {
        data: vec![trace],
        layout,
    }
}

/// Rows of the linked pair that survive the missing-value drop.
fn complete_join_rows(rows: &[EfficiencyJoinRow]) -> Vec<(RowTag, f64, f64, Region)> {
    rows.iter()
        .filter_map(|r| Some((r.tag, r.efficiency?, r.capacity?, r.region?)))
        .collect()
}

/// Capacity vs efficiency scatter, one trace per region in fixed order.
pub fn capacity_scatter(rows: &[EfficiencyJoinRow], title: &str, x_lab: &str, y_lab: &str) -> Figure {
    let complete = complete_join_rows(rows);
    let data = REGION_ORDER
        .iter()
        .map(|&region| {
            let members: Vec<_> = complete.iter().filter(|r| r.3 == region).collect();
            Trace {
                kind: TraceKind::Scatter,
                name: Some(region.as_str().to_string()),
                mode: Some("markers".to_string()),
                x: members.iter().map(|r| AxisValue::from(r.2)).collect(),
                y: members.iter().map(|r| AxisValue::from(r.1)).collect(),
                customdata: members.iter().map(|r| r.0).collect(),
                marker: Some(Marker {
                    color: Some(MarkerColor::Uniform(region.color().to_string())),
                    ..Default::default()
                }),
                ..Default::default()
            }
        })
        .collect();
    let mut layout = labeled_layout(title, x_lab, y_lab);
    layout.dragmode = Some("select".to_string());
    Figure { data, layout }
}

/// Efficiency histogram stacked by region.
///
/// Bin count follows the value spread divided by the requested bin width,
/// shared by every trace so the regions stack on common bins.
pub fn efficiency_histogram(
    rows: &[EfficiencySample],
    bin_width: f64,
    title: &str,
    x_lab: &str,
) -> Figure {
    let complete: Vec<(f64, Region)> = rows
        .iter()
        .filter_map(|r| Some((r.efficiency?, r.region?)))
        .collect();

    let nbins = {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (v, _) in &complete {
            min = min.min(*v);
            max = max.max(*v);
        }
        if complete.is_empty() || bin_width <= 0.0 {
            None
        } else {
            Some(((max - min) / bin_width) as u32)
        }
    };

    let data = REGION_ORDER
        .iter()
        .map(|&region| Trace {
            kind: TraceKind::Histogram,
            name: Some(region.as_str().to_string()),
            x: complete
                .iter()
                .filter(|(_, r)| *r == region)
                .map(|(v, _)| AxisValue::from(*v))
                .collect(),
            nbinsx: nbins,
            xbins: Some(Bins { size: bin_width }),
            marker: Some(Marker {
                color: Some(MarkerColor::Uniform(region.color().to_string())),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            title: Some(title.into()),
            xaxis: Some(Axis::titled(x_lab)),
            yaxis: Some(Axis::titled("Count")),
            barmode: Some("stack".to_string()),
            ..Default::default()
        },
    }
}

/// Efficiency distribution per region, box overlay on, fixed y range.
pub fn efficiency_violin(rows: &[EfficiencyJoinRow], title: &str, x_lab: &str, y_lab: &str) -> Figure {
    let complete = complete_join_rows(rows);
    let data = REGION_ORDER
        .iter()
        .map(|&region| {
            let members: Vec<_> = complete.iter().filter(|r| r.3 == region).collect();
            Trace {
                kind: TraceKind::Violin,
                name: Some(region.as_str().to_string()),
                x: members
                    .iter()
                    .map(|_| AxisValue::from(region.as_str()))
                    .collect(),
                y: members.iter().map(|r| AxisValue::from(r.1)).collect(),
                customdata: members.iter().map(|r| r.0).collect(),
                box_overlay: Some(BoxOverlay { visible: true }),
                marker: Some(Marker {
                    color: Some(MarkerColor::Uniform(region.color().to_string())),
                    ..Default::default()
                }),
                ..Default::default()
            }
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            title: Some(title.into()),
            xaxis: Some(Axis::titled(x_lab)),
            yaxis: Some(Axis {
                title: Some(Title::from(y_lab)),
                range: Some(VIOLIN_Y_RANGE),
            }),
            dragmode: Some("select".to_string()),
            ..Default::default()
        },
    }
}

/// Projected turbine positions over the country raster, colored by efficiency.
pub fn turbine_map(points: &[GeoPoint]) -> Figure {
    let trace = Trace {
        kind: TraceKind::Scatter,
        mode: Some("markers".to_string()),
        x: points.iter().map(|p| AxisValue::from(p.lon)).collect(),
        y: points.iter().map(|p| AxisValue::from(p.lat)).collect(),
        marker: Some(Marker {
            color: Some(MarkerColor::PerPoint(
                points.iter().map(|p| p.efficiency).collect(),
            )),
            colorscale: Some("Plasma".to_string()),
            opacity: Some(0.4),
            showscale: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };
    Figure {
        data: vec![trace],
        layout: Layout {
            xaxis: Some(Axis::titled("x")),
            yaxis: Some(Axis::titled("y")),
            width: Some(MAP_WIDTH),
            height: Some(MAP_HEIGHT),
            images: vec![LayoutImage {
                source: MAP_IMAGE_SOURCE.to_string(),
                xref: "x".to_string(),
                yref: "y".to_string(),
                x: MAP_WEST,
                y: MAP_NORTH,
                sizex: MAP_EAST - MAP_WEST,
                sizey: MAP_NORTH - MAP_SOUTH,
                sizing: "stretch".to_string(),
                opacity: 1.0,
                layer: "below".to_string(),
            }],
            ..Default::default()
        },
    }
}
