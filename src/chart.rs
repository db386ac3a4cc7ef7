//! Chart descriptions: transform fetched series into neutral
//! series/axis/palette structures. No plotting-library types appear
//! here; `render` translates these into Plotters calls and a UI layer
//! could translate them into any other charting surface.

use crate::models::Variable;
use crate::settings::ProbStyle;
use crate::state::{SeriesKind, Store};
use anyhow::{Result, bail};

/// Factor on the maximum density giving the climatology-member cluster
/// position.
pub const CLIMATOLOGY_OFFSET_FACTOR: f64 = -1.75;
/// Factor giving the last-ten-years cluster position.
pub const LAST_TEN_OFFSET_FACTOR: f64 = -1.625;
/// Factor giving the modified-member cluster position.
pub const MODIFIED_OFFSET_FACTOR: f64 = -1.25;
/// Factor giving the left edge of the x axis.
pub const AXIS_MIN_FACTOR: f64 = -2.0;

const THIN_LINE: f32 = 0.4;
const NORMAL_LINE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Background gradient stops for the PDF chart, top to bottom.
pub fn background_palette(variable: Variable) -> [Rgb; 3] {
    match variable {
        Variable::Temperature => [Rgb(255, 180, 190), Rgb(238, 238, 238), Rgb(155, 201, 229)],
        Variable::Precipitation => [Rgb(151, 179, 215), Rgb(238, 238, 238), Rgb(197, 175, 164)],
    }
}

/// Category colors, highest band first.
pub fn prob_palette(variable: Variable) -> [Rgb; 5] {
    match variable {
        Variable::Temperature => [
            Rgb(255, 0, 0),
            Rgb(255, 128, 128),
            Rgb(204, 204, 204),
            Rgb(128, 153, 230),
            Rgb(51, 102, 255),
        ],
        Variable::Precipitation => [
            Rgb(80, 127, 188),
            Rgb(128, 153, 230),
            Rgb(238, 238, 238),
            Rgb(174, 143, 128),
            Rgb(125, 95, 79),
        ],
    }
}

/// Category names, lowest band first.
pub const CATEGORY_LABELS: [&str; 5] = ["Lowest", "Low", "Middle", "High", "Highest"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Cross,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Line { width: f32 },
    Points { marker: Marker },
}

/// One drawable series: (x, y) pairs where x is the horizontal chart
/// position (negated density or a fixed cluster offset) and y is the
/// physical value.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: Option<String>,
    pub color: Rgb,
    pub geometry: Geometry,
    pub points: Vec<(f64, f64)>,
}

/// Fixed horizontal positions separating the member point clusters from
/// the density curves. All proportional to the maximum density so the
/// clusters keep their relative place as the PDFs change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOffsets {
    pub climatology: f64,
    pub last_ten: f64,
    pub modified: f64,
}

pub fn cluster_offsets(max_density: f64) -> ClusterOffsets {
    ClusterOffsets {
        climatology: CLIMATOLOGY_OFFSET_FACTOR * max_density,
        last_ten: LAST_TEN_OFFSET_FACTOR * max_density,
        modified: MODIFIED_OFFSET_FACTOR * max_density,
    }
}

/// The combined PDF/member/quintile chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfChart {
    pub title: String,
    pub x_min: f64,
    pub x_max: f64,
    pub background: [Rgb; 3],
    pub series: Vec<ChartSeries>,
    pub offsets: ClusterOffsets,
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Maximum density across the raw, modified and climatology PDFs.
pub fn max_density(store: &Store) -> f64 {
    let m = max_of(&store.series(SeriesKind::Climatology).pdf_vals)
        .max(max_of(&store.series(SeriesKind::Raw).pdf_vals))
        .max(max_of(&store.series(SeriesKind::Modified).pdf_vals));
    if m.is_finite() { m } else { 0.0 }
}

fn curve(pdf_vals: &[f64], pdf_points: &[f64]) -> Vec<(f64, f64)> {
    // Higher density extends further left: x = -density, y = value.
    pdf_vals
        .iter()
        .zip(pdf_points)
        .map(|(&d, &p)| (-d, p))
        .collect()
}

fn cluster(offset: f64, values: &[f64]) -> Vec<(f64, f64)> {
    values.iter().map(|&v| (offset, v)).collect()
}

/// Build the PDF/member chart description from the store's current
/// series. `clim_period` only feeds the climatology legend label.
pub fn pdf_chart(store: &Store, clim_period: [i32; 2]) -> PdfChart {
    let raw = store.series(SeriesKind::Raw);
    let modified = store.series(SeriesKind::Modified);
    let climatology = store.series(SeriesKind::Climatology);
    let last_ten = store.series(SeriesKind::LastTen);
    let variable = store.selection.variable;

    let m = max_density(store);
    let offsets = cluster_offsets(m);

    let black = Rgb(0, 0, 0);
    let magenta = Rgb(255, 0, 255);

    let mut series = vec![
        ChartSeries {
            label: Some(format!(
                "{:02}-{:02} climatology",
                clim_period[0] % 100,
                clim_period[1] % 100
            )),
            color: black,
            geometry: Geometry::Line { width: NORMAL_LINE },
            points: curve(&climatology.pdf_vals, &climatology.pdf_points),
        },
        ChartSeries {
            label: Some("Last 10 years".into()),
            color: Rgb(170, 170, 170),
            geometry: Geometry::Points {
                marker: Marker::Square,
            },
            points: cluster(offsets.last_ten, &last_ten.values),
        },
        ChartSeries {
            label: Some("Raw forecast".into()),
            color: Rgb(128, 128, 128),
            geometry: Geometry::Line { width: THIN_LINE },
            points: curve(&raw.pdf_vals, &raw.pdf_points),
        },
        ChartSeries {
            label: Some("Modified forecast".into()),
            color: magenta,
            geometry: Geometry::Line { width: NORMAL_LINE },
            points: curve(&modified.pdf_vals, &modified.pdf_points),
        },
        ChartSeries {
            label: None,
            color: black,
            geometry: Geometry::Points {
                marker: Marker::Cross,
            },
            points: cluster(offsets.climatology, &climatology.values),
        },
        ChartSeries {
            label: None,
            color: magenta,
            geometry: Geometry::Points {
                marker: Marker::Cross,
            },
            points: cluster(offsets.modified, &modified.values),
        },
    ];

    // Quintile boundary rules, from the left chart edge to x = 0.
    for &q in &climatology.quintiles {
        series.push(ChartSeries {
            label: None,
            color: black,
            geometry: Geometry::Line { width: THIN_LINE },
            points: vec![(-m, q), (0.0, q)],
        });
    }

    PdfChart {
        title: store.selection.title(),
        x_min: AXIS_MIN_FACTOR * m,
        x_max: 0.0,
        background: background_palette(variable),
        series,
        offsets,
    }
}

/// Which logical series a hovered point belongs to, identified by its
/// x position against the fixed cluster offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    ClimatologyMember,
    LastTenYear,
    ModifiedMember,
    Other,
}

pub fn classify_hover(x: f64, offsets: &ClusterOffsets) -> HoverTarget {
    if x == offsets.climatology {
        HoverTarget::ClimatologyMember
    } else if x == offsets.last_ten {
        HoverTarget::LastTenYear
    } else if x == offsets.modified {
        HoverTarget::ModifiedMember
    } else {
        HoverTarget::Other
    }
}

fn year_for(value: f64, values: &[f64], years: &[i32]) -> Option<i32> {
    let index = values.iter().position(|&v| v == value)?;
    years.get(index).copied()
}

/// Tooltip text for a hovered point: "value, year" for the climatology
/// and last-ten clusters (year looked up by the value's position in the
/// matching value list), plain "value" otherwise.
pub fn hover_label(x: f64, value: f64, store: &Store, clim_years: &[i32]) -> String {
    let offsets = cluster_offsets(max_density(store));
    let year = match classify_hover(x, &offsets) {
        HoverTarget::ClimatologyMember => year_for(
            value,
            &store.series(SeriesKind::Climatology).values,
            clim_years,
        ),
        HoverTarget::LastTenYear => year_for(
            value,
            &store.series(SeriesKind::LastTen).values,
            &store.last_ten_years,
        ),
        HoverTarget::ModifiedMember | HoverTarget::Other => None,
    };
    match year {
        Some(y) => format!("{:.2}, {}", value, y),
        None => format!("{:.2}", value),
    }
}

/// One bar of the categorical-probability bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbBar {
    pub category: &'static str,
    pub probability: f64,
    pub color: Rgb,
    /// Overlay text above the bar, rounded to the nearest percent.
    pub label: String,
}

/// One slice of the categorical-probability pie.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbSlice {
    pub category: &'static str,
    pub probability: f64,
    pub color: Rgb,
}

/// The categorical-probability chart, in one of its two mutually
/// exclusive styles.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbChart {
    /// Bars in fixed category order (lowest..highest) with y ticks at
    /// 10% increments from 0 to 70%.
    Bar {
        bars: Vec<ProbBar>,
        y_ticks: Vec<(f64, String)>,
    },
    /// Slices drawn highest band first.
    Pie { slices: Vec<ProbSlice> },
}

pub fn percent_label(probability: f64) -> String {
    format!("{:.0}%", probability * 100.0)
}

/// Build the categorical-probability chart from the five band
/// probabilities (lowest..highest order, as the server sends them).
pub fn prob_chart(probs: &[f64], variable: Variable, style: ProbStyle) -> Result<ProbChart> {
    if probs.len() != 5 {
        bail!("expected 5 category probabilities, got {}", probs.len());
    }
    let palette = prob_palette(variable);

    match style {
        ProbStyle::Bar => {
            let bars = (0..5)
                .map(|i| ProbBar {
                    category: CATEGORY_LABELS[i],
                    probability: probs[i],
                    // Palette runs highest-first, bars lowest-first.
                    color: palette[4 - i],
                    label: percent_label(probs[i]),
                })
                .collect();
            let y_ticks = (0..=7)
                .map(|i| {
                    let v = i as f64 / 10.0;
                    (v, format!("{}%", i * 10))
                })
                .collect();
            Ok(ProbChart::Bar { bars, y_ticks })
        }
        ProbStyle::Pie => {
            let slices = (0..5)
                .rev()
                .map(|i| ProbSlice {
                    category: CATEGORY_LABELS[i],
                    probability: probs[i],
                    color: palette[4 - i],
                })
                .collect();
            Ok(ProbChart::Pie { slices })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_proportional_to_max_density() {
        let offsets = cluster_offsets(0.4);
        assert_eq!(offsets.climatology, -0.7);
        assert_eq!(offsets.last_ten, -0.65);
        assert_eq!(offsets.modified, -0.5);
    }

    #[test]
    fn percent_labels_round_to_nearest() {
        assert_eq!(percent_label(0.434), "43%");
        assert_eq!(percent_label(0.436), "44%");
        assert_eq!(percent_label(0.0), "0%");
    }

    #[test]
    fn bar_chart_has_fixed_order_and_ticks() {
        let probs = vec![0.1, 0.15, 0.2, 0.25, 0.3];
        let ProbChart::Bar { bars, y_ticks } =
            prob_chart(&probs, Variable::Temperature, ProbStyle::Bar).unwrap()
        else {
            panic!("expected bar chart");
        };
        assert_eq!(bars[0].category, "Lowest");
        assert_eq!(bars[4].category, "Highest");
        // Highest band carries the first palette color.
        assert_eq!(bars[4].color, prob_palette(Variable::Temperature)[0]);
        assert_eq!(y_ticks.len(), 8);
        assert_eq!(y_ticks[0], (0.0, "0%".to_string()));
        assert_eq!(y_ticks[7], (0.7, "70%".to_string()));
    }

    #[test]
    fn pie_draws_highest_first() {
        let probs = vec![0.1, 0.15, 0.2, 0.25, 0.3];
        let ProbChart::Pie { slices } =
            prob_chart(&probs, Variable::Precipitation, ProbStyle::Pie).unwrap()
        else {
            panic!("expected pie chart");
        };
        assert_eq!(slices[0].category, "Highest");
        assert_eq!(slices[4].category, "Lowest");
    }

    #[test]
    fn wrong_category_count_is_rejected() {
        assert!(prob_chart(&[0.5, 0.5], Variable::Temperature, ProbStyle::Bar).is_err());
    }
}
