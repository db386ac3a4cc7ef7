//! Render chart descriptions to **SVG** or **PNG** with plotters.
//!
//! The output backend is chosen from the file extension: `.svg` uses the
//! SVG backend, everything else the bitmap backend. All layout decisions
//! (series order, colors, cluster offsets, axis bounds) were already made
//! by [`crate::chart`]; this module only translates them into drawing
//! calls.

use crate::chart::{Geometry, Marker, PdfChart, ProbChart, Rgb};
use anyhow::{Result, anyhow};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::path::Path;
use std::sync::Once;

/// One-time registration of a "sans-serif" face for the `ab_glyph` text
/// path, which does not discover OS fonts by itself. The first readable
/// candidate wins; without one, text drawing reports a font error.
static INIT_FONTS: Once = Once::new();

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        for path in FONT_CANDIDATES {
            if let Ok(bytes) = std::fs::read(path) {
                let _ = plotters::style::register_font(
                    "sans-serif",
                    plotters::style::FontStyle::Normal,
                    Box::leak(bytes.into_boxed_slice()),
                );
                return;
            }
        }
    });
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

/// Render the PDF/member chart to `out_path`.
pub fn render_pdf_chart<P: AsRef<Path>>(
    chart: &PdfChart,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_pdf_chart(root, chart)
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_pdf_chart(root, chart)
    }
}

fn draw_pdf_chart<DB>(root: DrawingArea<DB, Shift>, chart: &PdfChart) -> Result<()>
where
    DB: DrawingBackend,
{
    let values: Vec<f64> = chart
        .series
        .iter()
        .flat_map(|s| s.points.iter().map(|&(_, y)| y))
        .filter(|y| y.is_finite())
        .collect();
    if values.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    let (mut y_min, mut y_max) = (
        values.iter().cloned().fold(f64::INFINITY, f64::min),
        values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    );
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = (y_max - y_min) * 0.05;
    let (y_min, y_max) = (y_min - pad, y_max + pad);

    root.fill(&WHITE).map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let mut ctx = ChartBuilder::on(&root)
        .margin(16u32)
        .caption(&chart.title, (FontFamily::SansSerif, 24))
        .set_label_area_size(LabelAreaPosition::Left, 56)
        .set_label_area_size(LabelAreaPosition::Bottom, 24)
        .build_cartesian_2d(chart.x_min..chart.x_max, y_min..y_max)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    // Gradient-style background: three equal horizontal bands, top stop
    // first.
    let band = (y_max - y_min) / 3.0;
    for (i, &stop) in chart.background.iter().enumerate() {
        let top = y_max - band * i as f64;
        let rect = Rectangle::new(
            [(chart.x_min, top - band), (chart.x_max, top)],
            color(stop).mix(0.6).filled(),
        );
        ctx.draw_series(std::iter::once(rect))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }

    // The x axis is density-derived and carries no meaning for readers,
    // so only y labels are drawn.
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_labels(10)
        .label_style((FontFamily::SansSerif, 12))
        .draw()
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    for series in &chart.series {
        let c = color(series.color);
        match series.geometry {
            Geometry::Line { width } => {
                let stroke = c.stroke_width(width.max(1.0).round() as u32);
                let drawn = ctx
                    .draw_series(LineSeries::new(series.points.iter().cloned(), stroke))
                    .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                if let Some(ref label) = series.label {
                    drawn.label(label).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 18, y)], c.stroke_width(2))
                    });
                }
            }
            Geometry::Points { marker } => {
                let drawn = match marker {
                    Marker::Cross => ctx.draw_series(
                        series
                            .points
                            .iter()
                            .map(|&p| Cross::new(p, 3, c.stroke_width(2))),
                    ),
                    Marker::Square => ctx.draw_series(series.points.iter().map(|&p| {
                        EmptyElement::at(p) + Rectangle::new([(-3, -3), (3, 3)], c.filled())
                    })),
                }
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                if let Some(ref label) = series.label {
                    drawn.label(label).legend(move |(x, y)| {
                        Rectangle::new([(x + 4, y - 4), (x + 12, y + 4)], c.filled())
                    });
                }
            }
        }
    }

    ctx.configure_series_labels()
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.85))
        .label_font((FontFamily::SansSerif, 14))
        .draw()
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    root.present().map_err(|e| anyhow::anyhow!("{:?}", e))?;
    Ok(())
}

/// Render the categorical-probability chart to `out_path`.
pub fn render_prob_chart<P: AsRef<Path>>(
    chart: &ProbChart,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_prob_chart(root, chart, width, height)
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_prob_chart(root, chart, width, height)
    }
}

fn draw_prob_chart<DB>(
    root: DrawingArea<DB, Shift>,
    chart: &ProbChart,
    width: u32,
    height: u32,
) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow::anyhow!("{:?}", e))?;

    match chart {
        ProbChart::Bar { bars, y_ticks } => {
            let y_top = y_ticks.last().map(|&(v, _)| v).unwrap_or(0.7);
            let categories: Vec<&str> = bars.iter().map(|b| b.category).collect();

            let mut ctx = ChartBuilder::on(&root)
                .margin(16u32)
                .caption("Forecast Probabilities", (FontFamily::SansSerif, 24))
                .set_label_area_size(LabelAreaPosition::Left, 48)
                .set_label_area_size(LabelAreaPosition::Bottom, 32)
                .build_cartesian_2d(-0.5f64..4.5f64, 0.0f64..y_top)
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;

            ctx.configure_mesh()
                .disable_x_mesh()
                .x_labels(categories.len())
                .x_label_formatter(&|x: &f64| {
                    let i = x.round() as usize;
                    categories.get(i).copied().unwrap_or("").to_string()
                })
                .y_labels(y_ticks.len())
                .y_label_formatter(&|v: &f64| format!("{:.0}%", v * 100.0))
                .label_style((FontFamily::SansSerif, 12))
                .draw()
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;

            let label_style = TextStyle::from((FontFamily::SansSerif, 14).into_font())
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            for (i, bar) in bars.iter().enumerate() {
                let x = i as f64;
                let rect = Rectangle::new(
                    [(x - 0.4, 0.0), (x + 0.4, bar.probability)],
                    color(bar.color).filled(),
                );
                ctx.draw_series(std::iter::once(rect))
                    .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                ctx.draw_series(std::iter::once(Text::new(
                    bar.label.clone(),
                    (x, bar.probability + y_top * 0.01),
                    label_style.clone(),
                )))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            }
        }
        ProbChart::Pie { slices } => {
            let root = root
                .titled("Forecast Probabilities", (FontFamily::SansSerif, 24))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            let sizes: Vec<f64> = slices.iter().map(|s| s.probability).collect();
            let colors: Vec<RGBColor> = slices.iter().map(|s| color(s.color)).collect();
            let labels: Vec<String> = slices.iter().map(|s| s.category.to_string()).collect();

            let center = ((width / 2) as i32, (height / 2) as i32);
            let radius = (width.min(height) as f64) * 0.35;
            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.label_style((FontFamily::SansSerif, 14).into_text_style(&root));
            root.draw(&pie).map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
    }

    root.present().map_err(|e| anyhow::anyhow!("{:?}", e))?;
    Ok(())
}
