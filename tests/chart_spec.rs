//! Geometry of the chart descriptions: cluster offsets, axis bounds,
//! negated-density curves, quintile rules and hover labels.

use fcpdf_rs::chart::{
    self, Geometry, HoverTarget, Marker, background_palette, classify_hover, cluster_offsets,
    max_density, pdf_chart, prob_palette, Rgb,
};
use fcpdf_rs::models::{
    ClimatologyFull, LastTen, LoadPayload, Period, RawForecast, Selection, Variable,
};
use fcpdf_rs::state::Store;

fn sample_store() -> Store {
    let mut store = Store::default();
    store.last_ten_years = (2016..2026).collect();
    store.apply_load(LoadPayload {
        raw_forecast: RawForecast {
            values: vec![21.3, 19.8, 20.5],
            mem_nums: vec![0, 1, 2],
            pdf_vals: vec![0.02, 0.31, 0.02],
            pdf_points: vec![18.0, 20.5, 23.0],
            quin_probs: vec![0.05, 0.15, 0.2, 0.35, 0.25],
        },
        climatology: ClimatologyFull {
            values: vec![19.9, 20.7],
            pdf_vals: vec![0.05, 0.4, 0.05],
            pdf_points: vec![18.0, 20.5, 23.0],
            quintiles: vec![19.2, 20.0, 20.8, 21.6],
        },
        last_ten: LastTen {
            values: vec![20.1, 20.9],
        },
    });
    store
}

#[test]
fn clusters_sit_at_fixed_fractions_of_max_density() {
    let store = sample_store();
    // Climatology peaks at 0.4, above both forecast curves.
    let m = max_density(&store);
    assert_eq!(m, 0.4);

    let offsets = cluster_offsets(m);
    assert_eq!(offsets.climatology, -1.75 * m);
    assert_eq!(offsets.last_ten, -1.625 * m);
    assert_eq!(offsets.modified, -1.25 * m);
    // Clusters stay left of every curve point and right of the axis edge.
    assert!(offsets.climatology > -2.0 * m);
    assert!(offsets.climatology < offsets.last_ten);
    assert!(offsets.last_ten < offsets.modified);
    assert!(offsets.modified < -m);
}

#[test]
fn axis_spans_twice_the_max_density() {
    let store = sample_store();
    let description = pdf_chart(&store, [1981, 2010]);
    assert_eq!(description.x_min, -0.8);
    assert_eq!(description.x_max, 0.0);
    assert_eq!(description.title, "1 Month Temp");
}

#[test]
fn curves_plot_negated_density_against_value() {
    let store = sample_store();
    let description = pdf_chart(&store, [1981, 2010]);

    let clim = description
        .series
        .iter()
        .find(|s| s.label.as_deref() == Some("81-10 climatology"))
        .unwrap();
    assert_eq!(clim.points, vec![(-0.05, 18.0), (-0.4, 20.5), (-0.05, 23.0)]);
    assert!(matches!(clim.geometry, Geometry::Line { .. }));

    let raw = description
        .series
        .iter()
        .find(|s| s.label.as_deref() == Some("Raw forecast"))
        .unwrap();
    assert_eq!(raw.points[1], (-0.31, 20.5));
}

#[test]
fn member_clusters_are_vertical_point_columns() {
    let store = sample_store();
    let description = pdf_chart(&store, [1981, 2010]);
    let offsets = description.offsets;

    let clusters: Vec<_> = description
        .series
        .iter()
        .filter(|s| matches!(s.geometry, Geometry::Points { marker: Marker::Cross }))
        .collect();
    assert_eq!(clusters.len(), 2);
    // Climatology members at their offset, modified members at theirs.
    assert!(clusters[0]
        .points
        .iter()
        .all(|&(x, _)| x == offsets.climatology));
    assert!(clusters[1]
        .points
        .iter()
        .all(|&(x, _)| x == offsets.modified));

    let last_ten = description
        .series
        .iter()
        .find(|s| matches!(s.geometry, Geometry::Points { marker: Marker::Square }))
        .unwrap();
    assert_eq!(last_ten.points, vec![(offsets.last_ten, 20.1), (offsets.last_ten, 20.9)]);
}

#[test]
fn four_quintile_rules_span_curve_region_only() {
    let store = sample_store();
    let description = pdf_chart(&store, [1981, 2010]);
    let m = max_density(&store);

    let rules: Vec<_> = description
        .series
        .iter()
        .filter(|s| s.label.is_none() && matches!(s.geometry, Geometry::Line { .. }))
        .collect();
    assert_eq!(rules.len(), 4);
    for (rule, quintile) in rules.iter().zip([19.2, 20.0, 20.8, 21.6]) {
        assert_eq!(rule.points, vec![(-m, quintile), (0.0, quintile)]);
    }
}

#[test]
fn legend_reflects_the_climatology_period() {
    let store = sample_store();
    let description = pdf_chart(&store, [1991, 2020]);
    assert!(description
        .series
        .iter()
        .any(|s| s.label.as_deref() == Some("91-20 climatology")));
}

#[test]
fn background_depends_on_variable() {
    let temp = background_palette(Variable::Temperature);
    let precip = background_palette(Variable::Precipitation);
    assert_ne!(temp[0], precip[0]);
    // Both share the neutral middle band.
    assert_eq!(temp[1], Rgb(238, 238, 238));
    assert_eq!(temp[1], precip[1]);

    let mut store = sample_store();
    store.set_selection(Selection::new(Period::Monthly, Variable::Precipitation));
    let description = pdf_chart(&store, [1981, 2010]);
    assert_eq!(description.background, precip);
}

#[test]
fn prob_palettes_run_warm_to_cool_for_temperature() {
    let temp = prob_palette(Variable::Temperature);
    assert_eq!(temp[0], Rgb(255, 0, 0));
    assert_eq!(temp[4], Rgb(51, 102, 255));
}

#[test]
fn rendering_an_empty_chart_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.png");
    let description = pdf_chart(&Store::default(), [1981, 2010]);
    let err = fcpdf_rs::render::render_pdf_chart(&description, &path, 640, 480).unwrap_err();
    assert!(err.to_string().contains("no data"));
}

#[test]
fn hover_identifies_clusters_by_offset() {
    let store = sample_store();
    let offsets = cluster_offsets(max_density(&store));

    assert_eq!(
        classify_hover(offsets.climatology, &offsets),
        HoverTarget::ClimatologyMember
    );
    assert_eq!(
        classify_hover(offsets.last_ten, &offsets),
        HoverTarget::LastTenYear
    );
    assert_eq!(
        classify_hover(offsets.modified, &offsets),
        HoverTarget::ModifiedMember
    );
    assert_eq!(classify_hover(-0.123, &offsets), HoverTarget::Other);
}

#[test]
fn hover_labels_append_years_by_position() {
    let store = sample_store();
    let offsets = cluster_offsets(max_density(&store));
    let clim_years: Vec<i32> = (1981..=2010).collect();

    // Second climatology member pairs with the second climatology year.
    assert_eq!(
        chart::hover_label(offsets.climatology, 20.7, &store, &clim_years),
        "20.70, 1982"
    );
    // Last-ten values pair with the trailing ten calendar years.
    assert_eq!(
        chart::hover_label(offsets.last_ten, 20.9, &store, &clim_years),
        "20.90, 2017"
    );
    // Modified members and curve points carry no year.
    assert_eq!(
        chart::hover_label(offsets.modified, 21.3, &store, &clim_years),
        "21.30"
    );
    assert_eq!(chart::hover_label(-0.2, 20.5, &store, &clim_years), "20.50");
}
