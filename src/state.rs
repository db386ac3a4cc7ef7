//! In-memory store of the currently selected dataset and the series
//! fetched for it. A passive holder: writes are visible to the renderers
//! on their next call, nothing is diffed or observed.

use crate::models::{LoadPayload, ModifyPayload, Selection};
use chrono::Datelike;

/// Which logical series a store slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Raw,
    Modified,
    Climatology,
    LastTen,
}

/// One fetched series: ensemble member values plus, where the server
/// provides them, the estimated density curve and the quintile view.
/// Unused parts stay empty (the raw series has no quintiles, the
/// last-ten series has values only).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesData {
    pub values: Vec<f64>,
    /// Probability densities, aligned with `pdf_points`.
    pub pdf_vals: Vec<f64>,
    /// Physical values the densities were sampled at.
    pub pdf_points: Vec<f64>,
    /// Four boundary values splitting climatology into five bands.
    pub quintiles: Vec<f64>,
    /// Five categorical probabilities, lowest to highest.
    pub quin_probs: Vec<f64>,
}

/// The application's data state: active selection plus the four series
/// slots and their labels.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub selection: Selection,
    raw: SeriesData,
    modified: SeriesData,
    climatology: SeriesData,
    last_ten: SeriesData,
    /// Ensemble member numbers, aligned with the raw value order.
    pub member_numbers: Vec<u32>,
    /// Year labels for the last-ten series, aligned by position.
    pub last_ten_years: Vec<i32>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            last_ten_years: last_ten_years(chrono::Local::now().year()),
            ..Self::default()
        }
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn apply_series(&mut self, kind: SeriesKind, data: SeriesData) {
        *self.slot_mut(kind) = data;
    }

    pub fn series(&self, kind: SeriesKind) -> &SeriesData {
        match kind {
            SeriesKind::Raw => &self.raw,
            SeriesKind::Modified => &self.modified,
            SeriesKind::Climatology => &self.climatology,
            SeriesKind::LastTen => &self.last_ten,
        }
    }

    fn slot_mut(&mut self, kind: SeriesKind) -> &mut SeriesData {
        match kind {
            SeriesKind::Raw => &mut self.raw,
            SeriesKind::Modified => &mut self.modified,
            SeriesKind::Climatology => &mut self.climatology,
            SeriesKind::LastTen => &mut self.last_ten,
        }
    }

    /// Install a fresh `load_data` payload. Until a recompute runs, the
    /// unmodified forecast *is* the modified one, so the raw values and
    /// distribution are copied into the modified slot as the initial
    /// condition.
    pub fn apply_load(&mut self, payload: LoadPayload) {
        let LoadPayload {
            raw_forecast,
            climatology,
            last_ten,
        } = payload;

        self.member_numbers = raw_forecast.mem_nums;
        self.raw = SeriesData {
            values: raw_forecast.values.clone(),
            pdf_vals: raw_forecast.pdf_vals.clone(),
            pdf_points: raw_forecast.pdf_points.clone(),
            ..SeriesData::default()
        };
        self.modified = SeriesData {
            values: raw_forecast.values,
            pdf_vals: raw_forecast.pdf_vals,
            pdf_points: raw_forecast.pdf_points,
            quintiles: Vec::new(),
            quin_probs: raw_forecast.quin_probs,
        };
        self.climatology = SeriesData {
            values: climatology.values,
            pdf_vals: climatology.pdf_vals,
            pdf_points: climatology.pdf_points,
            quintiles: climatology.quintiles,
            quin_probs: Vec::new(),
        };
        self.last_ten = SeriesData {
            values: last_ten.values,
            ..SeriesData::default()
        };
    }

    /// Install a `modify_data` payload: the modified slot is replaced
    /// wholesale and the climatology distribution view is refreshed.
    /// Raw members, climatology values and the last-ten series stay
    /// untouched.
    pub fn apply_modify(&mut self, payload: ModifyPayload) {
        let ModifyPayload {
            modified_forecast,
            climatology,
        } = payload;

        self.modified = SeriesData {
            values: modified_forecast.values,
            pdf_vals: modified_forecast.pdf_vals,
            pdf_points: modified_forecast.pdf_points,
            quintiles: Vec::new(),
            quin_probs: modified_forecast.quin_probs,
        };
        self.climatology.pdf_vals = climatology.pdf_vals;
        self.climatology.pdf_points = climatology.pdf_points;
        self.climatology.quintiles = climatology.quintiles;
    }

    /// Number of ensemble members in the active modified forecast.
    pub fn member_count(&self) -> usize {
        self.modified.values.len()
    }
}

/// The ten calendar years preceding `this_year`, ascending.
pub fn last_ten_years(this_year: i32) -> Vec<i32> {
    (this_year - 10..this_year).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ClimatologyFull, ClimatologyView, LastTen, ModifiedForecast, RawForecast,
    };

    fn load_payload() -> LoadPayload {
        LoadPayload {
            raw_forecast: RawForecast {
                values: vec![5.0, 4.0, 3.0],
                mem_nums: vec![0, 1, 2],
                pdf_vals: vec![0.1, 0.3, 0.1],
                pdf_points: vec![2.0, 4.0, 6.0],
                quin_probs: vec![0.2; 5],
            },
            climatology: ClimatologyFull {
                values: vec![4.5, 3.5],
                pdf_vals: vec![0.2, 0.2, 0.2],
                pdf_points: vec![2.0, 4.0, 6.0],
                quintiles: vec![2.5, 3.5, 4.5, 5.5],
            },
            last_ten: LastTen {
                values: vec![4.4, 3.7],
            },
        }
    }

    #[test]
    fn load_copies_raw_into_modified() {
        let mut store = Store::default();
        store.apply_load(load_payload());

        assert_eq!(
            store.series(SeriesKind::Raw).values,
            store.series(SeriesKind::Modified).values
        );
        assert_eq!(store.series(SeriesKind::Modified).quin_probs.len(), 5);
        assert!(store.series(SeriesKind::Raw).quin_probs.is_empty());
        assert_eq!(store.member_count(), 3);
        assert_eq!(store.member_numbers, vec![0, 1, 2]);
    }

    #[test]
    fn modify_replaces_only_modified_and_climatology_view() {
        let mut store = Store::default();
        store.apply_load(load_payload());
        let raw_before = store.series(SeriesKind::Raw).clone();
        let clim_values_before = store.series(SeriesKind::Climatology).values.clone();
        let last_ten_before = store.series(SeriesKind::LastTen).clone();

        store.apply_modify(ModifyPayload {
            modified_forecast: ModifiedForecast {
                values: vec![9.0, 8.0, 7.0],
                pdf_vals: vec![0.05, 0.4, 0.05],
                pdf_points: vec![3.0, 6.0, 9.0],
                quin_probs: vec![0.1, 0.1, 0.2, 0.3, 0.3],
            },
            climatology: ClimatologyView {
                pdf_vals: vec![0.3, 0.1, 0.3],
                pdf_points: vec![3.0, 6.0, 9.0],
                quintiles: vec![3.0, 4.0, 5.0, 6.0],
            },
        });

        assert_eq!(store.series(SeriesKind::Raw), &raw_before);
        assert_eq!(
            store.series(SeriesKind::Climatology).values,
            clim_values_before
        );
        assert_eq!(store.series(SeriesKind::LastTen), &last_ten_before);
        assert_eq!(store.series(SeriesKind::Modified).values, vec![9.0, 8.0, 7.0]);
        assert_eq!(
            store.series(SeriesKind::Climatology).quintiles,
            vec![3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn apply_series_is_visible_immediately() {
        let mut store = Store::default();
        let data = SeriesData {
            values: vec![1.0],
            ..SeriesData::default()
        };
        store.apply_series(SeriesKind::LastTen, data.clone());
        assert_eq!(store.series(SeriesKind::LastTen), &data);
    }

    #[test]
    fn ten_years_before_now() {
        let years = last_ten_years(2026);
        assert_eq!(years.len(), 10);
        assert_eq!(years.first(), Some(&2016));
        assert_eq!(years.last(), Some(&2025));
    }
}
