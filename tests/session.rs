//! End-to-end request choreography, driven through a recording backend
//! instead of a live endpoint.

use anyhow::{Result, bail};
use fcpdf_rs::api::{Backend, ExportRequest, LoadRequest, ModifyRequest};
use fcpdf_rs::models::{
    ClimatologyFull, ClimatologyView, LastTen, LoadPayload, ModifiedForecast, ModifyPayload,
    Month, Period, RawForecast, Variable,
};
use fcpdf_rs::state::SeriesKind;
use fcpdf_rs::{Selection, Session};
use std::cell::RefCell;
use std::rc::Rc;

type CallLog = Rc<RefCell<Vec<&'static str>>>;

struct Mock {
    calls: CallLog,
    fail_modify: bool,
}

impl Mock {
    fn new() -> (Self, CallLog) {
        let calls = CallLog::default();
        (
            Self {
                calls: Rc::clone(&calls),
                fail_modify: false,
            },
            calls,
        )
    }

    fn failing_modify() -> (Self, CallLog) {
        let (mut mock, calls) = Self::new();
        mock.fail_modify = true;
        (mock, calls)
    }
}

fn load_payload() -> LoadPayload {
    LoadPayload {
        raw_forecast: RawForecast {
            values: vec![21.3, 19.8, 20.5],
            mem_nums: vec![0, 1, 2],
            pdf_vals: vec![0.02, 0.31, 0.02],
            pdf_points: vec![18.0, 20.5, 23.0],
            quin_probs: vec![0.05, 0.15, 0.2, 0.35, 0.25],
        },
        climatology: ClimatologyFull {
            values: vec![19.9, 20.7],
            pdf_vals: vec![0.05, 0.25, 0.05],
            pdf_points: vec![18.0, 20.5, 23.0],
            quintiles: vec![19.2, 20.0, 20.8, 21.6],
        },
        last_ten: LastTen {
            values: vec![20.1, 20.9],
        },
    }
}

fn modify_payload() -> ModifyPayload {
    ModifyPayload {
        modified_forecast: ModifiedForecast {
            values: vec![23.0, 21.5, 22.2],
            pdf_vals: vec![0.01, 0.28, 0.04],
            pdf_points: vec![19.0, 22.0, 25.0],
            quin_probs: vec![0.02, 0.08, 0.15, 0.35, 0.4],
        },
        climatology: ClimatologyView {
            pdf_vals: vec![0.05, 0.25, 0.05],
            pdf_points: vec![19.0, 22.0, 25.0],
            quintiles: vec![19.2, 20.0, 20.8, 21.6],
        },
    }
}

impl Backend for Mock {
    fn load(&self, _request: &LoadRequest) -> Result<LoadPayload> {
        self.calls.borrow_mut().push("load");
        Ok(load_payload())
    }

    fn modify(&self, _request: &ModifyRequest) -> Result<ModifyPayload> {
        self.calls.borrow_mut().push("modify");
        if self.fail_modify {
            bail!("No response from the forecast server.");
        }
        Ok(modify_payload())
    }

    fn export(&self, _request: &ExportRequest) -> Result<String> {
        self.calls.borrow_mut().push("export");
        Ok("/data/exports/t2m_Jan2016.json".to_string())
    }
}

#[test]
fn import_loads_the_default_dataset() {
    let (mock, calls) = Mock::new();
    let mut session = Session::new(mock);

    session.import(Month::Jan, "2016").unwrap();

    assert!(session.loaded());
    assert_eq!(session.selection(), Selection::default());
    assert_eq!(session.title, "Temperature forecast. Issued Jan 2016");
    assert_eq!(*calls.borrow(), vec!["load"]);
    // Before any recompute the modified forecast is the raw one.
    assert_eq!(
        session.store.series(SeriesKind::Modified).values,
        session.store.series(SeriesKind::Raw).values
    );
}

#[test]
fn bad_issue_year_never_reaches_the_server() {
    let (mock, calls) = Mock::new();
    let mut session = Session::new(mock);

    let err = session.import(Month::Jan, "16").unwrap_err();
    assert_eq!(err.to_string(), "Year must contain 4 digits.");
    assert!(!session.loaded());
    assert!(calls.borrow().is_empty());
}

#[test]
fn switching_with_default_modifiers_is_one_request() {
    let (mock, calls) = Mock::new();
    let mut session = Session::new(mock);
    session.import(Month::Jan, "2016").unwrap();

    session
        .select(Period::Seasonal, Variable::Precipitation)
        .unwrap();

    assert_eq!(*calls.borrow(), vec!["load", "load"]);
    assert_eq!(session.title, "Precipitation forecast. Issued Jan 2016");
}

#[test]
fn returning_to_a_modified_dataset_recomputes_automatically() {
    let (mock, calls) = Mock::new();
    let mut session = Session::new(mock);
    session.import(Month::Jan, "2016").unwrap();

    // Modify the starting dataset, then leave and come back.
    session
        .set_modifiers_from_fields("1.5", "", "", &[])
        .unwrap();
    session.update().unwrap();
    session.select(Period::Seasonal, Variable::Temperature).unwrap();
    session.select(Period::Monthly, Variable::Temperature).unwrap();

    // import, modify, plain switch, then load + automatic recompute.
    assert_eq!(
        *calls.borrow(),
        vec!["load", "modify", "load", "load", "modify"]
    );
    assert_eq!(session.modifiers.spread, 1.5);
    assert_eq!(
        session.store.series(SeriesKind::Modified).values,
        vec![23.0, 21.5, 22.2]
    );
}

#[test]
fn switching_back_restores_saved_modifier_fields() {
    let (mock, _calls) = Mock::new();
    let mut session = Session::new(mock);
    session.import(Month::Jan, "2016").unwrap();

    session
        .set_modifiers_from_fields("2", "0.5", "10", &[])
        .unwrap();
    session.select(Period::Monthly, Variable::Precipitation).unwrap();
    assert_eq!(session.modifiers.spread, 1.0);

    session.select(Period::Monthly, Variable::Temperature).unwrap();
    assert_eq!(session.modifiers.spread, 2.0);
    assert_eq!(session.modifiers.shift, 0.5);
    assert_eq!(session.modifiers.blend, 10.0);
}

#[test]
fn failed_recompute_keeps_state_and_surfaces_message() {
    let (mock, _calls) = Mock::failing_modify();
    let mut session = Session::new(mock);
    session.import(Month::Jan, "2016").unwrap();
    session
        .set_modifiers_from_fields("1.5", "", "", &[])
        .unwrap();
    let before = session.store.series(SeriesKind::Modified).clone();

    let err = session.update().unwrap_err();
    assert_eq!(err.to_string(), "No response from the forecast server.");
    assert_eq!(session.title, "No response from the forecast server.");
    assert_eq!(session.store.series(SeriesKind::Modified), &before);
}

#[test]
fn update_before_any_import_is_rejected() {
    let (mock, calls) = Mock::new();
    let mut session = Session::new(mock);
    assert!(session.update().is_err());
    assert!(session.export().is_err());
    assert!(calls.borrow().is_empty());
}

#[test]
fn export_surfaces_the_destination_path() {
    let (mock, calls) = Mock::new();
    let mut session = Session::new(mock);
    session.import(Month::Jan, "2016").unwrap();

    let path = session.export().unwrap();
    assert_eq!(path, "/data/exports/t2m_Jan2016.json");
    assert_eq!(session.title, "Data saved in: /data/exports/t2m_Jan2016.json");
    assert_eq!(*calls.borrow(), vec!["load", "export"]);
}

#[test]
fn overwrite_fields_respect_member_count() {
    let (mock, _calls) = Mock::new();
    let mut session = Session::new(mock);
    session.import(Month::Jan, "2016").unwrap();

    // Three members loaded; a fourth field is ignored.
    let fields = vec![
        String::new(),
        "22.5".to_string(),
        String::new(),
        "99.0".to_string(),
    ];
    session
        .set_modifiers_from_fields("", "", "", &fields)
        .unwrap();
    assert_eq!(session.modifiers.overwrites.len(), 1);
    assert_eq!(session.modifiers.overwrites[0].index, 1);
}
