//! The coordinating component: owns the store, settings, live modifiers
//! and the modifier bank, and routes every user action through explicit
//! methods. UI layers only collect field values and display the title
//! and series this session exposes, so the whole request/response
//! choreography is testable without any widget toolkit.

use crate::api::{Backend, ExportRequest, LoadRequest, ModifyRequest};
use crate::models::{IssueDate, Month, Period, Selection, Variable};
use crate::modifiers::{ModifierBank, Modifiers, parse_overwrites};
use crate::settings::{Settings, SettingsForm, ValidationError, parse_issue_year};
use crate::state::Store;
use anyhow::{Result, bail};

pub struct Session<B> {
    backend: B,
    pub store: Store,
    pub settings: Settings,
    /// Modifiers currently shown in the input fields.
    pub modifiers: Modifiers,
    bank: ModifierBank,
    pub issue: Option<IssueDate>,
    /// Page-title text: the dataset description, an export destination,
    /// or a server failure message.
    pub title: String,
    loaded: bool,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            store: Store::new(),
            settings: Settings::default(),
            modifiers: Modifiers::default(),
            bank: ModifierBank::default(),
            issue: None,
            title: String::new(),
            loaded: false,
        }
    }

    /// Whether a dataset has been imported; update/export and the
    /// dataset buttons stay disabled until this is true.
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn selection(&self) -> Selection {
        self.store.selection
    }

    /// Import dialog action: validate the year field, set the issue
    /// date, and load the starting dataset (monthly temperature).
    pub fn import(&mut self, month: Month, year_field: &str) -> Result<(), ValidationError> {
        let year = parse_issue_year(year_field)?;
        self.issue = Some(IssueDate { month, year });
        self.store.set_selection(Selection::default());
        // Server failures are surfaced through the title, not the dialog.
        let _ = self.load(false);
        Ok(())
    }

    /// Dataset-button action: save the outgoing selection's modifiers,
    /// restore the incoming one's, fetch, and recompute immediately when
    /// the restored modifiers are non-default so previous modifications
    /// become visible again.
    pub fn select(&mut self, period: Period, variable: Variable) -> Result<()> {
        self.bank.save(self.store.selection, &self.modifiers);
        self.store.set_selection(Selection::new(period, variable));
        let pending = self.bank.load(self.store.selection, &mut self.modifiers);
        self.load(pending)
    }

    fn load(&mut self, follow_with_modify: bool) -> Result<()> {
        let Some(issue) = self.issue else {
            bail!("no forecast issue date has been imported");
        };
        let request = LoadRequest::new(self.store.selection, issue, &self.settings);
        match self.backend.load(&request) {
            Ok(payload) => {
                self.store.apply_load(payload);
                self.loaded = true;
                self.refresh_title();
            }
            Err(err) => return Err(self.surface(err)),
        }
        if follow_with_modify {
            self.update()?;
        }
        Ok(())
    }

    /// Update-button action: recompute the modified forecast from the
    /// live modifiers. Only the modified and climatology-view slices are
    /// replaced on success; a failure leaves everything untouched.
    pub fn update(&mut self) -> Result<()> {
        if !self.loaded {
            bail!("no data loaded");
        }
        let request = ModifyRequest::new(&self.store, &self.modifiers, &self.settings);
        match self.backend.modify(&request) {
            Ok(payload) => {
                self.store.apply_modify(payload);
                self.refresh_title();
                Ok(())
            }
            Err(err) => Err(self.surface(err)),
        }
    }

    /// Read the modifier input fields into the live modifiers. Blank
    /// spread/shift/blend fields mean their defaults; blank overwrite
    /// fields record no overwrite.
    pub fn set_modifiers_from_fields(
        &mut self,
        spread: &str,
        shift: &str,
        blend: &str,
        overwrite_fields: &[String],
    ) -> Result<()> {
        self.modifiers = Modifiers {
            spread: parse_or_default(spread, 1.0, "spread")?,
            shift: parse_or_default(shift, 0.0, "shift")?,
            blend: parse_or_default(blend, 0.0, "blend")?,
            overwrites: parse_overwrites(overwrite_fields, self.store.member_count())?,
        };
        Ok(())
    }

    /// Export-button action: ask the server to persist the displayed
    /// data; the destination path is surfaced through the title.
    pub fn export(&mut self) -> Result<String> {
        if !self.loaded {
            bail!("no data loaded");
        }
        let Some(issue) = self.issue else {
            bail!("no forecast issue date has been imported");
        };
        let request = ExportRequest::new(self.store.selection, issue, &self.store);
        match self.backend.export(&request) {
            Ok(path) => {
                self.title = format!("Data saved in: {}", path);
                Ok(path)
            }
            Err(err) => Err(self.surface(err)),
        }
    }

    /// Settings dialog action: commit atomically or report every
    /// violated constraint without changing anything.
    pub fn save_settings(&mut self, form: &SettingsForm) -> Result<(), ValidationError> {
        self.settings = form.validate()?;
        Ok(())
    }

    fn refresh_title(&mut self) {
        if let Some(issue) = self.issue {
            self.title = format!(
                "{} forecast. Issued {}",
                self.store.selection.variable.long_label(),
                issue
            );
        }
    }

    /// A server-reported failure replaces the page title; the prior
    /// in-memory state is left as it was.
    fn surface(&mut self, err: anyhow::Error) -> anyhow::Error {
        self.title = err.to_string();
        err
    }
}

fn parse_or_default(field: &str, default: f64, name: &str) -> Result<f64> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(default);
    }
    match field.parse() {
        Ok(v) => Ok(v),
        Err(_) => bail!("{} is not a number: {}", name, field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_modifier_fields_mean_defaults() {
        assert_eq!(parse_or_default("", 1.0, "spread").unwrap(), 1.0);
        assert_eq!(parse_or_default(" 2.5 ", 1.0, "spread").unwrap(), 2.5);
        assert!(parse_or_default("x", 0.0, "shift").is_err());
    }
}
