//! User-configurable analysis options and their validation.
//!
//! The GUI edits a [`SettingsForm`] (free text, mirroring the settings
//! dialog fields); [`SettingsForm::validate`] either commits every field
//! atomically into a new [`Settings`] or reports *all* violated
//! constraints at once, leaving the current settings untouched.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kernel-density bandwidth: a named rule-of-thumb estimator or a
/// literal numeric factor. Serialized as a bare string or number, which
/// is what the statistics endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bandwidth {
    Silverman,
    Scott,
    Literal(f64),
}

impl Serialize for Bandwidth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match *self {
            Bandwidth::Silverman => serializer.serialize_str("silverman"),
            Bandwidth::Scott => serializer.serialize_str("scott"),
            Bandwidth::Literal(v) => serializer.serialize_f64(v),
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Bandwidth::Silverman => f.write_str("silverman"),
            Bandwidth::Scott => f.write_str("scott"),
            Bandwidth::Literal(v) => write!(f, "{}", v),
        }
    }
}

/// Which source defines the category boundaries server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsFrom {
    /// Quintiles of the estimated climatology PDF.
    Pdf,
    /// Quintiles of the climatology member values.
    Data,
}

/// Which chart style renders the five categorical probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbStyle {
    Bar,
    Pie,
}

/// Committed analysis settings. Constructed with defaults at startup and
/// replaced wholesale whenever a settings edit passes validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Number of PDF sample points requested from the server.
    pub levels: u32,
    /// Factor controlling how far past the data the PDF domain extends.
    pub range_limiter: f64,
    pub bandwidth: Bandwidth,
    /// Inclusive year bounds of the climatology period.
    pub clim_period: [i32; 2],
    /// Derived from `clim_period`: every year in the period, ascending.
    pub clim_years: Vec<i32>,
    pub bounds_from: BoundsFrom,
    pub prob_style: ProbStyle,
    /// Whether the server should load raw data even when a modified
    /// dataset exists for the selection.
    pub raw_data: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let clim_period = [1981, 2010];
        Self {
            levels: 101,
            range_limiter: 40.0,
            bandwidth: Bandwidth::Silverman,
            clim_period,
            clim_years: climatology_years(clim_period[0], clim_period[1]),
            bounds_from: BoundsFrom::Pdf,
            prob_style: ProbStyle::Bar,
            raw_data: true,
        }
    }
}

/// Every year in `from..=to`, ascending.
pub fn climatology_years(from: i32, to: i32) -> Vec<i32> {
    (from..=to).collect()
}

/// Aggregate validation failure: all violated constraints, not just the
/// first one, joined into the message shown in the dialog tip area.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", .problems.join(" "))]
pub struct ValidationError {
    pub problems: Vec<String>,
}

impl ValidationError {
    fn new() -> Self {
        Self {
            problems: Vec::new(),
        }
    }

    fn push(&mut self, msg: impl Into<String>) {
        self.problems.push(msg.into());
    }

    fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

fn is_four_digits(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Validate the import dialog's issue-year field.
pub fn parse_issue_year(field: &str) -> Result<i32, ValidationError> {
    let field = field.trim();
    if !is_four_digits(field) {
        return Err(ValidationError {
            problems: vec!["Year must contain 4 digits.".into()],
        });
    }
    // Four ASCII digits always parse.
    Ok(field.parse().unwrap())
}

/// Named estimator choice in the settings dialog, overridden by any
/// free-form bandwidth value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedBandwidth {
    Silverman,
    Scott,
}

/// Raw settings-dialog field values, pending validation.
#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub levels: String,
    pub range_limiter: String,
    pub clim_from: String,
    pub clim_to: String,
    pub bandwidth_choice: NamedBandwidth,
    /// Free-form numeric bandwidth; non-blank wins over the choice above.
    pub given_bandwidth: String,
    pub bounds_from: BoundsFrom,
    pub prob_style: ProbStyle,
    pub raw_data: bool,
}

impl SettingsForm {
    /// Pre-fill the dialog with the currently committed settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let (bandwidth_choice, given_bandwidth) = match settings.bandwidth {
            Bandwidth::Silverman => (NamedBandwidth::Silverman, String::new()),
            Bandwidth::Scott => (NamedBandwidth::Scott, String::new()),
            Bandwidth::Literal(v) => (NamedBandwidth::Silverman, v.to_string()),
        };
        Self {
            levels: settings.levels.to_string(),
            range_limiter: settings.range_limiter.to_string(),
            clim_from: settings.clim_period[0].to_string(),
            clim_to: settings.clim_period[1].to_string(),
            bandwidth_choice,
            given_bandwidth,
            bounds_from: settings.bounds_from,
            prob_style: settings.prob_style,
            raw_data: settings.raw_data,
        }
    }

    /// Check every field and build the new committed settings. All
    /// problems are collected before failing so the dialog can show the
    /// full list in one go; on failure the caller keeps its current
    /// settings unchanged.
    pub fn validate(&self) -> Result<Settings, ValidationError> {
        let mut errors = ValidationError::new();

        let from = self.clim_from.trim();
        let to = self.clim_to.trim();
        if !is_four_digits(from) {
            errors.push("'From' year must contain 4 digits.");
        }
        if !is_four_digits(to) {
            errors.push("'To' year must contain 4 digits.");
        }
        let mut clim_period = None;
        if let (Ok(f), Ok(t)) = (from.parse::<i32>(), to.parse::<i32>()) {
            if is_four_digits(from) && is_four_digits(to) {
                if f >= t {
                    errors.push("'From' year must come before 'To' year.");
                } else {
                    clim_period = Some([f, t]);
                }
            }
        }

        let mut range_limiter = None;
        if self.range_limiter.trim().is_empty() {
            errors.push("No 'PDF range limiter' value given.");
        } else {
            match self.range_limiter.trim().parse::<f64>() {
                Ok(v) => range_limiter = Some(v),
                Err(_) => errors.push("'PDF range limiter' must be a number."),
            }
        }

        let mut levels = None;
        if self.levels.trim().is_empty() {
            errors.push("No 'PDF plotting levels' value given.");
        } else {
            match self.levels.trim().parse::<u32>() {
                Ok(v) => levels = Some(v),
                Err(_) => errors.push("'PDF plotting levels' must be a whole number."),
            }
        }

        // A free-form value overrides the selected named estimator and is
        // taken as a literal bandwidth.
        let mut bandwidth = None;
        if self.given_bandwidth.trim().is_empty() {
            bandwidth = Some(match self.bandwidth_choice {
                NamedBandwidth::Silverman => Bandwidth::Silverman,
                NamedBandwidth::Scott => Bandwidth::Scott,
            });
        } else {
            match self.given_bandwidth.trim().parse::<f64>() {
                Ok(v) => bandwidth = Some(Bandwidth::Literal(v)),
                Err(_) => errors.push("'Bandwidth' must be a number."),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let clim_period = clim_period.expect("validated");
        Ok(Settings {
            levels: levels.expect("validated"),
            range_limiter: range_limiter.expect("validated"),
            bandwidth: bandwidth.expect("validated"),
            clim_period,
            clim_years: climatology_years(clim_period[0], clim_period[1]),
            bounds_from: self.bounds_from,
            prob_style: self.prob_style,
            raw_data: self.raw_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> SettingsForm {
        SettingsForm::from_settings(&Settings::default())
    }

    #[test]
    fn default_settings_match_tool_startup() {
        let s = Settings::default();
        assert_eq!(s.levels, 101);
        assert_eq!(s.range_limiter, 40.0);
        assert_eq!(s.bandwidth, Bandwidth::Silverman);
        assert_eq!(s.clim_period, [1981, 2010]);
        assert!(s.raw_data);
    }

    #[test]
    fn climatology_year_list_is_ascending_contiguous() {
        let years = climatology_years(1981, 2010);
        assert_eq!(years.len(), 30);
        assert_eq!(years.first(), Some(&1981));
        assert_eq!(years.last(), Some(&2010));
        assert!(years.windows(2).all(|w| w[1] == w[0] + 1));

        assert_eq!(climatology_years(2000, 2000), vec![2000]);
    }

    #[test]
    fn reversed_years_mention_ordering() {
        let mut form = valid_form();
        form.clim_from = "1999".into();
        form.clim_to = "1990".into();
        let err = form.validate().unwrap_err();
        assert!(err.to_string().contains("must come before"));
    }

    #[test]
    fn short_year_mentions_digit_count() {
        let mut form = valid_form();
        form.clim_from = "99".into();
        let err = form.validate().unwrap_err();
        assert!(err.to_string().contains("4 digits"));
    }

    #[test]
    fn all_problems_are_reported_together() {
        let mut form = valid_form();
        form.clim_from = "99".into();
        form.range_limiter = String::new();
        form.levels = String::new();
        let err = form.validate().unwrap_err();
        assert_eq!(err.problems.len(), 3);
        assert!(err.to_string().contains("range limiter"));
        assert!(err.to_string().contains("plotting levels"));
    }

    #[test]
    fn valid_form_commits_and_recomputes_years() {
        let mut form = valid_form();
        form.clim_from = "1991".into();
        form.clim_to = "2020".into();
        let settings = form.validate().unwrap();
        assert_eq!(settings.clim_period, [1991, 2020]);
        assert_eq!(settings.clim_years.len(), 30);
        assert_eq!(settings.clim_years[0], 1991);
    }

    #[test]
    fn literal_bandwidth_overrides_named_estimator() {
        let mut form = valid_form();
        form.bandwidth_choice = NamedBandwidth::Scott;
        form.given_bandwidth = "0.35".into();
        let settings = form.validate().unwrap();
        assert_eq!(settings.bandwidth, Bandwidth::Literal(0.35));

        form.given_bandwidth = String::new();
        let settings = form.validate().unwrap();
        assert_eq!(settings.bandwidth, Bandwidth::Scott);
    }

    #[test]
    fn bandwidth_serializes_as_string_or_number() {
        assert_eq!(
            serde_json::to_string(&Bandwidth::Silverman).unwrap(),
            "\"silverman\""
        );
        assert_eq!(serde_json::to_string(&Bandwidth::Literal(0.5)).unwrap(), "0.5");
    }

    #[test]
    fn issue_year_needs_four_digits() {
        assert_eq!(parse_issue_year("2016").unwrap(), 2016);
        assert!(parse_issue_year("16").is_err());
        assert!(parse_issue_year("20x6").is_err());
    }
}
