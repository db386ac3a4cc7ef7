use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Meteorological variable of a forecast dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Air temperature at 2 metres.
    #[serde(rename = "t2m")]
    Temperature,
    #[serde(rename = "precip")]
    Precipitation,
}

impl Variable {
    pub fn wire_name(self) -> &'static str {
        match self {
            Variable::Temperature => "t2m",
            Variable::Precipitation => "precip",
        }
    }

    /// Short label used in chart titles.
    pub fn short_label(self) -> &'static str {
        match self {
            Variable::Temperature => "Temp",
            Variable::Precipitation => "Precip",
        }
    }

    pub fn long_label(self) -> &'static str {
        match self {
            Variable::Temperature => "Temperature",
            Variable::Precipitation => "Precipitation",
        }
    }
}

impl FromStr for Variable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "t2m" | "temperature" => Ok(Variable::Temperature),
            "precip" | "precipitation" => Ok(Variable::Precipitation),
            other => Err(format!("unknown variable: {}", other)),
        }
    }
}

/// Forecast period type: one month ahead or a three-month season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "mon")]
    Monthly,
    #[serde(rename = "seas")]
    Seasonal,
}

impl Period {
    pub fn wire_name(self) -> &'static str {
        match self {
            Period::Monthly => "mon",
            Period::Seasonal => "seas",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Period::Monthly => "1 Month",
            Period::Seasonal => "3 Month",
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mon" | "monthly" => Ok(Period::Monthly),
            "seas" | "seasonal" => Ok(Period::Seasonal),
            other => Err(format!("unknown period: {}", other)),
        }
    }
}

/// The active dataset: one of the four period/variable combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub period: Period,
    pub variable: Variable,
}

impl Selection {
    pub fn new(period: Period, variable: Variable) -> Self {
        Self { period, variable }
    }

    /// All four combinations, in a fixed order.
    pub fn all() -> [Selection; 4] {
        [
            Selection::new(Period::Monthly, Variable::Temperature),
            Selection::new(Period::Monthly, Variable::Precipitation),
            Selection::new(Period::Seasonal, Variable::Temperature),
            Selection::new(Period::Seasonal, Variable::Precipitation),
        ]
    }

    /// Chart title, e.g. "1 Month Temp".
    pub fn title(&self) -> String {
        format!(
            "{} {}",
            self.period.short_label(),
            self.variable.short_label()
        )
    }
}

impl Default for Selection {
    /// The tool always starts on monthly temperature.
    fn default() -> Self {
        Selection::new(Period::Monthly, Variable::Temperature)
    }
}

/// Forecast issue month, sent on the wire as its three-letter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown month: {}", s))
    }
}

/// When the forecast was issued. The year is validated from a 4-digit
/// input field before one of these is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDate {
    pub month: Month,
    pub year: i32,
}

impl fmt::Display for IssueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

/// One explicit member replacement, keyed by the member's position in
/// the modified value list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overwrite {
    #[serde(rename = "val_indx")]
    pub index: usize,
    #[serde(rename = "new_val")]
    pub value: f64,
}

/// Response envelope discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

/// Forecast slice of a `load_data` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawForecast {
    pub values: Vec<f64>,
    pub mem_nums: Vec<u32>,
    pub pdf_vals: Vec<f64>,
    pub pdf_points: Vec<f64>,
    pub quin_probs: Vec<f64>,
}

/// Climatology slice of a `load_data` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimatologyFull {
    pub values: Vec<f64>,
    pub pdf_vals: Vec<f64>,
    pub pdf_points: Vec<f64>,
    pub quintiles: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastTen {
    pub values: Vec<f64>,
}

/// Payload of a successful `load_data` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadPayload {
    pub raw_forecast: RawForecast,
    pub climatology: ClimatologyFull,
    pub last_ten: LastTen,
}

/// Recomputed forecast slice of a `modify_data` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifiedForecast {
    pub values: Vec<f64>,
    pub pdf_vals: Vec<f64>,
    pub pdf_points: Vec<f64>,
    pub quin_probs: Vec<f64>,
}

/// Climatology slice of a `modify_data` response. Carries no member
/// values; only the distribution view is recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimatologyView {
    pub pdf_vals: Vec<f64>,
    pub pdf_points: Vec<f64>,
    pub quintiles: Vec<f64>,
}

/// Payload of a successful `modify_data` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyPayload {
    pub modified_forecast: ModifiedForecast,
    pub climatology: ClimatologyView,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        assert_eq!(
            serde_json::to_string(&Variable::Temperature).unwrap(),
            "\"t2m\""
        );
        assert_eq!(
            serde_json::to_string(&Period::Seasonal).unwrap(),
            "\"seas\""
        );
        assert_eq!(
            serde_json::from_str::<Variable>("\"precip\"").unwrap(),
            Variable::Precipitation
        );
        assert_eq!("nov".parse::<Month>().unwrap(), Month::Nov);
        assert!("Movember".parse::<Month>().is_err());
    }

    #[test]
    fn overwrite_uses_legacy_field_names() {
        let ow = Overwrite {
            index: 3,
            value: 7.5,
        };
        assert_eq!(
            serde_json::to_string(&ow).unwrap(),
            r#"{"val_indx":3,"new_val":7.5}"#
        );
    }

    #[test]
    fn selection_titles() {
        assert_eq!(Selection::default().title(), "1 Month Temp");
        assert_eq!(
            Selection::new(Period::Seasonal, Variable::Precipitation).title(),
            "3 Month Precip"
        );
    }
}
