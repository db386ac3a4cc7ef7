//! Synchronous client for the forecast-handler statistics endpoint.
//!
//! Every request is one POST of a single form field `query=<JSON>`; the
//! JSON object carries a `request_type` discriminant (`load_data`,
//! `modify_data` or `export_data`). Responses are JSON with a `status`
//! of `success` or `failed`; a failure carries a human-readable
//! `response` string which is surfaced verbatim to the user. One round
//! trip per request, no retry: a failed response leaves the caller's
//! state unchanged.

use crate::models::{IssueDate, LoadPayload, ModifyPayload, Overwrite, Selection, Status};
use crate::modifiers::Modifiers;
use crate::settings::{Bandwidth, BoundsFrom, Settings};
use crate::state::{SeriesKind, Store};
use anyhow::{Context, Result, bail};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Request one full dataset: raw forecast, its PDF and categorical
/// probabilities, the matching climatology and the last-ten series.
#[derive(Debug, Clone, Serialize)]
pub struct LoadRequest {
    pub request_type: &'static str,
    pub variable: &'static str,
    pub iss_month: &'static str,
    pub iss_year: String,
    pub period: &'static str,
    pub levels: u32,
    pub range_limiter: f64,
    pub bandwidth: Bandwidth,
    pub clim_period: [i32; 2],
    pub raw_data: bool,
    pub bounds_from: BoundsFrom,
}

impl LoadRequest {
    pub fn new(selection: Selection, issue: IssueDate, settings: &Settings) -> Self {
        Self {
            request_type: "load_data",
            variable: selection.variable.wire_name(),
            iss_month: issue.month.name(),
            iss_year: issue.year.to_string(),
            period: selection.period.wire_name(),
            levels: settings.levels,
            range_limiter: settings.range_limiter,
            bandwidth: settings.bandwidth,
            clim_period: settings.clim_period,
            raw_data: settings.raw_data,
            bounds_from: settings.bounds_from,
        }
    }
}

/// Request a recompute of the modified forecast from the raw members,
/// the climatology members and the current modifiers.
#[derive(Debug, Clone, Serialize)]
pub struct ModifyRequest {
    pub request_type: &'static str,
    pub fcast_data: Vec<f64>,
    pub clim_data: Vec<f64>,
    pub spread: f64,
    pub shift: f64,
    pub blend: f64,
    pub overwrites: Vec<Overwrite>,
    pub levels: u32,
    pub range_limiter: f64,
    pub bandwidth: Bandwidth,
    pub bounds_from: BoundsFrom,
}

impl ModifyRequest {
    pub fn new(store: &Store, modifiers: &Modifiers, settings: &Settings) -> Self {
        Self {
            request_type: "modify_data",
            fcast_data: store.series(SeriesKind::Raw).values.clone(),
            clim_data: store.series(SeriesKind::Climatology).values.clone(),
            spread: modifiers.spread,
            shift: modifiers.shift,
            blend: modifiers.blend,
            overwrites: modifiers.overwrites.clone(),
            levels: settings.levels,
            range_limiter: settings.range_limiter,
            bandwidth: settings.bandwidth,
            bounds_from: settings.bounds_from,
        }
    }
}

/// Ask the server to persist the currently displayed data to a file.
/// The client produces no local file; the destination path comes back
/// in the response.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest {
    pub request_type: &'static str,
    pub variable: &'static str,
    pub iss_month: &'static str,
    pub iss_year: String,
    pub period: &'static str,
    pub last_ten_vals: Vec<f64>,
    pub last_ten_years: Vec<i32>,
    pub clim_data: Vec<f64>,
    pub fcast_data: Vec<f64>,
    pub mem_numbers: Vec<u32>,
    pub pdf_points: Vec<f64>,
    pub forecast_pdf_vals: Vec<f64>,
    pub clim_pdf_vals: Vec<f64>,
    pub quintiles: Vec<f64>,
}

impl ExportRequest {
    pub fn new(selection: Selection, issue: IssueDate, store: &Store) -> Self {
        let modified = store.series(SeriesKind::Modified);
        let climatology = store.series(SeriesKind::Climatology);
        Self {
            request_type: "export_data",
            variable: selection.variable.wire_name(),
            iss_month: issue.month.name(),
            iss_year: issue.year.to_string(),
            period: selection.period.wire_name(),
            last_ten_vals: store.series(SeriesKind::LastTen).values.clone(),
            last_ten_years: store.last_ten_years.clone(),
            clim_data: climatology.values.clone(),
            fcast_data: modified.values.clone(),
            mem_numbers: store.member_numbers.clone(),
            pdf_points: modified.pdf_points.clone(),
            forecast_pdf_vals: modified.pdf_vals.clone(),
            clim_pdf_vals: climatology.pdf_vals.clone(),
            quintiles: climatology.quintiles.clone(),
        }
    }
}

/// Decode a response envelope: on `success` the payload object is
/// returned, on `failed` the server's `response` text becomes the error.
pub fn decode_envelope(text: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(text).context("decode response json")?;
    let status: Status = match value.get("status") {
        Some(s) => serde_json::from_value(s.clone()).context("decode response status")?,
        None => bail!("unexpected response shape: no status field"),
    };
    match status {
        Status::Success => Ok(value),
        Status::Failed => {
            let message = value
                .get("response")
                .and_then(|r| r.as_str())
                .unwrap_or("request failed with no message");
            bail!("{}", message)
        }
    }
}

fn decode_payload<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value = decode_envelope(text)?;
    serde_json::from_value(value).context("decode response payload")
}

/// Seam between the session and the network, so the request/response
/// choreography can be driven by a recording mock in tests.
pub trait Backend {
    fn load(&self, request: &LoadRequest) -> Result<LoadPayload>;
    fn modify(&self, request: &ModifyRequest) -> Result<ModifyPayload>;
    /// Returns the server-side destination path.
    fn export(&self, request: &ExportRequest) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct Client {
    pub endpoint: String,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        Self::new("http://localhost:8000/cgi-bin/forecast_handler")
    }
}

impl Client {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(60)) // total request timeout
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("fcpdf_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client build");
        Self {
            endpoint: endpoint.into(),
            http,
        }
    }

    /// POST `query=<JSON>` and return the raw response body.
    fn post_query<R: Serialize>(&self, request: &R, kind: &str) -> Result<String> {
        let body = serde_json::to_string(request).context("encode request json")?;
        log::debug!("POST {} ({}, {} bytes)", self.endpoint, kind, body.len());
        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("query", body.as_str())])
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?;
        if !response.status().is_success() {
            bail!("request failed with HTTP {}", response.status());
        }
        response.text().context("read response body")
    }
}

impl Backend for Client {
    fn load(&self, request: &LoadRequest) -> Result<LoadPayload> {
        let text = self.post_query(request, request.request_type)?;
        decode_payload(&text)
    }

    fn modify(&self, request: &ModifyRequest) -> Result<ModifyPayload> {
        let text = self.post_query(request, request.request_type)?;
        decode_payload(&text)
    }

    fn export(&self, request: &ExportRequest) -> Result<String> {
        let text = self.post_query(request, request.request_type)?;
        let value = decode_envelope(&text)?;
        value
            .get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("export response carried no destination path"))
    }
}
