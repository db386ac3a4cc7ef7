//! fcpdf-rs
//!
//! A client for a server-side forecast statistics engine: fetch an
//! ensemble forecast with its estimated probability distribution and
//! matching climatology, recompute the distribution under user-chosen
//! modifications (spread, shift, blend toward climatology, per-member
//! overwrites), and render the result as PDF/probability charts or text
//! panels. Pairs with the `fcpdf` CLI and the `fcpdf-gui` desktop app.
//!
//! ### Features
//! - One POST per user action against the `forecast_handler` endpoint
//! - Four datasets (monthly/seasonal x temperature/precipitation) with
//!   per-dataset modifier memory
//! - Chart descriptions decoupled from any plotting library, rendered to
//!   SVG/PNG via plotters
//! - Server-side export of the displayed data
//!
//! ### Example
//! ```no_run
//! use fcpdf_rs::{Client, Month, Session};
//!
//! let mut session = Session::new(Client::default());
//! session.import(Month::Jan, "2016")?;
//! session.set_modifiers_from_fields("1.5", "", "", &[])?;
//! session.update()?;
//! let chart = fcpdf_rs::chart::pdf_chart(&session.store, session.settings.clim_period);
//! fcpdf_rs::render::render_pdf_chart(&chart, "forecast.svg", 1000, 600)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod chart;
pub mod models;
pub mod modifiers;
pub mod panel;
pub mod render;
pub mod session;
pub mod settings;
pub mod state;

pub use api::{Backend, Client};
pub use models::{IssueDate, Month, Period, Selection, Variable};
pub use session::Session;
pub use settings::{Settings, SettingsForm};
pub use state::{SeriesKind, Store};
