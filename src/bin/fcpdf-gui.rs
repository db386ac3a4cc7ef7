/*!
 * GUI application for fcpdf-rs - ensemble forecast distribution tool
 *
 * A cross-platform desktop application providing an interface for:
 * - Importing a forecast by issue date
 * - Switching between the four forecast datasets
 * - Modifying the forecast (spread, shift, blend, member overwrites)
 * - Saving charts and exporting the displayed data
 *
 * Platform support: Windows, macOS, Linux
 */

use eframe::egui;
use fcpdf_rs::api::{Backend, ExportRequest, LoadRequest, ModifyRequest};
use fcpdf_rs::chart;
use fcpdf_rs::models::{IssueDate, LoadPayload, ModifyPayload, Month, Period, Selection, Variable};
use fcpdf_rs::modifiers::{ModifierBank, Modifiers, parse_overwrites};
use fcpdf_rs::panel;
use fcpdf_rs::render;
use fcpdf_rs::settings::{
    BoundsFrom, NamedBandwidth, ProbStyle, Settings, SettingsForm, parse_issue_year,
};
use fcpdf_rs::state::{SeriesKind, Store};
use fcpdf_rs::Client;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 650.0])
            .with_min_inner_size([700.0, 500.0])
            .with_title("Forecast Distributions - fcpdf-rs"),
        ..Default::default()
    };

    eframe::run_native(
        "Forecast Distributions",
        options,
        Box::new(|_cc| Ok(Box::new(FcpdfApp::new()))),
    )
}

#[derive(Debug)]
enum OpOutcome {
    Loaded(Result<LoadPayload, String>),
    Modified(Result<ModifyPayload, String>),
    Exported(Result<String, String>),
}

/// Tags every background response with the request generation it
/// answers, so responses that arrive after the user has moved on are
/// dropped instead of clobbering the newer dataset.
#[derive(Debug)]
struct Envelope {
    generation: u64,
    outcome: OpOutcome,
}

/// Main application state
struct FcpdfApp {
    client: Client,

    // Data state
    store: Store,
    settings: Settings,
    bank: ModifierBank,
    issue: Option<IssueDate>,
    loaded: bool,

    // Modifier input fields (free text, parsed on use)
    spread_field: String,
    shift_field: String,
    blend_field: String,
    overwrite_fields: Vec<String>,

    // Import dialog
    show_import: bool,
    import_month: Month,
    import_year: String,
    import_tip: String,

    // Settings dialog
    show_settings: bool,
    settings_form: SettingsForm,
    settings_tip: String,

    // UI state
    title: String,
    error_message: String,

    // Background operation
    generation: u64,
    in_flight: bool,
    /// Run a recompute right after the next load completes, so restored
    /// non-default modifiers become visible again.
    pending_modify: bool,
    receiver: Option<mpsc::Receiver<Envelope>>,
}

impl FcpdfApp {
    fn new() -> Self {
        let settings = Settings::default();
        Self {
            client: Client::default(),
            store: Store::new(),
            settings_form: SettingsForm::from_settings(&settings),
            settings,
            bank: ModifierBank::default(),
            issue: None,
            loaded: false,
            spread_field: String::new(),
            shift_field: String::new(),
            blend_field: String::new(),
            overwrite_fields: Vec::new(),
            show_import: false,
            import_month: Month::Jan,
            import_year: String::new(),
            import_tip: String::new(),
            show_settings: false,
            settings_tip: String::new(),
            title: "No forecast imported".to_string(),
            error_message: String::new(),
            generation: 0,
            in_flight: false,
            pending_modify: false,
            receiver: None,
        }
    }

    /// Parse the modifier input fields. Blank fields mean "unmodified".
    fn live_modifiers(&self) -> Result<Modifiers, String> {
        Ok(Modifiers {
            spread: parse_or_default(&self.spread_field, 1.0).ok_or("Spread must be a number.")?,
            shift: parse_or_default(&self.shift_field, 0.0).ok_or("Shift must be a number.")?,
            blend: parse_or_default(&self.blend_field, 0.0).ok_or("Blend must be a number.")?,
            overwrites: parse_overwrites(&self.overwrite_fields, self.store.member_count())
                .map_err(|e| e.to_string())?,
        })
    }

    fn set_modifier_fields(&mut self, modifiers: &Modifiers) {
        self.spread_field = modifiers.spread.to_string();
        self.shift_field = modifiers.shift.to_string();
        self.blend_field = modifiers.blend.to_string();
        self.overwrite_fields =
            panel::overwrite_fields(self.store.member_count(), &modifiers.overwrites);
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

    fn start_load(&mut self, follow_with_modify: bool) {
        let Some(issue) = self.issue else {
            return;
        };
        self.generation += 1;
        let generation = self.generation;
        self.in_flight = true;
        self.pending_modify = follow_with_modify;
        self.error_message.clear();

        let request = LoadRequest::new(self.store.selection, issue, &self.settings);
        let client = self.client.clone();
        let (sender, receiver) = mpsc::channel();
        self.receiver = Some(receiver);
        thread::spawn(move || {
            let outcome = OpOutcome::Loaded(client.load(&request).map_err(|e| e.to_string()));
            let _ = sender.send(Envelope {
                generation,
                outcome,
            });
        });
    }

    fn start_modify(&mut self) {
        let modifiers = match self.live_modifiers() {
            Ok(m) => m,
            Err(msg) => {
                self.error_message = msg;
                return;
            }
        };
        self.generation += 1;
        let generation = self.generation;
        self.in_flight = true;
        self.error_message.clear();

        let request = ModifyRequest::new(&self.store, &modifiers, &self.settings);
        let client = self.client.clone();
        let (sender, receiver) = mpsc::channel();
        self.receiver = Some(receiver);
        thread::spawn(move || {
            let outcome = OpOutcome::Modified(client.modify(&request).map_err(|e| e.to_string()));
            let _ = sender.send(Envelope {
                generation,
                outcome,
            });
        });
    }

    fn start_export(&mut self) {
        let Some(issue) = self.issue else {
            return;
        };
        self.generation += 1;
        let generation = self.generation;
        self.in_flight = true;
        self.error_message.clear();

        let request = ExportRequest::new(self.store.selection, issue, &self.store);
        let client = self.client.clone();
        let (sender, receiver) = mpsc::channel();
        self.receiver = Some(receiver);
        thread::spawn(move || {
            let outcome = OpOutcome::Exported(client.export(&request).map_err(|e| e.to_string()));
            let _ = sender.send(Envelope {
                generation,
                outcome,
            });
        });
    }

    /// Dataset-button action: remember the outgoing dataset's modifiers,
    /// restore the incoming one's, and fetch.
    fn select_dataset(&mut self, period: Period, variable: Variable) {
        if let Ok(live) = self.live_modifiers() {
            self.bank.save(self.store.selection, &live);
        }
        self.store.set_selection(Selection::new(period, variable));
        let mut restored = Modifiers::default();
        let pending = self.bank.load(self.store.selection, &mut restored);
        self.set_modifier_fields(&restored);
        self.start_load(pending);
    }

    fn check_operation_result(&mut self) {
        let Some(receiver) = &self.receiver else {
            return;
        };
        let Ok(envelope) = receiver.try_recv() else {
            return;
        };
        if envelope.generation != self.generation {
            // A newer request superseded this one; drop the response.
            return;
        }
        self.in_flight = false;
        self.receiver = None;

        match envelope.outcome {
            OpOutcome::Loaded(Ok(payload)) => {
                self.store.apply_load(payload);
                self.loaded = true;
                self.overwrite_fields
                    .resize(self.store.member_count(), String::new());
                self.refresh_title();
                if self.pending_modify {
                    self.pending_modify = false;
                    self.start_modify();
                }
            }
            OpOutcome::Modified(Ok(payload)) => {
                self.store.apply_modify(payload);
                self.refresh_title();
            }
            OpOutcome::Exported(Ok(path)) => {
                self.title = format!("Data saved in: {}", path);
            }
            OpOutcome::Loaded(Err(msg))
            | OpOutcome::Modified(Err(msg))
            | OpOutcome::Exported(Err(msg)) => {
                self.pending_modify = false;
                self.title = msg;
            }
        }
    }

    fn save_pdf_chart(&mut self) {
        let Some(path) = save_dialog("forecast_pdf.png") else {
            return;
        };
        let description = chart::pdf_chart(&self.store, self.settings.clim_period);
        if let Err(err) = render::render_pdf_chart(&description, &path, 1000, 600) {
            self.error_message = format!("Failed to save chart: {}", err);
        } else {
            self.error_message.clear();
        }
    }

    fn save_prob_chart(&mut self) {
        let Some(path) = save_dialog("forecast_probabilities.png") else {
            return;
        };
        let probs = &self.store.series(SeriesKind::Modified).quin_probs;
        let result = chart::prob_chart(
            probs,
            self.store.selection.variable,
            self.settings.prob_style,
        )
        .and_then(|description| render::render_prob_chart(&description, &path, 800, 600));
        if let Err(err) = result {
            self.error_message = format!("Failed to save chart: {}", err);
        } else {
            self.error_message.clear();
        }
    }

    fn import_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_import;
        egui::Window::new("Import forecast")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Issue month:");
                    egui::ComboBox::from_id_salt("issue_month")
                        .selected_text(self.import_month.name())
                        .show_ui(ui, |ui| {
                            for month in Month::ALL {
                                ui.selectable_value(&mut self.import_month, month, month.name());
                            }
                        });
                });
                ui.horizontal(|ui| {
                    ui.label("Issue year:");
                    ui.text_edit_singleline(&mut self.import_year);
                });
                if !self.import_tip.is_empty() {
                    ui.colored_label(egui::Color32::RED, &self.import_tip);
                }
                ui.horizontal(|ui| {
                    if ui.button("Import").clicked() {
                        match parse_issue_year(&self.import_year) {
                            Ok(year) => {
                                self.issue = Some(IssueDate {
                                    month: self.import_month,
                                    year,
                                });
                                self.import_tip.clear();
                                self.show_import = false;
                                self.store.set_selection(Selection::default());
                                self.start_load(false);
                            }
                            Err(err) => self.import_tip = err.to_string(),
                        }
                    }
                    if ui.button("Cancel").clicked() {
                        self.show_import = false;
                    }
                });
            });
        if !open {
            self.show_import = false;
        }
    }

    fn settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("PDF plotting levels:");
                    ui.text_edit_singleline(&mut self.settings_form.levels);
                });
                ui.horizontal(|ui| {
                    ui.label("PDF range limiter:");
                    ui.text_edit_singleline(&mut self.settings_form.range_limiter);
                });
                ui.horizontal(|ui| {
                    ui.label("Climatology period:");
                    ui.text_edit_singleline(&mut self.settings_form.clim_from);
                    ui.label("to");
                    ui.text_edit_singleline(&mut self.settings_form.clim_to);
                });
                ui.horizontal(|ui| {
                    ui.label("Bandwidth estimator:");
                    ui.radio_value(
                        &mut self.settings_form.bandwidth_choice,
                        NamedBandwidth::Silverman,
                        "Silverman",
                    );
                    ui.radio_value(
                        &mut self.settings_form.bandwidth_choice,
                        NamedBandwidth::Scott,
                        "Scott",
                    );
                });
                ui.horizontal(|ui| {
                    ui.label("Given bandwidth:");
                    ui.text_edit_singleline(&mut self.settings_form.given_bandwidth)
                        .on_hover_text("Numeric factor; overrides the estimator when set");
                });
                ui.horizontal(|ui| {
                    ui.label("Category bounds from:");
                    ui.radio_value(&mut self.settings_form.bounds_from, BoundsFrom::Pdf, "PDF");
                    ui.radio_value(&mut self.settings_form.bounds_from, BoundsFrom::Data, "Data");
                });
                ui.horizontal(|ui| {
                    ui.label("Probability chart:");
                    ui.radio_value(&mut self.settings_form.prob_style, ProbStyle::Bar, "Bar");
                    ui.radio_value(&mut self.settings_form.prob_style, ProbStyle::Pie, "Pie");
                });
                ui.checkbox(&mut self.settings_form.raw_data, "Load raw forecast data");
                if !self.settings_tip.is_empty() {
                    ui.colored_label(egui::Color32::RED, &self.settings_tip);
                }
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        match self.settings_form.validate() {
                            Ok(settings) => {
                                self.settings = settings;
                                self.settings_tip.clear();
                                self.show_settings = false;
                            }
                            Err(err) => self.settings_tip = err.to_string(),
                        }
                    }
                    if ui.button("Cancel").clicked() {
                        self.settings_form = SettingsForm::from_settings(&self.settings);
                        self.settings_tip.clear();
                        self.show_settings = false;
                    }
                });
            });
        if !open {
            self.show_settings = false;
        }
    }
}

impl eframe::App for FcpdfApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_operation_result();

        if self.in_flight {
            ctx.request_repaint();
        }

        if self.show_import {
            self.import_window(ctx);
        }
        if self.show_settings {
            self.settings_window(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading(&self.title);
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(!self.in_flight, egui::Button::new("Import…"))
                        .clicked()
                    {
                        self.show_import = true;
                    }
                    if ui.button("Settings…").clicked() {
                        self.settings_form = SettingsForm::from_settings(&self.settings);
                        self.show_settings = true;
                    }
                    if self.in_flight {
                        ui.spinner();
                        ui.label("Waiting for server…");
                    }
                });

                ui.add_space(10.0);

                // Dataset buttons, disabled until a forecast is imported
                ui.group(|ui| {
                    ui.label("Dataset");
                    ui.add_space(5.0);
                    ui.horizontal(|ui| {
                        let enabled = self.loaded && !self.in_flight;
                        for selection in Selection::all() {
                            let active = self.store.selection == selection;
                            let button =
                                egui::Button::new(selection.title()).selected(active);
                            if ui.add_enabled(enabled && !active, button).clicked() {
                                self.select_dataset(selection.period, selection.variable);
                            }
                        }
                    });
                });

                ui.add_space(10.0);

                // Modifier section
                ui.group(|ui| {
                    ui.label("Modifiers");
                    ui.add_space(5.0);
                    ui.horizontal(|ui| {
                        ui.label("Spread:");
                        ui.text_edit_singleline(&mut self.spread_field)
                            .on_hover_text("Scale factor on the ensemble spread (1 = unchanged)");
                        ui.label("Shift:");
                        ui.text_edit_singleline(&mut self.shift_field)
                            .on_hover_text("Additive offset (0 = unchanged)");
                        ui.label("Blend:");
                        ui.text_edit_singleline(&mut self.blend_field)
                            .on_hover_text("Percent blend toward climatology (0 = unchanged)");
                    });

                    ui.collapsing("Member overwrites", |ui| {
                        for (i, field) in self.overwrite_fields.iter_mut().enumerate() {
                            ui.horizontal(|ui| {
                                let number = self
                                    .store
                                    .member_numbers
                                    .get(i)
                                    .map(|n| n.to_string())
                                    .unwrap_or_else(|| i.to_string());
                                ui.label(format!("Member {}:", number));
                                ui.text_edit_singleline(field);
                            });
                        }
                    });

                    ui.horizontal(|ui| {
                        let enabled = self.loaded && !self.in_flight;
                        if ui
                            .add_enabled(enabled, egui::Button::new("Update"))
                            .clicked()
                        {
                            self.start_modify();
                        }
                        if ui
                            .add_enabled(enabled, egui::Button::new("Export data"))
                            .clicked()
                        {
                            self.start_export();
                        }
                        if ui
                            .add_enabled(enabled, egui::Button::new("Save chart…"))
                            .clicked()
                        {
                            self.save_pdf_chart();
                        }
                        if ui
                            .add_enabled(enabled, egui::Button::new("Save probability chart…"))
                            .clicked()
                        {
                            self.save_prob_chart();
                        }
                    });
                });

                ui.add_space(10.0);

                // Data panels
                if self.loaded {
                    ui.horizontal_top(|ui| {
                        ui.group(|ui| {
                            ui.label("Raw members");
                            egui::ScrollArea::vertical()
                                .id_salt("raw_values")
                                .max_height(220.0)
                                .show(ui, |ui| {
                                    ui.monospace(panel::member_lines(
                                        &self.store,
                                        SeriesKind::Raw,
                                    ));
                                });
                        });
                        ui.group(|ui| {
                            ui.label("Modified members");
                            egui::ScrollArea::vertical()
                                .id_salt("member_values")
                                .max_height(220.0)
                                .show(ui, |ui| {
                                    ui.monospace(panel::member_lines(
                                        &self.store,
                                        SeriesKind::Modified,
                                    ));
                                });
                        });
                        ui.group(|ui| {
                            ui.label("Category probabilities");
                            let probs = &self.store.series(SeriesKind::Modified).quin_probs;
                            for (category, prob) in
                                chart::CATEGORY_LABELS.iter().zip(probs).rev()
                            {
                                ui.label(format!(
                                    "{}: {}",
                                    category,
                                    chart::percent_label(*prob)
                                ));
                            }
                        });
                    });
                }

                ui.add_space(10.0);

                if !self.error_message.is_empty() {
                    ui.colored_label(egui::Color32::RED, &self.error_message);
                }
            });
        });
    }
}

fn parse_or_default(field: &str, default: f64) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        return Some(default);
    }
    field.parse().ok()
}

fn save_dialog(default_name: &str) -> Option<PathBuf> {
    let start_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    rfd::FileDialog::new()
        .set_directory(start_dir)
        .set_file_name(default_name)
        .add_filter("Images", &["png", "svg"])
        .save_file()
}
