//! Desktop front-end and persistent user settings.

use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::info;

mod catalog;
use catalog::{Catalog, ExerciseFilter, format_load_message, load_catalog, resolve_catalog_path};
mod error;
use error::{CatalogError, Severity};
mod report;
use report::{LINK_LABEL, open_plan_in_browser};
mod selector;
use selector::{COUNT_OPTIONS, DEFAULT_COUNT, WorkoutPlan, generate};

fn default_difficulty_options() -> Vec<String> {
    ["קל", "בינוני", "קשה"].iter().map(|s| s.to_string()).collect()
}

fn default_equipment_options() -> Vec<String> {
    ["משקל גוף", "TRX", "דאמבלים", "גומיה"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_count() -> usize {
    DEFAULT_COUNT
}

/// Persistent configuration for the generator.
///
/// Stored as JSON in the platform config directory. Every field has a serde
/// default so files written by older versions keep loading. Selections are
/// stored by value rather than by index so editing the option lists does not
/// tick the wrong boxes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Settings {
    #[serde(default = "default_count")]
    exercise_count: usize,
    #[serde(default = "default_difficulty_options")]
    difficulty_options: Vec<String>,
    #[serde(default = "default_equipment_options")]
    equipment_options: Vec<String>,
    /// Ticked difficulty values; `None` means all options.
    #[serde(default)]
    selected_difficulties: Option<BTreeSet<String>>,
    /// Ticked equipment values; `None` means all options.
    #[serde(default)]
    selected_equipment: Option<BTreeSet<String>>,
    #[serde(default)]
    catalog_path: Option<String>,
    /// Fixed seed for reproducible workouts.
    #[serde(default)]
    seed: Option<u64>,
}

impl Settings {
    const FILE: &'static str = "workout_generator_settings.json";

    fn path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring invalid settings in {}: {e}", path.display()),
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match serde_json::to_string_pretty(self) {
                Ok(data) => {
                    if let Err(e) = std::fs::write(&path, data) {
                        log::error!("Failed to save settings: {e}");
                    }
                }
                Err(e) => log::error!("Failed to serialize settings: {e}"),
            }
        }
    }

    /// Difficulty and equipment values currently ticked.
    fn filter(&self) -> ExerciseFilter {
        fn ticked(options: &[String], selected: &Option<BTreeSet<String>>) -> BTreeSet<String> {
            options
                .iter()
                .filter(|o| selected.as_ref().map_or(true, |s| s.contains(*o)))
                .cloned()
                .collect()
        }
        ExerciseFilter {
            difficulties: ticked(&self.difficulty_options, &self.selected_difficulties),
            equipment: ticked(&self.equipment_options, &self.selected_equipment),
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exercise_count: DEFAULT_COUNT,
            difficulty_options: default_difficulty_options(),
            equipment_options: default_equipment_options(),
            selected_difficulties: None,
            selected_equipment: None,
            catalog_path: None,
            seed: None,
        }
    }
}

/// Append catalog values missing from `options`, returning whether any were added.
fn merge_options(options: &mut Vec<String>, found: Vec<String>) -> bool {
    let mut added = false;
    for value in found {
        if !options.contains(&value) {
            options.push(value);
            added = true;
        }
    }
    added
}

/// Toggle `value` in a selection where `None` stands for "everything".
fn toggle_selection(
    selected: &mut Option<BTreeSet<String>>,
    options: &[String],
    value: &str,
    on: bool,
) {
    let set = selected.get_or_insert_with(|| options.iter().cloned().collect());
    if on {
        set.insert(value.to_string());
    } else {
        set.remove(value);
    }
    if options.iter().all(|o| set.contains(o)) {
        *selected = None;
    }
}

struct StatusMessage {
    severity: Severity,
    text: String,
}

struct WorkoutApp {
    catalog: Option<Catalog>,
    catalog_file: Option<PathBuf>,
    plan: Option<WorkoutPlan>,
    rng: StdRng,
    settings: Settings,
    settings_dirty: bool,
    status: Option<StatusMessage>,
    toast: Option<String>,
    toast_start: Option<Instant>,
}

impl Default for WorkoutApp {
    fn default() -> Self {
        let settings = Settings::load();
        let rng = settings.rng();
        let mut app = Self {
            catalog: None,
            catalog_file: resolve_catalog_path(settings.catalog_path.as_deref()),
            plan: None,
            rng,
            settings,
            settings_dirty: false,
            status: None,
            toast: None,
            toast_start: None,
        };
        app.reload_catalog();
        app
    }
}

impl WorkoutApp {
    fn report(&mut self, severity: Severity, text: String) {
        match severity {
            Severity::Warning => log::warn!("{text}"),
            Severity::Error => log::error!("{text}"),
        }
        self.status = Some(StatusMessage { severity, text });
    }

    fn show_toast(&mut self, text: String) {
        self.toast = Some(text);
        self.toast_start = Some(Instant::now());
    }

    fn load_from(&mut self, path: &Path) {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        match load_catalog(path) {
            Ok(catalog) => {
                info!("Catalog {} has {} exercises", filename, catalog.records.len());
                self.show_toast(format_load_message(catalog.records.len(), &filename));
                if merge_options(&mut self.settings.difficulty_options, catalog.difficulties())
                    | merge_options(&mut self.settings.equipment_options, catalog.equipment())
                {
                    self.settings_dirty = true;
                }
                self.catalog = Some(catalog);
                self.status = None;
            }
            Err(e) => {
                self.catalog = None;
                self.report(e.severity(), format!("{filename}: {e}"));
            }
        }
        self.plan = None;
        self.catalog_file = Some(path.to_path_buf());
    }

    /// Load the catalog again from the current source file.
    fn reload_catalog(&mut self) {
        match self.catalog_file.clone() {
            Some(path) => self.load_from(&path),
            None => self.report(
                Severity::Warning,
                "no catalog file configured; open one with \"Open catalog…\"".into(),
            ),
        }
    }

    /// Switch to another catalog file and remember it for the next start.
    fn open_catalog(&mut self, path: PathBuf) {
        self.settings.catalog_path = Some(path.display().to_string());
        self.settings_dirty = true;
        self.load_from(&path);
    }

    fn generate_workout(&mut self) {
        let Some(catalog) = self.catalog.as_ref() else {
            // Keep the load error visible; it says why there is no catalog.
            if !matches!(&self.status, Some(s) if s.severity == Severity::Error) {
                self.report(Severity::Warning, CatalogError::Empty.to_string());
            }
            return;
        };
        let filter = self.settings.filter();
        match generate(catalog, &filter, self.settings.exercise_count, &mut self.rng) {
            Ok(plan) => {
                self.plan = Some(plan);
                self.status = None;
            }
            Err(e) => {
                self.plan = None;
                self.report(e.severity(), e.to_string());
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Workout Generator");
        ui.separator();

        ui.label("Number of exercises");
        let prev = self.settings.exercise_count;
        egui::ComboBox::from_id_source("exercise_count_combo")
            .selected_text(self.settings.exercise_count.to_string())
            .show_ui(ui, |ui| {
                for n in COUNT_OPTIONS {
                    ui.selectable_value(&mut self.settings.exercise_count, n, n.to_string());
                }
            });
        if prev != self.settings.exercise_count {
            self.settings_dirty = true;
        }

        ui.separator();
        egui::CollapsingHeader::new("Level")
            .default_open(true)
            .show(ui, |ui| {
                let options = self.settings.difficulty_options.clone();
                for opt in &options {
                    let mut on = self
                        .settings
                        .selected_difficulties
                        .as_ref()
                        .map_or(true, |s| s.contains(opt));
                    if ui.checkbox(&mut on, opt).changed() {
                        toggle_selection(
                            &mut self.settings.selected_difficulties,
                            &options,
                            opt,
                            on,
                        );
                        self.settings_dirty = true;
                    }
                }
            });

        egui::CollapsingHeader::new("Equipment")
            .default_open(true)
            .show(ui, |ui| {
                let options = self.settings.equipment_options.clone();
                for opt in &options {
                    let mut on = self
                        .settings
                        .selected_equipment
                        .as_ref()
                        .map_or(true, |s| s.contains(opt));
                    if ui.checkbox(&mut on, opt).changed() {
                        toggle_selection(&mut self.settings.selected_equipment, &options, opt, on);
                        self.settings_dirty = true;
                    }
                }
            });

        ui.separator();
        if ui.button("Generate workout").clicked() {
            self.generate_workout();
        }
        if ui.button("Refresh catalog").clicked() {
            self.reload_catalog();
        }
        if ui.button("Open catalog…").clicked() {
            if let Some(path) = FileDialog::new().add_filter("CSV", &["csv"]).pick_file() {
                self.open_catalog(path);
            }
        }
        let has_plan = self.plan.as_ref().is_some_and(|p| !p.is_empty());
        if ui
            .add_enabled(has_plan, egui::Button::new("Open in browser"))
            .clicked()
        {
            if let Some(Err(e)) = self.plan.as_ref().map(open_plan_in_browser) {
                self.report(Severity::Warning, format!("could not open browser: {e}"));
            }
        }

        ui.separator();
        if let Some(path) = &self.catalog_file {
            ui.small(path.display().to_string());
        }
        if let Some(catalog) = &self.catalog {
            ui.small(format!("{} exercises in catalog", catalog.records.len()));
        }
    }

    fn plan_table(&self, ui: &mut egui::Ui) {
        let Some(plan) = &self.plan else {
            ui.label("Choose your options and press \"Generate workout\".");
            return;
        };
        let extras: Vec<String> = self
            .catalog
            .as_ref()
            .map(|c| c.extra_headers.clone())
            .unwrap_or_default();
        let row_height = ui.text_style_height(&egui::TextStyle::Body) * 2.0;
        let mut table = egui_extras::TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(egui_extras::Column::auto())
            .column(egui_extras::Column::auto())
            .column(egui_extras::Column::auto())
            .column(egui_extras::Column::auto())
            .column(egui_extras::Column::auto());
        for _ in &extras {
            table = table.column(egui_extras::Column::auto());
        }
        table
            .column(egui_extras::Column::remainder())
            .header(row_height, |mut header| {
                for title in ["#", "Exercise", "Muscle Group", "Difficulty", "Equipment"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
                for title in &extras {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
                header.col(|ui| {
                    ui.strong("Guide");
                });
            })
            .body(|mut body| {
                for (i, ex) in plan.exercises.iter().enumerate() {
                    body.row(row_height, |mut row| {
                        row.col(|ui| {
                            ui.label((i + 1).to_string());
                        });
                        row.col(|ui| {
                            ui.label(&ex.name);
                        });
                        row.col(|ui| {
                            ui.label(&ex.muscle_group);
                        });
                        row.col(|ui| {
                            ui.label(&ex.difficulty);
                        });
                        row.col(|ui| {
                            ui.label(&ex.equipment);
                        });
                        for title in &extras {
                            row.col(|ui| {
                                let value = ex
                                    .extra
                                    .iter()
                                    .find(|(h, _)| h == title)
                                    .map(|(_, v)| v.as_str())
                                    .unwrap_or("");
                                ui.label(value);
                            });
                        }
                        row.col(|ui| {
                            if let Some(url) = ex.guide_url() {
                                ui.hyperlink_to(LINK_LABEL, url);
                            }
                        });
                    });
                }
            });
        let extra = plan.fallback().len();
        if extra > 0 {
            ui.label(format!(
                "Not enough muscle groups: the last {extra} exercises repeat a muscle group."
            ));
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        for file in ctx.input(|i| i.raw.dropped_files.clone()) {
            let Some(path) = file.path else {
                continue;
            };
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if is_csv {
                self.open_catalog(path);
            } else {
                self.report(
                    Severity::Warning,
                    format!("{} is not a CSV file", path.display()),
                );
            }
        }
    }
}

impl App for WorkoutApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.handle_dropped_files(ctx);

        egui::SidePanel::left("controls")
            .resizable(false)
            .show(ctx, |ui| self.controls(ui));

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| match &self.status {
            Some(msg) => {
                let color = match msg.severity {
                    Severity::Warning => egui::Color32::from_rgb(0xE6, 0x8A, 0x00),
                    Severity::Error => egui::Color32::RED,
                };
                ui.colored_label(color, &msg.text);
            }
            None => {
                ui.label("Ready");
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| self.plan_table(ui));
        });

        if let Some(start) = self.toast_start {
            if start.elapsed() < Duration::from_secs(3) {
                if let Some(text) = &self.toast {
                    egui::Area::new(egui::Id::new("load_toast"))
                        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
                        .show(ctx, |ui| {
                            ui.label(text);
                        });
                }
                ctx.request_repaint_after(Duration::from_millis(250));
            } else {
                self.toast_start = None;
                self.toast = None;
            }
        }

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let options = NativeOptions::default();
    eframe::run_native(
        "Workout Generator",
        options,
        Box::new(|_cc| Box::new(WorkoutApp::default())),
    )
}
