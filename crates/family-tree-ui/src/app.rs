//! Viewer application shell
//!
//! Owns the [`ViewSession`] and the async plumbing. Fetches run on a tokio
//! runtime and drop their result into a shared slot that `update()` polls
//! every frame; the session itself is only ever touched on the UI thread.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use family_tree_core::{
    build_tree, DetailPanel, FetchError, LayoutConfig, SessionLog, Vec2, ViewEvent, ViewSession,
};
use family_tree_types::{PersonDetail, PersonId, PersonRecord};

use crate::api::ApiClient;
use crate::widget::TreeCanvas;

type Slot<T> = Arc<Mutex<Option<T>>>;

/// Startup settings, read from the environment by the binary
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub api_base: String,
    /// Where "save log" writes the recorded session
    pub log_path: PathBuf,
    /// Extra font with Arabic coverage; egui's bundled fonts have none
    pub font: Option<PathBuf>,
}

/// Initial viewport guess until the canvas reports its real size
const DEFAULT_CANVAS: Vec2 = Vec2::new(1200.0, 760.0);

/// How long to wait before polling the resize debouncer again
const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(40);

pub struct FamilyTreeApp {
    api: ApiClient,
    runtime: tokio::runtime::Runtime,

    session: Option<ViewSession>,
    log: SessionLog,
    log_path: PathBuf,

    // UI-only state
    query: String,
    canvas_size: Option<egui::Vec2>,
    status: Option<String>,
    loading: bool,

    // Async coordination
    pending_tree: Option<Slot<Result<Vec<PersonRecord>, String>>>,
    pending_detail: Option<(PersonId, Slot<Result<PersonDetail, FetchError>>)>,
}

impl FamilyTreeApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ViewerConfig) -> Result<Self, std::io::Error> {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        if let Some(path) = &config.font {
            install_font(&cc.egui_ctx, path)?;
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let mut app = Self {
            api: ApiClient::new(&config.api_base),
            runtime,
            session: None,
            log: SessionLog::new(DEFAULT_CANVAS),
            log_path: config.log_path,
            query: String::new(),
            canvas_size: None,
            status: None,
            loading: false,
            pending_tree: None,
            pending_detail: None,
        };
        app.load_tree();
        Ok(app)
    }

    // =========================================================================
    // API CALLS
    // =========================================================================

    fn load_tree(&mut self) {
        self.loading = true;
        self.status = None;

        let api = self.api.clone();
        let result = Arc::new(Mutex::new(None));
        let result_clone = result.clone();

        self.runtime.spawn(async move {
            let res = api.tree_records().await;
            if let Ok(mut slot) = result_clone.lock() {
                *slot = Some(res);
            }
        });

        self.pending_tree = Some(result);
    }

    fn fetch_detail(&mut self, id: PersonId) {
        let api = self.api.clone();
        let result = Arc::new(Mutex::new(None));
        let result_clone = result.clone();

        self.runtime.spawn(async move {
            let res = api.person(id).await;
            if let Ok(mut slot) = result_clone.lock() {
                *slot = Some(res);
            }
        });

        // A newer selection replaces the older request; its result is dropped.
        self.pending_detail = Some((id, result));
    }

    fn check_pending_requests(&mut self, now_ms: u64) {
        if let Some(res) = self.pending_tree.as_ref().and_then(take_ready) {
            self.pending_tree = None;
            self.loading = false;
            match res {
                Ok(records) => self.install_tree(records, now_ms),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to load tree");
                    self.status = Some(format!("تعذر تحميل الشجرة: {e}"));
                }
            }
        }

        let detail = self
            .pending_detail
            .as_ref()
            .and_then(|(id, slot)| take_ready(slot).map(|res| (*id, res)));
        if let Some((id, res)) = detail {
            self.pending_detail = None;
            let event = match res {
                Ok(detail) => ViewEvent::DetailLoaded(detail),
                Err(error) => ViewEvent::DetailFailed { id, error },
            };
            self.dispatch(event, now_ms);
        }
    }

    fn install_tree(&mut self, records: Vec<PersonRecord>, now_ms: u64) {
        let size = self
            .canvas_size
            .map(|s| Vec2::new(s.x, s.y))
            .unwrap_or(DEFAULT_CANVAS);
        match build_tree(records) {
            Ok(Some(tree)) => {
                tracing::info!(people = tree.len(), "tree loaded");
                self.session = Some(ViewSession::new(tree, LayoutConfig::default(), size));
                self.log = SessionLog::new(size);
                if !self.query.is_empty() {
                    self.dispatch(ViewEvent::QueryChanged(self.query.clone()), now_ms);
                }
            }
            Ok(None) => {
                self.session = None;
                self.status = Some("لا توجد بيانات بعد".to_string());
            }
            Err(e) => {
                tracing::error!(error = %e, "tree data rejected");
                self.session = None;
                self.status = Some(e.to_string());
            }
        }
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    fn dispatch(&mut self, event: ViewEvent, now_ms: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.log.record(now_ms, event.clone());
        let fetch = match session.handle(event, now_ms) {
            Ok(effects) if effects.wants_fetch() => session.detail().loading(),
            Ok(_) => None,
            Err(fault) if fault.is_recoverable() => {
                tracing::debug!(%fault, "ignored view event");
                None
            }
            Err(fault) => {
                tracing::warn!(%fault, "view event rejected");
                None
            }
        };
        if let Some(id) = fetch {
            self.fetch_detail(id);
        }
    }

    fn save_log(&mut self) {
        let result = serde_json::to_vec_pretty(&self.log)
            .map_err(std::io::Error::from)
            .and_then(|bytes| std::fs::write(&self.log_path, bytes));
        self.status = Some(match result {
            Ok(()) => {
                tracing::info!(path = %self.log_path.display(), events = self.log.len(), "session log saved");
                format!("saved {}", self.log_path.display())
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not save session log");
                e.to_string()
            }
        });
    }

    // =========================================================================
    // PANELS
    // =========================================================================

    fn toolbar(&mut self, ui: &mut egui::Ui, now_ms: u64) {
        ui.horizontal(|ui| {
            ui.heading("شجرة العائلة");
            ui.separator();

            let search = ui.add(
                egui::TextEdit::singleline(&mut self.query)
                    .hint_text("ابحث بالاسم")
                    .desired_width(220.0),
            );
            if search.changed() {
                self.dispatch(ViewEvent::QueryChanged(self.query.clone()), now_ms);
            }

            if ui.button("الشجرة كاملة").clicked() {
                self.dispatch(ViewEvent::ShowFullTree, now_ms);
            }
            if ui.button("ملاءمة الشاشة").clicked() {
                self.dispatch(ViewEvent::FitToScreen, now_ms);
            }
            if ui.button("+").clicked() {
                self.dispatch(ViewEvent::ZoomIn, now_ms);
            }
            if ui.button("−").clicked() {
                self.dispatch(ViewEvent::ZoomOut, now_ms);
            }
            ui.separator();
            if ui.add_enabled(!self.loading, egui::Button::new("تحديث")).clicked() {
                self.load_tree();
            }
            if ui.button("حفظ السجل").clicked() {
                self.save_log();
            }
            if self.loading {
                ui.spinner();
            }
            if let Some(status) = &self.status {
                ui.label(status);
            }
        });
    }

    fn detail_panel(&mut self, ctx: &egui::Context, now_ms: u64) {
        let Some(panel) = self.session.as_ref().map(|s| s.detail().clone()) else {
            return;
        };
        if !panel.is_open() {
            return;
        }

        let mut events = Vec::new();
        egui::SidePanel::right("person_detail")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("✕").clicked() {
                        events.push(ViewEvent::CloseDetail);
                    }
                });
                ui.separator();
                match &panel {
                    DetailPanel::Closed => {}
                    DetailPanel::Loading(_) => {
                        ui.spinner();
                    }
                    DetailPanel::NotFound(id) => {
                        ui.label(format!("الشخص #{id} غير موجود"));
                    }
                    DetailPanel::Failed { message, .. } => {
                        ui.colored_label(ui.visuals().error_fg_color, message);
                    }
                    DetailPanel::Loaded(detail) => {
                        person_details(ui, &self.api, detail, &mut events);
                    }
                }
            });

        for event in events {
            self.dispatch(event, now_ms);
        }
    }
}

fn person_details(ui: &mut egui::Ui, api: &ApiClient, detail: &PersonDetail, events: &mut Vec<ViewEvent>) {
    let person = &detail.person;
    ui.add(
        egui::Image::new(api.resolve(person.photo()))
            .max_size(egui::vec2(160.0, 160.0))
            .rounding(12.0),
    );
    ui.heading(&person.name);

    egui::Grid::new("person_fields").num_columns(2).show(ui, |ui| {
        for (label, value) in [
            ("تاريخ الميلاد", &person.birth_date),
            ("العمل", &person.job),
            ("النسب", &person.lineage),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                ui.label(label);
                ui.label(value);
                ui.end_row();
            }
        }
    });

    if !detail.spouses.is_empty() {
        ui.separator();
        ui.strong("الزوجات");
        for spouse in &detail.spouses {
            ui.label(&spouse.spouse_name);
        }
    }

    if !detail.children.is_empty() {
        ui.separator();
        ui.strong("الأبناء");
        for child in &detail.children {
            if ui.link(&child.name).clicked() {
                events.push(ViewEvent::SelectPerson(child.id));
            }
        }
    }

    if let Some(notes) = person.notes.as_deref().filter(|n| !n.is_empty()) {
        ui.separator();
        ui.label(notes);
    }
}

/// Put a user-supplied font ahead of the defaults in both families.
fn install_font(ctx: &egui::Context, path: &Path) -> Result<(), std::io::Error> {
    let bytes = std::fs::read(path)?;
    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("user".to_owned(), egui::FontData::from_owned(bytes));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().insert(0, "user".to_owned());
    }
    ctx.set_fonts(fonts);
    tracing::info!(path = %path.display(), "loaded font");
    Ok(())
}

/// Take a finished result out of a pending slot, if there is one.
fn take_ready<T>(slot: &Slot<T>) -> Option<T> {
    slot.lock().ok().and_then(|mut guard| guard.take())
}

impl eframe::App for FamilyTreeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now_ms = (ctx.input(|i| i.time) * 1000.0) as u64;
        self.check_pending_requests(now_ms);

        // Request repaint if async operations pending
        if self.pending_tree.is_some() || self.pending_detail.is_some() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui, now_ms));
        self.detail_panel(ctx, now_ms);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let Some(session) = self.session.as_ref() else {
                    ui.centered_and_justified(|ui| {
                        if self.loading {
                            ui.spinner();
                        } else {
                            ui.label(self.status.as_deref().unwrap_or(""));
                        }
                    });
                    return;
                };

                let scene = session.scene();
                let output = TreeCanvas::new(&scene, session.transform(), &self.api).show(ui);

                // The session starts from a guessed size until the canvas is measured.
                if self.canvas_size != Some(output.size) {
                    self.canvas_size = Some(output.size);
                    self.dispatch(
                        ViewEvent::Resize {
                            width: output.size.x,
                            height: output.size.y,
                        },
                        now_ms,
                    );
                }
                for event in output.events {
                    self.dispatch(event, now_ms);
                }
            });

        if self.session.as_ref().is_some_and(|s| s.fit_pending()) {
            self.dispatch(ViewEvent::Tick, now_ms);
            ctx.request_repaint_after(TICK_INTERVAL);
        }
    }
}
