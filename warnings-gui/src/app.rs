use eframe::egui;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use warnings_core::collector::{self, MAX_DETAILS_CHARS};
use warnings_core::error::MSG_UNEXPECTED;
use warnings_core::models::TEXT_FIELDS;
use warnings_core::render::{format_date, EMPTY_PREVIEW_TEXT, NOT_SPECIFIED};
use warnings_core::{
    Config, Debouncer, FieldId, IntervalTimer, LoadingState, LocalStore, Navigator, Section,
    TaskKind, TemplateModal, Theme, ToastKind, Toasts, WarningApp, WarningError, WarningRecord,
    WarningResult,
};

/// System fonts tried, in order, for Arabic glyphs
const ARABIC_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoNaskhArabic-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansArabic-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansArabic-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/GeezaPro.ttc",
    "C:\\Windows\\Fonts\\tahoma.ttf",
];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

/// Adds the first available Arabic-capable system font as a fallback
fn install_fonts(ctx: &egui::Context) {
    let Some((path, bytes)) = ARABIC_FONT_PATHS
        .iter()
        .find_map(|p| std::fs::read(p).ok().map(|bytes| (*p, bytes)))
    else {
        log::warn!("No Arabic font found; Arabic text may not render");
        return;
    };

    log::debug!("Using {} for Arabic text", path);
    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("arabic".to_owned(), egui::FontData::from_owned(bytes));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .push("arabic".to_owned());
    }
    ctx.set_fonts(fonts);
}

pub struct WarningsGui {
    app: WarningApp,
    nav: Navigator,
    toasts: Toasts,
    loading: LoadingState,
    preview_debounce: Debouncer,
    autosave: IntervalTimer,
    template_modal: TemplateModal,

    /// Record shown in the preview, refreshed after the debounce delay
    preview: Option<WarningRecord>,
    invalid_fields: HashSet<FieldId>,
    focus_field: Option<FieldId>,

    // History filters
    search_text: String,
    type_filter: String,

    // Confirmations
    confirm_clear: bool,
    confirm_delete_warning: Option<String>,

    // Pending operations (to avoid borrow checker issues)
    pending_section: Option<Section>,
    pending_view: Option<String>,
    pending_duplicate: Option<String>,
    pending_use_template: Option<String>,
    pending_delete_template: Option<String>,
}

impl WarningsGui {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        install_fonts(&cc.egui_ctx);

        let now = Instant::now();
        let config = Config::load_or_default().unwrap_or_else(|e| {
            log::error!("Failed to load config: {:#}", e);
            Config::default()
        });
        let mut toasts = Toasts::new(config.toast_lifetime());

        let app = match WarningApp::open(config.clone()) {
            Ok(app) => app,
            Err(e) => {
                log::error!("Failed to open store: {:#}", e);
                toasts.error(MSG_UNEXPECTED, now);
                WarningApp::new(LocalStore::in_memory(), config)
            }
        };

        let preview = app.preview_record();
        let preview_debounce = Debouncer::new(app.config().preview_debounce());
        let autosave = IntervalTimer::new(app.config().autosave_interval(), now);

        Self {
            app,
            nav: Navigator::default(),
            toasts,
            loading: LoadingState::default(),
            preview_debounce,
            autosave,
            template_modal: TemplateModal::default(),
            preview,
            invalid_fields: HashSet::new(),
            focus_field: None,
            search_text: String::new(),
            type_filter: String::new(),
            confirm_clear: false,
            confirm_delete_warning: None,
            pending_section: None,
            pending_view: None,
            pending_duplicate: None,
            pending_use_template: None,
            pending_delete_template: None,
        }
    }

    /// Shows a user error as is; anything else is logged and reported generically
    fn report_error(&mut self, error: WarningError, now: Instant) {
        if error.is_user_error() {
            self.toasts.error(error.to_string(), now);
        } else {
            log::error!("{:#}", error);
            self.toasts.error(MSG_UNEXPECTED, now);
        }
    }

    fn report(&mut self, result: WarningResult<()>, success: &str, now: Instant) {
        match result {
            Ok(()) => {
                self.toasts.success(success, now);
            }
            Err(e) => self.report_error(e, now),
        }
    }

    fn form_changed(&mut self, now: Instant) {
        self.preview_debounce.trigger(now);
    }

    fn refresh_preview(&mut self) {
        self.preview = self.app.preview_record();
    }

    fn go_to(&mut self, section: Section) {
        if let Some(section) = self.nav.show(section) {
            self.app.reload(section);
        }
    }

    fn run_pending(&mut self, now: Instant) {
        if let Some(section) = self.pending_section.take() {
            self.go_to(section);
        }
        if let Some(id) = self.pending_view.take() {
            if self.app.view_warning(&id) {
                self.invalid_fields.clear();
                self.refresh_preview();
                self.go_to(Section::Generator);
            }
        }
        if let Some(id) = self.pending_duplicate.take() {
            if self.app.duplicate_warning(&id) {
                self.invalid_fields.clear();
                self.refresh_preview();
                self.go_to(Section::Generator);
                self.toasts.success("تم نسخ الإنذار", now);
            }
        }
        if let Some(id) = self.pending_use_template.take() {
            if self.app.use_template(&id) {
                self.refresh_preview();
                self.go_to(Section::Generator);
                self.toasts.success("تم تحميل القالب بنجاح", now);
            }
        }
        if let Some(id) = self.pending_delete_template.take() {
            let result = self.app.delete_template(&id).map(|_| ());
            self.report(result, "تم حذف القالب", now);
        }
    }

    fn tick(&mut self, now: Instant) {
        self.toasts.prune(now);

        if let Some(task) = self.loading.poll(now) {
            self.finish_task(task, now);
        }
        if self.preview_debounce.poll(now) {
            self.refresh_preview();
        }
        if self.autosave.poll(now) {
            if let Err(e) = self.app.autosave() {
                log::error!("Autosave failed: {:#}", e);
            }
        }
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let next = [
            self.toasts.next_expiry(),
            self.loading.deadline(),
            self.preview_debounce.deadline(),
            Some(self.autosave.next_due()),
        ]
        .into_iter()
        .flatten()
        .min();

        if let Some(deadline) = next {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn start_generate(&mut self, now: Instant) {
        match collector::validate(&self.app.form) {
            Ok(()) => {
                self.invalid_fields.clear();
                let delay = self.app.config().generate_delay();
                self.loading.start(TaskKind::Generate, now, delay);
            }
            Err(e) => {
                if let WarningError::Validation { missing } = &e {
                    self.invalid_fields = missing.iter().copied().collect();
                }
                self.focus_field = e.first_missing();
                self.toasts.error(e.to_string(), now);
            }
        }
    }

    fn start_export(&mut self, now: Instant) {
        match self.app.document() {
            Ok(_) => {
                let delay = self.app.config().export_delay();
                self.loading.start(TaskKind::ExportHtml, now, delay);
            }
            Err(e) => self.report_error(e, now),
        }
    }

    fn finish_task(&mut self, task: TaskKind, now: Instant) {
        match task {
            TaskKind::Generate => match self.app.generate() {
                Ok(_) => {
                    self.refresh_preview();
                    self.toasts.success("تم إنشاء الإنذار بنجاح", now);
                }
                Err(e) => self.report_error(e, now),
            },
            TaskKind::ExportHtml => self.save_html(now),
        }
    }

    fn save_html(&mut self, now: Instant) {
        let (file_name, html) = match self.app.export_html() {
            Ok(export) => export,
            Err(e) => return self.report_error(e, now),
        };

        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&file_name)
            .add_filter("HTML", &["html"])
            .save_file()
        else {
            return;
        };

        let result = write_file(&path, &html);
        self.report(result, "تم تحميل الملف بنجاح", now);
    }

    /// Writes the standalone document to a temp file and opens it for printing
    fn print(&mut self, now: Instant) {
        let (file_name, html) = match self.app.export_html() {
            Ok(export) => export,
            Err(e) => return self.report_error(e, now),
        };

        let path = std::env::temp_dir().join(file_name);
        if let Err(e) = write_file(&path, &html) {
            return self.report_error(e, now);
        }
        if let Err(e) = open::that(&path) {
            log::error!("Failed to open {:?}: {}", path, e);
            self.toasts.error(MSG_UNEXPECTED, now);
        }
    }

    fn send_email(&mut self, now: Instant) {
        let url = match self.app.email_link() {
            Ok(url) => url,
            Err(e) => return self.report_error(e, now),
        };
        if let Err(e) = open::that(&url) {
            log::error!("Failed to open mail client: {}", e);
            self.toasts.error(MSG_UNEXPECTED, now);
        }
    }

    fn copy_email_body(&mut self, now: Instant) {
        let body = match self.app.document() {
            Ok(document) => document.email_body,
            Err(e) => return self.report_error(e, now),
        };
        match arboard::Clipboard::new().and_then(|mut c| c.set_text(body)) {
            Ok(()) => {
                self.toasts.info("تم نسخ نص البريد", now);
            }
            Err(e) => {
                log::error!("Clipboard unavailable: {}", e);
                self.toasts.error(MSG_UNEXPECTED, now);
            }
        }
    }

    fn pick_attachment(&mut self, field: FieldId, now: Instant) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let result = match std::fs::read(&path) {
            Ok(bytes) => self.app.attach(field, &file_name, bytes),
            Err(e) => Err(WarningError::Storage(
                anyhow::Error::new(e).context(format!("Failed to read {:?}", path)),
            )),
        };
        match result {
            Ok(()) => self.form_changed(now),
            Err(e) => self.report_error(e, now),
        }
    }

    fn export_csv(&mut self, now: Instant) {
        let export = match self.app.export_history_today() {
            Ok(Some(export)) => export,
            Ok(None) => {
                self.toasts.warning("لا توجد بيانات للتصدير", now);
                return;
            }
            Err(e) => return self.report_error(e, now),
        };

        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&export.file_name)
            .add_filter("CSV", &["csv"])
            .save_file()
        else {
            return;
        };

        let result = write_file(&path, &export.contents);
        self.report(result, "تم تصدير السجل بنجاح", now);
    }

    fn save_template(&mut self, now: Instant) {
        let name = self.template_modal.name.clone();
        let description = self.template_modal.description.clone();
        match self.app.save_template(&name, &description) {
            Ok(_) => {
                self.template_modal.close();
                self.toasts.success("تم حفظ القالب بنجاح", now);
            }
            Err(e) => self.report_error(e, now),
        }
    }

    fn toggle_theme(&mut self, now: Instant) {
        if let Err(e) = self.app.toggle_theme() {
            self.report_error(e, now);
        }
    }

    // ------------------------------------------------------------------
    // Panels
    // ------------------------------------------------------------------

    fn show_top_panel(&mut self, ctx: &egui::Context, now: Instant) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.heading("مولد الإنذارات");
                ui.separator();

                for section in Section::ALL {
                    let selected = self.nav.current() == section;
                    if ui.selectable_label(selected, section.label()).clicked() {
                        self.pending_section = Some(section);
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let icon = match self.app.theme() {
                        Theme::Light => "🌙",
                        Theme::Dark => "☀",
                    };
                    if ui.button(icon).clicked() {
                        self.toggle_theme(now);
                    }
                    ui.label(format!("الإنذارات: {}", self.app.history().len()));
                });
            });
        });
    }

    fn show_generator(&mut self, ui: &mut egui::Ui, now: Instant) {
        ui.columns(2, |columns| {
            self.show_form(&mut columns[0], now);
            self.show_preview(&mut columns[1]);
        });
    }

    fn show_form(&mut self, ui: &mut egui::Ui, now: Instant) {
        ui.heading("بيانات الإنذار");
        ui.separator();

        egui::ScrollArea::vertical()
            .id_salt("form_scroll")
            .show(ui, |ui| {
                let mut changed = false;

                egui::Grid::new("form_grid")
                    .num_columns(2)
                    .spacing([20.0, 8.0])
                    .show(ui, |ui| {
                        for field in TEXT_FIELDS {
                            changed |= self.show_field(ui, field);
                            ui.end_row();
                        }

                        ui.label("");
                        changed |= ui
                            .checkbox(
                                &mut self.app.form.require_employee_signature,
                                FieldId::RequireEmployeeSignature.label(),
                            )
                            .changed();
                        ui.end_row();

                        for field in [FieldId::Logo, FieldId::Signature] {
                            ui.label(field.label());
                            self.show_attachment(ui, field, now);
                            ui.end_row();
                        }
                    });

                if changed {
                    self.form_changed(now);
                }

                ui.add_space(12.0);
                ui.horizontal_wrapped(|ui| {
                    if ui.button("✅ إنشاء الإنذار").clicked() {
                        self.start_generate(now);
                    }
                    if ui.button("🖨 طباعة").clicked() {
                        self.print(now);
                    }
                    if ui.button("💾 تحميل").clicked() {
                        self.start_export(now);
                    }
                    if ui.button("✉ إرسال بالبريد").clicked() {
                        self.send_email(now);
                    }
                    if ui.button("📋 نسخ نص البريد").clicked() {
                        self.copy_email_body(now);
                    }
                    if ui.button("📑 حفظ كقالب").clicked() {
                        self.template_modal.open();
                    }
                    if ui.button("🗑 مسح النموذج").clicked() {
                        self.confirm_clear = true;
                    }
                });
            });
    }

    /// One labelled input; returns true when the value changed
    fn show_field(&mut self, ui: &mut egui::Ui, field: FieldId) -> bool {
        let invalid = self.invalid_fields.contains(&field);
        let label = if field.is_required() {
            format!("{} *", field.label())
        } else {
            field.label().to_string()
        };
        if invalid {
            ui.colored_label(ui.visuals().error_fg_color, label);
        } else {
            ui.label(label);
        }

        let (count, over) = collector::details_counter(&self.app.form);
        let Some(value) = self.app.form.get_mut(field) else {
            return false;
        };

        let response = match field {
            FieldId::WarningDetails => {
                // Counter sits under the input, in the same grid cell
                ui.vertical(|ui| {
                    let response = ui.add(
                        egui::TextEdit::multiline(value)
                            .char_limit(MAX_DETAILS_CHARS)
                            .desired_rows(5)
                            .desired_width(f32::INFINITY),
                    );
                    let counter = format!("{} / {}", count, MAX_DETAILS_CHARS);
                    if over {
                        ui.colored_label(ui.visuals().error_fg_color, counter);
                    } else {
                        ui.weak(counter);
                    }
                    response
                })
                .inner
            }
            FieldId::Consequences => ui.add(
                egui::TextEdit::multiline(value)
                    .desired_rows(3)
                    .desired_width(f32::INFINITY),
            ),
            FieldId::WarningDate => ui.add(
                egui::TextEdit::singleline(value)
                    .hint_text("YYYY-MM-DD")
                    .desired_width(f32::INFINITY),
            ),
            _ => ui.add(egui::TextEdit::singleline(value).desired_width(f32::INFINITY)),
        };

        if self.focus_field == Some(field) {
            response.request_focus();
            self.focus_field = None;
        }

        if field == FieldId::WarningDetails && response.changed() {
            collector::clamp_details(&mut self.app.form);
        }

        // Re-check required fields when leaving them, and clear the mark once fixed
        if field.is_required() && (response.lost_focus() || (invalid && response.changed())) {
            if collector::validate_field(&self.app.form, field) {
                self.invalid_fields.remove(&field);
            } else if response.lost_focus() {
                self.invalid_fields.insert(field);
            }
        }

        response.changed()
    }

    fn show_attachment(&mut self, ui: &mut egui::Ui, field: FieldId, now: Instant) {
        let current = match field {
            FieldId::Logo => self.app.attachments.logo.as_ref(),
            _ => self.app.attachments.signature.as_ref(),
        }
        .map(|a| a.file_name.clone());

        ui.horizontal(|ui| {
            if ui.button("📂 اختيار صورة").clicked() {
                self.pick_attachment(field, now);
            }
            if let Some(name) = current {
                ui.label(format!("✔ {}", name));
                if ui.small_button("✖").clicked() {
                    self.app.detach(field);
                    self.form_changed(now);
                }
            }
        });
    }

    fn show_preview(&mut self, ui: &mut egui::Ui) {
        ui.heading("معاينة الإنذار");
        ui.separator();

        let Some(record) = &self.preview else {
            ui.vertical_centered(|ui| {
                ui.add_space(100.0);
                ui.label(egui::RichText::new("📄").size(48.0));
                ui.label(EMPTY_PREVIEW_TEXT);
            });
            return;
        };

        let f = &record.fields;
        let or_unspecified = |value: &str| {
            if value.trim().is_empty() {
                NOT_SPECIFIED.to_string()
            } else {
                value.to_string()
            }
        };

        egui::ScrollArea::vertical()
            .id_salt("preview_scroll")
            .show(ui, |ui| {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            let company = if f.company.trim().is_empty() {
                                "اسم الشركة"
                            } else {
                                f.company.as_str()
                            };
                            ui.heading(company);
                            if !f.department.trim().is_empty() {
                                ui.label(&f.department);
                            }
                            if let Some(logo) = &self.app.attachments.logo {
                                ui.weak(format!("🖼 {}", logo.file_name));
                            }
                        });
                        if let Some(number) = record.number_label() {
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    ui.strong(format!("إنذار رقم {}", number));
                                },
                            );
                        }
                    });
                    ui.separator();

                    egui::Grid::new("preview_meta")
                        .num_columns(2)
                        .spacing([40.0, 6.0])
                        .striped(true)
                        .show(ui, |ui| {
                            let rows = [
                                (FieldId::WarningType, or_unspecified(&f.warning_type)),
                                (FieldId::Severity, or_unspecified(&f.severity)),
                                (FieldId::WarningDate, or_unspecified(&format_date(&f.warning_date))),
                                (FieldId::EmployeeName, or_unspecified(&f.employee_name)),
                                (FieldId::EmployeeId, or_unspecified(&f.employee_id)),
                                (FieldId::EmployeePosition, or_unspecified(&f.employee_position)),
                                (FieldId::EmployeeEmail, or_unspecified(&f.employee_email)),
                                (FieldId::WarningReason, or_unspecified(&f.warning_reason)),
                            ];
                            for (field, value) in rows {
                                ui.strong(field.label());
                                ui.label(value);
                                ui.end_row();
                            }
                        });

                    ui.add_space(8.0);
                    ui.strong("تفاصيل الإنذار:");
                    ui.label(or_unspecified(&f.warning_details));

                    if !f.consequences.trim().is_empty() {
                        ui.add_space(8.0);
                        ui.strong("العواقب المترتبة:");
                        ui.label(&f.consequences);
                    }

                    ui.add_space(16.0);
                    ui.separator();
                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            ui.weak("توقيع المدير");
                            match &self.app.attachments.signature {
                                Some(signature) => ui.label(format!("🖊 {}", signature.file_name)),
                                None => ui.label("______________"),
                            };
                            ui.label(if f.manager_name.trim().is_empty() {
                                "اسم المدير"
                            } else {
                                f.manager_name.as_str()
                            });
                            ui.weak(if f.manager_position.trim().is_empty() {
                                "المنصب"
                            } else {
                                f.manager_position.as_str()
                            });
                        });
                        if f.require_employee_signature {
                            ui.add_space(40.0);
                            ui.vertical(|ui| {
                                ui.weak("توقيع الموظف");
                                ui.label("______________");
                                ui.label(or_unspecified(&f.employee_name));
                                ui.weak("التاريخ: ___________");
                            });
                        }
                    });
                });
            });
    }

    fn show_history(&mut self, ui: &mut egui::Ui, now: Instant) {
        ui.horizontal(|ui| {
            ui.heading("سجل الإنذارات");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("📤 تصدير CSV").clicked() {
                    self.export_csv(now);
                }
            });
        });
        ui.separator();

        ui.horizontal(|ui| {
            ui.label("بحث:");
            ui.text_edit_singleline(&mut self.search_text);

            ui.label("النوع:");
            let selected = if self.type_filter.is_empty() {
                "الكل".to_string()
            } else {
                self.type_filter.clone()
            };
            egui::ComboBox::from_id_salt("type_filter_combo")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.type_filter, String::new(), "الكل");
                    for warning_type in self.app.history().warning_types() {
                        ui.selectable_value(
                            &mut self.type_filter,
                            warning_type.clone(),
                            warning_type,
                        );
                    }
                });
        });
        ui.separator();

        if self.app.history().is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.label("لا توجد إنذارات محفوظة");
            });
            return;
        }

        let mut view = None;
        let mut duplicate = None;
        let mut delete = None;

        egui::ScrollArea::vertical()
            .id_salt("history_scroll")
            .show(ui, |ui| {
                for entry in self.app.history().query(&self.search_text, &self.type_filter) {
                    let record = entry.record;
                    ui.group(|ui| {
                        ui.horizontal(|ui| {
                            let title = match record.number_label() {
                                Some(number) => {
                                    format!("{} • {}", number, record.fields.employee_name)
                                }
                                None => record.fields.employee_name.clone(),
                            };
                            ui.strong(title);
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("🗑 حذف").clicked() {
                                        delete = Some(record.id.clone());
                                    }
                                    if ui.small_button("📄 نسخ").clicked() {
                                        duplicate = Some(record.id.clone());
                                    }
                                    if ui.small_button("👁 عرض").clicked() {
                                        view = Some(record.id.clone());
                                    }
                                },
                            );
                        });
                        ui.weak(&entry.meta_line);
                        if !entry.excerpt.is_empty() {
                            ui.label(&entry.excerpt);
                        }
                        ui.horizontal(|ui| {
                            for tag in entry.tags.iter().filter(|t| !t.is_empty()) {
                                ui.small(format!("[{}]", tag));
                            }
                        });
                    });
                }
            });

        self.pending_view = view.or(self.pending_view.take());
        self.pending_duplicate = duplicate.or(self.pending_duplicate.take());
        if delete.is_some() {
            self.confirm_delete_warning = delete;
        }
    }

    fn show_templates(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("القوالب");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("➕ حفظ النموذج الحالي كقالب").clicked() {
                    self.template_modal.open();
                }
            });
        });
        ui.separator();

        if self.app.templates().is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.label("لا توجد قوالب محفوظة");
            });
            return;
        }

        let mut use_template = None;
        let mut delete_template = None;

        egui::ScrollArea::vertical()
            .id_salt("templates_scroll")
            .show(ui, |ui| {
                for template in self.app.templates().list() {
                    ui.group(|ui| {
                        ui.horizontal(|ui| {
                            ui.strong(&template.template_name);
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("🗑 حذف").clicked() {
                                        delete_template = Some(template.template_id.clone());
                                    }
                                    if ui.small_button("📥 استخدام").clicked() {
                                        use_template = Some(template.template_id.clone());
                                    }
                                },
                            );
                        });
                        ui.label(template.description_or_placeholder());
                        let f = &template.fields;
                        let summary: Vec<&str> =
                            [f.warning_type.as_str(), f.severity.as_str(), f.company.as_str()]
                                .into_iter()
                                .filter(|v| !v.is_empty())
                                .collect();
                        if !summary.is_empty() {
                            ui.weak(summary.join(" • "));
                        }
                    });
                }
            });

        if use_template.is_some() {
            self.pending_use_template = use_template;
        }
        if delete_template.is_some() {
            self.pending_delete_template = delete_template;
        }
    }

    fn show_analytics(&mut self, ui: &mut egui::Ui) {
        ui.heading("الإحصائيات");
        ui.separator();

        let analytics = self.app.analytics();
        ui.label(
            egui::RichText::new(format!("إجمالي الإنذارات: {}", analytics.total)).size(18.0),
        );
        if analytics.total == 0 {
            return;
        }

        let groups = [
            ("حسب النوع", &analytics.by_type),
            ("حسب درجة الخطورة", &analytics.by_severity),
            ("حسب الشهر", &analytics.by_month),
        ];

        egui::ScrollArea::vertical()
            .id_salt("analytics_scroll")
            .show(ui, |ui| {
                for (title, counts) in groups {
                    ui.add_space(12.0);
                    ui.strong(title);
                    egui::Grid::new(title)
                        .num_columns(2)
                        .spacing([20.0, 6.0])
                        .show(ui, |ui| {
                            for (label, count) in counts {
                                ui.label(label);
                                let fraction = *count as f32 / analytics.total as f32;
                                ui.add(
                                    egui::ProgressBar::new(fraction)
                                        .text(count.to_string())
                                        .desired_width(300.0),
                                );
                                ui.end_row();
                            }
                        });
                }
            });
    }

    // ------------------------------------------------------------------
    // Overlays
    // ------------------------------------------------------------------

    fn show_template_modal(&mut self, ctx: &egui::Context, now: Instant) {
        if !self.template_modal.is_open {
            return;
        }

        let mut save = false;
        let mut cancel = false;

        egui::Window::new("📑 حفظ كقالب")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Grid::new("template_modal_grid")
                    .num_columns(2)
                    .spacing([20.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("اسم القالب:");
                        ui.text_edit_singleline(&mut self.template_modal.name);
                        ui.end_row();

                        ui.label("الوصف:");
                        ui.text_edit_multiline(&mut self.template_modal.description);
                        ui.end_row();
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("💾 حفظ").clicked() {
                        save = true;
                    }
                    if ui.button("إلغاء").clicked() {
                        cancel = true;
                    }
                });
            });

        if save {
            self.save_template(now);
        } else if cancel {
            self.template_modal.close();
        }
    }

    fn show_confirmations(&mut self, ctx: &egui::Context, now: Instant) {
        if self.confirm_clear {
            let mut answer = None;
            confirm_window(ctx, "هل أنت متأكد من مسح جميع البيانات؟", &mut answer);
            if let Some(confirmed) = answer {
                self.confirm_clear = false;
                if confirmed {
                    self.app.clear_form();
                    self.invalid_fields.clear();
                    self.refresh_preview();
                    self.toasts.success("تم مسح النموذج", now);
                }
            }
        }

        if let Some(id) = self.confirm_delete_warning.clone() {
            let mut answer = None;
            confirm_window(ctx, "هل أنت متأكد من حذف هذا الإنذار؟", &mut answer);
            if let Some(confirmed) = answer {
                self.confirm_delete_warning = None;
                if confirmed {
                    let result = self.app.delete_warning(&id).map(|_| ());
                    self.report(result, "تم حذف الإنذار", now);
                }
            }
        }
    }

    fn show_loading(&self, ctx: &egui::Context) {
        if !self.loading.is_active() {
            return;
        }

        egui::Window::new("loading")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new());
                    ui.label("جاري المعالجة...");
                });
            });
    }

    fn show_toasts(&mut self, ctx: &egui::Context) {
        let mut dismissed = None;

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 48.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in self.toasts.visible() {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.horizontal(|ui| {
                            let color = toast_color(toast.kind, ui.visuals());
                            ui.colored_label(color, toast.kind.icon());
                            ui.label(&toast.message);
                            if ui.small_button("✖").clicked() {
                                dismissed = Some(toast.id);
                            }
                        });
                    });
                    ui.add_space(4.0);
                }
            });

        if let Some(id) = dismissed {
            self.toasts.dismiss(id);
        }
    }
}

fn toast_color(kind: ToastKind, visuals: &egui::Visuals) -> egui::Color32 {
    match kind {
        ToastKind::Success => egui::Color32::from_rgb(16, 185, 129),
        ToastKind::Error => visuals.error_fg_color,
        ToastKind::Warning => visuals.warn_fg_color,
        ToastKind::Info => egui::Color32::from_rgb(59, 130, 246),
    }
}

/// Yes/no dialog; `answer` is set once the user picks
fn confirm_window(ctx: &egui::Context, question: &str, answer: &mut Option<bool>) {
    egui::Window::new("⚠ تأكيد")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(question);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("نعم").clicked() {
                    *answer = Some(true);
                }
                if ui.button("إلغاء").clicked() {
                    *answer = Some(false);
                }
            });
        });
}

fn write_file(path: &Path, contents: &str) -> WarningResult<()> {
    std::fs::write(path, contents)
        .map_err(|e| anyhow::Error::new(e).context(format!("Failed to write {:?}", path)))?;
    Ok(())
}

impl eframe::App for WarningsGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        ctx.set_visuals(match self.app.theme() {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        });

        // Handle pending operations (to avoid borrow checker issues)
        self.run_pending(now);
        self.tick(now);

        self.show_top_panel(ctx, now);

        let enabled = !self.loading.is_active();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| match self.nav.current() {
                Section::Generator => self.show_generator(ui, now),
                Section::History => self.show_history(ui, now),
                Section::Templates => self.show_templates(ui),
                Section::Analytics => self.show_analytics(ui),
            });
        });

        self.show_template_modal(ctx, now);
        self.show_confirmations(ctx, now);
        self.show_loading(ctx);
        self.show_toasts(ctx);

        self.schedule_repaint(ctx, now);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.app.autosave() {
            log::error!("Failed to save draft on exit: {:#}", e);
        }
    }
}
