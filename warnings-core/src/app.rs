//! The application context shared by the front ends
//!
//! `WarningApp` owns the active form, the loaded collections and the store,
//! and is the only thing that writes to storage.

use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::analytics::Analytics;
use crate::collector::{self, Attachment, Attachments};
use crate::config::Config;
use crate::error::{WarningError, WarningResult};
use crate::feedback::Section;
use crate::history::History;
use crate::models::{FieldId, FormFields, Template, Theme, WarningRecord};
use crate::render::{self, RenderedDocument};
use crate::storage::LocalStore;
use crate::templates::TemplateLibrary;

/// A history export ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub contents: String,
}

pub struct WarningApp {
    store: LocalStore,
    config: Config,
    history: History,
    templates: TemplateLibrary,
    next_number: u64,
    theme: Theme,
    /// The last generated or viewed warning
    current: Option<WarningRecord>,
    pub form: FormFields,
    pub attachments: Attachments,
}

impl WarningApp {
    /// Loads everything from `store` and restores the saved draft into a fresh form
    pub fn new(store: LocalStore, config: Config) -> Self {
        let history = History::load(&store);
        let templates = TemplateLibrary::load(&store);
        let next_number = store.load_counter();
        let theme = store.load_theme();

        let mut form = FormFields::new();
        if let Some(draft) = store.load_draft() {
            log::debug!("Restoring saved draft");
            form.fill_from(&draft);
        }

        log::debug!(
            "Loaded {} warnings and {} templates, next number {}",
            history.len(),
            templates.len(),
            next_number
        );

        Self {
            store,
            config,
            history,
            templates,
            next_number,
            theme,
            current: None,
            form,
            attachments: Attachments::default(),
        }
    }

    /// Opens the store described by `config`
    pub fn open(config: Config) -> Result<Self> {
        let path = config.store_path()?;
        let store = LocalStore::open(&path, Some(config.backend))?;
        Ok(Self::new(store, config))
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    /// The number the next generated warning will receive
    pub fn next_number(&self) -> u64 {
        self.next_number
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn current(&self) -> Option<&WarningRecord> {
        self.current.as_ref()
    }

    /// Re-reads the collection a section displays
    pub fn reload(&mut self, section: Section) {
        match section {
            Section::History | Section::Analytics => self.history = History::load(&self.store),
            Section::Templates => self.templates = TemplateLibrary::load(&self.store),
            Section::Generator => {}
        }
    }

    /// Sets a text field from user input, enforcing the details limit.
    /// Returns false for fields that are not text.
    pub fn set_field(&mut self, field: FieldId, value: impl Into<String>) -> bool {
        if !self.form.set(field, value) {
            return false;
        }
        if field == FieldId::WarningDetails && collector::clamp_details(&mut self.form) {
            log::debug!("Details truncated to {} characters", collector::MAX_DETAILS_CHARS);
        }
        true
    }

    /// Loads an image into the logo or signature slot
    pub fn attach(&mut self, field: FieldId, file_name: &str, data: Vec<u8>) -> WarningResult<()> {
        let attachment = Attachment::from_bytes(file_name, data)?;
        self.attachments.set(field, Some(attachment));
        Ok(())
    }

    pub fn detach(&mut self, field: FieldId) {
        self.attachments.set(field, None);
    }

    /// Validates the form, saves it as a new warning and advances the counter
    pub fn generate(&mut self) -> WarningResult<&WarningRecord> {
        collector::validate(&self.form)?;

        let mut record = collector::collect(&self.form);
        record.warning_number = Some(self.next_number);
        self.history.add(record.clone(), &self.store)?;

        // Not atomic with the save above; a failure here leaves the number reusable
        self.next_number += 1;
        self.store.save_counter(self.next_number)?;

        log::info!(
            "Generated warning {} ({})",
            record.number_label().unwrap_or_default(),
            record.id
        );
        Ok(self.current.insert(record))
    }

    /// The record the form currently describes, without validation
    fn working_record(&self) -> WarningRecord {
        match &self.current {
            Some(current) if current.fields == self.form => current.clone(),
            _ => {
                let mut record = collector::collect(&self.form);
                record.warning_number = Some(self.next_number);
                record
            }
        }
    }

    /// The record a live preview shows, or `None` while the form is still blank
    pub fn preview_record(&self) -> Option<WarningRecord> {
        if self.form.is_blank_for_preview() {
            return None;
        }
        Some(self.working_record())
    }

    /// Live preview markup, or `None` while the form is still blank
    pub fn preview(&self) -> Option<String> {
        self.preview_record()
            .map(|record| render::render_preview(&record, &self.attachments))
    }

    /// Preview markup, falling back to the placeholder
    pub fn preview_or_placeholder(&self) -> String {
        self.preview().unwrap_or_else(render::render_empty_preview)
    }

    /// Every output format for the form. Fails while required fields are empty.
    pub fn document(&self) -> WarningResult<RenderedDocument> {
        collector::validate(&self.form).map_err(|_| WarningError::NotGenerated)?;
        Ok(render::render(&self.working_record(), &self.attachments))
    }

    /// Standalone HTML of the form as `(file name, contents)`
    pub fn export_html(&self) -> WarningResult<(String, String)> {
        let document = self.document()?;
        let file_name = render::html_export_file_name(&self.working_record());
        Ok((file_name, document.export_html))
    }

    /// `mailto:` link addressed to the employee
    pub fn email_link(&self) -> WarningResult<String> {
        collector::validate(&self.form).map_err(|_| WarningError::NotGenerated)?;
        Ok(render::mailto_url(&self.working_record()))
    }

    /// Resets the form to an empty one dated today and drops attachments
    pub fn clear_form(&mut self) {
        self.form = FormFields::new();
        self.attachments.clear();
        self.current = None;
    }

    /// Persists the form as the draft
    pub fn autosave(&self) -> WarningResult<()> {
        self.store.save_draft(&self.form)
    }

    pub fn discard_draft(&self) -> WarningResult<()> {
        self.store.clear_draft()
    }

    pub fn set_theme(&mut self, theme: Theme) -> WarningResult<()> {
        self.theme = theme;
        self.store.save_theme(theme)
    }

    pub fn toggle_theme(&mut self) -> WarningResult<Theme> {
        let theme = self.theme.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    /// Saves the form's field set as a named template
    pub fn save_template(&mut self, name: &str, description: &str) -> WarningResult<&Template> {
        self.templates
            .save_template(name, description, &self.form, &self.store)
    }

    /// Prefills the form from a template. Returns false if it does not exist.
    pub fn use_template(&mut self, template_id: &str) -> bool {
        let applied = self.templates.apply(template_id, &mut self.form).is_some();
        if applied {
            self.current = None;
        }
        applied
    }

    pub fn delete_template(&mut self, template_id: &str) -> WarningResult<bool> {
        self.templates.delete(template_id, &self.store)
    }

    /// Replaces the form with a stored warning for reading or reprinting.
    /// Preview and exports then show that record, number included.
    pub fn view_warning(&mut self, id: &str) -> bool {
        let Some(record) = self.history.find(id).cloned() else {
            return false;
        };
        self.form = record.fields.clone();
        self.current = Some(record);
        true
    }

    /// Seeds the form from a stored warning; generating it creates a new record
    pub fn duplicate_warning(&mut self, id: &str) -> bool {
        let found = self.history.duplicate_into(id, &mut self.form).is_some();
        if found {
            self.current = None;
        }
        found
    }

    pub fn delete_warning(&mut self, id: &str) -> WarningResult<bool> {
        let deleted = self.history.delete(id, &self.store)?;
        if deleted && self.current.as_ref().is_some_and(|c| c.id == id) {
            self.current = None;
        }
        Ok(deleted)
    }

    /// The history as CSV, or `None` when there is nothing to export
    pub fn export_history(&self, today: NaiveDate) -> WarningResult<Option<CsvExport>> {
        if self.history.is_empty() {
            return Ok(None);
        }
        let contents = render::render_csv(self.history.records())?;
        Ok(Some(CsvExport {
            file_name: render::history_export_file_name(today),
            contents,
        }))
    }

    /// [`Self::export_history`] stamped with today's local date
    pub fn export_history_today(&self) -> WarningResult<Option<CsvExport>> {
        self.export_history(Local::now().date_naive())
    }

    pub fn analytics(&self) -> Analytics {
        Analytics::compute(self.history.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> WarningApp {
        WarningApp::new(LocalStore::in_memory(), Config::default().without_delays())
    }

    fn fill_required(app: &mut WarningApp) {
        app.form.company = "Acme".into();
        app.form.warning_type = "تأخير".into();
        app.form.severity = "متوسط".into();
        app.form.warning_date = "2024-03-01".into();
        app.form.employee_name = "Ali".into();
        app.form.employee_email = "ali@example.com".into();
        app.form.warning_reason = "تكرار التأخير".into();
        app.form.warning_details = "تأخر 5 مرات".into();
    }

    #[test]
    fn test_generate_requires_valid_form() {
        let mut app = app();
        let err = app.generate().unwrap_err();
        assert!(matches!(err, WarningError::Validation { .. }));
        assert!(app.history().is_empty());
        assert_eq!(app.next_number(), 1);
    }

    #[test]
    fn test_generate_stamps_and_advances_counter() {
        let mut app = app();
        fill_required(&mut app);

        let record = app.generate().unwrap();
        assert_eq!(record.warning_number, Some(1));
        assert_eq!(app.next_number(), 2);
        assert_eq!(app.store().load_counter(), 2);
        assert_eq!(app.history().len(), 1);
        assert!(app.preview().unwrap().contains("0001"));
    }

    #[test]
    fn test_preview_blank_until_key_fields() {
        let mut app = app();
        assert!(app.preview().is_none());
        assert!(app.preview_or_placeholder().contains(render::EMPTY_PREVIEW_TEXT));

        app.set_field(FieldId::Company, "Acme");
        assert!(app.preview().unwrap().contains("Acme"));
    }

    #[test]
    fn test_document_requires_complete_form() {
        let mut app = app();
        assert!(matches!(app.document(), Err(WarningError::NotGenerated)));
        assert!(matches!(app.email_link(), Err(WarningError::NotGenerated)));

        fill_required(&mut app);
        let (file_name, html) = app.export_html().unwrap();
        assert!(file_name.ends_with(".html"));
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(app.email_link().unwrap().starts_with("mailto:ali@example.com?"));
    }

    #[test]
    fn test_set_field_clamps_details() {
        let mut app = app();
        assert!(app.set_field(FieldId::WarningDetails, "x".repeat(1200)));
        assert_eq!(app.form.warning_details.chars().count(), collector::MAX_DETAILS_CHARS);
        assert!(!app.set_field(FieldId::Logo, "nope"));
    }

    #[test]
    fn test_draft_restored_on_start() {
        let store = LocalStore::in_memory();
        let mut draft = FormFields::default();
        draft.employee_name = "Sara".into();
        store.save_draft(&draft).unwrap();

        let app = WarningApp::new(store, Config::default());
        assert_eq!(app.form.employee_name, "Sara");
        // empty draft values do not wipe the default date
        assert!(!app.form.warning_date.is_empty());
    }

    #[test]
    fn test_duplicate_then_generate_creates_new_record() {
        let mut app = app();
        fill_required(&mut app);
        let original = app.generate().unwrap().clone();

        app.clear_form();
        assert!(app.duplicate_warning(&original.id));
        assert_eq!(app.form, original.fields);

        let copy = app.generate().unwrap().clone();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.warning_number, Some(2));
        assert_eq!(app.history().len(), 2);
    }

    #[test]
    fn test_view_warning_shows_its_number() {
        let mut app = app();
        fill_required(&mut app);
        let id = app.generate().unwrap().id.clone();
        app.clear_form();

        assert!(app.view_warning(&id));
        assert_eq!(app.current().map(|c| c.id.as_str()), Some(id.as_str()));
        assert!(app.preview().unwrap().contains("0001"));
        assert!(!app.view_warning("missing"));
    }

    #[test]
    fn test_view_warning_replaces_stale_form_values() {
        let mut app = app();
        fill_required(&mut app);
        let id = app.generate().unwrap().id.clone();
        app.clear_form();
        app.form.employee_id = "STALE-999".into();

        assert!(app.view_warning(&id));
        assert_eq!(app.form.employee_id, "");

        let preview = app.preview().unwrap();
        assert!(!preview.contains("STALE-999"));
        assert!(preview.contains("0001"));
        assert!(!preview.contains("0002"));

        let (file_name, html) = app.export_html().unwrap();
        assert!(file_name.contains("0001"));
        assert!(!html.contains("STALE-999"));
    }

    #[test]
    fn test_delete_current_warning() {
        let mut app = app();
        fill_required(&mut app);
        let id = app.generate().unwrap().id.clone();

        assert!(app.delete_warning(&id).unwrap());
        assert!(app.current().is_none());
        assert!(!app.delete_warning(&id).unwrap());
    }

    #[test]
    fn test_export_history() {
        let mut app = app();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(app.export_history(today).unwrap().is_none());

        fill_required(&mut app);
        app.generate().unwrap();
        let export = app.export_history(today).unwrap().unwrap();
        assert_eq!(export.file_name, "warnings-history-2024-03-01.csv");
        assert_eq!(export.contents.lines().count(), 2);
    }

    #[test]
    fn test_templates_and_theme() {
        let mut app = app();
        fill_required(&mut app);
        let id = app.save_template("Late", "").unwrap().template_id.clone();

        app.clear_form();
        assert!(app.use_template(&id));
        assert_eq!(app.form.company, "Acme");
        assert_eq!(app.form.employee_name, "");

        assert_eq!(app.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(app.store().load_theme(), Theme::Dark);
    }
}
