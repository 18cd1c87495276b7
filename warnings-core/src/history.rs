//! Browsing, filtering and deleting generated warnings

use crate::error::WarningResult;
use crate::models::{FormFields, WarningRecord};
use crate::render::format_date;
use crate::storage::LocalStore;

/// Number of detail characters shown in a history listing
pub const EXCERPT_CHARS: usize = 150;

/// Truncates to `max` characters, appending "..." when anything was cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// A warning as shown in the history list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry<'a> {
    pub record: &'a WarningRecord,
    /// "date • type • company"
    pub meta_line: String,
    /// Details cut to [`EXCERPT_CHARS`] characters for display
    pub excerpt: String,
    /// Severity and reason
    pub tags: [&'a str; 2],
    /// Everything the entry shows, with the details untruncated; used for filtering
    pub text: String,
}

impl<'a> HistoryEntry<'a> {
    pub fn new(record: &'a WarningRecord) -> Self {
        let f = &record.fields;
        let meta_line = format!(
            "{} • {} • {}",
            format_date(&f.warning_date),
            f.warning_type,
            f.company
        );
        let text = [
            meta_line.as_str(),
            f.warning_details.as_str(),
            f.severity.as_str(),
            f.warning_reason.as_str(),
        ]
        .join("\n");

        Self {
            record,
            meta_line,
            excerpt: truncate_chars(&f.warning_details, EXCERPT_CHARS),
            tags: [f.severity.as_str(), f.warning_reason.as_str()],
            text,
        }
    }

    /// Case-insensitive substring match; an empty query matches everything
    pub fn matches_text(&self, query: &str) -> bool {
        query.is_empty() || self.text.to_lowercase().contains(&query.to_lowercase())
    }

    /// Exact substring match; an empty type matches everything
    pub fn matches_type(&self, warning_type: &str) -> bool {
        warning_type.is_empty() || self.text.contains(warning_type)
    }
}

/// The persisted collection of generated warnings
#[derive(Debug, Clone, Default)]
pub struct History {
    warnings: Vec<WarningRecord>,
}

impl History {
    pub fn new(warnings: Vec<WarningRecord>) -> Self {
        Self { warnings }
    }

    /// Loads the collection; corrupted storage yields an empty history
    pub fn load(store: &LocalStore) -> Self {
        Self::new(store.load_warnings())
    }

    /// Stored order (the order records were added)
    pub fn records(&self) -> &[WarningRecord] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&WarningRecord> {
        self.warnings.iter().find(|w| w.id == id)
    }

    /// Finds by full id, or by a unique id prefix of at least four characters
    pub fn find_by_prefix(&self, id: &str) -> Option<&WarningRecord> {
        if let Some(record) = self.find(id) {
            return Some(record);
        }
        if id.chars().count() < 4 {
            return None;
        }
        let mut matches = self.warnings.iter().filter(|w| w.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(record), None) => Some(record),
            _ => None,
        }
    }

    /// Appends a record and persists the whole collection.
    /// On a failed write the in-memory collection is left as it was.
    pub fn add(&mut self, record: WarningRecord, store: &LocalStore) -> WarningResult<()> {
        log::info!("Saving warning {} for '{}'", record.id, record.fields.employee_name);
        self.warnings.push(record);
        if let Err(e) = store.save_warnings(&self.warnings) {
            self.warnings.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Removes the record with `id` and persists.
    /// Returns false, without writing, when no such record exists.
    pub fn delete(&mut self, id: &str, store: &LocalStore) -> WarningResult<bool> {
        if self.find(id).is_none() {
            return Ok(false);
        }
        let remaining: Vec<WarningRecord> =
            self.warnings.iter().filter(|w| w.id != id).cloned().collect();
        store.save_warnings(&remaining)?;
        self.warnings = remaining;
        log::info!("Deleted warning {}", id);
        Ok(true)
    }

    /// All records, newest first
    pub fn list(&self) -> Vec<&WarningRecord> {
        let mut sorted: Vec<&WarningRecord> = self.warnings.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted
    }

    /// Display entries, newest first
    pub fn entries(&self) -> Vec<HistoryEntry<'_>> {
        self.list().into_iter().map(HistoryEntry::new).collect()
    }

    /// Entries whose text contains `query`, ignoring case
    pub fn filter_by_text(&self, query: &str) -> Vec<HistoryEntry<'_>> {
        self.query(query, "")
    }

    /// Entries whose text contains `warning_type` exactly
    pub fn filter_by_type(&self, warning_type: &str) -> Vec<HistoryEntry<'_>> {
        self.query("", warning_type)
    }

    /// Both filters at once, newest first
    pub fn query(&self, text: &str, warning_type: &str) -> Vec<HistoryEntry<'_>> {
        self.entries()
            .into_iter()
            .filter(|e| e.matches_text(text) && e.matches_type(warning_type))
            .collect()
    }

    /// Distinct warning types in the history, sorted; feeds the type filter
    pub fn warning_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .warnings
            .iter()
            .map(|w| w.fields.warning_type.clone())
            .filter(|t| !t.is_empty())
            .collect();
        types.sort();
        types.dedup();
        types
    }

    /// Replaces `form` with the record's field values so it can seed a new
    /// warning. The record's identifier and timestamp are not carried over.
    pub fn duplicate_into(&self, id: &str, form: &mut FormFields) -> Option<&WarningRecord> {
        let record = self.find(id)?;
        *form = record.fields.clone();
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(name: &str, warning_type: &str, minutes_ago: i64) -> WarningRecord {
        let mut record = WarningRecord::new(FormFields {
            company: "Acme".into(),
            employee_name: name.into(),
            warning_type: warning_type.into(),
            warning_date: "2024-03-01".into(),
            warning_details: format!("Details for {}", name),
            severity: "متوسط".into(),
            warning_reason: "غياب".into(),
            ..Default::default()
        });
        record.created_at = Utc::now() - Duration::minutes(minutes_ago);
        record
    }

    fn sample_history() -> History {
        History::new(vec![
            record("Ali", "تأخير", 30),
            record("Sara", "غياب", 10),
            record("Omar", "تأخير", 20),
        ])
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 150), "short");
        let long = "ب".repeat(151);
        let cut = truncate_chars(&long, 150);
        assert_eq!(cut.chars().count(), 153);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_chars(&"x".repeat(150), 150).len(), 150);
    }

    #[test]
    fn test_list_sorted_newest_first() {
        let history = sample_history();
        let names: Vec<_> = history
            .list()
            .iter()
            .map(|w| w.fields.employee_name.as_str())
            .collect();
        assert_eq!(names, vec!["Sara", "Omar", "Ali"]);
    }

    #[test]
    fn test_filter_by_text_is_case_insensitive() {
        let history = sample_history();
        assert_eq!(history.filter_by_text("").len(), 3);

        let found = history.filter_by_text("details for ALI");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record.fields.employee_name, "Ali");

        assert!(history.filter_by_text("nobody").is_empty());
    }

    #[test]
    fn test_filter_uses_full_details_not_excerpt() {
        let mut long = record("Lina", "تأخير", 5);
        long.fields.warning_details = format!("{}needle", "x".repeat(200));
        let history = History::new(vec![long]);

        let entries = history.filter_by_text("needle");
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].excerpt.contains("needle"));
    }

    #[test]
    fn test_filter_by_type() {
        let history = sample_history();
        assert_eq!(history.filter_by_type("").len(), 3);
        assert_eq!(history.filter_by_type("تأخير").len(), 2);
        assert_eq!(history.query("details for sara", "تأخير").len(), 0);
        assert_eq!(history.query("details for omar", "تأخير").len(), 1);
    }

    #[test]
    fn test_entry_display_fields() {
        let history = sample_history();
        let entries = history.entries();
        assert_eq!(entries[0].meta_line, "1 مارس 2024 • غياب • Acme");
        assert_eq!(entries[0].tags, ["متوسط", "غياب"]);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = LocalStore::in_memory();
        let mut history = sample_history();
        let id = history.records()[1].id.clone();

        assert!(history.delete(&id, &store).unwrap());
        assert_eq!(history.len(), 2);
        assert!(history.find(&id).is_none());
        assert_eq!(store.load_warnings().len(), 2);

        assert!(!history.delete(&id, &store).unwrap());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_text_filter_ignores_fields_the_entry_does_not_show() {
        let mut history = sample_history();
        history.warnings[0].fields.employee_id = "EMP-42".into();

        // The id is never shown; the name only matches through the details text
        assert!(history.filter_by_text("EMP-42").is_empty());
        assert_eq!(history.filter_by_text("Ali").len(), 1);
        assert_eq!(history.filter_by_text("acme").len(), 3);
    }

    #[test]
    fn test_find_by_prefix() {
        let history = sample_history();
        let id = history.records()[0].id.clone();
        assert_eq!(history.find_by_prefix(&id[..8]).map(|r| &r.id), Some(&id));
        assert!(history.find_by_prefix("abc").is_none());
    }

    #[test]
    fn test_duplicate_into_copies_fields_only() {
        let history = sample_history();
        let source = &history.records()[0];
        let mut form = FormFields::new();

        let found = history.duplicate_into(&source.id, &mut form).unwrap();
        assert_eq!(found.id, source.id);
        assert_eq!(form, source.fields);
        assert!(history.duplicate_into("missing", &mut form).is_none());
    }

    #[test]
    fn test_warning_types() {
        assert_eq!(sample_history().warning_types(), vec!["تأخير", "غياب"]);
    }
}
