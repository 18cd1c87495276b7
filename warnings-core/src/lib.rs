pub mod analytics;
pub mod app;
pub mod collector;
pub mod config;
pub mod db;
pub mod error;
pub mod feedback;
pub mod history;
pub mod models;
pub mod render;
pub mod storage;
pub mod templates;

// Re-export commonly used types
pub use analytics::Analytics;
pub use app::{CsvExport, WarningApp};
pub use collector::{Attachment, Attachments, ImageKind};
pub use config::{get_config_path, Config};
pub use db::{BackendType, KeyValueBackend};
pub use error::{WarningError, WarningResult};
pub use feedback::{
    Debouncer, IntervalTimer, LoadingState, Navigator, Section, TaskKind, TemplateModal, Toast,
    ToastKind, Toasts,
};
pub use history::{History, HistoryEntry};
pub use models::{FieldId, FormFields, Template, Theme, WarningRecord, WarningStatus};
pub use render::RenderedDocument;
pub use storage::LocalStore;
pub use templates::TemplateLibrary;
