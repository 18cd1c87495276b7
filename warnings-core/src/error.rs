use thiserror::Error;

use crate::models::FieldId;

/// Localized message shown when required form fields are empty
pub const MSG_REQUIRED_FIELDS: &str = "يرجى ملء جميع الحقول المطلوبة";
/// Localized message shown when a template is saved without a name
pub const MSG_TEMPLATE_NAME: &str = "يرجى إدخال اسم القالب";
/// Localized message shown when an attachment is not an image
pub const MSG_INVALID_IMAGE: &str = "يرجى اختيار ملف صورة صالح";
/// Localized message shown when printing or sending before the form is complete
pub const MSG_GENERATE_FIRST: &str = "يرجى إنشاء الإنذار أولاً";
/// Generic localized message for unexpected failures
pub const MSG_UNEXPECTED: &str = "حدث خطأ غير متوقع";

/// Error type for domain operations on warnings and templates
#[derive(Debug, Error)]
pub enum WarningError {
    /// One or more required form fields are empty
    #[error("{}", MSG_REQUIRED_FIELDS)]
    Validation {
        /// Every empty required field, in form order
        missing: Vec<FieldId>,
    },

    /// Print, export or email was requested while the form is incomplete
    #[error("{}", MSG_GENERATE_FIRST)]
    NotGenerated,

    /// A template was saved with an empty name
    #[error("{}", MSG_TEMPLATE_NAME)]
    MissingTemplateName,

    /// An uploaded attachment is not an image
    #[error("{}", MSG_INVALID_IMAGE)]
    FileType {
        /// Name of the rejected file
        file_name: String,
    },

    /// A persisted value could not be parsed
    #[error("Corrupted value under key '{key}': {message}")]
    StorageParse { key: String, message: String },

    /// Backend I/O, locking or database failure
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl WarningError {
    /// The field a UI should focus after a validation failure
    pub fn first_missing(&self) -> Option<FieldId> {
        match self {
            WarningError::Validation { missing } => missing.first().copied(),
            _ => None,
        }
    }

    /// Whether the error is a user-input problem rather than a system failure
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            WarningError::Validation { .. }
                | WarningError::NotGenerated
                | WarningError::MissingTemplateName
                | WarningError::FileType { .. }
        )
    }
}

pub type WarningResult<T> = std::result::Result<T, WarningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_localized() {
        let err = WarningError::Validation {
            missing: vec![FieldId::Company, FieldId::EmployeeName],
        };
        assert_eq!(err.to_string(), MSG_REQUIRED_FIELDS);
        assert_eq!(err.first_missing(), Some(FieldId::Company));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_storage_error_is_not_user_error() {
        let err = WarningError::Storage(anyhow::anyhow!("disk full"));
        assert!(!err.is_user_error());
        assert!(err.to_string().contains("disk full"));
        assert_eq!(err.first_missing(), None);
    }
}
