//! Turning form input into warning records
//!
//! Validation is a separate step from collection: live previews collect
//! partial data without validating, while permanent saves validate first.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;

use crate::error::{WarningError, WarningResult};
use crate::models::{FieldId, FormFields, WarningRecord, TEXT_FIELDS};

/// Maximum length of the warning details text, in characters
pub const MAX_DETAILS_CHARS: usize = 1000;

/// Checks that every required field is non-empty after trimming.
/// The error lists every empty required field in form order.
pub fn validate(fields: &FormFields) -> WarningResult<()> {
    let missing: Vec<FieldId> = TEXT_FIELDS
        .iter()
        .filter(|f| f.is_required())
        .filter(|f| fields.get(**f).map_or(true, |v| v.trim().is_empty()))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(WarningError::Validation { missing })
    }
}

/// Checks a single field; used when an input loses focus
pub fn validate_field(fields: &FormFields, field: FieldId) -> bool {
    if !field.is_required() {
        return true;
    }
    fields.get(field).map_or(true, |v| !v.trim().is_empty())
}

/// Builds a new record from the form: fresh identifier, current time, active status.
/// Does not validate.
pub fn collect(fields: &FormFields) -> WarningRecord {
    WarningRecord::new(fields.clone())
}

/// Truncates the details text to [`MAX_DETAILS_CHARS`] characters.
/// Returns true if anything was cut.
pub fn clamp_details(fields: &mut FormFields) -> bool {
    match fields
        .warning_details
        .char_indices()
        .nth(MAX_DETAILS_CHARS)
    {
        Some((byte_idx, _)) => {
            fields.warning_details.truncate(byte_idx);
            true
        }
        None => false,
    }
}

/// Character count shown under the details input, and whether it is over the limit
pub fn details_counter(fields: &FormFields) -> (usize, bool) {
    let count = fields.warning_details.chars().count();
    (count, count > MAX_DETAILS_CHARS)
}

/// Image formats accepted for the logo and signature uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Svg,
}

impl ImageKind {
    /// Identifies an image from its leading bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Png) => Some(ImageKind::Png),
            Ok(ImageFormat::Jpeg) => Some(ImageKind::Jpeg),
            Ok(ImageFormat::Gif) => Some(ImageKind::Gif),
            Ok(ImageFormat::WebP) => Some(ImageKind::Webp),
            Ok(ImageFormat::Bmp) => Some(ImageKind::Bmp),
            // SVG is text, so it has no magic bytes
            _ if looks_like_svg(bytes) => Some(ImageKind::Svg),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
            ImageKind::Bmp => "image/bmp",
            ImageKind::Svg => "image/svg+xml",
        }
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    (text.starts_with("<svg") || text.starts_with("<?xml")) && text.contains("<svg")
}

/// An uploaded image. Held in memory only; never written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub kind: ImageKind,
    pub data: Vec<u8>,
}

impl Attachment {
    /// Accepts the upload only if its content is an image
    pub fn from_bytes(file_name: impl Into<String>, data: Vec<u8>) -> WarningResult<Self> {
        let file_name = file_name.into();
        match ImageKind::sniff(&data) {
            Some(kind) => Ok(Self {
                file_name,
                kind,
                data,
            }),
            None => Err(WarningError::FileType { file_name }),
        }
    }

    /// Reads and checks an image file from disk
    pub fn from_path(path: &std::path::Path) -> WarningResult<Self> {
        let data = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {:?}: {}", path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(name, data)
    }

    /// `data:` URI for embedding the image inline in HTML
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.kind.mime_type(), STANDARD.encode(&self.data))
    }
}

/// The two image slots of the form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments {
    pub logo: Option<Attachment>,
    pub signature: Option<Attachment>,
}

impl Attachments {
    /// Stores an attachment in the slot for `field`; non-image fields are ignored
    pub fn set(&mut self, field: FieldId, attachment: Option<Attachment>) {
        match field {
            FieldId::Logo => self.logo = attachment,
            FieldId::Signature => self.signature = attachment,
            _ => {}
        }
    }

    pub fn clear(&mut self) {
        self.logo = None;
        self.signature = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> FormFields {
        FormFields {
            company: "Acme".into(),
            warning_type: "تأخير".into(),
            severity: "متوسط".into(),
            warning_date: "2024-03-01".into(),
            employee_name: "Ali".into(),
            employee_email: "ali@example.com".into(),
            warning_reason: "تكرار التأخير".into(),
            warning_details: "تأخر 5 مرات".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_complete_form() {
        assert!(validate(&complete_form()).is_ok());
    }

    #[test]
    fn test_validate_reports_missing_in_order() {
        let mut form = complete_form();
        form.employee_email = "   ".into();
        form.company.clear();

        let err = validate(&form).unwrap_err();
        match &err {
            WarningError::Validation { missing } => {
                assert_eq!(missing, &vec![FieldId::Company, FieldId::EmployeeEmail]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.first_missing(), Some(FieldId::Company));
    }

    #[test]
    fn test_validate_field_ignores_optional() {
        let form = FormFields::default();
        assert!(validate_field(&form, FieldId::EmployeeId));
        assert!(!validate_field(&form, FieldId::EmployeeName));
    }

    #[test]
    fn test_collect_assigns_fresh_identity() {
        let form = complete_form();
        let a = collect(&form);
        let b = collect(&form);
        assert_ne!(a.id, b.id);
        assert_eq!(a.fields, form);
    }

    #[test]
    fn test_clamp_details_counts_characters() {
        let mut form = FormFields::default();
        form.warning_details = "ت".repeat(MAX_DETAILS_CHARS + 5);
        assert_eq!(details_counter(&form), (MAX_DETAILS_CHARS + 5, true));

        assert!(clamp_details(&mut form));
        assert_eq!(form.warning_details.chars().count(), MAX_DETAILS_CHARS);
        assert!(!clamp_details(&mut form));
    }

    #[test]
    fn test_attachment_accepts_png() {
        let png = b"\x89PNG\r\n\x1a\n0000".to_vec();
        let attachment = Attachment::from_bytes("logo.png", png).unwrap();
        assert_eq!(attachment.kind, ImageKind::Png);
        assert!(attachment.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_attachment_accepts_svg() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        let attachment = Attachment::from_bytes("sig.svg", svg.to_vec()).unwrap();
        assert_eq!(attachment.kind, ImageKind::Svg);
    }

    #[test]
    fn test_sniff_raster_formats() {
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageKind::Webp));
        assert_eq!(ImageKind::sniff(b"BM\0\0\0\0"), Some(ImageKind::Bmp));
        assert_eq!(ImageKind::sniff(b"plain text"), None);
    }

    #[test]
    fn test_attachment_rejects_non_image() {
        let err = Attachment::from_bytes("report.pdf", b"%PDF-1.7".to_vec()).unwrap_err();
        assert!(matches!(err, WarningError::FileType { ref file_name } if file_name == "report.pdf"));
    }

    #[test]
    fn test_attachment_slots() {
        let mut slots = Attachments::default();
        let gif = Attachment::from_bytes("a.gif", b"GIF89a....".to_vec()).unwrap();
        slots.set(FieldId::Signature, Some(gif));
        slots.set(FieldId::Company, None);
        assert!(slots.signature.is_some());
        assert!(slots.logo.is_none());
        slots.clear();
        assert!(slots.signature.is_none());
    }
}
