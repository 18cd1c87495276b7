//! Rendering a warning into its output formats
//!
//! One function per format: the interactive preview fragment, the standalone
//! HTML document, the email subject/body/`mailto:` URL, and CSV rows. None of
//! them touch the UI or the store, so each is testable on its own.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::collector::Attachments;
use crate::models::WarningRecord;

/// Shown in the preview wherever a value was not provided
pub const NOT_SPECIFIED: &str = "غير محدد";

/// Shown in the preview area before anything has been entered
pub const EMPTY_PREVIEW_TEXT: &str = "املأ النموذج لرؤية معاينة الإنذار";

const ARABIC_MONTHS: [&str; 12] = [
    "يناير",
    "فبراير",
    "مارس",
    "أبريل",
    "مايو",
    "يونيو",
    "يوليو",
    "أغسطس",
    "سبتمبر",
    "أكتوبر",
    "نوفمبر",
    "ديسمبر",
];

/// Header row of the history CSV export
pub const CSV_HEADERS: [&str; 8] = [
    "رقم الإنذار",
    "اسم الموظف",
    "البريد الإلكتروني",
    "نوع الإنذار",
    "درجة الخطورة",
    "سبب الإنذار",
    "التاريخ",
    "الشركة",
];

/// Characters `encodeURIComponent` leaves alone are unreserved here too
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const EXPORT_STYLE: &str = r#"
        body { font-family: Arial, sans-serif; direction: rtl; text-align: right; margin: 20px; }
        .warning-document { max-width: 800px; margin: 0 auto; padding: 20px; border: 1px solid #ddd; position: relative; }
        .document-watermark { position: absolute; top: 40%; left: 0; right: 0; text-align: center; font-size: 64px; color: rgba(0, 0, 0, 0.05); transform: rotate(-30deg); pointer-events: none; }
        .document-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 20px; border-bottom: 2px solid #333; padding-bottom: 10px; }
        .company-logo { max-height: 80px; }
        .warning-badge { background: #fef3c7; color: #92400e; padding: 10px 20px; border-radius: 5px; font-weight: bold; }
        .document-meta { display: grid; grid-template-columns: 1fr 1fr; gap: 10px; margin-bottom: 20px; padding: 15px; background: #f8fafc; border-radius: 5px; }
        .meta-item { margin-bottom: 10px; }
        .meta-label { display: block; font-size: 12px; color: #666; font-weight: bold; }
        .meta-value { font-weight: bold; color: #333; }
        .document-content { margin-bottom: 30px; }
        .content-section { margin-bottom: 20px; }
        .content-section h4 { color: #333; margin-bottom: 10px; font-weight: bold; }
        .content-text { line-height: 1.8; color: #555; }
        .document-footer { display: flex; justify-content: space-between; margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; }
        .signature-section { text-align: center; }
        .signature-image { max-height: 80px; }
        .signature-line { width: 200px; height: 1px; background: #000; margin: 20px auto 10px; }
        .signature-label { font-size: 12px; color: #666; }
"#;

/// Formats an ISO date as day, Arabic month name, year: `2024-03-01` → `1 مارس 2024`.
///
/// Full RFC 3339 timestamps use their date portion. Empty input gives an empty
/// string; anything unparseable is returned unchanged.
pub fn format_date(date: &str) -> String {
    let date = date.trim();
    if date.is_empty() {
        return String::new();
    }
    match parse_date(date) {
        Some(d) => format!("{} {} {}", d.day(), month_name(d.month()), d.year()),
        None => date.to_string(),
    }
}

/// Formats the month of an ISO date: `2024-03-01` → `مارس 2024`
pub fn format_month(date: &str) -> Option<String> {
    parse_date(date.trim()).map(|d| format!("{} {}", month_name(d.month()), d.year()))
}

/// Parses `YYYY-MM-DD` or an RFC 3339 timestamp
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(date).ok().map(|dt| dt.date_naive()))
}

fn month_name(month: u32) -> &'static str {
    ARABIC_MONTHS[(month as usize).saturating_sub(1) % 12]
}

/// Escapes text for insertion into HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text and turns newlines into `<br>`
fn html_multiline(text: &str) -> String {
    escape_html(&text.replace("\r\n", "\n")).replace('\n', "<br>")
}

/// Escaped value, or the placeholder when empty
fn or_not_specified(value: &str) -> String {
    or_fallback(value, NOT_SPECIFIED)
}

fn or_fallback(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        escape_html(fallback)
    } else {
        escape_html(value)
    }
}

fn meta_item(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(
        "        <div class=\"meta-item\">\n            <span class=\"meta-label\">{}</span>\n            <span class=\"meta-value\">{}</span>\n        </div>\n",
        label, value
    ));
}

/// Renders the preview fragment for a record
pub fn render_preview(record: &WarningRecord, attachments: &Attachments) -> String {
    let f = &record.fields;
    let mut html = String::new();

    html.push_str(&format!(
        "<div class=\"document-watermark\">{}</div>\n",
        or_fallback(&f.company, "الشركة")
    ));

    // Header
    html.push_str("<div class=\"document-header\">\n    <div class=\"company-info\">\n");
    if let Some(logo) = &attachments.logo {
        html.push_str(&format!(
            "        <img src=\"{}\" alt=\"شعار الشركة\" class=\"company-logo\">\n",
            logo.data_uri()
        ));
    }
    html.push_str(&format!("        <h2>{}</h2>\n", or_fallback(&f.company, "اسم الشركة")));
    if !f.department.trim().is_empty() {
        html.push_str(&format!("        <p>{}</p>\n", escape_html(&f.department)));
    }
    html.push_str("    </div>\n");
    if let Some(number) = record.number_label() {
        html.push_str(&format!(
            "    <div class=\"warning-badge\">إنذار رقم {}</div>\n",
            number
        ));
    }
    html.push_str("</div>\n");

    // Meta block
    html.push_str("<div class=\"document-meta\">\n");
    meta_item(&mut html, "نوع الإنذار", &or_not_specified(&f.warning_type));
    meta_item(&mut html, "درجة الخطورة", &or_not_specified(&f.severity));
    meta_item(&mut html, "التاريخ", &or_not_specified(&format_date(&f.warning_date)));
    meta_item(&mut html, "اسم الموظف", &or_not_specified(&f.employee_name));
    meta_item(&mut html, "رقم الموظف", &or_not_specified(&f.employee_id));
    meta_item(&mut html, "المنصب", &or_not_specified(&f.employee_position));
    meta_item(&mut html, "البريد الإلكتروني", &or_not_specified(&f.employee_email));
    meta_item(&mut html, "سبب الإنذار", &or_not_specified(&f.warning_reason));
    html.push_str("</div>\n");

    // Content
    html.push_str("<div class=\"document-content\">\n");
    let details = if f.warning_details.trim().is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        html_multiline(&f.warning_details)
    };
    html.push_str(&format!(
        "    <div class=\"content-section\">\n        <h4>تفاصيل الإنذار:</h4>\n        <div class=\"content-text\">{}</div>\n    </div>\n",
        details
    ));
    if !f.consequences.trim().is_empty() {
        html.push_str(&format!(
            "    <div class=\"content-section\">\n        <h4>العواقب المترتبة:</h4>\n        <div class=\"content-text\">{}</div>\n    </div>\n",
            html_multiline(&f.consequences)
        ));
    }
    html.push_str("</div>\n");

    // Footer with signatures
    html.push_str("<div class=\"document-footer\">\n");
    html.push_str("    <div class=\"signature-section\">\n        <div class=\"signature-label\">توقيع المدير</div>\n");
    match &attachments.signature {
        Some(signature) => html.push_str(&format!(
            "        <img src=\"{}\" alt=\"توقيع المدير\" class=\"signature-image\">\n",
            signature.data_uri()
        )),
        None => html.push_str("        <div class=\"signature-line\"></div>\n"),
    }
    html.push_str(&format!(
        "        <div>{}</div>\n        <div class=\"signature-label\">{}</div>\n    </div>\n",
        or_fallback(&f.manager_name, "اسم المدير"),
        or_fallback(&f.manager_position, "المنصب")
    ));
    if f.require_employee_signature {
        html.push_str(&format!(
            "    <div class=\"signature-section\">\n        <div class=\"signature-label\">توقيع الموظف</div>\n        <div class=\"signature-line\"></div>\n        <div>{}</div>\n        <div class=\"signature-label\">التاريخ: ___________</div>\n    </div>\n",
            or_not_specified(&f.employee_name)
        ));
    }
    html.push_str("</div>\n");

    html
}

/// Placeholder fragment shown before the form has content
pub fn render_empty_preview() -> String {
    format!(
        "<div class=\"document-placeholder\">\n    <div class=\"placeholder-icon\">📄</div>\n    <p>{}</p>\n</div>\n",
        EMPTY_PREVIEW_TEXT
    )
}

/// Wraps a preview fragment into a standalone, printable HTML document
pub fn render_export_html(preview_fragment: &str, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ar" dir="rtl">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <style>{}    </style>
</head>
<body>
<div class="warning-document">
{}</div>
</body>
</html>
"#,
        escape_html(title),
        EXPORT_STYLE,
        preview_fragment
    )
}

/// Subject line for the warning email
pub fn email_subject(record: &WarningRecord) -> String {
    format!(
        "إنذار موظف - {} - {}",
        record.fields.employee_name, record.fields.company
    )
}

/// Plain-text email body; newlines in the user's text are kept as-is
pub fn email_body(record: &WarningRecord) -> String {
    let f = &record.fields;
    let consequences = if f.consequences.trim().is_empty() {
        String::new()
    } else {
        format!("العواقب المترتبة:\n{}\n", f.consequences)
    };

    let body = format!(
        "السلام عليكم ورحمة الله وبركاته،

نحيطكم علماً بصدور إنذار بحقكم وفقاً للتفاصيل التالية:

نوع الإنذار: {}
التاريخ: {}
سبب الإنذار: {}

تفاصيل الإنذار:
{}

{}

يرجى مراجعة قسم الموارد البشرية لاستلام نسخة رسمية من الإنذار.

مع تحيات إدارة الموارد البشرية
{}",
        f.warning_type,
        format_date(&f.warning_date),
        f.warning_reason,
        f.warning_details,
        consequences,
        f.company
    );
    body.trim().to_string()
}

/// Percent-encodes a value the way `encodeURIComponent` does
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// `mailto:` URL with the employee as recipient and the warning as subject/body
pub fn mailto_url(record: &WarningRecord) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        record.fields.employee_email.trim(),
        encode_uri_component(&email_subject(record)),
        encode_uri_component(&email_body(record))
    )
}

/// The CSV values for one record, in header order
pub fn csv_row(record: &WarningRecord) -> [String; 8] {
    let f = &record.fields;
    [
        record.number_label().unwrap_or_default(),
        f.employee_name.clone(),
        f.employee_email.clone(),
        f.warning_type.clone(),
        f.severity.clone(),
        f.warning_reason.clone(),
        f.warning_date.clone(),
        f.company.clone(),
    ]
}

/// Renders the header row plus one row per record
pub fn render_csv<'a, I>(records: I) -> Result<String>
where
    I: IntoIterator<Item = &'a WarningRecord>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.write_record(csv_row(record))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    let mut csv = String::from_utf8(bytes).context("CSV output was not UTF-8")?;
    if csv.ends_with('\n') {
        csv.pop();
    }
    Ok(csv)
}

/// Name of the history export for a given day: `warnings-history-2024-03-01.csv`
pub fn history_export_file_name(today: NaiveDate) -> String {
    format!("warnings-history-{}.csv", today.format("%Y-%m-%d"))
}

/// Name of a standalone HTML export for one record
pub fn html_export_file_name(record: &WarningRecord) -> String {
    let number = record
        .number_label()
        .unwrap_or_else(|| record.id.chars().take(8).collect());
    let employee: String = record
        .fields
        .employee_name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    if employee.is_empty() {
        format!("warning-{}.html", number)
    } else {
        format!("warning-{}-{}.html", number, employee)
    }
}

/// Every output format for a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub preview_html: String,
    pub export_html: String,
    pub email_subject: String,
    pub email_body: String,
    pub csv_row: [String; 8],
}

/// Renders a record into all output formats at once
pub fn render(record: &WarningRecord, attachments: &Attachments) -> RenderedDocument {
    let preview_html = render_preview(record, attachments);
    let export_html = render_export_html(&preview_html, &email_subject(record));
    RenderedDocument {
        preview_html,
        export_html,
        email_subject: email_subject(record),
        email_body: email_body(record),
        csv_row: csv_row(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Attachment;
    use crate::models::FormFields;

    fn sample_record() -> WarningRecord {
        WarningRecord::new(FormFields {
            company: "Acme".into(),
            warning_type: "تأخير".into(),
            severity: "متوسط".into(),
            warning_date: "2024-03-01".into(),
            employee_name: "Ali".into(),
            employee_email: "ali@example.com".into(),
            warning_reason: "تكرار التأخير".into(),
            warning_details: "تأخر 5 مرات".into(),
            ..Default::default()
        })
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-01"), "1 مارس 2024");
        assert_eq!(format_date("2023-12-25"), "25 ديسمبر 2023");
        assert_eq!(format_date("2024-01-09T08:00:00Z"), "9 يناير 2024");
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("soon"), "soon");
    }

    #[test]
    fn test_format_month() {
        assert_eq!(format_month("2024-08-15").as_deref(), Some("أغسطس 2024"));
        assert_eq!(format_month("bad"), None);
    }

    #[test]
    fn test_preview_contains_values_and_placeholders() {
        let html = render_preview(&sample_record(), &Attachments::default());
        assert!(html.contains("Acme"));
        assert!(html.contains("Ali"));
        assert!(html.contains("1 مارس 2024"));
        // employeeId was not given
        assert!(html.contains(&format!(
            "<span class=\"meta-label\">رقم الموظف</span>\n            <span class=\"meta-value\">{}</span>",
            NOT_SPECIFIED
        )));
        assert!(html.contains("signature-line"));
        assert!(!html.contains("العواقب المترتبة"));
        assert!(!html.contains("توقيع الموظف"));
    }

    #[test]
    fn test_preview_fallbacks_for_empty_record() {
        let html = render_preview(&WarningRecord::new(FormFields::default()), &Attachments::default());
        assert!(html.contains("<div class=\"document-watermark\">الشركة</div>"));
        assert!(html.contains("<h2>اسم الشركة</h2>"));
        assert!(html.contains("اسم المدير"));
    }

    #[test]
    fn test_preview_multiline_and_escaping() {
        let mut record = sample_record();
        record.fields.warning_details = "line one\nline <two>".into();
        record.fields.consequences = "خصم\nإيقاف".into();
        record.fields.require_employee_signature = true;

        let html = render_preview(&record, &Attachments::default());
        assert!(html.contains("line one<br>line &lt;two&gt;"));
        assert!(html.contains("خصم<br>إيقاف"));
        assert!(html.contains("توقيع الموظف"));
    }

    #[test]
    fn test_preview_embeds_attachments() {
        let mut attachments = Attachments::default();
        attachments.signature =
            Some(Attachment::from_bytes("sig.png", b"\x89PNG\r\n\x1a\nxx".to_vec()).unwrap());

        let html = render_preview(&sample_record(), &attachments);
        assert!(html.contains("class=\"signature-image\""));
        assert!(html.contains("data:image/png;base64,"));
        assert!(!html.contains("signature-line"));
    }

    #[test]
    fn test_preview_number_badge() {
        let mut record = sample_record();
        record.warning_number = Some(7);
        let html = render_preview(&record, &Attachments::default());
        assert!(html.contains("إنذار رقم 0007"));
    }

    #[test]
    fn test_export_html_is_standalone() {
        let record = sample_record();
        let doc = render(&record, &Attachments::default());
        assert!(doc.export_html.starts_with("<!DOCTYPE html>"));
        assert!(doc.export_html.contains("dir=\"rtl\""));
        assert!(doc.export_html.contains("<style>"));
        assert!(doc.export_html.contains(&doc.preview_html));
    }

    #[test]
    fn test_email_body_without_consequences() {
        let body = email_body(&sample_record());
        assert!(body.starts_with("السلام عليكم"));
        assert!(body.contains("نوع الإنذار: تأخير"));
        assert!(body.contains("التاريخ: 1 مارس 2024"));
        assert!(body.contains("تفاصيل الإنذار:\nتأخر 5 مرات"));
        assert!(!body.contains("العواقب المترتبة"));
        assert!(body.ends_with("Acme"));
    }

    #[test]
    fn test_email_body_keeps_newlines() {
        let mut record = sample_record();
        record.fields.consequences = "خصم يوم\nإنذار نهائي".into();
        let body = email_body(&record);
        assert!(body.contains("العواقب المترتبة:\nخصم يوم\nإنذار نهائي\n"));
    }

    #[test]
    fn test_mailto_url_encoding() {
        let url = mailto_url(&sample_record());
        assert!(url.starts_with("mailto:ali@example.com?subject="));
        assert!(!url.contains(' '));
        assert!(url.contains("%20-%20Ali%20-%20Acme&body="));
        assert_eq!(encode_uri_component("a b&c/(x)"), "a%20b%26c%2F(x)");
    }

    #[test]
    fn test_csv_quotes_commas() {
        let mut record = sample_record();
        record.fields.company = "Acme, Inc.".into();
        record.warning_number = Some(3);

        let csv = render_csv([&record]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADERS.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("0003,Ali,ali@example.com,"));
        assert!(row.ends_with("\"Acme, Inc.\""));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_export_file_names() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(history_export_file_name(day), "warnings-history-2024-03-01.csv");

        let mut record = sample_record();
        record.warning_number = Some(12);
        assert_eq!(html_export_file_name(&record), "warning-0012-Ali.html");
    }
}
