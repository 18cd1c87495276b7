use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifies one input on the warning form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    Company,
    Department,
    WarningType,
    Severity,
    WarningDate,
    EmployeeName,
    EmployeeId,
    EmployeeEmail,
    EmployeePosition,
    WarningReason,
    WarningDetails,
    Consequences,
    ManagerName,
    ManagerPosition,
    RequireEmployeeSignature,
    Logo,
    Signature,
}

/// The text inputs of the form, in form order
pub const TEXT_FIELDS: [FieldId; 14] = [
    FieldId::Company,
    FieldId::Department,
    FieldId::WarningType,
    FieldId::Severity,
    FieldId::WarningDate,
    FieldId::EmployeeName,
    FieldId::EmployeeId,
    FieldId::EmployeeEmail,
    FieldId::EmployeePosition,
    FieldId::WarningReason,
    FieldId::WarningDetails,
    FieldId::Consequences,
    FieldId::ManagerName,
    FieldId::ManagerPosition,
];

/// The fields a template carries into the form (employee-specific fields are left alone)
pub const TEMPLATE_FIELDS: [FieldId; 9] = [
    FieldId::Company,
    FieldId::Department,
    FieldId::WarningType,
    FieldId::Severity,
    FieldId::WarningReason,
    FieldId::WarningDetails,
    FieldId::Consequences,
    FieldId::ManagerName,
    FieldId::ManagerPosition,
];

impl FieldId {
    /// All inputs, including the checkbox and the two image uploads
    pub const ALL: [FieldId; 17] = [
        FieldId::Company,
        FieldId::Department,
        FieldId::WarningType,
        FieldId::Severity,
        FieldId::WarningDate,
        FieldId::EmployeeName,
        FieldId::EmployeeId,
        FieldId::EmployeeEmail,
        FieldId::EmployeePosition,
        FieldId::WarningReason,
        FieldId::WarningDetails,
        FieldId::Consequences,
        FieldId::ManagerName,
        FieldId::ManagerPosition,
        FieldId::RequireEmployeeSignature,
        FieldId::Logo,
        FieldId::Signature,
    ];

    /// The identifier used for the input and in persisted JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Company => "company",
            FieldId::Department => "department",
            FieldId::WarningType => "warningType",
            FieldId::Severity => "severity",
            FieldId::WarningDate => "warningDate",
            FieldId::EmployeeName => "employeeName",
            FieldId::EmployeeId => "employeeId",
            FieldId::EmployeeEmail => "employeeEmail",
            FieldId::EmployeePosition => "employeePosition",
            FieldId::WarningReason => "warningReason",
            FieldId::WarningDetails => "warningDetails",
            FieldId::Consequences => "consequences",
            FieldId::ManagerName => "managerName",
            FieldId::ManagerPosition => "managerPosition",
            FieldId::RequireEmployeeSignature => "requireEmployeeSignature",
            FieldId::Logo => "logo",
            FieldId::Signature => "signature",
        }
    }

    /// Arabic label shown next to the input
    pub fn label(&self) -> &'static str {
        match self {
            FieldId::Company => "اسم الشركة",
            FieldId::Department => "القسم",
            FieldId::WarningType => "نوع الإنذار",
            FieldId::Severity => "درجة الخطورة",
            FieldId::WarningDate => "التاريخ",
            FieldId::EmployeeName => "اسم الموظف",
            FieldId::EmployeeId => "رقم الموظف",
            FieldId::EmployeeEmail => "البريد الإلكتروني",
            FieldId::EmployeePosition => "المنصب",
            FieldId::WarningReason => "سبب الإنذار",
            FieldId::WarningDetails => "تفاصيل الإنذار",
            FieldId::Consequences => "العواقب المترتبة",
            FieldId::ManagerName => "اسم المدير",
            FieldId::ManagerPosition => "منصب المدير",
            FieldId::RequireEmployeeSignature => "يتطلب توقيع الموظف",
            FieldId::Logo => "شعار الشركة",
            FieldId::Signature => "توقيع المدير",
        }
    }

    /// Whether the form refuses to generate a warning while this field is empty
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            FieldId::Company
                | FieldId::WarningType
                | FieldId::Severity
                | FieldId::WarningDate
                | FieldId::EmployeeName
                | FieldId::EmployeeEmail
                | FieldId::WarningReason
                | FieldId::WarningDetails
        )
    }

    /// Whether the field holds free text (as opposed to a flag or an attachment)
    pub fn is_text(&self) -> bool {
        TEXT_FIELDS.contains(self)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldId::ALL
            .iter()
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown form field: {}", s))
    }
}

/// The values of the warning form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FormFields {
    pub company: String,
    pub department: String,
    pub warning_type: String,
    pub severity: String,
    pub warning_date: String,
    pub employee_name: String,
    pub employee_id: String,
    pub employee_email: String,
    pub employee_position: String,
    pub warning_reason: String,
    pub warning_details: String,
    pub consequences: String,
    pub manager_name: String,
    pub manager_position: String,
    pub require_employee_signature: bool,
}

impl FormFields {
    /// Creates an empty form dated today
    pub fn new() -> Self {
        Self {
            warning_date: today_iso(),
            ..Default::default()
        }
    }

    /// Gets a text field by identifier; `None` for the checkbox and attachments
    pub fn get(&self, field: FieldId) -> Option<&str> {
        let value = match field {
            FieldId::Company => &self.company,
            FieldId::Department => &self.department,
            FieldId::WarningType => &self.warning_type,
            FieldId::Severity => &self.severity,
            FieldId::WarningDate => &self.warning_date,
            FieldId::EmployeeName => &self.employee_name,
            FieldId::EmployeeId => &self.employee_id,
            FieldId::EmployeeEmail => &self.employee_email,
            FieldId::EmployeePosition => &self.employee_position,
            FieldId::WarningReason => &self.warning_reason,
            FieldId::WarningDetails => &self.warning_details,
            FieldId::Consequences => &self.consequences,
            FieldId::ManagerName => &self.manager_name,
            FieldId::ManagerPosition => &self.manager_position,
            FieldId::RequireEmployeeSignature | FieldId::Logo | FieldId::Signature => {
                return None
            }
        };
        Some(value.as_str())
    }

    /// Mutable access to a text field by identifier
    pub fn get_mut(&mut self, field: FieldId) -> Option<&mut String> {
        let value = match field {
            FieldId::Company => &mut self.company,
            FieldId::Department => &mut self.department,
            FieldId::WarningType => &mut self.warning_type,
            FieldId::Severity => &mut self.severity,
            FieldId::WarningDate => &mut self.warning_date,
            FieldId::EmployeeName => &mut self.employee_name,
            FieldId::EmployeeId => &mut self.employee_id,
            FieldId::EmployeeEmail => &mut self.employee_email,
            FieldId::EmployeePosition => &mut self.employee_position,
            FieldId::WarningReason => &mut self.warning_reason,
            FieldId::WarningDetails => &mut self.warning_details,
            FieldId::Consequences => &mut self.consequences,
            FieldId::ManagerName => &mut self.manager_name,
            FieldId::ManagerPosition => &mut self.manager_position,
            FieldId::RequireEmployeeSignature | FieldId::Logo | FieldId::Signature => {
                return None
            }
        };
        Some(value)
    }

    /// Sets a text field by identifier. Returns false for non-text fields.
    pub fn set(&mut self, field: FieldId, value: impl Into<String>) -> bool {
        match self.get_mut(field) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Sets a value coming from a string-keyed UI surface.
    /// Accepts "true"/"false"/"on"/"" for the signature checkbox.
    pub fn set_by_name(&mut self, name: &str, value: &str) -> Result<(), String> {
        let field: FieldId = name.parse()?;
        if field == FieldId::RequireEmployeeSignature {
            self.require_employee_signature =
                matches!(value.trim().to_lowercase().as_str(), "true" | "on" | "1" | "yes");
            return Ok(());
        }
        if !self.set(field, value) {
            return Err(format!("Field '{}' is not a text field", name));
        }
        Ok(())
    }

    /// Copies every non-empty text field from `other` over this form, plus the
    /// signature flag. Empty source values leave the current value in place.
    pub fn fill_from(&mut self, other: &FormFields) {
        for field in TEXT_FIELDS {
            self.copy_if_present(other, field);
        }
        self.require_employee_signature = other.require_employee_signature;
    }

    /// Copies only the template-carried fields that are non-empty in `other`
    pub fn fill_template_fields(&mut self, other: &FormFields) {
        for field in TEMPLATE_FIELDS {
            self.copy_if_present(other, field);
        }
    }

    fn copy_if_present(&mut self, other: &FormFields, field: FieldId) {
        if let Some(value) = other.get(field) {
            if !value.is_empty() {
                self.set(field, value);
            }
        }
    }

    /// True when nothing worth previewing has been entered yet
    pub fn is_blank_for_preview(&self) -> bool {
        self.company.is_empty() && self.employee_name.is_empty() && self.warning_details.is_empty()
    }
}

/// Lifecycle status of a stored warning
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WarningStatus {
    #[default]
    Active,
}

impl fmt::Display for WarningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningStatus::Active => write!(f, "active"),
        }
    }
}

/// A generated warning as kept in history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WarningRecord {
    /// Unique identifier, assigned at creation
    pub id: String,

    /// Creation time; never changes after creation
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub status: WarningStatus,

    /// Counter value stamped when the warning was generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_number: Option<u64>,

    #[serde(flatten)]
    pub fields: FormFields,
}

impl WarningRecord {
    /// Creates a new record with a fresh identifier and the current time
    pub fn new(fields: FormFields) -> Self {
        Self {
            id: generate_id(),
            created_at: Utc::now(),
            status: WarningStatus::Active,
            warning_number: None,
            fields,
        }
    }

    /// The zero-padded warning number, if one was stamped
    pub fn number_label(&self) -> Option<String> {
        self.warning_number.map(format_warning_number)
    }
}

/// A reusable, named field set for prefilling new warnings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub template_id: String,
    pub template_name: String,
    #[serde(default)]
    pub template_description: String,
    pub created_at: DateTime<Utc>,

    #[serde(flatten)]
    pub fields: FormFields,
}

impl Template {
    /// Creates a template; the name is trimmed but not validated here
    pub fn new(name: &str, description: &str, fields: FormFields) -> Self {
        Self {
            template_id: generate_id(),
            template_name: name.trim().to_string(),
            template_description: description.trim().to_string(),
            created_at: Utc::now(),
            fields,
        }
    }

    /// Description to show in listings
    pub fn description_or_placeholder(&self) -> &str {
        if self.template_description.is_empty() {
            "لا يوجد وصف"
        } else {
            &self.template_description
        }
    }
}

/// UI colour scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Unknown theme: {}. Use light or dark", s)),
        }
    }
}

/// Generates a new unique identifier for records and templates
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Today's local date as `YYYY-MM-DD`
pub fn today_iso() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Zero-pads a warning number to four digits
pub fn format_warning_number(number: u64) -> String {
    format!("{:04}", number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_id_round_trip_names() {
        for field in FieldId::ALL {
            assert_eq!(field.as_str().parse::<FieldId>().unwrap(), field);
        }
        assert!("salary".parse::<FieldId>().is_err());
    }

    #[test]
    fn test_required_fields() {
        let required: Vec<_> = FieldId::ALL.iter().filter(|f| f.is_required()).collect();
        assert_eq!(required.len(), 8);
        assert!(!FieldId::EmployeeId.is_required());
        assert!(!FieldId::Consequences.is_required());
    }

    #[test]
    fn test_set_by_name() {
        let mut form = FormFields::default();
        form.set_by_name("employeeName", "Ali").unwrap();
        form.set_by_name("requireEmployeeSignature", "on").unwrap();
        assert_eq!(form.employee_name, "Ali");
        assert!(form.require_employee_signature);
        assert!(form.set_by_name("logo", "x.png").is_err());
        assert!(form.set_by_name("bogus", "x").is_err());
    }

    #[test]
    fn test_fill_from_skips_empty_values() {
        let mut form = FormFields::default();
        form.company = "Old Co".into();
        form.employee_name = "Sara".into();

        let mut source = FormFields::default();
        source.company = "New Co".into();
        source.require_employee_signature = true;

        form.fill_from(&source);
        assert_eq!(form.company, "New Co");
        assert_eq!(form.employee_name, "Sara");
        assert!(form.require_employee_signature);
    }

    #[test]
    fn test_fill_template_fields_leaves_employee_alone() {
        let mut form = FormFields::default();
        form.employee_name = "Ali".into();

        let mut source = FormFields::default();
        source.employee_name = "Template Person".into();
        source.warning_reason = "غياب".into();

        form.fill_template_fields(&source);
        assert_eq!(form.employee_name, "Ali");
        assert_eq!(form.warning_reason, "غياب");
    }

    #[test]
    fn test_record_json_uses_camel_case_keys() {
        let mut fields = FormFields::default();
        fields.warning_type = "تأخير".into();
        let record = WarningRecord::new(fields);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"warningType\":\"تأخير\""));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"status\":\"active\""));
    }

    #[test]
    fn test_record_loads_legacy_json_with_missing_fields() {
        let json = r#"{
            "id": "lq3k2abc",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "employeeName": "Ali",
            "logoFile": {}
        }"#;
        let record: WarningRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "lq3k2abc");
        assert_eq!(record.status, WarningStatus::Active);
        assert_eq!(record.fields.employee_name, "Ali");
        assert!(record.fields.company.is_empty());
    }

    #[test]
    fn test_template_trims_name() {
        let template = Template::new("  قالب التأخير ", "", FormFields::default());
        assert_eq!(template.template_name, "قالب التأخير");
        assert_eq!(template.description_or_placeholder(), "لا يوجد وصف");
    }

    #[test]
    fn test_theme_parse_and_toggle() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert!("blue".parse::<Theme>().is_err());
    }

    #[test]
    fn test_format_warning_number() {
        assert_eq!(format_warning_number(7), "0007");
        assert_eq!(format_warning_number(12345), "12345");
    }
}
