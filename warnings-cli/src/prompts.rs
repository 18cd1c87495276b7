use anyhow::Result;
use inquire::{Confirm, Select, Text};

use warnings_core::collector::{self, MAX_DETAILS_CHARS};
use warnings_core::models::TEXT_FIELDS;
use warnings_core::{FieldId, FormFields, Template, TemplateLibrary};

/// Prompts for form fields. With `only_missing`, fields that already pass
/// validation are left alone; otherwise every field is offered with its
/// current value as the default.
pub fn prompt_form(form: &mut FormFields, only_missing: bool) -> Result<()> {
    for field in TEXT_FIELDS {
        if only_missing && (!field.is_required() || collector::validate_field(form, field)) {
            continue;
        }

        let current = form.get(field).unwrap_or_default().to_string();
        let label = if field.is_required() {
            format!("{} *:", field.label())
        } else {
            format!("{}:", field.label())
        };

        let value = if field == FieldId::WarningDetails {
            let help = format!("{} حرف كحد أقصى", MAX_DETAILS_CHARS);
            inquire::Editor::new(&label)
                .with_predefined_text(&current)
                .with_help_message(&help)
                .prompt()?
                .trim_end()
                .to_string()
        } else {
            Text::new(&label).with_initial_value(&current).prompt()?
        };
        form.set(field, value);
    }

    if collector::clamp_details(form) {
        println!("Details truncated to {} characters", MAX_DETAILS_CHARS);
    }

    if !only_missing {
        form.require_employee_signature = Confirm::new(&format!(
            "{}?",
            FieldId::RequireEmployeeSignature.label()
        ))
        .with_default(form.require_employee_signature)
        .prompt()?;
    }

    Ok(())
}

/// Prompts the user to pick a template, or none
pub fn prompt_select_template(library: &TemplateLibrary) -> Result<Option<&Template>> {
    if library.is_empty() {
        return Ok(None);
    }

    let none = "(بدون قالب)".to_string();
    let mut options = vec![none.clone()];
    options.extend(library.list().iter().map(|t| t.template_name.clone()));

    let selection = Select::new("Template:", options).prompt()?;
    if selection == none {
        return Ok(None);
    }
    Ok(library.find_by_id_or_name(&selection))
}

/// Prompts for a template name and description
pub fn prompt_template_details() -> Result<(String, String)> {
    let name = Text::new("اسم القالب:").prompt()?;
    let description = Text::new("وصف القالب:").prompt()?;
    Ok((name, description))
}
