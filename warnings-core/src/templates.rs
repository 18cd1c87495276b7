use crate::error::{WarningError, WarningResult};
use crate::models::{FormFields, Template};
use crate::storage::LocalStore;

/// Saved templates, kept in the order they were created
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn load(store: &LocalStore) -> Self {
        Self::new(store.load_templates())
    }

    /// Insertion order; templates are never sorted
    pub fn list(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn find(&self, template_id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.template_id == template_id)
    }

    /// Finds by id first, then by exact name
    pub fn find_by_id_or_name(&self, key: &str) -> Option<&Template> {
        self.find(key)
            .or_else(|| self.templates.iter().find(|t| t.template_name == key.trim()))
    }

    /// Saves the form as a new template and persists the collection
    pub fn save_template(
        &mut self,
        name: &str,
        description: &str,
        fields: &FormFields,
        store: &LocalStore,
    ) -> WarningResult<&Template> {
        if name.trim().is_empty() {
            return Err(WarningError::MissingTemplateName);
        }

        let template = Template::new(name, description, fields.clone());
        log::info!(
            "Saving template '{}' ({})",
            template.template_name,
            template.template_id
        );
        self.templates.push(template);
        if let Err(e) = store.save_templates(&self.templates) {
            self.templates.pop();
            return Err(e);
        }

        let index = self.templates.len() - 1;
        Ok(&self.templates[index])
    }

    /// Removes a template; returns false without writing when it does not exist
    pub fn delete(&mut self, template_id: &str, store: &LocalStore) -> WarningResult<bool> {
        if self.find(template_id).is_none() {
            return Ok(false);
        }
        let remaining: Vec<Template> = self
            .templates
            .iter()
            .filter(|t| t.template_id != template_id)
            .cloned()
            .collect();
        store.save_templates(&remaining)?;
        self.templates = remaining;
        log::info!("Deleted template {}", template_id);
        Ok(true)
    }

    /// Copies the template's field set (not its metadata) into `form`.
    /// Empty template values leave the form's value alone.
    pub fn apply(&self, template_id: &str, form: &mut FormFields) -> Option<&Template> {
        let template = self.find(template_id)?;
        form.fill_template_fields(&template.fields);
        Some(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_form() -> FormFields {
        FormFields {
            company: "Acme".into(),
            warning_type: "تأخير".into(),
            severity: "منخفض".into(),
            warning_reason: "التأخر عن الدوام".into(),
            employee_name: "Should not travel".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_requires_name() {
        let store = LocalStore::in_memory();
        let mut library = TemplateLibrary::default();

        let err = library
            .save_template("   ", "", &template_form(), &store)
            .unwrap_err();
        assert!(matches!(err, WarningError::MissingTemplateName));
        assert!(library.is_empty());
    }

    #[test]
    fn test_save_persists_in_insertion_order() {
        let store = LocalStore::in_memory();
        let mut library = TemplateLibrary::default();

        library.save_template("B", "", &template_form(), &store).unwrap();
        library
            .save_template("A", "وصف", &template_form(), &store)
            .unwrap();

        let reloaded = TemplateLibrary::load(&store);
        let names: Vec<_> = reloaded
            .list()
            .iter()
            .map(|t| t.template_name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(reloaded.list()[1].template_description, "وصف");
    }

    #[test]
    fn test_apply_copies_template_fields_only() {
        let store = LocalStore::in_memory();
        let mut library = TemplateLibrary::default();
        let id = library
            .save_template("Late", "", &template_form(), &store)
            .unwrap()
            .template_id
            .clone();

        let mut form = FormFields::new();
        form.employee_name = "Ali".into();
        form.department = "المبيعات".into();

        library.apply(&id, &mut form).unwrap();
        assert_eq!(form.company, "Acme");
        assert_eq!(form.warning_reason, "التأخر عن الدوام");
        assert_eq!(form.employee_name, "Ali");
        // empty in the template, so untouched
        assert_eq!(form.department, "المبيعات");

        assert!(library.apply("missing", &mut form).is_none());
    }

    #[test]
    fn test_delete_template() {
        let store = LocalStore::in_memory();
        let mut library = TemplateLibrary::default();
        let id = library
            .save_template("Late", "", &template_form(), &store)
            .unwrap()
            .template_id
            .clone();

        assert!(library.delete(&id, &store).unwrap());
        assert!(!library.delete(&id, &store).unwrap());
        assert!(TemplateLibrary::load(&store).is_empty());
    }

    #[test]
    fn test_find_by_id_or_name() {
        let store = LocalStore::in_memory();
        let mut library = TemplateLibrary::default();
        library.save_template("Late", "", &template_form(), &store).unwrap();

        assert!(library.find_by_id_or_name("Late").is_some());
        assert!(library.find_by_id_or_name("Early").is_none());
    }
}
