mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

use warnings_core::collector::Attachment;
use warnings_core::db::{self, open_backend};
use warnings_core::history::{truncate_chars, EXCERPT_CHARS};
use warnings_core::render::{self, format_date, NOT_SPECIFIED};
use warnings_core::storage::ALL_KEYS;
use warnings_core::{
    get_config_path, Attachments, BackendType, Config, FieldId, FormFields, Theme, WarningApp,
    WarningRecord,
};

use crate::cli::{
    BackupCommand, Cli, Command, ConfigCommand, DraftCommand, FormArgs, TemplateCommand,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    // Config commands work without opening the store
    let mut app = match &cli.command {
        Command::Config(config_cmd) => return handle_config_command(config_cmd, &config),
        _ => WarningApp::open(config)?,
    };

    match &cli.command {
        Command::New {
            form,
            template,
            interactive,
        } => {
            new_warning(&mut app, form, template.as_deref(), *interactive)?;
        }
        Command::List {
            search,
            warning_type,
        } => {
            list_warnings(&app, search.as_deref(), warning_type.as_deref());
        }
        Command::Show { id, format } => {
            show_warning(&app, id, format)?;
        }
        Command::Duplicate { id } => {
            duplicate_warning(&mut app, id)?;
        }
        Command::Delete { id, yes } => {
            delete_warning(&mut app, id, *yes)?;
        }
        Command::Export { output } => {
            export_history(&app, output.as_deref())?;
        }
        Command::Html {
            id,
            output,
            logo,
            signature,
        } => {
            export_html(&app, id, output.as_deref(), logo.as_deref(), signature.as_deref())?;
        }
        Command::Email { id, open } => {
            email_warning(&app, id, *open)?;
        }
        Command::Template(template_cmd) => {
            handle_template_command(template_cmd, &mut app)?;
        }
        Command::Draft(draft_cmd) => {
            handle_draft_command(draft_cmd, &app)?;
        }
        Command::Stats => {
            show_stats(&app);
        }
        Command::Theme { theme } => {
            handle_theme_command(&mut app, theme.as_deref())?;
        }
        Command::Backup(backup_cmd) => {
            handle_backup_command(backup_cmd, &app)?;
        }
        Command::Config(_) => {}
    }

    Ok(())
}

/// Loads the config file and applies the global flags on top
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default()?;

    if let Some(backend) = &cli.backend {
        config.backend = parse_backend(backend)?;
    }

    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }

    log::debug!("Using {} backend, data dir {:?}", config.backend, config.data_dir);
    Ok(config)
}

fn parse_backend(value: &str) -> Result<BackendType> {
    match value.parse::<BackendType>() {
        Ok(BackendType::Memory) | Err(_) => {
            anyhow::bail!("Unknown backend: {}. Supported backends: file, sqlite", value)
        }
        Ok(backend) => Ok(backend),
    }
}

/// Finds a warning by id or unique id prefix
fn find_warning<'a>(app: &'a WarningApp, id: &str) -> Result<&'a WarningRecord> {
    app.history()
        .find_by_prefix(id)
        .with_context(|| format!("Warning not found: {}", id))
}

fn apply_form_args(app: &mut WarningApp, args: &FormArgs) -> bool {
    let values = [
        (FieldId::Company, &args.company),
        (FieldId::Department, &args.department),
        (FieldId::WarningType, &args.warning_type),
        (FieldId::Severity, &args.severity),
        (FieldId::WarningDate, &args.date),
        (FieldId::EmployeeName, &args.employee_name),
        (FieldId::EmployeeId, &args.employee_id),
        (FieldId::EmployeeEmail, &args.employee_email),
        (FieldId::EmployeePosition, &args.employee_position),
        (FieldId::WarningReason, &args.reason),
        (FieldId::WarningDetails, &args.details),
        (FieldId::Consequences, &args.consequences),
        (FieldId::ManagerName, &args.manager_name),
        (FieldId::ManagerPosition, &args.manager_position),
    ];

    let mut any = args.require_signature;
    for (field, value) in values {
        if let Some(value) = value {
            app.set_field(field, value.as_str());
            any = true;
        }
    }
    if args.require_signature {
        app.form.require_employee_signature = true;
    }
    any
}

fn new_warning(
    app: &mut WarningApp,
    args: &FormArgs,
    template: Option<&str>,
    interactive: bool,
) -> Result<()> {
    // Start from the saved draft, then the template, then the flags
    let template_id = match template {
        Some(key) => Some(
            app.templates()
                .find_by_id_or_name(key)
                .with_context(|| format!("Template not found: {}", key))?
                .template_id
                .clone(),
        ),
        None if interactive => {
            prompts::prompt_select_template(app.templates())?.map(|t| t.template_id.clone())
        }
        None => None,
    };
    if let Some(id) = template_id {
        app.use_template(&id);
        println!("{}", "تم تحميل القالب بنجاح".green());
    }

    let has_flags = apply_form_args(app, args);

    // Default to interactive mode if no field arguments are provided
    if interactive || (!has_flags && template.is_none()) {
        prompts::prompt_form(&mut app.form, false)?;
    } else if warnings_core::collector::validate(&app.form).is_err() {
        prompts::prompt_form(&mut app.form, true)?;
    }

    let record = match app.generate() {
        Ok(record) => record.clone(),
        Err(e) => {
            // Keep what was entered so the next attempt starts from it
            log::warn!("Warning not generated, keeping draft: {}", e);
            app.autosave()?;
            if let Some(field) = e.first_missing() {
                println!("{}: {}", e.to_string().red(), field.label());
            }
            return Err(e.into());
        }
    };
    app.discard_draft()?;

    println!("{}", "تم إنشاء الإنذار بنجاح".green());
    println!(
        "Number: {}",
        record.number_label().unwrap_or_default().green()
    );
    println!("ID: {}", record.id);

    Ok(())
}

fn list_warnings(app: &WarningApp, search: Option<&str>, warning_type: Option<&str>) {
    if app.history().is_empty() {
        println!("{}", "لا توجد إنذارات محفوظة".yellow());
        return;
    }

    let entries = app
        .history()
        .query(search.unwrap_or_default(), warning_type.unwrap_or_default());
    if entries.is_empty() {
        println!("{}", "No warnings match the filters.".yellow());
        return;
    }

    for entry in entries {
        let record = entry.record;
        let number = record.number_label().unwrap_or_else(|| "----".to_string());
        println!(
            "{} {} {}",
            number.blue().bold(),
            record.fields.employee_name.bold(),
            format!("({})", &record.id[..record.id.len().min(8)]).dimmed()
        );
        println!("  {}", entry.meta_line);
        if !entry.excerpt.is_empty() {
            println!("  {}", entry.excerpt);
        }
        let tags: Vec<String> = entry
            .tags
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| format!("[{}]", t))
            .collect();
        if !tags.is_empty() {
            println!("  {}", tags.join(" ").cyan());
        }
        println!();
    }
}

fn show_warning(app: &WarningApp, id: &str, format: &str) -> Result<()> {
    let record = find_warning(app, id)?;

    match format {
        "text" => print_warning(record),
        "html" => {
            let document = render::render(record, &Attachments::default());
            println!("{}", document.export_html);
        }
        "email" => {
            println!("To: {}", record.fields.employee_email);
            println!("Subject: {}", render::email_subject(record));
            println!();
            println!("{}", render::email_body(record));
        }
        "csv" => {
            println!("{}", render::render_csv([record])?);
        }
        _ => {
            anyhow::bail!(
                "Unknown format: {}. Supported formats: text, html, email, csv",
                format
            );
        }
    }

    Ok(())
}

fn print_warning(record: &WarningRecord) {
    let f = &record.fields;
    let title = match record.number_label() {
        Some(number) => format!("إنذار رقم {}", number),
        None => "إنذار".to_string(),
    };
    println!("{}", title.blue().bold());
    println!("{}: {}", "ID".bold(), record.id);
    println!(
        "{}: {}",
        "Created".bold(),
        record.created_at.format("%Y-%m-%d %H:%M")
    );
    println!("{}: {}", "Status".bold(), record.status);

    let or_unspecified = |v: &str| {
        if v.trim().is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            v.to_string()
        }
    };

    for field in warnings_core::models::TEXT_FIELDS {
        let value = f.get(field).unwrap_or_default();
        let value = if field == FieldId::WarningDate {
            format_date(value)
        } else {
            or_unspecified(value)
        };
        if field == FieldId::WarningDetails || field == FieldId::Consequences {
            println!("{}:", field.label().bold());
            for line in value.lines() {
                println!("  {}", line);
            }
        } else {
            println!("{}: {}", field.label().bold(), value);
        }
    }
    println!(
        "{}: {}",
        FieldId::RequireEmployeeSignature.label().bold(),
        if f.require_employee_signature { "نعم" } else { "لا" }
    );
}

fn duplicate_warning(app: &mut WarningApp, id: &str) -> Result<()> {
    let record_id = find_warning(app, id)?.id.clone();
    app.duplicate_warning(&record_id);
    app.autosave()?;

    println!("{}", "تم نسخ الإنذار".green());
    println!("Run `warnings new` to issue it.");
    Ok(())
}

fn delete_warning(app: &mut WarningApp, id: &str, skip_confirm: bool) -> Result<()> {
    let record = find_warning(app, id)?;
    let record_id = record.id.clone();

    println!("{}", "Warning to delete:".yellow());
    println!("  ID: {}", record.id);
    if let Some(number) = record.number_label() {
        println!("  Number: {}", number);
    }
    println!("  Employee: {}", record.fields.employee_name);
    println!("  Date: {}", format_date(&record.fields.warning_date));

    // Confirm deletion unless --yes flag is used
    if !skip_confirm {
        let confirm = inquire::Confirm::new("هل أنت متأكد من حذف هذا الإنذار؟")
            .with_default(false)
            .prompt()?;

        if !confirm {
            println!("{}", "Deletion cancelled.".yellow());
            return Ok(());
        }
    }

    app.delete_warning(&record_id)?;
    println!("{}", "تم حذف الإنذار".green());
    Ok(())
}

fn export_history(app: &WarningApp, output: Option<&Path>) -> Result<()> {
    let Some(export) = app.export_history_today()? else {
        println!("{}", "لا توجد بيانات للتصدير".yellow());
        return Ok(());
    };

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&export.file_name));
    std::fs::write(&output_path, export.contents)
        .with_context(|| format!("Failed to write {:?}", output_path))?;

    println!("{}", "تم تصدير السجل بنجاح".green());
    println!("{}", output_path.display());
    Ok(())
}

fn export_html(
    app: &WarningApp,
    id: &str,
    output: Option<&Path>,
    logo: Option<&Path>,
    signature: Option<&Path>,
) -> Result<()> {
    let record = find_warning(app, id)?;

    let mut attachments = Attachments::default();
    if let Some(path) = logo {
        attachments.set(FieldId::Logo, Some(Attachment::from_path(path)?));
    }
    if let Some(path) = signature {
        attachments.set(FieldId::Signature, Some(Attachment::from_path(path)?));
    }

    let document = render::render(record, &attachments);
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(render::html_export_file_name(record)));
    std::fs::write(&output_path, document.export_html)
        .with_context(|| format!("Failed to write {:?}", output_path))?;

    println!("{}", "تم تحميل الملف بنجاح".green());
    println!("{}", output_path.display());
    Ok(())
}

fn email_warning(app: &WarningApp, id: &str, open: bool) -> Result<()> {
    let record = find_warning(app, id)?;
    let url = render::mailto_url(record);

    if !open {
        println!("{}", url);
        return Ok(());
    }

    open_in_default_app(&url)?;
    println!("{}", "Email opened in the default mail client".green());
    Ok(())
}

/// Hands a URL to the platform's default handler
fn open_in_default_app(url: &str) -> Result<()> {
    log::debug!("Opening {}", url);

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("Failed to open mail client")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("Failed to open mail client")?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()
            .context("Failed to open mail client")?;
    }

    Ok(())
}

fn handle_template_command(cmd: &TemplateCommand, app: &mut WarningApp) -> Result<()> {
    match cmd {
        TemplateCommand::Save {
            name,
            description,
            from,
        } => {
            if let Some(id) = from {
                let record_id = find_warning(app, id)?.id.clone();
                app.duplicate_warning(&record_id);
            }

            let (name, description) = match name {
                Some(name) => (name.clone(), description.clone().unwrap_or_default()),
                None => prompts::prompt_template_details()?,
            };

            let template = app.save_template(&name, &description)?;
            println!("{}", "تم حفظ القالب بنجاح".green());
            println!("ID: {}", template.template_id);
        }
        TemplateCommand::List => {
            if app.templates().is_empty() {
                println!("{}", "لا توجد قوالب محفوظة".yellow());
                return Ok(());
            }

            println!("{}", "Templates:".blue().bold());
            for template in app.templates().list() {
                println!(
                    "{} {}",
                    template.template_name.green().bold(),
                    format!("({})", template.template_id).dimmed()
                );
                println!("  {}", template.description_or_placeholder());
                let f = &template.fields;
                let summary: Vec<&str> = [f.warning_type.as_str(), f.severity.as_str(), f.company.as_str()]
                    .into_iter()
                    .filter(|v| !v.is_empty())
                    .collect();
                if !summary.is_empty() {
                    println!("  {}", summary.join(" • ").cyan());
                }
            }
        }
        TemplateCommand::Use { id } => {
            let template_id = app
                .templates()
                .find_by_id_or_name(id)
                .with_context(|| format!("Template not found: {}", id))?
                .template_id
                .clone();
            app.use_template(&template_id);
            app.autosave()?;
            println!("{}", "تم تحميل القالب بنجاح".green());
        }
        TemplateCommand::Delete { id, yes } => {
            let template = app
                .templates()
                .find_by_id_or_name(id)
                .with_context(|| format!("Template not found: {}", id))?;
            let template_id = template.template_id.clone();

            if !*yes {
                let confirm = inquire::Confirm::new("هل أنت متأكد من حذف هذا القالب؟")
                    .with_default(false)
                    .prompt()?;
                if !confirm {
                    println!("{}", "Deletion cancelled.".yellow());
                    return Ok(());
                }
            }

            app.delete_template(&template_id)?;
            println!("{}", "تم حذف القالب".green());
        }
    }

    Ok(())
}

fn handle_draft_command(cmd: &DraftCommand, app: &WarningApp) -> Result<()> {
    match cmd {
        DraftCommand::Show => match app.store().load_draft() {
            Some(draft) => print_draft(&draft),
            None => println!("{}", "No saved draft.".yellow()),
        },
        DraftCommand::Clear => {
            app.discard_draft()?;
            println!("{}", "تم مسح النموذج".green());
        }
    }
    Ok(())
}

fn print_draft(draft: &FormFields) {
    println!("{}", "Draft:".blue().bold());
    for field in warnings_core::models::TEXT_FIELDS {
        let value = draft.get(field).unwrap_or_default();
        if !value.is_empty() {
            println!(
                "{}: {}",
                field.label().bold(),
                truncate_chars(value, EXCERPT_CHARS)
            );
        }
    }
}

fn show_stats(app: &WarningApp) {
    let analytics = app.analytics();

    println!("{}: {}", "Total warnings".bold(), analytics.total);
    if analytics.total == 0 {
        return;
    }

    let sections = [
        ("By type", &analytics.by_type),
        ("By severity", &analytics.by_severity),
        ("By month", &analytics.by_month),
    ];
    for (title, counts) in sections {
        println!();
        println!("{}", title.blue().bold());
        let max = counts.iter().map(|(_, c)| *c).max().unwrap_or(1);
        for (label, count) in counts {
            let bar = "█".repeat((count * 20).div_ceil(max));
            println!("  {:<20} {:>4} {}", label, count, bar.green());
        }
    }
}

fn handle_theme_command(app: &mut WarningApp, theme: Option<&str>) -> Result<()> {
    match theme {
        None => println!("{}", app.theme()),
        Some(value) => {
            let theme: Theme = value.parse().map_err(anyhow::Error::msg)?;
            app.set_theme(theme)?;
            println!("Theme set to {}", theme.to_string().green());
        }
    }
    Ok(())
}

fn handle_backup_command(cmd: &BackupCommand, app: &WarningApp) -> Result<()> {
    let backend = app.store().backend();
    match cmd {
        BackupCommand::Export { path } => {
            let count = db::export_backup(backend, path)?;
            println!("{}", format!("Exported {} keys", count).green());
            println!("{}", path.display());
        }
        BackupCommand::Import { path, yes } => {
            if !*yes {
                let confirm = inquire::Confirm::new("Replace the stored data with this backup?")
                    .with_default(false)
                    .prompt()?;
                if !confirm {
                    println!("{}", "Import cancelled.".yellow());
                    return Ok(());
                }
            }
            let count = db::import_backup(backend, path, &ALL_KEYS)?;
            log::info!("Restored {} keys from {:?}", count, path);
            println!("{}", format!("Imported {} keys", count).green());
        }
        BackupCommand::Migrate { target, to } => {
            let target_type = to.as_deref().map(parse_backend).transpose()?;
            let target_backend = open_backend(target, target_type)?;
            let count = db::migrate(backend, target_backend.as_ref())?;
            println!(
                "{}",
                format!(
                    "Copied {} keys from {} to {}",
                    count,
                    backend.backend_type(),
                    target_backend.backend_type()
                )
                .green()
            );
        }
    }
    Ok(())
}

fn handle_config_command(cmd: &ConfigCommand, config: &Config) -> Result<()> {
    let path = get_config_path()?;
    match cmd {
        ConfigCommand::Show => {
            println!("{}: {}", "Config file".bold(), path.display());
            println!("{}: {}", "Store".bold(), config.store_path()?.display());
            print!("{}", config.to_yaml()?);
        }
        ConfigCommand::Init => {
            if Config::create_default(&path)? {
                println!("{}", "Config file created".green());
            } else {
                println!("{}", "Config file already exists".yellow());
            }
            println!("{}", path.display());
        }
    }
    Ok(())
}
