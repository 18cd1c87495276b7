use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Employee disciplinary warning generator")]
pub struct Cli {
    /// Directory holding the warning data
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Storage backend: file or sqlite
    #[clap(long, global = true)]
    pub backend: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

/// Form values accepted on the command line
#[derive(clap::Args, Debug, Default)]
pub struct FormArgs {
    #[clap(long)]
    pub company: Option<String>,

    #[clap(long)]
    pub department: Option<String>,

    /// Warning type (e.g. تأخير)
    #[clap(long = "type")]
    pub warning_type: Option<String>,

    #[clap(long)]
    pub severity: Option<String>,

    /// Warning date (YYYY-MM-DD), defaults to today
    #[clap(long)]
    pub date: Option<String>,

    #[clap(long)]
    pub employee_name: Option<String>,

    #[clap(long)]
    pub employee_id: Option<String>,

    #[clap(long)]
    pub employee_email: Option<String>,

    #[clap(long)]
    pub employee_position: Option<String>,

    #[clap(long)]
    pub reason: Option<String>,

    #[clap(long)]
    pub details: Option<String>,

    #[clap(long)]
    pub consequences: Option<String>,

    #[clap(long)]
    pub manager_name: Option<String>,

    #[clap(long)]
    pub manager_position: Option<String>,

    /// Add an employee signature line
    #[clap(long)]
    pub require_signature: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a new warning
    New {
        #[clap(flatten)]
        form: FormArgs,

        /// Prefill from a template (id or name)
        #[clap(long)]
        template: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long, short = 'i')]
        interactive: bool,
    },

    /// List generated warnings, newest first
    List {
        /// Only warnings whose text contains this, ignoring case
        #[clap(long, short = 's')]
        search: Option<String>,

        /// Only warnings of this type
        #[clap(long = "type", short = 't')]
        warning_type: Option<String>,
    },

    /// Show a warning
    Show {
        /// Warning id (or a unique prefix)
        id: String,

        /// Output format: text, html, email or csv
        #[clap(long, short = 'f', default_value = "text")]
        format: String,
    },

    /// Copy a warning into the draft so it can be issued again
    Duplicate {
        /// Warning id (or a unique prefix)
        id: String,
    },

    /// Delete a warning
    Delete {
        /// Warning id (or a unique prefix)
        id: String,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Export the history as CSV
    Export {
        /// Output file (defaults to warnings-history-<date>.csv)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Write a warning as a standalone, printable HTML file
    Html {
        /// Warning id (or a unique prefix)
        id: String,

        /// Output file (defaults to warning-<number>-<employee>.html)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,

        /// Company logo image to embed
        #[clap(long)]
        logo: Option<PathBuf>,

        /// Signature image to embed
        #[clap(long)]
        signature: Option<PathBuf>,
    },

    /// Compose the notification email for a warning
    Email {
        /// Warning id (or a unique prefix)
        id: String,

        /// Open the mailto: link in the default mail client
        #[clap(long)]
        open: bool,
    },

    /// Manage templates
    #[clap(subcommand)]
    Template(TemplateCommand),

    /// Manage the saved form draft
    #[clap(subcommand)]
    Draft(DraftCommand),

    /// Show warning statistics
    Stats,

    /// Show or set the theme
    Theme {
        /// light or dark
        theme: Option<String>,
    },

    /// Back up or restore all data
    #[clap(subcommand)]
    Backup(BackupCommand),

    /// Show or create the config file
    #[clap(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// Save the current draft (or an existing warning) as a template
    Save {
        /// Template name
        #[clap(long)]
        name: Option<String>,

        /// Template description
        #[clap(long)]
        description: Option<String>,

        /// Take the fields from this warning instead of the draft
        #[clap(long)]
        from: Option<String>,
    },

    /// List templates
    List,

    /// Load a template into the draft
    Use {
        /// Template id or name
        id: String,
    },

    /// Delete a template
    Delete {
        /// Template id or name
        id: String,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DraftCommand {
    /// Print the saved draft
    Show,

    /// Discard the saved draft
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    /// Write every stored value to a JSON file
    Export {
        /// Output file
        path: PathBuf,
    },

    /// Restore stored values from a JSON backup
    Import {
        /// Backup file
        path: PathBuf,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Copy all data into another store
    Migrate {
        /// Target directory or SQLite file
        target: PathBuf,

        /// Target backend: file or sqlite (inferred from the path if omitted)
        #[clap(long)]
        to: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a default config file if none exists
    Init,
}
