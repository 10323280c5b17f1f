use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "PHONEBOOK_LOG";

#[derive(Parser, Debug)]
#[command(name = "phonebook", version)]
#[command(about = "Workspace-aware contact book", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to $PHONEBOOK_CONFIG, then the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a contact
    #[command(alias = "a")]
    Add {
        /// Workspace to record the contact in
        #[arg(short, long)]
        workspace: Option<String>,

        /// Field values (e.g. name=Adam email=adam@al.com)
        #[arg(required = true, num_args = 1.., value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },

    /// List all contacts, one table per workspace
    #[command(alias = "ls")]
    List {
        /// Render with a registered formatter instead of a table
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Search a field for a value (case-insensitive substring unless --exact)
    #[command(alias = "s")]
    Search {
        field: String,
        value: String,

        /// Require an exact, case-sensitive match
        #[arg(long)]
        exact: bool,

        #[arg(short, long)]
        workspace: Option<String>,

        /// Render with a registered formatter instead of a table
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Change some fields of a contact
    #[command(alias = "u")]
    Update {
        id: u64,

        /// Field values to change (e.g. email=adam@al.com)
        #[arg(required = true, num_args = 1.., value_parser = parse_assignment)]
        fields: Vec<(String, String)>,

        #[arg(short, long)]
        workspace: Option<String>,
    },
}

/// Parses a `FIELD=VALUE` argument.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{}'", s)),
    }
}

/// Installs the stderr log subscriber. `-v` wins over `PHONEBOOK_LOG`.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("phonebook=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(
            parse_assignment("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("email=").unwrap(),
            ("email".to_string(), String::new())
        );
        assert!(parse_assignment("name").is_err());
        assert!(parse_assignment("=Adam").is_err());
    }

    #[test]
    fn parses_add_with_workspace() {
        let cli = Cli::try_parse_from(["phonebook", "add", "-w", "work", "name=Adam", "age=30"])
            .unwrap();
        match cli.command {
            Commands::Add { workspace, fields } => {
                assert_eq!(workspace.as_deref(), Some("work"));
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1], ("age".to_string(), "30".to_string()));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_search_flags() {
        let cli = Cli::try_parse_from([
            "phonebook", "--config", "c.yaml", "search", "name", "Bru", "--exact", "-f", "Csv",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.yaml")));
        match cli.command {
            Commands::Search {
                field,
                value,
                exact,
                workspace,
                format,
            } => {
                assert_eq!((field.as_str(), value.as_str()), ("name", "Bru"));
                assert!(exact);
                assert!(workspace.is_none());
                assert_eq!(format.as_deref(), Some("Csv"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn update_requires_fields() {
        assert!(Cli::try_parse_from(["phonebook", "update", "3"]).is_err());
        assert!(Cli::try_parse_from(["phonebook", "update", "x", "name=a"]).is_err());
    }
}
