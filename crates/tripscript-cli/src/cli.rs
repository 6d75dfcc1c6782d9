//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tripscript_schema::Category;

use crate::config::{Config, LogFormat};
use crate::error::AppError;

/// Migrate, validate and evaluate Tripscript content.
#[derive(Parser, Debug)]
#[command(name = "tripscript", version)]
pub struct Cli {
    /// Log output format on stderr
    #[arg(long, global = true, env = "TRIPSCRIPT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Display timezone for templated times: UTC or a fixed offset like +02:00
    #[arg(long, global = true, env = "TRIPSCRIPT_TIMEZONE")]
    pub timezone: Option<String>,

    /// Evaluate as of this RFC 3339 time instead of the system clock
    #[arg(long, global = true, env = "TRIPSCRIPT_NOW")]
    pub now: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Typed settings from the global flags.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a flag or variable is unusable.
    pub fn config(&self) -> Result<Config, AppError> {
        Config::resolve(self.log_format, self.timezone.as_deref(), self.now.as_deref())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bring a script up to the latest schema version and print it
    Migrate {
        /// Script file, JSON or YAML
        script: PathBuf,

        /// Media library file mapping legacy asset paths to hosted urls
        #[arg(long)]
        media: Option<PathBuf>,
    },
    /// Migrate and validate a script, printing any warnings
    Validate {
        /// Script file, JSON or YAML
        script: PathBuf,
    },
    /// Run one event through a script's triggers and print the result
    Evaluate {
        /// Script file, JSON or YAML
        script: PathBuf,

        /// Event file, e.g. {"type": "cue_signaled", "cue": "bell"}
        #[arg(long)]
        event: PathBuf,

        /// Evaluation context file; an empty trip when omitted
        #[arg(long)]
        context: Option<PathBuf>,
    },
    /// Print the module reference
    Reference {
        /// Limit output to one category
        #[arg(value_enum)]
        category: Option<ReferenceCategory>,
    },
    /// Check that every migration reproduces its fixtures
    CheckFixtures,
}

/// Registry category selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReferenceCategory {
    Resources,
    Actions,
    Events,
    Conditions,
    Panels,
}

impl From<ReferenceCategory> for Category {
    fn from(category: ReferenceCategory) -> Self {
        match category {
            ReferenceCategory::Resources => Category::Resources,
            ReferenceCategory::Actions => Category::Actions,
            ReferenceCategory::Events => Category::Events,
            ReferenceCategory::Conditions => Category::Conditions,
            ReferenceCategory::Panels => Category::Panels,
        }
    }
}
