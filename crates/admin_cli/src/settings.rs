use clap::Args;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/budget_admin.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub log_level: String,
    pub max_page_size: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./budget.db?mode=rwc".to_string(),
            log_level: "info".to_string(),
            max_page_size: engine::DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

/// Command-line overrides; they win over the file and the environment.
#[derive(Debug, Default, Args)]
pub struct SettingsArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, global = true, env = "DATABASE_URL")]
    pub database_url: Option<String>,
    /// Log level for the admin tool and the engine (e.g. `debug`).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Upper bound for page sizes requested by list and stats commands.
    #[arg(long, global = true)]
    pub max_page_size: Option<u64>,
}

impl Settings {
    /// Layers defaults, the TOML file, `BUDGET_ADMIN_*` variables and `args`.
    pub fn load(args: &SettingsArgs) -> Result<Self> {
        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut builder = config::Config::builder();
        builder = builder.add_source(config::File::with_name(config_path).required(false));
        builder = builder.add_source(
            config::Environment::with_prefix("BUDGET_ADMIN").try_parsing(true),
        );
        let mut settings: Settings = builder.build()?.try_deserialize()?;

        if let Some(database_url) = &args.database_url {
            settings.database_url = database_url.clone();
        }
        if let Some(log_level) = &args.log_level {
            settings.log_level = log_level.clone();
        }
        if let Some(max_page_size) = args.max_page_size {
            settings.max_page_size = max_page_size;
        }

        Ok(settings)
    }

    pub fn env_filter(&self) -> String {
        format!(
            "budget_admin={level},engine={level},migration={level}",
            level = self.log_level
        )
    }
}
