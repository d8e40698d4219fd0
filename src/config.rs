use crate::error::{EntryError, Result};
use crate::resilient::RetryPolicy;
use crate::site::SiteProfile;
use chrono::{FixedOffset, Local, Offset};
use pavement_entry_common::AliasConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const PASSWORD_ENV: &str = "PAVEMENT_ENTRY_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub username: String,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(alias = "excelPath")]
    pub spreadsheet_path: PathBuf,

    /// fuzzy-matched against the database dropdown, not compared exactly
    #[serde(alias = "dataBase")]
    pub target_database_name: String,

    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,

    #[serde(default = "default_unmatched_report_path")]
    pub unmatched_report_path: PathBuf,

    #[serde(default)]
    pub headless: bool,

    /// audit timestamps offset from UTC; local offset at start-up when unset
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,

    #[serde(default)]
    pub timing: Timing,

    #[serde(default)]
    pub matching: Matching,

    #[serde(default)]
    pub site: SiteProfile,

    /// directory relative paths resolve against
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Waits and retry budgets, all bounded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timing {
    pub retries: u32,
    pub retry_wait_ms: u64,
    pub wait_timeout_secs: u64,
    pub navigation_timeout_secs: u64,
    pub login_settle_ms: u64,
    pub menu_settle_ms: u64,
    pub error_dialog_wait_ms: u64,
    pub row_pause_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_wait_ms: 500,
            wait_timeout_secs: 10,
            navigation_timeout_secs: 30,
            login_settle_ms: 8000,
            menu_settle_ms: 1000,
            error_dialog_wait_ms: 2000,
            row_pause_ms: 500,
        }
    }
}

impl Timing {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_millis(self.retry_wait_ms))
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_millis(self.login_settle_ms)
    }

    pub fn menu_settle(&self) -> Duration {
        Duration::from_millis(self.menu_settle_ms)
    }

    pub fn error_dialog_wait(&self) -> Duration {
        Duration::from_millis(self.error_dialog_wait_ms)
    }

    pub fn row_pause(&self) -> Duration {
        Duration::from_millis(self.row_pause_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Matching {
    /// best matches scoring below this are written to the unmatched report
    pub min_score: f64,
    pub alias_preset: String,
    /// merged over the preset, per field
    pub aliases: AliasConfig,
}

impl Default for Matching {
    fn default() -> Self {
        Self {
            min_score: 0.5,
            alias_preset: "streetsaver".into(),
            aliases: AliasConfig::default(),
        }
    }
}

impl Matching {
    pub fn alias_table(&self) -> Result<AliasConfig> {
        let mut table = AliasConfig::from_preset(&self.alias_preset).ok_or_else(|| {
            EntryError::Config(format!(
                "unknown alias preset '{}' (streetsaver/none)",
                self.alias_preset
            ))
        })?;
        table.merge(&self.aliases);
        Ok(table)
    }
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("audit_log.xlsx")
}

fn default_unmatched_report_path() -> PathBuf {
    PathBuf::from("unmatched_rows.xlsx")
}

impl Config {
    /// Loads `explicit`, else `./config.json`, else
    /// `~/.config/pavement-entry/config.json`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if path.exists() => path.to_path_buf(),
            Some(path) => return Err(EntryError::FileNotFound(path.display().to_string())),
            None => Self::discover()?,
        };

        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn discover() -> Result<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Ok(local);
        }

        let user = Self::user_config_path()?;
        if user.exists() {
            return Ok(user);
        }

        Err(EntryError::Config(format!(
            "{} not found in the current directory or at {}",
            CONFIG_FILE_NAME,
            user.display()
        )))
    }

    pub fn user_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| EntryError::Config("home directory not found".into()))?;
        Ok(home
            .join(".config")
            .join("pavement-entry")
            .join(CONFIG_FILE_NAME))
    }

    fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(EntryError::Config("username is empty".into()));
        }
        if self.target_database_name.trim().is_empty() {
            return Err(EntryError::Config("targetDatabaseName is empty".into()));
        }
        if self.spreadsheet_path.as_os_str().is_empty() {
            return Err(EntryError::Config("spreadsheetPath is empty".into()));
        }
        if self.timing.retries == 0 {
            return Err(EntryError::Config("timing.retries must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.matching.min_score) {
            return Err(EntryError::Config("matching.minScore must be within 0..1".into()));
        }
        self.matching.alias_table()?;
        self.audit_offset()?;
        Ok(())
    }

    /// Password from the environment, then the config file
    pub fn password(&self) -> Option<String> {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            if !password.is_empty() {
                return Some(password);
            }
        }

        self.password.clone().filter(|p| !p.is_empty())
    }

    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn spreadsheet(&self) -> PathBuf {
        self.resolve_path(&self.spreadsheet_path)
    }

    pub fn audit_log(&self) -> PathBuf {
        self.resolve_path(&self.audit_log_path)
    }

    pub fn unmatched_report(&self) -> PathBuf {
        self.resolve_path(&self.unmatched_report_path)
    }

    pub fn audit_offset(&self) -> Result<FixedOffset> {
        match self.utc_offset_minutes {
            Some(minutes) => FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
                EntryError::Config(format!("utcOffsetMinutes out of range: {}", minutes))
            }),
            None => Ok(Local::now().offset().fix()),
        }
    }
}
