use crate::error::{EntryError, Result};
use clap::Parser;
use dialoguer::Password;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pavement-entry")]
#[command(
    about = "Enters pavement sections from a spreadsheet into StreetSaver",
    long_about = None
)]
pub struct Cli {
    /// config.json (default: ./config.json, then ~/.config/pavement-entry/config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// run Chrome without a window
    #[arg(long)]
    pub headless: bool,
}

impl Cli {
    /// `RUST_LOG`-style filter used when `RUST_LOG` is unset
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "pavement_entry=debug,pavement_entry_common=debug,info"
        } else {
            "info"
        }
    }
}

/// Asks for the password on the terminal
pub fn prompt_password(username: &str) -> Result<String> {
    let password = Password::new()
        .with_prompt(format!("Password for {}", username))
        .interact()
        .map_err(|e| EntryError::CliExecution(format!("password prompt failed: {}", e)))?;

    if password.is_empty() {
        return Err(EntryError::CliExecution("empty password".into()));
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["pavement-entry", "--config", "run.json", "--headless", "-v"]);
        assert_eq!(cli.config, Some(PathBuf::from("run.json")));
        assert!(cli.headless);
        assert!(cli.verbose);
        assert!(cli.default_log_filter().contains("debug"));
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["pavement-entry"]);
        assert!(cli.config.is_none());
        assert!(!cli.headless);
        assert_eq!(cli.default_log_filter(), "info");
    }
}
