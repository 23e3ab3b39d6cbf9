use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Optional settings file looked up in the working directory.
const DEFAULT_FILE: &str = "staff_scraper";
const ENV_PREFIX: &str = "STAFF";

/// What to do with publications of staff already in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublicationPolicy {
    /// Skip known staff entirely, publications included.
    #[default]
    SkipExisting,
    /// Revisit known staff and store titles not seen before.
    Refresh,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub roster_url: String,
    pub db_path: PathBuf,
    pub wait_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub headless: bool,
    /// Chrome drops its connection after this long without page events.
    pub browser_idle_timeout_secs: u64,
    /// Visible text of the staff page link leading to the full publication list.
    pub full_record_label: String,
    pub publication_policy: PublicationPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roster_url: "https://pers.uz.zgora.pl/publikacje-instytuty/095028".into(),
            db_path: PathBuf::from("data/staff.sqlite"),
            wait_timeout_secs: 10,
            http_timeout_secs: 30,
            user_agent: concat!("staff_scraper/", env!("CARGO_PKG_VERSION")).into(),
            headless: true,
            browser_idle_timeout_secs: 300,
            full_record_label: "cały dorobek".into(),
            publication_policy: PublicationPolicy::SkipExisting,
        }
    }
}

impl Settings {
    /// Defaults, then `staff_scraper.{toml,yaml,json}` if present, then
    /// `file`, then `STAFF_*` environment variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::with_name(DEFAULT_FILE).required(false));
        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        Ok(settings)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Never shorter than twice a full fetch plus a full wait, since the tab
    /// sits idle while a publication page is fetched and stored.
    pub fn browser_idle_timeout(&self) -> Duration {
        let floor = 2 * (self.http_timeout_secs + self.wait_timeout_secs);
        Duration::from_secs(self.browser_idle_timeout_secs.max(floor))
    }
}
