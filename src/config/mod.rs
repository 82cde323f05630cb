use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{FixedOffset, Offset, Utc};
use dirs::home_dir;
use serde::{Deserialize, Serialize};

use crate::core::position::ProjectionOptions;
use crate::currency::CurrencyCode;
use crate::domain::period::Granularity;
use crate::errors::EngineError;
use crate::ledger::periods::Locale;

const DEFAULT_DIR_NAME: &str = ".treasury_core";
const HOME_ENV: &str = "TREASURY_CORE_HOME";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

/// Returns the application data directory, defaulting to `~/.treasury_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Engine defaults persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub base_currency: CurrencyCode,
    /// Minutes east of UTC used to decide the local "today".
    pub timezone_offset_minutes: i32,
    pub locale: Locale,
    pub granularity: Granularity,
    pub horizon_length: i32,
    pub period_offset: i32,
    pub include_off_budget_revenue: bool,
    pub include_off_budget_expense: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_currency: CurrencyCode::default(),
            timezone_offset_minutes: 0,
            locale: Locale::En,
            granularity: Granularity::Month,
            horizon_length: 12,
            period_offset: 0,
            include_off_budget_revenue: false,
            include_off_budget_expense: false,
        }
    }
}

impl EngineConfig {
    /// Fixed offset for `timezone_offset_minutes`; out-of-range values fall back to UTC.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn projection_options(&self) -> ProjectionOptions {
        ProjectionOptions {
            base_currency: self.base_currency.clone(),
            include_off_budget_revenue: self.include_off_budget_revenue,
            include_off_budget_expense: self.include_off_budget_expense,
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, EngineError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, EngineError> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
        })
    }

    /// Points the manager at an explicit config file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<EngineConfig, EngineError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(EngineConfig::default())
        }
    }

    pub fn save(&self, config: &EngineConfig) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), EngineError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
