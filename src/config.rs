// src/config.rs

//! Optional YAML settings. Every field has a default, so an empty file (or
//! no file at all) reproduces the stock behaviour; command-line flags win
//! over anything set here.
//!
//! ```yaml
//! google_play:
//!   title: HOK
//!   date_format: "%b %d, %Y"
//! app_store:
//!   first_month: Jan 2023
//!   month_count: 17
//! output:
//!   dir: out
//! ```

use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::error::{PipelineError, Result};
use crate::pipeline::{AppStoreOptions, GooglePlayOptions, Platform};
use crate::process::date_parser::DateFormat;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub google_play: GooglePlaySettings,
    pub app_store: AppStoreSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GooglePlaySettings {
    pub title: String,
    pub date_format: String,
    pub currency_prefix: String,
    pub date_column: String,
    pub excluded_columns: Vec<String>,
    pub country_column: String,
    pub region_column: String,
}

impl Default for GooglePlaySettings {
    fn default() -> Self {
        GooglePlaySettings {
            title: Platform::GooglePlay.default_title().into(),
            date_format: "%b %d, %Y".into(),
            currency_prefix: "USD ".into(),
            date_column: "Date".into(),
            excluded_columns: vec!["Notes".into()],
            country_column: "国家名称".into(),
            region_column: "所属区域".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppStoreSettings {
    pub title: String,
    pub first_month: String,
    pub month_count: usize,
}

impl Default for AppStoreSettings {
    fn default() -> Self {
        let d = AppStoreOptions::default();
        AppStoreSettings {
            title: d.title,
            first_month: d.first_month,
            month_count: d.month_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings { dir: PathBuf::from(".") }
    }
}

impl Settings {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}

impl GooglePlaySettings {
    /// Validates the date format.
    pub fn to_options(&self) -> Result<GooglePlayOptions> {
        Ok(GooglePlayOptions {
            title: self.title.clone(),
            date_format: DateFormat::new(&self.date_format)?,
            currency_prefix: self.currency_prefix.clone(),
            date_column: self.date_column.clone(),
            excluded_columns: self.excluded_columns.clone(),
            country_column: self.country_column.clone(),
            region_column: self.region_column.clone(),
        })
    }
}

impl AppStoreSettings {
    pub fn to_options(&self) -> AppStoreOptions {
        AppStoreOptions {
            title: self.title.clone(),
            first_month: self.first_month.clone(),
            month_count: self.month_count,
        }
    }
}
