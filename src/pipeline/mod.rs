// src/pipeline/mod.rs

//! The two storefront pipelines. They share nothing but the output schema;
//! the caller picks one with a [`Platform`].

pub mod app_store;
pub mod google_play;

use std::fmt;

pub use app_store::{AppStoreInputs, AppStoreOptions};
pub use google_play::{GooglePlayInputs, GooglePlayOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    AppStore,
    GooglePlay,
}

impl Platform {
    /// Value written to the `Platform` column.
    pub fn label(self) -> &'static str {
        match self {
            Platform::AppStore => "IOS",
            Platform::GooglePlay => "GP",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            Platform::AppStore => "PUBGM",
            Platform::GooglePlay => "HOK",
        }
    }

    /// Header of the sixth output column.
    pub fn revenue_column(self) -> &'static str {
        match self {
            Platform::AppStore => "Revenue",
            Platform::GooglePlay => "Gross daily revenue",
        }
    }

    /// Play units are whole install counts; App Store units are floats.
    pub fn integer_units(self) -> bool {
        matches!(self, Platform::GooglePlay)
    }

    pub fn output_file_name(self, title: &str) -> String {
        match self {
            Platform::AppStore => format!("{}_汇总表.xlsx", title),
            Platform::GooglePlay => format!("{}_最终汇总表.xlsx", title),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::AppStore => "App Store",
            Platform::GooglePlay => "Google Play",
        })
    }
}
