use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{error, warn};

use crate::error::PipelineError;

/// A non-fatal condition raised while a pipeline still produced its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Countries or territories with no entry in the reference table.
    UnmappedRegions { names: Vec<String> },
    /// Date cells that did not match the declared format.
    UnparsableDates { format: String, values: Vec<String> },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnmappedRegions { names } => {
                write!(f, "no region found for: {}", names.join(", "))
            }
            Warning::UnparsableDates { format, values } => write!(
                f,
                "dates not matching {:?}: {}",
                format,
                values.join(", ")
            ),
        }
    }
}

/// A value together with the warnings raised while computing it.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    pub fn with_warnings(value: T, warnings: Vec<Warning>) -> Self {
        Outcome { value, warnings }
    }

    /// Hand every warning to `reporter`, keeping the value.
    pub fn report(self, reporter: &mut dyn Reporter) -> T {
        for w in &self.warnings {
            reporter.warning(w);
        }
        self.value
    }
}

/// Collects distinct strings in first-seen order; used to fold many
/// per-row misses into a single warning.
#[derive(Debug, Default)]
pub struct DistinctList {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl DistinctList {
    pub fn push(&mut self, item: &str) {
        if self.seen.insert(item.to_string()) {
            self.items.push(item.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// Sink for pipeline diagnostics. Warnings and fatal errors arrive on
/// separate methods so implementations never have to guess the severity.
pub trait Reporter {
    fn warning(&mut self, warning: &Warning);
    fn fatal(&mut self, err: &PipelineError);
}

/// Forwards everything to `tracing`.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn warning(&mut self, warning: &Warning) {
        warn!("{}", warning);
    }

    fn fatal(&mut self, err: &PipelineError) {
        error!("processing failed: {}", err);
    }
}

/// Keeps everything in memory; serializes to the `--diagnostics-json` summary.
#[derive(Debug, Default, Serialize)]
pub struct CollectingReporter {
    pub warnings: Vec<Warning>,
    pub fatal: Option<String>,
}

impl Reporter for CollectingReporter {
    fn warning(&mut self, warning: &Warning) {
        self.warnings.push(warning.clone());
    }

    fn fatal(&mut self, err: &PipelineError) {
        self.fatal = Some(err.to_string());
    }
}

/// Fans out to several reporters in order.
pub struct Tee<'a> {
    pub sinks: Vec<&'a mut dyn Reporter>,
}

impl Reporter for Tee<'_> {
    fn warning(&mut self, warning: &Warning) {
        for s in self.sinks.iter_mut() {
            s.warning(warning);
        }
    }

    fn fatal(&mut self, err: &PipelineError) {
        for s in self.sinks.iter_mut() {
            s.fatal(err);
        }
    }
}
