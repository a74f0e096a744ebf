//! Event output for provisioning runs
//!
//! Each event carries a dotted code (`batch.start`, `account.done`, ...) and is
//! printed either as a plain line or as one JSON object per line.

use colored::*;
use lazy_static::lazy_static;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Success,
    Warn,
    Error,
}

/// Output settings chosen on the command line
#[derive(Debug, Clone)]
pub struct Renderer {
    pub format: OutputFormat,
    pub color: bool,
    /// Debug events are dropped unless set
    pub debug: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
            debug: false,
        }
    }
}

impl Renderer {
    /// Format one event, or `None` when it is filtered out
    fn render(
        &self,
        level: Level,
        code: &str,
        message: &str,
        data: Option<serde_json::Value>,
    ) -> Option<String> {
        if level == Level::Debug && !self.debug {
            return None;
        }

        match self.format {
            OutputFormat::Text if self.color => Some(paint(level, message)),
            OutputFormat::Text => Some(message.to_string()),
            OutputFormat::Json => serde_json::to_string(&Event {
                level,
                code,
                message,
                data,
            })
            .ok(),
        }
    }
}

lazy_static! {
    static ref RENDERER: RwLock<Renderer> = RwLock::new(Renderer::default());
}

/// Replace the process-wide output settings
pub fn configure(renderer: Renderer) {
    if let Ok(mut current) = RENDERER.write() {
        *current = renderer;
    }
}

#[derive(Serialize)]
struct Event<'a> {
    level: Level,
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

fn paint(level: Level, s: &str) -> String {
    match level {
        Level::Debug => s.cyan().to_string(),
        Level::Info => s.normal().to_string(),
        Level::Success => s.green().bold().to_string(),
        Level::Warn => s.yellow().bold().to_string(),
        Level::Error => s.red().bold().to_string(),
    }
}

/// Print one event.
///
/// Every level goes to stdout so that provisioning output keeps its order
/// when captured by a container runtime.
pub fn emit(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) {
    let line = RENDERER
        .read()
        .expect("renderer poisoned")
        .render(level, code, message, data);

    if let Some(line) = line {
        let _ = writeln!(io::stdout().lock(), "{}", line);
    }
}

pub mod prelude {
    pub use super::{Level, OutputFormat, emit};
}
