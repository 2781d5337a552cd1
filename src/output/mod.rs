//! Rendering of result sets
//!
//! Every output format implements [`ResultFormatter`]. The caller picks an
//! [`OutputFormat`] once and gets a boxed formatter back; nothing downstream
//! branches on the format again.

mod console;
mod json;

pub use console::{format_number, truncate_text, ConsoleFormatter};
pub use json::JsonFormatter;

use std::io::{self, Write};

use clap::ValueEnum;

use crate::config::OutputConfig;
use crate::data::ResultSet;

/// Renders a result set to a writer
pub trait ResultFormatter {
    fn render(&self, results: &ResultSet, out: &mut dyn Write) -> io::Result<()>;
}

/// Available output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable listing
    #[default]
    Console,
    /// Machine readable JSON in the remote's response shape
    Json,
}

impl OutputFormat {
    /// Builds the formatter for this format
    pub fn formatter(self, config: &OutputConfig, verbose: bool) -> Box<dyn ResultFormatter> {
        match self {
            OutputFormat::Console => Box::new(ConsoleFormatter::new(config.clone(), verbose)),
            OutputFormat::Json => Box::new(JsonFormatter::new(verbose)),
        }
    }
}

/// Renders into a `String`, mostly for tests and previews
pub fn render_to_string(formatter: &dyn ResultFormatter, results: &ResultSet) -> io::Result<String> {
    let mut buf = Vec::new();
    formatter.render(results, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
