//! JSON output
//!
//! Emits the result set in the remote's response shape, so the output can be
//! fed to tools that already understand NewsAPI responses.

use std::io::{self, Write};

use super::ResultFormatter;
use crate::data::ResultSet;

/// Field-preserving JSON formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    /// Indent the output
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl ResultFormatter for JsonFormatter {
    fn render(&self, results: &ResultSet, out: &mut dyn Write) -> io::Result<()> {
        let payload = results.to_payload();
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &payload)?;
        } else {
            serde_json::to_writer(&mut *out, &payload)?;
        }
        writeln!(out)
    }
}
