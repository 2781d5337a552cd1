//! Plain-text console listing

use std::io::{self, Write};

use super::ResultFormatter;
use crate::config::OutputConfig;
use crate::data::{Article, ResultSet};

/// Human readable formatter with truncated titles and descriptions
#[derive(Debug, Clone)]
pub struct ConsoleFormatter {
    config: OutputConfig,
    /// Also print author and image URL
    verbose: bool,
}

impl ConsoleFormatter {
    pub fn new(config: OutputConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    fn separator(&self, c: char) -> String {
        std::iter::repeat(c).take(self.config.console_width).collect()
    }

    fn format_date(&self, article: &Article) -> String {
        match article.published_at {
            Some(ts) => ts.format(&self.config.date_format).to_string(),
            None => "Unknown date".to_string(),
        }
    }

    fn render_article(&self, article: &Article, index: usize, out: &mut dyn Write) -> io::Result<()> {
        let title = truncate_text(&article.title, self.config.max_title_length);
        writeln!(out, "{:2}. {}", index + 1, title)?;
        writeln!(out, "    Source: {}", article.source)?;
        writeln!(out, "    Published: {}", self.format_date(article))?;

        if let Some(description) = &article.description {
            let description = truncate_text(description, self.config.max_description_length);
            writeln!(out, "    Description: {}", description)?;
        }

        writeln!(out, "    URL: {}", article.url)?;

        if self.verbose {
            if let Some(author) = &article.author {
                writeln!(out, "    Author: {}", author)?;
            }
            if let Some(image) = &article.url_to_image {
                writeln!(out, "    Image: {}", image)?;
            }
        }

        writeln!(out)
    }
}

impl ResultFormatter for ConsoleFormatter {
    fn render(&self, results: &ResultSet, out: &mut dyn Write) -> io::Result<()> {
        if results.is_empty() {
            return writeln!(out, "No articles found matching your criteria.");
        }

        let shown = results.articles.len();
        let total = format_number(results.total_results);

        writeln!(out, "{}", self.separator('='))?;
        writeln!(out, "NEWS ARTICLES")?;
        writeln!(out, "Total Results: {}", total)?;
        writeln!(out, "Showing: {} articles", shown)?;
        writeln!(out, "{}", self.separator('='))?;
        writeln!(out)?;

        for (index, article) in results.articles.iter().enumerate() {
            self.render_article(article, index, out)?;
        }

        writeln!(out, "{}", self.separator('-'))?;
        writeln!(
            out,
            "End of results. Showing {} of {} total articles.",
            shown, total
        )
    }
}

/// Shortens `text` to at most `max_length` characters, ending in "..." when cut
pub fn truncate_text(text: &str, max_length: usize) -> String {
    const SUFFIX: &str = "...";

    if text.chars().count() <= max_length {
        return text.to_string();
    }
    if max_length < SUFFIX.len() {
        return SUFFIX.chars().take(max_length).collect();
    }
    let keep = max_length - SUFFIX.len();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(SUFFIX);
    truncated
}

/// Formats a count with thousands separators, e.g. `1234567` → `1,234,567`
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
