//! Output rendering: table + status line, or one JSON / YAML document.
//!
//! Every command hands a [`TabularResult`] to [`Renderer::emit`]. Masking
//! and truncation are applied before either rendering, so both modes show
//! the same columns in the same order with the same values.

use std::io::{self, IsTerminal, Write};

use miette::Diagnostic;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};
use vcloud_core::TabularResult;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Documents ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Document<'a> {
    status: i32,
    message: &'a str,
    results: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct ErrorDocument<'a> {
    status: i32,
    error: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a serde_json::Value>,
}

// ── Renderer ─────────────────────────────────────────────────────────

/// Single-row results wider than this render vertically in table mode.
const VERTICAL_MIN_COLUMNS: usize = 4;

#[derive(Debug, Clone)]
pub struct Renderer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Renderer {
    pub fn new(format: OutputFormat, color: ColorMode, quiet: bool) -> Self {
        Self {
            format,
            color: should_color(color),
            quiet,
        }
    }

    pub fn is_structured(&self) -> bool {
        self.format != OutputFormat::Table
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Render `result` and a status `message` in the selected format.
    pub fn render(&self, result: &TabularResult, message: &str) -> Result<String, CliError> {
        let clean = result.sanitized();
        let doc = Document {
            status: 0,
            message,
            results: clean.records(),
        };
        match self.format {
            OutputFormat::Table => Ok(self.render_human(&clean, message)),
            OutputFormat::Json => serde_json::to_string_pretty(&doc).map_err(internal),
            OutputFormat::JsonCompact => serde_json::to_string(&doc).map_err(internal),
            OutputFormat::Yaml => serde_yaml::to_string(&doc).map_err(internal),
        }
    }

    /// Render and print to stdout, respecting quiet mode.
    pub fn emit(&self, result: &TabularResult, message: &str) -> Result<(), CliError> {
        let out = self.render(result, message)?;
        print_output(&out, self.quiet);
        Ok(())
    }

    /// Emit a result that is only a status message.
    pub fn emit_message(&self, message: &str) -> Result<(), CliError> {
        self.emit(&TabularResult::default(), message)
    }

    fn render_human(&self, result: &TabularResult, message: &str) -> String {
        let mut out = String::new();
        if !result.is_empty() {
            out.push_str(&render_table(result));
            out.push('\n');
        }
        if !message.is_empty() {
            if self.color {
                out.push_str(&message.green().to_string());
            } else {
                out.push_str(message);
            }
        }
        out.trim_end().to_owned()
    }

    /// Write `err` to stderr: a miette report for humans, or an error
    /// document in the structured format.
    pub fn report_error(&self, err: CliError) {
        if !self.is_structured() {
            eprintln!("{:?}", miette::Report::new(err));
            return;
        }

        let detail = match &err {
            CliError::RemoteOperation { detail, .. } => detail.as_ref(),
            _ => None,
        };
        let doc = ErrorDocument {
            status: err.exit_code(),
            error: err.kind(),
            message: err.to_string(),
            help: err.help().map(|h| h.to_string()),
            detail,
        };
        let rendered = match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(&doc).ok(),
            OutputFormat::JsonCompact => serde_json::to_string(&doc).ok(),
            OutputFormat::Json | OutputFormat::Table => serde_json::to_string_pretty(&doc).ok(),
        };
        eprintln!("{}", rendered.unwrap_or_else(|| err.to_string()).trim_end());
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table(result: &TabularResult) -> String {
    let mut builder = Builder::default();
    let vertical = result.len() == 1 && result.columns().len() >= VERTICAL_MIN_COLUMNS;

    if vertical {
        for (column, value) in result.columns().iter().zip(&result.rows()[0]) {
            builder.push_record([column.clone(), value.clone()]);
        }
    } else {
        builder.push_record(result.columns().iter().cloned());
        for row in result.rows() {
            builder.push_record(row.iter().cloned());
        }
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn internal(e: impl std::fmt::Display) -> CliError {
    CliError::Internal(format!("failed to serialize output: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> TabularResult {
        let mut result = TabularResult::new(["name", "status", "admin_password"]);
        result.push_row(["web", "POWERED_ON", "s3cret"]).unwrap();
        result.push_row(["db", "POWERED_OFF", "hunter2"]).unwrap();
        result
    }

    #[test]
    fn human_and_structured_show_the_same_cells() {
        let human = Renderer::new(OutputFormat::Table, ColorMode::Never, false)
            .render(&sample(), "2 vApps")
            .unwrap();
        let json = Renderer::new(OutputFormat::Json, ColorMode::Never, false)
            .render(&sample(), "2 vApps")
            .unwrap();

        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["status"], 0);
        assert_eq!(doc["message"], "2 vApps");
        let results = doc["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);

        for record in results {
            for (column, value) in record.as_object().unwrap() {
                assert!(human.contains(column.as_str()), "missing column {column}");
                assert!(human.contains(value.as_str().unwrap()), "missing value {value}");
            }
        }
        assert!(!human.contains("s3cret") && !json.contains("s3cret"));
        assert!(human.contains("2 vApps"));
    }

    #[test]
    fn yaml_document_has_results() {
        let yaml = Renderer::new(OutputFormat::Yaml, ColorMode::Never, false)
            .render(&sample(), "ok")
            .unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc["results"][0]["admin_password"], "********");
        assert_eq!(doc["results"][1]["name"], "db");
    }

    #[test]
    fn compact_json_is_one_line() {
        let out = Renderer::new(OutputFormat::JsonCompact, ColorMode::Never, false)
            .render(&sample(), "ok")
            .unwrap();
        assert!(!out.contains('\n'));
    }

    #[test]
    fn wide_single_row_renders_vertically() {
        let detail = TabularResult::from_pairs([
            ("name", "vdc-1"),
            ("id", "urn:vdc:1"),
            ("allocation_model", "AllocationVApp"),
            ("enabled", "true"),
        ]);
        let out = Renderer::new(OutputFormat::Table, ColorMode::Never, false)
            .render(&detail, "")
            .unwrap();
        let name_line = out.lines().find(|l| l.contains("allocation_model")).unwrap();
        assert!(name_line.contains("AllocationVApp"));
    }

    #[test]
    fn message_only_result_is_just_the_message() {
        let out = Renderer::new(OutputFormat::Table, ColorMode::Never, false)
            .render(&TabularResult::default(), "logged out")
            .unwrap();
        assert_eq!(out, "logged out");
    }
}
