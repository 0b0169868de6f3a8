//! Rendering for `--output`.
//!
//! Every printable value serializes for the structured formats and
//! supplies its own human and script-friendly text.

use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// A command result that can be shown in any output format.
pub trait Printable: Serialize {
    /// Text for `table`, the interactive default.
    fn human(&self) -> String;

    /// Text for `plain`: tab-separated fields, one record per line.
    fn plain(&self) -> String;
}

pub fn render<P: Printable + ?Sized>(format: &OutputFormat, value: &P) -> String {
    match format {
        OutputFormat::Table => value.human(),
        OutputFormat::Plain => value.plain(),
        OutputFormat::Json => serde_json::to_string_pretty(value).unwrap_or_else(json_failure),
        OutputFormat::JsonCompact => serde_json::to_string(value).unwrap_or_else(json_failure),
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .unwrap_or_else(|e| format!("error: serialization failed: {e}")),
    }
}

fn json_failure(e: serde_json::Error) -> String {
    serde_json::json!({ "error": format!("serialization failed: {e}") }).to_string()
}

/// Build a table from rows, or a placeholder line when there are none.
pub fn table<R: Tabled>(rows: Vec<R>, empty: &str) -> String {
    if rows.is_empty() {
        return empty.to_owned();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Write to stdout unless quiet. Empty output prints nothing.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Score {
        home: u32,
        away: u32,
    }

    impl Printable for Score {
        fn human(&self) -> String {
            format!("{} - {}", self.home, self.away)
        }

        fn plain(&self) -> String {
            format!("{}\t{}", self.home, self.away)
        }
    }

    #[test]
    fn each_format_uses_its_own_text() {
        let score = Score { home: 54, away: 50 };
        assert_eq!(render(&OutputFormat::Table, &score), "54 - 50");
        assert_eq!(render(&OutputFormat::Plain, &score), "54\t50");
        assert_eq!(
            render(&OutputFormat::JsonCompact, &score),
            r#"{"home":54,"away":50}"#
        );
        assert_eq!(render(&OutputFormat::Yaml, &score), "home: 54\naway: 50\n");
    }

    #[test]
    fn empty_table_prints_placeholder() {
        #[derive(Tabled)]
        struct Row {
            id: String,
        }
        assert_eq!(table(Vec::<Row>::new(), "Nothing here"), "Nothing here");
        assert!(table(vec![Row { id: "n1".into() }], "Nothing here").contains("n1"));
    }
}
