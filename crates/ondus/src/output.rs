//! Output formatting: table, JSON, plain.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a list of rows in the chosen format.
///
/// `plain` calls `id_fn` on each row to emit one identifier per line.
pub fn render_list<T>(
    format: &OutputFormat,
    data: &[T],
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + Tabled,
{
    Ok(match format {
        OutputFormat::Table => render_table(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Plain => data.iter().map(id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a JSON value; table and plain formats fall back to pretty JSON.
pub fn render_value(format: &OutputFormat, value: &serde_json::Value) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(value)?,
        OutputFormat::Table | OutputFormat::Json | OutputFormat::Plain => {
            serde_json::to_string_pretty(value)?
        }
    })
}

fn render_table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "No results.".into();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
