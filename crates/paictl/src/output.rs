//! Rendering command results as JSON, YAML or tables

use comfy_table::Table;
use pai_core::PaginatedResult;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

impl OutputFormat {
    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table)
    }
}

/// Print any serializable value in the requested format
pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    let value = serde_json::to_value(data)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&value)?),
        OutputFormat::Table => println!("{}", value_table(&value)),
    }
    Ok(())
}

/// Print records; tables show only `columns`, JSON and YAML show everything
pub fn print_list<T: Serialize>(items: &[T], format: OutputFormat, columns: &[&str]) -> Result<()> {
    if !format.is_table() {
        return print_output(items, format);
    }
    let rows = items
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        println!("No results");
    } else {
        println!("{}", column_table(&rows, columns));
    }
    Ok(())
}

/// Print one page of results, with a position footer in table mode
pub fn print_page<T: Serialize>(
    page: &PaginatedResult<T>,
    format: OutputFormat,
    columns: &[&str],
) -> Result<()> {
    print_list(&page.items, format, columns)?;
    if format.is_table() && !page.items.is_empty() {
        println!(
            "Page {} ({} of {} total)",
            page.page_number,
            page.items.len(),
            page.total_count
        );
    }
    Ok(())
}

fn column_table(rows: &[Value], columns: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_header(columns.to_vec());
    for row in rows {
        table.add_row(
            columns
                .iter()
                .map(|column| format_value(row.get(*column).unwrap_or(&Value::Null)))
                .collect::<Vec<_>>(),
        );
    }
    table
}

fn value_table(value: &Value) -> Table {
    let mut table = Table::new();
    match value {
        Value::Array(items) => match items.first() {
            Some(Value::Object(first)) => {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);
                for item in items {
                    table.add_row(
                        headers
                            .iter()
                            .map(|h| format_value(item.get(h).unwrap_or(&Value::Null)))
                            .collect::<Vec<_>>(),
                    );
                }
            }
            _ => {
                table.set_header(vec!["Value"]);
                for item in items {
                    table.add_row(vec![format_value(item)]);
                }
            }
        },
        Value::Object(map) => {
            table.set_header(vec!["Key", "Value"]);
            for (key, val) in map {
                table.add_row(vec![key.clone(), format_value(val)]);
            }
        }
        other => {
            table.add_row(vec![format_value(other)]);
        }
    }
    table
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) if arr.iter().all(|v| !v.is_object() && !v.is_array()) => arr
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
