use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable `key: value` lines
    #[default]
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Spinners and other terminal decoration only go with text output
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }
}

pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    println!("{}", render(data, format)?);
    Ok(())
}

pub fn render<T: Serialize>(data: T, format: OutputFormat) -> Result<String> {
    let json_value = serde_json::to_value(data)?;

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&json_value)?,
        OutputFormat::Yaml => serde_yaml::to_string(&json_value)?
            .trim_end()
            .to_string(),
        OutputFormat::Text => render_text(&json_value),
    };
    Ok(rendered)
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Object(obj) => obj
            .iter()
            .map(|(key, val)| format!("{}: {}", key, format_value(val)))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join("\n"),
        _ => format_value(value),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
