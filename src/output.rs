//! Rendering of query results.
//!
//! - [`to_json()`] - compact JSON
//! - [`to_json_pretty()`] - JSON with 2-space indentation
//! - [`to_lines()`] - one line per element, for console listings
//!
//! Object keys come out sorted because [`Value::Object`] keeps them sorted.
//! Floats always carry a fractional part (`95.0`, not `95`) so the integer /
//! float distinction survives printing.
//!
//! # Examples
//!
//! ```
//! use sluice::Value;
//! use sluice::output::{to_json, to_lines};
//!
//! assert_eq!(to_json(&Value::Float(95.0)), "95.0");
//!
//! let names = Value::Array(vec!["Jane".into(), "John".into()]);
//! assert_eq!(to_lines(&names), vec!["Jane", "John"]);
//! ```

use std::collections::BTreeMap;

use crate::value::Value;

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        self.print_value(value, 0)
    }

    fn print_value(&self, value: &Value, indent: usize) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => format_float(*n),
            Value::String(s) => format!("\"{}\"", escape_string(s)),
            Value::Array(arr) => self.print_array(arr, indent),
            Value::Object(obj) => self.print_object(obj, indent),
        }
    }

    fn print_array(&self, arr: &[Value], indent: usize) -> String {
        if arr.is_empty() {
            return "[]".to_string();
        }

        let items: Vec<String> = arr
            .iter()
            .map(|v| {
                if self.pretty {
                    format!("{}{}", self.indent(indent + 1), self.print_value(v, indent + 1))
                } else {
                    self.print_value(v, indent)
                }
            })
            .collect();

        if self.pretty {
            format!("[\n{}\n{}]", items.join(",\n"), self.indent(indent))
        } else {
            format!("[{}]", items.join(","))
        }
    }

    fn print_object(&self, obj: &BTreeMap<String, Value>, indent: usize) -> String {
        if obj.is_empty() {
            return "{}".to_string();
        }

        let items: Vec<String> = obj
            .iter()
            .map(|(k, v)| {
                if self.pretty {
                    format!(
                        "{}\"{}\": {}",
                        self.indent(indent + 1),
                        escape_string(k),
                        self.print_value(v, indent + 1)
                    )
                } else {
                    format!("\"{}\":{}", escape_string(k), self.print_value(v, indent))
                }
            })
            .collect();

        if self.pretty {
            format!("{{\n{}\n{}}}", items.join(",\n"), self.indent(indent))
        } else {
            format!("{{{}}}", items.join(","))
        }
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }
}

/// Float text as JSON shows it: whole values keep a `.0`
pub fn format_float(n: f64) -> String {
    if !n.is_finite() {
        // JSON has no NaN or infinity
        "null".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Compact JSON
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Pretty-printed JSON with 2-space indentation
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}

/// One line per element for arrays, a single line for anything else.
///
/// Strings print bare, everything else prints as compact JSON.
pub fn to_lines(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(|item| item.to_string()).collect(),
        other => vec![other.to_string()],
    }
}
