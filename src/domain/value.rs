//! Field value model
//!
//! Task fields are schemaless: any key can hold any value. The value itself
//! is one of four shapes, so serialization and comparison logic can match
//! exhaustively instead of probing runtime types.

use serde_json::json;

/// A single field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain text, possibly spanning multiple lines
    Str(String),
    /// Numeric value (integers render without a fractional part)
    Num(f64),
    /// Boolean flag
    Bool(bool),
    /// Ordered list of names (tags, stakeholders)
    List(Vec<String>),
}

impl Value {
    /// Coerces a bare (unquoted) token into a typed value.
    ///
    /// `true`/`false` become booleans and numeric literals become numbers;
    /// everything else stays a string. Quoted text must not pass through
    /// here, since quoting pins the string type.
    pub fn coerce(text: &str) -> Value {
        match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => {
                if looks_numeric(text) {
                    match text.parse::<f64>() {
                        Ok(n) => Value::Num(n),
                        Err(_) => Value::Str(text.to_string()),
                    }
                } else {
                    Value::Str(text.to_string())
                }
            }
        }
    }

    /// Returns the string form used for lexicographic comparison and for
    /// serialization. Lists join with `", "`, numbers drop a zero fraction.
    pub fn render(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Num(n) => render_number(*n),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => items.join(", "),
        }
    }

    /// Returns the numeric value if this is a number
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a flag
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string value if this is plain text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items if this is a list
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns true if the value contains an embedded newline
    pub fn is_multiline(&self) -> bool {
        matches!(self, Value::Str(s) if s.contains('\n'))
    }

    /// Converts to a JSON value for output rendering and id hashing
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(s) => json!(s),
            Value::Num(n) => json!(n),
            Value::Bool(b) => json!(b),
            Value::List(items) => json!(items),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Splits a comma-separated value into trimmed list items.
///
/// Used wherever `tags`/`stakeholders` receive a scalar assignment: the
/// parser's `key: value` path and the query engine's SET clause.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Checks whether text has the lexical shape of a number.
///
/// Stricter than `str::parse::<f64>`: `inf`, `nan` and exponent forms stay
/// strings so they round-trip as typed.
fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() {
        return false;
    }
    let mut seen_dot = false;
    for (i, c) in digits.char_indices() {
        match c {
            '0'..='9' => {}
            '.' if !seen_dot && i > 0 && i + 1 < digits.len() => seen_dot = true,
            _ => return false,
        }
    }
    true
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
