//! Runtime values bound in the rendering context

use std::collections::BTreeMap;
use std::fmt;

use crate::parser::ast::PathSegment;

/// A value stored in a context scope or produced by an expression
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent or unresolved value; renders as nothing
    #[default]
    None,
    Bool(bool),
    Number(f64),
    String(String),
    /// Markup that is already escaped and must be emitted verbatim
    Safe(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Build a two-element list, the shape used for `(key, value)` pairs
    pub fn pair(key: impl Into<String>, value: Value) -> Self {
        Value::List(vec![Value::String(key.into()), value])
    }

    /// Truthiness as used by `{% if %}` and the `default` filter
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) | Value::Safe(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// Step into a map key or list index
    pub fn get(&self, segment: &PathSegment) -> Option<&Value> {
        match (self, segment) {
            (Value::Map(map), PathSegment::Key(key)) => map.get(key),
            (Value::Map(map), PathSegment::Index(index)) => map.get(&index.to_string()),
            (Value::List(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    /// Number of items, characters or entries
    pub fn len(&self) -> usize {
        match self {
            Value::String(s) | Value::Safe(s) => s.chars().count(),
            Value::List(items) => items.len(),
            Value::Map(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text for template output, escaping unless the value is already safe
    pub fn render(&self, autoescape: bool) -> String {
        match self {
            Value::Safe(s) => s.clone(),
            other if autoescape => escape(&other.to_string()),
            other => other.to_string(),
        }
    }
}

/// HTML-escape `&`, `<`, `>`, `"` and `'`
pub fn escape(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Number(n) => write_number(f, *n),
            Value::String(s) | Value::Safe(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_item(f, item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}': ", key)?;
                    write_item(f, item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Nested items quote their strings so lists stay readable
fn write_item(f: &mut fmt::Formatter<'_>, item: &Value) -> fmt::Result {
    match item {
        Value::String(s) | Value::Safe(s) => write!(f, "'{}'", s),
        Value::None => write!(f, "None"),
        other => write!(f, "{}", other),
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i as f64),
            toml::Value::Float(n) => Value::Number(n),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => Value::Map(
                table
                    .into_iter()
                    .map(|(key, item)| (key, Value::from(item)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::None.to_string(), "");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(
            Value::pair("data-id", Value::Number(7.0)).to_string(),
            "['data-id', 7]"
        );
    }

    #[test]
    fn test_render_escapes_once() {
        let raw = Value::from("<b>\"hi\"</b>");
        assert_eq!(raw.render(true), "&lt;b&gt;&quot;hi&quot;&lt;/b&gt;");
        assert_eq!(raw.render(false), "<b>\"hi\"</b>");

        let safe = Value::Safe("<b>hi</b>".to_string());
        assert_eq!(safe.render(true), "<b>hi</b>");
    }

    #[test]
    fn test_get_path_segments() {
        let mut map = BTreeMap::new();
        map.insert("items".to_string(), Value::List(vec![Value::from("a")]));
        let value = Value::Map(map);

        let items = value.get(&PathSegment::Key("items".into())).unwrap();
        assert_eq!(items.get(&PathSegment::Index(0)), Some(&Value::from("a")));
        assert_eq!(items.get(&PathSegment::Index(3)), None);
        assert_eq!(value.get(&PathSegment::Key("missing".into())), None);
    }

    #[test]
    fn test_from_toml() {
        let table: toml::Table = toml::from_str("n = 3\nflag = true\nlist = [\"a\"]").unwrap();
        let value = Value::from(toml::Value::Table(table));
        let Value::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(map["n"], Value::Number(3.0));
        assert_eq!(map["flag"], Value::Bool(true));
        assert_eq!(map["list"], Value::List(vec![Value::from("a")]));
    }
}
