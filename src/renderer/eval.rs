//! Expression evaluation
//!
//! Evaluation never fails. Missing names, keys and indexes resolve to
//! [`Value::None`], which renders as nothing.

use crate::context::Context;
use crate::parser::ast::{Expr, Kwarg, PathSegment};
use crate::value::{escape, Value};

/// Filters understood by `expr|name[:arg]`
const FILTERS: &[&str] = &["safe", "escape", "upper", "lower", "length", "default"];

/// Evaluate an expression against the current context
pub fn evaluate(expr: &Expr, context: &Context<'_>) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Lookup(path) => lookup(path, context),
        Expr::Filter { input, name, arg } => {
            let value = evaluate(input, context);
            let arg = arg.as_ref().map(|arg| evaluate(arg, context));
            apply_filter(name.node.as_str(), value, arg)
        }
    }
}

fn lookup(path: &[PathSegment], context: &Context<'_>) -> Value {
    let Some((PathSegment::Key(name), rest)) = path.split_first() else {
        return Value::None;
    };
    let mut current = match context.get(name) {
        Some(value) => value,
        None => return Value::None,
    };
    for segment in rest {
        current = match current.get(segment) {
            Some(value) => value,
            None => return Value::None,
        };
    }
    current.clone()
}

fn apply_filter(name: &str, value: Value, arg: Option<Value>) -> Value {
    match name {
        "safe" => match value {
            Value::Safe(_) => value,
            other => Value::Safe(other.to_string()),
        },
        "escape" => match value {
            Value::Safe(_) => value,
            other => Value::Safe(escape(&other.to_string())),
        },
        "upper" => map_text(value, |s| s.to_uppercase()),
        "lower" => map_text(value, |s| s.to_lowercase()),
        "length" => Value::Number(value.len() as f64),
        "default" => {
            if value.is_truthy() {
                value
            } else {
                arg.unwrap_or_default()
            }
        }
        unknown => {
            tracing::warn!(filter = unknown, known = ?FILTERS, "unknown filter, value left unchanged");
            value
        }
    }
}

/// Apply a text transform, keeping safe markup safe
fn map_text(value: Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::None => Value::None,
        Value::Safe(s) => Value::Safe(f(&s)),
        other => Value::String(f(&other.to_string())),
    }
}

/// Evaluate keyword arguments in order.
///
/// A key given twice keeps its first position and takes the later value.
pub fn resolve_params(params: &[Kwarg], context: &Context<'_>) -> Vec<(String, Value)> {
    let mut resolved: Vec<(String, Value)> = Vec::with_capacity(params.len());
    for param in params {
        let value = evaluate(&param.value.node, context);
        let key = param.key.node.as_str();
        match resolved.iter_mut().find(|(existing, _)| existing == key) {
            Some(slot) => slot.1 = value,
            None => resolved.push((key.to_string(), value)),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Identifier, Spanned};
    use std::collections::BTreeMap;

    fn var(path: &[&str]) -> Expr {
        Expr::Lookup(
            path.iter()
                .map(|segment| match segment.parse::<usize>() {
                    Ok(index) => PathSegment::Index(index),
                    Err(_) => PathSegment::Key(segment.to_string()),
                })
                .collect(),
        )
    }

    fn filter(input: Expr, name: &str, arg: Option<Expr>) -> Expr {
        Expr::Filter {
            input: Box::new(input),
            name: Spanned::new(Identifier::new(name), 0..1),
            arg: arg.map(Box::new),
        }
    }

    fn kwarg(key: &str, value: Expr) -> Kwarg {
        Kwarg {
            key: Spanned::new(Identifier::new(key), 0..1),
            value: Spanned::new(value, 0..1),
        }
    }

    fn context() -> Context<'static> {
        let mut user = BTreeMap::new();
        user.insert("name".to_string(), Value::from("Ada"));
        user.insert(
            "tags".to_string(),
            Value::List(vec![Value::from("x"), Value::from("y")]),
        );
        let mut ctx = Context::new();
        ctx.set("user", Value::Map(user));
        ctx.set("markup", Value::from("<i>"));
        ctx
    }

    #[test]
    fn test_dotted_lookup() {
        let ctx = context();
        assert_eq!(evaluate(&var(&["user", "name"]), &ctx), Value::from("Ada"));
        assert_eq!(evaluate(&var(&["user", "tags", "1"]), &ctx), Value::from("y"));
    }

    #[test]
    fn test_missing_lookups_are_none() {
        let ctx = context();
        assert_eq!(evaluate(&var(&["nobody"]), &ctx), Value::None);
        assert_eq!(evaluate(&var(&["user", "age"]), &ctx), Value::None);
        assert_eq!(evaluate(&var(&["user", "tags", "9"]), &ctx), Value::None);
        assert_eq!(evaluate(&var(&["user", "name", "first"]), &ctx), Value::None);
    }

    #[test]
    fn test_text_filters() {
        let ctx = context();
        assert_eq!(
            evaluate(&filter(var(&["user", "name"]), "upper", None), &ctx),
            Value::from("ADA")
        );
        assert_eq!(
            evaluate(&filter(var(&["user", "name"]), "lower", None), &ctx),
            Value::from("ada")
        );
        assert_eq!(
            evaluate(&filter(var(&["nobody"]), "upper", None), &ctx),
            Value::None
        );
    }

    #[test]
    fn test_safe_and_escape() {
        let ctx = context();
        assert_eq!(
            evaluate(&filter(var(&["markup"]), "safe", None), &ctx),
            Value::Safe("<i>".into())
        );
        assert_eq!(
            evaluate(&filter(var(&["markup"]), "escape", None), &ctx),
            Value::Safe("&lt;i&gt;".into())
        );
        // Escaping safe markup again is a no-op
        let twice = filter(filter(var(&["markup"]), "escape", None), "escape", None);
        assert_eq!(evaluate(&twice, &ctx), Value::Safe("&lt;i&gt;".into()));
    }

    #[test]
    fn test_length_and_default() {
        let ctx = context();
        assert_eq!(
            evaluate(&filter(var(&["user", "tags"]), "length", None), &ctx),
            Value::Number(2.0)
        );
        assert_eq!(
            evaluate(
                &filter(var(&["nobody"]), "default", Some(Expr::Literal("n/a".into()))),
                &ctx
            ),
            Value::from("n/a")
        );
        assert_eq!(
            evaluate(
                &filter(var(&["user", "name"]), "default", Some(Expr::Literal("n/a".into()))),
                &ctx
            ),
            Value::from("Ada")
        );
    }

    #[test]
    fn test_unknown_filter_passes_value_through() {
        let ctx = context();
        assert_eq!(
            evaluate(&filter(var(&["user", "name"]), "shout", None), &ctx),
            Value::from("Ada")
        );
    }

    #[test]
    fn test_resolve_params_later_value_wins_in_place() {
        let ctx = context();
        let params = vec![
            kwarg("a", Expr::Literal(Value::Number(1.0))),
            kwarg("b", var(&["user", "name"])),
            kwarg("a", Expr::Literal(Value::Number(3.0))),
        ];
        assert_eq!(
            resolve_params(&params, &ctx),
            vec![
                ("a".to_string(), Value::Number(3.0)),
                ("b".to_string(), Value::from("Ada")),
            ]
        );
    }
}
