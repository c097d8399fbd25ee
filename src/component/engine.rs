//! Component instantiation - renders a use site against its definition

use crate::context::{Context, Scope};
use crate::parser::ast::ComponentUse;
use crate::renderer::{render_nodes, resolve_params};
use crate::value::Value;

use super::slots::{filled, slot_key};
use super::ComponentError;

/// Instantiate a component use site.
///
/// Lookup and slot validation happen before anything is pushed, so those
/// failures leave the context untouched. Everything after that runs inside a
/// single pushed scope which is released on every exit path, errors included.
pub fn instantiate<'t>(
    usage: &'t ComponentUse,
    context: &mut Context<'t>,
) -> Result<String, ComponentError> {
    let component = usage.name.node.as_str();
    let definition = context.registry().lookup(component, &usage.name.span)?;

    for fill in usage.fills() {
        if !definition.slots.contains(fill.name.node.as_str()) {
            return Err(ComponentError::UnknownSlot {
                slot: fill.name.node.0.clone(),
                component: component.to_string(),
                span: fill.name.span.clone(),
            });
        }
    }

    let params = resolve_params(&usage.params, context);
    let extras: Vec<(String, Value)> = params
        .iter()
        .filter(|(key, _)| !definition.has_parameter(key))
        .cloned()
        .collect();

    let body = definition.body;
    let slot_count = definition.slots.len();
    let mut scope: Scope = definition.default_params.iter().cloned().collect();
    scope.extend(params);

    if slot_count == 0 {
        tracing::trace!(component, "instantiating slot-free component");

        let mut guard = context.scoped(scope);
        let content = render_nodes(&usage.body, &mut guard)?;
        guard.set("content", Value::Safe(content));
        guard.set(
            "extraparams",
            Value::List(
                extras
                    .iter()
                    .map(|(key, value)| Value::pair(key.clone(), value.clone()))
                    .collect(),
            ),
        );
        guard.set(
            "extraattrs",
            Value::List(
                extras
                    .into_iter()
                    .map(|(key, value)| Value::pair(attrify(&key), value))
                    .collect(),
            ),
        );
        render_nodes(body, &mut guard)
    } else {
        tracing::trace!(component, slots = slot_count, "instantiating slotted component");

        // Unfilled slots are left absent
        for fill in usage.fills() {
            let text = fill.render(context)?;
            scope.insert(slot_key(fill.name.node.as_str()), filled(text));
        }

        let mut guard = context.scoped(scope);
        render_nodes(body, &mut guard)
    }
}

/// Turn a parameter name into an HTML attribute name: `data_Id` -> `data-id`
pub fn attrify(key: &str) -> String {
    key.replace('_', "-").to_lowercase()
}
