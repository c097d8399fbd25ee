//! Node rendering

use std::collections::BTreeMap;

use crate::component::{instantiate, ComponentDefinition, ComponentError};
use crate::context::{Context, Scope};
use crate::parser::ast::{Document, ForNode, GenerateIdNode, IfNode, Node, PathSegment, Spanned};
use crate::value::Value;

use super::eval::evaluate;

/// Render a whole document against `context`
pub fn render_document<'t>(
    document: &'t Document,
    context: &mut Context<'t>,
) -> Result<String, ComponentError> {
    render_nodes(&document.nodes, context)
}

/// Render sibling nodes in order and concatenate their output
pub fn render_nodes<'t>(
    nodes: &'t [Spanned<Node>],
    context: &mut Context<'t>,
) -> Result<String, ComponentError> {
    let mut output = String::new();
    for node in nodes {
        output.push_str(&render_node(&node.node, context)?);
    }
    Ok(output)
}

fn render_node<'t>(node: &'t Node, context: &mut Context<'t>) -> Result<String, ComponentError> {
    match node {
        Node::Text(text) => Ok(text.clone()),
        Node::Variable(expr) => Ok(evaluate(expr, context).render(context.autoescape())),
        Node::If(block) => render_if(block, context),
        Node::For(block) => render_for(block, context),
        Node::GenerateId(tag) => Ok(render_generate_id(tag, context)),
        Node::ComponentDefine(define) => {
            let definition = ComponentDefinition::from_node(define, context);
            context.registry_mut().register(definition);
            Ok(String::new())
        }
        Node::ComponentUse(usage) => instantiate(usage, context),
        Node::SlotDeclare(slot) => slot.render(context),
        // Fill content only reaches the output through its component
        Node::SlotFill(_) => Ok(String::new()),
    }
}

fn render_if<'t>(block: &'t IfNode, context: &mut Context<'t>) -> Result<String, ComponentError> {
    let truthy = evaluate(&block.condition, context).is_truthy();
    if truthy != block.negated {
        render_nodes(&block.then_branch, context)
    } else {
        render_nodes(&block.else_branch, context)
    }
}

fn render_for<'t>(block: &'t ForNode, context: &mut Context<'t>) -> Result<String, ComponentError> {
    let items = match evaluate(&block.iterable, context) {
        Value::List(items) => items,
        Value::Map(map) => map.into_keys().map(Value::String).collect(),
        _ => Vec::new(),
    };

    let count = items.len();
    let mut output = String::new();
    for (index, item) in items.into_iter().enumerate() {
        let mut scope = Scope::new();
        if let [target] = block.targets.as_slice() {
            scope.insert(target.node.0.clone(), item);
        } else {
            for (position, target) in block.targets.iter().enumerate() {
                let value = item
                    .get(&PathSegment::Index(position))
                    .cloned()
                    .unwrap_or_default();
                scope.insert(target.node.0.clone(), value);
            }
        }
        scope.insert("forloop".to_string(), forloop(index, count));

        let mut guard = context.scoped(scope);
        output.push_str(&render_nodes(&block.body, &mut guard)?);
    }
    Ok(output)
}

fn forloop(index: usize, count: usize) -> Value {
    let mut map = BTreeMap::new();
    map.insert("counter".to_string(), Value::from((index + 1) as i64));
    map.insert("counter0".to_string(), Value::from(index as i64));
    map.insert("first".to_string(), Value::Bool(index == 0));
    map.insert("last".to_string(), Value::Bool(index + 1 == count));
    Value::Map(map)
}

fn render_generate_id(tag: &GenerateIdNode, context: &mut Context<'_>) -> String {
    let prefix = evaluate(&tag.prefix, context).to_string();
    let id = context.next_id(&prefix);
    match &tag.target {
        Some(name) => {
            context.set(name.node.0.clone(), Value::String(id));
            String::new()
        }
        None => Value::String(id).render(context.autoescape()),
    }
}
