//! Render behavior of slot placeholders and fill blocks

use crate::context::Context;
use crate::parser::ast::{SlotDeclare, SlotFill};
use crate::renderer::render_nodes;
use crate::value::Value;

use super::ComponentError;

/// Context key holding the rendered fill for slot `name`.
///
/// The `:` cannot appear in an identifier, so templates can never read or
/// shadow these keys directly.
pub fn slot_key(name: &str) -> String {
    format!("slot:{}", name)
}

impl SlotDeclare {
    /// Emit the fill supplied at the use site, or this slot's default content
    pub fn render<'t>(&'t self, context: &mut Context<'t>) -> Result<String, ComponentError> {
        let key = slot_key(self.name.node.as_str());
        if let Some(filled) = context.get(&key) {
            // Fill text is already rendered and escaped
            return Ok(filled.render(false));
        }
        render_nodes(&self.body, context)
    }
}

impl SlotFill {
    /// Render the fill content against whatever context is active.
    ///
    /// The engine calls this before pushing the component scope, so names
    /// resolve against the calling template.
    pub fn render<'t>(&'t self, context: &mut Context<'t>) -> Result<String, ComponentError> {
        render_nodes(&self.body, context)
    }
}

/// Scope value for a filled slot
pub(crate) fn filled(text: String) -> Value {
    Value::Safe(text)
}
