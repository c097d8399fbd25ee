//! Component system for reusable template fragments
//!
//! This module stores component definitions in a per-render registry and
//! instantiates them at use sites, threading parameters and slot content
//! through the rendering context.
//!
//! # Example
//!
//! ```text
//! {% definecomponent button flat=False %}
//! <button class="btn{% if flat %} btn-flat{% endif %}">
//!   {% defineslot label %}Click me!{% enddefineslot %}
//! </button>
//! {% enddefinecomponent %}
//!
//! {% usecomponent button flat=True %}
//!   {% fillslot label %}Save{% endfillslot %}
//! {% endusecomponent %}
//! ```

mod engine;
mod registry;
mod slots;

pub use engine::{attrify, instantiate};
pub use registry::{ComponentDefinition, ComponentError, ComponentRegistry, SlotIndex};
pub use slots::slot_key;
