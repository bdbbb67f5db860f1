//! The binding protocol.
//!
//! A [`Binding`] writes values into one [`Part`]. Which binding a value gets
//! is decided by [`create_binding`]:
//!
//! - directive values delegate to [`Directive::create_binding`]
//! - template results and components in a child part get the built-in
//!   template and block bindings
//! - everything else gets the default binding of the part kind
//!
//! A binding survives updates as long as the new value has the kind it
//! accepts; otherwise [`update_binding`] unbinds and disconnects it and puts a
//! fresh binding in its place.

mod primitive;
mod template;

use std::any::{Any, TypeId};
use std::rc::Rc;

use tessera_fresco::NodeId;

use crate::block::BlockBinding;
use crate::error::{RenderError, Result};
use crate::part::Part;
use crate::updater::Updater;
use crate::value::{Value, ValueKind};

pub use primitive::{AttributeBinding, EventBinding, NodeBinding, PropertyBinding, TextBinding};
pub use template::TemplateBinding;

/// Lifecycle state of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingState {
    /// The value is applied to the part
    Bound,
    /// The value was withdrawn but may be applied again
    Unbound,
    /// Released for good
    Disconnected,
}

/// Stateful adapter between a value and the part it is applied to.
pub trait Binding {
    /// Part this binding writes into.
    fn part(&self) -> &Part;

    /// Kind of value accepted by [`Binding::bind`].
    fn kind(&self) -> ValueKind;

    /// Current lifecycle state.
    fn state(&self) -> BindingState;

    /// Apply a value. A binding that is not bound re-applies even an
    /// unchanged value.
    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()>;

    /// Withdraw the applied value, keeping enough state to bind again.
    fn unbind(&mut self, updater: &Updater);

    /// Release everything. Idempotent.
    fn disconnect(&mut self, updater: &Updater);

    /// Nodes this binding placed in a child node region, in tree order.
    fn collect_nodes(&self, _out: &mut Vec<NodeId>) {}
}

/// A value type that customizes how it is bound.
pub trait Directive: 'static {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Create the binding for this directive and apply it.
    fn create_binding(self: Rc<Self>, part: Part, updater: &Updater) -> Result<Box<dyn Binding>>;

    /// Upcast for downcasting in [`Binding::bind`].
    fn as_any(self: Rc<Self>) -> Rc<dyn Any>;

    /// Kind shared by all values of this directive type.
    fn kind(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

/// Create the binding for a value in a part and apply the value.
pub fn create_binding(part: Part, value: Value, updater: &Updater) -> Result<Box<dyn Binding>> {
    let binding: Box<dyn Binding> = match value {
        Value::Directive(directive) => return directive.create_binding(part, updater),
        Value::Template(result) if matches!(part, Part::ChildNode { .. }) => {
            Box::new(TemplateBinding::create(part, result, updater)?)
        }
        Value::Component(component) if matches!(part, Part::ChildNode { .. }) => {
            Box::new(BlockBinding::create(part, component, updater)?)
        }
        value => match part {
            Part::ChildNode { .. } => Box::new(NodeBinding::create(part, value, updater)?),
            Part::Attribute { .. } => Box::new(AttributeBinding::create(part, value, updater)?),
            Part::Property { .. } => Box::new(PropertyBinding::create(part, value, updater)?),
            Part::Event { .. } => Box::new(EventBinding::create(part, value, updater)?),
            Part::Text { .. } => Box::new(TextBinding::create(part, value, updater)?),
        },
    };
    Ok(binding)
}

/// Apply a new value to an existing binding, replacing it if needed.
///
/// With `force`, a bound binding is unbound first so it re-applies its value.
pub fn update_binding(
    binding: &mut Box<dyn Binding>,
    value: Value,
    updater: &Updater,
    force: bool,
) -> Result<()> {
    if binding.kind() == value.kind() && binding.state() != BindingState::Disconnected {
        if force && binding.state() == BindingState::Bound {
            binding.unbind(updater);
        }
        return binding.bind(value, updater);
    }

    let part = binding.part().clone();
    binding.unbind(updater);
    binding.disconnect(updater);
    *binding = create_binding(part, value, updater)?;
    Ok(())
}

/// Recover the concrete directive behind a value.
pub fn downcast_directive<D: Directive>(value: Value, part: &Part) -> Result<Rc<D>> {
    let unsupported = |value: &'static str| RenderError::UnsupportedValue {
        part: part.kind(),
        value,
    };
    match value {
        Value::Directive(directive) => {
            let name = directive.name();
            directive.as_any().downcast::<D>().map_err(|_| unsupported(name))
        }
        other => Err(unsupported(other.type_name())),
    }
}

pub(crate) fn unsupported_value(part: &Part, value: &Value) -> RenderError {
    RenderError::UnsupportedValue {
        part: part.kind(),
        value: value.type_name(),
    }
}
