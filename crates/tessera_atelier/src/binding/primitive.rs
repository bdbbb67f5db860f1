//! Default bindings for scalar values.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use compact_str::CompactString;
use tessera_fresco::{Event, Listener, ListenerId, NodeId, PropertyValue};

use super::{unsupported_value, Binding, BindingState};
use crate::error::Result;
use crate::part::{insert_before_anchor, Part};
use crate::updater::Updater;
use crate::value::{Handler, Value, ValueKind};

/// Text content in a child node region.
pub struct NodeBinding {
    part: Part,
    anchor: NodeId,
    node: Option<NodeId>,
    text: CompactString,
    state: BindingState,
}

impl NodeBinding {
    pub fn create(part: Part, value: Value, updater: &Updater) -> Result<Self> {
        let mut binding = Self {
            anchor: part.node(),
            part,
            node: None,
            text: CompactString::default(),
            state: BindingState::Unbound,
        };
        binding.bind(value, updater)?;
        Ok(binding)
    }
}

impl Binding for NodeBinding {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Primitive
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()> {
        let text = value
            .to_text()
            .ok_or_else(|| unsupported_value(&self.part, &value))?;
        let anchor = self.anchor;

        match self.node {
            None => {
                let node = updater.surface().create_text(&text);
                self.node = Some(node);
                updater.enqueue_mutation_effect(move |u| insert_before_anchor(u.surface(), node, anchor));
            }
            Some(node) => {
                if text != self.text {
                    let content = text.clone();
                    updater.enqueue_mutation_effect(move |u| u.surface().set_text(node, &content));
                }
                if self.state != BindingState::Bound {
                    updater.enqueue_mutation_effect(move |u| insert_before_anchor(u.surface(), node, anchor));
                }
            }
        }

        self.text = text;
        self.state = BindingState::Bound;
        Ok(())
    }

    fn unbind(&mut self, updater: &Updater) {
        if self.state != BindingState::Bound {
            return;
        }
        if let Some(node) = self.node {
            updater.enqueue_mutation_effect(move |u| u.surface().remove(node));
        }
        self.state = BindingState::Unbound;
    }

    fn disconnect(&mut self, updater: &Updater) {
        if self.state == BindingState::Disconnected {
            return;
        }
        if let Some(node) = self.node.take() {
            updater.enqueue_mutation_effect(move |u| u.surface().destroy(node));
        }
        self.state = BindingState::Disconnected;
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if self.state == BindingState::Bound {
            out.extend(self.node);
        }
    }
}

/// An attribute, removed for `Null` and `false`, empty for `true`.
pub struct AttributeBinding {
    part: Part,
    node: NodeId,
    name: CompactString,
    applied: Option<CompactString>,
    state: BindingState,
}

impl AttributeBinding {
    pub fn create(part: Part, value: Value, updater: &Updater) -> Result<Self> {
        let mut binding = Self {
            node: part.node(),
            name: CompactString::new(part.name().unwrap_or_default()),
            part,
            applied: None,
            state: BindingState::Unbound,
        };
        binding.bind(value, updater)?;
        Ok(binding)
    }

    fn attribute_value(&self, value: &Value) -> Result<Option<CompactString>> {
        match value {
            Value::Null | Value::Bool(false) => Ok(None),
            Value::Bool(true) => Ok(Some(CompactString::default())),
            Value::Number(_) | Value::Text(_) => Ok(value.to_text()),
            _ => Err(unsupported_value(&self.part, value)),
        }
    }

    fn apply(&self, next: Option<CompactString>, updater: &Updater) {
        let node = self.node;
        let name = self.name.clone();
        match next {
            Some(value) => updater.enqueue_mutation_effect(move |u| u.surface().set_attribute(node, &name, &value)),
            None => updater.enqueue_mutation_effect(move |u| u.surface().remove_attribute(node, &name)),
        }
    }
}

impl Binding for AttributeBinding {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Primitive
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()> {
        let next = self.attribute_value(&value)?;
        // `applied` mirrors the tree, so an unbound binding has nothing stale.
        if next != self.applied {
            self.apply(next.clone(), updater);
        }
        self.applied = next;
        self.state = BindingState::Bound;
        Ok(())
    }

    fn unbind(&mut self, updater: &Updater) {
        if self.state != BindingState::Bound {
            return;
        }
        if self.applied.take().is_some() {
            self.apply(None, updater);
        }
        self.state = BindingState::Unbound;
    }

    fn disconnect(&mut self, _updater: &Updater) {
        self.state = BindingState::Disconnected;
    }
}

/// A property assignment.
pub struct PropertyBinding {
    part: Part,
    node: NodeId,
    name: CompactString,
    value: Value,
    state: BindingState,
}

impl PropertyBinding {
    pub fn create(part: Part, value: Value, updater: &Updater) -> Result<Self> {
        let mut binding = Self {
            node: part.node(),
            name: CompactString::new(part.name().unwrap_or_default()),
            part,
            value: Value::Null,
            state: BindingState::Unbound,
        };
        binding.bind(value, updater)?;
        Ok(binding)
    }

    fn assign(&self, property: PropertyValue, updater: &Updater) {
        let node = self.node;
        let name = self.name.clone();
        updater.enqueue_mutation_effect(move |u| u.surface().set_property(node, &name, property));
    }
}

impl Binding for PropertyBinding {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Primitive
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()> {
        let property = value
            .to_property()
            .ok_or_else(|| unsupported_value(&self.part, &value))?;
        if self.state != BindingState::Bound || !value.is_same(&self.value) {
            self.assign(property, updater);
        }
        self.value = value;
        self.state = BindingState::Bound;
        Ok(())
    }

    fn unbind(&mut self, updater: &Updater) {
        if self.state != BindingState::Bound {
            return;
        }
        if !self.value.is_null() {
            self.assign(PropertyValue::Null, updater);
        }
        self.value = Value::Null;
        self.state = BindingState::Unbound;
    }

    fn disconnect(&mut self, _updater: &Updater) {
        self.state = BindingState::Disconnected;
    }
}

/// An event listener.
///
/// One listener is attached per binding and forwards to the current handler,
/// so replacing the handler never touches the node.
pub struct EventBinding {
    part: Part,
    node: NodeId,
    name: CompactString,
    handler: Rc<RefCell<Option<Handler>>>,
    listener: Rc<Cell<Option<ListenerId>>>,
    attached: bool,
    state: BindingState,
}

impl EventBinding {
    pub fn create(part: Part, value: Value, updater: &Updater) -> Result<Self> {
        let mut binding = Self {
            node: part.node(),
            name: CompactString::new(part.name().unwrap_or_default()),
            part,
            handler: Rc::new(RefCell::new(None)),
            listener: Rc::new(Cell::new(None)),
            attached: false,
            state: BindingState::Unbound,
        };
        binding.bind(value, updater)?;
        Ok(binding)
    }

    fn attach(&mut self, updater: &Updater) {
        if self.attached {
            return;
        }
        let (node, name) = (self.node, self.name.clone());
        let handler = Rc::downgrade(&self.handler);
        let listener_id = self.listener.clone();
        updater.enqueue_mutation_effect(move |u| {
            let trampoline: Listener = Rc::new(move |event: &Event| {
                let current = handler.upgrade().and_then(|slot| slot.borrow().clone());
                if let Some(current) = current {
                    current(event);
                }
            });
            listener_id.set(u.surface().add_listener(node, &name, trampoline));
        });
        self.attached = true;
    }

    fn detach(&mut self, updater: &Updater) {
        if !self.attached {
            return;
        }
        let node = self.node;
        let listener_id = self.listener.clone();
        updater.enqueue_mutation_effect(move |u| {
            if let Some(id) = listener_id.take() {
                u.surface().remove_listener(node, id);
            }
        });
        self.attached = false;
    }
}

impl Binding for EventBinding {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Primitive
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()> {
        let handler = match value {
            Value::Null => None,
            Value::Handler(handler) => Some(handler),
            other => return Err(unsupported_value(&self.part, &other)),
        };
        let wanted = handler.is_some();
        *self.handler.borrow_mut() = handler;
        if wanted {
            self.attach(updater);
        } else {
            self.detach(updater);
        }
        self.state = BindingState::Bound;
        Ok(())
    }

    fn unbind(&mut self, updater: &Updater) {
        if self.state != BindingState::Bound {
            return;
        }
        self.handler.borrow_mut().take();
        self.detach(updater);
        self.state = BindingState::Unbound;
    }

    fn disconnect(&mut self, updater: &Updater) {
        if self.state == BindingState::Disconnected {
            return;
        }
        self.handler.borrow_mut().take();
        self.detach(updater);
        self.state = BindingState::Disconnected;
    }
}

/// Content of a text node inside a raw-text element.
pub struct TextBinding {
    part: Part,
    node: NodeId,
    text: CompactString,
    state: BindingState,
}

impl TextBinding {
    pub fn create(part: Part, value: Value, updater: &Updater) -> Result<Self> {
        let mut binding = Self {
            node: part.node(),
            part,
            text: CompactString::default(),
            state: BindingState::Unbound,
        };
        binding.bind(value, updater)?;
        Ok(binding)
    }

    fn write(&self, text: CompactString, updater: &Updater) {
        let node = self.node;
        updater.enqueue_mutation_effect(move |u| u.surface().set_text(node, &text));
    }
}

impl Binding for TextBinding {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Primitive
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()> {
        let text = value
            .to_text()
            .ok_or_else(|| unsupported_value(&self.part, &value))?;
        if text != self.text {
            self.write(text.clone(), updater);
        }
        self.text = text;
        self.state = BindingState::Bound;
        Ok(())
    }

    fn unbind(&mut self, updater: &Updater) {
        if self.state != BindingState::Bound {
            return;
        }
        if !self.text.is_empty() {
            self.write(CompactString::default(), updater);
            self.text = CompactString::default();
        }
        self.state = BindingState::Unbound;
    }

    fn disconnect(&mut self, _updater: &Updater) {
        self.state = BindingState::Disconnected;
    }
}
