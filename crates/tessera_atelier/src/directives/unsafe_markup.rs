//! Raw markup inserted without escaping.

use std::any::{Any, TypeId};
use std::rc::Rc;

use compact_str::CompactString;
use tessera_fresco::NodeId;
use tessera_relief::{Namespace, PartKind};

use crate::binding::{downcast_directive, Binding, BindingState, Directive};
use crate::error::{RenderError, Result};
use crate::part::{insert_before_anchor, Part};
use crate::updater::Updater;
use crate::value::{Value, ValueKind};

/// Directive value created by [`unsafe_html`] and [`unsafe_svg`].
#[derive(Debug)]
pub struct UnsafeMarkup {
    content: CompactString,
    ns: Namespace,
}

/// Parse `content` as HTML and insert the nodes as they are.
///
/// The content is trusted; nothing in it is escaped.
pub fn unsafe_html(content: impl Into<CompactString>) -> Value {
    Value::Directive(Rc::new(UnsafeMarkup {
        content: content.into(),
        ns: Namespace::Html,
    }))
}

/// Parse `content` as SVG and insert the nodes as they are.
pub fn unsafe_svg(content: impl Into<CompactString>) -> Value {
    Value::Directive(Rc::new(UnsafeMarkup {
        content: content.into(),
        ns: Namespace::Svg,
    }))
}

impl Directive for UnsafeMarkup {
    fn name(&self) -> &'static str {
        match self.ns {
            Namespace::Html => "unsafe_html",
            Namespace::Svg => "unsafe_svg",
        }
    }

    fn create_binding(self: Rc<Self>, part: Part, updater: &Updater) -> Result<Box<dyn Binding>> {
        if part.kind() != PartKind::ChildNode {
            return Err(RenderError::UnsupportedPart {
                directive: self.name(),
                part: part.kind(),
            });
        }
        let mut binding = UnsafeMarkupBinding {
            part,
            applied: None,
            nodes: Vec::new(),
            state: BindingState::Unbound,
        };
        binding.apply(&self, updater)?;
        Ok(Box::new(binding))
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Binding of an [`unsafe_html`] or [`unsafe_svg`] directive.
pub struct UnsafeMarkupBinding {
    part: Part,
    applied: Option<(CompactString, Namespace)>,
    nodes: Vec<NodeId>,
    state: BindingState,
}

impl UnsafeMarkupBinding {
    fn apply(&mut self, markup: &UnsafeMarkup, updater: &Updater) -> Result<()> {
        let anchor = self.part.node();
        let unchanged = self
            .applied
            .as_ref()
            .is_some_and(|(content, ns)| *content == markup.content && *ns == markup.ns);

        if unchanged {
            if self.state != BindingState::Bound {
                let nodes = self.nodes.clone();
                updater.enqueue_mutation_effect(move |u| {
                    let surface = u.surface();
                    for node in nodes {
                        insert_before_anchor(surface, node, anchor);
                    }
                });
                self.state = BindingState::Bound;
            }
            return Ok(());
        }

        let surface = updater.surface();
        let fragment =
            surface.parse_fragment(&markup.content, markup.ns, updater.scope().parser_options())?;
        let nodes = surface.children(fragment).into_vec();
        let previous = std::mem::replace(&mut self.nodes, nodes);
        updater.enqueue_mutation_effect(move |u| {
            let surface = u.surface();
            for node in previous {
                surface.destroy(node);
            }
            insert_before_anchor(surface, fragment, anchor);
            surface.destroy(fragment);
        });

        self.applied = Some((markup.content.clone(), markup.ns));
        self.state = BindingState::Bound;
        Ok(())
    }
}

impl Binding for UnsafeMarkupBinding {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Directive(TypeId::of::<UnsafeMarkup>())
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()> {
        let markup = downcast_directive::<UnsafeMarkup>(value, &self.part)?;
        self.apply(&markup, updater)
    }

    fn unbind(&mut self, updater: &Updater) {
        if self.state != BindingState::Bound {
            return;
        }
        let nodes = self.nodes.clone();
        updater.enqueue_mutation_effect(move |u| {
            let surface = u.surface();
            for node in nodes {
                surface.remove(node);
            }
        });
        self.state = BindingState::Unbound;
    }

    fn disconnect(&mut self, updater: &Updater) {
        if self.state == BindingState::Disconnected {
            return;
        }
        let nodes = std::mem::take(&mut self.nodes);
        updater.enqueue_mutation_effect(move |u| {
            let surface = u.surface();
            for node in nodes {
                surface.destroy(node);
            }
        });
        self.applied = None;
        self.state = BindingState::Disconnected;
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if self.state == BindingState::Bound {
            out.extend_from_slice(&self.nodes);
        }
    }
}
