//! Rendering a value into a container.

use tessera_fresco::NodeId;

use crate::binding::{create_binding, update_binding, Binding};
use crate::error::Result;
use crate::part::Part;
use crate::updater::Updater;
use crate::value::Value;

/// A value rendered at the end of a container node.
///
/// The root binds its value in a child node region anchored at a comment
/// appended to the container. Changes are committed by the next flush.
pub struct Root {
    updater: Updater,
    anchor: NodeId,
    binding: Box<dyn Binding>,
}

impl Root {
    /// Render `value` at the end of `container`.
    pub fn render(value: impl Into<Value>, container: NodeId, updater: &Updater) -> Result<Root> {
        let surface = updater.surface();
        let anchor = surface.create_comment("");
        surface.append_child(container, anchor);

        match create_binding(Part::ChildNode { anchor }, value.into(), updater) {
            Ok(binding) => {
                updater.request_flush();
                Ok(Root {
                    updater: updater.clone(),
                    anchor,
                    binding,
                })
            }
            Err(error) => {
                surface.destroy(anchor);
                Err(error)
            }
        }
    }

    /// Anchor comment the rendered nodes sit before.
    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn binding(&self) -> &dyn Binding {
        self.binding.as_ref()
    }

    /// Render a new value in place of the current one.
    pub fn update(&mut self, value: impl Into<Value>) -> Result<()> {
        update_binding(&mut self.binding, value.into(), &self.updater, false)?;
        self.updater.request_flush();
        Ok(())
    }

    /// Remove everything this root rendered, including its anchor.
    pub fn unmount(mut self) {
        self.binding.unbind(&self.updater);
        self.binding.disconnect(&self.updater);
        let anchor = self.anchor;
        self.updater
            .enqueue_mutation_effect(move |u| u.surface().destroy(anchor));
    }
}
