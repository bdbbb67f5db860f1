//! Nested template results in a child node region.

use tessera_fresco::NodeId;

use super::{unsupported_value, Binding, BindingState};
use crate::error::Result;
use crate::mount_point::MountPoint;
use crate::part::Part;
use crate::updater::Updater;
use crate::value::{TemplateResult, Value, ValueKind};

/// Mounts a template result before the anchor and patches it while the
/// template stays the same.
pub struct TemplateBinding {
    part: Part,
    anchor: NodeId,
    current: Option<MountPoint>,
    state: BindingState,
}

impl TemplateBinding {
    pub fn create(part: Part, result: TemplateResult, updater: &Updater) -> Result<Self> {
        let anchor = part.node();
        let mut current = result.template.mount(result.values, updater)?;
        current.attach(anchor, updater);
        Ok(Self {
            part,
            anchor,
            current: Some(current),
            state: BindingState::Bound,
        })
    }

    /// The mounted template, if any.
    pub fn mount_point(&self) -> Option<&MountPoint> {
        self.current.as_ref()
    }
}

impl Binding for TemplateBinding {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Template
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()> {
        let Value::Template(result) = value else {
            return Err(unsupported_value(&self.part, &value));
        };

        match &mut self.current {
            Some(current) if current.template_id() == result.template_id() => {
                current.patch(result.values, updater)?;
                current.attach(self.anchor, updater);
            }
            _ => {
                let mut next = result.template.mount(result.values, updater)?;
                if let Some(previous) = self.current.take() {
                    previous.dispose(updater);
                }
                next.attach(self.anchor, updater);
                self.current = Some(next);
            }
        }

        self.state = BindingState::Bound;
        Ok(())
    }

    fn unbind(&mut self, updater: &Updater) {
        if self.state != BindingState::Bound {
            return;
        }
        if let Some(current) = &mut self.current {
            current.detach(updater);
        }
        self.state = BindingState::Unbound;
    }

    fn disconnect(&mut self, updater: &Updater) {
        if self.state == BindingState::Disconnected {
            return;
        }
        if let Some(current) = self.current.take() {
            current.dispose(updater);
        }
        self.state = BindingState::Disconnected;
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if self.state == BindingState::Bound {
            if let Some(current) = &self.current {
                current.collect_nodes(out);
            }
        }
    }
}
