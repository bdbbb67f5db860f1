//! Mount points: a mounted template and its live bindings.

use std::rc::Rc;

use smallvec::SmallVec;
use tessera_fresco::NodeId;

use crate::binding::Binding;
use crate::error::Result;
use crate::part::insert_before_anchor;
use crate::template::{Template, TemplateId};
use crate::updater::Updater;
use crate::value::Value;

/// Root nodes of a mounted template plus one binding per descriptor.
///
/// While detached, the root nodes live in a private fragment. All tree moves
/// are queued as mutation effects.
pub struct MountPoint {
    template: Rc<Template>,
    fragment: NodeId,
    nodes: SmallVec<[NodeId; 4]>,
    bindings: Vec<Box<dyn Binding>>,
    values: Rc<[Value]>,
    /// Set when a patch failed part way. The next patch then visits every
    /// binding instead of skipping values equal to `values`.
    stale: bool,
    attached: bool,
}

impl MountPoint {
    pub(crate) fn new(
        template: Rc<Template>,
        fragment: NodeId,
        nodes: SmallVec<[NodeId; 4]>,
        bindings: Vec<Box<dyn Binding>>,
        values: Rc<[Value]>,
    ) -> Self {
        Self {
            template,
            fragment,
            nodes,
            bindings,
            values,
            stale: false,
            attached: false,
        }
    }

    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    pub fn template_id(&self) -> TemplateId {
        self.template.id()
    }

    /// Root nodes in tree order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn bindings(&self) -> &[Box<dyn Binding>] {
        &self.bindings
    }

    /// Values of the last mount or patch.
    pub fn values(&self) -> &Rc<[Value]> {
        &self.values
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Patch the bindings with new values.
    pub fn patch(&mut self, values: Rc<[Value]>, updater: &Updater) -> Result<()> {
        let old: &[Value] = if self.stale { &[] } else { &self.values };
        if let Err(error) = self.template.patch(&mut self.bindings, old, &values, updater) {
            self.stale = true;
            return Err(error);
        }
        self.values = values;
        self.stale = false;
        Ok(())
    }

    /// Move the nodes right before `anchor`.
    pub fn attach(&mut self, anchor: NodeId, updater: &Updater) {
        if self.attached {
            return;
        }
        let fragment = self.fragment;
        updater.enqueue_mutation_effect(move |u| insert_before_anchor(u.surface(), fragment, anchor));
        self.attached = true;
    }

    /// Move the nodes back into the private fragment.
    pub fn detach(&mut self, updater: &Updater) {
        if !self.attached {
            return;
        }
        let mut nodes = Vec::new();
        self.collect_nodes(&mut nodes);
        let fragment = self.fragment;
        updater.enqueue_mutation_effect(move |u| {
            let surface = u.surface();
            for node in nodes {
                surface.append_child(fragment, node);
            }
        });
        self.attached = false;
    }

    /// Every node this mount point places in its parent, in tree order.
    ///
    /// Content of child regions anchored at a root node sits right before
    /// that anchor.
    pub fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        for &node in &self.nodes {
            for binding in &self.bindings {
                if binding.part().is_anchored_at(node) {
                    binding.collect_nodes(out);
                }
            }
            out.push(node);
        }
    }

    /// Disconnect every binding.
    pub fn disconnect(&mut self, updater: &Updater) {
        for binding in &mut self.bindings {
            binding.disconnect(updater);
        }
    }

    /// Detach, disconnect and release the nodes.
    pub fn dispose(mut self, updater: &Updater) {
        self.detach(updater);
        self.disconnect(updater);
        let fragment = self.fragment;
        updater.enqueue_mutation_effect(move |u| u.surface().destroy(fragment));
    }
}
