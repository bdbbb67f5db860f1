//! Blocks: component instances with their own render cycle.
//!
//! A block owns a render function, its props, hooks and the mount points of
//! the templates it rendered. Rendering and committing are split: `render`
//! prepares a pending mount point, `mount` and `update` put it in place.
//!
//! A block remembers every template it has shown. When the render function
//! switches between templates, the previous mount point is stashed in a
//! per-block cache and reused when its template comes back. The cache map is
//! only allocated once a second template shows up.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use tessera_carton::BlockFlags;
use tessera_fresco::NodeId;

use crate::binding::{unsupported_value, Binding, BindingState};
use crate::context::Context;
use crate::error::Result;
use crate::hooks::Hook;
use crate::mount_point::MountPoint;
use crate::part::Part;
use crate::scope::Scope;
use crate::template::TemplateId;
use crate::updater::Updater;
use crate::value::{ComponentValue, RenderFn, Value, ValueKind};

/// Identity of a block within its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Props {
    pending: Rc<Value>,
    memoized: Option<Rc<Value>>,
}

#[derive(Default)]
struct View {
    current: Option<MountPoint>,
    pending: Option<MountPoint>,
    cache: Option<FxHashMap<TemplateId, MountPoint>>,
}

enum Origin {
    Pending,
    Current,
    Cached,
}

impl View {
    fn take(&mut self, id: TemplateId) -> Option<(MountPoint, Origin)> {
        if self.pending.as_ref().is_some_and(|mp| mp.template_id() == id) {
            return self.pending.take().map(|mp| (mp, Origin::Pending));
        }
        if self.current.as_ref().is_some_and(|mp| mp.template_id() == id) {
            return self.current.take().map(|mp| (mp, Origin::Current));
        }
        self.cache
            .as_mut()
            .and_then(|cache| cache.remove(&id))
            .map(|mp| (mp, Origin::Cached))
    }

    fn restore(&mut self, mount_point: MountPoint, origin: Origin) {
        match origin {
            Origin::Pending => self.pending = Some(mount_point),
            Origin::Current => self.current = Some(mount_point),
            Origin::Cached => self.stash(mount_point),
        }
    }

    fn stash(&mut self, mount_point: MountPoint) {
        self.cache
            .get_or_insert_with(FxHashMap::default)
            .insert(mount_point.template_id(), mount_point);
    }

    fn drain(&mut self) -> Vec<MountPoint> {
        let mut all: Vec<MountPoint> = self.current.take().into_iter().collect();
        all.extend(self.pending.take());
        if let Some(cache) = self.cache.take() {
            all.extend(cache.into_values());
        }
        all
    }
}

/// A component instance.
pub struct Block {
    id: BlockId,
    parent: Option<Weak<Block>>,
    flags: Cell<BlockFlags>,
    render: RefCell<RenderFn>,
    props: RefCell<Props>,
    hooks: RefCell<Vec<Hook>>,
    view: RefCell<View>,
    part: Part,
    scope: Rc<Scope>,
}

impl Block {
    /// Create a fresh, dirty block rendering into `part`.
    pub fn new(
        render: RenderFn,
        props: Rc<Value>,
        part: Part,
        parent: Option<&Rc<Block>>,
        scope: Rc<Scope>,
    ) -> Rc<Self> {
        Rc::new(Self {
            id: scope.next_block_id(),
            parent: parent.map(Rc::downgrade),
            flags: Cell::new(BlockFlags::DIRTY),
            render: RefCell::new(render),
            props: RefCell::new(Props {
                pending: props,
                memoized: None,
            }),
            hooks: RefCell::default(),
            view: RefCell::default(),
            part,
            scope,
        })
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// The block whose template contains this one, if still alive.
    pub fn parent(&self) -> Option<Rc<Block>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn flags(&self) -> BlockFlags {
        self.flags.get()
    }

    pub fn part(&self) -> &Part {
        &self.part
    }

    pub fn is_mounted(&self) -> bool {
        self.flags().contains(BlockFlags::MOUNTED)
    }

    pub fn is_dirty(&self) -> bool {
        self.flags().contains(BlockFlags::DIRTY)
    }

    /// Template of the mount point in place.
    pub fn template_id(&self) -> Option<TemplateId> {
        self.view.borrow().current.as_ref().map(MountPoint::template_id)
    }

    /// Whether the template cache has been allocated.
    pub fn has_cache(&self) -> bool {
        self.view.borrow().cache.is_some()
    }

    /// Number of stashed mount points.
    pub fn cached_count(&self) -> usize {
        self.view.borrow().cache.as_ref().map_or(0, |cache| cache.len())
    }

    /// Props used by the last successful render.
    pub fn memoized_props(&self) -> Option<Rc<Value>> {
        self.props.borrow().memoized.clone()
    }

    pub(crate) fn render_kind(&self) -> std::any::TypeId {
        self.render.borrow().kind()
    }

    fn set_flags(&self, insert: BlockFlags, remove: BlockFlags) {
        let mut flags = self.flags.get();
        flags.insert(insert);
        flags.remove(remove);
        self.flags.set(flags);
    }

    /// Replace the props, marking the block dirty when they differ.
    pub fn set_props(&self, props: Rc<Value>) {
        let mut current = self.props.borrow_mut();
        if Rc::ptr_eq(&current.pending, &props) || current.pending.is_same(&props) {
            return;
        }
        let previous = std::mem::replace(&mut current.pending, props);
        drop(current);
        drop(previous);
        self.set_flags(BlockFlags::DIRTY, BlockFlags::empty());
    }

    /// Replace the render function. Its captured state is not compared; only
    /// a props change makes the block dirty.
    pub fn set_render(&self, render: RenderFn) {
        let previous = self.render.replace(render);
        drop(previous);
    }

    /// Schedule a render of a mounted block. Requests made while one is
    /// already scheduled are dropped.
    pub fn force_update(self: &Rc<Self>, updater: &Updater) {
        let flags = self.flags();
        if !flags.contains(BlockFlags::MOUNTED) || flags.contains(BlockFlags::UPDATING) {
            return;
        }
        self.set_flags(BlockFlags::DIRTY | BlockFlags::UPDATING, BlockFlags::empty());
        updater.enqueue_block(self.clone());
    }

    /// Call the render function and prepare the resulting mount point.
    ///
    /// The mount point is left pending unless it is the one already in place,
    /// in which case it is patched where it is.
    pub fn render(self: &Rc<Self>, updater: &Updater) -> Result<()> {
        let props = self.props.borrow().pending.clone();
        let render = self.render.borrow().clone();

        let mut hooks = self.hooks.take();
        let result = {
            let mut cx = Context::new(self, updater, &mut hooks);
            render.call(&props, &mut cx)
        };
        *self.hooks.borrow_mut() = hooks;
        let result = result?;

        tracing::trace!("render block {} with {:?}", self.id, result.template_id());
        let _guard = updater.enter_block(self);

        let found = self.view.borrow_mut().take(result.template_id());
        match found {
            Some((mut mount_point, origin)) => {
                if let Err(error) = mount_point.patch(result.values, updater) {
                    self.view.borrow_mut().restore(mount_point, origin);
                    return Err(error);
                }
                let mut view = self.view.borrow_mut();
                match origin {
                    Origin::Pending => view.pending = Some(mount_point),
                    Origin::Current => {
                        view.current = Some(mount_point);
                        if let Some(pending) = view.pending.take() {
                            view.stash(pending);
                        }
                    }
                    Origin::Cached => {
                        if let Some(pending) = view.pending.replace(mount_point) {
                            view.stash(pending);
                        }
                    }
                }
            }
            None => {
                let mount_point = result.template.mount(result.values, updater)?;
                let mut view = self.view.borrow_mut();
                if let Some(pending) = view.pending.replace(mount_point) {
                    view.stash(pending);
                }
            }
        }

        self.props.borrow_mut().memoized = Some(props);
        self.set_flags(BlockFlags::empty(), BlockFlags::DIRTY | BlockFlags::UPDATING);
        Ok(())
    }

    /// Put the pending mount point in place before the anchor.
    pub fn mount(&self, updater: &Updater) {
        let anchor = self.part.node();
        let mut view = self.view.borrow_mut();
        if let Some(pending) = view.pending.take() {
            if let Some(mut previous) = view.current.take() {
                previous.detach(updater);
                view.stash(previous);
            }
            view.current = Some(pending);
        }
        if let Some(current) = &mut view.current {
            current.attach(anchor, updater);
        }
        drop(view);
        self.set_flags(BlockFlags::MOUNTED, BlockFlags::empty());
    }

    /// Swap in the pending mount point, stashing the one it replaces.
    pub fn update(&self, updater: &Updater) {
        let anchor = self.part.node();
        let mut view = self.view.borrow_mut();
        let Some(mut next) = view.pending.take() else {
            return;
        };
        if let Some(mut previous) = view.current.take() {
            previous.detach(updater);
            view.stash(previous);
        }
        next.attach(anchor, updater);
        view.current = Some(next);
    }

    /// Take the nodes out of the tree, keeping everything for a later mount.
    pub fn detach(&self, updater: &Updater) {
        if let Some(current) = &mut self.view.borrow_mut().current {
            current.detach(updater);
        }
        self.set_flags(BlockFlags::empty(), BlockFlags::MOUNTED);
    }

    /// Run every effect cleanup and dispose every mount point.
    pub fn unmount(&self, updater: &Updater) {
        let hooks = self.hooks.take();
        for hook in &hooks {
            if let Hook::Effect(slot) | Hook::LayoutEffect(slot) = hook {
                slot.retire();
            }
        }
        drop(hooks);

        let mount_points = self.view.borrow_mut().drain();
        for mount_point in mount_points {
            mount_point.dispose(updater);
        }
        self.set_flags(BlockFlags::empty(), BlockFlags::MOUNTED);
    }

    /// Render and commit a scheduled update. Returns whether it rendered.
    pub fn perform_update(self: &Rc<Self>, updater: &Updater) -> Result<bool> {
        let flags = self.flags();
        if !flags.contains(BlockFlags::UPDATING) {
            return Ok(false);
        }
        if !flags.is_renderable() {
            self.set_flags(BlockFlags::empty(), BlockFlags::UPDATING);
            tracing::trace!("skipping unmounted block {}", self.id);
            return Ok(false);
        }
        if let Err(error) = self.render(updater) {
            self.set_flags(BlockFlags::empty(), BlockFlags::UPDATING);
            return Err(error);
        }
        self.update(updater);
        Ok(true)
    }

    /// Nodes of the mount point in place.
    pub fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if let Some(current) = &self.view.borrow().current {
            if current.is_attached() {
                current.collect_nodes(out);
            }
        }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        self.scope.release(self.id);
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.id)
            .field("flags", &self.flags())
            .field("part", &self.part)
            .finish_non_exhaustive()
    }
}

/// Renders a component value as a block in a child node region.
pub struct BlockBinding {
    part: Part,
    block: Rc<Block>,
    state: BindingState,
}

impl BlockBinding {
    pub fn create(part: Part, component: ComponentValue, updater: &Updater) -> Result<Self> {
        let parent = updater.current_block();
        let block = Block::new(
            component.render,
            component.props,
            part.clone(),
            parent.as_ref(),
            updater.scope().clone(),
        );
        block.render(updater)?;
        block.mount(updater);
        Ok(Self {
            part,
            block,
            state: BindingState::Bound,
        })
    }

    pub fn block(&self) -> &Rc<Block> {
        &self.block
    }
}

impl Binding for BlockBinding {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Component(self.block.render_kind())
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()> {
        let Value::Component(component) = value else {
            return Err(unsupported_value(&self.part, &value));
        };
        self.block.set_render(component.render);
        self.block.set_props(component.props);

        if self.state != BindingState::Bound {
            if self.block.is_dirty() {
                self.block.render(updater)?;
            }
            self.block.mount(updater);
        } else if self.block.is_dirty() {
            self.block.render(updater)?;
            self.block.update(updater);
        }
        self.state = BindingState::Bound;
        Ok(())
    }

    fn unbind(&mut self, updater: &Updater) {
        if self.state != BindingState::Bound {
            return;
        }
        self.block.detach(updater);
        self.state = BindingState::Unbound;
    }

    fn disconnect(&mut self, updater: &Updater) {
        if self.state == BindingState::Disconnected {
            return;
        }
        self.block.unmount(updater);
        self.state = BindingState::Disconnected;
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if self.state == BindingState::Bound {
            self.block.collect_nodes(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::RenderError;
    use crate::hooks::{Cleanup, StateHandle};
    use crate::html;
    use crate::testing::{drain, new_log, Harness};

    fn counter() -> RenderFn {
        RenderFn::new(|props: &Value, cx: &mut Context<'_>| {
            let n = props.as_number().unwrap_or_default();
            if n < 10.0 {
                html!(cx, ["<b>", "</b>"], n)
            } else {
                html!(cx, ["<i>", "</i><i>!</i>"], n)
            }
        })
    }

    #[test]
    fn test_template_switch_reuses_mount_point() {
        let harness = Harness::new();
        let render = counter();
        let mut binding = harness.mount(render.clone(), 1);
        insta::assert_snapshot!(harness.html(), @"<b>1<!----></b><!---->");

        harness.surface.reset_stats();
        binding.bind(Value::component(render.clone(), 2), &harness.updater).unwrap();
        harness.flush();
        let stats = harness.surface.stats();
        assert_eq!((stats.created, stats.texts, stats.mutations()), (0, 1, 1));
        insta::assert_snapshot!(harness.html(), @"<b>2<!----></b><!---->");

        binding.bind(Value::component(render.clone(), 20), &harness.updater).unwrap();
        harness.flush();
        insta::assert_snapshot!(harness.html(), @"<i>20<!----></i><i>!</i><!---->");
        assert!(binding.block().has_cache());
        assert_eq!(binding.block().cached_count(), 1);

        harness.surface.reset_stats();
        binding.bind(Value::component(render, 3), &harness.updater).unwrap();
        harness.flush();
        insta::assert_snapshot!(harness.html(), @"<b>3<!----></b><!---->");
        assert_eq!(harness.surface.stats().created, 0);
        assert_eq!(harness.updater.scope().template_count(), 2);
        assert_eq!(binding.block().cached_count(), 1);
    }

    #[test]
    fn test_cache_not_allocated_for_single_template() {
        let harness = Harness::new();
        let render = counter();
        let mut binding = harness.mount(render.clone(), 1);
        binding.bind(Value::component(render, 5), &harness.updater).unwrap();
        harness.flush();
        assert!(!binding.block().has_cache());
    }

    #[test]
    fn test_same_props_skip_render() {
        let harness = Harness::new();
        let renders = Rc::new(Cell::new(0));
        let count = renders.clone();
        let render = RenderFn::new(move |props: &Value, cx: &mut Context<'_>| {
            count.set(count.get() + 1);
            html!(cx, ["<p>", "</p>"], props.clone())
        });

        let mut binding = harness.mount(render.clone(), "x");
        binding.bind(Value::component(render.clone(), "x"), &harness.updater).unwrap();
        assert_eq!(renders.get(), 1);
        binding.bind(Value::component(render, "y"), &harness.updater).unwrap();
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn test_force_update_deduplicated() {
        let harness = Harness::new();
        let renders = Rc::new(Cell::new(0));
        let count = renders.clone();
        let render = RenderFn::new(move |_: &Value, cx: &mut Context<'_>| {
            count.set(count.get() + 1);
            html!(cx, ["<p>", "</p>"], count.get())
        });

        let binding = harness.mount(render, Value::Null);
        let block = binding.block().clone();
        for _ in 0..3 {
            block.force_update(&harness.updater);
        }
        assert!(block.flags().contains(BlockFlags::UPDATING));

        let summary = harness.flush();
        assert_eq!(summary.blocks, 1);
        assert_eq!(renders.get(), 2);
        assert_eq!(block.flags(), BlockFlags::MOUNTED);
        insta::assert_snapshot!(harness.html(), @"<p>2<!----></p><!---->");
    }

    #[test]
    fn test_unmounted_block_skipped() {
        let harness = Harness::new();
        let mut binding = harness.mount(counter(), 1);
        let block = binding.block().clone();
        block.force_update(&harness.updater);
        binding.unbind(&harness.updater);
        binding.disconnect(&harness.updater);

        let summary = harness.flush();
        assert_eq!(summary.blocks, 0);
        assert!(!block.flags().contains(BlockFlags::UPDATING));
        insta::assert_snapshot!(harness.html(), @"<!---->");
    }

    #[test]
    fn test_state_handle_schedules_render() {
        let harness = Harness::new();
        let slot: Rc<RefCell<Option<StateHandle<i32>>>> = Rc::default();
        let exported = slot.clone();
        let render = RenderFn::new(move |_: &Value, cx: &mut Context<'_>| {
            let (count, handle) = cx.use_state(|| 0)?;
            *exported.borrow_mut() = Some(handle);
            html!(cx, ["<output>", "</output>"], count)
        });

        let _binding = harness.mount(render, Value::Null);
        insta::assert_snapshot!(harness.html(), @"<output>0<!----></output><!---->");

        let handle = slot.borrow().clone().unwrap();
        handle.set(5);
        handle.update(|n| *n += 1);
        let summary = harness.flush();
        assert_eq!(summary.blocks, 1);
        assert_eq!(handle.get(), 6);
        insta::assert_snapshot!(harness.html(), @"<output>6<!----></output><!---->");
    }

    #[test]
    fn test_effects_follow_deps_and_cleanup_on_unmount() {
        let harness = Harness::new();
        let log = new_log();
        let effects = log.clone();
        let render = RenderFn::new(move |props: &Value, cx: &mut Context<'_>| {
            let n = props.as_number().unwrap_or_default();
            let (passive, layout) = (effects.clone(), effects.clone());
            cx.use_effect(Some(vec![props.clone()]), move || {
                passive.borrow_mut().push(format!("effect {n}"));
                Some(Box::new(move || passive.borrow_mut().push(format!("cleanup {n}"))) as Cleanup)
            })?;
            cx.use_layout_effect(None, move || {
                layout.borrow_mut().push(format!("layout {n}"));
                None
            })?;
            html!(cx, ["<p>", "</p>"], n)
        });

        let mut binding = harness.mount(render.clone(), 1);
        assert_eq!(drain(&log), vec!["layout 1", "effect 1"]);

        binding.bind(Value::component(render.clone(), 1), &harness.updater).unwrap();
        harness.flush();
        assert!(drain(&log).is_empty());

        binding.bind(Value::component(render, 2), &harness.updater).unwrap();
        harness.flush();
        assert_eq!(drain(&log), vec!["layout 2", "cleanup 1", "effect 2"]);

        binding.unbind(&harness.updater);
        binding.disconnect(&harness.updater);
        harness.flush();
        assert_eq!(drain(&log), vec!["cleanup 2"]);
        insta::assert_snapshot!(harness.html(), @"<!---->");
    }

    #[test]
    fn test_hook_order_change_rejected() {
        let harness = Harness::new();
        let render = RenderFn::new(|props: &Value, cx: &mut Context<'_>| {
            if props.as_number() == Some(1.0) {
                cx.use_state(|| 0)?;
            } else {
                cx.use_effect(None, || None)?;
            }
            html!(cx, ["<p></p>"])
        });

        let mut binding = harness.mount(render.clone(), 1);
        let error = binding
            .bind(Value::component(render, 2), &harness.updater)
            .unwrap_err();
        assert_eq!(error, RenderError::HookMismatch { index: 0 });
    }

    #[test]
    fn test_variables_inherited_from_ancestors() {
        let harness = Harness::new();
        let child = RenderFn::new(|_: &Value, cx: &mut Context<'_>| {
            let theme = cx.get_variable("theme").unwrap_or_default();
            html!(cx, ["<em>", "</em>"], theme)
        });
        let parent = RenderFn::new(move |_: &Value, cx: &mut Context<'_>| {
            cx.set_variable("theme", "dark");
            html!(cx, ["<section>", "</section>"], Value::component(child.clone(), Value::Null))
        });

        harness.updater.scope().set_variable(None, "theme", Value::from("light"));
        let binding = harness.mount(parent, Value::Null);
        insta::assert_snapshot!(harness.html(), @"<section><em>dark<!----></em><!----></section><!---->");

        let scope = harness.updater.scope().clone();
        let local = scope.get_variable(Some(binding.block().as_ref()), "theme");
        assert_eq!(local.as_ref().and_then(Value::as_text), Some("dark"));
        let global = scope.get_variable(None, "theme");
        assert_eq!(global.as_ref().and_then(Value::as_text), Some("light"));
    }
}
