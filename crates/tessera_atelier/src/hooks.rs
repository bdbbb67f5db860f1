//! Hook storage of a block.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::block::Block;
use crate::updater::WeakUpdater;
use crate::value::Value;

/// Cleanup returned by an effect.
pub type Cleanup = Box<dyn FnOnce()>;

/// One hook slot, in call order.
pub(crate) enum Hook {
    Effect(Rc<EffectSlot>),
    LayoutEffect(Rc<EffectSlot>),
    State(Rc<dyn Any>),
}

/// Dependencies and pending cleanup of one effect hook.
#[derive(Default)]
pub(crate) struct EffectSlot {
    deps: RefCell<Option<Vec<Value>>>,
    primed: Cell<bool>,
    cleanup: RefCell<Option<Cleanup>>,
    alive: Cell<bool>,
}

impl EffectSlot {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            alive: Cell::new(true),
            ..Self::default()
        })
    }

    /// Record `deps` and report whether the effect has to run again.
    pub(crate) fn update_deps(&self, deps: Option<Vec<Value>>) -> bool {
        let changed = !self.primed.get()
            || match (&*self.deps.borrow(), &deps) {
                (Some(old), Some(new)) => {
                    old.len() != new.len() || old.iter().zip(new).any(|(a, b)| !a.is_same(b))
                }
                _ => true,
            };
        if changed {
            self.primed.set(true);
            let previous = self.deps.replace(deps);
            drop(previous);
        }
        changed
    }

    /// Run the previous cleanup, then the effect.
    pub(crate) fn run(&self, effect: impl FnOnce() -> Option<Cleanup>) {
        if !self.alive.get() {
            return;
        }
        self.run_cleanup();
        let cleanup = effect();
        *self.cleanup.borrow_mut() = cleanup;
    }

    /// Stop pending effects and run the last cleanup.
    pub(crate) fn retire(&self) {
        self.alive.set(false);
        self.run_cleanup();
    }

    /// Forget the recorded deps so the next render runs the effect again.
    fn unprime(&self) {
        self.primed.set(false);
    }

    fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
}

/// A queued run of an effect slot.
///
/// Dropping it without running, as an aborted flush does, unprimes the slot.
pub(crate) struct PendingEffect {
    slot: Option<Rc<EffectSlot>>,
}

impl PendingEffect {
    pub(crate) fn new(slot: Rc<EffectSlot>) -> Self {
        Self { slot: Some(slot) }
    }

    pub(crate) fn run(mut self, effect: impl FnOnce() -> Option<Cleanup>) {
        if let Some(slot) = self.slot.take() {
            slot.run(effect);
        }
    }
}

impl Drop for PendingEffect {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.unprime();
        }
    }
}

/// Handle to a piece of block state created by
/// [`Context::use_state`](crate::Context::use_state).
///
/// Writing through the handle schedules a render of the owning block.
pub struct StateHandle<T> {
    cell: Rc<RefCell<T>>,
    block: Weak<Block>,
    updater: WeakUpdater,
}

impl<T> StateHandle<T> {
    pub(crate) fn new(cell: Rc<RefCell<T>>, block: Weak<Block>, updater: WeakUpdater) -> Self {
        Self {
            cell,
            block,
            updater,
        }
    }

    /// Current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.borrow().clone()
    }

    /// Replace the value and schedule a render.
    pub fn set(&self, value: T) {
        let previous = self.cell.replace(value);
        drop(previous);
        self.schedule();
    }

    /// Modify the value in place and schedule a render.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.cell.borrow_mut());
        self.schedule();
    }

    fn schedule(&self) {
        if let (Some(block), Some(updater)) = (self.block.upgrade(), self.updater.upgrade()) {
            block.force_update(&updater);
        }
    }
}

impl<T> Clone for StateHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            block: self.block.clone(),
            updater: self.updater.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deps_changes() {
        let slot = EffectSlot::new();
        assert!(slot.update_deps(Some(vec![Value::from(1)])));
        assert!(!slot.update_deps(Some(vec![Value::from(1)])));
        assert!(slot.update_deps(Some(vec![Value::from(2)])));
        assert!(slot.update_deps(Some(vec![Value::from(2), Value::Null])));
        assert!(slot.update_deps(None));
        assert!(slot.update_deps(None));
    }

    #[test]
    fn test_empty_deps_run_once() {
        let slot = EffectSlot::new();
        assert!(slot.update_deps(Some(vec![])));
        assert!(!slot.update_deps(Some(vec![])));
    }

    #[test]
    fn test_cleanup_runs_before_next_effect_and_on_retire() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot = EffectSlot::new();
        for round in 0..2 {
            let log = log.clone();
            slot.run(move || {
                log.borrow_mut().push(format!("run {round}"));
                Some(Box::new(move || log.borrow_mut().push(format!("cleanup {round}"))) as Cleanup)
            });
        }
        slot.retire();
        slot.run(|| panic!("retired slots do not run"));
        assert_eq!(*log.borrow(), vec!["run 0", "cleanup 0", "run 1", "cleanup 1"]);
    }
}
