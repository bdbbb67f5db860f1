//! Render context handed to component render functions.

use std::cell::RefCell;
use std::rc::Rc;

use crate::block::Block;
use crate::error::{RenderError, Result};
use crate::hooks::{Cleanup, EffectSlot, Hook, PendingEffect, StateHandle};
use crate::template::Skeleton;
use crate::updater::Updater;
use crate::value::{TemplateResult, Value};

/// What a render function can reach: its block, the updater, block variables
/// and hooks.
///
/// Hooks are matched by call order. A render must call the same hooks in the
/// same order every time.
pub struct Context<'a> {
    block: &'a Rc<Block>,
    updater: &'a Updater,
    hooks: &'a mut Vec<Hook>,
    hook_index: usize,
}

impl<'a> Context<'a> {
    pub(crate) fn new(block: &'a Rc<Block>, updater: &'a Updater, hooks: &'a mut Vec<Hook>) -> Self {
        Self {
            block,
            updater,
            hooks,
            hook_index: 0,
        }
    }

    pub fn block(&self) -> &Rc<Block> {
        self.block
    }

    pub fn updater(&self) -> &Updater {
        self.updater
    }

    /// Look a variable up on this block, its ancestors, then the globals.
    pub fn get_variable(&self, key: &str) -> Option<Value> {
        self.updater.scope().get_variable(Some(self.block), key)
    }

    /// Set a variable visible to this block and its descendants.
    pub fn set_variable(&self, key: &str, value: impl Into<Value>) {
        self.updater
            .scope()
            .set_variable(Some(self.block), key, value.into());
    }

    /// Pair the cached template of a call site with values.
    pub fn create_template(
        &self,
        skeleton: &'static Skeleton,
        values: Vec<Value>,
    ) -> Result<TemplateResult> {
        self.updater.scope().create_template(skeleton, values)
    }

    /// Run `effect` in the passive phase when `deps` change.
    ///
    /// `None` deps run the effect after every render.
    pub fn use_effect(
        &mut self,
        deps: Option<Vec<Value>>,
        effect: impl FnOnce() -> Option<Cleanup> + 'static,
    ) -> Result<()> {
        let slot = self.effect_slot(false)?;
        if slot.update_deps(deps) {
            let pending = PendingEffect::new(slot);
            self.updater
                .enqueue_passive_effect(move |_| pending.run(effect));
        }
        Ok(())
    }

    /// Run `effect` in the layout phase when `deps` change.
    pub fn use_layout_effect(
        &mut self,
        deps: Option<Vec<Value>>,
        effect: impl FnOnce() -> Option<Cleanup> + 'static,
    ) -> Result<()> {
        let slot = self.effect_slot(true)?;
        if slot.update_deps(deps) {
            let pending = PendingEffect::new(slot);
            self.updater
                .enqueue_layout_effect(move |_| pending.run(effect));
        }
        Ok(())
    }

    /// State kept across renders. `init` runs on the first render only.
    pub fn use_state<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> Result<(T, StateHandle<T>)> {
        let index = self.next_index();
        let cell = match self.hooks.get(index) {
            Some(Hook::State(state)) => state
                .clone()
                .downcast::<RefCell<T>>()
                .map_err(|_| RenderError::HookMismatch { index })?,
            Some(_) => return Err(RenderError::HookMismatch { index }),
            None => {
                let cell = Rc::new(RefCell::new(init()));
                self.hooks.push(Hook::State(cell.clone()));
                cell
            }
        };
        let value = cell.borrow().clone();
        let handle = StateHandle::new(cell, Rc::downgrade(self.block), self.updater.downgrade());
        Ok((value, handle))
    }

    fn effect_slot(&mut self, layout: bool) -> Result<Rc<EffectSlot>> {
        let index = self.next_index();
        match self.hooks.get(index) {
            Some(Hook::LayoutEffect(slot)) if layout => Ok(slot.clone()),
            Some(Hook::Effect(slot)) if !layout => Ok(slot.clone()),
            Some(_) => Err(RenderError::HookMismatch { index }),
            None => {
                let slot = EffectSlot::new();
                self.hooks.push(if layout {
                    Hook::LayoutEffect(slot.clone())
                } else {
                    Hook::Effect(slot.clone())
                });
                Ok(slot)
            }
        }
    }

    fn next_index(&mut self) -> usize {
        let index = self.hook_index;
        self.hook_index += 1;
        index
    }
}
