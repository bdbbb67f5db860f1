//! The update scheduler.
//!
//! The [`Updater`] batches work into flush ticks. A tick runs in three phases:
//!
//! 1. **Mutation**: queued mutation effects commit in enqueue order, then each
//!    queued block renders and commits its own mutation effects as a segment
//! 2. **Layout**: layout effects run
//! 3. **Passive**: passive effects run
//!
//! Blocks enqueued while a tick runs wait for the next tick. A block that
//! fails to render aborts the tick. The mutations its bindings already
//! queued are committed so the tree matches what the bindings recorded.
//! Its layout and passive effects are dropped, and blocks not reached yet
//! are requeued.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tessera_fresco::Surface;

use crate::block::Block;
use crate::error::Result;
use crate::scheduler::HostScheduler;
use crate::scope::Scope;

/// Deferred work run during a flush.
pub type Effect = Box<dyn FnOnce(&Updater)>;

/// What one flush tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Blocks rendered
    pub blocks: usize,
    /// Mutation effects committed
    pub mutations: usize,
    /// Layout effects run
    pub layout_effects: usize,
    /// Passive effects run
    pub passive_effects: usize,
}

struct UpdaterInner {
    surface: Surface,
    scope: Rc<Scope>,
    host: Rc<dyn HostScheduler>,
    blocks: RefCell<VecDeque<Rc<Block>>>,
    mutation_effects: RefCell<VecDeque<Effect>>,
    layout_effects: RefCell<VecDeque<Effect>>,
    passive_effects: RefCell<VecDeque<Effect>>,
    block_stack: RefCell<Vec<Rc<Block>>>,
    flush_requested: Cell<bool>,
    flushing: Cell<bool>,
    tick: Cell<u64>,
}

/// Shared handle to the scheduler of one render tree.
#[derive(Clone)]
pub struct Updater {
    inner: Rc<UpdaterInner>,
}

/// Non-owning handle to an [`Updater`].
#[derive(Clone)]
pub struct WeakUpdater {
    inner: Weak<UpdaterInner>,
}

impl WeakUpdater {
    pub fn upgrade(&self) -> Option<Updater> {
        self.inner.upgrade().map(|inner| Updater { inner })
    }
}

impl Updater {
    /// Create an updater painting onto `surface`.
    pub fn new(surface: Surface, scope: Rc<Scope>, host: Rc<dyn HostScheduler>) -> Self {
        Self {
            inner: Rc::new(UpdaterInner {
                surface,
                scope,
                host,
                blocks: RefCell::default(),
                mutation_effects: RefCell::default(),
                layout_effects: RefCell::default(),
                passive_effects: RefCell::default(),
                block_stack: RefCell::default(),
                flush_requested: Cell::new(false),
                flushing: Cell::new(false),
                tick: Cell::new(0),
            }),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.inner.surface
    }

    pub fn scope(&self) -> &Rc<Scope> {
        &self.inner.scope
    }

    pub fn downgrade(&self) -> WeakUpdater {
        WeakUpdater {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Number of completed flush ticks.
    pub fn tick(&self) -> u64 {
        self.inner.tick.get()
    }

    /// Whether any block or effect is waiting for a flush.
    pub fn has_pending_work(&self) -> bool {
        !self.inner.blocks.borrow().is_empty()
            || !self.inner.mutation_effects.borrow().is_empty()
            || !self.inner.layout_effects.borrow().is_empty()
            || !self.inner.passive_effects.borrow().is_empty()
    }

    /// Ask the host for a flush. Requests coalesce until the flush starts.
    pub fn request_flush(&self) {
        if self.inner.flush_requested.replace(true) {
            return;
        }
        let updater = self.downgrade();
        self.inner.host.schedule(Box::new(move || {
            let Some(updater) = updater.upgrade() else {
                return;
            };
            if let Err(error) = updater.flush() {
                tracing::error!("scheduled flush aborted: {}", error);
            }
        }));
    }

    /// Queue a block for rendering in the next tick.
    pub fn enqueue_block(&self, block: Rc<Block>) {
        self.inner.blocks.borrow_mut().push_back(block);
        self.request_flush();
    }

    /// Queue a tree mutation.
    pub fn enqueue_mutation_effect(&self, effect: impl FnOnce(&Updater) + 'static) {
        self.push_effect(&self.inner.mutation_effects, Box::new(effect));
    }

    /// Queue an effect for the layout phase.
    pub fn enqueue_layout_effect(&self, effect: impl FnOnce(&Updater) + 'static) {
        self.push_effect(&self.inner.layout_effects, Box::new(effect));
    }

    /// Queue an effect for the passive phase.
    pub fn enqueue_passive_effect(&self, effect: impl FnOnce(&Updater) + 'static) {
        self.push_effect(&self.inner.passive_effects, Box::new(effect));
    }

    fn push_effect(&self, queue: &RefCell<VecDeque<Effect>>, effect: Effect) {
        queue.borrow_mut().push_back(effect);
        if !self.inner.flushing.get() {
            self.request_flush();
        }
    }

    /// Block whose template is being mounted or patched right now.
    pub fn current_block(&self) -> Option<Rc<Block>> {
        self.inner.block_stack.borrow().last().cloned()
    }

    /// Mark `block` as the owner of blocks created until the guard drops.
    pub(crate) fn enter_block(&self, block: &Rc<Block>) -> BlockGuard {
        self.inner.block_stack.borrow_mut().push(block.clone());
        BlockGuard {
            updater: self.clone(),
        }
    }

    /// Run one flush tick.
    pub fn flush(&self) -> Result<FlushSummary> {
        let inner = &self.inner;
        inner.flush_requested.set(false);
        let _flushing = FlushingGuard::enter(&inner.flushing);

        let tick = inner.tick.get() + 1;
        inner.tick.set(tick);
        let mut summary = FlushSummary {
            tick,
            ..FlushSummary::default()
        };

        summary.mutations += self.run_effects(&inner.mutation_effects);

        let blocks: Vec<Rc<Block>> = inner.blocks.borrow_mut().drain(..).collect();
        let mut blocks = blocks.into_iter();
        while let Some(block) = blocks.next() {
            let layout_mark = inner.layout_effects.borrow().len();
            let passive_mark = inner.passive_effects.borrow().len();

            match block.perform_update(self) {
                Ok(rendered) => {
                    summary.blocks += usize::from(rendered);
                    summary.mutations += self.run_effects(&inner.mutation_effects);
                }
                Err(error) => {
                    summary.mutations += self.run_effects(&inner.mutation_effects);
                    let discarded = (
                        truncate(&inner.layout_effects, layout_mark),
                        truncate(&inner.passive_effects, passive_mark),
                    );
                    drop(discarded);

                    let mut remaining: VecDeque<Rc<Block>> = blocks.collect();
                    if !remaining.is_empty() {
                        let mut queue = inner.blocks.borrow_mut();
                        remaining.extend(queue.drain(..));
                        *queue = remaining;
                    }
                    if !inner.blocks.borrow().is_empty() {
                        self.request_flush();
                    }

                    tracing::debug!("flush tick {} aborted at block {}: {}", tick, block.id(), error);
                    return Err(error);
                }
            }
        }

        summary.layout_effects = self.run_effects(&inner.layout_effects);
        summary.passive_effects = self.run_effects(&inner.passive_effects);

        if !inner.mutation_effects.borrow().is_empty() {
            self.request_flush();
        }

        tracing::debug!(
            "flush tick {}: {} blocks, {} mutations, {} layout effects, {} passive effects",
            tick,
            summary.blocks,
            summary.mutations,
            summary.layout_effects,
            summary.passive_effects
        );
        Ok(summary)
    }

    /// Flush until no work is left, up to `max_ticks` ticks.
    pub fn flush_all(&self, max_ticks: usize) -> Result<usize> {
        let mut ticks = 0;
        while ticks < max_ticks && self.has_pending_work() {
            self.flush()?;
            ticks += 1;
        }
        Ok(ticks)
    }

    fn run_effects(&self, queue: &RefCell<VecDeque<Effect>>) -> usize {
        let mut count = 0;
        loop {
            let effect = queue.borrow_mut().pop_front();
            match effect {
                Some(effect) => {
                    effect(self);
                    count += 1;
                }
                None => return count,
            }
        }
    }
}

fn truncate(queue: &RefCell<VecDeque<Effect>>, len: usize) -> Vec<Effect> {
    let mut queue = queue.borrow_mut();
    let keep = len.min(queue.len());
    queue.drain(keep..).collect()
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("tick", &self.inner.tick.get())
            .field("blocks", &self.inner.blocks.borrow().len())
            .field("mutation_effects", &self.inner.mutation_effects.borrow().len())
            .finish()
    }
}

/// Pops the block stack on drop.
pub(crate) struct BlockGuard {
    updater: Updater,
}

impl Drop for BlockGuard {
    fn drop(&mut self) {
        self.updater.inner.block_stack.borrow_mut().pop();
    }
}

struct FlushingGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> FlushingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        Self {
            previous: flag.replace(true),
            flag,
        }
    }
}

impl Drop for FlushingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}
