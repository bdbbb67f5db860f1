//! Test fixtures.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use compact_str::CompactString;
use tessera_fresco::{NodeId, Surface};

use crate::binding::{downcast_directive, Binding, BindingState, Directive};
use crate::block::BlockBinding;
use crate::error::Result;
use crate::part::Part;
use crate::root::Root;
use crate::scheduler::ManualScheduler;
use crate::scope::Scope;
use crate::updater::{FlushSummary, Updater};
use crate::value::{ComponentValue, RenderFn, Value, ValueKind};

/// A surface with a `<div>` container and an updater flushed by hand.
pub(crate) struct Harness {
    pub(crate) surface: Surface,
    pub(crate) updater: Updater,
    pub(crate) container: NodeId,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let surface = Surface::new();
        let container = surface.create_element("div");
        surface.append_child(surface.root(), container);
        let updater = Updater::new(
            surface.clone(),
            Rc::new(Scope::default()),
            Rc::new(ManualScheduler),
        );
        Self {
            surface,
            updater,
            container,
        }
    }

    pub(crate) fn html(&self) -> String {
        self.surface.inner_html(self.container)
    }

    pub(crate) fn flush(&self) -> FlushSummary {
        self.updater.flush().unwrap()
    }

    /// Render into the container and flush.
    pub(crate) fn render(&self, value: impl Into<Value>) -> Root {
        let root = Root::render(value, self.container, &self.updater).unwrap();
        self.flush();
        root
    }

    /// Mount a component in a new region at the end of the container and
    /// flush.
    pub(crate) fn mount(&self, render: RenderFn, props: impl Into<Value>) -> BlockBinding {
        let anchor = self.surface.create_comment("");
        self.surface.append_child(self.container, anchor);
        let binding = BlockBinding::create(
            Part::ChildNode { anchor },
            ComponentValue::new(render, props),
            &self.updater,
        )
        .unwrap();
        self.flush();
        binding
    }
}

pub(crate) type Log = Rc<RefCell<Vec<String>>>;

pub(crate) fn new_log() -> Log {
    Rc::default()
}

pub(crate) fn drain(log: &Log) -> Vec<String> {
    log.borrow_mut().drain(..).collect()
}

/// Directive that records its binding lifecycle and renders nothing.
pub(crate) struct Probe {
    id: CompactString,
    log: Log,
}

pub(crate) fn probe(id: &str, log: &Log) -> Value {
    Value::Directive(Rc::new(Probe {
        id: CompactString::new(id),
        log: log.clone(),
    }))
}

impl Directive for Probe {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn create_binding(self: Rc<Self>, part: Part, _updater: &Updater) -> Result<Box<dyn Binding>> {
        self.log.borrow_mut().push(format!("create {}", self.id));
        Ok(Box::new(ProbeBinding {
            part,
            id: self.id.clone(),
            log: self.log.clone(),
            state: BindingState::Bound,
        }))
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

struct ProbeBinding {
    part: Part,
    id: CompactString,
    log: Log,
    state: BindingState,
}

impl ProbeBinding {
    fn record(&self, event: &str) {
        self.log.borrow_mut().push(format!("{event} {}", self.id));
    }
}

impl Binding for ProbeBinding {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Directive(TypeId::of::<Probe>())
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, _updater: &Updater) -> Result<()> {
        let probe = downcast_directive::<Probe>(value, &self.part)?;
        self.id = probe.id.clone();
        self.record("bind");
        self.state = BindingState::Bound;
        Ok(())
    }

    fn unbind(&mut self, _updater: &Updater) {
        if self.state == BindingState::Bound {
            self.record("unbind");
            self.state = BindingState::Unbound;
        }
    }

    fn disconnect(&mut self, _updater: &Updater) {
        if self.state != BindingState::Disconnected {
            self.record("disconnect");
            self.state = BindingState::Disconnected;
        }
    }
}
