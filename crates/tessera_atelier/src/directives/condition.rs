//! Two-way conditional rendering.

use std::any::{Any, TypeId};
use std::rc::Rc;

use tessera_fresco::NodeId;

use crate::binding::{
    create_binding, downcast_directive, update_binding, Binding, BindingState, Directive,
};
use crate::error::Result;
use crate::part::Part;
use crate::updater::Updater;
use crate::value::{TemplateResult, Value, ValueKind};

/// Condition of a [`condition`] directive.
#[derive(Clone)]
pub enum Predicate {
    Value(bool),
    /// Evaluated every time the directive is bound
    Lazy(Rc<dyn Fn() -> bool>),
}

impl Predicate {
    pub fn lazy(f: impl Fn() -> bool + 'static) -> Self {
        Predicate::Lazy(Rc::new(f))
    }

    pub fn evaluate(&self) -> bool {
        match self {
            Predicate::Value(value) => *value,
            Predicate::Lazy(f) => f(),
        }
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Predicate::Value(value)
    }
}

/// One branch of a [`condition`] directive.
#[derive(Clone)]
pub enum Branch {
    Value(Value),
    /// Built only when the branch is chosen
    Lazy(Rc<dyn Fn() -> Value>),
}

impl Branch {
    pub fn lazy(f: impl Fn() -> Value + 'static) -> Self {
        Branch::Lazy(Rc::new(f))
    }

    pub fn evaluate(&self) -> Value {
        match self {
            Branch::Value(value) => value.clone(),
            Branch::Lazy(f) => f(),
        }
    }
}

impl From<Value> for Branch {
    fn from(value: Value) -> Self {
        Branch::Value(value)
    }
}

impl From<TemplateResult> for Branch {
    fn from(value: TemplateResult) -> Self {
        Branch::Value(value.into())
    }
}

impl From<&str> for Branch {
    fn from(value: &str) -> Self {
        Branch::Value(value.into())
    }
}

/// Directive value created by [`condition`], [`when`] and [`unless`].
pub struct Condition {
    predicate: Predicate,
    consequent: Branch,
    alternate: Branch,
}

/// Render `consequent` when `predicate` holds and `alternate` otherwise.
///
/// Each branch keeps its own binding. The inactive one is unbound, not
/// disconnected, so flipping back reuses it.
pub fn condition(
    predicate: impl Into<Predicate>,
    consequent: impl Into<Branch>,
    alternate: impl Into<Branch>,
) -> Value {
    Value::Directive(Rc::new(Condition {
        predicate: predicate.into(),
        consequent: consequent.into(),
        alternate: alternate.into(),
    }))
}

/// Render `consequent` only when `predicate` holds.
pub fn when(predicate: impl Into<Predicate>, consequent: impl Into<Branch>) -> Value {
    condition(predicate, consequent, Value::Null)
}

/// Render `alternate` only when `predicate` does not hold.
pub fn unless(predicate: impl Into<Predicate>, alternate: impl Into<Branch>) -> Value {
    condition(predicate, Value::Null, alternate)
}

impl Directive for Condition {
    fn name(&self) -> &'static str {
        "condition"
    }

    fn create_binding(self: Rc<Self>, part: Part, updater: &Updater) -> Result<Box<dyn Binding>> {
        let mut binding = ConditionBinding {
            part,
            consequent: None,
            alternate: None,
            state: BindingState::Unbound,
        };
        binding.apply(&self, updater)?;
        Ok(Box::new(binding))
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Binding of a [`condition`] directive.
pub struct ConditionBinding {
    part: Part,
    consequent: Option<Box<dyn Binding>>,
    alternate: Option<Box<dyn Binding>>,
    state: BindingState,
}

impl ConditionBinding {
    fn apply(&mut self, condition: &Condition, updater: &Updater) -> Result<()> {
        let Self {
            part,
            consequent,
            alternate,
            ..
        } = self;
        let (active, inactive, branch) = if condition.predicate.evaluate() {
            (consequent, alternate, &condition.consequent)
        } else {
            (alternate, consequent, &condition.alternate)
        };

        if let Some(binding) = inactive {
            binding.unbind(updater);
        }
        let value = branch.evaluate();
        match active {
            Some(binding) => update_binding(binding, value, updater, false)?,
            None => *active = Some(create_binding(part.clone(), value, updater)?),
        }

        self.state = BindingState::Bound;
        Ok(())
    }
}

impl Binding for ConditionBinding {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Directive(TypeId::of::<Condition>())
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()> {
        let condition = downcast_directive::<Condition>(value, &self.part)?;
        self.apply(&condition, updater)
    }

    fn unbind(&mut self, updater: &Updater) {
        if self.state != BindingState::Bound {
            return;
        }
        for binding in [&mut self.consequent, &mut self.alternate].into_iter().flatten() {
            binding.unbind(updater);
        }
        self.state = BindingState::Unbound;
    }

    fn disconnect(&mut self, updater: &Updater) {
        if self.state == BindingState::Disconnected {
            return;
        }
        for binding in [&mut self.consequent, &mut self.alternate].into_iter().flatten() {
            binding.disconnect(updater);
        }
        self.state = BindingState::Disconnected;
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if self.state != BindingState::Bound {
            return;
        }
        for binding in [&self.consequent, &self.alternate].into_iter().flatten() {
            binding.collect_nodes(out);
        }
    }
}
