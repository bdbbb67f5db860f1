//! Keyed choice between bindings.

use std::any::{Any, TypeId};
use std::hash::Hash;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tessera_fresco::NodeId;

use crate::binding::{
    create_binding, downcast_directive, update_binding, Binding, BindingState, Directive,
};
use crate::error::Result;
use crate::part::Part;
use crate::updater::Updater;
use crate::value::{Value, ValueKind};

type Factory<K> = Rc<dyn Fn(&K) -> Value>;

/// Directive value created by [`choice`].
pub struct Choice<K> {
    key: K,
    factory: Factory<K>,
}

/// Render `factory(key)`, keeping one binding per key.
///
/// Switching to another key unbinds the current binding and stashes it. When
/// a stashed key comes back its binding is reused instead of rebuilt.
pub fn choice<K, F>(key: K, factory: F) -> Value
where
    K: Eq + Hash + Clone + 'static,
    F: Fn(&K) -> Value + 'static,
{
    Value::Directive(Rc::new(Choice {
        key,
        factory: Rc::new(factory),
    }))
}

impl<K: Eq + Hash + Clone + 'static> Directive for Choice<K> {
    fn name(&self) -> &'static str {
        "choice"
    }

    fn create_binding(self: Rc<Self>, part: Part, updater: &Updater) -> Result<Box<dyn Binding>> {
        let value = (self.factory)(&self.key);
        let current = create_binding(part.clone(), value, updater)?;
        Ok(Box::new(ChoiceBinding {
            part,
            key: self.key.clone(),
            current,
            cache: FxHashMap::default(),
            state: BindingState::Bound,
        }))
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Binding of a [`choice`] directive.
pub struct ChoiceBinding<K> {
    part: Part,
    key: K,
    current: Box<dyn Binding>,
    cache: FxHashMap<K, Box<dyn Binding>>,
    state: BindingState,
}

impl<K: Eq + Hash + Clone + 'static> ChoiceBinding<K> {
    /// Key of the binding in place.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Number of stashed bindings.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

impl<K: Eq + Hash + Clone + 'static> Binding for ChoiceBinding<K> {
    fn part(&self) -> &Part {
        &self.part
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Directive(TypeId::of::<Choice<K>>())
    }

    fn state(&self) -> BindingState {
        self.state
    }

    fn bind(&mut self, value: Value, updater: &Updater) -> Result<()> {
        let choice = downcast_directive::<Choice<K>>(value, &self.part)?;
        let value = (choice.factory)(&choice.key);

        if choice.key == self.key {
            update_binding(&mut self.current, value, updater, false)?;
        } else {
            self.current.unbind(updater);
            // `current` is unbound from here on, so a failure leaves this
            // binding unbound with the old key still in place.
            let next = match self.cache.remove(&choice.key) {
                Some(mut cached) => match update_binding(&mut cached, value, updater, true) {
                    Ok(()) => cached,
                    Err(error) => {
                        cached.disconnect(updater);
                        self.state = BindingState::Unbound;
                        return Err(error);
                    }
                },
                None => match create_binding(self.part.clone(), value, updater) {
                    Ok(binding) => binding,
                    Err(error) => {
                        self.state = BindingState::Unbound;
                        return Err(error);
                    }
                },
            };
            let previous = std::mem::replace(&mut self.current, next);
            let previous_key = std::mem::replace(&mut self.key, choice.key.clone());
            self.cache.insert(previous_key, previous);
        }

        self.state = BindingState::Bound;
        Ok(())
    }

    fn unbind(&mut self, updater: &Updater) {
        if self.state != BindingState::Bound {
            return;
        }
        self.current.unbind(updater);
        for (_, mut binding) in self.cache.drain() {
            binding.disconnect(updater);
        }
        self.state = BindingState::Unbound;
    }

    fn disconnect(&mut self, updater: &Updater) {
        if self.state == BindingState::Disconnected {
            return;
        }
        self.current.disconnect(updater);
        for (_, mut binding) in self.cache.drain() {
            binding.disconnect(updater);
        }
        self.state = BindingState::Disconnected;
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if self.state == BindingState::Bound {
            self.current.collect_nodes(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::RenderError;
    use crate::testing::{drain, new_log, probe, Harness, Log};

    fn probe_choice(key: &'static str, log: &Log) -> Value {
        let log = log.clone();
        choice(key, move |key: &&'static str| probe(key, &log))
    }

    #[test]
    fn test_same_key_updates_in_place() {
        let harness = Harness::new();
        let log = new_log();
        let mut root = harness.render(probe_choice("a", &log));
        root.update(probe_choice("a", &log)).unwrap();
        assert_eq!(drain(&log), vec!["create a", "bind a"]);
    }

    #[test]
    fn test_key_change_reuses_cached_binding() {
        let harness = Harness::new();
        let log = new_log();
        let mut root = harness.render(probe_choice("a", &log));
        root.update(probe_choice("b", &log)).unwrap();
        assert_eq!(drain(&log), vec!["create a", "unbind a", "create b"]);

        root.update(probe_choice("a", &log)).unwrap();
        assert_eq!(drain(&log), vec!["unbind b", "bind a"]);

        root.unmount();
        assert_eq!(drain(&log), vec!["unbind a", "disconnect b", "disconnect a"]);
    }

    #[test]
    fn test_key_change_swaps_rendered_content() {
        let harness = Harness::new();
        let text = |key: &&'static str| Value::from(format!("[{key}]"));
        let mut root = harness.render(choice("x", text));
        insta::assert_snapshot!(harness.html(), @"[x]<!---->");

        root.update(choice("y", text)).unwrap();
        harness.flush();
        insta::assert_snapshot!(harness.html(), @"[y]<!---->");

        root.update(choice("x", text)).unwrap();
        harness.flush();
        insta::assert_snapshot!(harness.html(), @"[x]<!---->");
    }

    #[test]
    fn test_choice_kind_depends_on_key_type() {
        let by_str = choice("a", |_: &&str| Value::Null);
        let by_num = choice(1u32, |_: &u32| Value::Null);
        assert_ne!(by_str.kind(), by_num.kind());
        assert_eq!(by_str.kind(), choice("b", |_: &&str| Value::from(1)).kind());
    }

    #[test]
    fn test_failed_reuse_releases_cached_binding() {
        let harness = Harness::new();
        let broken = Rc::new(Cell::new(false));
        let pick = |key: u32| {
            let broken = broken.clone();
            choice(key, move |key: &u32| match key {
                1 if broken.get() => Value::handler(|_| {}),
                1 => Value::from("one"),
                _ => Value::from("two"),
            })
        };

        let mut root = harness.render(pick(1));
        root.update(pick(2)).unwrap();
        harness.flush();
        insta::assert_snapshot!(harness.html(), @"two<!---->");
        let nodes = harness.surface.document().node_count();

        broken.set(true);
        let error = root.update(pick(1)).unwrap_err();
        assert!(matches!(error, RenderError::UnsupportedValue { .. }));
        harness.flush();
        assert_eq!(root.binding().state(), BindingState::Unbound);
        assert_eq!(harness.surface.document().node_count(), nodes - 1);
        insta::assert_snapshot!(harness.html(), @"<!---->");

        broken.set(false);
        root.update(pick(2)).unwrap();
        harness.flush();
        assert_eq!(root.binding().state(), BindingState::Bound);
        insta::assert_snapshot!(harness.html(), @"two<!---->");
    }
}
