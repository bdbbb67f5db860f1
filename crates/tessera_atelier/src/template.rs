//! Templates: parsed skeletons that can be mounted and patched.

use std::rc::Rc;

use tessera_relief::{ParsedTemplate, PartDescriptor};

use crate::binding::{create_binding, update_binding, Binding};
use crate::error::{RenderError, Result};
use crate::mount_point::MountPoint;
use crate::part::Part;
use crate::updater::Updater;
use crate::value::Value;

/// The static strings of one template call site.
///
/// Declare it as a `static` so its address identifies the call site; the
/// [`html!`](crate::html) macro does this for every invocation.
#[derive(Debug)]
pub struct Skeleton {
    strings: &'static [&'static str],
}

impl Skeleton {
    /// Wrap the static strings of a call site.
    pub const fn new(strings: &'static [&'static str]) -> Self {
        Self { strings }
    }

    /// The static strings.
    pub fn strings(&self) -> &'static [&'static str] {
        self.strings
    }

    /// Identity of the call site.
    pub(crate) fn key(&'static self) -> usize {
        self as *const Skeleton as usize
    }
}

/// Identity of a parsed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub(crate) u32);

/// An immutable parsed template.
#[derive(Debug)]
pub struct Template {
    id: TemplateId,
    parsed: ParsedTemplate,
}

impl Template {
    pub(crate) fn new(id: TemplateId, parsed: ParsedTemplate) -> Self {
        Self { id, parsed }
    }

    /// Template identity.
    pub fn id(&self) -> TemplateId {
        self.id
    }

    /// Parsed skeleton and descriptors.
    pub fn parsed(&self) -> &ParsedTemplate {
        &self.parsed
    }

    /// Part descriptors in source order.
    pub fn descriptors(&self) -> &[PartDescriptor] {
        &self.parsed.descriptors
    }

    fn check_values(&self, actual: usize) -> Result<()> {
        let expected = self.parsed.descriptors.len();
        if expected != actual {
            return Err(RenderError::ValueCountMismatch { expected, actual });
        }
        Ok(())
    }

    /// Build a fresh detached tree and bind every value into its part.
    pub fn mount(self: &Rc<Self>, values: Rc<[Value]>, updater: &Updater) -> Result<MountPoint> {
        self.check_values(values.len())?;

        let surface = updater.surface();
        let fragment = surface.create_fragment();
        let nodes = surface.instantiate(fragment, &self.parsed.nodes);

        let mut bindings: Vec<Box<dyn Binding>> = Vec::with_capacity(values.len());
        for (index, (descriptor, value)) in self.parsed.descriptors.iter().zip(values.iter()).enumerate() {
            let binding = surface
                .child_at_path(fragment, &descriptor.path)
                .ok_or(RenderError::MissingNode { index })
                .and_then(|node| {
                    create_binding(Part::from_descriptor(descriptor, node), value.clone(), updater)
                });
            match binding {
                Ok(binding) => bindings.push(binding),
                Err(error) => {
                    for binding in &mut bindings {
                        binding.disconnect(updater);
                    }
                    updater.enqueue_mutation_effect(move |u| u.surface().destroy(fragment));
                    return Err(error);
                }
            }
        }

        Ok(MountPoint::new(self.clone(), fragment, nodes, bindings, values))
    }

    /// Update bindings in place, skipping values identical to the old ones.
    pub fn patch(
        &self,
        bindings: &mut [Box<dyn Binding>],
        old: &[Value],
        new: &[Value],
        updater: &Updater,
    ) -> Result<()> {
        self.check_values(new.len())?;
        self.check_values(bindings.len())?;

        for (index, binding) in bindings.iter_mut().enumerate() {
            let value = &new[index];
            if old.get(index).is_some_and(|old| old.is_same(value)) {
                continue;
            }
            update_binding(binding, value.clone(), updater, false)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tessera_fresco::PropertyValue;

    use super::*;
    use crate::html;
    use crate::root::Root;
    use crate::scope::Scope;
    use crate::directives::choice;
    use crate::testing::{drain, new_log, probe, Harness};
    use crate::value::TemplateResult;

    static LABEL: Skeleton = Skeleton::new(&["<span>", "</span>"]);

    fn card(scope: &Scope, title: &str, count: i32) -> TemplateResult {
        let class = if count > 0 { "full" } else { "empty" };
        html!(
            scope,
            ["<section><h1>", "</h1><p class=", ">", " items</p></section>"],
            title,
            class,
            count
        )
        .unwrap()
    }

    fn slot(scope: &Scope, content: Value) -> TemplateResult {
        html!(scope, ["<div>", "</div>"], content).unwrap()
    }

    #[test]
    fn test_mount_then_patch_matches_fresh_mount() {
        let patched = Harness::new();
        let mut root = patched.render(card(patched.updater.scope(), "one", 0));
        root.update(card(patched.updater.scope(), "two", 3)).unwrap();
        patched.flush();

        let fresh = Harness::new();
        fresh.render(card(fresh.updater.scope(), "two", 3));

        assert_eq!(patched.html(), fresh.html());
        insta::assert_snapshot!(
            fresh.html(),
            @r#"<section><h1>two<!----></h1><p class="full">3<!----> items</p></section><!---->"#
        );
    }

    #[test]
    fn test_identical_values_skip_bindings() {
        let harness = Harness::new();
        let mut root = harness.render(card(harness.updater.scope(), "same", 2));
        harness.surface.reset_stats();

        root.update(card(harness.updater.scope(), "same", 2)).unwrap();
        harness.flush();
        assert_eq!(harness.surface.stats().mutations(), 0);

        root.update(card(harness.updater.scope(), "same", 5)).unwrap();
        harness.flush();
        assert_eq!(harness.surface.stats().texts, 1);
        assert_eq!(harness.surface.stats().attributes, 0);
    }

    #[test]
    fn test_binding_replaced_on_kind_change() {
        let harness = Harness::new();
        let scope = harness.updater.scope().clone();
        let mut root = harness.render(slot(&scope, Value::from("plain")));
        insta::assert_snapshot!(harness.html(), @"<div>plain<!----></div><!---->");

        let nested = scope.create_template(&LABEL, vec![Value::from("nested")]).unwrap();
        root.update(slot(&scope, nested.into())).unwrap();
        harness.flush();
        insta::assert_snapshot!(harness.html(), @"<div><span>nested<!----></span><!----></div><!---->");

        root.update(slot(&scope, Value::from(7))).unwrap();
        harness.flush();
        insta::assert_snapshot!(harness.html(), @"<div>7<!----></div><!---->");
    }

    #[test]
    fn test_replaced_binding_released_before_new_one_is_created() {
        let harness = Harness::new();
        let scope = harness.updater.scope().clone();
        let log = new_log();
        let mut root = harness.render(slot(&scope, probe("a", &log)));
        assert_eq!(drain(&log), ["create a"]);

        root.update(slot(&scope, probe("a2", &log))).unwrap();
        assert_eq!(drain(&log), ["bind a2"]);

        let factory_log = log.clone();
        let keyed = choice(1, move |_: &i32| {
            factory_log.borrow_mut().push("build b".to_owned());
            probe("b", &factory_log)
        });
        root.update(slot(&scope, keyed)).unwrap();
        assert_eq!(
            drain(&log),
            ["unbind a2", "disconnect a2", "build b", "create b"]
        );
    }

    #[test]
    fn test_nested_template_switch_disposes_previous() {
        static OTHER: Skeleton = Skeleton::new(&["<em>", "</em>"]);
        let harness = Harness::new();
        let scope = harness.updater.scope().clone();
        let first = scope.create_template(&LABEL, vec![Value::from("a")]).unwrap();
        let mut root = harness.render(first);

        let second = scope.create_template(&OTHER, vec![Value::from("b")]).unwrap();
        root.update(second).unwrap();
        harness.flush();
        insta::assert_snapshot!(harness.html(), @"<em>b<!----></em><!---->");
    }

    #[test]
    fn test_value_count_mismatch() {
        let harness = Harness::new();
        let template = harness.updater.scope().template(&LABEL).unwrap();
        let result = TemplateResult::new(template, Vec::new());
        let error = Root::render(result, harness.container, &harness.updater)
            .err()
            .unwrap();
        assert_eq!(
            error,
            RenderError::ValueCountMismatch {
                expected: 1,
                actual: 0
            }
        );
        harness.flush();
        assert_eq!(harness.html(), "");
    }

    #[test]
    fn test_element_parts() {
        let harness = Harness::new();
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let on_click = Value::handler(move |_| counter.set(counter.get() + 1));

        let button = |disabled: bool, handler: Value, label: &str| {
            html!(
                harness.updater.scope(),
                ["<button title=", " .disabled=", " @click=", ">", "</button>"],
                disabled.then_some("off"),
                disabled,
                handler,
                label
            )
            .unwrap()
        };

        let mut root = harness.render(button(true, on_click.clone(), "Go"));
        insta::assert_snapshot!(harness.html(), @r#"<button title="off">Go<!----></button><!---->"#);
        let node = harness.surface.children(harness.container)[0];
        assert_eq!(
            harness.surface.get_property(node, "disabled"),
            Some(PropertyValue::Bool(true))
        );
        assert_eq!(harness.surface.dispatch(node, "click"), 1);
        assert_eq!(clicks.get(), 1);

        let other = Value::handler(|_| {});
        root.update(button(false, other, "Go")).unwrap();
        harness.flush();
        insta::assert_snapshot!(harness.html(), @"<button>Go<!----></button><!---->");
        assert_eq!(harness.surface.listener_count(node, "click"), 1);
        harness.surface.dispatch(node, "click");
        assert_eq!(clicks.get(), 1);

        root.update(button(false, Value::Null, "Go")).unwrap();
        harness.flush();
        assert_eq!(harness.surface.listener_count(node, "click"), 0);
    }
}
