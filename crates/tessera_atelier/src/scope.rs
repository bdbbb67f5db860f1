//! Scope: the template cache and the variable side table.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use tessera_armature::parse_template;
use tessera_relief::ParserOptions;

use crate::block::{Block, BlockId};
use crate::error::Result;
use crate::template::{Skeleton, Template, TemplateId};
use crate::value::{TemplateResult, Value};

type Variables = FxHashMap<CompactString, Value>;

/// Options of a [`Scope`].
#[derive(Debug, Clone, Default)]
pub struct ScopeOptions {
    /// Options for parsing cached templates
    pub parser: ParserOptions,
}

/// Shared engine state of one render tree.
///
/// Templates are parsed once per call site and cached for the lifetime of
/// the scope. Block variables live in a side table keyed by block id and are
/// released when the block is dropped.
#[derive(Default)]
pub struct Scope {
    options: ScopeOptions,
    globals: RefCell<Variables>,
    locals: RefCell<FxHashMap<BlockId, Variables>>,
    templates: RefCell<FxHashMap<usize, Rc<Template>>>,
    next_template: Cell<u32>,
    next_block: Cell<u64>,
}

impl Scope {
    pub fn new(options: ScopeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn parser_options(&self) -> &ParserOptions {
        &self.options.parser
    }

    /// Look a variable up on `owner`, its ancestors, then the globals.
    pub fn get_variable(&self, owner: Option<&Block>, key: &str) -> Option<Value> {
        if let Some(owner) = owner {
            let locals = self.locals.borrow();
            if let Some(value) = locals.get(&owner.id()).and_then(|vars| vars.get(key)) {
                return Some(value.clone());
            }
            let mut parent = owner.parent();
            while let Some(block) = parent {
                if let Some(value) = locals.get(&block.id()).and_then(|vars| vars.get(key)) {
                    return Some(value.clone());
                }
                parent = block.parent();
            }
        }
        self.globals.borrow().get(key).cloned()
    }

    /// Set a variable on `owner`, or a global when there is no owner.
    pub fn set_variable(&self, owner: Option<&Block>, key: &str, value: Value) {
        let previous = match owner {
            Some(owner) => self
                .locals
                .borrow_mut()
                .entry(owner.id())
                .or_default()
                .insert(CompactString::new(key), value),
            None => self.globals.borrow_mut().insert(CompactString::new(key), value),
        };
        drop(previous);
    }

    /// Parsed template of a call site, parsing it on first use.
    pub fn template(&self, skeleton: &'static Skeleton) -> Result<Rc<Template>> {
        let key = skeleton.key();
        if let Some(template) = self.templates.borrow().get(&key) {
            return Ok(template.clone());
        }

        let parsed = parse_template(skeleton.strings(), &self.options.parser)?;
        let id = TemplateId(self.next_template.get());
        self.next_template.set(id.0 + 1);
        tracing::debug!(
            "template cache miss: {:?} with {} parts",
            id,
            parsed.descriptors.len()
        );

        let template = Rc::new(Template::new(id, parsed));
        self.templates.borrow_mut().insert(key, template.clone());
        Ok(template)
    }

    /// Pair the cached template of a call site with values.
    pub fn create_template(
        &self,
        skeleton: &'static Skeleton,
        values: Vec<Value>,
    ) -> Result<TemplateResult> {
        Ok(TemplateResult::new(self.template(skeleton)?, values))
    }

    /// Number of cached templates.
    pub fn template_count(&self) -> usize {
        self.templates.borrow().len()
    }

    pub(crate) fn next_block_id(&self) -> BlockId {
        let id = self.next_block.get() + 1;
        self.next_block.set(id);
        BlockId(id)
    }

    /// Release the variables of a dropped block.
    pub(crate) fn release(&self, block: BlockId) {
        let released = self.locals.borrow_mut().remove(&block);
        drop(released);
    }

    #[cfg(test)]
    pub(crate) fn local_count(&self) -> usize {
        self.locals.borrow().len()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("options", &self.options)
            .field("globals", &self.globals.borrow().len())
            .field("templates", &self.templates.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tessera_fresco::Surface;

    use super::*;
    use crate::context::Context;
    use crate::part::Part;
    use crate::value::RenderFn;

    static GREETING: Skeleton = Skeleton::new(&["<p>Hello, ", "!</p>"]);
    static BROKEN: Skeleton = Skeleton::new(&["<p ", "></p>"]);

    #[test]
    fn test_template_cache_idempotent() {
        let scope = Scope::default();
        let first = scope.template(&GREETING).unwrap();
        let second = scope.template(&GREETING).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(scope.template_count(), 1);
        assert_eq!(first.descriptors().len(), 1);
    }

    #[test]
    fn test_same_strings_different_call_sites() {
        static OTHER: Skeleton = Skeleton::new(&["<p>Hello, ", "!</p>"]);
        let scope = Scope::default();
        let a = scope.template(&GREETING).unwrap();
        let b = scope.template(&OTHER).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_parse_error_not_cached() {
        let scope = Scope::default();
        assert!(scope.template(&BROKEN).is_err());
        assert_eq!(scope.template_count(), 0);
    }

    #[test]
    fn test_create_template_checks_nothing_until_mount() {
        let scope = Scope::default();
        let result = scope.create_template(&GREETING, vec![]).unwrap();
        assert_eq!(result.values.len(), 0);
        assert_eq!(result.template.descriptors().len(), 1);
    }

    #[test]
    fn test_globals_last_write_wins() {
        let scope = Scope::default();
        assert!(scope.get_variable(None, "theme").is_none());
        scope.set_variable(None, "theme", Value::from("light"));
        scope.set_variable(None, "theme", Value::from("dark"));
        let value = scope.get_variable(None, "theme").unwrap();
        assert_eq!(value.as_text(), Some("dark"));
    }

    #[test]
    fn test_block_variables_released_on_drop() {
        let scope = Rc::new(Scope::default());
        let anchor = Surface::new().create_comment("");
        let render = RenderFn::new(|_: &Value, cx: &mut Context<'_>| {
            cx.create_template(&GREETING, vec![Value::from("x")])
        });
        let block = Block::new(
            render,
            Rc::new(Value::Null),
            Part::ChildNode { anchor },
            None,
            scope.clone(),
        );
        scope.set_variable(Some(&*block), "user", Value::from("ada"));
        scope.set_variable(None, "theme", Value::from("dark"));
        assert_eq!(scope.local_count(), 1);
        assert!(scope.get_variable(Some(&*block), "user").is_some());

        drop(block);
        assert_eq!(scope.local_count(), 0);
        assert!(scope.get_variable(None, "user").is_none());
        assert!(scope.get_variable(None, "theme").is_some());
    }
}
