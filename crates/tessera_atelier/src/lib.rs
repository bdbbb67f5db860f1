//! Atelier - The reconciliation workshop for Tessera.
//!
//! Atelier turns template results into live node trees and keeps them in
//! sync as values change:
//!
//! - **Templates**: static strings of a call site, parsed once per [`Scope`]
//! - **Parts and bindings**: one [`Binding`] per dynamic slot, replaced only
//!   when the kind of value changes
//! - **Blocks**: component instances with props, hooks and a template cache
//! - **Updater**: batches block renders and tree mutations into flush ticks
//! - **Directives**: keyed choice, conditions and raw markup
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use tessera_atelier::{html, ManualScheduler, Root, Scope, Updater};
//! use tessera_fresco::Surface;
//!
//! let surface = Surface::new();
//! let updater = Updater::new(surface.clone(), Rc::new(Scope::default()), Rc::new(ManualScheduler));
//! let greeting = |name: &str| html!(updater.scope(), ["<p>Hello, ", "!</p>"], name);
//!
//! let mut root = Root::render(greeting("world")?, surface.root(), &updater)?;
//! updater.flush()?;
//! assert_eq!(surface.inner_html(surface.root()), "<p>Hello, world<!---->!</p><!---->");
//!
//! root.update(greeting("Tessera")?)?;
//! updater.flush()?;
//! assert_eq!(surface.inner_html(surface.root()), "<p>Hello, Tessera<!---->!</p><!---->");
//! # Ok::<(), tessera_atelier::RenderError>(())
//! ```

pub mod binding;
mod block;
mod context;
pub mod directives;
mod error;
mod hooks;
mod mount_point;
mod part;
mod root;
mod scheduler;
mod scope;
mod template;
mod updater;
mod value;

#[cfg(test)]
mod testing;

pub use binding::{create_binding, update_binding, Binding, BindingState, Directive};
pub use block::{Block, BlockBinding, BlockId};
pub use context::Context;
pub use directives::{
    choice, condition, unless, unsafe_html, unsafe_svg, when, Branch, Predicate,
};
pub use error::{RenderError, Result};
pub use hooks::{Cleanup, StateHandle};
pub use mount_point::MountPoint;
pub use part::Part;
pub use root::Root;
pub use scheduler::{HostScheduler, ManualScheduler, Task, TaskQueue};
pub use scope::{Scope, ScopeOptions};
pub use template::{Skeleton, Template, TemplateId};
pub use updater::{Effect, FlushSummary, Updater, WeakUpdater};
pub use value::{ComponentValue, Handler, RenderFn, TemplateResult, Value, ValueKind};

/// Build a [`TemplateResult`] from static strings and values.
///
/// Every invocation site gets its own [`Skeleton`], so the template is parsed
/// once per site. The first argument is anything with a `create_template`
/// method: a [`Context`] inside render functions or a [`Scope`] outside.
///
/// ```
/// # use tessera_atelier::{html, Scope};
/// let scope = Scope::default();
/// let result = html!(scope, ["<a href=", ">", "</a>"], "/docs", "Docs")?;
/// assert_eq!(result.template.descriptors().len(), 2);
/// # Ok::<(), tessera_atelier::RenderError>(())
/// ```
#[macro_export]
macro_rules! html {
    ($cx:expr, [$($s:literal),+ $(,)?] $(, $value:expr)* $(,)?) => {{
        static SKELETON: $crate::Skeleton = $crate::Skeleton::new(&[$($s),+]);
        $cx.create_template(&SKELETON, ::std::vec![$($crate::Value::from($value)),*])
    }};
}
