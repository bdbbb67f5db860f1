//! Values bound into parts.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use compact_str::CompactString;
use tessera_fresco::{Event, PropertyValue};

use crate::binding::Directive;
use crate::context::Context;
use crate::error::Result;
use crate::template::{Template, TemplateId};

/// Event handler value.
pub type Handler = Rc<dyn Fn(&Event)>;

/// A dynamic value of a template.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(CompactString),
    /// A nested template result
    Template(TemplateResult),
    /// A component rendered as its own block
    Component(ComponentValue),
    /// An event handler
    Handler(Handler),
    /// Opaque application data, compared by identity
    Data(Rc<dyn Any>),
    /// A directive customizing how it is bound
    Directive(Rc<dyn Directive>),
}

/// Kind a binding accepts without being replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Null, booleans, numbers, text, handlers and data
    Primitive,
    /// Template results
    Template,
    /// Components, per render function type
    Component(TypeId),
    /// Directives, per directive type
    Directive(TypeId),
}

impl Value {
    /// Create a handler value.
    pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
        Value::Handler(Rc::new(f))
    }

    /// Wrap application data.
    pub fn data<T: Any>(data: T) -> Self {
        Value::Data(Rc::new(data))
    }

    /// Create a component value.
    pub fn component(render: RenderFn, props: impl Into<Value>) -> Self {
        Value::Component(ComponentValue::new(render, props))
    }

    /// Kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Template(_) => ValueKind::Template,
            Value::Component(component) => ValueKind::Component(component.render.kind()),
            Value::Directive(directive) => ValueKind::Directive(directive.kind()),
            _ => ValueKind::Primitive,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Template(_) => "template",
            Value::Component(_) => "component",
            Value::Handler(_) => "handler",
            Value::Data(_) => "data",
            Value::Directive(directive) => directive.name(),
        }
    }

    /// Identity comparison.
    ///
    /// Scalars compare by value with `NaN` equal to itself and `0.0` distinct
    /// from `-0.0`; everything reference counted compares by pointer.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Template(a), Value::Template(b)) => {
                Rc::ptr_eq(&a.template, &b.template) && Rc::ptr_eq(&a.values, &b.values)
            }
            (Value::Component(a), Value::Component(b)) => {
                a.render.ptr_eq(&b.render) && Rc::ptr_eq(&a.props, &b.props)
            }
            (Value::Handler(a), Value::Handler(b)) => Rc::ptr_eq(a, b),
            (Value::Data(a), Value::Data(b)) => Rc::ptr_eq(a, b),
            (Value::Directive(a), Value::Directive(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Text content for scalar values. Null renders as empty text.
    pub fn to_text(&self) -> Option<CompactString> {
        match self {
            Value::Null => Some(CompactString::default()),
            Value::Bool(b) => Some(CompactString::new(if *b { "true" } else { "false" })),
            Value::Number(n) => Some(format_number(*n)),
            Value::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// Property value for scalar values.
    pub fn to_property(&self) -> Option<PropertyValue> {
        match self {
            Value::Null => Some(PropertyValue::Null),
            Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            Value::Number(n) => Some(PropertyValue::Number(*n)),
            Value::Text(text) => Some(PropertyValue::Text(text.clone())),
            _ => None,
        }
    }

    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text of a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Get a number value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Downcast application data.
    pub fn downcast_data<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Data(data) => data.downcast_ref(),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> CompactString {
    if n.is_nan() {
        CompactString::new("NaN")
    } else if n.is_infinite() {
        CompactString::new(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        compact_str::format_compact!("{}", n as i64)
    } else {
        compact_str::format_compact!("{}", n)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Text(text) => write!(f, "Text({text:?})"),
            Value::Template(result) => write!(
                f,
                "Template({:?}, {} values)",
                result.template.id(),
                result.values.len()
            ),
            Value::Component(_) => f.write_str("Component"),
            Value::Handler(_) => f.write_str("Handler"),
            Value::Data(_) => f.write_str("Data"),
            Value::Directive(directive) => write!(f, "Directive({})", directive.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(CompactString::new(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(CompactString::from(value))
    }
}

impl From<CompactString> for Value {
    fn from(value: CompactString) -> Self {
        Value::Text(value)
    }
}

impl From<TemplateResult> for Value {
    fn from(value: TemplateResult) -> Self {
        Value::Template(value)
    }
}

impl From<ComponentValue> for Value {
    fn from(value: ComponentValue) -> Self {
        Value::Component(value)
    }
}

impl From<Handler> for Value {
    fn from(value: Handler) -> Self {
        Value::Handler(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A template paired with the values of one render.
#[derive(Clone)]
pub struct TemplateResult {
    pub template: Rc<Template>,
    pub values: Rc<[Value]>,
}

impl TemplateResult {
    /// Pair a template with values.
    pub fn new(template: Rc<Template>, values: impl Into<Rc<[Value]>>) -> Self {
        Self {
            template,
            values: values.into(),
        }
    }

    /// Identity of the template.
    pub fn template_id(&self) -> TemplateId {
        self.template.id()
    }
}

impl fmt::Debug for TemplateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateResult")
            .field("template", &self.template.id())
            .field("values", &self.values)
            .finish()
    }
}

type RenderCallback = dyn Fn(&Value, &mut Context<'_>) -> Result<TemplateResult>;

/// A component render function.
///
/// Its kind is the type of the wrapped function, so the same closure
/// expression yields the same component kind on every render.
#[derive(Clone)]
pub struct RenderFn {
    func: Rc<RenderCallback>,
    kind: TypeId,
}

impl RenderFn {
    /// Wrap a render function.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Value, &mut Context<'_>) -> Result<TemplateResult> + 'static,
    {
        Self {
            func: Rc::new(func),
            kind: TypeId::of::<F>(),
        }
    }

    /// Invoke the render function.
    pub fn call(&self, props: &Value, cx: &mut Context<'_>) -> Result<TemplateResult> {
        (self.func)(props, cx)
    }

    /// Type of the wrapped function.
    pub fn kind(&self) -> TypeId {
        self.kind
    }

    /// Whether both wrap the same function instance.
    pub fn ptr_eq(&self, other: &RenderFn) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

/// A component: a render function and its props.
#[derive(Clone)]
pub struct ComponentValue {
    pub render: RenderFn,
    pub props: Rc<Value>,
}

impl ComponentValue {
    /// Create a component value.
    pub fn new(render: RenderFn, props: impl Into<Value>) -> Self {
        Self {
            render,
            props: Rc::new(props.into()),
        }
    }
}
