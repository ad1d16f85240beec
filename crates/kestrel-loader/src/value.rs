//! Runtime values, live bindings and module namespaces.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Signature of a host function callable from modules
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, String>;

/// A host function exposed to modules
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    /// Wrap a host closure
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + 'static,
    {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    /// Function name, used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the function
    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

/// A value stored in a module binding
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Function(NativeFunction),
}

impl Value {
    /// Build a string value
    pub fn string(s: &str) -> Self {
        Value::String(s.into())
    }

    /// Build a function value from a host closure
    pub fn function<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + 'static,
    {
        Value::Function(NativeFunction::new(name, func))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&NativeFunction> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Function(func) => write!(f, "[Function: {}]", func.name()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

/// A live binding: one mutable cell shared by the exporting module and
/// every module that imports it.
#[derive(Debug, Clone, Default)]
pub struct Binding(Rc<RefCell<Value>>);

impl Binding {
    pub fn new(value: Value) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Current value of the binding
    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    /// Overwrite the binding; visible through every alias
    pub fn set(&self, value: Value) {
        *self.0.borrow_mut() = value;
    }

    /// Whether both handles refer to the same cell
    pub fn ptr_eq(&self, other: &Binding) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// The resolved exported bindings of an evaluated module
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    bindings: Rc<BTreeMap<String, Binding>>,
}

impl Namespace {
    pub fn new(bindings: BTreeMap<String, Binding>) -> Self {
        Self {
            bindings: Rc::new(bindings),
        }
    }

    /// Read the current value of an export
    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).map(Binding::get)
    }

    /// The live binding behind an export
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Export names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// A host-provided name → value table, as handed out by a component
/// registry. Cloning shares the table.
#[derive(Debug, Clone, Default)]
pub struct HostNamespace {
    values: Rc<RefCell<BTreeMap<String, Value>>>,
}

impl HostNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(self, name: &str, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }

    /// All names currently in the table
    pub fn names(&self) -> Vec<String> {
        self.values.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}
