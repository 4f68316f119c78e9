use std::rc::Rc;

use indexmap::IndexMap;

use super::{
    callable::{Callable, Macro},
    types::{Type, TypeOrCtor},
};

/// A compile time constant carried by a namespace variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Na,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Channels in 0..=255, transparency in percent
    Color { r: u8, g: u8, b: u8, t: f64 },
    /// Only known while the script runs
    Runtime,
}

#[derive(Debug, Clone)]
pub struct ValueWithType {
    pub ty: Type,
    pub value: Value,
}

/// A named bundle of builtins. The type checker only reads namespaces,
/// except for the private one it fills with user declarations.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub callables: IndexMap<String, Rc<dyn Callable>>,
    pub macros: IndexMap<String, Macro>,
    pub variables: IndexMap<String, ValueWithType>,
    pub types: IndexMap<String, TypeOrCtor>,
    pub sub_namespaces: IndexMap<String, Rc<Namespace>>,
}

impl Namespace {
    pub fn new() -> Self {
        Namespace::default()
    }

    pub fn with_type(mut self, name: &str, ty: Type) -> Self {
        self.types.insert(name.to_string(), TypeOrCtor::Type(ty));
        self
    }

    pub fn with_ctor(mut self, toc: TypeOrCtor) -> Self {
        let name = match &toc {
            TypeOrCtor::Ctor { name, .. } => name.clone(),
            TypeOrCtor::Type(ty) => ty.to_string(),
        };
        self.types.insert(name, toc);
        self
    }

    pub fn with_function(mut self, callable: impl Callable + 'static) -> Self {
        self.callables
            .insert(callable.name().to_string(), Rc::new(callable));
        self
    }

    pub fn with_variable(mut self, name: &str, ty: Type, value: Value) -> Self {
        self.variables
            .insert(name.to_string(), ValueWithType { ty, value });
        self
    }

    pub fn with_macro(mut self, r#macro: Macro) -> Self {
        self.macros.insert(r#macro.name.clone(), r#macro);
        self
    }

    pub fn with_namespace(mut self, name: &str, namespace: Namespace) -> Self {
        self.sub_namespaces
            .insert(name.to_string(), Rc::new(namespace));
        self
    }

    pub fn register_type(&mut self, name: &str, ty: Type) {
        self.types.insert(name.to_string(), TypeOrCtor::Type(ty));
    }

    pub fn register_function(&mut self, callable: Rc<dyn Callable>) {
        self.callables.insert(callable.name().to_string(), callable);
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeOrCtor> {
        self.types.get(name)
    }

    pub fn find_variable_type(&self, name: &str) -> Option<&Type> {
        self.variables.get(name).map(|variable| &variable.ty)
    }

    pub fn find_variable(&self, name: &str) -> Option<&ValueWithType> {
        self.variables.get(name)
    }

    pub fn find_function(&self, name: &str) -> Option<Rc<dyn Callable>> {
        self.callables.get(name).cloned()
    }

    /// Finds a method by name whose receiver accepts `self_type`, searching
    /// this namespace first and then every sub namespace.
    pub fn find_method(&self, name: &str, self_type: &Type) -> Option<Rc<dyn Callable>> {
        if let Some(callable) = self.callables.get(name) {
            if callable.accepts_self(self_type) {
                return Some(Rc::clone(callable));
            }
        }

        self.sub_namespaces
            .values()
            .find_map(|namespace| namespace.find_method(name, self_type))
    }

    pub fn find_namespace(&self, name: &str) -> Option<Rc<Namespace>> {
        self.sub_namespaces.get(name).cloned()
    }

    pub fn find_macro(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }
}
