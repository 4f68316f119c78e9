use std::{fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{ast::ast::Node, errors::errors::ErrorImpl};

use super::types::{can_do_implicit_conversion, equal, FunctionType, Type, TypeWithName};

/// Keyword argument types of a call, in source order.
pub type KeywordTypes = IndexMap<String, Type>;

pub type OutTypeFn = fn(&[Type], &KeywordTypes) -> Result<Type, ErrorImpl>;
pub type GenericFn = fn(&[Type]) -> Result<Vec<FunctionType>, ErrorImpl>;

/// Anything that can appear in call position.
pub trait Callable: fmt::Debug {
    fn name(&self) -> &str;

    /// Resolves the result type of a call with the given argument types.
    fn dispatch(&self, args: &[Type], kwargs: &KeywordTypes) -> Result<Type, ErrorImpl>;

    fn is_method(&self) -> bool;

    /// The receiver type shared by every overload of a method.
    fn first_arg_type(&self) -> Option<Type>;

    /// Whether `value.name(...)` may resolve to this callable.
    fn accepts_self(&self, self_type: &Type) -> bool {
        self.is_method()
            && self
                .first_arg_type()
                .is_some_and(|first| fits(&first, self_type))
    }

    /// Binds explicit type arguments, as in `array.new<float>()`.
    fn instantiate(&self, _type_args: &[Type]) -> Result<Rc<dyn Callable>, ErrorImpl> {
        Err(ErrorImpl::NotGeneric {
            name: self.name().to_string(),
        })
    }
}

/// Whether an argument of type `argument` can be passed to a parameter
/// of type `param`. An uncertain parameter, at any depth, accepts anything.
pub fn fits(param: &Type, argument: &Type) -> bool {
    if !param.qualifier().accepts(argument.qualifier()) {
        return false;
    }

    match (param.peel(), argument.peel()) {
        (Type::Uncertain, _) => true,
        (Type::Array(p), Type::Array(a)) | (Type::Matrix(p), Type::Matrix(a)) => fits(p, a),
        (Type::Map(pk, pv), Type::Map(ak, av)) => fits(pk, ak) && fits(pv, av),
        (p, a) => equal(p, a) || can_do_implicit_conversion(a, p),
    }
}

fn match_argument_type(params: &[TypeWithName], args: &[Type], kwargs: &KeywordTypes) -> bool {
    if params.len() < args.len() + kwargs.len() {
        return false;
    }

    if !params.iter().zip(args).all(|(param, arg)| fits(&param.ty, arg)) {
        return false;
    }

    let mut remains: IndexMap<&str, &TypeWithName> = params[args.len()..]
        .iter()
        .map(|param| (param.name.as_str(), param))
        .collect();

    for (name, ty) in kwargs {
        match remains.shift_remove(name.as_str()) {
            Some(param) if fits(&param.ty, ty) => {}
            _ => return false,
        }
    }

    remains.values().all(|param| param.optional)
}

fn describe_arguments(args: &[Type], kwargs: &KeywordTypes) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .chain(kwargs.iter().map(|(name, ty)| format!("{}={}", name, ty)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Overload based callable. Builtins are registered this way, and so are
/// functions and methods declared in scripts.
#[derive(Debug, Clone, Default)]
pub struct BuiltinFunction {
    pub name: String,
    pub overloads: Vec<FunctionType>,
    /// Computes the result directly instead of matching overloads
    pub out_type: Option<OutTypeFn>,
    /// Produces overloads from explicit type arguments
    pub generic: Option<GenericFn>,
    pub self_type: Option<Type>,
    pub method: bool,
}

impl BuiltinFunction {
    pub fn new(name: &str) -> Self {
        BuiltinFunction {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn overload(mut self, params: Vec<TypeWithName>, out: Type) -> Self {
        self.overloads.push(FunctionType::new(params, out));
        self
    }

    pub fn with_out_type(mut self, out_type: OutTypeFn) -> Self {
        self.out_type = Some(out_type);
        self
    }

    pub fn with_generic(mut self, generic: GenericFn) -> Self {
        self.generic = Some(generic);
        self
    }

    pub fn with_self_type(mut self, self_type: Type) -> Self {
        self.self_type = Some(self_type);
        self
    }

    pub fn method(mut self) -> Self {
        self.method = true;
        self
    }
}

impl Callable for BuiltinFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn dispatch(&self, args: &[Type], kwargs: &KeywordTypes) -> Result<Type, ErrorImpl> {
        if let Some(out_type) = self.out_type {
            return out_type(args, kwargs);
        }

        if self.overloads.is_empty() {
            return Err(ErrorImpl::NoOverloads {
                name: self.name.clone(),
            });
        }

        self.overloads
            .iter()
            .find(|overload| match_argument_type(&overload.params, args, kwargs))
            .map(|overload| (*overload.out).clone())
            .ok_or_else(|| ErrorImpl::ArgumentMismatch {
                name: self.name.clone(),
                arguments: describe_arguments(args, kwargs),
            })
    }

    fn is_method(&self) -> bool {
        self.method
    }

    fn first_arg_type(&self) -> Option<Type> {
        if !self.method {
            return None;
        }

        if let Some(self_type) = &self.self_type {
            return Some(self_type.clone());
        }

        let mut first: Option<&Type> = None;
        for overload in &self.overloads {
            let param = &overload.params.first()?.ty;
            match first {
                Some(seen) if !equal(seen, param) => return None,
                _ => first = Some(param),
            }
        }

        first.cloned()
    }

    fn instantiate(&self, type_args: &[Type]) -> Result<Rc<dyn Callable>, ErrorImpl> {
        let Some(generic) = self.generic else {
            return Err(ErrorImpl::NotGeneric {
                name: self.name.clone(),
            });
        };

        Ok(Rc::new(BuiltinFunction {
            name: self.name.clone(),
            overloads: generic(type_args)?,
            out_type: None,
            generic: None,
            self_type: self.self_type.clone(),
            method: self.method,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct MacroArg {
    pub name: String,
    pub optional: bool,
}

pub type MacroFn = fn(Vec<Option<Node>>) -> Result<Node, ErrorImpl>;

/// A compile time function over syntax trees. Arguments are bound the
/// same way a call binds them, then handed to `expand` in parameter order.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub args: Vec<MacroArg>,
    pub expand: MacroFn,
}

impl Macro {
    pub fn call(&self, args: Vec<Node>, mut kwargs: IndexMap<String, Node>) -> Result<Node, ErrorImpl> {
        if args.len() + kwargs.len() > self.args.len() {
            return Err(ErrorImpl::MacroArgumentCount {
                name: self.name.clone(),
                expected: self.args.len(),
            });
        }

        let argc = args.len();
        let mut positional = args.into_iter();
        let mut bound = Vec::with_capacity(self.args.len());

        for (index, arg) in self.args.iter().enumerate() {
            if index < argc {
                bound.push(positional.next());
                continue;
            }

            match kwargs.shift_remove(&arg.name) {
                Some(node) => bound.push(Some(node)),
                None if arg.optional => bound.push(None),
                None => {
                    return Err(ErrorImpl::MacroArgumentMissing {
                        name: self.name.clone(),
                        argument: arg.name.clone(),
                    })
                }
            }
        }

        if let Some(unknown) = kwargs.keys().next() {
            return Err(ErrorImpl::MacroUnknownArgument {
                name: self.name.clone(),
                argument: unknown.clone(),
            });
        }

        (self.expand)(bound)
    }
}
