use std::{fmt::Display, rc::Rc};

use crate::errors::errors::ErrorImpl;

use super::{callable::Callable, namespace::Namespace, qualifiers::Qualifier};

/// Discriminant of a [`Type`]. The declaration order matters: range
/// checks such as [`TypeKind::is_normal`] compare kinds.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum TypeKind {
    Uncertain,
    Void,
    Bool,
    Int,
    Float,
    String,
    Color,
    Box,
    Point,
    Label,
    Line,
    LineFill,
    PolyLine,
    Table,

    Array,
    Matrix,
    Map,
    Struct,
    Tuple,
    Function,

    Union,
    Namespace,
    TypeOrCtor,
    Callable,
}

impl TypeKind {
    /// Kinds a variable can be inferred as.
    pub fn is_normal(&self) -> bool {
        *self > TypeKind::Void && *self < TypeKind::Function
    }

    pub fn is_primitive(&self) -> bool {
        *self <= TypeKind::Table
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeKind::Int | TypeKind::Float)
    }
}

/// A named slot of a struct or a function signature.
#[derive(Debug, Clone)]
pub struct TypeWithName {
    pub name: String,
    pub ty: Type,
    pub optional: bool,
}

impl TypeWithName {
    pub fn new(name: &str, ty: Type) -> Self {
        TypeWithName {
            name: name.to_string(),
            ty,
            optional: false,
        }
    }

    pub fn optional(name: &str, ty: Type) -> Self {
        TypeWithName {
            name: name.to_string(),
            ty,
            optional: true,
        }
    }
}

impl PartialEq for TypeWithName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && equal(&self.ty, &other.ty)
    }
}

impl Display for TypeWithName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

#[derive(Debug, Clone)]
pub struct FunctionType {
    pub params: Vec<TypeWithName>,
    pub out: Box<Type>,
}

impl FunctionType {
    pub fn new(params: Vec<TypeWithName>, out: Type) -> Self {
        FunctionType {
            params,
            out: Box::new(out),
        }
    }

    pub fn param_named(&self, name: &str) -> Option<&TypeWithName> {
        self.params.iter().find(|param| param.name == name)
    }
}

impl Display for FunctionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) => {}", join(&self.params, ", "), self.out)
    }
}

pub type TypeCtor = fn(&[Type]) -> Result<Type, ErrorImpl>;

/// Either a finished type or a constructor waiting for type arguments,
/// such as `array` in `array<int>`.
#[derive(Debug, Clone)]
pub enum TypeOrCtor {
    Type(Type),
    Ctor { name: String, ctor: TypeCtor },
}

impl TypeOrCtor {
    pub fn ctor(name: &str, ctor: TypeCtor) -> Self {
        TypeOrCtor::Ctor {
            name: name.to_string(),
            ctor,
        }
    }

    pub fn instantiate(&self, args: &[Type]) -> Result<Type, ErrorImpl> {
        match self {
            TypeOrCtor::Type(ty) => Err(ErrorImpl::NotATypeConstructor {
                name: ty.to_string(),
            }),
            TypeOrCtor::Ctor { ctor, .. } => ctor(args),
        }
    }
}

impl Display for TypeOrCtor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeOrCtor::Type(ty) => write!(f, "{}", ty),
            TypeOrCtor::Ctor { name, .. } => write!(f, "{}<...>", name),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Type {
    /// The type of `na`, or of anything not known yet
    Uncertain,
    Void,
    Bool,
    Int,
    Float,
    String,
    Color,
    Box,
    Point,
    Label,
    Line,
    LineFill,
    PolyLine,
    Table,

    Array(Box<Type>),
    Matrix(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Struct(Vec<TypeWithName>),
    Tuple(Vec<Type>),
    Function(FunctionType),
    Union(Vec<Type>),

    Namespace(Rc<Namespace>),
    TypeOrCtor(Box<TypeOrCtor>),
    Callable(Rc<dyn Callable>),

    Qualified(Qualifier, Box<Type>),
}

impl Type {
    pub fn array_of(item: Type) -> Type {
        Type::Array(Box::new(item))
    }

    pub fn matrix_of(unit: Type) -> Type {
        Type::Matrix(Box::new(unit))
    }

    pub fn map_of(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn function_of(params: Vec<TypeWithName>, out: Type) -> Type {
        Type::Function(FunctionType::new(params, out))
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Type::Uncertain => TypeKind::Uncertain,
            Type::Void => TypeKind::Void,
            Type::Bool => TypeKind::Bool,
            Type::Int => TypeKind::Int,
            Type::Float => TypeKind::Float,
            Type::String => TypeKind::String,
            Type::Color => TypeKind::Color,
            Type::Box => TypeKind::Box,
            Type::Point => TypeKind::Point,
            Type::Label => TypeKind::Label,
            Type::Line => TypeKind::Line,
            Type::LineFill => TypeKind::LineFill,
            Type::PolyLine => TypeKind::PolyLine,
            Type::Table => TypeKind::Table,
            Type::Array(_) => TypeKind::Array,
            Type::Matrix(_) => TypeKind::Matrix,
            Type::Map(_, _) => TypeKind::Map,
            Type::Struct(_) => TypeKind::Struct,
            Type::Tuple(_) => TypeKind::Tuple,
            Type::Function(_) => TypeKind::Function,
            Type::Union(_) => TypeKind::Union,
            Type::Namespace(_) => TypeKind::Namespace,
            Type::TypeOrCtor(_) => TypeKind::TypeOrCtor,
            Type::Callable(_) => TypeKind::Callable,
            Type::Qualified(_, inner) => inner.kind(),
        }
    }

    /// The type with every qualifier layer removed.
    pub fn peel(&self) -> &Type {
        match self {
            Type::Qualified(_, inner) => inner.peel(),
            other => other,
        }
    }

    pub fn qualifier(&self) -> Qualifier {
        match self {
            Type::Qualified(qualifier, _) => *qualifier,
            Type::Function(function) => function.out.qualifier(),
            _ => Qualifier::NoQualifier,
        }
    }

    /// Rewraps the shape of `self` with `qualifier`. `NoQualifier` strips it.
    pub fn with_qualifier(&self, qualifier: Qualifier) -> Type {
        let shape = self.peel().clone();
        match qualifier {
            Qualifier::NoQualifier => shape,
            _ => Type::Qualified(qualifier, Box::new(shape)),
        }
    }

    /// Item of an array, or the row type of a matrix.
    pub fn unit(&self) -> Option<Type> {
        match self.peel() {
            Type::Array(item) => Some((**item).clone()),
            Type::Matrix(unit) => Some(Type::array_of((**unit).clone())),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&Type> {
        match self.peel() {
            Type::Map(key, _) => Some(key),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Type> {
        match self.peel() {
            Type::Map(_, value) => Some(value),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&[TypeWithName]> {
        match self.peel() {
            Type::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&TypeWithName> {
        self.fields()?.iter().find(|field| field.name == name)
    }

    pub fn items(&self) -> Option<&[Type]> {
        match self.peel() {
            Type::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn members(&self) -> Option<&[Type]> {
        match self.peel() {
            Type::Union(members) => Some(members),
            _ => None,
        }
    }

    /// Fields of a struct, items of a tuple or parameters of a function.
    pub fn count(&self) -> Option<usize> {
        match self.peel() {
            Type::Struct(fields) => Some(fields.len()),
            Type::Tuple(items) => Some(items.len()),
            Type::Function(function) => Some(function.params.len()),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self.peel() {
            Type::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Rc<dyn Callable>> {
        match self.peel() {
            Type::Callable(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&Rc<Namespace>> {
        match self.peel() {
            Type::Namespace(namespace) => Some(namespace),
            _ => None,
        }
    }

    /// Bool, or anything that converts to it.
    pub fn is_bool_like(&self) -> bool {
        self.kind() == TypeKind::Bool || can_do_implicit_conversion(self, &Type::Bool)
    }
}

/// Structural equality. Qualifiers are ignored, names of struct fields
/// and function parameters are not.
pub fn equal(t1: &Type, t2: &Type) -> bool {
    let (t1, t2) = (t1.peel(), t2.peel());

    if t1.kind() != t2.kind() {
        return false;
    }

    if t1.kind().is_primitive() {
        return true;
    }

    match (t1, t2) {
        (Type::Array(a), Type::Array(b)) | (Type::Matrix(a), Type::Matrix(b)) => equal(a, b),
        (Type::Map(k1, v1), Type::Map(k2, v2)) => equal(k1, k2) && equal(v1, v2),
        (Type::Struct(f1), Type::Struct(f2)) => f1 == f2,
        (Type::Tuple(i1), Type::Tuple(i2)) => {
            i1.len() == i2.len() && i1.iter().zip(i2).all(|(a, b)| equal(a, b))
        }
        (Type::Function(f1), Type::Function(f2)) => equal(&f1.out, &f2.out) && f1.params == f2.params,
        (Type::Union(m1), Type::Union(m2)) => {
            m1.len() == m2.len() && m1.iter().all(|a| m2.iter().any(|b| equal(a, b)))
        }
        (Type::Namespace(a), Type::Namespace(b)) => Rc::ptr_eq(a, b),
        (Type::Callable(a), Type::Callable(b)) => Rc::ptr_eq(a, b),
        (Type::TypeOrCtor(a), Type::TypeOrCtor(b)) => match (a.as_ref(), b.as_ref()) {
            (TypeOrCtor::Type(a), TypeOrCtor::Type(b)) => equal(a, b),
            _ => false,
        },
        _ => false,
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        equal(self, other)
    }
}

/// Whether a value of type `from` may be used where `to` is expected
/// without an explicit cast.
pub fn can_do_implicit_conversion(from: &Type, to: &Type) -> bool {
    if to.kind() == TypeKind::Union {
        return false;
    }

    if let Some(members) = from.members() {
        return members.iter().all(|member| can_do_implicit_conversion(member, to));
    }

    match (from.kind(), to.kind()) {
        (TypeKind::Uncertain, TypeKind::Uncertain | TypeKind::Void) => false,
        (TypeKind::Uncertain, _) => true,
        (TypeKind::Int | TypeKind::Float, TypeKind::Bool) => true,
        (TypeKind::Int, TypeKind::Float) => true,
        _ => false,
    }
}

/// Flattens nested unions and collapses duplicates. A single distinct
/// member is returned as is.
pub fn union_of(types: Vec<Type>) -> Result<Type, ErrorImpl> {
    let mut members: Vec<Type> = vec![];

    let mut append = |ty: Type| {
        if !members.iter().any(|member| equal(member, &ty)) {
            members.push(ty);
        }
    };

    for ty in types {
        match ty.members().map(|nested| nested.to_vec()) {
            Some(nested) => nested.into_iter().for_each(&mut append),
            None => append(ty),
        }
    }

    match members.len() {
        0 => Err(ErrorImpl::EmptyUnion),
        1 => Ok(members.remove(0)),
        _ => Ok(Type::Union(members)),
    }
}

fn join<T: Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Uncertain => write!(f, "uncertain"),
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Color => write!(f, "color"),
            Type::Box => write!(f, "box"),
            Type::Point => write!(f, "chart.point"),
            Type::Label => write!(f, "label"),
            Type::Line => write!(f, "line"),
            Type::LineFill => write!(f, "linefill"),
            Type::PolyLine => write!(f, "polyline"),
            Type::Table => write!(f, "table"),
            Type::Array(item) => write!(f, "array<{}>", item),
            Type::Matrix(unit) => write!(f, "matrix<{}>", unit),
            Type::Map(key, value) => write!(f, "map<{}, {}>", key, value),
            Type::Struct(fields) => write!(f, "{{{}}}", join(fields, "; ")),
            Type::Tuple(items) => write!(f, "[{}]", join(items, ", ")),
            Type::Function(function) => write!(f, "{}", function),
            Type::Union(members) => write!(f, "{}", join(members, " | ")),
            Type::Namespace(_) => write!(f, "namespace"),
            Type::TypeOrCtor(toc) => write!(f, "{}", toc),
            Type::Callable(callable) => write!(f, "function {}", callable.name()),
            Type::Qualified(qualifier, inner) => match qualifier {
                Qualifier::NoQualifier => write!(f, "{}", inner),
                _ => write!(f, "{} {}", qualifier, inner),
            },
        }
    }
}
