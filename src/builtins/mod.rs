//! The default global namespace scripts are checked against.
//!
//! It publishes the primitive types, the `array`, `map` and `matrix`
//! constructors, the price series of the current bar and a handful of
//! library namespaces (`chart`, `color`, `math`, `array`).

use crate::{
    ast::ast::{Node, NodeKind},
    errors::errors::ErrorImpl,
    types::{
        callable::{BuiltinFunction, KeywordTypes, Macro, MacroArg},
        namespace::{Namespace, Value},
        qualifiers::Qualifier,
        types::{can_do_implicit_conversion, equal, FunctionType, Type, TypeKind, TypeOrCtor, TypeWithName},
    },
};


fn expect_type_args(name: &str, args: &[Type], expected: usize) -> Result<(), ErrorImpl> {
    if args.len() != expected {
        return Err(ErrorImpl::TypeArgumentCount {
            name: name.to_string(),
            expected,
            received: args.len(),
        });
    }
    Ok(())
}

fn array_ctor(args: &[Type]) -> Result<Type, ErrorImpl> {
    expect_type_args("array", args, 1)?;
    Ok(Type::array_of(args[0].clone()))
}

fn map_ctor(args: &[Type]) -> Result<Type, ErrorImpl> {
    expect_type_args("map", args, 2)?;
    Ok(Type::map_of(args[0].clone(), args[1].clone()))
}

fn matrix_ctor(args: &[Type]) -> Result<Type, ErrorImpl> {
    expect_type_args("matrix", args, 1)?;
    Ok(Type::matrix_of(args[0].clone()))
}

fn series(ty: Type) -> Type {
    ty.with_qualifier(Qualifier::Series)
}

fn argument_mismatch(name: &str, args: &[Type], kwargs: &KeywordTypes) -> ErrorImpl {
    ErrorImpl::ArgumentMismatch {
        name: name.to_string(),
        arguments: args
            .iter()
            .map(|arg| arg.to_string())
            .chain(kwargs.iter().map(|(name, ty)| format!("{}={}", name, ty)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// `math.max` and `math.min`: two or more numbers, int only if all are.
fn numeric_extreme(name: &str, args: &[Type], kwargs: &KeywordTypes) -> Result<Type, ErrorImpl> {
    if args.len() < 2 || !kwargs.is_empty() || !args.iter().all(|arg| arg.kind().is_numeric()) {
        return Err(argument_mismatch(name, args, kwargs));
    }

    let qualifier = args
        .iter()
        .fold(Qualifier::NoQualifier, |qualifier, arg| qualifier.join(arg.qualifier()));

    let out = match args.iter().all(|arg| arg.kind() == TypeKind::Int) {
        true => Type::Int,
        false => Type::Float,
    };
    Ok(out.with_qualifier(qualifier))
}

fn abs_out(args: &[Type], kwargs: &KeywordTypes) -> Result<Type, ErrorImpl> {
    match args {
        [number] if kwargs.is_empty() && number.kind().is_numeric() => Ok(number.clone()),
        _ => Err(argument_mismatch("abs", args, kwargs)),
    }
}

fn max_out(args: &[Type], kwargs: &KeywordTypes) -> Result<Type, ErrorImpl> {
    numeric_extreme("max", args, kwargs)
}

fn min_out(args: &[Type], kwargs: &KeywordTypes) -> Result<Type, ErrorImpl> {
    numeric_extreme("min", args, kwargs)
}

fn math_namespace() -> Namespace {
    Namespace::new()
        .with_variable("pi", Type::Float, Value::Float(std::f64::consts::PI))
        .with_variable("e", Type::Float, Value::Float(std::f64::consts::E))
        .with_function(BuiltinFunction::new("abs").with_out_type(abs_out))
        .with_function(BuiltinFunction::new("max").with_out_type(max_out))
        .with_function(BuiltinFunction::new("min").with_out_type(min_out))
}

/// `array.new<T>(size, initial_value)`
fn new_array(type_args: &[Type]) -> Result<Vec<FunctionType>, ErrorImpl> {
    expect_type_args("array.new", type_args, 1)?;
    let item = type_args[0].clone();

    Ok(vec![FunctionType::new(
        vec![
            TypeWithName::optional("size", Type::Int),
            TypeWithName::optional("initial_value", item.clone()),
        ],
        Type::array_of(item),
    )])
}

fn receiver_item(name: &str, args: &[Type], kwargs: &KeywordTypes) -> Result<Type, ErrorImpl> {
    args.first()
        .and_then(Type::unit)
        .ok_or_else(|| argument_mismatch(name, args, kwargs))
}

fn push_out(args: &[Type], kwargs: &KeywordTypes) -> Result<Type, ErrorImpl> {
    let item = receiver_item("push", args, kwargs)?;
    match args.get(1) {
        Some(value)
            if args.len() == 2
                && (equal(&item, value) || can_do_implicit_conversion(value, &item)) =>
        {
            Ok(Type::Void)
        }
        _ => Err(argument_mismatch("push", args, kwargs)),
    }
}

fn get_out(args: &[Type], kwargs: &KeywordTypes) -> Result<Type, ErrorImpl> {
    let item = receiver_item("get", args, kwargs)?;
    match args.get(1) {
        Some(index) if args.len() == 2 && index.kind() == TypeKind::Int => {
            Ok(item.with_qualifier(args[0].qualifier().join(index.qualifier())))
        }
        _ => Err(argument_mismatch("get", args, kwargs)),
    }
}

fn array_namespace() -> Namespace {
    let any_array = Type::array_of(Type::Uncertain);

    Namespace::new()
        .with_function(BuiltinFunction::new("new").with_generic(new_array))
        .with_function(
            BuiltinFunction::new("push")
                .with_out_type(push_out)
                .with_self_type(any_array.clone())
                .method(),
        )
        .with_function(
            BuiltinFunction::new("get")
                .with_out_type(get_out)
                .with_self_type(any_array.clone())
                .method(),
        )
        .with_function(
            BuiltinFunction::new("size")
                .overload(vec![TypeWithName::new("id", any_array)], Type::Int)
                .method(),
        )
}

fn chart_namespace() -> Namespace {
    Namespace::new().with_type("point", Type::Point)
}

fn color_namespace() -> Namespace {
    let constant = |r, g, b| Value::Color { r, g, b, t: 0.0 };

    Namespace::new()
        .with_variable("red", Type::Color, constant(0xF2, 0x36, 0x45))
        .with_variable("green", Type::Color, constant(0x4C, 0xAF, 0x50))
        .with_variable("blue", Type::Color, constant(0x21, 0x96, 0xF3))
        .with_variable("white", Type::Color, constant(0xFF, 0xFF, 0xFF))
        .with_variable("black", Type::Color, constant(0x36, 0x3A, 0x45))
}

/// `iff(condition, then, otherwise)` rewrites to a ternary expression.
fn expand_iff(args: Vec<Option<Node>>) -> Result<Node, ErrorImpl> {
    let mut args = args.into_iter().flatten();
    let (Some(test), Some(if_true), Some(if_false)) = (args.next(), args.next(), args.next())
    else {
        return Err(ErrorImpl::MacroArgumentCount {
            name: String::from("iff"),
            expected: 3,
        });
    };

    let span = test.span.to(&if_false.span);
    Ok(Node::new(
        0,
        NodeKind::Ternary {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        },
        span,
    ))
}

fn iff_macro() -> Macro {
    let required = |name: &str| MacroArg {
        name: name.to_string(),
        optional: false,
    };

    Macro {
        name: String::from("iff"),
        args: vec![required("condition"), required("then"), required("otherwise")],
        expand: expand_iff,
    }
}

pub fn global_namespace() -> Namespace {
    Namespace::new()
        .with_type("bool", Type::Bool)
        .with_type("int", Type::Int)
        .with_type("float", Type::Float)
        .with_type("string", Type::String)
        .with_type("box", Type::Box)
        .with_type("color", Type::Color)
        .with_type("label", Type::Label)
        .with_type("line", Type::Line)
        .with_type("linefill", Type::LineFill)
        .with_type("polyline", Type::PolyLine)
        .with_type("table", Type::Table)
        .with_ctor(TypeOrCtor::ctor("array", array_ctor))
        .with_ctor(TypeOrCtor::ctor("map", map_ctor))
        .with_ctor(TypeOrCtor::ctor("matrix", matrix_ctor))
        .with_variable("na", Type::Uncertain, Value::Na)
        .with_variable("open", series(Type::Float), Value::Runtime)
        .with_variable("high", series(Type::Float), Value::Runtime)
        .with_variable("low", series(Type::Float), Value::Runtime)
        .with_variable("close", series(Type::Float), Value::Runtime)
        .with_variable("volume", series(Type::Float), Value::Runtime)
        .with_variable("bar_index", series(Type::Int), Value::Runtime)
        .with_macro(iff_macro())
        .with_namespace("chart", chart_namespace())
        .with_namespace("color", color_namespace())
        .with_namespace("math", math_namespace())
        .with_namespace("array", array_namespace())
}
