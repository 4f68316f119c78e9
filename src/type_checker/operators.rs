use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{
    errors::errors::ErrorImpl,
    types::types::{can_do_implicit_conversion, equal, Type, TypeKind},
    MK_ARITHMETIC_OPERATOR,
};

type BinaryRule = fn(&Type, &Type) -> Option<Type>;
type UnaryRule = fn(&Type) -> Option<Type>;

MK_ARITHMETIC_OPERATOR!(add_rule, (TypeKind::String, TypeKind::String) => Type::String);
MK_ARITHMETIC_OPERATOR!(arithmetic_rule);

fn relational_rule(left: &Type, right: &Type) -> Option<Type> {
    (left.kind().is_numeric() && right.kind().is_numeric()).then_some(Type::Bool)
}

fn equality_rule(left: &Type, right: &Type) -> Option<Type> {
    let comparable = equal(left, right)
        || can_do_implicit_conversion(left, right)
        || can_do_implicit_conversion(right, left);
    comparable.then_some(Type::Bool)
}

fn logical_rule(left: &Type, right: &Type) -> Option<Type> {
    (left.is_bool_like() && right.is_bool_like()).then_some(Type::Bool)
}

fn sign_rule(operand: &Type) -> Option<Type> {
    operand
        .kind()
        .is_numeric()
        .then(|| operand.peel().clone())
}

fn not_rule(operand: &Type) -> Option<Type> {
    operand.is_bool_like().then_some(Type::Bool)
}

lazy_static! {
    static ref BINARY_OPERATORS: HashMap<&'static str, BinaryRule> = {
        let mut map: HashMap<&'static str, BinaryRule> = HashMap::new();
        map.insert("+", add_rule);
        map.insert("-", arithmetic_rule);
        map.insert("*", arithmetic_rule);
        map.insert("/", arithmetic_rule);
        map.insert("%", arithmetic_rule);
        map.insert("<", relational_rule);
        map.insert(">", relational_rule);
        map.insert("<=", relational_rule);
        map.insert(">=", relational_rule);
        map.insert("==", equality_rule);
        map.insert("!=", equality_rule);
        map.insert("and", logical_rule);
        map.insert("or", logical_rule);
        map
    };
    static ref UNARY_OPERATORS: HashMap<&'static str, UnaryRule> = {
        let mut map: HashMap<&'static str, UnaryRule> = HashMap::new();
        map.insert("+", sign_rule);
        map.insert("-", sign_rule);
        map.insert("not", not_rule);
        map.insert("!", not_rule);
        map
    };
}

/// Result type of `left operator right`.
///
/// An uncertain operand takes the type of the other one, so `na + 1` is an
/// int. The result is qualified with the least stable operand qualifier.
pub fn binary_result(operator: &str, left: &Type, right: &Type) -> Result<Type, ErrorImpl> {
    let Some(rule) = BINARY_OPERATORS.get(operator) else {
        return Err(ErrorImpl::UnknownOperator {
            operator: operator.to_string(),
        });
    };

    let (lhs, rhs) = match (left.kind(), right.kind()) {
        (TypeKind::Uncertain, _) => (right, right),
        (_, TypeKind::Uncertain) => (left, left),
        _ => (left, right),
    };

    let qualifier = left.qualifier().join(right.qualifier());

    // Both sides are `na`: the shape of the result is all that is known.
    if lhs.kind() == TypeKind::Uncertain {
        return Ok(match rule(&Type::Int, &Type::Int) {
            Some(Type::Bool) => Type::Bool.with_qualifier(qualifier),
            _ => Type::Uncertain.with_qualifier(qualifier),
        });
    }

    rule(lhs, rhs)
        .map(|out| out.with_qualifier(qualifier))
        .ok_or_else(|| ErrorImpl::UnsupportedBinaryOperation {
            operator: operator.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        })
}

pub fn unary_result(operator: &str, operand: &Type) -> Result<Type, ErrorImpl> {
    let Some(rule) = UNARY_OPERATORS.get(operator) else {
        return Err(ErrorImpl::UnknownOperator {
            operator: operator.to_string(),
        });
    };

    if operand.kind() == TypeKind::Uncertain && matches!(operator, "+" | "-") {
        return Ok(operand.clone());
    }

    rule(operand)
        .map(|out| out.with_qualifier(operand.qualifier()))
        .ok_or_else(|| ErrorImpl::UnsupportedUnaryOperation {
            operator: operator.to_string(),
            operand: operand.to_string(),
        })
}
