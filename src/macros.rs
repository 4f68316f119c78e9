//! Utility macros for the front end.
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_CHILDREN!` - Lists the children of a node, shared or mutable
//! - `MK_ARITHMETIC_OPERATOR!` - Creates a numeric operator rule

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The raw lexeme
/// * `$span` - The source span
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Number, "42".to_string(), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
        }
    };
}

/// Collects `(attribute, index, child)` triples for every child of a node.
///
/// The same match serves shared and mutable traversal; the caller picks the
/// accessors.
///
/// # Arguments
///
/// * `$kind` - `&NodeKind` or `&mut NodeKind`
/// * `$boxed` - `as_ref` or `as_mut`, applied to boxed children
/// * `$iter` - `iter` or `iter_mut`, applied to child lists
/// * `$option` - `as_deref` or `as_deref_mut`, applied to optional children
///
/// # Example
///
/// ```ignore
/// let children = MK_CHILDREN!(&self.kind, as_ref, iter, as_deref);
/// ```
#[macro_export]
macro_rules! MK_CHILDREN {
    ($kind:expr, $boxed:ident, $iter:ident, $option:ident) => {{
        let mut children = Vec::new();

        macro_rules! one {
            ($attribute:literal, $child:expr) => {
                children.push(($attribute, None, $child.$boxed()))
            };
        }

        macro_rules! maybe {
            ($attribute:literal, $child:expr) => {
                if let Some(child) = $child.$option() {
                    children.push(($attribute, None, child));
                }
            };
        }

        macro_rules! many {
            ($attribute:literal, $list:expr) => {
                for (index, child) in $list.$iter().enumerate() {
                    children.push(($attribute, Some(index), child));
                }
            };
        }

        match $kind {
            NodeKind::SimpleType { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::StringLiteral { .. }
            | NodeKind::IntLiteral { .. }
            | NodeKind::FloatLiteral { .. }
            | NodeKind::ColorLiteral { .. }
            | NodeKind::BoolLiteral { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Import { .. } => {}
            NodeKind::SubType { name, .. } => one!("name", name),
            NodeKind::GenericType { name, args } => {
                one!("name", name);
                many!("args", args);
            }
            NodeKind::Binary { left, right, .. } => {
                one!("left", left);
                one!("right", right);
            }
            NodeKind::Unary { operand, .. } => one!("operand", operand),
            NodeKind::Attr { target, .. } => one!("target", target),
            NodeKind::KwArg { value, .. } => one!("value", value),
            NodeKind::Instantiation {
                template,
                type_args,
            } => {
                one!("template", template);
                many!("type_args", type_args);
            }
            NodeKind::Call { func, args } => {
                one!("func", func);
                many!("args", args);
            }
            NodeKind::HRef { series, offset } => {
                one!("series", series);
                one!("offset", offset);
            }
            NodeKind::Tuple { items } => many!("items", items),
            NodeKind::Ternary {
                test,
                if_true,
                if_false,
            } => {
                one!("test", test);
                one!("if_true", if_true);
                one!("if_false", if_false);
            }
            NodeKind::ExprStmt { expr } => one!("expr", expr),
            NodeKind::VarDecl {
                type_annotation,
                initial,
                ..
            } => {
                maybe!("type_annotation", type_annotation);
                one!("initial", initial);
            }
            NodeKind::TupleDecl { initial, .. } => one!("initial", initial),
            NodeKind::Reassign { target, value, .. } => {
                one!("target", target);
                one!("value", value);
            }
            NodeKind::If { test, body, orelse } => {
                one!("test", test);
                one!("body", body);
                maybe!("orelse", orelse);
            }
            NodeKind::CaseClause { condition, body } => {
                one!("condition", condition);
                one!("body", body);
            }
            NodeKind::Switch {
                target,
                cases,
                default,
            } => {
                maybe!("target", target);
                many!("cases", cases);
                maybe!("default", default);
            }
            NodeKind::While { test, body } => {
                one!("test", test);
                one!("body", body);
            }
            NodeKind::For {
                init,
                final_value,
                step,
                body,
                ..
            } => {
                one!("init", init);
                one!("final_value", final_value);
                maybe!("step", step);
                one!("body", body);
            }
            NodeKind::ForIn {
                container, body, ..
            } => {
                one!("container", container);
                one!("body", body);
            }
            NodeKind::ParamDecl {
                type_annotation,
                default,
                ..
            } => {
                maybe!("type_annotation", type_annotation);
                maybe!("default", default);
            }
            NodeKind::FuncDecl { params, body, .. } => {
                many!("params", params);
                one!("body", body);
            }
            NodeKind::MemberDecl {
                type_annotation,
                default,
                ..
            } => {
                maybe!("type_annotation", type_annotation);
                maybe!("default", default);
            }
            NodeKind::TypeDecl { members, .. } => many!("members", members),
            NodeKind::Suite { body } => many!("body", body),
            NodeKind::Quote { content } => one!("content", content),
        }

        children
    }};
}

/// Creates an operator rule accepting numeric operands.
///
/// `int op int` yields int, any other mix of int and float yields float.
/// Extra `(left, right) => out` arms extend the rule.
///
/// # Example
///
/// ```ignore
/// MK_ARITHMETIC_OPERATOR!(add_rule, (TypeKind::String, TypeKind::String) => Type::String);
/// ```
#[macro_export]
macro_rules! MK_ARITHMETIC_OPERATOR {
    ($name:ident $(, ($left:pat, $right:pat) => $out:expr)*) => {
        fn $name(left: &Type, right: &Type) -> Option<Type> {
            match (left.kind(), right.kind()) {
                (TypeKind::Int, TypeKind::Int) => Some(Type::Int),
                (TypeKind::Int | TypeKind::Float, TypeKind::Int | TypeKind::Float) => {
                    Some(Type::Float)
                }
                $(($left, $right) => Some($out),)*
                _ => None,
            }
        }
    };
}
