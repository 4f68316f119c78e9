use std::fmt::Display;

use crate::{
    types::{qualifiers::Qualifier, types::Type},
    Span,
};

pub type NodeId = usize;

/// `var` and `varip` change when a declaration is evaluated, not its type.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum DeclMode {
    #[default]
    Default,
    Var,
    Varip,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    // Type annotations
    SimpleType {
        name: String,
    },
    SubType {
        name: Box<Node>,
        member: String,
    },
    GenericType {
        name: Box<Node>,
        args: Vec<Node>,
    },

    // Expressions
    Binary {
        op: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        op: String,
        operand: Box<Node>,
    },
    Attr {
        target: Box<Node>,
        name: String,
    },
    KwArg {
        name: String,
        value: Box<Node>,
    },
    Instantiation {
        template: Box<Node>,
        type_args: Vec<Node>,
    },
    Call {
        func: Box<Node>,
        args: Vec<Node>,
    },
    HRef {
        series: Box<Node>,
        offset: Box<Node>,
    },
    Identifier {
        name: String,
    },
    StringLiteral {
        value: String,
    },
    IntLiteral {
        value: i64,
    },
    FloatLiteral {
        value: f64,
    },
    ColorLiteral {
        r: u8,
        g: u8,
        b: u8,
        /// Transparency, 0 is opaque and 100 is invisible
        t: f64,
    },
    BoolLiteral {
        value: bool,
    },
    Tuple {
        items: Vec<Node>,
    },
    Ternary {
        test: Box<Node>,
        if_true: Box<Node>,
        if_false: Box<Node>,
    },

    // Statements
    ExprStmt {
        expr: Box<Node>,
    },
    VarDecl {
        mode: DeclMode,
        qualifier: Qualifier,
        type_annotation: Option<Box<Node>>,
        name: String,
        initial: Box<Node>,
    },
    TupleDecl {
        names: Vec<String>,
        initial: Box<Node>,
    },
    Reassign {
        target: Box<Node>,
        op: String,
        value: Box<Node>,
    },
    If {
        test: Box<Node>,
        body: Box<Node>,
        orelse: Option<Box<Node>>,
    },
    CaseClause {
        condition: Box<Node>,
        body: Box<Node>,
    },
    Switch {
        target: Option<Box<Node>>,
        cases: Vec<Node>,
        default: Option<Box<Node>>,
    },
    While {
        test: Box<Node>,
        body: Box<Node>,
    },
    For {
        counter: String,
        init: Box<Node>,
        final_value: Box<Node>,
        step: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForIn {
        index: Option<String>,
        item: String,
        container: Box<Node>,
        body: Box<Node>,
    },
    Break,
    Continue,
    ParamDecl {
        qualifier: Qualifier,
        type_annotation: Option<Box<Node>>,
        name: String,
        default: Option<Box<Node>>,
    },
    FuncDecl {
        export: bool,
        method: bool,
        name: String,
        params: Vec<Node>,
        body: Box<Node>,
    },
    MemberDecl {
        type_annotation: Option<Box<Node>>,
        name: String,
        default: Option<Box<Node>>,
    },
    TypeDecl {
        export: bool,
        name: String,
        members: Vec<Node>,
    },
    Import {
        user: String,
        name: String,
        version: i64,
        alias: Option<String>,
    },
    Suite {
        body: Vec<Node>,
    },
    Quote {
        content: Box<Node>,
    },
}

/// Fieldless mirror of [`NodeKind`], cheap to store in parent links.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum NodeTag {
    SimpleType,
    SubType,
    GenericType,
    Binary,
    Unary,
    Attr,
    KwArg,
    Instantiation,
    Call,
    HRef,
    Identifier,
    StringLiteral,
    IntLiteral,
    FloatLiteral,
    ColorLiteral,
    BoolLiteral,
    Tuple,
    Ternary,
    ExprStmt,
    VarDecl,
    TupleDecl,
    Reassign,
    If,
    CaseClause,
    Switch,
    While,
    For,
    ForIn,
    Break,
    Continue,
    ParamDecl,
    FuncDecl,
    MemberDecl,
    TypeDecl,
    Import,
    Suite,
    Quote,
}

/// Where a node hangs in the tree: its parent, the field of the parent it
/// is stored in and, for list fields, its position in that list.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct NodePath {
    pub parent: NodeId,
    pub parent_tag: NodeTag,
    pub attribute: &'static str,
    pub index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub span: Span,
    /// Filled in by the type checker
    pub ty: Option<Type>,
    /// Filled in by [`super::parent::mark_parent`]
    pub path: Option<NodePath>,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, span: Span) -> Self {
        Node {
            id,
            kind,
            span,
            ty: None,
            path: None,
        }
    }

    pub fn tag(&self) -> NodeTag {
        match &self.kind {
            NodeKind::SimpleType { .. } => NodeTag::SimpleType,
            NodeKind::SubType { .. } => NodeTag::SubType,
            NodeKind::GenericType { .. } => NodeTag::GenericType,
            NodeKind::Binary { .. } => NodeTag::Binary,
            NodeKind::Unary { .. } => NodeTag::Unary,
            NodeKind::Attr { .. } => NodeTag::Attr,
            NodeKind::KwArg { .. } => NodeTag::KwArg,
            NodeKind::Instantiation { .. } => NodeTag::Instantiation,
            NodeKind::Call { .. } => NodeTag::Call,
            NodeKind::HRef { .. } => NodeTag::HRef,
            NodeKind::Identifier { .. } => NodeTag::Identifier,
            NodeKind::StringLiteral { .. } => NodeTag::StringLiteral,
            NodeKind::IntLiteral { .. } => NodeTag::IntLiteral,
            NodeKind::FloatLiteral { .. } => NodeTag::FloatLiteral,
            NodeKind::ColorLiteral { .. } => NodeTag::ColorLiteral,
            NodeKind::BoolLiteral { .. } => NodeTag::BoolLiteral,
            NodeKind::Tuple { .. } => NodeTag::Tuple,
            NodeKind::Ternary { .. } => NodeTag::Ternary,
            NodeKind::ExprStmt { .. } => NodeTag::ExprStmt,
            NodeKind::VarDecl { .. } => NodeTag::VarDecl,
            NodeKind::TupleDecl { .. } => NodeTag::TupleDecl,
            NodeKind::Reassign { .. } => NodeTag::Reassign,
            NodeKind::If { .. } => NodeTag::If,
            NodeKind::CaseClause { .. } => NodeTag::CaseClause,
            NodeKind::Switch { .. } => NodeTag::Switch,
            NodeKind::While { .. } => NodeTag::While,
            NodeKind::For { .. } => NodeTag::For,
            NodeKind::ForIn { .. } => NodeTag::ForIn,
            NodeKind::Break => NodeTag::Break,
            NodeKind::Continue => NodeTag::Continue,
            NodeKind::ParamDecl { .. } => NodeTag::ParamDecl,
            NodeKind::FuncDecl { .. } => NodeTag::FuncDecl,
            NodeKind::MemberDecl { .. } => NodeTag::MemberDecl,
            NodeKind::TypeDecl { .. } => NodeTag::TypeDecl,
            NodeKind::Import { .. } => NodeTag::Import,
            NodeKind::Suite { .. } => NodeTag::Suite,
            NodeKind::Quote { .. } => NodeTag::Quote,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.tag(),
            NodeTag::StringLiteral
                | NodeTag::IntLiteral
                | NodeTag::FloatLiteral
                | NodeTag::ColorLiteral
                | NodeTag::BoolLiteral
        )
    }

    /// Renders a type annotation the way it was written, e.g. `chart.point`.
    pub fn type_name(&self) -> String {
        match &self.kind {
            NodeKind::SimpleType { name } => name.clone(),
            NodeKind::SubType { name, member } => format!("{}.{}", name.type_name(), member),
            NodeKind::GenericType { name, args } => format!(
                "{}<{}>",
                name.type_name(),
                args.iter().map(Node::type_name).collect::<Vec<_>>().join(", ")
            ),
            _ => self.sexpr(),
        }
    }

    /// Compact s-expression dump of the tree, used by tests and `--ast`.
    pub fn sexpr(&self) -> String {
        fn list(nodes: &[Node]) -> String {
            nodes.iter().map(Node::sexpr).collect::<Vec<_>>().join(" ")
        }

        fn opt(node: &Option<Box<Node>>) -> String {
            node.as_ref().map(|n| n.sexpr()).unwrap_or_else(|| String::from("_"))
        }

        match &self.kind {
            NodeKind::SimpleType { .. }
            | NodeKind::SubType { .. }
            | NodeKind::GenericType { .. } => self.type_name(),
            NodeKind::Binary { op, left, right } => {
                format!("({} {} {})", op, left.sexpr(), right.sexpr())
            }
            NodeKind::Unary { op, operand } => format!("({} {})", op, operand.sexpr()),
            NodeKind::Attr { target, name } => format!("(. {} {})", target.sexpr(), name),
            NodeKind::KwArg { name, value } => format!("(kw {} {})", name, value.sexpr()),
            NodeKind::Instantiation {
                template,
                type_args,
            } => format!("(inst {} {})", template.sexpr(), list(type_args)),
            NodeKind::Call { func, args } if args.is_empty() => format!("(call {})", func.sexpr()),
            NodeKind::Call { func, args } => format!("(call {} {})", func.sexpr(), list(args)),
            NodeKind::HRef { series, offset } => {
                format!("(href {} {})", series.sexpr(), offset.sexpr())
            }
            NodeKind::Identifier { name } => name.clone(),
            NodeKind::StringLiteral { value } => format!("{:?}", value),
            NodeKind::IntLiteral { value } => value.to_string(),
            NodeKind::FloatLiteral { value } => format!("{:?}", value),
            NodeKind::ColorLiteral { r, g, b, t } => format!("(color {} {} {} {})", r, g, b, t),
            NodeKind::BoolLiteral { value } => value.to_string(),
            NodeKind::Tuple { items } => format!("[{}]", list(items)),
            NodeKind::Ternary {
                test,
                if_true,
                if_false,
            } => format!("(? {} {} {})", test.sexpr(), if_true.sexpr(), if_false.sexpr()),
            NodeKind::ExprStmt { expr } => expr.sexpr(),
            NodeKind::VarDecl {
                mode,
                qualifier,
                type_annotation,
                name,
                initial,
            } => {
                let mut head = String::from("(decl");
                match mode {
                    DeclMode::Var => head.push_str(" var"),
                    DeclMode::Varip => head.push_str(" varip"),
                    DeclMode::Default => {}
                }
                if *qualifier != Qualifier::NoQualifier {
                    head.push_str(&format!(" {}", qualifier));
                }
                if let Some(annotation) = type_annotation {
                    head.push_str(&format!(" {}", annotation.type_name()));
                }
                format!("{} {} {})", head, name, initial.sexpr())
            }
            NodeKind::TupleDecl { names, initial } => {
                format!("(decl [{}] {})", names.join(" "), initial.sexpr())
            }
            NodeKind::Reassign { target, op, value } => {
                format!("({} {} {})", op, target.sexpr(), value.sexpr())
            }
            NodeKind::If { test, body, orelse } => {
                format!("(if {} {} {})", test.sexpr(), body.sexpr(), opt(orelse))
            }
            NodeKind::CaseClause { condition, body } => {
                format!("(case {} {})", condition.sexpr(), body.sexpr())
            }
            NodeKind::Switch {
                target,
                cases,
                default,
            } => format!("(switch {} {} {})", opt(target), list(cases), opt(default)),
            NodeKind::While { test, body } => format!("(while {} {})", test.sexpr(), body.sexpr()),
            NodeKind::For {
                counter,
                init,
                final_value,
                step,
                body,
            } => format!(
                "(for {} {} {} {} {})",
                counter,
                init.sexpr(),
                final_value.sexpr(),
                opt(step),
                body.sexpr()
            ),
            NodeKind::ForIn {
                index,
                item,
                container,
                body,
            } => format!(
                "(for-in {} {} {} {})",
                index.as_deref().unwrap_or("_"),
                item,
                container.sexpr(),
                body.sexpr()
            ),
            NodeKind::Break => String::from("break"),
            NodeKind::Continue => String::from("continue"),
            NodeKind::ParamDecl {
                qualifier,
                type_annotation,
                name,
                default,
            } => {
                let mut param = String::new();
                if *qualifier != Qualifier::NoQualifier {
                    param.push_str(&format!("{} ", qualifier));
                }
                if let Some(annotation) = type_annotation {
                    param.push_str(&format!("{} ", annotation.type_name()));
                }
                param.push_str(name);
                if let Some(default) = default {
                    param.push_str(&format!("={}", default.sexpr()));
                }
                param
            }
            NodeKind::FuncDecl {
                export,
                method,
                name,
                params,
                body,
            } => {
                let prefix = match (export, method) {
                    (true, true) => "export method ",
                    (true, false) => "export ",
                    (false, true) => "method ",
                    (false, false) => "",
                };
                format!("(fn {}{} ({}) {})", prefix, name, list(params), body.sexpr())
            }
            NodeKind::MemberDecl {
                type_annotation,
                name,
                default,
            } => {
                let annotation = type_annotation
                    .as_ref()
                    .map(|a| format!("{} ", a.type_name()))
                    .unwrap_or_default();
                match default {
                    Some(default) => format!("{}{}={}", annotation, name, default.sexpr()),
                    None => format!("{}{}", annotation, name),
                }
            }
            NodeKind::TypeDecl {
                export,
                name,
                members,
            } => {
                let prefix = if *export { "export " } else { "" };
                format!("(type {}{} {})", prefix, name, list(members))
            }
            NodeKind::Import {
                user,
                name,
                version,
                alias,
            } => match alias {
                Some(alias) => format!("(import {}/{}/{} {})", user, name, version, alias),
                None => format!("(import {}/{}/{})", user, name, version),
            },
            NodeKind::Suite { body } => format!("{{{}}}", list(body)),
            NodeKind::Quote { content } => format!("(quote {})", content.sexpr()),
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sexpr())
    }
}
