use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Node, NodeId, NodeKind, NodeTag},
        parent::{mark_parent, walk},
    },
    errors::errors::{Error, ErrorImpl},
    types::{
        callable::{BuiltinFunction, Callable, KeywordTypes},
        namespace::Namespace,
        qualifiers::Qualifier,
        types::{
            can_do_implicit_conversion, equal, union_of, Type, TypeKind, TypeOrCtor,
            TypeWithName,
        },
    },
    Location,
};

use super::operators::{binary_result, unary_result};

/// Variables declared in one block.
pub type Scope = IndexMap<String, Type>;

/// What the conditions of the enclosing switch are checked against.
#[derive(Debug, Clone)]
enum CaseTarget {
    /// A switch without target: conditions are tests
    Bool,
    Value(Type),
    /// The target failed to type check
    Unknown,
}

/// Outcome of visiting one node. `Ok(None)` leaves the type slot unset
/// without a new diagnostic, because a child already reported one.
type Visit = Result<Option<Type>, ErrorImpl>;

/// Returns `Ok(None)` from the visit when a child has no type.
macro_rules! typed {
    ($node:expr) => {
        match $node.ty.clone() {
            Some(ty) => ty,
            None => return Ok(None),
        }
    };
}

pub struct TypeChecker<'a> {
    namespace: &'a Namespace,
    /// Types and functions declared by the script itself
    user_ns: Namespace,
    user_functions: IndexMap<String, BuiltinFunction>,
    scopes: Vec<Scope>,
    case_targets: Vec<CaseTarget>,
    loop_depth: usize,
    next_id: NodeId,
    errors: Vec<Error>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(namespace: &'a Namespace) -> Self {
        TypeChecker {
            namespace,
            user_ns: Namespace::new(),
            user_functions: IndexMap::new(),
            scopes: vec![Scope::new()],
            case_targets: vec![],
            loop_depth: 0,
            next_id: 1,
            errors: vec![],
        }
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    pub fn user_namespace(&self) -> &Namespace {
        &self.user_ns
    }

    /// Makes sure nodes created by macro expansion get ids no parsed node
    /// uses.
    pub fn reserve_ids(&mut self, nodes: &[Node]) {
        for node in nodes {
            walk(node, &mut |node| self.next_id = self.next_id.max(node.id + 1));
        }
    }

    fn report(&mut self, error: ErrorImpl, position: Location) {
        let error = Error::new(error, position);
        debug!(%error, "type error");
        self.errors.push(error);
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
        trace!(depth = self.scopes.len(), "scope pushed");
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
        trace!(depth = self.scopes.len(), "scope popped");
    }

    fn declare(&mut self, name: &str, ty: Type) -> Result<(), ErrorImpl> {
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };

        if scope.contains_key(name) {
            return Err(ErrorImpl::VariableAlreadyDeclared {
                variable: name.to_string(),
            });
        }

        trace!(name, %ty, "variable declared");
        scope.insert(name.to_string(), ty);
        Ok(())
    }

    fn lookup_variable(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn lookup_function(&self, name: &str) -> Option<Rc<dyn Callable>> {
        self.user_ns
            .find_function(name)
            .or_else(|| self.namespace.find_function(name))
    }

    fn lookup_identifier(&self, name: &str) -> Result<Type, ErrorImpl> {
        if let Some(ty) = self.lookup_variable(name) {
            return Ok(ty.clone());
        }

        if let Some(callable) = self.lookup_function(name) {
            return Ok(Type::Callable(callable));
        }

        if let Some(namespace) = self.namespace.find_namespace(name) {
            return Ok(Type::Namespace(namespace));
        }

        self.namespace
            .find_variable_type(name)
            .cloned()
            .ok_or_else(|| ErrorImpl::UnknownIdentifier {
                name: name.to_string(),
            })
    }

    /// Resolves a type name. Constructors are only acceptable when type
    /// arguments follow.
    fn lookup_type(&self, namespace: &Namespace, name: &str, ctor_allowed: bool) -> Visit {
        let Some(toc) = namespace.find_type(name) else {
            return Err(ErrorImpl::UnknownType {
                name: name.to_string(),
            });
        };

        match toc {
            TypeOrCtor::Type(ty) => Ok(Some(ty.clone())),
            TypeOrCtor::Ctor { .. } if ctor_allowed => {
                Ok(Some(Type::TypeOrCtor(Box::new(toc.clone()))))
            }
            TypeOrCtor::Ctor { name, .. } => Err(ErrorImpl::MissingTypeArguments { name: name.clone() }),
        }
    }

    fn lookup_method(&self, name: &str, self_type: &Type) -> Option<Rc<dyn Callable>> {
        self.user_ns
            .find_method(name, self_type)
            .or_else(|| self.namespace.find_method(name, self_type))
    }

    /// Analyzes `node` and its children, filling in their type slots.
    pub fn analyze(&mut self, node: &mut Node) {
        match self.visit(node) {
            Ok(Some(ty)) => node.ty = Some(ty),
            Ok(None) => {}
            Err(error) => self.report(error, node.span.start),
        }
    }

    /// Analyzes a control flow body in its own scope. Indented bodies are
    /// suites and open that scope themselves.
    fn analyze_block(&mut self, body: &mut Node) {
        if body.tag() == NodeTag::Suite {
            self.analyze(body);
            return;
        }

        self.push_scope();
        self.analyze(body);
        self.pop_scope();
    }

    fn visit(&mut self, node: &mut Node) -> Visit {
        if self.expand_macro(node)? {
            return self.visit(node);
        }

        let start = node.span.start;
        let (parent_tag, attribute) = match &node.path {
            Some(path) => (Some(path.parent_tag), path.attribute),
            None => (None, ""),
        };

        match &mut node.kind {
            NodeKind::SimpleType { name } => {
                if parent_tag == Some(NodeTag::SubType) && attribute == "name" {
                    return self
                        .namespace
                        .find_namespace(name)
                        .map(|namespace| Some(Type::Namespace(namespace)))
                        .ok_or_else(|| ErrorImpl::UnknownNamespace { name: name.clone() });
                }

                let ctor_allowed = parent_tag == Some(NodeTag::GenericType) && attribute == "name";
                if self.user_ns.find_type(name).is_some() {
                    return self.lookup_type(&self.user_ns, name, ctor_allowed);
                }
                self.lookup_type(self.namespace, name, ctor_allowed)
            }
            NodeKind::SubType { name, member } => {
                self.analyze(name);
                let owner = typed!(name);
                let Some(namespace) = owner.as_namespace() else {
                    return Err(ErrorImpl::UnknownNamespace {
                        name: name.type_name(),
                    });
                };

                if parent_tag == Some(NodeTag::SubType) && attribute == "name" {
                    return namespace
                        .find_namespace(member)
                        .map(|namespace| Some(Type::Namespace(namespace)))
                        .ok_or_else(|| ErrorImpl::UnknownNamespace {
                            name: format!("{}.{}", name.type_name(), member),
                        });
                }

                let ctor_allowed = parent_tag == Some(NodeTag::GenericType) && attribute == "name";
                self.lookup_type(namespace, member, ctor_allowed)
            }
            NodeKind::GenericType { name, args } => {
                self.analyze(name);
                for arg in args.iter_mut() {
                    self.analyze(arg);
                }

                let template = typed!(name);
                let mut type_args = Vec::with_capacity(args.len());
                for arg in args.iter() {
                    type_args.push(typed!(arg));
                }

                match template {
                    Type::TypeOrCtor(toc) => toc.instantiate(&type_args).map(Some),
                    _ => Err(ErrorImpl::NotATypeConstructor {
                        name: name.type_name(),
                    }),
                }
            }

            NodeKind::Binary { op, left, right } => {
                self.analyze(left);
                self.analyze(right);
                let (left, right) = (typed!(left), typed!(right));
                binary_result(op, &left, &right).map(Some)
            }
            NodeKind::Unary { op, operand } => {
                self.analyze(operand);
                let operand = typed!(operand);
                unary_result(op, &operand).map(Some)
            }
            NodeKind::Attr { target, name } => {
                self.analyze(target);
                let target = typed!(target);
                self.resolve_attribute(&target, name).map(Some)
            }
            NodeKind::KwArg { value, .. } => {
                self.analyze(value);
                Ok(value.ty.clone())
            }
            NodeKind::Instantiation {
                template,
                type_args,
            } => {
                self.analyze(template);
                for arg in type_args.iter_mut() {
                    self.analyze(arg);
                }

                let template = typed!(template);
                let mut resolved = Vec::with_capacity(type_args.len());
                for arg in type_args.iter() {
                    resolved.push(typed!(arg));
                }

                let Some(callable) = template.as_callable() else {
                    return Err(ErrorImpl::NotCallable {
                        found: template.to_string(),
                    });
                };
                callable.instantiate(&resolved).map(|callable| Some(Type::Callable(callable)))
            }
            NodeKind::Call { func, args } => {
                self.analyze(func);
                for arg in args.iter_mut() {
                    self.analyze(arg);
                }

                let func_type = typed!(func);
                let Some(callable) = func_type.as_callable() else {
                    return Err(ErrorImpl::NotCallable {
                        found: func_type.to_string(),
                    });
                };

                let mut positional = vec![];
                if let NodeKind::Attr { target, .. } = &func.kind {
                    let receiver = typed!(target);
                    if receiver.kind() != TypeKind::Namespace && callable.is_method() {
                        positional.push(receiver);
                    }
                }

                let mut keywords = KeywordTypes::new();
                for arg in args.iter() {
                    let ty = typed!(arg);
                    match &arg.kind {
                        NodeKind::KwArg { name, .. } => {
                            keywords.insert(name.clone(), ty);
                        }
                        _ => positional.push(ty),
                    }
                }

                callable.dispatch(&positional, &keywords).map(Some)
            }
            NodeKind::HRef { series, offset } => {
                self.analyze(series);
                self.analyze(offset);
                let (series, offset) = (typed!(series), typed!(offset));

                if offset.kind() != TypeKind::Int {
                    return Err(ErrorImpl::HistoryOffsetNotInt {
                        found: offset.to_string(),
                    });
                }
                Ok(Some(series.with_qualifier(Qualifier::Series)))
            }
            NodeKind::Identifier { name } => self.lookup_identifier(name).map(Some),
            NodeKind::StringLiteral { .. } => Ok(Some(Type::String)),
            NodeKind::IntLiteral { .. } => Ok(Some(Type::Int)),
            NodeKind::FloatLiteral { .. } => Ok(Some(Type::Float)),
            NodeKind::ColorLiteral { .. } => Ok(Some(Type::Color)),
            NodeKind::BoolLiteral { .. } => Ok(Some(Type::Bool)),
            NodeKind::Tuple { items } => {
                for item in items.iter_mut() {
                    self.analyze(item);
                }

                let mut types = Vec::with_capacity(items.len());
                for item in items.iter() {
                    types.push(typed!(item));
                }
                Ok(Some(Type::Tuple(types)))
            }
            NodeKind::Ternary {
                test,
                if_true,
                if_false,
            } => {
                self.analyze(test);
                self.analyze(if_true);
                self.analyze(if_false);
                let test = typed!(test);
                let (true_type, false_type) = (typed!(if_true), typed!(if_false));

                if !test.is_bool_like() {
                    return Err(ErrorImpl::ConditionNotBool {
                        construct: String::from("ternary"),
                        found: test.to_string(),
                    });
                }

                let qualifier = test
                    .qualifier()
                    .join(true_type.qualifier())
                    .join(false_type.qualifier());

                let ty = if equal(&true_type, &false_type) {
                    true_type
                } else if can_do_implicit_conversion(&true_type, &false_type) {
                    false_type
                } else if can_do_implicit_conversion(&false_type, &true_type) {
                    true_type
                } else {
                    return Err(ErrorImpl::TernaryMismatch {
                        left: true_type.to_string(),
                        right: false_type.to_string(),
                    });
                };
                Ok(Some(ty.with_qualifier(qualifier)))
            }

            NodeKind::ExprStmt { expr } => {
                self.analyze(expr);
                Ok(expr.ty.clone())
            }
            NodeKind::VarDecl {
                qualifier,
                type_annotation,
                name,
                initial,
                ..
            } => {
                if let Some(annotation) = type_annotation.as_deref_mut() {
                    self.analyze(annotation);
                }
                self.analyze(initial);

                let formal = match type_annotation.as_deref() {
                    Some(Node { ty: Some(ty), .. }) => Some(ty.clone()),
                    Some(_) => {
                        // The annotation already reported; later uses of
                        // the name stay quiet.
                        self.declare(name, Type::Uncertain)?;
                        return Ok(None);
                    }
                    None => None,
                };

                let Some(init) = initial.ty.clone() else {
                    // Keep later uses of the name quiet when the annotation
                    // says what it is.
                    if let Some(formal) = formal {
                        self.declare(name, formal.with_qualifier(*qualifier))?;
                    }
                    return Ok(None);
                };

                let qualifier = match qualifier {
                    Qualifier::NoQualifier => init.qualifier(),
                    explicit => *explicit,
                };

                let ty = match formal {
                    Some(formal) => {
                        let declared = formal.with_qualifier(qualifier);
                        if !equal(&formal, &init) && !can_do_implicit_conversion(&init, &formal) {
                            self.declare(name, declared)?;
                            return Err(ErrorImpl::TypeMatchError {
                                expected: formal.to_string(),
                                received: init.to_string(),
                            });
                        }
                        declared
                    }
                    None if !init.kind().is_normal() => {
                        return Err(ErrorImpl::CannotInferType {
                            name: name.clone(),
                            found: init.to_string(),
                        });
                    }
                    None => init.with_qualifier(qualifier),
                };

                self.declare(name, ty.clone())?;
                Ok(Some(ty))
            }
            NodeKind::TupleDecl { names, initial } => {
                self.analyze(initial);
                let init = typed!(initial);

                let Some(items) = init.items() else {
                    return Err(ErrorImpl::NotATuple {
                        found: init.to_string(),
                    });
                };
                if items.len() != names.len() {
                    return Err(ErrorImpl::TupleArityMismatch {
                        expected: names.len(),
                        received: items.len(),
                    });
                }

                let qualifier = init.qualifier();
                for (name, item) in names.iter().zip(items) {
                    self.declare(name, item.with_qualifier(qualifier.join(item.qualifier())))?;
                }
                Ok(Some(init))
            }
            NodeKind::Reassign { target, op, value } => {
                self.analyze(target);
                self.analyze(value);
                let (target, value) = (typed!(target), typed!(value));

                let assigned = match op.as_str() {
                    ":=" => value,
                    compound => binary_result(compound.trim_end_matches('='), &target, &value)?,
                };

                if !equal(&target, &assigned) && !can_do_implicit_conversion(&assigned, &target) {
                    return Err(ErrorImpl::TypeMatchError {
                        expected: target.to_string(),
                        received: assigned.to_string(),
                    });
                }
                Ok(Some(target))
            }
            NodeKind::If { test, body, orelse } => {
                self.analyze(test);
                self.analyze_block(body);
                if let Some(orelse) = orelse.as_deref_mut() {
                    self.analyze_block(orelse);
                }

                let test = typed!(test);
                if !test.is_bool_like() {
                    return Err(ErrorImpl::ConditionNotBool {
                        construct: String::from("if"),
                        found: test.to_string(),
                    });
                }

                let true_type = typed!(body);
                let false_type = match orelse.as_deref() {
                    Some(orelse) => typed!(orelse),
                    None => Type::Void,
                };
                union_of(vec![true_type, false_type]).map(Some)
            }
            NodeKind::CaseClause { condition, body } => {
                self.analyze(condition);
                self.analyze_block(body);

                if parent_tag != Some(NodeTag::Switch) {
                    return Err(ErrorImpl::CaseOutsideSwitch);
                }

                let condition = typed!(condition);
                match self.case_targets.last() {
                    Some(CaseTarget::Value(target)) => {
                        if !equal(&condition, target)
                            && !can_do_implicit_conversion(&condition, target)
                        {
                            return Err(ErrorImpl::CaseConditionMismatch {
                                expected: target.to_string(),
                                received: condition.to_string(),
                            });
                        }
                    }
                    Some(CaseTarget::Bool) | None => {
                        if !condition.is_bool_like() {
                            return Err(ErrorImpl::ConditionNotBool {
                                construct: String::from("case"),
                                found: condition.to_string(),
                            });
                        }
                    }
                    Some(CaseTarget::Unknown) => return Ok(None),
                }

                Ok(body.ty.clone())
            }
            NodeKind::Switch {
                target,
                cases,
                default,
            } => {
                let case_target = match target.as_deref_mut() {
                    Some(target) => {
                        self.analyze(target);
                        match &target.ty {
                            Some(ty) => CaseTarget::Value(ty.clone()),
                            None => CaseTarget::Unknown,
                        }
                    }
                    None => CaseTarget::Bool,
                };

                self.case_targets.push(case_target);
                for case in cases.iter_mut() {
                    self.analyze(case);
                }
                self.case_targets.pop();

                if let Some(default) = default.as_deref_mut() {
                    self.analyze_block(default);
                }

                let mut types = Vec::with_capacity(cases.len() + 1);
                for case in cases.iter() {
                    types.push(typed!(case));
                }
                if let Some(default) = default.as_deref() {
                    types.push(typed!(default));
                }
                union_of(types).map(Some)
            }
            NodeKind::While { test, body } => {
                self.analyze(test);
                self.loop_depth += 1;
                self.analyze_block(body);
                self.loop_depth -= 1;

                let test = typed!(test);
                if !test.is_bool_like() {
                    return Err(ErrorImpl::ConditionNotBool {
                        construct: String::from("while"),
                        found: test.to_string(),
                    });
                }
                Ok(body.ty.clone())
            }
            NodeKind::For {
                counter,
                init,
                final_value,
                step,
                body,
            } => {
                self.analyze(init);
                self.analyze(final_value);
                if let Some(step) = step.as_deref_mut() {
                    self.analyze(step);
                }

                let mut bounds = vec![
                    ("initial", init.ty.clone(), init.span.start),
                    ("final", final_value.ty.clone(), final_value.span.start),
                ];
                if let Some(step) = step.as_deref() {
                    bounds.push(("step", step.ty.clone(), step.span.start));
                }

                let counter_type = match bounds
                    .iter()
                    .any(|(_, ty, _)| ty.as_ref().is_some_and(|ty| ty.kind() == TypeKind::Float))
                {
                    true => Type::Float,
                    false => Type::Int,
                };

                self.push_scope();
                self.declare(counter, counter_type)?;
                self.loop_depth += 1;
                self.analyze_block(body);
                self.loop_depth -= 1;
                self.pop_scope();

                let mut valid = true;
                for (bound, ty, position) in bounds {
                    let Some(ty) = ty else {
                        valid = false;
                        continue;
                    };
                    if !ty.kind().is_numeric() {
                        valid = false;
                        let error = ErrorImpl::LoopBoundNotNumeric {
                            bound: bound.to_string(),
                            found: ty.to_string(),
                        };
                        self.report(error, position);
                    }
                }
                match valid {
                    true => Ok(body.ty.clone()),
                    false => Ok(None),
                }
            }
            NodeKind::ForIn {
                index,
                item,
                container,
                body,
            } => {
                self.analyze(container);

                let bindings = match &container.ty {
                    Some(ty) => iteration_bindings(ty, index.is_some()),
                    None => Ok((Type::Uncertain, Type::Uncertain)),
                };
                let (index_type, item_type) = match &bindings {
                    Ok(types) => types.clone(),
                    Err(_) => (Type::Uncertain, Type::Uncertain),
                };

                self.push_scope();
                let mut declared = vec![];
                if let Some(index) = index {
                    declared.push(self.declare(index, index_type));
                }
                declared.push(self.declare(item, item_type));
                for error in declared.into_iter().filter_map(Result::err) {
                    self.report(error, start);
                }
                self.loop_depth += 1;
                self.analyze_block(body);
                self.loop_depth -= 1;
                self.pop_scope();

                bindings?;
                if container.ty.is_none() {
                    return Ok(None);
                }
                Ok(body.ty.clone())
            }
            NodeKind::Break => self.loop_control("break"),
            NodeKind::Continue => self.loop_control("continue"),
            NodeKind::ParamDecl {
                qualifier,
                type_annotation,
                default,
                ..
            } => {
                if let Some(annotation) = type_annotation.as_deref_mut() {
                    self.analyze(annotation);
                }
                if let Some(default) = default.as_deref_mut() {
                    self.analyze(default);
                }

                let mut formal = match type_annotation.as_deref() {
                    Some(annotation) => typed!(annotation),
                    None => Type::Uncertain,
                };

                if let Some(default) = default.as_deref() {
                    let actual = typed!(default);
                    if formal.kind() == TypeKind::Uncertain {
                        formal = actual;
                    } else if !equal(&formal, &actual) && !can_do_implicit_conversion(&actual, &formal) {
                        return Err(ErrorImpl::ArgumentTypeMatchError {
                            expected: formal.to_string(),
                            received: actual.to_string(),
                        });
                    }
                }

                match qualifier {
                    Qualifier::NoQualifier => Ok(Some(formal)),
                    explicit => Ok(Some(formal.with_qualifier(*explicit))),
                }
            }
            NodeKind::FuncDecl {
                method,
                name,
                params,
                body,
                ..
            } => {
                self.push_scope();
                let mut signature = Vec::with_capacity(params.len());
                for param in params.iter_mut() {
                    self.analyze(param);
                    let NodeKind::ParamDecl {
                        name: param_name,
                        default,
                        ..
                    } = &param.kind
                    else {
                        continue;
                    };

                    let ty = param.ty.clone().unwrap_or(Type::Uncertain);
                    if let Err(error) = self.declare(param_name, ty.clone()) {
                        self.report(error, param.span.start);
                    }
                    signature.push(match default {
                        Some(_) => TypeWithName::optional(param_name, ty),
                        None => TypeWithName::new(param_name, ty),
                    });
                }

                let loop_depth = std::mem::replace(&mut self.loop_depth, 0);
                self.analyze(body);
                self.loop_depth = loop_depth;
                self.pop_scope();

                let out = body.ty.clone();
                self.register_function(name, *method, signature.clone(), out.clone().unwrap_or(Type::Uncertain));

                Ok(out.map(|out| Type::function_of(signature, out)))
            }
            NodeKind::MemberDecl {
                type_annotation,
                name,
                default,
            } => {
                if let Some(annotation) = type_annotation.as_deref_mut() {
                    self.analyze(annotation);
                }
                if let Some(default) = default.as_deref_mut() {
                    self.analyze(default);
                }

                if parent_tag != Some(NodeTag::TypeDecl) {
                    return Err(ErrorImpl::MemberOutsideType);
                }

                let formal = match type_annotation.as_deref() {
                    Some(annotation) => Some(typed!(annotation)),
                    None => None,
                };

                let Some(default) = default.as_deref() else {
                    return formal.map(Some).ok_or_else(|| ErrorImpl::CannotInferType {
                        name: name.clone(),
                        found: Type::Uncertain.to_string(),
                    });
                };

                if !default.is_literal() && default.tag() != NodeTag::Identifier {
                    return Err(ErrorImpl::InvalidMemberDefault);
                }

                let actual = typed!(default);
                match formal {
                    Some(formal) if equal(&formal, &actual) || can_do_implicit_conversion(&actual, &formal) => {
                        Ok(Some(formal))
                    }
                    Some(formal) => Err(ErrorImpl::FieldTypeMatchError {
                        expected: formal.to_string(),
                        received: actual.to_string(),
                    }),
                    None if actual.kind().is_normal() => Ok(Some(actual)),
                    None => Err(ErrorImpl::CannotInferType {
                        name: name.clone(),
                        found: actual.to_string(),
                    }),
                }
            }
            NodeKind::TypeDecl { name, members, .. } => {
                if self.user_ns.find_type(name).is_some() {
                    return Err(ErrorImpl::TypeAlreadyDeclared { name: name.clone() });
                }

                let mut fields = Vec::with_capacity(members.len());
                let mut complete = true;
                for member in members.iter_mut() {
                    self.analyze(member);
                    let NodeKind::MemberDecl { name, default, .. } = &member.kind else {
                        continue;
                    };
                    complete &= member.ty.is_some();
                    let ty = member.ty.clone().unwrap_or(Type::Uncertain);
                    fields.push(match default {
                        Some(_) => TypeWithName::optional(name, ty),
                        None => TypeWithName::new(name, ty),
                    });
                }

                let ty = Type::Struct(fields);
                debug!(name = name.as_str(), %ty, "user type registered");
                self.user_ns.register_type(name, ty.clone());
                Ok(complete.then_some(ty))
            }
            NodeKind::Import { .. } => Ok(Some(Type::Void)),
            NodeKind::Suite { body } => {
                self.push_scope();
                for stmt in body.iter_mut() {
                    self.analyze(stmt);
                }
                self.pop_scope();

                match body.last() {
                    Some(last) => Ok(last.ty.clone()),
                    None => Ok(Some(Type::Void)),
                }
            }
            NodeKind::Quote { content } => {
                self.analyze(content);
                Ok(content.ty.clone())
            }
        }
    }

    fn loop_control(&self, keyword: &str) -> Visit {
        if self.loop_depth == 0 {
            return Err(ErrorImpl::LoopControlOutsideLoop {
                keyword: keyword.to_string(),
            });
        }
        Ok(Some(Type::Void))
    }

    fn resolve_attribute(&self, target: &Type, name: &str) -> Result<Type, ErrorImpl> {
        if let Some(namespace) = target.as_namespace() {
            if let Some(variable) = namespace.find_variable_type(name) {
                return Ok(variable.clone());
            }
            if let Some(callable) = namespace.find_function(name) {
                return Ok(Type::Callable(callable));
            }
            if let Some(namespace) = namespace.find_namespace(name) {
                return Ok(Type::Namespace(namespace));
            }
            return match namespace.find_type(name) {
                Some(TypeOrCtor::Type(ty)) => Ok(ty.clone()),
                Some(toc) => Ok(Type::TypeOrCtor(Box::new(toc.clone()))),
                None => Err(ErrorImpl::UnknownMember {
                    name: name.to_string(),
                }),
            };
        }

        if let Some(field) = target.field(name) {
            return Ok(field.ty.clone().with_qualifier(target.qualifier().join(field.ty.qualifier())));
        }

        if let Some(method) = self.lookup_method(name, target) {
            return Ok(Type::Callable(method));
        }

        match target.kind() {
            TypeKind::Struct => Err(ErrorImpl::UnknownField {
                type_name: target.to_string(),
                field: name.to_string(),
            }),
            _ => Err(ErrorImpl::MethodNotFound {
                name: name.to_string(),
                self_type: target.to_string(),
            }),
        }
    }

    /// Adds an overload for a function declared in the script.
    fn register_function(&mut self, name: &str, method: bool, params: Vec<TypeWithName>, out: Type) {
        let mut function = self
            .user_functions
            .shift_remove(name)
            .unwrap_or_else(|| BuiltinFunction::new(name));
        function = function.overload(params, out);
        if method {
            function = function.method();
        }

        debug!(name, overloads = function.overloads.len(), method, "user function registered");
        self.user_ns.register_function(Rc::new(function.clone()));
        self.user_functions.insert(name.to_string(), function);
    }

    /// Replaces a call to a namespace macro with the quoted expansion.
    /// Returns whether `node` was rewritten.
    fn expand_macro(&mut self, node: &mut Node) -> Result<bool, ErrorImpl> {
        let NodeKind::Call { func, args } = &node.kind else {
            return Ok(false);
        };
        let NodeKind::Identifier { name } = &func.kind else {
            return Ok(false);
        };
        if self.lookup_variable(name).is_some() || self.user_ns.find_function(name).is_some() {
            return Ok(false);
        }

        let namespace = self.namespace;
        let Some(r#macro) = namespace.find_macro(name) else {
            return Ok(false);
        };

        let mut positional = vec![];
        let mut keywords = IndexMap::new();
        for arg in args.iter().cloned() {
            match arg.kind {
                NodeKind::KwArg { name, value } => {
                    keywords.insert(name, *value);
                }
                _ => positional.push(arg),
            }
        }

        let mut content = r#macro.call(positional, keywords)?;
        self.assign_ids(&mut content);

        trace!(name = r#macro.name.as_str(), expansion = %content, "macro expanded");
        node.kind = NodeKind::Quote {
            content: Box::new(content),
        };
        mark_parent(node);
        Ok(true)
    }

    /// Gives every synthetic node (id 0) a fresh id.
    fn assign_ids(&mut self, node: &mut Node) {
        if node.id == 0 {
            node.id = self.next_id;
            self.next_id += 1;
        }
        for (_, _, child) in node.children_mut() {
            self.assign_ids(child);
        }
    }
}

/// Index and item types bound by `for [index,] item in container`.
fn iteration_bindings(container: &Type, has_index: bool) -> Result<(Type, Type), ErrorImpl> {
    let qualifier = container.qualifier();
    match container.peel() {
        Type::Array(_) | Type::Matrix(_) => {
            let item = container.unit().unwrap_or(Type::Uncertain);
            Ok((Type::Int, item.with_qualifier(qualifier.join(item.qualifier()))))
        }
        Type::Map(key, value) if has_index => Ok(((**key).clone(), (**value).clone())),
        Type::Map(_, _) => Err(ErrorImpl::MapIterationNeedsKey),
        _ => Err(ErrorImpl::NotIterable {
            found: container.to_string(),
        }),
    }
}

/// Type checks one tree. See [`analyze_types`] for a whole program.
pub fn analyze_type(namespace: &Namespace, root: &mut Node) -> Vec<Error> {
    analyze_types(namespace, std::slice::from_mut(root))
}

/// Type checks a parsed program. Every top level statement shares the
/// global scope; each node ends up with its type, or none when analysis
/// of it failed.
pub fn analyze_types(namespace: &Namespace, nodes: &mut [Node]) -> Vec<Error> {
    let mut checker = TypeChecker::new(namespace);
    checker.reserve_ids(nodes);

    for node in nodes.iter_mut() {
        checker.analyze(node);
    }

    debug!(
        statements = nodes.len(),
        errors = checker.errors().len(),
        "type analysis finished"
    );

    checker.into_errors()
}
