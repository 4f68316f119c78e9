use std::fmt::Display;

use thiserror::Error;

use crate::Location;

/// A diagnostic produced by the tokenizer, the parser or the type checker.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{position}: {internal_error}")]
pub struct Error {
    internal_error: ErrorImpl,
    position: Location,
}

/// Parse diagnostics share the representation of every other diagnostic.
pub type ParseError = Error;

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Location) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Location {
        &self.position
    }

    pub fn get_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn row(&self) -> i32 {
        self.position.row
    }

    pub fn col(&self) -> i32 {
        self.position.column
    }

    pub fn message(&self) -> String {
        self.internal_error.to_string()
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedCharacter { .. } => "UnrecognisedCharacter",
            ErrorImpl::InvalidIndent { .. } => "InvalidIndent",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedEof { .. } => "UnexpectedEof",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::InvalidColor { .. } => "InvalidColor",
            ErrorImpl::InvalidReassignTarget => "InvalidReassignTarget",
            ErrorImpl::InvalidDefaultValue { .. } => "InvalidDefaultValue",
            ErrorImpl::DuplicateDefaultClause => "DuplicateDefaultClause",
            ErrorImpl::UnknownIdentifier { .. } => "UnknownIdentifier",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::UnknownNamespace { .. } => "UnknownNamespace",
            ErrorImpl::NotATypeConstructor { .. } => "NotATypeConstructor",
            ErrorImpl::MissingTypeArguments { .. } => "MissingTypeArguments",
            ErrorImpl::TypeArgumentCount { .. } => "TypeArgumentCount",
            ErrorImpl::UnknownOperator { .. } => "UnknownOperator",
            ErrorImpl::UnsupportedBinaryOperation { .. } => "UnsupportedBinaryOperation",
            ErrorImpl::UnsupportedUnaryOperation { .. } => "UnsupportedUnaryOperation",
            ErrorImpl::UnknownField { .. } => "UnknownField",
            ErrorImpl::UnknownMember { .. } => "UnknownMember",
            ErrorImpl::MethodNotFound { .. } => "MethodNotFound",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::NotGeneric { .. } => "NotGeneric",
            ErrorImpl::NoOverloads { .. } => "NoOverloads",
            ErrorImpl::ArgumentMismatch { .. } => "ArgumentMismatch",
            ErrorImpl::CannotInferType { .. } => "CannotInferType",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::FieldTypeMatchError { .. } => "FieldTypeMatchError",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::TypeAlreadyDeclared { .. } => "TypeAlreadyDeclared",
            ErrorImpl::NotATuple { .. } => "NotATuple",
            ErrorImpl::TupleArityMismatch { .. } => "TupleArityMismatch",
            ErrorImpl::ConditionNotBool { .. } => "ConditionNotBool",
            ErrorImpl::CaseOutsideSwitch => "CaseOutsideSwitch",
            ErrorImpl::CaseConditionMismatch { .. } => "CaseConditionMismatch",
            ErrorImpl::LoopBoundNotNumeric { .. } => "LoopBoundNotNumeric",
            ErrorImpl::TernaryMismatch { .. } => "TernaryMismatch",
            ErrorImpl::MemberOutsideType => "MemberOutsideType",
            ErrorImpl::InvalidMemberDefault => "InvalidMemberDefault",
            ErrorImpl::NotIterable { .. } => "NotIterable",
            ErrorImpl::MapIterationNeedsKey => "MapIterationNeedsKey",
            ErrorImpl::LoopControlOutsideLoop { .. } => "LoopControlOutsideLoop",
            ErrorImpl::HistoryOffsetNotInt { .. } => "HistoryOffsetNotInt",
            ErrorImpl::EmptyUnion => "EmptyUnion",
            ErrorImpl::MacroArgumentCount { .. } => "MacroArgumentCount",
            ErrorImpl::MacroArgumentMissing { .. } => "MacroArgumentMissing",
            ErrorImpl::MacroUnknownArgument { .. } => "MacroUnknownArgument",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::InvalidIndent { .. } => ErrorTip::Suggestion(String::from(
                "Blocks are indented in steps of 4 columns",
            )),
            ErrorImpl::UnterminatedString => {
                ErrorTip::Suggestion(String::from("Close the string with a matching quote"))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::InvalidColor { .. } => ErrorTip::Suggestion(String::from(
                "Colors are written as #RGB, #RGBA, #RRGGBB or #RRGGBBAA",
            )),
            ErrorImpl::InvalidReassignTarget => ErrorTip::Suggestion(String::from(
                "Use `=` to declare a new variable",
            )),
            ErrorImpl::UnknownIdentifier { name } => {
                ErrorTip::Suggestion(format!("Declare `{}` before using it", name))
            }
            ErrorImpl::VariableAlreadyDeclared { variable } => ErrorTip::Suggestion(format!(
                "Use `:=` to assign a new value to `{}`",
                variable
            )),
            ErrorImpl::CannotInferType { name, .. } => ErrorTip::Suggestion(format!(
                "Add a type annotation to `{}`",
                name
            )),
            ErrorImpl::MapIterationNeedsKey => ErrorTip::Suggestion(String::from(
                "Write `for [key, value] in m`",
            )),
            ErrorImpl::LoopControlOutsideLoop { keyword } => ErrorTip::Suggestion(format!(
                "`{}` can only appear inside `for` or `while`",
                keyword
            )),
            _ => ErrorTip::None,
        }
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    // Lexical
    #[error("unrecognised character {character:?}")]
    UnrecognisedCharacter { character: char },
    #[error("indentation of {width} columns does not match any enclosing block")]
    InvalidIndent { width: usize },
    #[error("unterminated string literal")]
    UnterminatedString,

    // Syntax
    #[error("Expect {expected}, but got {found:?}")]
    UnexpectedToken { expected: String, found: String },
    #[error("Expect {expected}, but reached the end of input")]
    UnexpectedEof { expected: String },
    #[error("invalid number literal {token:?}")]
    NumberParseError { token: String },
    #[error("invalid color literal {token:?}")]
    InvalidColor { token: String },
    #[error("only identifiers and attributes can be reassigned")]
    InvalidReassignTarget,
    #[error("default value must be a literal or an identifier, got {found:?}")]
    InvalidDefaultValue { found: String },
    #[error("switch statement already has a default clause")]
    DuplicateDefaultClause,

    // Semantic
    #[error("unknown identifier {name:?}")]
    UnknownIdentifier { name: String },
    #[error("unknown type {name:?}")]
    UnknownType { name: String },
    #[error("unknown namespace {name:?}")]
    UnknownNamespace { name: String },
    #[error("{name:?} does not take type arguments")]
    NotATypeConstructor { name: String },
    #[error("type constructor {name:?} needs type arguments")]
    MissingTypeArguments { name: String },
    #[error("{name:?} takes {expected} type argument(s), received {received}")]
    TypeArgumentCount {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("unknown operator '{operator}'")]
    UnknownOperator { operator: String },
    #[error("operator '{operator}' cannot be applied to {left} and {right}")]
    UnsupportedBinaryOperation {
        operator: String,
        left: String,
        right: String,
    },
    #[error("operator '{operator}' cannot be applied to {operand}")]
    UnsupportedUnaryOperation { operator: String, operand: String },
    #[error("{type_name} has no field {field:?}")]
    UnknownField { type_name: String, field: String },
    #[error("namespace has no member {name:?}")]
    UnknownMember { name: String },
    #[error("no method {name:?} for {self_type}")]
    MethodNotFound { name: String, self_type: String },
    #[error("{found} is not callable")]
    NotCallable { found: String },
    #[error("function {name:?} does not accept type arguments")]
    NotGeneric { name: String },
    #[error("function {name:?} cannot be called")]
    NoOverloads { name: String },
    #[error("no overload of {name:?} accepts ({arguments})")]
    ArgumentMismatch { name: String, arguments: String },
    #[error("cannot infer the type of {name:?} from {found}")]
    CannotInferType { name: String, found: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMatchError { expected: String, received: String },
    #[error("argument types do not match: expected {expected}, received {received}")]
    ArgumentTypeMatchError { expected: String, received: String },
    #[error("field types do not match: expected {expected}, received {received}")]
    FieldTypeMatchError { expected: String, received: String },
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("type {name:?} already declared")]
    TypeAlreadyDeclared { name: String },
    #[error("cannot destructure {found}, a tuple is required")]
    NotATuple { found: String },
    #[error("tuple has {received} items but {expected} names are declared")]
    TupleArityMismatch { expected: usize, received: usize },
    #[error("{construct} condition must be bool, got {found}")]
    ConditionNotBool { construct: String, found: String },
    #[error("case clause used outside of a switch statement")]
    CaseOutsideSwitch,
    #[error("case condition does not match the switch target: expected {expected}, received {received}")]
    CaseConditionMismatch { expected: String, received: String },
    #[error("{bound} value of a for loop must be int or float, got {found}")]
    LoopBoundNotNumeric { bound: String, found: String },
    #[error("ternary branches have incompatible types {left} and {right}")]
    TernaryMismatch { left: String, right: String },
    #[error("fields can only be declared inside a type declaration")]
    MemberOutsideType,
    #[error("field default must be a literal or an identifier")]
    InvalidMemberDefault,
    #[error("cannot iterate over {found}")]
    NotIterable { found: String },
    #[error("iterating a map needs both a key and a value name")]
    MapIterationNeedsKey,
    #[error("'{keyword}' outside of a loop")]
    LoopControlOutsideLoop { keyword: String },
    #[error("history offset must be int, got {found}")]
    HistoryOffsetNotInt { found: String },
    #[error("a union needs at least one member type")]
    EmptyUnion,
    #[error("macro {name:?} only accepts {expected} arguments")]
    MacroArgumentCount { name: String, expected: usize },
    #[error("argument {argument:?} of macro {name:?} is not optional")]
    MacroArgumentMissing { name: String, argument: String },
    #[error("macro {name:?} has no parameter {argument:?}")]
    MacroUnknownArgument { name: String, argument: String },
}
