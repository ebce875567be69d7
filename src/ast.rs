//! Syntax tree produced by the parser and walked by the interpreter.
//!
//! Functions are shared behind `Rc` so closures created from the same
//! literal point at one definition.
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct Program {
    pub body: Vec<Statement>,
    /// Set by a `"use strict"` prologue or by the embedder.
    pub strict: bool,
}

#[derive(Clone, Debug)]
pub enum Statement {
    Empty,
    Expression(Expression),
    Block(Vec<Statement>),
    Decl(VarDecl),
    Function(Rc<FunctionDef>),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    ForIn(ForInStmt),
    Return(Option<Expression>),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expression),
    Try(TryStmt),
    Switch(SwitchStmt),
    Labeled(String, Box<Statement>),
    Debugger,
}

/// One `var`, `let` or `const` list. `bindings` keeps source order.
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub kind: VarKind,
    pub bindings: Vec<VarBinding>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    /// `let` and `const` are block scoped and start in the TDZ.
    pub fn is_lexical(self) -> bool {
        self != VarKind::Var
    }
}

#[derive(Clone, Debug)]
pub struct VarBinding {
    pub pattern: Pattern,
    pub init: Option<Expression>,
}

/// Binding and assignment targets.
#[derive(Clone, Debug)]
pub enum Pattern {
    Identifier(String),
    /// Holes are `None`.
    Array(Vec<Option<Pattern>>),
    Object(Vec<PatternProp>),
    /// `target = default`
    Assign(Box<Pattern>, Box<Expression>),
    Rest(Box<Pattern>),
    /// `a.x` or `a[0]`; assignment targets only, never declarations.
    Member(Box<Expression>),
}

#[derive(Clone, Debug)]
pub enum PatternProp {
    KeyValue(PropertyKey, Pattern),
    Shorthand(String),
}

#[derive(Clone, Debug)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    This,
    Array(Vec<Option<Expression>>),
    Object(Vec<Property>),
    Function(Rc<FunctionDef>),
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Logical(LogicalOp, Box<Expression>, Box<Expression>),
    /// Operator, prefix flag, operand.
    Update(UpdateOp, bool, Box<Expression>),
    Assign(AssignOp, Box<Expression>, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    Call(Box<Expression>, Vec<Expression>),
    New(Box<Expression>, Vec<Expression>),
    Member(Box<Expression>, MemberKey),
    Typeof(Box<Expression>),
    Void(Box<Expression>),
    Delete(Box<Expression>),
    Sequence(Vec<Expression>),
}

#[derive(Clone, Debug)]
pub enum MemberKey {
    /// `o.name`
    Dot(String),
    /// `o[expr]`
    Computed(Box<Expression>),
}

#[derive(Clone, Debug)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    LShift,
    RShift,
    URShift,
    BitAnd,
    BitOr,
    BitXor,
    In,
    Instanceof,
}

/// Short-circuiting operators; the right side may never run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalescing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ExpAssign,
    LShiftAssign,
    RShiftAssign,
    URShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
}

impl AssignOp {
    /// Operator a compound assignment combines with; plain `=` has none.
    pub fn binary_op(self) -> Option<BinaryOp> {
        let op = match self {
            AssignOp::Assign => return None,
            AssignOp::AddAssign => BinaryOp::Add,
            AssignOp::SubAssign => BinaryOp::Sub,
            AssignOp::MulAssign => BinaryOp::Mul,
            AssignOp::DivAssign => BinaryOp::Div,
            AssignOp::ModAssign => BinaryOp::Mod,
            AssignOp::ExpAssign => BinaryOp::Exp,
            AssignOp::LShiftAssign => BinaryOp::LShift,
            AssignOp::RShiftAssign => BinaryOp::RShift,
            AssignOp::URShiftAssign => BinaryOp::URShift,
            AssignOp::BitAndAssign => BinaryOp::BitAnd,
            AssignOp::BitOrAssign => BinaryOp::BitOr,
            AssignOp::BitXorAssign => BinaryOp::BitXor,
        };
        Some(op)
    }
}

/// Object literal entry. `shorthand` entries may carry a cover
/// initializer (`{ a = 1 }`) that is only legal once reinterpreted as a
/// pattern.
#[derive(Clone, Debug)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expression,
    pub shorthand: bool,
}

#[derive(Clone, Debug)]
pub enum PropertyKey {
    Identifier(String),
    String(String),
    Number(f64),
    Computed(Box<Expression>),
}

#[derive(Clone, Debug)]
pub struct IfStmt {
    pub test: Expression,
    pub then_branch: Box<Statement>,
    pub else_branch: Option<Box<Statement>>,
}

#[derive(Clone, Debug)]
pub struct WhileStmt {
    pub test: Expression,
    pub body: Box<Statement>,
}

/// Body runs before the first test.
#[derive(Clone, Debug)]
pub struct DoWhileStmt {
    pub body: Box<Statement>,
    pub test: Expression,
}

#[derive(Clone, Debug)]
pub struct ForStmt {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInit {
    Decl(VarDecl),
    Expression(Expression),
}

/// `for (target in object) body`
#[derive(Clone, Debug)]
pub struct ForInStmt {
    pub target: ForInTarget,
    pub object: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInTarget {
    /// A single declared binding; sloppy `var k = init` keeps its initializer.
    Decl(VarDecl),
    /// An existing binding or member written on every iteration.
    Pattern(Pattern),
}

#[derive(Clone, Debug)]
pub struct TryStmt {
    pub block: Vec<Statement>,
    pub catch_clause: Option<CatchClause>,
    pub finally_block: Option<Vec<Statement>>,
}

/// `catch` with an optional binding; `catch { }` leaves `param` empty.
#[derive(Clone, Debug)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub struct SwitchStmt {
    pub subject: Expression,
    pub cases: Vec<SwitchCase>,
}

#[derive(Clone, Debug)]
pub struct SwitchCase {
    /// Absent for `default:`.
    pub test: Option<Expression>,
    pub body: Vec<Statement>,
}

/// Where a function came from; decides its self-name binding, its
/// `this` handling and whether it can construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Declaration,
    Expression,
    Arrow,
    Method,
}

#[derive(Debug)]
pub struct FunctionDef {
    pub name: Option<String>,
    pub kind: FunctionKind,
    pub params: Vec<Pattern>,
    pub body: Vec<Statement>,
    pub is_strict: bool,
}

impl FunctionDef {
    pub fn is_arrow(&self) -> bool {
        self.kind == FunctionKind::Arrow
    }

    /// True when every parameter is a bare identifier. Anything else gives
    /// the parameters their own scope tier and an unmapped `arguments`.
    pub fn has_simple_params(&self) -> bool {
        self.params.iter().all(|p| matches!(p, Pattern::Identifier(_)))
    }

    /// Name bound inside a named function expression's own scope.
    pub fn self_binding_name(&self) -> Option<&str> {
        if self.kind != FunctionKind::Expression {
            return None;
        }
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// The `length` a function reports: parameters up to the first
    /// default or rest.
    pub fn expected_argument_count(&self) -> usize {
        self.params
            .iter()
            .position(|p| matches!(p, Pattern::Assign(..) | Pattern::Rest(_)))
            .unwrap_or(self.params.len())
    }
}

impl Pattern {
    /// Appends every identifier this pattern binds, left to right.
    pub fn bound_names(&self, out: &mut Vec<String>) {
        match self {
            Pattern::Identifier(name) => out.push(name.clone()),
            Pattern::Array(items) => items.iter().flatten().for_each(|p| p.bound_names(out)),
            Pattern::Object(props) => {
                for prop in props {
                    match prop {
                        PatternProp::KeyValue(_, value) => value.bound_names(out),
                        PatternProp::Shorthand(name) => out.push(name.clone()),
                    }
                }
            }
            Pattern::Assign(inner, _) | Pattern::Rest(inner) => inner.bound_names(out),
            Pattern::Member(_) => {}
        }
    }
}

impl Expression {
    /// Anonymous function literals pick up the name of the binding or key
    /// they are assigned to.
    pub fn is_anonymous_function_definition(&self) -> bool {
        matches!(self, Expression::Function(f) if f.name.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(params: Vec<Pattern>) -> FunctionDef {
        FunctionDef {
            name: None,
            kind: FunctionKind::Declaration,
            params,
            body: Vec::new(),
            is_strict: false,
        }
    }

    fn ident(name: &str) -> Pattern {
        Pattern::Identifier(name.into())
    }

    #[test]
    fn length_stops_at_first_default_or_rest() {
        let one = Box::new(Expression::Literal(Literal::Number(1.0)));
        let f = function(vec![
            ident("a"),
            Pattern::Assign(Box::new(ident("b")), one),
            ident("c"),
        ]);
        assert_eq!(f.expected_argument_count(), 1);
        assert!(!f.has_simple_params());
        let g = function(vec![ident("a"), ident("b")]);
        assert_eq!(g.expected_argument_count(), 2);
        assert!(g.has_simple_params());
    }

    #[test]
    fn bound_names_walk_nested_patterns() {
        let pat = Pattern::Array(vec![
            Some(ident("a")),
            None,
            Some(Pattern::Object(vec![
                PatternProp::Shorthand("b".into()),
                PatternProp::KeyValue(PropertyKey::Identifier("k".into()), ident("c")),
            ])),
            Some(Pattern::Rest(Box::new(ident("d")))),
        ]);
        let mut names = Vec::new();
        pat.bound_names(&mut names);
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn only_named_expressions_bind_their_own_name() {
        let mut f = function(Vec::new());
        f.name = Some("f".into());
        assert_eq!(f.self_binding_name(), None);
        f.kind = FunctionKind::Expression;
        assert_eq!(f.self_binding_name(), Some("f"));
    }
}
