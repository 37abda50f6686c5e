//! Query language AST

use crate::domain::Value;

/// A parsed query statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Update(Update),
    Delete(Delete),
    Insert(Insert),
}

impl Statement {
    /// The file the statement operates on
    pub fn file(&self) -> &str {
        match self {
            Statement::Select(s) => &s.file,
            Statement::Update(u) => &u.file,
            Statement::Delete(d) => &d.file,
            Statement::Insert(i) => &i.file,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub projection: Projection,
    pub file: String,
    pub filter: Option<Filter>,
    pub order: Vec<OrderKey>,
    pub limit: Option<usize>,
    pub into: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Fields(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub file: String,
    pub assignments: Vec<Assignment>,
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub file: String,
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub file: String,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: String,
    pub value: Literal,
}

/// A WHERE clause: one condition, or exactly one binary combination
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Single(Condition),
    And(Condition, Condition),
    Or(Condition, Condition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub test: Test,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    Eq(Literal),
    Gt(Literal),
    Lt(Literal),
    Contains(Literal),
    IsNull,
    IsNotNull,
}

/// A literal, typed by its lexical shape at parse time
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

impl Literal {
    /// Converts to a field value; NULL has no value form
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Literal::Str(s) => Some(Value::Str(s.clone())),
            Literal::Num(n) => Some(Value::Num(*n)),
            Literal::Bool(b) => Some(Value::Bool(*b)),
            Literal::Null => None,
        }
    }

    /// String form used for lexicographic comparison and containment
    pub fn render(&self) -> String {
        self.to_value().map(|v| v.render()).unwrap_or_default()
    }
}
