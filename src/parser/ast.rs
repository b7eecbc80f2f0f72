// Abstract Syntax Tree for the row filter DSL

use serde::Serialize;

/// A boolean expression over dataset rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Filter {
    Compare(Comparison),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

/// Single `column op literal` test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Column name as written (matched case-insensitively)
    pub column: String,
    pub op: CompareOp,
    pub value: Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Case-insensitive substring match
    Contains,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Text(String),
    Number(f64),
}
