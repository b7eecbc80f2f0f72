// Row filter DSL parser module

pub mod ast;
pub mod filter;
pub mod lexer;

// Public API re-exports
pub use ast::{CompareOp, Comparison, Filter, Literal};
pub use filter::parse_filter;
