//! SQL-flavored query engine over task trees
//!
//! `parse` turns query text into an AST, `eval` answers SELECTs, and
//! `mutate` applies UPDATE / DELETE / INSERT to a parsed forest.

pub mod ast;
pub mod eval;
pub mod mutate;
pub mod parse;

pub use ast::{Delete, Insert, Projection, Select, Statement, Update};
pub use eval::select;
pub use mutate::{delete, insert, update, MutateError};
pub use parse::{parse_query, ParseError};
