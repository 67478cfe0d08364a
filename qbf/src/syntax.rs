/*! Defines an abstract syntax tree (AST) for quantified Boolean formulae. */
pub mod formula;
mod macros;
mod qbf;
pub mod symbol;

pub use formula::{And, Exists, ForAll, Formula, Not, Or};
pub use qbf::{Prefix, Subformulas, QBF};
pub use symbol::Var;
