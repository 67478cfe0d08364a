/*! Provides a set of tools for reading, writing and applying common logical
transformations on quantified Boolean formulae. */
pub mod error;
pub mod io;
pub mod syntax;
#[cfg(test)]
pub mod test_macros;
pub mod transform;

pub use error::Error;
