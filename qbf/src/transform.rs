/*! Implements a number of common transformations on quantified Boolean
formulae. */
mod nnf;
mod pnf;
mod rewrite;

pub use nnf::NNF;
pub use pnf::{Strategy, PNF, STRATEGIES};
pub use rewrite::{map_bottom_up, map_top_down, CancelToken};
