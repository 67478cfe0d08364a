/*! Implements codecs for the on-disk formats of quantified Boolean formulae. */
pub mod qcir;
pub mod qdimacs;
