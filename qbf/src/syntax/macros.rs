/*! Implements macros for creating syntactic objects. */

/// Creates a [variable] from a given identifier.
///
/// [variable]: crate::syntax::Var
/// **Example**:
/// ```rust
/// # use qbf::syntax::Var;
/// use qbf::v;
///
/// let var = v!(v);
///
/// assert_eq!(Var::from("v"), var);
/// ```
#[macro_export]
macro_rules! v {
    ($v:ident) => {
        $crate::syntax::Var::from(stringify!($v))
    };
}

/// Creates a literal from a given identifier: a variable formula, or its
/// negation when the identifier is preceded by `-`.
///
/// **Example**:
/// ```rust
/// use qbf::lit;
///
/// assert_eq!("x", lit!(x).to_string());
/// assert_eq!("¬x", lit!(-x).to_string());
/// ```
#[macro_export]
macro_rules! lit {
    (-$v:ident) => {
        $crate::syntax::QBF::not($crate::syntax::QBF::from($crate::v!($v)))
    };
    ($v:ident) => {
        $crate::syntax::QBF::from($crate::v!($v))
    };
}

/// Creates the conjunction of the given formulae.
///
/// **Example**:
/// ```rust
/// use qbf::{and, lit};
///
/// assert_eq!("x ∧ y", and!(lit!(x), lit!(y)).to_string());
/// ```
#[macro_export]
macro_rules! and {
    ($($f:expr),+ $(,)?) => {
        $crate::syntax::QBF::conjoin(vec![$($f),+])
    };
}

/// Creates the disjunction of the given formulae.
///
/// **Example**:
/// ```rust
/// use qbf::{lit, or};
///
/// assert_eq!("x ∨ y", or!(lit!(x), lit!(y)).to_string());
/// ```
#[macro_export]
macro_rules! or {
    ($($f:expr),+ $(,)?) => {
        $crate::syntax::QBF::disjoin(vec![$($f),+])
    };
}

/// Creates a universally quantified formula binding the given identifiers
/// over a formula.
///
/// **Example**:
/// ```rust
/// use qbf::{forall, lit, or};
///
/// assert_eq!(
///     "∀ x, y. (x ∨ y)",
///     forall!([x, y]; or!(lit!(x), lit!(y))).to_string(),
/// );
/// ```
#[macro_export]
macro_rules! forall {
    ([$($v:ident),+ $(,)?]; $f:expr) => {
        $crate::syntax::QBF::from($crate::syntax::ForAll {
            variables: vec![$($crate::v!($v)),+],
            formula: $f,
        })
    };
}

/// Creates an existentially quantified formula binding the given identifiers
/// over a formula.
///
/// **Example**:
/// ```rust
/// use qbf::{exists, lit, or};
///
/// assert_eq!(
///     "∃ x, y. (x ∨ y)",
///     exists!([x, y]; or!(lit!(x), lit!(y))).to_string(),
/// );
/// ```
#[macro_export]
macro_rules! exists {
    ([$($v:ident),+ $(,)?]; $f:expr) => {
        $crate::syntax::QBF::from($crate::syntax::Exists {
            variables: vec![$($crate::v!($v)),+],
            formula: $f,
        })
    };
}
