/*! Defines the syntax of quantified Boolean formulae. */
use super::{formula::*, Var};
use crate::error::Error;
use itertools::Itertools;
use rayon::prelude::*;
use std::fmt;

/// Is an abstract syntax tree (AST) for quantified Boolean formulae.
///
/// A value of this type is an immutable finite tree. Transformations never
/// mutate their input; they build and return new trees.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum QBF {
    /// Is logical top (⊤) or truth.
    True,

    /// Is logical bottom (⟘) or falsehood.
    False,

    /// Is a propositional variable, wrapping a [`Var`].
    Variable(Var),

    /// Is the negation of a formula, wrapping a [`Not`].
    Not(Box<Not<QBF>>),

    /// Is an n-ary conjunction of formulae, wrapping an [`And`].
    And(And<QBF>),

    /// Is an n-ary disjunction of formulae, wrapping an [`Or`].
    Or(Or<QBF>),

    /// Is a universally quantified formula, wrapping a [`ForAll`].
    ForAll(Box<ForAll<QBF>>),

    /// Is an existentially quantified formula, wrapping an [`Exists`].
    Exists(Box<Exists<QBF>>),
}

impl From<Var> for QBF {
    fn from(value: Var) -> Self {
        Self::Variable(value)
    }
}

impl From<Not<QBF>> for QBF {
    fn from(value: Not<QBF>) -> Self {
        Self::Not(Box::new(value))
    }
}

impl From<And<QBF>> for QBF {
    fn from(value: And<QBF>) -> Self {
        Self::And(value)
    }
}

impl From<Or<QBF>> for QBF {
    fn from(value: Or<QBF>) -> Self {
        Self::Or(value)
    }
}

impl From<ForAll<QBF>> for QBF {
    fn from(value: ForAll<QBF>) -> Self {
        Self::ForAll(Box::new(value))
    }
}

impl From<Exists<QBF>> for QBF {
    fn from(value: Exists<QBF>) -> Self {
        Self::Exists(Box::new(value))
    }
}

// Deduplicates `variables` by name, preserving the first occurrence order, and
// verifies that every name is legal and that at least one remains.
fn quantifier_variables(variables: Vec<Var>) -> Result<Vec<Var>, Error> {
    if variables.is_empty() {
        return Err(Error::invalid_structure(
            "a quantifier must bind at least one variable",
        ));
    }
    for v in &variables {
        if !Var::is_valid_name(v.name()) {
            return Err(Error::invalid_structure(format!(
                "illegal variable name `{}`",
                v.name()
            )));
        }
    }
    Ok(variables.into_iter().unique().collect())
}

impl QBF {
    /// Returns a formula consisting of a single variable named `name`.
    ///
    /// Fails with [`Error::InvalidStructure`] unless `name` is a non-empty
    /// string of printable, non-whitespace characters.
    pub fn variable(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if !Var::is_valid_name(&name) {
            return Err(Error::invalid_structure(format!(
                "illegal variable name `{}`",
                name
            )));
        }
        Ok(Self::Variable(Var::from(name)))
    }

    /// Returns the negation of `formula`.
    #[allow(clippy::should_implement_trait)]
    // Disallow `formula.not()` intentionally:
    #[inline(always)]
    pub fn not(formula: Self) -> Self {
        Not { formula }.into()
    }

    /// Returns the conjunction of `formulas`.
    ///
    /// Fails with [`Error::InvalidStructure`] when fewer than two conjuncts
    /// are given. Conjuncts that are themselves conjunctions are merged into
    /// the new node.
    pub fn and(formulas: Vec<Self>) -> Result<Self, Error> {
        if formulas.len() < 2 {
            return Err(Error::invalid_structure(
                "a conjunction must have at least two formulae",
            ));
        }
        Ok(Self::conjoin(formulas))
    }

    /// Returns the disjunction of `formulas`.
    ///
    /// Fails with [`Error::InvalidStructure`] when fewer than two disjuncts
    /// are given. Disjuncts that are themselves disjunctions are merged into
    /// the new node.
    pub fn or(formulas: Vec<Self>) -> Result<Self, Error> {
        if formulas.len() < 2 {
            return Err(Error::invalid_structure(
                "a disjunction must have at least two formulae",
            ));
        }
        Ok(Self::disjoin(formulas))
    }

    /// Returns a universally quantified formula binding `variables` over
    /// `formula`.
    ///
    /// The variables of a quantifier form a set: duplicates collapse,
    /// preserving the first occurrence order. Fails with
    /// [`Error::InvalidStructure`] when no variable or an illegal variable
    /// name is given.
    pub fn forall(variables: Vec<Var>, formula: Self) -> Result<Self, Error> {
        let variables = quantifier_variables(variables)?;
        Ok(ForAll { variables, formula }.into())
    }

    /// Returns an existentially quantified formula binding `variables` over
    /// `formula`.
    ///
    /// The variables of a quantifier form a set: duplicates collapse,
    /// preserving the first occurrence order. Fails with
    /// [`Error::InvalidStructure`] when no variable or an illegal variable
    /// name is given.
    pub fn exists(variables: Vec<Var>, formula: Self) -> Result<Self, Error> {
        let variables = quantifier_variables(variables)?;
        Ok(Exists { variables, formula }.into())
    }

    /// Returns the conjunction of `formulas`, collapsing degenerate cases:
    /// no conjunct yields [`QBF::True`], a single conjunct yields that
    /// conjunct, and conjuncts that are themselves conjunctions are merged
    /// into the new node.
    pub fn conjoin(formulas: Vec<Self>) -> Self {
        let mut flat = Vec::with_capacity(formulas.len());
        for f in formulas {
            match f {
                Self::And(this) => flat.extend(this.formulas),
                f => flat.push(f),
            }
        }
        match flat.len() {
            0 => Self::True,
            1 => flat.swap_remove(0),
            _ => And { formulas: flat }.into(),
        }
    }

    /// Returns the disjunction of `formulas`, collapsing degenerate cases:
    /// no disjunct yields [`QBF::False`], a single disjunct yields that
    /// disjunct, and disjuncts that are themselves disjunctions are merged
    /// into the new node.
    pub fn disjoin(formulas: Vec<Self>) -> Self {
        let mut flat = Vec::with_capacity(formulas.len());
        for f in formulas {
            match f {
                Self::Or(this) => flat.extend(this.formulas),
                f => flat.push(f),
            }
        }
        match flat.len() {
            0 => Self::False,
            1 => flat.swap_remove(0),
            _ => Or { formulas: flat }.into(),
        }
    }

    /// Returns true if the receiver is a Boolean constant.
    #[inline(always)]
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::True | Self::False)
    }

    /// Returns true if the receiver is a negation.
    #[inline(always)]
    pub fn is_negation(&self) -> bool {
        matches!(self, Self::Not(_))
    }

    /// Returns true if the receiver is a quantified formula.
    #[inline(always)]
    pub fn is_quantifier(&self) -> bool {
        matches!(self, Self::ForAll(_) | Self::Exists(_))
    }

    /// Returns true if the receiver is a literal, that is, a variable or the
    /// negation of a variable.
    pub fn is_literal(&self) -> bool {
        match self {
            Self::Variable(_) => true,
            Self::Not(this) => matches!(this.formula, Self::Variable(_)),
            _ => false,
        }
    }

    /// Returns true if the receiver is a clause: a literal, or a disjunction
    /// of literals.
    pub fn is_clause(&self) -> bool {
        match self {
            Self::Or(this) => this.formulas.iter().all(Self::is_literal),
            f => f.is_literal(),
        }
    }

    /// Returns true if the receiver is a CNF matrix: a clause, or a
    /// conjunction of clauses.
    pub fn is_cnf(&self) -> bool {
        match self {
            Self::And(this) => this.formulas.iter().all(Self::is_clause),
            f => f.is_clause(),
        }
    }

    /// Returns an iterator over all subformulae of the receiver, including
    /// the receiver itself, in pre-order (document order).
    pub fn subformulas(&self) -> Subformulas {
        Subformulas { stack: vec![self] }
    }

    /// Returns an iterator over every occurrence of a variable atom in the
    /// receiver, bound or free, in document order.
    pub fn variables(&self) -> impl Iterator<Item = &Var> {
        self.subformulas().filter_map(|f| match f {
            Self::Variable(v) => Some(v),
            _ => None,
        })
    }

    /// Returns an iterator over the free variables of the receiver; each
    /// variable symbol is produced once.
    pub fn free_variables(&self) -> impl Iterator<Item = &Var> {
        self.free_vars().into_iter()
    }

    /// Returns a list of variable symbols bound by some quantifier of the
    /// receiver; each variable symbol appears only once.
    pub fn bound_vars(&self) -> Vec<&Var> {
        self.subformulas()
            .flat_map(|f| match f {
                Self::ForAll(this) => this.variables.as_slice(),
                Self::Exists(this) => this.variables.as_slice(),
                _ => &[],
            })
            .unique()
            .collect()
    }

    /// Returns an iterator over the quantifiers of the receiver's prefix,
    /// from the outermost inward, ending at the first non-quantifier node.
    pub fn prefix(&self) -> Prefix {
        Prefix { cursor: Some(self) }
    }

    /// Returns the largest quantifier-free subformula reached by removing the
    /// prefix. On a formula in prenex normal form this is the matrix; on any
    /// other formula only the leading quantifiers are stripped and inner
    /// quantifiers are left in place.
    pub fn skeleton(&self) -> &QBF {
        let mut cursor = self;
        loop {
            match cursor {
                Self::ForAll(this) => cursor = &this.formula,
                Self::Exists(this) => cursor = &this.formula,
                f => return f,
            }
        }
    }

    /// Returns a parallel iterator over all subformulae of the receiver,
    /// including the receiver itself. The produced multiset equals the one
    /// produced by [`QBF::subformulas`].
    pub fn par_subformulas(&self) -> impl ParallelIterator<Item = &QBF> {
        self.subformulas().collect_vec().into_par_iter()
    }

    /// Returns a parallel iterator over every occurrence of a variable atom
    /// in the receiver. The produced multiset equals the one produced by
    /// [`QBF::variables`].
    pub fn par_variables(&self) -> impl ParallelIterator<Item = &Var> {
        self.variables().collect_vec().into_par_iter()
    }

    /// Returns a parallel iterator over the free variables of the receiver.
    /// The produced multiset equals the one produced by
    /// [`QBF::free_variables`].
    pub fn par_free_variables(&self) -> impl ParallelIterator<Item = &Var> {
        self.free_vars().into_par_iter()
    }
}

/// Is the iterator returned by [`QBF::subformulas`].
pub struct Subformulas<'a> {
    stack: Vec<&'a QBF>,
}

impl<'a> Iterator for Subformulas<'a> {
    type Item = &'a QBF;

    fn next(&mut self) -> Option<&'a QBF> {
        let node = self.stack.pop()?;
        match node {
            QBF::True | QBF::False | QBF::Variable(_) => {}
            QBF::Not(this) => self.stack.push(&this.formula),
            QBF::And(this) => self.stack.extend(this.formulas.iter().rev()),
            QBF::Or(this) => self.stack.extend(this.formulas.iter().rev()),
            QBF::ForAll(this) => self.stack.push(&this.formula),
            QBF::Exists(this) => self.stack.push(&this.formula),
        }
        Some(node)
    }
}

/// Is the iterator returned by [`QBF::prefix`].
pub struct Prefix<'a> {
    cursor: Option<&'a QBF>,
}

impl<'a> Iterator for Prefix<'a> {
    type Item = &'a QBF;

    fn next(&mut self) -> Option<&'a QBF> {
        let node = self.cursor?;
        match node {
            QBF::ForAll(this) => {
                self.cursor = Some(&this.formula);
                Some(node)
            }
            QBF::Exists(this) => {
                self.cursor = Some(&this.formula);
                Some(node)
            }
            _ => {
                self.cursor = None;
                None
            }
        }
    }
}

impl Formula for QBF {
    fn free_vars(&self) -> Vec<&Var> {
        match self {
            Self::True | Self::False => Vec::new(),
            Self::Variable(v) => vec![v],
            Self::Not(this) => this.free_vars(),
            Self::And(this) => this.free_vars(),
            Self::Or(this) => this.free_vars(),
            Self::ForAll(this) => this.free_vars(),
            Self::Exists(this) => this.free_vars(),
        }
    }
}

// used for pretty printing a formula
impl fmt::Display for QBF {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        fn parens(formula: &QBF) -> String {
            match formula {
                QBF::True | QBF::False | QBF::Variable(_) => formula.to_string(),
                _ => format!("({})", formula),
            }
        }
        match self {
            Self::True => write!(f, "⊤"),
            Self::False => write!(f, "⟘"),
            Self::Variable(v) => write!(f, "{}", v),
            Self::Not(this) => write!(f, "¬{}", parens(&this.formula)),
            Self::And(this) => {
                let fs = this.formulas.iter().map(parens).collect_vec();
                write!(f, "{}", fs.join(" ∧ "))
            }
            Self::Or(this) => {
                let fs = this.formulas.iter().map(parens).collect_vec();
                write!(f, "{}", fs.join(" ∨ "))
            }
            Self::ForAll(this) => {
                let vs = this.variables.iter().map(|v| v.to_string()).collect_vec();
                write!(f, "∀ {}. {}", vs.join(", "), parens(&this.formula))
            }
            Self::Exists(this) => {
                let vs = this.variables.iter().map(|v| v.to_string()).collect_vec();
                write!(f, "∃ {}. {}", vs.join(", "), parens(&this.formula))
            }
        }
    }
}

// contains no non-ascii characters
impl fmt::Debug for QBF {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        fn parens(formula: &QBF) -> String {
            match formula {
                QBF::True | QBF::False | QBF::Variable(_) => format!("{:?}", formula),
                _ => format!("({:?})", formula),
            }
        }
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Variable(v) => write!(f, "{}", v),
            Self::Not(this) => write!(f, "~{}", parens(&this.formula)),
            Self::And(this) => {
                let fs = this.formulas.iter().map(parens).collect_vec();
                write!(f, "{}", fs.join(" & "))
            }
            Self::Or(this) => {
                let fs = this.formulas.iter().map(parens).collect_vec();
                write!(f, "{}", fs.join(" | "))
            }
            Self::ForAll(this) => {
                let vs = this.variables.iter().map(|v| v.to_string()).collect_vec();
                write!(f, "! {}. {}", vs.join(", "), parens(&this.formula))
            }
            Self::Exists(this) => {
                let vs = this.variables.iter().map(|v| v.to_string()).collect_vec();
                write!(f, "? {}. {}", vs.join(", "), parens(&this.formula))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{and, assert_debug_string, exists, forall, lit, or, v};
    use std::collections::HashMap;

    #[test]
    fn test_construct_variable() {
        assert!(QBF::variable("x").is_ok());
        assert!(QBF::variable("17").is_ok());
        assert!(matches!(
            QBF::variable(""),
            Err(Error::InvalidStructure { .. })
        ));
        assert!(matches!(
            QBF::variable("a b"),
            Err(Error::InvalidStructure { .. })
        ));
    }

    #[test]
    fn test_construct_nary_arity() {
        assert!(matches!(
            QBF::and(vec![]),
            Err(Error::InvalidStructure { .. })
        ));
        assert!(matches!(
            QBF::and(vec![lit!(x)]),
            Err(Error::InvalidStructure { .. })
        ));
        assert!(QBF::and(vec![lit!(x), lit!(y)]).is_ok());
        assert!(matches!(
            QBF::or(vec![]),
            Err(Error::InvalidStructure { .. })
        ));
        assert!(matches!(
            QBF::or(vec![lit!(x)]),
            Err(Error::InvalidStructure { .. })
        ));
        assert!(QBF::or(vec![lit!(x), lit!(y)]).is_ok());
    }

    #[test]
    fn test_construct_quantifier() {
        assert!(matches!(
            QBF::forall(vec![], lit!(x)),
            Err(Error::InvalidStructure { .. })
        ));
        assert!(matches!(
            QBF::exists(vec![Var::from("a b")], lit!(x)),
            Err(Error::InvalidStructure { .. })
        ));
        // duplicates collapse
        let f = QBF::forall(vec![v!(x), v!(x), v!(y)], lit!(x)).unwrap();
        match f {
            QBF::ForAll(this) => assert_eq!(vec![v!(x), v!(y)], this.variables),
            _ => panic!("expecting a universally quantified formula"),
        }
    }

    #[test]
    fn test_construct_flattens_nested() {
        let nested = QBF::and(vec![and!(lit!(x), lit!(y)), lit!(z)]).unwrap();
        assert_debug_string!("x & y & z", nested);

        let nested = QBF::or(vec![or!(lit!(x), lit!(y)), lit!(z)]).unwrap();
        assert_debug_string!("x | y | z", nested);
    }

    #[test]
    fn test_conjoin_collapses() {
        assert_eq!(QBF::True, QBF::conjoin(vec![]));
        assert_eq!(lit!(x), QBF::conjoin(vec![lit!(x)]));
        assert_debug_string!("x & y", QBF::conjoin(vec![lit!(x), lit!(y)]));
    }

    #[test]
    fn test_disjoin_collapses() {
        assert_eq!(QBF::False, QBF::disjoin(vec![]));
        assert_eq!(lit!(x), QBF::disjoin(vec![lit!(x)]));
        assert_debug_string!("x | y", QBF::disjoin(vec![lit!(x), lit!(y)]));
    }

    #[test]
    fn test_predicates() {
        assert!(QBF::True.is_constant());
        assert!(QBF::False.is_constant());
        assert!(!lit!(x).is_constant());

        assert!(lit!(x).is_literal());
        assert!(lit!(-x).is_literal());
        assert!(!QBF::not(and!(lit!(x), lit!(y))).is_literal());

        assert!(lit!(-x).is_negation());
        assert!(!lit!(x).is_negation());

        assert!(forall!([x]; lit!(x)).is_quantifier());
        assert!(exists!([x]; lit!(x)).is_quantifier());
        assert!(!lit!(x).is_quantifier());

        assert!(or!(lit!(x), lit!(-y)).is_clause());
        assert!(lit!(x).is_clause());
        assert!(!and!(lit!(x), lit!(y)).is_clause());

        assert!(and!(or!(lit!(x), lit!(-y)), lit!(y)).is_cnf());
        assert!(or!(lit!(x), lit!(-y)).is_cnf());
        assert!(!or!(and!(lit!(x), lit!(y)), lit!(z)).is_cnf());
    }

    #[test]
    fn test_subformulas_preorder() {
        let formula = and!(or!(lit!(x), lit!(-y)), lit!(z));
        let subs = formula.subformulas().collect_vec();
        assert_eq!(6, subs.len());
        assert_eq!(&formula, subs[0]);
        assert_debug_string!("x | (~y)", subs[1]);
        assert_debug_string!("x", subs[2]);
        assert_debug_string!("~y", subs[3]);
        assert_debug_string!("y", subs[4]);
        assert_debug_string!("z", subs[5]);
    }

    #[test]
    fn test_variables_includes_bound_and_free() {
        let formula = forall!([x]; and!(lit!(x), lit!(y)));
        let vars = formula.variables().collect_vec();
        assert_eq!(vec![&v!(x), &v!(y)], vars);
    }

    #[test]
    fn test_free_vars() {
        let formula = forall!([x]; and!(lit!(x), lit!(y)));
        assert_eq!(vec![&v!(y)], formula.free_vars());

        let formula = and!(lit!(x), lit!(x), lit!(y));
        assert_eq!(vec![&v!(x), &v!(y)], formula.free_vars());
    }

    #[test]
    fn test_bound_vars() {
        let formula = forall!([x]; exists!([y, z]; and!(lit!(x), lit!(y))));
        assert_eq!(vec![&v!(x), &v!(y), &v!(z)], formula.bound_vars());
    }

    #[test]
    fn test_prefix_stops_at_matrix() {
        let formula = forall!([x]; exists!([y]; and!(lit!(x), forall!([z]; lit!(z)))));
        let prefix = formula.prefix().collect_vec();
        assert_eq!(2, prefix.len());
        assert!(prefix.iter().all(|q| q.is_quantifier()));
    }

    #[test]
    fn test_skeleton() {
        let matrix = and!(lit!(x), lit!(y));
        let formula = forall!([x]; exists!([y]; matrix.clone()));
        assert_eq!(&matrix, formula.skeleton());

        // inner quantifiers are left in place
        let inner = and!(lit!(x), forall!([z]; lit!(z)));
        let formula = forall!([x]; inner.clone());
        assert_eq!(&inner, formula.skeleton());
    }

    #[test]
    fn test_parallel_streams_agree_with_sequential() {
        let formula = forall!([x]; or!(and!(lit!(x), lit!(y)), lit!(x), lit!(-z)));

        fn count(vars: Vec<&Var>) -> HashMap<&Var, usize> {
            let mut counts: HashMap<&Var, usize> = HashMap::new();
            vars.into_iter().for_each(|v| *counts.entry(v).or_insert(0) += 1);
            counts
        }

        let sequential = count(formula.variables().collect());
        let parallel = count(formula.par_variables().collect());
        assert_eq!(sequential, parallel);

        assert_eq!(
            formula.subformulas().count(),
            formula.par_subformulas().count()
        );

        let sequential = count(formula.free_variables().collect());
        let parallel = count(formula.par_free_variables().collect());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_equality_is_structural() {
        let left = forall!([x, y]; and!(lit!(x), lit!(y)));
        let right = forall!([y, x]; and!(lit!(x), lit!(y)));
        assert_eq!(left, right);

        let right = forall!([y, x]; and!(lit!(y), lit!(x)));
        assert_ne!(left, right);
    }

    #[test]
    fn test_print() {
        assert_eq!("⊤", QBF::True.to_string());
        assert_eq!("⟘", QBF::False.to_string());
        assert_eq!("x", lit!(x).to_string());
        assert_eq!("¬x", lit!(-x).to_string());
        assert_eq!("x ∧ (¬y)", and!(lit!(x), lit!(-y)).to_string());
        assert_eq!(
            "∀ x, y. (x ∨ y)",
            forall!([x, y]; or!(lit!(x), lit!(y))).to_string()
        );
        assert_eq!(
            "∃ x. (¬x)",
            exists!([x]; lit!(-x)).to_string()
        );
    }

    #[test]
    fn test_debug_print() {
        assert_debug_string!("true", QBF::True);
        assert_debug_string!("false", QBF::False);
        assert_debug_string!("~x", lit!(-x));
        assert_debug_string!("x & (~y) & z", and!(lit!(x), lit!(-y), lit!(z)));
        assert_debug_string!(
            "! x. (? y. (x | y))",
            forall!([x]; exists!([y]; or!(lit!(x), lit!(y))))
        );
    }
}
