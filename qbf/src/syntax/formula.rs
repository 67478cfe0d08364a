/*! Introduces an abstraction for formulae and various generic types as building
blocks for quantified Boolean formulae. */
use super::Var;
use itertools::Itertools;
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Is the trait of formulae, including quantified Boolean formulae.
pub trait Formula {
    /// Returns a list of free variable symbols in the receiver.
    ///
    /// **Note**: In the list of variables, each variable symbol appears only
    /// once even if it is present at multiple positions of the receiver.
    fn free_vars(&self) -> Vec<&Var>;
}

/// Represents the negation of a formula.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Not<F> {
    /// Is the negated formula.
    pub formula: F,
}

impl<F: Formula> Formula for Not<F> {
    fn free_vars(&self) -> Vec<&Var> {
        self.formula.free_vars()
    }
}

impl<F: Formula + fmt::Display> fmt::Display for Not<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "¬{}", self.formula)
    }
}

/// Represents the conjunction of two or more formulae.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct And<F> {
    /// Is the ordered list of conjuncts.
    pub formulas: Vec<F>,
}

impl<F: Formula> Formula for And<F> {
    fn free_vars(&self) -> Vec<&Var> {
        self.formulas
            .iter()
            .flat_map(|f| f.free_vars())
            .unique()
            .collect()
    }
}

impl<F: Formula + fmt::Display> fmt::Display for And<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fs = self.formulas.iter().map(|f| f.to_string()).collect_vec();
        write!(f, "{}", fs.join(" ∧ "))
    }
}

/// Represents the disjunction of two or more formulae.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Or<F> {
    /// Is the ordered list of disjuncts.
    pub formulas: Vec<F>,
}

impl<F: Formula> Formula for Or<F> {
    fn free_vars(&self) -> Vec<&Var> {
        self.formulas
            .iter()
            .flat_map(|f| f.free_vars())
            .unique()
            .collect()
    }
}

impl<F: Formula + fmt::Display> fmt::Display for Or<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fs = self.formulas.iter().map(|f| f.to_string()).collect_vec();
        write!(f, "{}", fs.join(" ∨ "))
    }
}

/// Represents a universally quantified formula.
///
/// **Note**: The variables bound by a quantifier form a set; the stored order
/// is preserved for printing and serialization but is not observable through
/// equality or hashing.
#[derive(Clone, Debug)]
pub struct ForAll<F> {
    /// Is the list of variables bound by this quantifier.
    pub variables: Vec<Var>,

    /// Is the scope (formula) of the quantified formula.
    pub formula: F,
}

impl<F: Formula> Formula for ForAll<F> {
    fn free_vars(&self) -> Vec<&Var> {
        self.formula
            .free_vars()
            .into_iter()
            .filter(|v| !self.variables.contains(v))
            .collect()
    }
}

impl<F: PartialEq> PartialEq for ForAll<F> {
    fn eq(&self, other: &Self) -> bool {
        sorted_vars(&self.variables) == sorted_vars(&other.variables)
            && self.formula == other.formula
    }
}

impl<F: Eq> Eq for ForAll<F> {}

impl<F: Hash> Hash for ForAll<F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        sorted_vars(&self.variables).hash(state);
        self.formula.hash(state);
    }
}

impl<F: Formula + fmt::Display> fmt::Display for ForAll<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vs = self.variables.iter().map(|v| v.to_string()).collect_vec();
        write!(f, "∀ {}. {}", vs.join(", "), self.formula)
    }
}

/// Represents an existentially quantified formula.
///
/// **Note**: The variables bound by a quantifier form a set; the stored order
/// is preserved for printing and serialization but is not observable through
/// equality or hashing.
#[derive(Clone, Debug)]
pub struct Exists<F> {
    /// Is the list of variables bound by this quantifier.
    pub variables: Vec<Var>,

    /// Is the scope (formula) of the quantified formula.
    pub formula: F,
}

impl<F: Formula> Formula for Exists<F> {
    fn free_vars(&self) -> Vec<&Var> {
        self.formula
            .free_vars()
            .into_iter()
            .filter(|v| !self.variables.contains(v))
            .collect()
    }
}

impl<F: PartialEq> PartialEq for Exists<F> {
    fn eq(&self, other: &Self) -> bool {
        sorted_vars(&self.variables) == sorted_vars(&other.variables)
            && self.formula == other.formula
    }
}

impl<F: Eq> Eq for Exists<F> {}

impl<F: Hash> Hash for Exists<F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        sorted_vars(&self.variables).hash(state);
        self.formula.hash(state);
    }
}

impl<F: Formula + fmt::Display> fmt::Display for Exists<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vs = self.variables.iter().map(|v| v.to_string()).collect_vec();
        write!(f, "∃ {}. {}", vs.join(", "), self.formula)
    }
}

fn sorted_vars(variables: &[Var]) -> Vec<&Var> {
    let mut vs = variables.iter().collect_vec();
    vs.sort();
    vs
}
