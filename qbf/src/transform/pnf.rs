/*! Implements conversion to Prenex Normal Form (PNF) for formulae in NNF,
parameterized by a prenexing strategy. */
use super::nnf::NNF;
use super::rewrite::{map_bottom_up, map_top_down, CancelToken};
use crate::error::Error;
use crate::syntax::{Exists, ForAll, Formula, Var, QBF};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

/// Is a prenexing strategy, deciding which quantifiers are raised towards the
/// outside of the prefix and which are kept as low as legally possible.
///
/// All strategies share one hoisting algorithm and differ only in the two
/// predicates [`select_forall`] and [`select_exists`]:
///
/// | Strategy                 | select_forall                | select_exists                |
/// |--------------------------|------------------------------|------------------------------|
/// | [`ForAllDownExistsUp`]   | `n_critical <= n_qpath + 1`  | `true`                       |
/// | [`ExistsDownForAllUp`]   | `true`                       | `n_critical <= n_qpath + 1`  |
/// | [`ForAllUpExistsUp`]     | `true`                       | `true`                       |
/// | [`ForAllDownExistsDown`] | `n_critical <= n_qpath + 1`  | `n_critical <= n_qpath + 1`  |
///
/// [`select_forall`]: Strategy::select_forall
/// [`select_exists`]: Strategy::select_exists
/// [`ForAllDownExistsUp`]: Strategy::ForAllDownExistsUp
/// [`ExistsDownForAllUp`]: Strategy::ExistsDownForAllUp
/// [`ForAllUpExistsUp`]: Strategy::ForAllUpExistsUp
/// [`ForAllDownExistsDown`]: Strategy::ForAllDownExistsDown
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Strategy {
    /// ∀↓∃↑: raise existential quantifiers aggressively.
    ForAllDownExistsUp,

    /// ∃↓∀↑: raise universal quantifiers aggressively.
    ExistsDownForAllUp,

    /// ∀↑∃↑: always raise quantifiers of both kinds.
    ForAllUpExistsUp,

    /// ∀↓∃↓: raise quantifiers only when forced.
    ForAllDownExistsDown,
}

impl Strategy {
    /// Decides whether a universal quantifier is raised, given the number of
    /// universal quantifiers (`n_qpath`) and critical quantifiers
    /// (`n_critical`) already passed along the path up from its node.
    pub fn select_forall(self, n_qpath: usize, n_critical: usize) -> bool {
        match self {
            Self::ForAllDownExistsUp | Self::ForAllDownExistsDown => n_critical <= n_qpath + 1,
            Self::ExistsDownForAllUp | Self::ForAllUpExistsUp => true,
        }
    }

    /// Decides whether an existential quantifier is raised, given the number
    /// of existential quantifiers (`n_qpath`) and critical quantifiers
    /// (`n_critical`) already passed along the path up from its node.
    pub fn select_exists(self, n_qpath: usize, n_critical: usize) -> bool {
        match self {
            Self::ExistsDownForAllUp | Self::ForAllDownExistsDown => n_critical <= n_qpath + 1,
            Self::ForAllDownExistsUp | Self::ForAllUpExistsUp => true,
        }
    }

    fn select(self, kind: Kind, n_qpath: usize, n_critical: usize) -> bool {
        match kind {
            Kind::ForAll => self.select_forall(n_qpath, n_critical),
            Kind::Exists => self.select_exists(n_qpath, n_critical),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ForAllDownExistsUp => "forall-down-exists-up",
            Self::ExistsDownForAllUp => "exists-down-forall-up",
            Self::ForAllUpExistsUp => "forall-up-exists-up",
            Self::ForAllDownExistsDown => "forall-down-exists-down",
        };
        write!(f, "{}", name)
    }
}

/// Is a wrapper around [`QBF`] that represents a formula in Prenex Normal
/// Form (PNF).
///
/// **Hint**: A PNF is a formula with all quantifiers and bound variables at
/// the front, followed by a quantifier-free part.
///
/// [`QBF`]: crate::syntax::QBF
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PNF(QBF);

impl PNF {
    /// Returns a reference to the formula wrapped in the receiver PNF.
    #[inline(always)]
    pub fn formula(&self) -> &QBF {
        &self.0
    }

    /// Returns the quantifier-free matrix of the receiver PNF.
    #[inline(always)]
    pub fn matrix(&self) -> &QBF {
        self.0.skeleton()
    }
}

impl From<PNF> for QBF {
    fn from(pnf: PNF) -> Self {
        pnf.0
    }
}

// Prenexing never introduces a negation over a non-variable, so the result of
// prenexing an NNF is still in NNF.
impl From<PNF> for NNF {
    fn from(pnf: PNF) -> Self {
        NNF(pnf.0)
    }
}

impl Formula for PNF {
    fn free_vars(&self) -> Vec<&Var> {
        self.0.free_vars()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Kind {
    ForAll,
    Exists,
}

// A quantifier level split off a subformula's prefix. The `raised` flag
// caches the strategy's verdict for the level, computed from the quantifiers
// above it on its own path.
#[derive(Clone, Debug)]
struct Block {
    kind: Kind,
    variables: Vec<Var>,
    raised: bool,
}

// Splits `formula` into its prefix levels and its matrix, annotating each
// level with the strategy's verdict.
fn split_prefix(formula: QBF, strategy: Strategy) -> (Vec<Block>, QBF) {
    let mut raw: Vec<(Kind, Vec<Var>)> = Vec::new();
    let mut cursor = formula;
    loop {
        match cursor {
            QBF::ForAll(this) => {
                let ForAll { variables, formula } = *this;
                raw.push((Kind::ForAll, variables));
                cursor = formula;
            }
            QBF::Exists(this) => {
                let Exists { variables, formula } = *this;
                raw.push((Kind::Exists, variables));
                cursor = formula;
            }
            matrix => {
                let mut n_forall = 0;
                let mut n_exists = 0;
                let mut blocks = Vec::with_capacity(raw.len());
                for (kind, variables) in raw {
                    let (n_qpath, n_critical) = match kind {
                        Kind::ForAll => (n_forall, n_exists),
                        Kind::Exists => (n_exists, n_forall),
                    };
                    let raised = strategy.select(kind, n_qpath, n_critical);
                    match kind {
                        Kind::ForAll => n_forall += 1,
                        Kind::Exists => n_exists += 1,
                    }
                    blocks.push(Block {
                        kind,
                        variables,
                        raised,
                    });
                }
                return (blocks, matrix);
            }
        }
    }
}

// Appends `block` to the merged prefix, either extending the innermost level
// or opening a new one.
fn place(result: &mut Vec<Block>, block: Block, merge: bool) {
    if merge {
        if let Some(tail) = result.last_mut() {
            for v in block.variables {
                if !tail.variables.contains(&v) {
                    tail.variables.push(v);
                }
            }
            return;
        }
    }
    result.push(block);
}

// Interleaves two prefix chains, preserving the internal order of each.
// Raised levels move as far out as legal, merging into the innermost level of
// the result when it has the same kind; all other levels sink. Ties are
// broken in favor of the left chain.
fn merge_chains(left: Vec<Block>, right: Vec<Block>) -> Vec<Block> {
    if left.is_empty() {
        return right;
    }
    if right.is_empty() {
        return left;
    }

    enum Take {
        Left(bool),
        Right(bool),
    }

    let mut result: Vec<Block> = Vec::new();
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let l = left.peek().map(|b| (b.kind, b.raised));
        let r = right.peek().map(|b| (b.kind, b.raised));
        let tail = result.last().map(|b| b.kind);
        let take = match (l, r) {
            (None, None) => break,
            (Some((kind, raised)), None) => Take::Left(raised && tail == Some(kind)),
            (None, Some((kind, raised))) => Take::Right(raised && tail == Some(kind)),
            (Some((l_kind, l_raised)), Some((r_kind, r_raised))) => {
                if l_raised && tail == Some(l_kind) {
                    Take::Left(true)
                } else if r_raised && tail == Some(r_kind) {
                    Take::Right(true)
                } else if l_raised {
                    Take::Left(false)
                } else if r_raised {
                    Take::Right(false)
                } else {
                    Take::Left(false)
                }
            }
        };
        match take {
            Take::Left(merge) => {
                if let Some(block) = left.next() {
                    place(&mut result, block, merge);
                }
            }
            Take::Right(merge) => {
                if let Some(block) = right.next() {
                    place(&mut result, block, merge);
                }
            }
        }
    }
    result
}

// Appends a postfix to `name` until the result is no longer used.
fn fresh_name(name: &str, used: &HashSet<String>) -> String {
    let mut fresh = name.to_string();
    while used.contains(&fresh) {
        fresh.push('`');
    }
    fresh
}

// Renames free occurrences of `from` in a quantifier-free matrix.
fn rename(
    matrix: &QBF,
    from: &Var,
    to: &Var,
    token: &CancelToken,
) -> Result<QBF, Error> {
    let rule = |f: QBF| match f {
        QBF::Variable(v) if v == *from => Ok(QBF::Variable(to.clone())),
        f => Ok(f),
    };
    map_top_down(matrix, &rule, token)
}

// Hoists the prefixes of the already-prenexed operands of a conjunction or
// disjunction above the operator, renaming any bound variable that collides
// with a free variable of a sibling operand or with an already-hoisted bound
// name.
fn hoist_operator(
    formulas: Vec<QBF>,
    conjunction: bool,
    strategy: Strategy,
    used: &RefCell<HashSet<String>>,
    token: &CancelToken,
) -> Result<QBF, Error> {
    let free: Vec<HashSet<String>> = formulas
        .iter()
        .map(|f| {
            f.free_vars()
                .into_iter()
                .map(|v| v.name().to_string())
                .collect()
        })
        .collect();

    let split: Vec<(Vec<Block>, QBF)> = formulas
        .into_iter()
        .map(|f| split_prefix(f, strategy))
        .collect();

    if split.iter().all(|(chain, _)| chain.is_empty()) {
        let matrices = split.into_iter().map(|(_, matrix)| matrix).collect();
        return Ok(if conjunction {
            QBF::conjoin(matrices)
        } else {
            QBF::disjoin(matrices)
        });
    }

    let mut taken: HashSet<String> = HashSet::new();
    let mut merged: Vec<Block> = Vec::new();
    let mut matrices: Vec<QBF> = Vec::with_capacity(split.len());

    for (index, (mut chain, mut matrix)) in split.into_iter().enumerate() {
        let mut avoid = taken.clone();
        for (other, names) in free.iter().enumerate() {
            if other != index {
                avoid.extend(names.iter().cloned());
            }
        }

        for level in 0..chain.len() {
            for i in 0..chain[level].variables.len() {
                let name = chain[level].variables[i].name().to_string();
                if avoid.contains(&name) {
                    let fresh = fresh_name(&name, &used.borrow());
                    used.borrow_mut().insert(fresh.clone());
                    let from = chain[level].variables[i].clone();
                    let to = Var::from(fresh);
                    chain[level].variables[i] = to.clone();
                    // occurrences in the matrix belong to a deeper level when
                    // one rebinds the name
                    let shadowed = chain[level + 1..]
                        .iter()
                        .any(|deeper| deeper.variables.iter().any(|w| w.name() == from.name()));
                    if !shadowed {
                        matrix = rename(&matrix, &from, &to, token)?;
                    }
                    taken.insert(to.name().to_string());
                } else {
                    taken.insert(name);
                }
            }
        }

        merged = merge_chains(merged, chain);
        matrices.push(matrix);
    }

    let mut result = if conjunction {
        QBF::conjoin(matrices)
    } else {
        QBF::disjoin(matrices)
    };
    for block in merged.into_iter().rev() {
        result = match block.kind {
            Kind::ForAll => QBF::forall(block.variables, result)?,
            Kind::Exists => QBF::exists(block.variables, result)?,
        };
    }
    Ok(result)
}

impl NNF {
    /// Transforms the receiver NNF to an alpha-equivalent Prenex Normal Form
    /// (PNF), moving quantifiers into the prefix as directed by `strategy`.
    ///
    /// The transformation is idempotent, returns a formula already in PNF
    /// unchanged under every strategy, and preserves the free variables of
    /// the receiver. It fails with [`Error::Cancelled`] once `token` fires.
    ///
    /// **Example**:
    /// ```rust
    /// # use qbf::transform::{CancelToken, Strategy};
    /// # use qbf::{and, exists, forall, lit, syntax::QBF};
    /// let token = CancelToken::new();
    /// let formula = and!(forall!([x]; lit!(x)), exists!([y]; lit!(y)));
    /// let pnf = formula
    ///     .to_nnf(&token)
    ///     .unwrap()
    ///     .to_pnf(Strategy::ForAllUpExistsUp, &token)
    ///     .unwrap();
    ///
    /// assert_eq!("∀ x. (∃ y. (x ∧ y))", QBF::from(pnf).to_string());
    /// ```
    pub fn to_pnf(&self, strategy: Strategy, token: &CancelToken) -> Result<PNF, Error> {
        let used: HashSet<String> = self
            .formula()
            .variables()
            .chain(self.formula().bound_vars())
            .map(|v| v.name().to_string())
            .collect();
        let used = RefCell::new(used);
        let rule = |f: QBF| match f {
            QBF::And(this) => hoist_operator(this.formulas, true, strategy, &used, token),
            QBF::Or(this) => hoist_operator(this.formulas, false, strategy, &used, token),
            f => Ok(f),
        };
        map_bottom_up(self.formula(), &rule, token).map(PNF)
    }
}

/// Is the list of all prenexing strategies, in a stable order.
pub const STRATEGIES: [Strategy; 4] = [
    Strategy::ForAllDownExistsUp,
    Strategy::ExistsDownForAllUp,
    Strategy::ForAllUpExistsUp,
    Strategy::ForAllDownExistsDown,
];
