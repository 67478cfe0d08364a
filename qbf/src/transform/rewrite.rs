/*! Implements a generic rewriting kernel for rebuilding formulae bottom-up or
top-down. */
use crate::error::Error;
use crate::syntax::QBF;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Is a cooperative cancellation signal shared between the caller of a
/// transformation and the rewriting kernel.
///
/// The kernel checks the token between rewrite steps; once [`cancel`] has been
/// called, the running transformation fails with [`Error::Cancelled`] and no
/// partial formula is returned. Cloning the token yields a handle to the same
/// signal.
///
/// [`cancel`]: CancelToken::cancel
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Returns a fresh token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the cancellation signal.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once [`cancel`] has been called on this token or any of
    /// its clones.
    ///
    /// [`cancel`]: CancelToken::cancel
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Rebuilds `formula` bottom-up: the children of every node are rewritten
/// first and `rule` is then applied to the node built from the rewritten
/// children, until the node reaches a fixpoint of `rule`.
///
/// The kernel flattens conjunctions nested directly under conjunctions and
/// disjunctions nested directly under disjunctions, and collapses n-ary nodes
/// left with fewer than two children.
pub fn map_bottom_up(
    formula: &QBF,
    rule: &impl Fn(QBF) -> Result<QBF, Error>,
    token: &CancelToken,
) -> Result<QBF, Error> {
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let rebuilt = match formula {
        QBF::True | QBF::False | QBF::Variable(_) => formula.clone(),
        QBF::Not(this) => QBF::not(map_bottom_up(&this.formula, rule, token)?),
        QBF::And(this) => {
            let formulas = this
                .formulas
                .iter()
                .map(|f| map_bottom_up(f, rule, token))
                .collect::<Result<Vec<_>, _>>()?;
            QBF::conjoin(formulas)
        }
        QBF::Or(this) => {
            let formulas = this
                .formulas
                .iter()
                .map(|f| map_bottom_up(f, rule, token))
                .collect::<Result<Vec<_>, _>>()?;
            QBF::disjoin(formulas)
        }
        QBF::ForAll(this) => QBF::forall(
            this.variables.clone(),
            map_bottom_up(&this.formula, rule, token)?,
        )?,
        QBF::Exists(this) => QBF::exists(
            this.variables.clone(),
            map_bottom_up(&this.formula, rule, token)?,
        )?,
    };
    apply(rebuilt, rule, token)
}

/// Rebuilds `formula` top-down: `rule` is applied to every node until the
/// node reaches a fixpoint of `rule`, and the children of the resulting node
/// are then rewritten recursively.
///
/// Flattening and collapsing of n-ary nodes follow [`map_bottom_up`].
pub fn map_top_down(
    formula: &QBF,
    rule: &impl Fn(QBF) -> Result<QBF, Error>,
    token: &CancelToken,
) -> Result<QBF, Error> {
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }
    match apply(formula.clone(), rule, token)? {
        f @ QBF::True | f @ QBF::False | f @ QBF::Variable(_) => Ok(f),
        QBF::Not(this) => Ok(QBF::not(map_top_down(&this.formula, rule, token)?)),
        QBF::And(this) => {
            let formulas = this
                .formulas
                .iter()
                .map(|f| map_top_down(f, rule, token))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(QBF::conjoin(formulas))
        }
        QBF::Or(this) => {
            let formulas = this
                .formulas
                .iter()
                .map(|f| map_top_down(f, rule, token))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(QBF::disjoin(formulas))
        }
        QBF::ForAll(this) => QBF::forall(
            this.variables.clone(),
            map_top_down(&this.formula, rule, token)?,
        ),
        QBF::Exists(this) => QBF::exists(
            this.variables.clone(),
            map_top_down(&this.formula, rule, token)?,
        ),
    }
}

// Applies `rule` at the node until a fixpoint is reached.
fn apply(
    formula: QBF,
    rule: &impl Fn(QBF) -> Result<QBF, Error>,
    token: &CancelToken,
) -> Result<QBF, Error> {
    let mut current = formula;
    loop {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let next = rule(current.clone())?;
        if next == current {
            return Ok(current);
        }
        current = next;
    }
}
