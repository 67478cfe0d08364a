/*! Implements conversion to Negation Normal Form (NNF) for formulae. */
use super::rewrite::{map_top_down, CancelToken};
use crate::error::Error;
use crate::syntax::{Exists, ForAll, Formula, Not, Var, QBF};

/// Is a wrapper around [`QBF`] that represents a formula in Negation Normal
/// Form (NNF).
///
/// **Hint**: An NNF is a formula where negation is only applied to variables.
///
/// [`QBF`]: crate::syntax::QBF
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NNF(pub(super) QBF);

impl NNF {
    /// Returns a reference to the formula wrapped in the receiver NNF.
    #[inline(always)]
    pub fn formula(&self) -> &QBF {
        &self.0
    }
}

impl From<NNF> for QBF {
    fn from(nnf: NNF) -> Self {
        nnf.0
    }
}

impl Formula for NNF {
    fn free_vars(&self) -> Vec<&Var> {
        self.0.free_vars()
    }
}

// Pushes one negation inwards; repeated to a fixpoint by the kernel.
fn push_not(formula: QBF) -> Result<QBF, Error> {
    match formula {
        QBF::Not(this) => match this.formula {
            QBF::True => Ok(QBF::False),
            QBF::False => Ok(QBF::True),
            f @ QBF::Variable(_) => Ok(QBF::not(f)),
            QBF::Not(inner) => {
                let Not { formula } = *inner;
                Ok(formula)
            }
            QBF::And(inner) => Ok(QBF::disjoin(
                inner.formulas.into_iter().map(QBF::not).collect(),
            )),
            QBF::Or(inner) => Ok(QBF::conjoin(
                inner.formulas.into_iter().map(QBF::not).collect(),
            )),
            QBF::ForAll(inner) => {
                let ForAll { variables, formula } = *inner;
                QBF::exists(variables, QBF::not(formula))
            }
            QBF::Exists(inner) => {
                let Exists { variables, formula } = *inner;
                QBF::forall(variables, QBF::not(formula))
            }
        },
        f => Ok(f),
    }
}

impl QBF {
    /// Transforms the receiver formula to a Negation Normal Form (NNF) by
    /// pushing negations down to the variables.
    ///
    /// The transformation is idempotent and preserves the free variables of
    /// the receiver. It fails with [`Error::Cancelled`] once `token` fires.
    ///
    /// **Example**:
    /// ```rust
    /// # use qbf::transform::CancelToken;
    /// # use qbf::{and, forall, lit, syntax::QBF};
    /// let formula = QBF::not(forall!([x]; and!(lit!(x), lit!(-y))));
    /// let nnf = formula.to_nnf(&CancelToken::new()).unwrap();
    ///
    /// assert_eq!("∃ x. ((¬x) ∨ y)", QBF::from(nnf).to_string());
    /// ```
    pub fn to_nnf(&self, token: &CancelToken) -> Result<NNF, Error> {
        map_top_down(self, &push_not, token).map(NNF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{and, assert_debug_string, exists, forall, lit, or};
    use itertools::Itertools;

    fn nnf(formula: &QBF) -> QBF {
        formula.to_nnf(&CancelToken::new()).unwrap().into()
    }

    #[test]
    fn test_nnf() {
        {
            assert_debug_string!("true", nnf(&QBF::True));
            assert_debug_string!("false", nnf(&QBF::False));
        }
        {
            assert_debug_string!("x", nnf(&lit!(x)));
            assert_debug_string!("~x", nnf(&lit!(-x)));
        }
        {
            let formula = and!(lit!(x), lit!(y));
            assert_debug_string!("x & y", nnf(&formula));
        }
        {
            let formula = or!(lit!(x), lit!(y));
            assert_debug_string!("x | y", nnf(&formula));
        }
        // sanity checking
        {
            assert_debug_string!("false", nnf(&QBF::not(QBF::True)));
            assert_debug_string!("true", nnf(&QBF::not(QBF::False)));
        }
        {
            let formula = QBF::not(QBF::not(lit!(x)));
            assert_debug_string!("x", nnf(&formula));
        }
        {
            let formula = QBF::not(QBF::not(QBF::not(lit!(x))));
            assert_debug_string!("~x", nnf(&formula));
        }
        {
            let formula = QBF::not(and!(lit!(x), lit!(y)));
            assert_debug_string!("(~x) | (~y)", nnf(&formula));
        }
        {
            let formula = QBF::not(or!(lit!(x), lit!(y)));
            assert_debug_string!("(~x) & (~y)", nnf(&formula));
        }
        {
            let formula = QBF::not(and!(lit!(x), lit!(y), lit!(z)));
            assert_debug_string!("(~x) | (~y) | (~z)", nnf(&formula));
        }
        {
            let formula = QBF::not(exists!([x]; lit!(x)));
            assert_debug_string!("! x. (~x)", nnf(&formula));
        }
        {
            let formula = QBF::not(forall!([x]; lit!(x)));
            assert_debug_string!("? x. (~x)", nnf(&formula));
        }
        // recursive application
        {
            let formula = and!(QBF::not(QBF::not(lit!(x))), QBF::not(QBF::not(lit!(y))));
            assert_debug_string!("x & y", nnf(&formula));
        }
        {
            let formula = QBF::not(and!(QBF::not(lit!(x)), QBF::not(lit!(y))));
            assert_debug_string!("x | y", nnf(&formula));
        }
        {
            let formula = QBF::not(forall!([x]; and!(lit!(x), lit!(-y))));
            assert_debug_string!("? x. ((~x) | y)", nnf(&formula));
        }
        {
            let formula = QBF::not(exists!([x]; forall!([y]; or!(lit!(-x), lit!(y)))));
            assert_debug_string!("! x. (? y. (x & (~y)))", nnf(&formula));
        }
        {
            let formula = QBF::not(and!(exists!([x]; lit!(x)), forall!([y]; lit!(y))));
            assert_debug_string!("(! x. (~x)) | (? y. (~y))", nnf(&formula));
        }
    }

    #[test]
    fn test_nnf_is_idempotent() {
        let formulas = vec![
            QBF::not(and!(lit!(x), QBF::not(or!(lit!(y), lit!(-z))))),
            QBF::not(forall!([x]; exists!([y]; and!(lit!(x), lit!(-y))))),
            QBF::not(QBF::not(QBF::not(lit!(x)))),
        ];
        for formula in formulas {
            let once = nnf(&formula);
            assert_eq!(once, nnf(&once));
        }
    }

    #[test]
    fn test_nnf_negations_are_on_variables() {
        let formula = QBF::not(and!(
            or!(lit!(x), QBF::not(exists!([y]; lit!(y)))),
            QBF::not(lit!(z))
        ));
        let result = nnf(&formula);
        for f in result.subformulas() {
            if let QBF::Not(this) = f {
                assert!(matches!(this.formula, QBF::Variable(_)));
            }
        }
    }

    #[test]
    fn test_nnf_preserves_free_variables() {
        let formula = QBF::not(forall!([x]; and!(lit!(x), or!(lit!(y), lit!(-z)))));
        let result = nnf(&formula);
        assert_eq!(
            formula.free_vars().into_iter().sorted().collect_vec(),
            result.free_vars().into_iter().sorted().collect_vec(),
        );
    }

    #[test]
    fn test_nnf_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        let formula = QBF::not(and!(lit!(x), lit!(y)));
        assert!(matches!(
            formula.to_nnf(&token),
            Err(Error::Cancelled)
        ));
    }
}
