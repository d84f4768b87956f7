//! Decision variables and affine expressions over them.
//!
//! - `Variable`: index handle issued by a `Program`.
//! - `LinExpr`: `Σ coeff·var + constant`, kept as an unsorted term list.
//!   Duplicate variables are allowed; the backend sums them on assembly.

use std::ops::{Add, Mul, Neg, Sub};

use nalgebra::{DMatrix, DVector};

/// Continuous decision variable (index into its program).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(pub(crate) usize);

impl Variable {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Affine expression `Σ coeff·var + constant`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinExpr {
    pub(crate) terms: Vec<(Variable, f64)>,
    pub(crate) constant: f64,
}

impl LinExpr {
    #[inline]
    pub fn constant(c: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: c,
        }
    }

    #[inline]
    pub fn term(v: Variable, coeff: f64) -> Self {
        Self {
            terms: vec![(v, coeff)],
            constant: 0.0,
        }
    }

    /// `Σ vars`.
    pub fn sum(vars: &[Variable]) -> Self {
        Self {
            terms: vars.iter().map(|&v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    /// `coeffs · vars`. Lengths must agree (checked by callers).
    pub fn dot(coeffs: &DVector<f64>, vars: &[Variable]) -> Self {
        debug_assert_eq!(coeffs.len(), vars.len());
        Self {
            terms: vars.iter().zip(coeffs.iter()).map(|(&v, &c)| (v, c)).collect(),
            constant: 0.0,
        }
    }

    /// Append `coeff·v` in place.
    #[inline]
    pub fn push_term(&mut self, v: Variable, coeff: f64) {
        self.terms.push((v, coeff));
    }

    pub fn terms(&self) -> &[(Variable, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Evaluate against a full primal vector (indexed by `Variable::index`).
    pub fn eval(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * values[v.0])
            .sum::<f64>()
            + self.constant
    }

    /// Scale every term and the constant.
    pub fn scaled(mut self, s: f64) -> Self {
        for term in &mut self.terms {
            term.1 *= s;
        }
        self.constant *= s;
        self
    }
}

impl From<Variable> for LinExpr {
    #[inline]
    fn from(v: Variable) -> Self {
        LinExpr::term(v, 1.0)
    }
}

impl From<f64> for LinExpr {
    #[inline]
    fn from(c: f64) -> Self {
        LinExpr::constant(c)
    }
}

impl Add for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: LinExpr) -> Self::Output {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl Sub for LinExpr {
    type Output = LinExpr;
    fn sub(self, rhs: LinExpr) -> Self::Output {
        self + (-rhs)
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;
    fn neg(self) -> Self::Output {
        self.scaled(-1.0)
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;
    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        self.scaled(rhs)
    }
}

impl Add<f64> for LinExpr {
    type Output = LinExpr;
    #[inline]
    fn add(mut self, rhs: f64) -> Self::Output {
        self.constant += rhs;
        self
    }
}

impl Sub<f64> for LinExpr {
    type Output = LinExpr;
    #[inline]
    fn sub(mut self, rhs: f64) -> Self::Output {
        self.constant -= rhs;
        self
    }
}

impl Add<Variable> for LinExpr {
    type Output = LinExpr;
    #[inline]
    fn add(mut self, rhs: Variable) -> Self::Output {
        self.terms.push((rhs, 1.0));
        self
    }
}

impl Sub<Variable> for LinExpr {
    type Output = LinExpr;
    #[inline]
    fn sub(mut self, rhs: Variable) -> Self::Output {
        self.terms.push((rhs, -1.0));
        self
    }
}

/// Rows of `M x + v`. Shapes must agree (checked by callers).
pub fn affine_rows(m: &DMatrix<f64>, v: &DVector<f64>, x: &[Variable]) -> Vec<LinExpr> {
    debug_assert_eq!(m.ncols(), x.len());
    debug_assert_eq!(m.nrows(), v.len());
    (0..m.nrows())
        .map(|i| {
            let mut row = LinExpr::constant(v[i]);
            for (j, &xj) in x.iter().enumerate() {
                let c = m[(i, j)];
                if c != 0.0 {
                    row.push_term(xj, c);
                }
            }
            row
        })
        .collect()
}

/// Rows of `x - p`.
pub fn offset_rows(x: &[Variable], p: &DVector<f64>) -> Vec<LinExpr> {
    debug_assert_eq!(x.len(), p.len());
    x.iter()
        .zip(p.iter())
        .map(|(&xi, &pi)| LinExpr::from(xi) - pi)
        .collect()
}

/// Rows of `x` as plain expressions.
pub fn var_rows(x: &[Variable]) -> Vec<LinExpr> {
    x.iter().map(|&xi| LinExpr::from(xi)).collect()
}
