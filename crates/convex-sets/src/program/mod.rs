//! Conic program builder (LP / QP / SOCP) backed by Clarabel.
//!
//! Purpose
//! - Give convex sets a concrete model to write into: continuous variables,
//!   affine equality/inequality rows, Lorentz cones and convex costs.
//! - Hand out `Binding` handles so callers can track what a set emitted.
//!
//! Conventions
//! - Equality rows mean `row == 0`, inequality rows mean `row <= 0`.
//! - A Lorentz-cone constraint over rows `[r0, r1, .., rk]` means
//!   `r0 >= ||(r1, .., rk)||₂`.
//! - The builder never solves implicitly; `solve()` is always explicit.
//! - `checkpoint()`/`rollback()` give emission its all-or-nothing behavior.

mod backend;
mod expr;

pub use expr::{affine_rows, offset_rows, var_rows, LinExpr, Variable};

use nalgebra::DVector;

use crate::cfg::SolverCfg;
use crate::error::{Result, SetError};

/// What kind of rows a `Binding` refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    LinearEquality,
    LinearInequality,
    LorentzCone,
}

/// Handle of a constraint added to a `Program`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    id: usize,
    kind: ConstraintKind,
    rows: usize,
}

impl Binding {
    pub fn id(&self) -> usize {
        self.id
    }
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }
    pub fn num_rows(&self) -> usize {
        self.rows
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Constraint {
    pub(crate) kind: ConstraintKind,
    pub(crate) rows: Vec<LinExpr>,
}

/// Snapshot of a program's sizes; see `Program::rollback`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    vars: usize,
    constraints: usize,
    linear: usize,
    quadratic: usize,
}

/// Solver outcome, with Clarabel's "almost" statuses folded in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolutionStatus {
    Solved,
    Infeasible,
    Unbounded,
    Failed,
}

/// Result of `Program::solve`.
#[derive(Clone, Debug)]
pub struct SolveResult {
    pub status: SolutionStatus,
    pub x: Vec<f64>,
    pub objective: f64,
}

impl SolveResult {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == SolutionStatus::Solved
    }

    /// Primal value of one variable.
    #[inline]
    pub fn value(&self, v: Variable) -> f64 {
        self.x[v.index()]
    }

    /// Primal values of several variables, in order.
    pub fn values(&self, vars: &[Variable]) -> DVector<f64> {
        DVector::from_iterator(vars.len(), vars.iter().map(|&v| self.value(v)))
    }

    /// Value of an affine expression at the primal solution.
    pub fn eval(&self, e: &LinExpr) -> f64 {
        e.eval(&self.x)
    }
}

/// Mathematical program: variables, constraints and a convex objective.
#[derive(Clone, Debug, Default)]
pub struct Program {
    var_names: Vec<String>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) linear_cost: Vec<LinExpr>,
    pub(crate) quadratic_cost: Vec<LinExpr>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn num_vars(&self) -> usize {
        self.var_names.len()
    }

    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn var_name(&self, v: Variable) -> Option<&str> {
        self.var_names.get(v.index()).map(String::as_str)
    }

    /// `n` fresh free variables named `name(0)`, `name(1)`, ...
    pub fn new_continuous_variables(&mut self, n: usize, name: &str) -> Vec<Variable> {
        (0..n)
            .map(|i| self.push_var(format!("{name}({i})")))
            .collect()
    }

    pub fn new_continuous_variable(&mut self, name: &str) -> Variable {
        self.push_var(name.to_string())
    }

    fn push_var(&mut self, name: String) -> Variable {
        self.var_names.push(name);
        Variable(self.var_names.len() - 1)
    }

    /// Every row `== 0`.
    pub fn add_linear_equality(&mut self, rows: Vec<LinExpr>) -> Result<Binding> {
        self.push_constraint(ConstraintKind::LinearEquality, rows)
    }

    /// Every row `<= 0`.
    pub fn add_linear_inequality(&mut self, rows: Vec<LinExpr>) -> Result<Binding> {
        self.push_constraint(ConstraintKind::LinearInequality, rows)
    }

    /// `rows[0] >= ||rows[1..]||₂`.
    pub fn add_lorentz_cone(&mut self, rows: Vec<LinExpr>) -> Result<Binding> {
        if rows.is_empty() {
            return Err(SetError::invalid("Lorentz cone needs at least one row"));
        }
        self.push_constraint(ConstraintKind::LorentzCone, rows)
    }

    fn push_constraint(&mut self, kind: ConstraintKind, rows: Vec<LinExpr>) -> Result<Binding> {
        self.check_rows(&rows)?;
        let binding = Binding {
            id: self.constraints.len(),
            kind,
            rows: rows.len(),
        };
        self.constraints.push(Constraint { kind, rows });
        Ok(binding)
    }

    /// Minimize `expr` (added to the objective).
    pub fn add_linear_cost(&mut self, expr: LinExpr) -> Result<()> {
        self.check_rows(std::slice::from_ref(&expr))?;
        self.linear_cost.push(expr);
        Ok(())
    }

    /// Minimize `Σ rowᵢ²` (added to the objective).
    pub fn add_quadratic_cost(&mut self, rows: Vec<LinExpr>) -> Result<()> {
        self.check_rows(&rows)?;
        self.quadratic_cost.extend(rows);
        Ok(())
    }

    /// Minimize `||rows||₂` via an epigraph slack; returns the slack.
    pub fn add_l2_norm_cost(&mut self, rows: Vec<LinExpr>) -> Result<Variable> {
        self.check_rows(&rows)?;
        let s = self.new_continuous_variable("l2_norm_cost_slack");
        let mut cone = Vec::with_capacity(rows.len() + 1);
        cone.push(LinExpr::from(s));
        cone.extend(rows);
        self.push_constraint(ConstraintKind::LorentzCone, cone)?;
        self.linear_cost.push(LinExpr::from(s));
        Ok(s)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            vars: self.var_names.len(),
            constraints: self.constraints.len(),
            linear: self.linear_cost.len(),
            quadratic: self.quadratic_cost.len(),
        }
    }

    /// Drop everything added after `cp`. Handles issued after `cp` become stale.
    pub fn rollback(&mut self, cp: Checkpoint) {
        self.var_names.truncate(cp.vars);
        self.constraints.truncate(cp.constraints);
        self.linear_cost.truncate(cp.linear);
        self.quadratic_cost.truncate(cp.quadratic);
    }

    pub fn solve(&self) -> Result<SolveResult> {
        self.solve_with(&SolverCfg::default())
    }

    pub fn solve_with(&self, cfg: &SolverCfg) -> Result<SolveResult> {
        backend::solve(self, cfg)
    }

    fn check_rows(&self, rows: &[LinExpr]) -> Result<()> {
        let n = self.num_vars();
        for row in rows {
            if let Some(&(v, _)) = row.terms.iter().find(|(v, _)| v.index() >= n) {
                return Err(SetError::invalid(format!(
                    "variable #{} does not belong to this program ({n} variables)",
                    v.index()
                )));
            }
            if !row.constant.is_finite() || row.terms.iter().any(|(_, c)| !c.is_finite()) {
                return Err(SetError::invalid("non-finite coefficient in constraint row"));
            }
        }
        Ok(())
    }
}
