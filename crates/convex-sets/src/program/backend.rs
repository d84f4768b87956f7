//! Assembly into Clarabel's standard form and the solve call.
//!
//! Clarabel solves `min ½xᵀPx + qᵀx  s.t.  Ax + s = b, s ∈ K` with `P`
//! upper triangular. Row mapping:
//! - equality `e(x) == 0`   → `aᵀx + s = -c`, `s ∈ {0}`
//! - inequality `e(x) <= 0` → `aᵀx + s = -c`, `s ∈ ℝ₊`
//! - cone row `e(x)`        → `-aᵀx + s = c`, `s ∈ SOC`
//!
//! A single-row Lorentz constraint `r0 >= ||∅||` is `r0 >= 0` and goes into
//! the nonnegative cone (Clarabel's SOC needs dimension >= 2). Constraints
//! without rows are dropped.

use clarabel::algebra::*;
use clarabel::solver::*;

use super::{ConstraintKind, LinExpr, Program, SolutionStatus, SolveResult};
use crate::cfg::SolverCfg;
use crate::error::{Result, SetError};

type Triplet = (usize, usize, f64);

pub(super) fn solve(prog: &Program, cfg: &SolverCfg) -> Result<SolveResult> {
    let n = prog.num_vars();
    if n == 0 {
        return Ok(solve_constant(prog));
    }

    let (p_trip, q, cost_const) = assemble_cost(prog);
    let p = csc_from_triplets(n, n, p_trip);

    let mut a_trip: Vec<Triplet> = Vec::new();
    let mut b: Vec<f64> = Vec::new();
    let mut cones: Vec<SupportedConeT<f64>> = Vec::with_capacity(prog.constraints.len());
    for c in prog.constraints.iter().filter(|c| !c.rows.is_empty()) {
        let sign = match c.kind {
            ConstraintKind::LorentzCone => -1.0,
            _ => 1.0,
        };
        for row in &c.rows {
            let r = b.len();
            for &(v, coeff) in &row.terms {
                a_trip.push((r, v.index(), sign * coeff));
            }
            b.push(-sign * row.constant);
        }
        cones.push(match c.kind {
            ConstraintKind::LinearEquality => SupportedConeT::ZeroConeT(c.rows.len()),
            ConstraintKind::LinearInequality => SupportedConeT::NonnegativeConeT(c.rows.len()),
            ConstraintKind::LorentzCone if c.rows.len() == 1 => {
                SupportedConeT::NonnegativeConeT(1)
            }
            ConstraintKind::LorentzCone => SupportedConeT::SecondOrderConeT(c.rows.len()),
        });
    }
    let m = b.len();
    let a = csc_from_triplets(m, n, a_trip);

    let settings = DefaultSettingsBuilder::default()
        .verbose(cfg.verbose)
        .max_iter(cfg.max_iter)
        .tol_feas(cfg.tol_feas)
        .tol_gap_abs(cfg.tol_gap_abs)
        .tol_gap_rel(cfg.tol_gap_rel)
        .build()
        .map_err(|e| SetError::Solver(e.to_string()))?;

    let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
    solver.solve();

    let raw = solver.solution.status;
    let status = map_status(raw);
    tracing::debug!(vars = n, rows = m, status = ?raw, "clarabel solve");
    Ok(SolveResult {
        status,
        x: solver.solution.x.clone(),
        objective: solver.solution.obj_val + cost_const,
    })
}

fn map_status(s: SolverStatus) -> SolutionStatus {
    match s {
        SolverStatus::Solved | SolverStatus::AlmostSolved => SolutionStatus::Solved,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            SolutionStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            SolutionStatus::Unbounded
        }
        _ => SolutionStatus::Failed,
    }
}

/// `P` upper triplets, `q`, and the constant part of the objective.
///
/// `Σ (aᵀx + c)²` contributes `2aaᵀ` to `P`, `2ca` to `q` and `c²` to the constant.
fn assemble_cost(prog: &Program) -> (Vec<Triplet>, Vec<f64>, f64) {
    let n = prog.num_vars();
    let mut q = vec![0.0; n];
    let mut constant = 0.0;
    for e in &prog.linear_cost {
        for &(v, c) in &e.terms {
            q[v.index()] += c;
        }
        constant += e.constant;
    }
    let mut p = Vec::new();
    for e in &prog.quadratic_cost {
        for &(vi, ci) in &e.terms {
            for &(vj, cj) in &e.terms {
                if vi.index() <= vj.index() {
                    p.push((vi.index(), vj.index(), 2.0 * ci * cj));
                }
            }
            q[vi.index()] += 2.0 * e.constant * ci;
        }
        constant += e.constant * e.constant;
    }
    (p, q, constant)
}

/// Column-compressed matrix from unsorted triplets; duplicates are summed.
fn csc_from_triplets(m: usize, n: usize, mut trip: Vec<Triplet>) -> CscMatrix<f64> {
    trip.sort_by(|x, y| (x.1, x.0).cmp(&(y.1, y.0)));
    let mut colptr = vec![0usize; n + 1];
    let mut rowval = Vec::with_capacity(trip.len());
    let mut nzval: Vec<f64> = Vec::with_capacity(trip.len());
    let mut last: Option<(usize, usize)> = None;
    for (r, c, v) in trip {
        if last == Some((r, c)) {
            if let Some(acc) = nzval.last_mut() {
                *acc += v;
            }
            continue;
        }
        rowval.push(r);
        nzval.push(v);
        colptr[c + 1] += 1;
        last = Some((r, c));
    }
    for j in 0..n {
        colptr[j + 1] += colptr[j];
    }
    CscMatrix::new(m, n, colptr, rowval, nzval)
}

/// A program without variables is feasible iff all its constant rows hold.
fn solve_constant(prog: &Program) -> SolveResult {
    const EPS: f64 = 1e-12;
    let holds = |kind: ConstraintKind, rows: &[LinExpr]| match kind {
        ConstraintKind::LinearEquality => rows.iter().all(|r| r.constant.abs() <= EPS),
        ConstraintKind::LinearInequality => rows.iter().all(|r| r.constant <= EPS),
        ConstraintKind::LorentzCone => {
            let tail: f64 = rows[1..].iter().map(|r| r.constant * r.constant).sum();
            rows[0].constant + EPS >= tail.sqrt()
        }
    };
    let feasible = prog.constraints.iter().all(|c| holds(c.kind, &c.rows));
    let objective = prog.linear_cost.iter().map(|e| e.constant).sum::<f64>()
        + prog
            .quadratic_cost
            .iter()
            .map(|e| e.constant * e.constant)
            .sum::<f64>();
    SolveResult {
        status: if feasible {
            SolutionStatus::Solved
        } else {
            SolutionStatus::Infeasible
        },
        x: Vec::new(),
        objective,
    }
}
