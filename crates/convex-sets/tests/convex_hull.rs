//! End-to-end behavior of `ConvexHull` against leaf sets and the Clarabel backend.
//!
//! Fixture: `origin_and_segment()` is conv{(0,0), [-1,1]×{1}}, the triangle
//! with vertices (0,0), (-1,1), (1,1). Its conic hull is `y >= |x|`.

use convex_sets::prelude::*;
use convex_sets::cfg::DEFAULT_MAX_SAMPLES;
use convex_sets::program::offset_rows;
use convex_sets::{SampledVolume, SolutionStatus};
use nalgebra::{dmatrix, dvector};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn origin_and_segment() -> ConvexHull {
    let point = Point::new(dvector![0.0, 0.0]).unwrap();
    let segment = Hyperrectangle::new(dvector![-1.0, 1.0], dvector![1.0, 1.0]).unwrap();
    ConvexHull::new(make_convex_sets!(point, segment)).unwrap()
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

#[test]
fn mixed_dimensions_are_rejected() {
    let p = Point::new(dvector![1.0, 2.0]).unwrap();
    let rect = Hyperrectangle::new(dvector![0.0, 0.0, 0.0], dvector![1.0, 1.0, 1.0]).unwrap();
    let err = ConvexHull::new(make_convex_sets!(&p, &rect)).unwrap_err();
    assert!(matches!(
        err,
        SetError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
}

#[test]
fn point_and_box_hull_basics() {
    let p = Point::new(dvector![-2.0, 0.5]).unwrap();
    let rect = Hyperrectangle::new(dvector![0.0, 0.0], dvector![1.0, 1.0]).unwrap();
    let hull = ConvexHull::new(make_convex_sets!(&p, &rect)).unwrap();

    assert_eq!(hull.ambient_dimension(), 2);
    assert_eq!(hull.sets().len(), 2);
    assert!(!hull.is_empty().unwrap());
    assert!(hull.is_bounded().unwrap());

    let witness = hull.maybe_get_point().unwrap().expect("non-empty hull has a point");
    assert!(hull.point_in_set(&witness, 1e-6).unwrap());
    let bbox = hull.maybe_calc_axis_aligned_bounding_box().unwrap().unwrap();
    assert_eq!(bbox.lb(), &dvector![-2.0, 0.0]);
    assert_eq!(bbox.ub(), &dvector![1.0, 1.0]);
    assert!(bbox.point_in_set(&witness, 1e-6).unwrap());
}

#[test]
fn point_in_set_on_the_triangle() {
    let hull = origin_and_segment();
    for p in [
        dvector![0.0, 0.0],
        dvector![1.0, 1.0],
        dvector![0.4, 0.5],
        dvector![0.5, 0.5],
    ] {
        assert!(hull.point_in_set(&p, 1e-6).unwrap(), "{p:?} should be inside");
    }
    assert!(!hull.point_in_set(&dvector![0.6, 0.5], 1e-6).unwrap());
    assert!(!hull.point_in_set(&dvector![0.0, 1.2], 1e-6).unwrap());

    // Distance ~7.1e-4 to the edge y = -x.
    let near = dvector![-0.501, 0.5];
    assert!(!hull.point_in_set(&near, 1e-4).unwrap());
    assert!(hull.point_in_set(&near, 1e-2).unwrap());
}

#[test]
fn point_in_set_validates_inputs() {
    let hull = origin_and_segment();
    assert!(matches!(
        hull.point_in_set(&dvector![0.0, 0.0, 0.0], 1e-6),
        Err(SetError::DimensionMismatch { .. })
    ));
    assert!(matches!(
        hull.point_in_set(&dvector![0.0, 0.0], -1.0),
        Err(SetError::InvalidArgument(_))
    ));
}

#[test]
fn infeasible_member_makes_hull_empty_and_not_bounded() {
    // x <= 1 and x >= 2
    let contradiction =
        HPolyhedron::new(dmatrix![1.0, 0.0; -1.0, 0.0], dvector![1.0, -2.0]).unwrap();
    assert!(contradiction.is_empty().unwrap());

    let hull = ConvexHull::new(make_convex_sets!(
        Point::new(dvector![0.0, 0.0]).unwrap(),
        Hyperrectangle::new(dvector![0.0, 0.0], dvector![1.0, 1.0]).unwrap(),
        contradiction
    ))
    .unwrap();
    assert!(hull.is_empty().unwrap());
    assert!(!hull.is_bounded().unwrap());
    assert!(hull.maybe_get_point().unwrap().is_none());
}

#[test]
fn zero_weight_h_rep_member_contributes_its_recession_cone() {
    // x <= 1 and x >= 2 in the first coordinate; the second is free.
    let contradiction =
        HPolyhedron::new(dmatrix![1.0, 0.0; -1.0, 0.0], dvector![1.0, -2.0]).unwrap();
    let hull = ConvexHull::new(make_convex_sets!(
        Point::new(dvector![0.0, 0.0]).unwrap(),
        contradiction
    ))
    .unwrap();
    assert!(hull.is_empty().unwrap());
    assert!(!hull.point_in_set(&dvector![0.0, 100.0], 1e-3).unwrap());

    // The emitted system still admits the origin plus {(0, y)}.
    let mut prog = Program::new();
    let x = prog.new_continuous_variables(2, "x");
    hull.add_point_in_set_constraints(&mut prog, &x).unwrap();
    prog.add_linear_equality(offset_rows(&x, &dvector![0.0, 100.0]))
        .unwrap();
    assert_eq!(prog.solve().unwrap().status, SolutionStatus::Solved);

    // but nothing off that line.
    let mut prog = Program::new();
    let x = prog.new_continuous_variables(2, "x");
    hull.add_point_in_set_constraints(&mut prog, &x).unwrap();
    prog.add_linear_equality(offset_rows(&x, &dvector![0.5, 0.0]))
        .unwrap();
    assert_eq!(prog.solve().unwrap().status, SolutionStatus::Infeasible);
}

#[test]
fn zero_dimensional_hull() {
    let hull = ConvexHull::new(make_convex_sets!(
        Point::new(DVector::zeros(0)).unwrap(),
        Point::new(DVector::zeros(0)).unwrap()
    ))
    .unwrap();
    assert_eq!(hull.ambient_dimension(), 0);
    assert!(!hull.is_empty().unwrap());
    assert!(hull.point_in_set(&DVector::zeros(0), 0.0).unwrap());
    assert_eq!(hull.maybe_get_point().unwrap(), Some(DVector::zeros(0)));
}

#[test]
fn closest_point_through_emitted_constraints() {
    let hull = origin_and_segment();
    let mut prog = Program::new();
    let x = prog.new_continuous_variables(2, "x");
    let (new_vars, bindings) = hull.add_point_in_set_constraints(&mut prog, &x).unwrap();
    assert!(!new_vars.is_empty());
    assert!(!bindings.is_empty());

    prog.add_quadratic_cost(offset_rows(&x, &dvector![0.8, 0.0]))
        .unwrap();
    let res = prog.solve().unwrap();
    assert!(res.is_success());
    let sol = res.values(&x);
    assert!(close(sol[0], 0.4, 1e-5) && close(sol[1], 0.4, 1e-5), "got {sol:?}");
}

#[test]
fn scalar_scaling_reaches_the_cone() {
    let hull = origin_and_segment();
    let mut prog = Program::new();
    let x = prog.new_continuous_variables(2, "x");
    let t = prog.new_continuous_variable("t");
    hull.add_point_in_nonnegative_scaling_constraints(&mut prog, &x, t)
        .unwrap();
    // Caps the optimal face so the solver returns a finite t.
    prog.add_linear_inequality(vec![LinExpr::from(t) - 10.0])
        .unwrap();
    prog.add_quadratic_cost(offset_rows(&x, &dvector![2.0, 1.0]))
        .unwrap();

    let res = prog.solve().unwrap();
    assert!(res.is_success());
    let sol = res.values(&x);
    assert!(close(sol[0], 1.5, 1e-5) && close(sol[1], 1.5, 1e-5), "got {sol:?}");
    assert!(res.value(t) >= 1.5 - 1e-5);

    // Round trip: x / t lies in the unscaled hull.
    let unscaled = sol / res.value(t);
    assert!(hull.point_in_set(&unscaled, 1e-5).unwrap());

    prog.add_linear_inequality(vec![LinExpr::from(t) + 1.0])
        .unwrap();
    assert_eq!(prog.solve().unwrap().status, SolutionStatus::Infeasible);
}

#[test]
fn zero_scaling_forces_the_origin() {
    let hull = origin_and_segment();
    let mut prog = Program::new();
    let x = prog.new_continuous_variables(2, "x");
    let t = prog.new_continuous_variable("t");
    hull.add_point_in_nonnegative_scaling_constraints(&mut prog, &x, t)
        .unwrap();
    prog.add_linear_equality(vec![LinExpr::from(t)]).unwrap();
    prog.add_quadratic_cost(offset_rows(&x, &dvector![0.3, 0.7]))
        .unwrap();
    let res = prog.solve().unwrap();
    assert!(res.is_success());
    assert!(res.values(&x).norm() < 1e-5);
}

#[test]
fn affine_scaling_matches_geometry() {
    // Members: the origin twice and the box [-1,1]×[1,2]. Its scaled copy by s
    // is {|u| <= min(v, s), v <= 2s}.
    let origin = Point::new(dvector![0.0, 0.0]).unwrap();
    let rect = Hyperrectangle::new(dvector![-1.0, 1.0], dvector![1.0, 2.0]).unwrap();
    let hull = ConvexHull::new(make_convex_sets!(&origin, &origin, &rect)).unwrap();

    // A x + b = (-x1, x0 + 2), s = 1ᵀt + 0.4
    let scaling = AffineScaling::new(
        dmatrix![0.0, -1.0; 1.0, 0.0],
        dvector![0.0, 2.0],
        dvector![1.0, 1.0, 1.0],
        0.4,
    );
    let mut prog = Program::new();
    let x = prog.new_continuous_variables(2, "x");
    let t = prog.new_continuous_variables(3, "t");
    let a = prog.new_continuous_variable("a");
    hull.add_point_in_nonnegative_scaling_constraints_affine(&mut prog, &scaling, &x, &t)
        .unwrap();
    // x = (-1.7 + a, -0.6) so A x + b = (0.6, 0.3 + a).
    prog.add_linear_equality(vec![
        LinExpr::from(x[0]) - a + 1.7,
        LinExpr::from(x[1]) + 0.6,
    ])
    .unwrap();
    prog.add_linear_cost(LinExpr::from(a)).unwrap();
    prog.add_l2_norm_cost(t.iter().map(|&ti| LinExpr::from(ti)).collect())
        .unwrap();

    let res = prog.solve().unwrap();
    assert!(res.is_success());
    // Needs v >= |u| = 0.6 and s >= |u|; the cheapest t spreads 0.2 evenly.
    assert!(close(res.value(a), 0.3, 1e-5), "a = {}", res.value(a));
    let s = res.eval(&scaling.scale_expr(&t));
    assert!(close(s, 0.6, 1e-5), "s = {s}");
    for &ti in &t {
        assert!(close(res.value(ti), 0.2 / 3.0, 1e-5));
    }
    assert!(close(
        res.objective,
        0.3 + 0.2 / 3.0_f64.sqrt(),
        1e-5
    ));

    // Round trip: (A x + b) / s is a member of the hull.
    let image = &scaling.a * res.values(&x) + &scaling.b;
    assert!(hull.point_in_set(&(image / s), 1e-4).unwrap());
}

#[test]
fn affine_scaling_checks_shapes() {
    let hull = origin_and_segment();
    let mut prog = Program::new();
    let x = prog.new_continuous_variables(2, "x");
    let t = prog.new_continuous_variables(2, "t");
    let scaling = AffineScaling::new(
        DMatrix::identity(2, 2),
        DVector::zeros(2),
        dvector![1.0, 1.0, 1.0],
        0.0,
    );
    let before = prog.checkpoint();
    assert!(matches!(
        hull.add_point_in_nonnegative_scaling_constraints_affine(&mut prog, &scaling, &x, &t),
        Err(SetError::DimensionMismatch { .. })
    ));
    assert_eq!(prog.checkpoint(), before);
}

#[test]
fn nested_hulls_recurse() {
    let inner = origin_and_segment();
    let outer =
        ConvexHull::new(make_convex_sets!(inner, Point::new(dvector![0.5, 0.0]).unwrap())).unwrap();

    assert!(outer.point_in_set(&dvector![0.3, 0.0], 1e-6).unwrap());
    // On the edge from (0.5, 0) to (1, 1).
    assert!(outer.point_in_set(&dvector![0.6, 0.2], 1e-6).unwrap());
    assert!(!outer.point_in_set(&dvector![0.6, 0.1], 1e-6).unwrap());
    assert!(!outer.is_empty().unwrap());

    let bbox = outer.maybe_calc_axis_aligned_bounding_box().unwrap().unwrap();
    assert_eq!(bbox.lb(), &dvector![-1.0, 0.0]);
    assert_eq!(bbox.ub(), &dvector![1.0, 1.0]);
}

#[test]
fn emission_into_wrong_dimension_leaves_program_untouched() {
    let hull = origin_and_segment();
    let mut prog = Program::new();
    let x = prog.new_continuous_variables(3, "x");
    let before = prog.checkpoint();
    assert!(matches!(
        hull.add_point_in_set_constraints(&mut prog, &x),
        Err(SetError::DimensionMismatch { .. })
    ));
    assert_eq!(prog.checkpoint(), before);
}

#[test]
fn unbounded_member_has_no_box() {
    // Halfplane x >= 0.
    let halfplane = HPolyhedron::new(dmatrix![-1.0, 0.0], dvector![0.0]).unwrap();
    let hull = ConvexHull::new(make_convex_sets!(Point::new(dvector![0.0, 0.0]).unwrap(), halfplane))
        .unwrap();
    assert!(hull.maybe_calc_axis_aligned_bounding_box().unwrap().is_none());
    assert!(!hull.is_bounded().unwrap());
    assert!(matches!(
        hull.calc_volume_via_sampling(&mut StdRng::seed_from_u64(3), 0.1, 100),
        Err(SetError::Unbounded { set: "ConvexHull" })
    ));
}

#[test]
fn exact_volume_policy() {
    let hull = origin_and_segment();
    let err = hull.calc_volume().unwrap_err();
    assert!(matches!(err, SetError::VolumeUnsupported { set: "ConvexHull" }));
    assert!(err.to_string().contains("cannot report an exact volume"));

    let rect = Hyperrectangle::new(dvector![0.0, 0.0], dvector![2.0, 3.0]).unwrap();
    assert_eq!(rect.calc_volume().unwrap(), 6.0);
    assert_eq!(Point::new(dvector![1.0]).unwrap().calc_volume().unwrap(), 0.0);
    assert!(matches!(
        HPolyhedron::make_unit_box(2).calc_volume(),
        Err(SetError::VolumeUnsupported { set: "HPolyhedron" })
    ));
}

#[test]
fn sampled_volume_converges() {
    // conv{0, [-1,1]×[1,2]} has area 1 + 2 = 3 inside the box [-1,1]×[0,2].
    let rect = Hyperrectangle::new(dvector![-1.0, 1.0], dvector![1.0, 2.0]).unwrap();
    let hull = ConvexHull::new(make_convex_sets!(Point::new(dvector![0.0, 0.0]).unwrap(), rect)).unwrap();
    let mut rng = StdRng::seed_from_u64(2024);
    for precision in [0.1, 0.05, 0.02] {
        let SampledVolume {
            volume,
            rel_accuracy,
            num_samples,
        } = hull
            .calc_volume_via_sampling(&mut rng, precision, DEFAULT_MAX_SAMPLES)
            .unwrap();
        assert!(rel_accuracy < precision, "precision {precision}: {rel_accuracy}");
        assert!(num_samples < DEFAULT_MAX_SAMPLES);
        assert!(
            (volume - 3.0).abs() < 4.0 * precision * 3.0,
            "precision {precision}: volume {volume}"
        );
    }
}

#[test]
fn clones_answer_like_the_original() {
    let hull = origin_and_segment();
    let copy = hull.clone();
    drop(hull);
    assert!(copy.point_in_set(&dvector![0.0, 0.5], 1e-6).unwrap());

    let boxed: Box<dyn ConvexSet> = copy.clone_box();
    assert_eq!(boxed.ambient_dimension(), 2);
    assert!(!boxed.has_exact_volume());
    assert!(boxed.point_in_set(&dvector![1.0, 1.0], 1e-6).unwrap());
}

#[test]
fn queries_from_several_threads() {
    let hull = origin_and_segment();
    let probes = [
        (dvector![0.0, 0.5], true),
        (dvector![0.9, 0.95], true),
        (dvector![0.9, 0.5], false),
        (dvector![-0.2, 0.1], false),
    ];
    std::thread::scope(|scope| {
        for (p, expected) in &probes {
            let hull = &hull;
            scope.spawn(move || {
                assert_eq!(hull.point_in_set(p, 1e-6).unwrap(), *expected, "{p:?}");
            });
        }
    });
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn tolerance_is_monotone(
        px in -1.5f64..1.5,
        py in -0.5f64..1.5,
        t1 in 0.0f64..0.3,
        dt in 0.0f64..0.3,
    ) {
        let hull = origin_and_segment();
        let p = dvector![px, py];
        if hull.point_in_set(&p, t1).unwrap() {
            prop_assert!(hull.point_in_set(&p, t1 + dt).unwrap());
        }
    }

    #[test]
    fn emitted_optimum_is_a_member(tx in -2.0f64..2.0, ty in -1.0f64..2.0) {
        let hull = origin_and_segment();
        let mut prog = Program::new();
        let x = prog.new_continuous_variables(2, "x");
        hull.add_point_in_set_constraints(&mut prog, &x).unwrap();
        prog.add_quadratic_cost(offset_rows(&x, &dvector![tx, ty])).unwrap();
        let res = prog.solve().unwrap();
        prop_assert!(res.is_success());
        prop_assert!(hull.point_in_set(&res.values(&x), 1e-5).unwrap());
    }

    #[test]
    fn scaled_optimum_unscales_into_the_hull(
        tx in -2.0f64..2.0,
        ty in 0.5f64..3.0,
        cap in 0.5f64..4.0,
    ) {
        let hull = origin_and_segment();
        let mut prog = Program::new();
        let x = prog.new_continuous_variables(2, "x");
        let t = prog.new_continuous_variable("t");
        hull.add_point_in_nonnegative_scaling_constraints(&mut prog, &x, t).unwrap();
        prog.add_linear_inequality(vec![LinExpr::from(t) - cap]).unwrap();
        prog.add_quadratic_cost(offset_rows(&x, &dvector![tx, ty])).unwrap();
        // Prefer the largest admissible scale so t stays away from zero.
        prog.add_linear_cost(LinExpr::term(t, -1e-3)).unwrap();
        let res = prog.solve().unwrap();
        prop_assert!(res.is_success());
        let scale = res.value(t);
        prop_assert!(scale > 0.4);
        let unscaled = res.values(&x) / scale;
        prop_assert!(hull.point_in_set(&unscaled, 1e-4).unwrap());
    }
}
