use matrixcompare::assert_scalar_eq;
use mixfem::error::AssemblyError;
use mixfem::nalgebra::{Point2, U1, U2};
use mixfem::quadrature::{Quadrature, QuadratureRule, QuadratureTable, ReferenceCell};
use std::sync::Arc;

#[test]
fn quadrilateral_rule_integrates_tensor_polynomials() {
    let rule = QuadratureRule::<f64, U2>::gauss(ReferenceCell::Quadrilateral, 5).unwrap();
    assert_eq!(rule.cell(), ReferenceCell::Quadrilateral);
    assert_eq!(rule.degree(), 5);
    assert_eq!(rule.num_points(), 9);
    assert_scalar_eq!(rule.weights().iter().sum::<f64>(), 4.0, comp = abs, tol = 1e-13);

    // int_{[-1, 1]^2} x^4 y^2 + x y^5 = (2 / 5) (2 / 3)
    let integral = rule.integrate(|x| x.x.powi(4) * x.y.powi(2) + x.x * x.y.powi(5));
    assert_scalar_eq!(integral, 4.0 / 15.0, comp = abs, tol = 1e-13);
}

#[test]
fn triangle_rule_integrates_polynomials() {
    let rule = QuadratureRule::<f64, U2>::gauss(ReferenceCell::Triangle, 4).unwrap();
    // The reference triangle (-1, -1), (1, -1), (-1, 1) has area 2 and centroid (-1/3, -1/3)
    assert_scalar_eq!(rule.integrate(|_| 1.0), 2.0, comp = abs, tol = 1e-13);
    assert_scalar_eq!(rule.integrate(|x| x.x), -2.0 / 3.0, comp = abs, tol = 1e-13);
    // int (x + 1)^2 (y + 1)^2 over the triangle, by substitution onto the unit triangle
    // scaled by 2: 2^2 * 2^2 * 2^2 * int_{unit} s^2 t^2 = 64 * (2! 2! / 6!) = 64 / 180
    let integral = rule.integrate(|x| (x.x + 1.0).powi(2) * (x.y + 1.0).powi(2));
    assert_scalar_eq!(integral, 64.0 / 180.0, comp = abs, tol = 1e-13);

    for point in rule.points() {
        assert!(point.x > -1.0 && point.y > -1.0 && point.x + point.y < 0.0);
    }
}

#[test]
fn segment_rule_and_zero_degree() {
    let rule = QuadratureRule::<f64, U1>::gauss(ReferenceCell::Segment, 0).unwrap();
    assert_eq!(rule.degree(), 1);
    assert_eq!(rule.num_points(), 1);
    assert_scalar_eq!(rule.integrate(|x| 3.0 * x.x + 1.0), 2.0, comp = abs, tol = 1e-14);
}

#[test]
fn rules_are_deterministic() {
    let a = QuadratureRule::<f64, U2>::gauss(ReferenceCell::Triangle, 5).unwrap();
    let b = QuadratureRule::<f64, U2>::gauss(ReferenceCell::Triangle, 5).unwrap();
    assert_eq!(a, b);
}

#[test]
fn unavailable_rules_are_reported() {
    let err = QuadratureRule::<f64, U2>::gauss(ReferenceCell::Hexahedron, 2).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AssemblyError>(),
        Some(&AssemblyError::Quadrature {
            cell: ReferenceCell::Hexahedron,
            degree: 2
        })
    );

    let err = QuadratureRule::<f64, U2>::gauss(ReferenceCell::Quadrilateral, 10_000).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AssemblyError>(),
        Some(AssemblyError::Quadrature { .. })
    ));
}

#[test]
fn explicit_rules_must_have_matching_lengths() {
    let rule = QuadratureRule::<f64, U2>::from_weights_and_points(
        ReferenceCell::Quadrilateral,
        1,
        vec![4.0],
        vec![Point2::origin()],
    )
    .unwrap();
    assert_scalar_eq!(rule.integrate(|x| 1.0 + x.x), 4.0);

    let err = QuadratureRule::<f64, U2>::from_weights_and_points(
        ReferenceCell::Quadrilateral,
        1,
        vec![2.0, 2.0],
        vec![Point2::origin()],
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AssemblyError>(),
        Some(AssemblyError::DimensionMismatch { .. })
    ));
}

#[test]
fn quadrature_table_holds_one_rule_per_cell() {
    let cells = [
        ReferenceCell::Quadrilateral,
        ReferenceCell::Triangle,
        ReferenceCell::Quadrilateral,
    ];
    let table = QuadratureTable::<f64, U2>::gauss(cells, 3).unwrap();
    assert_eq!(table.rules().len(), 2);

    let quad_rule = table.rule_for(ReferenceCell::Quadrilateral).unwrap();
    assert_eq!(quad_rule.cell(), ReferenceCell::Quadrilateral);
    assert_eq!(quad_rule.degree(), 3);
    assert!(Arc::ptr_eq(quad_rule, table.rule_for(ReferenceCell::Quadrilateral).unwrap()));
    assert_eq!(table.rule_for(ReferenceCell::Triangle).unwrap().cell(), ReferenceCell::Triangle);
    assert!(table.rule_for(ReferenceCell::Segment).is_none());
}
