//! Real roots of the low-order polynomials produced by substituting a
//! line into a surface equation.

/// Coefficients below this magnitude are treated as zero.
pub(crate) const DEGENERATE_EPS: f64 = 1e-12;

/// Real roots of `a t² + b t + c = 0`, sorted ascending.
///
/// Falls back to the linear equation when `a` vanishes and returns an
/// empty list when both `a` and `b` vanish or the discriminant is
/// negative. A double root is reported once.
pub(crate) fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < DEGENERATE_EPS {
        return solve_linear(b, c).into_iter().collect();
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Vec::new();
    }
    if discriminant == 0.0 {
        return vec![-b / (2.0 * a)];
    }

    // Citardauq form avoids cancellation when b² >> 4ac.
    let sqrt_disc = discriminant.sqrt();
    let q = if b >= 0.0 {
        -0.5 * (b + sqrt_disc)
    } else {
        -0.5 * (b - sqrt_disc)
    };
    let t1 = q / a;
    let t2 = c / q;
    if t1 <= t2 {
        vec![t1, t2]
    } else {
        vec![t2, t1]
    }
}

/// Root of `b t + c = 0`, if `b` does not vanish.
pub(crate) fn solve_linear(b: f64, c: f64) -> Option<f64> {
    if b.abs() < DEGENERATE_EPS {
        None
    } else {
        Some(-c / b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_roots_sorted() {
        // (t - 1)(t - 3) = t² - 4t + 3
        let roots = solve_quadratic(1.0, -4.0, 3.0);
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 1.0).abs() < 1e-12);
        assert!((roots[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_leading_coefficient() {
        // -(t + 2)(t - 5)
        let roots = solve_quadratic(-1.0, 3.0, 10.0);
        assert!((roots[0] + 2.0).abs() < 1e-12);
        assert!((roots[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_double_root_and_no_roots() {
        assert_eq!(solve_quadratic(1.0, -2.0, 1.0), vec![1.0]);
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_degenerate_falls_back_to_linear() {
        assert_eq!(solve_quadratic(0.0, 2.0, -4.0), vec![2.0]);
        assert!(solve_quadratic(0.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_large_b_is_stable() {
        let roots = solve_quadratic(1.0, 1e8, 1.0);
        assert!((roots[1] + 1e-8).abs() < 1e-16);
    }
}
