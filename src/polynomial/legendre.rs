//! Legendre polynomials on [-1, 1].
//!
//! P_0 = 1, P_1 = x, (n+1) P_{n+1} = (2n+1) x P_n - n P_{n-1}.

/// Evaluate P_n(x).
pub fn legendre(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).0
}

/// Evaluate P'_n(x).
pub fn legendre_derivative(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).1
}

/// Evaluate (P_n(x), P'_n(x)) with a single pass of the recurrence.
///
/// The derivative uses the recurrence
/// P'_{k+1} = P'_{k-1} + (2k+1) P_k, which stays regular at x = ±1.
pub fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    let (mut p0, mut p1) = (1.0, x);
    let (mut d0, mut d1) = (0.0, 1.0);
    if n == 0 {
        return (p0, d0);
    }

    for k in 1..n {
        let kf = k as f64;
        let p2 = ((2.0 * kf + 1.0) * x * p1 - kf * p0) / (kf + 1.0);
        let d2 = d0 + (2.0 * kf + 1.0) * p1;
        (p0, p1) = (p1, p2);
        (d0, d1) = (d1, d2);
    }

    (p1, d1)
}

/// Orthonormal Legendre polynomial sqrt((2n+1)/2) P_n and its derivative.
pub fn legendre_normalized(n: usize, x: f64) -> (f64, f64) {
    let scale = ((2 * n + 1) as f64 / 2.0).sqrt();
    let (p, dp) = legendre_and_derivative(n, x);
    (scale * p, scale * dp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_degree_closed_forms() {
        for &x in &[-1.0, -0.7, 0.0, 0.3, 1.0] {
            assert!((legendre(2, x) - (3.0 * x * x - 1.0) / 2.0).abs() < 1e-14);
            assert!((legendre(3, x) - (5.0 * x * x * x - 3.0 * x) / 2.0).abs() < 1e-14);
            assert!((legendre_derivative(2, x) - 3.0 * x).abs() < 1e-13);
            assert!((legendre_derivative(3, x) - (15.0 * x * x - 3.0) / 2.0).abs() < 1e-13);
        }
    }

    #[test]
    fn test_endpoint_derivatives() {
        for n in 0..=8 {
            let expected = (n * (n + 1)) as f64 / 2.0;
            let sign = if n % 2 == 0 { -1.0 } else { 1.0 };
            assert!((legendre_derivative(n, 1.0) - expected).abs() < 1e-12);
            assert!((legendre_derivative(n, -1.0) - sign * expected).abs() < 1e-12);
            assert!((legendre(n, 1.0) - 1.0).abs() < 1e-14);
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let h = 1e-6;
        for n in 1..=7 {
            for &x in &[-0.9, -0.2, 0.45, 0.8] {
                let fd = (legendre(n, x + h) - legendre(n, x - h)) / (2.0 * h);
                assert!(
                    (legendre_derivative(n, x) - fd).abs() < 1e-6,
                    "P'_{} mismatch at {}",
                    n,
                    x
                );
            }
        }
    }
}
