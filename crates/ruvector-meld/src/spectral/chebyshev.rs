//! Chebyshev Polynomials
//!
//! Polynomial approximation of spectral kernels in the Chebyshev basis.
//! Key for applying h(L) without eigendecomposition.

use std::f64::consts::PI;

use nalgebra::DMatrix;

use super::ScaledLaplacian;

/// Chebyshev polynomial of the first kind
#[derive(Debug, Clone)]
pub struct ChebyshevPolynomial {
    /// Polynomial degree
    pub degree: usize,
}

impl ChebyshevPolynomial {
    /// Create Chebyshev polynomial T_n
    pub fn new(degree: usize) -> Self {
        Self { degree }
    }

    /// Evaluate T_n(x) using recurrence
    /// T_0(x) = 1, T_1(x) = x, T_{n+1}(x) = 2x·T_n(x) - T_{n-1}(x)
    pub fn eval(&self, x: f64) -> f64 {
        if self.degree == 0 {
            return 1.0;
        }
        if self.degree == 1 {
            return x;
        }

        let mut t_prev = 1.0;
        let mut t_curr = x;

        for _ in 2..=self.degree {
            let t_next = 2.0 * x * t_curr - t_prev;
            t_prev = t_curr;
            t_curr = t_next;
        }

        t_curr
    }

    /// Chebyshev nodes for interpolation: x_k = cos((2k+1)π/(2n))
    pub fn nodes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|k| ((2 * k + 1) as f64 * PI / (2 * n) as f64).cos())
            .collect()
    }
}

/// Chebyshev expansion of a function
/// f(x) ≈ Σ c_k T_k(x)
#[derive(Debug, Clone)]
pub struct ChebyshevExpansion {
    /// Chebyshev coefficients c_k
    pub coefficients: Vec<f64>,
}

impl ChebyshevExpansion {
    /// Create from coefficients
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// Approximate function on [-1, 1] using n+1 Chebyshev nodes
    pub fn from_function<F: Fn(f64) -> f64>(f: F, degree: usize) -> Self {
        let n = degree + 1;
        let nodes = ChebyshevPolynomial::nodes(n);

        let f_values: Vec<f64> = nodes.iter().map(|&x| f(x)).collect();

        // Discrete cosine transform at the nodes
        let mut coefficients = Vec::with_capacity(n);
        for k in 0..n {
            let t_k = ChebyshevPolynomial::new(k);
            let mut c_k: f64 = f_values
                .iter()
                .zip(nodes.iter())
                .map(|(&f_j, &x_j)| f_j * t_k.eval(x_j))
                .sum();
            c_k *= 2.0 / n as f64;
            if k == 0 {
                c_k *= 0.5;
            }
            coefficients.push(c_k);
        }

        Self { coefficients }
    }

    /// Approximate a spectral kernel h(λ) on [0, lambda_max]
    pub fn from_kernel<F: Fn(f64) -> f64>(kernel: F, lambda_max: f64, degree: usize) -> Self {
        let half = lambda_max / 2.0;
        Self::from_function(|x| kernel(half * (x + 1.0)), degree)
    }

    /// Evaluate expansion at point x using Clenshaw recurrence
    pub fn eval(&self, x: f64) -> f64 {
        if self.coefficients.is_empty() {
            return 0.0;
        }
        if self.coefficients.len() == 1 {
            return self.coefficients[0];
        }

        let n = self.coefficients.len();
        let mut b_next = 0.0;
        let mut b_curr = 0.0;

        for k in (1..n).rev() {
            let b_prev = 2.0 * x * b_curr - b_next + self.coefficients[k];
            b_next = b_curr;
            b_curr = b_prev;
        }

        self.coefficients[0] + x * b_curr - b_next
    }

    /// Evaluate the kernel approximation at eigenvalue λ of an operator
    /// scaled by `lambda_max`
    pub fn eval_eigenvalue(&self, lambda: f64, lambda_max: f64) -> f64 {
        self.eval(2.0 * lambda / lambda_max - 1.0)
    }

    /// Degree of expansion
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Apply the polynomial in the scaled operator to each column of `x`:
    /// Y = Σ c_k T_k(L_scaled) X. O(K·nnz·p) for K terms and p columns.
    pub fn apply(&self, laplacian: &ScaledLaplacian, x: &DMatrix<f64>) -> DMatrix<f64> {
        let coeffs = &self.coefficients;
        let mut output = DMatrix::zeros(x.nrows(), x.ncols());
        if coeffs.is_empty() {
            return output;
        }

        // T_0 X = X, T_1 X = L X, T_{k+1} X = 2 L T_k X - T_{k-1} X
        let mut t_prev = x.clone();
        output += &t_prev * coeffs[0];
        if coeffs.len() == 1 {
            return output;
        }

        let mut t_curr = laplacian.apply(x);
        output += &t_curr * coeffs[1];

        for &c_k in &coeffs[2..] {
            let t_next = laplacian.apply(&t_curr) * 2.0 - &t_prev;
            output += &t_next * c_k;
            t_prev = t_curr;
            t_curr = t_next;
        }

        output
    }
}
