//! 2×3 affine transforms.
//!
//! A [`Matrix`] stands for `[[a, b, c], [d, e, f], [0, 0, 1]]` and maps
//! `(x, y)` to `(a·x + b·y + c, d·x + e·y + f)`.

use crate::{core::geo::Point, MapError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, tx, 0.0, 1.0, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    /// Mirror transform; `reflection(1.0, -1.0)` flips the y axis.
    pub fn reflection(rx: f64, ry: f64) -> Self {
        Self::scale(rx, ry)
    }

    /// Counter-clockwise rotation by `theta` radians.
    pub fn rotate(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self::new(c, -s, 0.0, s, c, 0.0)
    }

    /// Composition: the result applies `m2` first, then `m1`.
    pub fn mul(m1: &Matrix, m2: &Matrix) -> Matrix {
        Matrix::new(
            m1.a * m2.a + m1.b * m2.d,
            m1.a * m2.b + m1.b * m2.e,
            m1.a * m2.c + m1.b * m2.f + m1.c,
            m1.d * m2.a + m1.e * m2.d,
            m1.d * m2.b + m1.e * m2.e,
            m1.d * m2.c + m1.e * m2.f + m1.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// The inverse transform, failing for singular matrices.
    pub fn inverse(&self) -> Result<Matrix> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return Err(MapError::SingularMatrix);
        }
        let a = self.e / det;
        let b = -self.b / det;
        let d = -self.d / det;
        let e = self.a / det;
        Ok(Matrix::new(
            a,
            b,
            -(a * self.c + b * self.f),
            d,
            e,
            -(d * self.c + e * self.f),
        ))
    }

    pub fn transform(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.b * p.y + self.c,
            self.d * p.x + self.e * p.y + self.f,
        )
    }

    /// Length scale factor of the linear part, used for radii and widths.
    pub fn uniform_scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    pub fn approx_eq(&self, other: &Matrix, epsilon: f64) -> bool {
        [
            self.a - other.a,
            self.b - other.b,
            self.c - other.c,
            self.d - other.d,
            self.e - other.e,
            self.f - other.f,
        ]
        .iter()
        .all(|delta| delta.abs() <= epsilon)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        Matrix::mul(&self, &rhs)
    }
}
