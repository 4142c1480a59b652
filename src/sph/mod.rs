// src/sph/mod.rs
// ============================================================================
// SPH - Coeficientes de armónicos esféricos (matrices grado × orden)
// ============================================================================

pub mod pack;

use std::ops::{Index, IndexMut};

pub use pack::{
    effective_size, pack_c, pack_s, packed_len_c, packed_len_s, unpack_c, unpack_s,
    PackedCoeffs,
};

use crate::error::{Result, WmmfError};

/// Matriz densa (grado × orden), row-major.
///
/// Fila `d` = grado, columna `o` = orden. Sólo las entradas con `o <= d`
/// tienen sentido físico; el resto debe ser cero.
#[derive(Debug, Clone, PartialEq)]
pub struct CoeffMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CoeffMatrix {
    /// Matriz de ceros con `rows` grados y `cols` órdenes
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0.0; rows * cols] }
    }

    /// Construye desde datos row-major
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(WmmfError::Shape(format!(
                "{} values for a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// (filas, columnas) = (N + 1, M + 1)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Grado máximo representable (N)
    pub fn max_degree(&self) -> usize {
        self.rows.saturating_sub(1)
    }

    /// Orden máximo representable (M)
    pub fn max_order(&self) -> usize {
        self.cols.saturating_sub(1)
    }

    pub fn get(&self, degree: usize, order: usize) -> Option<f64> {
        if degree < self.rows && order < self.cols {
            Some(self.data[degree * self.cols + order])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Iterador sobre (grado, orden, valor) de las entradas no nulas
    pub fn nonzeros(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(move |(i, v)| (i / self.cols, i % self.cols, *v))
    }
}

impl Index<(usize, usize)> for CoeffMatrix {
    type Output = f64;

    fn index(&self, (degree, order): (usize, usize)) -> &f64 {
        assert!(degree < self.rows && order < self.cols, "index ({}, {}) out of bounds", degree, order);
        &self.data[degree * self.cols + order]
    }
}

impl IndexMut<(usize, usize)> for CoeffMatrix {
    fn index_mut(&mut self, (degree, order): (usize, usize)) -> &mut f64 {
        assert!(degree < self.rows && order < self.cols, "index ({}, {}) out of bounds", degree, order);
        &mut self.data[degree * self.cols + order]
    }
}

/// Conjunto de coeficientes de una época: coseno (C) y seno (S)
#[derive(Debug, Clone, PartialEq)]
pub struct SphCoeffSet {
    pub c: CoeffMatrix,
    pub s: CoeffMatrix,
}

impl SphCoeffSet {
    /// Conjunto vacío de grado máximo `n` y orden máximo `m`
    pub fn zeros(n: usize, m: usize) -> Self {
        Self {
            c: CoeffMatrix::zeros(n + 1, m + 1),
            s: CoeffMatrix::zeros(n + 1, m + 1),
        }
    }

    pub fn new(c: CoeffMatrix, s: CoeffMatrix) -> Result<Self> {
        let set = Self { c, s };
        set.validate_shape()?;
        Ok(set)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.c.shape()
    }

    /// Comprueba que C y S tienen la misma forma y que M <= N
    pub fn validate_shape(&self) -> Result<(usize, usize)> {
        if self.c.shape() != self.s.shape() {
            return Err(WmmfError::Shape(format!(
                "C and S coefficients do not have the same shape (C: {:?}, S: {:?})",
                self.c.shape(),
                self.s.shape()
            )));
        }
        let (rows, cols) = self.c.shape();
        if rows == 0 || cols == 0 {
            return Err(WmmfError::Shape(format!("empty coefficient arrays {:?}", (rows, cols))));
        }
        let (n, m) = (rows - 1, cols - 1);
        if m > n {
            return Err(WmmfError::Shape(format!(
                "invalid shape of coefficient arrays: n={}, m={}, expected m <= n",
                n, m
            )));
        }
        Ok((n, m))
    }

    /// Empaqueta el subconjunto mínimo no nulo
    pub fn pack(&self) -> Result<PackedCoeffs> {
        PackedCoeffs::from_set(self)
    }
}
