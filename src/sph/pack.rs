// src/sph/pack.rs
// ============================================================================
// PACK - Empaquetado triangular de coeficientes (orden mayor, grado menor)
// ============================================================================
//
// Layout para grado máximo N y orden máximo M (M <= N):
//
//   C: órdenes o = 0..=M, cada bloque con grados d = o..=N
//      total = (M+1)(2N-M+2)/2
//   S: órdenes o = 1..=M (S[d,0] siempre es cero), grados d = o..=N
//      total = M(2N-M+1)/2
//
// ============================================================================

use super::{CoeffMatrix, SphCoeffSet};
use crate::error::{Result, WmmfError};

/// Número de coeficientes C empaquetados para (N, M)
pub fn packed_len_c(n: usize, m: usize) -> usize {
    debug_assert!(m <= n);
    (m + 1) * (2 * n - m + 2) / 2
}

/// Número de coeficientes S empaquetados para (N, M)
pub fn packed_len_s(n: usize, m: usize) -> usize {
    debug_assert!(m <= n);
    m * (2 * n - m + 1) / 2
}

fn check_bounds(matrix: &CoeffMatrix, n: usize, m: usize) -> Result<()> {
    if m > n {
        return Err(WmmfError::Shape(format!("order {} exceeds degree {}", m, n)));
    }
    let (rows, cols) = matrix.shape();
    if rows < n + 1 || cols < m + 1 {
        return Err(WmmfError::Shape(format!(
            "cannot pack ({}, {}) from a {}x{} matrix",
            n, m, rows, cols
        )));
    }
    Ok(())
}

fn pack_orders(matrix: &CoeffMatrix, n: usize, m: usize, first_order: usize, out: &mut Vec<f64>) {
    for order in first_order..=m {
        for degree in order..=n {
            out.push(matrix[(degree, order)]);
        }
    }
}

fn unpack_orders(
    data: &[f64],
    n: usize,
    m: usize,
    first_order: usize,
    expected: usize,
) -> Result<CoeffMatrix> {
    if m > n {
        return Err(WmmfError::Shape(format!("order {} exceeds degree {}", m, n)));
    }
    if data.len() != expected {
        return Err(WmmfError::Shape(format!(
            "{} packed values for (n={}, m={}), expected {}",
            data.len(),
            n,
            m,
            expected
        )));
    }

    let mut matrix = CoeffMatrix::zeros(n + 1, m + 1);
    let mut values = data.iter();
    for order in first_order..=m {
        for degree in order..=n {
            // La longitud ya está validada
            if let Some(v) = values.next() {
                matrix[(degree, order)] = *v;
            }
        }
    }
    Ok(matrix)
}

/// Empaqueta la familia coseno
pub fn pack_c(matrix: &CoeffMatrix, n: usize, m: usize) -> Result<Vec<f64>> {
    check_bounds(matrix, n, m)?;
    let mut out = Vec::with_capacity(packed_len_c(n, m));
    pack_orders(matrix, n, m, 0, &mut out);
    Ok(out)
}

/// Empaqueta la familia seno (sin el orden 0)
pub fn pack_s(matrix: &CoeffMatrix, n: usize, m: usize) -> Result<Vec<f64>> {
    check_bounds(matrix, n, m)?;
    let mut out = Vec::with_capacity(packed_len_s(n, m));
    pack_orders(matrix, n, m, 1, &mut out);
    Ok(out)
}

pub fn unpack_c(n: usize, m: usize, data: &[f64]) -> Result<CoeffMatrix> {
    unpack_orders(data, n, m, 0, packed_len_c(n, m.min(n)))
}

pub fn unpack_s(n: usize, m: usize, data: &[f64]) -> Result<CoeffMatrix> {
    unpack_orders(data, n, m, 1, packed_len_s(n, m.min(n)))
}

/// Calcula el (N, M) mínimo que contiene todos los coeficientes no nulos.
///
/// Un conjunto todo ceros se reduce a (0, 0). Los valores que se perderían
/// al empaquetar (orden > grado, o S de orden 0) son un error.
pub fn effective_size(set: &SphCoeffSet) -> Result<(usize, usize)> {
    set.validate_shape()?;

    let mut n = 0;
    let mut m = 0;
    for (family, matrix) in [("C", &set.c), ("S", &set.s)] {
        for (degree, order, _) in matrix.nonzeros() {
            if order > degree {
                return Err(WmmfError::Consistency(format!(
                    "non-zero {} coefficient at degree {}, order {}: order exceeds degree",
                    family, degree, order
                )));
            }
            if family == "S" && order == 0 {
                return Err(WmmfError::Consistency(format!(
                    "non-zero S coefficient at degree {}, order 0",
                    degree
                )));
            }
            n = n.max(degree);
            m = m.max(order);
        }
    }
    Ok((n, m))
}

/// Bloque empaquetado listo para el fichero binario
#[derive(Debug, Clone, PartialEq)]
pub struct PackedCoeffs {
    pub n: usize,
    pub m: usize,
    pub c: Vec<f64>,
    pub s: Vec<f64>,
}

impl PackedCoeffs {
    /// Recorta y empaqueta un conjunto de coeficientes
    pub fn from_set(set: &SphCoeffSet) -> Result<Self> {
        let (n, m) = effective_size(set)?;
        Ok(Self {
            n,
            m,
            c: pack_c(&set.c, n, m)?,
            s: pack_s(&set.s, n, m)?,
        })
    }

    /// Reconstruye las matrices densas (N+1)×(M+1)
    pub fn to_set(&self) -> Result<SphCoeffSet> {
        Ok(SphCoeffSet {
            c: unpack_c(self.n, self.m, &self.c)?,
            s: unpack_s(self.n, self.m, &self.s)?,
        })
    }

    /// Tamaño en bytes del bloque serializado (cabecera + datos)
    pub fn byte_len(&self) -> usize {
        8 + 8 * (self.c.len() + self.s.len())
    }
}
