//! Матричные операции для нормального уравнения

#![allow(non_snake_case)]

use ndarray::{Array1, Array2};

use crate::error::{MlError, Result};

pub fn transpose(M: &Array2<f64>) -> Array2<f64> {
    M.t().to_owned()
}

pub fn multiply(A: &Array2<f64>, B: &Array2<f64>) -> Result<Array2<f64>> {
    if A.ncols() != B.nrows() {
        return Err(MlError::ShapeMismatch {
            expected: format!("{} rows in right operand", A.ncols()),
            got: format!("{}x{}", B.nrows(), B.ncols()),
        });
    }

    Ok(A.dot(B))
}

/// Обращение матрицы методом Гаусса-Жордана с частичным выбором ведущего элемента.
///
/// Работает на расширенной матрице `[M | I]`. Ведущий элемент, по модулю не превосходящий
/// `n * EPSILON * max|M|`, считается нулевым: матрица вырождена, и вместо неустойчивого
/// результата возвращается [`MlError::SingularMatrix`].
pub fn invert(M: &Array2<f64>) -> Result<Array2<f64>> {
    let n = M.nrows();
    if n == 0 {
        return Err(MlError::EmptyInput("matrix to invert"));
    }
    if M.ncols() != n {
        return Err(MlError::ShapeMismatch {
            expected: "square matrix".to_string(),
            got: format!("{}x{}", n, M.ncols()),
        });
    }

    let scale = M.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if !scale.is_finite() {
        return Err(MlError::NonFinite("matrix to invert"));
    }
    let tolerance = n as f64 * f64::EPSILON * scale;

    let mut augmented = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            augmented[[i, j]] = M[[i, j]];
        }
        augmented[[i, n + i]] = 1.0;
    }

    for i in 0..n {
        // Поиск максимального элемента в столбце
        let mut max_row = i;
        let mut max_val = augmented[[i, i]].abs();
        for k in (i + 1)..n {
            if augmented[[k, i]].abs() > max_val {
                max_val = augmented[[k, i]].abs();
                max_row = k;
            }
        }

        if max_row != i {
            for j in 0..2 * n {
                augmented.swap([i, j], [max_row, j]);
            }
        }

        let pivot = augmented[[i, i]];
        if pivot.abs() <= tolerance {
            return Err(MlError::SingularMatrix { column: i, pivot });
        }

        for j in 0..2 * n {
            augmented[[i, j]] /= pivot;
        }

        // Исключение во всех остальных строках
        for k in 0..n {
            if k == i {
                continue;
            }
            let factor = augmented[[k, i]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..2 * n {
                augmented[[k, j]] -= factor * augmented[[i, j]];
            }
        }
    }

    let mut inverse = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inverse[[i, j]] = augmented[[i, n + j]];
        }
    }

    Ok(inverse)
}

/// Симметричное масштабирование по диагонали: `S = D M D`, `D = diag(1 / sqrt(M_ii))`.
///
/// Для матрицы Грама `X^T X` у `S` единичная диагональ и внедиагональные элементы
/// не больше 1 по модулю, поэтому порог вырожденности в [`invert`] не зависит от
/// масштаба признаков. `M^(-1) = D S^(-1) D`.
/// Неположительный диагональный элемент означает нулевой столбец `X`.
pub fn equilibrate(M: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    let n = M.nrows();
    if M.ncols() != n {
        return Err(MlError::ShapeMismatch {
            expected: "square matrix".to_string(),
            got: format!("{}x{}", n, M.ncols()),
        });
    }

    let mut d = Array1::zeros(n);
    for i in 0..n {
        let diag = M[[i, i]];
        if !diag.is_finite() {
            return Err(MlError::NonFinite("matrix diagonal"));
        }
        if diag <= 0.0 {
            return Err(MlError::SingularMatrix { column: i, pivot: diag });
        }
        d[i] = 1.0 / diag.sqrt();
    }

    let mut S = M.clone();
    for ((i, j), value) in S.indexed_iter_mut() {
        *value = d[i] * *value * d[j];
    }

    Ok((S, d))
}
