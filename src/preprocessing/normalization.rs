//! Нормализация данных

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, Axis};

use crate::error::{MlError, Result};

/// Min-max нормализация по столбцам в диапазон [0, 1]
pub struct MinMaxNormalizer {
    min: Option<Array1<f64>>,
    range: Option<Array1<f64>>,
    is_fitted: bool,
}

impl MinMaxNormalizer {
    pub fn new() -> Self {
        Self {
            min: None,
            range: None,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>) -> Result<()> {
        if X.nrows() == 0 {
            return Err(MlError::EmptyInput("dataset to normalize"));
        }
        if X.iter().any(|v| !v.is_finite()) {
            return Err(MlError::NonFinite("dataset to normalize"));
        }

        let min = X.fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
        let max = X.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));

        self.range = Some(&max - &min);
        self.min = Some(min);
        self.is_fitted = true;
        Ok(())
    }

    /// Вырожденный столбец (max == min) отображается в 0.0
    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(MlError::NotFitted("normalizer"));
        }

        let min = self.min.as_ref().ok_or(MlError::NotFitted("normalizer min"))?;
        let range = self.range.as_ref().ok_or(MlError::NotFitted("normalizer range"))?;

        if X.ncols() != min.len() {
            return Err(MlError::ShapeMismatch {
                expected: format!("{} columns", min.len()),
                got: format!("{} columns", X.ncols()),
            });
        }

        let mut normalized = X.clone();
        for mut row in normalized.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = if range[i] > 0.0 {
                    (*val - min[i]) / range[i]
                } else {
                    0.0
                };
            }
        }

        Ok(normalized)
    }

    pub fn fit_transform(&mut self, X: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(X)?;
        self.transform(X)
    }
}

impl Default for MinMaxNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
