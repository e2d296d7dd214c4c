//! Метрики качества регрессии

use ndarray::ArrayView1;

use crate::error::{MlError, Result};
use crate::types::EvaluationResult;

fn check_pair(actual: &ArrayView1<f64>, predicted: &ArrayView1<f64>) -> Result<()> {
    if actual.is_empty() {
        return Err(MlError::EmptyInput("evaluation sequence"));
    }
    if actual.len() != predicted.len() {
        return Err(MlError::ShapeMismatch {
            expected: format!("{} predictions", actual.len()),
            got: format!("{} predictions", predicted.len()),
        });
    }
    Ok(())
}

/// Mean squared error
pub fn mse(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Result<f64> {
    check_pair(&actual, &predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Mean absolute error
pub fn mae(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Result<f64> {
    check_pair(&actual, &predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

pub fn evaluate(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Result<EvaluationResult> {
    Ok(EvaluationResult {
        mse: mse(actual, predicted)?,
        mae: mae(actual, predicted)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn test_identical_sequences() {
        let actual = array![3.0, -1.5, 0.0, 42.0];
        assert_eq!(mse(actual.view(), actual.view()).unwrap(), 0.0);
        assert_eq!(mae(actual.view(), actual.view()).unwrap(), 0.0);
    }

    #[test]
    fn test_known_values() {
        let actual = array![1.0, 2.0, 3.0];
        let predicted = array![2.0, 2.0, 5.0];

        let result = evaluate(actual.view(), predicted.view()).unwrap();
        assert!((result.mse - 5.0 / 3.0).abs() < 1e-12);
        assert!((result.mae - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_and_mismatched() {
        let empty = Array1::<f64>::zeros(0);
        assert!(matches!(
            mse(empty.view(), empty.view()),
            Err(MlError::EmptyInput(_))
        ));
        assert!(matches!(
            mae(empty.view(), empty.view()),
            Err(MlError::EmptyInput(_))
        ));

        let a = array![1.0, 2.0];
        let b = array![1.0];
        assert!(matches!(
            mse(a.view(), b.view()),
            Err(MlError::ShapeMismatch { .. })
        ));
    }
}
