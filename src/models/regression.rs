//! Модель прибыли: линейная и полиномиальная регрессия через нормальное уравнение

#![allow(non_snake_case)]

use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{MlError, Result};
use crate::linalg::{equilibrate, invert, multiply, transpose};
use crate::models::evaluation::evaluate;
use crate::types::{CleanedRecord, EvaluationResult, ModelKind, PlotPoint, RegressionResult};

impl ModelKind {
    pub fn n_features(&self) -> usize {
        match self {
            ModelKind::Linear => 5,
            ModelKind::Polynomial => 10,
        }
    }

    /// Строка матрицы плана со свободным членом в начале
    pub fn design_row(&self, record: &CleanedRecord) -> Vec<f64> {
        let p = record.price;
        let c = record.cost;
        let u = record.units_sold as f64;
        let pr = record.promotion_frequency as f64;

        match self {
            ModelKind::Linear => vec![1.0, p, c, u, pr],
            ModelKind::Polynomial => vec![1.0, p, c, u, pr, p * p, c * c, u * u, p * u, c * u],
        }
    }
}

pub fn design_matrix(kind: ModelKind, records: &[CleanedRecord]) -> Array2<f64> {
    let mut X = Array2::zeros((records.len(), kind.n_features()));
    for (i, record) in records.iter().enumerate() {
        for (j, value) in kind.design_row(record).into_iter().enumerate() {
            X[[i, j]] = value;
        }
    }
    X
}

pub fn targets(records: &[CleanedRecord]) -> Array1<f64> {
    records.iter().map(|r| r.profit).collect()
}

/// w = (X^T X)^(-1) X^T y, обращение после масштабирования X^T X по диагонали
pub fn solve_normal_equation(X: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
    if X.nrows() == 0 {
        return Err(MlError::EmptyInput("training set"));
    }
    if X.nrows() != y.len() {
        return Err(MlError::ShapeMismatch {
            expected: format!("{} targets", X.nrows()),
            got: format!("{} targets", y.len()),
        });
    }

    let XT = transpose(X);
    let XTX = multiply(&XT, X)?;
    let (S, d) = equilibrate(&XTX)?;
    let S_inv = invert(&S)?;
    let XTy = XT.dot(y);

    // (X^T X)^(-1) = D S^(-1) D
    Ok(&d * &S_inv.dot(&(&d * &XTy)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionModel {
    pub kind: ModelKind,
    pub weights: Array1<f64>,
}

impl RegressionModel {
    pub fn fit(kind: ModelKind, records: &[CleanedRecord]) -> Result<Self> {
        let X = design_matrix(kind, records);
        let y = targets(records);

        let weights = solve_normal_equation(&X, &y).map_err(|e| {
            tracing::warn!("{} regression fit failed: {}", kind.name(), e);
            MlError::ModelFit {
                model: kind.name(),
                source: Box::new(e),
            }
        })?;

        Ok(Self { kind, weights })
    }

    pub fn predict(&self, records: &[CleanedRecord]) -> Array1<f64> {
        design_matrix(self.kind, records).dot(&self.weights)
    }

    pub fn evaluate(&self, records: &[CleanedRecord]) -> Result<(EvaluationResult, Array1<f64>)> {
        let predicted = self.predict(records);
        let actual = targets(records);
        let result = evaluate(actual.view(), predicted.view())?;
        Ok((result, predicted))
    }
}

/// Равномерное перемешивание (Fisher-Yates), затем первые `floor(n * train_ratio)` записей - train
pub fn train_test_split<R: Rng + ?Sized>(
    records: &[CleanedRecord],
    train_ratio: f64,
    rng: &mut R,
) -> (Vec<CleanedRecord>, Vec<CleanedRecord>) {
    let mut shuffled = records.to_vec();
    shuffled.shuffle(rng);

    let split_idx = ((shuffled.len() as f64 * train_ratio).floor() as usize).min(shuffled.len());
    let test = shuffled.split_off(split_idx);
    (shuffled, test)
}

/// Линейная модель выбирается только при строго меньшей MSE
pub fn select_best(linear: &EvaluationResult, polynomial: &EvaluationResult) -> ModelKind {
    if linear.mse < polynomial.mse {
        ModelKind::Linear
    } else {
        ModelKind::Polynomial
    }
}

fn fit_and_evaluate(
    kind: ModelKind,
    train: &[CleanedRecord],
    test: &[CleanedRecord],
) -> Result<(EvaluationResult, Array1<f64>)> {
    RegressionModel::fit(kind, train)?.evaluate(test)
}

fn outcome(result: &Result<(EvaluationResult, Array1<f64>)>) -> (Option<EvaluationResult>, Option<String>) {
    match result {
        Ok((evaluation, _)) => (Some(*evaluation), None),
        Err(e) => (None, Some(e.to_string())),
    }
}

fn mse_label(result: &Option<EvaluationResult>) -> String {
    result
        .map(|r| format!("{:.2}", r.mse))
        .unwrap_or_else(|| "failed".to_string())
}

/// Обе формы обучаются независимо. Если одна не обучилась, лучшей становится другая,
/// а причина сбоя попадает в результат. Ошибка только если не обучилась ни одна.
pub fn run_regression<R: Rng + ?Sized>(
    records: &[CleanedRecord],
    train_ratio: f64,
    rng: &mut R,
) -> Result<RegressionResult> {
    if records.is_empty() {
        return Err(MlError::EmptyInput("records for regression"));
    }

    let (train, test) = train_test_split(records, train_ratio, rng);
    if train.is_empty() {
        return Err(MlError::EmptyInput("training split"));
    }
    if test.is_empty() {
        return Err(MlError::EmptyInput("test split"));
    }

    let linear = fit_and_evaluate(ModelKind::Linear, &train, &test);
    let polynomial = fit_and_evaluate(ModelKind::Polynomial, &train, &test);

    let (best_model, best_pred) = match (&linear, &polynomial) {
        (Ok((l, l_pred)), Ok((p, p_pred))) => match select_best(l, p) {
            ModelKind::Linear => (ModelKind::Linear, l_pred),
            ModelKind::Polynomial => (ModelKind::Polynomial, p_pred),
        },
        (Ok((_, pred)), Err(_)) => (ModelKind::Linear, pred),
        (Err(_), Ok((_, pred))) => (ModelKind::Polynomial, pred),
        (Err(e), Err(_)) => return Err(e.clone()),
    };

    let plot_data = test
        .iter()
        .zip(best_pred.iter())
        .map(|(record, &predicted)| PlotPoint {
            actual: record.profit,
            predicted,
        })
        .collect();

    let (linear_results, linear_error) = outcome(&linear);
    let (poly_results, poly_error) = outcome(&polynomial);

    tracing::info!(
        "Regression trained on {} rows, tested on {}. Linear MSE: {}, polynomial MSE: {}, best: {}",
        train.len(),
        test.len(),
        mse_label(&linear_results),
        mse_label(&poly_results),
        best_model.name()
    );

    Ok(RegressionResult {
        linear_results,
        poly_results,
        linear_error,
        poly_error,
        plot_data,
        best_model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(id: usize, price: f64, cost: f64, units_sold: i64, promotion_frequency: i64, profit: f64) -> CleanedRecord {
        CleanedRecord {
            product_id: format!("P{}", id),
            product_name: String::new(),
            category: String::new(),
            price,
            cost,
            units_sold,
            promotion_frequency,
            shelf_level: 3,
            profit,
        }
    }

    /// Признаки с разными периодами, чтобы матрица плана имела полный ранг
    fn synthetic(n: usize, profit: impl Fn(&CleanedRecord) -> f64) -> Vec<CleanedRecord> {
        (0..n)
            .map(|i| {
                let mut r = record(
                    i,
                    1.0 + (i % 7) as f64 * 0.5,
                    0.5 + (i * 3 % 11) as f64 * 0.2,
                    10 + (i * 13 % 40) as i64,
                    (i % 4) as i64,
                    0.0,
                );
                r.profit = profit(&r);
                r
            })
            .collect()
    }

    #[test]
    fn test_design_rows() {
        let r = record(0, 2.0, 1.0, 10, 3, 0.0);
        assert_eq!(ModelKind::Linear.design_row(&r), vec![1.0, 2.0, 1.0, 10.0, 3.0]);
        assert_eq!(
            ModelKind::Polynomial.design_row(&r),
            vec![1.0, 2.0, 1.0, 10.0, 3.0, 4.0, 1.0, 100.0, 20.0, 10.0]
        );
        assert_eq!(design_matrix(ModelKind::Polynomial, &[r]).shape(), &[1, 10]);
    }

    #[test]
    fn test_normal_equation_recovers_weights() {
        let w = array![5.0, 2.0, -1.5, 0.3, 4.0];
        let records = synthetic(40, |r| {
            w.dot(&Array1::from(ModelKind::Linear.design_row(r)))
        });

        let model = RegressionModel::fit(ModelKind::Linear, &records).unwrap();
        for (fitted, expected) in model.weights.iter().zip(w.iter()) {
            assert!((fitted - expected).abs() < 1e-6, "{} != {}", fitted, expected);
        }
    }

    #[test]
    fn test_polynomial_fits_quadratic_profit() {
        let records = synthetic(60, |r| {
            let u = r.units_sold as f64;
            3.0 + 2.0 * r.price - r.cost + 0.5 * u + 0.01 * u * u + 0.2 * r.price * u
        });

        let model = RegressionModel::fit(ModelKind::Polynomial, &records).unwrap();
        let (result, _) = model.evaluate(&records).unwrap();
        assert!(result.mse < 1e-3, "mse = {}", result.mse);
    }

    #[test]
    fn test_singular_fit_is_reported() {
        // Все строки одинаковые: X^T X вырождена
        let records: Vec<CleanedRecord> = (0..10).map(|i| record(i, 2.0, 1.0, 600, 0, 500.0)).collect();

        match RegressionModel::fit(ModelKind::Linear, &records) {
            Err(MlError::ModelFit { model, source }) => {
                assert_eq!(model, "Linear");
                assert!(matches!(*source, MlError::SingularMatrix { .. }));
            }
            other => panic!("expected singular fit, got {:?}", other),
        }
    }

    #[test]
    fn test_polynomial_fit_with_units_in_thousands() {
        for step in [250_i64, 500] {
            let records: Vec<CleanedRecord> = (0..196)
                .map(|i| {
                    let price = 1.0 + (i % 7) as f64 * 0.5;
                    let cost = 0.5 + (i * 3 % 11) as f64 * 0.2;
                    let units = 1000 + (i * 13 % 40) as i64 * step;
                    let noise = ((i * 7 % 5) as f64 - 2.0) * 0.5;
                    let profit = (price - cost) * units as f64 + noise;
                    record(i, price, cost, units, (i % 4) as i64, profit)
                })
                .collect();

            let linear = RegressionModel::fit(ModelKind::Linear, &records).unwrap();
            assert!(linear.evaluate(&records).is_ok());

            // Остаток МНК на обучающей выборке не больше среднего квадрата шума (0.5)
            let poly = RegressionModel::fit(ModelKind::Polynomial, &records).unwrap();
            let (result, _) = poly.evaluate(&records).unwrap();
            assert!(result.mse < 0.6, "step {}: mse = {}", step, result.mse);
        }
    }

    #[test]
    fn test_polynomial_failure_keeps_linear_model() {
        // price принимает только 0 и 1, поэтому столбец price^2 совпадает с price
        let records: Vec<CleanedRecord> = (0..100)
            .map(|i| {
                let price = (i % 2) as f64;
                let cost = (1 + i * 3 % 11) as f64;
                let units = 10 + (i * 13 % 40) as i64;
                let promo = (i % 4) as i64;
                let profit = 2.0 + 3.0 * price - cost + 0.5 * units as f64 + promo as f64;
                record(i, price, cost, units, promo, profit)
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(17);
        let result = run_regression(&records, 0.7, &mut rng).unwrap();

        assert_eq!(result.best_model, ModelKind::Linear);
        assert!(result.poly_results.is_none());
        assert!(result.poly_error.unwrap().contains("Polynomial"));
        assert!(result.linear_error.is_none());
        assert!(result.linear_results.unwrap().mse < 1e-6);
        assert_eq!(result.plot_data.len(), 30);
    }

    #[test]
    fn test_both_forms_failing_is_an_error() {
        let records: Vec<CleanedRecord> = (0..10).map(|i| record(i, 2.0, 1.0, 600, 0, 500.0)).collect();
        let mut rng = StdRng::seed_from_u64(2);

        assert!(matches!(
            run_regression(&records, 0.7, &mut rng),
            Err(MlError::ModelFit { model: "Linear", .. })
        ));
    }

    #[test]
    fn test_split_is_permutation() {
        let records = synthetic(10, |_| 0.0);
        let mut rng = StdRng::seed_from_u64(11);
        let (train, test) = train_test_split(&records, 0.7, &mut rng);

        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);

        let mut ids: Vec<String> = train.iter().chain(test.iter()).map(|r| r.product_id.clone()).collect();
        ids.sort();
        let mut expected: Vec<String> = records.iter().map(|r| r.product_id.clone()).collect();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_select_best() {
        let low = EvaluationResult { mse: 1.0, mae: 1.0 };
        let high = EvaluationResult { mse: 2.0, mae: 0.5 };
        assert_eq!(select_best(&low, &high), ModelKind::Linear);
        assert_eq!(select_best(&high, &low), ModelKind::Polynomial);
        assert_eq!(select_best(&low, &low), ModelKind::Polynomial);
    }

    #[test]
    fn test_run_regression_picks_polynomial_for_quadratic_profit() {
        let records = synthetic(100, |r| {
            let u = r.units_sold as f64;
            10.0 + 0.05 * u * u - 3.0 * r.cost * u
        });
        let mut rng = StdRng::seed_from_u64(3);
        let result = run_regression(&records, 0.7, &mut rng).unwrap();

        assert_eq!(result.best_model, ModelKind::Polynomial);
        assert_eq!(result.plot_data.len(), 30);
        let poly = result.poly_results.unwrap();
        let linear = result.linear_results.unwrap();
        assert!(poly.mse < linear.mse);
        assert!(result.linear_error.is_none() && result.poly_error.is_none());
        for point in &result.plot_data {
            assert!((point.actual - point.predicted).abs() < 0.05);
        }
    }

    #[test]
    fn test_run_regression_empty_splits() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            run_regression(&[], 0.7, &mut rng),
            Err(MlError::EmptyInput(_))
        ));

        let one = vec![record(0, 1.0, 1.0, 1, 0, 1.0)];
        assert!(matches!(
            run_regression(&one, 0.7, &mut rng),
            Err(MlError::EmptyInput("training split"))
        ));
    }
}
