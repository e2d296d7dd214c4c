//! Удаление выбросов по правилу IQR

use serde::{Deserialize, Serialize};

use crate::types::CleanedRecord;

const IQR_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutlierField {
    Price,
    UnitsSold,
    Profit,
}

impl OutlierField {
    /// Порядок проходов фильтрации
    pub const ALL: [OutlierField; 3] = [OutlierField::Price, OutlierField::UnitsSold, OutlierField::Profit];

    pub fn value(&self, record: &CleanedRecord) -> f64 {
        match self {
            OutlierField::Price => record.price,
            OutlierField::UnitsSold => record.units_sold as f64,
            OutlierField::Profit => record.profit,
        }
    }
}

/// Границы `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]`.
///
/// Квартили берутся по индексу `floor(n * 0.25)` и `floor(n * 0.75)` в отсортированном
/// массиве, без интерполяции. Для пустого набора границ нет.
pub fn iqr_bounds(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let q1 = sorted[(n as f64 * 0.25).floor() as usize];
    let q3 = sorted[((n as f64 * 0.75).floor() as usize).min(n - 1)];
    let iqr = q3 - q1;

    Some((q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr))
}

pub fn remove_outliers(records: Vec<CleanedRecord>, field: OutlierField) -> Vec<CleanedRecord> {
    let values: Vec<f64> = records.iter().map(|r| field.value(r)).collect();
    let Some((lower, upper)) = iqr_bounds(&values) else {
        return records;
    };

    let before = records.len();
    let kept: Vec<CleanedRecord> = records
        .into_iter()
        .filter(|r| {
            let v = field.value(r);
            v >= lower && v <= upper
        })
        .collect();

    tracing::debug!(
        "{:?}: bounds [{:.3}, {:.3}], removed {} of {}",
        field,
        lower,
        upper,
        before - kept.len(),
        before
    );

    kept
}

/// Последовательные проходы: каждый работает на результате предыдущего
pub fn remove_all_outliers(records: Vec<CleanedRecord>) -> Vec<CleanedRecord> {
    OutlierField::ALL
        .iter()
        .fold(records, |acc, &field| remove_outliers(acc, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(price: f64, units_sold: i64, profit: f64) -> CleanedRecord {
        CleanedRecord {
            product_id: String::new(),
            product_name: String::new(),
            category: String::new(),
            price,
            cost: price / 2.0,
            units_sold,
            promotion_frequency: 0,
            shelf_level: 3,
            profit,
        }
    }

    #[test]
    fn test_index_based_quartiles() {
        // n = 8: Q1 = sorted[2] = 3, Q3 = sorted[6] = 7, IQR = 4
        let values = [8.0, 1.0, 7.0, 2.0, 6.0, 3.0, 5.0, 4.0];
        let (lower, upper) = iqr_bounds(&values).unwrap();
        assert_eq!(lower, 3.0 - 6.0);
        assert_eq!(upper, 7.0 + 6.0);

        assert_eq!(iqr_bounds(&[]), None);
        assert_eq!(iqr_bounds(&[5.0]), Some((5.0, 5.0)));
    }

    #[test]
    fn test_removes_extreme_price() {
        let mut records: Vec<CleanedRecord> =
            (0..10).map(|i| record(2.0 + i as f64 * 0.1, 100, 50.0)).collect();
        records.push(record(500.0, 100, 50.0));

        let filtered = remove_outliers(records, OutlierField::Price);
        assert_eq!(filtered.len(), 10);
        assert!(filtered.iter().all(|r| r.price < 10.0));
    }

    #[test]
    fn test_passes_are_cumulative() {
        let mut records: Vec<CleanedRecord> = (0..12)
            .map(|i| record(3.0 + (i % 4) as f64, 100 + i * 5, 40.0 + i as f64))
            .collect();
        records.push(record(3.5, 10_000, 45.0));
        records.push(record(3.5, 120, -9_000.0));

        let filtered = remove_all_outliers(records);
        assert_eq!(filtered.len(), 12);
        assert!(filtered.iter().all(|r| r.units_sold < 1_000 && r.profit > 0.0));
    }

    #[test]
    fn test_idempotent_on_filtered_set() {
        // Каждое поле - перестановка 0..40, все значения внутри границ
        let records: Vec<CleanedRecord> = (0..40)
            .map(|i| record(1.0 + i as f64, i * 7 % 40, (i * 13 % 40) as f64))
            .collect();

        let once = remove_all_outliers(records);
        assert_eq!(once.len(), 40);
        for field in OutlierField::ALL {
            let again = remove_outliers(once.clone(), field);
            assert_eq!(again.len(), once.len(), "{:?} removed extra rows", field);
        }
    }
}
