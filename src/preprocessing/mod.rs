/// Модуль предобработки данных

pub mod normalization;
pub mod outliers;
pub mod parsing;

pub use normalization::MinMaxNormalizer;
pub use outliers::{iqr_bounds, remove_all_outliers, remove_outliers, OutlierField};
pub use parsing::parse_records;

use ndarray::Array2;

use crate::error::Result;
use crate::types::{
    CleanedRecord, NormalizedFeatures, NormalizedRecord, Overview, PreprocessResult,
    PreprocessStats, RawRecord,
};

/// Признаки для нормализации (и кластеризации), в этом порядке
pub const NORMALIZED_FEATURES: [&str; 3] = ["price", "units_sold", "promotion_frequency"];

/// Текст -> очищенные записи без выбросов + нормализованные признаки.
/// Некорректные строки и выбросы отбрасываются молча, их число попадает в `stats`.
pub fn preprocess(text: &str, delimiter: char) -> Result<PreprocessResult> {
    let raw = parse_records(text, delimiter)?;
    let total_rows = raw.len();

    let parsed: Vec<CleanedRecord> = raw.iter().filter_map(RawRecord::to_cleaned).collect();
    let malformed_rows = total_rows - parsed.len();

    let parsed_count = parsed.len();
    let cleaned = remove_all_outliers(parsed);
    let outlier_rows = parsed_count - cleaned.len();

    let normalized = normalize_records(&cleaned)?;

    let stats = PreprocessStats {
        total_rows,
        malformed_rows,
        outlier_rows,
        retained_rows: cleaned.len(),
    };
    tracing::info!(
        "Preprocessed {} rows: {} malformed, {} outliers, {} retained",
        stats.total_rows,
        stats.malformed_rows,
        stats.outlier_rows,
        stats.retained_rows
    );

    let overview = overview(&cleaned);

    Ok(PreprocessResult {
        cleaned,
        normalized,
        stats,
        overview,
    })
}

pub fn overview(records: &[CleanedRecord]) -> Overview {
    if records.is_empty() {
        return Overview::default();
    }

    let n = records.len() as f64;
    Overview {
        total_products: records.len(),
        avg_profit: records.iter().map(|r| r.profit).sum::<f64>() / n,
        avg_units_sold: records.iter().map(|r| r.units_sold as f64).sum::<f64>() / n,
    }
}

/// Min/max считаются по всему отфильтрованному набору
pub fn normalize_records(records: &[CleanedRecord]) -> Result<Vec<NormalizedRecord>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let mut features = Array2::zeros((records.len(), NORMALIZED_FEATURES.len()));
    for (i, record) in records.iter().enumerate() {
        features[[i, 0]] = record.price;
        features[[i, 1]] = record.units_sold as f64;
        features[[i, 2]] = record.promotion_frequency as f64;
    }

    let scaled = MinMaxNormalizer::new().fit_transform(&features)?;

    Ok(records
        .iter()
        .zip(scaled.rows())
        .map(|(record, row)| NormalizedRecord {
            record: record.clone(),
            normalized: NormalizedFeatures {
                price: row[0],
                units_sold: row[1],
                promotion_frequency: row[2],
            },
        })
        .collect())
}
