/// Типы данных для ML модуля

use serde::{Deserialize, Serialize};

/// Строка исходного файла по фиксированной схеме колонок.
/// Отсутствующие колонки и короткие строки дают пустые значения.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub price: String,
    pub cost: String,
    pub units_sold: String,
    pub profit: String,
    pub promotion_frequency: String,
    pub shelf_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub price: f64,
    pub cost: f64,
    pub units_sold: i64,
    pub promotion_frequency: i64,
    pub shelf_level: i64,
    pub profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeatures {
    pub price: f64,
    pub units_sold: f64,
    pub promotion_frequency: f64,
}

impl NormalizedFeatures {
    /// Порядок признаков для кластеризации
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.price, self.units_sold, self.promotion_frequency]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(flatten)]
    pub record: CleanedRecord,
    pub normalized: NormalizedFeatures,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessStats {
    pub total_rows: usize,
    pub malformed_rows: usize,
    pub outlier_rows: usize,
    pub retained_rows: usize,
}

/// Сводка по очищенному набору. Для пустого набора средние равны нулю.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_products: usize,
    pub avg_profit: f64,
    pub avg_units_sold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessResult {
    pub cleaned: Vec<CleanedRecord>,
    pub normalized: Vec<NormalizedRecord>,
    pub stats: PreprocessStats,
    pub overview: Overview,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElbowPoint {
    pub k: usize,
    pub wcss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    pub cluster: usize,
    pub name: String,
    pub count: usize,
    pub avg_price: f64,
    pub avg_units: f64,
    pub avg_profit: f64,
    pub avg_promo: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub price: f64,
    pub units_sold: i64,
    pub cluster: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResult {
    pub elbow_data: Vec<ElbowPoint>,
    pub cluster_info: Vec<ClusterInfo>,
    pub scatter_data: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub mse: f64,
    pub mae: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub actual: f64,
    pub predicted: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Linear,
    Polynomial,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Linear => "Linear",
            ModelKind::Polynomial => "Polynomial",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionResult {
    /// `None`, если модель не удалось обучить; причина в `linear_error`
    pub linear_results: Option<EvaluationResult>,
    pub poly_results: Option<EvaluationResult>,
    pub linear_error: Option<String>,
    pub poly_error: Option<String>,
    pub plot_data: Vec<PlotPoint>,
    pub best_model: ModelKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutput {
    pub preprocessing: PreprocessStats,
    pub overview: Overview,
    pub clustering: ClusterResult,
    pub regression: Option<RegressionResult>,
    pub regression_error: Option<String>,
}
