//! Неизменяемый конвейер анализа поверх результата предобработки

use ndarray::Array2;

use crate::config::{validate_k, AnalysisConfig, RngStream};
use crate::error::{MlError, Result};
use crate::models::clustering::{elbow_sweep, feature_matrix, KMeans, KMeansModel};
use crate::models::regression::run_regression;
use crate::preprocessing::preprocess;
use crate::types::{
    AnalysisOutput, ClusterResult, ElbowPoint, PreprocessResult, RegressionResult,
};

/// Снимок данных, общий для кластеризации и регрессии.
///
/// Оба движка только читают записи; перезапуск кластеризации с другим `k`
/// не затрагивает регрессию и наоборот.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    data: PreprocessResult,
    features: Array2<f64>,
}

impl AnalysisPipeline {
    pub fn from_csv(text: &str, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let data = preprocess(text, config.delimiter)?;
        Ok(Self::from_preprocessed(data, config))
    }

    pub fn from_preprocessed(data: PreprocessResult, config: AnalysisConfig) -> Self {
        let features = feature_matrix(&data.normalized);
        Self {
            config,
            data,
            features,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn data(&self) -> &PreprocessResult {
        &self.data
    }

    pub fn elbow_curve(&self) -> Result<Vec<ElbowPoint>> {
        let mut rng = self.config.rng(RngStream::Elbow);
        elbow_sweep(
            &self.features,
            self.config.elbow_min_k..=self.config.elbow_max_k,
            self.config.max_iterations,
            self.config.tolerance,
            &mut rng,
        )
    }

    pub fn fit_clusters(&self, k: usize) -> Result<KMeansModel> {
        validate_k(k)?;
        if self.features.nrows() == 0 {
            return Err(MlError::EmptyInput("normalized records"));
        }

        let mut rng = self.config.rng(RngStream::ClusterFit { k });
        KMeans::new(k, self.config.max_iterations, self.config.tolerance).fit(&self.features, &mut rng)
    }

    /// Кривая локтя + кластеризация для `config.k`
    pub fn clustering(&self) -> Result<ClusterResult> {
        let elbow = self.elbow_curve()?;
        self.refit_clusters(elbow, self.config.k)
    }

    /// Повторная кластеризация с новым `k`; кривая локтя переиспользуется
    pub fn refit_clusters(&self, elbow_data: Vec<ElbowPoint>, k: usize) -> Result<ClusterResult> {
        let model = self.fit_clusters(k)?;
        tracing::info!(
            "Clustered {} products into k={} ({:?}), sizes {:?}",
            self.features.nrows(),
            k,
            model.convergence,
            model.cluster_sizes()
        );

        Ok(ClusterResult {
            elbow_data,
            cluster_info: model.cluster_info(&self.data.normalized),
            scatter_data: model.scatter_data(&self.data.normalized),
        })
    }

    pub fn regression(&self) -> Result<RegressionResult> {
        let mut rng = self.config.rng(RngStream::Regression);
        run_regression(&self.data.cleaned, self.config.train_ratio, &mut rng)
    }

    /// Полный анализ. Ошибка регрессии не прерывает кластеризацию и
    /// возвращается отдельным полем.
    pub fn run(&self) -> Result<AnalysisOutput> {
        let clustering = self.clustering()?;

        let (regression, regression_error) = match self.regression() {
            Ok(result) => (Some(result), None),
            Err(e) => {
                tracing::warn!("Regression failed: {}", e);
                (None, Some(e.to_string()))
            }
        };

        Ok(AnalysisOutput {
            preprocessing: self.data.stats,
            overview: self.data.overview,
            clustering,
            regression,
            regression_error,
        })
    }
}
