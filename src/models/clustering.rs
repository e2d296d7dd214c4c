//! Кластеризация товаров методом k-means

use std::ops::RangeInclusive;

use ndarray::{Array2, ArrayView1};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MlError, Result};
use crate::models::labeling::label_cluster;
use crate::types::{ClusterInfo, ElbowPoint, NormalizedRecord, ScatterPoint};

pub fn euclidean_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// k различных строк, выбранных равномерно без возвращения
pub fn initialize_centroids<R: Rng + ?Sized>(
    data: &Array2<f64>,
    k: usize,
    rng: &mut R,
) -> Result<Array2<f64>> {
    let n = data.nrows();
    if n == 0 {
        return Err(MlError::EmptyInput("points to cluster"));
    }
    if k == 0 || k > n {
        return Err(MlError::InvalidClusterCount { k, n });
    }

    let indices = rand::seq::index::sample(rng, n, k);
    let mut centroids = Array2::zeros((k, data.ncols()));
    for (row, idx) in indices.iter().enumerate() {
        centroids.row_mut(row).assign(&data.row(idx));
    }

    Ok(centroids)
}

/// Ближайший центроид; при равенстве расстояний побеждает меньший индекс
pub fn assign_clusters(data: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.rows()
        .into_iter()
        .map(|point| {
            let mut min_distance = f64::INFINITY;
            let mut cluster = 0;
            for (i, centroid) in centroids.rows().into_iter().enumerate() {
                let distance = euclidean_distance(point, centroid);
                if distance < min_distance {
                    min_distance = distance;
                    cluster = i;
                }
            }
            cluster
        })
        .collect()
}

/// Среднее точек кластера. Кластер без точек сохраняет прежний центроид.
pub fn update_centroids(
    data: &Array2<f64>,
    assignments: &[usize],
    centroids: &Array2<f64>,
) -> Array2<f64> {
    let k = centroids.nrows();
    let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
    let mut counts = vec![0usize; k];

    for (point, &cluster) in data.rows().into_iter().zip(assignments) {
        counts[cluster] += 1;
        let mut sum = sums.row_mut(cluster);
        sum += &point;
    }

    let mut updated = centroids.clone();
    for (i, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean = sums.row(i).mapv(|v| v / count as f64);
            updated.row_mut(i).assign(&mean);
        }
    }

    updated
}

/// Within-cluster sum of squares
pub fn calculate_wcss(data: &Array2<f64>, assignments: &[usize], centroids: &Array2<f64>) -> f64 {
    data.rows()
        .into_iter()
        .zip(assignments)
        .map(|(point, &cluster)| euclidean_distance(point, centroids.row(cluster)).powi(2))
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Convergence {
    Converged { iterations: usize },
    MaxIterationsReached { iterations: usize },
}

#[derive(Debug, Clone)]
pub struct KMeansModel {
    pub centroids: Array2<f64>,
    pub assignments: Vec<usize>,
    pub wcss: f64,
    pub convergence: Convergence,
}

impl KMeansModel {
    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &cluster in &self.assignments {
            sizes[cluster] += 1;
        }
        sizes
    }

    /// Сводка по кластерам в исходных (не нормализованных) величинах
    pub fn cluster_info(&self, records: &[NormalizedRecord]) -> Vec<ClusterInfo> {
        #[derive(Default)]
        struct Totals {
            count: usize,
            price: f64,
            units: f64,
            profit: f64,
            promo: f64,
        }

        let mut totals: Vec<Totals> = (0..self.k()).map(|_| Totals::default()).collect();
        for (item, &cluster) in records.iter().zip(&self.assignments) {
            let t = &mut totals[cluster];
            t.count += 1;
            t.price += item.record.price;
            t.units += item.record.units_sold as f64;
            t.profit += item.record.profit;
            t.promo += item.record.promotion_frequency as f64;
        }

        totals
            .iter()
            .enumerate()
            .map(|(cluster, t)| {
                let mean = |total: f64| {
                    if t.count > 0 {
                        total / t.count as f64
                    } else {
                        0.0
                    }
                };
                let avg_price = mean(t.price);
                let avg_units = mean(t.units);

                ClusterInfo {
                    cluster,
                    name: label_cluster(t.count, avg_price, avg_units).to_string(),
                    count: t.count,
                    avg_price,
                    avg_units,
                    avg_profit: mean(t.profit),
                    avg_promo: mean(t.promo),
                }
            })
            .collect()
    }

    pub fn scatter_data(&self, records: &[NormalizedRecord]) -> Vec<ScatterPoint> {
        records
            .iter()
            .zip(&self.assignments)
            .map(|(item, &cluster)| ScatterPoint {
                price: item.record.price,
                units_sold: item.record.units_sold,
                cluster,
            })
            .collect()
    }
}

pub struct KMeans {
    k: usize,
    max_iterations: usize,
    tolerance: f64,
}

impl KMeans {
    pub fn new(k: usize, max_iterations: usize, tolerance: f64) -> Self {
        Self {
            k,
            max_iterations,
            tolerance,
        }
    }

    /// Init -> Iterate -> (Converged | MaxIterationsReached).
    ///
    /// Каждая итерация назначает точки текущим центроидам и считает WCSS этого назначения
    /// относительно тех же центроидов. Сходимость: `|prevWCSS - WCSS| < tolerance`.
    /// Возвращаемые центроиды всегда те, по которым построено итоговое назначение,
    /// поэтому после сходимости повторное назначение ничего не меняет.
    pub fn fit<R: Rng + ?Sized>(&self, data: &Array2<f64>, rng: &mut R) -> Result<KMeansModel> {
        if self.max_iterations == 0 {
            return Err(MlError::InvalidConfig("max_iterations must be positive".to_string()));
        }

        let mut centroids = initialize_centroids(data, self.k, rng)?;
        let mut prev_wcss = f64::INFINITY;
        let mut last = None;

        for iteration in 1..=self.max_iterations {
            let assignments = assign_clusters(data, &centroids);
            let wcss = calculate_wcss(data, &assignments, &centroids);

            if (prev_wcss - wcss).abs() < self.tolerance {
                tracing::debug!(
                    "k-means k={} converged after {} iterations, WCSS {:.6}",
                    self.k,
                    iteration,
                    wcss
                );
                return Ok(KMeansModel {
                    centroids,
                    assignments,
                    wcss,
                    convergence: Convergence::Converged {
                        iterations: iteration,
                    },
                });
            }

            let updated = update_centroids(data, &assignments, &centroids);
            let evaluated = std::mem::replace(&mut centroids, updated);
            last = Some((evaluated, assignments, wcss));
            prev_wcss = wcss;
        }

        let (centroids, assignments, wcss) =
            last.ok_or_else(|| MlError::InvalidConfig("k-means ran no iterations".to_string()))?;
        tracing::warn!(
            "k-means k={} stopped at iteration cap {}, WCSS {:.6}",
            self.k,
            self.max_iterations,
            wcss
        );

        Ok(KMeansModel {
            centroids,
            assignments,
            wcss,
            convergence: Convergence::MaxIterationsReached {
                iterations: self.max_iterations,
            },
        })
    }
}

/// Кривая "локтя": WCSS для каждого k из диапазона.
/// Значения k больше числа точек пропускаются.
pub fn elbow_sweep<R: Rng + ?Sized>(
    data: &Array2<f64>,
    ks: RangeInclusive<usize>,
    max_iterations: usize,
    tolerance: f64,
    rng: &mut R,
) -> Result<Vec<ElbowPoint>> {
    if data.nrows() == 0 {
        return Err(MlError::EmptyInput("points to cluster"));
    }

    let mut curve = Vec::new();
    for k in ks {
        if k == 0 || k > data.nrows() {
            tracing::debug!("Elbow sweep skips k={} for {} points", k, data.nrows());
            continue;
        }
        let model = KMeans::new(k, max_iterations, tolerance).fit(data, rng)?;
        curve.push(ElbowPoint { k, wcss: model.wcss });
    }

    Ok(curve)
}

/// Матрица признаков кластеризации: нормализованные price, units_sold, promotion_frequency
pub fn feature_matrix(records: &[NormalizedRecord]) -> Array2<f64> {
    let mut features = Array2::zeros((records.len(), 3));
    for (i, item) in records.iter().enumerate() {
        for (j, value) in item.normalized.to_vec().into_iter().enumerate() {
            features[[i, j]] = value;
        }
    }
    features
}
