/// ML модели

pub mod clustering;
pub mod evaluation;
pub mod labeling;
pub mod regression;

pub use clustering::{elbow_sweep, Convergence, KMeans, KMeansModel};
pub use evaluation::{evaluate, mae, mse};
pub use labeling::{label_cluster, LABEL_RULES};
pub use regression::{run_regression, RegressionModel};
