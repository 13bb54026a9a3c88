//! VAR-family forecasters and forecast evaluation.

pub mod evaluation;
pub mod forecaster;
mod linalg;
pub mod var;
pub mod varmax;

pub use evaluation::{mean_absolute_error, mean_squared_error, MetricsEvaluator};
pub use forecaster::VarForecaster;
pub use var::VarModel;
pub use varmax::VarmaxModel;
