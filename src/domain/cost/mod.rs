pub mod cost_estimator;
pub mod replica_estimator;
