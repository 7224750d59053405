//! Regression model contract.
//!
//! Models consume a [`Partition`] for fitting and a feature frame for
//! prediction. [`MeanRegressor`] is the reference baseline every real model
//! is measured against.

use crate::error::{BikeshareError, Result};
use crate::models::Partition;
use polars::prelude::*;

/// A model predicting the usage count from feature columns
pub trait Regressor {
    fn fit(&mut self, data: &Partition) -> Result<()>;

    fn predict(&self, features: &DataFrame) -> Result<Vec<f64>>;
}

/// Error metrics on a partition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub rmse: f64,
    pub mae: f64,
    pub n: usize,
}

fn target_values(target: &Series) -> Result<Vec<Option<f64>>> {
    let values = target.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

/// Predicts the mean training count for every row
#[derive(Debug, Default, Clone)]
pub struct MeanRegressor {
    mean: Option<f64>,
}

impl Regressor for MeanRegressor {
    fn fit(&mut self, data: &Partition) -> Result<()> {
        let observed: Vec<f64> = target_values(&data.target)?.into_iter().flatten().collect();
        if observed.is_empty() {
            return Err(BikeshareError::Model {
                message: "cannot fit on a partition without target values".to_string(),
            });
        }
        self.mean = Some(observed.iter().sum::<f64>() / observed.len() as f64);
        Ok(())
    }

    fn predict(&self, features: &DataFrame) -> Result<Vec<f64>> {
        let mean = self.mean.ok_or_else(|| BikeshareError::Model {
            message: "predict called before fit".to_string(),
        })?;
        Ok(vec![mean; features.height()])
    }
}

/// Score a fitted model on a partition, skipping rows without a target
pub fn evaluate(model: &dyn Regressor, data: &Partition) -> Result<Metrics> {
    let predictions = model.predict(&data.features)?;
    let actual = target_values(&data.target)?;
    if predictions.len() != actual.len() {
        return Err(BikeshareError::Model {
            message: format!(
                "{} predictions for {} rows",
                predictions.len(),
                actual.len()
            ),
        });
    }

    let errors: Vec<f64> = predictions
        .iter()
        .zip(actual)
        .filter_map(|(predicted, actual)| actual.map(|a| predicted - a))
        .collect();
    let n = errors.len();
    if n == 0 {
        return Ok(Metrics {
            rmse: 0.0,
            mae: 0.0,
            n,
        });
    }

    let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n as f64).sqrt();
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n as f64;
    Ok(Metrics { rmse, mae, n })
}
