//! Naive Bayes classifiers
//!
//! Implements Gaussian Naive Bayes for continuous features.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::decision_tree::{argmax, class_codes};
use crate::error::{Result, ShoptrendError};

/// Gaussian Naive Bayes Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Mean of each feature, one row per class
    means: Vec<Vec<f64>>,
    /// Variance of each feature, one row per class
    variances: Vec<Vec<f64>>,
    /// Prior probability of each class
    priors: Vec<f64>,
    /// Class codes, in probability-column order
    classes: Vec<usize>,
    /// Portion of the largest feature variance added to every variance
    var_smoothing: f64,
    n_features: usize,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            means: Vec::new(),
            variances: Vec::new(),
            priors: Vec::new(),
            classes: Vec::new(),
            var_smoothing: 1e-9,
            n_features: 0,
        }
    }

    /// Set variance smoothing parameter
    pub fn with_var_smoothing(mut self, smoothing: f64) -> Self {
        self.var_smoothing = smoothing;
        self
    }

    /// Fit the classifier on class codes `y`
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ShoptrendError::TrainingError(format!(
                "expected {} labels, got {}",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 {
            return Err(ShoptrendError::TrainingError(
                "cannot fit naive Bayes on zero samples".to_string(),
            ));
        }

        let codes = class_codes(y)?;
        let mut classes = codes.clone();
        classes.sort_unstable();
        classes.dedup();

        // Smoothing is relative to the widest feature of the whole table
        let max_variance = x
            .columns()
            .into_iter()
            .map(population_variance)
            .fold(0.0, f64::max);
        let epsilon = if max_variance > 0.0 {
            self.var_smoothing * max_variance
        } else {
            self.var_smoothing
        };

        let mut means = Vec::with_capacity(classes.len());
        let mut variances = Vec::with_capacity(classes.len());
        let mut priors = Vec::with_capacity(classes.len());

        for &class in &classes {
            // Single-pass Welford's algorithm for mean and variance
            let mut feature_means = vec![0.0; n_features];
            let mut feature_m2 = vec![0.0; n_features];
            let mut count = 0usize;

            for (row, _) in x.rows().into_iter().zip(&codes).filter(|(_, &c)| c == class) {
                count += 1;
                for (j, &val) in row.iter().enumerate() {
                    let delta = val - feature_means[j];
                    feature_means[j] += delta / count as f64;
                    let delta2 = val - feature_means[j];
                    feature_m2[j] += delta * delta2;
                }
            }

            let feature_vars: Vec<f64> = feature_m2
                .iter()
                .map(|&m2| m2 / count as f64 + epsilon)
                .collect();

            means.push(feature_means);
            variances.push(feature_vars);
            priors.push(count as f64 / n_samples as f64);
        }

        self.means = means;
        self.variances = variances;
        self.priors = priors;
        self.classes = classes;
        self.n_features = n_features;

        Ok(self)
    }

    /// Predict class codes
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let log_probs = self.predict_log_proba(x)?;
        Ok(log_probs
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row.iter().copied())] as f64)
            .collect())
    }

    /// Normalized log probabilities
    pub fn predict_log_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.classes.is_empty() {
            return Err(ShoptrendError::PredictionError(
                "naive Bayes model is not fitted".to_string(),
            ));
        }
        if x.ncols() != self.n_features {
            return Err(ShoptrendError::PredictionError(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let mut log_probs = Array2::zeros((x.nrows(), self.classes.len()));

        for (i, row) in x.rows().into_iter().enumerate() {
            for j in 0..self.classes.len() {
                log_probs[[i, j]] = self.priors[j].ln() + self.log_likelihood(row, j);
            }
        }

        // Normalize (log-sum-exp trick)
        for mut row in log_probs.rows_mut() {
            let max_val = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let log_sum: f64 = row.iter().map(|&v| (v - max_val).exp()).sum::<f64>().ln();
            for val in row.iter_mut() {
                *val = *val - max_val - log_sum;
            }
        }

        Ok(log_probs)
    }

    /// Predict probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(self.predict_log_proba(x)?.mapv(f64::exp))
    }

    fn log_likelihood(&self, x: ArrayView1<'_, f64>, class_idx: usize) -> f64 {
        let means = &self.means[class_idx];
        let vars = &self.variances[class_idx];

        x.iter()
            .zip(means.iter())
            .zip(vars.iter())
            .map(|((&xi, &mean), &var)| -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln()))
            .sum()
    }

    /// Class codes in probability-column order
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Class priors, aligned with [`classes`](Self::classes)
    pub fn class_priors(&self) -> &[f64] {
        &self.priors
    }
}

fn population_variance(col: ArrayView1<'_, f64>) -> f64 {
    let n = col.len();
    if n == 0 {
        return 0.0;
    }
    let mean = col.sum() / n as f64;
    col.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n as f64
}
