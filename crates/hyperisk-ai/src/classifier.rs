//! Binary classifiers over the five-feature hypertension input.
//!
//! Every model format sits behind the [`Classifier`] capability: given a
//! [`FeatureVector`], produce the raw predicted label. Well-formed models
//! only ever return `0` or `1`; mapping onto a [`Verdict`](hyperisk_core::Verdict)
//! and rejecting anything else is the registry's job.
//!
//! The JSON model kinds mirror the decision rules of the estimators they
//! were exported from: logistic regression, random forest (averaged leaf
//! probabilities), and gradient-boosted trees (summed leaf margins).

use hyperisk_core::FeatureVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct InferenceError(pub String);

/// Anything capable of labelling a feature vector.
pub trait Classifier: Send + Sync {
    /// Raw predicted label for one feature vector.
    fn infer(&self, features: &FeatureVector) -> Result<f64, InferenceError>;
}

/// Model definitions carried by a JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JsonModel {
    Logistic(LogisticModel),
    RandomForest(ForestModel),
    GradientBoosting(BoostedModel),
}

impl JsonModel {
    /// Check structural invariants: coefficient count, node indices, feature positions.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Logistic(m) => m.validate(),
            Self::RandomForest(m) => validate_trees(&m.trees),
            Self::GradientBoosting(m) => validate_trees(&m.trees),
        }
    }
}

impl Classifier for JsonModel {
    fn infer(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        match self {
            Self::Logistic(m) => m.infer(features),
            Self::RandomForest(m) => m.infer(features),
            Self::GradientBoosting(m) => m.infer(features),
        }
    }
}

// ── Logistic regression ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    fn validate(&self) -> Result<(), String> {
        if self.coefficients.len() != FeatureVector::LEN {
            return Err(format!(
                "logistic model has {} coefficients, expected {}",
                self.coefficients.len(),
                FeatureVector::LEN
            ));
        }
        Ok(())
    }

    /// Positive-class probability.
    pub fn probability(&self, features: &FeatureVector) -> f64 {
        let margin: f64 = self
            .coefficients
            .iter()
            .zip(features.to_array())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        sigmoid(margin)
    }
}

impl Classifier for LogisticModel {
    fn infer(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        Ok(label(self.probability(features)))
    }
}

// ── Random forest ──

/// Bagged trees whose leaves hold the fraction of positive training samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    pub fn probability(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        let x = features.to_array();
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.evaluate(&x, SplitRule::LessOrEqual)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}

impl Classifier for ForestModel {
    fn infer(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        Ok(label(self.probability(features)?))
    }
}

// ── Gradient boosting ──

/// Additive trees whose leaves hold log-odds margins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedModel {
    /// Initial margin (log-odds) before any tree contributes.
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<DecisionTree>,
}

impl BoostedModel {
    pub fn probability(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        let x = features.to_array();
        let mut margin = self.base_score;
        for tree in &self.trees {
            margin += tree.evaluate(&x, SplitRule::LessThan)?;
        }
        Ok(sigmoid(margin))
    }
}

impl Classifier for BoostedModel {
    fn infer(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        Ok(label(self.probability(features)?))
    }
}

// ── Trees ──

/// Flat node array; the root is node 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Which side a value equal to the threshold goes.
#[derive(Debug, Clone, Copy)]
enum SplitRule {
    /// scikit-learn: `x <= threshold` goes left.
    LessOrEqual,
    /// XGBoost: `x < threshold` goes left.
    LessThan,
}

impl DecisionTree {
    fn evaluate(&self, x: &[f64], rule: SplitRule) -> Result<f64, InferenceError> {
        let mut idx = 0;
        // A validated tree reaches a leaf in at most `nodes.len()` steps.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = *x.get(*feature).ok_or_else(|| {
                        InferenceError(format!("node {idx} splits on feature {feature}"))
                    })?;
                    let go_left = match rule {
                        SplitRule::LessOrEqual => v <= *threshold,
                        SplitRule::LessThan => v < *threshold,
                    };
                    idx = if go_left { *left } else { *right };
                }
                None => return Err(InferenceError(format!("node {idx} out of range"))),
            }
        }
        Err(InferenceError("tree walk did not reach a leaf".into()))
    }

    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= FeatureVector::LEN {
                    return Err(format!("node {i} splits on feature {feature}"));
                }
                // Children must point forward so every walk terminates.
                if *left <= i || *right <= i || *left >= n || *right >= n {
                    return Err(format!("node {i} has invalid children {left}/{right}"));
                }
            }
        }
        Ok(())
    }
}

fn validate_trees(trees: &[DecisionTree]) -> Result<(), String> {
    if trees.is_empty() {
        return Err("ensemble has no trees".into());
    }
    for (i, tree) in trees.iter().enumerate() {
        tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
    }
    Ok(())
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn label(probability: f64) -> f64 {
    if probability > 0.5 { 1.0 } else { 0.0 }
}
