//! Regression trees and the gradient-boosted ensemble built from them.
//!
//! This module implements:
//! - CART regression trees with squared-error splits over presorted columns
//! - Multinomial gradient boosting (see [`GradientBoostingClassifier`])
//!
//! # Example
//!
//! ```
//! use obesity_pipeline::primitives::Matrix;
//! use obesity_pipeline::tree::DecisionTreeRegressor;
//!
//! let x = Matrix::from_vec(6, 1, vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]).unwrap();
//! let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
//!
//! let mut tree = DecisionTreeRegressor::new().with_max_depth(1);
//! tree.fit(&x, &y).unwrap();
//! assert_eq!(tree.predict(&x).unwrap(), vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
//! ```

mod gradient_boosting;

pub(crate) use gradient_boosting::argmax;
pub use gradient_boosting::GradientBoostingClassifier;

use crate::error::{PipelineError, Result};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};

/// Leaf node in a regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionLeaf {
    /// Predicted value for this leaf
    pub value: f32,
    /// Number of training samples in this leaf
    pub n_samples: usize,
}

/// Internal node in a regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionNode {
    /// Index of the feature to split on
    pub feature_idx: usize,
    /// Threshold value for the split
    pub threshold: f32,
    /// Reduction in summed squared error achieved by this split
    pub improvement: f64,
    /// Left subtree (samples where feature <= threshold)
    pub left: Box<RegressionTreeNode>,
    /// Right subtree (samples where feature > threshold)
    pub right: Box<RegressionTreeNode>,
}

/// A node in a regression tree (either internal node or leaf).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegressionTreeNode {
    /// Internal decision node with split condition
    Node(RegressionNode),
    /// Leaf node with value prediction
    Leaf(RegressionLeaf),
}

impl RegressionTreeNode {
    /// Returns the depth of the tree rooted at this node.
    ///
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf(_) => 0,
            RegressionTreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    /// Number of leaves under this node.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf(_) => 1,
            RegressionTreeNode::Node(node) => node.left.n_leaves() + node.right.n_leaves(),
        }
    }

    fn accumulate_importances(&self, importances: &mut [f64]) {
        if let RegressionTreeNode::Node(node) = self {
            importances[node.feature_idx] += node.improvement;
            node.left.accumulate_importances(importances);
            node.right.accumulate_importances(importances);
        }
    }
}

/// Per-feature sample orderings, computed once and shared by every tree of
/// an ensemble.
#[derive(Debug, Clone)]
pub struct PresortedFeatures<'a> {
    x: &'a Matrix<f32>,
    /// `order[f]` lists row indices sorted ascending by feature `f`.
    order: Vec<Vec<usize>>,
}

impl<'a> PresortedFeatures<'a> {
    /// Sorts every column of `x`.
    ///
    /// Ties keep row order, so the result is fully deterministic.
    #[must_use]
    pub fn new(x: &'a Matrix<f32>) -> Self {
        let order = (0..x.n_cols())
            .map(|f| {
                let mut idx: Vec<usize> = (0..x.n_rows()).collect();
                idx.sort_by(|&a, &b| x.get(a, f).total_cmp(&x.get(b, f)));
                idx
            })
            .collect();
        Self { x, order }
    }

    /// The underlying feature matrix.
    #[must_use]
    pub fn matrix(&self) -> &Matrix<f32> {
        self.x
    }

    /// Orderings restricted to rows where `mask` is true.
    fn restricted(&self, mask: &[bool]) -> Vec<Vec<usize>> {
        self.order
            .iter()
            .map(|col| col.iter().copied().filter(|&i| mask[i]).collect())
            .collect()
    }
}

/// Decision tree regressor using the CART algorithm.
///
/// Splits minimize the summed squared error of the targets. Candidate
/// thresholds lie midway between consecutive distinct feature values;
/// among equally good splits the lowest feature index, then the lowest
/// threshold, wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    tree: Option<RegressionTreeNode>,
    n_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    /// Creates a new decision tree regressor with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            n_features: 0,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    /// Sets the maximum depth of the tree (root has depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the minimum number of samples required to split an internal node.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Sets the minimum number of samples required to be at a leaf node.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Fits the tree; leaves predict the mean target.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is empty or `x` and `y` disagree in length.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &[f32]) -> Result<()> {
        if x.n_rows() != y.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: format!("{} targets", x.n_rows()),
                actual: format!("{} targets", y.len()),
            });
        }
        let targets: Vec<f64> = y.iter().map(|&v| f64::from(v)).collect();
        let presorted = PresortedFeatures::new(x);
        let rows: Vec<usize> = (0..x.n_rows()).collect();
        self.fit_presorted(&presorted, &targets, &rows, |idx| {
            (idx.iter().map(|&i| targets[i]).sum::<f64>() / idx.len() as f64) as f32
        })
    }

    /// Fits on the `rows` subset of a presorted matrix.
    ///
    /// Splits are chosen on `targets`; each leaf's value is then computed by
    /// `leaf_value` from the row indices that reached it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyDataset`] if `rows` is empty.
    pub fn fit_presorted<F>(
        &mut self,
        presorted: &PresortedFeatures<'_>,
        targets: &[f64],
        rows: &[usize],
        leaf_value: F,
    ) -> Result<()>
    where
        F: Fn(&[usize]) -> f32,
    {
        if rows.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        let x = presorted.matrix();
        let mut mask = vec![false; x.n_rows()];
        for &i in rows {
            mask[i] = true;
        }
        let sorted = presorted.restricted(&mask);

        let mut builder = TreeBuilder {
            x,
            targets,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            goes_left: vec![false; x.n_rows()],
            leaf_value: &leaf_value,
        };
        self.tree = Some(builder.build(sorted, 0));
        self.n_features = x.n_cols();
        Ok(())
    }

    /// Returns true once fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.tree.is_some()
    }

    /// Predicts one sample. Unfitted trees predict 0.
    #[must_use]
    pub fn predict_row(&self, sample: &[f32]) -> f32 {
        let Some(mut node) = self.tree.as_ref() else {
            return 0.0;
        };
        loop {
            match node {
                RegressionTreeNode::Leaf(leaf) => return leaf.value,
                RegressionTreeNode::Node(internal) => {
                    node = if sample[internal.feature_idx] <= internal.threshold {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }

    /// Predicts every row of `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree is unfitted or the width differs.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vec<f32>> {
        if !self.is_fitted() {
            return Err(PipelineError::NotFitted("DecisionTreeRegressor"));
        }
        if x.n_cols() != self.n_features {
            return Err(PipelineError::DimensionMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.n_cols()),
            });
        }
        Ok((0..x.n_rows()).map(|i| self.predict_row(x.row(i))).collect())
    }

    /// Adds this tree's split improvements to `importances` (indexed by feature).
    pub fn accumulate_importances(&self, importances: &mut [f64]) {
        if let Some(root) = &self.tree {
            root.accumulate_importances(importances);
        }
    }
}

/// Best split found for one node.
#[derive(Debug, Clone, Copy)]
struct Split {
    feature_idx: usize,
    threshold: f32,
    improvement: f64,
}

struct TreeBuilder<'a, F> {
    x: &'a Matrix<f32>,
    targets: &'a [f64],
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    /// Scratch: routing of each row at the node being partitioned.
    goes_left: Vec<bool>,
    leaf_value: &'a F,
}

impl<F> TreeBuilder<'_, F>
where
    F: Fn(&[usize]) -> f32,
{
    /// `sorted[f]` holds this node's rows ordered by feature `f`.
    fn build(&mut self, sorted: Vec<Vec<usize>>, depth: usize) -> RegressionTreeNode {
        let rows: &[usize] = sorted.first().map_or(&[], Vec::as_slice);
        let n_samples = rows.len();

        let at_max_depth = self.max_depth.is_some_and(|max_d| depth >= max_d);
        if n_samples < self.min_samples_split || at_max_depth {
            return self.leaf(rows);
        }
        let Some(split) = self.best_split(&sorted) else {
            return self.leaf(rows);
        };

        for &i in rows {
            self.goes_left[i] = self.x.get(i, split.feature_idx) <= split.threshold;
        }
        let (left, right): (Vec<Vec<usize>>, Vec<Vec<usize>>) = sorted
            .iter()
            .map(|col| col.iter().partition(|&&i| self.goes_left[i]))
            .unzip();
        drop(sorted);

        let left_child = self.build(left, depth + 1);
        let right_child = self.build(right, depth + 1);

        RegressionTreeNode::Node(RegressionNode {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            improvement: split.improvement,
            left: Box::new(left_child),
            right: Box::new(right_child),
        })
    }

    fn leaf(&self, rows: &[usize]) -> RegressionTreeNode {
        let value = if rows.is_empty() {
            0.0
        } else {
            (self.leaf_value)(rows)
        };
        RegressionTreeNode::Leaf(RegressionLeaf {
            value,
            n_samples: rows.len(),
        })
    }

    /// Scans prefix sums of every sorted column; O(features x rows).
    fn best_split(&self, sorted: &[Vec<usize>]) -> Option<Split> {
        let rows = sorted.first()?;
        let n = rows.len();
        let total: f64 = rows.iter().map(|&i| self.targets[i]).sum();
        let parent_score = total * total / n as f64;
        let min_leaf = self.min_samples_leaf;

        let mut best: Option<Split> = None;
        for (feature_idx, order) in sorted.iter().enumerate() {
            let mut left_sum = 0.0_f64;
            for pos in 0..n - 1 {
                let i = order[pos];
                left_sum += self.targets[i];
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let current = self.x.get(i, feature_idx);
                let next = self.x.get(order[pos + 1], feature_idx);
                if next <= current {
                    continue;
                }
                let right_sum = total - left_sum;
                let score = left_sum * left_sum / n_left as f64
                    + right_sum * right_sum / n_right as f64;
                let improvement = score - parent_score;
                if improvement > 1e-12 && best.map_or(true, |b| improvement > b.improvement) {
                    best = Some(Split {
                        feature_idx,
                        threshold: midpoint(current, next),
                        improvement,
                    });
                }
            }
        }
        best
    }
}

/// Midpoint of two consecutive distinct values that still separates them.
fn midpoint(lo: f32, hi: f32) -> f32 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi {
        lo
    } else {
        mid
    }
}
