//! Bagged CART regression trees with multi-output leaves

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{check_matrix, StatsError};
use crate::regressor::{check_training_set, Regressor};
use crate::fork_rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single regression tree stored as a node arena; index 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

impl RegressionTree {
    /// Grows a tree on the rows selected by `sample` (indices may repeat).
    pub fn grow(
        features: &[Vec<f64>],
        targets: &[Vec<f64>],
        sample: &[usize],
        params: &TreeParams,
    ) -> Result<Self, StatsError> {
        let (n_features, _) = check_training_set(features, targets)?;
        if sample.is_empty() {
            return Err(StatsError::EmptyInput("tree sample"));
        }
        let mut builder = TreeBuilder {
            features,
            targets,
            params,
            nodes: Vec::new(),
        };
        let mut idx = sample.to_vec();
        builder.build(&mut idx, 0);
        Ok(Self {
            nodes: builder.nodes,
            n_features,
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> &[f64] {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

struct TreeBuilder<'a> {
    features: &'a [Vec<f64>],
    targets: &'a [Vec<f64>],
    params: &'a TreeParams,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Number of sorted samples that go left.
    n_left: usize,
    sse: f64,
}

impl TreeBuilder<'_> {
    fn build(&mut self, idx: &mut [usize], depth: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: self.leaf_value(idx),
        });

        let depth_ok = self.params.max_depth.map_or(true, |m| depth < m);
        if !depth_ok || idx.len() < self.params.min_samples_split.max(2) {
            return id;
        }
        let Some(split) = self.best_split(idx) else {
            return id;
        };

        let feature = split.feature;
        idx.sort_by(|&a, &b| self.features[a][feature].total_cmp(&self.features[b][feature]));
        let (l, r) = idx.split_at_mut(split.n_left);
        let left = self.build(l, depth + 1);
        let right = self.build(r, depth + 1);
        self.nodes[id] = Node::Split {
            feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn leaf_value(&self, idx: &[usize]) -> Vec<f64> {
        let t = self.targets[0].len();
        let mut acc = vec![0.0; t];
        for &i in idx {
            for (a, v) in acc.iter_mut().zip(&self.targets[i]) {
                *a += v;
            }
        }
        let n = idx.len() as f64;
        acc.into_iter().map(|a| a / n).collect()
    }

    /// Exhaustive search minimising the summed squared error of both children
    /// across all outputs.
    fn best_split(&self, idx: &[usize]) -> Option<BestSplit> {
        let n = idx.len();
        let t = self.targets[0].len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let (total_sum, total_sq) = self.sums(idx.iter().copied(), t);
        let parent_sse = sse(&total_sum, &total_sq, n);
        if parent_sse <= f64::EPSILON {
            return None;
        }

        let mut best: Option<BestSplit> = None;
        let mut order = idx.to_vec();
        for feature in 0..self.features[0].len() {
            order.sort_by(|&a, &b| self.features[a][feature].total_cmp(&self.features[b][feature]));
            let mut left_sum = vec![0.0; t];
            let mut left_sq = vec![0.0; t];
            for pos in 0..n - 1 {
                let i = order[pos];
                for (k, v) in self.targets[i].iter().enumerate() {
                    left_sum[k] += v;
                    left_sq[k] += v * v;
                }
                let n_left = pos + 1;
                let x_here = self.features[i][feature];
                let x_next = self.features[order[pos + 1]][feature];
                if x_here == x_next || n_left < min_leaf || n - n_left < min_leaf {
                    continue;
                }
                let right_sum: Vec<f64> = total_sum.iter().zip(&left_sum).map(|(a, b)| a - b).collect();
                let right_sq: Vec<f64> = total_sq.iter().zip(&left_sq).map(|(a, b)| a - b).collect();
                let cost = sse(&left_sum, &left_sq, n_left) + sse(&right_sum, &right_sq, n - n_left);
                if best.as_ref().map_or(true, |b| cost < b.sse) {
                    best = Some(BestSplit {
                        feature,
                        threshold: midpoint(x_here, x_next),
                        n_left,
                        sse: cost,
                    });
                }
            }
        }
        best.filter(|b| b.sse < parent_sse)
    }

    fn sums(&self, idx: impl Iterator<Item = usize>, t: usize) -> (Vec<f64>, Vec<f64>) {
        let mut s = vec![0.0; t];
        let mut sq = vec![0.0; t];
        for i in idx {
            for (k, v) in self.targets[i].iter().enumerate() {
                s[k] += v;
                sq[k] += v * v;
            }
        }
        (s, sq)
    }
}

/// Split point between two adjacent sorted values. Falls back to `lo` when
/// the midpoint rounds up to `hi`, so `hi` still goes right under `<=`.
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid == hi || mid.is_infinite() {
        lo
    } else {
        mid
    }
}

fn sse(sum: &[f64], sq: &[f64], n: usize) -> f64 {
    let n = n as f64;
    sum.iter()
        .zip(sq)
        .map(|(s, q)| (q - s * s / n).max(0.0))
        .sum()
}

/// Random forest regressor: `n_estimators` trees, each grown on a bootstrap
/// resample of the training rows; predictions are the mean over trees.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub bootstrap: bool,
    pub tree_params: TreeParams,
    trees: Vec<RegressionTree>,
    n_features: usize,
    n_targets: usize,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            bootstrap: true,
            tree_params: TreeParams::default(),
            trees: Vec::new(),
            n_features: 0,
            n_targets: 0,
        }
    }

    pub fn with_tree_params(mut self, params: TreeParams) -> Self {
        self.tree_params = params;
        self
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(
        &mut self,
        features: &[Vec<f64>],
        targets: &[Vec<f64>],
        rng: &mut StdRng,
    ) -> Result<(), StatsError> {
        if self.n_estimators == 0 {
            return Err(StatsError::InvalidParameter {
                name: "n_estimators",
                reason: "must be at least 1".into(),
            });
        }
        let (d, t) = check_training_set(features, targets)?;
        let n = features.len();
        let mut trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let mut tree_rng = fork_rng(rng);
            let sample: Vec<usize> = if self.bootstrap {
                (0..n).map(|_| tree_rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(RegressionTree::grow(features, targets, &sample, &self.tree_params)?);
        }
        log::debug!(
            "random forest: {} trees on {} rows ({} features -> {} targets), mean depth {:.1}",
            trees.len(),
            n,
            d,
            t,
            trees.iter().map(|tr| tr.depth() as f64).sum::<f64>() / trees.len() as f64
        );
        self.trees = trees;
        self.n_features = d;
        self.n_targets = t;
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, StatsError> {
        if !self.is_fitted() {
            return Err(StatsError::NotFitted);
        }
        let d = check_matrix(features, "prediction features")?;
        if d != self.n_features {
            return Err(StatsError::DimensionMismatch {
                expected: self.n_features,
                found: d,
            });
        }
        let k = self.trees.len() as f64;
        Ok(features
            .iter()
            .map(|row| {
                let mut acc = vec![0.0; self.n_targets];
                for tree in &self.trees {
                    for (a, v) in acc.iter_mut().zip(tree.predict_row(row)) {
                        *a += v;
                    }
                }
                acc.into_iter().map(|a| a / k).collect()
            })
            .collect())
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;
    use approx::assert_abs_diff_eq;

    #[test]
    fn tree_fits_step_function_exactly() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y: Vec<Vec<f64>> = (0..10)
            .map(|i| if i < 5 { vec![1.0, -1.0] } else { vec![3.0, 2.0] })
            .collect();
        let all: Vec<usize> = (0..10).collect();
        let tree = RegressionTree::grow(&x, &y, &all, &TreeParams::default()).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_row(&[4.4]), &[1.0, -1.0]);
        assert_eq!(tree.predict_row(&[4.6]), &[3.0, 2.0]);
    }

    #[test]
    fn adjacent_floats_split_on_the_lower_value() {
        let a = f64::from_bits(1.0f64.to_bits() + 1);
        let b = f64::from_bits(a.to_bits() + 1);
        assert_eq!(midpoint(a, b), a);
        let x = vec![vec![a], vec![b]];
        let y = vec![vec![0.0], vec![10.0]];
        let tree = RegressionTree::grow(&x, &y, &[0, 1], &TreeParams::default()).unwrap();
        assert_eq!(tree.predict_row(&[a]), &[0.0]);
        assert_eq!(tree.predict_row(&[b]), &[10.0]);
    }

    #[test]
    fn tree_respects_max_depth() {
        let x: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let y: Vec<Vec<f64>> = (0..16).map(|i| vec![(i * i) as f64]).collect();
        let all: Vec<usize> = (0..16).collect();
        let params = TreeParams {
            max_depth: Some(2),
            ..TreeParams::default()
        };
        let tree = RegressionTree::grow(&x, &y, &all, &params).unwrap();
        assert!(tree.depth() <= 2);
        assert!(tree.n_leaves() <= 4);
    }

    #[test]
    fn constant_target_is_a_single_leaf() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![vec![7.0]; 3];
        let tree = RegressionTree::grow(&x, &y, &[0, 1, 2], &TreeParams::default()).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict_row(&[100.0]), &[7.0]);
    }

    #[test]
    fn forest_approximates_linear_signal() {
        let x: Vec<Vec<f64>> = (0..60).map(|i| vec![i as f64 / 10.0, (i % 7) as f64]).collect();
        let y: Vec<Vec<f64>> = x.iter().map(|r| vec![2.0 * r[0] + 1.0]).collect();
        let mut rf = RandomForestRegressor::new(50);
        rf.fit(&x, &y, &mut seeded_rng(Some(42))).unwrap();
        let pred = rf.predict(&[vec![3.0, 2.0]]).unwrap();
        assert_abs_diff_eq!(pred[0][0], 7.0, epsilon = 0.5);
    }

    #[test]
    fn forest_is_deterministic_given_seed() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i * 3 % 5) as f64]).collect();
        let y: Vec<Vec<f64>> = x.iter().map(|r| vec![r[0] * r[1], r[0] - r[1]]).collect();
        let mut a = RandomForestRegressor::new(10);
        let mut b = RandomForestRegressor::new(10);
        a.fit(&x, &y, &mut seeded_rng(Some(5))).unwrap();
        b.fit(&x, &y, &mut seeded_rng(Some(5))).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn forest_errors() {
        let rf = RandomForestRegressor::new(3);
        assert_eq!(rf.predict(&[vec![1.0]]), Err(StatsError::NotFitted));

        let mut rf = RandomForestRegressor::new(3);
        let x = vec![vec![1.0], vec![2.0]];
        assert_eq!(
            rf.fit(&x, &[vec![1.0]], &mut seeded_rng(Some(1))),
            Err(StatsError::RowCountMismatch { features: 2, targets: 1 })
        );
        rf.fit(&x, &[vec![1.0], vec![2.0]], &mut seeded_rng(Some(1))).unwrap();
        assert!(matches!(
            rf.predict(&[vec![1.0, 2.0]]),
            Err(StatsError::DimensionMismatch { expected: 1, found: 2 })
        ));
        assert!(RandomForestRegressor::new(0)
            .fit(&x, &[vec![1.0], vec![2.0]], &mut seeded_rng(Some(1)))
            .is_err());
    }
}
