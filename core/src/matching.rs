//! Classification scoring and point matching.
//!
//! [`ClassificationResult`] scores a binary classifier from its confusion matrix.
//! [`MatchCalculator`] pairs predicted localisations with actual ones by distance and
//! reports the result as a [`MatchResult`] (there are no true negatives when matching
//! points).

use crate::error::{GdscError, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// F-score for precision/recall weighting recall `beta` times as much as precision.
fn f_score_from(precision: f64, recall: f64, beta: f64) -> f64 {
    let b2 = beta * beta;
    ratio((1.0 + b2) * precision * recall, b2 * precision + recall)
}

/// Confusion matrix of a binary classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub tp: u64,
    pub fp: u64,
    pub tn: u64,
    pub fn_: u64,
}

impl ClassificationResult {
    pub fn new(tp: u64, fp: u64, tn: u64, fn_: u64) -> Self {
        Self { tp, fp, tn, fn_ }
    }

    pub fn total(&self) -> u64 {
        self.tp + self.fp + self.tn + self.fn_
    }

    fn fraction(&self) -> FractionClassificationResult {
        FractionClassificationResult::new(
            self.tp as f64,
            self.fp as f64,
            self.tn as f64,
            self.fn_ as f64,
        )
    }

    pub fn precision(&self) -> f64 {
        self.fraction().precision()
    }

    pub fn recall(&self) -> f64 {
        self.fraction().recall()
    }

    pub fn specificity(&self) -> f64 {
        self.fraction().specificity()
    }

    pub fn accuracy(&self) -> f64 {
        self.fraction().accuracy()
    }

    pub fn fall_out(&self) -> f64 {
        self.fraction().fall_out()
    }

    pub fn negative_predictive_value(&self) -> f64 {
        self.fraction().negative_predictive_value()
    }

    pub fn jaccard(&self) -> f64 {
        self.fraction().jaccard()
    }

    pub fn f_score(&self, beta: f64) -> f64 {
        self.fraction().f_score(beta)
    }

    pub fn f1_score(&self) -> f64 {
        self.f_score(1.0)
    }

    /// Matthews correlation coefficient in `[-1, 1]`.
    pub fn mcc(&self) -> f64 {
        self.fraction().mcc()
    }
}

/// Confusion matrix with fractional counts, from soft assignment of matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FractionClassificationResult {
    pub tp: f64,
    pub fp: f64,
    pub tn: f64,
    pub fn_: f64,
}

impl FractionClassificationResult {
    pub fn new(tp: f64, fp: f64, tn: f64, fn_: f64) -> Self {
        Self { tp, fp, tn, fn_ }
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.tp + self.fp + self.tn + self.fn_)
    }

    pub fn fall_out(&self) -> f64 {
        ratio(self.fp, self.fp + self.tn)
    }

    pub fn negative_predictive_value(&self) -> f64 {
        ratio(self.tn, self.tn + self.fn_)
    }

    pub fn jaccard(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp + self.fn_)
    }

    pub fn f_score(&self, beta: f64) -> f64 {
        f_score_from(self.precision(), self.recall(), beta)
    }

    pub fn f1_score(&self) -> f64 {
        self.f_score(1.0)
    }

    pub fn mcc(&self) -> f64 {
        let d = (self.tp + self.fp) * (self.tp + self.fn_) * (self.tn + self.fp) * (self.tn + self.fn_);
        if d == 0.0 {
            return 0.0;
        }
        let mcc = (self.tp * self.tn - self.fp * self.fn_) / d.sqrt();
        mcc.clamp(-1.0, 1.0)
    }
}

/// Outcome of matching predicted points to actual points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
    /// Root mean squared distance between matched pairs (0 with no matches)
    pub rmsd: f64,
}

impl MatchResult {
    pub fn new(tp: usize, fp: usize, fn_: usize, rmsd: f64) -> Self {
        Self { tp, fp, fn_, rmsd }
    }

    pub fn n_predicted(&self) -> usize {
        self.tp + self.fp
    }

    pub fn n_actual(&self) -> usize {
        self.tp + self.fn_
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp as f64, self.n_predicted() as f64)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp as f64, self.n_actual() as f64)
    }

    pub fn jaccard(&self) -> f64 {
        ratio(self.tp as f64, (self.tp + self.fp + self.fn_) as f64)
    }

    pub fn f_score(&self, beta: f64) -> f64 {
        f_score_from(self.precision(), self.recall(), beta)
    }

    pub fn f1_score(&self) -> f64 {
        self.f_score(1.0)
    }
}

/// A matched pair of indices and their separation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointPair {
    pub actual: usize,
    pub predicted: usize,
    pub distance: f64,
}

/// Full output of a matching: the score plus which points paired up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Matching {
    pub result: MatchResult,
    pub pairs: Vec<PointPair>,
    pub unmatched_actual: Vec<usize>,
    pub unmatched_predicted: Vec<usize>,
}

/// A candidate match carrying a score in `[0, 1]` for fractional scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionalAssignment {
    pub actual: usize,
    pub predicted: usize,
    pub distance: f64,
    pub score: f64,
}

pub struct MatchCalculator;

impl MatchCalculator {
    /// Greedy one-to-one matching of 2D points within `threshold` distance.
    pub fn analyse_2d(
        actual: &[(f64, f64)],
        predicted: &[(f64, f64)],
        threshold: f64,
    ) -> Result<Matching> {
        Self::analyse(actual.len(), predicted.len(), threshold, |i, j| {
            let (ax, ay) = actual[i];
            let (px, py) = predicted[j];
            crate::maths::distance2(ax, ay, px, py)
        })
    }

    /// Greedy one-to-one matching of 3D points within `threshold` distance.
    pub fn analyse_3d(
        actual: &[(f64, f64, f64)],
        predicted: &[(f64, f64, f64)],
        threshold: f64,
    ) -> Result<Matching> {
        Self::analyse(actual.len(), predicted.len(), threshold, |i, j| {
            let (ax, ay, az) = actual[i];
            let (px, py, pz) = predicted[j];
            crate::maths::distance2_3d(ax, ay, az, px, py, pz)
        })
    }

    fn analyse(
        n_actual: usize,
        n_predicted: usize,
        threshold: f64,
        distance2: impl Fn(usize, usize) -> f64,
    ) -> Result<Matching> {
        if !(threshold >= 0.0) {
            return Err(GdscError::invalid_argument(format!(
                "distance threshold must be non-negative, got {}",
                threshold
            )));
        }
        let threshold2 = threshold * threshold;

        // Candidate pairs ordered by distance, then actual index, then predicted index
        let candidates = (0..n_actual)
            .cartesian_product(0..n_predicted)
            .filter_map(|(i, j)| {
                let d2 = distance2(i, j);
                (d2 <= threshold2).then_some((d2, i, j))
            })
            .sorted_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(Ordering::Equal)
                    .then(a.1.cmp(&b.1))
                    .then(a.2.cmp(&b.2))
            });

        let mut actual_used = vec![false; n_actual];
        let mut predicted_used = vec![false; n_predicted];
        let mut pairs = Vec::new();
        let mut sum_d2 = 0.0;
        for (d2, i, j) in candidates {
            if actual_used[i] || predicted_used[j] {
                continue;
            }
            actual_used[i] = true;
            predicted_used[j] = true;
            sum_d2 += d2;
            pairs.push(PointPair {
                actual: i,
                predicted: j,
                distance: d2.sqrt(),
            });
        }

        let tp = pairs.len();
        let rmsd = if tp == 0 {
            0.0
        } else {
            (sum_d2 / tp as f64).sqrt()
        };
        let unused = |used: &[bool]| -> Vec<usize> {
            used.iter()
                .enumerate()
                .filter_map(|(i, &u)| (!u).then_some(i))
                .collect()
        };
        Ok(Matching {
            result: MatchResult::new(tp, n_predicted - tp, n_actual - tp, rmsd),
            pairs,
            unmatched_actual: unused(&actual_used),
            unmatched_predicted: unused(&predicted_used),
        })
    }

    /// Score soft assignments greedily by descending score.
    ///
    /// Each actual and predicted index is used at most once. The true-positive count
    /// is the summed score of the chosen assignments.
    pub fn fractional_score(
        assignments: &[FractionalAssignment],
        n_actual: usize,
        n_predicted: usize,
    ) -> Result<FractionClassificationResult> {
        if let Some(bad) = assignments
            .iter()
            .find(|a| a.actual >= n_actual || a.predicted >= n_predicted)
        {
            return Err(GdscError::invalid_argument(format!(
                "assignment ({}, {}) out of bounds for {} actual / {} predicted",
                bad.actual, bad.predicted, n_actual, n_predicted
            )));
        }
        if let Some(bad) = assignments.iter().find(|a| !(0.0..=1.0).contains(&a.score)) {
            return Err(GdscError::invalid_argument(format!(
                "assignment score {} outside [0, 1]",
                bad.score
            )));
        }

        let mut actual_used = vec![false; n_actual];
        let mut predicted_used = vec![false; n_predicted];
        let mut tp = 0.0;
        let ordered = assignments.iter().sorted_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal))
        });
        for a in ordered {
            if actual_used[a.actual] || predicted_used[a.predicted] {
                continue;
            }
            actual_used[a.actual] = true;
            predicted_used[a.predicted] = true;
            tp += a.score;
        }

        Ok(FractionClassificationResult::new(
            tp,
            n_predicted as f64 - tp,
            0.0,
            n_actual as f64 - tp,
        ))
    }
}
