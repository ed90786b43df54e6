use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use cn_core::{Error, Result};
use serde::Serialize;

/// How per-class precision, recall and F1 are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Average {
    /// Global counts of true positives, false positives and false negatives.
    Micro,
    /// Unweighted mean over classes.
    Macro,
    /// Mean over classes weighted by their support in the true labels.
    #[default]
    Weighted,
}

impl FromStr for Average {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "micro" => Ok(Self::Micro),
            "macro" => Ok(Self::Macro),
            "weighted" => Ok(Self::Weighted),
            other => Err(Error::Evaluation(format!("unknown average mode: {}", other))),
        }
    }
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Micro => "micro",
            Self::Macro => "macro",
            Self::Weighted => "weighted",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    true_positives: usize,
    false_positives: usize,
    false_negatives: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn harmonic(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn check_lengths<L>(preds: &[L], labels: &[L]) -> Result<()> {
    if preds.len() != labels.len() {
        return Err(Error::Evaluation(format!(
            "predictions and labels differ in length ({} vs {})",
            preds.len(),
            labels.len()
        )));
    }
    if labels.is_empty() {
        return Err(Error::Evaluation("no labels to evaluate".to_string()));
    }
    Ok(())
}

/// Counts per class over the union of true and predicted labels.
fn class_counts<L: Ord + Clone>(preds: &[L], labels: &[L]) -> BTreeMap<L, Counts> {
    let classes: BTreeSet<&L> = preds.iter().chain(labels).collect();
    let mut counts: BTreeMap<L, Counts> = classes
        .into_iter()
        .map(|class| (class.clone(), Counts::default()))
        .collect();

    for (pred, truth) in preds.iter().zip(labels) {
        if pred == truth {
            if let Some(c) = counts.get_mut(truth) {
                c.true_positives += 1;
            }
        } else {
            if let Some(c) = counts.get_mut(pred) {
                c.false_positives += 1;
            }
            if let Some(c) = counts.get_mut(truth) {
                c.false_negatives += 1;
            }
        }
    }
    counts
}

/// Precision, recall, F1 and support for every class seen in either input.
/// Classes that were never predicted (or never present) score 0 rather than
/// failing.
pub fn per_class<L: Ord + Clone>(preds: &[L], labels: &[L]) -> Result<BTreeMap<L, ClassScores>> {
    check_lengths(preds, labels)?;
    Ok(class_counts(preds, labels)
        .into_iter()
        .map(|(class, c)| {
            let precision = ratio(c.true_positives, c.true_positives + c.false_positives);
            let recall = ratio(c.true_positives, c.true_positives + c.false_negatives);
            let scores = ClassScores {
                precision,
                recall,
                f1: harmonic(precision, recall),
                support: c.true_positives + c.false_negatives,
            };
            (class, scores)
        })
        .collect())
}

pub fn accuracy<L: PartialEq>(preds: &[L], labels: &[L]) -> f64 {
    let correct = preds.iter().zip(labels).filter(|(p, t)| p == t).count();
    ratio(correct, labels.len())
}

pub fn compute_metrics<L: Ord + Clone>(
    preds: &[L],
    labels: &[L],
    average: Average,
) -> Result<Metrics> {
    check_lengths(preds, labels)?;
    let accuracy = accuracy(preds, labels);

    let (precision, recall, f1) = match average {
        Average::Micro => {
            let t = class_counts(preds, labels)
                .into_values()
                .fold(Counts::default(), |acc, c| Counts {
                    true_positives: acc.true_positives + c.true_positives,
                    false_positives: acc.false_positives + c.false_positives,
                    false_negatives: acc.false_negatives + c.false_negatives,
                });
            let precision = ratio(t.true_positives, t.true_positives + t.false_positives);
            let recall = ratio(t.true_positives, t.true_positives + t.false_negatives);
            (precision, recall, harmonic(precision, recall))
        }
        Average::Macro => {
            let scores = per_class(preds, labels)?;
            let n = scores.len() as f64;
            let sum = scores.values().fold((0.0, 0.0, 0.0), |acc, s| {
                (acc.0 + s.precision, acc.1 + s.recall, acc.2 + s.f1)
            });
            (sum.0 / n, sum.1 / n, sum.2 / n)
        }
        Average::Weighted => {
            let scores = per_class(preds, labels)?;
            let total: usize = scores.values().map(|s| s.support).sum();
            let total = total as f64;
            let sum = scores.values().fold((0.0, 0.0, 0.0), |acc, s| {
                let w = s.support as f64;
                (acc.0 + w * s.precision, acc.1 + w * s.recall, acc.2 + w * s.f1)
            });
            (sum.0 / total, sum.1 / total, sum.2 / total)
        }
    };

    Ok(Metrics {
        accuracy,
        precision,
        recall,
        f1,
    })
}
