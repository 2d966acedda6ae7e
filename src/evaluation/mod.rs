//! Ranking quality over a labelled test set
//!
//! Top-k accuracy (any expected entity among the first k predictions) and
//! mean average precision, with entity names compared normalized.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::knowledge_base::read_json;
use crate::retrieval::{RetrievalOptions, Retriever};
use crate::text::normalize;
use crate::types::{RetrievalError, RetrievalResult};

pub const DEFAULT_TOP_K: usize = 5;

/// A labelled query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub query: String,
    /// Expected entity names; cases without any are skipped
    #[serde(default)]
    pub expected: Vec<String>,
}

/// Ranked entity names predicted for one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub case_id: String,
    pub predicted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub total_cases: usize,
    pub top_k: usize,
    /// Percentage in `[0, 100]`
    pub accuracy_top_k: f64,
    pub mean_average_precision: f64,
    pub avg_query_time_secs: f64,
}

/// Load test cases from a JSON array file
pub fn load_cases(path: &Path) -> RetrievalResult<Vec<TestCase>> {
    serde_json::from_value(read_json(path)?).map_err(|source| RetrievalError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Metrics at the default cut-off
pub fn evaluate(
    cases: &[TestCase],
    predictions: &[Prediction],
    timings: &[Duration],
) -> Option<EvaluationMetrics> {
    evaluate_at(cases, predictions, timings, DEFAULT_TOP_K)
}

/// Metrics at cut-off `k`; `None` when no prediction has ground truth
pub fn evaluate_at(
    cases: &[TestCase],
    predictions: &[Prediction],
    timings: &[Duration],
    k: usize,
) -> Option<EvaluationMetrics> {
    let truth: HashMap<&str, &TestCase> = cases.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut total = 0usize;
    let mut hits = 0usize;
    let mut average_precisions = Vec::new();

    for prediction in predictions {
        let Some(case) = truth.get(prediction.case_id.as_str()) else {
            continue;
        };
        if case.expected.is_empty() {
            continue;
        }
        total += 1;

        let expected: HashSet<String> = case.expected.iter().map(|e| normalize(e)).collect();
        let predicted: Vec<String> = prediction
            .predicted
            .iter()
            .map(|p| normalize(p))
            .filter(|p| !p.is_empty())
            .collect();

        if predicted.iter().take(k).any(|p| expected.contains(p)) {
            hits += 1;
        }
        average_precisions.push(average_precision(&predicted, &expected));
    }

    if total == 0 {
        warn!("no test case with ground truth");
        return None;
    }

    let avg_query_time_secs = if timings.is_empty() {
        0.0
    } else {
        timings.iter().map(Duration::as_secs_f64).sum::<f64>() / timings.len() as f64
    };

    Some(EvaluationMetrics {
        total_cases: total,
        top_k: k,
        accuracy_top_k: hits as f64 / total as f64 * 100.0,
        mean_average_precision: average_precisions.iter().sum::<f64>() / total as f64,
        avg_query_time_secs,
    })
}

/// Mean of the precision at each relevant rank; 0 when nothing is relevant
fn average_precision(predicted: &[String], expected: &HashSet<String>) -> f64 {
    let mut found = 0usize;
    let mut precisions = Vec::new();
    for (rank, name) in predicted.iter().enumerate() {
        if expected.contains(name) {
            found += 1;
            precisions.push(found as f64 / (rank + 1) as f64);
        }
    }
    if precisions.is_empty() {
        0.0
    } else {
        precisions.iter().sum::<f64>() / precisions.len() as f64
    }
}

/// Run every case through the retriever and score the rankings
pub fn run(
    retriever: &Retriever,
    cases: &[TestCase],
    options: &RetrievalOptions,
) -> Option<EvaluationMetrics> {
    let mut predictions = Vec::with_capacity(cases.len());
    let mut timings = Vec::with_capacity(cases.len());

    for case in cases {
        let started = Instant::now();
        let response = retriever.retrieve(&case.query, options);
        timings.push(started.elapsed());

        let predicted: Vec<String> = response
            .ranked_entities
            .into_iter()
            .map(|e| e.name)
            .collect();
        debug!(case = %case.id, predicted = predicted.len(), "case evaluated");
        predictions.push(Prediction {
            case_id: case.id.clone(),
            predicted,
        });
    }

    evaluate(cases, &predictions, &timings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, expected: &[&str]) -> TestCase {
        TestCase {
            id: id.to_string(),
            query: String::new(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn prediction(id: &str, predicted: &[&str]) -> Prediction {
        Prediction {
            case_id: id.to_string(),
            predicted: predicted.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_accuracy_and_map() {
        let cases = vec![case("1", &["Crown_Point"]), case("2", &["A", "B"]), case("3", &["Z"])];
        let predictions = vec![
            prediction("1", &["crown point", "x"]),
            prediction("2", &["x", "a", "y", "b"]),
            prediction("3", &["x", "y"]),
        ];
        let timings = vec![Duration::from_millis(100), Duration::from_millis(300)];

        let m = evaluate(&cases, &predictions, &timings).unwrap();
        assert_eq!(m.total_cases, 3);
        assert!((m.accuracy_top_k - 200.0 / 3.0).abs() < 1e-9);
        // AP: 1.0, (1/2 + 2/4) / 2 = 0.5, 0.0
        assert!((m.mean_average_precision - 0.5).abs() < 1e-9);
        assert!((m.avg_query_time_secs - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_cut_off_applies_to_accuracy_only() {
        let cases = vec![case("1", &["A"])];
        let predictions = vec![prediction("1", &["x", "y", "A"])];
        let m = evaluate_at(&cases, &predictions, &[], 2).unwrap();
        assert_eq!(m.accuracy_top_k, 0.0);
        assert!((m.mean_average_precision - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.avg_query_time_secs, 0.0);
    }

    #[test]
    fn test_cases_without_truth_are_skipped() {
        let cases = vec![case("1", &[])];
        let predictions = vec![prediction("1", &["A"]), prediction("unknown", &["A"])];
        assert!(evaluate(&cases, &predictions, &[]).is_none());
    }
}
