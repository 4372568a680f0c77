//! The consensus engine (C7): outlier rejection followed by one of four
//! aggregation methods, emitting a [`ConsensusResult`].

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use oracle_types::{ConsensusMethod, ConsensusResult, OracleError, Response, ResponseValue};

/// Multiplier applied inside the 3-sigma rule, per the design note pinning
/// `outlierThreshold` as a multiplier on `stdDev` rather than a raw
/// percentage deviation from the mean.
const SIGMA_RULE_FACTOR: f64 = 3.0;

/// Floor applied to `Median`'s computed confidence so a degenerate
/// (near-zero-median) input never reports a confidence of zero.
const MIN_CONFIDENCE_FLOOR: f64 = 0.1;

/// Reconcile `responses` into a single [`ConsensusResult`] using `method`,
/// after first removing statistical outliers.
///
/// `weight_of` resolves a response's provider name to its registered
/// weight; callers should fall back to `0.5` for a name the registry
/// doesn't recognize, per the provider-record default.
///
/// # Errors
/// - [`OracleError::InsufficientResponses`] if `responses.len() < min_responses`.
pub fn reconcile(
    responses: &[Response],
    method: ConsensusMethod,
    min_responses: usize,
    outlier_threshold: f64,
    weight_of: impl Fn(&str) -> f64,
) -> Result<ConsensusResult, OracleError> {
    if responses.len() < min_responses {
        return Err(OracleError::InsufficientResponses {
            got: responses.len(),
            required: min_responses,
            raw_responses: responses.to_vec(),
        });
    }

    let survivors = remove_outliers(responses, outlier_threshold);

    let (value, confidence, method) = match method {
        ConsensusMethod::Median => median(&survivors).unwrap_or_else(|| majority_vote(&survivors, &weight_of)),
        ConsensusMethod::WeightedAverage => {
            weighted_average(&survivors, |r| weight_of(&r.source), ConsensusMethod::WeightedAverage)
                .unwrap_or_else(|| majority_vote(&survivors, &weight_of))
        }
        ConsensusMethod::ConfidenceWeighted => {
            weighted_average(&survivors, |r| r.confidence, ConsensusMethod::ConfidenceWeighted)
                .unwrap_or_else(|| majority_vote(&survivors, &weight_of))
        }
        ConsensusMethod::MajorityVote => majority_vote(&survivors, &weight_of),
    };

    Ok(ConsensusResult {
        value,
        confidence,
        method,
        sources: survivors.iter().map(|r| r.source.clone()).collect(),
        raw_responses: responses.to_vec(),
        timestamp: Utc::now(),
    })
}

/// Partition `responses` into numeric and non-numeric; if there are at
/// least three numeric samples, discard any numeric response whose
/// distance from the mean exceeds `3 * outlier_threshold * stdDev`.
/// Non-numeric responses are never touched, and outlier removal is skipped
/// entirely when there are fewer than three numeric samples to judge from.
fn remove_outliers(responses: &[Response], outlier_threshold: f64) -> Vec<Response> {
    let numeric_values: Vec<f64> = responses
        .iter()
        .filter_map(|r| r.value.as_scalar())
        .filter_map(|d| d.to_f64())
        .collect();

    if numeric_values.len() < 3 {
        return responses.to_vec();
    }

    let mean = numeric_values.iter().sum::<f64>() / numeric_values.len() as f64;
    let variance =
        numeric_values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / numeric_values.len() as f64;
    let std_dev = variance.sqrt();
    let cutoff = SIGMA_RULE_FACTOR * outlier_threshold * std_dev;

    responses
        .iter()
        .filter(|r| match r.value.as_scalar().and_then(|d| d.to_f64()) {
            Some(v) => (v - mean).abs() <= cutoff,
            None => true,
        })
        .cloned()
        .collect()
}

/// Median of the numeric subset. Odd count takes the middle element; even
/// count averages the two middles (computed in `Decimal` for exactness).
/// Returns `None` if there are no numeric responses, signaling the caller
/// to fall back to `MajorityVote`.
fn median(responses: &[Response]) -> Option<(ResponseValue, f64, ConsensusMethod)> {
    let mut values: Vec<Decimal> = responses.iter().filter_map(|r| r.value.as_scalar()).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();

    let n = values.len();
    let median_value = if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / Decimal::from(2)
    };

    let median_f = median_value.to_f64().unwrap_or(0.0);
    let confidence = if median_f.abs() < f64::EPSILON {
        MIN_CONFIDENCE_FLOOR
    } else {
        let mad = values
            .iter()
            .filter_map(|v| v.to_f64())
            .map(|v| (v - median_f).abs())
            .sum::<f64>()
            / values.len() as f64;
        (1.0 - mad / median_f.abs()).max(MIN_CONFIDENCE_FLOOR)
    };

    Some((
        ResponseValue::Scalar(median_value),
        confidence,
        ConsensusMethod::Median,
    ))
}

/// Shared implementation for `WeightedAverage` and `ConfidenceWeighted`:
/// both are a weighted mean over numeric responses, differing only in
/// which per-response weight they use (`weight_fn`) and which method tag
/// (`result_method`) the caller wants reflected in `ConsensusResult.method`
/// — the arithmetic is otherwise identical.
fn weighted_average(
    responses: &[Response],
    weight_fn: impl Fn(&Response) -> f64,
    result_method: ConsensusMethod,
) -> Option<(ResponseValue, f64, ConsensusMethod)> {
    let numeric: Vec<&Response> = responses.iter().filter(|r| r.value.is_numeric()).collect();
    if numeric.is_empty() {
        return None;
    }

    let mut weighted_sum = 0.0_f64;
    let mut weight_total = 0.0_f64;
    let mut confidence_sum = 0.0_f64;

    for response in &numeric {
        let w = weight_fn(response);
        let v = response.value.as_scalar().and_then(|d| d.to_f64()).unwrap_or(0.0);
        weighted_sum += v * w;
        confidence_sum += response.confidence * w;
        weight_total += w;
    }

    if weight_total <= 0.0 {
        return None;
    }

    let value = weighted_sum / weight_total;
    let confidence = (confidence_sum / weight_total).clamp(0.0, 1.0);

    Some((
        ResponseValue::Scalar(Decimal::from_f64_retain(value).unwrap_or_default()),
        confidence,
        result_method,
    ))
}

/// Group responses by their value's canonical serialization; the largest
/// group wins, ties broken by total provider weight within the group and
/// then by first appearance. Handles both numeric and non-numeric values,
/// making it the universal fallback for the other three methods.
fn majority_vote(
    responses: &[Response],
    weight_of: &impl Fn(&str) -> f64,
) -> (ResponseValue, f64, ConsensusMethod) {
    debug_assert!(!responses.is_empty(), "reconcile already enforced min_responses");

    let mut groups: Vec<(String, ResponseValue, Vec<&Response>)> = Vec::new();
    for response in responses {
        let key = response.value.canonical();
        if let Some(group) = groups.iter_mut().find(|(k, ..)| *k == key) {
            group.2.push(response);
        } else {
            groups.push((key, response.value.clone(), vec![response]));
        }
    }

    let total = responses.len();
    let group_weight = |members: &[&Response]| -> f64 { members.iter().map(|r| weight_of(&r.source)).sum() };

    // Manual fold rather than `Iterator::max_by`: ties must resolve to the
    // *first*-appearing group, and `max_by`'s documented tie behavior keeps
    // the *last* equal element, which is the wrong direction here.
    let mut groups = groups.into_iter();
    let first = groups.next().expect("responses is non-empty, so groups is non-empty");
    let (_, winner_value, winner_members) = groups.fold(first, |best, candidate| {
        let candidate_count = candidate.2.len();
        let best_count = best.2.len();
        if candidate_count > best_count {
            candidate
        } else if candidate_count < best_count {
            best
        } else if group_weight(&candidate.2) > group_weight(&best.2) {
            candidate
        } else {
            best
        }
    });

    let confidence = winner_members.len() as f64 / total as f64;
    (winner_value, confidence, ConsensusMethod::MajorityVote)
}
