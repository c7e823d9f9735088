use crate::error::PipelineError;
use crate::image_classifier::class_labels::ClassLabels;
use crate::image_classifier::interface::{Prediction, RankedResult};
use std::cmp::Ordering;

/// Picks the `k` highest scores and attaches their labels.
///
/// Ties keep ascending index order. NaN sorts after every number. Scores are
/// passed through unchanged as `probability`; normalizing them is the
/// classifier's job.
pub fn rank(
    scores: &[f32],
    k: usize,
    labels: &ClassLabels,
) -> Result<RankedResult, PipelineError> {
    if scores.is_empty() {
        return Err(PipelineError::InvalidArgument(
            "score vector is empty".to_string(),
        ));
    }
    if k > scores.len() {
        return Err(PipelineError::InvalidArgument(format!(
            "k={} exceeds {} scores",
            k,
            scores.len()
        )));
    }
    if scores.len() != labels.len() {
        return Err(PipelineError::InvalidArgument(format!(
            "{} scores but {} class labels",
            scores.len(),
            labels.len()
        )));
    }

    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    // sort_by is stable, so equal scores stay in index order.
    indexed.sort_by(|a, b| descending(a.1, b.1));

    indexed
        .into_iter()
        .take(k)
        .map(|(index, score)| {
            let label = labels.get(index).ok_or_else(|| {
                PipelineError::InvalidArgument(format!("no label for class {}", index))
            })?;
            Ok(Prediction {
                label: label.to_string(),
                probability: score,
            })
        })
        .collect()
}

fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
