//! Rank-based ROC-AUC (Mann-Whitney U).

/// Probability that a random positive scores above a random negative.
///
/// Tied scores contribute one half, via average ranks. Returns `None` when
/// either class is absent, since AUC is undefined on a single class.
///
/// # Example
///
/// ```
/// use fair_eval::stats::roc_auc;
///
/// let labels = [true, true, false, false];
/// let scores = [0.9, 0.8, 0.3, 0.1];
/// assert_eq!(roc_auc(&labels, &scores), Some(1.0));
/// assert_eq!(roc_auc(&[true, true], &[0.1, 0.2]), None);
/// ```
#[must_use]
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> Option<f64> {
    debug_assert_eq!(labels.len(), scores.len());

    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // Sum of 1-based average ranks over the positive class.
    let mut pos_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let positives = order[start..end].iter().filter(|&&i| labels[i]).count();
        pos_rank_sum += avg_rank * positives as f64;
        start = end;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    let u = pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0;
    Some(u / (n_pos * n_neg))
}
