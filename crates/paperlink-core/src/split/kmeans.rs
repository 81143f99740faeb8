//! One-dimensional k-means used to stratify blocks by size

const MAX_ITERATIONS: usize = 100;

/// Cluster scalar values into at most `k` groups
///
/// `k` is clamped to the number of distinct values. Centroids start at
/// evenly spaced positions among the sorted distinct values, so the result
/// is fully deterministic.
pub fn kmeans_1d(values: &[f64], k: usize) -> Vec<usize> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut distinct: Vec<f64> = values.to_vec();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();

    let k = k.clamp(1, distinct.len());
    let mut centroids: Vec<f64> = (0..k)
        .map(|i| {
            let pos = if k == 1 {
                0
            } else {
                i * (distinct.len() - 1) / (k - 1)
            };
            distinct[pos]
        })
        .collect();

    let mut labels = vec![0; values.len()];
    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (label, &v) in labels.iter_mut().zip(values) {
            let nearest = nearest_centroid(&centroids, v);
            if nearest != *label {
                *label = nearest;
                changed = true;
            }
        }

        let mut sums = vec![0.0; k];
        let mut counts = vec![0usize; k];
        for (&label, &v) in labels.iter().zip(values) {
            sums[label] += v;
            counts[label] += 1;
        }
        for c in 0..k {
            if counts[c] > 0 {
                centroids[c] = sums[c] / counts[c] as f64;
            }
        }

        if !changed {
            break;
        }
    }

    labels
}

/// Index of the closest centroid; ties go to the lower index
fn nearest_centroid(centroids: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, &c) in centroids.iter().enumerate() {
        let d = (value - c).abs();
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_obvious_groups() {
        let labels = kmeans_1d(&[1.0, 2.0, 1.0, 50.0, 52.0, 2.0], 2);
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 0]);
    }

    #[test]
    fn test_k_clamped_to_distinct_values() {
        let labels = kmeans_1d(&[3.0, 3.0, 3.0], 5);
        assert_eq!(labels, vec![0, 0, 0]);
    }

    #[test]
    fn test_single_cluster() {
        let labels = kmeans_1d(&[1.0, 10.0, 100.0], 1);
        assert!(labels.iter().all(|&l| l == 0));
        assert!(kmeans_1d(&[], 3).is_empty());
    }
}
