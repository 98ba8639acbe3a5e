//! Weighted k-means clustering over deduplicated colors.
//!
//! Each unique color is a point in plain RGB space weighted by its pixel count.
//! Centroids are seeded with k-means++ and refined with Lloyd iterations.

use crate::ColorCounts;
use rand::Rng;
use rand_distr::{weighted_alias::WeightedAliasIndex, Distribution};
use std::array;
use wide::{f32x8, CmpLt};

/// The maximum number of Lloyd iterations.
const MAX_ITERATIONS: u32 = 300;

/// The convergence tolerance relative to the mean per-channel variance of the data.
const RELATIVE_TOLERANCE: f64 = 1e-4;

/// The result of fitting k-means to a set of colors.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// The cluster centers.
    pub centroids: Vec<[f32; 3]>,
    /// The cluster index of each unique color in the fitted [`ColorCounts`].
    pub assignments: Vec<u32>,
    /// The sum of squared distances of each pixel to its cluster center.
    pub inertia: f64,
}

/// Squared euclidean distance between two points.
#[inline]
fn squared_distance(x: [f32; 3], y: [f32; 3]) -> f32 {
    let mut dist = 0.0;
    for c in 0..3 {
        let d = x[c] - y[c];
        dist += d * d;
    }
    dist
}

/// Centroids transposed into chunks of 8 for SIMD distance computations.
///
/// Lanes beyond the number of centroids are filled with infinity so they never win.
struct Lanes(Vec<[f32x8; 3]>);

impl Lanes {
    fn new(centroids: &[[f32; 3]]) -> Self {
        let chunks = centroids.chunks_exact(8);
        let mut lanes = Vec::with_capacity(centroids.len().div_ceil(8));
        lanes.extend(
            chunks
                .clone()
                .map(|chunk| array::from_fn(|c| f32x8::new(array::from_fn(|j| chunk[j][c])))),
        );

        if !chunks.remainder().is_empty() {
            let mut arr = [[f32::INFINITY; 8]; 3];
            for (j, centroid) in chunks.remainder().iter().enumerate() {
                for (arr, &v) in arr.iter_mut().zip(centroid) {
                    arr[j] = v;
                }
            }
            lanes.push(arr.map(f32x8::new));
        }

        Self(lanes)
    }

    /// Returns the index of and squared distance to the nearest centroid.
    ///
    /// Ties go to the centroid with the lowest index.
    #[inline]
    fn nearest(&self, query: [f32; 3]) -> (usize, f32) {
        let mut cur_chunk = f32x8::ZERO;
        let mut min_chunk = cur_chunk;
        let mut min_distance = f32x8::splat(f32::INFINITY);

        let query = query.map(f32x8::splat);

        for chunk in &self.0 {
            let mut distance = f32x8::ZERO;
            for c in 0..3 {
                let diff = query[c] - chunk[c];
                distance += diff * diff;
            }

            let mask = distance.cmp_lt(min_distance);
            min_chunk = mask.blend(cur_chunk, min_chunk);
            min_distance = mask.blend(distance, min_distance);
            cur_chunk += f32x8::ONE;
        }

        let mut best = (usize::MAX, f32::INFINITY);
        for (lane, (&dist, &chunk)) in min_distance
            .as_array_ref()
            .iter()
            .zip(min_chunk.as_array_ref())
            .enumerate()
        {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let i = chunk as usize * 8 + lane;
            if dist < best.1 || (dist == best.1 && i < best.0) {
                best = (i, dist);
            }
        }

        best
    }
}

/// Picks the initial centroids with weighted k-means++ seeding.
fn seed_centroids(
    points: &[[f32; 3]],
    weights: &[f64],
    k: usize,
    rng: &mut impl Rng,
) -> Vec<[f32; 3]> {
    let mut centroids = Vec::with_capacity(k);

    let first = match WeightedAliasIndex::new(weights.to_vec()) {
        Ok(distribution) => distribution.sample(rng),
        Err(_) => 0,
    };
    centroids.push(points[first]);

    let mut closest = points
        .iter()
        .map(|&p| f64::from(squared_distance(p, points[first])))
        .collect::<Vec<_>>();

    while centroids.len() < k {
        let potential = closest
            .iter()
            .zip(weights)
            .map(|(&d, &w)| d * w)
            .collect::<Vec<_>>();

        // every remaining point coincides with a centroid
        let Ok(distribution) = WeightedAliasIndex::new(potential) else {
            break;
        };

        let next = points[distribution.sample(rng)];
        centroids.push(next);

        for (d, &p) in closest.iter_mut().zip(points) {
            *d = d.min(f64::from(squared_distance(p, next)));
        }
    }

    centroids
}

/// The convergence tolerance for the given data, as in `tol * mean(var(X, axis=0))`.
fn tolerance(points: &[[f32; 3]], weights: &[f64]) -> f64 {
    let total = weights.iter().sum::<f64>();
    if total <= 0.0 {
        return 0.0;
    }

    let mut variance = 0.0;
    for c in 0..3 {
        let mean = points
            .iter()
            .zip(weights)
            .map(|(p, &w)| f64::from(p[c]) * w)
            .sum::<f64>()
            / total;

        variance += points
            .iter()
            .zip(weights)
            .map(|(p, &w)| {
                let d = f64::from(p[c]) - mean;
                d * d * w
            })
            .sum::<f64>()
            / total;
    }

    RELATIVE_TOLERANCE * variance / 3.0
}

/// Returns the trivial clustering where every unique color is its own cluster.
fn trivial(color_counts: &ColorCounts) -> KmeansFit {
    #[allow(clippy::cast_possible_truncation)]
    KmeansFit {
        centroids: color_counts
            .color_components()
            .iter()
            .map(|c| c.map(f32::from))
            .collect(),
        assignments: (0..color_counts.len() as u32).collect(),
        inertia: 0.0,
    }
}

/// Fits k-means with `k` clusters to the given colors.
///
/// If `k` is at least the number of unique colors, the clustering is trivial
/// and every unique color becomes its own cluster (with zero inertia).
/// A `k` of `0` is treated as `1`.
#[must_use]
pub fn fit(color_counts: &ColorCounts, k: usize, rng: &mut impl Rng) -> KmeansFit {
    if color_counts.is_empty() {
        return KmeansFit { centroids: Vec::new(), assignments: Vec::new(), inertia: 0.0 };
    }

    let k = k.max(1);
    if k >= color_counts.len() {
        tracing::debug!(
            k,
            colors = color_counts.len(),
            "cluster count covers every distinct color, using trivial clustering"
        );
        return trivial(color_counts);
    }

    let points = color_counts
        .color_components()
        .iter()
        .map(|c| c.map(f32::from))
        .collect::<Vec<_>>();
    let weights = color_counts
        .counts()
        .iter()
        .map(|&n| f64::from(n))
        .collect::<Vec<_>>();

    let tol = tolerance(&points, &weights);
    let mut centroids = seed_centroids(&points, &weights, k, rng);
    let mut assignments = vec![u32::MAX; points.len()];

    for iteration in 0..MAX_ITERATIONS {
        let lanes = Lanes::new(&centroids);

        let mut changed = false;
        for (assignment, &p) in assignments.iter_mut().zip(&points) {
            #[allow(clippy::cast_possible_truncation)]
            let nearest = lanes.nearest(p).0 as u32;
            changed |= *assignment != nearest;
            *assignment = nearest;
        }

        let mut sums = vec![[0.0f64; 3]; centroids.len()];
        let mut totals = vec![0.0f64; centroids.len()];
        for ((&a, p), &w) in assignments.iter().zip(&points).zip(&weights) {
            let a = a as usize;
            for c in 0..3 {
                sums[a][c] += f64::from(p[c]) * w;
            }
            totals[a] += w;
        }

        let mut shift = 0.0;
        for ((centroid, sum), &total) in centroids.iter_mut().zip(&sums).zip(&totals) {
            // empty clusters keep their previous center
            if total > 0.0 {
                #[allow(clippy::cast_possible_truncation)]
                let updated = sum.map(|s| (s / total) as f32);
                shift += f64::from(squared_distance(*centroid, updated));
                *centroid = updated;
            }
        }

        if !changed || shift <= tol {
            tracing::trace!(iteration, shift, "k-means converged");
            break;
        }
    }

    let lanes = Lanes::new(&centroids);
    let mut inertia = 0.0;
    for ((assignment, &p), &w) in assignments.iter_mut().zip(&points).zip(&weights) {
        let (nearest, dist) = lanes.nearest(p);
        #[allow(clippy::cast_possible_truncation)]
        {
            *assignment = nearest as u32;
        }
        inertia += f64::from(dist) * w;
    }

    KmeansFit { centroids, assignments, inertia }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use palette::Srgb;

    #[test]
    fn nearest_matches_naive_search() {
        let centroids = random_pixels_with(21, 3) // non-multiple of 8 to test remainder lanes
            .into_iter()
            .map(|c| [c.red, c.green, c.blue].map(f32::from))
            .collect::<Vec<_>>();
        let lanes = Lanes::new(&centroids);

        for color in random_pixels_with(512, 4) {
            let query = [color.red, color.green, color.blue].map(f32::from);
            let (i, dist) = lanes.nearest(query);

            #[allow(clippy::float_cmp)]
            {
                let expected = centroids
                    .iter()
                    .map(|&c| squared_distance(c, query))
                    .fold(f32::INFINITY, f32::min);
                assert_eq!(dist, expected);
                assert_eq!(squared_distance(centroids[i], query), expected);
            }
        }
    }

    #[test]
    fn enough_clusters_is_trivial() {
        let pixels = vec![Srgb::new(0, 0, 0), Srgb::new(9, 9, 9), Srgb::new(0, 0, 0)];
        let counts = ColorCounts::new(&pixels);
        let fit = fit(&counts, 5, &mut test_rng());

        assert_eq!(fit.centroids, vec![[0.0; 3], [9.0; 3]]);
        assert_eq!(fit.assignments, vec![0, 1]);
        assert!(fit.inertia.abs() < f64::EPSILON);
    }

    #[test]
    fn zero_clusters_falls_back_to_one() {
        let counts = ColorCounts::new(&random_pixels_with(64, 1));
        let fit = fit(&counts, 0, &mut test_rng());
        assert_eq!(fit.centroids.len(), 1);
        assert!(fit.assignments.iter().all(|&a| a == 0));
    }

    #[test]
    fn separates_distant_groups() {
        let mut pixels = vec![Srgb::new(10, 10, 10); 50];
        pixels.extend(vec![Srgb::new(12, 10, 10); 50]);
        pixels.extend(vec![Srgb::new(240, 240, 240); 30]);
        pixels.extend(vec![Srgb::new(240, 242, 240); 30]);
        let counts = ColorCounts::new(&pixels);

        let fit = fit(&counts, 2, &mut test_rng());
        let assignments = &fit.assignments;
        assert_eq!(assignments[0], assignments[1]);
        assert_eq!(assignments[2], assignments[3]);
        assert_ne!(assignments[0], assignments[2]);
        // 100 pixels at distance 1 and 60 pixels at distance 1 from their centers
        assert!((fit.inertia - 160.0).abs() < 1e-3);
    }

    #[test]
    fn inertia_does_not_grow_with_more_clusters() {
        let counts = ColorCounts::new(&random_pixels_with(2000, 9));
        let mut rng = test_rng();
        let one = fit(&counts, 1, &mut rng).inertia;
        let eight = fit(&counts, 8, &mut rng).inertia;
        assert!(eight < one);
    }
}
