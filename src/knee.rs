//! Knee detection on convex, decreasing curves (the Kneedle method with a sensitivity of 1).

/// Scales `values` linearly onto `[0, 1]`, or returns `None` if they are all equal.
fn normalize(values: &[f64]) -> Option<Vec<f64>> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return None;
    }
    Some(values.iter().map(|v| (v - min) / range).collect())
}

/// Whether `diff[i]` compares `cmp` to both of its neighbors (edges compare with themselves).
fn is_extremum(diff: &[f64], i: usize, cmp: impl Fn(f64, f64) -> bool) -> bool {
    let left = diff[i.saturating_sub(1)];
    let right = diff[(i + 1).min(diff.len() - 1)];
    cmp(diff[i], left) && cmp(diff[i], right)
}

/// The difference curve of a convex, decreasing curve:
/// the flipped, normalized `y` minus the normalized `x`.
fn difference_curve(xs: &[f64], ys: &[f64]) -> Option<Vec<f64>> {
    let xs = normalize(xs)?;
    let ys = normalize(ys)?;
    Some(xs.iter().zip(ys).map(|(x, y)| (1.0 - y) - x).collect())
}

/// Returns the index of the knee of the convex, decreasing curve given by `xs` and `ys`.
///
/// The scan starts at the first local maximum of the difference curve.
/// Each local maximum sets a threshold of its value minus the mean step of the normalized `x`,
/// each local minimum resets it to `0`, and the knee is the last maximum seen
/// once the following point falls below the threshold.
///
/// Returns `None` if the curve is flat, too short, or no point falls below a threshold.
///
/// # Panics
/// Panics if `xs` and `ys` have different lengths.
#[must_use]
pub fn find_knee(xs: &[f64], ys: &[f64]) -> Option<usize> {
    assert_eq!(xs.len(), ys.len());

    let n = xs.len();
    if n < 2 {
        return None;
    }

    let diff = difference_curve(xs, ys)?;

    #[allow(clippy::cast_precision_loss)]
    let step = 1.0 / (n - 1) as f64;

    let first_max = (0..n).find(|&i| is_extremum(&diff, i, |a, b| a >= b))?;

    let mut threshold = 0.0;
    let mut threshold_index = first_max;
    for i in first_max..(n - 1) {
        if is_extremum(&diff, i, |a, b| a >= b) {
            threshold = diff[i] - step;
            threshold_index = i;
        }
        if is_extremum(&diff, i, |a, b| a <= b) {
            threshold = 0.0;
        }
        if diff[i + 1] < threshold {
            return Some(threshold_index);
        }
    }

    None
}

/// Returns the index of the largest value of the difference curve,
/// or `None` if the curve is flat or empty.
#[must_use]
pub fn max_difference(xs: &[f64], ys: &[f64]) -> Option<usize> {
    let diff = difference_curve(xs, ys)?;
    diff.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &d)| match best {
            Some((_, b)) if b >= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}
