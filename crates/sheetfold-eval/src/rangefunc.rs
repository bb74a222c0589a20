//! Reductions over collected arrays.
//!
//! Each reducer returns `None` when the input does not admit a result (too
//! few values, a non-positive value where only positives make sense). The
//! wrappers on [`crate::cache::CollectCache`] turn `None` into the caller's
//! error code.

pub fn count(xs: &[f64]) -> Option<f64> {
    Some(xs.len() as f64)
}

pub fn sum(xs: &[f64]) -> Option<f64> {
    Some(xs.iter().sum())
}

pub fn sumsq(xs: &[f64]) -> Option<f64> {
    Some(xs.iter().map(|x| x * x).sum())
}

pub fn average(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

pub fn min(xs: &[f64]) -> Option<f64> {
    xs.iter().copied().reduce(f64::min)
}

pub fn max(xs: &[f64]) -> Option<f64> {
    xs.iter().copied().reduce(f64::max)
}

/// Empty input gives 1.
pub fn product(xs: &[f64]) -> Option<f64> {
    Some(xs.iter().product())
}

/// Sum of squared deviations from the mean. Empty input gives 0.
pub fn devsq(xs: &[f64]) -> Option<f64> {
    match average(xs) {
        Some(m) => Some(xs.iter().map(|x| (x - m) * (x - m)).sum()),
        None => Some(0.0),
    }
}

/// Mean absolute deviation from the mean.
pub fn avedev(xs: &[f64]) -> Option<f64> {
    let m = average(xs)?;
    Some(xs.iter().map(|x| (x - m).abs()).sum::<f64>() / xs.len() as f64)
}

pub fn var_pop(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(devsq(xs)? / xs.len() as f64)
}

pub fn var_est(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    Some(devsq(xs)? / (xs.len() - 1) as f64)
}

pub fn stddev_pop(xs: &[f64]) -> Option<f64> {
    var_pop(xs).map(f64::sqrt)
}

pub fn stddev_est(xs: &[f64]) -> Option<f64> {
    var_est(xs).map(f64::sqrt)
}

/// Middle value. Input collected with `SORT` is used as is, anything else
/// is sorted into a scratch copy first.
pub fn median(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let scratch;
    let sorted = if xs.is_sorted() {
        xs
    } else {
        let mut v = xs.to_vec();
        v.sort_unstable_by(f64::total_cmp);
        scratch = v;
        &scratch[..]
    };
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Most frequent value; ties go to the value seen first. `None` when no
/// value repeats.
pub fn mode(xs: &[f64]) -> Option<f64> {
    let mut counts: rustc_hash::FxHashMap<u64, (usize, usize)> = Default::default();
    for (i, x) in xs.iter().enumerate() {
        // -0.0 and 0.0 are the same value.
        let bits = if *x == 0.0 { 0 } else { x.to_bits() };
        counts.entry(bits).or_insert((0, i)).0 += 1;
    }
    counts
        .values()
        .filter(|(n, _)| *n > 1)
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|&(_, first)| xs[first])
}

/// Requires strictly positive values.
pub fn harmonic_mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() || xs.iter().any(|x| *x <= 0.0) {
        return None;
    }
    Some(xs.len() as f64 / xs.iter().map(|x| 1.0 / x).sum::<f64>())
}

/// Requires strictly positive values.
pub fn geometric_mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() || xs.iter().any(|x| *x <= 0.0) {
        return None;
    }
    Some((xs.iter().map(|x| x.ln()).sum::<f64>() / xs.len() as f64).exp())
}

/// Euclidean norm, scaled to avoid overflow.
pub fn hypot(xs: &[f64]) -> Option<f64> {
    let scale = xs.iter().fold(0.0f64, |m, x| m.max(x.abs()));
    if scale == 0.0 {
        return Some(0.0);
    }
    let s: f64 = xs.iter().map(|x| (x / scale) * (x / scale)).sum();
    Some(scale * s.sqrt())
}

/* ───────────────────────────── Pairs ───────────────────────────── */

fn sum_cross_dev(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let mx = average(xs)?;
    let my = average(ys)?;
    Some(xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum())
}

pub fn covar_pop(xs: &[f64], ys: &[f64]) -> Option<f64> {
    Some(sum_cross_dev(xs, ys)? / xs.len() as f64)
}

pub fn covar_est(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    Some(sum_cross_dev(xs, ys)? / (xs.len() - 1) as f64)
}

/// Pearson correlation, clamped into `[-1, 1]`. `None` when either side is
/// constant.
pub fn correl_pop(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let cov = sum_cross_dev(xs, ys)?;
    let sx = devsq(xs)?;
    let sy = devsq(ys)?;
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    Some((cov / (sx * sy).sqrt()).clamp(-1.0, 1.0))
}

pub fn rsq_pop(xs: &[f64], ys: &[f64]) -> Option<f64> {
    correl_pop(xs, ys).map(|r| r * r)
}

pub fn sumxmy2(xs: &[f64], ys: &[f64]) -> Option<f64> {
    Some(xs.iter().zip(ys).map(|(x, y)| (x - y) * (x - y)).sum())
}

pub fn sumx2my2(xs: &[f64], ys: &[f64]) -> Option<f64> {
    Some(xs.iter().zip(ys).map(|(x, y)| x * x - y * y).sum())
}

pub fn sumx2py2(xs: &[f64], ys: &[f64]) -> Option<f64> {
    Some(xs.iter().zip(ys).map(|(x, y)| x * x + y * y).sum())
}

pub fn sumproduct(xs: &[f64], ys: &[f64]) -> Option<f64> {
    Some(xs.iter().zip(ys).map(|(x, y)| x * y).sum())
}
