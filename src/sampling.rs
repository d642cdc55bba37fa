//! Sampling from discrete distributions

use rand::prelude::*;
use rand_xoshiro::Xoshiro256StarStar;

/// Pseudorandomly selects an index from the discrete distribution
/// described by the cumulative sums `cumsum`, i.e. index `i` is
/// returned with probability `(cumsum[i] - cumsum[i-1]) / total`,
/// where `total` is the last element and `cumsum[-1] = 0`.
///
/// `cumsum` must be non-empty and non-decreasing.
/// If the total weight is zero the selection is degenerate and
/// index 0 is returned; callers should check the total first.
pub fn select_from_distribution<R: Rng>(cumsum: &[f64], rng: &mut R) -> usize {
    assert!(!cumsum.is_empty());

    let n = cumsum.len();
    let total = cumsum[n-1];
    let x = rng.gen::<f64>() * total;

    if !(total > 0.0) || x < cumsum[0] {
        return 0;
    }

    if x >= total {
        return n - 1;
    }

    // cumsum[lo] <= x < cumsum[hi]
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if x >= cumsum[mid] {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    hi
}

/// Fills `cumsum` with the running sum of `weights` and returns the total.
pub fn accumulate<I>(weights: I, cumsum: &mut [f64]) -> f64 where I: IntoIterator<Item=f64> {
    let mut total = 0.0;
    for (w, c) in weights.into_iter().zip(cumsum.iter_mut()) {
        total += w;
        *c = total;
    }
    total
}

/// Returns a pseudorandom number generator for the given `worker`,
/// statistically independent of those of all other workers
/// seeded with the same `seed`.
pub fn stream_for_worker(seed: u64, worker: usize) -> Xoshiro256StarStar {
    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
    for _ in 0..worker {
        rng.long_jump();
    }
    rng
}

#[cfg(test)]
pub(crate) use self::tests::Fixed;
