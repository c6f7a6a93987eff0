//! Shuffle steps
//!
//! Each step picks two different slots uniformly and swaps their cups. The
//! second slot is redrawn until it differs from the first, so every unordered
//! pair is equally likely.

use rand::Rng;

use super::state::Cup;

/// Draw two distinct slot indices in `0..n`. `None` if `n < 2`.
pub fn distinct_pair<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Option<(usize, usize)> {
    if n < 2 {
        return None;
    }
    let a = rng.random_range(0..n);
    let mut b = rng.random_range(0..n);
    while b == a {
        b = rng.random_range(0..n);
    }
    Some((a, b))
}

/// Perform one swap step, returning the slots that traded cups
pub fn swap_step<R: Rng + ?Sized>(rng: &mut R, cups: &mut [Cup]) -> Option<(usize, usize)> {
    let (a, b) = distinct_pair(rng, cups.len())?;
    cups.swap(a, b);
    Some((a, b))
}
