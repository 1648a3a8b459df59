//! Stage pairing: neighbours by index
//!
//! Stage pairings are (0,1), (2,3), ... over the current population order.
//! With an odd population the last player sits the stage out.

/// All pairs for a population of `n`
pub fn adjacent_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n / 2).map(|i| (2 * i, 2 * i + 1)).collect()
}

/// Index of the player left without an opponent, if any
pub fn unpaired(n: usize) -> Option<usize> {
    (n % 2 == 1).then(|| n - 1)
}

/// Disjoint mutable borrows of two distinct elements, `i < j`
pub fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    assert!(i < j && j < items.len(), "pair_mut({}, {}) on {} items", i, j, items.len());
    let (head, tail) = items.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}
