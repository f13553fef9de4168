//! Exhaustive permutation enumeration.
//!
//! Uses the iterative form of Heap's algorithm: each ordering is produced
//! from the previous one by a single swap, with no recursion and no
//! materialized list of results.

/// `n!`, saturating at `usize::MAX`.
pub fn factorial(n: usize) -> usize {
    (2..=n).try_fold(1usize, |acc, k| acc.checked_mul(k)).unwrap_or(usize::MAX)
}

/// Lazily yield every ordering of `items`.
///
/// The first ordering is `items` as given. Exactly `n!` orderings are
/// produced (one, the empty ordering, for `n = 0`). The iterator is `Clone`,
/// so a fresh copy taken before iteration restarts the sequence.
///
/// ```
/// use nanofolio::permute::permutations;
///
/// let all: Vec<Vec<char>> = permutations(['a', 'b', 'c']).collect();
/// assert_eq!(all.len(), 6);
/// assert_eq!(all[0], vec!['a', 'b', 'c']);
/// ```
pub fn permutations<T: Clone>(items: impl IntoIterator<Item = T>) -> Permutations<T> {
    let items: Vec<T> = items.into_iter().collect();
    let n = items.len();
    Permutations {
        remaining: factorial(n),
        counters: vec![0; n],
        cursor: 1,
        started: false,
        items,
    }
}

/// Iterator returned by [`permutations`].
#[derive(Clone, Debug)]
pub struct Permutations<T> {
    items: Vec<T>,
    /// Heap's per-level swap counters.
    counters: Vec<usize>,
    cursor: usize,
    started: bool,
    remaining: usize,
}

impl<T: Clone> Iterator for Permutations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        if self.remaining == 0 {
            return None;
        }
        if !self.started {
            self.started = true;
            self.remaining -= 1;
            return Some(self.items.clone());
        }

        let n = self.items.len();
        while self.cursor < n {
            let i = self.cursor;
            if self.counters[i] < i {
                if i % 2 == 0 {
                    self.items.swap(0, i);
                } else {
                    self.items.swap(self.counters[i], i);
                }
                self.counters[i] += 1;
                self.cursor = 1;
                self.remaining -= 1;
                return Some(self.items.clone());
            }
            self.counters[i] = 0;
            self.cursor += 1;
        }

        self.remaining = 0;
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Clone> ExactSizeIterator for Permutations<T> {}
