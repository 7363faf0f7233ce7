//! Lazy sequence generators used by list unexpansion.
//!
//! All generators are restartable (`Clone`) and produce owned `Vec`s one at a
//! time, so callers can chain them without materializing the (exponential)
//! space of candidates.

/// Non-empty sub-selections of `items`, order preserved, by increasing size.
#[derive(Debug, Clone)]
pub struct Subsets<T> {
    items: Vec<T>,
    indices: Option<Vec<usize>>,
}

impl<T: Clone> Subsets<T> {
    pub fn new(items: Vec<T>) -> Self {
        let indices = (!items.is_empty()).then(|| vec![0]);
        Self { items, indices }
    }
}

impl<T: Clone> Iterator for Subsets<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.indices.as_mut()?;
        let out = indices.iter().map(|&i| self.items[i].clone()).collect();

        let n = self.items.len();
        let k = indices.len();
        match (0..k).rev().find(|&i| indices[i] < n - k + i) {
            Some(i) => {
                indices[i] += 1;
                for j in i + 1..k {
                    indices[j] = indices[j - 1] + 1;
                }
            }
            None if k < n => *indices = (0..=k).collect(),
            None => self.indices = None,
        }

        Some(out)
    }
}

/// Every way of repeating each element of `items` between 1 and
/// `max_repetitions + 1` times, copies kept adjacent.
#[derive(Debug, Clone)]
pub struct Repetitions<T> {
    items: Vec<T>,
    max_count: usize,
    counts: Option<Vec<usize>>,
}

impl<T: Clone> Repetitions<T> {
    pub fn new(items: Vec<T>, max_repetitions: usize) -> Self {
        let counts = Some(vec![1; items.len()]);
        Self {
            items,
            max_count: max_repetitions.saturating_add(1),
            counts,
        }
    }
}

impl<T: Clone> Iterator for Repetitions<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let counts = self.counts.as_mut()?;
        let out = self
            .items
            .iter()
            .zip(counts.iter())
            .flat_map(|(item, &count)| std::iter::repeat(item).take(count).cloned())
            .collect();

        match counts.iter().rposition(|&c| c < self.max_count) {
            Some(i) => {
                counts[i] += 1;
                counts[i + 1..].iter_mut().for_each(|c| *c = 1);
            }
            None => self.counts = None,
        }

        Some(out)
    }
}

/// Distinct permutations of a multiset in lexicographic order.
#[derive(Debug, Clone)]
pub struct Permutations<T> {
    current: Option<Vec<T>>,
}

impl<T: Ord + Clone> Permutations<T> {
    pub fn new(mut items: Vec<T>) -> Self {
        items.sort();
        Self {
            current: Some(items),
        }
    }
}

impl<T: Ord + Clone> Iterator for Permutations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.as_mut()?;
        let out = current.clone();
        if !next_permutation(current) {
            self.current = None;
        }
        Some(out)
    }
}

fn next_permutation<T: Ord>(items: &mut [T]) -> bool {
    let Some(pivot) = items.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(swap) = items.iter().rposition(|x| *x > items[pivot]) else {
        return false;
    };
    items.swap(pivot, swap);
    items[pivot + 1..].reverse();
    true
}

/// Sub-selections of `items`, each with bounded repetition, in every order.
pub fn list_variants<T: Ord + Clone>(
    items: Vec<T>,
    max_repetitions: usize,
) -> impl Iterator<Item = Vec<T>> + Clone {
    Subsets::new(items)
        .flat_map(move |subset| Repetitions::new(subset, max_repetitions))
        .flat_map(Permutations::new)
}
