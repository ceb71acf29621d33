//! Query space enumeration
//!
//! The catalog only supports keyword search, so the crawl pages through it
//! by searching every 3-letter combination of the alphabet.

/// Length of every generated search key
pub const KEY_LENGTH: u32 = 3;

/// Lazy iterator over all 3-letter keys of an alphabet, in lexicographic order
/// of the alphabet's own letter order
///
/// The sequence is finite (`k³` keys for `k` letters) and deterministic;
/// constructing a new value restarts it from the first key.
#[derive(Debug, Clone)]
pub struct QueryKeys {
    letters: Vec<char>,
    next: usize,
    total: usize,
}

impl QueryKeys {
    /// Creates an enumerator over the given alphabet
    pub fn new(alphabet: &str) -> Self {
        let letters: Vec<char> = alphabet.chars().collect();
        let total = letters.len().pow(KEY_LENGTH);
        Self {
            letters,
            next: 0,
            total,
        }
    }

    /// Total number of keys in the sequence
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for QueryKeys {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }

        let k = self.letters.len();
        let index = self.next;
        self.next += 1;

        let outer = self.letters[index / (k * k)];
        let middle = self.letters[(index / k) % k];
        let inner = self.letters[index % k];
        Some([outer, middle, inner].iter().collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for QueryKeys {}
