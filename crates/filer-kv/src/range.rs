use std::ops::Bound;

/// Exclusive upper bound of every key starting with `prefix`, or `None`
/// when the prefix is empty or all `0xFF` and the scan runs to the end.
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xFF {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// A contiguous interval of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub begin: Bound<Vec<u8>>,
    pub end: Bound<Vec<u8>>,
}

impl KeyRange {
    /// Every key that starts with `prefix`.
    pub fn prefix(prefix: &[u8]) -> Self {
        Self {
            begin: Bound::Included(prefix.to_vec()),
            end: prefix_end(prefix).map_or(Bound::Unbounded, Bound::Excluded),
        }
    }

    /// Move the lower bound to `key`, keeping the upper bound.
    pub fn starting_at(mut self, key: Vec<u8>, inclusive: bool) -> Self {
        self.begin = if inclusive {
            Bound::Included(key)
        } else {
            Bound::Excluded(key)
        };
        self
    }

    /// Whether no key can fall in the interval.
    pub fn is_empty(&self) -> bool {
        match (&self.begin, &self.end) {
            (Bound::Included(b), Bound::Included(e)) => b > e,
            (Bound::Included(b) | Bound::Excluded(b), Bound::Excluded(e))
            | (Bound::Excluded(b), Bound::Included(e)) => b >= e,
            _ => false,
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        let above = match &self.begin {
            Bound::Included(b) => key >= b.as_slice(),
            Bound::Excluded(b) => key > b.as_slice(),
            Bound::Unbounded => true,
        };
        let below = match &self.end {
            Bound::Included(e) => key <= e.as_slice(),
            Bound::Excluded(e) => key < e.as_slice(),
            Bound::Unbounded => true,
        };
        above && below
    }

    /// Borrowed bounds, as accepted by `BTreeMap::range`.
    pub fn bounds(&self) -> (Bound<&[u8]>, Bound<&[u8]>) {
        (as_slice_bound(&self.begin), as_slice_bound(&self.end))
    }
}

fn as_slice_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_slice()),
        Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Key/value pairs of one scan in key order.
#[derive(Debug, Default)]
pub struct RangePage {
    pub entries: Vec<(Vec<u8>, Vec<u8>)>,
    /// More keys remain in the range past the limit.
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_end() {
        assert_eq!(prefix_end(b"\x01/a\0"), Some(b"\x01/a\x01".to_vec()));
        assert_eq!(prefix_end(b"a\xff"), Some(b"b".to_vec()));
        assert_eq!(prefix_end(b"\xff\xff"), None);
        assert_eq!(prefix_end(b""), None);
    }

    #[test]
    fn test_prefix_range_contains() {
        let range = KeyRange::prefix(b"d/");
        assert!(range.contains(b"d/"));
        assert!(range.contains(b"d/x"));
        assert!(!range.contains(b"d0"));
        assert!(!range.contains(b"c"));
        assert!(KeyRange::prefix(b"\xff").contains(b"\xff\xff\x01"));
    }

    #[test]
    fn test_starting_at() {
        let range = KeyRange::prefix(b"d/").starting_at(b"d/b".to_vec(), false);
        assert!(!range.contains(b"d/b"));
        assert!(range.contains(b"d/c"));
        assert!(!range.is_empty());

        let past = KeyRange::prefix(b"d/").starting_at(b"d0".to_vec(), true);
        assert!(past.is_empty());
    }
}
