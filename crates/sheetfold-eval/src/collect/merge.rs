//! Missing-position bookkeeping for paired collection.

use smallvec::SmallVec;

/// Ascending, duplicate-free positions that were skipped during collection.
pub type MissingIndexList = SmallVec<[usize; 8]>;

/// Merge two ascending, duplicate-free lists into their sorted union.
pub fn merge_sorted_dedup(a: &[usize], b: &[usize]) -> MissingIndexList {
    let mut out = MissingIndexList::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (x, y) = (a[i], b[j]);
        if x < y {
            out.push(x);
            i += 1;
        } else if y < x {
            out.push(y);
            j += 1;
        } else {
            out.push(x);
            i += 1;
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Remove the positions listed in `missing` (strictly ascending) from
/// `values`, shifting survivors left in one pass.
///
/// Positions past the end are ignored.
pub fn compact_by_indices<T: Copy>(values: &mut Vec<T>, missing: &[usize]) {
    if missing.is_empty() {
        return;
    }
    debug_assert!(missing.windows(2).all(|w| w[0] < w[1]));
    let mut skip = missing.iter().copied().peekable();
    let mut write = 0;
    for read in 0..values.len() {
        if skip.peek() == Some(&read) {
            skip.next();
            continue;
        }
        values[write] = values[read];
        write += 1;
    }
    values.truncate(write);
}
