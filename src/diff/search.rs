// Derived from the `SaDiff` search of qbsdiff
// (https://github.com/hucsmn/qbsdiff), copyright hucsmn
// <hucsmn@hotmail.com>, used under the MIT license.
//
// Greedy bsdiff match search over a suffix array of the old data.
//
// Each step finds the next exact match of the new data in the old data
// that differs enough from simply continuing the previous match, then
// splits the gap between the two matches into bytes similar to the end of
// the previous match, literal bytes and bytes similar to the start of the
// next match.

use std::ops::Range;

use suffix_array::SuffixArray;

/// Matches this short or shorter are skipped.
pub const SMALL_MATCH: usize = 12;

/// Minimum number of mismatches against the current alignment before a new
/// match is taken.
const DISMATCH_COUNT: usize = 8;

/// Match length above which the skip over similar suffix bytes is found by
/// binary search.
const LONG_SUFFIX: usize = 256;

/// Raw search step: `diff` bytes combined with old data, `extra` literal
/// bytes, then `seek` relative to the end of the diff region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub diff: usize,
    pub extra: usize,
    pub seek: i64,
}

/// Iterator of controls for one (old, new) pair.
pub struct Search<'a> {
    old: &'a [u8],
    new: &'a [u8],
    sa: SuffixArray<'a>,

    // Previous exact match old[i0..i0 + n0] == new[j0..j0 + n0], preceded by
    // b0 similar bytes.
    i0: usize,
    j0: usize,
    n0: usize,
    b0: usize,
}

impl<'a> Search<'a> {
    pub fn new(old: &'a [u8], new: &'a [u8]) -> Self {
        Self {
            old,
            new,
            sa: SuffixArray::new(old),
            i0: 0,
            j0: 0,
            n0: 0,
            b0: 0,
        }
    }

    /// Next exact match `(i, j, n)` worth switching to, or the end of both
    /// buffers once the new data is exhausted.
    fn search_next(&self) -> Option<(usize, usize, usize)> {
        if self.j0 == self.new.len() && self.b0 == 0 {
            return None;
        }

        let mut j = self.j0 + self.n0;
        let mut k = j;
        let mut m = 0;
        while j < self.new.len().saturating_sub(SMALL_MATCH) {
            let (i, n) = extent(self.sa.search_lcp(&self.new[j..]));

            // Count bytes that still match at the previous alignment.
            while k < j + n {
                let i = self.i0.saturating_add(k - self.j0);
                if i < self.old.len() && self.old[i] == self.new[k] {
                    m += 1;
                }
                k += 1;
            }

            if n == 0 {
                j += 1;
                m = 0;
            } else if m == n || n <= SMALL_MATCH {
                j += n;
                m = 0;
            } else if n <= m + DISMATCH_COUNT {
                // Too similar to the previous alignment. Skip ahead, with a
                // binary search over long matches.
                let next = if n <= LONG_SUFFIX {
                    j + 1
                } else {
                    let mut x = 0;
                    let mut y = n;
                    while x < y {
                        let z = x + (y - x) / 2;
                        let (iz, nz) = extent(self.sa.search_lcp(&self.new[j + z..]));
                        if i + n == iz + nz && j + n == j + z + nz {
                            x = z + 1;
                        } else {
                            y = z;
                        }
                    }
                    j + x.max(1)
                };
                let mut i = self.i0.saturating_add(j - self.j0);
                while j < next {
                    if i < self.old.len() && self.old[i] == self.new[j] {
                        m -= 1;
                    }
                    i += 1;
                    j += 1;
                }
            } else {
                return Some((i, j, n));
            }
        }

        Some((self.old.len(), self.new.len(), 0))
    }

    /// Split the gap before the match at `(i, j)` into `a0` bytes similar to
    /// the end of the previous match and `b` bytes similar to the start of
    /// the next one.
    fn shrink_gap(&self, i: usize, j: usize) -> (usize, usize) {
        let gap = &self.new[self.j0 + self.n0..j];
        let suffix = &self.old[self.i0 + self.n0..];
        let prefix = &self.old[..i];

        let mut a0 = scan_similar(gap.iter(), suffix.iter());
        let mut b = scan_similar(gap.iter().rev(), prefix.iter().rev());

        if a0 + b > gap.len() {
            let n = a0 + b - gap.len();
            let xs = gap[gap.len() - b..a0].iter();
            let ys = suffix[gap.len() - b..a0].iter();
            let zs = prefix[prefix.len() - b..prefix.len() - b + n].iter();

            let i = scan_divide(xs, ys, zs);
            a0 -= n - i;
            b -= i;
        }

        (a0, b)
    }
}

impl Iterator for Search<'_> {
    type Item = Control;

    fn next(&mut self) -> Option<Control> {
        let (i, j, n) = self.search_next()?;
        let (i0, j0, n0, b0) = (self.i0, self.j0, self.n0, self.b0);
        let (a0, b) = self.shrink_gap(i, j);

        //  old: ( b0 | n0 | a0 ) ... ( b | n ...
        //       ^ i0 - b0             ^ i - b
        //  new: ( b0 | n0 | a0 | extra )( b | n ...
        //       ^ j0 - b0               ^ j - b
        let diff = b0 + n0 + a0;
        let extra = (j - b) - (j0 + n0 + a0);
        let seek = (i - b).wrapping_sub(i0 + n0 + a0) as isize as i64;

        self.i0 = i;
        self.j0 = j;
        self.n0 = n;
        self.b0 = b;
        Some(Control { diff, extra, seek })
    }
}

#[inline]
fn extent(range: Range<usize>) -> (usize, usize) {
    (range.start, range.end.saturating_sub(range.start))
}

/// Length of the prefix with the best matched-minus-mismatched score.
fn scan_similar<T: Eq, I: Iterator<Item = T>>(xs: I, ys: I) -> usize {
    let mut best = 0;
    let mut matched = 0;
    let mut max_score = 0isize;

    for (n, eq) in (1..).zip(xs.zip(ys).map(|(x, y)| x == y)) {
        matched += usize::from(eq);
        let score = matched as isize - (n - matched) as isize;
        if score > max_score {
            best = n;
            max_score = score;
        }
    }

    best
}

/// Where an overlap between suffix-similar and prefix-similar bytes is
/// best divided.
fn scan_divide<T: Eq, I: Iterator<Item = T>>(xs: I, ys: I, zs: I) -> usize {
    let mut best = 0;
    let mut y_matched = 0isize;
    let mut z_matched = 0isize;
    let mut max_score = 0isize;

    let eqs = xs.zip(ys).zip(zs).map(|((x, y), z)| (x == y, x == z));
    for (n, (y_eq, z_eq)) in (1..).zip(eqs) {
        y_matched += isize::from(y_eq);
        z_matched += isize::from(z_eq);
        let score = y_matched - z_matched;
        if score > max_score {
            best = n;
            max_score = score;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similar_prefix_scoring() {
        assert_eq!(scan_similar(b"abcd".iter(), b"abcd".iter()), 4);
        assert_eq!(scan_similar(b"abxd".iter(), b"abcd".iter()), 2);
        assert_eq!(scan_similar(b"abxde".iter(), b"abcde".iter()), 5);
        assert_eq!(scan_similar(b"xyzd".iter(), b"abcd".iter()), 0);
        assert_eq!(scan_similar(b"ab".iter(), b"".iter()), 0);
    }

    #[test]
    fn divide_prefers_suffix_matches() {
        // First two bytes match the suffix side, last two the prefix side.
        let xs = b"abcd";
        let ys = b"abzz";
        let zs = b"zzcd";
        assert_eq!(scan_divide(xs.iter(), ys.iter(), zs.iter()), 2);
    }

    #[test]
    fn controls_cover_new_data() {
        let old: Vec<u8> = (0..2000u32).map(|i| (i * 7 % 251) as u8).collect();
        let mut new = old.clone();
        new[1000..1010].copy_from_slice(b"0123456789");
        new.extend_from_slice(b"tail bytes");

        let total: usize = Search::new(&old, &new).map(|c| c.diff + c.extra).sum();
        assert_eq!(total, new.len());
    }

    #[test]
    fn identical_data_is_one_diff() {
        let data: Vec<u8> = (0..100u8).collect();
        let controls: Vec<Control> = Search::new(&data, &data).collect();
        let nonempty: Vec<&Control> = controls.iter().filter(|c| c.diff + c.extra > 0).collect();
        assert_eq!(nonempty.len(), 1);
        assert_eq!(nonempty[0].diff, 100);
        assert_eq!(nonempty[0].extra, 0);
    }
}
