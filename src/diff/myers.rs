//! Myers' O(ND) line diff and unified hunk rendering

use std::fmt::Display;
use std::ops::{Index, IndexMut, Range};

/// Number of unchanged lines shown around each change
pub const HUNK_CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit<'a> {
    Equal(&'a str),
    Delete(&'a str),
    Insert(&'a str),
}

impl Edit<'_> {
    pub fn is_change(&self) -> bool {
        !matches!(self, Edit::Equal(_))
    }
}

impl Display for Edit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edit::Equal(line) => write!(f, " {line}"),
            Edit::Delete(line) => write!(f, "-{line}"),
            Edit::Insert(line) => write!(f, "+{line}"),
        }
    }
}

/// Shortest edit script between two line sequences
///
/// Uses the linear-space variant of Myers' algorithm: the middle snake of the
/// remaining range is located with a forward and a backward search, and both
/// halves are solved recursively. Memory stays proportional to `N + M`.
#[derive(Debug, Clone, Copy)]
pub struct MyersDiff<'d> {
    a: &'d [&'d str],
    b: &'d [&'d str],
}

impl<'d> MyersDiff<'d> {
    pub fn new(a: &'d [&'d str], b: &'d [&'d str]) -> Self {
        Self { a, b }
    }

    /// Computes the edit script. Within a run of changes, deletions come
    /// before insertions.
    pub fn diff(&self) -> Vec<Edit<'d>> {
        let bound = max_d(self.a.len(), self.b.len());
        let mut search = SnakeSearch {
            a: self.a,
            b: self.b,
            forward: Diagonals::new(bound),
            backward: Diagonals::new(bound),
            edits: Vec::with_capacity(self.a.len() + self.b.len()),
        };
        search.conquer(0..self.a.len(), 0..self.b.len());
        deletions_first(search.edits)
    }
}

/// Upper bound on the number of rounds either search direction needs
fn max_d(n: usize, m: usize) -> usize {
    (n + m).div_ceil(2) + 1
}

fn common_prefix(a: &[&str], b: &[&str]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[&str], b: &[&str]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Furthest x reached on each diagonal `k`, addressable with negative `k`
struct Diagonals {
    offset: isize,
    v: Vec<usize>,
}

impl Diagonals {
    fn new(bound: usize) -> Self {
        Self {
            offset: bound as isize,
            v: vec![0; 2 * bound + 1],
        }
    }
}

impl Index<isize> for Diagonals {
    type Output = usize;

    fn index(&self, k: isize) -> &usize {
        &self.v[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for Diagonals {
    fn index_mut(&mut self, k: isize) -> &mut usize {
        &mut self.v[(k + self.offset) as usize]
    }
}

struct SnakeSearch<'d> {
    a: &'d [&'d str],
    b: &'d [&'d str],
    forward: Diagonals,
    backward: Diagonals,
    edits: Vec<Edit<'d>>,
}

impl<'d> SnakeSearch<'d> {
    fn conquer(&mut self, mut a: Range<usize>, mut b: Range<usize>) {
        let (old, new) = (self.a, self.b);

        let prefix = common_prefix(&old[a.clone()], &new[b.clone()]);
        self.edits
            .extend(old[a.start..a.start + prefix].iter().copied().map(Edit::Equal));
        a.start += prefix;
        b.start += prefix;

        let suffix = common_suffix(&old[a.clone()], &new[b.clone()]);
        a.end -= suffix;
        b.end -= suffix;

        if a.is_empty() {
            self.edits.extend(new[b.clone()].iter().copied().map(Edit::Insert));
        } else if b.is_empty() {
            self.edits.extend(old[a.clone()].iter().copied().map(Edit::Delete));
        } else if let Some((x, y)) = self.middle_snake(a.clone(), b.clone()) {
            self.conquer(a.start..x, b.start..y);
            self.conquer(x..a.end, y..b.end);
        } else {
            self.edits.extend(old[a.clone()].iter().copied().map(Edit::Delete));
            self.edits.extend(new[b.clone()].iter().copied().map(Edit::Insert));
        }

        self.edits
            .extend(old[a.end..a.end + suffix].iter().copied().map(Edit::Equal));
    }

    /// Returns the point where the forward and backward searches overlap, in
    /// absolute coordinates. Both ranges must be non-empty.
    fn middle_snake(&mut self, a: Range<usize>, b: Range<usize>) -> Option<(usize, usize)> {
        let old = &self.a[a.clone()];
        let new = &self.b[b.clone()];
        let (n, m) = (old.len(), new.len());
        let delta = n as isize - m as isize;
        let odd = delta & 1 == 1;
        let (vf, vb) = (&mut self.forward, &mut self.backward);

        vf[1] = 0;
        vb[1] = 0;

        for d in 0..max_d(n, m) as isize {
            for k in (-d..=d).rev().step_by(2) {
                // k == -d can only be reached by an insertion, k == d only by a deletion
                let mut x = if k == -d || (k != d && vf[k - 1] < vf[k + 1]) {
                    vf[k + 1]
                } else {
                    vf[k - 1] + 1
                };
                let y = (x as isize - k) as usize;
                let (x0, y0) = (x, y);

                if x < n && y < m {
                    x += common_prefix(&old[x..], &new[y..]);
                }
                vf[k] = x;

                if odd && (k - delta).abs() < d && vf[k] + vb[delta - k] >= n {
                    return Some((a.start + x0, b.start + y0));
                }
            }

            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && vb[k - 1] < vb[k + 1]) {
                    vb[k + 1]
                } else {
                    vb[k - 1] + 1
                };
                let mut y = (x as isize - k) as usize;

                if x < n && y < m {
                    let shared = common_suffix(&old[..n - x], &new[..m - y]);
                    x += shared;
                    y += shared;
                }
                vb[k] = x;

                if !odd && (k - delta).abs() <= d && vb[k] + vf[delta - k] >= n {
                    return Some((a.start + n - x, b.start + m - y));
                }
            }
        }

        None
    }
}

/// Reorders every run of changes so its deletions precede its insertions
fn deletions_first(edits: Vec<Edit<'_>>) -> Vec<Edit<'_>> {
    let mut ordered = Vec::with_capacity(edits.len());
    let mut inserts = Vec::new();
    for edit in edits {
        match edit {
            Edit::Delete(_) => ordered.push(edit),
            Edit::Insert(_) => inserts.push(edit),
            Edit::Equal(_) => {
                ordered.append(&mut inserts);
                ordered.push(edit);
            }
        }
    }
    ordered.append(&mut inserts);
    ordered
}

/// A group of nearby changes with their surrounding context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk<'a> {
    /// Zero-based index of the first old line covered by the hunk
    a_start: usize,
    /// Zero-based index of the first new line covered by the hunk
    b_start: usize,
    edits: Vec<Edit<'a>>,
}

impl<'a> Hunk<'a> {
    /// Groups an edit script into hunks. Changes separated by at most
    /// `2 * context` unchanged lines share one hunk.
    pub fn build(edits: &[Edit<'a>], context: usize) -> Vec<Hunk<'a>> {
        let mut positions = Vec::with_capacity(edits.len());
        let (mut a_pos, mut b_pos) = (0, 0);
        for edit in edits {
            positions.push((a_pos, b_pos));
            match edit {
                Edit::Equal(_) => {
                    a_pos += 1;
                    b_pos += 1;
                }
                Edit::Delete(_) => a_pos += 1,
                Edit::Insert(_) => b_pos += 1,
            }
        }

        let mut changes = edits
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_change())
            .map(|(i, _)| i)
            .peekable();

        let mut hunks = Vec::new();
        while let Some(first) = changes.next() {
            let mut last = first;
            while let Some(&next) = changes.peek() {
                if next - last - 1 > 2 * context {
                    break;
                }
                last = next;
                changes.next();
            }

            let start = first.saturating_sub(context);
            let end = (last + 1 + context).min(edits.len());
            let (a_start, b_start) = positions[start];

            hunks.push(Hunk {
                a_start,
                b_start,
                edits: edits[start..end].to_vec(),
            });
        }

        hunks
    }

    pub fn a_size(&self) -> usize {
        self.edits
            .iter()
            .filter(|e| !matches!(e, Edit::Insert(_)))
            .count()
    }

    pub fn b_size(&self) -> usize {
        self.edits
            .iter()
            .filter(|e| !matches!(e, Edit::Delete(_)))
            .count()
    }

    pub fn edits(&self) -> &[Edit<'a>] {
        &self.edits
    }

    /// `@@ -a_start,a_size +b_start,b_size @@` with unified-format range rules
    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            format_range(self.a_start, self.a_size()),
            format_range(self.b_start, self.b_size())
        )
    }
}

/// An empty range is reported as starting at the line before it; a single line
/// omits the length.
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

/// Renders a unified diff between two line sequences.
///
/// Returns an empty vector when the sequences are equal; otherwise the two file
/// header lines followed by every hunk.
pub fn unified_diff(from_file: &str, to_file: &str, a: &[&str], b: &[&str]) -> Vec<String> {
    let edits = MyersDiff::new(a, b).diff();
    let hunks = Hunk::build(&edits, HUNK_CONTEXT);
    if hunks.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!("--- {from_file}"), format!("+++ {to_file}")];
    for hunk in &hunks {
        lines.push(hunk.header());
        lines.extend(hunk.edits().iter().map(ToString::to_string));
    }
    lines
}
