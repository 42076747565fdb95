//! Collapses tall per-frame matrices into one row (or one block) per uid.
//!
//! Every operation here groups rows explicitly by the trailing uid column, so
//! input rows may arrive in any order. Groups are emitted in ascending uid
//! order and rows inside a group keep their input order.

mod statistics;

use std::collections::{BTreeMap, BTreeSet};

use ndarray::{s, Array2, Axis};
use tracing::debug;

use crate::types::{TallMatrix, Uid};

pub use statistics::Statistic;

/// Row indices of `matrix` grouped by uid.
pub fn group_rows(matrix: &TallMatrix) -> BTreeMap<Uid, Vec<usize>> {
    let mut groups: BTreeMap<Uid, Vec<usize>> = BTreeMap::new();
    for row in 0..matrix.nrows() {
        groups.entry(matrix.uid_at(row)).or_default().push(row);
    }
    groups
}

/// Number of rows (frames) per uid.
pub fn group_sizes(matrix: &TallMatrix) -> BTreeMap<Uid, usize> {
    group_rows(matrix)
        .into_iter()
        .map(|(uid, rows)| (uid, rows.len()))
        .collect()
}

/// Rows whose uid is in `uids`, in their original order.
pub fn filter_by_uids(matrix: &TallMatrix, uids: &BTreeSet<Uid>) -> TallMatrix {
    let rows: Vec<usize> = (0..matrix.nrows())
        .filter(|row| uids.contains(&matrix.uid_at(*row)))
        .collect();
    TallMatrix::from_array_unchecked(matrix.as_array().select(Axis(0), &rows))
}

/// One row per uid holding `statistic` of each feature column.
///
/// Variance and standard deviation of a single-frame group are NaN. With
/// `include_uid` the uid is appended as the last column.
pub fn collapse(matrix: &TallMatrix, statistic: Statistic, include_uid: bool) -> Array2<f64> {
    let groups = group_rows(matrix);
    let features = matrix.features();
    let width = matrix.feature_count() + usize::from(include_uid);
    let mut collapsed = Array2::zeros((groups.len(), width));

    for (out_row, (uid, rows)) in groups.iter().enumerate() {
        let group = features.select(Axis(0), rows);
        let reduced = statistic.reduce(group.view());
        collapsed
            .slice_mut(s![out_row, ..matrix.feature_count()])
            .assign(&reduced);
        if include_uid {
            collapsed[[out_row, width - 1]] = f64::from(*uid);
        }
    }
    debug!(
        groups = groups.len(),
        %statistic,
        "collapsed tall matrix by uid"
    );
    collapsed
}

/// Fixed-width pivot: each uid contributes a (features x T) block of its
/// first T frames, where T is the smallest group size in `matrix`.
///
/// Blocks are stacked vertically in ascending uid order; frames beyond T are
/// dropped. With `include_uid` each output row gets its uid appended.
pub fn invert(matrix: &TallMatrix, include_uid: bool) -> Array2<f64> {
    let groups = group_rows(matrix);
    let truncate = groups.values().map(Vec::len).min().unwrap_or(0);
    let feature_count = matrix.feature_count();
    let features = matrix.features();
    let mut pivot = Array2::zeros((
        groups.len() * feature_count,
        truncate + usize::from(include_uid),
    ));

    for (block, (uid, rows)) in groups.iter().enumerate() {
        let start = block * feature_count;
        let frames = features.select(Axis(0), &rows[..truncate]);
        pivot
            .slice_mut(s![start..start + feature_count, ..truncate])
            .assign(&frames.t());
        if include_uid {
            pivot
                .slice_mut(s![start..start + feature_count, truncate])
                .fill(f64::from(*uid));
        }
    }
    debug!(
        groups = groups.len(),
        truncate,
        "pivoted tall matrix to fixed width"
    );
    pivot
}
