//! Clinical and sampling filters over the recording metadata table.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::types::{Diagnosis, Recording, Uid};

/// Keep recordings whose medication timepoint is allowed for their diagnosis group.
///
/// Case recordings are matched against `case_timepoints`, control recordings
/// against `control_timepoints`. An empty result is valid.
pub fn filter_by_medication<S: AsRef<str>>(
    records: &[Recording],
    case_timepoints: &[S],
    control_timepoints: &[S],
) -> Vec<Recording> {
    let allowed = |set: &[S], label: &str| set.iter().any(|t| t.as_ref() == label);
    let kept: Vec<Recording> = records
        .iter()
        .filter(|record| match record.diagnosis {
            Diagnosis::Case => allowed(case_timepoints, &record.med_timepoint),
            Diagnosis::Control => allowed(control_timepoints, &record.med_timepoint),
        })
        .cloned()
        .collect();
    debug!(
        input = records.len(),
        kept = kept.len(),
        "applied medication timepoint filter"
    );
    kept
}

/// Keep recordings by sample length.
///
/// With both bounds, keeps `lower <= sample_len <= upper`. With either bound
/// missing, the bounds are ignored entirely and only recordings at the modal
/// sample length are kept.
pub fn filter_by_sample_len(
    records: &[Recording],
    lower: Option<usize>,
    upper: Option<usize>,
) -> Vec<Recording> {
    let kept: Vec<Recording> = match (lower, upper) {
        (Some(lower), Some(upper)) => records
            .iter()
            .filter(|record| (lower..=upper).contains(&record.sample_len))
            .cloned()
            .collect(),
        _ => match modal_sample_len(records) {
            Some(mode) => {
                debug!(mode, "falling back to modal sample length");
                records
                    .iter()
                    .filter(|record| record.sample_len == mode)
                    .cloned()
                    .collect()
            }
            None => Vec::new(),
        },
    };
    debug!(
        input = records.len(),
        kept = kept.len(),
        ?lower,
        ?upper,
        "applied sample length filter"
    );
    kept
}

/// Most frequent sample length; ties go to the value seen first.
pub fn modal_sample_len(records: &[Recording]) -> Option<usize> {
    let mut counts: HashMap<usize, (usize, usize)> = HashMap::new();
    for (position, record) in records.iter().enumerate() {
        counts
            .entry(record.sample_len)
            .or_insert((0, position))
            .0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(len, _)| len)
}

/// Uids of the given recordings, ready for `aggregate::filter_by_uids`.
pub fn keep_uids(records: &[Recording]) -> BTreeSet<Uid> {
    records.iter().map(|record| record.uid).collect()
}
