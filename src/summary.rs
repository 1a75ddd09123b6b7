//! Answers "how fast is each operator around here".

use crate::aggregate::{aggregate, OperatorSummary};
use crate::dataset::{filter, Dataset};
use crate::error::InvalidRegion;
use crate::region::RegionDescriptor;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

/// Per operator speeds of the records in `region`.
///
/// With an allowlist, records of other operators are dropped before
/// aggregating; an empty allowlist is the same as none. An empty result
/// means there is no data in the region, whereas a region that can't be
/// searched at all is an [`InvalidRegion`] error.
pub fn summarize(
    dataset: &Dataset,
    region: &RegionDescriptor,
    operator_allowlist: Option<&BTreeSet<String>>,
) -> Result<Vec<OperatorSummary>, InvalidRegion> {
    let region = region.validate()?;

    let mut matched = filter(dataset, &region);
    let in_region = matched.len();

    if let Some(allowlist) = operator_allowlist.filter(|a| !a.is_empty()) {
        matched.retain(|record| allowlist.contains(&record.operator));
    }
    debug!(
        records = dataset.len(),
        in_region,
        allowed = matched.len(),
        "filtered dataset"
    );

    Ok(aggregate(&matched))
}

/// Fastest average download first, operators without one last.
pub fn sort_by_download_desc(summaries: &mut [OperatorSummary]) {
    summaries.sort_by(|a, b| {
        let by_download = match (a.avg_download, b.avg_download) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_download.then_with(|| a.operator.cmp(&b.operator))
    });
}
