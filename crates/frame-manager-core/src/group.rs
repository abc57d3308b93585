//! Partition fused records into acquisitions keyed by `date-region`.

use std::collections::HashMap;

use crate::record::FusedRecord;
use crate::token::Token;

/// Records that share one acquisition id.
#[derive(Clone, Debug, PartialEq)]
pub struct AcquisitionGroup {
    /// `{acquisition_date}-{region}`.
    pub acquisition_id: String,
    pub records: Vec<FusedRecord>,
}

pub fn acquisition_id(acquisition_date: &str, region: &Token) -> String {
    format!("{acquisition_date}-{region}")
}

/// Group records by acquisition id, keeping first-seen group order.
///
/// Record order inside a group follows the input but is not significant;
/// sequence assignment sorts it.
pub fn group_by_acquisition(records: Vec<FusedRecord>, region: &Token) -> Vec<AcquisitionGroup> {
    let mut groups: Vec<AcquisitionGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        let id = acquisition_id(&record.acquisition_date, region);
        let slot = *index.entry(id.clone()).or_insert_with(|| {
            groups.push(AcquisitionGroup {
                acquisition_id: id,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }
    groups
}
