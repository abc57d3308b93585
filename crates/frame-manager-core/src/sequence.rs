//! Deterministic ordering and capacity-bounded sequence assignment.
//!
//! Records with pose epoch seconds come first (by seconds), then the rest by
//! modification time; ties break on the source path so the order is total.
//! Position `p` (1-based) lands in sequence `ceil(p / cap)` at frame
//! `((p - 1) mod cap) + 1`.

use std::cmp::Ordering;
use std::num::NonZeroUsize;

use crate::record::FusedRecord;
use crate::token::Token;

/// Default sequence capacity.
pub const DEFAULT_MAX_PER_SEQUENCE: NonZeroUsize = match NonZeroUsize::new(2000) {
    Some(cap) => cap,
    None => unreachable!(),
};

/// Where one record lands inside its acquisition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SequenceSlot {
    /// 1-based sequence number.
    pub sequence_index: usize,
    /// `S001`, `S002`, ...
    pub sequence_id: String,
    /// 1-based rank inside the sequence.
    pub frame_index: usize,
    /// `frame_index` zero-padded to six digits.
    pub frame_id: String,
}

impl SequenceSlot {
    pub fn for_position(position: usize, max_per_seq: NonZeroUsize) -> Self {
        debug_assert!(position >= 1, "positions are 1-based");
        let cap = max_per_seq.get();
        let zero_based = position.saturating_sub(1);
        let sequence_index = zero_based / cap + 1;
        let frame_index = zero_based % cap + 1;
        Self {
            sequence_index,
            sequence_id: format!("S{sequence_index:03}"),
            frame_index,
            frame_id: format!("{frame_index:06}"),
        }
    }
}

/// A record with its slot, in assignment order.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignedFrame {
    pub slot: SequenceSlot,
    pub record: FusedRecord,
}

/// Total order used for assignment.
pub fn compare_records(a: &FusedRecord, b: &FusedRecord) -> Ordering {
    let primary = match (a.pose_seconds(), b.pose_seconds()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.mtime.cmp(&b.mtime),
    };
    primary.then_with(|| a.src.cmp(&b.src))
}

/// Sort `records` and give each its sequence slot.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip_all, fields(records = records.len()))
)]
pub fn assign_sequences(
    mut records: Vec<FusedRecord>,
    max_per_seq: NonZeroUsize,
) -> Vec<AssignedFrame> {
    records.sort_by(compare_records);
    records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| AssignedFrame {
            slot: SequenceSlot::for_position(idx + 1, max_per_seq),
            record,
        })
        .collect()
}

/// `{acquisition_id}_{sequence_id}_{sensor_id}_{frame_id}`.
pub fn naming_key(acquisition_id: &str, slot: &SequenceSlot, sensor_id: &Token) -> String {
    format!(
        "{acquisition_id}_{}_{sensor_id}_{}",
        slot.sequence_id, slot.frame_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DerivedMetadata;
    use crate::record::PoseRecord;
    use std::collections::{BTreeMap, HashSet};
    use std::path::PathBuf;
    use std::time::{Duration, UNIX_EPOCH};

    fn record(path: &str, mtime: u64, seconds: Option<f64>) -> FusedRecord {
        FusedRecord {
            src: PathBuf::from(path),
            ext: ".jpg".into(),
            original_name: path.into(),
            acquisition_date: "20240501".into(),
            derived: DerivedMetadata::default(),
            mtime: UNIX_EPOCH + Duration::from_secs(mtime),
            pose: seconds.map(|s| PoseRecord {
                file_name: path.into(),
                gps_seconds: Some(s),
                ..PoseRecord::default()
            }),
        }
    }

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn slot_formulas() {
        let slot = SequenceSlot::for_position(1, cap(2));
        assert_eq!((slot.sequence_id.as_str(), slot.frame_index), ("S001", 1));
        let slot = SequenceSlot::for_position(2, cap(2));
        assert_eq!((slot.sequence_id.as_str(), slot.frame_id.as_str()), ("S001", "000002"));
        let slot = SequenceSlot::for_position(3, cap(2));
        assert_eq!((slot.sequence_id.as_str(), slot.frame_index), ("S002", 1));
        let slot = SequenceSlot::for_position(4001, DEFAULT_MAX_PER_SEQUENCE);
        assert_eq!((slot.sequence_index, slot.frame_index), (3, 1));
    }

    #[test]
    fn pose_timed_records_sort_first_then_mtime_then_path() {
        let records = vec![
            record("/r/d.jpg", 1, None),
            record("/r/c.jpg", 100, Some(20.0)),
            record("/r/b.jpg", 0, None),
            record("/r/a.jpg", 1, None),
            record("/r/e.jpg", 0, Some(10.0)),
        ];
        let frames = assign_sequences(records, cap(10));
        let order: Vec<_> = frames
            .iter()
            .map(|f| f.record.src.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            order,
            ["/r/e.jpg", "/r/c.jpg", "/r/b.jpg", "/r/a.jpg", "/r/d.jpg"]
        );
    }

    #[test]
    fn sequences_are_full_except_the_last() {
        let records: Vec<_> = (0..23)
            .map(|i| record(&format!("/r/{i:03}.jpg"), i, None))
            .collect();
        let frames = assign_sequences(records, cap(5));
        let mut sizes: BTreeMap<String, usize> = BTreeMap::new();
        for frame in &frames {
            assert!(frame.slot.frame_index >= 1 && frame.slot.frame_index <= 5);
            *sizes.entry(frame.slot.sequence_id.clone()).or_default() += 1;
        }
        let sizes: Vec<_> = sizes.into_values().collect();
        assert_eq!(sizes, [5, 5, 5, 5, 3]);

        for window in frames.windows(2) {
            let (a, b) = (&window[0].slot, &window[1].slot);
            if a.sequence_id == b.sequence_id {
                assert_eq!(b.frame_index, a.frame_index + 1);
            } else {
                assert_eq!(b.frame_index, 1);
            }
        }
    }

    #[test]
    fn assignment_ignores_input_order() {
        let make = || {
            vec![
                record("/r/x.jpg", 5, None),
                record("/r/y.jpg", 5, None),
                record("/r/z.jpg", 5, Some(3.0)),
                record("/r/w.jpg", 2, None),
            ]
        };
        let forward = assign_sequences(make(), cap(2));
        let mut reversed_input = make();
        reversed_input.reverse();
        let reversed = assign_sequences(reversed_input, cap(2));
        assert_eq!(forward, reversed);
    }

    #[test]
    fn naming_keys_are_unique() {
        let sensor = Token::parse("CamFront", "Sensor ID").unwrap();
        let keys: HashSet<_> = (1..=7)
            .map(|p| naming_key("20240501-Nyon", &SequenceSlot::for_position(p, cap(3)), &sensor))
            .collect();
        assert_eq!(keys.len(), 7);
        assert!(keys.contains("20240501-Nyon_S003_CamFront_000001"));
    }
}
