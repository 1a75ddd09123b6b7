use crate::dataset::MeasurementRecord;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Speeds of one operator within a region.
///
/// `count` is the number of records of the operator in the region. The
/// averages only look at records that have the value, and are `None` when
/// none of them do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorSummary {
    pub operator: String,
    pub count: usize,
    pub avg_download: Option<f64>,
    pub avg_upload: Option<f64>,
    pub avg_latency: Option<f64>,
}

/// Groups records by operator (exact, case sensitive) and averages each group.
///
/// Rows come out ordered by operator name, and the result does not depend
/// on the order of `records`.
pub fn aggregate(records: &[&MeasurementRecord]) -> Vec<OperatorSummary> {
    let mut groups: BTreeMap<&str, Vec<&MeasurementRecord>> = BTreeMap::new();
    for &record in records {
        groups
            .entry(record.operator.as_str())
            .or_default()
            .push(record);
    }

    groups
        .into_par_iter()
        .map(|(operator, group)| OperatorSummary {
            operator: operator.to_string(),
            count: group.len(),
            avg_download: mean(group.iter().filter_map(|r| r.download_speed)),
            avg_upload: mean(group.iter().filter_map(|r| r.upload_speed)),
            avg_latency: mean(group.iter().filter_map(|r| r.latency)),
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut values: Vec<f64> = values.collect();
    if values.is_empty() {
        return None;
    }
    // float addition isn't associative, sum in a fixed order
    values.sort_by(f64::total_cmp);
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(
        operator: &str,
        download: Option<f64>,
        latency: Option<f64>,
    ) -> MeasurementRecord {
        let mut r = MeasurementRecord::at(operator, 103.7, 1.5);
        r.download_speed = download;
        r.latency = latency;
        r
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_groups_and_means() {
        let records = vec![
            record("A", Some(10.0), Some(30.0)),
            record("A", Some(20.0), Some(50.0)),
            record("B", Some(5.0), None),
        ];
        let refs: Vec<_> = records.iter().collect();
        let result = aggregate(&refs);

        assert_eq!(
            result,
            vec![
                OperatorSummary {
                    operator: "A".to_string(),
                    count: 2,
                    avg_download: Some(15.0),
                    avg_upload: None,
                    avg_latency: Some(40.0),
                },
                OperatorSummary {
                    operator: "B".to_string(),
                    count: 1,
                    avg_download: Some(5.0),
                    avg_upload: None,
                    avg_latency: None,
                },
            ]
        );
    }

    #[test]
    fn test_count_includes_records_without_download() {
        let records = vec![
            record("A", Some(10.0), None),
            record("A", None, Some(20.0)),
            record("A", None, None),
        ];
        let refs: Vec<_> = records.iter().collect();
        let result = aggregate(&refs);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].count, 3);
        assert_eq!(result[0].avg_download, Some(10.0));
        assert_eq!(result[0].avg_latency, Some(20.0));
    }

    #[test]
    fn test_operator_is_case_sensitive() {
        let records = vec![
            record("Maxis", Some(1.0), None),
            record("maxis", Some(3.0), None),
        ];
        let refs: Vec<_> = records.iter().collect();
        let operators: Vec<_> =
            aggregate(&refs).into_iter().map(|s| s.operator).collect();
        assert_eq!(operators, vec!["Maxis", "maxis"]);
    }

    #[test]
    fn test_order_independent() {
        let records: Vec<_> = (0..50)
            .map(|i| {
                let operator = ["A", "B", "C"][i % 3];
                record(operator, Some(0.1 * i as f64), Some(1.0 / (i + 1) as f64))
            })
            .collect();
        let forward: Vec<_> = records.iter().collect();
        let backward: Vec<_> = records.iter().rev().collect();
        assert_eq!(aggregate(&forward), aggregate(&backward));
    }
}
