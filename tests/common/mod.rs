//! Shared test data for integration tests

use cellspeed::{Dataset, MeasurementRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const JOHOR_BAHRU: (f64, f64) = (103.7414, 1.4927);

pub const OPERATORS: [&str; 4] = ["Maxis", "Celcom", "Digi", "U Mobile"];

/// Three records: two of "A" in Johor Bahru and one of "B" in Sarawak
pub fn two_operators() -> Dataset {
    Dataset::new(vec![
        MeasurementRecord::at("A", 103.7414, 1.4927).with_download(10.0),
        MeasurementRecord::at("A", 103.75, 1.50).with_download(20.0),
        MeasurementRecord::at("B", 110.0, 5.0).with_download(5.0),
    ])
}

/// Records scattered within about half a degree of Johor Bahru. The download
/// speed of record `i` is `i`, so records can be told apart; some have no
/// upload or latency, and every 50th has no position at all.
pub fn scattered(n: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..n)
        .map(|i| {
            let operator = OPERATORS[rng.gen_range(0..OPERATORS.len())];
            let lon = JOHOR_BAHRU.0 + rng.gen_range(-0.5..0.5);
            let lat = JOHOR_BAHRU.1 + rng.gen_range(-0.5..0.5);
            let mut record = if i % 50 == 0 {
                MeasurementRecord::new(operator, None, Some(lat))
            } else {
                MeasurementRecord::at(operator, lon, lat)
            };
            record.download_speed = Some(i as f64);
            if rng.gen_bool(0.8) {
                record.upload_speed = Some(rng.gen_range(0.0..20_000.0));
            }
            if rng.gen_bool(0.7) {
                record.latency = Some(rng.gen_range(5.0..200.0));
            }
            record
        })
        .collect();
    Dataset::new(records)
}

/// Identifies the records of a `scattered` dataset
pub fn ids(records: &[&MeasurementRecord]) -> Vec<usize> {
    let mut ids: Vec<_> = records
        .iter()
        .map(|r| r.download_speed.unwrap_or(-1.0) as usize)
        .collect();
    ids.sort_unstable();
    ids
}
