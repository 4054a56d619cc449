//! CSV rows and tract id normalization.

use std::io::Read;

use crate::store::tracts::TRACT_ID_LEN;
use crate::store::CensusTract;

/// Normalize a raw tract id as spreadsheets tend to export it.
///
/// Numeric exports lose the leading zero of the state FIPS code and may gain
/// a decimal suffix, so `6037102107.0` becomes `06037102107`. A blank id
/// stays blank so the store rejects the row instead of inventing a tract.
pub fn normalize_tract_id(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.split('.').next().unwrap_or(raw).trim();
    if raw.is_empty() {
        return String::new();
    }
    format!("{raw:0>width$}", width = TRACT_ID_LEN)
}

/// Parse every record of a CSV source.
///
/// Each row is returned separately so one bad row does not sink the file.
pub fn read_rows<R: Read>(source: R) -> Vec<Result<CensusTract, csv::Error>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source)
        .into_deserialize::<CensusTract>()
        .map(|row| {
            row.map(|mut tract| {
                tract.census_tract = normalize_tract_id(&tract.census_tract);
                tract
            })
        })
        .collect()
}
