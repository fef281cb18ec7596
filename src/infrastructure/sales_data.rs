//! CSV source for historical sales.

use crate::domain::errors::DemandError;
use crate::domain::ml::feature_registry::{
    CATEGORICAL_FEATURES, DATE_COLUMN, NUMERIC_FEATURES, TARGET_COLUMN, normalize_column_name,
};
use crate::domain::sales::SalesRecord;
use crate::domain::sales::types::{parse_date, parse_flag, parse_number};
use csv::StringRecord;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Column positions of the required fields, resolved from the header row.
struct ColumnMap {
    date: usize,
    numeric: [usize; 4],
    categorical: [usize; 4],
    target: usize,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self, DemandError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DemandError::MissingColumn {
                    column: name.to_string(),
                })
        };

        let mut numeric = [0; 4];
        for (slot, name) in numeric.iter_mut().zip(NUMERIC_FEATURES) {
            *slot = find(*name)?;
        }
        let mut categorical = [0; 4];
        for (slot, name) in categorical.iter_mut().zip(CATEGORICAL_FEATURES) {
            *slot = find(*name)?;
        }

        Ok(Self {
            date: find(DATE_COLUMN)?,
            numeric,
            categorical,
            target: find(TARGET_COLUMN)?,
        })
    }
}

pub struct CsvSalesSource {
    path: PathBuf,
}

impl CsvSalesSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Reads every row. Headers are normalized before lookup; columns
    /// beyond the required set are ignored.
    pub fn load(&self) -> Result<Vec<SalesRecord>, DemandError> {
        let file = File::open(&self.path).map_err(|source| DemandError::Io {
            path: self.path.clone(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| self.malformed(e.to_string()))?
            .iter()
            .map(normalize_column_name)
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(self.malformed("missing header row".to_string()));
        }
        let columns = ColumnMap::resolve(&headers)?;
        debug!("Sales data columns: {:?}", headers);

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result.map_err(|e| self.malformed(e.to_string()))?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let record = parse_row(&row, &columns)
                .map_err(|e| self.malformed(format!("line {}: {}", line, e)))?;
            records.push(record);
        }

        info!("Loaded {} sales records from {:?}", records.len(), self.path);
        Ok(records)
    }

    fn malformed(&self, reason: String) -> DemandError {
        DemandError::MalformedData {
            path: self.path.clone(),
            reason,
        }
    }
}

fn parse_row(row: &StringRecord, columns: &ColumnMap) -> Result<SalesRecord, DemandError> {
    let field = |index: usize| row.get(index).unwrap_or("");

    let [inventory, discount, price, promotion] = columns.numeric;
    let [category, region, weather, season] = columns.categorical;

    Ok(SalesRecord {
        date: parse_date(DATE_COLUMN, field(columns.date))?,
        inventory_level: finite_number(NUMERIC_FEATURES[0], field(inventory))?,
        discount_percent: finite_number(NUMERIC_FEATURES[1], field(discount))?,
        price: finite_number(NUMERIC_FEATURES[2], field(price))?,
        promotion: parse_flag(NUMERIC_FEATURES[3], field(promotion))?,
        category: field(category).to_string(),
        region: field(region).to_string(),
        weather: field(weather).to_string(),
        season: field(season).to_string(),
        units_sold: finite_number(TARGET_COLUMN, field(columns.target))?,
    })
}

/// `NaN` and `inf` parse as floats but are not usable sales data.
fn finite_number(field: &str, raw: &str) -> Result<f64, DemandError> {
    let value = parse_number(field, raw)?;
    if !value.is_finite() {
        return Err(DemandError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a finite number", raw),
        });
    }
    Ok(value)
}
