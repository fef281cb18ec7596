use crate::domain::errors::DemandError;
use crate::domain::ml::feature_registry::{
    CATEGORICAL_FEATURES, DATE_PART_FEATURES, NUMERIC_FEATURES, Observation, named_features,
    reindex,
};
use crate::domain::ml::feature_schema::{CategoricalEncoding, EncodingVocabulary, FeatureSchema};
use crate::domain::sales::SalesRecord;
use crate::infrastructure::sales_data::CsvSalesSource;
use std::path::Path;
use tracing::info;

/// Dense numeric matrix with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Model-ready training data plus the vocabulary that produced its columns.
#[derive(Debug, Clone)]
pub struct PreprocessedData {
    pub features: FeatureMatrix,
    pub target: Vec<f64>,
    pub vocabulary: EncodingVocabulary,
}

impl PreprocessedData {
    pub fn schema(&self) -> Result<FeatureSchema, DemandError> {
        FeatureSchema::new(self.features.columns.clone(), self.vocabulary.clone())
    }
}

/// Turns raw sales history into `(X, y)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataPreprocessor;

impl DataPreprocessor {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, path: &Path) -> Result<Vec<SalesRecord>, DemandError> {
        CsvSalesSource::new(path).load()
    }

    /// Deterministic encoding of `records`.
    ///
    /// Columns: numeric fields, then Day/Month/Year, then one-hot indicators
    /// per categorical field with the lexicographically first level dropped.
    pub fn clean(&self, records: &[SalesRecord]) -> Result<PreprocessedData, DemandError> {
        if records.is_empty() {
            return Err(DemandError::InsufficientData {
                needed: 1,
                actual: 0,
            });
        }

        let vocabulary = build_vocabulary(records);

        let columns: Vec<String> = NUMERIC_FEATURES
            .iter()
            .chain(DATE_PART_FEATURES)
            .map(|name| name.to_string())
            .chain(vocabulary.indicator_columns())
            .collect();

        let rows: Vec<Vec<f64>> = records
            .iter()
            .map(|record| reindex(&named_features(record), &columns))
            .collect();
        let target: Vec<f64> = records.iter().map(|r| r.units_sold).collect();

        info!(
            "Preprocessed {} records into {} features",
            rows.len(),
            columns.len()
        );

        Ok(PreprocessedData {
            features: FeatureMatrix { columns, rows },
            target,
            vocabulary,
        })
    }
}

fn build_vocabulary(records: &[SalesRecord]) -> EncodingVocabulary {
    let fields = CATEGORICAL_FEATURES
        .iter()
        .enumerate()
        .map(|(index, field)| {
            CategoricalEncoding::from_levels(
                field,
                records.iter().map(|r| r.categorical_values()[index]),
            )
        })
        .collect();
    EncodingVocabulary { fields }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, category: &str, region: &str, units: f64) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2023, 5, day).unwrap(),
            inventory_level: 200.0,
            discount_percent: 10.0,
            price: 25.0,
            promotion: day % 2 == 0,
            category: category.to_string(),
            region: region.to_string(),
            weather: "Sunny".to_string(),
            season: "Summer".to_string(),
            units_sold: units,
        }
    }

    fn sample() -> Vec<SalesRecord> {
        vec![
            record(1, "Groceries", "North", 50.0),
            record(2, "Clothing", "South", 61.0),
            record(3, "Electronics", "North", 72.0),
        ]
    }

    #[test]
    fn test_clean_column_layout() {
        let data = DataPreprocessor::new().clean(&sample()).unwrap();

        assert_eq!(
            data.features.columns,
            vec![
                "Inventory_Level",
                "Discount_Percent",
                "Price",
                "Promotion",
                "Day",
                "Month",
                "Year",
                "Category_Electronics",
                "Category_Groceries",
                "Region_South",
            ]
        );
        assert_eq!(data.target, vec![50.0, 61.0, 72.0]);
    }

    #[test]
    fn test_clean_row_values() {
        let data = DataPreprocessor::new().clean(&sample()).unwrap();

        // Groceries / North / day 1
        assert_eq!(
            data.features.rows[0],
            vec![200.0, 10.0, 25.0, 0.0, 1.0, 5.0, 2023.0, 0.0, 1.0, 0.0]
        );
        // Clothing is the reference category; South is an indicator.
        assert_eq!(
            data.features.rows[1],
            vec![200.0, 10.0, 25.0, 1.0, 2.0, 5.0, 2023.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_single_level_field_produces_no_indicators() {
        let data = DataPreprocessor::new().clean(&sample()).unwrap();
        assert!(data.features.column_index("Weather_Sunny").is_none());
        assert!(data.features.column_index("Season_Summer").is_none());
        assert_eq!(
            data.vocabulary.field("Weather").unwrap().reference_level(),
            Some("Sunny")
        );
    }

    #[test]
    fn test_clean_is_deterministic() {
        let mut shuffled = sample();
        shuffled.reverse();
        let a = DataPreprocessor::new().clean(&sample()).unwrap();
        let b = DataPreprocessor::new().clean(&shuffled).unwrap();
        assert_eq!(a.features.columns, b.features.columns);
        assert_eq!(a.schema().unwrap().version, b.schema().unwrap().version);
    }

    #[test]
    fn test_clean_empty_fails() {
        assert!(DataPreprocessor::new().clean(&[]).is_err());
    }
}
