//! Feature schema and categorical encoding vocabulary.
//!
//! The schema is established once by the training set and saved with the
//! model. Its `version` is a fingerprint of the ordered feature names, so a
//! retrain that adds or reorders columns yields a new version.

use super::feature_registry::{CATEGORICAL_FEATURES, indicator_column};
use crate::domain::errors::DemandError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashSet};

/// Observed levels of one categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoding {
    pub field: String,
    /// Sorted, deduplicated. The first entry is the dropped reference level.
    pub levels: Vec<String>,
}

impl CategoricalEncoding {
    pub fn from_levels<'a>(field: &str, levels: impl IntoIterator<Item = &'a str>) -> Self {
        let sorted: BTreeSet<&str> = levels.into_iter().collect();
        Self {
            field: field.to_string(),
            levels: sorted.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn reference_level(&self) -> Option<&str> {
        self.levels.first().map(String::as_str)
    }

    /// Indicator columns for every level except the reference one.
    pub fn indicator_columns(&self) -> Vec<String> {
        self.levels
            .iter()
            .skip(1)
            .map(|level| indicator_column(&self.field, level))
            .collect()
    }

    pub fn contains(&self, level: &str) -> bool {
        self.levels
            .binary_search_by(|l| l.as_str().cmp(level))
            .is_ok()
    }
}

/// Category → indicator columns mapping for every categorical field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingVocabulary {
    pub fields: Vec<CategoricalEncoding>,
}

impl EncodingVocabulary {
    pub fn field(&self, name: &str) -> Option<&CategoricalEncoding> {
        self.fields.iter().find(|f| f.field == name)
    }

    pub fn indicator_columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(CategoricalEncoding::indicator_columns)
            .collect()
    }

    /// Returns `(field, level)` pairs the training data never saw.
    /// Such levels are encoded as the reference level (all indicators 0).
    pub fn unknown_levels<'a>(&self, values: [&'a str; 4]) -> Vec<(&'static str, &'a str)> {
        CATEGORICAL_FEATURES
            .iter()
            .zip(values)
            .filter(|(field, level)| {
                self.field(field)
                    .map(|encoding| !encoding.contains(level))
                    .unwrap_or(true)
            })
            .map(|(field, level)| (*field, level))
            .collect()
    }
}

/// Ordered feature names plus the vocabulary that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub features: Vec<String>,
    pub vocabulary: EncodingVocabulary,
    pub version: String,
}

impl FeatureSchema {
    pub fn new(features: Vec<String>, vocabulary: EncodingVocabulary) -> Result<Self, DemandError> {
        validate_feature_names(&features)?;
        let version = fingerprint(&features);
        Ok(Self {
            features,
            vocabulary,
            version,
        })
    }

    /// Re-checks a schema read from disk, including its stored version.
    pub fn validate(&self) -> Result<(), DemandError> {
        validate_feature_names(&self.features)?;
        let expected = fingerprint(&self.features);
        if expected != self.version {
            return Err(DemandError::SchemaMismatch {
                expected,
                actual: self.version.clone(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A feature list must be non-empty, with non-blank and unique names.
pub fn validate_feature_names(features: &[String]) -> Result<(), DemandError> {
    if features.is_empty() {
        return Err(DemandError::InvalidSchema {
            reason: "feature list is empty".to_string(),
        });
    }

    let mut seen = HashSet::with_capacity(features.len());
    for name in features {
        if name.trim().is_empty() {
            return Err(DemandError::InvalidSchema {
                reason: "feature list contains a blank name".to_string(),
            });
        }
        if !seen.insert(name.as_str()) {
            return Err(DemandError::InvalidSchema {
                reason: format!("duplicate feature name '{}'", name),
            });
        }
    }
    Ok(())
}

/// First 16 hex chars of SHA-256 over the newline-joined names.
pub fn fingerprint(features: &[String]) -> String {
    let mut hasher = Sha256::new();
    for name in features {
        hasher.update(name.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encoding_sorts_and_drops_reference() {
        let encoding =
            CategoricalEncoding::from_levels("Region", ["West", "North", "East", "South", "North"]);

        assert_eq!(encoding.levels, names(&["East", "North", "South", "West"]));
        assert_eq!(encoding.reference_level(), Some("East"));
        assert_eq!(
            encoding.indicator_columns(),
            names(&["Region_North", "Region_South", "Region_West"])
        );
        assert!(encoding.contains("South"));
        assert!(!encoding.contains("Central"));
    }

    #[test]
    fn test_unknown_levels() {
        let vocabulary = EncodingVocabulary {
            fields: vec![
                CategoricalEncoding::from_levels("Category", ["Clothing", "Electronics"]),
                CategoricalEncoding::from_levels("Region", ["North", "South"]),
                CategoricalEncoding::from_levels("Weather", ["Sunny"]),
                CategoricalEncoding::from_levels("Season", ["Summer", "Winter"]),
            ],
        };

        let unknown = vocabulary.unknown_levels(["Electronics", "Mars", "Sunny", "Monsoon"]);
        assert_eq!(unknown, vec![("Region", "Mars"), ("Season", "Monsoon")]);
    }

    #[test]
    fn test_schema_rejects_empty_and_duplicates() {
        let empty = FeatureSchema::new(Vec::new(), EncodingVocabulary::default());
        assert_eq!(empty.unwrap_err().kind(), ErrorKind::Schema);

        let dup = FeatureSchema::new(names(&["Price", "Price"]), EncodingVocabulary::default());
        assert!(dup.unwrap_err().to_string().contains("duplicate"));

        let blank = FeatureSchema::new(names(&["Price", " "]), EncodingVocabulary::default());
        assert!(blank.is_err());
    }

    #[test]
    fn test_version_depends_on_order() {
        let plain = |list: &[&str]| FeatureSchema::new(names(list), EncodingVocabulary::default());
        let a = plain(&["Price", "Day"]).unwrap();
        let b = plain(&["Day", "Price"]).unwrap();
        let c = plain(&["Price", "Day"]).unwrap();

        assert_ne!(a.version, b.version);
        assert_eq!(a.version, c.version);
        assert_eq!(a.version.len(), 16);
    }

    #[test]
    fn test_validate_detects_tampered_version() {
        let mut schema =
            FeatureSchema::new(names(&["Price", "Day"]), EncodingVocabulary::default()).unwrap();
        assert!(schema.validate().is_ok());

        schema.features.push("Month".to_string());
        let err = schema.validate().unwrap_err();
        assert!(matches!(err, DemandError::SchemaMismatch { .. }));
    }
}
