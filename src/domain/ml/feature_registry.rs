use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// Raw date column, decomposed into `DATE_PART_FEATURES` and then dropped.
pub const DATE_COLUMN: &str = "Date";

/// Regression target.
pub const TARGET_COLUMN: &str = "Units_Sold";

/// Numeric columns copied verbatim into the feature row, in schema order.
pub const NUMERIC_FEATURES: &[&str] =
    &["Inventory_Level", "Discount_Percent", "Price", "Promotion"];

/// Integer features derived from the date column, in schema order.
pub const DATE_PART_FEATURES: &[&str] = &["Day", "Month", "Year"];

/// Categorical columns one-hot encoded after the numeric block, in schema order.
pub const CATEGORICAL_FEATURES: &[&str] = &["Category", "Region", "Weather", "Season"];

/// Common view over a training record and an inference request.
///
/// Training rows and inference rows are both encoded through
/// [`named_features`], so the two sides cannot drift apart.
pub trait Observation {
    /// Values for `NUMERIC_FEATURES`, same order.
    fn numeric_values(&self) -> [f64; 4];

    fn date(&self) -> Option<NaiveDate>;

    /// Raw levels for `CATEGORICAL_FEATURES`, same order.
    fn categorical_values(&self) -> [&str; 4];
}

/// Normalizes a raw column header: trims it and replaces inner spaces with `_`.
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim().replace(' ', "_")
}

/// Name of the one-hot indicator column for `field == level`.
pub fn indicator_column(field: &str, level: &str) -> String {
    format!("{}_{}", field, level)
}

/// Encodes an observation into a sparse name → value map.
///
/// Every categorical level gets an indicator entry, including levels the
/// schema does not know about; reindexing against the trained feature list
/// drops those and fills the missing ones with zero.
pub fn named_features<O: Observation + ?Sized>(observation: &O) -> HashMap<String, f64> {
    let mut named = HashMap::with_capacity(
        NUMERIC_FEATURES.len() + DATE_PART_FEATURES.len() + CATEGORICAL_FEATURES.len(),
    );

    for (name, value) in NUMERIC_FEATURES.iter().zip(observation.numeric_values()) {
        named.insert((*name).to_string(), value);
    }

    if let Some(date) = observation.date() {
        named.insert("Day".to_string(), date.day() as f64);
        named.insert("Month".to_string(), date.month() as f64);
        named.insert("Year".to_string(), date.year() as f64);
    }

    for (field, level) in CATEGORICAL_FEATURES
        .iter()
        .zip(observation.categorical_values())
    {
        named.insert(indicator_column(field, level), 1.0);
    }

    named
}

/// Reorders a sparse row to `feature_names`. Absent names become 0.0,
/// names not listed are ignored.
pub fn reindex(named: &HashMap<String, f64>, feature_names: &[String]) -> Vec<f64> {
    feature_names
        .iter()
        .map(|name| named.get(name).copied().unwrap_or(0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        date: Option<NaiveDate>,
        region: &'static str,
    }

    impl Observation for Fixed {
        fn numeric_values(&self) -> [f64; 4] {
            [120.0, 10.0, 49.5, 1.0]
        }

        fn date(&self) -> Option<NaiveDate> {
            self.date
        }

        fn categorical_values(&self) -> [&str; 4] {
            ["Clothing", self.region, "Rainy", "Winter"]
        }
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("  Units Sold "), "Units_Sold");
        assert_eq!(normalize_column_name("Inventory Level"), "Inventory_Level");
        assert_eq!(normalize_column_name("Price"), "Price");
    }

    #[test]
    fn test_named_features_with_date() {
        let obs = Fixed {
            date: NaiveDate::from_ymd_opt(2023, 7, 14),
            region: "East",
        };
        let named = named_features(&obs);

        assert_eq!(named["Inventory_Level"], 120.0);
        assert_eq!(named["Promotion"], 1.0);
        assert_eq!(named["Day"], 14.0);
        assert_eq!(named["Month"], 7.0);
        assert_eq!(named["Year"], 2023.0);
        assert_eq!(named["Region_East"], 1.0);
        assert_eq!(named["Category_Clothing"], 1.0);
    }

    #[test]
    fn test_named_features_without_date_omits_parts() {
        let obs = Fixed {
            date: None,
            region: "East",
        };
        let named = named_features(&obs);
        assert!(!named.contains_key("Day"));
        assert!(!named.contains_key("Year"));
    }

    #[test]
    fn test_reindex_fills_missing_and_drops_unknown() {
        let obs = Fixed {
            date: None,
            region: "Atlantis",
        };
        let named = named_features(&obs);
        let names: Vec<String> = ["Price", "Day", "Region_North", "Region_West"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let row = reindex(&named, &names);
        assert_eq!(row, vec![49.5, 0.0, 0.0, 0.0]);
    }
}
