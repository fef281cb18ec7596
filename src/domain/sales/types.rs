use crate::domain::errors::DemandError;
use crate::domain::ml::feature_registry::{Observation, normalize_column_name};
use crate::domain::pricing::PricingInputs;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One historical observation. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub inventory_level: f64,
    pub discount_percent: f64,
    pub price: f64,
    pub promotion: bool,
    pub category: String,
    pub region: String,
    pub weather: String,
    pub season: String,
    pub units_sold: f64,
}

impl Observation for SalesRecord {
    fn numeric_values(&self) -> [f64; 4] {
        [
            self.inventory_level,
            self.discount_percent,
            self.price,
            flag_value(self.promotion),
        ]
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn categorical_values(&self) -> [&str; 4] {
        [
            self.category.as_str(),
            self.region.as_str(),
            self.weather.as_str(),
            self.season.as_str(),
        ]
    }
}

/// Operator-supplied inputs for one forecast. The raw analogue of a
/// `SalesRecord`, without the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub inventory_level: f64,
    pub discount_percent: f64,
    pub price: f64,
    pub promotion: bool,
    pub category: String,
    pub region: String,
    pub weather: String,
    pub season: String,
    /// When absent, Day/Month/Year are fed to the model as 0.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl PredictionRequest {
    /// Builds a request from form-style name/value pairs in any order.
    ///
    /// Names are normalized the same way CSV headers are, so
    /// `"Inventory Level"` and `"Inventory_Level"` are equivalent.
    /// Unrecognized names are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, DemandError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut inventory_level = None;
        let mut discount_percent = None;
        let mut price = None;
        let mut promotion = None;
        let mut category = None;
        let mut region = None;
        let mut weather = None;
        let mut season = None;
        let mut date = None;

        for (key, value) in pairs {
            let name = normalize_column_name(key.as_ref());
            let value = value.as_ref().trim();
            match name.as_str() {
                "Inventory_Level" => inventory_level = Some(parse_number(&name, value)?),
                "Discount_Percent" => discount_percent = Some(parse_number(&name, value)?),
                "Price" => price = Some(parse_number(&name, value)?),
                "Promotion" => promotion = Some(parse_flag(&name, value)?),
                "Category" => category = Some(value.to_string()),
                "Region" => region = Some(value.to_string()),
                "Weather" => weather = Some(value.to_string()),
                "Season" => season = Some(value.to_string()),
                "Date" if !value.is_empty() => date = Some(parse_date(&name, value)?),
                _ => debug!("Ignoring unrecognized request field '{}'", name),
            }
        }

        Ok(Self {
            inventory_level: required("Inventory_Level", inventory_level)?,
            discount_percent: required("Discount_Percent", discount_percent)?,
            price: required("Price", price)?,
            promotion: required("Promotion", promotion)?,
            category: required("Category", category)?,
            region: required("Region", region)?,
            weather: required("Weather", weather)?,
            season: required("Season", season)?,
            date,
        })
    }

    /// Rejects values no operator form should produce.
    pub fn validate(&self) -> Result<(), DemandError> {
        for (field, value) in [
            ("Inventory_Level", self.inventory_level),
            ("Discount_Percent", self.discount_percent),
            ("Price", self.price),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, "must be a finite number"));
            }
        }
        if self.inventory_level < 0.0 {
            return Err(invalid("Inventory_Level", "must not be negative"));
        }
        if !(0.0..=100.0).contains(&self.discount_percent) {
            return Err(invalid("Discount_Percent", "must be within [0, 100]"));
        }
        if self.price <= 0.0 {
            return Err(invalid("Price", "must be positive"));
        }
        Ok(())
    }

    pub fn pricing_inputs(&self) -> PricingInputs {
        PricingInputs {
            inventory: self.inventory_level,
            manual_discount_pct: self.discount_percent,
            base_price: self.price,
        }
    }
}

impl Observation for PredictionRequest {
    fn numeric_values(&self) -> [f64; 4] {
        [
            self.inventory_level,
            self.discount_percent,
            self.price,
            flag_value(self.promotion),
        ]
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn categorical_values(&self) -> [&str; 4] {
        [
            self.category.as_str(),
            self.region.as_str(),
            self.weather.as_str(),
            self.season.as_str(),
        ]
    }
}

fn flag_value(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, DemandError> {
    value.ok_or_else(|| DemandError::MissingColumn {
        column: field.to_string(),
    })
}

fn invalid(field: &str, reason: &str) -> DemandError {
    DemandError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

pub(crate) fn parse_number(field: &str, raw: &str) -> Result<f64, DemandError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| invalid(field, &format!("'{}' is not a number", raw)))
}

/// Accepts `0/1`, `true/false` and `yes/no`, case-insensitive.
pub(crate) fn parse_flag(field: &str, raw: &str) -> Result<bool, DemandError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" => Ok(true),
        "0" | "0.0" | "false" | "no" => Ok(false),
        _ => Err(invalid(field, &format!("'{}' is not a 0/1 flag", raw))),
    }
}

/// Calendar date, with or without a time-of-day part (which is discarded).
pub(crate) fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, DemandError> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| invalid(field, &format!("'{}' is not a calendar date", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;

    fn form() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Inventory Level", "100"),
            ("Discount_Percent", "20"),
            ("Price", "100.0"),
            ("Promotion", "1"),
            ("Category", "Electronics"),
            ("Region", "North"),
            ("Weather", "Sunny"),
            ("Season", "Summer"),
        ]
    }

    #[test]
    fn test_from_pairs_parses_form() {
        let request = PredictionRequest::from_pairs(form()).unwrap();
        assert_eq!(request.inventory_level, 100.0);
        assert_eq!(request.discount_percent, 20.0);
        assert!(request.promotion);
        assert_eq!(request.region, "North");
        assert_eq!(request.date, None);
    }

    #[test]
    fn test_from_pairs_order_does_not_matter() {
        let forward = PredictionRequest::from_pairs(form()).unwrap();
        let mut reversed_pairs = form();
        reversed_pairs.reverse();
        let reversed = PredictionRequest::from_pairs(reversed_pairs).unwrap();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_from_pairs_missing_field() {
        let mut pairs = form();
        pairs.retain(|(k, _)| *k != "Season");
        let err = PredictionRequest::from_pairs(pairs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("Season"));
    }

    #[test]
    fn test_from_pairs_with_date() {
        let mut pairs = form();
        pairs.push(("Date", "2024-03-09"));
        let request = PredictionRequest::from_pairs(pairs).unwrap();
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2024, 3, 9));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut request = PredictionRequest::from_pairs(form()).unwrap();
        assert!(request.validate().is_ok());

        request.discount_percent = 120.0;
        assert_eq!(request.validate().unwrap_err().kind(), ErrorKind::Validation);

        request.discount_percent = 20.0;
        request.price = 0.0;
        assert!(request.validate().is_err());

        request.price = 10.0;
        request.inventory_level = f64::NAN;
        assert!(request.validate().is_err());

        request.inventory_level = 0.0;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_parse_flag_and_date() {
        assert!(parse_flag("Promotion", "TRUE").unwrap());
        assert!(!parse_flag("Promotion", "0").unwrap());
        assert!(parse_flag("Promotion", "maybe").is_err());

        let expected = NaiveDate::from_ymd_opt(2022, 1, 31);
        assert_eq!(parse_date("Date", "2022-01-31").ok(), expected);
        assert_eq!(parse_date("Date", "01/31/2022").ok(), expected);
        assert_eq!(parse_date("Date", "2022-01-31 08:15:00").ok(), expected);
        assert!(parse_date("Date", "yesterday").is_err());
    }
}
