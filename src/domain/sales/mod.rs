pub mod types;

pub use types::{PredictionRequest, SalesRecord};
