pub mod persistence;
pub mod sales_data;

pub use persistence::ArtifactStore;
pub use sales_data::CsvSalesSource;
