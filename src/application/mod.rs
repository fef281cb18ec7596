// Preprocessing, training and inference
pub mod ml;

// Inference boundary for presentation layers
pub mod pricing_service;
