pub mod certificates;
pub mod data_sources;
pub mod templates;
