pub mod column;
pub mod dataset;
pub mod selection;
pub mod template;
