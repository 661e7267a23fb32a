pub mod allocator;
pub mod config;

pub mod data_type;
pub use data_type::{ArrayElement, DataType};

pub mod graph;
pub mod loader;
pub use loader::{LoadError, Model, ModelArch, load_model, load_model_file};
pub mod parameters;
