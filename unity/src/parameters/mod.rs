mod path;
mod registry;

pub use path::ParameterPath;
pub use registry::{ParameterTree, RegistryError, TensorRegistry};
