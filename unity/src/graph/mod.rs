//! Tensor graph construction.
//!
//! Every block allocates its parameters through a [`BuildContext`], which
//! pairs the allocator that owns the storage with the registry that names it.
//! Blocks are generic over the allocator, so the same code that fills the
//! arena also drives the dry run used to size it.

mod attention;
mod decoder;
mod layer_norm;
mod linear;

pub use attention::MultiheadAttention;
pub use decoder::{TransformerDecoder, TransformerDecoderLayer};
pub use layer_norm::LayerNorm;
pub use linear::Linear;
use thiserror::Error;
use tracing::trace;

use crate::{
    DataType,
    allocator::{AllocError, TensorAllocator, TensorId},
    parameters::{ParameterPath, RegistryError, TensorRegistry},
};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Alloc(#[from] AllocError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Invalid dimension for {name}: {value}")]
    InvalidDimension {
        name: &'static str,
        value: i64,
    },
}

pub struct BuildContext<'a, A: TensorAllocator> {
    allocator: &'a mut A,
    registry: &'a mut TensorRegistry,
    data_type: DataType,
}

impl<'a, A: TensorAllocator> BuildContext<'a, A> {
    pub fn new(
        allocator: &'a mut A,
        registry: &'a mut TensorRegistry,
    ) -> Self {
        Self {
            allocator,
            registry,
            data_type: DataType::F32,
        }
    }

    pub fn with_data_type(
        mut self,
        data_type: DataType,
    ) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn allocator(&self) -> &A {
        self.allocator
    }

    /// Allocates a tensor and registers it under `path.name`.
    pub fn new_tensor(
        &mut self,
        path: &ParameterPath,
        name: &str,
        shape: &[usize],
    ) -> Result<TensorId, GraphError> {
        let key = path.key(name);
        if self.registry.contains(&key) {
            return Err(RegistryError::DuplicateKey(key).into());
        }
        let id = self.allocator.alloc_tensor(&key, shape, self.data_type)?;
        trace!(key = key.as_str(), ?shape, "registered tensor");
        self.registry.insert(key, id)?;
        Ok(id)
    }
}

/// Converts a checkpoint dimension to `usize`, rejecting negatives.
pub fn dimension(
    name: &'static str,
    value: i64,
) -> Result<usize, GraphError> {
    usize::try_from(value).map_err(|_| GraphError::InvalidDimension {
        name,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{ArenaAllocator, DryRunAllocator};

    #[test]
    fn test_new_tensor_registers_under_full_key() {
        let mut allocator = DryRunAllocator::new();
        let mut registry = TensorRegistry::new();
        let mut context = BuildContext::new(&mut allocator, &mut registry);

        let path = ParameterPath::new("block");
        let id = context.new_tensor(&path, "weight", &[4, 4]).unwrap();
        assert!(matches!(
            context.new_tensor(&path, "weight", &[4, 4]),
            Err(GraphError::Registry(RegistryError::DuplicateKey(_)))
        ));
        assert_eq!(context.allocator().num_tensors(), 1);
        assert_eq!(registry.get("block.weight").unwrap(), id);
    }

    #[test]
    fn test_with_data_type_applies_to_new_tensors() {
        let mut arena = ArenaAllocator::new(1 << 10).unwrap();
        let mut registry = TensorRegistry::new();
        let mut context = BuildContext::new(&mut arena, &mut registry)
            .with_data_type(DataType::F16);

        let norm =
            LayerNorm::init(&mut context, &ParameterPath::new("norm"), 48)
                .unwrap();
        for id in [norm.weight, norm.bias] {
            let info = arena.info(id).unwrap();
            assert_eq!(info.data_type, DataType::F16);
            assert_eq!(info.size, 48 * 2);
        }
        assert_eq!(arena.view::<half::f16>(norm.weight).unwrap().len(), 48);
        assert!(arena.view::<f32>(norm.bias).is_err());
    }

    #[test]
    fn test_dimension_rejects_negative_values() {
        assert_eq!(dimension("model_dim", 512).unwrap(), 512);
        assert!(matches!(
            dimension("model_dim", -1),
            Err(GraphError::InvalidDimension {
                name: "model_dim",
                value: -1
            })
        ));
    }
}
