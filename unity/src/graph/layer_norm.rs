use super::{BuildContext, GraphError};
use crate::{
    allocator::{TensorAllocator, TensorId},
    parameters::ParameterPath,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerNorm {
    pub weight: TensorId,
    pub bias: TensorId,
    pub dim: usize,
}

impl LayerNorm {
    pub fn init<A: TensorAllocator>(
        context: &mut BuildContext<'_, A>,
        path: &ParameterPath,
        dim: usize,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            weight: context.new_tensor(path, "weight", &[dim])?,
            bias: context.new_tensor(path, "bias", &[dim])?,
            dim,
        })
    }
}
