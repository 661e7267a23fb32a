use tracing::debug;

use super::{BuildContext, GraphError, LayerNorm, MultiheadAttention};
use crate::{allocator::TensorAllocator, parameters::ParameterPath};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformerDecoderLayer {
    pub self_attn: MultiheadAttention,
    pub self_attn_norm: LayerNorm,
}

impl TransformerDecoderLayer {
    pub fn init<A: TensorAllocator>(
        context: &mut BuildContext<'_, A>,
        path: &ParameterPath,
        model_dim: usize,
        num_heads: usize,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            self_attn: MultiheadAttention::init(
                context,
                &path.subtree("self_attn"),
                model_dim,
                num_heads,
            )?,
            self_attn_norm: LayerNorm::init(
                context,
                &path.subtree("self_attn_norm"),
                model_dim,
            )?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformerDecoder {
    pub layers: Vec<TransformerDecoderLayer>,
}

impl TransformerDecoder {
    /// Builds `num_layers` layers under `path.layers.{index}`, in ascending
    /// index order.
    pub fn init<A: TensorAllocator>(
        context: &mut BuildContext<'_, A>,
        path: &ParameterPath,
        num_layers: usize,
        model_dim: usize,
        num_heads: usize,
    ) -> Result<Self, GraphError> {
        let layers = (0..num_layers)
            .map(|layer_index| {
                let layer_path = path.subtree(&format!("layers.{layer_index}"));
                debug!(prefix = layer_path.as_str(), "building decoder layer");
                TransformerDecoderLayer::init(
                    context,
                    &layer_path,
                    model_dim,
                    num_heads,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            layers,
        })
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}
