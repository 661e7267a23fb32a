use super::{BuildContext, GraphError, Linear};
use crate::{allocator::TensorAllocator, parameters::ParameterPath};

/// Multi-head attention with separate biased query, key, value and output
/// projections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiheadAttention {
    pub q_proj: Linear,
    pub k_proj: Linear,
    pub v_proj: Linear,
    pub output_proj: Linear,
    pub num_heads: usize,
    pub head_dim: usize,
}

impl MultiheadAttention {
    pub fn init<A: TensorAllocator>(
        context: &mut BuildContext<'_, A>,
        path: &ParameterPath,
        model_dim: usize,
        num_heads: usize,
    ) -> Result<Self, GraphError> {
        if num_heads == 0 || model_dim % num_heads != 0 {
            return Err(GraphError::InvalidDimension {
                name: "num_heads",
                value: num_heads as i64,
            });
        }

        let mut projection = |name: &str| {
            Linear::init(context, &path.subtree(name), model_dim, model_dim, true)
        };
        Ok(Self {
            q_proj: projection("q_proj")?,
            k_proj: projection("k_proj")?,
            v_proj: projection("v_proj")?,
            output_proj: projection("output_proj")?,
            num_heads,
            head_dim: model_dim / num_heads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{allocator::DryRunAllocator, parameters::TensorRegistry};

    #[test]
    fn test_attention_registers_four_biased_projections() {
        let mut allocator = DryRunAllocator::new();
        let mut registry = TensorRegistry::new();
        let mut context = BuildContext::new(&mut allocator, &mut registry);

        let attention = MultiheadAttention::init(
            &mut context,
            &ParameterPath::new("self_attn"),
            64,
            4,
        )
        .unwrap();
        assert_eq!(attention.head_dim, 16);

        let keys: Vec<&str> = registry.iter().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            [
                "self_attn.q_proj.weight",
                "self_attn.q_proj.bias",
                "self_attn.k_proj.weight",
                "self_attn.k_proj.bias",
                "self_attn.v_proj.weight",
                "self_attn.v_proj.bias",
                "self_attn.output_proj.weight",
                "self_attn.output_proj.bias",
            ]
        );
    }

    #[test]
    fn test_heads_must_divide_model_dim() {
        let mut allocator = DryRunAllocator::new();
        let mut registry = TensorRegistry::new();
        let mut context = BuildContext::new(&mut allocator, &mut registry);

        let result = MultiheadAttention::init(
            &mut context,
            &ParameterPath::new("self_attn"),
            64,
            5,
        );
        assert!(matches!(result, Err(GraphError::InvalidDimension { .. })));
        assert!(registry.is_empty());
    }
}
