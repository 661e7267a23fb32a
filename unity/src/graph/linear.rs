use super::{BuildContext, GraphError};
use crate::{
    allocator::{TensorAllocator, TensorId},
    parameters::ParameterPath,
};

/// Affine projection; the weight is stored `[output_dim, input_dim]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linear {
    pub weight: TensorId,
    pub bias: Option<TensorId>,
    pub input_dim: usize,
    pub output_dim: usize,
}

impl Linear {
    pub fn init<A: TensorAllocator>(
        context: &mut BuildContext<'_, A>,
        path: &ParameterPath,
        input_dim: usize,
        output_dim: usize,
        has_bias: bool,
    ) -> Result<Self, GraphError> {
        let weight =
            context.new_tensor(path, "weight", &[output_dim, input_dim])?;
        let bias = if has_bias {
            Some(context.new_tensor(path, "bias", &[output_dim])?)
        } else {
            None
        };
        Ok(Self {
            weight,
            bias,
            input_dim,
            output_dim,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DataType,
        allocator::ArenaAllocator,
        parameters::TensorRegistry,
    };

    #[test]
    fn test_linear_shapes() {
        let mut arena = ArenaAllocator::new(1 << 12).unwrap();
        let mut registry = TensorRegistry::new();
        let mut context = BuildContext::new(&mut arena, &mut registry);

        let path = ParameterPath::new("proj");
        let linear = Linear::init(&mut context, &path, 8, 16, true).unwrap();
        let no_bias = Linear::init(
            &mut context,
            &ParameterPath::new("other"),
            8,
            16,
            false,
        )
        .unwrap();

        assert!(no_bias.bias.is_none());
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("proj.weight").unwrap(), linear.weight);
        assert_eq!(registry.get("proj.bias").ok(), linear.bias);

        let weight = arena.info(linear.weight).unwrap();
        assert_eq!(&*weight.shape, &[16usize, 8]);
        assert_eq!(weight.data_type, DataType::F32);
        let bias = arena.info(linear.bias.unwrap()).unwrap();
        assert_eq!(&*bias.shape, &[16usize]);
    }
}
