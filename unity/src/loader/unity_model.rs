use std::io::Read;

use tracing::debug;

use super::{LoadError, ModelLoader};
use crate::{
    allocator::{AllocError, DryRunAllocator, TensorAllocator},
    config::{HparamsReader, UnityHparams},
    graph::{
        BuildContext, GraphError, TransformerDecoder, TransformerDecoderLayer,
        dimension,
    },
    parameters::{ParameterPath, TensorRegistry},
};

const TEXT_DECODER: &str = "text_decoder";

struct DecoderShape {
    num_layers: usize,
    model_dim: usize,
    num_heads: usize,
}

impl DecoderShape {
    fn from_hparams(hparams: &UnityHparams) -> Result<Self, GraphError> {
        let nllb = &hparams.nllb_config;
        Ok(Self {
            num_layers: dimension(
                "nllb_config__num_decoder_layers",
                nllb.num_decoder_layers,
            )?,
            model_dim: dimension("nllb_config__model_dim", nllb.model_dim)?,
            num_heads: dimension(
                "nllb_config__num_decoder_attn_heads",
                nllb.num_decoder_attn_heads,
            )?,
        })
    }
}

/// Headroom added on top of the dry-run size.
pub const CONTEXT_SLACK: usize = 1 << 20;

/// Tensors of a UnitY model. Only the text decoder is materialized; the
/// speech encoder, adaptor and text-to-unit branches are parsed from the
/// header but have no tensors yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnityArch {
    pub text_decoder: TransformerDecoder,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnityModelLoader;

impl ModelLoader for UnityModelLoader {
    type Hparams = UnityHparams;
    type Arch = UnityArch;

    fn load_hparams<R: Read>(
        &self,
        reader: &mut HparamsReader<R>,
    ) -> Result<UnityHparams, LoadError> {
        let hparams = UnityHparams::from_reader(reader)?;
        debug!(
            model_dim = hparams.nllb_config.model_dim,
            num_decoder_layers = hparams.nllb_config.num_decoder_layers,
            num_decoder_attn_heads = hparams.nllb_config.num_decoder_attn_heads,
            "read unity hparams"
        );
        hparams.validate()?;
        Ok(hparams)
    }

    /// Dry-runs a single decoder layer and scales it by the layer count.
    /// Every tensor is padded on its own, so all layers occupy the same
    /// number of bytes and the product is exact.
    fn compute_context_size(
        &self,
        hparams: &UnityHparams,
    ) -> Result<usize, LoadError> {
        let shape = DecoderShape::from_hparams(hparams)?;

        let mut allocator = DryRunAllocator::new();
        let mut registry = TensorRegistry::new();
        let mut context = BuildContext::new(&mut allocator, &mut registry);
        TransformerDecoderLayer::init(
            &mut context,
            &ParameterPath::new(TEXT_DECODER).subtree("layers.0"),
            shape.model_dim,
            shape.num_heads,
        )?;
        let layer_size = allocator.active_memory();
        debug!(layer_size, num_layers = shape.num_layers, "sized decoder layer");

        layer_size
            .checked_mul(shape.num_layers)
            .and_then(|size| size.checked_add(CONTEXT_SLACK))
            .ok_or_else(|| {
                AllocError::SizeOverflow {
                    label: TEXT_DECODER.to_string(),
                }
                .into()
            })
    }

    fn tensors_alloc<A: TensorAllocator>(
        &self,
        hparams: &UnityHparams,
        context: &mut BuildContext<'_, A>,
    ) -> Result<UnityArch, LoadError> {
        let shape = DecoderShape::from_hparams(hparams)?;
        let text_decoder = TransformerDecoder::init(
            context,
            &ParameterPath::new(TEXT_DECODER),
            shape.num_layers,
            shape.model_dim,
            shape.num_heads,
        )?;
        Ok(UnityArch {
            text_decoder,
        })
    }
}
