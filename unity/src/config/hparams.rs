use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::{
    error::ConfigError,
    wire::{HparamsError, HparamsReader, HparamsWriter, WireRecord, wire_record},
};

wire_record! {
    /// wav2vec 2.0 / conformer speech encoder.
    #[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
    pub struct W2v2EncoderConfig {
        model_dim: i64 => "model_dim",
        max_seq_len: i64 => "max_seq_len",
        feature_dim: i64 => "feature_dim",
        use_fbank: bool => "use_fbank",
        first_pass_dropout_p: f32 => "first_pass_dropout_p",
        layer_norm_features: bool => "layer_norm_features",
        feature_extractor_bias: bool => "feature_extractor_bias",
        feature_extractor_layer_norm_convs: bool => "feature_extractor_layer_norm_convs",
        feature_grad_scale: f32 => "feature_grad_scale",
        num_fbank_channels: i64 => "num_fbank_channels",
        fbank_stride: i64 => "fbank_stride",
        sample_fbank_every_k: i64 => "sample_fbank_every_k",
        pos_encoder_depth: i64 => "pos_encoder_depth",
        pos_conv_kernel_size: i64 => "pos_conv_kernel_size",
        num_pos_conv_groups: i64 => "num_pos_conv_groups",
        use_conformer: bool => "use_conformer",
        num_encoder_layers: i64 => "num_encoder_layers",
        num_encoder_attn_heads: i64 => "num_encoder_attn_heads",
        ffn_inner_dim: i64 => "ffn_inner_dim",
        dropout_p: f32 => "dropout_p",
        attn_dropout_p: f32 => "attn_dropout_p",
        layer_drop_p: f32 => "layer_drop_p",
        norm_order: i32 => "norm_order",
        depthwise_conv_kernel_size: i64 => "depthwise_conv_kernel_size",
    }
}

wire_record! {
    /// NLLB text translation model; its decoder is the only branch turned
    /// into tensors.
    #[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
    pub struct NllbConfig {
        model_dim: i64 => "model_dim",
        max_seq_len: i64 => "max_seq_len",
        vocabulary_size: i64 => "vocabulary_size",
        pad_idx: i64 => "pad_idx",
        num_encoder_layers: i64 => "num_encoder_layers",
        num_decoder_layers: i64 => "num_decoder_layers",
        num_encoder_attn_heads: i64 => "num_encoder_attn_heads",
        num_decoder_attn_heads: i64 => "num_decoder_attn_heads",
        ffn_inner_dim: i64 => "ffn_inner_dim",
        dropout_p: f32 => "dropout_p",
    }
}

wire_record! {
    /// Text-to-unit model.
    #[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
    pub struct T2uConfig {
        model_dim: i64 => "model_dim",
        unit_max_seq_len: i64 => "unit_max_seq_len",
        unit_vocabulary_size: i64 => "unit_vocabulary_size",
        unit_pad_idx: i64 => "unit_pad_idx",
        num_encoder_layers: i64 => "num_encoder_layers",
        num_decoder_layers: i64 => "num_decoder_layers",
        num_encoder_attn_heads: i64 => "num_encoder_attn_heads",
        num_decoder_attn_heads: i64 => "num_decoder_attn_heads",
        ffn_inner_dim: i64 => "ffn_inner_dim",
        dropout_p: f32 => "dropout_p",
    }
}

wire_record! {
    /// Length adaptor between the speech encoder and the text decoder. Its
    /// fields are stored unprefixed in the checkpoint.
    #[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
    pub struct AdaptorConfig {
        num_adaptor_layers: i64 => "num_adaptor_layers",
        adaptor_kernel_size: i64 => "adaptor_kernel_size",
        adaptor_stride: i64 => "adaptor_stride",
        adaptor_layer_norm: bool => "adaptor_layer_norm",
        adaptor_dropout_p: f32 => "adaptor_dropout_p",
    }
}

wire_record! {
    /// Hyperparameters of a UnitY checkpoint, in checkpoint order.
    #[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
    pub struct UnityHparams {
        model_dim: i64 => "model_dim",
        w2v2_encoder_config: W2v2EncoderConfig => "w2v2_encoder_config",
        nllb_config: NllbConfig => "nllb_config",
        t2u_config: T2uConfig => "t2u_config",
        use_text_encoder: bool => "use_text_encoder",
        use_conformer_adaptor: bool => "use_conformer_adaptor",
        adaptor_config: AdaptorConfig => "",
    }
}

impl UnityHparams {
    pub fn from_reader<R: Read>(
        reader: &mut HparamsReader<R>
    ) -> Result<Self, HparamsError> {
        Self::read_from(reader)
    }

    pub fn write<W: Write>(
        &self,
        writer: &mut HparamsWriter<W>,
    ) -> Result<(), HparamsError> {
        self.write_to(writer)
    }

    /// Checks the fields the text decoder graph depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nllb = &self.nllb_config;
        if nllb.model_dim <= 0 {
            return Err(ConfigError::invalid(
                "nllb_config__model_dim",
                format!("must be positive, got {}", nllb.model_dim),
            ));
        }
        if nllb.vocabulary_size <= 0 {
            return Err(ConfigError::invalid(
                "nllb_config__vocabulary_size",
                format!("must be positive, got {}", nllb.vocabulary_size),
            ));
        }
        if nllb.num_decoder_layers < 0 {
            return Err(ConfigError::invalid(
                "nllb_config__num_decoder_layers",
                format!("must not be negative, got {}", nllb.num_decoder_layers),
            ));
        }
        if nllb.num_decoder_attn_heads <= 0 {
            return Err(ConfigError::invalid(
                "nllb_config__num_decoder_attn_heads",
                format!(
                    "must be positive, got {}",
                    nllb.num_decoder_attn_heads
                ),
            ));
        }
        if nllb.model_dim % nllb.num_decoder_attn_heads != 0 {
            return Err(ConfigError::invalid(
                "nllb_config__num_decoder_attn_heads",
                format!(
                    "{} heads do not divide model dim {}",
                    nllb.num_decoder_attn_heads, nllb.model_dim
                ),
            ));
        }
        Ok(())
    }
}
