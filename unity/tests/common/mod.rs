#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;
use unity::config::{NllbConfig, UnityHparams, WireRecord};

pub fn decoder_hparams(
    num_decoder_layers: i64,
    model_dim: i64,
    num_decoder_attn_heads: i64,
) -> UnityHparams {
    UnityHparams {
        model_dim: 1024,
        nllb_config: NllbConfig {
            model_dim,
            max_seq_len: 1024,
            vocabulary_size: 256_102,
            pad_idx: 0,
            num_encoder_layers: 24,
            num_decoder_layers,
            num_encoder_attn_heads: 16,
            num_decoder_attn_heads,
            ffn_inner_dim: 8192,
            dropout_p: 0.1,
        },
        use_text_encoder: true,
        ..Default::default()
    }
}

pub fn encode(hparams: &UnityHparams) -> Vec<u8> {
    hparams.to_bytes().unwrap()
}

/// Header followed by `weights` as opaque trailing bytes.
pub fn write_checkpoint(
    hparams: &UnityHparams,
    weights: &[u8],
) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&encode(hparams)).unwrap();
    file.write_all(weights).unwrap();
    file.flush().unwrap();
    file
}

pub fn expected_decoder_keys(num_layers: usize) -> Vec<String> {
    let mut keys = Vec::new();
    for layer in 0..num_layers {
        let prefix = format!("text_decoder.layers.{layer}");
        for projection in ["q_proj", "k_proj", "v_proj", "output_proj"] {
            for parameter in ["weight", "bias"] {
                keys.push(format!("{prefix}.self_attn.{projection}.{parameter}"));
            }
        }
        for parameter in ["weight", "bias"] {
            keys.push(format!("{prefix}.self_attn_norm.{parameter}"));
        }
    }
    keys
}
