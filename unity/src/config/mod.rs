pub mod error;
pub mod hparams;
pub mod wire;

pub use error::ConfigError;
pub use hparams::{
    AdaptorConfig, NllbConfig, T2uConfig, UnityHparams, W2v2EncoderConfig,
};
pub use wire::{
    FieldDescriptor, HparamsError, HparamsReader, HparamsWriter, ScalarKind,
    WireField, WireRecord,
};
