//! Checkpoint loading: hyperparameters, arena sizing, graph construction.
//!
//! [`load_model`] runs the three phases for any [`ModelLoader`];
//! [`load_model_file`] picks the loader from a [`ModelArch`] tag.

mod unity_model;

use std::{
    fmt,
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
pub use unity_model::{CONTEXT_SLACK, UnityArch, UnityModelLoader};

use crate::{
    allocator::{AllocError, ArenaAllocator, TensorAllocator},
    config::{ConfigError, HparamsError, HparamsReader, UnityHparams},
    graph::{BuildContext, GraphError},
    parameters::TensorRegistry,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open checkpoint {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Hparams(#[from] HparamsError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Alloc(#[from] AllocError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown model architecture \"{0}\"")]
pub struct UnknownArchError(String);

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Clone)]
#[serde(rename_all = "lowercase")]
pub enum ModelArch {
    UnitY,
}

impl ModelArch {
    pub fn name(&self) -> &'static str {
        match self {
            ModelArch::UnitY => "unity",
        }
    }
}

impl fmt::Display for ModelArch {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelArch {
    type Err = UnknownArchError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "unity" => Ok(ModelArch::UnitY),
            _ => Err(UnknownArchError(name.to_string())),
        }
    }
}

/// Architecture-specific half of the loading sequence.
pub trait ModelLoader {
    type Hparams;
    type Arch;

    fn load_hparams<R: Read>(
        &self,
        reader: &mut HparamsReader<R>,
    ) -> Result<Self::Hparams, LoadError>;

    /// Arena bytes sufficient for every tensor `tensors_alloc` creates.
    fn compute_context_size(
        &self,
        hparams: &Self::Hparams,
    ) -> Result<usize, LoadError>;

    fn tensors_alloc<A: TensorAllocator>(
        &self,
        hparams: &Self::Hparams,
        context: &mut BuildContext<'_, A>,
    ) -> Result<Self::Arch, LoadError>;
}

/// A model whose tensors are allocated and named but not yet populated.
#[derive(Debug)]
pub struct LoadedModel<H, G> {
    pub hparams: H,
    pub arch: G,
    pub arena: ArenaAllocator,
    pub registry: TensorRegistry,
    /// Offset of the first weight byte in the checkpoint.
    pub weights_offset: usize,
}

#[derive(Debug)]
pub enum Model {
    UnitY(LoadedModel<UnityHparams, UnityArch>),
}

impl Model {
    pub fn arch(&self) -> ModelArch {
        match self {
            Model::UnitY(_) => ModelArch::UnitY,
        }
    }

    pub fn arena(&self) -> &ArenaAllocator {
        match self {
            Model::UnitY(model) => &model.arena,
        }
    }

    pub fn arena_mut(&mut self) -> &mut ArenaAllocator {
        match self {
            Model::UnitY(model) => &mut model.arena,
        }
    }

    pub fn registry(&self) -> &TensorRegistry {
        match self {
            Model::UnitY(model) => &model.registry,
        }
    }

    pub fn weights_offset(&self) -> usize {
        match self {
            Model::UnitY(model) => model.weights_offset,
        }
    }
}

pub fn load_model<L: ModelLoader, R: Read>(
    loader: &L,
    reader: R,
) -> Result<LoadedModel<L::Hparams, L::Arch>, LoadError> {
    let mut reader = HparamsReader::new(reader);
    let hparams = loader.load_hparams(&mut reader)?;
    let weights_offset = reader.offset();

    let context_size = loader.compute_context_size(&hparams)?;
    info!(context_size, "reserving arena");
    let mut arena = ArenaAllocator::new(context_size)?;
    let mut registry = TensorRegistry::new();

    let arch = {
        let mut context = BuildContext::new(&mut arena, &mut registry);
        loader.tensors_alloc(&hparams, &mut context)?
    };
    info!(
        tensors = registry.len(),
        used = arena.active_memory(),
        capacity = arena.capacity(),
        "tensor graph built"
    );

    Ok(LoadedModel {
        hparams,
        arch,
        arena,
        registry,
        weights_offset,
    })
}

pub fn load_model_file(
    path: impl AsRef<Path>,
    arch: ModelArch,
) -> Result<Model, LoadError> {
    let path = path.as_ref();
    info!(path = %path.display(), %arch, "loading checkpoint");
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    match arch {
        ModelArch::UnitY => {
            load_model(&UnityModelLoader, reader).map(Model::UnitY)
        },
    }
}
