use std::path::Path;

use anyhow::Context;
use console::Style;
use serde::Serialize;
use unity::{
    DataType, Model, ModelArch,
    allocator::{TensorAllocator, TensorInfo},
    config::UnityHparams,
    load_model_file,
};

#[derive(Serialize)]
struct TensorReport<'a> {
    key: &'a str,
    shape: &'a [usize],
    data_type: DataType,
    offset: usize,
    size: usize,
}

#[derive(Serialize)]
struct InspectReport<'a> {
    arch: ModelArch,
    hparams: &'a UnityHparams,
    weights_offset: usize,
    arena_capacity: usize,
    arena_used: usize,
    tensors: Vec<TensorReport<'a>>,
}

fn tensor_reports<'a>(
    model: &'a Model,
    prefix: Option<&str>,
) -> anyhow::Result<Vec<TensorReport<'a>>> {
    let tree = model.registry().tree();
    let tree = match prefix {
        Some(prefix) => tree.subtree(prefix)?,
        None => tree,
    };
    tree.entries()
        .map(|(key, id)| -> anyhow::Result<TensorReport<'a>> {
            let TensorInfo {
                shape,
                data_type,
                offset,
                size,
                ..
            } = model.arena().info(id)?;
            Ok(TensorReport {
                key,
                shape,
                data_type: *data_type,
                offset: *offset,
                size: *size,
            })
        })
        .collect()
}

fn print_report(report: &InspectReport<'_>) {
    let style_title = Style::new().bold();
    let style_key = Style::new().cyan();
    let style_dim = Style::new().dim();

    let nllb = &report.hparams.nllb_config;
    println!("{}", style_title.apply_to(format!("arch: {}", report.arch)));
    println!(
        "text decoder: {} layers, model dim {}, {} heads, vocabulary {}",
        nllb.num_decoder_layers,
        nllb.model_dim,
        nllb.num_decoder_attn_heads,
        nllb.vocabulary_size
    );
    println!(
        "arena: {} / {} bytes, weights start at byte {}",
        report.arena_used, report.arena_capacity, report.weights_offset
    );
    println!();
    for tensor in &report.tensors {
        println!(
            "{} {:?} {}",
            style_key.apply_to(tensor.key),
            tensor.shape,
            style_dim.apply_to(format!(
                "{:?} @{} ({} bytes)",
                tensor.data_type, tensor.offset, tensor.size
            ))
        );
    }
    println!(
        "{}",
        style_title.apply_to(format!("{} tensors", report.tensors.len()))
    );
}

pub fn handle_inspect(
    checkpoint: &Path,
    arch: ModelArch,
    prefix: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let model = load_model_file(checkpoint, arch).with_context(|| {
        format!("Failed to load {}", checkpoint.display())
    })?;
    let hparams = match &model {
        Model::UnitY(loaded) => &loaded.hparams,
    };
    let report = InspectReport {
        arch: model.arch(),
        hparams,
        weights_offset: model.weights_offset(),
        arena_capacity: model.arena().capacity(),
        arena_used: model.arena().active_memory(),
        tensors: tensor_reports(&model, prefix)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
