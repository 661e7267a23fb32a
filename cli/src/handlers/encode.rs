use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use console::Style;
use tracing::info;
use unity::config::{HparamsWriter, UnityHparams};

pub fn handle_encode_hparams(
    json_path: &Path,
    output_path: &Path,
) -> anyhow::Result<()> {
    let json = fs::read_to_string(json_path).with_context(|| {
        format!("Failed to read {}", json_path.display())
    })?;
    let hparams: UnityHparams = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {}", json_path.display()))?;
    hparams.validate()?;

    let file = File::create(output_path).with_context(|| {
        format!("Failed to create {}", output_path.display())
    })?;
    let mut writer = HparamsWriter::new(BufWriter::new(file));
    hparams.write(&mut writer)?;
    let written = writer.offset();
    writer.into_inner().flush()?;
    info!(bytes = written, path = %output_path.display(), "wrote hparams");
    println!(
        "{} {} bytes to {}",
        Style::new().green().bold().apply_to("Wrote"),
        written,
        output_path.display()
    );
    Ok(())
}
