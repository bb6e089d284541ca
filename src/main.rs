use std::path::PathBuf;

use anyhow::Context;
use cover_cropper::config::{self, CropperConfig};
use cover_cropper::headless::DragStep;

const USAGE: &str = "\
usage: cover-cropper <INPUT> <OUTPUT> [--config PATH] [--preview PATH] [--drag HANDLE:DX,DY]...

  --config PATH        read crop settings from PATH instead of the user config
  --preview PATH       save the rendered crop overlay as PNG
  --drag HANDLE:DX,DY  replay a drag before confirming (nw, ne, se, sw or move)
";

#[derive(Debug)]
struct CliArgs {
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    preview: Option<PathBuf>,
    drags: Vec<DragStep>,
}

fn parse_args() -> anyhow::Result<Option<CliArgs>> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let config = args.opt_value_from_str("--config")?;
    let preview = args.opt_value_from_str("--preview")?;
    let drags = args.values_from_str("--drag")?;
    let input = args.free_from_str().context("missing INPUT path")?;
    let output = args.free_from_str().context("missing OUTPUT path")?;

    let remaining = args.finish();
    if !remaining.is_empty() {
        anyhow::bail!("unexpected arguments: {remaining:?}");
    }

    Ok(Some(CliArgs {
        input,
        output,
        config,
        preview,
        drags,
    }))
}

fn main() -> anyhow::Result<()> {
    cover_cropper::logging::init();

    let Some(args) = parse_args()? else {
        print!("{USAGE}");
        return Ok(());
    };

    let settings = match &args.config {
        Some(path) => CropperConfig::from_path(path)?.resolve()?,
        None => config::load_crop_settings(),
    };

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let report = cover_cropper::run(&bytes, settings, &args.drags)?;

    if let Some(path) = &args.preview {
        report
            .preview_frame
            .save(path)
            .with_context(|| format!("failed to write preview {}", path.display()))?;
    }

    std::fs::write(&args.output, &report.image.bytes)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    tracing::info!(
        output = %args.output.display(),
        width = report.image.width,
        height = report.image.height,
        "cover written"
    );
    Ok(())
}
