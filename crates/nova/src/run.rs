use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use exhibits::{
    ControlDefinition, ControlKind, ExhibitId, ExhibitMetadata, ExhibitPreview, ExhibitRegistry,
};
use galleryconfig::GalleryConfig;
use renderer::{Renderer, RendererConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file named on the command line, else the discovered default.
fn config_path(args: &RunArgs) -> Result<PathBuf> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => Ok(AppPaths::discover()?.config_file()),
    }
}

/// Loads the config file and layers CLI overrides on top.
pub fn effective_config(args: &RunArgs) -> Result<(GalleryConfig, PathBuf)> {
    let path = config_path(args)?;
    let mut config = GalleryConfig::load(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    if let Some(fps) = args.fps {
        config.fps = (fps > 0.0).then_some(fps);
    }
    if let Some((width, height)) = args.size {
        config.window.width = width;
        config.window.height = height;
    }
    if let Some(exhibit) = &args.exhibit {
        config.start_exhibit = Some(exhibit.clone());
    }
    if let Some(strategy) = args.load_strategy {
        config.load_strategy = strategy;
    }
    config
        .validate()
        .context("invalid configuration after applying CLI overrides")?;

    Ok((config, path))
}

pub fn run(args: RunArgs) -> Result<()> {
    let (config, path) = effective_config(&args)?;
    let registry = ExhibitRegistry::builtin();
    tracing::debug!(
        config = %path.display(),
        quality = %config.quality,
        fps = ?config.fps,
        load_strategy = ?config.load_strategy,
        "resolved nova configuration"
    );

    if let Some(start) = &config.start_exhibit {
        let id = ExhibitId::from(start.as_str());
        if !registry.contains(&id) {
            bail!("unknown exhibit '{id}'; run `nova list` to see the gallery");
        }
    }

    let renderer_config = RendererConfig::from(&config);
    tracing::info!(
        width = renderer_config.surface_size.0,
        height = renderer_config.surface_size.1,
        exhibit = ?renderer_config.initial_exhibit,
        "opening gallery"
    );
    Renderer::new(renderer_config, registry).run()
}

pub fn list(json: bool) -> Result<()> {
    let previews = ExhibitRegistry::builtin().list_previews();
    if json {
        println!("{}", serde_json::to_string_pretty(&previews)?);
        return Ok(());
    }

    for preview in &previews {
        println!("{}", preview_line(preview));
    }
    Ok(())
}

fn preview_line(preview: &ExhibitPreview) -> String {
    let status = if preview.coming_soon {
        "  (coming soon)"
    } else {
        ""
    };
    format!("{:<16} {}{status}", preview.id, preview.title)
}

#[derive(Serialize)]
struct InfoReport<'a> {
    #[serde(flatten)]
    metadata: &'a ExhibitMetadata,
    pointer_responsiveness: f32,
    controls: &'a [ControlDefinition],
}

pub fn info(id: &str, json: bool) -> Result<()> {
    let registry = ExhibitRegistry::builtin();
    let unit = registry
        .resolve_now(&ExhibitId::from(id))
        .with_context(|| format!("failed to resolve exhibit '{id}'"))?;

    if json {
        let report = InfoReport {
            metadata: &unit.metadata,
            pointer_responsiveness: unit.program.pointer_responsiveness,
            controls: &unit.controls,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let metadata = &unit.metadata;
    println!("{} ({})", metadata.title, metadata.id);
    println!("  {}", metadata.description);
    println!("  released: {}", metadata.release_date);
    if !metadata.tags.is_empty() {
        println!("  tags:     {}", metadata.tags.join(", "));
    }
    if unit.controls.is_empty() {
        println!("Controls: none");
    } else {
        println!("Controls:");
        for control in &unit.controls {
            println!("  {}", control_line(control));
        }
    }
    Ok(())
}

fn control_line(control: &ControlDefinition) -> String {
    let range = match &control.kind {
        ControlKind::Slider { min, max, step } => format!("{min}..{max} step {step}"),
        ControlKind::Toggle => "on/off".to_string(),
        ControlKind::Select { options } => options
            .iter()
            .map(|option| option.value.as_str())
            .collect::<Vec<_>>()
            .join("|"),
    };
    format!(
        "{:<14} {:<8} {:<20} default {}",
        control.key,
        control.kind.name(),
        range,
        control.default_value
    )
}

pub fn show_config(args: RunArgs) -> Result<()> {
    let (config, path) = effective_config(&args)?;
    println!("# {}", path.display());
    print!("{}", config.to_toml_string()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use galleryconfig::QualityTier;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn cli_overrides_win_over_file_values() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "quality = \"low\"\nfps = 30\n").expect("write config");

        let args = RunArgs {
            config: Some(path.clone()),
            quality: Some(QualityTier::High),
            fps: Some(0.0),
            size: Some((640, 480)),
            ..RunArgs::default()
        };
        let (config, resolved) = effective_config(&args).expect("config resolves");
        assert_eq!(resolved, path);
        assert_eq!(config.quality, QualityTier::High);
        assert_eq!(config.fps, None);
        assert_eq!((config.window.width, config.window.height), (640, 480));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let args = RunArgs {
            config: Some(dir.path().join("absent.toml")),
            ..RunArgs::default()
        };
        let (config, _) = effective_config(&args).expect("defaults");
        assert_eq!(config, GalleryConfig::default());
    }

    #[test]
    fn preview_lines_flag_coming_soon() {
        let preview = ExhibitPreview {
            id: ExhibitId::from("aurora"),
            title: "Aurora".into(),
            description: String::new(),
            coming_soon: true,
        };
        assert!(preview_line(&preview).ends_with("Aurora  (coming soon)"));
    }
}
