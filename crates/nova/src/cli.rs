use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use galleryconfig::{LoadStrategy, QualityTier};

#[derive(Parser, Debug)]
#[command(
    name = "nova",
    author,
    version,
    about = "NOVA generative-art gallery",
    arg_required_else_help = false,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Exhibit to open instead of the gallery (e.g. `flow-fields`).
    #[arg(long, value_name = "ID")]
    pub exhibit: Option<String>,

    /// Quality tier: `low`, `medium`, or `high`.
    #[arg(long, value_name = "TIER", value_parser = parse_quality)]
    pub quality: Option<QualityTier>,

    /// Initial window size in logical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Optional FPS cap (0=uncapped).
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// How exhibits resolve after selection: `threaded` or `immediate`.
    #[arg(long, value_name = "STRATEGY", value_parser = parse_load_strategy)]
    pub load_strategy: Option<LoadStrategy>,

    /// Config file to read instead of `$NOVA_CONFIG_DIR/config.toml`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the gallery window (the default when no subcommand is given).
    Run(RunArgs),
    /// List gallery previews, coming-soon entries included.
    List(ListArgs),
    /// Resolve one exhibit and print its metadata and controls.
    Info(InfoArgs),
    /// Print the effective configuration after CLI overrides.
    Config(RunArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Exhibit id (e.g. `tessellations`).
    #[arg(value_name = "ID")]
    pub id: String,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_quality(value: &str) -> Result<QualityTier, String> {
    if value.trim().is_empty() {
        return Err("quality tier must not be empty".to_string());
    }
    value.parse()
}

pub fn parse_load_strategy(value: &str) -> Result<LoadStrategy, String> {
    if value.trim().is_empty() {
        return Err("load strategy must not be empty".to_string());
    }
    value.parse()
}

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let fps: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid frame rate '{}'", value.trim()))?;
    if !fps.is_finite() || fps < 0.0 {
        return Err("frame rate must be a non-negative number".to_string());
    }
    Ok(fps)
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x720".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in --size value".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in --size value".to_string())?;

    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_surface_size(" 800 X 600 "), Ok((800, 600)));
        assert_eq!(parse_surface_size("640×480"), Ok((640, 480)));
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("0x720").is_err());
        assert!(parse_surface_size("widex720").is_err());
    }

    #[test]
    fn parses_quality_tiers() {
        assert_eq!(parse_quality("LOW"), Ok(QualityTier::Low));
        assert_eq!(parse_quality("medium"), Ok(QualityTier::Medium));
        assert!(parse_quality("").is_err());
        assert!(parse_quality("ultra").is_err());
    }

    #[test]
    fn fps_must_be_non_negative() {
        assert_eq!(parse_fps("30"), Ok(30.0));
        assert_eq!(parse_fps("0"), Ok(0.0));
        assert!(parse_fps("-1").is_err());
        assert!(parse_fps("fast").is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["nova", "info", "emergence", "--json"]).expect("parses");
        match cli.command {
            Some(Command::Info(args)) => {
                assert_eq!(args.id, "emergence");
                assert!(args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["nova", "--exhibit", "flow-fields", "--quality", "low"])
            .expect("parses");
        assert!(cli.command.is_none());
        assert_eq!(cli.run.exhibit.as_deref(), Some("flow-fields"));
        assert_eq!(cli.run.quality, Some(QualityTier::Low));
    }

    #[test]
    fn top_level_run_flags_do_not_mix_with_subcommands() {
        assert!(Cli::try_parse_from(["nova", "--quality", "low", "run"]).is_err());
        assert!(Cli::try_parse_from(["nova", "--fps", "30", "list"]).is_err());

        let cli = Cli::try_parse_from(["nova", "run", "--quality", "low"]).expect("parses");
        match cli.command {
            Some(Command::Run(args)) => assert_eq!(args.quality, Some(QualityTier::Low)),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
