use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use watch_dial::{preview, DialDescription, WatchDial};

#[derive(Parser, Debug)]
#[command(name = "watch-dial", version, about = "Render watch dial faces")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a dial description to PNG, or preview it in a window.
    Render(RenderArgs),
    /// Validate a dial description without rendering.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input dial description JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output edge length in pixels.
    #[arg(long, default_value_t = 1000)]
    size: u32,

    /// Output PNG path. Without it the dial is shown in a preview window.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input dial description JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn load_dial(path: &Path) -> anyhow::Result<WatchDial> {
    let description = DialDescription::load(path)
        .with_context(|| format!("load dial description '{}'", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let dial = description
        .build(base_dir)
        .with_context(|| format!("apply dial description '{}'", path.display()))?;
    Ok(dial)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let dial = load_dial(&args.in_path)?;

    if let Some(parent) = args.out.as_deref().and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
    }

    let image = dial
        .render(args.size, args.out.as_deref())
        .context("render dial")?;

    match args.out {
        Some(out) => eprintln!("wrote {}", out.display()),
        None => {
            let title = args
                .in_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "watch dial".to_string());
            preview::show(&image, &title).context("preview dial")?;
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let dial = load_dial(&args.in_path)?;
    println!(
        "ok: {} tick angle(s), {} numeral angle(s), background {}",
        dial.ticks().len(),
        dial.numerals().len(),
        if dial.background().is_some() {
            "set"
        } else {
            "unset"
        }
    );
    Ok(())
}
