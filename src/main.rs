//! Spheratui — match-3 sphere-popping puzzle game in the terminal.

mod app;
mod board;
mod game;
mod input;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from the CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub grid_size: usize,
    pub clear_threshold: usize,
    /// Number of sphere colours in play (first N palette entries).
    pub colors: u8,
    /// RNG seed; a seeded session deals reproducible boards.
    pub seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        grid_size: args.grid_size as usize,
        clear_threshold: args.clear_threshold as usize,
        colors: args.colors,
        seed: args.seed,
    };
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Match-3 sphere-popping puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "spheratui",
    version,
    about = "Match-3 sphere-popping puzzle in the terminal. Pop connected same-colour groups; survivors drop, fresh spheres fill the gaps.",
    long_about = "Spheratui is a terminal puzzle game: a board of coloured spheres.\n\n\
        Select a sphere (cursor keys or mouse click). If its connected same-colour group \
        is big enough it pops; the spheres above fall down and new random spheres fill \
        the column from the top.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor   Enter / Space  Pop   Mouse click  Pop\n  P  Pause   Q / Esc  Quit   R  New board (when no groups are left)\n\n\
        Use --seed for a reproducible deal and --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Board dimension (cells per side).
    #[arg(long, default_value = "8", value_name = "N",
          value_parser = clap::value_parser!(u8).range(2..=32))]
    pub grid_size: u8,

    /// Minimum connected group size that pops.
    #[arg(long, default_value = "3", value_name = "N",
          value_parser = clap::value_parser!(u8).range(2..=64))]
    pub clear_threshold: u8,

    /// Sphere colours in play. Fewer colours make bigger groups.
    #[arg(long, default_value = "5", value_name = "N",
          value_parser = clap::value_parser!(u8).range(2..=5))]
    pub colors: u8,

    /// RNG seed for a reproducible deal (refills included).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]="value"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the settle fade after a pop (instant redraw).
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
