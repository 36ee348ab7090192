use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use mcasm::image::Coord;
use mcasm::{AsmConfig, LayoutKind, RomImage};
use mcasm_dump::{read_group, render_text, scan_groups, GroupOut};

#[derive(Parser, Debug)]
#[command(author, version, about = "List the command groups in a microcode image", long_about = None)]
struct Cli {
    /// Image produced by mcasm
    #[arg(value_name = "IMAGE")]
    input: PathBuf,
    /// JSON assembler configuration (layout and geometry)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Command word layout (overrides the config file)
    #[arg(long, value_enum)]
    layout: Option<LayoutKind>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Every group holding a non-zero word
    Groups,
    /// One group by its coordinates
    Group {
        cmd_set: u32,
        page: u32,
        id: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AsmConfig::load(path)?,
        None => AsmConfig::default(),
    };
    if let Some(layout) = cli.layout {
        config.layout = layout;
    }
    let geometry = config.geometry;
    let layout = config.layout.layout();
    let image = RomImage::load(&cli.input)?;

    let groups: Vec<GroupOut> = match cli.cmd {
        Command::Groups => scan_groups(&image, &geometry, layout),
        Command::Group { cmd_set, page, id } => {
            for (coord, v) in [(Coord::CmdSet, cmd_set), (Coord::Page, page), (Coord::Group, id)] {
                anyhow::ensure!(
                    geometry.in_range(coord, v as i64),
                    "{}, {v}, is out of range 0..{}",
                    coord.label(),
                    geometry.max(coord)
                );
            }
            vec![read_group(&image, &geometry, layout, cmd_set, page, id)]
        }
    };

    match cli.format {
        OutputFormat::Text => print!("{}", render_text(&groups)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&groups)?),
    }
    Ok(())
}
