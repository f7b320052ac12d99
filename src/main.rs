//! Tilecraft command line entry point.
//!
//! Loads the block catalog and any sprite directories, builds an
//! [`Editor`](tilecraft::editor::Editor) and runs the requested batch actions:
//!
//! ```sh
//! # Render a saved world to PNG
//! tilecraft --sprites assets/sprites --world world.json --export world.png
//!
//! # Create an empty world (bedrock only)
//! tilecraft --config tilecraft.ini --new --save fresh.json
//!
//! # Inspect how many cells a sprite covers
//! tilecraft --sprites assets/sprites --occupancy logs_oak
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use tilecraft::editor::Editor;
use tilecraft::resources::blockstore::BlockStore;
use tilecraft::resources::editorconfig::EditorConfig;
use tilecraft::resources::spritebounds::{SpriteBoundsCache, grid_size};

/// Chunked tile-world editor core
#[derive(Parser)]
#[command(version, about = "Headless tile-world editor: load, edit, save and export block worlds.")]
struct Cli {
    /// INI configuration file (default: ./tilecraft.ini when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Sprite directory to scan for custom blocks. May be repeated.
    #[arg(long, value_name = "DIR")]
    sprites: Vec<PathBuf>,

    /// World file to load.
    #[arg(long, value_name = "PATH")]
    world: Option<PathBuf>,

    /// Render the whole world to a PNG file.
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Print the cells covered by a block's sprite and exit.
    #[arg(long, value_name = "BLOCK_ID")]
    occupancy: Option<String>,

    /// Print how many loaded sprites use each tile mode.
    #[arg(long)]
    summary: bool,

    /// Start from a fresh world (bedrock only). Use with --save.
    #[arg(long, requires = "save")]
    new: bool,

    /// Write the world to this file after the other actions.
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,
}

fn load_config(path: Option<PathBuf>) -> EditorConfig {
    match path {
        Some(path) => {
            let mut config = EditorConfig::with_path(path);
            if let Err(e) = config.load_from_file() {
                warn!("{}; using defaults", e);
            }
            config
        }
        None => {
            let mut config = EditorConfig::new();
            config.load_from_file().ok(); // optional, defaults otherwise
            config
        }
    }
}

/// ASCII picture of the cells a block covers, origin marked `O`.
fn occupancy_diagram(blocks: &BlockStore, block_id: &str) -> Option<String> {
    let block = blocks.instance(block_id)?;
    let footprint = SpriteBoundsCache::new().footprint_of(&block, blocks);
    let (w, h) = grid_size(&footprint);
    let min_x = footprint.iter().map(|c| c.0).min().unwrap_or(0);
    let min_y = footprint.iter().map(|c| c.1).min().unwrap_or(0);

    let mut out = format!("{} covers {}x{} cells:\n", block_id, w, h);
    for y in min_y..min_y + h {
        for x in min_x..min_x + w {
            out.push(match (x, y) {
                (0, 0) => 'O',
                c if footprint.contains(&c) => '#',
                _ => '.',
            });
        }
        out.push('\n');
    }
    Some(out)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = load_config(cli.config);

    let mut blocks = BlockStore::with_default_blocks();
    for dir in &cli.sprites {
        let added = blocks.load_sprite_dir(dir)?;
        info!("Loaded {} sprites from {}", added, dir.display());
    }

    if cli.summary {
        println!("{} sprites loaded", blocks.sprite_count());
        for (mode, count) in blocks.sprite_type_summary() {
            println!("  {:<20} {}", mode, count);
        }
    }

    if let Some(block_id) = &cli.occupancy {
        let diagram = occupancy_diagram(&blocks, block_id).ok_or_else(|| format!("unknown block '{}'", block_id))?;
        print!("{}", diagram);
        return Ok(());
    }

    let mut editor = Editor::new(config, blocks);
    if let Some(path) = &cli.world {
        if cli.new {
            warn!("--new given, ignoring --world {}", path.display());
        } else {
            editor.load_world(path)?;
        }
    }

    if let Some(path) = &cli.export {
        let (w, h) = editor.export_png(path)?;
        println!("Exported {}x{} image to {}", w, h, path.display());
    }

    if let Some(path) = &cli.save {
        editor.save_world(path)?;
        println!("Saved world to {}", path.display());
    }

    let stats = editor.frame();
    info!(
        "{} blocks, {} visible chunks, {} rebuilt",
        editor.grid().block_count(),
        stats.visible_chunks,
        stats.rebuilds()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
