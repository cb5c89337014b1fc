//! CLI for tilegeom - clip and clean tile geometry
//!
//! This is a thin wrapper around the tilegeom-core library. Geometry is read
//! as a JSON array of draws (`[{"op":"MoveTo","x":0,"y":0}, ...]`) from a file
//! or stdin, and the result is written as JSON to stdout.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tilegeom_core::area::multi_polygon_area;
use tilegeom_core::clip::{clip_lines_for_zoom, clip_points_for_zoom, simple_clip_poly_for_zoom};
use tilegeom_core::close::close_poly;
use tilegeom_core::noop::remove_noop;
use tilegeom_core::scale::{from_tile_scale, to_tile_scale};
use tilegeom_core::tile::{DEFAULT_BUFFER, DEFAULT_DETAIL};
use tilegeom_core::{clean_or_clip_poly, Draw, GeomType, EXIT_IMPOSSIBLE};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    /// Keep points inside the buffered tile
    ClipPoints,
    /// Clip line segments to the buffered tile
    ClipLines,
    /// Clip polygon rings to the buffered tile without repairing them
    ClipPoly,
    /// Union polygon rings, and clip them unless --no-clip is given
    Clean,
    /// Replace repeated closing vertices with ClosePath
    Close,
    /// Scale world coordinates down to tile resolution
    ToTile,
    /// Scale tile coordinates back up to world resolution
    FromTile,
    /// Remove zero-length edges and empty subpaths
    RemoveNoop,
    /// Print the summed signed area of every ring
    Area,
}

#[derive(Parser, Debug)]
#[command(
    name = "tilegeom",
    about = "Clip and clean vector tile geometry",
    version
)]
struct Args {
    /// Operation to run
    #[arg(value_enum, value_name = "COMMAND")]
    command: Command,

    /// Input JSON file (reads stdin when omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Zoom level of the tile
    #[arg(long, default_value = "14", value_parser = clap::value_parser!(u8).range(0..=32))]
    zoom: u8,

    /// Tile buffer in 1/256ths of the tile side, at most one full side
    #[arg(long, default_value_t = DEFAULT_BUFFER, value_parser = clap::value_parser!(i64).range(0..=256))]
    buffer: i64,

    /// Tile resolution in bits
    #[arg(long, default_value_t = DEFAULT_DETAIL, value_parser = clap::value_parser!(u8).range(0..=32))]
    detail: u8,

    /// Geometry type for remove-noop (point, line, polygon)
    #[arg(long = "type", default_value = "polygon")]
    geom_type: String,

    /// Comparison resolution shift for remove-noop
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(u32).range(0..=62))]
    shift: u32,

    /// Clean without clipping to the tile
    #[arg(long)]
    no_clip: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn parse_geom_type(&self) -> Result<GeomType> {
        match self.geom_type.to_lowercase().as_str() {
            "point" => Ok(GeomType::Point),
            "line" => Ok(GeomType::Line),
            "polygon" => Ok(GeomType::Polygon),
            _ => anyhow::bail!("Invalid geometry type: {}", self.geom_type),
        }
    }

    fn read_input(&self) -> Result<Vec<Draw>> {
        let text = match &self.input {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read stdin")?;
                buf
            }
        };

        serde_json::from_str(&text).context("Failed to parse geometry JSON")
    }
}

fn run(args: &Args) -> Result<String> {
    let mut geom = args.read_input()?;
    let (z, buffer) = (args.zoom, args.buffer);
    let input_len = geom.len();

    let out = match args.command {
        Command::ClipPoints => clip_points_for_zoom(&geom, z, buffer),
        Command::ClipLines => clip_lines_for_zoom(&geom, z, buffer),
        Command::ClipPoly => {
            simple_clip_poly_for_zoom(&geom, z, buffer).context("Failed to clip polygon")?
        }
        Command::Clean => clean_or_clip_poly(&geom, z, buffer, !args.no_clip)
            .context("Failed to clean polygon")?,
        Command::Close => close_poly(&geom),
        Command::ToTile => {
            to_tile_scale(&mut geom, z, args.detail);
            geom
        }
        Command::FromTile => from_tile_scale(&geom, z, args.detail),
        Command::RemoveNoop => remove_noop(&geom, args.parse_geom_type()?, args.shift),
        Command::Area => {
            let area = multi_polygon_area(&geom).context("Failed to compute area")?;
            return Ok(serde_json::to_string(&area)?);
        }
    };

    log::debug!("{:?}: {} draws in, {} out", args.command, input_len, out.len());

    Ok(serde_json::to_string(&out)?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .init();

    match run(&args) {
        Ok(json) => {
            println!("{}", json);
            Ok(())
        }
        Err(err) => {
            if let Some(core) = err.downcast_ref::<tilegeom_core::Error>() {
                if core.is_impossible() {
                    log::error!("{:#}", err);
                    std::process::exit(EXIT_IMPOSSIBLE);
                }
            }
            Err(err)
        }
    }
}
