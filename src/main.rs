// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use clap::{Args, Parser, Subcommand};
use flac_retag::decode::read_blocks;
use flac_retag::metadata::{Block, BlockType, InvalidPicture, Picture, VorbisComment};
use flac_retag::{Cover, Options, Tag, retag_file};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Tags FLAC files with catalog metadata and cover art
#[derive(Parser)]
#[command(name = "flac-retag", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace a file's tags and cover art, writing a new file
    Retag(RetagArgs),
    /// Display the metadata blocks of one or more files
    List {
        /// FLAC files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct RetagArgs {
    /// FLAC file to read
    input: PathBuf,

    /// Path of the re-tagged FLAC file to write
    output: PathBuf,

    /// Track title
    #[arg(long, default_value = "")]
    title: String,

    /// Track artist(s), already joined
    #[arg(long, default_value = "")]
    artist: String,

    /// Track genre
    #[arg(long, default_value = "")]
    genre: String,

    /// Album name
    #[arg(long, default_value = "")]
    album: String,

    /// Release date
    #[arg(long, default_value = "")]
    date: String,

    /// Cover art to embed as the front cover
    #[arg(long)]
    cover: Option<PathBuf>,

    /// Square size to record for the cover art, in pixels,
    /// instead of the size read from the image
    #[arg(long, requires = "cover")]
    cover_size: Option<u32>,

    /// Delete the input file once the output is written
    #[arg(long)]
    remove_source: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Commands::Retag(args) => retag(args),
        Commands::List { files } => {
            let mut status = ExitCode::SUCCESS;
            for file in files {
                if let Err(err) = list(&file) {
                    eprintln!("* {} : {err}", file.display());
                    status = ExitCode::FAILURE;
                }
            }
            status
        }
    }
}

fn retag(args: RetagArgs) -> ExitCode {
    let cover = match args.cover.as_deref().map(|p| load_cover(p, args.cover_size)) {
        None => None,
        Some(Ok(cover)) => Some(cover),
        Some(Err(err)) => {
            if let Some(path) = &args.cover {
                eprintln!("* {} : {err}", path.display());
            }
            return ExitCode::FAILURE;
        }
    };

    let tag = Tag {
        title: args.title,
        artist: args.artist,
        genre: args.genre,
        album: args.album,
        date: args.date,
        cover,
    };

    match retag_file(
        &args.input,
        &args.output,
        &tag,
        &Options::default().remove_source(args.remove_source),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("* {} : {err}", args.input.display());
            ExitCode::FAILURE
        }
    }
}

fn load_cover(path: &Path, size: Option<u32>) -> Result<Cover, InvalidPicture> {
    let cover = Cover::from_image(std::fs::read(path)?)?;

    Ok(match size {
        Some(size) => cover.declare_size(size),
        None => cover,
    })
}

fn list(path: &Path) -> Result<(), flac_retag::Error> {
    println!("{}", path.display());

    for (index, result) in read_blocks(BufReader::new(File::open(path)?)).enumerate() {
        let (block, raw) = result?;
        println!(
            "  {index}: {} ({} bytes){}  [{:02x} {:02x} {:02x} {:02x}]",
            block.block_type,
            block.payload.len(),
            if block.last { " last" } else { "" },
            raw[0],
            raw[1],
            raw[2],
            raw[3],
        );
        display_contents(&block);
    }

    Ok(())
}

fn display_contents(block: &Block) {
    match block.block_type {
        BlockType::VorbisComment => match block.decode::<VorbisComment>() {
            Ok(comment) => {
                println!("     vendor : {}", comment.vendor_string);
                for field in comment.fields {
                    println!("     {field}");
                }
            }
            Err(err) => println!("     * {err}"),
        },
        BlockType::Picture => match block.decode::<Picture>() {
            Ok(Picture {
                picture_type,
                media_type,
                width,
                height,
                color_depth,
                colors_used,
                data,
                ..
            }) => {
                println!("       type : {} ({picture_type})", picture_type as u8);
                println!("  MIME type : {media_type}");
                println!("      width : {width}");
                println!("     height : {height}");
                println!("color depth : {color_depth}");
                if colors_used > 0 {
                    println!("colors used : {colors_used}");
                }
                println!("       data : {} bytes", data.len());
            }
            Err(err) => println!("     * {err}"),
        },
        _ => { /* opaque to us */ }
    }
}
