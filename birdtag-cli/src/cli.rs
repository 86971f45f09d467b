use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "birdtag")]
#[command(about = "Embed birdtag gallery images as data URLs")]
pub struct Cli {
    /// Directory holding base.yaml and <environment>.yaml
    #[arg(long, default_value = "config")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert image locators to data URLs, one line per locator (empty if it failed)
    Convert {
        /// Image locators or existing data URLs
        #[arg(required = true)]
        references: Vec<String>,
        /// Treat locators as thumbnails and embed the full-size image
        #[arg(long)]
        full: bool,
        /// Write data URLs to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the full-size image locator for a thumbnail locator
    FullUrl { thumbnail: String },
    /// Write the payload of a data URL to a file
    Decode {
        data_url: String,
        #[arg(long, short)]
        output: PathBuf,
    },
}
