mod cli;

use std::path::PathBuf;

use anyhow::Context;
use birdtag_media::{full_image_url, read_config, DataUrl, DataUrlConverter};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename(".env.local").ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            references,
            full,
            output,
        } => convert(cli.config_dir, references, full, output).await,
        Commands::FullUrl { thumbnail } => {
            println!("{}", full_image_url(&thumbnail));
            Ok(())
        }
        Commands::Decode { data_url, output } => {
            let decoded = DataUrl::parse(&data_url).context("Failed to parse data URL")?;
            tokio::fs::write(&output, &decoded.data)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                media_type = %decoded.media_type,
                size = decoded.data.len(),
                path = %output.display(),
                "Decoded data URL"
            );
            Ok(())
        }
    }
}

async fn convert(
    config_dir: PathBuf,
    references: Vec<String>,
    full: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let settings = read_config(&config_dir)
        .with_context(|| format!("Failed to read config from {}", config_dir.display()))?;
    let converter = DataUrlConverter::from_settings(settings.converter)
        .context("Failed to create converter")?;

    let locators: Vec<String> = if full {
        references.iter().map(|r| full_image_url(r)).collect()
    } else {
        references.clone()
    };

    let results = converter.convert_all(&locators).await;

    for (reference, result) in references.iter().zip(&results) {
        if result.is_none() {
            eprintln!("{reference}: conversion failed");
        }
    }
    let (contents, failed) = render_lines(&results);

    match output {
        Some(path) => {
            tokio::fs::write(&path, contents)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                converted = results.len() - failed,
                failed,
                path = %path.display(),
                "Wrote data URLs"
            );
        }
        None => print!("{contents}"),
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} conversions failed", references.len());
    }

    Ok(())
}

/// One line per reference, in input order; failed conversions leave an empty line.
fn render_lines(results: &[Option<String>]) -> (String, usize) {
    let mut contents = String::new();
    let mut failed = 0;
    for result in results {
        match result {
            Some(data_url) => contents.push_str(data_url),
            None => failed += 1,
        }
        contents.push('\n');
    }
    (contents, failed)
}
