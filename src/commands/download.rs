//! `download` command: fetch and unpack the document corpus

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::downloader::{fetch_corpus, DownloadConfig};

/// Download the corpus archive into the documents directory.
pub async fn run(config: &Config, url: Option<String>, output_dir: Option<PathBuf>) -> Result<()> {
    let url = url
        .or_else(|| config.corpus_url.clone())
        .context("no corpus URL: pass --url or set CORPUS_URL / corpus.url in config.yml")?;

    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.documents_dir));

    let download = DownloadConfig::new(url, output_dir);
    let report = fetch_corpus(&download).await?;

    println!(
        "Downloaded {:.2} MB, extracted {} files into {}",
        report.bytes as f64 / (1024.0 * 1024.0),
        report.files_extracted,
        download.output_dir.display()
    );

    Ok(())
}
