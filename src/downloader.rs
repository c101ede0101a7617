//! Corpus downloader
//!
//! Streams a zipped document corpus from a file host (GitHub Releases,
//! Dropbox, Google Drive direct links) and unpacks it into the documents
//! directory. Retries transient failures and rejects truncated bodies.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Some hosts refuse default client user agents.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const PROGRESS_EVERY_BYTES: u64 = 10 * 1024 * 1024;

/// Download parameters.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub url: String,
    pub output_dir: PathBuf,
    pub attempts: usize,
    /// Bodies smaller than this are HTML error pages, not archives.
    pub min_bytes: u64,
    pub retry_delay: Duration,
}

impl DownloadConfig {
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output_dir: output_dir.into(),
            attempts: 3,
            min_bytes: 1024,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Outcome of a corpus download.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub bytes: u64,
    pub files_extracted: usize,
}

/// Download the corpus archive and unpack it into the output directory.
///
/// The previous contents of the output directory are replaced only after a
/// successful download.
pub async fn fetch_corpus(config: &DownloadConfig) -> Result<DownloadReport> {
    let zip_path =
        std::env::temp_dir().join(format!("pipila_corpus_{}.zip", uuid::Uuid::new_v4()));
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("building HTTP client")?;

    let mut bytes = 0;
    let mut last_error = None;

    for attempt in 1..=config.attempts.max(1) {
        info!("Downloading corpus (attempt {}/{})", attempt, config.attempts);

        match download_to_file(&client, &config.url, &zip_path).await {
            Ok(size) if size >= config.min_bytes => {
                bytes = size;
                last_error = None;
                break;
            }
            Ok(size) => {
                warn!("Downloaded file too small ({} bytes), retrying", size);
                last_error = Some(anyhow::anyhow!("response body too small: {} bytes", size));
            }
            Err(err) => {
                warn!("Download failed: {:#}", err);
                last_error = Some(err);
            }
        }

        if attempt < config.attempts {
            tokio::time::sleep(config.retry_delay).await;
        }
    }

    if let Some(err) = last_error {
        let _ = fs::remove_file(&zip_path);
        return Err(err.context(format!(
            "corpus download failed after {} attempts",
            config.attempts
        )));
    }

    info!("Downloaded {:.2} MB", bytes as f64 / (1024.0 * 1024.0));

    // Replace the old corpus only once the archive is on disk.
    if config.output_dir.exists() {
        fs::remove_dir_all(&config.output_dir)
            .with_context(|| format!("clearing {}", config.output_dir.display()))?;
    }
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    let files_extracted = extract_archive(&zip_path, &config.output_dir)?;
    let _ = fs::remove_file(&zip_path);

    info!(
        "Corpus ready: {} files in {}",
        files_extracted,
        config.output_dir.display()
    );

    Ok(DownloadReport {
        bytes,
        files_extracted,
    })
}

async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64> {
    let response = client
        .get(url)
        .send()
        .await
        .context("sending request")?
        .error_for_status()
        .context("server returned error status")?;

    if let Some(total) = response.content_length() {
        info!("Archive size: {:.2} MB", total as f64 / (1024.0 * 1024.0));
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("creating {}", dest.display()))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut next_progress = PROGRESS_EVERY_BYTES;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("reading response body")?;
        file.write_all(&chunk).await.context("writing archive")?;
        downloaded += chunk.len() as u64;

        if downloaded >= next_progress {
            info!("Downloaded {:.0} MB", downloaded as f64 / (1024.0 * 1024.0));
            next_progress += PROGRESS_EVERY_BYTES;
        }
    }

    file.flush().await.context("flushing archive")?;
    Ok(downloaded)
}

/// Unpack a ZIP archive, skipping entries that escape the target directory.
pub fn extract_archive(zip_path: &Path, output_dir: &Path) -> Result<usize> {
    let file = fs::File::open(zip_path)
        .with_context(|| format!("opening {}", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("reading ZIP archive")?;

    if archive.is_empty() {
        bail!("archive contains no entries");
    }

    info!("Archive contains {} entries", archive.len());

    let mut extracted = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("reading archive entry")?;

        // enclosed_name rejects absolute paths and `..` traversal
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry '{}'", entry.name());
            continue;
        };
        let target = output_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = fs::File::create(&target)
            .with_context(|| format!("creating {}", target.display()))?;
        io::copy(&mut entry, &mut out).context("writing extracted file")?;
        extracted += 1;
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_test_archive(entries: &[(&str, &[u8])]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
        let options = zip::write::SimpleFileOptions::default();

        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
        file
    }

    #[test]
    fn extract_archive_writes_all_files() {
        let archive = write_test_archive(&[
            ("fondos.txt", b"fund terms".as_slice()),
            ("dvag/productos.txt", b"product sheet".as_slice()),
        ]);
        let output = tempfile::tempdir().unwrap();

        let count = extract_archive(archive.path(), output.path()).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(output.path().join("fondos.txt")).unwrap(),
            "fund terms"
        );
        assert_eq!(
            fs::read_to_string(output.path().join("dvag/productos.txt")).unwrap(),
            "product sheet"
        );
    }

    #[test]
    fn extract_archive_skips_traversal_entries() {
        let archive = write_test_archive(&[
            ("../evil.txt", b"outside".as_slice()),
            ("safe.txt", b"inside".as_slice()),
        ]);
        let output = tempfile::tempdir().unwrap();

        let count = extract_archive(archive.path(), output.path()).unwrap();

        assert_eq!(count, 1);
        assert!(output.path().join("safe.txt").exists());
        assert!(!output.path().parent().unwrap().join("evil.txt").exists());
    }

    #[test]
    fn extract_archive_rejects_empty_archive() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let writer = zip::ZipWriter::new(file.reopen().unwrap());
        writer.finish().unwrap();

        let output = tempfile::tempdir().unwrap();
        let err = extract_archive(file.path(), output.path()).unwrap_err();
        assert!(err.to_string().contains("no entries"));
    }

    #[test]
    fn extract_archive_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<html>not a zip</html>").unwrap();

        let output = tempfile::tempdir().unwrap();
        assert!(extract_archive(file.path(), output.path()).is_err());
    }

    #[test]
    fn download_config_defaults() {
        let config = DownloadConfig::new("https://example.com/corpus.zip", "documents");
        assert_eq!(config.attempts, 3);
        assert_eq!(config.min_bytes, 1024);
        assert_eq!(config.output_dir, PathBuf::from("documents"));
    }

    #[tokio::test]
    async fn fetch_corpus_retries_then_fails() {
        let server = httpmock::MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/corpus.zip");
                then.status(500);
            })
            .await;

        let output = tempfile::tempdir().unwrap();
        let mut config = DownloadConfig::new(
            format!("{}/corpus.zip", server.base_url()),
            output.path().join("docs"),
        );
        config.retry_delay = Duration::from_millis(1);

        let err = fetch_corpus(&config).await.unwrap_err();
        assert!(err.to_string().contains("after 3 attempts"));
        mock.assert_calls(3);
    }

    #[tokio::test]
    async fn fetch_corpus_downloads_and_extracts() {
        // Build an in-memory archive to serve
        let archive = write_test_archive(&[("guia.txt", b"a".repeat(2048).as_slice())]);
        let body = fs::read(archive.path()).unwrap();

        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/corpus.zip");
                then.status(200).body(body.clone());
            })
            .await;

        let output = tempfile::tempdir().unwrap();
        let docs_dir = output.path().join("docs");
        let config = DownloadConfig::new(
            format!("{}/corpus.zip", server.base_url()),
            docs_dir.clone(),
        );

        let report = fetch_corpus(&config).await.unwrap();

        assert_eq!(report.files_extracted, 1);
        assert!(report.bytes >= 2048);
        assert!(docs_dir.join("guia.txt").exists());
    }
}
