//! Tool artifact download with progress reporting

use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use futures_util::StreamExt;
use sha2::{Digest, Sha256};

use crate::error::{BuildError, Result};

pub struct Downloader {
    client: reqwest::Client,
}

/// What [`Downloader::ensure`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Present,
    Downloaded,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("diagram-build/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Client that ignores proxy settings, for talking to loopback test servers.
    #[cfg(test)]
    pub(crate) fn local() -> Self {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Self { client }
    }

    /// Make sure `dest` exists, fetching it from `url` when it does not.
    ///
    /// No request is made when the file is already there, unless `force` is set.
    pub async fn ensure<F>(
        &self,
        url: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
        force: bool,
        progress_callback: F,
    ) -> Result<ToolStatus>
    where
        F: FnMut(u64, Option<u64>),
    {
        if dest.exists() && !force {
            tracing::debug!("Tool artifact present at {}", dest.display());
            return Ok(ToolStatus::Present);
        }

        self.download(url, dest, expected_sha256, progress_callback).await?;
        Ok(ToolStatus::Downloaded)
    }

    /// Stream `url` into `dest`.
    ///
    /// The body goes to `<dest>.part` first and is renamed once complete.
    pub async fn download<F>(
        &self,
        url: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
        mut progress_callback: F,
    ) -> Result<()>
    where
        F: FnMut(u64, Option<u64>),
    {
        // Reject a malformed digest before spending bandwidth on it
        let expected = expected_sha256.map(parse_digest).transpose()?;

        tracing::info!("Fetching {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BuildError::Download {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let total_size = response.content_length();
        let part_path = part_path(dest);
        let mut file =
            std::fs::File::create(&part_path).map_err(|e| BuildError::io(&part_path, e))?;

        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        let streamed: Result<()> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).map_err(|e| BuildError::io(&part_path, e))?;
                hasher.update(&chunk);

                downloaded += chunk.len() as u64;
                progress_callback(downloaded, total_size);
            }
            file.flush().map_err(|e| BuildError::io(&part_path, e))
        }
        .await;
        drop(file);

        if let Err(e) = streamed {
            let _ = std::fs::remove_file(&part_path);
            return Err(e);
        }

        if let Some(expected) = expected {
            let actual: [u8; 32] = hasher.finalize().into();
            if actual != expected {
                let _ = std::fs::remove_file(&part_path);
                return Err(BuildError::ChecksumMismatch {
                    expected: hex::encode(expected),
                    actual: hex::encode(actual),
                });
            }
            tracing::debug!("Checksum verified for {}", dest.display());
        }

        std::fs::rename(&part_path, dest).map_err(|e| BuildError::io(dest, e))?;
        tracing::info!("Saved {} ({} bytes)", dest.display(), downloaded);

        Ok(())
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Accepts lowercase/uppercase hex or the SRI form `sha256-<base64>`.
pub fn parse_digest(value: &str) -> Result<[u8; 32]> {
    let value = value.trim();
    let invalid = || BuildError::InvalidDigest(value.to_string());

    let bytes = if let Some(b64) = value.strip_prefix("sha256-") {
        base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|_| invalid())?
    } else {
        hex::decode(value).map_err(|_| invalid())?
    };

    bytes.try_into().map_err(|_| invalid())
}
