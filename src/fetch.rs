use std::fs;
use std::io;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::checksum::{self, ChecksumAlgorithm};
use crate::error::ResolvError;
use crate::fs_util;

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub target_path: Option<Utf8PathBuf>,
    pub ephemeral: bool,
    pub ephemeral_suffix: Option<String>,
    pub checksum: Option<String>,
    pub checksum_algorithm: ChecksumAlgorithm,
    pub force_overwrite: bool,
    pub allow_invalid_checksum: bool,
}

impl FetchRequest {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            target_path: None,
            ephemeral: false,
            ephemeral_suffix: None,
            checksum: None,
            checksum_algorithm: ChecksumAlgorithm::default(),
            force_overwrite: false,
            allow_invalid_checksum: false,
        }
    }
}

pub trait SourceFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Utf8PathBuf, ResolvError>;
}

enum ResolvedTarget {
    /// An existing, already-validated file; no transfer needed.
    Skip(Utf8PathBuf),
    Fresh(Utf8PathBuf),
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ResolvError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("resolv-data/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ResolvError::Transfer(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| ResolvError::Transfer(err.to_string()))?;
        Ok(Self { client })
    }

    fn resolve_target(&self, request: &FetchRequest) -> Result<ResolvedTarget, ResolvError> {
        if request.ephemeral {
            if let Some(path) = &request.target_path {
                tracing::warn!(
                    "the given target path {path} is ignored for an ephemeral fetch"
                );
            }
            return Ok(ResolvedTarget::Fresh(ephemeral_target(
                request.ephemeral_suffix.as_deref(),
            )?));
        }

        let Some(target) = request.target_path.clone() else {
            return Ok(ResolvedTarget::Fresh(ephemeral_target(
                request.ephemeral_suffix.as_deref(),
            )?));
        };

        if target.as_std_path().exists() {
            if request.force_overwrite {
                fs_util::remove_path(&target)?;
            } else {
                // A stale cached file is never trusted without one validation.
                if !request.allow_invalid_checksum {
                    if let Some(expected) = &request.checksum {
                        checksum::ensure_checksum(&target, expected, request.checksum_algorithm)?;
                    }
                }
                tracing::info!("found existing file {target}; skipping download");
                return Ok(ResolvedTarget::Skip(target));
            }
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
        }
        Ok(ResolvedTarget::Fresh(target))
    }

    fn transfer(&self, url: &str, target: &Utf8Path) -> Result<(), ResolvError> {
        let mut response = self.client.get(url).send().map_err(|err| {
            let _ = fs::remove_file(target.as_std_path());
            ResolvError::Transfer(format!("{url}: {err}"))
        })?;
        if !response.status().is_success() {
            let _ = fs::remove_file(target.as_std_path());
            return Err(ResolvError::TransferStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let mut file = fs::File::create(target.as_std_path())
            .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
        if let Err(err) = io::copy(&mut response, &mut file) {
            drop(file);
            let _ = fs::remove_file(target.as_std_path());
            return Err(ResolvError::Transfer(format!("{url}: {err}")));
        }
        Ok(())
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Utf8PathBuf, ResolvError> {
        let target = match self.resolve_target(request)? {
            ResolvedTarget::Skip(path) => return Ok(path),
            ResolvedTarget::Fresh(path) => path,
        };

        tracing::info!("downloading source {} to {target}", request.url);
        self.transfer(&request.url, &target)?;

        // On mismatch the file stays on disk for diagnostics.
        if !request.allow_invalid_checksum {
            if let Some(expected) = &request.checksum {
                checksum::ensure_checksum(&target, expected, request.checksum_algorithm)?;
            }
        }
        Ok(target)
    }
}

fn ephemeral_target(suffix: Option<&str>) -> Result<Utf8PathBuf, ResolvError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("resolv-data-");
    let suffix = suffix.map(|suffix| format!("_{suffix}"));
    if let Some(suffix) = &suffix {
        builder.suffix(suffix.as_str());
    }
    let file = builder
        .tempfile()
        .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    let (_, path) = file
        .keep()
        .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    fs_util::utf8_path(path)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn existing_target(content: &[u8]) -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("source.bin")).unwrap();
        fs::write(path.as_std_path(), content).unwrap();
        (temp, path)
    }

    #[test]
    fn existing_file_short_circuits_without_network() {
        let (_temp, path) = existing_target(b"hello world");
        let fetcher = HttpFetcher::new().unwrap();
        let request = FetchRequest {
            target_path: Some(path.clone()),
            checksum: Some("5eb63bbbe01eeed093cb22bb8f5acdc3".to_string()),
            checksum_algorithm: ChecksumAlgorithm::Md5,
            ..FetchRequest::new("http://127.0.0.1:9/unreachable")
        };
        let resolved = fetcher.fetch(&request).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn stale_existing_file_fails_checksum_validation() {
        let (_temp, path) = existing_target(b"stale bytes");
        let fetcher = HttpFetcher::new().unwrap();
        let request = FetchRequest {
            target_path: Some(path),
            checksum: Some("deadbeef".to_string()),
            ..FetchRequest::new("http://127.0.0.1:9/unreachable")
        };
        let err = fetcher.fetch(&request).unwrap_err();
        assert_matches!(err, ResolvError::ChecksumMismatch { .. });
    }

    #[test]
    fn invalid_checksum_override_trusts_existing_file() {
        let (_temp, path) = existing_target(b"stale bytes");
        let fetcher = HttpFetcher::new().unwrap();
        let request = FetchRequest {
            target_path: Some(path.clone()),
            checksum: Some("deadbeef".to_string()),
            allow_invalid_checksum: true,
            ..FetchRequest::new("http://127.0.0.1:9/unreachable")
        };
        assert_eq!(fetcher.fetch(&request).unwrap(), path);
    }

    #[test]
    fn failed_transfer_leaves_no_file_at_the_target() {
        let (_temp, path) = existing_target(b"old contents");
        let fetcher = HttpFetcher::new().unwrap();
        let request = FetchRequest {
            target_path: Some(path.clone()),
            force_overwrite: true,
            ..FetchRequest::new("http://127.0.0.1:9/unreachable")
        };
        let err = fetcher.fetch(&request).unwrap_err();
        assert_matches!(err, ResolvError::Transfer(_));
        assert!(!path.as_std_path().exists());
    }

    #[test]
    fn ephemeral_fetch_ignores_the_given_target_path() {
        let temp = tempfile::tempdir().unwrap();
        let advisory = Utf8PathBuf::from_path_buf(temp.path().join("advisory.bin")).unwrap();
        let fetcher = HttpFetcher::new().unwrap();
        let request = FetchRequest {
            target_path: Some(advisory.clone()),
            ephemeral: true,
            ephemeral_suffix: Some("sample.zip".to_string()),
            ..FetchRequest::new("http://127.0.0.1:9/unreachable")
        };
        let resolved = fetcher.resolve_target(&request).unwrap();
        match resolved {
            ResolvedTarget::Fresh(path) => {
                assert_ne!(path, advisory);
                assert!(path.as_str().ends_with("_sample.zip"));
                fs::remove_file(path.as_std_path()).unwrap();
            }
            ResolvedTarget::Skip(_) => panic!("ephemeral targets are always fresh"),
        }
    }
}
