//! Cached, checksum-verified package downloads
//!
//! Archives are cached at `cache/packages/<name>-<version>.tar.gz`. A cached
//! file is trusted only after its SHA256 is recomputed and matches the
//! declared checksum; anything else triggers a fresh fetch.

use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

use idepack_core::{
    IoContext, PackageMetadata, PathLayout, Settings, digest_matches, sha256_file, validate_name,
    validate_version,
};

use crate::error::{RepoError, Result, network_error, parse_url};
use crate::http::HttpClient;

#[derive(Debug, Clone)]
pub struct Downloader {
    layout: PathLayout,
    http: HttpClient,
}

impl Downloader {
    pub fn new(layout: &PathLayout, http: HttpClient) -> Self {
        Self {
            layout: layout.clone(),
            http,
        }
    }

    /// Fetch `url` into the cache and return the verified archive path
    ///
    /// No request is made when a cached archive already matches `expected`.
    /// On mismatch after download nothing is left in the cache.
    pub async fn download(
        &self,
        url: &str,
        name: &str,
        version: &str,
        expected: &str,
    ) -> Result<PathBuf> {
        if expected.trim().is_empty() {
            return Err(RepoError::MissingChecksum {
                name: name.to_string(),
            });
        }

        validate_name(name)?;
        validate_version(version)?;

        let cache_path = self.layout.cache_path(name, version);
        if self.cache_is_valid(&cache_path, expected) {
            tracing::debug!(path = %cache_path.display(), "using cached archive");
            return Ok(cache_path);
        }

        let cache_dir = self.layout.cache_dir();
        std::fs::create_dir_all(&cache_dir).io_context("create directory", &cache_dir)?;

        tracing::info!(%url, name, version, "downloading");
        let mut response = self.http.get(url).await?;

        // Same directory as the final path so the rename below stays on one filesystem
        let mut tmp = tempfile::Builder::new()
            .prefix("download-")
            .suffix(".tmp")
            .tempfile_in(&cache_dir)
            .io_context("create temp file in", &cache_dir)?;

        let mut hasher = Sha256::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| network_error(url, e))? {
            hasher.update(&chunk);
            tmp.write_all(&chunk).io_context("write", tmp.path())?;
        }
        tmp.as_file().sync_all().io_context("sync", tmp.path())?;

        let actual = hex::encode(hasher.finalize());
        if !digest_matches(&actual, expected) {
            return Err(RepoError::ChecksumMismatch {
                name: name.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }

        persist(tmp, &cache_path)?;
        tracing::debug!(path = %cache_path.display(), "cached archive");
        Ok(cache_path)
    }

    /// Extract a verified archive into `dest`
    pub fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        idepack_core::extract_archive(archive, dest)?;
        Ok(())
    }

    fn cache_is_valid(&self, cache_path: &Path, expected: &str) -> bool {
        if !cache_path.is_file() {
            return false;
        }
        match sha256_file(cache_path) {
            Ok(actual) if digest_matches(&actual, expected) => true,
            Ok(actual) => {
                tracing::warn!(
                    path = %cache_path.display(),
                    expected,
                    %actual,
                    "cached archive failed verification, downloading again"
                );
                // a failed fetch below must not leave the bad archive behind
                if let Err(e) = std::fs::remove_file(cache_path) {
                    tracing::warn!(path = %cache_path.display(), error = %e, "failed to remove cached archive");
                }
                false
            }
            Err(e) => {
                tracing::warn!(path = %cache_path.display(), error = %e, "unreadable cached archive");
                false
            }
        }
    }

    /// Remove every cached archive, returning how many files were deleted
    pub fn clean(&self) -> Result<usize> {
        let cache_dir = self.layout.cache_dir();
        let entries = match std::fs::read_dir(&cache_dir) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            other => other.io_context("read directory", &cache_dir)?,
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry.io_context("read directory", &cache_dir)?.path();
            if path.is_file() {
                std::fs::remove_file(&path).io_context("remove", &path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Move the verified temp file into place, copying when rename is refused
fn persist(tmp: tempfile::NamedTempFile, dest: &Path) -> Result<()> {
    match tmp.persist(dest) {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::debug!(error = %e.error, "rename failed, copying instead");
            std::fs::copy(e.file.path(), dest).io_context("copy to", dest)?;
            Ok(())
        }
    }
}

/// Work out where a package's tarball lives
///
/// - absolute `http(s)://` tarballs are used verbatim
/// - with a repository: `<repository>/releases/download/v<version>/<tarball>`
/// - otherwise relative to `download_base_url`, defaulting to the directory
///   holding the official registry document
pub fn tarball_url(meta: &PackageMetadata, settings: &Settings) -> Result<String> {
    let tarball = if meta.dist.tarball.is_empty() {
        meta.archive_name()
    } else {
        meta.dist.tarball.clone()
    };

    if tarball.starts_with("http://") || tarball.starts_with("https://") {
        return Ok(tarball);
    }

    if let Some(repository) = meta.repository.as_deref().filter(|r| !r.is_empty()) {
        let repository = repository.trim_end_matches('/').trim_end_matches(".git");
        return Ok(format!(
            "{repository}/releases/download/v{}/{tarball}",
            meta.version
        ));
    }

    let base = match &settings.download_base_url {
        Some(base) => format!("{}/", base.trim_end_matches('/')),
        None => settings.registry_url.clone(),
    };
    let url = parse_url(&base)?
        .join(&tarball)
        .map_err(|e| RepoError::InvalidUrl {
            url: tarball.clone(),
            reason: e.to_string(),
        })?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sha(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    fn downloader(dir: &TempDir) -> (Downloader, PathLayout) {
        let layout = PathLayout::with_root(dir.path());
        let http = HttpClient::new(&Settings::default()).unwrap();
        (Downloader::new(&layout, http), layout)
    }

    #[tokio::test]
    async fn test_download_verifies_and_caches() {
        let server = MockServer::start().await;
        let body = b"archive-bytes".to_vec();
        Mock::given(method("GET"))
            .and(path("/docs-1.0.0.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (dl, layout) = downloader(&dir);
        let url = format!("{}/docs-1.0.0.tar.gz", server.uri());

        let path = dl.download(&url, "docs", "1.0.0", &sha(&body)).await.unwrap();
        assert_eq!(path, layout.cache_path("docs", "1.0.0"));
        assert_eq!(std::fs::read(&path).unwrap(), body);

        // only the final file remains in the cache directory
        let names: Vec<_> = std::fs::read_dir(layout.cache_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_valid_cache_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"other".to_vec()))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (dl, layout) = downloader(&dir);
        let cached = b"cached-archive";
        std::fs::create_dir_all(layout.cache_dir()).unwrap();
        std::fs::write(layout.cache_path("docs", "1.0.0"), cached).unwrap();

        let url = format!("{}/docs-1.0.0.tar.gz", server.uri());
        let path = dl.download(&url, "docs", "1.0.0", &sha(cached)).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), cached);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_fetched_once_and_replaced() {
        let server = MockServer::start().await;
        let fresh = b"fresh-archive".to_vec();
        Mock::given(method("GET"))
            .and(path("/docs-1.0.0.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(fresh.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (dl, layout) = downloader(&dir);
        std::fs::create_dir_all(layout.cache_dir()).unwrap();
        std::fs::write(layout.cache_path("docs", "1.0.0"), b"stale").unwrap();

        let url = format!("{}/docs-1.0.0.tar.gz", server.uri());
        let path = dl.download(&url, "docs", "1.0.0", &sha(&fresh)).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), fresh);
    }

    #[tokio::test]
    async fn test_corrupt_cache_removed_when_fetch_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (dl, layout) = downloader(&dir);
        let cache_path = layout.cache_path("docs", "1.0.0");
        std::fs::create_dir_all(layout.cache_dir()).unwrap();
        std::fs::write(&cache_path, b"stale").unwrap();

        let url = format!("{}/docs-1.0.0.tar.gz", server.uri());
        let err = dl
            .download(&url, "docs", "1.0.0", &sha(b"fresh"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NetworkFailure { .. }));
        assert!(!cache_path.exists());
    }

    #[tokio::test]
    async fn test_download_rejects_path_like_identity() {
        let dir = TempDir::new().unwrap();
        let (dl, layout) = downloader(&dir);
        let url = "http://127.0.0.1:9/x.tar.gz";

        for (name, version) in [("../victim", "1.0.0"), ("docs", "../../x")] {
            let err = dl.download(url, name, version, "abc").await.unwrap_err();
            assert!(matches!(err, RepoError::Core(_)), "{err}");
        }
        assert!(!layout.cache_dir().exists());
    }

    #[tokio::test]
    async fn test_checksum_mismatch_leaves_no_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (dl, layout) = downloader(&dir);
        let url = format!("{}/docs-1.0.0.tar.gz", server.uri());

        let err = dl
            .download(&url, "docs", "1.0.0", &sha(b"original"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::ChecksumMismatch { .. }));
        assert!(!layout.cache_path("docs", "1.0.0").exists());
        assert_eq!(std::fs::read_dir(layout.cache_dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_http_error_is_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (dl, _) = downloader(&dir);
        let url = format!("{}/docs-1.0.0.tar.gz", server.uri());

        let err = dl.download(&url, "docs", "1.0.0", "abc").await.unwrap_err();
        assert!(matches!(err, RepoError::NetworkFailure { .. }));
    }

    #[tokio::test]
    async fn test_missing_checksum_rejected() {
        let dir = TempDir::new().unwrap();
        let (dl, _) = downloader(&dir);
        let err = dl
            .download("http://127.0.0.1:9/x.tar.gz", "docs", "1.0.0", "")
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::MissingChecksum { .. }));
    }

    #[test]
    fn test_clean_removes_cached_archives() {
        let dir = TempDir::new().unwrap();
        let (dl, layout) = downloader(&dir);
        assert_eq!(dl.clean().unwrap(), 0);

        std::fs::create_dir_all(layout.cache_dir()).unwrap();
        std::fs::write(layout.cache_path("a", "1.0.0"), b"a").unwrap();
        std::fs::write(layout.cache_path("b", "2.0.0"), b"b").unwrap();
        assert_eq!(dl.clean().unwrap(), 2);
        assert!(!layout.cache_path("a", "1.0.0").exists());
    }

    fn meta(json: &str) -> PackageMetadata {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_tarball_url_absolute() {
        let m = meta(r#"{"name": "a", "dist": {"tarball": "https://cdn.example.com/a.tgz"}}"#);
        assert_eq!(
            tarball_url(&m, &Settings::default()).unwrap(),
            "https://cdn.example.com/a.tgz"
        );
    }

    #[test]
    fn test_tarball_url_repository_release() {
        let m = meta(
            r#"{"name": "a", "version": "1.2.0", "repository": "https://github.com/acme/a.git",
                "dist": {"tarball": "a-1.2.0.tar.gz"}}"#,
        );
        assert_eq!(
            tarball_url(&m, &Settings::default()).unwrap(),
            "https://github.com/acme/a/releases/download/v1.2.0/a-1.2.0.tar.gz"
        );
    }

    #[test]
    fn test_tarball_url_relative_to_registry() {
        let m = meta(r#"{"name": "docs", "version": "1.0.0"}"#);
        let settings = Settings {
            registry_url: "https://example.com/registry/registry.json".into(),
            ..Settings::default()
        };
        assert_eq!(
            tarball_url(&m, &settings).unwrap(),
            "https://example.com/registry/docs-1.0.0.tar.gz"
        );

        let settings = Settings {
            download_base_url: Some("https://cdn.example.com/packs".into()),
            ..settings
        };
        assert_eq!(
            tarball_url(&m, &settings).unwrap(),
            "https://cdn.example.com/packs/docs-1.0.0.tar.gz"
        );
    }
}
