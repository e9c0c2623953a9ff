//! Installation of packages into `<root>/repos/<name>`
//!
//! There is no install ledger: a package is installed when its directory
//! exists, and its version is read back from the descriptor inside it.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use idepack_core::{
    CoreError, DESCRIPTOR_FILE, IoContext, PackageMetadata, PathLayout, Platform, Settings,
    strip_platform_suffix, validate_name,
};

use crate::download::{Downloader, tarball_url};
use crate::error::{RepoError, Result};
use crate::http::HttpClient;
use crate::resolver::RegistryResolver;

/// Outcome of a single successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    /// Symlink created in the shared bin directory
    pub bin_link: Option<PathBuf>,
}

/// Per-package results of a batch install
#[derive(Debug, Default)]
pub struct BatchReport {
    pub installed: Vec<InstalledPackage>,
    /// `(name, reason)`
    pub skipped: Vec<(String, String)>,
    pub failed: Vec<(String, RepoError)>,
}

impl BatchReport {
    /// Turn any failure into a summary error
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(RepoError::PartialBatchFailure {
                succeeded: self.installed.len(),
                skipped: self.skipped.len(),
                failed: self.failed.len(),
            })
        }
    }
}

pub struct Installer {
    layout: PathLayout,
    settings: Settings,
    downloader: Downloader,
    platform: Platform,
}

impl Installer {
    pub fn new(layout: &PathLayout, settings: &Settings) -> Result<Self> {
        let http = HttpClient::new(settings)?;
        Ok(Self {
            layout: layout.clone(),
            settings: settings.clone(),
            downloader: Downloader::new(layout, http),
            platform: Platform::current(),
        })
    }

    /// Override the detected platform
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Download, verify and extract a package, replacing any previous install
    ///
    /// Everything that can be checked up front (checksum presence, platform
    /// support, tarball URL) is checked before the old install directory is
    /// touched, and the archive is fetched before it is removed.
    pub async fn install(&self, meta: &PackageMetadata) -> Result<InstalledPackage> {
        meta.validate_identity()?;
        if meta.dist.sha256.trim().is_empty() {
            return Err(RepoError::MissingChecksum {
                name: meta.name.clone(),
            });
        }
        let executable = match &meta.bin {
            Some(spec) => Some(spec.select(&self.platform)?.to_string()),
            None => None,
        };
        let url = tarball_url(meta, &self.settings)?;

        let archive = self
            .downloader
            .download(&url, &meta.name, &meta.version, &meta.dist.sha256)
            .await?;

        let install_dir = self.layout.install_dir(&meta.name);
        self.remove_install_dir(&meta.name, &install_dir)?;
        self.downloader.extract(&archive, &install_dir)?;

        if !install_dir.join(DESCRIPTOR_FILE).is_file() {
            tracing::debug!(name = %meta.name, "archive has no descriptor, writing registry metadata");
            write_descriptor(meta, &install_dir)?;
        }

        let bin_link = match executable {
            Some(rel) => self.link_executable(&meta.name, &install_dir, &rel)?,
            None => None,
        };

        tracing::info!(name = %meta.name, version = %meta.version, "installed");
        Ok(InstalledPackage {
            name: meta.name.clone(),
            version: meta.version.clone(),
            path: install_dir,
            bin_link,
        })
    }

    /// Remove a package; returns `false` without touching disk if absent
    pub fn uninstall(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        let install_dir = self.layout.install_dir(name);
        if !install_dir.exists() {
            tracing::debug!(name, "not installed, nothing to remove");
            return Ok(false);
        }
        self.remove_install_dir(name, &install_dir)?;
        tracing::info!(name, "uninstalled");
        Ok(true)
    }

    pub fn is_installed(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.layout.install_dir(name).is_dir()
    }

    /// Version from the installed descriptor, `None` when not installed
    pub fn installed_version(&self, name: &str) -> Result<Option<String>> {
        validate_name(name)?;
        let install_dir = self.layout.install_dir(name);
        if !install_dir.is_dir() {
            return Ok(None);
        }
        match PackageMetadata::load(&install_dir) {
            Ok(meta) => Ok(Some(meta.version)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Descriptors of every installed package, sorted by name
    pub fn list_installed(&self) -> Result<Vec<PackageMetadata>> {
        let repos = self.layout.repos_dir();
        let entries = match std::fs::read_dir(&repos) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            other => other.io_context("read directory", &repos)?,
        };

        let mut installed = Vec::new();
        for entry in entries {
            let path = entry.io_context("read directory", &repos)?.path();
            if !path.is_dir() {
                continue;
            }
            match PackageMetadata::load(&path) {
                Ok(meta) => installed.push(meta),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable install")
                }
            }
        }
        installed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(installed)
    }

    /// Install several packages and their dependencies
    ///
    /// Dependencies are installed before the packages that need them. A
    /// failure is recorded and the batch carries on. Unless `force` is set,
    /// packages already installed at the resolved version are skipped.
    pub async fn install_many(
        &self,
        resolver: &RegistryResolver,
        names: &[String],
        force: bool,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut seen = HashSet::new();

        for name in names {
            let mut order = Vec::new();
            collect_install_order(resolver, name, &mut seen, &mut order, &mut report);

            for pack in order {
                let name = pack.meta.name.clone();
                if pack.is_linked() {
                    report
                        .skipped
                        .push((name, "linked development pack".to_string()));
                    continue;
                }
                if !force {
                    match self.installed_version(&name) {
                        Ok(Some(version)) if version == pack.meta.version => {
                            report
                                .skipped
                                .push((name, format!("{version} already installed")));
                            continue;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            report.failed.push((name, e));
                            continue;
                        }
                    }
                }
                match self.install(&pack.meta).await {
                    Ok(installed) => report.installed.push(installed),
                    Err(e) => {
                        tracing::warn!(name = %name, error = %e, "install failed");
                        report.failed.push((name, e));
                    }
                }
            }
        }

        report
    }

    fn remove_install_dir(&self, name: &str, install_dir: &Path) -> Result<()> {
        if !install_dir.exists() {
            return Ok(());
        }
        self.remove_bin_links(install_dir)?;
        std::fs::remove_dir_all(install_dir).io_context("remove", install_dir)?;
        tracing::debug!(name, "removed previous install");
        Ok(())
    }

    /// Expose an executable as `<bin>/<name without platform suffix>`
    fn link_executable(
        &self,
        name: &str,
        install_dir: &Path,
        rel: &str,
    ) -> Result<Option<PathBuf>> {
        let rel_path = Path::new(rel);
        if !rel_path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(CoreError::PathTraversal {
                entry: rel.to_string(),
            }
            .into());
        }

        let source = install_dir.join(rel_path);
        if !source.is_file() {
            return Err(RepoError::MissingExecutable {
                name: name.to_string(),
                path: rel.to_string(),
            });
        }

        let Some(file_name) = source.file_name().map(|f| f.to_string_lossy().into_owned()) else {
            return Ok(None);
        };
        let link = self.layout.bin_dir().join(strip_platform_suffix(&file_name));
        create_symlink(&source, &link)
    }

    /// Drop bin symlinks that point into `install_dir`
    fn remove_bin_links(&self, install_dir: &Path) -> Result<()> {
        let bin_dir = self.layout.bin_dir();
        let entries = match std::fs::read_dir(&bin_dir) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            other => other.io_context("read directory", &bin_dir)?,
        };

        for entry in entries {
            let link = entry.io_context("read directory", &bin_dir)?.path();
            let Ok(target) = std::fs::read_link(&link) else {
                continue;
            };
            if target.starts_with(install_dir) {
                std::fs::remove_file(&link).io_context("remove", &link)?;
                tracing::debug!(link = %link.display(), "removed bin link");
            }
        }
        Ok(())
    }
}

/// Depth-first dependency walk; each name is visited once per batch
fn collect_install_order(
    resolver: &RegistryResolver,
    name: &str,
    seen: &mut HashSet<String>,
    order: &mut Vec<crate::resolver::ResolvedPack>,
    report: &mut BatchReport,
) {
    if !seen.insert(name.to_string()) {
        return;
    }
    let pack = match resolver.resolve_pack(name) {
        Ok(pack) => pack,
        Err(e) => {
            report.failed.push((name.to_string(), e));
            return;
        }
    };
    for dep in &pack.meta.dependencies {
        collect_install_order(resolver, dep, seen, order, report);
    }
    order.push(pack);
}

fn write_descriptor(meta: &PackageMetadata, dir: &Path) -> Result<()> {
    let path = dir.join(DESCRIPTOR_FILE);
    let mut content = serde_json::to_string_pretty(meta).map_err(CoreError::from)?;
    content.push('\n');
    std::fs::write(&path, content).io_context("write", &path)?;
    Ok(())
}

#[cfg(unix)]
fn create_symlink(source: &Path, link: &Path) -> Result<Option<PathBuf>> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(source, std::fs::Permissions::from_mode(0o755))
        .io_context("set permissions on", source)?;

    if let Some(parent) = link.parent() {
        std::fs::create_dir_all(parent).io_context("create directory", parent)?;
    }
    if std::fs::symlink_metadata(link).is_ok() {
        std::fs::remove_file(link).io_context("remove", link)?;
    }
    std::os::unix::fs::symlink(source, link).io_context("symlink", link)?;
    tracing::debug!(link = %link.display(), target = %source.display(), "linked executable");
    Ok(Some(link.to_path_buf()))
}

#[cfg(not(unix))]
fn create_symlink(source: &Path, _link: &Path) -> Result<Option<PathBuf>> {
    tracing::warn!(
        target = %source.display(),
        "symlinks are not supported on this platform, executable not linked"
    );
    Ok(None)
}
