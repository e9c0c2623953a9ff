//! Package archive creation and safe extraction
//!
//! Archives are gzip-compressed POSIX tar files with forward-slash relative
//! paths. Extraction never writes outside the destination directory.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Builder, EntryType, Header};
use walkdir::WalkDir;

use crate::error::{CoreError, IoContext, Result};
use crate::pack::PackageMetadata;

/// Result of packing a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    /// Lowercase hex SHA256 of the archive
    pub sha256: String,
    pub size: u64,
}

/// Extract a `.tar.gz` archive into `dest`
///
/// Every entry is checked before anything is written for it: absolute paths
/// and `..` segments abort the extraction with [`CoreError::PathTraversal`].
/// Earlier entries may already be on disk at that point; callers clear
/// `dest` before installing. Symlinks are created only on unix and only
/// when their target stays inside `dest`, otherwise they are skipped with a
/// warning. Hard links are always skipped.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path).io_context("open", archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    std::fs::create_dir_all(dest).io_context("create directory", dest)?;

    let entries = archive.entries().io_context("read archive", archive_path)?;
    for entry in entries {
        let mut entry = entry.io_context("read archive", archive_path)?;
        let raw = entry
            .path()
            .io_context("read entry path in", archive_path)?
            .into_owned();
        let rel = safe_relative_path(&raw)?;
        if rel.as_os_str().is_empty() {
            continue;
        }

        let kind = entry.header().entry_type();
        if kind.is_hard_link() {
            tracing::warn!(entry = %raw.display(), "skipping hard link entry");
            continue;
        }
        if kind.is_symlink() {
            let target = entry
                .link_name()
                .io_context("read link target in", archive_path)?
                .map(|t| t.into_owned());
            if !cfg!(unix) {
                tracing::warn!(entry = %raw.display(), "symlinks unsupported on this platform, skipping");
                continue;
            }
            match target {
                Some(target) if link_stays_inside(&rel, &target) => {}
                _ => {
                    tracing::warn!(entry = %raw.display(), "symlink points outside the package, skipping");
                    continue;
                }
            }
        }

        entry
            .unpack_in(dest)
            .io_context("extract", dest.join(&rel))?;
    }

    Ok(())
}

/// Normalize an entry path, rejecting anything that could leave the root
fn safe_relative_path(raw: &Path) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(CoreError::PathTraversal {
                    entry: raw.display().to_string(),
                });
            }
        }
    }
    Ok(out)
}

/// Lexically resolve a symlink target against the link's directory
fn link_stays_inside(link: &Path, target: &Path) -> bool {
    if target.is_absolute() {
        return false;
    }
    let mut depth: usize = link.components().count().saturating_sub(1);
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Pack a package directory into `<output_dir>/<name>-<version>.tar.gz`
///
/// The archive is reproducible: entries are sorted, mtimes are zeroed and
/// ownership is dropped. Hidden files and a stale copy of the output
/// archive are left out.
pub fn create_archive(pack_dir: &Path, output_dir: &Path) -> Result<ArchiveInfo> {
    let meta = PackageMetadata::load(pack_dir)?;
    let archive_name = meta.archive_name();

    let mut files = Vec::new();
    for entry in WalkDir::new(pack_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = entry.map_err(|e| CoreError::Io {
            action: "walk",
            path: pack_dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.depth() == 1 && entry.file_name().to_string_lossy() == archive_name {
            continue;
        }
        files.push(entry.into_path());
    }

    std::fs::create_dir_all(output_dir).io_context("create directory", output_dir)?;
    let output = output_dir.join(&archive_name);
    let file = File::create(&output).io_context("create", &output)?;
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

    for path in &files {
        let rel = path.strip_prefix(pack_dir).unwrap_or(path);
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        add_file_to_archive(&mut builder, path, &name).io_context("archive", path)?;
    }

    let encoder = builder.into_inner().io_context("write", &output)?;
    encoder.finish().io_context("write", &output)?;

    let sha256 = sha256_file(&output)?;
    let size = std::fs::metadata(&output).io_context("stat", &output)?.len();

    tracing::info!(archive = %output.display(), files = files.len(), "created package archive");
    Ok(ArchiveInfo {
        path: output,
        sha256,
        size,
    })
}

fn add_file_to_archive<W: Write>(
    builder: &mut Builder<W>,
    file_path: &Path,
    archive_path: &str,
) -> io::Result<()> {
    let content = std::fs::read(file_path)?;
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(content.len() as u64);
    header.set_mode(file_mode(file_path));
    header.set_mtime(0);
    header.set_cksum();
    builder.append_data(&mut header, archive_path, content.as_slice())
}

#[cfg(unix)]
fn file_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) if meta.permissions().mode() & 0o111 != 0 => 0o755,
        _ => 0o644,
    }
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> u32 {
    0o644
}

/// Hex SHA256 of a file, streamed
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).io_context("open", path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).io_context("read", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compare a computed hex digest with a declared one
///
/// The declared value may carry a `sha256:` prefix and any letter case.
pub fn digest_matches(actual: &str, expected: &str) -> bool {
    let expected = expected.trim();
    let expected = expected.strip_prefix("sha256:").unwrap_or(expected);
    !expected.is_empty() && actual.eq_ignore_ascii_case(expected)
}
