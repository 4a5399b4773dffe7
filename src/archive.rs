use std::fs;
use std::io;

use bzip2::read::BzDecoder;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use xz2::read::XzDecoder;
use zip::ZipArchive;

use crate::error::ResolvError;
use crate::fs_util;

// Compound suffixes first so `.tar.gz` wins over `.gz`.
const SUPPORTED_SUFFIXES: &[(&str, ArchiveKind)] = &[
    (".tar.gz", ArchiveKind::TarGz),
    (".tgz", ArchiveKind::TarGz),
    (".tar.xz", ArchiveKind::TarXz),
    (".txz", ArchiveKind::TarXz),
    (".tar.bz2", ArchiveKind::TarBz2),
    (".tar.bz", ArchiveKind::TarBz2),
    (".tbz", ArchiveKind::TarBz2),
    (".tar", ArchiveKind::Tar),
    (".zip", ArchiveKind::Zip),
    (".xz", ArchiveKind::Xz),
    (".gz", ArchiveKind::Gz),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
    TarXz,
    TarBz2,
    Gz,
    Xz,
}

impl ArchiveKind {
    pub fn infer(filename: &str) -> Option<ArchiveKind> {
        SUPPORTED_SUFFIXES
            .iter()
            .find(|(suffix, _)| filename.ends_with(suffix))
            .map(|(_, kind)| *kind)
    }

    fn is_container(self) -> bool {
        !matches!(self, ArchiveKind::Gz | ArchiveKind::Xz)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub kind: Option<ArchiveKind>,
    pub flatten_root: bool,
    pub cleanup_source: bool,
}

pub fn extract_archive(
    archive_path: &Utf8Path,
    output_path: Option<&Utf8Path>,
    options: &ExtractOptions,
) -> Result<Utf8PathBuf, ResolvError> {
    let kind = match options.kind {
        Some(kind) => kind,
        None => ArchiveKind::infer(archive_name(archive_path)?).ok_or_else(|| {
            ResolvError::UnsupportedFormat(format!(
                "cannot infer archive kind from {archive_path}"
            ))
        })?,
    };
    let output_path = match output_path {
        Some(path) => path.to_path_buf(),
        None => default_output_path(archive_path)?,
    };

    tracing::info!("extracting archive {archive_path} to {output_path}");
    match kind {
        ArchiveKind::Zip => extract_zip(archive_path, &output_path)?,
        ArchiveKind::Tar => {
            let file = open_archive(archive_path)?;
            unpack_tar(file, archive_path, &output_path)?;
        }
        ArchiveKind::TarGz => {
            let file = open_archive(archive_path)?;
            unpack_tar(GzDecoder::new(file), archive_path, &output_path)?;
        }
        ArchiveKind::TarXz => {
            let file = open_archive(archive_path)?;
            unpack_tar(XzDecoder::new(file), archive_path, &output_path)?;
        }
        ArchiveKind::TarBz2 => {
            let file = open_archive(archive_path)?;
            unpack_tar(BzDecoder::new(file), archive_path, &output_path)?;
        }
        ArchiveKind::Gz => {
            let file = open_archive(archive_path)?;
            decompress_stream(GzDecoder::new(file), archive_path, &output_path)?;
        }
        ArchiveKind::Xz => {
            let file = open_archive(archive_path)?;
            decompress_stream(XzDecoder::new(file), archive_path, &output_path)?;
        }
    }

    if options.flatten_root {
        if !kind.is_container() {
            return Err(ResolvError::ArchiveLayout(format!(
                "{archive_path} is a single-stream archive and has no root directory to flatten"
            )));
        }
        flatten_root(&output_path)?;
    }

    if options.cleanup_source {
        tracing::info!("removing source archive {archive_path}");
        fs::remove_file(archive_path.as_std_path())
            .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    }

    Ok(output_path)
}

fn extract_zip(zip_path: &Utf8Path, target_dir: &Utf8Path) -> Result<(), ResolvError> {
    let file = open_archive(zip_path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| ResolvError::Filesystem(err.to_string()))?;

    fs::create_dir_all(target_dir.as_std_path())
        .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.as_std_path().join(path),
            None => {
                return Err(ResolvError::Filesystem(
                    "zip entry path traversal detected".to_string(),
                ));
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&entry_path)
                .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
            continue;
        }

        if let Some(parent) = entry_path.parent() {
            fs::create_dir_all(parent).map_err(|err| ResolvError::Filesystem(err.to_string()))?;
        }
        let mut outfile =
            fs::File::create(&entry_path).map_err(|err| ResolvError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile)
            .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    }
    Ok(())
}

fn unpack_tar(
    reader: impl io::Read,
    archive_path: &Utf8Path,
    target_dir: &Utf8Path,
) -> Result<(), ResolvError> {
    fs::create_dir_all(target_dir.as_std_path())
        .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    tar::Archive::new(reader)
        .unpack(target_dir.as_std_path())
        .map_err(|err| ResolvError::Filesystem(format!("unpack {archive_path}: {err}")))
}

fn decompress_stream(
    mut reader: impl io::Read,
    archive_path: &Utf8Path,
    output_path: &Utf8Path,
) -> Result<(), ResolvError> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    }
    let mut outfile = fs::File::create(output_path.as_std_path())
        .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    io::copy(&mut reader, &mut outfile)
        .map_err(|err| ResolvError::Filesystem(format!("decompress {archive_path}: {err}")))?;
    Ok(())
}

// The wrapper is staged under a temporary name first so one of its children
// sharing its name cannot collide on the way up.
fn flatten_root(output_path: &Utf8Path) -> Result<(), ResolvError> {
    let entries = fs_util::list_dir(output_path)?;
    if entries.len() != 1 {
        return Err(ResolvError::ArchiveLayout(format!(
            "expected a single top-level entry in {output_path}, found {}",
            entries.len()
        )));
    }
    let wrapper = &entries[0];
    if !wrapper.as_std_path().is_dir() {
        return Err(ResolvError::ArchiveLayout(format!(
            "single top-level entry {wrapper} is not a directory"
        )));
    }
    tracing::info!("moving root directory {wrapper} to {output_path}");
    let staged = output_path.join(".flatten-tmp");
    fs::rename(wrapper.as_std_path(), staged.as_std_path())
        .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    fs_util::move_content(&staged, output_path, true)
}

fn open_archive(path: &Utf8Path) -> Result<fs::File, ResolvError> {
    fs::File::open(path.as_std_path())
        .map_err(|err| ResolvError::Filesystem(format!("open archive {path}: {err}")))
}

fn archive_name(archive_path: &Utf8Path) -> Result<&str, ResolvError> {
    archive_path
        .file_name()
        .ok_or_else(|| ResolvError::Filesystem(format!("invalid archive path: {archive_path}")))
}

fn default_output_path(archive_path: &Utf8Path) -> Result<Utf8PathBuf, ResolvError> {
    let name = archive_name(archive_path)?;
    let stem = SUPPORTED_SUFFIXES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map(|(suffix, _)| &name[..name.len() - suffix.len()])
        .unwrap_or(name);
    let parent = archive_path
        .parent()
        .ok_or_else(|| ResolvError::Filesystem(format!("invalid archive path: {archive_path}")))?;
    Ok(parent.join(stem))
}
