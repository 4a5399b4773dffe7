use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::ResolvError;

pub fn move_content(
    source_dir: &Utf8Path,
    destination_dir: &Utf8Path,
    delete_src: bool,
) -> Result<(), ResolvError> {
    fs::create_dir_all(destination_dir.as_std_path())
        .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    let entries = fs::read_dir(source_dir.as_std_path())
        .map_err(|err| ResolvError::Filesystem(format!("read {source_dir}: {err}")))?;
    for entry in entries {
        let entry = entry.map_err(|err| ResolvError::Filesystem(err.to_string()))?;
        let target = destination_dir.as_std_path().join(entry.file_name());
        fs::rename(entry.path(), &target)
            .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    }
    if delete_src {
        fs::remove_dir(source_dir.as_std_path())
            .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    }
    Ok(())
}

pub fn remove_path(path: &Utf8Path) -> Result<(), ResolvError> {
    let std_path = path.as_std_path();
    if std_path.is_dir() {
        fs::remove_dir_all(std_path).map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    } else if std_path.exists() {
        fs::remove_file(std_path).map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    }
    Ok(())
}

pub fn list_dir(path: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ResolvError> {
    let entries = fs::read_dir(path.as_std_path())
        .map_err(|err| ResolvError::Filesystem(format!("read {path}: {err}")))?;
    let mut items = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ResolvError::Filesystem(err.to_string()))?;
        items.push(utf8_path(entry.path())?);
    }
    items.sort();
    Ok(items)
}

/// Walks `root` depth-first and returns every file whose name ends with one of
/// `suffixes` (all files when `suffixes` is empty), sorted for a stable order.
pub fn walk_files(root: &Utf8Path, suffixes: &[&str]) -> Result<Vec<Utf8PathBuf>, ResolvError> {
    let mut items = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = fs::read_dir(dir.as_std_path())
            .map_err(|err| ResolvError::Filesystem(format!("read {dir}: {err}")))?;
        for entry in entries {
            let entry = entry.map_err(|err| ResolvError::Filesystem(err.to_string()))?;
            let path = utf8_path(entry.path())?;
            if path.as_std_path().is_dir() {
                stack.push(path);
            } else if suffixes.is_empty()
                || suffixes.iter().any(|suffix| path.as_str().ends_with(suffix))
            {
                items.push(path);
            }
        }
    }
    items.sort();
    Ok(items)
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), ResolvError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(tmp_path.as_std_path(), content)
        .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    fs::rename(tmp_path.as_std_path(), path.as_std_path())
        .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
    Ok(())
}

pub fn utf8_path(path: std::path::PathBuf) -> Result<Utf8PathBuf, ResolvError> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|path| ResolvError::Filesystem(format!("non-utf8 path: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn move_content_relocates_children_and_removes_source() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let source = root.join("source");
        let dest = root.join("dest");
        fs::create_dir_all(source.join("nested").as_std_path()).unwrap();
        fs::write(source.join("a.txt").as_std_path(), b"a").unwrap();
        fs::write(source.join("nested/b.txt").as_std_path(), b"b").unwrap();

        move_content(&source, &dest, true).unwrap();

        assert!(dest.join("a.txt").as_std_path().is_file());
        assert!(dest.join("nested/b.txt").as_std_path().is_file());
        assert!(!source.as_std_path().exists());
    }

    #[test]
    fn walk_files_filters_by_suffix_and_sorts() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("b").as_std_path()).unwrap();
        fs::write(root.join("b/track.mid").as_std_path(), b"x").unwrap();
        fs::write(root.join("a.mid").as_std_path(), b"x").unwrap();
        fs::write(root.join("notes.txt").as_std_path(), b"x").unwrap();

        let files = walk_files(&root, &[".mid"]).unwrap();
        assert_eq!(files, vec![root.join("a.mid"), root.join("b/track.mid")]);
    }

    #[test]
    fn write_bytes_atomic_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("out/index.json")).unwrap();
        write_bytes_atomic(&path, b"one").unwrap();
        write_bytes_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(path.as_std_path()).unwrap(), b"two");
    }
}
