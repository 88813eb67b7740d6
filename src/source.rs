//! Where document bytes come from.
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Read-bytes-by-path access used for documents, libraries and includes.
pub trait FileSource: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn is_dir(&self, _path: &Path) -> bool {
        false
    }

    /// `*.raml` files directly inside `dir`, sorted by name.
    fn list_raml(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileSource for LocalFiles {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_raml(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let pattern = dir.join("*.raml");
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut files = Vec::new();
        for entry in entries {
            files.push(entry.map_err(glob::GlobError::into_error)?);
        }
        files.sort();
        Ok(files)
    }
}

/// An in-memory file tree; paths are compared as given.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: IndexMap<PathBuf, Vec<u8>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.insert(normalize(&path.into()), content.into());
    }
}

impl FileSource for MemoryFiles {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display())))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let dir = normalize(path);
        self.files.keys().any(|p| p.parent() == Some(dir.as_path()))
    }

    fn list_raml(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let dir = normalize(dir);
        let mut files: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "raml"))
            .cloned()
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Drop `.` components so `./a.raml` and `a.raml` name the same entry.
fn normalize(path: &Path) -> PathBuf {
    path.components().filter(|c| !matches!(c, std::path::Component::CurDir)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_files_ignore_current_dir_components() {
        let files = MemoryFiles::new().with("./api/a.raml", "a");
        assert_eq!(files.read(Path::new("api/./a.raml")).unwrap(), b"a");
        assert!(files.read(Path::new("api/b.raml")).is_err());
    }

    #[test]
    fn memory_listing_is_sorted_and_filtered() {
        let files = MemoryFiles::new()
            .with("dir/b.raml", "b")
            .with("dir/a.raml", "a")
            .with("dir/notes.md", "x")
            .with("dir/sub/c.raml", "c");
        assert!(files.is_dir(Path::new("dir")));
        let listed = files.list_raml(Path::new("dir")).unwrap();
        assert_eq!(listed, vec![PathBuf::from("dir/a.raml"), PathBuf::from("dir/b.raml")]);
    }

    #[test]
    fn local_listing_uses_glob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2.raml"), "b").unwrap();
        std::fs::write(dir.path().join("1.raml"), "a").unwrap();
        std::fs::write(dir.path().join("x.txt"), "x").unwrap();
        let listed = LocalFiles.list_raml(dir.path()).unwrap();
        let names: Vec<_> = listed.iter().filter_map(|p| p.file_name()).collect();
        assert_eq!(names, ["1.raml", "2.raml"]);
    }
}
