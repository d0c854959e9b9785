//! [`ArchiveSource`] implementations: a directory walk and a zip archive,
//! each able to recurse into nested archives (a jar inside a jar) without
//! ever writing the nested bytes to disk. A nested archive's bytes live
//! in an `Arc<[u8]>` rather than requiring a second file on disk.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::Arc,
};

use zip::ZipArchive;

use crate::error::EngineError;

/// Where a [`ClassEntry`]'s bytes ultimately come from.
#[derive(Debug, Clone)]
pub enum Container {
    /// A plain directory on disk.
    Directory(PathBuf),
    /// A zip archive on disk.
    ZipFile(PathBuf),
    /// A zip archive's bytes, held in memory — used for an archive found
    /// nested inside another archive, so extracting it never touches disk.
    ZipBytes(Arc<[u8]>),
}

/// One class file discovered by an [`ArchiveSource`], not yet read.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    /// The binary name (`com/acme/Widget`), with no `.class` suffix.
    pub binary_name: String,
    /// Where this entry's bytes live.
    pub container: Container,
    /// For a zip-backed entry, the member path within the archive
    /// (`com/acme/Widget.class`). `None` for a directory entry, where the
    /// path is derived from `binary_name` instead.
    pub member_path: Option<String>,
}

/// A source of class files to ingest: a directory tree or an archive,
/// possibly containing further archives nested inside it.
pub trait ArchiveSource {
    /// Lists every class file reachable from this source, recursing into
    /// nested archives.
    ///
    /// # Errors
    /// Returns [`EngineError::Access`] if the source cannot be opened or
    /// walked.
    fn class_entries(&self) -> Result<Vec<ClassEntry>, EngineError>;

    /// Reads the raw bytes of `entry`.
    ///
    /// # Errors
    /// Returns [`EngineError::Access`] if the entry can no longer be read.
    fn read_class(&self, entry: &ClassEntry) -> Result<Vec<u8>, EngineError>;
}

fn access_error(path: &Path, message: impl Into<String>) -> EngineError {
    EngineError::Access {
        path: path.to_owned(),
        source: std::io::Error::other(message.into()),
    }
}

fn is_nested_archive(name: &str) -> bool {
    name.ends_with(".jar") || name.ends_with(".zip")
}

/// Walks `container`, appending every `.class` file found and recursing
/// into any nested `.jar`/`.zip` member or file.
fn collect_from_container(container: &Container, label: &Path, out: &mut Vec<ClassEntry>) -> Result<(), EngineError> {
    match container {
        Container::Directory(root) => collect_from_directory(root, out),
        Container::ZipFile(path) => {
            let file = std::fs::File::open(path).map_err(|source| EngineError::Access { path: path.clone(), source })?;
            let archive = ZipArchive::new(file).map_err(|e| access_error(path, e.to_string()))?;
            collect_from_zip(archive, label, out)
        }
        Container::ZipBytes(bytes) => {
            let archive = ZipArchive::new(Cursor::new(bytes.as_ref())).map_err(|e| access_error(label, e.to_string()))?;
            collect_from_zip(archive, label, out)
        }
    }
}

fn collect_from_directory(root: &Path, out: &mut Vec<ClassEntry>) -> Result<(), EngineError> {
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "class") {
            let binary_name = path
                .strip_prefix(root)
                .unwrap_or(path)
                .with_extension("")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            out.push(ClassEntry { binary_name, container: Container::Directory(root.to_owned()), member_path: None });
        } else if path.extension().is_some_and(|e| is_nested_archive(&format!(".{}", e.to_string_lossy()))) {
            collect_from_container(&Container::ZipFile(path.to_owned()), path, out)?;
        }
    }
    Ok(())
}

fn collect_from_zip<R: std::io::Read + std::io::Seek>(
    mut archive: ZipArchive<R>,
    label: &Path,
    out: &mut Vec<ClassEntry>,
) -> Result<(), EngineError> {
    let names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    for name in names {
        if let Some(binary_name) = name.strip_suffix(".class") {
            out.push(ClassEntry {
                binary_name: binary_name.to_owned(),
                container: zip_container(label),
                member_path: Some(name.clone()),
            });
        } else if is_nested_archive(&name) {
            let mut member = archive.by_name(&name).map_err(|e| access_error(label, e.to_string()))?;
            let mut bytes = Vec::new();
            std::io::Read::read_to_end(&mut member, &mut bytes).map_err(|source| EngineError::Access { path: label.to_owned(), source })?;
            collect_from_container(&Container::ZipBytes(Arc::from(bytes)), &label.join(&name), out)?;
        }
    }
    Ok(())
}

fn zip_container(label: &Path) -> Container {
    Container::ZipFile(label.to_owned())
}

/// An [`ArchiveSource`] backed by a plain directory of `.class` files
/// (already-extracted classes, or a build output directory).
#[derive(Debug)]
pub struct DirectoryArchiveSource {
    root: PathBuf,
}

impl DirectoryArchiveSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArchiveSource for DirectoryArchiveSource {
    fn class_entries(&self) -> Result<Vec<ClassEntry>, EngineError> {
        let mut out = Vec::new();
        collect_from_container(&Container::Directory(self.root.clone()), &self.root, &mut out)?;
        Ok(out)
    }

    fn read_class(&self, entry: &ClassEntry) -> Result<Vec<u8>, EngineError> {
        read_entry(entry)
    }
}

/// An [`ArchiveSource`] backed by a single jar/zip file on disk, possibly
/// containing nested archives.
#[derive(Debug)]
pub struct ZipArchiveSource {
    path: PathBuf,
}

impl ZipArchiveSource {
    /// Creates a source reading from the archive at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArchiveSource for ZipArchiveSource {
    fn class_entries(&self) -> Result<Vec<ClassEntry>, EngineError> {
        let mut out = Vec::new();
        collect_from_container(&Container::ZipFile(self.path.clone()), &self.path, &mut out)?;
        Ok(out)
    }

    fn read_class(&self, entry: &ClassEntry) -> Result<Vec<u8>, EngineError> {
        read_entry(entry)
    }
}

/// Reads `entry`'s raw bytes directly from its [`Container`], without
/// needing a reference back to the [`ArchiveSource`] that discovered it
/// — every [`Container`] variant carries everything required to read its
/// own members. The engine's ingestion pipeline uses this to read class
/// bytes for a batch that may span entries from more than one source.
pub(crate) fn read_entry(entry: &ClassEntry) -> Result<Vec<u8>, EngineError> {
    match &entry.container {
        Container::Directory(root) => {
            let path = root.join(&entry.binary_name).with_extension("class");
            std::fs::read(&path).map_err(|source| EngineError::Access { path, source })
        }
        Container::ZipFile(path) => {
            let file = std::fs::File::open(path).map_err(|source| EngineError::Access { path: path.clone(), source })?;
            let mut archive = ZipArchive::new(file).map_err(|e| access_error(path, e.to_string()))?;
            read_member(&mut archive, entry, path)
        }
        Container::ZipBytes(bytes) => {
            let mut archive = ZipArchive::new(Cursor::new(bytes.as_ref())).map_err(|e| access_error(Path::new(&entry.binary_name), e.to_string()))?;
            read_member(&mut archive, entry, Path::new(&entry.binary_name))
        }
    }
}

fn read_member<R: std::io::Read + std::io::Seek>(archive: &mut ZipArchive<R>, entry: &ClassEntry, label: &Path) -> Result<Vec<u8>, EngineError> {
    let member_path = entry.member_path.as_deref().unwrap_or(&entry.binary_name);
    let mut member = archive.by_name(member_path).map_err(|e| access_error(label, e.to_string()))?;
    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut member, &mut bytes).map_err(|source| EngineError::Access { path: label.to_owned(), source })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use zip::write::{SimpleFileOptions, ZipWriter};

    use super::*;

    #[test]
    fn directory_source_finds_nested_class_files() {
        let dir = std::env::temp_dir().join(format!("japi-compat-test-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("com/acme")).unwrap();
        std::fs::write(dir.join("com/acme/Widget.class"), b"\xCA\xFE\xBA\xBE").unwrap();
        let source = DirectoryArchiveSource::new(&dir);
        let entries = source.class_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].binary_name, "com/acme/Widget");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn zip_source_recurses_into_nested_jar() {
        let mut outer_bytes = Vec::new();
        {
            let mut inner_bytes = Vec::new();
            {
                let mut inner = ZipWriter::new(Cursor::new(&mut inner_bytes));
                inner.start_file("com/acme/Inner.class", SimpleFileOptions::default()).unwrap();
                inner.write_all(b"\xCA\xFE\xBA\xBE").unwrap();
                inner.finish().unwrap();
            }
            let mut outer = ZipWriter::new(Cursor::new(&mut outer_bytes));
            outer.start_file("com/acme/Outer.class", SimpleFileOptions::default()).unwrap();
            outer.write_all(b"\xCA\xFE\xBA\xBE").unwrap();
            outer.start_file("lib/nested.jar", SimpleFileOptions::default()).unwrap();
            outer.write_all(&inner_bytes).unwrap();
            outer.finish().unwrap();
        }
        let path = std::env::temp_dir().join(format!("japi-compat-test-{}.jar", std::process::id()));
        std::fs::write(&path, &outer_bytes).unwrap();
        let source = ZipArchiveSource::new(&path);
        let mut names: Vec<_> = source.class_entries().unwrap().into_iter().map(|e| e.binary_name).collect();
        names.sort();
        assert_eq!(names, vec!["com/acme/Inner", "com/acme/Outer"]);
        std::fs::remove_file(&path).ok();
    }
}
