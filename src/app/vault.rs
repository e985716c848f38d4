use crate::app::error::Error;
use ignore::WalkBuilder;
use pathdiff::diff_paths;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Immediate children of a folder, as vault-relative paths.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Listing {
    pub files: Vec<String>,
    pub folders: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub created: Option<SystemTime>,
    pub modified: Option<SystemTime>,
}

/// Storage the dump reads from and the restore writes into.
///
/// Paths are `/`-separated and relative to the vault root.
pub trait Vault {
    fn list(&self, path: &str) -> io::Result<Listing>;
    fn stat(&self, path: &str) -> io::Result<FileStat>;
    fn read_binary(&self, path: &str) -> io::Result<Vec<u8>>;
    fn write_binary(&self, path: &str, data: &[u8]) -> io::Result<()>;
    /// Must fail with `ErrorKind::AlreadyExists` when the folder is already there.
    fn create_folder(&self, path: &str) -> io::Result<()>;
    /// Identity of a folder, used to spot cycles while walking.
    fn canonicalize(&self, path: &str) -> io::Result<PathBuf>;

    fn write(&self, path: &str, text: &str) -> io::Result<()> {
        self.write_binary(path, text.as_bytes())
    }
}

/// Creates every missing parent folder of `file_path`, outermost first.
pub fn ensure_directory(vault: &dyn Vault, file_path: &str) -> Result<(), Error> {
    let mut segments: Vec<&str> = file_path.split('/').collect();
    segments.pop();

    let mut current = String::new();
    for segment in segments.into_iter().filter(|s| !s.is_empty()) {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);
        match vault.create_folder(&current) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(source) => {
                return Err(Error::DirectoryCreate {
                    path: current,
                    source,
                })
            }
        }
    }
    Ok(())
}

/// A vault backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalVault {
    root: PathBuf,
}

impl LocalVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a vault path onto disk, refusing anything that leaves the root.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("path escapes the vault: {}", path),
                    ))
                }
            }
        }
        Ok(resolved)
    }

    fn vault_path(&self, path: &Path) -> Option<String> {
        let relative = diff_paths(path, &self.root)?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

impl Vault for LocalVault {
    fn list(&self, path: &str) -> io::Result<Listing> {
        let dir = self.resolve(path)?;
        if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not a folder: {}", path),
            ));
        }

        // Plain listing: no hidden/gitignore filtering, stable name order.
        let walker = WalkBuilder::new(&dir)
            .max_depth(Some(1))
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut listing = Listing::default();
        for result in walker {
            let entry = result.map_err(|err| {
                let message = err.to_string();
                err.into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message))
            })?;
            if entry.depth() == 0 {
                continue;
            }
            let Some(child) = self.vault_path(entry.path()) else {
                log::warn!("Skipping entry outside the vault: {}", entry.path().display());
                continue;
            };
            // Symlinked folders count as folders; the walker's cycle check handles loops.
            if entry.path().is_dir() {
                listing.folders.push(child);
            } else {
                listing.files.push(child);
            }
        }
        Ok(listing)
    }

    fn stat(&self, path: &str) -> io::Result<FileStat> {
        let metadata = fs::metadata(self.resolve(path)?)?;
        Ok(FileStat {
            created: metadata.created().ok(),
            modified: metadata.modified().ok(),
        })
    }

    fn read_binary(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path)?)
    }

    fn write_binary(&self, path: &str, data: &[u8]) -> io::Result<()> {
        fs::write(self.resolve(path)?, data)
    }

    fn create_folder(&self, path: &str) -> io::Result<()> {
        fs::create_dir(self.resolve(path)?)
    }

    fn canonicalize(&self, path: &str) -> io::Result<PathBuf> {
        fs::canonicalize(self.resolve(path)?)
    }
}
