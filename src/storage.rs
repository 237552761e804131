use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::Local;

use crate::error::Error;

/// The two logical folders files can be retrieved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Folder {
    Uploads,
    Merged,
}

impl Folder {
    pub fn name(self) -> &'static str {
        match self {
            Folder::Uploads => "uploads",
            Folder::Merged => "merged",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "uploads" => Some(Folder::Uploads),
            "merged" => Some(Folder::Merged),
            _ => None,
        }
    }
}

/// Microsecond-resolution stamp used to keep stored names unique.
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S_%6f").to_string()
}

/// `report.csv` -> `report_<stamp>.csv`
pub fn timestamped_name(original: &str, stamp: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    }
}

/// A single plain file name, no separators or parent hops. Dot-files are
/// in-flight temporaries and are never served.
fn is_plain_file_name(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// On-disk store for uploaded sources and exported files. Both
/// directories are append-only: every write gets a fresh name.
#[derive(Clone, Debug)]
pub struct Store {
    uploads: PathBuf,
    merged: PathBuf,
}

impl Store {
    pub fn open(uploads: impl Into<PathBuf>, merged: impl Into<PathBuf>) -> Result<Self, Error> {
        let store = Self {
            uploads: uploads.into(),
            merged: merged.into(),
        };
        std::fs::create_dir_all(&store.uploads)?;
        std::fs::create_dir_all(&store.merged)?;
        Ok(store)
    }

    pub fn dir(&self, folder: Folder) -> &Path {
        match folder {
            Folder::Uploads => &self.uploads,
            Folder::Merged => &self.merged,
        }
    }

    /// Copy a source file into the uploads folder under a timestamped name.
    pub fn store_upload(&self, source: &Path) -> Result<PathBuf, Error> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Merge(format!("{}: not a file", source.display())))?;
        let dest = self.uploads.join(timestamped_name(&name, &timestamp()));
        std::fs::copy(source, &dest)
            .map_err(|e| Error::Merge(format!("{}: {e}", source.display())))?;
        log::debug!("stored upload {} -> {}", source.display(), dest.display());
        Ok(dest)
    }

    /// Write `bytes` as `merged_data_<stamp>.<ext>`. The data goes to a
    /// hidden temporary file first and is renamed into place only once
    /// fully written.
    pub fn publish(&self, bytes: &[u8], ext: &str) -> Result<PathBuf, Error> {
        let dest = self.merged.join(format!("merged_data_{}.{ext}", timestamp()));
        let mut tmp = tempfile::Builder::new()
            .prefix(".merged_data")
            .suffix(".part")
            .tempfile_in(&self.merged)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&dest).map_err(|e| Error::Io(e.error))?;
        log::info!("published {} ({} bytes)", dest.display(), bytes.len());
        Ok(dest)
    }

    /// Resolve a stored file. Unknown folders, nested paths and missing
    /// files are all `NotFound`.
    pub fn fetch(&self, folder: &str, filename: &str) -> Result<PathBuf, Error> {
        let Some(folder_kind) = Folder::from_name(folder) else {
            return Err(Error::not_found(folder, filename));
        };
        if !is_plain_file_name(filename) {
            return Err(Error::not_found(folder, filename));
        }
        let path = self.dir(folder_kind).join(filename);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::not_found(folder, filename))
        }
    }

    /// File names in `folder`, sorted. In-flight temporary files are hidden,
    /// matching what `fetch` will serve.
    pub fn list(&self, folder: Folder) -> Result<Vec<String>, Error> {
        let entries = match std::fs::read_dir(self.dir(folder)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
