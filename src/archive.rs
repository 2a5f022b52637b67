use crate::context::Context;
use crate::error::Error;
use crate::result::Result;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

const ARCHIVE_EXTENSION: &str = ".zip";

/// Highest deflate level of the flate2 backend
const COMPRESSION_LEVEL: i64 = 9;

/// Build output to be archived
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    File(PathBuf),
    Directory(PathBuf),
}

impl Target {
    /// Classify `path`, failing with `NotFound` when it is neither a file nor a directory
    pub fn resolve(path: &Path) -> Result<Self> {
        if path.is_file() {
            Ok(Target::File(path.to_path_buf()))
        } else if path.is_dir() {
            Ok(Target::Directory(path.to_path_buf()))
        } else {
            Err(Error::NotFound(path.to_path_buf()))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Target::File(path) | Target::Directory(path) => path,
        }
    }

    /// File or directory name the archive is named after. Extensions are
    /// kept for both kinds: `Game.app/` archives to `Game.app.zip`.
    pub fn base_name(&self) -> Result<String> {
        let path = self.normalized()?;
        path.file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::custom(format!(
                    "Cannot derive an archive name from {}",
                    self.path().display()
                ))
            })
    }

    /// Sibling `<parent>/<base-name>.zip`
    pub fn archive_path(&self) -> Result<PathBuf> {
        let path = self.normalized()?;
        let base_name = self.base_name()?;
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(parent.join(format!("{}{}", base_name, ARCHIVE_EXTENSION)))
    }

    // `.` and `..` carry no file name until resolved
    fn normalized(&self) -> Result<PathBuf> {
        let path = self.path();
        if path.file_name().is_some() {
            Ok(path.to_path_buf())
        } else {
            fs::canonicalize(path).map_err(|e| Error::io(path, e))
        }
    }
}

struct Entry {
    name: String,
    source: PathBuf,
}

/// Zip `path` into a sibling archive, replacing any previous one.
///
/// A file becomes a single entry named after it. A directory contributes every
/// file beneath it, named by its `/`-separated path relative to the directory
/// and sorted by that name. Timestamps are pinned so identical inputs give
/// identical archives. On failure the partial archive is removed.
pub fn create(ctx: &Context, path: &Path) -> Result<PathBuf> {
    let target = Target::resolve(path)?;
    let archive_path = target.archive_path()?;

    if archive_path.exists() {
        if ctx.verbose {
            cliclack::log::info(format!(
                "Removing existing archive {}",
                archive_path.display()
            ))?;
        }
        fs::remove_file(&archive_path).map_err(|e| Error::io(&archive_path, e))?;
    }

    let entries = match &target {
        Target::File(file) => vec![Entry {
            name: target.base_name()?,
            source: file.clone(),
        }],
        Target::Directory(dir) => collect_entries(dir)?,
    };

    write_or_discard(ctx, &entries, &archive_path)?;

    Ok(archive_path)
}

/// Write the archive, removing the partial output when any entry fails
fn write_or_discard(ctx: &Context, entries: &[Entry], archive_path: &Path) -> Result<()> {
    if let Err(err) = write_archive(ctx, entries, archive_path) {
        if archive_path.exists() {
            fs::remove_file(archive_path).map_err(|e| Error::io(archive_path, e))?;
        }
        return Err(err);
    }

    Ok(())
}

fn collect_entries(root: &Path) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|err| walk_error(root, err))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).map_err(|_| {
            Error::custom(format!(
                "{} is outside of {}",
                entry.path().display(),
                root.display()
            ))
        })?;

        entries.push(Entry {
            name: entry_name(relative)?,
            source: entry.into_path(),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Zip entry names use `/` whatever the host separator is
fn entry_name(relative: &Path) -> Result<String> {
    let parts = relative
        .components()
        .map(|component| {
            component.as_os_str().to_str().ok_or_else(|| {
                Error::custom(format!("Non UTF-8 path: {}", relative.display()))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(parts.join("/"))
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    match err.into_io_error() {
        Some(source) => Error::io(path, source),
        None => Error::custom(format!("Filesystem loop detected at {}", path.display())),
    }
}

fn write_archive(ctx: &Context, entries: &[Entry], archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path).map_err(|e| Error::io(archive_path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    for entry in entries {
        if ctx.verbose {
            cliclack::log::info(format!("Adding {}", entry.name))?;
        }

        let mut source = File::open(&entry.source).map_err(|e| Error::io(&entry.source, e))?;
        let metadata = source
            .metadata()
            .map_err(|e| Error::io(&entry.source, e))?;

        zip.start_file(entry.name.as_str(), entry_options(&metadata))
            .map_err(|e| Error::zip(archive_path, e))?;
        io::copy(&mut source, &mut zip).map_err(|e| Error::io(&entry.source, e))?;
    }

    let mut writer = zip.finish().map_err(|e| Error::zip(archive_path, e))?;
    writer.flush().map_err(|e| Error::io(archive_path, e))?;

    Ok(())
}

fn entry_options(metadata: &fs::Metadata) -> SimpleFileOptions {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL))
        .last_modified_time(DateTime::default())
        .large_file(metadata.len() >= u64::from(u32::MAX));

    #[cfg(unix)]
    let options = {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(metadata.permissions().mode() & 0o777)
    };

    options
}
