use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One candidate file in the upload location, with the storage metadata
/// the resolver needs. Either timestamp may be absent (creation time is
/// not reported on every platform).
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub name: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// List the files directly inside `dir`, sorted by name so a run
/// processes them in a deterministic order. Subdirectories are not
/// descended into; category folders may live next to fresh uploads.
pub fn list_files(dir: &Path) -> Result<Vec<StoredFile>> {
    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let meta = entry.metadata()?;
        out.push(StoredFile {
            created: meta.created().ok().map(DateTime::<Utc>::from),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            path,
            name,
        });
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

/// Pick a name that does not collide with anything already in `dir`.
/// Two recordings in the same slot on the same day produce the same
/// base name; both takes must survive, so the later one gets a numeric
/// suffix before the extension.
pub fn unique_name(dir: &Path, name: &str) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx..]),
        None => (name, ""),
    };
    let mut n = 2u32;
    loop {
        let candidate = format!("{stem}_{n}{ext}");
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Rename a file within its directory without clobbering an existing
/// sibling, returning the path the file ended up at.
pub fn rename_in_place(path: &Path, new_name: &str) -> Result<PathBuf> {
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    if path.file_name().and_then(|s| s.to_str()) == Some(new_name) {
        return Ok(parent.join(new_name));
    }
    let target = parent.join(unique_name(parent, new_name));
    fs::rename(path, &target)
        .with_context(|| format!("failed to rename {} to {new_name}", path.display()))?;
    Ok(target)
}

/// Find or create the category folder under `root`.
pub fn ensure_category_dir(root: &Path, category: &str) -> Result<PathBuf> {
    let dir = root.join(category);
    if !dir.is_dir() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create category dir {}", dir.display()))?;
    }
    Ok(dir)
}

/// Move a file into `dir` without clobbering anything already there,
/// falling back to copy+remove when the rename crosses a device
/// boundary. Returns the path the file landed at.
pub fn move_into(from: &Path, dir: &Path) -> Result<PathBuf> {
    let name = from
        .file_name()
        .and_then(|s| s.to_str())
        .with_context(|| format!("{} has no file name", from.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let to = dir.join(unique_name(dir, name));
    if to == from {
        return Ok(to);
    }

    match fs::rename(from, &to) {
        Ok(_) => Ok(to),
        Err(rename_err) => {
            if matches!(
                rename_err.kind(),
                ErrorKind::CrossesDevices | ErrorKind::PermissionDenied
            ) {
                fs::copy(from, &to).with_context(|| {
                    format!("failed to copy {} to {}", from.display(), to.display())
                })?;
                fs::remove_file(from)
                    .with_context(|| format!("failed to remove {}", from.display()))?;
                Ok(to)
            } else {
                Err(rename_err).with_context(|| {
                    format!("failed to move {} to {}", from.display(), to.display())
                })
            }
        }
    }
}

pub fn file_url(path: &Path) -> String {
    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}
