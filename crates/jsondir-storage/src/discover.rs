use jsondir_core::CollectionEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

static FILE_COLLECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^api/[a-z][a-z_-]*\.json$").unwrap());
static DIR_COLLECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^api/[a-z][a-z_-]*/items\.json$").unwrap());

/// Lists the collections under `<base_dir>/api`: `api/<name>.json` files
/// and `api/<name>/items.json` directories. Nested collections can still
/// be loaded by URL path but are not listed. Sorted by path.
pub fn discover(base_dir: &Path) -> Vec<CollectionEntry> {
    let api_dir = base_dir.join("api");
    if !api_dir.is_dir() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let walker = WalkDir::new(&api_dir).sort_by_file_name().into_iter();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(base_dir) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let url_path = if DIR_COLLECTION.is_match(&relative) {
            relative.trim_end_matches("/items.json")
        } else if FILE_COLLECTION.is_match(&relative) {
            relative.trim_end_matches(".json")
        } else {
            continue;
        };
        out.push(CollectionEntry {
            path: entry.path().to_path_buf(),
            url_path: format!("/{url_path}"),
        });
    }
    out
}
