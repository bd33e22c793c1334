//! The ingestion walker (`spec.md` §4.5): resolves user-supplied paths into
//! a sequence of [`WorkItem`]s submitted to the dispatcher in order.

use std::{
    collections::HashSet,
    fs,
    io::{self, BufRead},
    path::{Path, PathBuf},
};

use log::warn;

use crate::{
    archive,
    classify::{self, ArchiveKind},
    config::Config,
    decompress,
    error::IoError,
    worker::WorkItem,
};

/// Read `-list=FILE`, the CLI positional paths, or standard input — in that
/// order of precedence (`spec.md` §4.5's footer). Only the first non-empty
/// source is used.
pub fn initial_paths(
    list_file: Option<&str>,
    cli_paths: &[String],
    stdin: impl BufRead,
) -> Result<Vec<String>, IoError> {
    if let Some(path) = list_file {
        if !path.is_empty() {
            return read_lines(path);
        }
    }
    if !cli_paths.is_empty() {
        return Ok(cli_paths.to_vec());
    }
    Ok(stdin
        .lines()
        .map_while(Result::ok)
        .filter(|l| !l.trim().is_empty())
        .collect())
}

fn read_lines(path: &str) -> Result<Vec<String>, IoError> {
    let content = fs::read_to_string(path).map_err(|e| IoError::new(path, e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Walk every initial path (one level — a path that is itself a list-of-
/// names is NOT expanded again) and append the resulting work items, in
/// submission order, to `items`.
pub fn collect(paths: &[String], config: &Config) -> Vec<WorkItem> {
    let mut items = Vec::new();
    for path in paths {
        resolve_path(path, config, &mut items);
    }
    items
}

fn resolve_path(path: &str, config: &Config, items: &mut Vec<WorkItem>) {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            warn!("{}", IoError::new(path, e));
            return;
        }
    };

    if metadata.is_dir() {
        if config.recursive {
            walk_recursive(path, config, items);
        } else {
            walk_flat(path, config, items);
        }
        return;
    }

    if let Some(kind) = classify::is_archive(path) {
        expand_archive(path, kind, config, items);
        return;
    }

    if let Some(kind) = classify::is_compressed(path) {
        match fs::read(path).map_err(|e| IoError::new(path, e)) {
            Ok(raw) => match decompress::decompress(kind, &raw) {
                Ok(bytes) => {
                    let display_name = classify::strip_compression_suffix(path);
                    items.push(WorkItem::from_bytes(display_name, bytes));
                }
                Err(e) => warn!("{path}: {e}"),
            },
            Err(e) => warn!("{e}"),
        }
        return;
    }

    if !classify::is_subject(path, config.subject_only) {
        return;
    }

    items.push(WorkItem::from_path(path, path));
}

fn expand_archive(path: &str, kind: ArchiveKind, config: &Config, items: &mut Vec<WorkItem>) {
    let raw = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("{}", IoError::new(path, e));
            return;
        }
    };

    let bytes = match classify::is_compressed(path) {
        Some(comp) => match decompress::decompress(comp, &raw) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("{path}: {e}");
                return;
            }
        },
        None => raw,
    };

    let members = match archive::read_members(kind, &bytes) {
        Ok(members) => members,
        Err(e) => {
            warn!("{path}: {e}");
            return;
        }
    };

    // The archive's own name keeps its compression suffix in the display
    // prefix (`pkg.tar.gz::a.go`, not `pkg.tar::a.go`, per `spec.md` §8 S5):
    // only per-file compression suffixes (§4.5's other branch) get stripped.
    let archive_display = path;
    for member in members {
        if !classify::is_subject(&member.name, config.subject_only) {
            warn!("{archive_display}: skipping non-subject member {}", member.name);
            continue;
        }
        let display_name = format!("{archive_display}::{}", member.name);
        items.push(WorkItem::from_bytes(display_name, member.bytes));
    }
}

/// Immediate-children enumeration, honoring a literal-basename `.gitignore`
/// in the same directory (`spec.md`'s explicitly simplified subset).
fn walk_flat(dir: &str, config: &Config, items: &mut Vec<WorkItem>) {
    let ignored = read_gitignore_basenames(dir);

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("{}", IoError::new(dir, e));
            return;
        }
    };

    let mut children: Vec<PathBuf> = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => children.push(entry.path()),
            Err(e) => warn!("{}", IoError::new(dir, e)),
        }
    }
    children.sort();

    for child in children {
        let Some(name) = child.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if ignored.contains(name) {
            continue;
        }
        let path_str = child.to_string_lossy().into_owned();
        if !classify::visible(&path_str, config.visible_only) {
            continue;
        }
        if child.is_dir() {
            continue; // non-recursive: only immediate files are enumerated
        }
        resolve_path(&path_str, config, items);
    }
}

fn read_gitignore_basenames(dir: &str) -> HashSet<String> {
    let path = Path::new(dir).join(".gitignore");
    match fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect(),
        Err(_) => HashSet::new(),
    }
}

fn walk_recursive(dir: &str, config: &Config, items: &mut Vec<WorkItem>) {
    let visible_only = config.visible_only;
    let walker = walkdir::WalkDir::new(dir).sort_by_file_name().into_iter().filter_entry(move |entry| {
        classify::visible(&entry.path().to_string_lossy(), visible_only)
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("walk error: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path_str = entry.path().to_string_lossy().into_owned();
        resolve_path(&path_str, config, items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn base_config() -> Config {
        let (selector, _) = crate::selector::Selector::parse("k");
        Config {
            worker_count: 2,
            subject_only: true,
            recursive: false,
            visible_only: true,
            show_paths: false,
            show_lines: false,
            list_file: None,
            log_sink: None,
            output_sink: crate::config::Sink::Stdout,
            unordered: false,
            verbose: false,
            selector,
            pattern: regex::Regex::new("if").unwrap(),
            value_query: None,
        }
    }

    #[test]
    fn flat_walk_skips_hidden_and_non_subject_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "package a\n").unwrap();
        fs::write(dir.path().join("b.txt"), "not go\n").unwrap();
        fs::write(dir.path().join(".hidden.go"), "package hidden\n").unwrap();

        let mut items = Vec::new();
        resolve_path(&dir.path().to_string_lossy(), &base_config(), &mut items);

        let names: Vec<_> = items.iter().map(|i| i.display_name.clone()).collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("a.go"));
    }

    #[test]
    fn gitignore_basename_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "package a\n").unwrap();
        fs::write(dir.path().join("skip.go"), "package skip\n").unwrap();
        fs::write(dir.path().join(".gitignore"), "skip.go\n").unwrap();

        let mut items = Vec::new();
        resolve_path(&dir.path().to_string_lossy(), &base_config(), &mut items);

        let names: Vec<_> = items.iter().map(|i| i.display_name.clone()).collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("a.go"));
    }

    #[test]
    fn compressed_plain_file_is_decompressed_and_renamed() {
        let dir = tempdir().unwrap();
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"package a\n").unwrap();
        let compressed = encoder.finish().unwrap();
        fs::write(dir.path().join("a.go.gz"), compressed).unwrap();

        let mut items = Vec::new();
        resolve_path(
            &dir.path().join("a.go.gz").to_string_lossy(),
            &base_config(),
            &mut items,
        );

        assert_eq!(items.len(), 1);
        assert!(items[0].display_name.ends_with("a.go"));
        assert_eq!(items[0].source.as_deref(), Some(b"package a\n" as &[u8]));
    }
}
