//! Pure predicates over path strings: visibility, compression, subject-ness,
//! and archive membership. No I/O; these only look at the path text.

/// The subject language's own source-file extension. The tool is built for
/// one target language (see `spec.md` §1), so this is a constant rather
/// than a configurable table.
pub const SUBJECT_EXTENSION: &str = "go";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
    Bz2,
    Gz,
    Zst,
}

impl CompressionKind {
    fn suffix(self) -> &'static str {
        match self {
            CompressionKind::Bz2 => "bz2",
            CompressionKind::Gz => "gz",
            CompressionKind::Zst => "zst",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Cpio,
    Tar,
    Zip,
}

fn extension_of(path: &str) -> Option<&str> {
    let base = path.rsplit('/').next().unwrap_or(path);
    base.rsplit_once('.').map(|(_, ext)| ext)
}

/// A path is visible unless some segment (other than `.`/`..`/empty) starts
/// with `.` and the caller asked to hide hidden names.
pub fn visible(path: &str, hide_hidden: bool) -> bool {
    if !hide_hidden {
        return true;
    }
    path.split('/')
        .all(|segment| segment.is_empty() || segment == "." || segment == ".." || !segment.starts_with('.'))
}

/// Detect a single trailing compression suffix, if any.
pub fn is_compressed(path: &str) -> Option<CompressionKind> {
    match extension_of(path)? {
        "bz2" => Some(CompressionKind::Bz2),
        "gz" => Some(CompressionKind::Gz),
        "zst" => Some(CompressionKind::Zst),
        _ => None,
    }
}

/// Strip one trailing compression suffix, if present.
pub fn strip_compression_suffix(path: &str) -> String {
    match is_compressed(path) {
        Some(kind) => {
            let suffix = format!(".{}", kind.suffix());
            path.strip_suffix(&suffix).unwrap_or(path).to_string()
        }
        None => path.to_string(),
    }
}

/// Is this a subject-language source file? When `subject_only` is false the
/// check is short-circuited to true (the ingestion walker isn't restricted
/// to subject files).
pub fn is_subject(path: &str, subject_only: bool) -> bool {
    if !subject_only {
        return true;
    }
    let stripped = strip_compression_suffix(path);
    extension_of(&stripped) == Some(SUBJECT_EXTENSION)
}

/// Detect the archive format after stripping one compression suffix.
pub fn is_archive(path: &str) -> Option<ArchiveKind> {
    let stripped = strip_compression_suffix(path);
    match extension_of(&stripped)? {
        "cpio" => Some(ArchiveKind::Cpio),
        "tar" => Some(ArchiveKind::Tar),
        "zip" => Some(ArchiveKind::Zip),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_hides_dotfiles_only_when_asked() {
        assert!(visible("src/main.go", true));
        assert!(!visible("src/.hidden.go", true));
        assert!(visible("src/.hidden.go", false));
        assert!(visible(".", true));
        assert!(visible("..", true));
    }

    #[test]
    fn compression_detection_strips_one_suffix() {
        assert_eq!(is_compressed("a.go.gz"), Some(CompressionKind::Gz));
        assert_eq!(is_compressed("a.go"), None);
        assert_eq!(strip_compression_suffix("a.go.gz"), "a.go");
        assert_eq!(strip_compression_suffix("a.go"), "a.go");
    }

    #[test]
    fn subject_check_ignores_one_compression_suffix() {
        assert!(is_subject("a.go.bz2", true));
        assert!(!is_subject("a.txt.bz2", true));
        assert!(is_subject("a.txt", false));
    }

    #[test]
    fn archive_detection_through_compression() {
        assert_eq!(is_archive("pkg.tar.gz"), Some(ArchiveKind::Tar));
        assert_eq!(is_archive("pkg.zip"), Some(ArchiveKind::Zip));
        assert_eq!(is_archive("pkg.cpio.zst"), Some(ArchiveKind::Cpio));
        assert_eq!(is_archive("a.go"), None);
    }
}
