//! A uniform sequential iterator over members of the three supported
//! archive formats (`spec.md` §4.4).
//!
//! `.tar` and `.zip` are read through their respective maintained crates;
//! `.cpio` has no maintained crate in the ecosystem, so its "newc" (portable
//! ASCII) format is read directly against the documented on-disk layout —
//! the same call the teacher makes when it hand-writes its own lexer/parser
//! instead of reaching for a parser-generator crate it doesn't depend on.

use std::{
    error::Error,
    fmt,
    io::{Cursor, Read},
};

use crate::classify::ArchiveKind;

#[derive(Debug)]
pub struct ArchiveError {
    pub what: String,
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to read archive: {}", self.what)
    }
}

impl Error for ArchiveError {}

impl ArchiveError {
    fn new(what: impl Into<String>) -> Self {
        Self { what: what.into() }
    }
}

/// One archive member: its name within the archive, and its fully buffered
/// bytes. Buffering whole members is the "may buffer whole members for
/// simplicity" allowance of `spec.md` §5.
pub struct Member {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Open `bytes` as an archive of `kind` and return every member in
/// sequential order. Corrupt archives yield a single `ArchiveError`; the
/// caller logs it and moves on to the next work item (`spec.md` §4.3's
/// "never abort the whole run").
pub fn read_members(kind: ArchiveKind, bytes: &[u8]) -> Result<Vec<Member>, ArchiveError> {
    match kind {
        ArchiveKind::Tar => read_tar(bytes),
        ArchiveKind::Zip => read_zip(bytes),
        ArchiveKind::Cpio => read_cpio(bytes),
    }
}

fn read_tar(bytes: &[u8]) -> Result<Vec<Member>, ArchiveError> {
    let mut archive = tar::Archive::new(Cursor::new(bytes));
    let entries = archive
        .entries()
        .map_err(|e| ArchiveError::new(format!("tar: {e}")))?;

    let mut members = Vec::new();
    for entry in entries {
        let mut entry = entry.map_err(|e| ArchiveError::new(format!("tar entry: {e}")))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .map_err(|e| ArchiveError::new(format!("tar path: {e}")))?
            .to_string_lossy()
            .into_owned();
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| ArchiveError::new(format!("tar read: {e}")))?;
        members.push(Member { name, bytes: data });
    }
    Ok(members)
}

fn read_zip(bytes: &[u8]) -> Result<Vec<Member>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ArchiveError::new(format!("zip: {e}")))?;

    let mut members = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ArchiveError::new(format!("zip member {i}: {e}")))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| ArchiveError::new(format!("zip read {name}: {e}")))?;
        members.push(Member { name, bytes: data });
    }
    Ok(members)
}

/// The "newc" (portable ASCII, `070701`) cpio header: a 6-byte magic
/// followed by thirteen 8-byte hex fields, all ASCII. File data (and the
/// header itself) is padded to 4-byte alignment. The archive ends at a
/// member named `TRAILER!!!`.
const NEWC_MAGIC: &[u8; 6] = b"070701";
const NEWC_HEADER_LEN: usize = 110;

fn read_cpio(bytes: &[u8]) -> Result<Vec<Member>, ArchiveError> {
    let mut members = Vec::new();
    let mut pos = 0usize;

    loop {
        if pos + NEWC_HEADER_LEN > bytes.len() {
            return Err(ArchiveError::new("cpio: truncated header"));
        }
        let header = &bytes[pos..pos + NEWC_HEADER_LEN];
        if &header[0..6] != NEWC_MAGIC {
            return Err(ArchiveError::new("cpio: bad magic, only newc supported"));
        }

        let field = |idx: usize| -> Result<u32, ArchiveError> {
            let slice = &header[6 + idx * 8..6 + idx * 8 + 8];
            let text = std::str::from_utf8(slice)
                .map_err(|_| ArchiveError::new("cpio: non-ascii header field"))?;
            u32::from_str_radix(text, 16).map_err(|_| ArchiveError::new("cpio: bad hex field"))
        };

        let name_size = field(11)? as usize;
        let file_size = field(6)? as usize;

        let name_start = pos + NEWC_HEADER_LEN;
        if name_start + name_size > bytes.len() {
            return Err(ArchiveError::new("cpio: truncated name"));
        }
        let name_bytes = &bytes[name_start..name_start + name_size.saturating_sub(1)];
        let name = String::from_utf8_lossy(name_bytes).into_owned();

        let after_name = name_start + name_size;
        let data_start = align4(after_name);
        if data_start + file_size > bytes.len() {
            return Err(ArchiveError::new("cpio: truncated body"));
        }
        let data = bytes[data_start..data_start + file_size].to_vec();

        pos = align4(data_start + file_size);

        if name == "TRAILER!!!" {
            break;
        }
        members.push(Member { name, bytes: data });
    }

    Ok(members)
}

fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}
