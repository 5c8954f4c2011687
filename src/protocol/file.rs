use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a remote directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    File,
    Directory,
    Link,
}

/// Immutable description of a remote directory entry as produced by LIST.
///
/// `link` is empty unless the entry is a symbolic link. `size` is `-1`
/// when the server did not report one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    name: String,
    link: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    modified: DateTime<Utc>,
    size: i64,
    kind: FileKind,
}

impl FileRecord {
    pub fn new<T: Into<String>>(name: T, kind: FileKind, size: i64, modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            link: String::new(),
            modified,
            size,
            kind,
        }
    }

    /// Creates a symbolic link entry pointing at `target`
    pub fn link<T: Into<String>, L: Into<String>>(
        name: T,
        target: L,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            link: target.into(),
            ..Self::new(name, FileKind::Link, -1, modified)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link_target(&self) -> &str {
        &self.link
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// Formats the entry as a long listing line
impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FileKind::File => '-',
            FileKind::Directory => 'd',
            FileKind::Link => 'l',
        };

        write!(
            f,
            "{} {:>10} {} {}",
            kind,
            self.size.max(0),
            self.modified.format("%b %d %Y %H:%M"),
            self.name
        )?;

        if !self.link.is_empty() {
            write!(f, " -> {}", self.link)?;
        }

        Ok(())
    }
}
