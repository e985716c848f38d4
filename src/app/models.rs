use crate::app::error::Error;
use regex::Regex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Literal prefix written after the opening fence of every dumped block.
pub const BLOCK_MARKER: &str = "screwdriver:";

/// Something that produces file records for a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    LocalDirectory(String),
    RemoteUrl(String),
}

/// Normalized configuration read from a document's front matter.
#[derive(Debug, Clone, Default)]
pub struct DumpConfig {
    /// Header text as written, between the opening `---` and the closing delimiter.
    pub header: String,
    pub sources: Vec<Source>,
    pub ignores: Vec<String>,
    pub filters: Vec<Regex>,
}

impl DumpConfig {
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().filter_map(|s| match s {
            Source::LocalDirectory(p) => Some(p.as_str()),
            Source::RemoteUrl(_) => None,
        })
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().filter_map(|s| match s {
            Source::RemoteUrl(u) => Some(u.as_str()),
            Source::LocalDirectory(_) => None,
        })
    }
}

/// Descriptive timestamps attached to a dumped block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamps {
    Local {
        created: Option<SystemTime>,
        modified: Option<SystemTime>,
    },
    Fetched(SystemTime),
}

/// A file or fetched resource ready to be serialized.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: String,
    pub content: Vec<u8>,
    pub timestamps: Timestamps,
}

/// Encoding tag carried on a block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Plain,
    Bin,
}

impl Encoding {
    pub fn tag(self) -> &'static str {
        match self {
            Encoding::Plain => "plain",
            Encoding::Bin => "bin",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "plain" => Some(Encoding::Plain),
            "bin" => Some(Encoding::Bin),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A file the restore parser wants written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteIntent {
    pub path: String,
    pub content: Vec<u8>,
    pub encoding: Encoding,
}

/// Outcome of one item (file, URL or block).
#[derive(Debug)]
pub enum Notice {
    Done(String),
    Failed { item: String, error: Error },
}

/// Per-item outcomes of a dump or restore, in processing order.
#[derive(Debug, Default)]
pub struct Report {
    pub notices: Vec<Notice>,
}

impl Report {
    pub fn done(&mut self, item: impl Into<String>) {
        let item = item.into();
        log::info!("✅ {}", item);
        self.notices.push(Notice::Done(item));
    }

    pub fn failed(&mut self, item: impl Into<String>, error: Error) {
        let item = item.into();
        log::warn!("❌ {}: {}", item, error);
        self.notices.push(Notice::Failed { item, error });
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.notices.iter().filter_map(|n| match n {
            Notice::Done(item) => Some(item.as_str()),
            Notice::Failed { .. } => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.notices.iter().filter_map(|n| match n {
            Notice::Failed { item, error } => Some((item.as_str(), error)),
            Notice::Done(_) => None,
        })
    }
}

/// Shared flag checked at every per-item suspension point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
