//! Template source directories and override resolution.
//!
//! A [`SourceList`] is an ordered list of places templates come from, highest
//! priority first. Identifiers are relative paths with `/` separators. The
//! list exposes the union of identifiers across all sources and resolves each
//! identifier to the first source that has it, so a service-local file fully
//! replaces a shared default with the same relative path.

use crate::error::{Result, SsotError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Something that can list and read template files.
pub trait TemplateSource {
    /// Human-readable location, used in log lines and error messages.
    fn location(&self) -> String;

    /// Every identifier this source provides.
    ///
    /// Returns [`SsotError::TemplateNotFound`] when the source does not exist.
    fn identifiers(&self) -> Result<Vec<String>>;

    /// Raw bytes for `identifier`, or `None` if this source lacks it.
    fn read(&self, identifier: &str) -> Result<Option<Vec<u8>>>;
}

/// A directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
    ignore: GlobSet,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>, ignore: GlobSet) -> Self {
        Self {
            root: root.into(),
            ignore,
        }
    }
}

impl TemplateSource for DirSource {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn identifiers(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(SsotError::TemplateNotFound(self.root.clone()));
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = entry.map_err(|e| {
                let context = format!("failed to walk '{}'", self.root.display());
                match e.into_io_error() {
                    Some(source) => SsotError::io(context, source),
                    None => SsotError::User(format!("{}: symlink loop", context)),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let identifier = identifier_for(relative);
            if self.ignore.is_match(&identifier) {
                debug!(identifier = %identifier, "ignoring source file");
                continue;
            }
            found.push(identifier);
        }
        Ok(found)
    }

    fn read(&self, identifier: &str) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(identifier);
        if !path.is_file() {
            return Ok(None);
        }
        fs::read(&path)
            .map(Some)
            .map_err(|e| SsotError::io(format!("failed to read '{}'", path.display()), e))
    }
}

/// A template resolved to its winning source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub identifier: String,
    /// Location of the source that won.
    pub origin: String,
    pub content: Vec<u8>,
}

/// Priority-ordered template sources.
#[derive(Default)]
pub struct SourceList {
    sources: Vec<Box<dyn TemplateSource>>,
}

impl SourceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list of directory sources sharing one set of ignore globs.
    pub fn from_dirs<I, P>(dirs: I, ignore_globs: &[String]) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let ignore = build_ignore_set(ignore_globs)?;
        let mut list = Self::new();
        for dir in dirs {
            list.push(DirSource::new(dir, ignore.clone()));
        }
        Ok(list)
    }

    /// Append a source with lower priority than every existing one.
    pub fn push(&mut self, source: impl TemplateSource + 'static) {
        self.sources.push(Box::new(source));
    }

    /// The de-duplicated union of identifiers across all existing sources.
    ///
    /// Missing sources are skipped with an info line.
    pub fn identifiers(&self) -> Result<BTreeSet<String>> {
        let mut all = BTreeSet::new();
        for source in &self.sources {
            match source.identifiers() {
                Ok(ids) => all.extend(ids),
                Err(SsotError::TemplateNotFound(path)) => {
                    info!(source = %path.display(), "template source not found, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(all)
    }

    /// Content of `identifier` from the highest-priority source holding it.
    pub fn resolve(&self, identifier: &str) -> Result<Option<ResolvedSource>> {
        for source in &self.sources {
            if let Some(content) = source.read(identifier)? {
                return Ok(Some(ResolvedSource {
                    identifier: identifier.to_string(),
                    origin: source.location(),
                    content,
                }));
            }
        }
        Ok(None)
    }
}

/// Compile ignore patterns into a single matcher.
pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            SsotError::User(format!("invalid ignore glob '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| SsotError::User(format!("failed to compile ignore globs: {}", e)))
}

fn identifier_for(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
