//! The path resolver: ordered load-path search with content negotiation.

use std::path::{Component, Path, PathBuf};

use tracing::trace;

use crate::accept::{parse_accept, AcceptEntry};
use crate::error::ResolveError;
use crate::extensions::{parse_basename, ParsedBasename};
use crate::mime::{mime_range_match, EngineRegistry, MimeRegistry};

/// A successfully resolved logical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Absolute path of the matched file.
    pub filename: PathBuf,

    /// The content type the file will have once its engine chain runs.
    pub content_type: Option<String>,

    /// Engine extensions consumed from the basename, outer-first.
    pub engine_exts: Vec<String>,

    /// Logical alias when the file was found as `index.*` inside a
    /// same-named directory.
    pub index_alias: Option<String>,
}

/// One candidate file discovered during a load-path scan.
struct Candidate {
    filename: PathBuf,
    parsed: ParsedBasename,
    load_path_idx: usize,
    dir_order: usize,
    index_alias: Option<String>,
}

/// Resolves logical paths against an immutable configuration snapshot.
///
/// Borrows the load paths and registries for the duration of one build;
/// configuration changes replace those values wholesale, so a resolver never
/// observes mutation.
pub struct Resolver<'a> {
    load_paths: &'a [PathBuf],
    mimes: &'a MimeRegistry,
    engines: &'a EngineRegistry,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over the given load paths and registries.
    pub fn new(
        load_paths: &'a [PathBuf],
        mimes: &'a MimeRegistry,
        engines: &'a EngineRegistry,
    ) -> Self {
        Self {
            load_paths,
            mimes,
            engines,
        }
    }

    /// Resolves a path string to a concrete file.
    ///
    /// `path` is either a logical path searched across the load paths or an
    /// absolute path, which resolves only if it is contained in a load path.
    /// `accept` is an optional weighted accept list; when absent, the
    /// logical path's own format extension constrains the match.
    pub fn resolve(&self, path: &str, accept: Option<&str>) -> Result<Resolved, ResolveError> {
        if Path::new(path).is_absolute() {
            return self.resolve_absolute(Path::new(path));
        }

        let logical = Path::new(path);
        let basename = logical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ResolveError::FileNotFound(path.to_string()))?;
        let parsed_logical = parse_basename(&basename, self.mimes, self.engines);

        let accept_entries: Vec<AcceptEntry> = match accept {
            Some(list) => parse_accept(list),
            None => parsed_logical
                .content_type(self.mimes, self.engines)
                .map(|ct| vec![(ct.to_string(), 1000)])
                .unwrap_or_default(),
        };

        let mut candidates = Vec::new();
        for (lp_idx, load_path) in self.load_paths.iter().enumerate() {
            let dir = match logical.parent() {
                Some(parent) if parent != Path::new("") => load_path.join(parent),
                _ => load_path.clone(),
            };
            self.scan_dir(&dir, &parsed_logical, path, lp_idx, &mut candidates)?;
        }

        let best = self
            .negotiate(candidates, &accept_entries)
            .ok_or_else(|| ResolveError::FileNotFound(path.to_string()))?;

        trace!(path, filename = %best.filename.display(), "resolved logical path");
        let content_type = best
            .parsed
            .content_type(self.mimes, self.engines)
            .map(String::from);
        Ok(Resolved {
            filename: best.filename,
            content_type,
            engine_exts: best.parsed.engine_exts,
            index_alias: best.index_alias,
        })
    }

    fn resolve_absolute(&self, path: &Path) -> Result<Resolved, ResolveError> {
        // Containment is checked component-wise, so `..` segments must be
        // collapsed first or they could escape a load path.
        let path = normalize(path);
        if !self.load_paths.iter().any(|lp| path.starts_with(lp)) {
            return Err(ResolveError::FileOutsidePaths(path));
        }
        if !path.is_file() {
            return Err(ResolveError::FileNotFound(
                path.to_string_lossy().into_owned(),
            ));
        }
        let basename = path.file_name().unwrap_or_default().to_string_lossy();
        let parsed = parse_basename(&basename, self.mimes, self.engines);
        let content_type = parsed.content_type(self.mimes, self.engines).map(String::from);
        Ok(Resolved {
            filename: path,
            content_type,
            engine_exts: parsed.engine_exts,
            index_alias: None,
        })
    }

    /// Collects candidates from one directory: exact basename matches plus
    /// `index.*` files inside a same-named subdirectory.
    fn scan_dir(
        &self,
        dir: &Path,
        logical: &ParsedBasename,
        logical_path: &str,
        lp_idx: usize,
        candidates: &mut Vec<Candidate>,
    ) -> Result<(), ResolveError> {
        for (name, entry_path, is_dir) in sorted_entries(dir)? {
            if is_dir {
                if name == logical.name {
                    for (index_name, index_path, index_is_dir) in sorted_entries(&entry_path)? {
                        if index_is_dir {
                            continue;
                        }
                        let parsed = parse_basename(&index_name, self.mimes, self.engines);
                        if parsed.name == "index" {
                            let alias = self.index_alias_for(&parsed, logical_path);
                            candidates.push(Candidate {
                                filename: index_path,
                                parsed,
                                load_path_idx: lp_idx,
                                dir_order: candidates.len(),
                                index_alias: Some(alias),
                            });
                        }
                    }
                }
                continue;
            }

            let parsed = parse_basename(&name, self.mimes, self.engines);
            if parsed.name == logical.name {
                candidates.push(Candidate {
                    filename: entry_path,
                    parsed,
                    load_path_idx: lp_idx,
                    dir_order: candidates.len(),
                    index_alias: None,
                });
            }
        }
        Ok(())
    }

    /// The logical alias recorded for an `index.*` match, e.g. `app` found
    /// as `app/index.js` aliases to `app.js`.
    fn index_alias_for(&self, parsed: &ParsedBasename, logical_path: &str) -> String {
        let ext = parsed.format_ext.clone().or_else(|| {
            parsed
                .content_type(self.mimes, self.engines)
                .and_then(|ct| self.mimes.exts_for(ct).first().map(|e| e.to_string()))
        });
        match ext {
            Some(ext) => format!("{logical_path}.{ext}"),
            None => logical_path.to_string(),
        }
    }

    /// Picks the best candidate: highest accept quality first, then load-path
    /// priority, then directory-listing order.
    fn negotiate(
        &self,
        candidates: Vec<Candidate>,
        accept: &[AcceptEntry],
    ) -> Option<Candidate> {
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let quality = self.quality_for(&candidate, accept)?;
                Some((candidate, quality))
            })
            .min_by(|(a, qa), (b, qb)| {
                qb.cmp(qa)
                    .then(a.load_path_idx.cmp(&b.load_path_idx))
                    .then(a.dir_order.cmp(&b.dir_order))
            })
            .map(|(candidate, _)| candidate)
    }

    fn quality_for(&self, candidate: &Candidate, accept: &[AcceptEntry]) -> Option<u16> {
        if accept.is_empty() {
            return Some(1000);
        }
        let content_type = candidate.parsed.content_type(self.mimes, self.engines);
        accept
            .iter()
            .filter(|(range, _)| match content_type {
                Some(ct) => mime_range_match(range, ct),
                None => range == "*/*",
            })
            .map(|(_, q)| *q)
            .max()
    }
}

/// Collapses `.` and `..` components without touching the filesystem.
///
/// A `..` at the root is dropped, so the result never climbs above an
/// absolute path's root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Lists a directory sorted by entry name. A missing directory is an empty
/// listing, not an error.
fn sorted_entries(dir: &Path) -> Result<Vec<(String, PathBuf, bool)>, ResolveError> {
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ResolveError::Io {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    let mut entries: Vec<(String, PathBuf, bool)> = read
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            let is_dir = path.is_dir();
            (name, path, is_dir)
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}
