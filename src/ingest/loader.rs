//! Glob-based file discovery for text ingestion

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::error::{DataPrepError, Result};

/// A glob split into the literal directory to walk and the pattern below it
#[derive(Debug)]
pub struct GlobSpec {
    pub base: PathBuf,
    pub pattern: String,
    matcher: GlobMatcher,
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

impl GlobSpec {
    /// `docs/**/*.txt` walks `docs` and matches `**/*.txt` against paths
    /// relative to it. A glob without wildcards names a single file.
    pub fn parse(glob: &str) -> Result<Self> {
        let glob = glob.trim();
        if glob.is_empty() {
            return Err(DataPrepError::Config {
                message: "ingest glob is empty".into(),
            });
        }

        let path = Path::new(glob);
        let mut base = PathBuf::new();
        let mut rest: Vec<String> = Vec::new();
        for component in path.components() {
            let text = component.as_os_str().to_string_lossy();
            if rest.is_empty() && !has_glob_meta(&text) {
                base.push(component.as_os_str());
            } else if !matches!(component, Component::CurDir) {
                rest.push(text.into_owned());
            }
        }

        if rest.is_empty() {
            // No wildcard: the last component is the file itself
            let file = base
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .ok_or_else(|| DataPrepError::Config {
                    message: format!("ingest glob '{}' names no file", glob),
                })?;
            rest.push(globset::escape(&file));
            base.pop();
        }
        if base.as_os_str().is_empty() {
            base.push(".");
        }

        let pattern = rest.join("/");
        let matcher = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| DataPrepError::Config {
                message: format!("invalid ingest glob '{}': {}", glob, e),
            })?
            .compile_matcher();

        Ok(Self {
            base,
            pattern,
            matcher,
        })
    }

    pub fn is_match(&self, relative: &Path) -> bool {
        self.matcher.is_match(relative)
    }
}

/// Files under `spec.base` whose relative path matches, sorted
pub fn discover_files(spec: &GlobSpec) -> Result<Vec<PathBuf>> {
    if !spec.base.is_dir() {
        return Err(DataPrepError::NotFound {
            message: format!("ingest directory {} does not exist", spec.base.display()),
        });
    }

    let mut matches = Vec::new();
    for entry in WalkDir::new(&spec.base).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(&spec.base) else {
            continue;
        };
        if spec.is_match(relative) {
            matches.push(path.to_path_buf());
        }
    }
    matches.sort();
    Ok(matches)
}
