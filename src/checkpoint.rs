// src/checkpoint.rs
//
// Run directory resolution and checkpoint naming.
//
// Training runs land under `<base>/runs*/<label>/<date>/<time>/` with a
// `checkpoints/` directory holding the serialized policy modules and a
// `parameters.json` snapshot. Candidates are found by segment-wise `*`
// wildcard matching and ordered by plain string comparison of the full
// path: directory names sort as timestamps, so the lexicographic maximum
// is the most recent run. No date parsing is attempted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Pattern matched against run-root directory names ("runs", "runs_azure", ...).
pub const RUNS_ROOT_PATTERN: &str = "runs*";

/// Name of the checkpoint subdirectory inside a run.
pub const CHECKPOINTS_DIR: &str = "checkpoints";

/// Which checkpoint files a run selection refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointId {
    /// The `*_latest.jit` files.
    Latest,
    /// A specific training iteration, zero-padded to six digits.
    Iteration(u32),
}

impl CheckpointId {
    /// Map a user-supplied iteration number: negative means latest.
    pub fn from_arg(iteration: i64) -> CheckpointId {
        if iteration < 0 {
            CheckpointId::Latest
        } else {
            CheckpointId::Iteration(iteration as u32)
        }
    }

    /// File-name token for this selection.
    pub fn token(&self) -> String {
        match self {
            CheckpointId::Latest => "latest".to_string(),
            CheckpointId::Iteration(it) => format!("{:06}", it),
        }
    }
}

/// The two serialized modules that make up a policy checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Action-producing network.
    Body,
    /// Latent-estimating network fed from observation history.
    Adaptation,
}

impl ModuleKind {
    /// File-name stem for this module.
    pub fn stem(&self) -> &'static str {
        match self {
            ModuleKind::Body => "body",
            ModuleKind::Adaptation => "adaptation_module",
        }
    }
}

/// Path of one serialized module inside a run directory.
///
/// No existence check is made here; a missing checkpoint surfaces as a
/// file-not-found error at load time.
pub fn module_path(run_dir: &Path, kind: ModuleKind, id: CheckpointId) -> PathBuf {
    run_dir
        .join(CHECKPOINTS_DIR)
        .join(format!("{}_{}.jit", kind.stem(), id.token()))
}

/// Path of the configuration snapshot inside a run directory.
pub fn snapshot_path(run_dir: &Path) -> PathBuf {
    run_dir.join("parameters.json")
}

/// Outcome of run resolution.
#[derive(Debug, Clone)]
pub struct ResolvedRun {
    /// Lexicographically maximal candidate; the one actually used.
    pub selected: PathBuf,
    /// Lexicographically minimal candidate, reported for orientation.
    pub earliest: PathBuf,
    /// Total number of matching run directories.
    pub candidates: usize,
}

/// Errors raised during run resolution.
#[derive(Debug, Clone)]
pub enum CheckpointError {
    /// No run directory matched the pattern. The sole resolver error path.
    NoMatchingRuns { base: String, pattern: String },
    Io { path: String, source: String },
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointError::NoMatchingRuns { base, pattern } => {
                write!(f, "no run directories match '{}' under '{}'", pattern, base)
            }
            CheckpointError::Io { path, source } => {
                write!(f, "failed to scan '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

/// Base directory the `runs*` roots live under.
///
/// From a source checkout (a `.git` marker in the working directory) runs
/// sit alongside the code; otherwise they are expected one level up.
pub fn runs_base(cwd: &Path) -> PathBuf {
    if cwd.join(".git").is_dir() {
        cwd.to_path_buf()
    } else {
        cwd.join("..")
    }
}

/// Match a single path segment against a pattern where `*` matches any
/// (possibly empty) run of characters. Everything else is literal.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = text;

    // Anchored prefix.
    let first = parts[0];
    if !rest.starts_with(first) {
        return false;
    }
    rest = &rest[first.len()..];

    // Interior fragments in order.
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }

    // Anchored suffix within what is left.
    let last = parts[parts.len() - 1];
    last.is_empty() || rest.ends_with(last)
}

/// Collect directories under `base` whose relative path matches the
/// slash-separated wildcard `pattern`, sorted by path string.
pub fn find_matching_dirs(base: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
    let mut current = vec![base.to_path_buf()];
    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        let mut next = Vec::new();
        for dir in &current {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                // A candidate that vanished or is unreadable just drops out.
                Err(_) => continue,
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }
                let name = entry.file_name();
                if wildcard_match(segment, &name.to_string_lossy()) {
                    next.push(path);
                }
            }
        }
        current = next;
    }
    current.sort_by_key(|p| p.to_string_lossy().into_owned());
    Ok(current)
}

/// Resolve the run directory to evaluate.
///
/// `pattern` is the full slash-separated wildcard path below `base`,
/// e.g. `runs*/gait-conditioned-agility/2*/train*/*`.
pub fn resolve_run(base: &Path, pattern: &str) -> Result<ResolvedRun, CheckpointError> {
    let candidates = find_matching_dirs(base, pattern).map_err(|e| CheckpointError::Io {
        path: base.display().to_string(),
        source: e.to_string(),
    })?;

    let earliest = candidates.first().cloned();
    let selected = candidates.last().cloned();
    match (earliest, selected) {
        (Some(earliest), Some(selected)) => Ok(ResolvedRun {
            selected,
            earliest,
            candidates: candidates.len(),
        }),
        _ => Err(CheckpointError::NoMatchingRuns {
            base: base.display().to_string(),
            pattern: pattern.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_latest_for_negative_iterations() {
        assert_eq!(CheckpointId::from_arg(-1).token(), "latest");
        assert_eq!(CheckpointId::from_arg(-100).token(), "latest");
    }

    #[test]
    fn token_is_zero_padded_for_iterations() {
        assert_eq!(CheckpointId::from_arg(5).token(), "000005");
        assert_eq!(CheckpointId::from_arg(0).token(), "000000");
        assert_eq!(CheckpointId::from_arg(123456).token(), "123456");
    }

    #[test]
    fn module_paths_use_stem_and_token() {
        let run = Path::new("/tmp/run");
        assert_eq!(
            module_path(run, ModuleKind::Body, CheckpointId::Iteration(5)),
            Path::new("/tmp/run/checkpoints/body_000005.jit")
        );
        assert_eq!(
            module_path(run, ModuleKind::Adaptation, CheckpointId::Latest),
            Path::new("/tmp/run/checkpoints/adaptation_module_latest.jit")
        );
    }

    #[test]
    fn wildcard_matches_literal_prefix_and_suffix() {
        assert!(wildcard_match("runs*", "runs"));
        assert!(wildcard_match("runs*", "runs_azure"));
        assert!(!wildcard_match("runs*", "checkpoints"));

        assert!(wildcard_match("2*", "2024-03-03"));
        assert!(!wildcard_match("2*", "pretrain-v0"));

        assert!(wildcard_match("train*", "train"));
        assert!(wildcard_match("train*", "train_many"));
        assert!(!wildcard_match("train*", "retrain"));

        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("*", ""));
    }

    #[test]
    fn wildcard_suffix_cannot_reuse_prefix_characters() {
        assert!(!wildcard_match("a*a", "a"));
        assert!(wildcard_match("a*a", "aa"));
        assert!(wildcard_match("a*a", "abca"));
    }

    #[test]
    fn resolve_picks_lexicographic_extremes() {
        let dir = tempfile::tempdir().unwrap();
        for time in ["2024-01-01/100000", "2024-03-03/171750", "2024-02-15/090000"] {
            std::fs::create_dir_all(dir.path().join("runs").join("label").join(time)).unwrap();
        }

        let resolved = resolve_run(dir.path(), "runs*/label/2*/*").unwrap();
        assert_eq!(resolved.candidates, 3);
        assert!(resolved.selected.ends_with("2024-03-03/171750"));
        assert!(resolved.earliest.ends_with("2024-01-01/100000"));
    }

    #[test]
    fn resolve_fails_deterministically_on_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_run(dir.path(), "runs*/label/2*/*").unwrap_err();
        assert!(matches!(err, CheckpointError::NoMatchingRuns { .. }));
    }
}
