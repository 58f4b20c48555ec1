/// Best-score persistence.
///
/// ## File format:
///   Key-value lines, `best_score=N`. Unknown keys are ignored so the file
///   can grow later. A missing, unreadable or corrupt file reads as 0.
///
/// Stored as `best_score.dat` in the save directory.

use std::io;
use std::path::{Path, PathBuf};

const BEST_SCORE_FILE: &str = "best_score.dat";

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

pub fn save_dir() -> PathBuf {
    // 1. Exe directory (local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ are not writable
            let test_path = parent.join(".write_test_lucys_maze");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. ~/.local/share/lucys-maze
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/lucys-maze");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Store
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    /// Store in the default save directory.
    pub fn open() -> Self {
        HighScoreStore { path: save_dir().join(BEST_SCORE_FILE) }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        HighScoreStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> u32 {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse_best_score(&content).unwrap_or_else(|| {
                log::warn!("corrupt best score file {}, treating as 0", self.path.display());
                0
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => {
                log::warn!("could not read {}: {e}", self.path.display());
                0
            }
        }
    }

    /// Persist `score` if it beats the stored best. Returns true on a new
    /// record, even if writing the file failed.
    pub fn record(&self, score: u32) -> bool {
        if score <= self.load() {
            return false;
        }
        if let Err(e) = self.write(score) {
            log::warn!("could not save best score to {}: {e}", self.path.display());
        }
        true
    }

    pub fn reset(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn write(&self, score: u32) -> io::Result<()> {
        std::fs::write(&self.path, serialize(score))
    }
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize(best: u32) -> String {
    format!("best_score={}\n", best)
}

fn parse_best_score(content: &str) -> Option<u32> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("best_score="))
        .and_then(|val| val.trim().parse().ok())
}
