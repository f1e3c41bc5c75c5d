use anyhow::{Context, Result};
use crossterm::style::Stylize;
use std::{
    collections::HashSet,
    ffi::OsString,
    fmt, fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    errors::DocumentError,
    pairs::confirm::Confirmer,
    types::{CandidatePair, WhitelistDocument},
};

pub const OVERWRITE_PROMPT: &str = "Do you want to overwrite the existing config file? (y/n)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    /// Present before and after; `position` is 1-based in the new list.
    Unchanged { position: usize, symbol: String },
    Added { symbol: String },
    Removed { symbol: String },
}

impl DiffLine {
    pub fn styled(&self) -> String {
        match self {
            DiffLine::Unchanged { .. } => self.to_string(),
            DiffLine::Added { .. } => self.to_string().green().to_string(),
            DiffLine::Removed { .. } => self.to_string().red().to_string(),
        }
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffLine::Unchanged { position, symbol } => write!(f, "{}. {}", position, symbol),
            DiffLine::Added { symbol } => write!(f, "+ {}", symbol),
            DiffLine::Removed { symbol } => write!(f, "- {}", symbol),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistDiff {
    /// In new-list order.
    pub added: Vec<String>,
    /// In previous-list order.
    pub removed: Vec<String>,
    pub lines: Vec<DiffLine>,
}

impl WhitelistDiff {
    pub fn between(existing: &[String], new: &[String]) -> Self {
        let existing_set: HashSet<&str> = existing.iter().map(String::as_str).collect();
        let new_set: HashSet<&str> = new.iter().map(String::as_str).collect();

        let mut added = Vec::new();
        let mut lines = Vec::with_capacity(new.len());
        for (i, symbol) in new.iter().enumerate() {
            if existing_set.contains(symbol.as_str()) {
                lines.push(DiffLine::Unchanged {
                    position: i + 1,
                    symbol: symbol.clone(),
                });
            } else {
                if !added.contains(symbol) {
                    added.push(symbol.clone());
                }
                lines.push(DiffLine::Added {
                    symbol: symbol.clone(),
                });
            }
        }

        // a removed pair is by definition not in the new list, so list them last
        let mut removed: Vec<String> = Vec::new();
        for symbol in existing {
            if !new_set.contains(symbol.as_str()) && !removed.contains(symbol) {
                removed.push(symbol.clone());
                lines.push(DiffLine::Removed {
                    symbol: symbol.clone(),
                });
            }
        }

        Self {
            added,
            removed,
            lines,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn render(&self, out: &mut impl Write) -> std::io::Result<()> {
        for line in &self.lines {
            writeln!(out, "{}", line.styled())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Written {
        path: PathBuf,
        backup: Option<PathBuf>,
        count: usize,
    },
    Declined,
}

/// Shows how a fresh selection differs from the persisted whitelist and,
/// once confirmed, replaces it after backing up the previous file.
pub struct WhitelistReconciler<C: Confirmer> {
    path: PathBuf,
    confirmer: C,
}

impl<C: Confirmer> WhitelistReconciler<C> {
    pub fn new(path: impl Into<PathBuf>, confirmer: C) -> Self {
        Self {
            path: path.into(),
            confirmer,
        }
    }

    pub fn reconcile(&mut self, pairs: &[CandidatePair], out: &mut impl Write) -> Result<ReconcileOutcome> {
        let whitelist: Vec<String> = pairs.iter().map(|p| p.symbol.clone()).collect();
        let existing = load_whitelist(&self.path)?;
        let diff = WhitelistDiff::between(&existing, &whitelist);

        info!(
            "Whitelist diff against {}: {} added, {} removed",
            self.path.display(),
            diff.added.len(),
            diff.removed.len()
        );

        if diff.is_unchanged() {
            info!("Selection matches the current whitelist");
        }

        writeln!(out, "Number of pairs in whitelist: {}", whitelist.len())?;
        writeln!(out, "\nUpdated Pair Whitelist:")?;
        diff.render(out)?;
        out.flush()?;

        let prompt = if self.path.is_file() {
            OVERWRITE_PROMPT.to_string()
        } else {
            format!("Do you want to create {}? (y/n)", self.path.display())
        };
        if !self.confirmer.confirm(&prompt)? {
            info!("Whitelist not written, {} left untouched", self.path.display());
            return Ok(ReconcileOutcome::Declined);
        }

        let backup = backup_existing(&self.path)?;
        write_whitelist(&self.path, &whitelist)?;

        info!(
            "Wrote {} pairs to {}",
            whitelist.len(),
            self.path.display()
        );

        Ok(ReconcileOutcome::Written {
            path: self.path.clone(),
            backup,
            count: whitelist.len(),
        })
    }
}

/// Missing file or missing `pair_whitelist` key reads as an empty list.
pub fn load_whitelist(path: &Path) -> Result<Vec<String>, DocumentError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No existing whitelist at {}", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(DocumentError::io(path, e)),
    };

    let document: WhitelistDocument =
        serde_json::from_str(&content).map_err(|e| DocumentError::from_json(path, &e))?;
    Ok(document.exchange.pair_whitelist)
}

/// Replaces the whole document with `{"exchange": {"pair_whitelist": [...]}}`.
pub fn write_whitelist(path: &Path, symbols: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let document = WhitelistDocument::new(symbols.to_vec());
    let mut json = serde_json::to_string_pretty(&document)?;
    json.push('\n');

    fs::write(path, json).with_context(|| format!("Failed to write whitelist {}", path.display()))?;
    Ok(())
}

/// `<path>.bak`, or the first of `<path>.bak2`, `<path>.bak3`, ... not on disk.
pub fn next_backup_path(path: &Path) -> PathBuf {
    let mut base: OsString = path.as_os_str().to_owned();
    base.push(".bak");
    let first = PathBuf::from(&base);
    if !first.exists() {
        return first;
    }

    (2u32..)
        .map(|n| {
            let mut candidate = base.clone();
            candidate.push(n.to_string());
            PathBuf::from(candidate)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Copies `path` to its next free backup slot; nothing to do if it doesn't exist.
pub fn backup_existing(path: &Path) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }

    let backup = next_backup_path(path);
    fs::copy(path, &backup).with_context(|| {
        format!(
            "Failed to back up {} to {}",
            path.display(),
            backup.display()
        )
    })?;
    info!("Backed up {} to {}", path.display(), backup.display());
    Ok(Some(backup))
}
