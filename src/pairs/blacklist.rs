use std::{fmt, fs, io::ErrorKind, path::Path};

use tracing::{debug, info, warn};

use crate::{errors::DocumentError, types::BlacklistDocument};

/// One `pair_blacklist` entry, matched against the whole symbol.
///
/// `*` (or the regex spelling `.*`) stands for any run of characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairPattern {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    /// Literal segments separated by wildcards, first and last anchored.
    Glob(Vec<String>),
}

impl PairPattern {
    /// Returns `None` for entries that are empty once delimiters are removed.
    pub fn parse(entry: &str) -> Option<Self> {
        let cleaned = entry.trim().trim_matches('/').to_uppercase().replace(".*", "*");
        if cleaned.is_empty() {
            return None;
        }

        let parts: Vec<&str> = cleaned.split('*').collect();
        let last_idx = parts.len() - 1;
        // inner empty parts come from "**" and add nothing
        let segments: Vec<String> = parts
            .iter()
            .enumerate()
            .filter(|(i, part)| !part.is_empty() || *i == 0 || *i == last_idx)
            .map(|(_, part)| part.to_string())
            .collect();

        let pattern = match segments.as_slice() {
            [exact] => PairPattern::Exact(exact.clone()),
            [prefix, last] if last.is_empty() => PairPattern::Prefix(prefix.clone()),
            [first, suffix] if first.is_empty() => PairPattern::Suffix(suffix.clone()),
            [first, middle, last] if first.is_empty() && last.is_empty() => {
                PairPattern::Contains(middle.clone())
            }
            _ => PairPattern::Glob(segments),
        };
        Some(pattern)
    }

    pub fn matches(&self, symbol: &str) -> bool {
        let symbol = symbol.to_uppercase();
        match self {
            PairPattern::Exact(exact) => symbol == *exact,
            PairPattern::Prefix(prefix) => symbol.starts_with(prefix.as_str()),
            PairPattern::Suffix(suffix) => symbol.ends_with(suffix.as_str()),
            PairPattern::Contains(needle) => symbol.contains(needle.as_str()),
            PairPattern::Glob(segments) => glob_match(segments, &symbol),
        }
    }
}

impl fmt::Display for PairPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairPattern::Exact(exact) => write!(f, "{}", exact),
            PairPattern::Prefix(prefix) => write!(f, "{}*", prefix),
            PairPattern::Suffix(suffix) => write!(f, "*{}", suffix),
            PairPattern::Contains(needle) => write!(f, "*{}*", needle),
            PairPattern::Glob(segments) => write!(f, "{}", segments.join("*")),
        }
    }
}

fn glob_match(segments: &[String], text: &str) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return text.is_empty();
    };
    let Some((last, middle)) = rest.split_last() else {
        return text == first.as_str();
    };

    let Some(remaining) = text.strip_prefix(first.as_str()) else {
        return false;
    };
    let Some(mut body) = remaining.strip_suffix(last.as_str()) else {
        return false;
    };

    for segment in middle {
        match body.find(segment.as_str()) {
            Some(idx) => body = &body[idx + segment.len()..],
            None => return false,
        }
    }
    true
}

#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    patterns: Vec<PairPattern>,
}

impl Blacklist {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = entries
            .into_iter()
            .filter_map(|entry| PairPattern::parse(entry.as_ref()))
            .collect();
        Self { patterns }
    }

    pub fn is_blacklisted(&self, symbol: &str) -> bool {
        match self.patterns.iter().find(|p| p.matches(symbol)) {
            Some(pattern) => {
                debug!("{} blacklisted by pattern {}", symbol, pattern);
                true
            }
            None => false,
        }
    }

    pub fn patterns(&self) -> &[PairPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Reads `{"exchange": {"pair_blacklist": [...]}}` from `path`.
///
/// A missing file yields an empty blacklist. Malformed JSON is an error
/// carrying the line and column of the problem.
pub fn load_blacklist(path: &Path) -> Result<Blacklist, DocumentError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Blacklist file {} not found, no pairs excluded", path.display());
            return Ok(Blacklist::default());
        }
        Err(e) => return Err(DocumentError::io(path, e)),
    };

    let document: BlacklistDocument =
        serde_json::from_str(&content).map_err(|e| DocumentError::from_json(path, &e))?;

    let blacklist = Blacklist::from_entries(&document.exchange.pair_blacklist);
    debug!(
        "Blacklist patterns: {}",
        blacklist
            .patterns()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!(
        "Loaded {} blacklist patterns from {}",
        blacklist.len(),
        path.display()
    );
    Ok(blacklist)
}
