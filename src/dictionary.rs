use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// A dictionary entry containing an internal space, with its word-bounded
/// search pattern compiled once at load.
#[derive(Debug, Clone)]
pub struct Phrase {
    pub name: String,
    pub pattern: Regex,
}

/// Reference medicine names, normalized to lowercase.
///
/// Immutable once built. Reloading produces a fresh instance so callers that
/// still hold the previous one keep a consistent view.
#[derive(Debug, Clone, Default)]
pub struct MedicineDictionary {
    entries: HashSet<String>,
    names: Vec<String>,
    multi_word: Vec<Phrase>,
    source: Option<PathBuf>,
}

impl MedicineDictionary {
    /// Loads one entry per non-empty line. A missing or unreadable source
    /// yields an empty dictionary so extraction degrades instead of failing.
    pub fn load(path: &Path) -> Self {
        let mut dictionary = if !path.exists() {
            warn!(
                "medicine file not found: {}; medicine extraction will not work",
                path.display()
            );
            Self::default()
        } else {
            match fs::read_to_string(path) {
                Ok(content) => {
                    let dictionary = Self::from_names(content.split(['\n', '\r']));
                    info!("loaded {} medicines from {}", dictionary.len(), path.display());
                    dictionary
                }
                Err(err) => {
                    error!("failed to read medicine file {}: {}", path.display(), err);
                    Self::default()
                }
            }
        };
        dictionary.source = Some(path.to_path_buf());
        dictionary
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: HashSet<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        let mut names: Vec<String> = entries.iter().cloned().collect();
        names.sort();

        let mut multi_word = Vec::new();
        for name in names.iter().filter(|name| name.contains(' ')) {
            let pattern = format!(r"\b{}\b", regex::escape(name));
            match Regex::new(&pattern) {
                Ok(pattern) => multi_word.push(Phrase {
                    name: name.clone(),
                    pattern,
                }),
                Err(err) => warn!("skipping phrase entry {:?}: {}", name, err),
            }
        }

        Self {
            entries,
            names,
            multi_word,
            source: None,
        }
    }

    /// Re-reads the source this dictionary was loaded from. Dictionaries built
    /// in memory have no source and reload as a copy of themselves.
    pub fn reload(&self) -> Self {
        match self.source.as_deref() {
            Some(path) => Self::load(path),
            None => self.clone(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    /// Entries in ascending order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn multi_word(&self) -> &[Phrase] {
        &self.multi_word
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
