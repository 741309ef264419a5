use std::collections::{BTreeSet, HashMap};

/// How an IOC entry matches versions of its package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IocMatch {
    /// Every version of the package is compromised.
    Wildcard,
    /// Only these exact version strings are compromised.
    Versions(BTreeSet<String>),
}

/// One indicator of compromise: a package name and the versions it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IocEntry {
    pub name: String,
    pub matcher: IocMatch,
}

impl IocEntry {
    pub fn wildcard(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matcher: IocMatch::Wildcard,
        }
    }

    pub fn versions<I, S>(name: impl Into<String>, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            matcher: IocMatch::Versions(versions.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.matcher, IocMatch::Wildcard)
    }

    /// Literal membership test; no range or semver interpretation.
    pub fn matches_version(&self, version: &str) -> bool {
        match &self.matcher {
            IocMatch::Wildcard => true,
            IocMatch::Versions(versions) => versions.contains(version),
        }
    }

    fn merge(&mut self, other: IocMatch) {
        match other {
            IocMatch::Wildcard => self.matcher = IocMatch::Wildcard,
            IocMatch::Versions(theirs) => {
                if let IocMatch::Versions(ours) = &mut self.matcher {
                    ours.extend(theirs);
                }
            }
        }
    }
}

/// Name-keyed lookup over every IOC feed. Built once per run, read-only after.
///
/// Lookups are exact and case-sensitive, and the scope is part of the name:
/// `@babel/plugin-syntax-class-properties` never matches an entry for
/// `syntax-class-properties`.
#[derive(Debug, Clone, Default)]
pub struct IocIndex {
    entries: HashMap<String, IocEntry>,
}

impl IocIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges the wildcard list from the CSV feed with the version-keyed list
    /// from the JSON feed.
    pub fn from_feeds(csv: Vec<IocEntry>, json: Vec<IocEntry>) -> Self {
        let mut index = Self::new();
        index.extend(csv);
        index.extend(json);
        index
    }

    /// Adds an entry. A wildcard from any source wins over a version set;
    /// two version sets are unioned.
    pub fn insert(&mut self, entry: IocEntry) {
        match self.entries.get_mut(&entry.name) {
            Some(existing) => existing.merge(entry.matcher),
            None => {
                self.entries.insert(entry.name.clone(), entry);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&IocEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn wildcard_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_wildcard()).count()
    }
}

impl Extend<IocEntry> for IocIndex {
    fn extend<T: IntoIterator<Item = IocEntry>>(&mut self, iter: T) {
        for entry in iter {
            self.insert(entry);
        }
    }
}

impl FromIterator<IocEntry> for IocIndex {
    fn from_iter<T: IntoIterator<Item = IocEntry>>(iter: T) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_wins_regardless_of_order() {
        let csv_first = IocIndex::from_feeds(
            vec![IocEntry::wildcard("left-pad")],
            vec![IocEntry::versions("left-pad", ["1.0.0"])],
        );
        assert!(csv_first.get("left-pad").unwrap().is_wildcard());

        let json_first: IocIndex = [
            IocEntry::versions("left-pad", ["1.0.0"]),
            IocEntry::wildcard("left-pad"),
        ]
        .into_iter()
        .collect();
        assert!(json_first.get("left-pad").unwrap().is_wildcard());
        assert_eq!(json_first.len(), 1);
    }

    #[test]
    fn test_version_sets_are_unioned() {
        let index: IocIndex = [
            IocEntry::versions("@ctrl/tinycolor", ["4.1.1"]),
            IocEntry::versions("@ctrl/tinycolor", ["4.1.2"]),
        ]
        .into_iter()
        .collect();

        let entry = index.get("@ctrl/tinycolor").unwrap();
        assert!(entry.matches_version("4.1.1"));
        assert!(entry.matches_version("4.1.2"));
        assert!(!entry.matches_version("4.1.0"));
    }

    #[test]
    fn test_wildcard_matches_any_version() {
        let entry = IocEntry::wildcard("bad");
        assert!(entry.matches_version("0.0.1"));
        assert!(entry.matches_version("99.0.0-beta"));
    }

    #[test]
    fn test_version_match_is_literal() {
        let entry = IocEntry::versions("pkg", ["1.0.0"]);
        assert!(entry.matches_version("1.0.0"));
        assert!(!entry.matches_version("v1.0.0"));
        assert!(!entry.matches_version("1.0"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let index: IocIndex = [IocEntry::wildcard("syntax-class-properties")]
            .into_iter()
            .collect();

        assert!(index.contains("syntax-class-properties"));
        assert!(!index.contains("@babel/plugin-syntax-class-properties"));
        assert!(!index.contains("Syntax-Class-Properties"));
        assert!(!index.contains("syntax-class"));
    }

    #[test]
    fn test_counts() {
        let index = IocIndex::from_feeds(
            vec![IocEntry::wildcard("a"), IocEntry::wildcard("b")],
            vec![IocEntry::versions("c", ["1.0.0"])],
        );
        assert_eq!(index.len(), 3);
        assert_eq!(index.wildcard_count(), 2);
        assert!(!index.is_empty());
    }
}
