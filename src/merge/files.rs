//! Changed-file parsing and protected-file matching for merge validation.

use serde::{Deserialize, Serialize};

/// Paths that require a human to review the merge.
pub const DEFAULT_PROTECTED_FILES: [&str; 4] =
    ["package.json", "yarn.lock", "package-lock.json", "src/index.js"];

/// Ordered list of paths touched by a merge commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFileSet {
    files: Vec<String>,
}

impl ChangedFileSet {
    /// Parse `git log --name-only` output. The first non-empty line is the
    /// commit header; blank lines are separators.
    pub fn parse_log(output: &str) -> Self {
        let files = output
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .skip(1)
            .map(str::to_string)
            .collect();
        Self { files }
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl From<Vec<String>> for ChangedFileSet {
    fn from(files: Vec<String>) -> Self {
        Self { files }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtectedFileList(Vec<String>);

impl Default for ProtectedFileList {
    fn default() -> Self {
        Self(DEFAULT_PROTECTED_FILES.iter().map(|s| s.to_string()).collect())
    }
}

impl ProtectedFileList {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.iter().any(|p| p == path)
    }

    /// Changed files that hit the list, in the order they were changed.
    pub fn intersect<'a>(&self, changed: &'a ChangedFileSet) -> Vec<&'a str> {
        changed
            .files()
            .iter()
            .filter(|f| self.contains(f))
            .map(String::as_str)
            .collect()
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drops_header_and_blank_lines() {
        let changed = ChangedFileSet::parse_log("commit abc123\npackage.json\nsrc/app.js\n");
        assert_eq!(changed.files(), ["package.json", "src/app.js"]);

        let changed = ChangedFileSet::parse_log("commit abc123\nREADME.md\n\n");
        assert_eq!(changed.files(), ["README.md"]);
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        assert!(ChangedFileSet::parse_log("commit abc123\n").is_empty());
        assert!(ChangedFileSet::parse_log("").is_empty());
    }

    #[test]
    fn test_parse_preserves_order_and_ignores_leading_blank_lines() {
        let changed = ChangedFileSet::parse_log("\n\ncommit abc\nz.txt\n\na.txt\nm/n.rs\n");
        assert_eq!(changed.files(), ["z.txt", "a.txt", "m/n.rs"]);
    }

    #[test]
    fn test_default_protected_list_matches_exact_paths() {
        let protected = ProtectedFileList::default();
        assert!(protected.contains("package.json"));
        assert!(protected.contains("src/index.js"));
        assert!(!protected.contains("web/package.json"));
        assert!(!protected.contains("src/index.jsx"));
    }

    #[test]
    fn test_intersect_reports_hits_in_change_order() {
        let protected = ProtectedFileList::default();
        let changed = ChangedFileSet::parse_log("commit x\nyarn.lock\nREADME.md\npackage.json\n");
        assert_eq!(protected.intersect(&changed), vec!["yarn.lock", "package.json"]);

        let clean = ChangedFileSet::parse_log("commit x\nREADME.md\n");
        assert!(protected.intersect(&clean).is_empty());
    }
}
