use std::path::Path;

use composer::{FileMentionOption, MentionKind, MentionResolver};
use ignore::WalkBuilder;

use crate::settings::SkillSetting;

const MAX_DEPTH: usize = 10;
const MAX_ENTRIES: usize = 500;

/// A single row of the `@` mention popup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionEntry {
    pub option: FileMentionOption,
    /// Secondary text: the relative path, or a skill description.
    pub detail: String,
}

impl MentionEntry {
    fn search_key(&self) -> &str {
        match self.option.kind {
            MentionKind::Skill => &self.option.label,
            MentionKind::File | MentionKind::Folder => &self.option.path,
        }
    }
}

/// Every mention the terminal host can offer.
#[derive(Clone, Debug, Default)]
pub struct MentionCatalog {
    entries: Vec<MentionEntry>,
}

impl MentionCatalog {
    pub fn new(entries: Vec<MentionEntry>) -> Self {
        Self { entries }
    }

    /// Lists the workspace under `root` and appends `skills`.
    pub fn load(root: &Path, repository: &str, skills: &[SkillSetting]) -> Self {
        let mut entries = list_workspace(root, repository);
        entries.extend(skills.iter().map(|skill| MentionEntry {
            option: FileMentionOption::skill(&skill.name),
            detail: skill.description.clone(),
        }));

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fuzzy-filters entries and returns them sorted by best match.
    ///
    /// Query characters must appear in order (case-insensitive) within the
    /// path, or within the name for skills. Results are ranked by
    /// consecutive-character runs and matches at the start of path segments.
    pub fn filter(&self, query: &str) -> Vec<&MentionEntry> {
        if query.is_empty() {
            return self.entries.iter().collect();
        }

        let query_chars: Vec<char> = query.to_lowercase().chars().collect();
        let mut scored: Vec<(&MentionEntry, i32)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                fuzzy_score(entry.search_key(), &query_chars).map(|score| (entry, score))
            })
            .collect();

        scored.sort_by(|first, second| {
            second
                .1
                .cmp(&first.1)
                .then(first.0.search_key().cmp(second.0.search_key()))
        });

        scored.into_iter().map(|(entry, _)| entry).collect()
    }
}

impl MentionResolver for MentionCatalog {
    fn resolve(&self, id: &str) -> Option<FileMentionOption> {
        self.entries
            .iter()
            .find(|entry| entry.option.id == id)
            .map(|entry| entry.option.clone())
    }
}

/// Lists files and folders under `root`, respecting `.gitignore`.
///
/// Returns at most [`MAX_ENTRIES`] entries with a maximum depth of
/// [`MAX_DEPTH`], sorted by path.
pub fn list_workspace(root: &Path, repository: &str) -> Vec<MentionEntry> {
    let walker = WalkBuilder::new(root)
        .max_depth(Some(MAX_DEPTH))
        .hidden(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    let mut entries: Vec<MentionEntry> = walker
        .filter_map(Result::ok)
        .filter(|entry| entry.depth() > 0)
        .filter_map(|entry| {
            let is_dir = entry.file_type()?.is_dir();
            let relative = entry.path().strip_prefix(root).ok()?;
            let path = relative.to_string_lossy().replace('\\', "/");
            let option = if is_dir {
                FileMentionOption::folder(repository, &path)
            } else {
                FileMentionOption::file(repository, &path)
            };

            Some(MentionEntry {
                option,
                detail: path,
            })
        })
        .collect();

    sort_and_limit_entries(&mut entries);

    entries
}

fn sort_and_limit_entries(entries: &mut Vec<MentionEntry>) {
    entries.sort_by(|first, second| first.option.path.cmp(&second.option.path));
    entries.truncate(MAX_ENTRIES);
}

/// Scores a fuzzy match of `query_chars` against `path`.
///
/// Returns `Some(score)` if all query characters appear in order,
/// `None` if the path does not match.
fn fuzzy_score(path: &str, query_chars: &[char]) -> Option<i32> {
    let path_lower: Vec<char> = path.to_lowercase().chars().collect();
    if query_chars.len() > path_lower.len() {
        return None;
    }

    let mut score: i32 = 0;
    let mut query_index = 0;
    let mut previous: Option<char> = None;
    let mut prev_matched = false;

    for &path_char in &path_lower {
        if query_index >= query_chars.len() {
            break;
        }

        if path_char == query_chars[query_index] {
            score += 1;
            if prev_matched {
                score += 3;
            }
            if previous.is_none_or(|before| matches!(before, '/' | '.' | '_' | '-')) {
                score += 5;
            }
            query_index += 1;
            prev_matched = true;
        } else {
            prev_matched = false;
        }
        previous = Some(path_char);
    }

    (query_index == query_chars.len()).then_some(score)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn file_entry(path: &str) -> MentionEntry {
        MentionEntry {
            option: FileMentionOption::file("acme/repo", path),
            detail: path.to_string(),
        }
    }

    fn paths(entries: &[MentionEntry]) -> Vec<&str> {
        entries
            .iter()
            .map(|entry| entry.option.path.as_str())
            .collect()
    }

    #[test]
    fn test_list_workspace_empty_directory() {
        // Arrange
        let temp_dir = TempDir::new().expect("test expectation should hold");

        // Act
        let entries = list_workspace(temp_dir.path(), "acme/repo");

        // Assert
        assert!(entries.is_empty());
    }

    #[test]
    fn test_list_workspace_includes_folders_and_files() {
        // Arrange
        let temp_dir = TempDir::new().expect("test expectation should hold");
        fs::create_dir_all(temp_dir.path().join("src")).expect("test expectation should hold");
        fs::write(temp_dir.path().join("src/main.rs"), "").expect("test expectation should hold");

        // Act
        let entries = list_workspace(temp_dir.path(), "acme/repo");

        // Assert
        assert_eq!(paths(&entries), vec!["src", "src/main.rs"]);
        assert_eq!(entries[0].option.kind, MentionKind::Folder);
        assert_eq!(entries[0].option.id, "folder:acme/repo:src");
        assert_eq!(entries[1].option.id, "file:acme/repo:src/main.rs");
    }

    #[test]
    fn test_list_workspace_respects_gitignore() {
        // Arrange
        let temp_dir = TempDir::new().expect("test expectation should hold");
        std::process::Command::new("git")
            .args(["init", "-q"])
            .current_dir(temp_dir.path())
            .output()
            .expect("test expectation should hold");
        fs::write(temp_dir.path().join(".gitignore"), "ignored.txt\n")
            .expect("test expectation should hold");
        fs::write(temp_dir.path().join("kept.txt"), "").expect("test expectation should hold");
        fs::write(temp_dir.path().join("ignored.txt"), "").expect("test expectation should hold");

        // Act
        let entries = list_workspace(temp_dir.path(), "acme/repo");

        // Assert
        let paths = paths(&entries);
        assert!(paths.contains(&"kept.txt"));
        assert!(!paths.contains(&"ignored.txt"));
        assert!(!paths.iter().any(|path| path.starts_with(".git/")));
    }

    #[test]
    fn test_sort_and_limit_entries_truncates_after_sort() {
        // Arrange
        let mut entries: Vec<MentionEntry> = (0..MAX_ENTRIES + 20)
            .rev()
            .map(|index| file_entry(&format!("file_{index:04}.txt")))
            .collect();

        // Act
        sort_and_limit_entries(&mut entries);

        // Assert
        assert_eq!(entries.len(), MAX_ENTRIES);
        assert_eq!(
            entries.first().map(|entry| entry.option.path.as_str()),
            Some("file_0000.txt")
        );
    }

    #[test]
    fn test_load_appends_skills() {
        // Arrange
        let temp_dir = TempDir::new().expect("test expectation should hold");
        fs::write(temp_dir.path().join("a.txt"), "").expect("test expectation should hold");
        let skills = vec![SkillSetting {
            name: "review".to_string(),
            description: "Review the diff".to_string(),
        }];

        // Act
        let catalog = MentionCatalog::load(temp_dir.path(), "acme/repo", &skills);

        // Assert
        assert_eq!(catalog.len(), 2);
        let skill = catalog.filter("rev");
        assert_eq!(skill.len(), 1);
        assert_eq!(skill[0].option.id, "skill:review");
        assert_eq!(skill[0].detail, "Review the diff");
    }

    #[test]
    fn test_filter_ranks_consecutive_match_first() {
        // Arrange
        let catalog = MentionCatalog::new(vec![
            file_entry("src/xmxaxixn.rs"),
            file_entry("src/main.rs"),
            file_entry("README.md"),
        ]);

        // Act
        let filtered = catalog.filter("main");

        // Assert
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].option.path, "src/main.rs");
    }

    #[test]
    fn test_filter_empty_query_returns_all() {
        // Arrange
        let catalog = MentionCatalog::new(vec![file_entry("a.txt"), file_entry("b.txt")]);

        // Act
        let filtered = catalog.filter("");

        // Assert
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_fuzzy_score_rejects_wrong_order() {
        // Arrange & Act
        let result = fuzzy_score("abc.txt", &['c', 'b']);

        // Assert
        assert!(result.is_none());
    }

    #[test]
    fn test_catalog_resolves_known_ids_only() {
        // Arrange
        let catalog = MentionCatalog::new(vec![file_entry("src/lib.rs")]);

        // Act
        let known = catalog.resolve("file:acme/repo:src/lib.rs");
        let unknown = catalog.resolve("file:acme/repo:src/other.rs");

        // Assert
        assert_eq!(known.map(|option| option.label), Some("lib.rs".to_string()));
        assert!(unknown.is_none());
    }
}
