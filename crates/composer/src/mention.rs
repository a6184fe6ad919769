use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opening delimiter of a serialized mention token.
pub const TOKEN_OPEN: &str = "@[";
/// Closing delimiter of a serialized mention token.
pub const TOKEN_CLOSE: char = ']';

/// Referenced resource family of a mention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionKind {
    /// A single file inside a repository.
    #[default]
    File,
    /// A directory inside a repository.
    Folder,
    /// A named skill.
    Skill,
}

impl MentionKind {
    /// Returns the identifier prefix used in the token protocol.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
            Self::Skill => "skill",
        }
    }

    /// Returns the glyph rendered in front of chip labels.
    pub fn icon(self) -> &'static str {
        match self {
            Self::File => "▤",
            Self::Folder => "▸",
            Self::Skill => "✦",
        }
    }
}

impl fmt::Display for MentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a mention identifier fails structural parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MentionIdError {
    #[error("mention id `{0}` has no kind prefix")]
    MissingKind(String),
    #[error("unknown mention kind `{0}`")]
    UnknownKind(String),
    #[error("mention id `{id}` is missing its {field}")]
    MissingField { id: String, field: &'static str },
}

/// Structurally parsed mention identifier.
///
/// Grammar: `file:<repository>:<path>`, `folder:<repository>:<path>` or
/// `skill:<name>`. Only the first two colons delimit fields, so paths may
/// contain colons themselves.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MentionId {
    File { repository: String, path: String },
    Folder { repository: String, path: String },
    Skill { name: String },
}

impl MentionId {
    /// Returns the resource family of this identifier.
    pub fn kind(&self) -> MentionKind {
        match self {
            Self::File { .. } => MentionKind::File,
            Self::Folder { .. } => MentionKind::Folder,
            Self::Skill { .. } => MentionKind::Skill,
        }
    }

    /// Returns the default chip label: the last path segment for files and
    /// folders, the name for skills.
    pub fn label(&self) -> String {
        match self {
            Self::File { path, .. } | Self::Folder { path, .. } => last_segment(path).to_string(),
            Self::Skill { name } => name.clone(),
        }
    }

    /// Builds the chip represented by this identifier.
    pub fn to_chip(&self) -> MentionChip {
        let (repository, path) = match self {
            Self::File { repository, path } | Self::Folder { repository, path } => {
                (Some(repository.clone()), Some(path.clone()))
            }
            Self::Skill { .. } => (None, None),
        };

        MentionChip {
            id: self.to_string(),
            kind: self.kind(),
            label: self.label(),
            path,
            repository,
        }
    }
}

impl FromStr for MentionId {
    type Err = MentionIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((kind, rest)) = value.split_once(':') else {
            return Err(MentionIdError::MissingKind(value.to_string()));
        };
        let missing = |field| MentionIdError::MissingField {
            id: value.to_string(),
            field,
        };

        match kind {
            "file" | "folder" => {
                let (repository, path) = rest.split_once(':').ok_or_else(|| missing("path"))?;
                if repository.is_empty() {
                    return Err(missing("repository"));
                }
                if path.is_empty() {
                    return Err(missing("path"));
                }
                let repository = repository.to_string();
                let path = path.to_string();

                Ok(if kind == "file" {
                    Self::File { repository, path }
                } else {
                    Self::Folder { repository, path }
                })
            }
            "skill" => {
                if rest.is_empty() {
                    return Err(missing("name"));
                }

                Ok(Self::Skill {
                    name: rest.to_string(),
                })
            }
            other => Err(MentionIdError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for MentionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { repository, path } => write!(f, "file:{repository}:{path}"),
            Self::Folder { repository, path } => write!(f, "folder:{repository}:{path}"),
            Self::Skill { name } => write!(f, "skill:{name}"),
        }
    }
}

/// Option offered by a mention popup and used to build a chip.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMentionOption {
    pub id: String,
    pub label: String,
    pub path: String,
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletions: Option<u32>,
    #[serde(rename = "type")]
    pub kind: MentionKind,
}

impl FileMentionOption {
    /// Creates an option for a file inside `repository`.
    pub fn file(repository: &str, path: &str) -> Self {
        Self::from_id(&MentionId::File {
            repository: repository.to_string(),
            path: path.to_string(),
        })
    }

    /// Creates an option for a folder inside `repository`.
    pub fn folder(repository: &str, path: &str) -> Self {
        Self::from_id(&MentionId::Folder {
            repository: repository.to_string(),
            path: path.to_string(),
        })
    }

    /// Creates an option for a named skill.
    pub fn skill(name: &str) -> Self {
        Self::from_id(&MentionId::Skill {
            name: name.to_string(),
        })
    }

    fn from_id(id: &MentionId) -> Self {
        let (repository, path) = match id {
            MentionId::File { repository, path } | MentionId::Folder { repository, path } => {
                (repository.clone(), path.clone())
            }
            MentionId::Skill { .. } => (String::new(), String::new()),
        };

        Self {
            id: id.to_string(),
            label: id.label(),
            path,
            repository,
            truncated_path: None,
            additions: None,
            deletions: None,
            kind: id.kind(),
        }
    }
}

/// Atomic mention reference embedded in the document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionChip {
    pub id: String,
    pub kind: MentionKind,
    pub label: String,
    pub path: Option<String>,
    pub repository: Option<String>,
}

impl MentionChip {
    /// Returns the serialized token `@[<id>]` for this chip.
    pub fn token(&self) -> String {
        token(&self.id)
    }

    /// Returns the token length in characters.
    pub fn token_len(&self) -> usize {
        self.id.chars().count() + 3
    }
}

impl From<&FileMentionOption> for MentionChip {
    fn from(option: &FileMentionOption) -> Self {
        let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_string());

        Self {
            id: option.id.clone(),
            kind: option.kind,
            label: option.label.clone(),
            path: non_empty(&option.path),
            repository: non_empty(&option.repository),
        }
    }
}

/// Formats `id` as a serialized mention token.
pub fn token(id: &str) -> String {
    format!("{TOKEN_OPEN}{id}{TOKEN_CLOSE}")
}

fn last_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');

    trimmed
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_id_keeps_colons_in_path() {
        // Arrange
        let raw = "file:acme/repo:src/a:b.ts";

        // Act
        let id = raw.parse::<MentionId>();

        // Assert
        assert_eq!(
            id,
            Ok(MentionId::File {
                repository: "acme/repo".to_string(),
                path: "src/a:b.ts".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_skill_id() {
        // Arrange & Act
        let id = "skill:review".parse::<MentionId>();

        // Assert
        assert_eq!(
            id,
            Ok(MentionId::Skill {
                name: "review".to_string()
            })
        );
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        // Arrange & Act & Assert
        assert!(matches!(
            "file:acme".parse::<MentionId>(),
            Err(MentionIdError::MissingField { field: "path", .. })
        ));
        assert!(matches!(
            "folder::src".parse::<MentionId>(),
            Err(MentionIdError::MissingField {
                field: "repository",
                ..
            })
        ));
        assert!(matches!(
            "skill:".parse::<MentionId>(),
            Err(MentionIdError::MissingField { field: "name", .. })
        ));
        assert_eq!(
            "plain".parse::<MentionId>(),
            Err(MentionIdError::MissingKind("plain".to_string()))
        );
        assert_eq!(
            "user:bob".parse::<MentionId>(),
            Err(MentionIdError::UnknownKind("user".to_string()))
        );
    }

    #[test]
    fn test_folder_label_uses_last_segment() {
        // Arrange
        let id = MentionId::Folder {
            repository: "acme/repo".to_string(),
            path: "src/components/".to_string(),
        };

        // Act
        let chip = id.to_chip();

        // Assert
        assert_eq!(chip.label, "components");
        assert_eq!(chip.id, "folder:acme/repo:src/components/");
        assert_eq!(chip.kind, MentionKind::Folder);
    }

    #[test]
    fn test_chip_from_skill_option_drops_empty_location() {
        // Arrange
        let option = FileMentionOption::skill("deploy");

        // Act
        let chip = MentionChip::from(&option);

        // Assert
        assert_eq!(chip.id, "skill:deploy");
        assert_eq!(chip.repository, None);
        assert_eq!(chip.path, None);
        assert_eq!(chip.token(), "@[skill:deploy]");
        assert_eq!(chip.token_len(), "@[skill:deploy]".chars().count());
    }

    #[test]
    fn test_option_deserializes_from_host_json() {
        // Arrange
        let json = r#"{
            "id": "file:acme/repo:src/a.ts",
            "label": "a.ts",
            "path": "src/a.ts",
            "repository": "acme/repo",
            "truncatedPath": "src/",
            "additions": 3,
            "type": "file"
        }"#;

        // Act
        let option: FileMentionOption =
            serde_json::from_str(json).expect("option json should parse");

        // Assert
        assert_eq!(option.kind, MentionKind::File);
        assert_eq!(option.truncated_path.as_deref(), Some("src/"));
        assert_eq!(option.additions, Some(3));
        assert_eq!(option.deletions, None);
    }
}
