/// Commands offered by the `/` popup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlashCommand {
    Clear,
    Help,
    Quit,
    Value,
}

impl SlashCommand {
    pub const ALL: [Self; 4] = [Self::Clear, Self::Help, Self::Quit, Self::Value];

    pub fn name(self) -> &'static str {
        match self {
            Self::Clear => "/clear",
            Self::Help => "/help",
            Self::Quit => "/quit",
            Self::Value => "/value",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Clear => "Clear the transcript",
            Self::Help => "Toggle key help",
            Self::Quit => "Exit the composer",
            Self::Value => "Show the serialized draft",
        }
    }

    /// Returns the commands whose name starts with `/query`.
    pub fn matching(query: &str) -> Vec<Self> {
        let query = query.to_lowercase();

        Self::ALL
            .into_iter()
            .filter(|command| command.name().trim_start_matches('/').starts_with(&query))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_empty_query_returns_all() {
        // Arrange & Act
        let commands = SlashCommand::matching("");

        // Assert
        assert_eq!(commands, SlashCommand::ALL.to_vec());
    }

    #[test]
    fn test_matching_filters_by_prefix_case_insensitively() {
        // Arrange & Act
        let commands = SlashCommand::matching("Q");
        let none = SlashCommand::matching("xyz");

        // Assert
        assert_eq!(commands, vec![SlashCommand::Quit]);
        assert!(none.is_empty());
    }
}
