use serde::{Deserialize, Serialize};

use crate::model::common::{QuizDefinition, ThemeId};

/// Which candidates, friends and themes a results view should include.
///
/// This is the snapshot a client keeps between visits. Every key is
/// optional, and an absent key means "everything is selected".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Pseudonyms of the selected candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_candidates: Option<Vec<String>>,
    /// IDs of the selected themes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_themes: Option<Vec<ThemeId>>,
    /// Pseudonyms of the selected friends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_friends: Option<Vec<String>>,
}

impl Selection {
    /// A selection with every key absent.
    pub fn all() -> Self {
        Self::default()
    }

    /// A selection containing every candidate and theme, but no friends.
    /// This is what a public results page shows.
    pub fn public() -> Self {
        Self {
            selected_friends: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Narrow `all` down to the selected candidates, keeping the order of `all`.
    pub fn candidates<T>(&self, all: Vec<T>, pseudo: impl Fn(&T) -> Option<&str>) -> Vec<T> {
        intersect(self.selected_candidates.as_deref(), all, pseudo)
    }

    /// Narrow `all` down to the selected friends, keeping the order of `all`.
    pub fn friends<T>(&self, all: Vec<T>, pseudo: impl Fn(&T) -> Option<&str>) -> Vec<T> {
        intersect(self.selected_friends.as_deref(), all, pseudo)
    }

    /// Narrow `all` down to the selected themes, keeping the order of `all`.
    pub fn themes(&self, all: &[ThemeId]) -> Vec<ThemeId> {
        match &self.selected_themes {
            None => all.to_vec(),
            Some(selected) => all
                .iter()
                .filter(|id| selected.contains(*id))
                .cloned()
                .collect(),
        }
    }

    /// The selected themes in the order of `all`, or `None` when the client
    /// made no theme choice. An empty theme list counts as no choice.
    pub fn chosen_themes(&self, all: &[ThemeId]) -> Option<Vec<ThemeId>> {
        match &self.selected_themes {
            Some(selected) if !selected.is_empty() => Some(self.themes(all)),
            _ => None,
        }
    }

    /// The first selected theme that the quiz does not know about, if any.
    pub fn unknown_theme<'a>(&'a self, quiz: &QuizDefinition) -> Option<&'a ThemeId> {
        self.selected_themes
            .as_ref()?
            .iter()
            .find(|id| quiz.theme(id).is_none())
    }
}

fn intersect<T>(
    selected: Option<&[String]>,
    all: Vec<T>,
    pseudo: impl Fn(&T) -> Option<&str>,
) -> Vec<T> {
    match selected {
        None => all,
        Some(selected) => all
            .into_iter()
            .filter(|item| {
                pseudo(item).map_or(false, |name| selected.iter().any(|s| s == name))
            })
            .collect(),
    }
}
