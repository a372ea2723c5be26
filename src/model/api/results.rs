use serde::{Deserialize, Serialize};

use crate::model::{
    api::user::PublicUser,
    common::{QuizDefinition, ThemeId},
};
use crate::scoring::{theme_podium, Agreement, SubjectScore};

/// Why a subject is on the podium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Candidate,
    Friend,
}

/// A subject being compared against the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contender {
    pub user: PublicUser,
    pub kind: SubjectKind,
}

/// One place on a podium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodiumEntry {
    #[serde(flatten)]
    pub user: PublicUser,
    pub kind: SubjectKind,
    pub total: u32,
    pub total_max: u32,
    /// Absent when there is no jointly answered question.
    pub percent: Option<f64>,
}

impl PodiumEntry {
    fn new(contender: &Contender, agreement: Agreement) -> Self {
        Self {
            user: contender.user.clone(),
            kind: contender.kind,
            total: agreement.total,
            total_max: agreement.total_max,
            percent: agreement.percent(),
        }
    }
}

/// The ranking for a single theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePodium {
    pub theme_id: ThemeId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    pub podium: Vec<PodiumEntry>,
}

/// Everything a results page shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsDescription {
    /// Themes the scores are computed over, in quiz order.
    pub themes: Vec<ThemeId>,
    /// Overall ranking.
    pub podium: Vec<PodiumEntry>,
    /// One ranking per theme in `themes`.
    pub theme_podiums: Vec<ThemePodium>,
}

impl ResultsDescription {
    /// Lay out ranked `scores` for display. `scores` must have been computed
    /// over `themes`.
    pub fn new(
        quiz: &QuizDefinition,
        themes: Vec<ThemeId>,
        scores: &[SubjectScore<Contender>],
    ) -> Self {
        let podium = scores
            .iter()
            .map(|score| PodiumEntry::new(&score.subject, score.overall))
            .collect();

        let theme_podiums = themes
            .iter()
            .filter_map(|id| quiz.theme(id))
            .map(|theme| ThemePodium {
                theme_id: theme.id.clone(),
                label: theme.label.clone(),
                background_color: theme.background_color.clone(),
                podium: theme_podium(scores, &theme.id)
                    .into_iter()
                    .map(|(contender, agreement)| PodiumEntry::new(contender, agreement))
                    .collect(),
            })
            .collect();

        Self {
            themes,
            podium,
            theme_podiums,
        }
    }
}
