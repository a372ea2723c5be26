use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::model::common::{AnswerIndex, QuestionId, QuizDefinition, Theme, ThemeId};

/// One party's recorded answers, keyed by question.
pub type AnswerSet = HashMap<QuestionId, AnswerIndex>;

/// Data-integrity problems found while scoring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("Unknown theme '{0}'")]
    UnknownTheme(ThemeId),
    #[error("Stored answer {index} is out of range for question '{question_id}' ({options} options)")]
    AnswerOutOfRange {
        question_id: QuestionId,
        index: AnswerIndex,
        options: usize,
    },
}

/// Raw agreement between two answer sets, with the best attainable value.
///
/// `total_max` only counts questions both parties answered, so a zero
/// `total_max` means there is nothing to compare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub total: u32,
    pub total_max: u32,
}

impl Agreement {
    /// Is there at least one jointly answered question behind this value?
    pub fn is_comparable(&self) -> bool {
        self.total_max != 0
    }

    /// Agreement as a percentage, or `None` when there is no comparable data.
    pub fn percent(&self) -> Option<f64> {
        self.is_comparable()
            .then(|| f64::from(self.total) * 100.0 / f64::from(self.total_max))
    }

    /// Ordering for podiums: higher percentage first, no comparable data last.
    ///
    /// Percentages are compared by cross-multiplication so that equal ratios
    /// are exactly equal.
    pub fn ranking_order(&self, other: &Self) -> Ordering {
        match (self.is_comparable(), other.is_comparable()) {
            (true, true) => {
                let ours = u64::from(self.total) * u64::from(other.total_max);
                let theirs = u64::from(other.total) * u64::from(self.total_max);
                theirs.cmp(&ours)
            }
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => Ordering::Equal,
        }
    }
}

impl std::ops::AddAssign for Agreement {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.total_max += other.total_max;
    }
}

/// Agreement within a single theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeScore {
    pub theme_id: ThemeId,
    pub agreement: Agreement,
}

/// A comparison subject (candidate, friend...) together with its answers.
#[derive(Debug, Clone)]
pub struct Subject<T> {
    pub subject: T,
    pub answers: AnswerSet,
}

/// The scores of one subject against the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectScore<T> {
    pub subject: T,
    /// One entry per theme under consideration, in the order requested.
    pub themes: Vec<ThemeScore>,
    /// Sum over `themes`.
    pub overall: Agreement,
}

impl<T> SubjectScore<T> {
    pub fn theme(&self, theme_id: &str) -> Option<&Agreement> {
        self.themes
            .iter()
            .find(|score| score.theme_id == theme_id)
            .map(|score| &score.agreement)
    }
}

/// Agreement between `reference` and `subject` over the questions of `theme`.
///
/// Each jointly answered question contributes its maximum deviation minus
/// the distance between the two answers. Questions answered by only one
/// party are skipped entirely.
pub fn theme_agreement(
    reference: &AnswerSet,
    subject: &AnswerSet,
    theme: &Theme,
) -> Result<Agreement, ScoreError> {
    let mut agreement = Agreement::default();
    for question in &theme.questions {
        let (Some(&ours), Some(&theirs)) = (reference.get(&question.id), subject.get(&question.id))
        else {
            continue;
        };
        for index in [ours, theirs] {
            if !question.accepts(index) {
                return Err(ScoreError::AnswerOutOfRange {
                    question_id: question.id.clone(),
                    index,
                    options: question.answers.len(),
                });
            }
        }
        let max = question.max_deviation();
        agreement += Agreement {
            total: max - ours.abs_diff(theirs),
            total_max: max,
        };
    }
    Ok(agreement)
}

/// Score every subject against `reference` over `theme_ids`, and rank them.
///
/// Subjects come back ordered by overall percentage, highest first; ties and
/// subjects without comparable data keep their input order (the latter after
/// everyone else).
pub fn score_subjects<T>(
    reference: &AnswerSet,
    subjects: Vec<Subject<T>>,
    quiz: &QuizDefinition,
    theme_ids: &[ThemeId],
) -> Result<Vec<SubjectScore<T>>, ScoreError> {
    let themes = theme_ids
        .iter()
        .map(|id| {
            quiz.theme(id)
                .ok_or_else(|| ScoreError::UnknownTheme(id.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut scores = Vec::with_capacity(subjects.len());
    for Subject { subject, answers } in subjects {
        let mut overall = Agreement::default();
        let mut per_theme = Vec::with_capacity(themes.len());
        for theme in &themes {
            let agreement = theme_agreement(reference, &answers, theme)?;
            overall += agreement;
            per_theme.push(ThemeScore {
                theme_id: theme.id.clone(),
                agreement,
            });
        }
        scores.push(SubjectScore {
            subject,
            themes: per_theme,
            overall,
        });
    }

    rank(&mut scores);
    Ok(scores)
}

/// Stable sort by overall agreement.
pub fn rank<T>(scores: &mut [SubjectScore<T>]) {
    scores.sort_by(|a, b| a.overall.ranking_order(&b.overall));
}

/// The podium for a single theme: subjects with comparable data for that
/// theme, ranked by their theme percentage. Stable.
pub fn theme_podium<'a, T>(
    scores: &'a [SubjectScore<T>],
    theme_id: &str,
) -> Vec<(&'a T, Agreement)> {
    let mut podium = scores
        .iter()
        .filter_map(|score| {
            score
                .theme(theme_id)
                .filter(|agreement| agreement.is_comparable())
                .map(|agreement| (&score.subject, *agreement))
        })
        .collect::<Vec<_>>();
    podium.sort_by(|(_, a), (_, b)| a.ranking_order(b));
    podium
}
