//! Comparison of answer sets.
//!
//! Everything here is pure: callers fetch the answers, narrow them down with
//! a [`Selection`], and hand immutable snapshots to [`score_subjects`].

mod aggregate;
mod selection;

pub use aggregate::{
    rank, score_subjects, theme_agreement, theme_podium, Agreement, AnswerSet, ScoreError,
    Subject, SubjectScore, ThemeScore,
};
pub use selection::Selection;
