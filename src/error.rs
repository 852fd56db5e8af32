//! Error types shared by the catalog loader, the selector and both front-ends.

use thiserror::Error;

/// How an error should be presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Non-fatal; the user can change a setting and try again.
    Warning,
    /// The current catalog cannot be used until another one is loaded.
    Error,
}

/// Failures while loading or filtering the exercise catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse catalog: {0}")]
    Csv(#[from] csv::Error),
    #[error("{}", missing_columns_message(.missing, .available, .suggestion))]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
        suggestion: Option<String>,
    },
    #[error("the catalog is empty; refresh it or check the file")]
    Empty,
    #[error("select at least one difficulty level and one equipment type")]
    NothingSelected,
    #[error("no exercises match the selected filters")]
    EmptyFilterResult,
}

fn missing_columns_message(
    missing: &[String],
    available: &[String],
    suggestion: &Option<String>,
) -> String {
    let mut msg = format!(
        "required columns not found: {}; available columns: {}",
        missing.join(", "),
        available.join(", ")
    );
    if let Some(s) = suggestion {
        msg.push_str(&format!(" (did you mean \"{s}\"?)"));
    }
    msg
}

impl CatalogError {
    pub fn severity(&self) -> Severity {
        match self {
            CatalogError::MissingColumns { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

/// Contract violations of [`crate::selector::select_workout`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("cannot select exercises from an empty catalog")]
    EmptyCatalog,
    #[error("exercise count must be positive, got {0}")]
    InvalidCount(usize),
}

/// Anything that can stop a workout from being generated.
#[derive(Debug, Error)]
pub enum WorkoutError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Select(#[from] SelectError),
}

impl WorkoutError {
    pub fn severity(&self) -> Severity {
        match self {
            WorkoutError::Catalog(e) => e.severity(),
            WorkoutError::Select(_) => Severity::Error,
        }
    }
}
