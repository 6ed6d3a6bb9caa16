use thiserror::Error;

/// Broad class of a [`NestError`]; every failure is a caller-input problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structure description or pivot table is incomplete or inconsistent.
    Configuration,
    /// A compiled mapping does not encode a usable root.
    Structural,
    /// No rows or no mapping were supplied.
    EmptyInput,
    /// A row lacks columns the mapping needs.
    DataShape,
}

#[derive(Debug, Error)]
pub enum NestError {
    #[error("could not compile structure: no root pivot point supplied")]
    MissingRootPivot,
    #[error("no pivot point supplied for level \"{path}\"")]
    MissingPivot { path: String },
    #[error("level \"{name}\" is defined more than once")]
    DuplicateLevel { name: String },
    #[error("field \"{name}\" collides with a level of the same name")]
    FieldCollision { name: String },
    #[error("column \"{column}\" is mapped more than once")]
    DuplicateColumn { column: String },
    #[error("invalid separator {0:?}: must be non-empty and must not contain brackets")]
    InvalidSeparator(String),
    #[error("invalid path \"{path}\" for column \"{column}\": {reason}")]
    InvalidPath {
        column: String,
        path: String,
        reason: &'static str,
    },

    #[error("could not detect root element in path for column \"{column}\"")]
    MissingRootElement { column: String },
    #[error("column \"{column}\" is rooted at \"{found}\", expected \"{expected}\"")]
    InconsistentRoot {
        column: String,
        expected: String,
        found: String,
    },
    #[error("path for column \"{column}\" expects a container at \"{segment}\" but a value is present")]
    PathConflict { column: String, segment: String },

    #[error("row set can not be empty")]
    EmptyRows,
    #[error("compiled mapping can not be empty")]
    EmptyMapping,

    #[error("invalid row {}: not all required columns are present, missing: \"{}\"", .row, .missing.join("\", \""))]
    MissingColumns { row: usize, missing: Vec<String> },
}

impl NestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NestError::MissingRootPivot
            | NestError::MissingPivot { .. }
            | NestError::DuplicateLevel { .. }
            | NestError::FieldCollision { .. }
            | NestError::DuplicateColumn { .. }
            | NestError::InvalidSeparator(_)
            | NestError::InvalidPath { .. } => ErrorKind::Configuration,
            NestError::MissingRootElement { .. }
            | NestError::InconsistentRoot { .. }
            | NestError::PathConflict { .. } => ErrorKind::Structural,
            NestError::EmptyRows | NestError::EmptyMapping => ErrorKind::EmptyInput,
            NestError::MissingColumns { .. } => ErrorKind::DataShape,
        }
    }
}

pub type Result<T, E = NestError> = std::result::Result<T, E>;
