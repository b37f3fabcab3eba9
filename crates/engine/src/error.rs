use gridmerge_core::NameExhausted;
use thiserror::Error;

use crate::host::HostError;

/// Which host mutation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStage {
    /// Creating the empty table (step one)
    CreateTable,
    /// Inserting the merged rows into the created table (step two)
    InsertRows,
    /// Creating the table together with its rows in one action
    StagedCreate,
}

impl std::fmt::Display for MutationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateTable => write!(f, "create table"),
            Self::InsertRows => write!(f, "insert rows"),
            Self::StagedCreate => write!(f, "create table with rows"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MergeError {
    /// Nothing usable to merge: no selections, or no columns came out.
    #[error("no data to merge: {0}")]
    NoData(String),

    #[error(transparent)]
    NameGenerationExhausted(#[from] NameExhausted),

    /// A host mutation failed. `orphan` is set when the table was created
    /// but its rows were not inserted; that table is left in the document.
    #[error("{stage} failed for table '{table}'{}: {source}", orphan_note(.orphan))]
    Mutation {
        stage: MutationStage,
        table: String,
        orphan: bool,
        #[source]
        source: HostError,
    },

    /// Submitted table name is unusable.
    #[error("{0}")]
    Validation(String),
}

fn orphan_note(orphan: &bool) -> &'static str {
    if *orphan {
        " (table was created and left without its rows)"
    } else {
        ""
    }
}

impl MergeError {
    /// The table left behind by a failed row insert, if any.
    pub fn orphan_table(&self) -> Option<&str> {
        match self {
            MergeError::Mutation {
                table,
                orphan: true,
                ..
            } => Some(table),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphan_is_called_out() {
        let err = MergeError::Mutation {
            stage: MutationStage::InsertRows,
            table: "Merged".into(),
            orphan: true,
            source: HostError::Rejected("disk full".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("insert rows failed for table 'Merged'"), "{msg}");
        assert!(msg.contains("left without its rows"), "{msg}");
        assert!(msg.contains("disk full"), "{msg}");
        assert_eq!(err.orphan_table(), Some("Merged"));
    }

    #[test]
    fn test_create_failure_has_no_orphan() {
        let err = MergeError::Mutation {
            stage: MutationStage::CreateTable,
            table: "Merged".into(),
            orphan: false,
            source: HostError::Rejected("read-only".into()),
        };
        assert!(!err.to_string().contains("left without"));
        assert_eq!(err.orphan_table(), None);
    }

    #[test]
    fn test_exhausted_message() {
        let err: MergeError = NameExhausted { base: "Orders".into(), attempts: 10 }.into();
        assert!(err.to_string().contains("'Orders' after 10 attempt(s)"));
    }
}
