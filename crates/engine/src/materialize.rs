//! Turning a merged grid into a new table in the host document.
//!
//! The default path is two separate host mutations, create then insert, and
//! is not atomic: if the insert fails the created table stays behind as an
//! orphan and the error says so. When the host supports staged creation the
//! table and its rows go out as one action and that failure mode disappears.

use gridmerge_core::{names, MergedGrid, DEFAULT_MAX_RETRIES};
use serde::Serialize;

use crate::error::{MergeError, MutationStage};
use crate::host::{DocumentHost, HostError, RowPlaceholder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Candidate budget when picking a free table name
    pub max_retries: usize,
    /// Navigate to the new table after creation
    pub navigate: bool,
    /// Use the host's staged create when it has one
    pub staged_create: bool,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            navigate: true,
            staged_create: true,
        }
    }
}

/// Outcome of a successful materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Materialized {
    /// Table id as returned by the host
    pub table_id: String,
    /// Name picked by the resolver before the host was asked
    pub requested_name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub staged: bool,
    pub navigated: bool,
    /// Navigation failure, reported but not fatal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SheetMaterializer {
    options: MaterializeOptions,
}

impl SheetMaterializer {
    pub fn new(options: MaterializeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MaterializeOptions {
        &self.options
    }

    /// Create a table named after `base_name` holding `grid`.
    ///
    /// Does not touch any selection state; clearing the store on success is
    /// up to the caller.
    pub fn materialize<H>(
        &self,
        host: &mut H,
        grid: &MergedGrid,
        base_name: &str,
    ) -> Result<Materialized, MergeError>
    where
        H: DocumentHost + ?Sized,
    {
        if grid.is_empty() {
            return Err(MergeError::NoData("merged grid has no columns".into()));
        }

        let requested_name =
            names::resolve(base_name, |name| host.table_exists(name), self.options.max_retries)
                .map_err(|e| {
                    tracing::warn!(base = base_name, attempts = e.attempts, "no free table name");
                    MergeError::from(e)
                })?;

        let placeholders: Vec<RowPlaceholder> = vec![None; grid.row_count()];
        let staged = self.options.staged_create && host.supports_staged_create();

        let table_id = if staged {
            host.create_table_with_rows(
                &requested_name,
                grid.columns(),
                &placeholders,
                grid.bulk_data(),
            )
            .map_err(|source| {
                mutation_failed(MutationStage::StagedCreate, &requested_name, false, source)
            })?
        } else {
            let table_id = host
                .create_table(&requested_name, grid.columns())
                .map_err(|source| {
                    mutation_failed(MutationStage::CreateTable, &requested_name, false, source)
                })?;

            if grid.row_count() > 0 {
                host.bulk_insert_rows(&table_id, &placeholders, grid.bulk_data())
                    .map_err(|source| {
                        mutation_failed(MutationStage::InsertRows, &table_id, true, source)
                    })?;
            }
            table_id
        };

        tracing::debug!(
            table = %table_id,
            rows = grid.row_count(),
            columns = grid.column_count(),
            staged,
            "created merged table"
        );

        let mut navigated = false;
        let mut navigation_error = None;
        if self.options.navigate {
            match host.navigate_to_table(&table_id) {
                Ok(()) => navigated = true,
                Err(e) => {
                    tracing::warn!(table = %table_id, error = %e, "could not open created table");
                    navigation_error = Some(e.to_string());
                }
            }
        }

        Ok(Materialized {
            table_id,
            requested_name,
            row_count: grid.row_count(),
            column_count: grid.column_count(),
            staged,
            navigated,
            navigation_error,
        })
    }
}

fn mutation_failed(
    stage: MutationStage,
    table: &str,
    orphan: bool,
    source: HostError,
) -> MergeError {
    if orphan {
        tracing::error!(
            %stage,
            table,
            error = %source,
            "host mutation failed, table left without rows"
        );
    } else {
        tracing::error!(%stage, table, error = %source, "host mutation failed");
    }
    MergeError::Mutation {
        stage,
        table: table.to_string(),
        orphan,
        source,
    }
}
