//! Batch account provisioning
//!
//! Reads the `BATCH_USER_CREATION` value, creates every missing account and
//! skips the ones already present. Entries are handled strictly one after the
//! other and a failing entry never stops the batch.

pub mod backend;
pub mod batch;
pub mod creator;
pub mod executor;
pub mod system;

#[cfg(test)]
pub(crate) mod testing;

use serde::Serialize;

use crate::common::config::ProvisionConfig;
use crate::ui::prelude::*;

use self::backend::AccountBackend;
use self::batch::parse_batch;
use self::creator::{AccountCreator, AccountOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Created,
    Existing,
    CreateFailed,
    Failed,
    UsernameUndefined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Per-entry results of one run, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub entries: Vec<EntryReport>,
}

impl BatchReport {
    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Entries that reached the account creator
    pub fn processed(&self) -> usize {
        self.entries.iter().filter(|e| e.username.is_some()).count()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} users processed: {} created, {} already present, {} failed, {} without username",
            self.processed(),
            self.count(EntryStatus::Created),
            self.count(EntryStatus::Existing),
            self.count(EntryStatus::CreateFailed) + self.count(EntryStatus::Failed),
            self.count(EntryStatus::UsernameUndefined),
        )
    }
}

/// Provision every entry of `batch`.
///
/// Absent or blank input does nothing. Errors are logged per entry and never
/// returned; the report is informational.
pub fn run<B: AccountBackend>(
    batch: Option<&str>,
    backend: &B,
    config: &ProvisionConfig,
) -> BatchReport {
    let mut report = BatchReport::default();

    let entries = batch.map(parse_batch).unwrap_or_default();
    if entries.is_empty() {
        emit(
            Level::Debug,
            "batch.empty",
            "No batch user creation requested",
            None,
        );
        return report;
    }

    emit(
        Level::Info,
        "batch.start",
        "Starting batch user creation",
        None,
    );

    let creator = AccountCreator::new(backend, config);
    for entry in entries {
        let spec = match entry.spec {
            Ok(spec) => spec,
            Err(err) => {
                emit(
                    Level::Warn,
                    "batch.undefined",
                    &format!("Skipping entry {}: {}", entry.position, err),
                    None,
                );
                report.entries.push(EntryReport {
                    position: entry.position,
                    username: None,
                    status: EntryStatus::UsernameUndefined,
                    reason: Some(err.to_string()),
                });
                continue;
            }
        };

        emit(
            Level::Info,
            "batch.entry",
            &format!("Processing user {}", spec.username),
            None,
        );

        let (status, reason) = match creator.create(&spec) {
            Ok(AccountOutcome::Created) => (EntryStatus::Created, None),
            Ok(AccountOutcome::Existing) => (EntryStatus::Existing, None),
            Ok(AccountOutcome::CreateFailed(err)) => {
                (EntryStatus::CreateFailed, Some(err.to_string()))
            }
            Err(err) => {
                emit(
                    Level::Error,
                    "account.failed",
                    &format!("Error while provisioning {}: {:#}", spec.username, err),
                    None,
                );
                (EntryStatus::Failed, Some(format!("{:#}", err)))
            }
        };

        report.entries.push(EntryReport {
            position: entry.position,
            username: Some(spec.username),
            status,
            reason,
        });
    }

    emit(
        Level::Info,
        "batch.summary",
        &report.summary_line(),
        serde_json::to_value(&report).ok(),
    );
    emit(
        Level::Success,
        "batch.finished",
        "Batch user creation finished",
        None,
    );

    report
}
