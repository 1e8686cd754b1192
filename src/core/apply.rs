use crate::adapters::notion::NotionClient;
use crate::core::mapping::IdMappingStore;
use crate::domain::model::{SyncAction, SyncPlan, SyncReport};
use crate::domain::ports::Storage;
use crate::utils::error::{ErrorCategory, SyncError};

/// Report line for a record that failed while the rest of the run went on.
pub fn item_error(kind: &str, name: &str, source_id: &str, err: &SyncError) -> String {
    if err.category() == ErrorCategory::Network {
        let status = err
            .status_code()
            .map(|code| format!(" (Status: {})", code))
            .unwrap_or_default();
        format!(
            "API Error processing {} '{}' (ID: {}){}: {}",
            kind, name, source_id, status, err
        )
    } else {
        format!(
            "Unexpected error processing {} '{}' (ID: {}): {}",
            kind, name, source_id, err
        )
    }
}

/// Executes a plan against one Notion database, one request at a time.
/// Failures are recorded per record; only the mapping write is attempted
/// after the loop.
pub async fn apply_plan<S: Storage>(
    notion: &NotionClient,
    database_id: &str,
    mapping: &mut IdMappingStore<S>,
    plan: SyncPlan,
    kind: &str,
    dry_run: bool,
) -> SyncReport {
    let mut report = SyncReport::default();

    for action in plan.actions {
        report.checked += 1;

        if dry_run {
            match &action {
                SyncAction::Create { .. } => report.created += 1,
                SyncAction::Update { .. } => report.updated += 1,
                SyncAction::Skip { .. } => report.skipped += 1,
            }
            tracing::info!("[dry-run] would {} {} '{}'", action_verb(&action), kind, action.name());
            continue;
        }

        match action {
            SyncAction::Create {
                source_id,
                name,
                properties,
            } => match notion.create_page(database_id, properties).await {
                Ok(page) => {
                    mapping.insert(&source_id, &page.id);
                    report.created += 1;
                    tracing::info!(
                        "Created Notion page for Todoist {}: '{}' (ID: {})",
                        kind,
                        name,
                        source_id
                    );
                }
                Err(e) => {
                    let message = item_error(kind, &name, &source_id, &e);
                    tracing::error!("{}", message);
                    report.errors.push(message);
                }
            },
            SyncAction::Update {
                source_id,
                page_id,
                name,
                properties,
            } => match notion.update_page(&page_id, properties).await {
                Ok(_) => {
                    mapping.insert(&source_id, &page_id);
                    report.updated += 1;
                    tracing::info!(
                        "Updated Notion page for Todoist {}: '{}' (ID: {})",
                        kind,
                        name,
                        source_id
                    );
                }
                Err(e) => {
                    let message = item_error(kind, &name, &source_id, &e);
                    tracing::error!("{}", message);
                    report.errors.push(message);
                }
            },
            SyncAction::Skip {
                source_id,
                name,
                reason,
            } => {
                report.skipped += 1;
                tracing::debug!("Skipped {} '{}' (ID: {}): {}", kind, name, source_id, reason);
            }
        }
    }

    if !dry_run {
        if let Err(e) = mapping.save().await {
            let message = format!("Failed to save {} id mapping: {}", kind, e);
            tracing::error!("{}", message);
            report.errors.push(message);
        }
    }

    report
}

fn action_verb(action: &SyncAction) -> &'static str {
    match action {
        SyncAction::Create { .. } => "create",
        SyncAction::Update { .. } => "update",
        SyncAction::Skip { .. } => "skip",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_error_includes_status_for_http_errors() {
        let err = SyncError::HttpStatusError {
            service: "Notion",
            status: 400,
            body: "validation_error".to_string(),
        };
        assert_eq!(
            item_error("project", "Home", "100", &err),
            "API Error processing project 'Home' (ID: 100) (Status: 400): Notion API returned 400: validation_error"
        );
    }

    #[test]
    fn test_item_error_for_other_failures() {
        let err = SyncError::StorageError {
            message: "disk full".to_string(),
        };
        assert_eq!(
            item_error("task", "Milk", "7", &err),
            "Unexpected error processing task 'Milk' (ID: 7): Storage error: disk full"
        );
    }
}
