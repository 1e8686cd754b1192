use crate::domain::model::{SyncOutcome, SyncReport};
use crate::domain::ports::SyncPipeline;
use crate::utils::error::{ErrorCategory, Result, SyncError};

pub struct SyncEngine<P: SyncPipeline> {
    pipeline: P,
}

impl<P: SyncPipeline> SyncEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<SyncReport> {
        let name = self.pipeline.name();
        tracing::info!("Starting {} sync", name);

        tracing::debug!("Extracting {} data from Todoist and Notion", name);
        let snapshot = self.pipeline.extract().await?;

        let plan = self.pipeline.plan(snapshot).await?;
        tracing::info!(
            "Planned {} {} action(s): {} create(s), {} update(s)",
            plan.actions.len(),
            name,
            plan.creates(),
            plan.updates()
        );

        let report = self.pipeline.apply(plan).await?;
        tracing::info!("{}", report.message());
        if !report.errors.is_empty() {
            tracing::warn!("--- Error Details ---");
            for error in &report.errors {
                tracing::warn!("{}", error);
            }
            tracing::warn!("--- End Error Details ---");
        }

        Ok(report)
    }

    /// Like `run`, but folds fatal errors into a response for the trigger.
    pub async fn run_to_outcome(&self) -> SyncOutcome {
        match self.run().await {
            Ok(report) => SyncOutcome::completed(report),
            Err(e) => failure_outcome(&e, SyncReport::default()),
        }
    }
}

/// Configuration problems answer 400; everything else that stops a run
/// answers 500.
pub fn failure_outcome(err: &SyncError, partial: SyncReport) -> SyncOutcome {
    tracing::error!(
        "Sync failed: {} (Category: {:?}, Severity: {:?})",
        err,
        err.category(),
        err.severity()
    );
    match err.category() {
        _ if matches!(err, SyncError::GcpProjectNotSetError) => SyncOutcome::failed(
            500,
            format!("Server configuration error: {}", err),
            partial,
            "GCP_PROJECT not set".to_string(),
        ),
        _ if err.is_client_error() => {
            SyncOutcome::failed(400, err.to_string(), partial, err.to_string())
        }
        ErrorCategory::Network => SyncOutcome::failed(
            500,
            format!("A critical API error occurred: {}", err),
            partial,
            format!("Critical API error: {}", err),
        ),
        _ => SyncOutcome::failed(
            500,
            format!("An unexpected critical error occurred: {}", err),
            partial,
            format!("Critical unhandled error: {}", err),
        ),
    }
}
