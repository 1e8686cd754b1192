use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use todoist_notion_sync::app::{error_response, TriggerRequest};
use todoist_notion_sync::config::StorageKind;
use todoist_notion_sync::utils::logger;
use todoist_notion_sync::{
    run_action, Action, LambdaConfig, MemoryStorage, S3Storage, TriggerResponse,
};

fn prepare(request: &TriggerRequest) -> todoist_notion_sync::Result<(LambdaConfig, Action)> {
    let mut lambda_config = LambdaConfig::from_env()?;
    if let Some(dry_run) = request.dry_run {
        lambda_config.app.sync.dry_run = dry_run;
    }
    let action = request.to_action()?;
    Ok((lambda_config, action))
}

async fn function_handler(event: LambdaEvent<TriggerRequest>) -> Result<TriggerResponse, Error> {
    tracing::info!("Starting Todoist to Notion sync function");

    let (lambda_config, action) = match prepare(&event.payload) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!("Rejected invocation: {}", e);
            return Ok(error_response(&e));
        }
    };
    let config = &lambda_config.app;

    let response = match (&config.storage.kind, &config.storage.bucket) {
        (StorageKind::S3, Some(bucket)) => {
            // 創建 S3 客戶端
            let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
            let s3_config = aws_sdk_s3::config::Builder::from(&aws)
                .region(Region::new(lambda_config.mapping_region()))
                .build();
            let storage = S3Storage::new(S3Client::from_conf(s3_config), bucket.clone());
            run_action(config, storage, action).await
        }
        _ => run_action(config, MemoryStorage::new(), action).await,
    };

    tracing::info!("Sync function finished with status {}", response.status_code);
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
