use clap::Parser;
use todoist_notion_sync::config::cli::Command;
use todoist_notion_sync::config::StorageKind;
use todoist_notion_sync::utils::error::{ErrorSeverity, SyncError};
use todoist_notion_sync::utils::logger;
use todoist_notion_sync::{
    run_action, Action, AppConfig, CliConfig, LocalStorage, MemoryStorage, TriggerResponse,
};

fn fail(e: &SyncError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

async fn dispatch(config: &AppConfig, action: Action) -> Result<TriggerResponse, SyncError> {
    Ok(match config.storage.kind {
        StorageKind::Local => {
            run_action(config, LocalStorage::new(config.storage.path.clone()), action).await
        }
        StorageKind::Memory => run_action(config, MemoryStorage::new(), action).await,
        StorageKind::S3 => {
            return Err(SyncError::config(
                "S3 mapping storage is only available in the lambda build",
            ))
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    tracing::debug!("CLI arguments: {:?}", cli);

    let config = cli.load_config().unwrap_or_else(|e| fail(&e));
    let action = match &cli.command {
        Command::Projects => Action::Projects,
        Command::Tasks => Action::Tasks,
        Command::Apply { .. } => match cli.instructions() {
            Ok(text) => Action::Instructions(text.unwrap_or_default()),
            Err(e) => fail(&e),
        },
    };

    let response = dispatch(&config, action).await.unwrap_or_else(|e| fail(&e));
    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if response.status_code >= 400 {
        std::process::exit(if response.status_code >= 500 { 2 } else { 3 });
    }

    Ok(())
}
