use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// HTTP and AWS plumbing logs every connection at debug; keep it at warn unless
// RUST_LOG asks for more.
const QUIET_DEPENDENCIES: &[&str] = &[
    "hyper=warn",
    "hyper_util=warn",
    "reqwest=warn",
    "rustls=warn",
    "h2=warn",
    "aws_config=warn",
    "aws_smithy_runtime=warn",
    "lambda_runtime=info",
];

/// Default filter directives when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> String {
    let own = if verbose {
        "todoist_notion_sync=debug"
    } else {
        "todoist_notion_sync=info"
    };
    let mut directives = vec!["warn", own];
    directives.extend_from_slice(QUIET_DEPENDENCIES);
    directives.join(",")
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                // stdout carries the JSON response
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

pub fn init_lambda_logger() {
    tracing_subscriber::registry()
        .with(env_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .json(), // CloudWatch adds its own timestamp
        )
        .init();
}
