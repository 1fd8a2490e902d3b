use remark::{DataPath, DataPathType};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Log to stdout and to a daily log file under the data path. The returned
/// guard flushes the file writer when dropped, keep it alive for the
/// lifetime of the program.
pub fn setup_logging(path: &DataPath, debug: bool) -> Option<WorkerGuard> {
    use tracing_appender::{
        non_blocking,
        rolling::{RollingFileAppender, Rotation},
    };
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let default_filter = if debug { "remark=debug" } else { "remark=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(format!("remark-{}", env!("CARGO_PKG_VERSION")))
        .filename_suffix("log")
        .build(path.path(DataPathType::Log));

    let file_appender = match file_appender {
        Ok(appender) => appender,
        Err(err) => {
            // can't write logs to disk, console only
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
            tracing::warn!("file logging disabled: {err}");
            return None;
        }
    };

    let (non_blocking_writer, guard) = non_blocking(file_appender);

    // stderr, so the rendered feed on stdout stays clean
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_writer);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Some(guard)
}
