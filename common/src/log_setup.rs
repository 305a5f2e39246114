use std::path::Path;

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};

/// Rotated files get a timestamp infix; the live file keeps the configured name.
const ROTATION_NAMING: Naming = Naming::TimestampsCustomFormat {
    current_infix: Some(""),
    format: "r%Y-%m-%d_%H-%M-%S",
};

/// Starts `flexi_logger` with `level` (any `RUST_LOG`-style filter).
///
/// With a log file, records go to exactly that path (rotated at 1MB, 5 files
/// kept) and warnings are duplicated to stderr. Without one, everything goes
/// to stderr. Logging stays active until the returned handle is dropped.
pub fn setup_logging(level: &str, log_file: Option<&Path>) -> anyhow::Result<LoggerHandle> {
    let logger = Logger::try_with_env_or_str(level)?;

    let logger = match log_file {
        Some(path) => logger
            .log_to_file(FileSpec::try_from(path)?)
            .format_for_files(flexi_logger::detailed_format)
            .duplicate_to_stderr(Duplicate::Warn)
            .rotate(
                Criterion::Size(1024 * 1024), //1MB
                ROTATION_NAMING,
                Cleanup::KeepLogFiles(5),
            ),
        None => logger.log_to_stderr(),
    };

    let handle = logger.write_mode(WriteMode::Direct).start()?;
    log::debug!("Logging started at level '{}'", level);

    Ok(handle)
}
