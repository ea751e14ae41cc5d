//! I/O helpers for the document file store.

use std::io::ErrorKind;
use std::time::Duration;

use crate::error::DbError;

/// Maps an I/O error onto the store error taxonomy.
pub fn classify_io_error(error: std::io::Error, context: &str) -> DbError {
    let message = format!("{}: {}", context, error);
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => DbError::DiskFull(message),
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            DbError::TransientIoError(message)
        }
        _ => DbError::IoError(message),
    }
}

/// Runs `operation`, retrying only on [`DbError::TransientIoError`].
pub fn retry_io_operation<F, T>(
    mut operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, DbError>
where
    F: FnMut() -> Result<T, DbError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(DbError::TransientIoError(msg)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    msg
                );
                if retry_delay_ms > 0 {
                    std::thread::sleep(Duration::from_millis(retry_delay_ms));
                }
            }
            Err(err) => return Err(err),
        }
    }
}
