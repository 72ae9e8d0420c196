use failure::Fail;

/// Receives failures that must not abort the operation that hit them, like
/// closing the stream of a pool that is being destroyed.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, context: &str, err: &dyn Fail);
}

/// Writes reports to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, context: &str, err: &dyn Fail) {
        error!("{}. {}", context, err);
    }
}
