use matchday_core::invalidation::{dispatch, Invalidation, InvalidationSink};

/// The CLI holds no cache, so change signals are only logged at debug level.
pub struct LogSink;

impl InvalidationSink for LogSink {
    fn invalidate(&self, signal: &Invalidation) {
        tracing::debug!(collection = %signal.collection, id = %signal.id, "invalidated");
    }
}

pub fn publish(signals: &[Invalidation]) {
    dispatch(signals, &LogSink);
}
