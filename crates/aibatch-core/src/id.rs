use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;

/// Last millisecond suffix handed out in this process.
static LAST_ISSUED_MS: AtomicU64 = AtomicU64::new(0);

fn now_millis() -> u64 {
    let ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    u64::try_from(ms).unwrap_or_default()
}

/// Millisecond timestamp used as the job name suffix.
///
/// Strictly increasing within the process: two calls in the same millisecond
/// get consecutive values, so job names never collide.
pub fn next_job_suffix() -> u64 {
    let now = now_millis();
    let prev = LAST_ISSUED_MS
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    now.max(prev + 1)
}
