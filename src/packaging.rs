//! Process-wide toggle for packaging metadata collection.
//!
//! Formatting layers can attach module/artifact metadata to every event
//! they encode; collecting it is expensive. The toggle lives on the shared
//! logging context rather than on any appender, but appenders are asked to
//! flip it as a side effect of starting (`Builder::collect_packaging_info`
//! or the `LOG_PACKAGING_INFO` variable). It has no bearing on rotation
//! itself.

use std::sync::atomic::{AtomicBool, Ordering};

static COLLECT: AtomicBool = AtomicBool::new(false);

/// Enables or disables packaging metadata collection process-wide.
pub fn set_collect_packaging_info(enabled: bool) {
    COLLECT.store(enabled, Ordering::Relaxed);
}

/// Whether formatting layers should collect packaging metadata.
pub fn collect_packaging_info() -> bool {
    COLLECT.load(Ordering::Relaxed)
}
