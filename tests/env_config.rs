//! The process-wide environment fallback layer. Kept in its own
//! integration test binary because it mutates process-wide variables.

use std::env;

use tracing_rolling::appender::RollingFileAppender;
use tracing_rolling::error::ConfigError;
use tracing_rolling::packaging;
use tracing_rolling::scheduler::Scheduler;

#[test]
fn env_vars_supply_process_wide_defaults() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let scheduler = Scheduler::with_workers(1);

    // the directory comes from LOG_DIR when nothing explicit is set
    env::set_var("LOG_DIR", dir.path());
    let appender = RollingFileAppender::builder("env-app")
        .roll_enabled(false)
        .build(&scheduler)
        .expect("failed to build appender");
    assert!(dir.path().join("env-app.log").exists());
    appender.close();

    // a parseable but out-of-range value is rejected at startup
    env::set_var("LOG_ROLL_HOUR", "99");
    let result = RollingFileAppender::builder("env-app")
        .roll_enabled(false)
        .build(&scheduler);
    assert!(matches!(result, Err(ConfigError::InvalidRollHour(99))));

    // an unparseable value is a fatal configuration error, not a fallback
    env::set_var("LOG_ROLL_HOUR", "midnight");
    let result = RollingFileAppender::builder("env-app")
        .roll_enabled(false)
        .build(&scheduler);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidProperty {
            var: "LOG_ROLL_HOUR",
            ..
        })
    ));

    // an explicit setter always wins over the variable
    let appender = RollingFileAppender::builder("env-app")
        .roll_hour(4)
        .roll_enabled(false)
        .build(&scheduler)
        .expect("failed to build appender");
    appender.close();
    env::remove_var("LOG_ROLL_HOUR");

    // the packaging-info side effect follows the variable
    env::set_var("LOG_PACKAGING_INFO", "true");
    let appender = RollingFileAppender::builder("env-app")
        .roll_enabled(false)
        .build(&scheduler)
        .expect("failed to build appender");
    assert!(packaging::collect_packaging_info());
    appender.close();
    env::remove_var("LOG_PACKAGING_INFO");

    let appender = RollingFileAppender::builder("env-app")
        .roll_enabled(false)
        .build(&scheduler)
        .expect("failed to build appender");
    assert!(!packaging::collect_packaging_info());
    appender.close();

    env::remove_var("LOG_DIR");
    scheduler.shutdown();
}
