//! Every pipeline shape must hand back all of its descriptors once it has
//! finished. Kept in its own test binary so no other test opens descriptors
//! concurrently.
#![cfg(target_os = "linux")]

mod common;
use crate::common::builders::ConfigBuilder;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::time::Duration;

use buildlog::{BuildLogger, BuildLoggerConfig, TaskOutcome};

type TestResult = Result<(), Box<dyn Error>>;

fn open_fds() -> std::io::Result<usize> {
    Ok(std::fs::read_dir("/proc/self/fd")?.count())
}

async fn settle_to(baseline: usize) -> std::io::Result<usize> {
    let mut current = open_fds()?;
    for _ in 0..100 {
        if current == baseline {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        current = open_fds()?;
    }
    Ok(current)
}

async fn run_pipeline(config: BuildLoggerConfig, cancel: bool) -> TestResult {
    let mut logger = BuildLogger::new(config);
    logger.start().await?;
    logger.stdin().expect("producer handle").write_all(b"line\n")?;

    if cancel {
        logger.cancel();
    } else {
        logger.close_stdin();
    }

    let outcome = with_timeout(logger.wait()).await;
    let expected = if cancel {
        TaskOutcome::Cancelled
    } else {
        TaskOutcome::Success
    };
    assert_eq!(outcome, expected);
    Ok(())
}

#[tokio::test]
async fn finished_pipelines_leak_no_descriptors() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("build.log");

    // Let the runtime set up its lazily created drivers first.
    run_pipeline(
        ConfigBuilder::new().log_path(&log_path).filter("cat").build(),
        false,
    )
    .await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let baseline = open_fds()?;

    let shapes = [
        ("direct", ConfigBuilder::new().log_path(&log_path).build(), false),
        (
            "filtered",
            ConfigBuilder::new().log_path(&log_path).filter("cat").build(),
            false,
        ),
        (
            "broken filter",
            ConfigBuilder::new()
                .log_path(&log_path)
                .filter("/nonexistent/filter")
                .build(),
            false,
        ),
        ("no log path", ConfigBuilder::new().filter("cat").build(), false),
        (
            "cancelled filter",
            ConfigBuilder::new().log_path(&log_path).filter("cat").build(),
            true,
        ),
    ];

    for (name, config, cancel) in shapes {
        run_pipeline(config, cancel).await?;
        let after = settle_to(baseline).await?;
        assert_eq!(after, baseline, "descriptor leak after {name} pipeline");
    }

    // Writer startup failure: the log path's parent is a regular file.
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"")?;
    let mut logger = BuildLogger::new(
        ConfigBuilder::new()
            .log_path(blocker.join("build.log"))
            .filter("cat")
            .build(),
    );
    assert!(logger.start().await.is_err());
    drop(logger);
    let after = settle_to(baseline).await?;
    assert_eq!(after, baseline, "descriptor leak after failed start");

    Ok(())
}
