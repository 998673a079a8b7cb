#![allow(dead_code)]

pub use buildlog_test_utils::builders;
pub use buildlog_test_utils::{init_tracing, with_timeout};

use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// `true` while a process with this pid exists (including as a zombie).
pub fn pid_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

/// Poll until `pid` is gone, giving up after two seconds.
pub async fn wait_for_exit(pid: u32) -> bool {
    for _ in 0..200 {
        if !pid_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    !pid_alive(pid)
}

/// Decompress a (possibly multi-member) gzip log.
pub fn read_gz(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = std::fs::File::open(path)?;
    let mut out = Vec::new();
    flate2::read::MultiGzDecoder::new(file).read_to_end(&mut out)?;
    Ok(out)
}
