//! Drives the process-wide interface from an explicit configuration. Kept
//! in its own test binary because initialization happens once per process.

use std::fs;

use dlog::{Config, EndStatus, InitStatus, IpMode, DIRECTION_RECEIVE, FINALIZE_OK};
use tempfile::TempDir;

#[test]
fn explicit_config_lifecycle() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("explicit.log");
    let config = Config::default()
        .with_filename(&log_path)
        .with_batch_size(1)
        .with_source_ip(IpMode::Raw)
        .with_target_ip(IpMode::Raw);

    assert_eq!(dlog::initialize_with("sftp", config), InitStatus::Ok);
    assert!(dlog::is_enabled());
    assert_eq!(
        dlog::initialize_with("sftp", Config::default()),
        InitStatus::AlreadyInitialized
    );
    assert_eq!(dlog::initialize("sftp"), InitStatus::AlreadyInitialized);

    let id = dlog::begin_transfer(
        Some("/in/report.csv"),
        64,
        3,
        Some("peer.example"),
        Some("/srv/in/"),
        Some("self.example"),
        DIRECTION_RECEIVE,
        None,
    );
    assert!(id > 0);
    assert_eq!(dlog::end_transfer(id, 64, 0), EndStatus::Ok);

    let text = fs::read_to_string(&log_path).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("sftp RECEIVE name='report' fileExt='csv' size=64"));
    assert!(text.contains("sourceIP='peer.example' targetIP='self.example' note=''"));

    assert_eq!(dlog::finalize(), FINALIZE_OK);
    assert_eq!(fs::read_to_string(&log_path).unwrap().lines().count(), 1);
}
