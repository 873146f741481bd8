//! The process-wide interface holds global state, so this file drives it
//! through one sequential scenario.

use std::env;
use std::fs;

use dlog::{EndStatus, InitStatus, DIRECTION_RECEIVE, DIRECTION_SEND, FINALIZE_OK};
use tempfile::TempDir;

#[test]
fn process_wide_lifecycle() {
    // Before initialization every call is a no-op.
    assert!(!dlog::is_enabled());
    assert_eq!(
        dlog::begin_transfer(Some("f"), 0, 0, Some("h"), Some("t"), Some("g"), DIRECTION_SEND, None),
        0
    );
    assert_eq!(dlog::end_transfer(5, 0, 0), EndStatus::Ok);
    assert_eq!(dlog::finalize(), FINALIZE_OK);

    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("datalog.log");
    let conf_path = dir.path().join("dlog.rc");
    fs::write(
        &conf_path,
        format!(
            "DoLogging = yes\nLoggingLocation = file\nLogFilename = {}\nLogBatchSize = 2\n\
             LogSourceIP = raw\nLogTargetIP = raw\n",
            log_path.display()
        ),
    )
    .unwrap();
    env::set_var("DLOG_CONFIG", &conf_path);

    assert_eq!(dlog::initialize("scp"), InitStatus::Ok);
    assert_eq!(dlog::initialize("scp"), InitStatus::AlreadyInitialized);
    assert!(dlog::is_enabled());

    // Rejected begins.
    let begin = |name: Option<&str>, direction| {
        dlog::begin_transfer(
            name,
            10,
            7,
            Some("client.example"),
            Some("/out/"),
            Some("server.example"),
            direction,
            Some("via api"),
        )
    };
    assert_eq!(begin(None, DIRECTION_SEND), 0);
    assert_eq!(begin(Some("/a/b.c"), 9), 0);

    let first = begin(Some("/a/b/file.txt"), DIRECTION_SEND);
    let second = begin(Some("/a/b/other.txt"), DIRECTION_RECEIVE);
    let open = begin(Some("/a/b/never.txt"), DIRECTION_SEND);
    assert!(first > 0 && second > first && open > second);

    assert_eq!(dlog::end_transfer(0, 0, 0), EndStatus::ZeroId);
    assert_eq!(dlog::end_transfer(open + 100, 0, 0), EndStatus::NotFound);
    assert_eq!(dlog::end_transfer(first, 10, 0), EndStatus::Ok);
    assert_eq!(dlog::end_transfer(second, 10, 2), EndStatus::Ok);

    let text = fs::read_to_string(&log_path).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("scp SEND name='file'"));
    assert!(text.contains("scp RECEIVE name='other'"));
    assert!(text.contains("sourceIP='client.example' targetIP='server.example' note='via api'"));

    assert_eq!(dlog::finalize(), FINALIZE_OK);
    let text = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[2].contains("name='never'"));
    assert!(lines[2].contains("success='no'"));
}
