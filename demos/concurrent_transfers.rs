//! Multi-threaded transfer logging demonstration.
//!
//! This example drives the process-wide interface the way a transfer tool
//! would:
//! 1. Initialize from the file named by `DLOG_CONFIG` (or a generated one)
//! 2. Run many threads that each begin and end transfers
//! 3. Leave some transfers open and let finalize record them as failed
//! 4. Check that every transfer produced exactly one line
//!
//! Run with: `cargo run --example concurrent_transfers -- [config-file] [threads]`

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use dlog::{DIRECTION_RECEIVE, DIRECTION_SEND, FINALIZE_OK};

const TRANSFERS_PER_THREAD: u64 = 100;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = env::args().skip(1);
    let scratch = env::temp_dir().join(format!("dlog-demo-{}", std::process::id()));
    let config_path = match args.next() {
        Some(path) => PathBuf::from(path),
        None => write_demo_config(&scratch),
    };
    let threads: u64 = args.next().and_then(|n| n.parse().ok()).unwrap_or(20);

    println!("=== Concurrent Transfer Logging ===\n");
    println!("config:  {}", config_path.display());
    env::set_var("DLOG_CONFIG", &config_path);

    let status = dlog::initialize("TestProgram");
    println!("init:    {}", status);
    if !dlog::is_enabled() {
        println!("logging is disabled, nothing to do");
        return;
    }

    let handles: Vec<_> = (0..threads)
        .map(|t| thread::spawn(move || run_thread(t)))
        .collect();
    let mut abandoned = 0;
    for handle in handles {
        abandoned += handle.join().unwrap_or(0);
    }

    let finalized = dlog::finalize();
    println!("threads: {}", threads);
    println!("left open for finalize: {}", abandoned);
    println!(
        "finalize: {}",
        if finalized == FINALIZE_OK { "ok" } else { "incomplete" }
    );

    let log_path = scratch.join("dlogxfer.log");
    if let Ok(text) = fs::read_to_string(&log_path) {
        check_users(&text, threads);
    }
}

// Begins TRANSFERS_PER_THREAD transfers and ends all but every tenth.
fn run_thread(t: u64) -> u64 {
    let mut open = 0;
    for i in 0..TRANSFERS_PER_THREAD {
        let user = t * TRANSFERS_PER_THREAD + i;
        let direction = if i % 2 == 0 { DIRECTION_SEND } else { DIRECTION_RECEIVE };
        let filename = format!("/home/demo/data/file{}.dat", i);
        let id = dlog::begin_transfer(
            Some(&filename),
            1024 * i,
            user,
            Some("localhost"),
            Some("/incoming/"),
            Some("127.0.0.1"),
            direction,
            Some("demo run"),
        );
        if id == 0 {
            continue;
        }
        if i % 10 == 9 {
            open += 1;
        } else {
            dlog::end_transfer(id, 1024 * i, 0);
        }
    }
    open
}

fn write_demo_config(dir: &Path) -> PathBuf {
    let _ = fs::create_dir_all(dir);
    let log_path = dir.join("dlogxfer.log");
    let _ = fs::remove_file(&log_path);
    let config_path = dir.join("dlog.rc");
    let text = format!(
        "# generated by the concurrent_transfers demo\n\
         DoLogging = yes\n\
         LoggingLocation = file\n\
         LogFilename = {}\n\
         LogBatchSize = 25\n\
         LogUserID = yes\n\
         LogSourceIP = 255.255.255.0\n",
        log_path.display()
    );
    if let Err(e) = fs::write(&config_path, text) {
        eprintln!("cannot write {}: {}", config_path.display(), e);
    }
    config_path
}

fn check_users(text: &str, threads: u64) {
    let mut seen = HashSet::new();
    let mut duplicates = 0;
    for line in text.lines() {
        let user = line
            .split_once(" user='")
            .and_then(|(_, rest)| rest.split_once('\''))
            .and_then(|(user, _)| user.parse::<u64>().ok());
        if let Some(user) = user {
            if !seen.insert(user) {
                duplicates += 1;
            }
        }
    }
    let expected = threads * TRANSFERS_PER_THREAD;
    println!("\n--- Log check ---");
    println!("lines:      {}", text.lines().count());
    println!("users seen: {} of {}", seen.len(), expected);
    println!("duplicates: {}", duplicates);
    if seen.len() as u64 == expected && duplicates == 0 {
        println!("✓ every transfer written exactly once");
    } else {
        println!("✗ log does not match the transfers issued");
    }
}
