use std::io::Write;
use std::net::TcpListener;
use std::process::{Child, Command};
use std::thread;
use std::time::Duration;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::NamedTempFile;

// reserves an unused local port for a server process
fn free_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

struct ServerProcess(Child);

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn start_server(addr: &str, extra_args: &[&str]) -> ServerProcess {
    let child = Command::cargo_bin("linepool-server")
        .unwrap()
        .args(&["--addr", addr])
        .args(extra_args)
        .spawn()
        .unwrap();
    thread::sleep(Duration::from_secs(1));
    ServerProcess(child)
}

fn client(addr: &str) -> Command {
    let mut cmd = Command::cargo_bin("linepool-client").unwrap();
    cmd.args(&["--addr", addr]);
    cmd
}

// `linepool-client` with no args should exit with a non-zero code.
#[test]
fn client_cli_no_args() {
    Command::cargo_bin("linepool-client")
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn client_cli_version() {
    Command::cargo_bin("linepool-client")
        .unwrap()
        .args(&["-V"])
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn server_cli_version() {
    Command::cargo_bin("linepool-server")
        .unwrap()
        .args(&["-V"])
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn client_cli_negative_sample() {
    Command::cargo_bin("linepool-client")
        .unwrap()
        .args(&["sample", "-5"])
        .assert()
        .failure()
        .stderr(contains("n must be >= 0"));
}

#[test]
fn client_cli_invalid_sample() {
    Command::cargo_bin("linepool-client")
        .unwrap()
        .args(&["sample", "ten"])
        .assert()
        .failure();
}

#[test]
fn client_cli_invalid_addr() {
    Command::cargo_bin("linepool-client")
        .unwrap()
        .args(&["stats", "--addr", "invalid-addr"])
        .assert()
        .failure();
}

#[test]
fn client_cli_invalid_subcommand() {
    Command::cargo_bin("linepool-client")
        .unwrap()
        .args(&["unknown"])
        .assert()
        .failure();
}

#[test]
fn server_cli_invalid_addr() {
    Command::cargo_bin("linepool-server")
        .unwrap()
        .args(&["--addr", "not-an-addr"])
        .assert()
        .failure();
}

#[test]
fn server_cli_invalid_pool() {
    Command::cargo_bin("linepool-server")
        .unwrap()
        .args(&["--pool", "unknown"])
        .assert()
        .failure();
}

#[test]
fn cli_load_sample_stats_clear() {
    let addr = free_addr();
    let _server = start_server(&addr, &["--threads", "2"]);

    let mut file = NamedTempFile::new().unwrap();
    for i in 0..100 {
        writeln!(file, "Line {}", i).unwrap();
    }
    file.flush().unwrap();
    let path = file.path().to_str().unwrap();

    client(&addr).args(&["health"]).assert().success().stdout(contains("healthy"));

    client(&addr)
        .args(&["load", path])
        .assert()
        .success()
        .stdout(contains("\"lines_read\": 100"));

    client(&addr)
        .args(&["sample", "10"])
        .assert()
        .success()
        .stdout(contains("\"count\": 10"))
        .stdout(contains("\"remaining_in_cache\": 90"));

    client(&addr)
        .args(&["stats"])
        .assert()
        .success()
        .stdout(contains("\"current_lines\": 90"))
        .stdout(contains("\"total_sampled\": 10"));

    client(&addr)
        .args(&["clear"])
        .assert()
        .success()
        .stdout(contains("\"cleared\": 90"));

    client(&addr)
        .args(&["load", "/definitely/not/here.txt"])
        .assert()
        .failure()
        .stderr(contains("File not found"));
}

#[test]
fn cli_server_enforces_sample_limit() {
    let addr = free_addr();
    let _server = start_server(&addr, &["--pool", "rayon", "--max-sample-size", "3"]);

    client(&addr)
        .args(&["sample", "4"])
        .assert()
        .failure()
        .stderr(contains("n too large"));

    client(&addr)
        .args(&["sample", "3"])
        .assert()
        .success()
        .stdout(contains("\"count\": 0"));
}
