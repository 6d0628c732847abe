//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Executable used for tests against a real sling installation
pub fn sling_executable() -> String {
    std::env::var("TASKER_ELT_SLING_EXECUTABLE").unwrap_or_else(|_| "sling".to_string())
}

pub fn sling_available() -> bool {
    std::process::Command::new(sling_executable())
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Shell script standing in for the sling CLI
///
/// Records its arguments and environment, prints scripted output, and exits
/// with a chosen code.
#[cfg(unix)]
pub struct FakeSling {
    _dir: TempDir,
    pub path: PathBuf,
    args_file: PathBuf,
    env_file: PathBuf,
}

#[cfg(unix)]
impl FakeSling {
    pub fn succeeding(stdout_lines: &[&str]) -> Self {
        Self::build(stdout_lines, &[], 0, 0)
    }

    pub fn failing(exit_code: i32, stderr_lines: &[&str]) -> Self {
        Self::build(&[], stderr_lines, exit_code, 0)
    }

    pub fn sleeping(seconds: u32) -> Self {
        Self::build(&["INF starting"], &[], 0, seconds)
    }

    fn build(stdout_lines: &[&str], stderr_lines: &[&str], exit_code: i32, sleep_seconds: u32) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("sling");
        let args_file = dir.path().join("args.txt");
        let env_file = dir.path().join("env.txt");

        let mut script = String::from("#!/bin/sh\n");
        script.push_str(&format!(
            "for arg in \"$@\"; do printf '%s\\n' \"$arg\"; done > '{}'\n",
            args_file.display()
        ));
        script.push_str(&format!("env > '{}'\n", env_file.display()));
        for line in stdout_lines {
            script.push_str(&format!("printf '%b\\n' '{line}'\n"));
        }
        for line in stderr_lines {
            script.push_str(&format!("printf '%b\\n' '{line}' >&2\n"));
        }
        if sleep_seconds > 0 {
            script.push_str(&format!("sleep {sleep_seconds}\n"));
        }
        script.push_str(&format!("exit {exit_code}\n"));

        std::fs::write(&path, script).expect("write fake sling");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("make fake sling executable");

        Self {
            _dir: dir,
            path,
            args_file,
            env_file,
        }
    }

    pub fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(&self.args_file)
            .expect("fake sling was invoked")
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Environment variables the fake saw, restricted to this crate's prefix
    pub fn recorded_env(&self) -> BTreeMap<String, String> {
        std::fs::read_to_string(&self.env_file)
            .expect("fake sling was invoked")
            .lines()
            .filter(|line| line.starts_with("TASKER_ELT_"))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    /// Replication config passed via `run -c`
    pub fn recorded_config(&self) -> serde_json::Value {
        let args = self.recorded_args();
        assert_eq!(&args[..2], &["run".to_string(), "-c".to_string()]);
        serde_json::from_str(&args[2]).expect("config argument is JSON")
    }
}
