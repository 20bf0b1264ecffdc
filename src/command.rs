// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Running external tools with a deadline.

use crate::error::{Error, Result};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Run a command with a timeout. Returns the command output or an error.
///
/// A non-zero exit status is not an error here; callers inspect `status`.
pub fn run_command_with_timeout(
    command: &str,
    args: &[&str],
    timeout_secs: u64,
) -> Result<Output> {
    log::debug!("running {} {}", command, args.join(" "));

    let mut child = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::CommandNotFound {
                    command: command.to_string(),
                    hint: get_install_hint(command),
                }
            } else {
                Error::Command {
                    command: command.to_string(),
                    stderr: e.to_string(),
                }
            }
        })?;

    let timeout = Duration::from_secs(timeout_secs);
    let start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(_)) => {
                return child.wait_with_output().map_err(|e| Error::Command {
                    command: command.to_string(),
                    stderr: e.to_string(),
                });
            }
            Ok(None) => {
                if start.elapsed() >= timeout {
                    // Kill and reap so no zombie is left behind
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::CommandTimeout {
                        command: command.to_string(),
                        seconds: timeout_secs,
                    });
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                return Err(Error::Command {
                    command: command.to_string(),
                    stderr: e.to_string(),
                });
            }
        }
    }
}

/// Get installation hint for missing commands
pub fn get_install_hint(command: &str) -> String {
    match command {
        "openssl" => {
            "Install OpenSSL (apt install openssl / dnf install openssl), or use --backend native"
                .to_string()
        }
        "update-ca-certificates" => {
            "Install ca-certificates package: apt install ca-certificates".to_string()
        }
        "update-ca-trust" => "Install ca-certificates package: dnf install ca-certificates".to_string(),
        "trust" => "Install p11-kit-trust package: pacman -S p11-kit".to_string(),
        _ => format!("Please install the '{}' command", command),
    }
}
