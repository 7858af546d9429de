//
//  Copyright 2024 Google, Inc.
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at:
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! A logger for the supplicant VTS helpers and the suites built on them.
//!
//! Uses the env_logger crate that allows control of logging through
//! the RUST_LOG environment variable.

use chrono::{DateTime, Utc};
use env_logger::{Builder, Env};
use log::{Level, Record};
use std::{ffi::OsStr, io::Write, path::Path};

/// Initiating the environment for logging with given prefix
///
/// Lines look like logcat output so they interleave cleanly with device logs.
pub fn init(prefix: &'static str) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(move |buf, record| {
        let message = format!(
            "{} {} {} {}:{} - {}",
            prefix,
            level_to_string(record.level()),
            log_timestamp(&Utc::now()),
            format_file(record),
            record.line().unwrap_or(0),
            record.args()
        );
        writeln!(buf, "{}", message)
    });
    builder.init();
}

/// Initiating the environment for logging in Rust unit tests
///
/// Safe to call from every test; only the first call installs the logger.
pub fn init_for_test() {
    let mut binding = Builder::from_env(Env::default().default_filter_or("info"));
    let builder = binding.is_test(true);
    builder.format(move |buf, record| {
        let message = format!(
            "{} {} \t| supplicant-vts-test: {}",
            level_to_string(record.level()),
            log_timestamp(&Utc::now()),
            record.args()
        );
        writeln!(buf, "{}", message)
    });
    let _ = builder.try_init();
}

/// Formats `time` as `MM-DD HH:MM:SS.mmm`.
pub fn log_timestamp(time: &DateTime<Utc>) -> String {
    time.format("%m-%d %H:%M:%S%.3f").to_string()
}

/// Helper function for parsing the file name from given record file path
fn format_file<'a>(record: &'a Record<'a>) -> &'a str {
    record
        .file()
        .and_then(|filepath| Path::new(filepath).file_name().unwrap_or(OsStr::new("N/A")).to_str())
        .unwrap_or("N/A")
}

/// Helper function for translating log levels to string.
fn level_to_string(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}
