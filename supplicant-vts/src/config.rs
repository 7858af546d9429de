// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Test run configuration.

use crate::properties::PropertyStore;
use anyhow::Context;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vts_common::util::prop_file::PropFile;

pub const DEFAULT_SUPPLICANT_INSTANCE: &str = "default";
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 500;

/// Environment variable overriding `--supplicant-instance-name`.
pub const INSTANCE_ENV: &str = "SUPPLICANT_VTS_INSTANCE";
/// Environment variable overriding `--p2p`. Accepts `1`/`0` and `true`/`false`.
pub const P2P_ENV: &str = "SUPPLICANT_VTS_P2P";

#[derive(Debug, Parser)]
#[command(name = "supplicant-vts", about = "Wi-Fi supplicant HAL test environment")]
pub struct SupplicantVtsArgs {
    /// Vendor Wi-Fi HAL instance used to set up the driver and firmware
    #[arg(long, default_value = "")]
    pub wifi_instance_name: String,

    /// Supplicant HAL service instance under test
    #[arg(long, default_value = DEFAULT_SUPPLICANT_INSTANCE)]
    pub supplicant_instance_name: String,

    /// Also add the P2P interface on 1.1 supplicants
    #[arg(long)]
    pub p2p: bool,

    /// How long to wait for the supplicant service to register
    #[arg(long, default_value_t = DEFAULT_WAIT_TIMEOUT_MS)]
    pub wait_timeout_ms: u64,

    /// Property file used to resolve interface names
    #[arg(long)]
    pub prop_file: Option<PathBuf>,
}

/// Resolved configuration of one test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplicantVtsConfig {
    pub wifi_instance_name: String,
    pub supplicant_instance_name: String,
    pub is_p2p_on: bool,
    pub wait_timeout: Duration,
    pub prop_file: Option<PathBuf>,
}

impl Default for SupplicantVtsConfig {
    fn default() -> Self {
        Self {
            wifi_instance_name: String::new(),
            supplicant_instance_name: DEFAULT_SUPPLICANT_INSTANCE.to_owned(),
            is_p2p_on: false,
            wait_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            prop_file: None,
        }
    }
}

impl SupplicantVtsArgs {
    /// Applies environment overrides from the process environment.
    pub fn resolve(self) -> SupplicantVtsConfig {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Applies environment overrides looked up through `env`.
    ///
    /// The following priorities are used for each setting:
    ///
    /// 1. The environment variable, when set to a valid value.
    /// 2. The command line flag.
    /// 3. The flag's default.
    pub fn resolve_with(self, env: impl Fn(&str) -> Option<String>) -> SupplicantVtsConfig {
        let supplicant_instance_name =
            env(INSTANCE_ENV).filter(|i| !i.is_empty()).unwrap_or(self.supplicant_instance_name);
        let is_p2p_on = env(P2P_ENV).and_then(|v| parse_bool(&v)).unwrap_or(self.p2p);
        SupplicantVtsConfig {
            wifi_instance_name: self.wifi_instance_name,
            supplicant_instance_name,
            is_p2p_on,
            wait_timeout: Duration::from_millis(self.wait_timeout_ms),
            prop_file: self.prop_file,
        }
    }
}

impl SupplicantVtsConfig {
    /// Loads the configured property file, or an empty store when none is set.
    pub fn load_properties(&self) -> anyhow::Result<Arc<dyn PropertyStore>> {
        match &self.prop_file {
            Some(path) => {
                let mut prop_file = PropFile::new(path.clone());
                prop_file
                    .read()
                    .with_context(|| format!("failed to read property file {}", path.display()))?;
                Ok(Arc::new(prop_file))
            }
            None => Ok(Arc::new(HashMap::<String, String>::new())),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
