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

//! System property lookups.

use std::collections::HashMap;
use vts_common::util::prop_file::PropFile;

pub const STA_IFACE_PROPERTY: &str = "wifi.interface";
pub const DEFAULT_STA_IFACE_NAME: &str = "wlan0";
pub const P2P_IFACE_PROPERTY: &str = "wifi.direct.interface";
pub const DEFAULT_P2P_IFACE_NAME: &str = "p2p0";

pub trait PropertyStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Returns the value of `key`, or `default` if it is unset or empty.
    fn get_string(&self, key: &str, default: &str) -> String {
        self.get(key).filter(|value| !value.is_empty()).unwrap_or_else(|| default.to_owned())
    }
}

impl PropertyStore for PropFile {
    fn get(&self, key: &str) -> Option<String> {
        PropFile::get(self, key).map(str::to_owned)
    }
}

impl PropertyStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Name of the station interface the supplicant should manage.
pub fn get_sta_iface_name(props: &dyn PropertyStore) -> String {
    props.get_string(STA_IFACE_PROPERTY, DEFAULT_STA_IFACE_NAME)
}

/// Name of the P2P interface the supplicant should manage.
pub fn get_p2p_iface_name(props: &dyn PropertyStore) -> String {
    props.get_string(P2P_IFACE_PROPERTY, DEFAULT_P2P_IFACE_NAME)
}
