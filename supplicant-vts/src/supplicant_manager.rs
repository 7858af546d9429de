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

use crate::error::{SupplicantVtsError, SupplicantVtsResult};
use log::info;

/// Controls the wpa_supplicant daemon.
///
/// On a device this goes through init; the supplicant registers its HAL
/// service some time after `start_supplicant` returns.
pub trait SupplicantManager: Send + Sync {
    fn start_supplicant(&self) -> bool;

    fn stop_supplicant(&self) -> bool;

    fn is_supplicant_running(&self) -> bool;
}

/// Starts the supplicant and checks that it came up.
pub fn start_and_check(manager: &dyn SupplicantManager) -> SupplicantVtsResult<()> {
    if !manager.start_supplicant() || !manager.is_supplicant_running() {
        return Err(SupplicantVtsError::SupplicantNotStarted);
    }
    info!("supplicant started");
    Ok(())
}

/// Asks the supplicant to stop. Whether it actually went down is checked
/// separately with `check_stopped`, after the driver is torn down.
pub fn stop(manager: &dyn SupplicantManager) -> SupplicantVtsResult<()> {
    if !manager.stop_supplicant() {
        return Err(SupplicantVtsError::SupplicantStopFailed);
    }
    Ok(())
}

pub fn check_stopped(manager: &dyn SupplicantManager) -> SupplicantVtsResult<()> {
    if manager.is_supplicant_running() {
        return Err(SupplicantVtsError::SupplicantStillRunning);
    }
    info!("supplicant stopped");
    Ok(())
}
