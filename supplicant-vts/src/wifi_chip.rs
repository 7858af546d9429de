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

//! Driver and firmware setup through the vendor Wi-Fi HAL.

use crate::error::{SupplicantVtsError, SupplicantVtsResult};
use crate::hal::IfaceType;
use log::info;
use std::sync::Arc;

pub type ChipModeId = u32;

pub trait WifiChip: Send + Sync {
    /// Switches the chip into a mode that supports `iface_type`, returning
    /// the selected mode, or `None` if no such mode could be configured.
    fn configure_chip_to_support_iface_type(&self, iface_type: IfaceType) -> Option<ChipModeId>;
}

/// The vendor Wi-Fi HAL.
pub trait VendorHal: Send + Sync {
    fn get_wifi_chip(&self, wifi_instance_name: &str) -> Option<Arc<dyn WifiChip>>;

    /// Stops the vendor HAL, unloading the driver and firmware.
    fn stop_wifi(&self, wifi_instance_name: &str) -> bool;
}

/// Brings the driver and firmware up in STA mode.
pub fn initialize_driver_and_firmware(
    vendor_hal: &dyn VendorHal,
    wifi_instance_name: &str,
) -> SupplicantVtsResult<ChipModeId> {
    let chip = vendor_hal
        .get_wifi_chip(wifi_instance_name)
        .ok_or_else(|| SupplicantVtsError::WifiChipUnavailable(wifi_instance_name.to_owned()))?;
    let mode_id = chip
        .configure_chip_to_support_iface_type(IfaceType::Sta)
        .ok_or(SupplicantVtsError::ChipConfiguration(IfaceType::Sta))?;
    info!("wifi instance {wifi_instance_name:?} configured for STA in mode {mode_id}");
    Ok(mode_id)
}

pub fn deinitialize_driver_and_firmware(
    vendor_hal: &dyn VendorHal,
    wifi_instance_name: &str,
) -> SupplicantVtsResult<()> {
    if !vendor_hal.stop_wifi(wifi_instance_name) {
        return Err(SupplicantVtsError::StopWifi(wifi_instance_name.to_owned()));
    }
    Ok(())
}
