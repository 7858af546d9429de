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

//! Setup and teardown helpers for supplicant HAL test cases.
//!
//! A typical test case calls `set_up` before and `tear_down` after its
//! body. `set_up` leaves a running supplicant with its interfaces present,
//! so the body can go straight to `get_supplicant_sta_iface` and friends.

use crate::config::SupplicantVtsConfig;
use crate::error::{SupplicantVtsError, SupplicantVtsResult};
use crate::hal::{
    DebugLevel, IfaceInfo, IfaceType, P2pIface, ServiceManager, StaIface, StaNetwork, Supplicant,
    SupplicantStatusCode,
};
use crate::properties::{get_p2p_iface_name, get_sta_iface_name, PropertyStore};
use crate::service_notification::ServiceNotificationListener;
use crate::supplicant_manager::{self, SupplicantManager};
use crate::wifi_chip::{deinitialize_driver_and_firmware, initialize_driver_and_firmware, VendorHal};
use anyhow::Context;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

/// The platform collaborators a supplicant test talks to.
pub struct SupplicantTestEnv {
    service_manager: Arc<dyn ServiceManager>,
    supplicant_manager: Arc<dyn SupplicantManager>,
    vendor_hal: Arc<dyn VendorHal>,
    properties: Arc<dyn PropertyStore>,
    wait_timeout: Duration,
}

impl SupplicantTestEnv {
    pub fn new(
        service_manager: Arc<dyn ServiceManager>,
        supplicant_manager: Arc<dyn SupplicantManager>,
        vendor_hal: Arc<dyn VendorHal>,
        properties: Arc<dyn PropertyStore>,
    ) -> Self {
        Self {
            service_manager,
            supplicant_manager,
            vendor_hal,
            properties,
            wait_timeout: SupplicantVtsConfig::default().wait_timeout,
        }
    }

    /// How long `start_supplicant_and_wait_for_hidl_service` waits for the
    /// service to register.
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    /// Starts the supplicant and returns it ready for a test case. The
    /// configured wait timeout overrides the one set on this environment.
    pub fn set_up(&self, config: &SupplicantVtsConfig) -> anyhow::Result<Arc<dyn Supplicant>> {
        self.start_and_wait(
            &config.wifi_instance_name,
            &config.supplicant_instance_name,
            config.wait_timeout,
        )?;
        self.get_supplicant(&config.supplicant_instance_name, config.is_p2p_on)
    }

    pub fn tear_down(&self, config: &SupplicantVtsConfig) -> anyhow::Result<()> {
        self.stop_supplicant(&config.wifi_instance_name)
    }

    /// Brings up the driver, starts the supplicant and waits for its HAL
    /// service to register. Stops at the first step that fails.
    pub fn start_supplicant_and_wait_for_hidl_service(
        &self,
        wifi_instance_name: &str,
        supplicant_instance_name: &str,
    ) -> anyhow::Result<()> {
        self.start_and_wait(wifi_instance_name, supplicant_instance_name, self.wait_timeout)
    }

    fn start_and_wait(
        &self,
        wifi_instance_name: &str,
        supplicant_instance_name: &str,
        wait_timeout: Duration,
    ) -> anyhow::Result<()> {
        initialize_driver_and_firmware(self.vendor_hal.as_ref(), wifi_instance_name)
            .context("failed to initialize driver and firmware")?;

        // Subscribe before starting so the registration cannot be missed.
        let listener = ServiceNotificationListener::new();
        listener
            .register_for_hidl_service_notifications(
                self.service_manager.as_ref(),
                supplicant_instance_name,
            )
            .context("failed to subscribe to supplicant registration")?;

        supplicant_manager::start_and_check(self.supplicant_manager.as_ref())?;

        listener
            .wait_for_hidl_service(wait_timeout, supplicant_instance_name)
            .context("supplicant HAL service did not register")?;
        info!("supplicant HAL service {supplicant_instance_name:?} is up");
        Ok(())
    }

    /// Stops the supplicant and tears the driver down.
    pub fn stop_supplicant(&self, wifi_instance_name: &str) -> anyhow::Result<()> {
        supplicant_manager::stop(self.supplicant_manager.as_ref())?;
        deinitialize_driver_and_firmware(self.vendor_hal.as_ref(), wifi_instance_name)
            .context("failed to deinitialize driver and firmware")?;
        supplicant_manager::check_stopped(self.supplicant_manager.as_ref())?;
        Ok(())
    }

    /// Looks up the supplicant service. A 1.1 supplicant gets its STA
    /// interface, and its P2P interface if `is_p2p_on`, added here since it
    /// starts without any.
    pub fn get_supplicant(
        &self,
        supplicant_instance_name: &str,
        is_p2p_on: bool,
    ) -> anyhow::Result<Arc<dyn Supplicant>> {
        let supplicant = self.service_manager.get_supplicant(supplicant_instance_name).ok_or_else(
            || SupplicantVtsError::ServiceNotFound(supplicant_instance_name.to_owned()),
        )?;
        if is_1_1(supplicant.as_ref()) {
            self.add_supplicant_sta_iface_1_1(supplicant.as_ref())
                .context("failed to add STA interface")?;
            if is_p2p_on {
                self.add_supplicant_p2p_iface_1_1(supplicant.as_ref())
                    .context("failed to add P2P interface")?;
            }
        }
        Ok(supplicant)
    }

    pub fn add_supplicant_sta_iface_1_1(
        &self,
        supplicant: &dyn Supplicant,
    ) -> SupplicantVtsResult<()> {
        add_iface_1_1(
            supplicant,
            &IfaceInfo::new(IfaceType::Sta, &get_sta_iface_name(self.properties.as_ref())),
        )
    }

    pub fn add_supplicant_p2p_iface_1_1(
        &self,
        supplicant: &dyn Supplicant,
    ) -> SupplicantVtsResult<()> {
        add_iface_1_1(
            supplicant,
            &IfaceInfo::new(IfaceType::P2p, &get_p2p_iface_name(self.properties.as_ref())),
        )
    }
}

/// Whether the supplicant implements the 1.1 HAL.
pub fn is_1_1(supplicant: &dyn Supplicant) -> bool {
    supplicant.as_v1_1().is_some()
}

// An interface that already exists is as good as a new one.
fn add_iface_1_1(supplicant: &dyn Supplicant, info: &IfaceInfo) -> SupplicantVtsResult<()> {
    let supplicant_1_1 = supplicant.as_v1_1().ok_or(SupplicantVtsError::NotV1_1)?;
    match supplicant_1_1.add_interface(info) {
        Ok(_) => Ok(()),
        Err(status) if status.code == SupplicantStatusCode::FailureIfaceExists => Ok(()),
        Err(status) => Err(SupplicantVtsError::Status { call: "addInterface", status }),
    }
}

/// Finds the first interface of `iface_type` the supplicant knows about.
pub fn find_iface_of_type(supplicant: &dyn Supplicant, iface_type: IfaceType) -> Option<IfaceInfo> {
    match supplicant.list_interfaces() {
        Ok(infos) => infos.into_iter().find(|info| info.iface_type == iface_type),
        Err(status) => {
            warn!("listInterfaces failed: {status}");
            None
        }
    }
}

pub fn get_supplicant_sta_iface(supplicant: &dyn Supplicant) -> Option<Arc<dyn StaIface>> {
    let info = find_iface_of_type(supplicant, IfaceType::Sta)?;
    match supplicant.get_interface(&info) {
        Ok(iface) => iface.into_sta(),
        Err(status) => {
            warn!("getInterface({}) failed: {status}", info.name);
            None
        }
    }
}

pub fn get_supplicant_p2p_iface(supplicant: &dyn Supplicant) -> Option<Arc<dyn P2pIface>> {
    let info = find_iface_of_type(supplicant, IfaceType::P2p)?;
    match supplicant.get_interface(&info) {
        Ok(iface) => iface.into_p2p(),
        Err(status) => {
            warn!("getInterface({}) failed: {status}", info.name);
            None
        }
    }
}

/// Adds a network on the STA interface.
pub fn create_supplicant_sta_network(supplicant: &dyn Supplicant) -> Option<Arc<dyn StaNetwork>> {
    let sta_iface = get_supplicant_sta_iface(supplicant)?;
    match sta_iface.add_network() {
        Ok(network) => Some(network),
        Err(status) => {
            warn!("addNetwork failed: {status}");
            None
        }
    }
}

/// Turns supplicant logging up to excessive, with timestamps and keys.
pub fn turn_on_excessive_logging(supplicant: &dyn Supplicant) -> bool {
    match supplicant.set_debug_params(DebugLevel::Excessive, true, true) {
        Ok(()) => true,
        Err(status) => {
            warn!("setDebugParams failed: {status}");
            false
        }
    }
}
