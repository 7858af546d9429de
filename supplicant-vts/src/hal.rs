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

//! Model of the Wi-Fi supplicant HAL as seen by the test helpers.
//!
//! The HAL is a vendor service behind the platform service manager. Only
//! the calls the helpers need are modeled here; a suite binds these traits
//! to its own HAL client.

use std::fmt;
use std::sync::Arc;

/// Fully qualified name of the supplicant HAL interface.
pub const SUPPLICANT_DESCRIPTOR: &str = "android.hardware.wifi.supplicant@1.0::ISupplicant";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IfaceType {
    Sta,
    P2p,
}

/// Identifies one interface controlled by the supplicant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfaceInfo {
    pub iface_type: IfaceType,
    pub name: String,
}

impl IfaceInfo {
    pub fn new(iface_type: IfaceType, name: &str) -> Self {
        Self { iface_type, name: name.to_owned() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupplicantStatusCode {
    Success,
    FailureUnknown,
    FailureArgsInvalid,
    FailureIfaceInvalid,
    FailureIfaceUnknown,
    FailureIfaceExists,
    FailureIfaceDisabled,
    FailureIfaceNotDisconnected,
    FailureNetworkInvalid,
    FailureNetworkUnknown,
}

/// Status returned by every supplicant HAL call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplicantStatus {
    pub code: SupplicantStatusCode,
    pub debug_message: String,
}

impl SupplicantStatus {
    pub fn new(code: SupplicantStatusCode, debug_message: &str) -> Self {
        Self { code, debug_message: debug_message.to_owned() }
    }

    pub fn success() -> Self {
        Self::new(SupplicantStatusCode::Success, "")
    }

    pub fn is_success(&self) -> bool {
        self.code == SupplicantStatusCode::Success
    }
}

impl From<SupplicantStatusCode> for SupplicantStatus {
    fn from(code: SupplicantStatusCode) -> Self {
        Self::new(code, "")
    }
}

impl fmt::Display for SupplicantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.debug_message.is_empty() {
            write!(f, "{:?}", self.code)
        } else {
            write!(f, "{:?} ({})", self.code, self.debug_message)
        }
    }
}

/// Result of a supplicant HAL call. The error side never holds a success status.
pub type HalResult<T> = Result<T, SupplicantStatus>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugLevel {
    Excessive,
    Msgdump,
    Debug,
    Info,
    Warning,
    Error,
}

/// A service registration announced by the service manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationEvent {
    pub fully_qualified_name: String,
    pub instance_name: String,
    /// Set when the instance was already registered at subscription time.
    pub pre_existing: bool,
}

/// Receives service registration callbacks.
///
/// Callbacks arrive on the service manager's dispatch threads, possibly
/// several at once.
pub trait ServiceNotification: Send + Sync {
    fn on_registration(&self, event: RegistrationEvent);
}

/// The platform service manager.
pub trait ServiceManager: Send + Sync {
    /// Subscribes `listener` to registrations of `fully_qualified_name`/`instance_name`.
    ///
    /// Returns false if the service manager rejects the subscription.
    fn register_for_notifications(
        &self,
        fully_qualified_name: &str,
        instance_name: &str,
        listener: Arc<dyn ServiceNotification>,
    ) -> bool;

    /// Sizes the thread pool that delivers callbacks to this process.
    fn configure_rpc_threadpool(&self, max_threads: usize);

    /// Looks up a registered supplicant instance.
    fn get_supplicant(&self, instance_name: &str) -> Option<Arc<dyn Supplicant>>;
}

/// The 1.0 supplicant HAL.
pub trait Supplicant: Send + Sync {
    fn list_interfaces(&self) -> HalResult<Vec<IfaceInfo>>;

    fn get_interface(&self, info: &IfaceInfo) -> HalResult<SupplicantIface>;

    fn set_debug_params(
        &self,
        level: DebugLevel,
        show_timestamp: bool,
        show_keys: bool,
    ) -> HalResult<()>;

    /// The 1.1 view of this supplicant, if it implements one.
    fn as_v1_1(&self) -> Option<&dyn SupplicantV1_1> {
        None
    }
}

/// Additions of the 1.1 supplicant HAL.
///
/// A 1.1 supplicant starts without interfaces; they must be added
/// explicitly.
pub trait SupplicantV1_1: Supplicant {
    fn add_interface(&self, info: &IfaceInfo) -> HalResult<SupplicantIface>;
}

/// Interface handle returned by the supplicant.
#[derive(Clone)]
pub enum SupplicantIface {
    Sta(Arc<dyn StaIface>),
    P2p(Arc<dyn P2pIface>),
}

impl SupplicantIface {
    pub fn iface_type(&self) -> IfaceType {
        match self {
            SupplicantIface::Sta(_) => IfaceType::Sta,
            SupplicantIface::P2p(_) => IfaceType::P2p,
        }
    }

    pub fn into_sta(self) -> Option<Arc<dyn StaIface>> {
        match self {
            SupplicantIface::Sta(iface) => Some(iface),
            SupplicantIface::P2p(_) => None,
        }
    }

    pub fn into_p2p(self) -> Option<Arc<dyn P2pIface>> {
        match self {
            SupplicantIface::P2p(iface) => Some(iface),
            SupplicantIface::Sta(_) => None,
        }
    }
}

impl fmt::Debug for SupplicantIface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupplicantIface::Sta(iface) => iface.name(),
            SupplicantIface::P2p(iface) => iface.name(),
        };
        f.debug_struct("SupplicantIface")
            .field("type", &self.iface_type())
            .field("name", &name)
            .finish()
    }
}

pub trait StaIface: Send + Sync {
    fn name(&self) -> HalResult<String>;

    fn add_network(&self) -> HalResult<Arc<dyn StaNetwork>>;
}

pub trait P2pIface: Send + Sync {
    fn name(&self) -> HalResult<String>;
}

pub trait StaNetwork: Send + Sync {
    fn id(&self) -> HalResult<u32>;

    fn interface_name(&self) -> HalResult<String>;
}
