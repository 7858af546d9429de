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

//! In-process fakes of the platform collaborators, for exercising the
//! helpers without a device.

use crate::hal::{
    DebugLevel, HalResult, IfaceInfo, IfaceType, P2pIface, RegistrationEvent, ServiceManager,
    ServiceNotification, StaIface, StaNetwork, Supplicant, SupplicantIface, SupplicantStatusCode,
    SupplicantV1_1, SUPPLICANT_DESCRIPTOR,
};
use crate::supplicant_manager::SupplicantManager;
use crate::wifi_chip::{ChipModeId, VendorHal, WifiChip};
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Job = Box<dyn FnOnce() + Send>;

/// Worker threads running queued callbacks, like the RPC thread pool of
/// a HAL client process.
struct RpcThreadpool {
    sender: Sender<Job>,
    size: usize,
}

impl RpcThreadpool {
    fn new(size: usize) -> Self {
        let (sender, receiver) = channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        for i in 0..size {
            let receiver = Arc::clone(&receiver);
            if let Err(e) = thread::Builder::new()
                .name(format!("fake-rpc-{i}"))
                .spawn(move || Self::work(receiver))
            {
                warn!("Failed to spawn rpc thread {i}: {e}");
            }
        }
        Self { sender, size }
    }

    // Runs jobs until every sender is gone.
    fn work(receiver: Arc<Mutex<Receiver<Job>>>) {
        loop {
            let job = lock(&*receiver).recv();
            match job {
                Ok(job) => job(),
                Err(_) => return,
            }
        }
    }
}

#[derive(Default)]
struct Dispatch {
    pool: Option<RpcThreadpool>,
    // Callbacks queued before the pool was configured.
    pending: Vec<Job>,
}

struct Subscription {
    fully_qualified_name: String,
    instance_name: String,
    listener: Arc<dyn ServiceNotification>,
}

/// A service manager that delivers registration callbacks on its own
/// thread pool once `configure_rpc_threadpool` has been called.
///
/// Subscribing to an instance that is already registered delivers a
/// `pre_existing` callback, as the platform service manager does.
pub struct FakeServiceManager {
    accept_registrations: AtomicBool,
    subscriptions: Mutex<Vec<Subscription>>,
    registered: Mutex<HashSet<(String, String)>>,
    supplicants: Mutex<HashMap<String, Arc<dyn Supplicant>>>,
    dispatch: Mutex<Dispatch>,
}

impl Default for FakeServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeServiceManager {
    pub fn new() -> Self {
        Self {
            accept_registrations: AtomicBool::new(true),
            subscriptions: Mutex::new(Vec::new()),
            registered: Mutex::new(HashSet::new()),
            supplicants: Mutex::new(HashMap::new()),
            dispatch: Mutex::new(Dispatch::default()),
        }
    }

    /// Makes `register_for_notifications` fail from now on.
    pub fn reject_registrations(&self) {
        self.accept_registrations.store(false, Ordering::SeqCst);
    }

    pub fn rpc_threadpool_size(&self) -> Option<usize> {
        lock(&self.dispatch).pool.as_ref().map(|pool| pool.size)
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.subscriptions).len()
    }

    /// Makes `instance_name` available through `get_supplicant`. This does
    /// not announce a registration.
    pub fn add_supplicant(&self, instance_name: &str, supplicant: Arc<dyn Supplicant>) {
        lock(&self.supplicants).insert(instance_name.to_owned(), supplicant);
    }

    /// Announces a registration to every matching subscriber.
    pub fn announce(&self, fully_qualified_name: &str, instance_name: &str, pre_existing: bool) {
        info!("announce({fully_qualified_name}/{instance_name}, pre_existing: {pre_existing})");
        if !pre_existing {
            lock(&self.registered)
                .insert((fully_qualified_name.to_owned(), instance_name.to_owned()));
        }
        let listeners: Vec<_> = lock(&self.subscriptions)
            .iter()
            .filter(|s| {
                s.fully_qualified_name == fully_qualified_name && s.instance_name == instance_name
            })
            .map(|s| Arc::clone(&s.listener))
            .collect();
        for listener in listeners {
            let event = RegistrationEvent {
                fully_qualified_name: fully_qualified_name.to_owned(),
                instance_name: instance_name.to_owned(),
                pre_existing,
            };
            self.dispatch(Box::new(move || listener.on_registration(event)));
        }
    }

    /// Announces a registration after `delay`, from a timer thread.
    pub fn announce_after(
        self: &Arc<Self>,
        delay: Duration,
        fully_qualified_name: &str,
        instance_name: &str,
        pre_existing: bool,
    ) {
        let service_manager = Arc::clone(self);
        let fully_qualified_name = fully_qualified_name.to_owned();
        let instance_name = instance_name.to_owned();
        thread::spawn(move || {
            thread::sleep(delay);
            service_manager.announce(&fully_qualified_name, &instance_name, pre_existing);
        });
    }

    /// Forgets a registration, as when the service process exits.
    pub fn unregister(&self, fully_qualified_name: &str, instance_name: &str) {
        lock(&self.registered)
            .remove(&(fully_qualified_name.to_owned(), instance_name.to_owned()));
    }

    fn dispatch(&self, job: Job) {
        let mut dispatch = lock(&self.dispatch);
        if let Some(pool) = &dispatch.pool {
            if pool.sender.send(job).is_err() {
                warn!("rpc threadpool is gone, dropping callback");
            }
            return;
        }
        dispatch.pending.push(job);
    }
}

impl ServiceManager for FakeServiceManager {
    fn register_for_notifications(
        &self,
        fully_qualified_name: &str,
        instance_name: &str,
        listener: Arc<dyn ServiceNotification>,
    ) -> bool {
        if !self.accept_registrations.load(Ordering::SeqCst) {
            info!("rejecting notifications for {fully_qualified_name}/{instance_name}");
            return false;
        }
        lock(&self.subscriptions).push(Subscription {
            fully_qualified_name: fully_qualified_name.to_owned(),
            instance_name: instance_name.to_owned(),
            listener: Arc::clone(&listener),
        });
        let key = (fully_qualified_name.to_owned(), instance_name.to_owned());
        if lock(&self.registered).contains(&key) {
            let event = RegistrationEvent {
                fully_qualified_name: key.0,
                instance_name: key.1,
                pre_existing: true,
            };
            self.dispatch(Box::new(move || listener.on_registration(event)));
        }
        true
    }

    fn configure_rpc_threadpool(&self, max_threads: usize) {
        let mut dispatch = lock(&self.dispatch);
        if dispatch.pool.is_some() {
            return;
        }
        let pool = RpcThreadpool::new(max_threads);
        for job in dispatch.pending.drain(..) {
            if pool.sender.send(job).is_err() {
                warn!("rpc threadpool is gone, dropping callback");
            }
        }
        dispatch.pool = Some(pool);
    }

    fn get_supplicant(&self, instance_name: &str) -> Option<Arc<dyn Supplicant>> {
        lock(&self.supplicants).get(instance_name).cloned()
    }
}

/// A supplicant daemon that registers its HAL service shortly after
/// being started.
pub struct FakeSupplicantManager {
    service_manager: Arc<FakeServiceManager>,
    instance_name: String,
    running: AtomicBool,
    start_ok: AtomicBool,
    stop_ok: AtomicBool,
    exit_on_stop: AtomicBool,
    register_on_start: AtomicBool,
    registration_delay: Mutex<Duration>,
}

impl FakeSupplicantManager {
    pub fn new(service_manager: Arc<FakeServiceManager>, instance_name: &str) -> Self {
        Self {
            service_manager,
            instance_name: instance_name.to_owned(),
            running: AtomicBool::new(false),
            start_ok: AtomicBool::new(true),
            stop_ok: AtomicBool::new(true),
            exit_on_stop: AtomicBool::new(true),
            register_on_start: AtomicBool::new(true),
            registration_delay: Mutex::new(Duration::from_millis(10)),
        }
    }

    pub fn fail_start(&self) {
        self.start_ok.store(false, Ordering::SeqCst);
    }

    pub fn fail_stop(&self) {
        self.stop_ok.store(false, Ordering::SeqCst);
    }

    /// Stop reports success but the daemon keeps running.
    pub fn keep_running_after_stop(&self) {
        self.exit_on_stop.store(false, Ordering::SeqCst);
    }

    /// Start without registering the HAL service.
    pub fn skip_registration(&self) {
        self.register_on_start.store(false, Ordering::SeqCst);
    }

    pub fn set_registration_delay(&self, delay: Duration) {
        *lock(&self.registration_delay) = delay;
    }
}

impl SupplicantManager for FakeSupplicantManager {
    fn start_supplicant(&self) -> bool {
        if !self.start_ok.load(Ordering::SeqCst) {
            return false;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            info!("supplicant already running");
            return true;
        }
        if self.register_on_start.load(Ordering::SeqCst) {
            self.service_manager.announce_after(
                *lock(&self.registration_delay),
                SUPPLICANT_DESCRIPTOR,
                &self.instance_name,
                false,
            );
        }
        true
    }

    fn stop_supplicant(&self) -> bool {
        if !self.stop_ok.load(Ordering::SeqCst) {
            return false;
        }
        if self.exit_on_stop.load(Ordering::SeqCst) {
            self.running.store(false, Ordering::SeqCst);
            self.service_manager.unregister(SUPPLICANT_DESCRIPTOR, &self.instance_name);
        }
        true
    }

    fn is_supplicant_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub struct FakeWifiChip {
    mode_id: Option<ChipModeId>,
    configured: Mutex<Vec<IfaceType>>,
}

impl FakeWifiChip {
    /// A chip that reports `mode_id` for every configuration, or fails
    /// them all if `None`.
    pub fn new(mode_id: Option<ChipModeId>) -> Arc<Self> {
        Arc::new(Self { mode_id, configured: Mutex::new(Vec::new()) })
    }

    pub fn configured_iface_types(&self) -> Vec<IfaceType> {
        lock(&self.configured).clone()
    }
}

impl WifiChip for FakeWifiChip {
    fn configure_chip_to_support_iface_type(&self, iface_type: IfaceType) -> Option<ChipModeId> {
        lock(&self.configured).push(iface_type);
        self.mode_id
    }
}

pub struct FakeVendorHal {
    chips: Mutex<HashMap<String, Arc<dyn WifiChip>>>,
    stop_ok: AtomicBool,
    stopped: Mutex<Vec<String>>,
}

impl Default for FakeVendorHal {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeVendorHal {
    pub fn new() -> Self {
        Self {
            chips: Mutex::new(HashMap::new()),
            stop_ok: AtomicBool::new(true),
            stopped: Mutex::new(Vec::new()),
        }
    }

    pub fn add_chip(&self, wifi_instance_name: &str, chip: Arc<FakeWifiChip>) {
        lock(&self.chips).insert(wifi_instance_name.to_owned(), chip);
    }

    pub fn fail_stop_wifi(&self) {
        self.stop_ok.store(false, Ordering::SeqCst);
    }

    /// Instances successfully stopped so far, in order.
    pub fn stopped_instances(&self) -> Vec<String> {
        lock(&self.stopped).clone()
    }
}

impl VendorHal for FakeVendorHal {
    fn get_wifi_chip(&self, wifi_instance_name: &str) -> Option<Arc<dyn WifiChip>> {
        lock(&self.chips).get(wifi_instance_name).cloned()
    }

    fn stop_wifi(&self, wifi_instance_name: &str) -> bool {
        if !self.stop_ok.load(Ordering::SeqCst) {
            return false;
        }
        lock(&self.stopped).push(wifi_instance_name.to_owned());
        true
    }
}

#[derive(Default)]
struct Failures {
    list_interfaces: Option<SupplicantStatusCode>,
    get_interface: Option<SupplicantStatusCode>,
    set_debug_params: Option<SupplicantStatusCode>,
    add_interface: Option<SupplicantStatusCode>,
    add_network: Option<SupplicantStatusCode>,
}

fn fail_with(code: Option<SupplicantStatusCode>) -> HalResult<()> {
    match code {
        Some(code) => Err(code.into()),
        None => Ok(()),
    }
}

/// A supplicant HAL implementation, either 1.0 with a fixed set of
/// interfaces or 1.1 starting with none.
pub struct FakeSupplicant {
    v1_1: bool,
    ifaces: Mutex<Vec<IfaceInfo>>,
    added: Mutex<Vec<IfaceInfo>>,
    failures: Mutex<Failures>,
    wrong_iface_kind: AtomicBool,
    debug_params: Mutex<Option<(DebugLevel, bool, bool)>>,
    next_network_id: Arc<AtomicU32>,
}

impl FakeSupplicant {
    fn new(v1_1: bool, ifaces: &[IfaceInfo]) -> Arc<Self> {
        Arc::new(Self {
            v1_1,
            ifaces: Mutex::new(ifaces.to_vec()),
            added: Mutex::new(Vec::new()),
            failures: Mutex::new(Failures::default()),
            wrong_iface_kind: AtomicBool::new(false),
            debug_params: Mutex::new(None),
            next_network_id: Arc::new(AtomicU32::new(0)),
        })
    }

    pub fn new_1_0(ifaces: &[IfaceInfo]) -> Arc<Self> {
        Self::new(false, ifaces)
    }

    pub fn new_1_1() -> Arc<Self> {
        Self::new(true, &[])
    }

    pub fn fail_list_interfaces(&self, code: SupplicantStatusCode) {
        lock(&self.failures).list_interfaces = Some(code);
    }

    pub fn fail_get_interface(&self, code: SupplicantStatusCode) {
        lock(&self.failures).get_interface = Some(code);
    }

    pub fn fail_set_debug_params(&self, code: SupplicantStatusCode) {
        lock(&self.failures).set_debug_params = Some(code);
    }

    pub fn fail_add_interface(&self, code: SupplicantStatusCode) {
        lock(&self.failures).add_interface = Some(code);
    }

    pub fn fail_add_network(&self, code: SupplicantStatusCode) {
        lock(&self.failures).add_network = Some(code);
    }

    /// `get_interface` hands back a P2P handle for a STA interface and
    /// vice versa.
    pub fn return_wrong_iface_kind(&self) {
        self.wrong_iface_kind.store(true, Ordering::SeqCst);
    }

    /// Interfaces successfully added through the 1.1 HAL.
    pub fn added_interfaces(&self) -> Vec<IfaceInfo> {
        lock(&self.added).clone()
    }

    pub fn debug_params(&self) -> Option<(DebugLevel, bool, bool)> {
        *lock(&self.debug_params)
    }

    fn make_iface(&self, info: &IfaceInfo) -> SupplicantIface {
        let mut iface_type = info.iface_type;
        if self.wrong_iface_kind.load(Ordering::SeqCst) {
            iface_type = match iface_type {
                IfaceType::Sta => IfaceType::P2p,
                IfaceType::P2p => IfaceType::Sta,
            };
        }
        match iface_type {
            IfaceType::Sta => SupplicantIface::Sta(Arc::new(FakeStaIface {
                name: info.name.clone(),
                next_network_id: Arc::clone(&self.next_network_id),
                add_network_failure: lock(&self.failures).add_network,
            })),
            IfaceType::P2p => SupplicantIface::P2p(Arc::new(FakeP2pIface { name: info.name.clone() })),
        }
    }
}

impl Supplicant for FakeSupplicant {
    fn list_interfaces(&self) -> HalResult<Vec<IfaceInfo>> {
        fail_with(lock(&self.failures).list_interfaces)?;
        Ok(lock(&self.ifaces).clone())
    }

    fn get_interface(&self, info: &IfaceInfo) -> HalResult<SupplicantIface> {
        fail_with(lock(&self.failures).get_interface)?;
        if !lock(&self.ifaces).contains(info) {
            return Err(SupplicantStatusCode::FailureIfaceUnknown.into());
        }
        Ok(self.make_iface(info))
    }

    fn set_debug_params(
        &self,
        level: DebugLevel,
        show_timestamp: bool,
        show_keys: bool,
    ) -> HalResult<()> {
        fail_with(lock(&self.failures).set_debug_params)?;
        *lock(&self.debug_params) = Some((level, show_timestamp, show_keys));
        Ok(())
    }

    fn as_v1_1(&self) -> Option<&dyn SupplicantV1_1> {
        if self.v1_1 {
            Some(self as &dyn SupplicantV1_1)
        } else {
            None
        }
    }
}

impl SupplicantV1_1 for FakeSupplicant {
    fn add_interface(&self, info: &IfaceInfo) -> HalResult<SupplicantIface> {
        fail_with(lock(&self.failures).add_interface)?;
        {
            let mut ifaces = lock(&self.ifaces);
            if ifaces.iter().any(|iface| iface.name == info.name) {
                return Err(SupplicantStatusCode::FailureIfaceExists.into());
            }
            ifaces.push(info.clone());
        }
        lock(&self.added).push(info.clone());
        Ok(self.make_iface(info))
    }
}

struct FakeStaIface {
    name: String,
    next_network_id: Arc<AtomicU32>,
    add_network_failure: Option<SupplicantStatusCode>,
}

impl StaIface for FakeStaIface {
    fn name(&self) -> HalResult<String> {
        Ok(self.name.clone())
    }

    fn add_network(&self) -> HalResult<Arc<dyn StaNetwork>> {
        fail_with(self.add_network_failure)?;
        let id = self.next_network_id.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeStaNetwork { id, iface_name: self.name.clone() }))
    }
}

struct FakeP2pIface {
    name: String,
}

impl P2pIface for FakeP2pIface {
    fn name(&self) -> HalResult<String> {
        Ok(self.name.clone())
    }
}

struct FakeStaNetwork {
    id: u32,
    iface_name: String,
}

impl StaNetwork for FakeStaNetwork {
    fn id(&self) -> HalResult<u32> {
        Ok(self.id)
    }

    fn interface_name(&self) -> HalResult<String> {
        Ok(self.iface_name.clone())
    }
}
