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

//! Waits for the supplicant HAL service to register with the service manager.

use crate::error::{SupplicantVtsError, SupplicantVtsResult};
use crate::hal::{RegistrationEvent, ServiceManager, ServiceNotification, SUPPLICANT_DESCRIPTOR};
use log::{debug, error};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Number of threads delivering service manager callbacks.
pub const RPC_THREADPOOL_SIZE: usize = 2;

/// Collects fresh registrations of the supplicant service and lets one
/// thread wait for them.
///
/// Create one listener per start attempt. Registrations are never
/// cleared, so a listener that has seen a registration cannot be used to
/// detect the next one.
pub struct ServiceNotificationListener {
    // "<fully qualified name>/<instance name>" of every fresh registration.
    registered: Mutex<Vec<String>>,
    condition: Condvar,
}

impl ServiceNotificationListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { registered: Mutex::new(Vec::new()), condition: Condvar::new() })
    }

    /// Subscribes to registrations of the supplicant `instance_name`.
    ///
    /// On success the service manager's callback thread pool is configured,
    /// after which `on_registration` may be called from those threads at any
    /// time.
    pub fn register_for_hidl_service_notifications(
        self: &Arc<Self>,
        service_manager: &dyn ServiceManager,
        instance_name: &str,
    ) -> SupplicantVtsResult<()> {
        let listener: Arc<dyn ServiceNotification> = self.clone();
        if !service_manager.register_for_notifications(
            SUPPLICANT_DESCRIPTOR,
            instance_name,
            listener,
        ) {
            return Err(SupplicantVtsError::SubscriptionFailure(instance_name.to_owned()));
        }
        service_manager.configure_rpc_threadpool(RPC_THREADPOOL_SIZE);
        Ok(())
    }

    /// Blocks until a registration arrives or `timeout` elapses, then checks
    /// that exactly one registration of the supplicant `instance_name` was seen.
    pub fn wait_for_hidl_service(
        &self,
        timeout: Duration,
        instance_name: &str,
    ) -> SupplicantVtsResult<()> {
        let registered = self.registered.lock().unwrap_or_else(PoisonError::into_inner);
        let (registered, _) = self
            .condition
            .wait_timeout_while(registered, timeout, |registered| registered.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        match registered.as_slice() {
            [] => Err(SupplicantVtsError::Timeout { timeout_millis: timeout.as_millis() as u64 }),
            [got] => {
                let expected = format!("{SUPPLICANT_DESCRIPTOR}/{instance_name}");
                if *got != expected {
                    error!("Expected: {expected}, Got: {got}");
                    return Err(SupplicantVtsError::IdentityMismatch {
                        expected,
                        got: got.clone(),
                    });
                }
                Ok(())
            }
            all => Err(SupplicantVtsError::DuplicateRegistration { count: all.len() }),
        }
    }
}

impl ServiceNotification for ServiceNotificationListener {
    fn on_registration(&self, event: RegistrationEvent) {
        if event.pre_existing {
            debug!(
                "Ignoring pre-existing registration {}/{}",
                event.fully_qualified_name, event.instance_name
            );
            return;
        }
        let mut registered = self.registered.lock().unwrap_or_else(PoisonError::into_inner);
        registered.push(format!("{}/{}", event.fully_qualified_name, event.instance_name));
        drop(registered);
        self.condition.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocked::FakeServiceManager;
    use std::thread;
    use std::time::Instant;

    const INSTANCE: &str = "default";

    fn fresh(instance_name: &str) -> RegistrationEvent {
        RegistrationEvent {
            fully_qualified_name: SUPPLICANT_DESCRIPTOR.to_owned(),
            instance_name: instance_name.to_owned(),
            pre_existing: false,
        }
    }

    fn pre_existing(instance_name: &str) -> RegistrationEvent {
        RegistrationEvent { pre_existing: true, ..fresh(instance_name) }
    }

    #[test]
    fn test_single_matching_registration() {
        let listener = ServiceNotificationListener::new();
        listener.on_registration(fresh(INSTANCE));
        assert_eq!(listener.wait_for_hidl_service(Duration::from_millis(50), INSTANCE), Ok(()));
    }

    #[test]
    fn test_no_registration_times_out() {
        let listener = ServiceNotificationListener::new();
        let start = Instant::now();
        assert_eq!(
            listener.wait_for_hidl_service(Duration::from_millis(50), INSTANCE),
            Err(SupplicantVtsError::Timeout { timeout_millis: 50 })
        );
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(2), "waited {elapsed:?}");
    }

    #[test]
    fn test_pre_existing_registration_is_ignored() {
        let listener = ServiceNotificationListener::new();
        listener.on_registration(pre_existing(INSTANCE));
        listener.on_registration(pre_existing(INSTANCE));
        assert!(matches!(
            listener.wait_for_hidl_service(Duration::from_millis(20), INSTANCE),
            Err(SupplicantVtsError::Timeout { .. })
        ));
    }

    #[test]
    fn test_pre_existing_does_not_count_as_duplicate() {
        let listener = ServiceNotificationListener::new();
        listener.on_registration(pre_existing(INSTANCE));
        listener.on_registration(fresh(INSTANCE));
        listener.on_registration(pre_existing(INSTANCE));
        assert_eq!(listener.wait_for_hidl_service(Duration::from_millis(20), INSTANCE), Ok(()));
    }

    #[test]
    fn test_instance_mismatch() {
        let listener = ServiceNotificationListener::new();
        listener.on_registration(fresh("other"));
        assert_eq!(
            listener.wait_for_hidl_service(Duration::from_millis(20), INSTANCE),
            Err(SupplicantVtsError::IdentityMismatch {
                expected: format!("{SUPPLICANT_DESCRIPTOR}/{INSTANCE}"),
                got: format!("{SUPPLICANT_DESCRIPTOR}/other"),
            })
        );
    }

    #[test]
    fn test_descriptor_mismatch() {
        let listener = ServiceNotificationListener::new();
        listener.on_registration(RegistrationEvent {
            fully_qualified_name: "android.hardware.wifi.supplicant@1.1::ISupplicant".to_owned(),
            ..fresh(INSTANCE)
        });
        assert!(matches!(
            listener.wait_for_hidl_service(Duration::from_millis(20), INSTANCE),
            Err(SupplicantVtsError::IdentityMismatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_registrations() {
        for count in 2..5 {
            let listener = ServiceNotificationListener::new();
            for _ in 0..count {
                listener.on_registration(fresh(INSTANCE));
            }
            assert_eq!(
                listener.wait_for_hidl_service(Duration::from_millis(20), INSTANCE),
                Err(SupplicantVtsError::DuplicateRegistration { count })
            );
        }
    }

    #[test]
    fn test_registration_from_another_thread_wakes_waiter() {
        let listener = ServiceNotificationListener::new();
        let notifier = Arc::clone(&listener);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            notifier.on_registration(fresh(INSTANCE));
        });

        let start = Instant::now();
        assert_eq!(listener.wait_for_hidl_service(Duration::from_millis(500), INSTANCE), Ok(()));
        assert!(start.elapsed() < Duration::from_millis(400));
        handle.join().unwrap();
    }

    #[test]
    fn test_late_registration_does_not_flip_result() {
        let listener = ServiceNotificationListener::new();
        assert!(listener.wait_for_hidl_service(Duration::from_millis(20), INSTANCE).is_err());
        listener.on_registration(fresh(INSTANCE));
        // The earlier wait already reported failure; the event only lands in
        // this listener's state.
        assert_eq!(listener.registered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_different_registrations() {
        let listener = ServiceNotificationListener::new();
        let handles: Vec<_> = [INSTANCE, "other"]
            .into_iter()
            .map(|instance| {
                let notifier = Arc::clone(&listener);
                thread::spawn(move || notifier.on_registration(fresh(instance)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(
            listener.wait_for_hidl_service(Duration::from_millis(50), INSTANCE),
            Err(SupplicantVtsError::DuplicateRegistration { count: 2 })
        );
    }

    #[test]
    fn test_register_configures_threadpool() {
        let service_manager = FakeServiceManager::new();
        let listener = ServiceNotificationListener::new();
        listener.register_for_hidl_service_notifications(&service_manager, INSTANCE).unwrap();
        assert_eq!(service_manager.rpc_threadpool_size(), Some(RPC_THREADPOOL_SIZE));
        assert_eq!(service_manager.listener_count(), 1);
    }

    #[test]
    fn test_register_rejected() {
        let service_manager = FakeServiceManager::new();
        service_manager.reject_registrations();
        let listener = ServiceNotificationListener::new();
        assert_eq!(
            listener.register_for_hidl_service_notifications(&service_manager, INSTANCE),
            Err(SupplicantVtsError::SubscriptionFailure(INSTANCE.to_owned()))
        );
        assert_eq!(service_manager.rpc_threadpool_size(), None);
    }

    #[test]
    fn test_wait_for_announced_registration() {
        let service_manager = Arc::new(FakeServiceManager::new());
        let listener = ServiceNotificationListener::new();
        listener
            .register_for_hidl_service_notifications(&*service_manager, INSTANCE)
            .unwrap();
        service_manager.announce_after(
            Duration::from_millis(10),
            SUPPLICANT_DESCRIPTOR,
            INSTANCE,
            false,
        );
        assert_eq!(listener.wait_for_hidl_service(Duration::from_millis(500), INSTANCE), Ok(()));
    }
}
