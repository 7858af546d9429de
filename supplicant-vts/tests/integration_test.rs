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

use clap::Parser;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use supplicant_vts::config::SupplicantVtsArgs;
use supplicant_vts::error::SupplicantVtsError;
use supplicant_vts::hal::{
    IfaceType, RegistrationEvent, ServiceManager, ServiceNotification, SUPPLICANT_DESCRIPTOR,
};
use supplicant_vts::mocked::{
    FakeServiceManager, FakeSupplicant, FakeSupplicantManager, FakeVendorHal, FakeWifiChip,
};
use supplicant_vts::service_notification::ServiceNotificationListener;
use supplicant_vts::supplicant_manager::SupplicantManager;
use supplicant_vts::test_utils::{
    create_supplicant_sta_network, get_supplicant_p2p_iface, get_supplicant_sta_iface,
    turn_on_excessive_logging, SupplicantTestEnv,
};
use vts_common::util::vts_logger;

const INSTANCE: &str = "default";

struct Device {
    service_manager: Arc<FakeServiceManager>,
    supplicant_manager: Arc<FakeSupplicantManager>,
    supplicant: Arc<FakeSupplicant>,
    env: SupplicantTestEnv,
}

fn device(properties: HashMap<String, String>) -> Device {
    vts_logger::init_for_test();
    let service_manager = Arc::new(FakeServiceManager::new());
    let supplicant_manager =
        Arc::new(FakeSupplicantManager::new(Arc::clone(&service_manager), INSTANCE));
    let vendor_hal = Arc::new(FakeVendorHal::new());
    vendor_hal.add_chip("", FakeWifiChip::new(Some(0)));
    let supplicant = FakeSupplicant::new_1_1();
    service_manager.add_supplicant(INSTANCE, supplicant.clone());
    let env = SupplicantTestEnv::new(
        service_manager.clone(),
        supplicant_manager.clone(),
        vendor_hal,
        Arc::new(properties),
    );
    Device { service_manager, supplicant_manager, supplicant, env }
}

fn expect_error(result: anyhow::Result<()>) -> SupplicantVtsError {
    result.unwrap_err().downcast::<SupplicantVtsError>().unwrap()
}

/// A full test case: set up, use both interfaces, tear down.
#[test]
fn test_set_up_use_and_tear_down() {
    let device = device(HashMap::new());
    let config = SupplicantVtsArgs::try_parse_from(["supplicant-vts", "--p2p"])
        .unwrap()
        .resolve_with(|_| None);

    let supplicant = device.env.set_up(&config).unwrap();
    assert!(turn_on_excessive_logging(supplicant.as_ref()));

    let sta = get_supplicant_sta_iface(supplicant.as_ref()).unwrap();
    assert_eq!(sta.name(), Ok("wlan0".to_owned()));
    let p2p = get_supplicant_p2p_iface(supplicant.as_ref()).unwrap();
    assert_eq!(p2p.name(), Ok("p2p0".to_owned()));
    let network = create_supplicant_sta_network(supplicant.as_ref()).unwrap();
    assert_eq!(network.interface_name(), Ok("wlan0".to_owned()));

    device.env.tear_down(&config).unwrap();
    assert!(!device.supplicant_manager.is_supplicant_running());
}

/// Listeners from earlier runs stay subscribed without affecting later ones.
#[test]
fn test_restart_cycles() {
    let device = device(HashMap::new());
    for _ in 0..3 {
        device.env.start_supplicant_and_wait_for_hidl_service("", INSTANCE).unwrap();
        device.env.stop_supplicant("").unwrap();
    }
}

/// Starting again without a stop finds the service already registered. The
/// new listener only sees a pre-existing registration, which does not count.
#[test]
fn test_start_twice_without_stop() {
    let device = device(HashMap::new());
    let env = device.env.with_wait_timeout(Duration::from_millis(100));
    env.start_supplicant_and_wait_for_hidl_service("", INSTANCE).unwrap();
    assert_eq!(
        expect_error(env.start_supplicant_and_wait_for_hidl_service("", INSTANCE)),
        SupplicantVtsError::Timeout { timeout_millis: 100 }
    );
}

#[test]
fn test_interface_names_from_properties() {
    let properties: HashMap<String, String> = [
        ("wifi.interface".to_owned(), "wlan7".to_owned()),
        ("wifi.direct.interface".to_owned(), "p2p-wlan7".to_owned()),
    ]
    .into_iter()
    .collect();
    let device = device(properties);
    device.env.get_supplicant(INSTANCE, true).unwrap();
    let names: Vec<_> = device
        .supplicant
        .added_interfaces()
        .into_iter()
        .map(|info| (info.iface_type, info.name))
        .collect();
    assert_eq!(
        names,
        vec![(IfaceType::Sta, "wlan7".to_owned()), (IfaceType::P2p, "p2p-wlan7".to_owned())]
    );
}

#[test]
fn test_prop_file_config() {
    let path = std::env::temp_dir().join(format!("supplicant_vts_{}.prop", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "wifi.interface=wlan3").unwrap();
    }
    let config = SupplicantVtsArgs::try_parse_from([
        "supplicant-vts",
        "--prop-file",
        path.to_str().unwrap(),
    ])
    .unwrap()
    .resolve_with(|_| None);
    let properties = config.load_properties().unwrap();
    assert_eq!(supplicant_vts::properties::get_sta_iface_name(properties.as_ref()), "wlan3");
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_duplicate_registration() {
    let device = device(HashMap::new());
    let listener = ServiceNotificationListener::new();
    listener
        .register_for_hidl_service_notifications(&*device.service_manager, INSTANCE)
        .unwrap();
    device.service_manager.announce(SUPPLICANT_DESCRIPTOR, INSTANCE, false);
    device.service_manager.announce(SUPPLICANT_DESCRIPTOR, INSTANCE, false);
    // Let the dispatch threads deliver both callbacks before checking.
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(
        listener.wait_for_hidl_service(Duration::from_millis(500), INSTANCE),
        Err(SupplicantVtsError::DuplicateRegistration { count: 2 })
    );
}

#[test]
fn test_prompt_return_after_registration() {
    let device = device(HashMap::new());
    device.service_manager.configure_rpc_threadpool(2);
    let listener = ServiceNotificationListener::new();
    listener
        .register_for_hidl_service_notifications(&*device.service_manager, INSTANCE)
        .unwrap();
    device.service_manager.announce_after(
        Duration::from_millis(10),
        SUPPLICANT_DESCRIPTOR,
        INSTANCE,
        false,
    );
    let start = Instant::now();
    assert_eq!(listener.wait_for_hidl_service(Duration::from_millis(500), INSTANCE), Ok(()));
    assert!(start.elapsed() < Duration::from_millis(400), "took {:?}", start.elapsed());
}

#[test]
fn test_registration_after_timeout() {
    let device = device(HashMap::new());
    device.supplicant_manager.set_registration_delay(Duration::from_millis(300));
    let env = device.env.with_wait_timeout(Duration::from_millis(50));
    let start = Instant::now();
    assert_eq!(
        expect_error(env.start_supplicant_and_wait_for_hidl_service("", INSTANCE)),
        SupplicantVtsError::Timeout { timeout_millis: 50 }
    );
    assert!(start.elapsed() < Duration::from_millis(300));
}

#[test]
fn test_start_without_registration_times_out() {
    let device = device(HashMap::new());
    device.supplicant_manager.skip_registration();
    let env = device.env.with_wait_timeout(Duration::from_millis(50));
    assert_eq!(
        expect_error(env.start_supplicant_and_wait_for_hidl_service("", INSTANCE)),
        SupplicantVtsError::Timeout { timeout_millis: 50 }
    );
}

#[test]
fn test_wrong_instance_mismatch() {
    let device = device(HashMap::new());
    let listener = ServiceNotificationListener::new();
    listener
        .register_for_hidl_service_notifications(&*device.service_manager, INSTANCE)
        .unwrap();
    listener.on_registration(RegistrationEvent {
        fully_qualified_name: SUPPLICANT_DESCRIPTOR.to_owned(),
        instance_name: "slot2".to_owned(),
        pre_existing: false,
    });
    assert!(matches!(
        listener.wait_for_hidl_service(Duration::from_millis(50), INSTANCE),
        Err(SupplicantVtsError::IdentityMismatch { .. })
    ));
}
