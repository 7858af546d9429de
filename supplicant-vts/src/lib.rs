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

//! # supplicant-vts
//!
//! Helpers for vendor test suites that exercise a device's Wi-Fi supplicant HAL.
//! They bring the supplicant up and down, find the station and P2P interfaces,
//! and turn on verbose supplicant logging so test cases can start from a known
//! good interface.
//!
//! Everything on the platform side is reached through traits that the caller
//! supplies:
//!
//! * **`hal`:** The supplicant HAL model and the service manager used to look
//!   it up and to subscribe to its registration.
//! * **`supplicant_manager`:** Starting and stopping the supplicant daemon.
//! * **`wifi_chip`:** Driver and firmware mode configuration through the vendor HAL.
//! * **`properties`:** System property lookups for interface names.
//!
//! `service_notification` waits for the supplicant service to register, and
//! `test_utils` strings the pieces together. `mocked` provides in-process fakes
//! of every collaborator.
//!

pub mod config;
pub mod error;
pub mod hal;
pub mod mocked;
pub mod properties;
pub mod service_notification;
pub mod supplicant_manager;
pub mod test_utils;
pub mod wifi_chip;
