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

use crate::hal::{IfaceType, SupplicantStatus};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SupplicantVtsError {
    /// The service manager rejected the registration notification request.
    #[error("failed to register for service notifications of instance {0:?}")]
    SubscriptionFailure(String),
    /// No fresh registration arrived before the deadline.
    #[error("no service registration within {timeout_millis} ms")]
    Timeout { timeout_millis: u64 },
    /// Exactly one registration arrived but for another service.
    #[error("expected registration {expected:?}, got {got:?}")]
    IdentityMismatch { expected: String, got: String },
    /// More than one fresh registration arrived.
    #[error("expected a single service registration, got {count}")]
    DuplicateRegistration { count: usize },
    /// A HAL call returned a non-success status.
    #[error("{call} failed: {status}")]
    Status { call: &'static str, status: SupplicantStatus },
    #[error("supplicant was started but is not running")]
    SupplicantNotStarted,
    #[error("supplicant failed to stop")]
    SupplicantStopFailed,
    #[error("supplicant is still running after stop")]
    SupplicantStillRunning,
    #[error("no wifi chip for wifi instance {0:?}")]
    WifiChipUnavailable(String),
    #[error("failed to configure wifi chip for {0:?}")]
    ChipConfiguration(IfaceType),
    #[error("failed to stop wifi instance {0:?}")]
    StopWifi(String),
    /// The supplicant does not implement the 1.1 interface.
    #[error("supplicant is not a 1.1 implementation")]
    NotV1_1,
    #[error("no supplicant service for instance {0:?}")]
    ServiceNotFound(String),
}

pub type SupplicantVtsResult<T> = Result<T, SupplicantVtsError>;
