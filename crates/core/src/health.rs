//! Health model: request error ratio plus component availability, folded
//! into a single global status with a severity priority.

use serde::{Deserialize, Serialize};

/// Error ratio at or above which requests are in failure.
pub const FAILURE_RATIO: f64 = 0.2;
/// Error ratio at or above which requests are degraded.
pub const DEGRADED_RATIO: f64 = 0.001;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    Failure,
    Degraded,
    Healthy,
    NotAvailable,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Healthy,
        HealthStatus::Degraded,
        HealthStatus::Failure,
        HealthStatus::NotAvailable,
    ];

    /// Severity rank; higher is worse.
    pub fn priority(self) -> u8 {
        match self {
            HealthStatus::Failure => 3,
            HealthStatus::Degraded => 2,
            HealthStatus::Healthy => 1,
            HealthStatus::NotAvailable => 0,
        }
    }

    /// Display name, also used as the health filter value.
    pub fn name(self) -> &'static str {
        match self {
            HealthStatus::Failure => "Failure",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Healthy => "Healthy",
            HealthStatus::NotAvailable => "No health information",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn worst(self, other: HealthStatus) -> HealthStatus {
        if other.priority() > self.priority() { other } else { self }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RequestHealth {
    /// Fraction of requests in error; negative when there was no traffic.
    pub error_ratio: f64,
}

impl Default for RequestHealth {
    fn default() -> Self {
        Self { error_ratio: -1.0 }
    }
}

/// Replica availability of one backing controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentHealth {
    pub name: String,
    pub available: u32,
    pub desired: u32,
}

impl ComponentHealth {
    pub fn status(&self) -> HealthStatus {
        if self.desired == 0 {
            HealthStatus::NotAvailable
        } else if self.available == 0 {
            HealthStatus::Failure
        } else if self.available < self.desired {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Health {
    #[serde(default)]
    pub requests: RequestHealth,
    #[serde(default)]
    pub components: Vec<ComponentHealth>,
}

/// Request error classification: the status and the error percentage it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestErrorsStatus {
    pub status: HealthStatus,
    /// Error percentage, or the raw (negative) ratio when there was no traffic.
    pub value: f64,
}

pub fn request_errors_status(ratio: f64) -> RequestErrorsStatus {
    if ratio < 0.0 || ratio.is_nan() {
        return RequestErrorsStatus { status: HealthStatus::NotAvailable, value: ratio };
    }
    let status = if ratio >= FAILURE_RATIO {
        HealthStatus::Failure
    } else if ratio >= DEGRADED_RATIO {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };
    RequestErrorsStatus { status, value: ratio * 100.0 }
}

impl Health {
    pub fn from_error_ratio(error_ratio: f64) -> Self {
        Self { requests: RequestHealth { error_ratio }, components: Vec::new() }
    }

    pub fn errors(&self) -> RequestErrorsStatus {
        request_errors_status(self.requests.error_ratio)
    }

    /// Most severe of the request status and every component status.
    pub fn global_status(&self) -> HealthStatus {
        self.components
            .iter()
            .map(ComponentHealth::status)
            .fold(self.errors().status, HealthStatus::worst)
    }
}
