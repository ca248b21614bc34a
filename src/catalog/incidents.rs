//! Incident types with their severity, duration and root cause

use super::pick_cumulative;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    Open,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentType {
    #[serde(rename = "Hardware Failure")]
    HardwareFailure,
    #[serde(rename = "Fiber Cut")]
    FiberCut,
    #[serde(rename = "Power Outage")]
    PowerOutage,
    #[serde(rename = "Capacity Exceeded")]
    CapacityExceeded,
    #[serde(rename = "Configuration Error")]
    ConfigurationError,
    #[serde(rename = "Weather Damage")]
    WeatherDamage,
    #[serde(rename = "Planned Maintenance")]
    PlannedMaintenance,
    #[serde(rename = "DDoS Attack")]
    DdosAttack,
    #[serde(rename = "Software Bug")]
    SoftwareBug,
}

/// Cumulative weights: 15/10/15/15/10/10/15/5/5 percent
const TYPE_DISTRIBUTION: [(f64, IncidentType); 9] = [
    (0.15, IncidentType::HardwareFailure),
    (0.25, IncidentType::FiberCut),
    (0.40, IncidentType::PowerOutage),
    (0.55, IncidentType::CapacityExceeded),
    (0.65, IncidentType::ConfigurationError),
    (0.75, IncidentType::WeatherDamage),
    (0.90, IncidentType::PlannedMaintenance),
    (0.95, IncidentType::DdosAttack),
    (1.00, IncidentType::SoftwareBug),
];

impl IncidentType {
    pub const ALL: [IncidentType; 9] = [
        IncidentType::HardwareFailure,
        IncidentType::FiberCut,
        IncidentType::PowerOutage,
        IncidentType::CapacityExceeded,
        IncidentType::ConfigurationError,
        IncidentType::WeatherDamage,
        IncidentType::PlannedMaintenance,
        IncidentType::DdosAttack,
        IncidentType::SoftwareBug,
    ];

    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        pick_cumulative(rng, &TYPE_DISTRIBUTION)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::HardwareFailure => "Hardware Failure",
            IncidentType::FiberCut => "Fiber Cut",
            IncidentType::PowerOutage => "Power Outage",
            IncidentType::CapacityExceeded => "Capacity Exceeded",
            IncidentType::ConfigurationError => "Configuration Error",
            IncidentType::WeatherDamage => "Weather Damage",
            IncidentType::PlannedMaintenance => "Planned Maintenance",
            IncidentType::DdosAttack => "DDoS Attack",
            IncidentType::SoftwareBug => "Software Bug",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            IncidentType::HardwareFailure | IncidentType::FiberCut | IncidentType::DdosAttack => {
                Severity::Critical
            }
            IncidentType::PowerOutage | IncidentType::WeatherDamage => Severity::High,
            IncidentType::CapacityExceeded
            | IncidentType::ConfigurationError
            | IncidentType::SoftwareBug => Severity::Medium,
            IncidentType::PlannedMaintenance => Severity::Low,
        }
    }

    /// Inclusive bounds of the outage duration in hours
    pub fn duration_range_hours(&self) -> (f64, f64) {
        match self {
            IncidentType::HardwareFailure => (2.0, 24.0),
            IncidentType::FiberCut => (4.0, 48.0),
            IncidentType::PowerOutage => (1.0, 8.0),
            IncidentType::CapacityExceeded => (0.5, 4.0),
            IncidentType::ConfigurationError => (0.5, 2.0),
            IncidentType::WeatherDamage => (2.0, 12.0),
            IncidentType::PlannedMaintenance => (2.0, 6.0),
            IncidentType::DdosAttack => (1.0, 4.0),
            IncidentType::SoftwareBug => (0.5, 3.0),
        }
    }

    pub fn root_cause(&self) -> &'static str {
        match self {
            IncidentType::HardwareFailure => "Faulty network equipment requiring replacement",
            IncidentType::FiberCut => "Third-party excavation damage to fiber cable",
            IncidentType::PowerOutage => "Upstream power grid failure",
            IncidentType::CapacityExceeded => "Unexpected traffic surge during peak hours",
            IncidentType::ConfigurationError => "Incorrect routing table update",
            IncidentType::WeatherDamage => "Storm damage to above-ground infrastructure",
            IncidentType::PlannedMaintenance => "Scheduled equipment upgrade",
            IncidentType::DdosAttack => "Distributed denial of service attack mitigated",
            IncidentType::SoftwareBug => "Software bug in network management system",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
