//! Premise types and the plan tier catalog

use super::pick_cumulative;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of service location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PremiseType {
    Residential,
    Business,
    Enterprise,
}

impl PremiseType {
    /// Residential 70%, Business 20%, Enterprise 10%
    const DISTRIBUTION: [(f64, PremiseType); 3] = [
        (0.70, PremiseType::Residential),
        (0.90, PremiseType::Business),
        (1.00, PremiseType::Enterprise),
    ];

    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        pick_cumulative(rng, &Self::DISTRIBUTION)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PremiseType::Residential => "Residential",
            PremiseType::Business => "Business",
            PremiseType::Enterprise => "Enterprise",
        }
    }
}

impl fmt::Display for PremiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the nine retail and business plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanTier {
    #[serde(rename = "Basic 25")]
    Basic25,
    #[serde(rename = "Standard 50")]
    Standard50,
    #[serde(rename = "Standard Plus 100")]
    StandardPlus100,
    #[serde(rename = "Premium 250")]
    Premium250,
    #[serde(rename = "Ultrafast 500")]
    Ultrafast500,
    #[serde(rename = "Ultrafast 1000")]
    Ultrafast1000,
    #[serde(rename = "Business 100")]
    Business100,
    #[serde(rename = "Business 250")]
    Business250,
    #[serde(rename = "Enterprise 1000")]
    Enterprise1000,
}

/// Advertised speeds and price of a plan tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanSpec {
    pub tier: PlanTier,
    pub download_mbps: u32,
    pub upload_mbps: u32,
    pub monthly_price: f64,
}

const ENTERPRISE_PLANS: [(f64, PlanTier); 2] = [
    (0.50, PlanTier::Enterprise1000),
    (1.00, PlanTier::Business250),
];

const BUSINESS_PLANS: [(f64, PlanTier); 3] = [
    (0.30, PlanTier::Business100),
    (0.60, PlanTier::Business250),
    (1.00, PlanTier::Premium250),
];

const RESIDENTIAL_PLANS: [(f64, PlanTier); 6] = [
    (0.15, PlanTier::Basic25),
    (0.35, PlanTier::Standard50),
    (0.60, PlanTier::StandardPlus100),
    (0.80, PlanTier::Premium250),
    (0.95, PlanTier::Ultrafast500),
    (1.00, PlanTier::Ultrafast1000),
];

impl PlanTier {
    pub const ALL: [PlanTier; 9] = [
        PlanTier::Basic25,
        PlanTier::Standard50,
        PlanTier::StandardPlus100,
        PlanTier::Premium250,
        PlanTier::Ultrafast500,
        PlanTier::Ultrafast1000,
        PlanTier::Business100,
        PlanTier::Business250,
        PlanTier::Enterprise1000,
    ];

    /// Draw a plan conditioned on the premise type
    pub fn draw<R: Rng + ?Sized>(premise_type: PremiseType, rng: &mut R) -> Self {
        match premise_type {
            PremiseType::Enterprise => pick_cumulative(rng, &ENTERPRISE_PLANS),
            PremiseType::Business => pick_cumulative(rng, &BUSINESS_PLANS),
            PremiseType::Residential => pick_cumulative(rng, &RESIDENTIAL_PLANS),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Basic25 => "Basic 25",
            PlanTier::Standard50 => "Standard 50",
            PlanTier::StandardPlus100 => "Standard Plus 100",
            PlanTier::Premium250 => "Premium 250",
            PlanTier::Ultrafast500 => "Ultrafast 500",
            PlanTier::Ultrafast1000 => "Ultrafast 1000",
            PlanTier::Business100 => "Business 100",
            PlanTier::Business250 => "Business 250",
            PlanTier::Enterprise1000 => "Enterprise 1000",
        }
    }

    pub fn spec(&self) -> PlanSpec {
        let (download_mbps, upload_mbps, monthly_price) = match self {
            PlanTier::Basic25 => (25, 5, 49.99),
            PlanTier::Standard50 => (50, 20, 69.99),
            PlanTier::StandardPlus100 => (100, 20, 89.99),
            PlanTier::Premium250 => (250, 25, 109.99),
            PlanTier::Ultrafast500 => (500, 50, 129.99),
            PlanTier::Ultrafast1000 => (1000, 50, 149.99),
            PlanTier::Business100 => (100, 40, 119.99),
            PlanTier::Business250 => (250, 100, 179.99),
            PlanTier::Enterprise1000 => (1000, 400, 299.99),
        };
        PlanSpec {
            tier: *self,
            download_mbps,
            upload_mbps,
            monthly_price,
        }
    }

    /// Typical daily download volume in GB before the weekend uplift
    pub fn daily_download_gb_range(&self) -> (f64, f64) {
        match self {
            PlanTier::Enterprise1000 => (50.0, 150.0),
            PlanTier::Business100 | PlanTier::Business250 => (20.0, 70.0),
            PlanTier::Ultrafast1000 => (15.0, 50.0),
            PlanTier::Ultrafast500 => (10.0, 35.0),
            PlanTier::Premium250 => (8.0, 25.0),
            PlanTier::StandardPlus100 => (5.0, 17.0),
            PlanTier::Standard50 => (3.0, 11.0),
            PlanTier::Basic25 => (2.0, 7.0),
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
