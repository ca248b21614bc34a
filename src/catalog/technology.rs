//! Access technologies and the values keyed on them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access medium of a point of interconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technology {
    /// Fibre to the premises
    #[serde(rename = "FTTP")]
    Fttp,
    /// Hybrid fibre-coaxial
    #[serde(rename = "HFC")]
    Hfc,
    /// Fibre to the node
    #[serde(rename = "FTTN")]
    Fttn,
    #[serde(rename = "Fixed Wireless")]
    FixedWireless,
}

impl Technology {
    pub const ALL: [Technology; 4] = [
        Technology::Fttp,
        Technology::Hfc,
        Technology::Fttn,
        Technology::FixedWireless,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Technology::Fttp => "FTTP",
            Technology::Hfc => "HFC",
            Technology::Fttn => "FTTN",
            Technology::FixedWireless => "Fixed Wireless",
        }
    }

    /// Backhaul capacity of a POI using this technology
    pub fn max_capacity_gbps(&self) -> u32 {
        match self {
            Technology::Fttp => 100,
            Technology::Hfc => 50,
            Technology::Fttn => 25,
            Technology::FixedWireless => 10,
        }
    }

    /// Range of the per-POI baseline utilisation (fraction of capacity).
    /// Copper-heavy FTTN runs hottest, FTTP coolest.
    pub fn base_utilization_range(&self) -> (f64, f64) {
        match self {
            Technology::Fttn => (0.55, 0.70),
            Technology::Hfc => (0.45, 0.60),
            Technology::Fttp => (0.35, 0.50),
            Technology::FixedWireless => (0.40, 0.55),
        }
    }

    /// Monthly utilisation growth for POIs outside the high-growth suburbs
    pub fn monthly_growth_range(&self) -> (f64, f64) {
        match self {
            Technology::Fttn => (0.015, 0.025),
            _ => (0.008, 0.016),
        }
    }

    /// Upgrade cost in AUD when a forecast recommends an upgrade
    pub fn upgrade_cost_range_aud(&self) -> (f64, f64) {
        match self {
            Technology::Fttn => (500_000.0, 2_000_000.0),
            Technology::Hfc => (300_000.0, 1_000_000.0),
            _ => (200_000.0, 600_000.0),
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Technology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Technology::ALL
            .iter()
            .copied()
            .find(|tech| tech.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown technology type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_lookup() {
        assert_eq!(Technology::Fttp.max_capacity_gbps(), 100);
        assert_eq!(Technology::Hfc.max_capacity_gbps(), 50);
        assert_eq!(Technology::Fttn.max_capacity_gbps(), 25);
        assert_eq!(Technology::FixedWireless.max_capacity_gbps(), 10);
    }

    #[test]
    fn test_base_utilization_ordering() {
        let (fttn, _) = Technology::Fttn.base_utilization_range();
        let (hfc, _) = Technology::Hfc.base_utilization_range();
        let (fttp, _) = Technology::Fttp.base_utilization_range();
        assert!(fttn > hfc && hfc > fttp);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("fixed wireless".parse::<Technology>().unwrap(), Technology::FixedWireless);
        assert_eq!(Technology::Fttn.to_string(), "FTTN");
        assert!("ADSL".parse::<Technology>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Technology::FixedWireless).unwrap();
        assert_eq!(json, "\"Fixed Wireless\"");
        let tech: Technology = serde_json::from_str("\"HFC\"").unwrap();
        assert_eq!(tech, Technology::Hfc);
    }
}
