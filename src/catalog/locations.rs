//! Seed catalog of points of interconnect
//!
//! The built-in catalog covers every Australian state and territory. A
//! replacement catalog can be loaded from YAML or JSON; either way it is
//! validated before any table is generated.

use super::technology::Technology;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Seed catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No locations at all
    #[error("Seed catalog is empty")]
    Empty,

    /// An entry that cannot seed a POI
    #[error("Seed catalog entry {index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },

    /// Could not read the catalog file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not parse the catalog file
    #[error("Parse error in seed catalog: {0}")]
    Parse(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// One row of the seed catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedLocation {
    pub state: String,
    pub city: String,
    pub suburb: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "technology_type")]
    pub technology: Technology,
    pub premises_served: u32,
}

/// Suburbs with heavy greenfield development; forecasts grow fastest here
pub const HIGH_GROWTH_SUBURBS: [&str; 4] = ["Werribee", "Cranbourne", "Tarneit", "Point Cook"];

pub fn is_high_growth_suburb(suburb: &str) -> bool {
    HIGH_GROWTH_SUBURBS.contains(&suburb)
}

fn loc(
    state: &str,
    city: &str,
    suburb: &str,
    latitude: f64,
    longitude: f64,
    technology: Technology,
    premises_served: u32,
) -> SeedLocation {
    SeedLocation {
        state: state.to_string(),
        city: city.to_string(),
        suburb: suburb.to_string(),
        latitude,
        longitude,
        technology,
        premises_served,
    }
}

/// The 38 built-in POI locations
pub fn builtin_locations() -> Vec<SeedLocation> {
    use Technology::{FixedWireless, Fttn, Fttp, Hfc};

    vec![
        // NSW
        loc("NSW", "Sydney",        "Sydney CBD",     -33.8688, 151.2093, Fttp, 45000),
        loc("NSW", "Sydney",        "Parramatta",     -33.8151, 151.0011, Fttn, 38000),
        loc("NSW", "Sydney",        "Western Sydney", -33.8330, 150.8500, Fttn, 52000),
        loc("NSW", "Sydney",        "North Sydney",   -33.8397, 151.2065, Fttp, 28000),
        loc("NSW", "Sydney",        "Blacktown",      -33.7690, 150.9063, Fttn, 48000),
        loc("NSW", "Sydney",        "Liverpool",      -33.9200, 150.9256, Hfc,  35000),
        loc("NSW", "Sydney",        "Penrith",        -33.7507, 150.6876, Fttn, 32000),
        loc("NSW", "Newcastle",     "Newcastle",      -32.9283, 151.7817, Fttp, 29000),
        loc("NSW", "Wollongong",    "Wollongong",     -34.4250, 150.8931, Hfc,  24000),
        // VIC
        loc("VIC", "Melbourne",     "Melbourne CBD",  -37.8136, 144.9631, Fttp, 42000),
        loc("VIC", "Melbourne",     "Werribee",       -37.9000, 144.6667, Fttn, 55000),
        loc("VIC", "Melbourne",     "Cranbourne",     -38.0996, 145.2834, Fttn, 49000),
        loc("VIC", "Melbourne",     "Point Cook",     -37.9167, 144.7500, Fttn, 44000),
        loc("VIC", "Melbourne",     "Tarneit",        -37.8333, 144.6500, Fttp, 51000),
        loc("VIC", "Melbourne",     "Epping",         -37.6500, 145.0333, Hfc,  38000),
        loc("VIC", "Melbourne",     "Dandenong",      -37.9875, 145.2153, Fttn, 36000),
        loc("VIC", "Melbourne",     "Frankston",      -38.1433, 145.1228, Hfc,  31000),
        loc("VIC", "Geelong",       "Geelong",        -38.1499, 144.3617, Fttp, 27000),
        // QLD
        loc("QLD", "Brisbane",      "Brisbane CBD",   -27.4705, 153.0260, Fttp, 39000),
        loc("QLD", "Brisbane",      "Gold Coast",     -28.0167, 153.4000, Hfc,  46000),
        loc("QLD", "Brisbane",      "Ipswich",        -27.6167, 152.7667, Fttn, 33000),
        loc("QLD", "Brisbane",      "Logan",          -27.6394, 153.1094, Fttn, 41000),
        loc("QLD", "Brisbane",      "Sunshine Coast", -26.6500, 153.0667, Hfc,  35000),
        loc("QLD", "Cairns",        "Cairns",         -16.9186, 145.7781, Fttn, 22000),
        loc("QLD", "Townsville",    "Townsville",     -19.2590, 146.8169, Fttn, 19000),
        // WA
        loc("WA",  "Perth",         "Perth CBD",      -31.9505, 115.8605, Fttp, 36000),
        loc("WA",  "Perth",         "Joondalup",      -31.7453, 115.7663, Fttn, 34000),
        loc("WA",  "Perth",         "Rockingham",     -32.2833, 115.7333, Hfc,  29000),
        loc("WA",  "Perth",         "Mandurah",       -32.5269, 115.7217, Fttn, 26000),
        // SA
        loc("SA",  "Adelaide",      "Adelaide CBD",   -34.9285, 138.6007, Fttp, 31000),
        loc("SA",  "Adelaide",      "Elizabeth",      -34.7167, 138.6667, Fttn, 28000),
        loc("SA",  "Adelaide",      "Salisbury",      -34.7667, 138.6333, Fttn, 25000),
        // TAS
        loc("TAS", "Hobart",        "Hobart",         -42.8821, 147.3272, Fttp, 18000),
        loc("TAS", "Launceston",    "Launceston",     -41.4332, 147.1441, Fttn, 14000),
        // NT
        loc("NT",  "Darwin",        "Darwin",         -12.4634, 130.8456, FixedWireless, 12000),
        loc("NT",  "Alice Springs", "Alice Springs",  -23.6980, 133.8807, FixedWireless,  6000),
        // ACT
        loc("ACT", "Canberra",      "Canberra",       -35.2809, 149.1300, Fttp, 28000),
        loc("ACT", "Canberra",      "Belconnen",      -35.2388, 149.0667, Fttp, 24000),
    ]
}

/// Check a catalog before it seeds the infrastructure table
pub fn validate_locations(locations: &[SeedLocation]) -> CatalogResult<()> {
    if locations.is_empty() {
        return Err(CatalogError::Empty);
    }

    for (index, location) in locations.iter().enumerate() {
        let malformed = |reason: String| CatalogError::Malformed { index, reason };

        if location.state.trim().is_empty() {
            return Err(malformed("state is empty".to_string()));
        }
        if !location.state.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed(format!(
                "state code {:?} must be alphanumeric",
                location.state
            )));
        }
        if location.city.trim().is_empty() || location.suburb.trim().is_empty() {
            return Err(malformed("city and suburb must be non-empty".to_string()));
        }
        if !(-90.0..=90.0).contains(&location.latitude) {
            return Err(malformed(format!("latitude {} out of range", location.latitude)));
        }
        if !(-180.0..=180.0).contains(&location.longitude) {
            return Err(malformed(format!("longitude {} out of range", location.longitude)));
        }
        if location.premises_served == 0 {
            return Err(malformed("premises_served must be positive".to_string()));
        }
    }

    Ok(())
}

/// Load a replacement catalog (a YAML or JSON list of locations)
pub fn load_locations_file(path: impl AsRef<Path>) -> CatalogResult<Vec<SeedLocation>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;

    let locations: Vec<SeedLocation> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {
            serde_json::from_str(&text).map_err(|e| CatalogError::Parse(e.to_string()))?
        }
        _ => serde_yaml::from_str(&text).map_err(|e| CatalogError::Parse(e.to_string()))?,
    };

    validate_locations(&locations)?;
    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let locations = builtin_locations();
        assert_eq!(locations.len(), 38);
        assert!(validate_locations(&locations).is_ok());
    }

    #[test]
    fn test_high_growth_suburbs_are_in_catalog() {
        let locations = builtin_locations();
        for suburb in HIGH_GROWTH_SUBURBS {
            assert!(locations.iter().any(|l| l.suburb == suburb));
        }
        assert!(is_high_growth_suburb("Tarneit"));
        assert!(!is_high_growth_suburb("Hobart"));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(validate_locations(&[]), Err(CatalogError::Empty)));
    }

    #[test]
    fn test_malformed_entry_reports_index() {
        let mut locations = builtin_locations();
        locations[3].latitude = 123.0;
        match validate_locations(&locations) {
            Err(CatalogError::Malformed { index, .. }) => assert_eq!(index, 3),
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_yaml_catalog() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
- state: VIC
  city: Ballarat
  suburb: Ballarat
  latitude: -37.5622
  longitude: 143.8503
  technology_type: FTTN
  premises_served: 21000
"#
        )
        .unwrap();

        let locations = load_locations_file(file.path()).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].technology, Technology::Fttn);
    }

    #[test]
    fn test_load_rejects_unknown_technology() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"state":"VIC","city":"A","suburb":"B","latitude":-37.0,"longitude":144.0,"technology_type":"ADSL","premises_served":100}}]"#
        )
        .unwrap();

        assert!(matches!(load_locations_file(file.path()), Err(CatalogError::Parse(_))));
    }
}
