//! Points of interconnect (`poi_infrastructure`)

use super::{ids, GeneratorResult, StageContext};
use crate::catalog::{validate_locations, SeedLocation, Technology};
use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const TABLE_NAME: &str = "poi_infrastructure";
const STAGE: &str = "infrastructure";

/// Install dates fall 500..2500 days before the reference date
const INSTALL_AGE_DAYS: std::ops::Range<i64> = 500..2500;
/// Last upgrade within the past year
const UPGRADE_AGE_DAYS: std::ops::Range<i64> = 0..365;

/// A network aggregation point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiInfrastructure {
    pub poi_id: String,
    pub state: String,
    pub city: String,
    pub suburb: String,
    pub latitude: f64,
    pub longitude: f64,
    pub technology_type: Technology,
    pub premises_served: u32,
    pub max_capacity_gbps: u32,
    pub install_date: NaiveDate,
    pub last_upgrade_date: NaiveDate,
}

/// One POI per seed location, ids assigned in catalog order
pub fn generate_infrastructure(
    ctx: &StageContext<'_>,
    locations: &[SeedLocation],
) -> GeneratorResult<Vec<PoiInfrastructure>> {
    validate_locations(locations)?;
    let today = ctx.as_of.date_naive();

    let rows: Vec<PoiInfrastructure> = locations
        .iter()
        .enumerate()
        .map(|(sequence, location)| {
            let poi_id = ids::poi_id(&location.state, sequence);
            let mut rng = ctx.random.stream(STAGE, &poi_id);
            let install_age = rng.gen_range(INSTALL_AGE_DAYS);
            let upgrade_age = rng.gen_range(UPGRADE_AGE_DAYS);

            PoiInfrastructure {
                state: location.state.to_uppercase(),
                city: location.city.clone(),
                suburb: location.suburb.clone(),
                latitude: location.latitude,
                longitude: location.longitude,
                technology_type: location.technology,
                premises_served: location.premises_served,
                max_capacity_gbps: location.technology.max_capacity_gbps(),
                install_date: today - Duration::days(install_age),
                last_upgrade_date: today - Duration::days(upgrade_age),
                poi_id,
            }
        })
        .collect();

    info!("Generated {} POIs for {}", rows.len(), TABLE_NAME);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{builtin_locations, CatalogError};
    use crate::generator::test_support::test_generator;
    use crate::generator::GeneratorError;

    #[test]
    fn test_one_poi_per_location() {
        let generator = test_generator();
        let locations = builtin_locations();
        let rows = generate_infrastructure(&generator.context(), &locations).unwrap();

        assert_eq!(rows.len(), locations.len());
        assert_eq!(rows[0].poi_id, "NSW-0000");
        assert_eq!(rows[9].poi_id, "VIC-0009");
    }

    #[test]
    fn test_capacity_is_determined_by_technology() {
        let generator = test_generator();
        let rows = generate_infrastructure(&generator.context(), &builtin_locations()).unwrap();

        for row in &rows {
            assert!([100, 50, 25, 10].contains(&row.max_capacity_gbps));
            assert_eq!(row.max_capacity_gbps, row.technology_type.max_capacity_gbps());
        }
    }

    #[test]
    fn test_dates_within_bounds() {
        let generator = test_generator();
        let today = generator.as_of().date_naive();
        let rows = generate_infrastructure(&generator.context(), &builtin_locations()).unwrap();

        for row in &rows {
            let install_age = (today - row.install_date).num_days();
            let upgrade_age = (today - row.last_upgrade_date).num_days();
            assert!((500..2500).contains(&install_age));
            assert!((0..365).contains(&upgrade_age));
        }
    }

    #[test]
    fn test_empty_catalog_is_configuration_error() {
        let generator = test_generator();
        let err = generate_infrastructure(&generator.context(), &[]).unwrap_err();
        assert!(matches!(err, GeneratorError::Catalog(CatalogError::Empty)));
    }
}
