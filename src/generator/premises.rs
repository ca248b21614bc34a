//! Service locations (`premises`)
//!
//! One synthetic premise stands for `premises_compression_ratio` real ones,
//! so a POI serving 40 000 premises gets 400 rows at the default ratio.

use super::infrastructure::{self, PoiInfrastructure};
use super::{ids, require_rows, GeneratorResult, StageContext};
use crate::catalog::{PremiseType, Technology};
use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const TABLE_NAME: &str = "premises";
const STAGE: &str = "premises";

/// Maximum offset from the POI in either axis, in degrees
const COORDINATE_JITTER: f64 = 0.025;
const CONNECTED_PROBABILITY: f64 = 0.85;
/// Connections were made 30..1530 days ago
const CONNECTION_AGE_DAYS: std::ops::Range<i64> = 30..1530;

const STREET_NAMES: [&str; 5] = ["Main", "High", "Station", "Park", "Victoria"];
const STREET_TYPES: [&str; 2] = ["Street", "Road"];

/// A physical service location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Premise {
    pub premise_id: String,
    pub poi_id: String,
    pub address: String,
    pub suburb: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub technology_type: Technology,
    pub premise_type: PremiseType,
    pub is_connected: bool,
    pub connection_date: Option<NaiveDate>,
}

/// Synthetic premise rows emitted for a POI
pub fn premises_per_poi(premises_served: u32, compression_ratio: u32) -> u32 {
    premises_served / compression_ratio.max(1)
}

pub fn generate_premises(
    ctx: &StageContext<'_>,
    pois: &[PoiInfrastructure],
) -> GeneratorResult<Vec<Premise>> {
    require_rows(STAGE, infrastructure::TABLE_NAME, pois)?;
    let ratio = ctx.config.premises_compression_ratio;
    let today = ctx.as_of.date_naive();

    let rows: Vec<Premise> = pois
        .par_iter()
        .flat_map_iter(|poi| premises_for_poi(ctx, poi, ratio, today))
        .collect();

    let connected = rows.iter().filter(|p| p.is_connected).count();
    info!(
        "Generated {} premises ({} connected) at compression ratio 1:{}",
        rows.len(),
        connected,
        ratio
    );
    Ok(rows)
}

fn premises_for_poi(
    ctx: &StageContext<'_>,
    poi: &PoiInfrastructure,
    ratio: u32,
    today: NaiveDate,
) -> Vec<Premise> {
    let count = premises_per_poi(poi.premises_served, ratio);
    let mut rng = ctx.random.stream(STAGE, &poi.poi_id);

    (1..=count)
        .map(|index| {
            let latitude = poi.latitude + rng.gen_range(-COORDINATE_JITTER..=COORDINATE_JITTER);
            let longitude = poi.longitude + rng.gen_range(-COORDINATE_JITTER..=COORDINATE_JITTER);

            let number: u32 = rng.gen_range(1..=500);
            let street = STREET_NAMES.choose(&mut rng).copied().unwrap_or("Main");
            let street_type = STREET_TYPES.choose(&mut rng).copied().unwrap_or("Street");
            let address = format!(
                "{} {} {}, {} {}",
                number, street, street_type, poi.suburb, poi.state
            );

            let premise_type = PremiseType::draw(&mut rng);
            let is_connected = rng.gen_bool(CONNECTED_PROBABILITY);
            let connection_date = if is_connected {
                Some(today - Duration::days(rng.gen_range(CONNECTION_AGE_DAYS)))
            } else {
                None
            };

            Premise {
                premise_id: ids::premise_id(&poi.poi_id, index),
                poi_id: poi.poi_id.clone(),
                address,
                suburb: poi.suburb.clone(),
                state: poi.state.clone(),
                latitude,
                longitude,
                technology_type: poi.technology_type,
                premise_type,
                is_connected,
                connection_date,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_locations;
    use crate::generator::infrastructure::generate_infrastructure;
    use crate::generator::test_support::test_generator;
    use crate::generator::GeneratorError;

    fn generated() -> (Vec<PoiInfrastructure>, Vec<Premise>) {
        let generator = test_generator();
        let ctx = generator.context();
        let pois = generate_infrastructure(&ctx, &builtin_locations()).unwrap();
        let premises = generate_premises(&ctx, &pois).unwrap();
        (pois, premises)
    }

    #[test]
    fn test_compression_ratio() {
        assert_eq!(premises_per_poi(40_000, 100), 400);
        assert_eq!(premises_per_poi(45_099, 100), 450);
        assert_eq!(premises_per_poi(99, 100), 0);
        assert_eq!(premises_per_poi(40_000, 250), 160);
    }

    #[test]
    fn test_fttn_poi_with_40000_premises_gets_400_rows() {
        let generator = test_generator();
        let ctx = generator.context();
        let mut location = builtin_locations().remove(1);
        location.technology = Technology::Fttn;
        location.premises_served = 40_000;

        let pois = generate_infrastructure(&ctx, &[location]).unwrap();
        let premises = generate_premises(&ctx, &pois).unwrap();
        assert_eq!(premises.len(), 400);
        assert!(premises.iter().all(|p| p.poi_id == pois[0].poi_id));
    }

    #[test]
    fn test_premises_stay_near_their_poi() {
        let (pois, premises) = generated();
        for premise in &premises {
            let poi = pois.iter().find(|p| p.poi_id == premise.poi_id).unwrap();
            assert!((premise.latitude - poi.latitude).abs() <= COORDINATE_JITTER + 1e-9);
            assert!((premise.longitude - poi.longitude).abs() <= COORDINATE_JITTER + 1e-9);
        }
    }

    #[test]
    fn test_connection_date_iff_connected() {
        let (_, premises) = generated();
        for premise in &premises {
            assert_eq!(premise.is_connected, premise.connection_date.is_some());
        }
    }

    #[test]
    fn test_premise_type_mix() {
        let (_, premises) = generated();
        let total = premises.len() as f64;
        let residential = premises
            .iter()
            .filter(|p| p.premise_type == PremiseType::Residential)
            .count() as f64;
        let connected = premises.iter().filter(|p| p.is_connected).count() as f64;

        assert!((residential / total - 0.70).abs() < 0.03);
        assert!((connected / total - 0.85).abs() < 0.03);
    }

    #[test]
    fn test_premise_ids_unique() {
        let (_, premises) = generated();
        let ids: std::collections::HashSet<_> = premises.iter().map(|p| &p.premise_id).collect();
        assert_eq!(ids.len(), premises.len());
    }

    #[test]
    fn test_missing_infrastructure() {
        let generator = test_generator();
        let err = generate_premises(&generator.context(), &[]).unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::MissingDependency { table: "poi_infrastructure", .. }
        ));
    }
}
