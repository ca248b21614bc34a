//! Faults and maintenance events (`incidents`)

use super::infrastructure::{self, PoiInfrastructure};
use super::util::round_to;
use super::{ids, require_rows, GeneratorResult, StageContext};
use crate::catalog::{IncidentStatus, IncidentType, Severity, Technology};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const TABLE_NAME: &str = "incidents";
const STAGE: &str = "incidents";

const CUSTOMERS_AFFECTED: std::ops::RangeInclusive<u32> = 500..=5500;
/// Incidents younger than this may still be open
const OPEN_WINDOW_DAYS: i64 = 2;
const OPEN_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: String,
    pub poi_id: String,
    pub suburb: String,
    pub state: String,
    pub technology_type: Technology,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub incident_time: DateTime<Utc>,
    pub duration_hours: f64,
    /// Unset while the incident is open
    pub resolution_time: Option<DateTime<Utc>>,
    pub customers_affected: u32,
    pub root_cause: String,
    pub status: IncidentStatus,
}

/// Binomial(slots, retention) incidents per POI, slots numbered from 1
pub fn generate_incidents(
    ctx: &StageContext<'_>,
    pois: &[PoiInfrastructure],
) -> GeneratorResult<Vec<Incident>> {
    require_rows(STAGE, infrastructure::TABLE_NAME, pois)?;
    let slots = ctx.config.incident_slots;

    let rows: Vec<Incident> = pois
        .par_iter()
        .flat_map_iter(|poi| (1..=slots).filter_map(move |slot| draw_incident(ctx, poi, slot)))
        .collect();

    let open = rows
        .iter()
        .filter(|i| i.status == IncidentStatus::Open)
        .count();
    info!(
        "Generated {} incidents ({} open) from {} candidate slots",
        rows.len(),
        open,
        pois.len() as u64 * u64::from(slots)
    );
    Ok(rows)
}

fn draw_incident(ctx: &StageContext<'_>, poi: &PoiInfrastructure, slot: u32) -> Option<Incident> {
    let mut rng = ctx
        .random
        .stream(STAGE, &format!("{}:{}", poi.poi_id, slot));
    if !rng.gen_bool(ctx.config.incident_retention) {
        return None;
    }

    let incident_type = IncidentType::draw(&mut rng);
    let lookback_minutes = i64::from(ctx.config.incident_lookback_days) * 24 * 60;
    let incident_time = ctx.as_of - Duration::minutes(rng.gen_range(0..lookback_minutes));

    let (lo, hi) = incident_type.duration_range_hours();
    let duration_hours = round_to(rng.gen_range(lo..=hi), 1);
    let customers_affected = rng.gen_range(CUSTOMERS_AFFECTED);

    let recent = ctx.as_of - incident_time <= Duration::days(OPEN_WINDOW_DAYS);
    let status = if recent && rng.gen_bool(OPEN_PROBABILITY) {
        IncidentStatus::Open
    } else {
        IncidentStatus::Resolved
    };
    let resolution_time = match status {
        IncidentStatus::Open => None,
        IncidentStatus::Resolved => {
            Some(incident_time + Duration::seconds((duration_hours * 3600.0).round() as i64))
        }
    };

    Some(Incident {
        incident_id: ids::incident_id(&poi.poi_id, slot),
        poi_id: poi.poi_id.clone(),
        suburb: poi.suburb.clone(),
        state: poi.state.clone(),
        technology_type: poi.technology_type,
        incident_type,
        severity: incident_type.severity(),
        incident_time,
        duration_hours,
        resolution_time,
        customers_affected,
        root_cause: incident_type.root_cause().to_string(),
        status,
    })
}
