//! Hourly POI measurements (`network_telemetry`)
//!
//! Utilisation per hour is
//! `base(poi) * peak(hour) * weekend(day) + noise`, clamped to
//! [`MIN_UTILIZATION`, `MAX_UTILIZATION`]. The base is the POI's
//! personality for the run: drawn once per POI and shared by all its hours.
//! Every banded column is derived from the stored, rounded percentage so
//! the columns of one row always agree with each other.

use super::infrastructure::{self, PoiInfrastructure};
use super::util::{day_of_week, is_weekend, round_to};
use super::{require_rows, GeneratorResult, StageContext};
use crate::catalog::Technology;
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use rand::Rng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

pub const TABLE_NAME: &str = "network_telemetry";
const STAGE: &str = "telemetry";
const PROFILE_STAGE: &str = "telemetry.profile";

pub const MIN_UTILIZATION: f64 = 0.15;
pub const MAX_UTILIZATION: f64 = 0.98;
const NOISE: f64 = 0.05;
const WEEKEND_FACTOR: (f64, f64) = (0.85, 0.95);
const CONNECTION_SHARE: (f64, f64) = (0.3, 0.5);

/// Congestion tier of one telemetry sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CongestionStatus {
    Normal,
    Warning,
    Critical,
}

impl CongestionStatus {
    pub const WARNING_THRESHOLD_PCT: f64 = 70.0;
    pub const CRITICAL_THRESHOLD_PCT: f64 = 85.0;

    pub fn classify(utilization_pct: f64) -> Self {
        if utilization_pct > Self::CRITICAL_THRESHOLD_PCT {
            CongestionStatus::Critical
        } else if utilization_pct > Self::WARNING_THRESHOLD_PCT {
            CongestionStatus::Warning
        } else {
            CongestionStatus::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionStatus::Normal => "Normal",
            CongestionStatus::Warning => "Warning",
            CongestionStatus::Critical => "Critical",
        }
    }
}

impl fmt::Display for CongestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One hourly measurement at a POI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub poi_id: String,
    pub suburb: String,
    pub state: String,
    pub technology_type: Technology,
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
    pub hour: u32,
    pub day_of_week: u32,
    pub utilization_pct: f64,
    pub current_throughput_gbps: f64,
    pub max_capacity_gbps: u32,
    pub active_connections: u64,
    pub avg_latency_ms: f64,
    pub packet_loss_pct: f64,
    pub congestion_status: CongestionStatus,
    pub avg_download_speed_pct: f64,
}

/// Demand multiplier range for an hour of the day
pub fn peak_multiplier_range(hour: u32) -> (f64, f64) {
    match hour {
        18..=21 => (1.4, 1.6),
        12..=14 => (1.15, 1.25),
        9..=17 => (1.1, 1.2),
        6..=8 => (1.2, 1.3),
        _ => (0.6, 0.8),
    }
}

fn latency_range_ms(utilization_pct: f64) -> (f64, f64) {
    if utilization_pct > 85.0 {
        (25.0, 55.0)
    } else if utilization_pct > 70.0 {
        (15.0, 30.0)
    } else {
        (8.0, 18.0)
    }
}

fn packet_loss_range_pct(utilization_pct: f64) -> (f64, f64) {
    if utilization_pct > 90.0 {
        (0.5, 2.0)
    } else if utilization_pct > 80.0 {
        (0.1, 0.5)
    } else {
        (0.0, 0.1)
    }
}

/// Share of plan speed customers see at this utilisation
fn download_speed_range_pct(utilization_pct: f64) -> (f64, f64) {
    if utilization_pct > 90.0 {
        (50.0, 70.0)
    } else if utilization_pct > 80.0 {
        (65.0, 80.0)
    } else if utilization_pct > 70.0 {
        (75.0, 90.0)
    } else {
        (85.0, 100.0)
    }
}

fn draw<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    rng.gen_range(lo..=hi)
}

/// Per-POI baseline utilisation, keyed by POI id
pub fn utilization_profiles<'a>(
    ctx: &StageContext<'_>,
    pois: &'a [PoiInfrastructure],
) -> FxHashMap<&'a str, f64> {
    pois.iter()
        .map(|poi| {
            let mut rng = ctx.random.stream(PROFILE_STAGE, &poi.poi_id);
            let base = draw(&mut rng, poi.technology_type.base_utilization_range());
            (poi.poi_id.as_str(), base)
        })
        .collect()
}

pub fn generate_telemetry(
    ctx: &StageContext<'_>,
    pois: &[PoiInfrastructure],
) -> GeneratorResult<Vec<TelemetrySample>> {
    require_rows(STAGE, infrastructure::TABLE_NAME, pois)?;

    let profiles = utilization_profiles(ctx, pois);
    let hours = i64::from(ctx.config.telemetry_days) * 24;
    let start = ctx.as_of - Duration::hours(hours);
    debug!("Telemetry window {} .. {}", start, ctx.as_of);

    let rows: Vec<TelemetrySample> = pois
        .par_iter()
        .flat_map_iter(|poi| {
            let base = profiles
                .get(poi.poi_id.as_str())
                .copied()
                .unwrap_or(MIN_UTILIZATION);
            samples_for_poi(ctx, poi, base, start, hours)
        })
        .collect();

    let critical = rows
        .iter()
        .filter(|r| r.congestion_status == CongestionStatus::Critical)
        .count();
    info!(
        "Generated {} telemetry samples ({} critical) for {} POIs",
        rows.len(),
        critical,
        pois.len()
    );
    Ok(rows)
}

fn samples_for_poi(
    ctx: &StageContext<'_>,
    poi: &PoiInfrastructure,
    base: f64,
    start: DateTime<Utc>,
    hours: i64,
) -> Vec<TelemetrySample> {
    let mut rng = ctx.random.stream(STAGE, &poi.poi_id);

    (0..hours)
        .map(|offset| {
            let timestamp = start + Duration::hours(offset);
            let date = timestamp.date_naive();
            let hour = timestamp.hour();

            let mut utilization = base * draw(&mut rng, peak_multiplier_range(hour));
            if is_weekend(date) {
                utilization *= draw(&mut rng, WEEKEND_FACTOR);
            }
            utilization += rng.gen_range(-NOISE..=NOISE);
            let utilization = utilization.clamp(MIN_UTILIZATION, MAX_UTILIZATION);
            let utilization_pct = round_to(utilization * 100.0, 1);

            let active_connections = (f64::from(poi.premises_served)
                * utilization
                * draw(&mut rng, CONNECTION_SHARE)) as u64;

            TelemetrySample {
                poi_id: poi.poi_id.clone(),
                suburb: poi.suburb.clone(),
                state: poi.state.clone(),
                technology_type: poi.technology_type,
                timestamp,
                date,
                hour,
                day_of_week: day_of_week(date),
                utilization_pct,
                current_throughput_gbps: round_to(
                    f64::from(poi.max_capacity_gbps) * utilization,
                    2,
                ),
                max_capacity_gbps: poi.max_capacity_gbps,
                active_connections,
                avg_latency_ms: round_to(draw(&mut rng, latency_range_ms(utilization_pct)), 1),
                packet_loss_pct: round_to(
                    draw(&mut rng, packet_loss_range_pct(utilization_pct)),
                    3,
                ),
                congestion_status: CongestionStatus::classify(utilization_pct),
                avg_download_speed_pct: round_to(
                    draw(&mut rng, download_speed_range_pct(utilization_pct)),
                    1,
                ),
            }
        })
        .collect()
}
