//! Capacity projections per POI (`capacity_forecasts`)
//!
//! The current peak is the mean utilisation over the evening window
//! (hours 18 to 21) of the most recent telemetry days. Each POI draws one
//! monthly growth rate and projects it linearly over the horizon.

use super::infrastructure::{self, PoiInfrastructure};
use super::telemetry::{self, TelemetrySample};
use super::util::round_to;
use super::{require_rows, GeneratorError, GeneratorResult, StageContext};
use crate::catalog::{is_high_growth_suburb, Technology};
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use rand::Rng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

pub const TABLE_NAME: &str = "capacity_forecasts";
const STAGE: &str = "forecasts";

pub const MODEL_VERSION: &str = "capacity_forecast_v2.3";
pub const EVENING_PEAK_HOURS: std::ops::RangeInclusive<u32> = 18..=21;
const MAX_PROJECTED_PCT: f64 = 99.0;
const UPGRADE_THRESHOLD_PCT: f64 = 80.0;
const HIGH_GROWTH_RANGE: (f64, f64) = (0.025, 0.04);
const CONFIDENCE_RANGE: (f64, f64) = (0.75, 0.95);

/// Four-way risk classification of a projected utilisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub fn classify(projected_pct: f64) -> Self {
        if projected_pct > 90.0 {
            RiskTier::Critical
        } else if projected_pct > 80.0 {
            RiskTier::High
        } else if projected_pct > 70.0 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
            RiskTier::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn upgrade_recommended(projected_pct: f64) -> bool {
    projected_pct > UPGRADE_THRESHOLD_PCT
}

/// One POI's projection for one month ahead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityForecast {
    pub poi_id: String,
    pub suburb: String,
    pub city: String,
    pub state: String,
    pub technology_type: Technology,
    pub forecast_date: NaiveDate,
    pub months_ahead: u32,
    pub current_peak_utilization_pct: f64,
    pub current_max_utilization_pct: f64,
    pub projected_utilization_pct: f64,
    pub capacity_headroom_pct: f64,
    pub projected_premises: u64,
    pub risk_score: RiskTier,
    pub upgrade_recommended: bool,
    pub estimated_upgrade_cost_aud: u64,
    pub confidence_score: f64,
    pub model_version: String,
}

/// Evening-peak utilisation of one POI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakProfile {
    pub mean_pct: f64,
    pub max_pct: f64,
}

#[derive(Default)]
struct PeakAccumulator {
    sum: f64,
    count: usize,
    max: f64,
}

/// Mean and max evening-peak utilisation per POI over samples at or after `since`
pub fn evening_peak_profile(
    samples: &[TelemetrySample],
    since: DateTime<Utc>,
) -> FxHashMap<&str, PeakProfile> {
    let mut accumulators: FxHashMap<&str, PeakAccumulator> = FxHashMap::default();
    for sample in samples
        .iter()
        .filter(|s| s.timestamp >= since && EVENING_PEAK_HOURS.contains(&s.hour))
    {
        let acc = accumulators.entry(sample.poi_id.as_str()).or_default();
        acc.sum += sample.utilization_pct;
        acc.count += 1;
        acc.max = acc.max.max(sample.utilization_pct);
    }

    accumulators
        .into_iter()
        .map(|(poi_id, acc)| {
            let profile = PeakProfile {
                mean_pct: acc.sum / acc.count as f64,
                max_pct: acc.max,
            };
            (poi_id, profile)
        })
        .collect()
}

/// Monthly growth range: named growth corridors first, then technology
pub fn monthly_growth_range(poi: &PoiInfrastructure) -> (f64, f64) {
    if is_high_growth_suburb(&poi.suburb) {
        HIGH_GROWTH_RANGE
    } else {
        poi.technology_type.monthly_growth_range()
    }
}

pub fn generate_forecasts(
    ctx: &StageContext<'_>,
    pois: &[PoiInfrastructure],
    telemetry_rows: &[TelemetrySample],
) -> GeneratorResult<Vec<CapacityForecast>> {
    require_rows(STAGE, infrastructure::TABLE_NAME, pois)?;
    require_rows(STAGE, telemetry::TABLE_NAME, telemetry_rows)?;

    let since = ctx.as_of - Duration::days(i64::from(ctx.config.forecast_window_days));
    let peaks = evening_peak_profile(telemetry_rows, since);
    debug!("Evening peak profiles for {} POIs since {}", peaks.len(), since);

    let per_poi: Vec<Vec<CapacityForecast>> = pois
        .par_iter()
        .map(|poi| {
            let peak = peaks.get(poi.poi_id.as_str()).copied().ok_or_else(|| {
                GeneratorError::MissingUpstreamRow {
                    stage: STAGE,
                    table: telemetry::TABLE_NAME,
                    key: poi.poi_id.clone(),
                }
            })?;
            Ok(forecasts_for_poi(ctx, poi, peak))
        })
        .collect::<GeneratorResult<_>>()?;

    let rows: Vec<CapacityForecast> = per_poi.into_iter().flatten().collect();
    let upgrades = rows.iter().filter(|f| f.upgrade_recommended).count();
    info!(
        "Generated {} capacity forecasts ({} recommend an upgrade)",
        rows.len(),
        upgrades
    );
    Ok(rows)
}

fn forecasts_for_poi(
    ctx: &StageContext<'_>,
    poi: &PoiInfrastructure,
    peak: PeakProfile,
) -> Vec<CapacityForecast> {
    let mut rng = ctx.random.stream(STAGE, &poi.poi_id);
    let (growth_lo, growth_hi) = monthly_growth_range(poi);
    let growth = rng.gen_range(growth_lo..=growth_hi);
    let (cost_lo, cost_hi) = poi.technology_type.upgrade_cost_range_aud();
    let today = ctx.as_of.date_naive();

    (1..=ctx.config.forecast_months)
        .map(|months_ahead| {
            let factor = 1.0 + growth * f64::from(months_ahead);
            let projected = round_to((peak.mean_pct * factor).min(MAX_PROJECTED_PCT), 1);
            let upgrade = upgrade_recommended(projected);
            let estimated_upgrade_cost_aud = if upgrade {
                rng.gen_range(cost_lo..cost_hi) as u64
            } else {
                0
            };

            CapacityForecast {
                poi_id: poi.poi_id.clone(),
                suburb: poi.suburb.clone(),
                city: poi.city.clone(),
                state: poi.state.clone(),
                technology_type: poi.technology_type,
                forecast_date: today + Months::new(months_ahead),
                months_ahead,
                current_peak_utilization_pct: round_to(peak.mean_pct, 1),
                current_max_utilization_pct: round_to(peak.max_pct, 1),
                projected_utilization_pct: projected,
                capacity_headroom_pct: round_to((100.0 - projected).max(0.0), 1),
                projected_premises: (f64::from(poi.premises_served) * factor) as u64,
                risk_score: RiskTier::classify(projected),
                upgrade_recommended: upgrade,
                estimated_upgrade_cost_aud,
                confidence_score: round_to(
                    rng.gen_range(CONFIDENCE_RANGE.0..=CONFIDENCE_RANGE.1),
                    2,
                ),
                model_version: MODEL_VERSION.to_string(),
            }
        })
        .collect()
}
