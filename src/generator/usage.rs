//! Daily consumption per sampled customer (`customer_usage`)

use super::customers::{self, Customer};
use super::util::{day_of_week, is_weekend, round_to};
use super::{require_rows, GeneratorResult, StageContext};
use crate::random::RandomSource;
use chrono::{Duration, NaiveDate};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const TABLE_NAME: &str = "customer_usage";
const STAGE: &str = "usage";
const SAMPLE_STAGE: &str = "usage.sample";

const WEEKEND_MULTIPLIER: (f64, f64) = (1.3, 1.6);
const UPLOAD_SHARE: (f64, f64) = (0.10, 0.25);
const PEAK_HOUR_USAGE_PCT: (f64, f64) = (40.0, 75.0);
const STREAMING_HOURS: f64 = 8.0;
const GAMING_HOURS: f64 = 4.0;
const WFH_HOURS_WEEKDAY: f64 = 8.0;
const WFH_HOURS_WEEKEND: f64 = 2.0;
/// Achieved speed as a share of the advertised plan speed
const SPEED_ACHIEVEMENT: (f64, f64) = (0.70, 0.98);

/// One customer-day of consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub customer_id: String,
    pub poi_id: String,
    pub usage_date: NaiveDate,
    pub day_of_week: u32,
    pub download_gb: f64,
    pub upload_gb: f64,
    pub peak_hour_usage_pct: f64,
    pub streaming_hours: f64,
    pub gaming_hours: f64,
    pub work_from_home_hours: f64,
    pub avg_achieved_download_mbps: f64,
    pub download_speed_mbps: u32,
    pub speed_achievement_pct: f64,
}

impl UsageRecord {
    /// Achieved speed as a percentage of the advertised one, 1 dp
    pub fn speed_achievement(achieved_mbps: f64, advertised_mbps: u32) -> f64 {
        if advertised_mbps == 0 {
            return 0.0;
        }
        round_to(achieved_mbps / f64::from(advertised_mbps) * 100.0, 1)
    }
}

/// Active customers kept by the usage sample.
///
/// The sample has its own seed so the sampled population stays put when
/// the run seed changes.
pub fn sample_customers<'a>(ctx: &StageContext<'_>, customers: &'a [Customer]) -> Vec<&'a Customer> {
    let sampler = RandomSource::seeded(ctx.config.usage_sample_seed);
    let fraction = ctx.config.usage_sample_fraction;
    customers
        .iter()
        .filter(|c| c.is_active)
        .filter(|c| sampler.stream(SAMPLE_STAGE, &c.customer_id).gen_bool(fraction))
        .collect()
}

pub fn generate_usage(
    ctx: &StageContext<'_>,
    customers: &[Customer],
) -> GeneratorResult<Vec<UsageRecord>> {
    require_rows(STAGE, customers::TABLE_NAME, customers)?;

    let sample = sample_customers(ctx, customers);
    if sample.is_empty() {
        warn!(
            "Usage sample is empty ({} customers, fraction {})",
            customers.len(),
            ctx.config.usage_sample_fraction
        );
        return Ok(Vec::new());
    }

    let today = ctx.as_of.date_naive();
    let days = ctx.config.usage_days;
    let rows: Vec<UsageRecord> = sample
        .par_iter()
        .flat_map_iter(|customer| usage_for_customer(ctx, customer, today, days))
        .collect();

    info!(
        "Generated {} usage records for {} sampled customers over {} days",
        rows.len(),
        sample.len(),
        days
    );
    Ok(rows)
}

fn usage_for_customer(
    ctx: &StageContext<'_>,
    customer: &Customer,
    today: NaiveDate,
    days: u32,
) -> Vec<UsageRecord> {
    let mut rng = ctx.random.stream(STAGE, &customer.customer_id);
    let (download_lo, download_hi) = customer.plan_tier.daily_download_gb_range();
    let advertised = customer.download_speed_mbps;

    (0..days)
        .map(|offset| {
            let usage_date = today - Duration::days(i64::from(offset));
            let weekend = is_weekend(usage_date);

            let mut download = rng.gen_range(download_lo..=download_hi);
            if weekend {
                download *= rng.gen_range(WEEKEND_MULTIPLIER.0..=WEEKEND_MULTIPLIER.1);
            }
            let download_gb = round_to(download, 2);
            let upload_gb = round_to(download_gb * rng.gen_range(UPLOAD_SHARE.0..=UPLOAD_SHARE.1), 2);

            let wfh_max = if weekend {
                WFH_HOURS_WEEKEND
            } else {
                WFH_HOURS_WEEKDAY
            };
            let avg_achieved_download_mbps = round_to(
                f64::from(advertised) * rng.gen_range(SPEED_ACHIEVEMENT.0..=SPEED_ACHIEVEMENT.1),
                1,
            );

            UsageRecord {
                customer_id: customer.customer_id.clone(),
                poi_id: customer.poi_id.clone(),
                usage_date,
                day_of_week: day_of_week(usage_date),
                download_gb,
                upload_gb,
                peak_hour_usage_pct: round_to(
                    rng.gen_range(PEAK_HOUR_USAGE_PCT.0..=PEAK_HOUR_USAGE_PCT.1),
                    1,
                ),
                streaming_hours: round_to(rng.gen_range(0.0..=STREAMING_HOURS), 1),
                gaming_hours: round_to(rng.gen_range(0.0..=GAMING_HOURS), 1),
                work_from_home_hours: round_to(rng.gen_range(0.0..=wfh_max), 1),
                avg_achieved_download_mbps,
                download_speed_mbps: advertised,
                speed_achievement_pct: UsageRecord::speed_achievement(
                    avg_achieved_download_mbps,
                    advertised,
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_locations;
    use crate::generator::customers::generate_customers;
    use crate::generator::infrastructure::generate_infrastructure;
    use crate::generator::premises::generate_premises;
    use crate::generator::test_support::{test_config, test_generator};
    use crate::generator::{Generator, GeneratorError};
    use std::collections::{HashMap, HashSet};

    fn customers_for(generator: &Generator) -> Vec<Customer> {
        let ctx = generator.context();
        let pois = generate_infrastructure(&ctx, &builtin_locations()).unwrap();
        let premises = generate_premises(&ctx, &pois).unwrap();
        generate_customers(&ctx, &premises).unwrap()
    }

    #[test]
    fn test_sample_is_active_and_roughly_thirty_percent() {
        let generator = test_generator();
        let customers = customers_for(&generator);
        let sample = sample_customers(&generator.context(), &customers);

        assert!(sample.iter().all(|c| c.is_active));
        let active = customers.iter().filter(|c| c.is_active).count() as f64;
        let share = sample.len() as f64 / active;
        assert!((share - 0.3).abs() < 0.03, "sample share {}", share);
    }

    #[test]
    fn test_sample_ignores_run_seed() {
        let generator = test_generator();
        let customers = customers_for(&generator);
        let reseeded = Generator::with_random(test_config(), RandomSource::seeded(1234)).unwrap();

        let a: Vec<_> = sample_customers(&generator.context(), &customers)
            .iter()
            .map(|c| c.customer_id.clone())
            .collect();
        let b: Vec<_> = sample_customers(&reseeded.context(), &customers)
            .iter()
            .map(|c| c.customer_id.clone())
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_usage_rows_per_customer_and_dates() {
        let generator = test_generator();
        let customers = customers_for(&generator);
        let usage = generate_usage(&generator.context(), &customers).unwrap();
        let sampled: HashSet<_> = usage.iter().map(|u| &u.customer_id).collect();

        let days = generator.config().usage_days as usize;
        assert_eq!(usage.len(), sampled.len() * days);

        let today = generator.as_of().date_naive();
        for record in &usage {
            let age = (today - record.usage_date).num_days();
            assert!((0..days as i64).contains(&age));
            assert_eq!(record.day_of_week, day_of_week(record.usage_date));
        }
    }

    #[test]
    fn test_speed_achievement_is_derived() {
        let generator = test_generator();
        let customers = customers_for(&generator);
        let usage = generate_usage(&generator.context(), &customers).unwrap();

        for record in &usage {
            let expected = round_to(
                record.avg_achieved_download_mbps / f64::from(record.download_speed_mbps) * 100.0,
                1,
            );
            assert_eq!(record.speed_achievement_pct, expected);
            assert!(record.speed_achievement_pct >= 69.5 && record.speed_achievement_pct <= 98.5);
            assert!(record.upload_gb <= record.download_gb * 0.25 + 0.01);
            if matches!(record.day_of_week, 1 | 7) {
                assert!(record.work_from_home_hours <= 2.0);
            }
        }
    }

    #[test]
    fn test_download_follows_plan_tier() {
        let generator = test_generator();
        let customers = customers_for(&generator);
        let usage = generate_usage(&generator.context(), &customers).unwrap();

        let by_id: HashMap<_, _> = customers.iter().map(|c| (&c.customer_id, c)).collect();
        for record in usage.iter().filter(|r| !matches!(r.day_of_week, 1 | 7)) {
            let (lo, hi) = by_id[&record.customer_id].plan_tier.daily_download_gb_range();
            assert!(record.download_gb >= lo - 0.005 && record.download_gb <= hi + 0.005);
        }
    }

    #[test]
    fn test_weekend_download_scaled_up() {
        let generator = test_generator();
        let customers = customers_for(&generator);
        let usage = generate_usage(&generator.context(), &customers).unwrap();

        let by_id: HashMap<_, _> = customers.iter().map(|c| (&c.customer_id, c)).collect();
        let weekend: Vec<_> = usage.iter().filter(|r| is_weekend(r.usage_date)).collect();
        assert!(!weekend.is_empty());
        for record in weekend {
            let (lo, hi) = by_id[&record.customer_id].plan_tier.daily_download_gb_range();
            let (min, max) = (lo * WEEKEND_MULTIPLIER.0, hi * WEEKEND_MULTIPLIER.1);
            assert!(
                record.download_gb >= min - 0.005 && record.download_gb <= max + 0.005,
                "{} GB outside [{}, {}]",
                record.download_gb,
                min,
                max
            );
        }

        // 1.3..1.6 lifts the weekend mean over the weekday one
        let mean = |weekend: bool| {
            let values: Vec<f64> = usage
                .iter()
                .filter(|r| is_weekend(r.usage_date) == weekend)
                .map(|r| r.download_gb / by_id[&r.customer_id].plan_tier.daily_download_gb_range().1)
                .collect();
            values.iter().sum::<f64>() / values.len() as f64
        };
        assert!(mean(true) > mean(false) * 1.2);
    }

    #[test]
    fn test_empty_sample_is_not_an_error() {
        let mut config = test_config();
        config.usage_sample_fraction = 0.0;
        let generator = Generator::with_random(config, RandomSource::seeded(42)).unwrap();
        let customers = customers_for(&generator);
        assert!(generate_usage(&generator.context(), &customers).unwrap().is_empty());
    }

    #[test]
    fn test_no_customers_is_missing_dependency() {
        let generator = test_generator();
        let err = generate_usage(&generator.context(), &[]).unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::MissingDependency { table: "customers", .. }
        ));
    }
}
