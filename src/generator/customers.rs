//! Subscriber accounts (`customers`)

use super::premises::{self, Premise};
use super::util::round_to;
use super::{ids, require_rows, GeneratorResult, StageContext};
use crate::catalog::{PlanTier, PremiseType, Technology};
use chrono::{Duration, NaiveDate};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const TABLE_NAME: &str = "customers";
const STAGE: &str = "customers";

/// Contracts run 365..=730 days from account creation
const CONTRACT_LENGTH_DAYS: std::ops::RangeInclusive<i64> = 365..=730;
const ACTIVE_PROBABILITY: f64 = 0.95;
const MAX_ACTIVE_CHURN_RISK: f64 = 0.6;
const INACTIVE_CHURN_RISK: f64 = 1.0;

/// A subscriber account on a connected premise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub premise_id: String,
    pub poi_id: String,
    pub technology_type: Technology,
    pub premise_type: PremiseType,
    pub plan_tier: PlanTier,
    pub download_speed_mbps: u32,
    pub upload_speed_mbps: u32,
    pub monthly_price: f64,
    pub account_created_date: NaiveDate,
    pub contract_end_date: NaiveDate,
    pub is_active: bool,
    pub churn_risk_score: f64,
}

/// One customer per connected premise
pub fn generate_customers(
    ctx: &StageContext<'_>,
    premises: &[Premise],
) -> GeneratorResult<Vec<Customer>> {
    require_rows(STAGE, premises::TABLE_NAME, premises)?;

    let rows: Vec<Customer> = premises
        .par_iter()
        .filter_map(|premise| {
            let created = premise.connection_date.filter(|_| premise.is_connected)?;
            Some(build_customer(ctx, premise, created))
        })
        .collect();

    require_rows(STAGE, premises::TABLE_NAME, &rows)?;

    let active = rows.iter().filter(|c| c.is_active).count();
    info!("Generated {} customers ({} active)", rows.len(), active);
    Ok(rows)
}

fn build_customer(ctx: &StageContext<'_>, premise: &Premise, created: NaiveDate) -> Customer {
    let customer_id = ids::customer_id(&premise.premise_id);
    let mut rng = ctx.random.stream(STAGE, &customer_id);

    let plan_tier = PlanTier::draw(premise.premise_type, &mut rng);
    let plan = plan_tier.spec();
    let contract_end_date = created + Duration::days(rng.gen_range(CONTRACT_LENGTH_DAYS));
    let is_active = rng.gen_bool(ACTIVE_PROBABILITY);
    let churn_risk_score = if is_active {
        round_to(rng.gen_range(0.0..=MAX_ACTIVE_CHURN_RISK), 2)
    } else {
        INACTIVE_CHURN_RISK
    };

    Customer {
        customer_id,
        premise_id: premise.premise_id.clone(),
        poi_id: premise.poi_id.clone(),
        technology_type: premise.technology_type,
        premise_type: premise.premise_type,
        plan_tier,
        download_speed_mbps: plan.download_mbps,
        upload_speed_mbps: plan.upload_mbps,
        monthly_price: plan.monthly_price,
        account_created_date: created,
        contract_end_date,
        is_active,
        churn_risk_score,
    }
}
