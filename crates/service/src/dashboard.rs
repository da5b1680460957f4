//! Cross-entity summary statistics.
//!
//! Calendar boundaries are UTC: the month starts on the 1st at 00:00, the
//! week on Monday at 00:00 (ISO 8601).

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveEnum, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use serde::Serialize;

use models::activity::{self, ActivityType};
use models::customer::{self, CustomerStatus};
use models::lead::{self, LeadStatus};
use models::opportunity::{self, OpportunityStage};

use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub customers: CustomerStats,
    pub leads: LeadStats,
    pub opportunities: OpportunityStats,
    pub activities: ActivityStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total: u64,
    pub active: u64,
    pub new_this_month: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeadStats {
    pub total: u64,
    pub new: u64,
    pub contacted: u64,
    pub qualified: u64,
    pub converted: u64,
    pub lost: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityStats {
    pub total: u64,
    pub by_stage: BTreeMap<String, u64>,
    /// Sum of `value` over stages other than closed_won / closed_lost.
    pub total_value: f64,
    /// Sum of `value * probability / 100` over the same open subset.
    pub weighted_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub total: u64,
    pub this_week: u64,
    pub by_type: BTreeMap<String, u64>,
}

pub fn month_start(now: DateTime<Utc>) -> DateTimeWithTimeZone {
    let day = now.date_naive() - Duration::days(i64::from(now.day0()));
    day.and_time(NaiveTime::MIN).and_utc().fixed_offset()
}

pub fn week_start(now: DateTime<Utc>) -> DateTimeWithTimeZone {
    let day = now.date_naive() - Duration::days(i64::from(now.weekday().num_days_from_monday()));
    day.and_time(NaiveTime::MIN).and_utc().fixed_offset()
}

/// `(value, count)` pairs for a GROUP BY on one string column.
async fn grouped_counts<E, C>(db: &DatabaseConnection, col: C) -> Result<Vec<(String, i64)>, DbErr>
where
    E: EntityTrait,
    C: ColumnTrait + Copy,
{
    E::find()
        .select_only()
        .column(col)
        .column_as(col.count(), "count")
        .group_by(col)
        .into_tuple::<(String, i64)>()
        .all(db)
        .await
}

fn seeded<E: ActiveEnum<Value = String>>() -> BTreeMap<String, u64> {
    E::values().into_iter().map(|v| (v, 0)).collect()
}

fn fill(mut map: BTreeMap<String, u64>, rows: Vec<(String, i64)>) -> BTreeMap<String, u64> {
    for (key, n) in rows {
        *map.entry(key).or_default() += n.max(0) as u64;
    }
    map
}

fn lead_stats(rows: Vec<(String, i64)>) -> LeadStats {
    let mut stats = LeadStats::default();
    for (status, n) in rows {
        let n = n.max(0) as u64;
        stats.total += n;
        match LeadStatus::try_from_value(&status) {
            Ok(LeadStatus::New) => stats.new += n,
            Ok(LeadStatus::Contacted) => stats.contacted += n,
            Ok(LeadStatus::Qualified) => stats.qualified += n,
            Ok(LeadStatus::Converted) => stats.converted += n,
            Ok(LeadStatus::Lost) => stats.lost += n,
            Err(_) => {}
        }
    }
    stats
}

fn pipeline_value(open: &[(f64, i32)]) -> (f64, f64) {
    open.iter().fold((0.0, 0.0), |(total, weighted), (value, probability)| {
        (total + value, weighted + value * f64::from(*probability) / 100.0)
    })
}

pub async fn get_stats(db: &DatabaseConnection) -> Result<DashboardStats, ServiceError> {
    get_stats_at(db, Utc::now()).await
}

pub async fn get_stats_at(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<DashboardStats, ServiceError> {
    let month = month_start(now);
    let week = week_start(now);

    let (
        customers_total,
        customers_active,
        customers_new,
        leads_by_status,
        opps_by_stage,
        open_opps,
        activities_total,
        activities_week,
        activities_by_type,
    ) = tokio::try_join!(
        customer::Entity::find().count(db),
        customer::Entity::find().filter(customer::Column::Status.eq(CustomerStatus::Active)).count(db),
        customer::Entity::find().filter(customer::Column::CreatedAt.gte(month)).count(db),
        grouped_counts::<lead::Entity, _>(db, lead::Column::Status),
        grouped_counts::<opportunity::Entity, _>(db, opportunity::Column::Stage),
        opportunity::Entity::find()
            .select_only()
            .column(opportunity::Column::Value)
            .column(opportunity::Column::Probability)
            .filter(opportunity::Column::Stage.is_not_in(OpportunityStage::CLOSED))
            .into_tuple::<(f64, i32)>()
            .all(db),
        activity::Entity::find().count(db),
        activity::Entity::find().filter(activity::Column::ActivityDate.gte(week)).count(db),
        grouped_counts::<activity::Entity, _>(db, activity::Column::ActivityType),
    )?;

    let opportunities_total: u64 = opps_by_stage.iter().map(|(_, n)| (*n).max(0) as u64).sum();
    let (total_value, weighted_value) = pipeline_value(&open_opps);

    Ok(DashboardStats {
        customers: CustomerStats { total: customers_total, active: customers_active, new_this_month: customers_new },
        leads: lead_stats(leads_by_status),
        opportunities: OpportunityStats {
            total: opportunities_total,
            by_stage: fill(seeded::<OpportunityStage>(), opps_by_stage),
            total_value,
            weighted_value,
        },
        activities: ActivityStats {
            total: activities_total,
            this_week: activities_week,
            by_type: fill(seeded::<ActivityType>(), activities_by_type),
        },
    })
}
