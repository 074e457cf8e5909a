//! Per-cluster aggregate profiles and their generated descriptions.

use liga_core::error::{LigaError, LigaResult};
use liga_core::types::UserRecord;
use liga_features::encoder::GENDER_TABLE;
use liga_features::EncodedUser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many entries the "top" lists (cities, conditions) keep.
const TOP_ENTRIES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub size: usize,
    /// Share of the population, percent, one decimal.
    pub percentage: f64,
    pub demographics: DemographicAggregates,
    pub health_metrics: HealthAggregates,
    pub activity_metrics: ActivityAggregates,
    pub insurance_distribution: BTreeMap<String, usize>,
    pub traits: ClusterTraits,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemographicAggregates {
    pub avg_age: f64,
    pub gender_distribution: BTreeMap<String, usize>,
    pub fitness_level_distribution: BTreeMap<String, usize>,
    pub top_cities: Vec<ValueCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthAggregates {
    pub avg_bmi: f64,
    pub avg_resting_hr: f64,
    pub medical_conditions: Vec<ValueCount>,
    pub avg_sleep_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityAggregates {
    pub avg_steps: i64,
    pub avg_calories: i64,
    pub avg_active_minutes: i64,
    pub avg_exercise_sessions: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Unrounded cluster means consumed by the recommendation rule table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterTraits {
    pub mean_fitness_code: f64,
    pub mean_age: f64,
    pub medical_condition_rate: f64,
    pub mean_calories_burned: f64,
}

pub struct ClusterSummarizer;

impl ClusterSummarizer {
    /// Summarize each of the `k` clusters. `records`, `encoded` and `labels`
    /// are aligned by position.
    pub fn summarize(
        records: &[UserRecord],
        encoded: &[EncodedUser],
        labels: &[usize],
        k: usize,
    ) -> LigaResult<Vec<ClusterSummary>> {
        if records.len() != encoded.len() || records.len() != labels.len() {
            return Err(LigaError::InvalidInput(format!(
                "{} records, {} encoded users and {} labels do not line up",
                records.len(),
                encoded.len(),
                labels.len()
            )));
        }
        if let Some(&label) = labels.iter().find(|&&l| l >= k) {
            return Err(LigaError::InvalidInput(format!(
                "label {label} outside 0..{k}"
            )));
        }

        let total = records.len();
        Ok((0..k)
            .map(|cluster_id| {
                let members: Vec<usize> = (0..total).filter(|&i| labels[i] == cluster_id).collect();
                let rs: Vec<&UserRecord> = members.iter().map(|&i| &records[i]).collect();
                let es: Vec<&EncodedUser> = members.iter().map(|&i| &encoded[i]).collect();
                summarize_cluster(cluster_id, &rs, &es, total)
            })
            .collect())
    }
}

fn summarize_cluster(
    cluster_id: usize,
    records: &[&UserRecord],
    encoded: &[&EncodedUser],
    total: usize,
) -> ClusterSummary {
    let size = records.len();
    let percentage = if total > 0 {
        round1(size as f64 / total as f64 * 100.0)
    } else {
        0.0
    };

    let mean_age = mean_present(records.iter().map(|r| r.demographics.age));
    let mean_calories = mean_present(records.iter().map(|r| r.activity.total_calories_burned));

    let demographics = DemographicAggregates {
        avg_age: round1(mean_age),
        gender_distribution: counts(records.iter().map(|r| {
            let raw = r.demographics.gender.as_str();
            GENDER_TABLE.canonical(raw).unwrap_or_else(|| raw.trim())
        })),
        fitness_level_distribution: counts(encoded.iter().map(|e| e.fitness_level.as_str())),
        top_cities: top_values(records.iter().map(|r| r.demographics.city.as_str())),
    };

    let health_metrics = HealthAggregates {
        avg_bmi: round1(mean_present(records.iter().map(|r| r.physical.bmi))),
        avg_resting_hr: round1(mean_present(records.iter().map(|r| r.physical.resting_heart_rate))),
        medical_conditions: top_values(
            records.iter().map(|r| r.physical.medical_conditions.as_str()),
        ),
        avg_sleep_hours: round1(mean_present(records.iter().map(|r| r.physical.sleep_hours_avg))),
    };

    let activity_metrics = ActivityAggregates {
        avg_steps: mean_present(records.iter().map(|r| r.activity.total_steps)) as i64,
        avg_calories: mean_calories as i64,
        avg_active_minutes: mean_present(records.iter().map(|r| r.activity.total_active_minutes))
            as i64,
        avg_exercise_sessions: round1(mean_present(
            records.iter().map(|r| r.activity.exercise_sessions),
        )),
    };

    let traits = ClusterTraits {
        mean_fitness_code: mean_present(
            encoded.iter().map(|e| Some(e.fitness_level.code() as f64)),
        ),
        mean_age,
        medical_condition_rate: mean_present(
            encoded
                .iter()
                .map(|e| Some(if e.has_medical_condition { 1.0 } else { 0.0 })),
        ),
        mean_calories_burned: mean_calories,
    };

    let description = if size == 0 {
        "empty cluster".to_string()
    } else {
        describe(
            demographics.avg_age,
            activity_metrics.avg_steps,
            dominant(&demographics.fitness_level_distribution).unwrap_or("unknown"),
        )
    };

    ClusterSummary {
        cluster_id,
        size,
        percentage,
        demographics,
        health_metrics,
        activity_metrics,
        insurance_distribution: counts(
            records
                .iter()
                .map(|r| r.physical.current_insurance_provider.as_str()),
        ),
        traits,
        description,
    }
}

/// `"<fitness> fitness level <age group> who are <activity bucket>"`.
pub fn describe(avg_age: f64, avg_steps: i64, dominant_fitness: &str) -> String {
    let activity_level = if avg_steps > 60_000 {
        "highly active"
    } else if avg_steps > 45_000 {
        "moderately active"
    } else {
        "less active"
    };

    let age_group = if avg_age < 30.0 {
        "young adults"
    } else if avg_age < 50.0 {
        "middle-aged adults"
    } else {
        "older adults"
    };

    format!(
        "{} fitness level {} who are {}",
        dominant_fitness.to_lowercase(),
        age_group,
        activity_level
    )
}

/// Most frequent key; alphabetical order decides ties.
fn dominant(distribution: &BTreeMap<String, usize>) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for (value, &count) in distribution {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value.as_str(), count));
        }
    }
    best.map(|(value, _)| value)
}

fn counts<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut map = BTreeMap::new();
    for value in values {
        *map.entry(value.to_string()).or_insert(0) += 1;
    }
    map
}

fn top_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<ValueCount> {
    let mut entries: Vec<ValueCount> = counts(values)
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    entries.truncate(TOP_ENTRIES);
    entries
}

/// Mean over present values; 0 when nothing is present.
fn mean_present(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
