//! Relevance scoring of a provider's services for one user.

use crate::rules::RecommendationRule;
use liga_core::error::{LigaError, LigaResult};
use liga_core::schema::Feature;
use liga_core::types::{FitnessLevel, ServiceCatalogEntry};
use liga_features::{EncodedUser, Imputer};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const DIGITAL_APP_MAX_AGE: f64 = 40.0;
const DIGITAL_APP_BONUS: f64 = 0.5;
const HIGH_REWARD_THRESHOLD: f64 = 200.0;
const HIGH_REWARD_BONUS: f64 = 0.5;

/// The individual traits the scorer looks at, with gaps already filled
/// from the training population.
#[derive(Debug, Clone, PartialEq)]
pub struct UserTraits {
    pub fitness_level: FitnessLevel,
    pub age: f64,
    pub total_steps: f64,
    pub has_medical_condition: bool,
    pub stress_level: f64,
    pub sleep_hours_avg: f64,
}

impl UserTraits {
    pub fn from_encoded(user: &EncodedUser, imputer: &Imputer) -> LigaResult<Self> {
        let value = |feature: Feature| {
            imputer.value_of(user, feature).ok_or_else(|| {
                LigaError::SchemaMismatch(format!(
                    "user {} has no {feature} and the imputer cannot supply one",
                    user.user_id
                ))
            })
        };
        Ok(Self {
            fitness_level: user.fitness_level,
            age: value(Feature::Age)?,
            total_steps: value(Feature::TotalSteps)?,
            has_medical_condition: user.has_medical_condition,
            stress_level: value(Feature::StressLevelAvg)?,
            sleep_hours_avg: value(Feature::SleepHoursAvg)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub service_id: String,
    pub service_name: String,
    pub category: String,
    pub description: String,
    pub reward_amount: f64,
    pub reward_type: String,
    pub relevance_score: f64,
    pub eligibility_criteria: String,
    pub popularity_score: f64,
    /// 1-based position in the returned list.
    pub rank: u32,
}

/// Scores services against a cluster's rule and the user's own traits.
pub struct ServiceRelevanceScorer<'a> {
    rule: &'a RecommendationRule,
}

impl<'a> ServiceRelevanceScorer<'a> {
    pub fn new(rule: &'a RecommendationRule) -> Self {
        Self { rule }
    }

    pub fn score(&self, user: &UserTraits, service: &ServiceCatalogEntry) -> f64 {
        let mut score = service.popularity_score;

        for weight in self.rule.matching(&service.category) {
            score *= weight.multiplier;
        }

        score += category_bonus(user, service.category.trim());

        if service.digital_app_required && user.age < DIGITAL_APP_MAX_AGE {
            score += DIGITAL_APP_BONUS;
        }
        if service.reward_amount > HIGH_REWARD_THRESHOLD {
            score += HIGH_REWARD_BONUS;
        }
        score
    }

    /// Top `n` services by descending score; equal scores keep ascending
    /// `service_id` order.
    pub fn rank(
        &self,
        user: &UserTraits,
        services: &[&ServiceCatalogEntry],
        n: usize,
    ) -> Vec<Recommendation> {
        let mut scored: Vec<(f64, &ServiceCatalogEntry)> = services
            .iter()
            .map(|&service| (self.score(user, service), service))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.service_id.cmp(&b.1.service_id))
        });
        scored.truncate(n);

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (score, service))| Recommendation {
                service_id: service.service_id.clone(),
                service_name: service.service_name.clone(),
                category: service.category.clone(),
                description: service.description.clone(),
                reward_amount: service.reward_amount,
                reward_type: service.reward_type.clone(),
                relevance_score: score,
                eligibility_criteria: service.eligibility_criteria.clone(),
                popularity_score: service.popularity_score,
                rank: i as u32 + 1,
            })
            .collect()
    }
}

fn category_bonus(user: &UserTraits, category: &str) -> f64 {
    let is = |name: &str| category.eq_ignore_ascii_case(name);
    let mut bonus = 0.0;

    if is("Fitness") {
        if matches!(
            user.fitness_level,
            FitnessLevel::Intermediate | FitnessLevel::Advanced
        ) {
            bonus += 2.0;
        }
        if user.total_steps > 50_000.0 {
            bonus += 1.0;
        }
    } else if is("Prevention") {
        if user.age > 40.0 {
            bonus += 2.0;
        }
        if user.has_medical_condition {
            bonus += 1.5;
        }
    } else if is("Mental Health") {
        if user.stress_level > 4.0 {
            bonus += 2.0;
        }
        if user.sleep_hours_avg < 7.0 {
            bonus += 1.0;
        }
    } else if is("Wellness") {
        bonus += 1.0;
    } else if is("Family Health") && user.age < 45.0 {
        bonus += 1.5;
    }

    bonus
}
