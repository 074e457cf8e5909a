//! Per-cluster category weights derived from cluster aggregates.
//!
//! Every threshold is evaluated independently against a cluster's traits;
//! each one that holds contributes its weights. Emission order carries no
//! meaning.

use liga_clustering::{ClusterSummary, ClusterTraits};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryWeight {
    pub category: String,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationRule {
    pub cluster_id: usize,
    pub weights: Vec<CategoryWeight>,
}

impl RecommendationRule {
    /// Weights whose category occurs, case-insensitively, inside
    /// `service_category`.
    pub fn matching<'a>(&'a self, service_category: &'a str) -> impl Iterator<Item = &'a CategoryWeight> {
        let haystack = service_category.to_lowercase();
        self.weights
            .iter()
            .filter(move |w| haystack.contains(&w.category.to_lowercase()))
    }
}

/// One row of the threshold table.
struct Threshold {
    name: &'static str,
    holds: fn(&ClusterTraits) -> bool,
    emits: &'static [(&'static str, f64)],
}

fn high_fitness(t: &ClusterTraits) -> bool {
    t.mean_fitness_code >= 1.5
}

fn older(t: &ClusterTraits) -> bool {
    t.mean_age >= 45.0
}

fn medical_prevalence(t: &ClusterTraits) -> bool {
    t.medical_condition_rate > 0.3
}

fn high_burn(t: &ClusterTraits) -> bool {
    t.mean_calories_burned > 2500.0
}

const THRESHOLDS: &[Threshold] = &[
    Threshold {
        name: "high_fitness",
        holds: high_fitness,
        emits: &[("Fitness", 2.0), ("Wellness", 1.5)],
    },
    Threshold {
        name: "older",
        holds: older,
        emits: &[("Prevention", 2.0), ("Health Screening", 1.8)],
    },
    Threshold {
        name: "medical_prevalence",
        holds: medical_prevalence,
        emits: &[("Chronic Care", 2.0), ("Prevention", 1.5)],
    },
    Threshold {
        name: "high_burn",
        holds: high_burn,
        emits: &[("Fitness", 1.8), ("Sports Program", 1.6)],
    },
];

pub struct RecommendationRuleEngine;

impl RecommendationRuleEngine {
    pub fn derive(cluster_id: usize, traits: &ClusterTraits) -> RecommendationRule {
        let mut weights = Vec::new();
        for threshold in THRESHOLDS.iter().filter(|t| (t.holds)(traits)) {
            debug!(cluster = cluster_id, threshold = threshold.name, "Rule threshold met");
            weights.extend(threshold.emits.iter().map(|&(category, multiplier)| CategoryWeight {
                category: category.to_string(),
                multiplier,
            }));
        }
        RecommendationRule { cluster_id, weights }
    }

    pub fn derive_all(summaries: &[ClusterSummary]) -> RuleSet {
        RuleSet {
            rules: summaries
                .iter()
                .map(|s| Self::derive(s.cluster_id, &s.traits))
                .collect(),
        }
    }
}

/// Rules for every cluster, indexed by cluster id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleSet {
    rules: Vec<RecommendationRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<RecommendationRule>) -> Self {
        Self { rules }
    }

    pub fn for_cluster(&self, cluster_id: usize) -> Option<&RecommendationRule> {
        self.rules.get(cluster_id).filter(|r| r.cluster_id == cluster_id)
    }

    pub fn rules(&self) -> &[RecommendationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits(fitness: f64, age: f64, medical: f64, calories: f64) -> ClusterTraits {
        ClusterTraits {
            mean_fitness_code: fitness,
            mean_age: age,
            medical_condition_rate: medical,
            mean_calories_burned: calories,
        }
    }

    fn weight_pairs(rule: &RecommendationRule) -> Vec<(&str, f64)> {
        let mut pairs: Vec<(&str, f64)> = rule
            .weights
            .iter()
            .map(|w| (w.category.as_str(), w.multiplier))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0).then(a.1.partial_cmp(&b.1).unwrap()));
        pairs
    }

    #[test]
    fn test_quiet_cluster_has_no_rules() {
        let rule = RecommendationRuleEngine::derive(0, &traits(0.4, 33.0, 0.1, 1800.0));
        assert!(rule.weights.is_empty());
    }

    #[test]
    fn test_thresholds_are_inclusive_where_declared() {
        let rule = RecommendationRuleEngine::derive(1, &traits(1.5, 45.0, 0.3, 2500.0));
        assert_eq!(
            weight_pairs(&rule),
            vec![
                ("Fitness", 2.0),
                ("Health Screening", 1.8),
                ("Prevention", 2.0),
                ("Wellness", 1.5)
            ]
        );
    }

    #[test]
    fn test_every_threshold_fires_independently() {
        let rule = RecommendationRuleEngine::derive(2, &traits(1.9, 52.0, 0.45, 2900.0));
        assert_eq!(
            weight_pairs(&rule),
            vec![
                ("Chronic Care", 2.0),
                ("Fitness", 1.8),
                ("Fitness", 2.0),
                ("Health Screening", 1.8),
                ("Prevention", 1.5),
                ("Prevention", 2.0),
                ("Sports Program", 1.6),
                ("Wellness", 1.5)
            ]
        );
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let rule = RecommendationRule {
            cluster_id: 0,
            weights: vec![
                CategoryWeight { category: "Fitness".to_string(), multiplier: 2.0 },
                CategoryWeight { category: "Prevention".to_string(), multiplier: 1.5 },
            ],
        };
        assert_eq!(rule.matching("Group fitness classes").count(), 1);
        assert_eq!(rule.matching("FITNESS").count(), 1);
        assert_eq!(rule.matching("Mental Health").count(), 0);
    }

    #[test]
    fn test_rule_set_lookup_by_cluster() {
        let set = RuleSet::new(vec![
            RecommendationRuleEngine::derive(0, &traits(0.0, 20.0, 0.0, 0.0)),
            RecommendationRuleEngine::derive(1, &traits(2.0, 20.0, 0.0, 0.0)),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.for_cluster(1).unwrap().weights.len(), 2);
        assert!(set.for_cluster(7).is_none());
    }
}
