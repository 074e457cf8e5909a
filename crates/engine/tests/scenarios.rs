//! End-to-end scenarios over a deterministic synthetic population.

use liga_core::config::AppConfig;
use liga_core::error::{LigaError, StorageError};
use liga_core::population::Population;
use liga_core::types::{
    FitnessLevel, InsuranceProvider, ServiceCatalog, ServiceCatalogEntry, UserRecord,
};
use liga_engine::AnalyticsEngine;
use liga_recommend::{CategoryWeight, RecommendationRule, ServiceRelevanceScorer, UserTraits};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::path::PathBuf;
use uuid::Uuid;

// ─── Fixtures ───────────────────────────────────────────────────────────────

/// (age, fitness, steps, calories, bmi, resting hr, condition)
const ARCHETYPES: [(f64, &str, f64, f64, f64, f64, &str); 5] = [
    (24.0, "Advanced", 82_000.0, 3_200.0, 21.5, 58.0, "None"),
    (36.0, "Intermediate", 55_000.0, 2_600.0, 24.0, 66.0, "None"),
    (47.0, "Beginner", 32_000.0, 2_050.0, 29.5, 79.0, "Hypertension"),
    (63.0, "Beginner", 24_000.0, 1_800.0, 27.0, 74.0, "Diabetes Type 2"),
    (29.0, "Intermediate", 48_000.0, 2_300.0, 22.5, 70.0, "Asthma"),
];

const CITIES: [&str; 4] = ["Berlin", "Hamburg", "München", "Köln"];

fn synthetic_population(n: usize, seed: u64) -> Vec<UserRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let (age, fitness, steps, calories, bmi, hr, condition) = ARCHETYPES[i % ARCHETYPES.len()];
            let mut r = UserRecord {
                user_id: format!("U{:04}", i + 1),
                ..Default::default()
            };
            r.demographics.age = Some((age + rng.gen_range(-3.0..3.0)).round());
            r.demographics.gender = if rng.gen_bool(0.5) { "Male" } else { "Female" }.to_string();
            r.demographics.city = CITIES[rng.gen_range(0..CITIES.len())].to_string();
            r.demographics.income_bracket = "50000-75000".to_string();
            r.physical.bmi = Some(bmi + rng.gen_range(-0.8..0.8));
            r.physical.fitness_level = fitness.to_string();
            r.physical.medical_conditions = condition.to_string();
            r.physical.current_insurance_provider = if i % 3 == 0 { "AOK" } else { "TK" }.to_string();
            r.physical.resting_heart_rate = Some(hr + rng.gen_range(-2.0..2.0));
            r.physical.blood_pressure_systolic = Some(120.0);
            r.physical.blood_pressure_diastolic = Some(80.0);
            r.physical.smoking_status = "Non-smoker".to_string();
            r.physical.alcohol_consumption = "Low".to_string();
            r.physical.sleep_hours_avg = Some(7.0 + rng.gen_range(-1.0..1.0));
            r.physical.exercise_frequency_per_week = Some((steps / 16_000.0).round());
            r.activity.total_steps = Some(steps + rng.gen_range(-3_000.0..3_000.0));
            r.activity.total_calories_burned = Some(calories + rng.gen_range(-150.0..150.0));
            r.activity.total_active_minutes = Some(steps / 250.0);
            r.activity.exercise_sessions = Some((steps / 16_000.0).round());
            r.activity.sleep_hours_total = Some(49.0);
            r.activity.stress_level_avg = Some(rng.gen_range(2.0..7.0));
            r
        })
        .collect()
}

fn service(id: &str, provider: &str, category: &str, popularity: f64) -> ServiceCatalogEntry {
    ServiceCatalogEntry {
        service_id: id.to_string(),
        provider_id: provider.to_string(),
        service_name: format!("{category} programme"),
        category: category.to_string(),
        popularity_score: popularity,
        reward_amount: 100.0,
        reward_type: "Bonus Points".to_string(),
        ..Default::default()
    }
}

fn catalog() -> ServiceCatalog {
    let mut family = service("S05", "P1", "Family Health", 3.5);
    family.reward_amount = 250.0;
    let mut wellness = service("S04", "P1", "Wellness", 4.2);
    wellness.digital_app_required = true;
    ServiceCatalog::new(
        vec![
            InsuranceProvider {
                provider_id: "P1".to_string(),
                provider_name: "TK".to_string(),
            },
            InsuranceProvider {
                provider_id: "P2".to_string(),
                provider_name: "AOK".to_string(),
            },
        ],
        vec![
            service("S01", "P1", "Fitness", 4.5),
            service("S02", "P1", "Prevention", 4.0),
            service("S03", "P1", "Mental Health", 3.8),
            wellness,
            family,
            service("S06", "P2", "Fitness", 4.9),
            service("S07", "P2", "Chronic Care", 4.1),
        ],
    )
}

fn scratch_model_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("liga-scenarios-{}", Uuid::new_v4()))
        .join("cluster_model.json")
}

fn engine_with(records: Vec<UserRecord>, model_path: &PathBuf) -> AnalyticsEngine {
    let mut config = AppConfig::default();
    config.store.model_path = model_path.to_string_lossy().into_owned();
    AnalyticsEngine::new(Population::new(records).unwrap(), catalog(), config)
}

fn trained_engine() -> AnalyticsEngine {
    let engine = engine_with(synthetic_population(100, 7), &scratch_model_path());
    engine.train().unwrap();
    engine
}

// ─── Scenarios ──────────────────────────────────────────────────────────────

#[test]
fn scenario_a_five_populated_clusters() {
    let engine = engine_with(synthetic_population(100, 7), &scratch_model_path());
    let report = engine.train().unwrap();

    assert_eq!(report.k, 5);
    assert_eq!(report.cluster_sizes.len(), 5);
    assert!(report.cluster_sizes.iter().all(|&size| size > 0));
    assert_eq!(report.cluster_sizes.iter().sum::<usize>(), 100);
    assert!(report.inertia_history.windows(2).all(|w| w[1] <= w[0] + 1e-9));

    let summaries = engine.cluster_summaries().unwrap();
    assert_eq!(summaries.len(), 5);
    assert_eq!(summaries.iter().map(|s| s.size).sum::<usize>(), 100);
    assert!(summaries.iter().all(|s| !s.description.is_empty()));
}

#[test]
fn scenario_a_training_is_reproducible() {
    let first = trained_engine().snapshot().unwrap();
    let second = trained_engine().snapshot().unwrap();
    assert_eq!(first.model(), second.model());
    assert_eq!(first.summaries(), second.summaries());
}

#[test]
fn scenario_b_advanced_walker_fitness_score() {
    let rule = RecommendationRule {
        cluster_id: 0,
        weights: vec![CategoryWeight {
            category: "Fitness".to_string(),
            multiplier: 2.0,
        }],
    };
    let user = UserTraits {
        fitness_level: FitnessLevel::Advanced,
        age: 35.0,
        total_steps: 75_000.0,
        has_medical_condition: false,
        stress_level: 3.0,
        sleep_hours_avg: 7.5,
    };
    let score = ServiceRelevanceScorer::new(&rule).score(&user, &service("S01", "P1", "Fitness", 5.0));
    assert!(score >= 12.0);
}

#[test]
fn scenario_c_centroid_assigns_to_itself() {
    let engine = trained_engine();
    let snapshot = engine.snapshot().unwrap();
    for (cluster, centroid) in snapshot.model().centroids().rows().into_iter().enumerate() {
        let result = snapshot.assign_vector(centroid).unwrap();
        assert_eq!(result.predicted_cluster, cluster);
        assert_eq!(result.confidence, 1.0);
    }
}

#[test]
fn scenario_d_unknown_user_is_not_found() {
    let engine = trained_engine();
    let err = engine.recommend_services("U9999", 2).unwrap_err();
    assert!(matches!(err, LigaError::NotFound(_)));
}

#[test]
fn scenario_e_save_load_round_trip() {
    let path = scratch_model_path();
    let records = synthetic_population(100, 7);
    let probe = records[17].clone();

    let trained = engine_with(records.clone(), &path);
    trained.train().unwrap();
    trained.save_model().unwrap();
    let before = trained.assign_new_user(&probe).unwrap();

    let restored = engine_with(records, &path);
    restored.load_model().unwrap();
    let after = restored.assign_new_user(&probe).unwrap();

    assert_eq!(before.predicted_cluster, after.predicted_cluster);
    assert_eq!(before.confidence.to_bits(), after.confidence.to_bits());
    let bits = |d: &[f64]| d.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&before.distances), bits(&after.distances));

    let original = trained.snapshot().unwrap();
    let loaded = restored.snapshot().unwrap();
    assert_eq!(original.model(), loaded.model());
    assert_eq!(original.standardizer(), loaded.standardizer());
    assert_eq!(original.imputer(), loaded.imputer());
    assert_eq!(original.rules(), loaded.rules());
    assert_eq!(original.summaries(), loaded.summaries());

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

// ─── Properties ─────────────────────────────────────────────────────────────

#[test]
fn assignment_is_deterministic_and_confident() {
    let engine = trained_engine();
    for record in synthetic_population(20, 99) {
        let first = engine.assign_new_user(&record).unwrap();
        let second = engine.assign_new_user(&record).unwrap();
        assert_eq!(first, second);
        assert!((0.0..=1.0).contains(&first.confidence));
    }
}

#[test]
fn recommendations_stay_within_provider_and_order() {
    let engine = trained_engine();
    let offered_by_tk: HashSet<&str> = ["S01", "S02", "S03", "S04", "S05"].into_iter().collect();

    // U0002 is insured with TK
    let recs = engine.recommend_services("U0002", 3).unwrap();
    assert_eq!(recs.len(), 3);
    assert!(recs.iter().all(|r| offered_by_tk.contains(r.service_id.as_str())));
    assert!(recs.windows(2).all(|w| w[0].relevance_score >= w[1].relevance_score));
    assert_eq!(recs.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);

    // U0001 is insured with AOK, which offers two services
    assert_eq!(engine.recommend_services("U0001", 5).unwrap().len(), 2);
}

#[test]
fn unknown_provider_yields_no_recommendations() {
    let mut records = synthetic_population(100, 7);
    records[4].physical.current_insurance_provider = "Barmer".to_string();
    let engine = engine_with(records, &scratch_model_path());
    engine.train().unwrap();
    assert!(engine.recommend_services("U0005", 2).unwrap().is_empty());
}

#[test]
fn similar_users_exclude_the_query() {
    let engine = trained_engine();
    let similar = engine.find_similar_users("U0010", 5).unwrap();
    assert_eq!(similar.len(), 5);
    assert!(similar.iter().all(|s| s.user_id != "U0010"));
    assert!(similar.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[test]
fn progress_ends_with_current_week() {
    let engine = trained_engine();
    let weeks = engine.track_progress("U0003", 4).unwrap();
    assert_eq!(weeks.len(), 5);
    assert_eq!(weeks.last().unwrap().week, "Current");
    let profile = engine.user_profile("U0003").unwrap();
    assert_eq!(weeks.last().unwrap().fitness_score, profile.fitness_score);
}

#[test]
fn bundle_for_other_encoding_is_schema_mismatch() {
    let path = scratch_model_path();
    let engine = engine_with(synthetic_population(100, 7), &path);
    engine.train().unwrap();
    engine.save_model().unwrap();

    let mut bundle: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    bundle["encoding"] = serde_json::Value::String("fitness_level:Beginner=7".to_string());
    std::fs::write(&path, serde_json::to_vec(&bundle).unwrap()).unwrap();

    let err = engine.load_model().unwrap_err();
    assert!(matches!(err, LigaError::SchemaMismatch(_)));
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn truncated_bundle_is_corrupt_not_missing() {
    let path = scratch_model_path();
    let engine = engine_with(synthetic_population(100, 7), &path);
    assert!(matches!(
        engine.load_model(),
        Err(LigaError::Storage(StorageError::Missing { .. }))
    ));

    engine.train().unwrap();
    engine.save_model().unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(matches!(
        engine.load_model(),
        Err(LigaError::Storage(StorageError::Corrupt { .. }))
    ));
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

/// Train, save, rewrite the saved JSON with `edit`, then reload.
fn reload_edited_bundle(edit: impl FnOnce(&mut serde_json::Value)) -> LigaError {
    let path = scratch_model_path();
    let engine = engine_with(synthetic_population(100, 7), &path);
    engine.train().unwrap();
    engine.save_model().unwrap();

    let mut bundle: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    edit(&mut bundle);
    std::fs::write(&path, serde_json::to_vec(&bundle).unwrap()).unwrap();

    let err = engine.load_model().unwrap_err();
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    err
}

#[test]
fn bundle_missing_a_rule_is_corrupt() {
    let err = reload_edited_bundle(|bundle| {
        bundle["rules"]["rules"].as_array_mut().unwrap().pop();
    });
    assert!(matches!(err, LigaError::Storage(StorageError::Corrupt { .. })));
}

#[test]
fn bundle_missing_a_summary_is_corrupt() {
    let err = reload_edited_bundle(|bundle| {
        bundle["summaries"].as_array_mut().unwrap().pop();
    });
    assert!(matches!(err, LigaError::Storage(StorageError::Corrupt { .. })));
}

#[test]
fn bundle_with_narrow_centroids_is_corrupt() {
    let err = reload_edited_bundle(|bundle| {
        let centroids = &mut bundle["model"]["centroids"];
        let k = centroids["dim"][0].as_u64().unwrap() as usize;
        let d = centroids["dim"][1].as_u64().unwrap() as usize;
        let data: Vec<serde_json::Value> = centroids["data"]
            .as_array()
            .unwrap()
            .chunks(d)
            .flat_map(|row| row[..d - 1].to_vec())
            .collect();
        assert_eq!(data.len(), k * (d - 1));
        centroids["dim"] = serde_json::json!([k, d - 1]);
        centroids["data"] = serde_json::Value::Array(data);
    });
    assert!(matches!(err, LigaError::Storage(StorageError::Corrupt { .. })));
}

#[test]
fn bundle_with_short_statistics_is_corrupt() {
    let err = reload_edited_bundle(|bundle| {
        bundle["standardizer"]["means"].as_array_mut().unwrap().pop();
    });
    assert!(matches!(err, LigaError::Storage(StorageError::Corrupt { .. })));

    let err = reload_edited_bundle(|bundle| {
        bundle["imputer"]["means"].as_array_mut().unwrap().pop();
    });
    assert!(matches!(err, LigaError::Storage(StorageError::Corrupt { .. })));
}

#[test]
fn readers_see_whole_snapshots_during_retrain() {
    let engine = trained_engine();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let snapshot = engine.snapshot().unwrap();
                    assert_eq!(snapshot.summaries().len(), snapshot.model().k());
                    assert_eq!(snapshot.rules().len(), snapshot.model().k());
                    engine.assign_user("U0042").unwrap();
                }
            });
        }
        scope.spawn(|| {
            engine.train().unwrap();
        });
    });
}
