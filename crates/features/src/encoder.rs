//! Categorical → numeric encoding with fixed enumeration tables.
//!
//! Unmapped values never fail a batch: they take the table's default code and
//! are reported as [`EncodingFallback`] on the encoded user (and logged at
//! `warn`).

use liga_core::schema::Feature;
use liga_core::types::{FitnessLevel, UserRecord};
use tracing::warn;

/// A fixed mapping from recorded category values to numeric codes.
/// Lookups ignore surrounding whitespace and ASCII case.
#[derive(Debug, Clone, Copy)]
pub struct EncodingTable {
    pub field: &'static str,
    pub entries: &'static [(&'static str, f64)],
    pub default_code: f64,
}

impl EncodingTable {
    pub fn lookup(&self, raw: &str) -> Option<f64> {
        self.entry(raw).map(|(_, code)| *code)
    }

    /// The table's own spelling of `raw`, if it is a known value.
    pub fn canonical(&self, raw: &str) -> Option<&'static str> {
        self.entry(raw).map(|(label, _)| *label)
    }

    fn entry(&self, raw: &str) -> Option<&'static (&'static str, f64)> {
        let value = raw.trim();
        let entries: &'static [(&'static str, f64)] = self.entries;
        entries
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(value))
    }

    fn fingerprint(&self) -> String {
        let entries: Vec<String> = self
            .entries
            .iter()
            .map(|(label, code)| format!("{label}={code}"))
            .collect();
        format!("{}[{}|default={}]", self.field, entries.join(","), self.default_code)
    }
}

pub const FITNESS_LEVEL_TABLE: EncodingTable = EncodingTable {
    field: "fitness_level",
    entries: &[("Beginner", 0.0), ("Intermediate", 1.0), ("Advanced", 2.0)],
    default_code: 0.0,
};

pub const GENDER_TABLE: EncodingTable = EncodingTable {
    field: "gender",
    entries: &[("Male", 0.0), ("Female", 1.0)],
    default_code: 0.0,
};

pub const SMOKING_TABLE: EncodingTable = EncodingTable {
    field: "smoking_status",
    entries: &[("Non-smoker", 0.0), ("Ex-smoker", 1.0), ("Smoker", 2.0)],
    default_code: 0.0,
};

pub const ALCOHOL_TABLE: EncodingTable = EncodingTable {
    field: "alcohol_consumption",
    entries: &[("Low", 0.0), ("Moderate", 1.0), ("High", 2.0)],
    default_code: 0.0,
};

/// Income bracket → bracket midpoint.
pub const INCOME_TABLE: EncodingTable = EncodingTable {
    field: "income_bracket",
    entries: &[
        ("30000-35000", 32_500.0),
        ("35000-40000", 37_500.0),
        ("40000-50000", 45_000.0),
        ("50000-75000", 62_500.0),
        ("75000-100000", 87_500.0),
        ("100000+", 110_000.0),
    ],
    default_code: 50_000.0,
};

const TABLES: [&EncodingTable; 5] = [
    &FITNESS_LEVEL_TABLE,
    &GENDER_TABLE,
    &SMOKING_TABLE,
    &ALCOHOL_TABLE,
    &INCOME_TABLE,
];

/// A categorical value that was not in its table and took the default code.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingFallback {
    pub user_id: String,
    pub field: &'static str,
    pub value: String,
    pub code: f64,
}

/// Numeric view of a [`UserRecord`]. Categorical columns are always present;
/// raw numeric columns stay `None` when the source had no value.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedUser {
    pub user_id: String,
    pub fitness_level: FitnessLevel,
    pub age: Option<f64>,
    pub bmi: Option<f64>,
    pub gender_code: f64,
    pub smoking_code: f64,
    pub alcohol_code: f64,
    pub has_medical_condition: bool,
    pub income: f64,
    pub total_steps: Option<f64>,
    pub total_calories_burned: Option<f64>,
    pub total_active_minutes: Option<f64>,
    pub exercise_frequency_per_week: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub sleep_hours_avg: Option<f64>,
    pub stress_level_avg: Option<f64>,
    pub fallbacks: Vec<EncodingFallback>,
}

impl EncodedUser {
    pub fn value(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Age => self.age,
            Feature::Bmi => self.bmi,
            Feature::FitnessLevelEncoded => Some(self.fitness_level.code() as f64),
            Feature::GenderEncoded => Some(self.gender_code),
            Feature::SmokingEncoded => Some(self.smoking_code),
            Feature::AlcoholEncoded => Some(self.alcohol_code),
            Feature::HasMedicalCondition => Some(if self.has_medical_condition { 1.0 } else { 0.0 }),
            Feature::IncomeNumeric => Some(self.income),
            Feature::TotalSteps => self.total_steps,
            Feature::TotalCaloriesBurned => self.total_calories_burned,
            Feature::TotalActiveMinutes => self.total_active_minutes,
            Feature::ExerciseFrequencyPerWeek => self.exercise_frequency_per_week,
            Feature::RestingHeartRate => self.resting_heart_rate,
            Feature::SleepHoursAvg => self.sleep_hours_avg,
            Feature::StressLevelAvg => self.stress_level_avg,
        }
    }
}

/// Stateless encoder over the fixed tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, record: &UserRecord) -> EncodedUser {
        let mut fallbacks = Vec::new();
        let mut code = |table: &EncodingTable, raw: &str| match table.lookup(raw) {
            Some(code) => code,
            None => {
                warn!(
                    user_id = %record.user_id,
                    field = table.field,
                    value = raw,
                    default_code = table.default_code,
                    "Unmapped category value, using default code"
                );
                fallbacks.push(EncodingFallback {
                    user_id: record.user_id.clone(),
                    field: table.field,
                    value: raw.to_string(),
                    code: table.default_code,
                });
                table.default_code
            }
        };

        let fitness_code = code(&FITNESS_LEVEL_TABLE, &record.physical.fitness_level);
        let gender_code = code(&GENDER_TABLE, &record.demographics.gender);
        let smoking_code = code(&SMOKING_TABLE, &record.physical.smoking_status);
        let alcohol_code = code(&ALCOHOL_TABLE, &record.physical.alcohol_consumption);
        let income = code(&INCOME_TABLE, &record.demographics.income_bracket);

        EncodedUser {
            user_id: record.user_id.clone(),
            fitness_level: FitnessLevel::from_code(fitness_code as u8)
                .unwrap_or(FitnessLevel::Beginner),
            age: record.demographics.age,
            bmi: record.physical.bmi,
            gender_code,
            smoking_code,
            alcohol_code,
            has_medical_condition: record.has_medical_condition(),
            income,
            total_steps: record.activity.total_steps,
            total_calories_burned: record.activity.total_calories_burned,
            total_active_minutes: record.activity.total_active_minutes,
            exercise_frequency_per_week: record.physical.exercise_frequency_per_week,
            resting_heart_rate: record.physical.resting_heart_rate,
            sleep_hours_avg: record.physical.sleep_hours_avg,
            stress_level_avg: record.activity.stress_level_avg,
            fallbacks,
        }
    }

    pub fn encode_all(&self, records: &[UserRecord]) -> Vec<EncodedUser> {
        records.iter().map(|r| self.encode(r)).collect()
    }

    /// Canonical description of every table. Two encoders with the same
    /// fingerprint produce identical codes.
    pub fn fingerprint(&self) -> String {
        TABLES
            .iter()
            .map(|t| t.fingerprint())
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        let mut record = UserRecord {
            user_id: "USR001".to_string(),
            ..Default::default()
        };
        record.demographics.age = Some(34.0);
        record.demographics.gender = "Female".to_string();
        record.demographics.income_bracket = "50000-75000".to_string();
        record.physical.fitness_level = "Advanced".to_string();
        record.physical.smoking_status = "Ex-smoker".to_string();
        record.physical.alcohol_consumption = "Moderate".to_string();
        record.physical.medical_conditions = "None".to_string();
        record
    }

    #[test]
    fn test_known_values_encode_to_table_codes() {
        let encoded = FeatureEncoder::new().encode(&record());
        assert_eq!(encoded.fitness_level, FitnessLevel::Advanced);
        assert_eq!(encoded.value(Feature::FitnessLevelEncoded), Some(2.0));
        assert_eq!(encoded.gender_code, 1.0);
        assert_eq!(encoded.smoking_code, 1.0);
        assert_eq!(encoded.alcohol_code, 1.0);
        assert_eq!(encoded.income, 62_500.0);
        assert!(!encoded.has_medical_condition);
        assert!(encoded.fallbacks.is_empty());
    }

    #[test]
    fn test_encoding_is_repeatable() {
        let encoder = FeatureEncoder::new();
        let r = record();
        assert_eq!(encoder.encode(&r), encoder.encode(&r));
    }

    #[test]
    fn test_lookup_ignores_case_and_whitespace() {
        assert_eq!(FITNESS_LEVEL_TABLE.lookup(" advanced "), Some(2.0));
        assert_eq!(GENDER_TABLE.lookup("female"), Some(1.0));
    }

    #[test]
    fn test_canonical_spelling() {
        assert_eq!(FITNESS_LEVEL_TABLE.canonical("advanced"), Some("Advanced"));
        assert_eq!(GENDER_TABLE.canonical(" MALE"), Some("Male"));
        assert_eq!(GENDER_TABLE.canonical("Other"), None);
    }

    #[test]
    fn test_unmapped_values_fall_back_and_are_reported() {
        let mut r = record();
        r.physical.smoking_status = "Former".to_string();
        r.demographics.income_bracket = "unknown".to_string();
        let encoded = FeatureEncoder::new().encode(&r);

        assert_eq!(encoded.smoking_code, 0.0);
        assert_eq!(encoded.income, 50_000.0);
        assert_eq!(encoded.fallbacks.len(), 2);
        assert_eq!(encoded.fallbacks[0].field, "smoking_status");
        assert_eq!(encoded.fallbacks[0].value, "Former");
        assert_eq!(encoded.fallbacks[1].field, "income_bracket");
    }

    #[test]
    fn test_any_condition_other_than_sentinel_is_flagged() {
        let mut r = record();
        r.physical.medical_conditions = "Hypertension".to_string();
        let encoded = FeatureEncoder::new().encode(&r);
        assert_eq!(encoded.value(Feature::HasMedicalCondition), Some(1.0));
    }

    #[test]
    fn test_missing_numeric_stays_missing() {
        let mut r = record();
        r.demographics.age = None;
        let encoded = FeatureEncoder::new().encode(&r);
        assert_eq!(encoded.value(Feature::Age), None);
    }

    #[test]
    fn test_fingerprint_covers_every_table() {
        let fingerprint = FeatureEncoder::new().fingerprint();
        for field in ["fitness_level", "gender", "smoking_status", "alcohol_consumption", "income_bracket"] {
            assert!(fingerprint.contains(field), "missing {field}");
        }
    }
}
