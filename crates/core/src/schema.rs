//! Declared feature schemas. The schema a model was fitted with travels with
//! the model; serving against a different schema is rejected.

use crate::error::{LigaError, LigaResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A numeric column derived from a [`crate::types::UserRecord`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Age,
    Bmi,
    FitnessLevelEncoded,
    GenderEncoded,
    SmokingEncoded,
    AlcoholEncoded,
    HasMedicalCondition,
    IncomeNumeric,
    TotalSteps,
    TotalCaloriesBurned,
    TotalActiveMinutes,
    ExerciseFrequencyPerWeek,
    RestingHeartRate,
    SleepHoursAvg,
    StressLevelAvg,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Bmi => "bmi",
            Feature::FitnessLevelEncoded => "fitness_level_encoded",
            Feature::GenderEncoded => "gender_encoded",
            Feature::SmokingEncoded => "smoking_encoded",
            Feature::AlcoholEncoded => "alcohol_encoded",
            Feature::HasMedicalCondition => "has_medical_condition",
            Feature::IncomeNumeric => "income_numeric",
            Feature::TotalSteps => "total_steps",
            Feature::TotalCaloriesBurned => "total_calories_burned",
            Feature::TotalActiveMinutes => "total_active_minutes",
            Feature::ExerciseFrequencyPerWeek => "exercise_frequency_per_week",
            Feature::RestingHeartRate => "resting_heart_rate",
            Feature::SleepHoursAvg => "sleep_hours_avg",
            Feature::StressLevelAvg => "stress_level_avg",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, versioned list of features. Column order is significant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureSchema {
    pub version: u32,
    pub features: Vec<Feature>,
}

impl FeatureSchema {
    pub const VERSION: u32 = 1;

    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            version: Self::VERSION,
            features,
        }
    }

    /// Columns the cluster model is fitted on.
    pub fn clustering() -> Self {
        Self::new(vec![
            Feature::Age,
            Feature::Bmi,
            Feature::FitnessLevelEncoded,
            Feature::GenderEncoded,
            Feature::TotalSteps,
            Feature::TotalCaloriesBurned,
            Feature::TotalActiveMinutes,
            Feature::ExerciseFrequencyPerWeek,
            Feature::RestingHeartRate,
            Feature::SleepHoursAvg,
            Feature::StressLevelAvg,
            Feature::IncomeNumeric,
            Feature::HasMedicalCondition,
        ])
    }

    /// Columns used for user-to-user similarity.
    pub fn similarity() -> Self {
        Self::new(vec![
            Feature::Age,
            Feature::Bmi,
            Feature::FitnessLevelEncoded,
            Feature::TotalSteps,
            Feature::TotalCaloriesBurned,
            Feature::ExerciseFrequencyPerWeek,
            Feature::RestingHeartRate,
            Feature::SleepHoursAvg,
        ])
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    pub fn position(&self, feature: Feature) -> Option<usize> {
        self.features.iter().position(|f| *f == feature)
    }

    /// Fails with [`LigaError::SchemaMismatch`] unless `other` has the same
    /// version and the same columns in the same order.
    pub fn ensure_compatible(&self, other: &FeatureSchema) -> LigaResult<()> {
        if self.version != other.version {
            return Err(LigaError::SchemaMismatch(format!(
                "schema version {} does not match {}",
                other.version, self.version
            )));
        }
        if self.features.len() != other.features.len() {
            return Err(LigaError::SchemaMismatch(format!(
                "expected {} features, found {}",
                self.features.len(),
                other.features.len()
            )));
        }
        if let Some((i, (ours, theirs))) = self
            .features
            .iter()
            .zip(other.features.iter())
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(LigaError::SchemaMismatch(format!(
                "column {i} is {theirs}, expected {ours}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_schemas() {
        assert_eq!(FeatureSchema::clustering().len(), 13);
        assert_eq!(FeatureSchema::similarity().len(), 8);
        assert_eq!(FeatureSchema::clustering().names()[0], "age");
    }

    #[test]
    fn test_same_schema_is_compatible() {
        let schema = FeatureSchema::clustering();
        assert!(schema.ensure_compatible(&FeatureSchema::clustering()).is_ok());
    }

    #[test]
    fn test_reordered_schema_is_rejected() {
        let schema = FeatureSchema::clustering();
        let mut other = FeatureSchema::clustering();
        other.features.swap(0, 1);
        let err = schema.ensure_compatible(&other).unwrap_err();
        assert!(matches!(err, LigaError::SchemaMismatch(_)));
        assert!(err.to_string().contains("column 0 is bmi"));
    }

    #[test]
    fn test_version_drift_is_rejected() {
        let schema = FeatureSchema::similarity();
        let mut other = FeatureSchema::similarity();
        other.version = 2;
        assert!(matches!(
            schema.ensure_compatible(&other),
            Err(LigaError::SchemaMismatch(_))
        ));
    }
}
