//! Per-user profile, fitness score, lifestyle advice and progress history.

use liga_core::error::{LigaError, LigaResult};
use liga_core::schema::Feature;
use liga_core::types::UserRecord;
use liga_features::{EncodedUser, Imputer};
use serde::{Deserialize, Serialize};

// ─── Profile ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfileSummary {
    pub user_id: String,
    pub basic_info: BasicInfo,
    pub health_metrics: HealthMetrics,
    pub weekly_activity: ActivitySnapshot,
    pub fitness_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasicInfo {
    pub age: Option<i64>,
    pub gender: String,
    pub city: String,
    pub fitness_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthMetrics {
    pub bmi: Option<f64>,
    pub resting_heart_rate: Option<i64>,
    /// `"systolic/diastolic"`, when both readings exist.
    pub blood_pressure: Option<String>,
    pub medical_conditions: String,
    pub insurance_provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivitySnapshot {
    pub total_steps: Option<i64>,
    pub calories_burned: Option<i64>,
    pub active_minutes: Option<i64>,
    pub exercise_sessions: Option<i64>,
    pub sleep_hours: Option<f64>,
}

// ─── Advice ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdviceKind {
    Steps,
    Exercise,
    Activity,
    Weight,
    Cardio,
    Sleep,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Advice {
    pub kind: AdviceKind,
    pub message: String,
    pub target: String,
}

impl Advice {
    fn new(kind: AdviceKind, message: &str, target: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
            target: target.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAdvice {
    pub activity: Vec<Advice>,
    pub health: Vec<Advice>,
}

// ─── Progress ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressWeek {
    /// `"Week -N"` for history, `"Current"` for the latest week.
    pub week: String,
    pub steps: i64,
    pub calories: i64,
    pub active_minutes: i64,
    pub fitness_score: f64,
}

// ─── Insights ───────────────────────────────────────────────────────────────

/// Read-only view over one user, filling missing numeric values from the
/// training population means.
pub struct UserInsights<'a> {
    record: &'a UserRecord,
    encoded: &'a EncodedUser,
    imputer: &'a Imputer,
}

impl<'a> UserInsights<'a> {
    pub fn new(record: &'a UserRecord, encoded: &'a EncodedUser, imputer: &'a Imputer) -> Self {
        Self {
            record,
            encoded,
            imputer,
        }
    }

    fn value(&self, feature: Feature) -> LigaResult<f64> {
        self.imputer.value_of(self.encoded, feature).ok_or_else(|| {
            LigaError::SchemaMismatch(format!(
                "user {} has no {feature} and the imputer cannot supply one",
                self.record.user_id
            ))
        })
    }

    pub fn profile(&self) -> LigaResult<UserProfileSummary> {
        let r = self.record;
        let blood_pressure = match (
            r.physical.blood_pressure_systolic,
            r.physical.blood_pressure_diastolic,
        ) {
            (Some(sys), Some(dia)) => Some(format!("{}/{}", sys as i64, dia as i64)),
            _ => None,
        };

        Ok(UserProfileSummary {
            user_id: r.user_id.clone(),
            basic_info: BasicInfo {
                age: r.demographics.age.map(|a| a as i64),
                gender: r.demographics.gender.clone(),
                city: r.demographics.city.clone(),
                fitness_level: r.physical.fitness_level.clone(),
            },
            health_metrics: HealthMetrics {
                bmi: r.physical.bmi.map(round1),
                resting_heart_rate: r.physical.resting_heart_rate.map(|hr| hr as i64),
                blood_pressure,
                medical_conditions: r.physical.medical_conditions.clone(),
                insurance_provider: r.physical.current_insurance_provider.clone(),
            },
            weekly_activity: ActivitySnapshot {
                total_steps: r.activity.total_steps.map(|v| v as i64),
                calories_burned: r.activity.total_calories_burned.map(|v| v as i64),
                active_minutes: r.activity.total_active_minutes.map(|v| v as i64),
                exercise_sessions: r.activity.exercise_sessions.map(|v| v as i64),
                sleep_hours: r.activity.sleep_hours_total.map(round1),
            },
            fitness_score: self.fitness_score()?,
        })
    }

    /// 0-100: steps up to 40, heart/BMI health up to 30, sleep and exercise
    /// frequency up to 30. One decimal.
    pub fn fitness_score(&self) -> LigaResult<f64> {
        let steps = self.value(Feature::TotalSteps)?;
        let bmi = self.value(Feature::Bmi)?;
        let hr = self.value(Feature::RestingHeartRate)?;
        let sleep = self.value(Feature::SleepHoursAvg)?;
        let frequency = self.value(Feature::ExerciseFrequencyPerWeek)?;

        let steps_score = (steps / 70_000.0 * 40.0).min(40.0);

        let bmi_score = if (18.5..=24.9).contains(&bmi) { 30.0 } else { 15.0 };
        let hr_score = if (60.0..=75.0).contains(&hr) { 30.0 } else { 15.0 };
        let health_score = (bmi_score + hr_score) / 2.0;

        let sleep_score = if (7.0..=9.0).contains(&sleep) { 15.0 } else { 7.0 };
        let exercise_score = (frequency / 5.0 * 15.0).min(15.0);

        Ok(round1(steps_score + health_score + sleep_score + exercise_score))
    }

    pub fn advice(&self) -> LigaResult<UserAdvice> {
        let mut activity = Vec::new();
        if self.value(Feature::TotalSteps)? < 40_000.0 {
            activity.push(Advice::new(
                AdviceKind::Steps,
                "Try to increase daily steps by 2000. Consider taking walking breaks every hour.",
                "45000+ steps per week",
            ));
        }
        // Session counts are not part of the model features, so only a
        // recorded value can trigger this one.
        if self.record.activity.exercise_sessions.is_some_and(|s| s < 3.0) {
            activity.push(Advice::new(
                AdviceKind::Exercise,
                "Add 1-2 more exercise sessions per week for better fitness.",
                "4-5 sessions per week",
            ));
        }
        if self.value(Feature::TotalActiveMinutes)? < 150.0 {
            activity.push(Advice::new(
                AdviceKind::Activity,
                "Increase active minutes to meet WHO recommendations.",
                "150+ minutes per week",
            ));
        }

        let mut health = Vec::new();
        if self.value(Feature::Bmi)? > 25.0 {
            health.push(Advice::new(
                AdviceKind::Weight,
                "Consider consulting a nutritionist for healthy weight management.",
                "BMI 18.5-24.9",
            ));
        }
        if self.value(Feature::RestingHeartRate)? > 80.0 {
            health.push(Advice::new(
                AdviceKind::Cardio,
                "Focus on cardiovascular exercises to improve heart health.",
                "Resting HR 60-75 bpm",
            ));
        }
        if self.value(Feature::SleepHoursAvg)? < 7.0 {
            health.push(Advice::new(
                AdviceKind::Sleep,
                "Prioritize sleep hygiene for better recovery and health.",
                "7-9 hours per night",
            ));
        }

        Ok(UserAdvice { activity, health })
    }

    /// `weeks_back` projected weeks, oldest first, then the current week.
    /// Week `-w` scales the current figures by `0.8 + (weeks_back - w) * 0.05`.
    pub fn progress(&self, weeks_back: u32) -> LigaResult<Vec<ProgressWeek>> {
        let steps = self.value(Feature::TotalSteps)?.trunc();
        let calories = self.value(Feature::TotalCaloriesBurned)?.trunc();
        let minutes = self.value(Feature::TotalActiveMinutes)?.trunc();
        let score = self.fitness_score()?;

        let mut weeks: Vec<ProgressWeek> = (1..=weeks_back)
            .rev()
            .map(|week| {
                let factor = 0.8 + (weeks_back - week) as f64 * 0.05;
                ProgressWeek {
                    week: format!("Week -{week}"),
                    steps: (steps * factor) as i64,
                    calories: (calories * factor) as i64,
                    active_minutes: (minutes * factor) as i64,
                    fitness_score: round1(score * factor),
                }
            })
            .collect();

        weeks.push(ProgressWeek {
            week: "Current".to_string(),
            steps: steps as i64,
            calories: calories as i64,
            active_minutes: minutes as i64,
            fitness_score: score,
        });
        Ok(weeks)
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
