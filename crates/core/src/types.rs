use serde::{Deserialize, Serialize};

// ─── User Records ───────────────────────────────────────────────────────────

/// One user as joined from the demographic, physical and weekly-activity
/// sources. Numeric fields are optional: missing values are imputed with
/// training-population means rather than dropping the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub user_id: String,
    #[serde(default)]
    pub demographics: Demographics,
    #[serde(default)]
    pub physical: PhysicalProfile,
    #[serde(default)]
    pub activity: WeeklyActivity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Demographics {
    pub age: Option<f64>,
    pub gender: String,
    pub city: String,
    pub income_bracket: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicalProfile {
    pub bmi: Option<f64>,
    /// Free-text condition; the sentinel `"None"` (any case) means no condition.
    pub medical_conditions: String,
    pub current_insurance_provider: String,
    pub fitness_level: String,
    pub resting_heart_rate: Option<f64>,
    pub blood_pressure_systolic: Option<f64>,
    pub blood_pressure_diastolic: Option<f64>,
    pub smoking_status: String,
    pub alcohol_consumption: String,
    pub sleep_hours_avg: Option<f64>,
    pub exercise_frequency_per_week: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeeklyActivity {
    pub total_steps: Option<f64>,
    pub total_calories_burned: Option<f64>,
    pub total_active_minutes: Option<f64>,
    pub exercise_sessions: Option<f64>,
    pub sleep_hours_total: Option<f64>,
    pub stress_level_avg: Option<f64>,
    pub walking_distance_km: Option<f64>,
    pub running_distance_km: Option<f64>,
    pub cycling_distance_km: Option<f64>,
}

/// Sentinel used by the physical source when no condition is recorded.
pub const NO_MEDICAL_CONDITION: &str = "None";

impl UserRecord {
    pub fn has_medical_condition(&self) -> bool {
        !self
            .physical
            .medical_conditions
            .trim()
            .eq_ignore_ascii_case(NO_MEDICAL_CONDITION)
    }
}

// ─── Fitness Level ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    pub const ALL: [FitnessLevel; 3] = [
        FitnessLevel::Beginner,
        FitnessLevel::Intermediate,
        FitnessLevel::Advanced,
    ];

    pub fn code(&self) -> u8 {
        match self {
            FitnessLevel::Beginner => 0,
            FitnessLevel::Intermediate => 1,
            FitnessLevel::Advanced => 2,
        }
    }

    /// Inverse of [`FitnessLevel::code`]; codes above 2 are not levels.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FitnessLevel::Beginner),
            1 => Some(FitnessLevel::Intermediate),
            2 => Some(FitnessLevel::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FitnessLevel::Beginner => "Beginner",
            FitnessLevel::Intermediate => "Intermediate",
            FitnessLevel::Advanced => "Advanced",
        }
    }
}

// ─── Insurance Catalog ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsuranceProvider {
    pub provider_id: String,
    pub provider_name: String,
}

/// One service offered by an insurance provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceCatalogEntry {
    pub service_id: String,
    pub provider_id: String,
    pub service_name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub popularity_score: f64,
    #[serde(default)]
    pub reward_amount: f64,
    #[serde(default)]
    pub reward_type: String,
    #[serde(default)]
    pub eligibility_criteria: String,
    #[serde(default)]
    pub digital_app_required: bool,
}

/// Providers and their services. Users reference providers by name, services
/// reference them by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceCatalog {
    #[serde(default)]
    pub providers: Vec<InsuranceProvider>,
    #[serde(default)]
    pub services: Vec<ServiceCatalogEntry>,
}

impl ServiceCatalog {
    pub fn new(providers: Vec<InsuranceProvider>, services: Vec<ServiceCatalogEntry>) -> Self {
        Self {
            providers,
            services,
        }
    }

    pub fn provider_id_for(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .iter()
            .find(|p| p.provider_name == provider_name)
            .map(|p| p.provider_id.as_str())
    }

    pub fn services_for(&self, provider_id: &str) -> Vec<&ServiceCatalogEntry> {
        self.services
            .iter()
            .filter(|s| s.provider_id == provider_id)
            .collect()
    }

    /// Services offered by the provider the user is insured with.
    pub fn services_for_user(&self, user: &UserRecord) -> Vec<&ServiceCatalogEntry> {
        match self.provider_id_for(&user.physical.current_insurance_provider) {
            Some(provider_id) => self.services_for(provider_id),
            None => Vec::new(),
        }
    }
}
