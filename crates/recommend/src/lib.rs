//! Service recommendation for clustered users: per-cluster category rules,
//! relevance scoring, similar-user lookup and individual insights.

pub mod insights;
pub mod rules;
pub mod scorer;
pub mod similarity;

pub use insights::{Advice, AdviceKind, ProgressWeek, UserAdvice, UserInsights, UserProfileSummary};
pub use rules::{CategoryWeight, RecommendationRule, RecommendationRuleEngine, RuleSet};
pub use scorer::{Recommendation, ServiceRelevanceScorer, UserTraits};
pub use similarity::{cosine_similarity, SimilarUser, SimilarityIndex};
