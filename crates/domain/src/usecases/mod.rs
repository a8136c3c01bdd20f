//! Application use cases / business logic

pub mod amendment;
pub mod rank;
pub mod recommend;

pub use amendment::{AmendmentAdvisor, AmendmentReport, AmendmentThresholds};
pub use rank::{RankConfig, RankingEngine};
pub use recommend::{RecommendConfig, RecommendError, RecommendUseCase};
