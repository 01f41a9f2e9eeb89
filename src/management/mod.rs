pub mod dashboard;
pub mod recommendations;
mod session;

pub use dashboard::DashboardStats;
pub use recommendations::{RecommendationContext, Recommendations, recommend};
pub use session::SessionManager;
