pub mod ai_gateway;
pub mod premium;
pub mod progression;
pub mod quests;
pub mod quota;
