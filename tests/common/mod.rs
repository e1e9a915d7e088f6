use axum::Router;

pub async fn create_test_app() -> Router {
    // No database in the harness: handlers behind the store respond 503,
    // everything local (validation, health, auth gating) is exercised.
    std::env::set_var("DATABASE_URL", "");
    std::env::set_var("JWT_SECRET", "integration-test-secret");

    alphatalk_backend::create_app().await
}
