use shopfront::{app, auth, logging, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init("shopfront=debug,axum=info,tower_http=info");

    let app_state = AppState::init().await?;
    auth::services::bootstrap_admin(&app_state).await?;

    app::serve(app::build_app(app_state)).await
}
