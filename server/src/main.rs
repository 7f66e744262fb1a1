mod routes;
mod state;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    // Non-fatal: the UI loads and every auth call reports NotConfigured.
    let auth = auth::AuthConfig::from_env();
    if auth.is_configured() {
        tracing::info!(url = %auth.url, site_url = %auth.site_url, "identity service configured");
    }

    let state = state::AppState::new(auth);
    let app = routes::leptos_app(state).expect("leptos configuration");
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "coursehub listening");
    axum::serve(listener, app).await.expect("server failed");
}
