use super::*;
use auth::AuthConfig;

fn configured_state() -> AppState {
    AppState::new(AuthConfig::new("https://xyz.supabase.co/", "anon-key", "https://learn.example.com"))
}

#[tokio::test]
async fn client_config_exposes_public_settings_only() {
    let Json(config) = client_config(State(configured_state())).await;
    assert_eq!(config.url, "https://xyz.supabase.co");
    assert_eq!(config.anon_key, "anon-key");
    assert_eq!(config.site_url, "https://learn.example.com");
    assert!(config.auto_refresh);
}

#[tokio::test]
async fn client_config_serves_empty_values_when_unconfigured() {
    let state = AppState::new(AuthConfig::new("", "", "http://localhost:3000"));
    let Json(config) = client_config(State(state)).await;
    assert!(config.url.is_empty());
    assert!(config.anon_key.is_empty());
    assert!(!AuthConfig::from_client_config(config).is_configured());
}

#[tokio::test]
async fn healthz_reports_auth_configuration() {
    let Json(health) = healthz(State(configured_state())).await;
    assert_eq!(health, Health { status: "ok", auth_configured: true });

    let Json(health) = healthz(State(AppState::new(AuthConfig::new("", "", "")))).await;
    assert!(!health.auth_configured);
}
