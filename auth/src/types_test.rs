use super::*;
use serde_json::json;

fn identity(metadata: serde_json::Value) -> Identity {
    serde_json::from_value(json!({
        "id": "6f1c",
        "email": "ada@example.com",
        "role": "authenticated",
        "user_metadata": metadata,
    }))
    .unwrap()
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn identity_deserializes_gotrue_user_with_extra_fields() {
    let user: Identity = serde_json::from_value(json!({
        "id": "u1",
        "aud": "authenticated",
        "email": "a@b.com",
        "app_metadata": { "provider": "email" },
        "created_at": "2024-01-01T00:00:00Z"
    }))
    .unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.email, "a@b.com");
    assert!(user.role.is_none());
    assert!(user.user_metadata.is_empty());
}

#[test]
fn display_name_reads_full_name() {
    let user = identity(json!({ "full_name": "Ada Lovelace" }));
    assert_eq!(user.display_name(), Some("Ada Lovelace"));
    assert_eq!(user.greeting_name(), "Ada Lovelace");
}

#[test]
fn greeting_falls_back_to_email_for_blank_name() {
    let user = identity(json!({ "full_name": "   " }));
    assert_eq!(user.display_name(), None);
    assert_eq!(user.greeting_name(), "ada@example.com");
}

#[test]
fn greeting_ignores_non_string_name() {
    let user = identity(json!({ "full_name": 42 }));
    assert_eq!(user.greeting_name(), "ada@example.com");
}

// =============================================================================
// Session
// =============================================================================

#[test]
fn session_token_type_defaults_to_bearer() {
    let session: Session = serde_json::from_value(json!({
        "access_token": "at",
        "refresh_token": "rt",
        "expires_at": 1_700_000_000,
        "user": { "id": "u1", "email": "a@b.com" }
    }))
    .unwrap();
    assert_eq!(session.token_type, "bearer");
}

#[test]
fn expires_within_margin() {
    let session: Session = serde_json::from_value(json!({
        "access_token": "at",
        "refresh_token": "rt",
        "expires_at": 1000,
        "user": { "id": "u1" }
    }))
    .unwrap();
    assert!(session.expires_within(995, 10));
    assert!(session.expires_within(2000, 10));
    assert!(!session.expires_within(900, 10));
}

// =============================================================================
// AuthEvent
// =============================================================================

#[test]
fn auth_event_wire_names() {
    assert_eq!(AuthEvent::SignedIn.to_string(), "SIGNED_IN");
    assert_eq!(serde_json::to_value(AuthEvent::TokenRefreshed).unwrap(), json!("TOKEN_REFRESHED"));
    let parsed: AuthEvent = serde_json::from_value(json!("USER_UPDATED")).unwrap();
    assert_eq!(parsed, AuthEvent::UserUpdated);
}

// =============================================================================
// OAuthProvider
// =============================================================================

#[test]
fn oauth_provider_parses_every_supported_name() {
    for provider in OAuthProvider::ALL {
        assert_eq!(provider.as_str().parse::<OAuthProvider>(), Ok(provider));
    }
}

#[test]
fn oauth_provider_parse_is_case_insensitive_and_trimmed() {
    assert_eq!(" GitHub ".parse::<OAuthProvider>(), Ok(OAuthProvider::Github));
    assert_eq!("LINKEDIN".parse::<OAuthProvider>(), Ok(OAuthProvider::Linkedin));
}

#[test]
fn oauth_provider_rejects_unknown_name() {
    assert_eq!(
        "facebook".parse::<OAuthProvider>(),
        Err(AuthError::UnknownProvider("facebook".into()))
    );
    assert!("".parse::<OAuthProvider>().is_err());
}

#[test]
fn oauth_provider_serde_matches_as_str() {
    assert_eq!(serde_json::to_value(OAuthProvider::Workos).unwrap(), json!("workos"));
}
