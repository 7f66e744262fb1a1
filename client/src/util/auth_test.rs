use super::*;

#[test]
fn validate_email_trims_and_accepts_plain_addresses() {
    assert_eq!(validate_email("  ada@example.com "), Ok("ada@example.com".to_owned()));
    assert_eq!(validate_email("first.last+tag@school.edu.au"), Ok("first.last+tag@school.edu.au".to_owned()));
}

#[test]
fn validate_email_rejects_malformed_addresses() {
    for raw in ["", "   ", "ada", "@example.com", "ada@", "ada@example", "ada@.com", "ada@example.", "a da@example.com", "a@b@c.com"] {
        assert_eq!(validate_email(raw), Err(INVALID_EMAIL), "accepted {raw:?}");
    }
}

#[test]
fn validate_password_enforces_minimum_length() {
    assert_eq!(validate_password("12345"), Err(PASSWORD_TOO_SHORT));
    assert_eq!(validate_password("123456"), Ok("123456".to_owned()));
}

#[test]
fn validate_password_keeps_surrounding_spaces() {
    assert_eq!(validate_password(" pass word "), Ok(" pass word ".to_owned()));
}

#[test]
fn validate_new_password_requires_matching_confirmation() {
    assert_eq!(validate_new_password("secret1", "secret1"), Ok("secret1".to_owned()));
    assert_eq!(validate_new_password("secret1", "secret2"), Err(PASSWORDS_DIFFER));
    assert_eq!(validate_new_password("short", "short"), Err(PASSWORD_TOO_SHORT));
}
