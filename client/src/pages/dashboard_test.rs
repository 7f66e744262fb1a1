use super::*;

fn user(email: &str, full_name: Option<&str>) -> Identity {
    let mut user = Identity { id: "u1".to_owned(), email: email.to_owned(), ..Identity::default() };
    if let Some(name) = full_name {
        user.user_metadata.insert("full_name".to_owned(), name.into());
    }
    user
}

#[test]
fn greeting_prefers_full_name() {
    assert_eq!(greeting(Some(&user("ada@example.com", Some("Ada Lovelace")))), "Hello, Ada Lovelace");
}

#[test]
fn greeting_falls_back_to_email() {
    assert_eq!(greeting(Some(&user("ada@example.com", None))), "Hello, ada@example.com");
    assert_eq!(greeting(Some(&user("ada@example.com", Some("   ")))), "Hello, ada@example.com");
}

#[test]
fn greeting_without_user_is_generic() {
    assert_eq!(greeting(None), "Hello");
}
