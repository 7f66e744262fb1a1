//! Registration page.
//!
//! When the identity service requires email confirmation, sign-up returns no
//! session and the user is sent to login with a "check your email" message.
//! Auto-confirmed accounts are signed in immediately and the route guard
//! moves them to the dashboard.

#[cfg(test)]
#[path = "register_test.rs"]
mod register_test;

use auth::SignUpMetadata;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
#[cfg(feature = "hydrate")]
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::components::site_header::SiteHeader;
use crate::state::auth::AuthHandle;
use crate::util::auth::{validate_email, validate_new_password};

pub(crate) const CHECK_EMAIL_MESSAGE: &str =
    "Registration successful! Please check your email to confirm your account.";
pub(crate) const NAME_REQUIRED: &str = "Please enter your first and last name";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Registration {
    pub email: String,
    pub password: String,
    pub metadata: SignUpMetadata,
}

pub(crate) fn validate_registration(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<Registration, &'static str> {
    let (first_name, last_name) = (first_name.trim(), last_name.trim());
    if first_name.is_empty() || last_name.is_empty() {
        return Err(NAME_REQUIRED);
    }
    Ok(Registration {
        email: validate_email(email)?,
        password: validate_new_password(password, confirm)?,
        metadata: SignUpMetadata { full_name: Some(format!("{first_name} {last_name}")) },
    })
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let handle = expect_context::<RwSignal<AuthHandle>>();
    let navigate = use_navigate();

    let first_name = RwSignal::new(String::new());
    let last_name = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);
    let busy = RwSignal::new(false);

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let registration = match validate_registration(
            &first_name.get(),
            &last_name.get(),
            &email.get(),
            &password.get(),
            &confirm.get(),
        ) {
            Ok(registration) => registration,
            Err(msg) => {
                error.set(Some(msg.to_owned()));
                return;
            }
        };
        error.set(None);
        busy.set(true);

        #[cfg(feature = "hydrate")]
        {
            let navigate = navigate.clone();
            leptos::task::spawn_local(async move {
                let result = match handle.get_untracked().store() {
                    Ok(store) => {
                        store
                            .sign_up(&registration.email, &registration.password, Some(registration.metadata))
                            .await
                    }
                    Err(e) => Err(e),
                };
                match result {
                    Ok(response) if response.session.is_none() => {
                        let target = auth::Navigation::to(auth::guard::LOGIN_PATH).with_message(CHECK_EMAIL_MESSAGE);
                        navigate(&target.href(), NavigateOptions::default());
                    }
                    Ok(_) => {}
                    Err(e) => error.set(Some(e.user_message())),
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = (handle, &navigate, registration);
    };

    view! {
        <div class="auth-page">
            <SiteHeader/>
            <main class="auth-page__main">
                <form class="auth-card auth-form" on:submit=on_submit>
                    <h1 class="auth-card__title">"Create an account"</h1>
                    <p class="auth-card__subtitle">"Enter your details to get started"</p>
                    <Show when=move || error.get().is_some()>
                        <p class="auth-message auth-message--error">{move || error.get().unwrap_or_default()}</p>
                    </Show>
                    <div class="auth-form__row">
                        <label class="auth-form__label">
                            "First name"
                            <input
                                class="auth-input"
                                type="text"
                                autocomplete="given-name"
                                prop:value=move || first_name.get()
                                on:input=move |ev| first_name.set(event_target_value(&ev))
                            />
                        </label>
                        <label class="auth-form__label">
                            "Last name"
                            <input
                                class="auth-input"
                                type="text"
                                autocomplete="family-name"
                                prop:value=move || last_name.get()
                                on:input=move |ev| last_name.set(event_target_value(&ev))
                            />
                        </label>
                    </div>
                    <label class="auth-form__label">
                        "Email"
                        <input
                            class="auth-input"
                            type="email"
                            autocomplete="email"
                            prop:value=move || email.get()
                            on:input=move |ev| email.set(event_target_value(&ev))
                        />
                    </label>
                    <label class="auth-form__label">
                        "Password"
                        <input
                            class="auth-input"
                            type="password"
                            autocomplete="new-password"
                            prop:value=move || password.get()
                            on:input=move |ev| password.set(event_target_value(&ev))
                        />
                    </label>
                    <label class="auth-form__label">
                        "Confirm password"
                        <input
                            class="auth-input"
                            type="password"
                            autocomplete="new-password"
                            prop:value=move || confirm.get()
                            on:input=move |ev| confirm.set(event_target_value(&ev))
                        />
                    </label>
                    <button class="auth-button" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { "Creating account..." } else { "Create account" }}
                    </button>
                    <p class="auth-card__footer">
                        "Already have an account? "
                        <a href="/login">"Log in"</a>
                    </p>
                </form>
            </main>
        </div>
    }
}
