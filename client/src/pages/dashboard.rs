//! Dashboard page for signed-in learners.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is the authenticated landing route. The route guard only renders it
//! with an identity present, so the page reads the user without re-checking.
//! Signing out navigates explicitly to `/login` after the provider call.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use auth::Identity;
use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::components::site_header::{SiteHeader, spawn_sign_out};
use crate::state::auth::{AuthHandle, AuthState};

pub(crate) fn greeting(user: Option<&Identity>) -> String {
    match user {
        Some(user) => format!("Hello, {}", user.greeting_name()),
        None => "Hello".to_owned(),
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let handle = expect_context::<RwSignal<AuthHandle>>();
    let navigate = use_navigate();

    let on_sign_out = move |_| spawn_sign_out(handle, navigate.clone());

    view! {
        <div class="dashboard-page">
            <SiteHeader/>
            <main class="dashboard-page__main">
                <section class="dashboard-page__welcome">
                    <div>
                        <h1>"Welcome to your Dashboard"</h1>
                        <p class="dashboard-page__greeting">{move || greeting(auth.get().user.as_ref())}</p>
                    </div>
                    <button class="auth-button auth-button--secondary" type="button" on:click=on_sign_out>
                        "Sign Out"
                    </button>
                </section>
                <section class="dashboard-page__cards">
                    <article class="dashboard-card">
                        <h2>"My Courses"</h2>
                        <p>"You haven't enrolled in any courses yet."</p>
                        <a class="auth-button" href="/">"Browse Courses"</a>
                    </article>
                    <article class="dashboard-card">
                        <h2>"Recent Activity"</h2>
                        <p>"No recent activity to display."</p>
                    </article>
                    <article class="dashboard-card">
                        <h2>"Upcoming Deadlines"</h2>
                        <p>"No upcoming deadlines."</p>
                    </article>
                </section>
            </main>
        </div>
    }
}
