//! Route wrapper applying an admission policy.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every routed page is wrapped in `AuthGuard`. The admission decision comes
//! from `auth::evaluate`; this component only renders it and performs the
//! redirect. While auth is loading it shows a neutral indicator and never
//! redirects.

use auth::{AdmissionPolicy, GuardDecision, evaluate};
use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};

use crate::state::auth::AuthState;

/// Path plus query, as carried in the login `redirect` parameter.
pub(crate) fn requested_location(pathname: &str, search: &str) -> String {
    let search = search.trim_start_matches('?');
    if search.is_empty() { pathname.to_owned() } else { format!("{pathname}?{search}") }
}

#[component]
pub fn AuthGuard(policy: AdmissionPolicy, children: ChildrenFn) -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let location = use_location();
    let navigate = use_navigate();

    let decision = Memo::new(move |_| {
        let requested = requested_location(&location.pathname.get(), &location.search.get());
        evaluate(policy, &auth.get(), &requested)
    });

    Effect::new(move || {
        if let GuardDecision::Redirect(target) = decision.get() {
            navigate(&target.href(), NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    move || match decision.get() {
        GuardDecision::Render => children().into_any(),
        GuardDecision::Loading => view! {
            <div class="auth-guard auth-guard--loading" role="status">
                <span class="spinner" aria-hidden="true"></span>
                <span class="auth-guard__label">"Loading..."</span>
            </div>
        }
        .into_any(),
        GuardDecision::Redirect(_) => view! {
            <div class="auth-guard" role="status">"Redirecting..."</div>
        }
        .into_any(),
    }
}

#[cfg(test)]
#[path = "auth_guard_test.rs"]
mod tests;
