//! Root application component with routing and context providers.
//!
//! SYSTEM CONTEXT
//! ==============
//! `App` owns the two auth contexts every page reads: the `AuthState` signal
//! (a mirror of the session store's snapshots) and the `AuthHandle` used for
//! dispatch. In the browser it builds the store from `/api/config`, runs the
//! initial load and then copies every committed snapshot into the signal.
//! During SSR no store exists and the signal stays in its loading state, so
//! guarded routes render the neutral loading view on both sides of hydration.

use auth::guard::{
    DASHBOARD_PATH, FORGOT_PASSWORD_PATH, HOME_PATH, LOGIN_PATH, REGISTER_PATH, RESET_PASSWORD_PATH,
    policy_for,
};
use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};

use crate::components::auth_guard::AuthGuard;
use crate::pages::{
    auth_callback::AuthCallbackPage, dashboard::DashboardPage, forgot_password::ForgotPasswordPage, home::HomePage,
    login::LoginPage, register::RegisterPage, reset_password::ResetPasswordPage,
};
use crate::state::auth::{AuthHandle, AuthState};

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Provides the auth contexts and sets up client-side routing. Every route
/// except the callback is wrapped in an `AuthGuard` carrying the policy from
/// the route table; the callback page waits on the store itself.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let auth = RwSignal::new(AuthState::default());
    let handle = RwSignal::new(AuthHandle::default());
    provide_context(auth);
    provide_context(handle);

    #[cfg(feature = "hydrate")]
    start_session(auth, handle);

    view! {
        <Stylesheet id="leptos" href="/pkg/coursehub.css"/>
        <Title text="CourseHub"/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route
                    path=StaticSegment("")
                    view=|| view! { <AuthGuard policy=policy_for(HOME_PATH)><HomePage/></AuthGuard> }
                />
                <Route
                    path=StaticSegment("login")
                    view=|| view! { <AuthGuard policy=policy_for(LOGIN_PATH)><LoginPage/></AuthGuard> }
                />
                <Route
                    path=StaticSegment("register")
                    view=|| view! { <AuthGuard policy=policy_for(REGISTER_PATH)><RegisterPage/></AuthGuard> }
                />
                <Route
                    path=StaticSegment("forgot-password")
                    view=|| {
                        view! {
                            <AuthGuard policy=policy_for(FORGOT_PASSWORD_PATH)>
                                <ForgotPasswordPage/>
                            </AuthGuard>
                        }
                    }
                />
                <Route
                    path=StaticSegment("reset-password")
                    view=|| {
                        view! {
                            <AuthGuard policy=policy_for(RESET_PASSWORD_PATH)>
                                <ResetPasswordPage/>
                            </AuthGuard>
                        }
                    }
                />
                <Route
                    path=StaticSegment("dashboard")
                    view=|| view! { <AuthGuard policy=policy_for(DASHBOARD_PATH)><DashboardPage/></AuthGuard> }
                />
                <Route path=(StaticSegment("auth"), StaticSegment("callback")) view=AuthCallbackPage/>
            </Routes>
        </Router>
    }
}

/// Build the session store, run the initial load and mirror the store into
/// `auth` until the app's owner is cleaned up.
///
/// The change-feed subscription lives in a `StoredValue` owned by `App` and is
/// cancelled from `on_cleanup`. The mirror only holds a receiver, so it ends
/// once the store is gone or `auth` has been disposed.
#[cfg(feature = "hydrate")]
fn start_session(auth: RwSignal<AuthState>, handle: RwSignal<AuthHandle>) {
    use std::ops::ControlFlow;

    use auth::Subscription;

    let subscription = StoredValue::new(None::<Subscription>);
    on_cleanup(move || {
        if let Some(Some(subscription)) = subscription.try_update_value(Option::take) {
            subscription.unsubscribe();
        }
    });

    leptos::task::spawn_local(async move {
        let store = match build_store().await {
            Ok(store) => store,
            Err(e) => {
                log::error!("authentication unavailable: {e}");
                let _ = auth.try_set(AuthState { user: None, loading: false });
                return;
            }
        };
        if handle.try_set(AuthHandle { store: Some(std::sync::Arc::clone(&store)) }).is_some() {
            return;
        }

        let rx = store.subscribe();
        let started = store.initialize().await;
        // Owner already gone: the returned value drops here and cancels.
        if subscription.try_set_value(Some(started)).is_some() {
            return;
        }
        drop(store);

        auth::store::follow(rx, |snapshot| {
            if auth.try_set(AuthState::from(snapshot)).is_some() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await;
    });
}

#[cfg(feature = "hydrate")]
async fn build_store() -> Result<std::sync::Arc<auth::SessionStore>, String> {
    use std::sync::Arc;

    use auth::{AuthConfig, GoTrueClient, SessionStore};

    use crate::util::local_storage::BrowserStorage;

    let config = AuthConfig::from_client_config(crate::net::api::fetch_client_config().await?);
    let site_url = config.site_url.clone();
    let provider = GoTrueClient::new(config, Arc::new(BrowserStorage)).map_err(|e| e.to_string())?;
    Ok(Arc::new(SessionStore::new(Arc::new(provider), site_url)))
}
