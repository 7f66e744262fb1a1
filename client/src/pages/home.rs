//! Public landing page.

use leptos::prelude::*;

use crate::components::site_header::SiteHeader;
use crate::state::auth::AuthState;

const FEATURES: [(&str, &str); 3] = [
    ("Structured courses", "Modules and materials organised by your instructors."),
    ("Learn at your pace", "Pick up where you left off on any device."),
    ("Track progress", "See enrolments, recent activity and upcoming deadlines."),
];

#[component]
pub fn HomePage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();

    let primary_cta = move || {
        let state = auth.get();
        if !state.loading && state.user.is_some() {
            ("/dashboard", "Go to Dashboard")
        } else {
            ("/register", "Get Started")
        }
    };

    view! {
        <div class="home-page">
            <SiteHeader/>
            <main>
                <section class="hero">
                    <h1 class="hero__title">"Learn anything, anywhere"</h1>
                    <p class="hero__subtitle">"CourseHub brings your courses, materials and progress together."</p>
                    <a class="auth-button" href=move || primary_cta().0>{move || primary_cta().1}</a>
                </section>
                <section class="features">
                    {FEATURES
                        .into_iter()
                        .map(|(title, body)| {
                            view! {
                                <article class="feature-card">
                                    <h2>{title}</h2>
                                    <p>{body}</p>
                                </article>
                            }
                        })
                        .collect_view()}
                </section>
            </main>
        </div>
    }
}
