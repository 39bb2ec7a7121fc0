// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{AppError, attach_request_path},
    handlers::{admin, auth, bookmark, follow, notification, profile, prompt, rating},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

async fn not_found() -> AppError {
    AppError::NotFound("Resource not found".to_string())
}

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, prompts, users, notifications, admin).
/// * Applies global middleware (error path, Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Cloned onto every protected method router. Public GETs stay outside it
    // and personalize via the OptionalUser extractor instead.
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh));

    let prompt_routes = Router::new()
        .route(
            "/",
            get(prompt::list_prompts)
                .merge(post(prompt::create_prompt).layer(require_auth.clone())),
        )
        .route(
            "/{id}",
            get(prompt::get_prompt).merge(
                put(prompt::update_prompt)
                    .delete(prompt::delete_prompt)
                    .layer(require_auth.clone()),
            ),
        )
        .route(
            "/{id}/like",
            post(prompt::toggle_like).layer(require_auth.clone()),
        )
        .route(
            "/{id}/bookmark",
            post(bookmark::toggle_bookmark).layer(require_auth.clone()),
        )
        .route(
            "/{id}/ratings",
            get(rating::list_ratings).merge(
                post(rating::create_rating)
                    .put(rating::update_rating)
                    .delete(rating::delete_rating)
                    .layer(require_auth.clone()),
            ),
        )
        .route("/{id}/ratings/stats", get(rating::get_rating_stats));

    let user_routes = Router::new()
        .route(
            "/me",
            get(profile::get_me)
                .put(profile::update_me)
                .layer(require_auth.clone()),
        )
        .route(
            "/me/prompts",
            get(profile::list_my_prompts).layer(require_auth.clone()),
        )
        .route(
            "/me/bookmarks",
            get(bookmark::list_my_bookmarks).layer(require_auth.clone()),
        )
        .route(
            "/me/bookmarks/{prompt_id}/folder",
            put(bookmark::move_bookmark).layer(require_auth.clone()),
        )
        .route(
            "/me/bookmark-folders",
            get(bookmark::list_folders)
                .post(bookmark::create_folder)
                .layer(require_auth.clone()),
        )
        .route(
            "/me/bookmark-folders/{id}",
            put(bookmark::rename_folder)
                .delete(bookmark::delete_folder)
                .layer(require_auth.clone()),
        )
        .route("/{id}", get(profile::get_user))
        .route("/{id}/prompts", get(profile::list_user_prompts))
        .route("/{id}/followers", get(follow::list_followers))
        .route("/{id}/following", get(follow::list_following))
        .route(
            "/{id}/follow",
            post(follow::follow_user)
                .delete(follow::unfollow_user)
                .layer(require_auth.clone()),
        );

    let notification_routes = Router::new()
        .route("/", get(notification::list_notifications))
        .route("/unread-count", get(notification::unread_count))
        .route("/read-all", put(notification::mark_all_read))
        .route("/{id}/read", put(notification::mark_read))
        .layer(require_auth.clone());

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}/active", put(admin::set_user_active))
        .route("/prompts/{id}", delete(admin::delete_prompt))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/prompts", prompt_routes)
        .nest("/api/users", user_routes)
        .nest("/api/notifications", notification_routes)
        .nest("/api/admin", admin_routes)
        .fallback(not_found)
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn(attach_request_path))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
