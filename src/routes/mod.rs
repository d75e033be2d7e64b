pub mod admin;
pub mod cart;
pub mod categories;
pub mod health;
pub mod login;
pub mod orders;
pub mod products;
pub mod profile;
pub mod register;
pub mod tokens;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::AppState;

pub fn create_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/register", post(register::register_user))
        .route("/auth/login", post(login::login_user))
        .route("/auth/refresh", post(tokens::refresh_token))
        .route("/auth/logout", post(tokens::logout_user))
        .route("/products", get(products::get_products))
        .route("/products/{id}", get(products::get_product))
        .route("/categories", get(categories::get_categories));

    let authenticated = Router::new()
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/cart", get(cart::get_cart))
        .route("/cart/items", post(cart::add_to_cart))
        .route(
            "/cart/items/{id}",
            put(cart::update_cart_item).delete(cart::remove_cart_item),
        )
        .route(
            "/orders",
            post(orders::create_order).get(orders::get_orders),
        )
        .route("/orders/{id}", get(orders::get_order))
        .layer(from_fn_with_state(
            state.clone(),
            crate::middleware::auth_middleware,
        ));

    let admin = Router::new()
        .route("/admin/categories", post(admin::create_category))
        .route(
            "/admin/categories/{id}",
            put(admin::update_category).delete(admin::delete_category),
        )
        .route("/admin/products", post(admin::create_product))
        .route(
            "/admin/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route(
            "/admin/products/{id}/images",
            post(admin::upload_product_image),
        )
        .layer(from_fn_with_state(
            state.clone(),
            crate::middleware::admin_middleware,
        ));

    Router::new().merge(public).merge(authenticated).merge(admin)
}
