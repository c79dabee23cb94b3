use std::{net::SocketAddr, time::SystemTime};

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;

use crate::storage::Storage;

mod categories;
mod error;
mod extract;
mod handlers;
mod models;
mod products;

pub use error::ApiError;
pub use models::{
    CategoryDto, CreateCategoryDto, CreateProductDto, ErrorResponse, ProductDto,
    UpdateCategoryDto, UpdateProductDto,
};

use categories::{create_category, delete_category, get_category, list_categories, update_category};
use handlers::{health, not_found};
use products::{
    create_product, delete_product, get_product, list_products, list_products_by_category,
    update_product,
};

#[derive(Clone)]
pub struct AppState<S: Storage> {
    pub storage: S,
    pub started_at: SystemTime,
}

/// Builds the catalog routes over `storage`. Every request opens its own
/// unit of work.
pub fn router<S: Storage + Clone + Send + Sync + 'static>(storage: S) -> Router {
    let state = AppState {
        storage,
        started_at: SystemTime::now(),
    };

    let api = Router::new()
        .route(
            "/categories",
            get(list_categories::<S>).post(create_category::<S>),
        )
        .route(
            "/categories/:id",
            get(get_category::<S>)
                .put(update_category::<S>)
                .delete(delete_category::<S>),
        )
        .route(
            "/products",
            get(list_products::<S>).post(create_product::<S>),
        )
        .route(
            "/products/:id",
            get(get_product::<S>)
                .put(update_product::<S>)
                .delete(delete_product::<S>),
        )
        .route(
            "/products/category/:category_id",
            get(list_products_by_category::<S>),
        );

    Router::new()
        .route("/health", get(health::<S>))
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve<S: Storage + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    storage: S,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    log::info!("🌐 REST service on http://{}", addr);

    let app = router(storage);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
