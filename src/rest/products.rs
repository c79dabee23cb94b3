use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use super::{
    error::ApiError,
    extract::{ApiJson, ApiPath},
    handlers::{assigned_id, category_names, product_dto, with_uow},
    models::{CreateProductDto, ProductDto, UpdateProductDto},
    AppState,
};
use crate::{
    model::{CategoryField, Product, ProductField},
    storage::{Filter, Repository, Storage, UnitOfWork},
};

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("product {id} not found"))
}

fn ensure_category<U: UnitOfWork>(uow: &U, category_id: i64) -> Result<(), ApiError> {
    if !uow
        .categories()
        .exists(&Filter::eq(CategoryField::Id, category_id))?
    {
        return Err(ApiError::BadRequest("Category does not exist".to_string()));
    }
    Ok(())
}

pub async fn list_products<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<ProductDto>>, ApiError> {
    let products = with_uow(state.storage, |uow| {
        let names = category_names(uow)?;
        let products = uow.products().get_all()?;
        Ok(products
            .into_iter()
            .map(|product| {
                let name = names.get(&product.category_id).cloned();
                ProductDto::new(product, name)
            })
            .collect::<Vec<_>>())
    })
    .await?;
    Ok(Json(products))
}

pub async fn get_product<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ProductDto>, ApiError> {
    let dto = with_uow(state.storage, move |uow| {
        let product = uow.products().get_by_id(id)?.ok_or_else(|| not_found(id))?;
        product_dto(uow, product)
    })
    .await?;
    Ok(Json(dto))
}

pub async fn list_products_by_category<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(category_id): ApiPath<i64>,
) -> Result<Json<Vec<ProductDto>>, ApiError> {
    let products = with_uow(state.storage, move |uow| {
        let products = uow
            .products()
            .find(&Filter::eq(ProductField::CategoryId, category_id))?;
        let category_name = uow
            .categories()
            .get_by_id(category_id)?
            .map(|category| category.name);
        Ok(products
            .into_iter()
            .map(|product| ProductDto::new(product, category_name.clone()))
            .collect::<Vec<_>>())
    })
    .await?;
    Ok(Json(products))
}

pub async fn create_product<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(dto): ApiJson<CreateProductDto>,
) -> Result<impl IntoResponse, ApiError> {
    dto.validate()?;

    let created = with_uow(state.storage, move |uow| {
        ensure_category(uow, dto.category_id)?;

        let product = Product::new(dto.name, dto.description, dto.price, dto.category_id);
        let pending = uow.products().add(product)?;
        uow.complete()?;
        let id = assigned_id(&pending, "product")?;
        let product = uow.products().get_by_id(id)?.ok_or_else(|| not_found(id))?;
        product_dto(uow, product)
    })
    .await?;

    log::info!("Created product {} ({})", created.id, created.name);
    let location = format!("/api/products/{}", created.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)))
}

pub async fn update_product<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(dto): ApiJson<UpdateProductDto>,
) -> Result<StatusCode, ApiError> {
    if id != dto.id {
        return Err(ApiError::BadRequest(format!(
            "path id {id} does not match body id {}",
            dto.id
        )));
    }
    dto.validate()?;

    with_uow(state.storage, move |uow| {
        let mut product = uow.products().get_by_id(id)?.ok_or_else(|| not_found(id))?;
        ensure_category(uow, dto.category_id)?;

        let replacement = Product::new(dto.name, dto.description, dto.price, dto.category_id);
        product = Product { id: product.id, ..replacement };
        uow.products().update(product)?;
        uow.complete()?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_product<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    with_uow(state.storage, move |uow| {
        let product = uow.products().get_by_id(id)?.ok_or_else(|| not_found(id))?;
        uow.products().delete(&product)?;
        uow.complete()?;
        Ok(())
    })
    .await?;

    log::info!("Deleted product {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{json_request, read_json, send, test_router};
    use super::*;
    use crate::rest::models::ErrorResponse;
    use axum::{http::Method, Router};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    async fn seed_category(router: &Router, name: &str) {
        let body = format!(r#"{{"name":"{name}"}}"#);
        let response = send(router, json_request(Method::POST, "/api/categories", &body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    async fn create(router: &Router, body: &str) -> axum::response::Response {
        send(router, json_request(Method::POST, "/api/products", body)).await
    }

    #[tokio::test]
    async fn create_get_update_delete_product() {
        let (router, _dir) = test_router();
        seed_category(&router, "Tools").await;

        let response = create(&router, r#"{"name":"Hammer","price":9.99,"categoryId":1}"#).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/products/1"
        );
        let created: ProductDto = read_json(response).await;
        assert_eq!(created.id, 1);
        assert_eq!(created.price, Decimal::from_str("9.99").unwrap());
        assert_eq!(created.category_name.as_deref(), Some("Tools"));

        let response = send(
            &router,
            json_request(
                Method::PUT,
                "/api/products/1",
                r#"{"id":1,"name":"Hammer","price":12.50,"categoryId":1}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&router, json_request(Method::GET, "/api/products/1", "")).await;
        let fetched: ProductDto = read_json(response).await;
        assert_eq!(fetched.price, Decimal::from_str("12.50").unwrap());
        assert_eq!(fetched.name, "Hammer");

        let response = send(&router, json_request(Method::DELETE, "/api/products/1", "")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&router, json_request(Method::GET, "/api/products/1", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_with_unknown_category_is_rejected() {
        let (router, _dir) = test_router();
        let response = create(&router, r#"{"name":"Hammer","price":9.99,"categoryId":5}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload: ErrorResponse = read_json(response).await;
        assert_eq!(payload.message, "Category does not exist");
    }

    #[tokio::test]
    async fn create_with_negative_price_is_rejected() {
        let (router, _dir) = test_router();
        seed_category(&router, "Tools").await;
        let response = create(&router, r#"{"name":"Hammer","price":-1,"categoryId":1}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_with_mismatched_id_is_rejected() {
        let (router, _dir) = test_router();
        seed_category(&router, "Tools").await;
        create(&router, r#"{"name":"Hammer","price":9.99,"categoryId":1}"#).await;

        let response = send(
            &router,
            json_request(
                Method::PUT,
                "/api/products/1",
                r#"{"id":2,"name":"Hammer","price":9.99,"categoryId":1}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_to_unknown_category_is_rejected() {
        let (router, _dir) = test_router();
        seed_category(&router, "Tools").await;
        create(&router, r#"{"name":"Hammer","price":9.99,"categoryId":1}"#).await;

        let response = send(
            &router,
            json_request(
                Method::PUT,
                "/api/products/1",
                r#"{"id":1,"name":"Hammer","price":9.99,"categoryId":7}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_includes_category_names_and_filters_by_category() {
        let (router, _dir) = test_router();
        seed_category(&router, "Tools").await;
        seed_category(&router, "Garden").await;
        create(&router, r#"{"name":"Hammer","price":9.99,"categoryId":1}"#).await;
        create(&router, r#"{"name":"Rake","price":19.99,"categoryId":2}"#).await;
        create(&router, r#"{"name":"Saw","price":24.5,"categoryId":1}"#).await;

        let response = send(&router, json_request(Method::GET, "/api/products", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let all: Vec<ProductDto> = read_json(response).await;
        let summary = all
            .iter()
            .map(|p| (p.name.as_str(), p.category_name.as_deref()))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("Hammer", Some("Tools")),
                ("Rake", Some("Garden")),
                ("Saw", Some("Tools")),
            ]
        );

        let response = send(
            &router,
            json_request(Method::GET, "/api/products/category/1", ""),
        )
        .await;
        let tools: Vec<ProductDto> = read_json(response).await;
        let names = tools.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Hammer", "Saw"]);

        let response = send(
            &router,
            json_request(Method::GET, "/api/products/category/42", ""),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let none: Vec<ProductDto> = read_json(response).await;
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn eighteen_digit_prices_survive_http() {
        let (router, _dir) = test_router();
        seed_category(&router, "Boats").await;

        let response = create(
            &router,
            r#"{"name":"Yacht","price":1234567890123456.78,"categoryId":1}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: ProductDto = read_json(response).await;
        let expected = Decimal::from_str("1234567890123456.78").unwrap();
        assert_eq!(created.price, expected);

        let response = send(&router, json_request(Method::GET, "/api/products/1", "")).await;
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["price"].to_string(), "1234567890123456.78");
    }
}
