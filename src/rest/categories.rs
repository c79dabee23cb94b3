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
    handlers::{assigned_id, with_uow},
    models::{CategoryDto, CreateCategoryDto, UpdateCategoryDto},
    AppState,
};
use crate::{
    model::{Category, CategoryField},
    storage::{ConstraintKind, Filter, Repository, Storage, UnitOfWork},
};

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("category {id} not found"))
}

pub async fn list_categories<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<CategoryDto>>, ApiError> {
    let categories = with_uow(state.storage, |uow| Ok(uow.categories().get_all()?)).await?;
    Ok(Json(categories.into_iter().map(CategoryDto::from).collect()))
}

pub async fn get_category<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<CategoryDto>, ApiError> {
    let category = with_uow(state.storage, move |uow| {
        uow.categories().get_by_id(id)?.ok_or_else(|| not_found(id))
    })
    .await?;
    Ok(Json(category.into()))
}

pub async fn create_category<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(dto): ApiJson<CreateCategoryDto>,
) -> Result<impl IntoResponse, ApiError> {
    dto.validate()?;

    let category = with_uow(state.storage, move |uow| {
        let categories = uow.categories();
        // The unique index is authoritative; this only gives a friendlier error.
        if categories.exists(&Filter::eq(CategoryField::Name, dto.name.clone()))? {
            return Err(ApiError::BadRequest(
                "Category with this name already exists".to_string(),
            ));
        }

        let pending = categories.add(Category::new(dto.name, dto.description))?;
        uow.complete()?;
        let id = assigned_id(&pending, "category")?;
        categories.get_by_id(id)?.ok_or_else(|| not_found(id))
    })
    .await?;

    log::info!("Created category {} ({})", category.id, category.name);
    let location = format!("/api/categories/{}", category.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CategoryDto::from(category)),
    ))
}

pub async fn update_category<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(dto): ApiJson<UpdateCategoryDto>,
) -> Result<StatusCode, ApiError> {
    dto.validate()?;

    with_uow(state.storage, move |uow| {
        let categories = uow.categories();
        let mut category = categories.get_by_id(id)?.ok_or_else(|| not_found(id))?;

        let taken = categories
            .find(&Filter::eq(CategoryField::Name, dto.name.clone()))?
            .iter()
            .any(|other| other.id != id);
        if taken {
            return Err(ApiError::BadRequest(
                "Category with this name already exists".to_string(),
            ));
        }

        category.name = dto.name;
        category.description = dto.description;
        categories.update(category)?;
        uow.complete()?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_category<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    with_uow(state.storage, move |uow| {
        let categories = uow.categories();
        let category = categories.get_by_id(id)?.ok_or_else(|| not_found(id))?;
        categories.delete(&category)?;
        uow.complete().map_err(|err| {
            let referenced = matches!(
                err.integrity(),
                Some(violation) if violation.kind == ConstraintKind::ForeignKey
            );
            if referenced {
                ApiError::Conflict(format!("category {id} is still referenced by products"))
            } else {
                err.into()
            }
        })?;
        Ok(())
    })
    .await?;

    log::info!("Deleted category {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{json_request, read_json, send, test_router};
    use super::*;
    use crate::rest::models::ErrorResponse;
    use axum::http::Method;

    #[tokio::test]
    async fn create_then_get_category() {
        let (router, _dir) = test_router();

        let response = send(
            &router,
            json_request(
                Method::POST,
                "/api/categories",
                r#"{"name":"Tools","description":"Hand tools"}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/categories/1"
        );
        let created: CategoryDto = read_json(response).await;
        assert_eq!(
            created,
            CategoryDto {
                id: 1,
                name: "Tools".to_string(),
                description: Some("Hand tools".to_string()),
            }
        );

        let response = send(&router, json_request(Method::GET, "/api/categories/1", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let fetched: CategoryDto = read_json(response).await;
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_before_staging() {
        let (router, _dir) = test_router();
        let body = r#"{"name":"Tools"}"#;
        send(&router, json_request(Method::POST, "/api/categories", body)).await;

        let response = send(&router, json_request(Method::POST, "/api/categories", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload: ErrorResponse = read_json(response).await;
        assert_eq!(payload.message, "Category with this name already exists");

        let response = send(&router, json_request(Method::GET, "/api/categories", "")).await;
        let all: Vec<CategoryDto> = read_json(response).await;
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn invalid_name_is_a_bad_request() {
        let (router, _dir) = test_router();
        let long = format!(r#"{{"name":"{}"}}"#, "x".repeat(51));
        let response = send(&router, json_request(Method::POST, "/api/categories", &long)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_category_replaces_fields() {
        let (router, _dir) = test_router();
        send(
            &router,
            json_request(
                Method::POST,
                "/api/categories",
                r#"{"name":"Tools","description":"old"}"#,
            ),
        )
        .await;

        let response = send(
            &router,
            json_request(Method::PUT, "/api/categories/1", r#"{"name":"Hand tools"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&router, json_request(Method::GET, "/api/categories/1", "")).await;
        let fetched: CategoryDto = read_json(response).await;
        assert_eq!(fetched.name, "Hand tools");
        assert_eq!(fetched.description, None);
    }

    #[tokio::test]
    async fn update_to_another_categorys_name_is_rejected() {
        let (router, _dir) = test_router();
        send(&router, json_request(Method::POST, "/api/categories", r#"{"name":"Tools"}"#)).await;
        send(&router, json_request(Method::POST, "/api/categories", r#"{"name":"Garden"}"#)).await;

        let response = send(
            &router,
            json_request(Method::PUT, "/api/categories/2", r#"{"name":"Tools"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &router,
            json_request(Method::PUT, "/api/categories/1", r#"{"name":"Tools"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn missing_category_is_not_found() {
        let (router, _dir) = test_router();
        for (method, body) in [
            (Method::GET, ""),
            (Method::PUT, r#"{"name":"Tools"}"#),
            (Method::DELETE, ""),
        ] {
            let response = send(&router, json_request(method, "/api/categories/9", body)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn referenced_category_cannot_be_deleted() {
        let (router, _dir) = test_router();
        send(&router, json_request(Method::POST, "/api/categories", r#"{"name":"Tools"}"#)).await;
        send(
            &router,
            json_request(
                Method::POST,
                "/api/products",
                r#"{"name":"Hammer","price":9.99,"categoryId":1}"#,
            ),
        )
        .await;

        let response = send(&router, json_request(Method::DELETE, "/api/categories/1", "")).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let payload: ErrorResponse = read_json(response).await;
        assert_eq!(payload.message, "category 1 is still referenced by products");

        send(&router, json_request(Method::DELETE, "/api/products/1", "")).await;
        let response = send(&router, json_request(Method::DELETE, "/api/categories/1", "")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&router, json_request(Method::GET, "/api/categories/1", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
