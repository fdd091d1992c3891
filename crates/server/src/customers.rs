use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use clientele_core::domain::customer::{CustomerDraft, CustomerId, CustomerRequest, CustomerView};
use clientele_core::errors::{ApplicationError, DomainError, InterfaceError};
use clientele_core::validation::FieldViolation;

use crate::service::CustomerService;

pub const CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

#[derive(Clone)]
pub struct CustomersState {
    service: CustomerService,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorBody {
    pub errors: Vec<FieldViolation>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Failure response carrying the correlation id that was logged alongside it.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let correlation_id = self.0.correlation_id().to_owned();
        let message = self.0.user_message();

        let mut response = match self.0 {
            InterfaceError::BadRequest { violations, .. } => {
                (StatusCode::BAD_REQUEST, Json(ValidationErrorBody { errors: violations }))
                    .into_response()
            }
            InterfaceError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, Json(ErrorBody { error: message })).into_response()
            }
            InterfaceError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: message }))
                    .into_response()
            }
        };

        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
            response.headers_mut().insert(CORRELATION_HEADER, value);
        }
        response
    }
}

pub fn router(service: CustomerService) -> Router {
    Router::new()
        .route("/customers", get(find_customer).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .with_state(CustomersState { service })
}

pub async fn create_customer(
    State(state): State<CustomersState>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerView>), ApiError> {
    let correlation_id = new_correlation_id();
    let fail = |error: ApplicationError| reject(error, &correlation_id, "create");
    let draft = draft_from(payload).map_err(fail)?;
    let created = state.service.create(draft).await.map_err(fail)?;

    debug!(
        event_name = "api.customers.create",
        correlation_id = %correlation_id,
        customer_id = %created.id,
        "customer create request completed"
    );
    Ok((StatusCode::CREATED, Json(state.service.to_view(created))))
}

pub async fn get_customer(
    State(state): State<CustomersState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CustomerView>, ApiError> {
    let correlation_id = new_correlation_id();
    let fail = |error: ApplicationError| reject(error, &correlation_id, "get");
    let id = customer_id_from(id).map_err(fail)?;
    let customer = state.service.get_by_id(id).await.map_err(fail)?;

    Ok(Json(state.service.to_view(customer)))
}

/// `name` wins when both query parameters are supplied.
pub async fn find_customer(
    State(state): State<CustomersState>,
    query: Result<Query<CustomerQuery>, QueryRejection>,
) -> Result<Json<CustomerView>, ApiError> {
    let correlation_id = new_correlation_id();
    let fail = |error: ApplicationError| reject(error, &correlation_id, "find");
    let Query(query) = query
        .map_err(|rejection| {
            ApplicationError::from(DomainError::Validation(vec![FieldViolation::new(
                "query",
                rejection.body_text(),
            )]))
        })
        .map_err(fail)?;

    let customer = match (query.name, query.email) {
        (Some(name), _) => state.service.get_by_name(&name).await,
        (None, Some(email)) => state.service.get_by_email(&email).await,
        (None, None) => Err(DomainError::Validation(vec![FieldViolation::new(
            "name",
            "either name or email query parameter is required",
        )])
        .into()),
    }
    .map_err(fail)?;

    Ok(Json(state.service.to_view(customer)))
}

pub async fn update_customer(
    State(state): State<CustomersState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<Json<CustomerView>, ApiError> {
    let correlation_id = new_correlation_id();
    let fail = |error: ApplicationError| reject(error, &correlation_id, "update");
    let id = customer_id_from(id).map_err(fail)?;
    let draft = draft_from(payload).map_err(fail)?;
    let updated = state.service.update(id, draft).await.map_err(fail)?;

    debug!(
        event_name = "api.customers.update",
        correlation_id = %correlation_id,
        customer_id = %updated.id,
        "customer update request completed"
    );
    Ok(Json(state.service.to_view(updated)))
}

pub async fn delete_customer(
    State(state): State<CustomersState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = new_correlation_id();
    let fail = |error: ApplicationError| reject(error, &correlation_id, "delete");
    let id = customer_id_from(id).map_err(fail)?;
    state.service.delete(id).await.map_err(fail)?;

    Ok(StatusCode::NO_CONTENT)
}

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

fn customer_id_from(
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<CustomerId, ApplicationError> {
    match id {
        Ok(Path(id)) => Ok(CustomerId(id)),
        Err(rejection) => Err(DomainError::Validation(vec![FieldViolation::new(
            "id",
            format!("must be a valid UUID: {}", rejection.body_text()),
        )])
        .into()),
    }
}

fn draft_from(
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<CustomerDraft, ApplicationError> {
    let Json(request) = payload.map_err(|rejection| {
        DomainError::Validation(vec![FieldViolation::new("body", rejection.body_text())])
    })?;
    request.into_draft().map_err(|violations| DomainError::Validation(violations).into())
}

fn reject(error: ApplicationError, correlation_id: &str, operation: &'static str) -> ApiError {
    match &error {
        ApplicationError::Persistence(detail) => error!(
            event_name = "api.customers.failed",
            correlation_id = %correlation_id,
            operation,
            error = %detail,
            "customer request failed"
        ),
        other => warn!(
            event_name = "api.customers.rejected",
            correlation_id = %correlation_id,
            operation,
            reason = %other,
            "customer request rejected"
        ),
    }
    ApiError(error.into_interface(correlation_id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use clientele_core::clock::FixedClock;
    use clientele_db::repositories::InMemoryCustomerRepository;

    use super::{router, CORRELATION_HEADER};
    use crate::service::CustomerService;

    fn app() -> Router {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).single().expect("valid instant");
        router(CustomerService::new(
            Arc::new(InMemoryCustomerRepository::default()),
            Arc::new(FixedClock(now)),
        ))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send_text(app, method, uri, body.map(|body| body.to_string())).await
    }

    /// Sends the body verbatim, so numeric literals reach the server exactly as written.
    async fn send_text(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body)),
            None => request.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, payload)
    }

    #[tokio::test]
    async fn create_returns_created_view_with_tier() {
        let app = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/customers",
            Some(json!({
                "name": "Alice",
                "email": "alice@example.com",
                "annualSpend": 2000,
                "lastPurchaseDate": "2026-07-19T12:00:00Z"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Alice");
        assert_eq!(body["annualSpend"].to_string(), "2000");
        assert_eq!(body["tier"], "Gold");
        assert!(body["id"].as_str().is_some_and(|id| id.len() == 36));
    }

    #[tokio::test]
    async fn spend_just_below_platinum_threshold_stays_gold() {
        let app = app();
        let payload = r#"{
            "name": "Dana",
            "email": "dana@example.com",
            "annualSpend": 9999.999999999999999,
            "lastPurchaseDate": "2026-09-19T12:00:00Z"
        }"#;

        let (status, body) =
            send_text(&app, Method::POST, "/customers", Some(payload.to_string())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["annualSpend"].to_string(), "9999.999999999999999");
        assert_eq!(body["tier"], "Gold");
    }

    #[tokio::test]
    async fn large_spend_is_returned_digit_for_digit() {
        let app = app();
        let payload = r#"{
            "name": "Eve",
            "email": "eve@example.com",
            "annualSpend": 12345678901234567.89
        }"#;

        let (status, created) =
            send_text(&app, Method::POST, "/customers", Some(payload.to_string())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["annualSpend"].to_string(), "12345678901234567.89");

        let uri = format!("/customers/{}", created["id"].as_str().expect("id"));
        let (status, fetched) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["annualSpend"].to_string(), "12345678901234567.89");
    }

    #[tokio::test]
    async fn create_with_invalid_fields_lists_each_violation() {
        let app = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/customers",
            Some(json!({ "name": "  ", "email": "not-an-email" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .expect("errors array")
            .iter()
            .filter_map(|violation| violation["field"].as_str())
            .collect();
        assert_eq!(fields, vec!["email", "name"]);
    }

    #[tokio::test]
    async fn malformed_json_is_reported_as_body_violation() {
        let app = app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/customers")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\":"))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key(CORRELATION_HEADER));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["errors"][0]["field"], "body");
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found_with_message() {
        let app = app();
        let uri = "/customers/00000000-0000-0000-0000-000000000000";

        let (status, body) = send(&app, Method::GET, uri, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["error"],
            "customer not found with id: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[tokio::test]
    async fn get_with_non_uuid_path_is_bad_request() {
        let app = app();

        let (status, body) = send(&app, Method::GET, "/customers/not-a-uuid", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "id");
    }

    #[tokio::test]
    async fn query_by_name_takes_precedence_over_email() {
        let app = app();
        send(
            &app,
            Method::POST,
            "/customers",
            Some(json!({ "name": "Alice", "email": "alice@example.com" })),
        )
        .await;
        send(
            &app,
            Method::POST,
            "/customers",
            Some(json!({ "name": "Bob", "email": "bob@example.com" })),
        )
        .await;

        let (status, body) =
            send(&app, Method::GET, "/customers?name=Alice&email=bob@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Alice");
        assert_eq!(body["tier"], "Silver");

        let (status, body) =
            send(&app, Method::GET, "/customers?email=bob@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Bob");
    }

    #[tokio::test]
    async fn query_without_parameters_is_bad_request() {
        let app = app();

        let (status, body) = send(&app, Method::GET, "/customers", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"].as_array().is_some_and(|errors| !errors.is_empty()));
    }

    #[tokio::test]
    async fn undecodable_query_is_bad_request_with_field_errors() {
        let app = app();

        let (status, body) =
            send(&app, Method::GET, "/customers?name=Alice&name=Bob", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "query");
        assert!(body["errors"][0]["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn query_miss_names_the_lookup_key() {
        let app = app();

        let (status, body) = send(&app, Method::GET, "/customers?name=Nobody", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "customer not found with name: Nobody");
    }

    #[tokio::test]
    async fn update_replaces_record_and_clears_omitted_fields() {
        let app = app();
        let (_, created) = send(
            &app,
            Method::POST,
            "/customers",
            Some(json!({
                "name": "Bob",
                "email": "bob@example.com",
                "annualSpend": 15000,
                "lastPurchaseDate": "2026-09-01T08:00:00+01:00"
            })),
        )
        .await;
        assert_eq!(created["tier"], "Platinum");
        let uri = format!("/customers/{}", created["id"].as_str().expect("id"));

        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "name": "Robert", "email": "robert@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], created["id"]);
        assert_eq!(body["name"], "Robert");
        assert_eq!(body["annualSpend"], Value::Null);
        assert_eq!(body["lastPurchaseDate"], Value::Null);
        assert_eq!(body["tier"], "Silver");
    }

    #[tokio::test]
    async fn update_validates_before_lookup() {
        let app = app();

        let (status, body) = send(
            &app,
            Method::PUT,
            "/customers/00000000-0000-0000-0000-000000000000",
            Some(json!({ "email": "robert@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "name");
    }

    #[tokio::test]
    async fn delete_returns_no_content_then_not_found() {
        let app = app();
        let (_, created) = send(
            &app,
            Method::POST,
            "/customers",
            Some(json!({ "name": "Carol", "email": "carol@example.com" })),
        )
        .await;
        let uri = format!("/customers/{}", created["id"].as_str().expect("id"));

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
