mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use car_rental::repositories::BookingRepository;
use car_rental::routes::create_router;
use common::{GatewayMode, TestApp, CALLBACK_TOKEN};

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn register_and_login(router: &Router, email: &str) -> String {
    let (status, _) = send(
        router,
        post_json(
            "/users/register",
            json!({"name": "Budi", "email": email, "password": "rahasia"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        router,
        post_json("/users/login", json!({"email": email, "password": "rahasia"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new(GatewayMode::Succeed);
    let router = create_router(app.state.clone());

    let (status, body) = send(
        &router,
        post_json(
            "/users/register",
            json!({"name": "Budi", "email": "not-an-email", "password": "abc"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, body) = send(
        &router,
        post_json(
            "/users/register",
            json!({"name": "   ", "email": "budi@example.com", "password": "rahasia"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(app
        .repo
        .find_user_by_email("budi@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new(GatewayMode::Succeed);
    let router = create_router(app.state.clone());

    let (status, body) = send(&router, get("/users/profile", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(&router, get("/rentals", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_and_payment_over_http() {
    let app = TestApp::new(GatewayMode::Succeed);
    let car = app.add_vehicle(1, 250_000).await;
    let router = create_router(app.state.clone());
    let token = register_and_login(&router, "lina@example.com").await;

    let (status, body) = send(
        &router,
        get("/cars?start_date=2024-09-01&end_date=2024-09-03", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["remaining"], 1);

    let (status, body) = send(
        &router,
        post_json(
            "/rentals",
            json!({"car_id": car.id, "start_date": "2024-09-01", "end_date": "2024-09-03"}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["car_name"], "Toyota Avanza");
    assert_eq!(body["data"]["total_price"], 500000.0);
    assert_eq!(body["data"]["payment"]["status"], "Unpaid");
    let payment_id = body["data"]["payment"]["payment_id"].as_str().unwrap().to_string();
    assert!(body["data"]["payment"]["payment_url"]
        .as_str()
        .unwrap()
        .ends_with(&payment_id));

    let (status, body) = send(
        &router,
        post_json(
            "/rentals",
            json!({"car_id": car.id, "start_date": "2024-09-02", "end_date": "2024-09-04"}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "car is not available");

    let (status, body) = send(
        &router,
        get(
            &format!("/cars/{}/availability?start_date=2024-09-03&end_date=2024-09-05", car.id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);

    // Webhook sin token
    let webhook = json!({
        "id": "inv-1",
        "external_id": payment_id,
        "payment_method": "BANK_TRANSFER",
        "paid_amount": 500000,
        "status": "PAID"
    });
    let (status, _) = send(&router, post_json("/payments/callback", webhook.clone(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let callback = || {
        Request::builder()
            .method("POST")
            .uri("/payments/callback")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-callback-token", CALLBACK_TOKEN)
            .body(Body::from(webhook.to_string()))
            .unwrap()
    };

    let (status, body) = send(&router, callback()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "payment updated successfully");
    assert_eq!(body["payment"]["payment_id"], payment_id);
    assert_eq!(body["payment"]["paid_amount"], 500000.0);

    let (status, body) = send(&router, callback()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "payment already updated");

    // Pagado: el listado ya no expone la URL
    let (status, body) = send(&router, get("/rentals", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["car_name"], "Toyota Avanza");
    assert_eq!(body[0]["payment"]["status"], "Completed");
    assert!(body[0]["payment"]["payment_url"].is_null());
}

#[tokio::test]
async fn test_failed_invoice_returns_bad_gateway_and_can_be_retried() {
    let app = TestApp::new(GatewayMode::Fail);
    let car = app.add_vehicle(1, 100_000).await;
    let router = create_router(app.state.clone());
    let token = register_and_login(&router, "mira@example.com").await;

    let (status, body) = send(
        &router,
        post_json(
            "/rentals",
            json!({"car_id": car.id, "start_date": "2024-12-01", "end_date": "2024-12-02"}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    let payment_id = body["details"]["payment_id"].as_str().unwrap().to_string();

    app.gateway.set_mode(GatewayMode::Succeed);
    let (status, body) = send(
        &router,
        post_json(&format!("/payments/{}/invoice", payment_id), json!({}), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["invoice_issued"], true);
}

#[tokio::test]
async fn test_cars_listing_rejects_single_bound() {
    let app = TestApp::new(GatewayMode::Succeed);
    app.add_vehicle(1, 100_000).await;
    let router = create_router(app.state.clone());

    let (status, _) = send(&router, get("/cars?start_date=2024-09-01", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        get("/cars?start_date=2024-09-05&end_date=2024-09-01", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_and_top_up() {
    let app = TestApp::new(GatewayMode::Succeed);
    let router = create_router(app.state.clone());
    let token = register_and_login(&router, "nina@example.com").await;

    let (status, body) = send(&router, get("/users/profile", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "nina@example.com");
    assert_eq!(body["data"]["deposit"], 0.0);
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = send(
        &router,
        post_json("/users/topup", json!({"amount": 75000}), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["amount"], 75000.0);
    assert_eq!(body["data"]["payment"]["status"], "Unpaid");
}
