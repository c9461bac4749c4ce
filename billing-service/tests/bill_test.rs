mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn creates_bill_with_gst_totals() {
    let app = TestApp::spawn();
    let admin = app.admin_cookie().await;
    let user = app.user_cookie().await;
    let a = app.create_item(&admin, "A", "120.00", "100.00").await;
    let b = app.create_item(&admin, "B", "300.00", "250.50").await;

    let response = app
        .post(
            "/api/bills",
            json!({
                "invoice_no": "INV-001",
                "customer_name": "Sharma Electronics",
                "location": "Indore",
                "selected_items": [
                    { "id": a, "quantity": 2 },
                    { "id": b, "quantity": 1 }
                ]
            }),
            Some(&user),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let bill = &response.body;
    assert_eq!(bill["subtotal"], "450.50");
    assert_eq!(bill["tax_amount"], "81.09");
    assert_eq!(bill["net_amount"], "531.59");
    assert_eq!(bill["paid"], false);
    assert_eq!(bill["to"], "Sharma Electronics");
    assert_eq!(bill["address"], "Indore");
    assert_eq!(bill["line_items"].as_array().unwrap().len(), 2);
    assert_eq!(bill["line_items"][0]["line_total"], "200.00");
    assert_eq!(bill["billed_by"]["role"], "USER");
}

#[tokio::test]
async fn explicit_zero_tax_is_kept() {
    let app = TestApp::spawn();
    let admin = app.admin_cookie().await;
    let a = app.create_item(&admin, "A", "120.00", "100.00").await;

    let response = app
        .post(
            "/api/bills",
            json!({
                "invoice_no": "INV-002",
                "customer_name": "Exempt Co",
                "tax_amount": "0",
                "selected_items": [{ "id": a, "quantity": 3 }]
            }),
            Some(&admin),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["tax_amount"], "0");
    assert_eq!(response.body["net_amount"], "300.00");
}

#[tokio::test]
async fn unknown_items_only_is_not_found() {
    let app = TestApp::spawn();
    let user = app.user_cookie().await;

    let response = app
        .post(
            "/api/bills",
            json!({
                "invoice_no": "INV-003",
                "customer_name": "Nobody",
                "selected_items": [{ "id": uuid::Uuid::new_v4(), "quantity": 1 }]
            }),
            Some(&user),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "No valid items found");
}

#[tokio::test]
async fn missing_required_fields_fail_validation() {
    let app = TestApp::spawn();
    let user = app.user_cookie().await;

    let response = app
        .post(
            "/api/bills",
            json!({ "invoice_no": "", "customer_name": "X", "selected_items": [] }),
            Some(&user),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn out_of_range_amounts_are_rejected() {
    let app = TestApp::spawn();
    let admin = app.admin_cookie().await;
    let a = app
        .create_item(&admin, "Turbine", "10000000000", "10000000000")
        .await;

    let response = app
        .post(
            "/api/bills",
            json!({
                "invoice_no": "INV-004",
                "customer_name": "Big Order",
                "selected_items": [{ "id": a, "quantity": i64::MAX }]
            }),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let b = app.create_item(&admin, "Cable", "1.00", "1.00").await;
    let response = app
        .post(
            "/api/bills",
            json!({
                "invoice_no": "INV-005",
                "customer_name": "Big Tax",
                "tax_amount": rust_decimal::Decimal::MAX.to_string(),
                "selected_items": [{ "id": b, "quantity": 1 }]
            }),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let bills = app.get("/api/bills", Some(&admin)).await;
    assert_eq!(bills.body["bills"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn bill_can_be_paid_exactly_once() {
    let app = TestApp::spawn();
    let admin = app.admin_cookie().await;
    let user = app.user_cookie().await;
    let a = app.create_item(&admin, "A", "10", "10").await;

    let created = app
        .post(
            "/api/bills",
            json!({
                "invoice_no": "INV-004",
                "customer_name": "Payer",
                "selected_items": [{ "id": a }]
            }),
            Some(&user),
        )
        .await;
    let bill_id = created.body["id"].as_str().unwrap().to_string();

    let first = app
        .put(&format!("/api/bills/{}/pay", bill_id), json!({}), Some(&user))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["paid"], true);

    let second = app
        .put(&format!("/api/bills/{}/pay", bill_id), json!({}), Some(&user))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["error"], "Bill is already paid");

    let fetched = app.get(&format!("/api/bills/{}", bill_id), Some(&user)).await;
    assert_eq!(fetched.body["paid"], true);
}

#[tokio::test]
async fn paying_unknown_bill_is_not_found() {
    let app = TestApp::spawn();
    let user = app.user_cookie().await;

    let response = app
        .put(
            &format!("/api/bills/{}/pay", uuid::Uuid::new_v4()),
            json!({}),
            Some(&user),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bills_are_listed_newest_first() {
    let app = TestApp::spawn();
    let admin = app.admin_cookie().await;
    let a = app.create_item(&admin, "A", "10", "10").await;

    for invoice_no in ["INV-A", "INV-B", "INV-C"] {
        let response = app
            .post(
                "/api/bills",
                json!({
                    "invoice_no": invoice_no,
                    "customer_name": "Repeat Customer",
                    "selected_items": [{ "id": a, "quantity": 1 }]
                }),
                Some(&admin),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let list = app.get("/api/bills", Some(&admin)).await;
    assert_eq!(list.status, StatusCode::OK);
    let numbers: Vec<&str> = list.body["bills"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["invoice_no"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["INV-C", "INV-B", "INV-A"]);
    assert_eq!(list.body["bills"][0]["billed_by"]["role"], "ADMIN");
}

#[tokio::test]
async fn bills_require_login() {
    let app = TestApp::spawn();
    assert_eq!(app.get("/api/bills", None).await.status, StatusCode::UNAUTHORIZED);
}
