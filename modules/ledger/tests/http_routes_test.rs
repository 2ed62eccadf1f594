mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use ledger_rs::LedgerStore;

fn expense_body(company_id: Uuid, reference_id: &str, amount: &str) -> serde_json::Value {
    json!({
        "event_type": "expense.approved",
        "company_id": company_id,
        "amount": amount,
        "date": "2026-03-14",
        "description": "Office supplies",
        "source_reference": {"type": "expense", "id": reference_id}
    })
}

#[tokio::test]
async fn test_health() {
    let ledger = common::ledger();
    let response = common::app(&ledger)
        .oneshot(common::empty_request("GET", "/api/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "ledger-rs");
}

#[tokio::test]
async fn test_account_lifecycle() {
    let ledger = common::ledger();
    let company_id = Uuid::new_v4();

    // Create parent and child
    let response = common::app(&ledger)
        .oneshot(common::json_request(
            "POST",
            "/api/ledger/accounts",
            &json!({
                "company_id": company_id,
                "code": "1000",
                "name": "Current Assets",
                "account_type": "asset"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let parent = common::body_json(response).await;
    assert_eq!(parent["status"], "active");
    assert_eq!(parent["balance_minor"], 0);

    let response = common::app(&ledger)
        .oneshot(common::json_request(
            "POST",
            "/api/ledger/accounts",
            &json!({
                "company_id": company_id,
                "code": "1110",
                "name": "Cash on Hand",
                "account_type": "asset",
                "parent_id": parent["id"]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let child = common::body_json(response).await;

    // Duplicate code
    let response = common::app(&ledger)
        .oneshot(common::json_request(
            "POST",
            "/api/ledger/accounts",
            &json!({
                "company_id": company_id,
                "code": "1110",
                "name": "Petty Cash",
                "account_type": "asset"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Listing carries full codes
    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "GET",
            &format!("/api/ledger/accounts?company_id={}", company_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = common::body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
    assert_eq!(listed[1]["full_code"], "1000.1110");
    assert_eq!(listed[1]["normal_balance"], "debit");

    // Deactivate
    let child_id = child["id"].as_str().unwrap();
    let response = common::app(&ledger)
        .oneshot(common::json_request(
            "POST",
            &format!("/api/ledger/accounts/{}/status", child_id),
            &json!({"company_id": company_id, "status": "inactive"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["status"], "inactive");

    // Parent with a child cannot be deleted; the child can
    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "DELETE",
            &format!(
                "/api/ledger/accounts/{}?company_id={}",
                parent["id"].as_str().unwrap(),
                company_id
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "DELETE",
            &format!("/api/ledger/accounts/{}?company_id={}", child_id, company_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_post_event_outcomes() {
    let ledger = common::ledger();
    let company_id = Uuid::new_v4();
    common::seed_standard_chart(&ledger.store, company_id).await;

    let body = expense_body(company_id, "18", "500000.00");
    let response = common::app(&ledger)
        .oneshot(common::json_request("POST", "/api/ledger/events", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = common::body_json(response).await;
    assert_eq!(json["outcome"], "posted");
    assert_eq!(json["entry"]["header"]["entry_number"], "JE-000001");
    assert_eq!(json["entry"]["header"]["total_debit_minor"], 50_000_000);
    assert_eq!(json["entry"]["lines"].as_array().unwrap().len(), 2);

    // Redelivery
    let response = common::app(&ledger)
        .oneshot(common::json_request("POST", "/api/ledger/events", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    assert_eq!(json["outcome"], "duplicate");
    assert_eq!(json["entry_number"], "JE-000001");

    // Unknown event type
    let mut unknown = expense_body(company_id, "19", "1.00");
    unknown["event_type"] = json!("invoice.sent");
    let response = common::app(&ledger)
        .oneshot(common::json_request("POST", "/api/ledger/events", &unknown))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(common::body_json(response).await["outcome"], "skipped");

    // Too many decimal places
    let response = common::app(&ledger)
        .oneshot(common::json_request(
            "POST",
            "/api/ledger/events",
            &expense_body(company_id, "20", "1.005"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(common::body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_post_event_missing_account() {
    let ledger = common::ledger();
    let company_id = Uuid::new_v4();
    common::seed_chart_except(&ledger.store, company_id, &["6100"]).await;

    let response = common::app(&ledger)
        .oneshot(common::json_request(
            "POST",
            "/api/ledger/events",
            &expense_body(company_id, "21", "10.00"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = common::body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("6100"));
    assert!(ledger.store.list_entries(company_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_manual_entry_reverse_and_reports() {
    let ledger = common::ledger();
    let company_id = Uuid::new_v4();
    common::seed_standard_chart(&ledger.store, company_id).await;

    let response = common::app(&ledger)
        .oneshot(common::json_request(
            "POST",
            "/api/ledger/entries",
            &json!({
                "company_id": company_id,
                "entry_date": "2026-01-31",
                "description": "Accrue rent",
                "lines": [
                    {"account_code": "6100", "debit": "1200.00"},
                    {"account_code": "2100", "credit": "1200.00"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let entry_id = common::body_json(response).await["entry"]["header"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "GET",
            &format!(
                "/api/ledger/trial-balance?company_id={}&from=2026-01-01&to=2026-01-31",
                company_id
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tb = common::body_json(response).await;
    assert_eq!(tb["totals"]["total_debits"], 120_000);
    assert_eq!(tb["totals"]["is_balanced"], true);

    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "POST",
            &format!("/api/ledger/entries/{}/reverse?company_id={}", entry_id, company_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["status"], "reversed");

    // Second reversal conflicts
    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "POST",
            &format!("/api/ledger/entries/{}/reverse?company_id={}", entry_id, company_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Audit listing still has it
    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "GET",
            &format!("/api/ledger/entries?company_id={}", company_id),
        ))
        .await
        .unwrap();
    let entries = common::body_json(response).await;
    assert_eq!(entries[0]["header"]["status"], "reversed");

    // General ledger, default and audit views
    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "GET",
            &format!(
                "/api/ledger/general-ledger?company_id={}&account_code=6100",
                company_id
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["rows"].as_array().unwrap().len(), 0);

    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "GET",
            &format!(
                "/api/ledger/general-ledger?company_id={}&account_code=6100&include_reversed=true",
                company_id
            ),
        ))
        .await
        .unwrap();
    let gl = common::body_json(response).await;
    assert_eq!(gl["rows"][0]["counted"], false);
    assert_eq!(gl["closing_balance_minor"], 0);
}

#[tokio::test]
async fn test_unknown_entry_and_account() {
    let ledger = common::ledger();
    let company_id = Uuid::new_v4();

    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "POST",
            &format!(
                "/api/ledger/entries/{}/reverse?company_id={}",
                Uuid::new_v4(),
                company_id
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = common::app(&ledger)
        .oneshot(common::empty_request(
            "GET",
            &format!(
                "/api/ledger/general-ledger?company_id={}&account_code=1110",
                company_id
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let ledger = common::ledger();
    let company_id = Uuid::new_v4();
    common::seed_standard_chart(&ledger.store, company_id).await;

    common::app(&ledger)
        .oneshot(common::json_request(
            "POST",
            "/api/ledger/events",
            &expense_body(company_id, "m1", "1.00"),
        ))
        .await
        .unwrap();

    let response = common::app(&ledger)
        .oneshot(common::empty_request("GET", "/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_text(response).await;
    assert!(body.contains("ledger_postings_total{outcome=\"posted\"} 1"));
}
