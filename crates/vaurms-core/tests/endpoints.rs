mod common;

use serde_json::json;
use vaurms_core::models::{DatasetStatus, NewUser, ReportExport, UserRole};
use vaurms_core::{ApiError, FailureKind};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client_for, header_str, only_request};

#[tokio::test]
async fn test_list_datasets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "name": "feb.csv", "status": "validated", "file_size": 100,
             "file_type": "csv", "row_count": 4, "created_at": "2024-02-01T00:00:00",
             "uploaded_by": "analyst@vaurms.com"},
            {"id": 1, "name": "jan.csv", "status": "active", "file_size": 90,
             "file_type": "csv", "row_count": 3, "created_at": "2024-01-01T00:00:00",
             "uploaded_by": null}
        ])))
        .mount(&server)
        .await;

    let (api, _downloads) = client_for(&server);
    let datasets = api.list_datasets().await.unwrap();

    assert_eq!(datasets.len(), 2);
    assert_eq!(datasets[0].name, "feb.csv");
    assert_eq!(datasets[1].status, DatasetStatus::Active);
}

#[tokio::test]
async fn test_upload_dataset_reads_file_and_adds_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/datasets/upload"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 12,
            "name": "march_bills.csv",
            "status": "uploaded",
            "message": "File uploaded successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("march_bills.csv");
    std::fs::write(&file, "account,usage\n7,15\n").unwrap();

    let (api, _downloads) = client_for(&server);
    api.credentials().set(Some("abc".to_string()));
    let uploaded = api
        .upload_dataset(&file, Some("March billing extract"))
        .await
        .unwrap();

    assert_eq!(uploaded.id, 12);
    assert_eq!(uploaded.status, DatasetStatus::Uploaded);

    let request = only_request(&server).await;
    assert!(header_str(&request, "content-type")
        .unwrap()
        .starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains(r#"filename="march_bills.csv""#));
    assert!(body.contains("Content-Type: text/csv"));
    assert!(body.contains("account,usage\n7,15\n"));
    assert!(body.contains("March billing extract"));
}

#[tokio::test]
async fn test_upload_dataset_missing_file_sends_nothing() {
    let server = MockServer::start().await;
    let (api, _downloads) = client_for(&server);

    let dir = tempfile::tempdir().unwrap();
    let err = api
        .upload_dataset(&dir.path().join("absent.csv"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Io(_)));
    assert!(!err.to_string().contains("download"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_profile_and_commit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/3/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "name": "q1.xlsx", "status": "validated", "file_size": 4096,
            "file_type": "xlsx", "row_count": 250,
            "schema_info": {"columns": ["account", "usage", "amount"]},
            "validation_errors": [], "created_at": "2024-04-01T12:00:00"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/datasets/3/commit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Dataset activated successfully",
            "dataset_id": 3
        })))
        .mount(&server)
        .await;

    let (api, _downloads) = client_for(&server);
    let profile = api.dataset_profile(3).await.unwrap();
    assert_eq!(profile.row_count, Some(250));
    assert_eq!(profile.schema_info.unwrap()["columns"][0], "account");

    let committed = api.commit_dataset(3).await.unwrap();
    assert_eq!(committed.dataset_id, 3);
}

#[tokio::test]
async fn test_export_and_download_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/reports/export"))
        .and(body_json(json!({"type": "pdf", "scope": "kpi"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "download_url": "/api/reports/download/pdf_kpi_report.pdf",
            "filename": "kpi_report.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reports/download/pdf_kpi_report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.7".to_vec(), "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let (api, downloads) = client_for(&server);
    let export: ReportExport = api.export_report("pdf", "kpi").await.unwrap();
    assert_eq!(export.filename, "kpi_report.pdf");

    api.download_report(&export).await.unwrap();

    let saved = std::fs::read(downloads.path().join("kpi_report.pdf")).unwrap();
    assert_eq!(saved, b"%PDF-1.7");
}

#[tokio::test]
async fn test_analytics_kpis_trends_and_cohorts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analytics/kpis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_revenue": 2450000, "collection_rate": 94.2, "customer_count": 12500,
            "coverage_ratio": 1.15, "revenue_change": 5.2, "collection_change": 1.8,
            "customer_change": 2.1, "coverage_change": 0.0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analytics/trends"))
        .and(query_param("metric", "consumption"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "labels": ["Jan", "Feb"], "data": [45000, 48000]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analytics/cohorts"))
        .and(query_param("class", "industrial"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid customer class"})))
        .mount(&server)
        .await;

    let (api, _downloads) = client_for(&server);

    let kpis = api.kpis().await.unwrap();
    assert_eq!(kpis.customer_count, 12500);
    assert_eq!(kpis.coverage_ratio, 1.15);

    let trend = api.trends("consumption").await.unwrap();
    assert_eq!(trend.points().collect::<Vec<_>>(), vec![("Jan", 45000.0), ("Feb", 48000.0)]);

    let err = api.cohorts("industrial").await.unwrap_err();
    assert_eq!(err.kind(), Some(FailureKind::ApplicationError));
    assert_eq!(err.to_string(), "Invalid customer class");
}

#[tokio::test]
async fn test_model_rates_and_run_forecast_post_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rates/model"))
        .and(body_json(json!({"fixed_charge": 25.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bill_impacts": {
                "residential": {"avg_increase": 5.2, "max_increase": 12.5},
                "commercial": {"avg_increase": 4.8, "max_increase": 10.2}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/forecast/run"))
        .and(body_json(json!({"years": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "forecast_id": 1,
            "results": [
                {"year": 2024, "revenue": 2500000, "opex": 1800000, "capex": 500000, "ending_fund": 200000},
                {"year": 2025, "revenue": 2625000, "opex": 1890000, "capex": 525000, "ending_fund": 210000}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _downloads) = client_for(&server);

    let model = api.model_rates(&json!({"fixed_charge": 25.0})).await.unwrap();
    assert_eq!(model.bill_impacts["commercial"].avg_increase, 4.8);

    let forecast = api.run_forecast(&json!({"years": 3})).await.unwrap();
    assert_eq!(forecast.forecast_id, 1);
    assert_eq!(forecast.results.len(), 2);
    assert_eq!(forecast.results[1].year, 2025);
}

#[tokio::test]
async fn test_optimise_rates_reads_infinite_tier_bound() {
    let server = MockServer::start().await;
    // What a Python encoder writes for float('inf')
    let body = r#"{"optimized_structure": {"fixed_charge": 25.0, "tiers": [
        {"up_to": 5000, "price": 0.0085},
        {"up_to": 15000, "price": 0.0095},
        {"up_to": Infinity, "price": 0.0105}]},
        "constraints_satisfied": true, "coverage_ratio": 1.18, "reserve_balance": 250000}"#;
    Mock::given(method("POST"))
        .and(path("/api/rates/optimise"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "application/json"))
        .expect(2)
        .mount(&server)
        .await;

    let (api, _downloads) = client_for(&server);

    // The generic pipeline rejects the body as JSON
    let raw = api.post("/rates/optimise", &json!({})).await.unwrap_err();
    assert!(matches!(raw, ApiError::Decode(_)));

    let result = api.optimise_rates(&json!({"target_coverage": 1.2})).await.unwrap();
    assert!(result.constraints_satisfied);
    assert_eq!(result.structure.tiers.len(), 3);
    assert_eq!(result.structure.tiers[0].up_to, Some(5000.0));
    assert_eq!(result.structure.tiers[2].up_to, None);
    assert_eq!(result.structure.tiers[2].price, 0.0105);
}

#[tokio::test]
async fn test_optimise_rates_still_classifies_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rates/optimise"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (api, _downloads) = client_for(&server);
    api.credentials().set(Some("stale".to_string()));
    let mut events = api.subscribe();

    let err = api.optimise_rates(&json!({})).await.unwrap_err();

    assert!(matches!(err, ApiError::AuthenticationRequired));
    assert!(!api.credentials().is_present());
    assert!(events.try_recv().is_ok());
}

#[tokio::test]
async fn test_admin_audit_and_jobs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/audit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "action": "upload", "user_email": "analyst@vaurms.com",
             "timestamp": "2024-01-15T10:30:00.250000", "description": "Uploaded bills.csv",
             "ip_address": "10.0.0.8"},
            {"id": 1, "action": "system_config", "user_email": "System",
             "timestamp": "2024-01-14T08:00:00", "description": null, "ip_address": null}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "type": "data_import", "status": "completed", "created_at": "2024-01-15T10:30:00Z"}
        ])))
        .mount(&server)
        .await;

    let (api, _downloads) = client_for(&server);

    let audit = api.audit_log().await.unwrap();
    assert_eq!(audit.len(), 2);
    assert_eq!(audit[1].user_email, "System");
    assert!(audit[1].description.is_none());

    let jobs = api.jobs().await.unwrap();
    assert_eq!(jobs[0].job_type, "data_import");
    assert!(jobs[0].created_at.is_some());
}

#[tokio::test]
async fn test_admin_endpoints_forbidden_for_non_admins() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Admin access required"})))
        .mount(&server)
        .await;

    let (api, _downloads) = client_for(&server);
    api.credentials().set(Some("viewer-token".to_string()));

    match api.list_users().await.unwrap_err() {
        ApiError::Application { status, message } => {
            assert_eq!(status.as_u16(), 403);
            assert_eq!(message, "Admin access required");
        }
        other => panic!("expected application error, got {:?}", other),
    }
    // Only a 401 invalidates the session
    assert!(api.credentials().is_present());
}

#[tokio::test]
async fn test_list_and_create_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "email": "admin@vaurms.com", "role": "admin", "first_name": "Admin",
             "last_name": "User", "is_active": true,
             "created_at": "Mon, 15 Jan 2024 10:30:00 GMT", "updated_at": "Mon, 15 Jan 2024 10:30:00 GMT"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users/"))
        .and(body_json(json!({
            "email": "new@vaurms.com", "password": "s3cret", "role": "analyst", "first_name": "New"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5, "email": "new@vaurms.com", "role": "analyst", "first_name": "New",
            "last_name": null, "is_active": true,
            "created_at": "Tue, 16 Jan 2024 09:00:00 GMT", "updated_at": "Tue, 16 Jan 2024 09:00:00 GMT"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _downloads) = client_for(&server);

    let users = api.list_users().await.unwrap();
    assert_eq!(users[0].role, UserRole::Admin);
    assert_eq!(users[0].is_active, Some(true));

    let created = api
        .create_user(&NewUser {
            email: "new@vaurms.com".to_string(),
            password: "s3cret".to_string(),
            role: Some(UserRole::Analyst),
            first_name: Some("New".to_string()),
            last_name: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id, 5);
    assert_eq!(created.display_name(), "New");
}
