//! Facade and entity behaviour against a mock PAI endpoint

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::TryStreamExt;
use pai_core::api::dataset::{CreateDatasetRequest, DatasetFilter};
use pai_core::api::model::{CreateModelRequest, CreateModelVersionRequest};
use pai_core::api::pipeline_run::CreatePipelineRunRequest;
use pai_core::api::workspace::NewMember;
use pai_core::entity::{Model, Service};
use pai_core::service_config::Processor;
use pai_core::{
    Credentials, ListOptions, Product, ProgressEvent, ServiceConfig, ServiceStatus, Session,
    SortOrder,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn session_for(product: Product, server: &MockServer) -> Session {
    Session::builder()
        .credentials(Credentials::new("LTAI-test", "secret"))
        .region_id("cn-hangzhou")
        .workspace_id("ws-1")
        .endpoint(product, server.uri())
        .build()
        .unwrap()
}

fn ok(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[tokio::test]
async fn requests_are_signed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/datasets/d-1"))
        .and(header("x-acs-action", "GetDataset"))
        .and(header("x-acs-version", "2021-02-04"))
        .and(header_exists("x-acs-date"))
        .and(header_exists("x-acs-signature-nonce"))
        .and(header_exists("x-acs-content-sha256"))
        .and(header_exists("authorization"))
        .respond_with(ok(json!({"DatasetId": "d-1", "Name": "iris"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(Product::AiWorkspace, &server).await;
    let dataset = session.datasets().get("d-1").await.unwrap();
    assert_eq!(dataset.dataset_id, "d-1");
    assert_eq!(dataset.name.as_deref(), Some("iris"));

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0].headers.get("authorization").unwrap();
    assert!(
        auth.to_str()
            .unwrap()
            .starts_with("ACS3-HMAC-SHA256 Credential=LTAI-test,")
    );
}

#[tokio::test]
async fn http_404_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/datasets/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "Code": "DatasetNotFound",
            "Message": "dataset missing does not exist",
            "RequestId": "req-404"
        })))
        .mount(&server)
        .await;

    let session = session_for(Product::AiWorkspace, &server).await;
    let err = session.datasets().get("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.request_id(), Some("req-404"));
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn http_400_is_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/datasets"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "Code": "InvalidParameter",
            "Message": "Uri is invalid"
        })))
        .mount(&server)
        .await;

    let session = session_for(Product::AiWorkspace, &server).await;
    let request = CreateDatasetRequest {
        name: "bad".to_string(),
        workspace_id: "ws-1".to_string(),
        data_source_type: "OSS".to_string(),
        property: "DIRECTORY".to_string(),
        uri: "not-a-uri".to_string(),
        ..CreateDatasetRequest::default()
    };
    let err = session.datasets().create(&request).await.unwrap_err();
    assert!(err.is_bad_request());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_errors_are_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/j-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let session = session_for(Product::Dlc, &server).await;
    let err = session.training_jobs().get("j-1").await.unwrap_err();
    assert!(err.is_server_error());
    assert!(err.is_retryable());
}

#[tokio::test]
async fn error_code_in_success_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pipelines/p-1"))
        .respond_with(ok(json!({
            "Code": "InternalError",
            "Message": "pipeline store unavailable",
            "RequestId": "req-embedded"
        })))
        .mount(&server)
        .await;

    let session = session_for(Product::PaiFlow, &server).await;
    let err = session.pipelines().get("p-1").await.unwrap_err();
    match &err {
        pai_core::PaiError::Api { code, status, .. } => {
            assert_eq!(code, "InternalError");
            assert_eq!(*status, 200);
        }
        other => panic!("expected an API error, got {other:?}"),
    }
    assert_eq!(err.request_id(), Some("req-embedded"));
}

#[tokio::test]
async fn success_code_200_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/datasets/d-1"))
        .respond_with(ok(json!({"Code": "200", "RequestId": "req"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(Product::AiWorkspace, &server).await;
    session.datasets().delete("d-1").await.unwrap();
}

// ---------------------------------------------------------------------------
// Listing and pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_sends_filter_and_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/datasets"))
        .and(query_param("WorkspaceId", "ws-1"))
        .and(query_param("DataSourceTypes", "OSS,NAS"))
        .and(query_param("PageNumber", "2"))
        .and(query_param("PageSize", "5"))
        .and(query_param("SortBy", "GmtCreateTime"))
        .and(query_param("Order", "DESC"))
        .respond_with(ok(json!({
            "Datasets": [{"DatasetId": "d-6"}],
            "TotalCount": "6"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(Product::AiWorkspace, &server).await;
    let filter = DatasetFilter {
        workspace_id: Some("ws-1".to_string()),
        data_source_types: vec!["OSS".to_string(), "NAS".to_string()],
        ..DatasetFilter::default()
    };
    let options = ListOptions::page(2, 5).sorted_by("GmtCreateTime", SortOrder::Desc);
    let page = session.datasets().list(&filter, &options).await.unwrap();

    assert_eq!(page.total_count, 6);
    assert_eq!(page.page_number, 2);
    assert_eq!(page.items[0].dataset_id, "d-6");
    assert!(page.is_last_page());
}

#[tokio::test]
async fn list_all_walks_every_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/models"))
        .and(query_param("PageNumber", "1"))
        .respond_with(ok(json!({
            "Models": [{"ModelId": "m-1"}, {"ModelId": "m-2"}],
            "TotalCount": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/models"))
        .and(query_param("PageNumber", "2"))
        .respond_with(ok(json!({
            "Models": [{"ModelId": "m-3"}],
            "TotalCount": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(Product::AiWorkspace, &server).await;
    let models = session.models();
    let filter = Default::default();
    let options = ListOptions::page(1, 2);
    let ids: Vec<String> = models
        .list_all(&filter, &options)
        .map_ok(|model| model.model_id)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(ids, vec!["m-1", "m-2", "m-3"]);
}

#[tokio::test]
async fn list_all_stops_on_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs"))
        .and(query_param("PageNumber", "1"))
        .respond_with(ok(json!({
            "Jobs": [{"JobId": "j-1"}, {"JobId": "j-2"}],
            "TotalCount": 10
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs"))
        .and(query_param("PageNumber", "2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "Code": "Forbidden.RAM",
            "Message": "not authorized"
        })))
        .mount(&server)
        .await;

    let session = session_for(Product::Dlc, &server).await;
    let jobs = session.training_jobs();
    let filter = Default::default();
    let options = ListOptions::page(1, 2);
    let results: Vec<_> = futures::StreamExt::collect(jobs.list_all(&filter, &options)).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(results[2].as_ref().unwrap_err().is_unauthorized());
}

#[tokio::test]
async fn eas_list_uses_sort_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/services"))
        .and(query_param("Sort", "CreateTime"))
        .and(query_param("Order", "ASC"))
        .respond_with(ok(json!({
            "Services": [{"ServiceName": "svc_a", "Status": "Running"}],
            "TotalCount": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(Product::Eas, &server).await;
    let options = ListOptions::default().sorted_by("CreateTime", SortOrder::Asc);
    let page = session
        .services()
        .list(&Default::default(), &options)
        .await
        .unwrap();
    assert_eq!(page.items[0].status(), ServiceStatus::Running);
}

// ---------------------------------------------------------------------------
// Create and lifecycle actions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_new_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/datasets"))
        .and(body_partial_json(json!({
            "Name": "iris",
            "WorkspaceId": "ws-1",
            "DataSourceType": "OSS",
            "Uri": "oss://bucket/iris/"
        })))
        .respond_with(ok(json!({"DatasetId": "d-new", "RequestId": "r"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(Product::AiWorkspace, &server).await;
    let request = CreateDatasetRequest {
        name: "iris".to_string(),
        workspace_id: "ws-1".to_string(),
        data_source_type: "OSS".to_string(),
        property: "DIRECTORY".to_string(),
        uri: "oss://bucket/iris/".to_string(),
        ..CreateDatasetRequest::default()
    };
    assert_eq!(session.datasets().create(&request).await.unwrap(), "d-new");
}

#[tokio::test]
async fn model_stays_registered_when_version_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/models"))
        .and(body_partial_json(json!({"ModelName": "resnet", "WorkspaceId": "ws-1"})))
        .respond_with(ok(json!({"ModelId": "m-1", "RequestId": "r"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/models/m-1/versions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "Code": "InvalidParameter",
            "Message": "Uri is not a valid OSS path",
            "RequestId": "r-400"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/models/m-1"))
        .respond_with(ok(json!({"RequestId": "r"})))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(Product::AiWorkspace, &server).await;
    let model = CreateModelRequest {
        model_name: "resnet".to_string(),
        ..CreateModelRequest::default()
    };
    let version = CreateModelVersionRequest {
        uri: "not-a-path".to_string(),
        ..CreateModelVersionRequest::default()
    };
    let err = Model::create_with_version(&session, &model, &version)
        .await
        .unwrap_err();
    assert!(err.is_bad_request());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.method.as_str() != "DELETE"));
}

#[tokio::test]
async fn create_without_id_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/pipelineruns"))
        .respond_with(ok(json!({"RequestId": "r"})))
        .mount(&server)
        .await;

    let session = session_for(Product::PaiFlow, &server).await;
    let err = session
        .pipeline_runs()
        .create(&CreatePipelineRunRequest::from_pipeline("p-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, pai_core::PaiError::Decode(_)));
}

#[tokio::test]
async fn invalid_run_request_sends_nothing() {
    let server = MockServer::start().await;
    let session = session_for(Product::PaiFlow, &server).await;
    let runs = session.pipeline_runs();

    let neither = CreatePipelineRunRequest::default();
    assert!(runs.create(&neither).await.unwrap_err().is_bad_request());

    let both = CreatePipelineRunRequest {
        manifest: Some("apiVersion: core/v1".to_string()),
        ..CreatePipelineRunRequest::from_pipeline("p-1")
    };
    let err = runs.create(&both).await.unwrap_err();
    assert!(err.to_string().contains("mutually exclusive"));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn run_start_and_terminate() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/pipelineruns/run-1/start"))
        .respond_with(ok(json!({"RequestId": "r"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/pipelineruns/run-1/terminate"))
        .respond_with(ok(json!({"RequestId": "r"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(Product::PaiFlow, &server).await;
    session.pipeline_runs().start("run-1").await.unwrap();
    session.pipeline_runs().terminate("run-1").await.unwrap();
}

#[tokio::test]
async fn job_stop_posts_to_stop() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/jobs/dlc-1/stop"))
        .respond_with(ok(json!({"JobId": "dlc-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(Product::Dlc, &server).await;
    session.training_jobs().stop("dlc-1").await.unwrap();
}

#[tokio::test]
async fn workspace_members_are_added_in_one_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workspaces/ws-1/members"))
        .and(body_partial_json(json!({
            "Members": [{"UserId": "u-1", "Roles": ["PAI.AlgoDeveloper"]}]
        })))
        .respond_with(ok(json!({"RequestId": "r"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(Product::AiWorkspace, &server).await;
    let members = vec![NewMember {
        user_id: "u-1".to_string(),
        roles: vec!["PAI.AlgoDeveloper".to_string()],
    }];
    session
        .workspaces()
        .add_members("ws-1", &members)
        .await
        .unwrap();

    let err = session
        .workspaces()
        .add_members("ws-1", &[])
        .await
        .unwrap_err();
    assert!(err.is_bad_request());
}

// ---------------------------------------------------------------------------
// Waiting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn job_wait_reaches_succeeded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/dlc-1"))
        .respond_with(ok(json!({"JobId": "dlc-1", "Status": "Running"})))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/dlc-1"))
        .respond_with(ok(json!({"JobId": "dlc-1", "Status": "Succeeded"})))
        .mount(&server)
        .await;

    let session = session_for(Product::Dlc, &server).await;
    let status = session
        .training_jobs()
        .wait(
            "dlc-1",
            Duration::from_secs(5),
            Duration::from_millis(10),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, "Succeeded");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn run_wait_ends_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pipelineruns/run-1"))
        .respond_with(ok(json!({"PipelineRunId": "run-1", "Status": "Failed"})))
        .mount(&server)
        .await;

    let session = session_for(Product::PaiFlow, &server).await;
    let err = session
        .pipeline_runs()
        .wait(
            "run-1",
            Duration::from_secs(5),
            Duration::from_millis(10),
            None,
        )
        .await
        .unwrap_err();
    assert!(err.is_unexpected_status());
    assert!(err.to_string().contains("Failed"));
}

fn service_config() -> ServiceConfig {
    ServiceConfig::new("iris_demo")
        .with_instance_count(1)
        .with_resource(1, 2000)
        .with_processor(Processor::BuiltIn("pmml".to_string()))
        .with_model_path("oss://bucket/iris.pmml")
}

async fn mount_service_create(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v2/services"))
        .and(body_partial_json(json!({
            "metadata": {"name": "iris_demo", "workspace_id": "ws-1"},
            "processor": "pmml"
        })))
        .respond_with(ok(json!({
            "ServiceName": "iris_demo",
            "Region": "cn-hangzhou",
            "Status": "Creating"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn service_deploy_waits_until_running() {
    let server = MockServer::start().await;
    mount_service_create(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/services/cn-hangzhou/iris_demo"))
        .respond_with(ok(json!({"ServiceName": "iris_demo", "Status": "Creating"})))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/services/cn-hangzhou/iris_demo"))
        .respond_with(ok(json!({
            "ServiceName": "iris_demo",
            "Status": "Running",
            "InternetEndpoint": "http://123.cn-hangzhou.pai-eas.aliyuncs.com/api/predict/iris_demo",
            "AccessToken": "token"
        })))
        .mount(&server)
        .await;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let session = session_for(Product::Eas, &server).await;
    let service = Service::deploy(
        &session,
        &service_config(),
        Duration::from_secs(5),
        Duration::from_millis(10),
        Some(Box::new(move |event: ProgressEvent| {
            sink.lock().unwrap().push(event);
        })),
    )
    .await
    .unwrap();

    assert_eq!(service.status(), ServiceStatus::Running);
    assert_eq!(service.access_token(), Some("token"));
    assert!(service.endpoint().unwrap().ends_with("/iris_demo"));

    let events = events.lock().unwrap();
    assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
    assert!(matches!(events.last(), Some(ProgressEvent::Completed { .. })));
}

#[tokio::test]
async fn service_deploy_stops_on_failed() {
    let server = MockServer::start().await;
    mount_service_create(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/services/cn-hangzhou/iris_demo"))
        .respond_with(ok(json!({
            "ServiceName": "iris_demo",
            "Status": "Failed",
            "Message": "image pull failed"
        })))
        .mount(&server)
        .await;

    let session = session_for(Product::Eas, &server).await;
    let err = Service::deploy(
        &session,
        &service_config(),
        Duration::from_secs(5),
        Duration::from_millis(10),
        None,
    )
    .await
    .unwrap_err();
    assert!(err.is_unexpected_status());
}

#[tokio::test]
async fn service_create_needs_a_name() {
    let server = MockServer::start().await;
    let session = session_for(Product::Eas, &server).await;

    let err = session
        .services()
        .create(&ServiceConfig::default())
        .await
        .unwrap_err();
    assert!(err.is_bad_request());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn service_record_carries_its_document() {
    let server = MockServer::start().await;
    let document = json!({
        "metadata": {"name": "svc", "instance": 2, "rpc.keepalive": 5000},
        "processor": "tensorflow_cpu_2.7",
        "model_path": "oss://bucket/saved_model/"
    });
    Mock::given(method("GET"))
        .and(path("/api/v2/services/cn-shanghai/svc"))
        .respond_with(ok(json!({
            "ServiceName": "svc",
            "Region": "cn-shanghai",
            "Status": "Stopped",
            "ServiceConfig": document.to_string()
        })))
        .mount(&server)
        .await;

    let session = session_for(Product::Eas, &server).await;
    let record = session.services().get("cn-shanghai", "svc").await.unwrap();
    assert_eq!(record.status(), ServiceStatus::Stopped);

    let config = record.config().unwrap().unwrap();
    assert_eq!(config.name(), Some("svc"));
    assert_eq!(config.rpc.as_ref().unwrap().keepalive, Some(5000));
    assert_eq!(config.to_value().unwrap(), document);
}
