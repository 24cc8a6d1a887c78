use crate::helpers::{BrokenSink, TestCluster, api, task};
use prism_vm::prelude::{Error, PrismError};
use prism_vm::step::{self, StepRequest, VmOperation};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn create_step_returns_server_response_verbatim() {
    // Arrange
    let mut cluster = TestCluster::new().await;
    let response_json = task("0b6e4c1d-7a2f-4f5e-9c3b-1d8e2a7f6b40");
    Mock::given(method("POST"))
        .and(path(api("/vms/")))
        .and(body_partial_json(json!({
            "name": "test-vm",
            "vm_disks": [{"vm_disk_clone": {"disk_address": {"vmdisk_uuid": "img-123"}}}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(response_json.clone()))
        .expect(1)
        .mount(&cluster.server)
        .await;
    let request = StepRequest::new(VmOperation::Create, "test-vm").with_image("img-123");

    // Act
    let result = step::run(&cluster.client, &request, &mut cluster.output).await;

    // Assert
    assert_eq!(result.unwrap().body, response_json);
    let output = cluster.output();
    assert!(output.starts_with("Creating VM with name 'test-vm'\n"));
    assert!(output.contains("\"vmdisk_uuid\":\"img-123\""));
    assert!(output.contains("0b6e4c1d-7a2f-4f5e-9c3b-1d8e2a7f6b40"));
}

#[tokio::test]
async fn create_step_keeps_quotes_in_name_intact() {
    // Arrange
    let mut cluster = TestCluster::new().await;
    Mock::given(method("POST"))
        .and(path(api("/vms/")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .mount(&cluster.server)
        .await;
    let request =
        StepRequest::new(VmOperation::Create, "nightly \"rc\" build").with_image("img-123");

    // Act
    step::run(&cluster.client, &request, &mut cluster.output)
        .await
        .unwrap();

    // Assert
    let requests = cluster.server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["name"], "nightly \"rc\" build");
}

#[tokio::test]
async fn create_step_without_image_sends_nothing() {
    // Arrange
    let mut cluster = TestCluster::new().await;
    let request = StepRequest::new(VmOperation::Create, "test-vm");

    // Act
    let result = step::run(&cluster.client, &request, &mut cluster.output).await;

    // Assert
    assert!(matches!(
        result.unwrap_err(),
        Error::MissingParameter("image UUID")
    ));
    assert!(cluster.server.received_requests().await.unwrap().is_empty());
    assert!(cluster.output().starts_with("ERROR: "));
}

#[tokio::test]
async fn create_step_fails_on_non_json_response() {
    // Arrange
    let mut cluster = TestCluster::new().await;
    Mock::given(method("POST"))
        .and(path(api("/vms/")))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&cluster.server)
        .await;
    let request = StepRequest::new(VmOperation::Create, "test-vm").with_image("img-123");

    // Act
    let result = step::run(&cluster.client, &request, &mut cluster.output).await;

    // Assert
    assert!(matches!(
        result.unwrap_err(),
        Error::MalformedResponse(PrismError::Create, _)
    ));
}

#[tokio::test]
async fn create_step_keeps_error_when_output_is_closed() {
    // Arrange
    let cluster = TestCluster::new().await;
    let request = StepRequest::new(VmOperation::Create, "test-vm");

    // Act
    let result = step::run(&cluster.client, &request, &mut BrokenSink).await;

    // Assert
    assert!(matches!(
        result.unwrap_err(),
        Error::MissingParameter("image UUID")
    ));
}
