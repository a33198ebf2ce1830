use std::sync::Arc;

use agentchat_ext::agent::error::AgentError;
use agentchat_ext::agent::types::StreamItem;
use agentchat_ext::azure::{AzureError, ClientSecretCredential};
use agentchat_ext::cancellation::CancellationToken;
use agentchat_ext::config::Settings;
use agentchat_ext::ui::{Console, Style};
use agentchat_ext::{Error, ask_with_web_search};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;

const TASK: &str = "What is Microsoft's annual leave policy? Provide citations for your answers.";
const ANSWER: &str = "Microsoft employees in the US receive 15 days of paid vacation per year [1].";

fn settings(endpoint: &str) -> Settings {
    Settings::from_toml_str(&format!(
        r#"
        project_endpoint = "{endpoint}"
        bing_connection_name = "bing-search"
        agent_instructions = "Answer with citations."
        "#
    ))
    .unwrap()
}

fn credential(server: &ServerGuard) -> Arc<ClientSecretCredential> {
    Arc::new(
        ClientSecretCredential::new("tenant", "client", "secret")
            .unwrap()
            .with_authority_host(server.url()),
    )
}

async fn json_mock(server: &mut ServerGuard, method: &str, path: &str, body: serde_json::Value) -> Mock {
    server
        .mock(method, path)
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer project-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

async fn token_mock(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/tenant/oauth2/v2.0/token")
        .match_body(Matcher::UrlEncoded("scope".into(), "https://ai.azure.com/.default".into()))
        .with_status(200)
        .with_body(r#"{"token_type":"Bearer","expires_in":3600,"access_token":"project-token"}"#)
        .create_async()
        .await
}

#[tokio::test]
async fn grounded_answer_reaches_the_console() {
    let mut server = Server::new_async().await;
    let token = token_mock(&mut server).await;
    let _connection = json_mock(
        &mut server,
        "GET",
        "/api/projects/hr/connections/bing-search",
        json!({"id": "/subscriptions/s/connections/bing-search", "name": "bing-search", "type": "ApiKey"}),
    )
    .await;
    let create = server
        .mock("POST", "/api/projects/hr/assistants")
        .match_query(Matcher::UrlEncoded("api-version".into(), "2025-05-01".into()))
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "name": "web-search-agent",
            "instructions": "Answer with citations.",
            "tools": [{"type": "bing_grounding", "bing_grounding": {"search_configurations": [
                {"connection_id": "/subscriptions/s/connections/bing-search"}
            ]}}]
        })))
        .with_status(200)
        .with_body(json!({"id": "asst_1"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let _thread = json_mock(&mut server, "POST", "/api/projects/hr/threads", json!({"id": "thread_1"})).await;
    let _message = json_mock(
        &mut server,
        "POST",
        "/api/projects/hr/threads/thread_1/messages",
        json!({"id": "msg_1"}),
    )
    .await;
    let _run = json_mock(
        &mut server,
        "POST",
        "/api/projects/hr/threads/thread_1/runs",
        json!({"id": "run_1", "status": "completed", "usage": {"prompt_tokens": 120, "completion_tokens": 40}}),
    )
    .await;
    let _list = json_mock(
        &mut server,
        "GET",
        "/api/projects/hr/threads/thread_1/messages",
        json!({"data": [{"id": "msg_2", "role": "assistant", "content": [{"type": "text", "text": {
            "value": ANSWER,
            "annotations": [{"type": "url_citation", "text": "[1]", "url_citation": {
                "url": "https://www.microsoft.com/en-us/worklab/benefits",
                "title": "Microsoft benefits"
            }}]
        }}]}]}),
    )
    .await;

    let endpoint = format!("{}/api/projects/hr", server.url());
    let response = ask_with_web_search(
        credential(&server),
        &settings(&endpoint),
        TASK,
        &CancellationToken::new(),
        1,
    )
    .await
    .unwrap();

    assert_eq!(response.chat_message.content, ANSWER);
    assert_eq!(response.chat_message.source, "web-search-agent");
    assert_eq!(response.chat_message.models_usage.unwrap().total_tokens(), 160);
    token.assert_async().await;
    create.assert_async().await;

    let mut console = Console::with_writer(Vec::new())
        .with_style(Style::disabled())
        .with_output_stats(true);
    let items: Vec<Result<StreamItem, AgentError>> = vec![Ok(StreamItem::Response(response))];
    let last = console.run(futures::stream::iter(items)).await.unwrap();
    assert!(last.as_response().is_some());

    let rendered = String::from_utf8(console.into_writer()).unwrap();
    assert!(rendered.contains("💬 web-search-agent"));
    assert!(rendered.contains("[1] Microsoft benefits <https://www.microsoft.com/en-us/worklab/benefits>"));
    assert!(rendered.contains("Total prompt tokens: 120"));
}

#[tokio::test]
async fn unknown_connection_stops_before_the_agent_exists() {
    let mut server = Server::new_async().await;
    let _token = token_mock(&mut server).await;
    let _connection = server
        .mock("GET", "/connections/bing-search")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"error":{"code":"NotFound","message":"Connection 'bing-search' not found"}}"#)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/assistants")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = ask_with_web_search(
        credential(&server),
        &settings(&server.url()),
        TASK,
        &CancellationToken::new(),
        1,
    )
    .await
    .unwrap_err();

    match err {
        Error::Azure(AzureError::Api { status, message, .. }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Connection 'bing-search' not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    create.assert_async().await;
}

#[tokio::test]
async fn rejected_credentials_surface_unchanged() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/tenant/oauth2/v2.0/token")
        .with_status(400)
        .with_body(r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided."}"#)
        .create_async()
        .await;

    let err = ask_with_web_search(
        credential(&server),
        &settings(&server.url()),
        TASK,
        &CancellationToken::new(),
        1,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Azure(AzureError::Auth { status: 400, .. })));
    assert!(err.to_string().contains("AADSTS7000215"));
}
