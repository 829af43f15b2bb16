//! Wire-level tests for the OpenAI-compatible clients.

mod support;

use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::json;
use support::FnHandler;
use turnkit::config::ModelConfig;
use turnkit::error::TurnError;
use turnkit::providers::{OpenAiApplyModel, OpenAiChatModel};
use turnkit::registry::{RegisteredTool, ToolRegistry};
use turnkit::stream::TurnEvent;
use turnkit::traits::{ApplyModel, StreamingChatModel};
use turnkit::types::{ChatRequest, ModelMessage, Role, ToolSpec};
use turnkit::utils::cancel::CancelHandle;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ModelConfig {
    ModelConfig::new("test-key", "test-model").with_base_url(server.uri())
}

fn sse(chunks: &[&str]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str("data: ");
        body.push_str(chunk);
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    body
}

async fn collect(model: &OpenAiChatModel, request: ChatRequest) -> Vec<TurnEvent> {
    let mut stream = model.stream_turn(request).await.unwrap();
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event.unwrap());
    }
    events
}

#[tokio::test]
async fn streams_text_and_reports_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[
                r#"{"id":"chatcmpl-1","model":"test-model","choices":[{"delta":{"content":"Hel"}}]}"#,
                r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
            ]),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let model = OpenAiChatModel::new(config_for(&server));
    let request = ChatRequest::new("be brief", vec![ModelMessage::new(Role::User, "hi")]);

    let events = collect(&model, request).await;

    assert!(matches!(&events[0], TurnEvent::StreamStart { metadata }
        if metadata.id.as_deref() == Some("chatcmpl-1")));
    assert!(matches!(&events[1], TurnEvent::TextDelta { delta } if delta == "Hel"));
    assert!(matches!(&events[2], TurnEvent::TextDelta { delta } if delta == "lo"));
    assert!(matches!(&events[3], TurnEvent::StepFinished { step }
        if step.produced_text && step.tool_calls.is_empty()));
    match &events[4] {
        TurnEvent::StreamEnd { messages } => {
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].text(), "Hello");
        }
        other => panic!("expected StreamEnd, got {other:?}"),
    }
}

#[tokio::test]
async fn executes_tools_and_continues_with_their_results() {
    let server = MockServer::start().await;

    // First step: the model asks for one tool call, with the arguments
    // split across two deltas.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[
                r#"{"id":"chatcmpl-2","model":"test-model","choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"echo","arguments":"{\"text\""}}]}}]}"#,
                r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":":\"ping\"}"}}]}}]}"#,
            ]),
            "text/event-stream",
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    // Second step: the request must carry the tool result back; the
    // model then answers in text.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(r#""role":"tool""#))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[r#"{"choices":[{"delta":{"content":"pong"}}]}"#]),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut tools = ToolRegistry::new();
    tools.register(RegisteredTool::new(
        ToolSpec::new(
            "echo",
            "Echo the text back",
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            }),
        ),
        Arc::new(FnHandler(|arguments: serde_json::Value| {
            json!({"echoed": arguments["text"]})
        })),
    ));

    let model = OpenAiChatModel::new(config_for(&server));
    let request = ChatRequest::new("use tools", vec![ModelMessage::new(Role::User, "ping")])
        .with_tools(tools);

    let events = collect(&model, request).await;

    let step = events
        .iter()
        .find_map(|event| match event {
            TurnEvent::StepFinished { step } if !step.tool_calls.is_empty() => Some(step),
            _ => None,
        })
        .expect("tool step missing");
    assert_eq!(step.tool_calls[0].name, "echo");
    assert_eq!(step.tool_calls[0].arguments, json!({"text": "ping"}));
    assert_eq!(step.tool_results[0].output, json!({"echoed": "ping"}));

    assert!(
        events
            .iter()
            .any(|event| matches!(event, TurnEvent::TextDelta { delta } if delta == "pong"))
    );
    match events.last().unwrap() {
        TurnEvent::StreamEnd { messages } => {
            // One tool-step message plus the final text message.
            assert_eq!(messages.len(), 2);
        }
        other => panic!("expected StreamEnd, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_arguments_are_reported_not_executed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[
                r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"echo","arguments":"{\"wrong\":1}"}}]}}]}"#,
            ]),
            "text/event-stream",
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[r#"{"choices":[{"delta":{"content":"ok"}}]}"#]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let mut tools = ToolRegistry::new();
    tools.register(RegisteredTool::new(
        ToolSpec::new(
            "echo",
            "Echo",
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            }),
        ),
        Arc::new(FnHandler(|_| panic!("must not execute"))),
    ));

    let model = OpenAiChatModel::new(config_for(&server));
    let request =
        ChatRequest::new("use tools", vec![ModelMessage::new(Role::User, "go")]).with_tools(tools);

    let events = collect(&model, request).await;

    let step = events
        .iter()
        .find_map(|event| match event {
            TurnEvent::StepFinished { step } if !step.tool_calls.is_empty() => Some(step),
            _ => None,
        })
        .unwrap();
    assert_eq!(step.tool_results[0].output["error"], "invalid_args");
}

#[tokio::test]
async fn http_error_surfaces_from_the_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let model = OpenAiChatModel::new(config_for(&server));
    let request = ChatRequest::new("sys", vec![ModelMessage::new(Role::User, "hi")]);

    let mut stream = model.stream_turn(request).await.unwrap();
    let first = stream.next().await.unwrap();
    match first {
        Err(TurnError::HttpError(message)) => {
            assert!(message.contains("401"));
            assert!(message.contains("bad key"));
        }
        other => panic!("expected HttpError, got {other:?}"),
    }
}

#[tokio::test]
async fn pre_cancelled_request_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancelHandle::new();
    cancel.cancel();

    let model = OpenAiChatModel::new(config_for(&server));
    let request = ChatRequest::new("sys", vec![ModelMessage::new(Role::User, "hi")])
        .with_cancel(cancel);

    let mut stream = model.stream_turn(request).await.unwrap();
    let first = stream.next().await.unwrap();
    assert!(matches!(first, Err(TurnError::Cancelled)));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn apply_model_returns_the_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains(r#""stream":false"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "merged file"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = OpenAiApplyModel::new(config_for(&server));
    let completion = model
        .complete(vec![ModelMessage::new(Role::User, "merge this")])
        .await
        .unwrap();

    assert_eq!(completion.content(), Some("merged file"));
}

#[tokio::test]
async fn apply_model_maps_http_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let model = OpenAiApplyModel::new(config_for(&server));
    let err = model
        .complete(vec![ModelMessage::new(Role::User, "merge this")])
        .await
        .unwrap_err();

    match err {
        TurnError::HttpError(message) => assert!(message.contains("500")),
        other => panic!("expected HttpError, got {other:?}"),
    }
}
