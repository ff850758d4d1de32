//! ChatOllama and OllamaEmbedder against a mock Ollama server.


use recipes::llm::{ChatOllama, Embedder, LlmClient, OllamaEmbedder};
use recipes::tool_source::ToolSpec;
use recipes::{AgentError, Message};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **Scenario**: The chat request carries model, messages, temperature and stream:false; usage is read back.
#[tokio::test]
async fn chat_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "phi4",
            "stream": false,
            "options": { "temperature": 0.5 },
            "messages": [
                { "role": "system", "content": "You are an experienced stock market analyst." },
                { "role": "user", "content": "What are the top 5 stock symbols?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "phi4",
            "message": { "role": "assistant", "content": "AAPL, MSFT, NVDA, AMZN, GOOGL" },
            "done": true,
            "prompt_eval_count": 20,
            "eval_count": 12
        })))
        .expect(1)
        .mount(&server)
        .await;

    let llm = ChatOllama::new("phi4")
        .with_temperature(0.5)
        .with_base_url(server.uri());
    let reply = llm
        .invoke(&[
            Message::system("You are an experienced stock market analyst."),
            Message::user("What are the top 5 stock symbols?"),
        ])
        .await
        .unwrap();
    assert_eq!(reply.content, "AAPL, MSFT, NVDA, AMZN, GOOGL");
    let usage = reply.usage.unwrap();
    assert_eq!(usage.total_tokens, 32);
}

/// **Scenario**: Tools are sent as functions and tool calls come back with object arguments.
#[tokio::test]
async fn chat_with_tools_returns_tool_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "tools": [{ "type": "function", "function": { "name": "validate_user" } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "function": {
                        "name": "validate_user",
                        "arguments": { "user_id": 123, "addresses": ["123 Fake St in Boston MA"] }
                    }
                }]
            }
        })))
        .mount(&server)
        .await;

    let spec = ToolSpec {
        name: "validate_user".into(),
        description: Some("Validate user using historical addresses.".into()),
        input_schema: json!({ "type": "object" }),
    };
    let llm = ChatOllama::new("llama3.2")
        .with_temperature(0.0)
        .with_base_url(server.uri());
    let reply = llm
        .invoke_with_tools(&[Message::user("Could you validate user 123?")], &[spec])
        .await
        .unwrap();
    assert_eq!(reply.tool_calls.len(), 1);
    assert_eq!(reply.tool_calls[0].name, "validate_user");
    assert_eq!(reply.tool_calls[0].arguments["user_id"], 123);
    assert!(reply.usage.is_none());
}

/// **Scenario**: A non-2xx reply is an Llm error carrying status and body.
#[tokio::test]
async fn chat_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"model 'phi9' not found"}"#))
        .mount(&server)
        .await;

    let err = ChatOllama::new("phi9")
        .with_base_url(server.uri())
        .invoke(&[Message::user("hi")])
        .await
        .unwrap_err();
    match err {
        AgentError::Llm(msg) => {
            assert!(msg.contains("404"), "{msg}");
            assert!(msg.contains("phi9"), "{msg}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// **Scenario**: embed_query posts the text and returns the single vector.
#[tokio::test]
async fn embed_query_returns_vector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({ "model": "nomic-embed-text", "input": ["hello"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.1, 0.2, 0.3]]
        })))
        .mount(&server)
        .await;

    let embedder = OllamaEmbedder::default().with_base_url(server.uri());
    let v = embedder.embed_query("hello").await.unwrap();
    assert_eq!(v.len(), 3);
    assert!((v[1] - 0.2).abs() < 1e-6);
}

/// **Scenario**: A reply with the wrong number of vectors is rejected.
#[tokio::test]
async fn embed_count_mismatch_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [] })))
        .mount(&server)
        .await;

    let embedder = OllamaEmbedder::default().with_base_url(server.uri());
    assert!(matches!(
        embedder.embed(&["a", "b"]).await,
        Err(AgentError::Llm(_))
    ));
}
