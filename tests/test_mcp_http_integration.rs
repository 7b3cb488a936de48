use std::sync::Arc;

use axum::Router;
use http_body_util::BodyExt; // for .collect
use hyper::{header, Request, StatusCode};
use serde_json::{json, Value};
use tokio::time::{timeout, Duration};
use tower::ServiceExt; // for .oneshot

use solvedac_mcp_gateway::clients::solvedac::SolvedAcClient;
use solvedac_mcp_gateway::infra::config::RemoteSettings;
use solvedac_mcp_gateway::infra::http_app::build_app;
use solvedac_mcp_gateway::infra::runtime::lifecycle::RemoteClientHandle;
use solvedac_mcp_gateway::tools::solvedac::build_registry;

static MCP_PROTOCOL_VERSION: &str = "2025-03-26";

struct Session {
    app: Router,
    id: String,
}

fn post(body: &Value, session: Option<&str>) -> Request<axum::body::Body> {
    let mut b = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::ACCEPT, "application/json, text/event-stream")
        .header(header::CONTENT_TYPE, "application/json")
        .header("MCP-Protocol-Version", MCP_PROTOCOL_VERSION);
    if let Some(id) = session {
        b = b.header("MCP-Session-Id", id);
    }
    b.body(axum::body::Body::from(body.to_string())).unwrap()
}

/// Pull the JSON-RPC response out of an SSE (or plain JSON) body.
async fn rpc_response(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let s = String::from_utf8_lossy(&bytes);
    s.lines()
        .find_map(|line| line.strip_prefix("data: ").map(|d| d.to_string()))
        .and_then(|d| serde_json::from_str::<Value>(&d).ok())
        .or_else(|| serde_json::from_str::<Value>(&s).ok())
        .expect("Did not find an rpcResponse")
}

async fn start(app: Router) -> Session {
    let init = json!({
        "jsonrpc":"2.0","id":1,"method":"initialize",
        "params":{ "protocolVersion": MCP_PROTOCOL_VERSION,"capabilities":{},"clientInfo":{"name":"test","version":"0.1"} }
    });
    let init_res = app.clone().oneshot(post(&init, None)).await.unwrap();
    assert!(init_res.status().is_success());
    let id = init_res
        .headers()
        .get("MCP-Session-Id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();

    let initialized = json!({"jsonrpc":"2.0","method":"notifications/initialized","params":{}});
    let res = app.clone().oneshot(post(&initialized, Some(&id))).await.unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    Session { app, id }
}

impl Session {
    async fn call(&self, id: u64, method: &str, params: Value) -> Value {
        let req = json!({"jsonrpc":"2.0","id":id,"method":method,"params":params});
        let res = timeout(Duration::from_secs(20), self.app.clone().oneshot(post(&req, Some(&self.id))))
            .await
            .unwrap()
            .unwrap();
        assert!(res.status().is_success());
        rpc_response(res).await
    }
}

fn app_for(base_url: String, active: bool) -> (RemoteClientHandle, Router) {
    let handle = RemoteClientHandle::new(RemoteSettings::with_base_url(base_url));
    if active {
        handle.activate().unwrap();
    }
    let registry = Arc::new(build_registry(SolvedAcClient::new(handle.clone())));
    (handle, build_app(registry))
}

#[tokio::test]
async fn healthz_is_ok() {
    let (_handle, app) = app_for("http://127.0.0.1:1".into(), false);
    let req = Request::builder().uri("/healthz").body(axum::body::Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn lists_and_calls_tools_over_streamable_http() {
    let server = httpmock::MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/user/show")
            .query_param("handle", "kyungbaee")
            .header("x-solvedac-language", "ko");
        then.status(200).json_body(json!({
            "handle":"kyungbaee","tier":13,"rating":1300,"solvedCount":400,"rivalCount":2
        }));
    });

    let (_handle, app) = app_for(server.base_url(), true);
    let session = start(app).await;

    let list = session.call(2, "tools/list", json!({})).await;
    let names: Vec<&str> = list["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"solvedac_get_user_info"));
    assert!(names.contains(&"solvedac_search_problems"));

    let call = session
        .call(3, "tools/call", json!({"name":"solvedac_get_user_info","arguments":{"handle":"kyungbaee"}}))
        .await;
    let user = &call["result"]["structuredContent"];
    assert_eq!(user["handle"], "kyungbaee");
    assert_eq!(user["solvedCount"], 400);
    assert!(user.get("rivalCount").is_none());
}

#[tokio::test]
async fn tool_failures_carry_kind() {
    let server = httpmock::MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/user/show");
        then.status(404);
    });
    let search = server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/search/problem");
        then.status(200).json_body(json!({"count":0,"items":[]}));
    });

    let (_handle, app) = app_for(server.base_url(), true);
    let session = start(app).await;

    let res = session
        .call(2, "tools/call", json!({"name":"solvedac_get_user_info","arguments":{"handle":"no_such_user_xyz"}}))
        .await;
    assert_eq!(res["error"]["data"]["kind"], "NotFound");
    assert!(res["error"]["message"].as_str().unwrap().contains("no_such_user_xyz"));

    let res = session
        .call(3, "tools/call", json!({"name":"solvedac_search_problems","arguments":{"query":"tag:dp","page":0}}))
        .await;
    assert_eq!(res["error"]["code"], -32602);
    assert_eq!(res["error"]["data"]["kind"], "InvalidArgument");
    search.assert_hits(0);
}

#[tokio::test]
async fn reads_user_resource_and_maps_missing_user() {
    let server = httpmock::MockServer::start();
    let found = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/user/show")
            .query_param("handle", "kyungbaee");
        then.status(200).json_body(json!({
            "handle": "kyungbaee", "tier": 15, "rating": 1650, "solvedCount": 412, "bio": "ignored"
        }));
    });
    let missing = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/user/show")
            .query_param("handle", "no_such_user_xyz");
        then.status(404);
    });

    let (_handle, app) = app_for(server.base_url(), true);
    let session = start(app).await;

    let read = session
        .call(2, "resources/read", json!({"uri":"solvedac://users/kyungbaee"}))
        .await;
    let text = read["result"]["contents"][0]["text"].as_str().unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(text).unwrap(),
        json!({"handle":"kyungbaee","tier":15,"rating":1650,"solvedCount":412})
    );
    found.assert();

    let res = session
        .call(3, "resources/read", json!({"uri":"solvedac://users/no_such_user_xyz"}))
        .await;
    assert_eq!(res["error"]["code"], -32002);
    assert_eq!(res["error"]["data"]["kind"], "NotFound");
    assert!(res["error"]["message"].as_str().unwrap().contains("no_such_user_xyz"));
    missing.assert();
}

#[tokio::test]
async fn inactive_client_reports_client_unavailable() {
    let server = httpmock::MockServer::start();
    let m = server.mock(|when, then| {
        when.method(httpmock::Method::GET);
        then.status(200);
    });
    let (_handle, app) = app_for(server.base_url(), false);
    let session = start(app).await;
    let res = session
        .call(2, "tools/call", json!({"name":"solvedac_get_user_info","arguments":{"handle":"a"}}))
        .await;
    assert_eq!(res["error"]["data"]["kind"], "ClientUnavailable");
    m.assert_hits(0);
}

#[tokio::test]
async fn reads_resources_and_defaults() {
    let server = httpmock::MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/search/problem")
            .query_param("query", "tier:s5..g5 tag:dp")
            .query_param("page", "1");
        then.status(200).json_body(json!({
            "count": 2,
            "items": [
                {"problemId": 1463, "titleKo": "1로 만들기", "level": 8, "isSolvable": true},
                {"problemId": 2579, "titleKo": "계단 오르기", "level": 8, "isSolvable": true}
            ]
        }));
    });

    let (_handle, app) = app_for(server.base_url(), true);
    let session = start(app).await;

    let templates = session.call(2, "resources/templates/list", json!({})).await;
    let uris: Vec<&str> = templates["result"]["resourceTemplates"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["uriTemplate"].as_str())
        .collect();
    assert!(uris.contains(&"solvedac://users/{handle}"));
    assert!(uris.contains(&"solvedac://problems/search/{stub}"));

    let read = session
        .call(
            3,
            "resources/read",
            json!({"uri":"solvedac://problems/search/_?query=tier%3As5..g5%20tag%3Adp&page=1"}),
        )
        .await;
    let text = read["result"]["contents"][0]["text"].as_str().unwrap();
    let body: Value = serde_json::from_str(text).unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["items"][0]["problemId"], 1463);
    assert_eq!(body["items"][1]["problemId"], 2579);

    let defaults = session
        .call(4, "resources/read", json!({"uri":"solvedac://context/defaults"}))
        .await;
    let text = defaults["result"]["contents"][0]["text"].as_str().unwrap();
    assert_eq!(serde_json::from_str::<Value>(text).unwrap(), json!({"lang":"ko"}));
}

#[tokio::test]
async fn gets_search_workflow_prompt() {
    let (_handle, app) = app_for("http://127.0.0.1:1".into(), false);
    let session = start(app).await;

    let list = session.call(2, "prompts/list", json!({})).await;
    assert_eq!(list["result"]["prompts"][0]["name"], "solvedac.search-workflow");

    let res = session
        .call(
            3,
            "prompts/get",
            json!({"name":"solvedac.search-workflow","arguments":{"natural_request":"실버~골드 사이 DP 5문제","page":"1"}}),
        )
        .await;
    let messages = res["result"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "assistant");
    assert_eq!(messages[1]["role"], "user");
    let text = messages[1]["content"]["text"].as_str().unwrap();
    assert!(text.contains("실버~골드 사이 DP 5문제"));
    assert!(text.contains("1"));
}
