use ev_protocol::Endpoint;
use ev_testkit::{SESSION_COOKIE, World, spawn};
use serde_json::{Value, json};

async fn post(base: &str, path: &str, body: Value) -> Value {
    reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .expect("post")
        .json()
        .await
        .expect("decode json")
}

#[tokio::test]
async fn handshake_requires_token_in_profile() {
    let server = spawn(World::new().with_user("alice", 1500, "Uni"))
        .await
        .expect("spawn");
    let base = server.url();

    let reply = post(&base, "create-affiliation-token", json!({ "atcoder_id": "alice" })).await;
    assert_eq!(reply["status"], "success");
    let affiliation_token = reply["affiliation_token"].as_str().unwrap().to_string();

    let body = json!({ "atcoder_id": "alice", "affiliation_token": affiliation_token });
    let reply = post(&base, "create-token", body.clone()).await;
    assert_eq!(reply["status"], "error");
    assert_eq!(reply["reason"], "affiliation_token not matched");

    server.world.lock().users.get_mut("alice").unwrap().affiliation = affiliation_token;
    let reply = post(&base, "create-token", body).await;
    assert_eq!(reply["status"], "success");
    assert!(reply["token"].as_str().is_some());
    assert_eq!(server.world.lock().calls(Endpoint::CreateToken), 2);
}

#[tokio::test]
async fn unknown_token_is_rejected_with_invalid_token() {
    let server = spawn(World::new()).await.expect("spawn");
    let reply = post(
        &server.url(),
        "statuses",
        json!({ "token": "nope", "editorials": ["https://e/1"] }),
    )
    .await;
    assert_eq!(reply, json!({ "status": "error", "reason": "invalid token" }));

    let reply = post(
        &server.url(),
        "statuses",
        json!({ "token": null, "editorials": ["https://e/1"] }),
    )
    .await;
    assert_eq!(reply["status"], "success");
    assert_eq!(reply["results"][0]["score"], 0);
    assert_eq!(reply["results"][0]["current_vote"], Value::Null);
}

#[tokio::test]
async fn settings_page_needs_session_cookie() {
    let server = spawn(World::new().with_user("alice", 1500, "Uni"))
        .await
        .expect("spawn");
    let client = reqwest::Client::new();
    let anonymous = client
        .get(format!("{}settings", server.url()))
        .send()
        .await
        .expect("get");
    assert_eq!(anonymous.status(), reqwest::StatusCode::FORBIDDEN);

    let page = client
        .get(format!("{}settings", server.url()))
        .header("cookie", format!("{SESSION_COOKIE}=session-alice"))
        .send()
        .await
        .expect("get")
        .text()
        .await
        .expect("body");
    assert!(page.contains(r#"name="ui.Affiliation" value="Uni""#));
}
