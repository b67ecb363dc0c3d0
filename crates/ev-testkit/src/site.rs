//! Fake host site: the profile settings form and editorial listings.

use axum::extract::{Path, State};
use axum::http::header::COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};

use crate::{SESSION_COOKIE, WorldHandle};

const AFFILIATION_FIELD: &str = "ui.Affiliation";

pub(crate) fn router() -> Router<WorldHandle> {
    Router::new()
        .route("/settings", get(settings_page).post(settings_submit))
        .route("/contests/{contest}/editorial", get(contest_editorials))
        .route(
            "/contests/{contest}/tasks/{task}/editorial",
            get(task_editorials),
        )
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn signed_in(world: &WorldHandle, headers: &HeaderMap) -> Result<String, Response> {
    let session = session_cookie(headers).ok_or_else(|| StatusCode::FORBIDDEN.into_response())?;
    world
        .lock()
        .user_for_session(&session)
        .map(str::to_string)
        .ok_or_else(|| StatusCode::FORBIDDEN.into_response())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn csrf_for(user: &str) -> String {
    format!("csrf-{user}")
}

async fn settings_page(State(world): State<WorldHandle>, headers: HeaderMap) -> Response {
    let user = match signed_in(&world, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let affiliation = world.lock().affiliation(&user).unwrap_or_default().to_string();
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Settings</title></head>
<body>
<form action="/logout" method="POST"><input type="hidden" name="csrf_token" value="{csrf}"></form>
<div id="main-container" class="container">
<form class="form-horizontal" method="POST" action="/settings">
  <input type="hidden" name="csrf_token" value="{csrf}">
  <input type="text" name="ui.UserScreenName" value="{user}" disabled>
  <select name="ui.Country">
    <option value="US">United States</option>
    <option value="JP" selected>Japan</option>
  </select>
  <input type="text" name="ui.BirthYear" value="2000">
  <input type="text" name="{field}" value="{affiliation}">
  <textarea name="ui.Note">
hello &amp; welcome</textarea>
  <input type="checkbox" name="ui.Public" value="true" checked>
  <input type="checkbox" name="ui.Newsletter" value="true">
  <button type="submit" class="btn btn-primary">Save</button>
</form>
</div>
</body>
</html>"#,
        csrf = escape(&csrf_for(&user)),
        user = escape(&user),
        field = AFFILIATION_FIELD,
        affiliation = escape(&affiliation),
    ))
    .into_response()
}

async fn settings_submit(
    State(world): State<WorldHandle>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let user = match signed_in(&world, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let field = |name: &str| {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };
    if field("csrf_token") != Some(csrf_for(&user).as_str()) {
        return StatusCode::BAD_REQUEST.into_response();
    }
    // Fields the page renders must all come back.
    for required in ["ui.Country", "ui.BirthYear", "ui.Note", AFFILIATION_FIELD] {
        if field(required).is_none() {
            return (StatusCode::BAD_REQUEST, format!("missing {required}")).into_response();
        }
    }

    let mut world = world.lock();
    if let Some(Some(status)) = world.settings_post_outcomes.pop_front() {
        return StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response();
    }
    let affiliation = field(AFFILIATION_FIELD).unwrap_or_default().to_string();
    if let Some(account) = world.users.get_mut(&user) {
        account.affiliation = affiliation.clone();
    }
    world.affiliation_history.push((user, affiliation));
    Html("<p>Saved.</p>".to_string()).into_response()
}

fn editorial_listing(world: &WorldHandle, path: String) -> Response {
    let Some(hrefs) = world.lock().editorial_pages.get(&path).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let anchors: String = hrefs
        .iter()
        .map(|href| {
            format!(
                "<li><a href=\"{}\" target=\"_blank\" rel=\"noopener\">editorial</a></li>\n",
                escape(href)
            )
        })
        .collect();
    Html(format!(
        r#"<html><body>
<nav><a href="https://twitter.com/atcoder" rel="noopener">news</a></nav>
<div id="main-container">
<a href="/contests">Contests</a>
<ul>
{anchors}</ul>
</div>
</body></html>"#
    ))
    .into_response()
}

async fn contest_editorials(
    State(world): State<WorldHandle>,
    Path(contest): Path<String>,
) -> Response {
    editorial_listing(&world, format!("contests/{contest}/editorial"))
}

async fn task_editorials(
    State(world): State<WorldHandle>,
    Path((contest, task)): Path<(String, String)>,
) -> Response {
    editorial_listing(&world, format!("contests/{contest}/tasks/{task}/editorial"))
}
