//! Shared helpers for integration tests.
//!
//! Provides a scripted [`CommandRunner`] so pipeline runs never spawn real
//! processes, configuration builders that keep every external URL pointed at
//! a closed local port, and a tiny mock HTTP server for API-backed probes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tower::util::ServiceExt;

use pipewatch::config::Config;
use pipewatch::endpoints::create_router;
use pipewatch::services::command::{CommandOutput, CommandRunner, CommandSpec};
use pipewatch::state::AppState;

/// Address nothing listens on; connections are refused immediately
pub const CLOSED_URL: &str = "http://127.0.0.1:1";

/// Build a config from explicit variables only, ignoring the process environment.
///
/// External API bases default to [`CLOSED_URL`] so no test reaches the network.
pub fn test_config(pairs: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("GITHUB_API_URL", CLOSED_URL),
        ("GITHUB_URL", CLOSED_URL),
        ("DOCKERHUB_API_URL", CLOSED_URL),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in pairs {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(&|key: &str| vars.get(key).cloned())
}

/// Command runner that records every call and answers from a script.
///
/// Calls are keyed by `"<program> <first arg>"` (e.g. `"git clone"`). Unscripted
/// calls succeed with empty output, except `git rev-parse` which reports a
/// fixed short sha. A successful `git clone` creates the checkout directory and
/// writes any configured marker files into it.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<CommandSpec>>,
    responses: HashMap<String, CommandOutput>,
    checkout_files: Vec<(String, String)>,
}

pub const FAKE_SHA: &str = "abc1234";

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, key: &str, code: i32, output: &str) -> Self {
        self.responses
            .insert(key.to_string(), CommandOutput::new(code, output));
        self
    }

    pub fn with_checkout_file(mut self, name: &str, contents: &str) -> Self {
        self.checkout_files
            .push((name.to_string(), contents.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }

    /// `"<program> <first arg>"` of every call, in order
    pub fn keys(&self) -> Vec<String> {
        self.calls().iter().map(call_key).collect()
    }

    pub fn find(&self, key: &str) -> Option<CommandSpec> {
        self.calls().into_iter().find(|c| call_key(c) == key)
    }

    /// Workspace directory of the last clone (parent of the checkout path)
    pub fn workspace(&self) -> Option<PathBuf> {
        let clone = self.find("git clone")?;
        let checkout = PathBuf::from(clone.args.last()?);
        checkout.parent().map(|p| p.to_path_buf())
    }
}

pub fn call_key(spec: &CommandSpec) -> String {
    format!(
        "{} {}",
        spec.program,
        spec.args.first().map(String::as_str).unwrap_or("")
    )
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> CommandOutput {
        self.calls.lock().push(spec.clone());
        let key = call_key(spec);

        let out = match self.responses.get(&key) {
            Some(out) => out.clone(),
            None if key == "git rev-parse" => CommandOutput::new(0, format!("{}\n", FAKE_SHA)),
            None => CommandOutput::new(0, ""),
        };

        if key == "git clone" && out.success() {
            if let Some(target) = spec.args.last() {
                let checkout = PathBuf::from(target);
                std::fs::create_dir_all(&checkout).expect("create fake checkout");
                for (name, contents) in &self.checkout_files {
                    std::fs::write(checkout.join(name), contents).expect("write marker file");
                }
            }
        }

        out
    }
}

/// App state wired to a scripted runner
pub fn build_app_state(config: Config, runner: Arc<ScriptedRunner>) -> AppState {
    AppState::new(config, runner)
}

/// Send a request through a fresh router built from `state`
pub async fn send(state: AppState, request: Request<Body>) -> Response {
    create_router(state).oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
