#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use netmon_api::{build_router, AppConfig, AppState};
use netmon_core::Role;

pub const SECRET: &str = "integration-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub dir: tempfile::TempDir,
}

impl TestApp {
    /// App whose scanner is a shell script running `nmap_body`. `{dir}` in
    /// the script expands to the app's temp directory.
    pub fn with_nmap(nmap_body: &str) -> Self {
        Self::build(nmap_body, |_| {})
    }

    pub fn new() -> Self {
        Self::with_nmap("exit 0")
    }

    pub fn build(nmap_body: &str, tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let body = nmap_body.replace("{dir}", &dir.path().display().to_string());
        let nmap = fake_nmap(dir.path(), &body);

        let mut config = AppConfig::default();
        config.auth.jwt_secret = SECRET.to_string();
        config.scanner.nmap_path = nmap.display().to_string();
        tweak(&mut config);

        let state = AppState::new(&config, None);
        let router = build_router(state.clone());
        Self { router, state, dir }
    }

    pub fn token(&self, subject: &str, role: Role) -> String {
        self.state
            .authenticator
            .issue(subject, &role)
            .expect("issue token")
            .token
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub fn marker(&self) -> PathBuf {
        self.dir.path().join("nmap-ran")
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

/// Write an executable shell script that stands in for nmap.
pub fn fake_nmap(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-nmap");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

pub fn printing(xml: &str) -> String {
    format!("cat <<'XML'\n{xml}\nXML")
}
