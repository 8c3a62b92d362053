#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt as _;
use tower::ServiceExt as _;

use venbaah::config::{Config, SecretKey};
use venbaah::storage::Database;

pub const SECRET: &str = "integration-test-secret-key";
pub const BOUNDARY: &str = "venbaah-test-boundary";

pub struct TestApp {
    pub temp: tempfile::TempDir,
    pub config: Config,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_max_upload_bytes(16 * 1024 * 1024)
    }

    pub fn with_max_upload_bytes(max_upload_bytes: usize) -> anyhow::Result<Self> {
        let temp = tempfile::TempDir::new()?;
        let config = Config {
            addr: "127.0.0.1:0".parse()?,
            database_path: temp.path().join("venbaah.db"),
            upload_dir: temp.path().join("uploads"),
            static_dir: temp.path().join("static"),
            secret_key: SecretKey::new(SECRET)?,
            max_upload_bytes,
            csrf_ttl: Duration::from_secs(3600),
        };
        let router = venbaah::app::build(&config)?;
        Ok(Self {
            temp,
            config,
            router,
        })
    }

    pub fn db(&self) -> Database {
        Database::new(&self.config.database_path)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    pub fn uploaded_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(self.upload_dir())? {
            files.push(entry?.path());
        }
        files.sort();
        Ok(files)
    }

    pub fn csrf_token(&self) -> String {
        venbaah::session::issue_csrf_token(&self.config.secret_key, chrono::Utc::now())
    }

    pub async fn send(&self, request: Request<Body>) -> anyhow::Result<Response<Body>> {
        Ok(self.router.clone().oneshot(request).await?)
    }

    pub async fn get(&self, uri: &str) -> anyhow::Result<Response<Body>> {
        self.send(Request::get(uri).body(Body::empty())?).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> anyhow::Result<Response<Body>> {
        self.send(
            Request::get(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())?,
        )
        .await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        pairs: &[(&str, &str)],
    ) -> anyhow::Result<Response<Body>> {
        let body = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))?,
        )
        .await
    }

    pub async fn post_multipart(&self, uri: &str, body: Vec<u8>) -> anyhow::Result<Response<Body>> {
        self.send(
            Request::post(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))?,
        )
        .await
    }

    /// Posts a complete upload form with a valid CSRF token.
    pub async fn upload(
        &self,
        title: &str,
        author: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> anyhow::Result<Response<Body>> {
        let token = self.csrf_token();
        let body = MultipartBuilder::default()
            .text("csrf_token", &token)
            .text("title", title)
            .text("author", author)
            .text("description", "")
            .file("file", file_name, bytes)
            .finish();
        self.post_multipart("/upload-book", body).await
    }
}

pub async fn body_bytes(resp: Response<Body>) -> anyhow::Result<Vec<u8>> {
    Ok(resp.into_body().collect().await?.to_bytes().to_vec())
}

pub async fn body_text(resp: Response<Body>) -> anyhow::Result<String> {
    Ok(String::from_utf8(body_bytes(resp).await?)?)
}

pub async fn body_json(resp: Response<Body>) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::from_slice(&body_bytes(resp).await?)?)
}

/// `name=value` of the first `Set-Cookie` header, without attributes.
pub fn set_cookie_pair<B>(resp: &Response<B>) -> Option<String> {
    let value = resp.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    Some(value.split(';').next()?.trim().to_string())
}

pub fn location<B>(resp: &Response<B>) -> Option<String> {
    Some(resp.headers().get(header::LOCATION)?.to_str().ok()?.to_string())
}

fn form_encode(value: &str) -> String {
    let mut out = String::new();
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[derive(Default)]
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        let head = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        );
        self.body.extend_from_slice(head.as_bytes());
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// Deterministic fake PDF of `len` bytes.
pub fn fake_pdf(len: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.extend((0..len.saturating_sub(bytes.len())).map(|i| (i % 251) as u8));
    bytes.truncate(len);
    bytes
}
