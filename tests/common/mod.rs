#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;
use reqwest::StatusCode;
use serde_json::{json, Value};

use bloqqer_api::config::AppConfig;
use bloqqer_api::database::MemoryStorage;
use bloqqer_api::server::{app, AppState};
use bloqqer_api::services::{Mailer, ServiceError};

/// Clock the tests move forward by hand
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Starts at the real current time so issued tokens are not already expired
    pub fn new() -> Self {
        Self(Mutex::new(Utc::now()))
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.0.lock().expect("clock mutex") += by;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock mutex")
    }
}

/// Keeps every confirmation code instead of mailing it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .expect("mailer mutex")
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_registration_confirmation(&self, email: &str, code: &str) -> Result<(), ServiceError> {
        self.sent.lock().expect("mailer mutex").push((email.to_string(), code.to_string()));
        Ok(())
    }
}

/// The real router over in-memory storage, serving on a free local port
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub clock: Arc<MutableClock>,
    pub mailer: Arc<RecordingMailer>,
}

pub struct LoggedIn {
    pub user_id: String,
    pub jwt: String,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.api.enable_request_logging = false;

        let clock = Arc::new(MutableClock::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(config, Arc::new(MemoryStorage::new()))?
            .with_clock(clock.clone())
            .with_mailer(mailer.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let app = Self {
            base_url,
            client: reqwest::Client::new(),
            clock,
            mailer,
        };
        app.wait_ready(Duration::from_secs(5)).await?;
        Ok(app)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response> {
        Ok(self.client.post(self.url(path)).json(&body).send().await?)
    }

    pub async fn get_as(&self, jwt: &str, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.url(path)).bearer_auth(jwt).send().await?)
    }

    pub async fn post_as(&self, jwt: &str, path: &str, body: Value) -> Result<reqwest::Response> {
        Ok(self.client.post(self.url(path)).bearer_auth(jwt).json(&body).send().await?)
    }

    pub async fn put_as(&self, jwt: &str, path: &str, body: Value) -> Result<reqwest::Response> {
        Ok(self.client.put(self.url(path)).bearer_auth(jwt).json(&body).send().await?)
    }

    pub async fn delete_as(&self, jwt: &str, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.delete(self.url(path)).bearer_auth(jwt).send().await?)
    }

    /// Register, confirm and return the confirmation code's user id
    pub async fn register(&self, email: &str, username: &str) -> Result<String> {
        let res = self.post("/api/auth/register", json!({ "email": email })).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "register failed: {}", res.text().await?);

        let code = self.mailer.last_code_for(email).context("no confirmation code was sent")?;
        let res = self
            .post(
                "/api/auth/register/confirm",
                json!({ "confirmationCode": code, "username": username, "password": "pw" }),
            )
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "confirm failed: {}", res.text().await?);

        let body: Value = res.json().await?;
        Ok(body["userId"].as_str().context("userId missing")?.to_string())
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let res = self.post("/api/auth/login", json!({ "email": email, "password": "pw" })).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.text().await?);
        let body: Value = res.json().await?;
        Ok(body["jwt"].as_str().context("jwt missing")?.to_string())
    }

    pub async fn sign_up(&self, email: &str, username: &str) -> Result<LoggedIn> {
        let user_id = self.register(email, username).await?;
        let jwt = self.login(email).await?;
        Ok(LoggedIn { user_id, jwt })
    }
}
