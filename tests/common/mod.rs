#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Context;
use oj_api_tool::config::Config;
use oj_api_tool::cookie_store::{CookieFile, StoredCookie};
use oj_api_tool::prompt::Prompter;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::{MockServer, ResponseTemplate};

pub struct TestEnv {
    pub server: MockServer,
    pub dir: TempDir,
    pub config: Config,
}

impl TestEnv {
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("Failed to create a temporary directory.");
        let config = Config::new(
            Some(&server.uri()),
            Some(dir.path().join("cookies.json")),
            true,
        )
        .expect("Failed to build the configuration.");
        Self {
            server,
            dir,
            config,
        }
    }

    pub fn cookie_store_path(&self) -> &PathBuf {
        &self.config.cookie_store_path
    }

    /// Pretends that an earlier run has saved these cookies.
    pub fn save_cookies(&self, cookies: &[(&str, &str)]) {
        let file = CookieFile {
            cookies: cookies
                .iter()
                .map(|&(name, value)| StoredCookie {
                    name: name.into(),
                    value: value.into(),
                    domain: "127.0.0.1".into(),
                    path: "/".into(),
                    host_only: true,
                })
                .collect(),
        };
        file.save(self.cookie_store_path())
            .expect("Failed to save cookies.");
    }
}

/// Successful envelope around `data`.
pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"error": null, "data": data}))
}

pub fn rejected(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"error": "error", "data": message}))
}

/// Answers prompts in order, failing once the script runs out.
pub struct Scripted(pub VecDeque<&'static str>);

impl Scripted {
    pub fn new<const N: usize>(answers: [&'static str; N]) -> Self {
        Self(answers.into())
    }

    fn next(&mut self) -> anyhow::Result<String> {
        Ok(self
            .0
            .pop_front()
            .context("Prompted more times than expected")?
            .to_owned())
    }
}

impl Prompter for Scripted {
    fn username(&mut self) -> anyhow::Result<String> {
        self.next()
    }
    fn password(&mut self) -> anyhow::Result<String> {
        self.next()
    }
    fn tfa_code(&mut self) -> anyhow::Result<String> {
        self.next()
    }
    fn contest_id(&mut self) -> anyhow::Result<String> {
        self.next()
    }
}
