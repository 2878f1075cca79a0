use std::time::Duration;

use serde_json::json;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://sai-library.saiapplications.com";

const SUMMARY_TEMPLATE: &str = "6892acca9315b2d72e0e9ab4";
const QUESTION_TEMPLATE: &str = "68942f6f8c7cd1b38cbd12e6";

/// Caller-owned configuration for the summarization service. The pipeline
/// core holds no session state of its own.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Blocking client for the summarization service. Failures surface as
/// plain strings starting with "Error" so callers can branch on the reply
/// without a structured error type.
pub struct SummaryClient {
    http: reqwest::blocking::Client,
    config: SummaryConfig,
}

impl SummaryClient {
    pub fn new(config: SummaryConfig) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("adoption-insights/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self { http, config }
    }

    /// Executive summary over the given summary text.
    pub fn summarize(&self, data: &str) -> String {
        self.execute(SUMMARY_TEMPLATE, json!({ "inputs": { "data": data } }))
    }

    /// Free-form question over the given summary text.
    pub fn ask(&self, data: &str, question: &str) -> String {
        self.execute(
            QUESTION_TEMPLATE,
            json!({ "inputs": { "data": data, "pregunta": question } }),
        )
    }

    fn execute(&self, template: &str, body: serde_json::Value) -> String {
        let url = format!("{}/api/templates/{}/execute", self.config.base_url, template);
        debug!("calling summarization service at {url}");

        let response = match self
            .http
            .post(&url)
            .header("X-Api-Key", &self.config.api_key)
            .json(&body)
            .send()
        {
            Ok(response) => response,
            Err(error) => return format!("Error reaching the summarization service: {error}"),
        };

        if response.status() != reqwest::StatusCode::OK {
            return format!(
                "Error from the summarization service: status {}",
                response.status().as_u16()
            );
        }

        match response.text() {
            Ok(text) => text,
            Err(error) => format!("Error reading the summarization reply: {error}"),
        }
    }
}

pub fn is_error_reply(reply: &str) -> bool {
    reply.starts_with("Error")
}
