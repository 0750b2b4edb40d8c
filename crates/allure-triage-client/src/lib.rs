//! allure-triage-client: blocking HTTP access to the Allure report service.
//!
//! Two endpoints, two failure modes: the categories tree is fatal to the
//! run when it cannot be fetched, per-test detail degrades to a placeholder
//! and the run continues. Requests are sequential, one at a time, in
//! discovery order. No retries.

use serde::Deserialize;
use serde_json::Value;

use allure_triage_core::report::ReportedTest;
use allure_triage_core::resolve::{Resolution, UnresolvedPolicy, resolve_failed_tests};
use allure_triage_core::Config;

/// Client for the Allure data endpoints, with optional basic auth.
pub struct TriageClient {
    http: reqwest::blocking::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

/// Everything one run collected: records in discovery order plus warnings
/// about failed tests whose parent category lookup missed.
#[derive(Debug, Clone, Default)]
pub struct TriageRun {
    pub records: Vec<ReportedTest>,
    pub unresolved: Vec<String>,
}

/// Per-test detail from `test-cases/{uid}.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseDetail {
    #[serde(default)]
    pub before_stages: Vec<Stage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub name: String,
}

impl TestCaseDetail {
    /// All setup-step names across every before-stage, in order.
    #[must_use]
    pub fn before_stage_steps(&self) -> Vec<String> {
        self.before_stages
            .iter()
            .flat_map(|stage| stage.steps.iter().map(|step| step.name.clone()))
            .collect()
    }
}

impl TriageClient {
    /// Build a client from config. Default timeout is 10 seconds.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let timeout = config.timeout_secs.unwrap_or(10);
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout))
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials(),
        })
    }

    /// Fetch the top-level categories tree. Any failure here is fatal to
    /// the run.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status, or
    /// unparseable JSON.
    pub fn fetch_categories(&self) -> Result<Value, ClientError> {
        self.get_json(&format!("{}/categories.json", self.base_url))
    }

    /// Fetch per-test detail. Recoverable: any failure logs a warning and
    /// yields `None`, and the caller substitutes a placeholder.
    #[must_use]
    pub fn fetch_test_case(&self, uid: &str) -> Option<TestCaseDetail> {
        let url = format!("{}/test-cases/{uid}.json", self.base_url);
        match self.get_json::<TestCaseDetail>(&url) {
            Ok(detail) => Some(detail),
            Err(e) => {
                eprintln!("Warning: failed to fetch test case {uid}: {e}");
                None
            }
        }
    }

    /// Full collection pipeline: fetch the tree, resolve failed tests, then
    /// fetch each test's detail sequentially in discovery order.
    ///
    /// # Errors
    ///
    /// Returns error only if the categories tree cannot be fetched.
    pub fn collect(&self, policy: UnresolvedPolicy) -> Result<TriageRun, ClientError> {
        let tree = self.fetch_categories()?;
        let Resolution { tests, unresolved } = resolve_failed_tests(&tree, policy);

        let records = tests
            .into_iter()
            .map(|test| {
                let steps = self
                    .fetch_test_case(&test.uid)
                    .map(|detail| detail.before_stage_steps());
                ReportedTest { test, steps }
            })
            .collect();

        Ok(TriageRun {
            records,
            unresolved,
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let mut req = self.http.get(url);
        if let Some((user, pass)) = &self.credentials {
            req = req.basic_auth(user, Some(pass));
        }

        let resp = req.send().map_err(|e| ClientError::Http(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.json().map_err(|e| ClientError::Json {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Invalid JSON from {url}: {reason}")]
    Json { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_deserializes_from_allure_shape() {
        let json = r#"{
            "name": "Admin Login Test",
            "beforeStages": [
                {"steps": [{"name": "Open browser"}, {"name": "Navigate to login"}]},
                {"steps": [{"name": "Enter credentials"}]}
            ],
            "testStage": {"steps": []}
        }"#;
        let detail: TestCaseDetail = serde_json::from_str(json).unwrap();
        assert_eq!(
            detail.before_stage_steps(),
            vec!["Open browser", "Navigate to login", "Enter credentials"]
        );
    }

    #[test]
    fn detail_tolerates_missing_before_stages() {
        let detail: TestCaseDetail = serde_json::from_str("{}").unwrap();
        assert!(detail.before_stage_steps().is_empty());
    }

    #[test]
    fn detail_tolerates_stage_without_steps() {
        let detail: TestCaseDetail =
            serde_json::from_str(r#"{"beforeStages": [{"name": "setup"}]}"#).unwrap();
        assert!(detail.before_stage_steps().is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = Config {
            base_url: "http://ci.local/allure/data/".to_string(),
            ..Config::default()
        };
        let client = TriageClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://ci.local/allure/data");
    }

    #[test]
    fn credentials_taken_from_config() {
        let config = Config {
            username: Some("bot".into()),
            password: Some("secret".into()),
            ..Config::default()
        };
        let client = TriageClient::from_config(&config).unwrap();
        assert_eq!(client.credentials, Some(("bot".into(), "secret".into())));
    }
}
