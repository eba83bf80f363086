use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use shared_config::AppConfig;

pub struct TestConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub triage_idle_timeout: Duration,
    pub queue_poll_interval: Duration,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: Duration::from_secs(5),
            triage_idle_timeout: Duration::from_secs(5),
            queue_poll_interval: Duration::from_millis(50),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            request_timeout: self.request_timeout,
            triage_idle_timeout: self.triage_idle_timeout,
            queue_poll_interval: self.queue_poll_interval,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub password: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Test Patient".to_string(),
            email: "patient@example.com".to_string(),
            contact: "9876543210".to_string(),
            password: "Secret123".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(id: i64, name: &str, email: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
            ..Self::default()
        }
    }
}

pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn login_response(user: &TestUser) -> Value {
        json!({
            "message": "Login successful",
            "name": user.name,
            "email": user.email,
            "contact": user.contact,
            "user_id": user.id
        })
    }

    pub fn signup_response() -> Value {
        json!({ "message": "Signup successful" })
    }

    pub fn error_response(message: &str) -> Value {
        json!({ "message": message })
    }

    pub fn medical_metadata(risk: &str, symptoms: &[&str], doctor: &str) -> Value {
        json!({
            "mode": "medical",
            "risk": risk,
            "symptoms": symptoms,
            "doctor": doctor,
            "advice": format!("Please consult a {} soon.", doctor),
            "severity": 7,
            "recommended_doctors": [Self::doctor("Dr. Meera Nair", doctor, 92.0)]
        })
    }

    pub fn chat_metadata(reply: Option<&str>) -> Value {
        match reply {
            Some(reply) => json!({ "mode": "chat", "reply": reply }),
            None => json!({ "mode": "chat" }),
        }
    }

    pub fn metadata_line(data: Value) -> String {
        json!({ "type": "metadata", "data": data }).to_string()
    }

    pub fn chunk_line(content: &str) -> String {
        json!({ "type": "chunk", "content": content }).to_string()
    }

    /// Joins records into a newline-terminated NDJSON body.
    pub fn ndjson<S: AsRef<str>>(lines: &[S]) -> String {
        lines
            .iter()
            .map(|line| format!("{}\n", line.as_ref()))
            .collect()
    }

    pub fn doctor(name: &str, specialization: &str, match_score: f64) -> Value {
        json!({
            "id": name.len(),
            "name": name,
            "specialization": specialization,
            "hospital": "City Care Hospital",
            "area": "Central",
            "contact": "022-5550100",
            "experience": 12,
            "rating": 4.6,
            "matchScore": match_score,
            "availability": "Available today"
        })
    }

    pub fn queue_entry(id: &str, name: &str, severity: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "age": 42,
            "gender": "female",
            "severity": severity,
            "symptoms": ["fever", "cough"],
            "vitals": {
                "heartRate": 96,
                "temperature": 101.2,
                "bloodPressure": "130/85",
                "oxygenLevel": 95
            },
            "status": "Waiting",
            "waitTime": "12 min"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_base_url("http://localhost:8080").to_app_config();

        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.is_configured());
    }

    #[test]
    fn test_ndjson_body_is_newline_terminated() {
        let body = MockBackendResponses::ndjson(&[
            MockBackendResponses::chunk_line("a"),
            MockBackendResponses::chunk_line("b"),
        ]);

        assert_eq!(body.lines().count(), 2);
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_login_response_fixture() {
        let user = TestUser::new(7, "Asha", "asha@example.com");
        let response = MockBackendResponses::login_response(&user);

        assert_eq!(response["user_id"], 7);
        assert_eq!(response["contact"], "9876543210");
    }
}
