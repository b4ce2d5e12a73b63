//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;

use super::{parse_analysis, AnalysisRequest, AnalyzerError, MealAnalysis, MealAnalyzer, SYSTEM_PROMPT};

const MAX_RETRIES: u32 = 2;

#[derive(Clone)]
pub struct HttpAnalyzer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpAnalyzer {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, AnalyzerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn body(&self, request: &AnalysisRequest) -> serde_json::Value {
        let text = match request.description.trim() {
            "" => "Analyse the meal in this photo.",
            description => description,
        };
        let mut content = vec![serde_json::json!({ "type": "text", "text": text })];
        if let Some(image) = request.image.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            content.push(serde_json::json!({
                "type": "image_url",
                "image_url": { "url": image },
            }));
        }

        serde_json::json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": content },
            ],
        })
    }
}

/// `choices[0].message.content` of a chat completion
fn message_content(json: &serde_json::Value) -> Result<&str, AnalyzerError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| AnalyzerError::Malformed("response has no message content".to_string()))
}

#[async_trait]
impl MealAnalyzer for HttpAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<MealAnalysis, AnalyzerError> {
        if request.is_empty() {
            return Err(AnalyzerError::EmptyRequest);
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalyzerError::NotConfigured("FWD_ANALYZER_API_KEY is not set".to_string()))?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = self.body(request);
        let mut last_err = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_analysis(message_content(&json)?);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = AnalyzerError::Api {
                        status: status.as_u16(),
                        body: body_text,
                    };
                    // Rate limits and server errors are retried, other client errors are not
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!("Analysis attempt {} failed: {}", attempt + 1, err);
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    tracing::warn!("Analysis attempt {} failed: {}", attempt + 1, e);
                    last_err = Some(e.into());
                }
            }
        }

        Err(last_err.unwrap_or_else(|| AnalyzerError::Malformed("analysis failed after retries".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer(key: Option<&str>) -> HttpAnalyzer {
        HttpAnalyzer::new("https://api.example.com/v1/", "test-model", key.map(str::to_string), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_body_includes_image_when_present() {
        let body = analyzer(Some("k")).body(&AnalysisRequest {
            description: "  lunch  ".to_string(),
            image: Some("https://img/1.jpg".to_string()),
        });
        assert_eq!(body["model"], "test-model");
        let content = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["text"], "lunch");
        assert_eq!(content[1]["image_url"]["url"], "https://img/1.jpg");
    }

    #[test]
    fn test_message_content() {
        let json = serde_json::json!({"choices": [{"message": {"content": "{\"food\": \"x\"}"}}]});
        assert_eq!(message_content(&json).unwrap(), "{\"food\": \"x\"}");
        assert!(message_content(&serde_json::json!({"choices": []})).is_err());
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        assert!(!analyzer(Some("  ")).is_configured());
        assert!(analyzer(Some("sk-test")).is_configured());
    }

    #[tokio::test]
    async fn test_analyze_without_key_fails_before_network() {
        let result = analyzer(None)
            .analyze(&AnalysisRequest { description: "toast".to_string(), image: None })
            .await;
        assert!(matches!(result, Err(AnalyzerError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_analyze_empty_request() {
        let result = analyzer(Some("k")).analyze(&AnalysisRequest::default()).await;
        assert!(matches!(result, Err(AnalyzerError::EmptyRequest)));
    }
}
