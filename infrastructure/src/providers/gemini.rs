//! Google Gemini `generateContent` dialect

use super::http::{Dialect, StreamStep, event_json};
use super::sse::SseEvent;
use debate_application::SessionOptions;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};

pub struct GeminiDialect {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
}

fn candidate_text(body: &Value) -> Option<String> {
    let parts = body["candidates"][0]["content"]["parts"].as_array()?;
    Some(parts.iter().filter_map(|p| p["text"].as_str()).collect())
}

impl GeminiDialect {
    fn url(&self, stream: bool) -> String {
        let base = self.base_url.trim_end_matches('/');
        if stream {
            format!(
                "{base}/v1beta/models/{}:streamGenerateContent?alt=sse",
                self.model
            )
        } else {
            format!("{base}/v1beta/models/{}:generateContent", self.model)
        }
    }

    fn body(&self, options: &SessionOptions, prompt: &str) -> Value {
        let mut generation = json!({"maxOutputTokens": self.max_tokens});
        if let Some(temperature) = options.temperature {
            generation["temperature"] = json!(temperature);
        }
        let mut body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": generation,
        });
        if let Some(system) = &options.system_prompt {
            body["systemInstruction"] = json!({"parts": [{"text": system}]});
        }
        body
    }
}

impl Dialect for GeminiDialect {
    fn request(
        &self,
        client: &Client,
        options: &SessionOptions,
        prompt: &str,
        stream: bool,
    ) -> RequestBuilder {
        client
            .post(self.url(stream))
            .header("x-goog-api-key", &self.api_key)
            .json(&self.body(options, prompt))
    }

    fn response_text(&self, body: &Value) -> Option<String> {
        candidate_text(body)
    }

    // Gemini has no end marker; the stream simply closes
    fn stream_step(&self, event: &SseEvent) -> StreamStep {
        let value = match event_json(event) {
            Ok(value) => value,
            Err(step) => return step,
        };
        if let Some(message) = value["error"]["message"].as_str() {
            return StreamStep::Failed(message.to_string());
        }
        match candidate_text(&value) {
            Some(text) if !text.is_empty() => StreamStep::Delta(text),
            _ => StreamStep::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> GeminiDialect {
        GeminiDialect {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: "k".into(),
            model: "gemini-3-pro-preview".into(),
            max_tokens: 2500,
        }
    }

    #[test]
    fn test_urls() {
        assert!(dialect().url(true).ends_with(
            "/v1beta/models/gemini-3-pro-preview:streamGenerateContent?alt=sse"
        ));
        assert!(dialect().url(false).ends_with(":generateContent"));
    }

    #[test]
    fn test_system_prompt_goes_to_system_instruction() {
        let body = dialect().body(&SessionOptions::with_system_prompt("Be the chairman"), "q");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be the chairman");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "q");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2500);
    }

    #[test]
    fn test_stream_step_reads_candidate_parts() {
        let event = SseEvent {
            event: None,
            data: r#"{"candidates":[{"content":{"parts":[{"text":"PI"},{"text":"VOT"}]}}]}"#
                .into(),
        };
        assert_eq!(dialect().stream_step(&event), StreamStep::Delta("PIVOT".into()));
    }
}
