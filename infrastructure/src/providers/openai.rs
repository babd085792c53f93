//! OpenAI Chat Completions dialect, also used for Azure OpenAI deployments
//! and OpenAI-compatible custom backends

use super::http::{Dialect, StreamStep, event_json};
use super::sse::SseEvent;
use debate_application::SessionOptions;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};

/// Where and how requests are authenticated
pub enum OpenAiEndpoint {
    /// `{base_url}/v1/chat/completions` with a bearer token
    OpenAi { base_url: String },
    /// `{endpoint}/openai/deployments/{deployment}/chat/completions` with an `api-key` header
    Azure {
        endpoint: String,
        api_version: String,
    },
}

pub struct OpenAiDialect {
    pub endpoint: OpenAiEndpoint,
    pub api_key: String,
    /// Model name, or deployment name on Azure
    pub model: String,
    pub max_tokens: u32,
}

impl OpenAiDialect {
    fn url(&self) -> String {
        match &self.endpoint {
            OpenAiEndpoint::OpenAi { base_url } => {
                format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
            }
            OpenAiEndpoint::Azure {
                endpoint,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint.trim_end_matches('/'),
                self.model,
                api_version
            ),
        }
    }

    fn body(&self, options: &SessionOptions, prompt: &str, stream: bool) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &options.system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let mut body = json!({
            "messages": messages,
            "max_tokens": self.max_tokens,
            "stream": stream,
        });
        if matches!(self.endpoint, OpenAiEndpoint::OpenAi { .. }) {
            body["model"] = json!(self.model);
        }
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }
}

impl Dialect for OpenAiDialect {
    fn request(
        &self,
        client: &Client,
        options: &SessionOptions,
        prompt: &str,
        stream: bool,
    ) -> RequestBuilder {
        let request = client.post(self.url()).json(&self.body(options, prompt, stream));
        match self.endpoint {
            OpenAiEndpoint::OpenAi { .. } => request.bearer_auth(&self.api_key),
            OpenAiEndpoint::Azure { .. } => request.header("api-key", &self.api_key),
        }
    }

    fn response_text(&self, body: &Value) -> Option<String> {
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
    }

    fn stream_step(&self, event: &SseEvent) -> StreamStep {
        if event.data.trim() == "[DONE]" {
            return StreamStep::Done;
        }
        let value = match event_json(event) {
            Ok(value) => value,
            Err(step) => return step,
        };
        if let Some(message) = value["error"]["message"].as_str() {
            return StreamStep::Failed(message.to_string());
        }
        match value["choices"][0]["delta"]["content"].as_str() {
            Some(text) if !text.is_empty() => StreamStep::Delta(text.to_string()),
            _ => StreamStep::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(data: &str) -> SseEvent {
        SseEvent {
            event: None,
            data: data.to_string(),
        }
    }

    fn azure() -> OpenAiDialect {
        OpenAiDialect {
            endpoint: OpenAiEndpoint::Azure {
                endpoint: "https://acme.openai.azure.com/".into(),
                api_version: "2024-12-01-preview".into(),
            },
            api_key: "k".into(),
            model: "gpt-4-turbo".into(),
            max_tokens: 2500,
        }
    }

    #[test]
    fn test_azure_url_uses_deployment() {
        assert_eq!(
            azure().url(),
            "https://acme.openai.azure.com/openai/deployments/gpt-4-turbo/chat/completions?api-version=2024-12-01-preview"
        );
        let body = azure().body(&SessionOptions::with_system_prompt("sys"), "q", false);
        assert!(body.get("model").is_none());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "q");
    }

    #[test]
    fn test_openai_url_and_model() {
        let dialect = OpenAiDialect {
            endpoint: OpenAiEndpoint::OpenAi {
                base_url: "https://api.openai.com".into(),
            },
            api_key: "k".into(),
            model: "gpt-4o".into(),
            max_tokens: 10,
        };
        assert_eq!(dialect.url(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(dialect.body(&SessionOptions::default(), "q", true)["model"], "gpt-4o");
    }

    #[test]
    fn test_stream_steps() {
        let d = azure();
        assert_eq!(
            d.stream_step(&data(r#"{"choices":[{"delta":{"content":"GO"}}]}"#)),
            StreamStep::Delta("GO".into())
        );
        assert_eq!(d.stream_step(&data(r#"{"choices":[]}"#)), StreamStep::Skip);
        assert_eq!(d.stream_step(&data("[DONE]")), StreamStep::Done);
        assert!(matches!(d.stream_step(&data("not json")), StreamStep::Failed(_)));
    }

    #[test]
    fn test_response_text() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "{\"score\": 8}"}}]});
        assert_eq!(azure().response_text(&body), Some("{\"score\": 8}".to_string()));
    }
}
