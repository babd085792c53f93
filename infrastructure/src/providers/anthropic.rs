//! Anthropic Messages API dialect

use super::http::{Dialect, StreamStep, event_json};
use super::sse::SseEvent;
use debate_application::SessionOptions;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};

pub struct AnthropicDialect {
    pub base_url: String,
    pub api_key: String,
    pub api_version: String,
    pub model: String,
    pub max_tokens: u32,
}

impl AnthropicDialect {
    fn body(&self, options: &SessionOptions, prompt: &str, stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
            "stream": stream,
        });
        if let Some(system) = &options.system_prompt {
            body["system"] = json!(system);
        }
        if let Some(temperature) = options.temperature {
            // Messages API accepts 0..=1
            body["temperature"] = json!(temperature.clamp(0.0, 1.0));
        }
        body
    }
}

impl Dialect for AnthropicDialect {
    fn request(
        &self,
        client: &Client,
        options: &SessionOptions,
        prompt: &str,
        stream: bool,
    ) -> RequestBuilder {
        client
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&self.body(options, prompt, stream))
    }

    fn response_text(&self, body: &Value) -> Option<String> {
        let text: String = body["content"]
            .as_array()?
            .iter()
            .filter(|block| block["type"] == "text")
            .filter_map(|block| block["text"].as_str())
            .collect();
        Some(text)
    }

    fn stream_step(&self, event: &SseEvent) -> StreamStep {
        match event.event.as_deref() {
            Some("content_block_delta") => match event_json(event) {
                Ok(value) => value["delta"]["text"]
                    .as_str()
                    .map(|t| StreamStep::Delta(t.to_string()))
                    .unwrap_or(StreamStep::Skip),
                Err(step) => step,
            },
            Some("message_stop") => StreamStep::Done,
            Some("error") => {
                let message = event_json(event)
                    .ok()
                    .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                    .unwrap_or_else(|| event.data.clone());
                StreamStep::Failed(message)
            }
            _ => StreamStep::Skip,
        }
    }
}
