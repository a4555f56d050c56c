use crate::Result;
use crate::credential::ApiKey;
use crate::errors::AnalysisError;
use crate::logging::*;
use crate::types::DataUri;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_completion_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: DataUri,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl Response {
    /// Text of the first choice, if the model produced any.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

pub fn user_message(prompt: &str, images: &[&DataUri]) -> Message {
    let mut content = Vec::with_capacity(images.len() + 1);
    content.push(ContentPart::Text {
        text: prompt.to_string(),
    });
    content.extend(images.iter().map(|image| ContentPart::ImageUrl {
        image_url: ImageUrl {
            url: (*image).clone(),
        },
    }));
    Message {
        role: "user".to_string(),
        content,
    }
}

pub async fn complete(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &ApiKey,
    request: &Request,
) -> Result<Response, AnalysisError> {
    let log = DEFAULT.new(o!(
        "function" => "chat::complete",
        "model" => request.model.clone(),
    ));
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .bearer_auth(api_key.expose())
        .json(request)
        .send()
        .await?;

    let status = response.status();
    debug!(log, "response received"; "status" => %status);
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(log, "request failed"; "status" => %status, "body" => %body);
        return Err(AnalysisError::Transport(format!("HTTP {status}")));
    }

    let response: Response = response.json().await?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let front = DataUri::new("data:image/png;base64,AAAA");
        let back = DataUri::new("data:image/png;base64,BBBB");
        let request = Request {
            model: "gpt-4o".to_string(),
            messages: vec![user_message("rate me", &[&front, &back])],
            max_completion_tokens: 1500,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-4o",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "rate me"},
                        {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}},
                        {"type": "image_url", "image_url": {"url": "data:image/png;base64,BBBB"}}
                    ]
                }],
                "max_completion_tokens": 1500
            })
        );
    }

    #[test]
    fn test_response_content() {
        let response: Response = serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(response.content(), Some("hello"));

        let empty: Response = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "   "}}]
        }))
        .unwrap();
        assert_eq!(empty.content(), None);

        let none: Response = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(none.content(), None);
    }
}
