use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Function,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
}

impl Message {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Body of a chat completion request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RequestPayload<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
    pub repetition_penalty: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub usage: Usage,
}

impl Response {
    /// Text of the first choice, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub finish_reason: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub message: ResponseMessage,
}

/// A message as the server returns it.
///
/// The role stays a plain string: replies may carry roles such as
/// `function_in_progress` that requests never use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ResponseMessage {
    /// The role as a [`ChatRole`], when it is one a request can carry.
    pub fn chat_role(&self) -> Option<ChatRole> {
        match self.role.as_str() {
            "system" => Some(ChatRole::System),
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            "function" => Some(ChatRole::Function),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
    #[serde(default)]
    pub precached_prompt_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_serializes_wire_shape() {
        let messages = vec![Message::system("be brief"), Message::user("hello")];
        let payload = RequestPayload {
            model: "GigaChat",
            messages: &messages,
            stream: false,
            repetition_penalty: 1,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "GigaChat",
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hello" }
                ],
                "stream": false,
                "repetition_penalty": 1
            })
        );
    }

    #[test]
    fn response_tolerates_missing_metadata() {
        let response: Response = serde_json::from_value(json!({
            "choices": [{
                "finish_reason": "stop",
                "index": 0,
                "message": { "role": "assistant", "content": "hi" }
            }],
            "usage": { "prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4 }
        }))
        .unwrap();

        assert_eq!(response.content(), Some("hi"));
        assert_eq!(response.usage.total_tokens, 4);
        assert_eq!(response.usage.precached_prompt_tokens, 0);
        assert!(response.model.is_empty());
    }

    #[test]
    fn response_without_choices_field_decodes_empty() {
        let response: Response = serde_json::from_value(json!({ "model": "GigaChat" })).unwrap();
        assert!(response.choices.is_empty());
        assert_eq!(response.content(), None);

        let response: Response = serde_json::from_value(json!({})).unwrap();
        assert!(response.choices.is_empty());
    }

    #[test]
    fn reply_roles_outside_the_request_set_are_kept() {
        let response: Response = serde_json::from_value(json!({
            "choices": [{
                "finish_reason": "function_call",
                "index": 0,
                "message": { "role": "function_in_progress", "content": "hi" }
            }]
        }))
        .unwrap();

        let message = &response.choices[0].message;
        assert_eq!(message.role, "function_in_progress");
        assert_eq!(message.chat_role(), None);
        assert_eq!(response.content(), Some("hi"));
    }

    #[test]
    fn choice_without_content_decodes_as_empty_text() {
        let response: Response = serde_json::from_value(json!({
            "choices": [{
                "finish_reason": "function_call",
                "index": 0,
                "message": {
                    "role": "assistant",
                    "function_call": { "name": "weather", "arguments": {} }
                }
            }]
        }))
        .unwrap();

        let message = &response.choices[0].message;
        assert_eq!(message.chat_role(), Some(ChatRole::Assistant));
        assert_eq!(response.content(), Some(""));
    }
}
