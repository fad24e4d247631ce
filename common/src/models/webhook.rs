//! Conversational agent webhook contract.
//!
//! Mirrors the platform's `WebhookRequest` / `WebhookResponse` JSON. Field
//! names are fixed by the platform, including the snake_case
//! `merge_behavior` that sits among camelCase siblings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

/// Inbound webhook call.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[validate(nested)]
    pub fulfillment_info: FulfillmentInfo,

    #[serde(default)]
    pub session_info: SessionInfo,
}

/// Fulfillment metadata; only the tag is consumed.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct FulfillmentInfo {
    /// Intent tag selecting the execution strategy.
    #[validate(length(min = 1, message = "Webhook tag is required"))]
    pub tag: String,
}

/// Session parameters, both inbound and echoed back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SessionInfo {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub parameters: Map<String, Value>,
}

impl SessionInfo {
    /// Looks up a parameter by key.
    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }
}

/// Outbound webhook answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub fulfillment_response: FulfillmentResponse,
    pub session_info: SessionInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FulfillmentResponse {
    pub messages: Vec<ResponseMessage>,
    #[serde(rename = "merge_behavior")]
    pub merge_behavior: MergeBehavior,
}

/// How the platform merges these messages with any static fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeBehavior {
    Append,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResponseMessage {
    pub payload: RichContent,
}

/// Custom payload rendered by the platform's messenger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RichContent {
    pub rich_content: Vec<Vec<RichContentBlock>>,
}

/// One rich-content element (accordion, description, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RichContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub text: RichText,
}

/// Accordions take a single string; descriptions take a list of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RichText {
    Single(String),
    Lines(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use validator::Validate;

    #[test]
    fn test_parse_inbound_request() {
        let req: WebhookRequest = serde_json::from_value(json!({
            "detectIntentResponseId": "abc",
            "fulfillmentInfo": {"tag": "static"},
            "sessionInfo": {"session": "s/1", "parameters": {"sql": "SELECT 1"}}
        }))
        .unwrap();

        assert_eq!(req.fulfillment_info.tag, "static");
        assert_eq!(req.session_info.parameter("sql"), Some(&json!("SELECT 1")));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_missing_session_info_defaults_to_empty() {
        let req: WebhookRequest =
            serde_json::from_value(json!({"fulfillmentInfo": {"tag": "natural"}})).unwrap();
        assert!(req.session_info.parameters.is_empty());
    }

    #[test]
    fn test_empty_tag_fails_validation() {
        let req: WebhookRequest =
            serde_json::from_value(json!({"fulfillmentInfo": {"tag": ""}})).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_response_wire_names() {
        let resp = WebhookResponse {
            fulfillment_response: FulfillmentResponse {
                messages: vec![ResponseMessage {
                    payload: RichContent {
                        rich_content: vec![vec![RichContentBlock {
                            kind: "description".into(),
                            title: "Generated SQL".into(),
                            subtitle: None,
                            text: RichText::Lines(vec!["SELECT 1".into()]),
                        }]],
                    },
                }],
                merge_behavior: MergeBehavior::Append,
            },
            session_info: SessionInfo::default(),
        };

        let value = serde_json::to_value(resp).unwrap();
        assert_eq!(value["fulfillmentResponse"]["merge_behavior"], "APPEND");
        let block = &value["fulfillmentResponse"]["messages"][0]["payload"]["richContent"][0][0];
        assert_eq!(block["type"], "description");
        assert_eq!(block["text"], json!(["SELECT 1"]));
        assert!(block.get("subtitle").is_none());
        assert!(value["sessionInfo"]["parameters"].is_object());
    }
}
