//! Webhook response construction.

use common::models::query::QueryFailure;
use common::models::webhook::{
    FulfillmentResponse, MergeBehavior, ResponseMessage, RichContent, RichContentBlock, RichText,
    SessionInfo, WebhookResponse,
};
use serde_json::{Map, Value};

use crate::formatter::FormattedPayload;

pub const TABLE_TITLE: &str = "SQL Result";
pub const TABLE_SUBTITLE: &str = "SQL Result Details";
pub const GENERATED_SQL_TITLE: &str = "Generated SQL";
pub const GENERATION_ERROR_TITLE: &str = "Error Generating SQL";
pub const EXECUTION_ERROR_TITLE: &str = "Error Executing SQL";

const ACCORDION: &str = "accordion";
const DESCRIPTION: &str = "description";

/// Accordion holding the rendered table.
pub fn table(payload: &FormattedPayload, row_count: usize) -> WebhookResponse {
    let text = payload.as_text().to_string();
    let block = RichContentBlock {
        kind: ACCORDION.to_string(),
        title: TABLE_TITLE.to_string(),
        subtitle: Some(TABLE_SUBTITLE.to_string()),
        text: RichText::Single(text.clone()),
    };

    let mut parameters = Map::new();
    parameters.insert("rowCount".into(), Value::String(row_count.to_string()));
    parameters.insert("table".into(), Value::String(text));
    envelope(block, parameters)
}

/// Description block holding SQL produced by the natural-language function.
pub fn generated_sql(payload: &FormattedPayload, row_count: usize) -> WebhookResponse {
    let sql = payload.as_text().to_string();
    let block = RichContentBlock {
        kind: DESCRIPTION.to_string(),
        title: GENERATED_SQL_TITLE.to_string(),
        subtitle: None,
        text: RichText::Lines(vec![sql.clone()]),
    };

    let mut parameters = Map::new();
    parameters.insert("rowCount".into(), Value::String(row_count.to_string()));
    parameters.insert("sql".into(), Value::String(sql));
    envelope(block, parameters)
}

/// Description block reporting a failed statement.
pub fn error(title: &str, failure: &QueryFailure) -> WebhookResponse {
    let block = RichContentBlock {
        kind: DESCRIPTION.to_string(),
        title: title.to_string(),
        subtitle: None,
        text: RichText::Lines(vec![failure.message.clone(), failure.details.clone()]),
    };

    let mut parameters = Map::new();
    parameters.insert("rowCount".into(), Value::String("0".into()));
    parameters.insert("error".into(), Value::String("true".into()));
    envelope(block, parameters)
}

fn envelope(block: RichContentBlock, parameters: Map<String, Value>) -> WebhookResponse {
    WebhookResponse {
        fulfillment_response: FulfillmentResponse {
            messages: vec![ResponseMessage {
                payload: RichContent {
                    rich_content: vec![vec![block]],
                },
            }],
            merge_behavior: MergeBehavior::Append,
        },
        session_info: SessionInfo { parameters },
    }
}
