//! Shared data models.

pub mod query;
pub mod webhook;

// Re-export commonly used types
pub use query::{ColumnInfo, QueryFailure, QueryOutcome, QueryResult, SqlStatement};
pub use webhook::{
    FulfillmentInfo, FulfillmentResponse, MergeBehavior, ResponseMessage, RichContent, RichContentBlock,
    RichText, SessionInfo, WebhookRequest, WebhookResponse,
};
