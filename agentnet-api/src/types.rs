//! Request and response shapes of every RPC method.
//!
//! Optional list fields default to empty. Unknown fields are ignored so
//! that newer callers can talk to older servers.

use serde::{Deserialize, Serialize};

use agentnet_core::{
    AgentInfo, AgentRuntime, Message, MessageId, MessageToolCall, Metadata, Thread, ThreadId,
};

/// Result of methods that return nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Empty {}

// ============================================================================
// THREADS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateThreadRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateThreadResponse {
    pub thread_id: ThreadId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetThreadRequest {
    pub thread_id: ThreadId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetThreadsRequest {
    /// Exclusive upper bound on returned ids; 0 starts from the newest.
    #[serde(default)]
    pub cursor: ThreadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetThreadsResponse {
    pub threads: Vec<Thread>,
    /// Present only when more threads exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<ThreadId>,
}

// ============================================================================
// MESSAGES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddMessageRequest {
    pub thread_id: ThreadId,
    pub sender: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<MessageToolCall>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMessageResponse {
    pub message_id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetMessagesRequest {
    pub thread_id: ThreadId,
    /// `latest` or `oldest`. Kept as text so that an unknown value is an
    /// invalid request rather than a params shape error.
    pub order: String,
    #[serde(default)]
    pub cursor: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetMessagesResponse {
    pub messages: Vec<Message>,
    /// Id of the last returned message when more remain, otherwise 0.
    pub next_cursor: MessageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetNumMessagesRequest {
    pub thread_id: ThreadId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetNumMessagesResponse {
    pub num_messages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMessageRequest {
    pub message_id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsMentionedOnceRequest {
    pub agent_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsMentionedOnceResponse {
    pub thread_ids: Vec<ThreadId>,
}

// ============================================================================
// AGENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    pub addr: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub info: Vec<AgentInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeregisterAgentRequest {
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckLiveRequest {
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetAgentRuntimeInfoRequest {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAgentRuntimeInfoResponse {
    pub agent_runtime_info: Vec<AgentRuntime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_fields_default_to_empty() {
        let req: CreateThreadRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.participants.is_empty());
        assert!(req.instruction.is_none());

        let req: AddMessageRequest =
            serde_json::from_value(json!({"thread_id": 1, "sender": "USER", "content": "hi"}))
                .unwrap();
        assert!(req.tool_calls.is_empty());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let req: GetThreadRequest =
            serde_json::from_value(json!({"thread_id": 3, "extra": true})).unwrap();
        assert_eq!(req.thread_id, ThreadId::new(3));
    }

    #[test]
    fn test_get_threads_omits_final_cursor() {
        let resp = GetThreadsResponse {
            threads: vec![],
            next_cursor: None,
        };
        assert_eq!(serde_json::to_value(resp).unwrap(), json!({"threads": []}));
    }

    #[test]
    fn test_empty_serializes_as_object() {
        assert_eq!(serde_json::to_value(Empty {}).unwrap(), json!({}));
    }

    #[test]
    fn test_register_request_shape() {
        let req: RegisterAgentRequest = serde_json::from_value(json!({
            "addr": "127.0.0.1:8000",
            "info": [{"name": "planner", "role": "planning", "metadata": {"team": "a"}}]
        }))
        .unwrap();
        assert!(!req.secure);
        assert_eq!(req.info[0].role, "planning");
        assert_eq!(req.info[0].metadata.get("team").map(String::as_str), Some("a"));
    }
}
