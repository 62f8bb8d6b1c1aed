//! Entity types: agents, threads and messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::identity::{agent_key, MessageId, ThreadId, Timestamp};
use crate::validation::ValidateNonEmpty;

/// Free-form string metadata attached to agents and threads.
pub type Metadata = BTreeMap<String, String>;

// ============================================================================
// AGENTS
// ============================================================================

/// Registration-time capability description of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl AgentInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Case-insensitive registry key.
    pub fn key(&self) -> String {
        agent_key(&self.name)
    }
}

/// Runtime record of a registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRuntime {
    pub info: AgentInfo,
    pub addr: String,
    #[serde(default)]
    pub secure: bool,
    pub registered_at: Timestamp,
    pub last_live_at: Timestamp,
}

impl AgentRuntime {
    pub fn new(info: AgentInfo, addr: impl Into<String>, secure: bool, now: Timestamp) -> Self {
        Self {
            info,
            addr: addr.into(),
            secure,
            registered_at: now,
            last_live_at: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn key(&self) -> String {
        self.info.key()
    }

    /// Record a successful liveness observation.
    pub fn heartbeat(&mut self, now: Timestamp) {
        if now > self.last_live_at {
            self.last_live_at = now;
        }
    }

    /// Base URL used to reach the agent. An address that already carries a
    /// scheme is used as-is.
    pub fn base_url(&self) -> String {
        let addr = self.addr.trim().trim_end_matches('/');
        if addr.contains("://") {
            addr.to_string()
        } else if self.secure {
            format!("https://{}", addr)
        } else {
            format!("http://{}", addr)
        }
    }
}

// ============================================================================
// THREADS
// ============================================================================

/// A shared conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl Thread {
    /// An empty participant list leaves the thread open to any sender.
    pub fn is_open(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn has_participant(&self, name: &str) -> bool {
        let key = agent_key(name);
        self.participants.iter().any(|p| agent_key(p) == key)
    }
}

/// Input for creating a thread. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewThread {
    pub instruction: Option<String>,
    pub participants: Vec<String>,
    pub metadata: Metadata,
}

impl NewThread {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants = participants.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Trims names, drops blanks and collapses case-insensitive duplicates,
    /// keeping the first occurrence.
    pub fn normalized_participants(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.participants
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .filter(|p| seen.insert(agent_key(p)))
            .map(str::to_string)
            .collect()
    }

    /// Materializes the record with a store-assigned id.
    pub fn into_thread(self, id: ThreadId, now: Timestamp) -> Thread {
        let participants = self.normalized_participants();
        Thread {
            id,
            created_at: now,
            updated_at: now,
            instruction: self.instruction.filter(|i| !i.is_empty()),
            participants,
            metadata: self.metadata,
        }
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

/// A tool invocation recorded on a message. Payloads are arbitrary JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl MessageToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
            result: None,
        }
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }
}

/// A message in a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub sender: String,
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<MessageToolCall>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Soft-delete marker. Deleted messages never leave the store.
    #[serde(skip)]
    pub deleted_at: Option<Timestamp>,
}

impl Message {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for appending a message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewMessage {
    pub thread_id: ThreadId,
    pub sender: String,
    pub content: String,
    pub tool_calls: Vec<MessageToolCall>,
}

impl NewMessage {
    pub fn new(thread_id: ThreadId, sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            thread_id,
            sender: sender.into(),
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_call(mut self, tool_call: MessageToolCall) -> Self {
        self.tool_calls.push(tool_call);
        self
    }

    /// Field-level checks that do not need the target thread.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.sender.validate_non_empty("sender")?;
        for (i, call) in self.tool_calls.iter().enumerate() {
            call.name.validate_non_empty(&format!("tool_calls[{}].name", i))?;
        }
        Ok(())
    }

    pub fn into_message(self, id: MessageId, now: Timestamp) -> Message {
        Message {
            id,
            thread_id: self.thread_id,
            sender: self.sender,
            content: self.content,
            tool_calls: self.tool_calls,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::now;
    use serde_json::json;

    #[test]
    fn test_participants_dedup_keeps_first() {
        let new = NewThread::new().with_participants(["Alice", "bob", "alice", " ", "Bob"]);
        assert_eq!(new.normalized_participants(), vec!["Alice", "bob"]);
    }

    #[test]
    fn test_into_thread_assigns_id() {
        let ts = now();
        let thread = NewThread::new()
            .with_instruction("plan a trip")
            .into_thread(ThreadId::new(4), ts);
        assert_eq!(thread.id, ThreadId::new(4));
        assert_eq!(thread.created_at, thread.updated_at);
        assert!(thread.is_open());
        assert_eq!(thread.instruction.as_deref(), Some("plan a trip"));
    }

    #[test]
    fn test_has_participant_case_insensitive() {
        let thread = NewThread::new()
            .with_participants(["Planner"])
            .into_thread(ThreadId::new(1), now());
        assert!(thread.has_participant("planner"));
        assert!(!thread.has_participant("writer"));
    }

    #[test]
    fn test_base_url() {
        let ts = now();
        let plain = AgentRuntime::new(AgentInfo::new("a"), "127.0.0.1:8000", false, ts);
        assert_eq!(plain.base_url(), "http://127.0.0.1:8000");
        let secure = AgentRuntime::new(AgentInfo::new("a"), "agent.example.com/", true, ts);
        assert_eq!(secure.base_url(), "https://agent.example.com");
        let explicit = AgentRuntime::new(AgentInfo::new("a"), "http://x:1", true, ts);
        assert_eq!(explicit.base_url(), "http://x:1");
    }

    #[test]
    fn test_heartbeat_never_moves_backwards() {
        let ts = now();
        let mut rt = AgentRuntime::new(AgentInfo::new("a"), "x", false, ts);
        rt.heartbeat(ts - chrono::Duration::seconds(10));
        assert_eq!(rt.last_live_at, ts);
    }

    #[test]
    fn test_new_message_validation() {
        assert!(NewMessage::new(ThreadId::new(1), "USER", "hi").validate().is_ok());
        assert!(NewMessage::new(ThreadId::new(1), "", "hi").validate().is_err());
        let bad = NewMessage::new(ThreadId::new(1), "USER", "hi")
            .with_tool_call(MessageToolCall::new("", json!({})));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_message_wire_shape_hides_deleted_at() {
        let mut msg = NewMessage::new(ThreadId::new(1), "USER", "hi")
            .with_tool_call(MessageToolCall::new("search", json!({"q": 1})).with_result(json!([1, 2])))
            .into_message(MessageId::new(2), now());
        msg.deleted_at = Some(now());
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("deleted_at").is_none());
        assert_eq!(value["id"], json!(2));
        assert_eq!(value["tool_calls"][0]["arguments"], json!({"q": 1}));
        assert_eq!(value["tool_calls"][0]["result"], json!([1, 2]));
    }
}
