//! Agent Network Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for agents, message content and tool calls
//! - Fixtures wiring components onto in-memory storage
//! - A scripted liveness probe
//! - Assertions over `NetworkResult`

pub use agentnet_core::{
    AgentInfo, AgentRuntime, LivenessError, Message, MessageId, MessageToolCall, NetworkError,
    NetworkResult, NewMessage, NewThread, StorageError, Thread, ThreadId, ValidationError,
    USER_SENDER,
};
pub use agentnet_storage::{InMemoryStorage, NetworkStorage};

use agentnet_agents::{AgentRegistry, LivenessProbe, ProbeError, RecordLivenessProbe};
use agentnet_threads::{MessageLog, ThreadStore};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Agent Network inputs.

    use super::*;
    use proptest::prelude::*;
    use proptest::sample::Index;
    use serde_json::json;

    /// A lowercase agent name that is safe inside an `@mention`.
    pub fn arb_agent_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,15}"
    }

    pub fn arb_agent_info() -> impl Strategy<Value = AgentInfo> {
        (arb_agent_name(), "[a-z ]{0,20}", prop::option::of("[a-z]{1,10}")).prop_map(
            |(name, description, role)| {
                let info = AgentInfo::new(name).with_description(description);
                match role {
                    Some(role) => info.with_role(role),
                    None => info,
                }
            },
        )
    }

    /// Filler text with exactly `mentions` mentions of `agent` at random
    /// positions. Filler words never contain `@`.
    pub fn arb_content_with_mentions(
        agent: String,
        mentions: usize,
    ) -> impl Strategy<Value = String> {
        (
            prop::collection::vec("[a-z]{1,8}", 0..8),
            prop::collection::vec(any::<Index>(), mentions),
        )
            .prop_map(move |(mut words, slots)| {
                for slot in slots {
                    let at = slot.index(words.len() + 1);
                    words.insert(at, format!("@{}", agent));
                }
                words.join(" ")
            })
    }

    pub fn arb_tool_call() -> impl Strategy<Value = MessageToolCall> {
        ("[a-z_]{1,12}", any::<i64>(), prop::option::of(any::<bool>())).prop_map(
            |(name, arg, result)| {
                let call = MessageToolCall::new(name, json!({ "arg": arg }));
                match result {
                    Some(ok) => call.with_result(json!({ "ok": ok })),
                    None => call,
                }
            },
        )
    }
}

// ============================================================================
// SCRIPTED PROBE
// ============================================================================

/// Liveness probe with a fixed script: names in `down` fail, names in
/// `slow` answer after `delay`, everyone else is live. Names match
/// case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StubProbe {
    down: BTreeSet<String>,
    slow: BTreeSet<String>,
    delay: Duration,
}

impl StubProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_down(mut self, name: &str) -> Self {
        self.down.insert(agentnet_core::agent_key(name));
        self
    }

    pub fn with_slow(mut self, name: &str, delay: Duration) -> Self {
        self.slow.insert(agentnet_core::agent_key(name));
        self.delay = delay;
        self
    }
}

#[async_trait]
impl LivenessProbe for StubProbe {
    async fn probe(&self, agent: &AgentRuntime) -> Result<(), ProbeError> {
        let key = agent.key();
        if self.down.contains(&key) {
            return Err(ProbeError::Status {
                url: agent.base_url(),
                status: 503,
            });
        }
        if self.slow.contains(&key) {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Components wired onto fresh in-memory storage.

    use super::*;

    pub fn storage() -> Arc<dyn NetworkStorage> {
        Arc::new(InMemoryStorage::new())
    }

    /// Registry whose probe treats every registered agent as live.
    pub fn record_registry() -> AgentRegistry {
        AgentRegistry::new(storage(), Arc::new(RecordLivenessProbe))
    }

    pub fn stub_registry(probe: StubProbe, timeout: Duration) -> AgentRegistry {
        AgentRegistry::new(storage(), Arc::new(probe)).with_probe_timeout(timeout)
    }

    /// Thread store and message log sharing one backend.
    pub fn thread_components() -> (ThreadStore, MessageLog) {
        let storage = storage();
        (ThreadStore::new(storage.clone()), MessageLog::new(storage))
    }

    /// Create a thread without participants, open to every sender.
    pub fn open_thread(store: &ThreadStore) -> NetworkResult<ThreadId> {
        store.create(NewThread::new().with_instruction("test thread"))
    }

    pub fn user_message(thread_id: ThreadId, content: &str) -> NewMessage {
        NewMessage::new(thread_id, USER_SENDER, content)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over component results.

    use super::*;

    pub fn assert_not_found<T: std::fmt::Debug>(result: &NetworkResult<T>) {
        match result {
            Err(e) if e.is_not_found() => {}
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    pub fn assert_validation<T: std::fmt::Debug>(result: &NetworkResult<T>) {
        assert!(
            matches!(result, Err(NetworkError::Validation(_))),
            "Expected validation error, got {:?}",
            result
        );
    }

    /// Assert a liveness failure naming exactly `expected` (any order).
    pub fn assert_liveness<T: std::fmt::Debug>(result: &NetworkResult<T>, expected: &[&str]) {
        match result {
            Err(NetworkError::Liveness(LivenessError { unreachable })) => {
                let mut want: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
                want.sort();
                assert_eq!(unreachable, &want);
            }
            other => panic!("Expected liveness failure, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::assertions::*;
    use super::fixtures::*;
    use super::generators::*;
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_stub_probe_script() {
        let probe = StubProbe::new().with_down("Down");
        let now = agentnet_core::now();
        let down = AgentRuntime::new(AgentInfo::new("down"), "h:1", false, now);
        let up = AgentRuntime::new(AgentInfo::new("up"), "h:1", false, now);
        assert!(probe.probe(&down).await.is_err());
        assert!(probe.probe(&up).await.is_ok());
    }

    #[test]
    fn test_fixture_assertions() {
        let (store, log) = thread_components();
        assert_not_found(&store.get(ThreadId::new(42)));
        let thread_id = open_thread(&store).unwrap();
        assert_validation(&log.append(NewMessage::new(thread_id, "", "x")));
        assert!(log.append(user_message(thread_id, "hi")).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_content_has_requested_mentions(
            (name, content) in arb_agent_name().prop_flat_map(|name| {
                (Just(name.clone()), arb_content_with_mentions(name, 2))
            })
        ) {
            prop_assert_eq!(agentnet_core::count_mentions(&content, &name), 2);
        }
    }
}
