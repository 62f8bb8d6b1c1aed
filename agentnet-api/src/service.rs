//! RPC façade over the registry, thread store and message log.
//!
//! Each method deserializes its params into a typed request, calls exactly
//! one component and serializes the typed response. The service keeps no
//! state of its own beyond handles to the components.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

use agentnet_agents::{probe_for_mode, AgentRegistry, LivenessProbe};
use agentnet_core::{MessageId, MessageOrder, NewMessage, NewThread, Thread, ThreadId};
use agentnet_storage::{InMemoryStorage, NetworkStorage};
use agentnet_threads::{MessageLog, ThreadStore};

use crate::config::NetworkConfig;
use crate::error::{RpcError, RpcResult};
use crate::rpc::RpcMethod;
use crate::telemetry::metrics;
use crate::types::*;

/// Stateless dispatcher for every protocol method.
#[derive(Clone)]
pub struct NetworkService {
    registry: AgentRegistry,
    threads: ThreadStore,
    messages: MessageLog,
}

impl NetworkService {
    pub fn new(registry: AgentRegistry, threads: ThreadStore, messages: MessageLog) -> Self {
        Self {
            registry,
            threads,
            messages,
        }
    }

    /// Wire all components onto one storage backend.
    pub fn with_storage(storage: Arc<dyn NetworkStorage>, registry: AgentRegistry) -> Self {
        Self::new(
            registry,
            ThreadStore::new(storage.clone()),
            MessageLog::new(storage),
        )
    }

    /// Build the service described by `config` on in-memory storage.
    pub fn from_config(config: &NetworkConfig) -> RpcResult<Self> {
        let storage: Arc<dyn NetworkStorage> = Arc::new(InMemoryStorage::new());
        let probe = probe_for_mode(config.liveness_probe, config.probe_timeout)
            .map_err(|e| RpcError::internal_error(format!("Failed to build liveness probe: {}", e)))?;
        Ok(Self::with_probe(storage, probe, config))
    }

    pub fn with_probe(
        storage: Arc<dyn NetworkStorage>,
        probe: Arc<dyn LivenessProbe>,
        config: &NetworkConfig,
    ) -> Self {
        let registry =
            AgentRegistry::new(storage.clone(), probe).with_probe_timeout(config.probe_timeout);
        Self::with_storage(storage, registry)
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    /// Run one method with raw params and return the raw result.
    pub async fn dispatch(&self, method: RpcMethod, params: Value) -> RpcResult<Value> {
        match method {
            RpcMethod::CreateThread => encode(self.create_thread(decode(params)?)),
            RpcMethod::GetThread => encode(self.get_thread(decode(params)?)),
            RpcMethod::GetThreads => encode(self.get_threads(decode(params)?)),
            RpcMethod::AddMessage => encode(self.add_message(decode(params)?)),
            RpcMethod::GetMessages => encode(self.get_messages(decode(params)?)),
            RpcMethod::GetNumMessages => encode(self.get_num_messages(decode(params)?)),
            RpcMethod::DeleteMessage => encode(self.delete_message(decode(params)?)),
            RpcMethod::IsMentionedOnce => encode(self.is_mentioned_once(decode(params)?)),
            RpcMethod::RegisterAgent => encode(self.register_agent(decode(params)?)),
            RpcMethod::DeregisterAgent => encode(self.deregister_agent(decode(params)?)),
            RpcMethod::CheckLive => encode(self.check_live(decode(params)?).await),
            RpcMethod::GetAgentRuntimeInfo => {
                encode(self.get_agent_runtime_info(decode(params)?))
            }
        }
    }

    // ========================================================================
    // THREADS
    // ========================================================================

    pub fn create_thread(&self, req: CreateThreadRequest) -> RpcResult<CreateThreadResponse> {
        let new = NewThread {
            instruction: req.instruction,
            participants: req.participants,
            metadata: req.metadata,
        };
        let thread_id = self.threads.create(new)?;
        Ok(CreateThreadResponse { thread_id })
    }

    pub fn get_thread(&self, req: GetThreadRequest) -> RpcResult<Thread> {
        Ok(self.threads.get(req.thread_id)?)
    }

    pub fn get_threads(&self, req: GetThreadsRequest) -> RpcResult<GetThreadsResponse> {
        let page = self.threads.list(req.cursor, req.limit)?;
        Ok(GetThreadsResponse {
            threads: page.items,
            next_cursor: page.next_cursor.map(ThreadId::new),
        })
    }

    // ========================================================================
    // MESSAGES
    // ========================================================================

    pub fn add_message(&self, req: AddMessageRequest) -> RpcResult<AddMessageResponse> {
        let message = NewMessage {
            thread_id: req.thread_id,
            sender: req.sender,
            content: req.content,
            tool_calls: req.tool_calls,
        };
        let message_id = self.messages.append(message)?;
        Ok(AddMessageResponse { message_id })
    }

    pub fn get_messages(&self, req: GetMessagesRequest) -> RpcResult<GetMessagesResponse> {
        let order: MessageOrder = req.order.parse()?;
        let page = self.messages.list(req.thread_id, order, req.cursor, req.limit)?;
        Ok(GetMessagesResponse {
            messages: page.items,
            next_cursor: page.next_cursor.map(MessageId::new).unwrap_or(MessageId::NONE),
        })
    }

    pub fn get_num_messages(&self, req: GetNumMessagesRequest) -> RpcResult<GetNumMessagesResponse> {
        let num_messages = self.messages.count(req.thread_id)?;
        Ok(GetNumMessagesResponse { num_messages })
    }

    pub fn delete_message(&self, req: DeleteMessageRequest) -> RpcResult<Empty> {
        self.messages.delete(req.message_id)?;
        Ok(Empty {})
    }

    pub fn is_mentioned_once(&self, req: IsMentionedOnceRequest) -> RpcResult<IsMentionedOnceResponse> {
        let thread_ids = self.messages.mentioned_once(&req.agent_name)?;
        Ok(IsMentionedOnceResponse { thread_ids })
    }

    // ========================================================================
    // AGENTS
    // ========================================================================

    pub fn register_agent(&self, req: RegisterAgentRequest) -> RpcResult<Empty> {
        self.registry.register(&req.addr, req.secure, req.info)?;
        self.publish_agent_count();
        Ok(Empty {})
    }

    pub fn deregister_agent(&self, req: DeregisterAgentRequest) -> RpcResult<Empty> {
        self.registry.deregister(&req.names)?;
        self.publish_agent_count();
        Ok(Empty {})
    }

    pub async fn check_live(&self, req: CheckLiveRequest) -> RpcResult<Empty> {
        self.registry.check_live(&req.names).await?;
        Ok(Empty {})
    }

    pub fn get_agent_runtime_info(
        &self,
        req: GetAgentRuntimeInfoRequest,
    ) -> RpcResult<GetAgentRuntimeInfoResponse> {
        let agent_runtime_info = self.registry.runtime_info(&req.names, req.all)?;
        Ok(GetAgentRuntimeInfoResponse { agent_runtime_info })
    }

    fn publish_agent_count(&self) {
        if let (Some(m), Ok(count)) = (metrics(), self.registry.count()) {
            m.set_registered_agents(count);
        }
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> RpcResult<T> {
    Ok(serde_json::from_value(params)?)
}

fn encode<T: Serialize>(result: RpcResult<T>) -> RpcResult<Value> {
    serde_json::to_value(result?)
        .map_err(|e| RpcError::internal_error(format!("Failed to encode result: {}", e)))
}

// ============================================================================
// TESTS
// ============================================================================
