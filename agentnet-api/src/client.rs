//! JSON-RPC client for the Agent Network.
//!
//! Failures are split in two: [`TransportError`] when no well-formed
//! JSON-RPC answer came back, and [`RpcError`] when the server answered
//! with an error object. Callers branch on the latter's `code`.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agentnet_core::{MessageId, Thread, ThreadId};

use crate::constants::{DEFAULT_CLIENT_TIMEOUT_SECS, RPC_PATH};
use crate::error::RpcError;
use crate::rpc::{OutgoingRequest, RpcMethod, RpcResponse};
use crate::types::*;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("rpc error: {0}")]
    Rpc(RpcError),
}

impl From<RpcError> for ClientError {
    fn from(err: RpcError) -> Self {
        Self::Rpc(err)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(TransportError::Http(err))
    }
}

impl ClientError {
    /// The server's error object, if the failure came from the server.
    pub fn rpc(&self) -> Option<&RpcError> {
        match self {
            ClientError::Rpc(err) => Some(err),
            ClientError::Transport(_) => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Typed client over HTTP POST to `{base_url}/rpc`.
#[derive(Clone)]
pub struct NetworkClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: Arc<AtomicU64>,
}

impl NetworkClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_CLIENT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(TransportError::Config("base url is empty".to_string()).into());
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", base, RPC_PATH),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request and decode its result.
    pub async fn call<P, R>(&self, method: RpcMethod, params: &P) -> ClientResult<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = OutgoingRequest::new(method, params, id);

        let response = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let envelope: RpcResponse = response.json().await.map_err(|e| {
            TransportError::InvalidResponse(format!("{} returned a malformed envelope: {}", method, e))
        })?;
        let result = envelope.into_result()?;
        serde_json::from_value(result).map_err(|e| {
            ClientError::from(TransportError::InvalidResponse(format!(
                "{} result has an unexpected shape: {}",
                method, e
            )))
        })
    }

    // ========================================================================
    // THREADS
    // ========================================================================

    pub async fn create_thread(&self, req: &CreateThreadRequest) -> ClientResult<ThreadId> {
        let resp: CreateThreadResponse = self.call(RpcMethod::CreateThread, req).await?;
        Ok(resp.thread_id)
    }

    pub async fn get_thread(&self, thread_id: ThreadId) -> ClientResult<Thread> {
        self.call(RpcMethod::GetThread, &GetThreadRequest { thread_id })
            .await
    }

    pub async fn get_threads(&self, req: &GetThreadsRequest) -> ClientResult<GetThreadsResponse> {
        self.call(RpcMethod::GetThreads, req).await
    }

    // ========================================================================
    // MESSAGES
    // ========================================================================

    pub async fn add_message(&self, req: &AddMessageRequest) -> ClientResult<MessageId> {
        let resp: AddMessageResponse = self.call(RpcMethod::AddMessage, req).await?;
        Ok(resp.message_id)
    }

    pub async fn get_messages(&self, req: &GetMessagesRequest) -> ClientResult<GetMessagesResponse> {
        self.call(RpcMethod::GetMessages, req).await
    }

    pub async fn get_num_messages(&self, thread_id: ThreadId) -> ClientResult<usize> {
        let resp: GetNumMessagesResponse = self
            .call(RpcMethod::GetNumMessages, &GetNumMessagesRequest { thread_id })
            .await?;
        Ok(resp.num_messages)
    }

    pub async fn delete_message(&self, message_id: MessageId) -> ClientResult<()> {
        let _: Empty = self
            .call(RpcMethod::DeleteMessage, &DeleteMessageRequest { message_id })
            .await?;
        Ok(())
    }

    pub async fn is_mentioned_once(&self, agent_name: &str) -> ClientResult<Vec<ThreadId>> {
        let req = IsMentionedOnceRequest {
            agent_name: agent_name.to_string(),
        };
        let resp: IsMentionedOnceResponse = self.call(RpcMethod::IsMentionedOnce, &req).await?;
        Ok(resp.thread_ids)
    }

    // ========================================================================
    // AGENTS
    // ========================================================================

    pub async fn register_agent(&self, req: &RegisterAgentRequest) -> ClientResult<()> {
        let _: Empty = self.call(RpcMethod::RegisterAgent, req).await?;
        Ok(())
    }

    pub async fn deregister_agent(&self, names: Vec<String>) -> ClientResult<()> {
        let _: Empty = self
            .call(RpcMethod::DeregisterAgent, &DeregisterAgentRequest { names })
            .await?;
        Ok(())
    }

    pub async fn check_live(&self, names: Vec<String>) -> ClientResult<()> {
        let _: Empty = self
            .call(RpcMethod::CheckLive, &CheckLiveRequest { names })
            .await?;
        Ok(())
    }

    pub async fn get_agent_runtime_info(
        &self,
        req: &GetAgentRuntimeInfoRequest,
    ) -> ClientResult<GetAgentRuntimeInfoResponse> {
        self.call(RpcMethod::GetAgentRuntimeInfo, req).await
    }
}
