//! Agent registry: registration, lookup and liveness.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use agentnet_core::{
    agent_key, now, AgentInfo, AgentRuntime, LivenessError, NetworkResult, ValidateNonEmpty,
};
use agentnet_storage::NetworkStorage;

use crate::probe::{LivenessProbe, ProbeError};

/// Default bound for a single liveness probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Registry of reachable agents, keyed by case-insensitive name.
#[derive(Clone)]
pub struct AgentRegistry {
    storage: Arc<dyn NetworkStorage>,
    probe: Arc<dyn LivenessProbe>,
    probe_timeout: Duration,
}

impl AgentRegistry {
    pub fn new(storage: Arc<dyn NetworkStorage>, probe: Arc<dyn LivenessProbe>) -> Self {
        Self {
            storage,
            probe,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Register (or re-register) every agent in `infos` at `addr`.
    ///
    /// The whole batch is validated before anything is written; one invalid
    /// entry rejects the batch. Existing names are overwritten in place.
    pub fn register(&self, addr: &str, secure: bool, infos: Vec<AgentInfo>) -> NetworkResult<()> {
        addr.validate_non_empty("addr")?;
        for (i, info) in infos.iter().enumerate() {
            info.name.validate_non_empty(&format!("info[{}].name", i))?;
        }

        let ts = now();
        let addr = addr.trim();
        let runtimes: Vec<AgentRuntime> = infos
            .into_iter()
            .map(|mut info| {
                info.name = info.name.trim().to_string();
                AgentRuntime::new(info, addr, secure, ts)
            })
            .collect();
        let names: Vec<String> = runtimes.iter().map(|r| r.info.name.clone()).collect();

        self.storage.agent_upsert_batch(runtimes)?;
        info!(addr = %addr, secure, agents = ?names, "Registered agents");
        Ok(())
    }

    /// Remove agents by name. Unknown names are ignored.
    pub fn deregister(&self, names: &[String]) -> NetworkResult<()> {
        let keys: Vec<String> = names.iter().map(|n| agent_key(n)).collect();
        let removed = self.storage.agent_remove(&keys)?;
        if !removed.is_empty() {
            info!(agents = ?removed, "Deregistered agents");
        }
        Ok(())
    }

    /// Probe every named agent concurrently.
    ///
    /// Succeeds only if all of them respond. Names without a record count as
    /// unreachable. Reachable agents get their `last_live_at` refreshed even
    /// when others fail.
    pub async fn check_live(&self, names: &[String]) -> NetworkResult<()> {
        let mut targets: BTreeMap<String, String> = BTreeMap::new();
        for name in names {
            targets.entry(agent_key(name)).or_insert_with(|| name.clone());
        }
        if targets.is_empty() {
            return Ok(());
        }

        let mut probes = Vec::with_capacity(targets.len());
        for (key, name) in targets {
            let record = self.storage.agent_get(&key)?;
            probes.push(self.probe_one(key, name, record));
        }

        let mut live = Vec::new();
        let mut unreachable = Vec::new();
        for (key, name, outcome) in join_all(probes).await {
            match outcome {
                Ok(()) => live.push(key),
                Err(err) => {
                    warn!(agent = %name, error = %err, "Agent failed liveness check");
                    unreachable.push(name);
                }
            }
        }

        if !live.is_empty() {
            self.storage.agent_touch(&live, now())?;
        }
        if unreachable.is_empty() {
            debug!(agents = live.len(), "All agents live");
            Ok(())
        } else {
            Err(LivenessError::new(unreachable).into())
        }
    }

    async fn probe_one(
        &self,
        key: String,
        name: String,
        record: Option<AgentRuntime>,
    ) -> (String, String, Result<(), ProbeError>) {
        let outcome = match record {
            None => Err(ProbeError::NotRegistered),
            Some(agent) => {
                match tokio::time::timeout(self.probe_timeout, self.probe.probe(&agent)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProbeError::TimedOut(self.probe_timeout)),
                }
            }
        };
        (key, name, outcome)
    }

    /// Runtime records for `names`, or for every agent when `all` is set.
    /// Results are in name order; unknown names are omitted.
    pub fn runtime_info(&self, names: &[String], all: bool) -> NetworkResult<Vec<AgentRuntime>> {
        if all {
            return self.storage.agent_list();
        }

        let mut found: BTreeMap<String, AgentRuntime> = BTreeMap::new();
        for name in names {
            let key = agent_key(name);
            if found.contains_key(&key) {
                continue;
            }
            if let Some(agent) = self.storage.agent_get(&key)? {
                found.insert(key, agent);
            }
        }
        Ok(found.into_values().collect())
    }

    /// Remove agents that have not been seen live within `stale_after`.
    pub fn sweep_stale(&self, stale_after: Duration) -> NetworkResult<Vec<String>> {
        let window = chrono::Duration::from_std(stale_after).unwrap_or(chrono::Duration::MAX);
        let cutoff = now()
            .checked_sub_signed(window)
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);
        let removed = self.storage.agent_remove_stale(cutoff)?;
        for name in &removed {
            warn!(agent = %name, "Removed stale agent");
        }
        Ok(removed)
    }

    /// Number of registered agents.
    pub fn count(&self) -> NetworkResult<usize> {
        Ok(self.storage.agent_list()?.len())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::RecordLivenessProbe;
    use agentnet_core::{NetworkError, ValidationError};
    use agentnet_storage::InMemoryStorage;
    use async_trait::async_trait;

    /// Probe that reports agents named "down" as failed and makes agents
    /// named "slow" hang past any timeout.
    struct ScriptedProbe;

    #[async_trait]
    impl LivenessProbe for ScriptedProbe {
        async fn probe(&self, agent: &AgentRuntime) -> Result<(), ProbeError> {
            match agent.name() {
                "down" => Err(ProbeError::NotRegistered),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(())
                }
                _ => Ok(()),
            }
        }
    }

    fn registry() -> AgentRegistry {
        AgentRegistry::new(Arc::new(InMemoryStorage::new()), Arc::new(RecordLivenessProbe))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = registry();
        let info = AgentInfo::new("agent-x").with_role("writer");
        registry.register("h:1", false, vec![info.clone()]).unwrap();
        registry.register("h:1", false, vec![info]).unwrap();
        assert_eq!(registry.count().unwrap(), 1);
    }

    #[test]
    fn test_reregister_overwrites_address() {
        let registry = registry();
        registry.register("h:1", false, vec![AgentInfo::new("Agent-X")]).unwrap();
        registry.register("h:2", true, vec![AgentInfo::new("agent-x")]).unwrap();
        let agents = registry.runtime_info(&[], true).unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].addr, "h:2");
        assert!(agents[0].secure);
    }

    #[test]
    fn test_invalid_batch_registers_nothing() {
        let registry = registry();
        let err = registry
            .register("h:1", false, vec![AgentInfo::new("ok"), AgentInfo::new("")])
            .unwrap_err();
        assert_eq!(
            err,
            NetworkError::Validation(ValidationError::RequiredFieldMissing {
                field: "info[1].name".to_string()
            })
        );
        assert_eq!(registry.count().unwrap(), 0);
    }

    #[test]
    fn test_register_requires_addr() {
        let registry = registry();
        assert!(registry.register(" ", false, vec![AgentInfo::new("a")]).is_err());
    }

    #[test]
    fn test_deregister_unknown_is_noop() {
        let registry = registry();
        registry.register("h:1", false, vec![AgentInfo::new("a")]).unwrap();
        registry.deregister(&names(&["ghost"])).unwrap();
        assert_eq!(registry.count().unwrap(), 1);
        registry.deregister(&names(&["A"])).unwrap();
        assert_eq!(registry.count().unwrap(), 0);
    }

    #[test]
    fn test_runtime_info_by_names() {
        let registry = registry();
        registry
            .register("h:1", false, vec![AgentInfo::new("zed"), AgentInfo::new("amy")])
            .unwrap();
        let found = registry
            .runtime_info(&names(&["zed", "ghost", "AMY", "zed"]), false)
            .unwrap();
        let found: Vec<&str> = found.iter().map(|a| a.name()).collect();
        assert_eq!(found, vec!["amy", "zed"]);
        assert!(registry.runtime_info(&[], false).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_check_live_after_register() {
        let registry = registry();
        registry.register("h:1", false, vec![AgentInfo::new("agent-x")]).unwrap();
        registry.check_live(&names(&["agent-x"])).await.unwrap();
        registry.check_live(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_check_live_unknown_is_unreachable() {
        let registry = registry();
        let err = registry.check_live(&names(&["ghost"])).await.unwrap_err();
        assert_eq!(
            err,
            NetworkError::Liveness(LivenessError {
                unreachable: names(&["ghost"])
            })
        );
    }

    #[tokio::test]
    async fn test_check_live_timeout_reports_only_slow_agent() {
        let registry = AgentRegistry::new(Arc::new(InMemoryStorage::new()), Arc::new(ScriptedProbe))
            .with_probe_timeout(Duration::from_millis(100));
        registry
            .register(
                "h:1",
                false,
                vec![AgentInfo::new("fast"), AgentInfo::new("slow"), AgentInfo::new("down")],
            )
            .unwrap();

        let started = std::time::Instant::now();
        let err = registry
            .check_live(&names(&["fast", "slow", "down"]))
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(
            err,
            NetworkError::Liveness(LivenessError {
                unreachable: names(&["down", "slow"])
            })
        );
    }

    #[tokio::test]
    async fn test_check_live_refreshes_last_live_at() {
        let registry = registry();
        registry.register("h:1", false, vec![AgentInfo::new("a")]).unwrap();
        let before = registry.runtime_info(&names(&["a"]), false).unwrap()[0].last_live_at;
        tokio::time::sleep(Duration::from_millis(5)).await;
        registry.check_live(&names(&["a"])).await.unwrap();
        let after = registry.runtime_info(&names(&["a"]), false).unwrap()[0].last_live_at;
        assert!(after > before);
    }

    #[test]
    fn test_sweep_stale() {
        let registry = registry();
        registry.register("h:1", false, vec![AgentInfo::new("a")]).unwrap();
        assert!(registry.sweep_stale(Duration::from_secs(150)).unwrap().is_empty());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(registry.sweep_stale(Duration::ZERO).unwrap(), names(&["a"]));
        assert_eq!(registry.count().unwrap(), 0);
    }
}
