//! Static discovery provider
//!
//! Holds an explicit list of artifacts assembled at process start. Useful for
//! runners that register their steps by hand, and for tests.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Artifact, DiscoveryProvider};
use crate::error::Result;
use crate::handlers::StepRefactorer;
use crate::implementation::{from_fn, ImplementationFailure, ImplementationRef, Invocation};
use crate::registry::HookKind;

/// Discovery provider backed by an explicit artifact list
#[derive(Clone, Default)]
pub struct StaticDiscovery {
    artifacts: Vec<Artifact>,
    refactorer: Option<Arc<dyn StepRefactorer>>,
}

impl std::fmt::Debug for StaticDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticDiscovery")
            .field("artifacts", &self.artifacts)
            .field("refactorer", &self.refactorer.is_some())
            .finish()
    }
}

impl StaticDiscovery {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pre-built artifact
    pub fn artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Declare a closure step under one or more templates
    pub fn step<I, S, F>(self, templates: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Invocation) -> std::result::Result<(), ImplementationFailure>
            + Send
            + Sync
            + 'static,
    {
        self.step_ref(templates, from_fn(f))
    }

    /// Declare an existing implementation under one or more templates
    pub fn step_ref<I, S>(self, templates: I, implementation: ImplementationRef) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artifact(Artifact::step(templates, implementation))
    }

    /// Declare a closure hook
    pub fn hook<F>(self, kind: HookKind, f: F) -> Self
    where
        F: Fn(&Invocation) -> std::result::Result<(), ImplementationFailure>
            + Send
            + Sync
            + 'static,
    {
        self.hook_ref(kind, from_fn(f))
    }

    /// Declare an existing implementation as a hook
    pub fn hook_ref(self, kind: HookKind, implementation: ImplementationRef) -> Self {
        self.artifact(Artifact::hook(kind, implementation))
    }

    /// Attach a refactoring collaborator
    pub fn with_refactorer(mut self, refactorer: Arc<dyn StepRefactorer>) -> Self {
        self.refactorer = Some(refactorer);
        self
    }

    /// Number of artifacts
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether no artifacts were declared
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[async_trait]
impl DiscoveryProvider for StaticDiscovery {
    async fn discover(&self) -> Result<Vec<Artifact>> {
        Ok(self.artifacts.clone())
    }

    fn name(&self) -> &str {
        "static"
    }

    fn refactorer(&self) -> Option<Arc<dyn StepRefactorer>> {
        self.refactorer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ArtifactKind;

    #[tokio::test]
    async fn test_discovery_order_preserved() {
        let provider = StaticDiscovery::new()
            .hook(HookKind::BeforeSuite, |_: &Invocation| Ok(()))
            .step(["a step", "the same step"], |_: &Invocation| Ok(()))
            .hook(HookKind::AfterSuite, |_: &Invocation| Ok(()));

        let artifacts = provider.discover().await.unwrap();
        let kinds: Vec<_> = artifacts.into_iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ArtifactKind::Hook(HookKind::BeforeSuite),
                ArtifactKind::Step {
                    templates: vec!["a step".into(), "the same step".into()]
                },
                ArtifactKind::Hook(HookKind::AfterSuite),
            ]
        );
        assert_eq!(provider.len(), 3);
        assert_eq!(provider.name(), "static");
        assert!(provider.refactorer().is_none());
    }
}
