//! Implementation registry
//!
//! Maps normalized step keys to implementation references and lifecycle hook
//! categories to ordered hook lists. Built once from a discovery provider
//! before the dispatch loop starts, then shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::discovery::{ArtifactKind, DiscoveryProvider};
use crate::error::{Result, RunnerError};
use crate::implementation::ImplementationRef;
use crate::step::StepValue;

/// Lifecycle hook categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeSuite,
    AfterSuite,
    BeforeSpec,
    AfterSpec,
    BeforeScenario,
    AfterScenario,
    BeforeStep,
    AfterStep,
}

impl HookKind {
    /// All eight categories
    pub const ALL: [HookKind; 8] = [
        HookKind::BeforeSuite,
        HookKind::AfterSuite,
        HookKind::BeforeSpec,
        HookKind::AfterSpec,
        HookKind::BeforeScenario,
        HookKind::AfterScenario,
        HookKind::BeforeStep,
        HookKind::AfterStep,
    ];
}

/// A registered step
#[derive(Clone)]
pub struct StepEntry {
    /// Normalized form of the template this entry was registered under
    pub value: StepValue,

    /// Implementation invoked for this step
    pub implementation: ImplementationRef,
}

impl std::fmt::Debug for StepEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepEntry")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// Step and hook implementations known to this runner
#[derive(Default)]
pub struct ImplementationRegistry {
    steps: HashMap<String, StepEntry>,
    hooks: HashMap<HookKind, Vec<ImplementationRef>>,
}

impl std::fmt::Debug for ImplementationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hooks: HashMap<_, _> = self.hooks.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("ImplementationRegistry")
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .field("hooks", &hooks)
            .finish()
    }
}

impl ImplementationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from everything the provider discovers.
    ///
    /// A step artifact contributes one entry per declared template; a hook
    /// artifact is appended to its category in discovery order.
    pub async fn from_discovery(provider: &dyn DiscoveryProvider) -> Result<Self> {
        let artifacts = provider.discover().await?;
        let mut registry = Self::new();

        for artifact in artifacts {
            match artifact.kind {
                ArtifactKind::Step { templates } => {
                    for template in &templates {
                        registry.register_template(template, artifact.implementation.clone())?;
                    }
                }
                ArtifactKind::Hook(kind) => registry.register_hook(kind, artifact.implementation),
            }
        }

        tracing::info!(
            provider = provider.name(),
            steps = registry.step_count(),
            hooks = registry.hook_count(),
            "Implementation registry built"
        );

        Ok(registry)
    }

    /// Register an implementation under a normalized step value.
    ///
    /// Rejects a key already bound to a different implementation; binding
    /// the same implementation again is a no-op.
    pub fn register_step(
        &mut self,
        value: StepValue,
        implementation: ImplementationRef,
    ) -> Result<()> {
        if let Some(existing) = self.steps.get(&value.key) {
            if Arc::ptr_eq(&existing.implementation, &implementation) {
                return Ok(());
            }
            return Err(RunnerError::DuplicateStep { key: value.key });
        }

        tracing::debug!(key = %value.key, "Registered step");
        self.steps.insert(
            value.key.clone(),
            StepEntry {
                value,
                implementation,
            },
        );
        Ok(())
    }

    /// Normalize a raw template and register it
    pub fn register_template(
        &mut self,
        template: &str,
        implementation: ImplementationRef,
    ) -> Result<()> {
        self.register_step(StepValue::parse(template)?, implementation)
    }

    /// Append a hook to its category
    pub fn register_hook(&mut self, kind: HookKind, implementation: ImplementationRef) {
        self.hooks.entry(kind).or_default().push(implementation);
    }

    /// Resolve a step by template or normalized key
    pub fn lookup_step(&self, key: &str) -> Result<&StepEntry> {
        let normalized = StepValue::parse(key)?.key;
        self.steps
            .get(&normalized)
            .ok_or(RunnerError::StepNotFound(normalized))
    }

    /// Whether a step resolves
    pub fn contains_step(&self, key: &str) -> bool {
        self.lookup_step(key).is_ok()
    }

    /// Hooks for a category in registration order
    pub fn hooks_for(&self, kind: HookKind) -> &[ImplementationRef] {
        self.hooks.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every registered normalized key, sorted
    pub fn step_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.steps.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Declared template of every registered step, sorted
    ///
    /// Parameters are rendered as `<name>`, so a step declared as
    /// `another <param> step` is reported exactly that way.
    pub fn step_templates(&self) -> Vec<String> {
        let mut templates: Vec<String> = self
            .steps
            .values()
            .map(|entry| entry.value.parameterized.clone())
            .collect();
        templates.sort();
        templates
    }

    /// Number of registered step keys
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Number of registered hooks across all categories
    pub fn hook_count(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::StaticDiscovery;
    use crate::implementation::{from_fn, Invocation};

    fn noop() -> ImplementationRef {
        from_fn(|_: &Invocation| Ok(()))
    }

    #[tokio::test]
    async fn test_two_templates_one_implementation() {
        let shared = noop();
        let provider = StaticDiscovery::new()
            .step_ref(["Open <page>", "Visit the <site> homepage"], shared.clone());

        let registry = ImplementationRegistry::from_discovery(&provider).await.unwrap();
        assert_eq!(registry.step_count(), 2);

        let a = registry.lookup_step("Open \"login\"").unwrap();
        let b = registry.lookup_step("Visit the {} homepage").unwrap();
        assert!(Arc::ptr_eq(&a.implementation, &shared));
        assert!(Arc::ptr_eq(&b.implementation, &shared));
        assert_eq!(a.value.key, "Open {}");
        assert_eq!(b.value.key, "Visit the {} homepage");
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut registry = ImplementationRegistry::new();
        registry.register_template("Say <greeting>", noop()).unwrap();

        let result = registry.register_template("Say \"hello\"", noop());
        assert!(matches!(
            result,
            Err(RunnerError::DuplicateStep { ref key }) if key == "Say {}"
        ));
    }

    #[test]
    fn test_same_implementation_reregistration_is_noop() {
        let shared = noop();
        let mut registry = ImplementationRegistry::new();
        registry.register_template("Say <greeting>", shared.clone()).unwrap();
        registry.register_template("Say <salutation>", shared).unwrap();
        assert_eq!(registry.step_count(), 1);
    }

    #[test]
    fn test_lookup_missing_step() {
        let registry = ImplementationRegistry::new();
        assert!(matches!(
            registry.lookup_step("nothing here"),
            Err(RunnerError::StepNotFound(ref key)) if key == "nothing here"
        ));
        assert!(!registry.contains_step("nothing here"));
    }

    #[test]
    fn test_hooks_keep_registration_order() {
        let first = noop();
        let second = noop();
        let mut registry = ImplementationRegistry::new();
        registry.register_hook(HookKind::BeforeScenario, first.clone());
        registry.register_hook(HookKind::BeforeScenario, second.clone());
        registry.register_hook(HookKind::AfterSuite, noop());

        let hooks = registry.hooks_for(HookKind::BeforeScenario);
        assert_eq!(hooks.len(), 2);
        assert!(Arc::ptr_eq(&hooks[0], &first));
        assert!(Arc::ptr_eq(&hooks[1], &second));
        assert!(registry.hooks_for(HookKind::BeforeStep).is_empty());
        assert_eq!(registry.hook_count(), 3);
    }

    #[tokio::test]
    async fn test_malformed_template_fails_build() {
        let provider = StaticDiscovery::new().step(["broken \"quote"], |_: &Invocation| Ok(()));
        let result = ImplementationRegistry::from_discovery(&provider).await;
        assert!(matches!(result, Err(RunnerError::MalformedTemplate { .. })));
    }

    #[test]
    fn test_step_templates_keep_placeholder_names() {
        let mut registry = ImplementationRegistry::new();
        registry.register_template("another <param> step", noop()).unwrap();
        registry.register_template("a step", noop()).unwrap();
        assert_eq!(registry.step_templates(), vec!["a step", "another <param> step"]);
        assert_eq!(registry.step_keys(), vec!["a step", "another {} step"]);
    }

    #[test]
    fn test_step_keys_sorted() {
        let mut registry = ImplementationRegistry::new();
        registry.register_template("b step", noop()).unwrap();
        registry.register_template("a step", noop()).unwrap();
        assert_eq!(registry.step_keys(), vec!["a step", "b step"]);
    }
}
