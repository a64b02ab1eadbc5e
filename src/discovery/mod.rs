//! Discovery providers: where step and hook implementations come from
//!
//! The dispatch core never scans code for implementations. A provider reports
//! every artifact once at startup, and the registry is built from that list.
//! Providers may be generated at build time or assembled by hand with
//! [`StaticDiscovery`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::handlers::StepRefactorer;
use crate::implementation::ImplementationRef;
use crate::registry::HookKind;

pub mod memory;

pub use memory::StaticDiscovery;

/// Source of step and hook implementations
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    /// Report every artifact known to this provider, in discovery order
    async fn discover(&self) -> Result<Vec<Artifact>>;

    /// Provider name (e.g., "static", "generated")
    fn name(&self) -> &str;

    /// Collaborator that rewrites step declarations on refactor requests
    ///
    /// Default: none, so refactor requests are answered as unsupported.
    fn refactorer(&self) -> Option<Arc<dyn StepRefactorer>> {
        None
    }
}

/// What a discovered artifact contributes to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A step implementation declared under one or more templates
    Step { templates: Vec<String> },
    /// A lifecycle hook
    Hook(HookKind),
}

/// A discovered implementation and how to register it
#[derive(Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub implementation: ImplementationRef,
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Artifact {
    /// Step artifact declared under `templates`
    pub fn step<I, S>(templates: I, implementation: ImplementationRef) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ArtifactKind::Step {
                templates: templates.into_iter().map(Into::into).collect(),
            },
            implementation,
        }
    }

    /// Hook artifact of the given category
    pub fn hook(kind: HookKind, implementation: ImplementationRef) -> Self {
        Self {
            kind: ArtifactKind::Hook(kind),
            implementation,
        }
    }
}
