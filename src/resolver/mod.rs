//! Associated subtree resolution.
//!
//! The mapper can list a subtree and can list the endpoints of an
//! association, but cannot answer "which objects under this root are
//! endpoints of that association". The resolver composes the two calls and
//! intersects the results client-side:
//!
//! ```text
//! endpoints(association) ──┐
//!                          ├─▶ hash-set intersection ─▶ sort ─▶ Vec<ObjectPath>
//! subtree_paths(root, …) ──┘
//! ```
//!
//! An empty or failed stage ends the resolution early with an empty answer.
//! A failed stage's error is returned as-is.

use futures::future;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::bus::MapperBackend;
use crate::model::*;
use crate::query;
use crate::Result;

// ============================================================================
// Strategy
// ============================================================================

/// How the two remote calls are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveStrategy {
    /// Endpoints first; the subtree call is skipped when there are none.
    #[default]
    Sequential,
    /// Both calls in flight together. Saves a round trip of latency but
    /// always issues the subtree call.
    Concurrent,
}

// ============================================================================
// State machine
// ============================================================================

/// Progress of one resolution.
///
/// ```text
/// Idle → FetchingEndpoints → FetchingSubtree → Intersecting → Completed
///              │      │              │      │
///              │      └─▶ Completed  │      └─▶ Completed   (empty stage)
///              └─▶ Failed            └─▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionState {
    Idle,
    FetchingEndpoints,
    FetchingSubtree,
    Intersecting,
    Completed,
    Failed,
}

impl ResolutionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ResolutionState::Completed | ResolutionState::Failed)
    }

    pub fn can_transition_to(self, next: ResolutionState) -> bool {
        use ResolutionState::*;
        matches!(
            (self, next),
            (Idle, FetchingEndpoints)
                | (FetchingEndpoints, FetchingSubtree | Completed | Failed)
                | (FetchingSubtree, Intersecting | Completed | Failed)
                | (Intersecting, Completed)
        )
    }
}

/// Terminal state of a resolution together with its answer.
#[derive(Debug)]
pub struct Resolution {
    pub state: ResolutionState,
    pub result: Result<Vec<ObjectPath>>,
}

impl Resolution {
    pub fn into_result(self) -> Result<Vec<ObjectPath>> {
        self.result
    }
}

// ============================================================================
// AssociationResolver
// ============================================================================

/// A single-use resolution of the paths under `root` that are endpoints of
/// `association`.
///
/// Running consumes the resolver, so each instance reaches exactly one
/// terminal state.
pub struct AssociationResolver<'a, B: MapperBackend + ?Sized> {
    backend: &'a B,
    association: &'a ObjectPath,
    root: &'a ObjectPath,
    depth: Depth,
    interfaces: &'a InterfaceFilter,
    strategy: ResolveStrategy,
    state: ResolutionState,
}

impl<'a, B: MapperBackend + ?Sized> AssociationResolver<'a, B> {
    /// Create a resolver using the backend's configured strategy.
    ///
    /// `depth` and `interfaces` are forwarded to the subtree call unchanged.
    pub fn new(
        backend: &'a B,
        association: &'a ObjectPath,
        root: &'a ObjectPath,
        depth: Depth,
        interfaces: &'a InterfaceFilter,
    ) -> Self {
        Self {
            backend,
            association,
            root,
            depth,
            interfaces,
            strategy: backend.config().strategy,
            state: ResolutionState::Idle,
        }
    }

    pub fn with_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    /// Run to completion and return the sorted, duplicate-free answer.
    pub async fn resolve(self) -> Result<Vec<ObjectPath>> {
        self.run().await.into_result()
    }

    /// Run to completion, keeping the terminal state alongside the answer.
    pub async fn run(mut self) -> Resolution {
        let span = tracing::debug_span!(
            "resolve_associated_subtree",
            association = %self.association,
            root = %self.root,
            depth = %self.depth,
        );

        async move {
            match self.strategy {
                ResolveStrategy::Sequential => self.run_sequential().await,
                ResolveStrategy::Concurrent => self.run_concurrent().await,
            }
        }
        .instrument(span)
        .await
    }

    async fn run_sequential(&mut self) -> Resolution {
        self.transition(ResolutionState::FetchingEndpoints);
        let endpoints = match query::get_association_endpoints(self.backend, self.association).await {
            Err(e) => return self.fail(e),
            Ok(endpoints) if endpoints.is_empty() => {
                tracing::debug!(association = %self.association, "association has no endpoints");
                return self.complete(Vec::new());
            }
            Ok(endpoints) => endpoints,
        };

        self.transition(ResolutionState::FetchingSubtree);
        let candidates =
            match query::get_subtree_paths(self.backend, self.root, self.depth, self.interfaces).await {
                Err(e) => return self.fail(e),
                Ok(paths) if paths.is_empty() => return self.complete(Vec::new()),
                Ok(paths) => paths,
            };

        self.transition(ResolutionState::Intersecting);
        self.complete(intersect_sorted(&endpoints, &candidates))
    }

    async fn run_concurrent(&mut self) -> Resolution {
        self.transition(ResolutionState::FetchingEndpoints);
        self.transition(ResolutionState::FetchingSubtree);
        let (endpoints, candidates) = future::join(
            query::get_association_endpoints(self.backend, self.association),
            query::get_subtree_paths(self.backend, self.root, self.depth, self.interfaces),
        )
        .await;

        // Endpoint outcome decides first, as if the calls had run in order.
        let endpoints = match endpoints {
            Err(e) => return self.fail(e),
            Ok(endpoints) if endpoints.is_empty() => return self.complete(Vec::new()),
            Ok(endpoints) => endpoints,
        };
        let candidates = match candidates {
            Err(e) => return self.fail(e),
            Ok(paths) if paths.is_empty() => return self.complete(Vec::new()),
            Ok(paths) => paths,
        };

        self.transition(ResolutionState::Intersecting);
        self.complete(intersect_sorted(&endpoints, &candidates))
    }

    fn transition(&mut self, next: ResolutionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal resolution transition {:?} -> {:?}",
            self.state,
            next,
        );
        tracing::trace!(from = ?self.state, to = ?next, "resolution state");
        self.state = next;
    }

    fn complete(&mut self, paths: Vec<ObjectPath>) -> Resolution {
        self.transition(ResolutionState::Completed);
        tracing::debug!(count = paths.len(), "resolved associated subtree paths");
        Resolution { state: self.state, result: Ok(paths) }
    }

    fn fail(&mut self, error: crate::Error) -> Resolution {
        self.transition(ResolutionState::Failed);
        Resolution { state: self.state, result: Err(error) }
    }
}

/// Paths under `root` (within `depth`, implementing any of `interfaces`)
/// that are endpoints of `association`, sorted ascending.
///
/// An association without endpoints yields `Ok(vec![])` and the subtree is
/// never queried (with the default sequential strategy).
pub async fn get_associated_subtree_paths<B>(
    backend: &B,
    association: &ObjectPath,
    root: &ObjectPath,
    depth: Depth,
    interfaces: &InterfaceFilter,
) -> Result<Vec<ObjectPath>>
where
    B: MapperBackend + ?Sized,
{
    AssociationResolver::new(backend, association, root, depth, interfaces)
        .resolve()
        .await
}

/// Elements of `candidates` that appear in `endpoints`, each once, sorted.
///
/// One hash-set build over `endpoints`, one scan over `candidates`. A hit is
/// removed from the set so repeated candidates are kept only once.
pub fn intersect_sorted(endpoints: &[ObjectPath], candidates: &[ObjectPath]) -> Vec<ObjectPath> {
    let mut lookup: HashSet<&ObjectPath> = endpoints.iter().collect();
    let mut hits: Vec<ObjectPath> = candidates
        .iter()
        .filter(|path| lookup.remove(*path))
        .cloned()
        .collect();
    hits.sort_unstable();
    hits
}

// ============================================================================
// Tests
// ============================================================================
