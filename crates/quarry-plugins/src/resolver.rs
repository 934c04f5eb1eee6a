//! Dependency resolution
//!
//! Resolution runs in two phases. Closure expansion walks the dependency
//! graph breadth-first from the requested plugin, fetching catalog
//! metadata for each frontier concurrently; visitation is memoized per
//! plugin key, so cycles converge instead of looping. Reconciliation
//! then intersects every requirer's version range per plugin and targets
//! the newest version satisfying that range, as an Install or Upgrade.
//! Only two things produce a Skip: a pinned record that satisfies its
//! range, or an unpinned record already at the newest satisfying
//! version. An empty intersection, or a range a pin cannot meet, is a
//! Conflict; any conflict fails the whole resolve. No state is mutated
//! by this module.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use semver::Version;
use tracing::debug;

use quarry_core::{DependencyConstraint, Error, PluginKey, Result, VersionConstraint};
use quarry_sources::PluginMetadata;

use crate::registry::RegistryState;

/// Lazy metadata callback into the source adapters
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn metadata(&self, key: &PluginKey) -> Result<Arc<PluginMetadata>>;
}

/// One step of a resolution plan
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Install {
        key: PluginKey,
        version: Version,
    },
    Upgrade {
        key: PluginKey,
        from: Version,
        to: Version,
    },
    Skip {
        key: PluginKey,
        reason: String,
    },
    Conflict {
        key: PluginKey,
        reason: String,
    },
}

impl Action {
    pub fn key(&self) -> &PluginKey {
        match self {
            Self::Install { key, .. }
            | Self::Upgrade { key, .. }
            | Self::Skip { key, .. }
            | Self::Conflict { key, .. } => key,
        }
    }

    /// Whether this action moves an artifact
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Install { .. } | Self::Upgrade { .. })
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Install { key, version } => write!(f, "install {} {}", key, version),
            Self::Upgrade { key, from, to } => write!(f, "upgrade {} {} -> {}", key, from, to),
            Self::Skip { key, reason } => write!(f, "skip {} ({})", key, reason),
            Self::Conflict { key, reason } => write!(f, "conflict {} ({})", key, reason),
        }
    }
}

/// Ordered sequence of actions; dependencies come before their
/// dependents. Transient: produced per command, never persisted.
#[derive(Debug, Clone, Default)]
pub struct ResolutionPlan {
    pub actions: Vec<Action>,
}

impl ResolutionPlan {
    /// Whether the plan performs any install or upgrade
    pub fn has_changes(&self) -> bool {
        self.actions.iter().any(Action::is_change)
    }
}

/// What the caller asked for
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub key: PluginKey,
    pub constraint: VersionConstraint,
}

impl ResolveRequest {
    pub fn install(key: PluginKey, constraint: VersionConstraint) -> Self {
        Self { key, constraint }
    }

    /// Update is install with an open constraint; the resolver already
    /// targets the newest version the dependents allow.
    pub fn update(key: PluginKey) -> Self {
        Self::install(key, VersionConstraint::Any)
    }
}

/// A single requirer's claim on one plugin
#[derive(Debug, Clone)]
struct Requirement {
    requirer: String,
    constraint: VersionConstraint,
}

/// Resolve a requested change against the installed state into a plan
///
/// Fails without producing a plan on unknown plugins, unsatisfiable
/// version constraints, or conflicts (including pins that the closure
/// would have to override).
pub async fn resolve<P>(
    state: &RegistryState,
    request: ResolveRequest,
    provider: &P,
) -> Result<ResolutionPlan>
where
    P: MetadataProvider + ?Sized,
{
    let mut requirements: HashMap<PluginKey, Vec<Requirement>> = HashMap::new();
    let mut edges: HashMap<PluginKey, Vec<PluginKey>> = HashMap::new();
    let mut metadata: HashMap<PluginKey, Arc<PluginMetadata>> = HashMap::new();
    let mut visited: HashSet<PluginKey> = HashSet::new();

    requirements
        .entry(request.key.clone())
        .or_default()
        .push(Requirement {
            requirer: "the request".to_string(),
            constraint: request.constraint.clone(),
        });

    // Phase 1: closure expansion. Metadata for a whole frontier is
    // fetched concurrently; reconciliation only runs once the closure is
    // complete, so conflict detection sees the full constraint set.
    let mut frontier = vec![request.key.clone()];
    while !frontier.is_empty() {
        let mut layer: Vec<PluginKey> = Vec::new();
        for key in frontier.drain(..) {
            if visited.insert(key.clone()) {
                layer.push(key);
            }
        }

        // A pinned record that satisfies every constraint seen so far
        // stays put and keeps its recorded dependency declarations; every
        // other node targets the newest satisfying version and needs
        // catalog metadata for its current dependency set.
        let to_fetch: Vec<PluginKey> = layer
            .iter()
            .filter(|key| {
                let pinned_in_place = state.find(key).is_some_and(|rec| {
                    rec.pinned
                        && requirements
                            .get(key)
                            .is_none_or(|reqs| reqs.iter().all(|r| r.constraint.matches(&rec.version)))
                });
                !pinned_in_place && !metadata.contains_key(key)
            })
            .cloned()
            .collect();

        let fetched = join_all(to_fetch.iter().map(|key| provider.metadata(key))).await;
        for (key, outcome) in to_fetch.into_iter().zip(fetched) {
            metadata.insert(key, outcome?);
        }

        for key in layer {
            let declared: Vec<DependencyConstraint> = match metadata.get(&key) {
                Some(meta) => meta.dependencies.clone(),
                None => state
                    .find(&key)
                    .map(|rec| rec.dependencies.clone())
                    .unwrap_or_default(),
            };

            for dep in declared {
                debug!("{} requires {} ({})", key, dep.target, dep.constraint);
                requirements
                    .entry(dep.target.clone())
                    .or_default()
                    .push(Requirement {
                        requirer: key.to_string(),
                        constraint: dep.constraint,
                    });
                edges.entry(key.clone()).or_default().push(dep.target.clone());
                if !visited.contains(&dep.target) {
                    frontier.push(dep.target);
                }
            }
        }
    }

    // Installed dependents outside the closure still constrain it: their
    // recorded ranges join the requirement set, so an update cannot move
    // a plugin out from under something that needs it.
    for record in state.records() {
        if visited.contains(&record.key) {
            continue;
        }
        for dep in &record.dependencies {
            if visited.contains(&dep.target) {
                requirements
                    .entry(dep.target.clone())
                    .or_default()
                    .push(Requirement {
                        requirer: record.key.to_string(),
                        constraint: dep.constraint.clone(),
                    });
            }
        }
    }

    // Dependencies must commit before their dependents: post-order walk
    // over the closure, skipping back-edges so cycles stay finite.
    let order = dependency_order(&request.key, &edges);

    // Phase 2: constraint reconciliation.
    let mut actions = Vec::new();
    let mut conflicts = Vec::new();

    for key in order {
        let reqs = requirements.remove(&key).unwrap_or_default();

        let merged = match merge_requirements(&key, &reqs) {
            Ok(merged) => merged,
            Err(reason) => {
                conflicts.push(reason.clone());
                actions.push(Action::Conflict { key, reason });
                continue;
            }
        };

        match state.find(&key) {
            Some(rec) if rec.pinned => {
                // A pin is never silently overridden, even when the
                // closure (cyclic or not) forces an incompatible version.
                if merged.matches(&rec.version) {
                    actions.push(Action::Skip {
                        key,
                        reason: format!("{} already satisfies (pinned)", rec.version),
                    });
                } else {
                    let requirers: Vec<&str> = reqs.iter().map(|r| r.requirer.as_str()).collect();
                    let reason = format!(
                        "pinned at {} but {} is required by {}",
                        rec.version,
                        merged,
                        requirers.join(", ")
                    );
                    conflicts.push(format!("{}: {}", key, reason));
                    actions.push(Action::Conflict { key, reason });
                }
            }
            Some(rec) => {
                let meta = cached_metadata(&key, &metadata, provider).await?;
                // An installed version the catalog no longer lists stays
                // put as long as it satisfies the merged range.
                let to = match meta.best_match(&merged).cloned() {
                    Some(to) => to,
                    None if merged.matches(&rec.version) => rec.version.clone(),
                    None => {
                        return Err(Error::version_not_found(
                            key.to_string(),
                            merged.to_string(),
                        ))
                    }
                };
                if to == rec.version {
                    actions.push(Action::Skip {
                        key,
                        reason: format!("{} is already the newest satisfying version", to),
                    });
                } else {
                    actions.push(Action::Upgrade {
                        key,
                        from: rec.version.clone(),
                        to,
                    });
                }
            }
            None => {
                let meta = cached_metadata(&key, &metadata, provider).await?;
                let version = meta
                    .best_match(&merged)
                    .cloned()
                    .ok_or_else(|| Error::version_not_found(key.to_string(), merged.to_string()))?;
                actions.push(Action::Install { key, version });
            }
        }
    }

    if !conflicts.is_empty() {
        return Err(Error::conflict(conflicts));
    }
    Ok(ResolutionPlan { actions })
}

/// Intersect all requirements on one plugin, or describe the first
/// irreconcilable pair by naming both requirers
fn merge_requirements(
    key: &PluginKey,
    reqs: &[Requirement],
) -> std::result::Result<VersionConstraint, String> {
    let mut merged = VersionConstraint::Any;
    for (index, req) in reqs.iter().enumerate() {
        match merged.intersect(&req.constraint) {
            Some(next) => merged = next,
            None => {
                // Name the specific earlier requirer this one clashes
                // with, falling back to the merged range description.
                let clash = reqs[..index]
                    .iter()
                    .find(|prior| prior.constraint.intersect(&req.constraint).is_none());
                let detail = match clash {
                    Some(prior) => format!(
                        "{}: {} requires {}, but {} requires {}",
                        key, prior.requirer, prior.constraint, req.requirer, req.constraint
                    ),
                    None => format!(
                        "{}: {} requires {}, incompatible with the combined range {}",
                        key, req.requirer, req.constraint, merged
                    ),
                };
                return Err(detail);
            }
        }
    }
    Ok(merged)
}

/// Post-order walk from the request over the dependency edges: children
/// first, each key emitted once, back-edges ignored
fn dependency_order(root: &PluginKey, edges: &HashMap<PluginKey, Vec<PluginKey>>) -> Vec<PluginKey> {
    let mut order = Vec::new();
    let mut emitted: HashSet<PluginKey> = HashSet::new();
    let mut in_stack: HashSet<PluginKey> = HashSet::new();
    let mut stack: Vec<(PluginKey, usize)> = vec![(root.clone(), 0)];
    in_stack.insert(root.clone());

    while let Some((key, child_index)) = stack.pop() {
        let children = edges.get(&key).map(Vec::as_slice).unwrap_or_default();
        if child_index < children.len() {
            stack.push((key.clone(), child_index + 1));
            let child = children[child_index].clone();
            if !emitted.contains(&child) && in_stack.insert(child.clone()) {
                stack.push((child, 0));
            }
        } else {
            in_stack.remove(&key);
            if emitted.insert(key.clone()) {
                order.push(key);
            }
        }
    }
    order
}

/// Metadata from the expansion-phase cache, falling back to the provider
/// (which memoizes) for installed plugins that only turned out to need an
/// upgrade during reconciliation
async fn cached_metadata<P>(
    key: &PluginKey,
    cache: &HashMap<PluginKey, Arc<PluginMetadata>>,
    provider: &P,
) -> Result<Arc<PluginMetadata>>
where
    P: MetadataProvider + ?Sized,
{
    match cache.get(key) {
        Some(meta) => Ok(meta.clone()),
        None => provider.metadata(key).await,
    }
}
