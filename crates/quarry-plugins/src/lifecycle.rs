//! Plan execution and plugin file management
//!
//! The [`PluginManager`] ties the registry, the catalog, and the config
//! store together behind the operations the CLI exposes. Execution is
//! staged: every artifact a plan needs is downloaded and validated into
//! `.quarry/staging/` before any file moves, then actions commit one at
//! a time in plan order with a registry save after each commit. A
//! mid-plan failure therefore leaves every already-committed action
//! fully recorded and the rest untouched.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use indexmap::IndexMap;
use semver::Version;
use tracing::{debug, info, warn};

use quarry_core::version::parse_lenient;
use quarry_core::{
    DependencyConstraint, Error, PluginKey, PluginRecord, Result, VersionConstraint,
};

use crate::catalog::Catalog;
use crate::config_store::ConfigStore;
use crate::registry::{PluginRegistry, RegistryState};
use crate::resolver::{self, Action, MetadataProvider, ResolutionPlan, ResolveRequest};

/// Plugin artifact directory relative to the server directory
pub const PLUGINS_DIR: &str = "plugins";

/// Staging area for downloaded artifacts awaiting commit
const STAGING_DIR: &str = ".quarry/staging";

/// Suffix appended to a disabled plugin's artifact
const DISABLED_SUFFIX: &str = ".disabled";

/// Outcome of executing one plan
#[derive(Debug)]
pub struct ApplyReport {
    /// Actions that committed (skips included)
    pub completed: Vec<Action>,
    /// The action that stopped execution, if any
    pub failed: Option<FailedAction>,
    /// Actions after the failure, never attempted
    pub not_attempted: Vec<Action>,
}

#[derive(Debug)]
pub struct FailedAction {
    pub action: Action,
    pub error: String,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }
}

/// One installed dependency check result
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyStatus {
    pub target: PluginKey,
    pub constraint: VersionConstraint,
    pub state: DependencyState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DependencyState {
    Satisfied { installed: Version },
    Missing,
    Mismatch { installed: Version },
}

impl DependencyStatus {
    pub fn is_satisfied(&self) -> bool {
        matches!(self.state, DependencyState::Satisfied { .. })
    }
}

/// A downloaded artifact waiting in the staging directory
struct StagedArtifact {
    file: String,
    path: PathBuf,
    name: String,
    dependencies: Vec<DependencyConstraint>,
}

pub struct PluginManager {
    server_dir: PathBuf,
    registry: PluginRegistry,
    config: ConfigStore,
    catalog: Catalog,
}

impl PluginManager {
    pub fn open(server_dir: impl Into<PathBuf>, catalog: Catalog) -> Self {
        let server_dir = server_dir.into();
        Self {
            registry: PluginRegistry::open(&server_dir),
            config: ConfigStore::open(&server_dir),
            server_dir,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Install a plugin and its dependency closure
    pub async fn install(
        &self,
        key: PluginKey,
        constraint: VersionConstraint,
    ) -> Result<ApplyReport> {
        let mut state = self.registry.load()?;
        let plan = resolver::resolve(&state, ResolveRequest::install(key, constraint), &self.catalog)
            .await?;
        self.apply(&mut state, plan).await
    }

    /// Update an installed plugin to the newest version its dependents
    /// allow. A pinned plugin refuses unless `force`, which drops the pin.
    pub async fn update(&self, key: PluginKey, force: bool) -> Result<ApplyReport> {
        let mut state = self.registry.load()?;
        let record = state
            .find(&key)
            .ok_or_else(|| Error::plugin_not_found(key.to_string()))?;
        if record.pinned {
            if !force {
                return Err(Error::pin_violation(
                    key.to_string(),
                    record.version.to_string(),
                ));
            }
            // Dropped pin only persists if a commit happens.
            if let Some(rec) = state.find_mut(&key) {
                rec.pinned = false;
            }
        }
        let plan =
            resolver::resolve(&state, ResolveRequest::update(key), &self.catalog).await?;
        self.apply(&mut state, plan).await
    }

    /// Remove a plugin: artifact first, then record, then config entry
    pub fn delete(&self, key: &PluginKey) -> Result<PluginRecord> {
        let mut state = self.registry.load()?;
        let record = state
            .find(key)
            .cloned()
            .ok_or_else(|| Error::plugin_not_found(key.to_string()))?;

        remove_if_present(&self.active_path(&record.file))?;
        remove_if_present(&self.disabled_path(&record.file))?;

        state.remove(key);
        self.registry.save(&state)?;
        self.config.remove(key)?;
        info!("Deleted {}", key);
        Ok(record)
    }

    /// Rename the artifact back into the active plugins directory
    pub fn enable(&self, key: &PluginKey) -> Result<()> {
        self.set_enabled(key, true)
    }

    /// Rename the artifact aside so the server skips it; registry record,
    /// version, and config survive
    pub fn disable(&self, key: &PluginKey) -> Result<()> {
        self.set_enabled(key, false)
    }

    fn set_enabled(&self, key: &PluginKey, enabled: bool) -> Result<()> {
        let mut state = self.registry.load()?;
        let record = state
            .find_mut(key)
            .ok_or_else(|| Error::plugin_not_found(key.to_string()))?;

        let active = self.server_dir.join(PLUGINS_DIR).join(&record.file);
        let disabled = PathBuf::from(format!("{}{}", active.display(), DISABLED_SUFFIX));
        let (from, to) = if enabled {
            (disabled, active)
        } else {
            (active, disabled)
        };

        if to.exists() {
            // Artifact already where it should be; reconcile the record.
            remove_if_present(&from)?;
        } else if from.exists() {
            fs::rename(&from, &to)?;
        } else {
            return Err(Error::integrity(format!(
                "artifact {} missing for {}",
                record.file, key
            )));
        }

        if record.enabled != enabled {
            record.enabled = enabled;
            record.updated_at = chrono::Utc::now();
            self.registry.save(&state)?;
            info!("{} {}", if enabled { "Enabled" } else { "Disabled" }, key);
        }
        Ok(())
    }

    /// Pin a plugin at a version, excluding it from dependency-driven
    /// upgrades. Pinning a version other than the installed one requires
    /// `upgrade`, which installs that exact version first.
    pub async fn pin(&self, key: &PluginKey, version: &str, upgrade: bool) -> Result<()> {
        let target = parse_lenient(version)?;
        let mut state = self.registry.load()?;
        let record = state
            .find(key)
            .ok_or_else(|| Error::plugin_not_found(key.to_string()))?;

        if record.version != target {
            if !upgrade {
                return Err(Error::VersionMismatch {
                    key: key.to_string(),
                    installed: record.version.to_string(),
                    requested: target.to_string(),
                });
            }
            // Resolve with the existing pin out of the way, then restore
            // it onto whatever version landed.
            if let Some(rec) = state.find_mut(key) {
                rec.pinned = false;
            }
            let request = ResolveRequest::install(
                key.clone(),
                VersionConstraint::Exact {
                    version: target.clone(),
                },
            );
            let plan = resolver::resolve(&state, request, &self.catalog).await?;
            let report = self.apply(&mut state, plan).await?;
            if !report.is_success() {
                return Err(Error::integrity(format!(
                    "pin upgrade of {} did not complete; registry reflects the committed actions",
                    key
                )));
            }
            state = self.registry.load()?;
        }

        if let Some(rec) = state.find_mut(key) {
            rec.pinned = true;
            rec.updated_at = chrono::Utc::now();
        }
        self.registry.save(&state)?;
        info!("Pinned {} at {}", key, target);
        Ok(())
    }

    /// Clear a plugin's pin
    pub fn unpin(&self, key: &PluginKey) -> Result<()> {
        let mut state = self.registry.load()?;
        let record = state
            .find_mut(key)
            .ok_or_else(|| Error::plugin_not_found(key.to_string()))?;
        if record.pinned {
            record.pinned = false;
            record.updated_at = chrono::Utc::now();
            self.registry.save(&state)?;
        }
        Ok(())
    }

    /// Check one plugin's recorded dependencies against the registry
    pub fn check_dependencies(&self, key: &PluginKey) -> Result<Vec<DependencyStatus>> {
        let state = self.registry.load()?;
        let record = state
            .find(key)
            .ok_or_else(|| Error::plugin_not_found(key.to_string()))?;

        Ok(record
            .dependencies
            .iter()
            .map(|dep| {
                let dep_state = match state.find(&dep.target) {
                    None => DependencyState::Missing,
                    Some(installed) if dep.constraint.matches(&installed.version) => {
                        DependencyState::Satisfied {
                            installed: installed.version.clone(),
                        }
                    }
                    Some(installed) => DependencyState::Mismatch {
                        installed: installed.version.clone(),
                    },
                };
                DependencyStatus {
                    target: dep.target.clone(),
                    constraint: dep.constraint.clone(),
                    state: dep_state,
                }
            })
            .collect())
    }

    /// All installed plugins, in key order
    pub fn list(&self) -> Result<Vec<PluginRecord>> {
        Ok(self.registry.load()?.records().cloned().collect())
    }

    /// Jar files in the plugins directory that no registry record claims,
    /// sorted by file name. Typically hand-copied artifacts from before
    /// the registry managed this server.
    pub fn scan_untracked(&self) -> Result<Vec<String>> {
        let state = self.registry.load()?;
        let tracked: HashSet<&str> = state.records().map(|r| r.file.as_str()).collect();

        let entries = match fs::read_dir(self.server_dir.join(PLUGINS_DIR)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut untracked = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.ends_with(".jar") && !tracked.contains(name.as_str()) {
                untracked.push(name);
            }
        }
        untracked.sort();
        Ok(untracked)
    }

    /// A plugin's config entry; the plugin need not be installed to read
    pub fn config_get(&self, key: &PluginKey) -> Result<IndexMap<String, String>> {
        self.config.get(key)
    }

    /// Set a config value for an installed plugin
    pub fn config_set(&self, key: &PluginKey, name: &str, value: &str) -> Result<()> {
        self.require_installed(key)?;
        self.config.set(key, name, value)
    }

    /// Remove a config value; returns whether it existed
    pub fn config_unset(&self, key: &PluginKey, name: &str) -> Result<bool> {
        self.require_installed(key)?;
        self.config.unset(key, name)
    }

    fn require_installed(&self, key: &PluginKey) -> Result<()> {
        if self.registry.load()?.find(key).is_none() {
            return Err(Error::plugin_not_found(key.to_string()));
        }
        Ok(())
    }

    /// Execute a plan: stage every artifact, then commit serially in plan
    /// order, persisting the registry after each commit
    async fn apply(&self, state: &mut RegistryState, plan: ResolutionPlan) -> Result<ApplyReport> {
        let staging = self.server_dir.join(STAGING_DIR);
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;
        fs::create_dir_all(self.server_dir.join(PLUGINS_DIR))?;

        // Download phase. Any failure here aborts before a single file
        // in plugins/ has moved.
        let changes: Vec<&Action> = plan.actions.iter().filter(|a| a.is_change()).collect();
        let staged = join_all(changes.iter().copied().map(|action| {
            let staging = staging.clone();
            async move { self.stage(action, &staging).await }
        }))
        .await;

        let mut artifacts: Vec<StagedArtifact> = Vec::with_capacity(staged.len());
        for outcome in staged {
            artifacts.push(outcome?);
        }
        let mut artifacts = artifacts.into_iter();

        // Commit phase.
        let mut completed = Vec::new();
        let mut failed = None;
        let mut remaining = plan.actions.into_iter();

        for action in remaining.by_ref() {
            let outcome = if action.is_change() {
                match artifacts.next() {
                    Some(artifact) => self.commit(state, &action, artifact),
                    None => Err(Error::integrity(format!(
                        "no staged artifact for {}",
                        action.key()
                    ))),
                }
            } else {
                Ok(())
            };

            match outcome {
                Ok(()) => completed.push(action),
                Err(e) => {
                    warn!("Stopping plan at {}: {}", action.key(), e);
                    failed = Some(FailedAction {
                        action,
                        error: e.to_string(),
                    });
                    break;
                }
            }
        }

        let not_attempted: Vec<Action> = remaining.collect();
        if let Err(e) = fs::remove_dir_all(&staging) {
            debug!("Leaving staging dir in place: {}", e);
        }

        Ok(ApplyReport {
            completed,
            failed,
            not_attempted,
        })
    }

    /// Download and validate one action's artifact into the staging dir
    async fn stage(&self, action: &Action, staging: &Path) -> Result<StagedArtifact> {
        let (key, version) = match action {
            Action::Install { key, version } => (key, version),
            Action::Upgrade { key, to, .. } => (key, to),
            _ => {
                return Err(Error::integrity(format!(
                    "action for {} stages no artifact",
                    action.key()
                )))
            }
        };

        let meta = self.catalog.metadata(key).await?;
        let bytes = self.catalog.download(key, version).await?;
        if bytes.is_empty() {
            return Err(Error::integrity(format!(
                "{} {} downloaded empty",
                key, version
            )));
        }

        let file = format!("{}-{}.jar", sanitize_file_stem(&meta.name), version);
        let path = staging.join(&file);
        fs::write(&path, &bytes)?;
        debug!("Staged {} ({} bytes)", file, bytes.len());

        Ok(StagedArtifact {
            file,
            path,
            name: meta.name.clone(),
            dependencies: meta.dependencies.clone(),
        })
    }

    /// Move one staged artifact into place and record it. Synchronous:
    /// the commit point is the rename plus the registry save.
    fn commit(
        &self,
        state: &mut RegistryState,
        action: &Action,
        artifact: StagedArtifact,
    ) -> Result<()> {
        match action {
            Action::Install { key, version } => {
                fs::rename(&artifact.path, self.active_path(&artifact.file))?;
                let mut record = PluginRecord::new(
                    key.clone(),
                    artifact.name,
                    version.clone(),
                    artifact.file,
                    artifact.dependencies,
                );
                record.enabled = true;
                state.upsert(record);
                self.registry.save(state)?;
                info!("Installed {} {}", key, version);
            }
            Action::Upgrade { key, from, to } => {
                let record = state
                    .find_mut(key)
                    .ok_or_else(|| Error::plugin_not_found(key.to_string()))?;
                let old_active = self.active_path(&record.file);
                let old_disabled = self.disabled_path(&record.file);

                // A disabled plugin upgrades in place and stays disabled.
                let target = if record.enabled {
                    self.active_path(&artifact.file)
                } else {
                    self.disabled_path(&artifact.file)
                };
                fs::rename(&artifact.path, &target)?;
                if artifact.file != record.file {
                    remove_if_present(&old_active)?;
                    remove_if_present(&old_disabled)?;
                }

                record.version = to.clone();
                record.file = artifact.file;
                record.dependencies = artifact.dependencies;
                record.updated_at = chrono::Utc::now();
                self.registry.save(state)?;
                info!("Upgraded {} {} -> {}", key, from, to);
            }
            Action::Skip { .. } | Action::Conflict { .. } => {}
        }
        Ok(())
    }

    fn active_path(&self, file: &str) -> PathBuf {
        self.server_dir.join(PLUGINS_DIR).join(file)
    }

    fn disabled_path(&self, file: &str) -> PathBuf {
        self.server_dir
            .join(PLUGINS_DIR)
            .join(format!("{}{}", file, DISABLED_SUFFIX))
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
