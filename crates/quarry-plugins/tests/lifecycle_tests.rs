mod common;

use common::{catalog, key, v, StaticSource, FAKE_JAR};

use tempfile::TempDir;

use quarry_core::{Error, VersionConstraint};
use quarry_plugins::lifecycle::{DependencyState, PluginManager};
use quarry_plugins::registry::PluginRegistry;

fn manager(dir: &TempDir, source: StaticSource) -> PluginManager {
    PluginManager::open(dir.path(), catalog(source))
}

fn jar(dir: &TempDir, file: &str) -> std::path::PathBuf {
    dir.path().join("plugins").join(file)
}

#[tokio::test]
async fn test_install_places_artifact_and_records() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth")
            .with_plugin("app", &["2.0"], &[("modrinth:lib", "any")])
            .with_plugin("lib", &["1.5"], &[]),
    );

    let report = mgr
        .install(key("modrinth:app"), VersionConstraint::Any)
        .await
        .unwrap();
    assert!(report.is_success());
    assert_eq!(report.completed.len(), 2);

    assert_eq!(std::fs::read(jar(&dir, "app-2.0.0.jar")).unwrap(), FAKE_JAR);
    assert!(jar(&dir, "lib-1.5.0.jar").exists());

    let records = mgr.list().unwrap();
    assert_eq!(records.len(), 2);
    let app = records.iter().find(|r| r.key == key("modrinth:app")).unwrap();
    assert_eq!(app.version, v("2.0"));
    assert!(app.enabled);
    assert!(!app.pinned);
    assert_eq!(app.dependencies.len(), 1);
}

#[tokio::test]
async fn test_install_reinvocation_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["2.0"], &[]),
    );

    mgr.install(key("modrinth:app"), VersionConstraint::Any)
        .await
        .unwrap();
    let report = mgr
        .install(key("modrinth:app"), VersionConstraint::Any)
        .await
        .unwrap();

    assert!(report.is_success());
    assert!(report.completed.iter().all(|a| !a.is_change()));
    assert_eq!(mgr.list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bad_artifact_aborts_before_any_commit() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth")
            .with_plugin("app", &["2.0"], &[("modrinth:lib", "any")])
            .with_plugin("lib", &["1.5"], &[])
            .with_artifact("lib", "1.5", b""),
    );

    let err = mgr
        .install(key("modrinth:app"), VersionConstraint::Any)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Integrity { .. }));

    // Staging failed, so neither plugin landed and nothing was recorded.
    assert!(!jar(&dir, "app-2.0.0.jar").exists());
    assert!(!jar(&dir, "lib-1.5.0.jar").exists());
    assert!(mgr.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_replaces_artifact() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["2.0", "1.0"], &[]),
    );

    mgr.install(key("modrinth:app"), "1.0".parse().unwrap())
        .await
        .unwrap();
    assert!(jar(&dir, "app-1.0.0.jar").exists());

    let report = mgr.update(key("modrinth:app"), false).await.unwrap();
    assert!(report.is_success());

    assert!(!jar(&dir, "app-1.0.0.jar").exists());
    assert!(jar(&dir, "app-2.0.0.jar").exists());
    let records = mgr.list().unwrap();
    assert_eq!(records[0].version, v("2.0"));
}

#[tokio::test]
async fn test_delete_removes_artifact_record_and_config() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["1.0"], &[]),
    );
    let k = key("modrinth:app");

    mgr.install(k.clone(), VersionConstraint::Any).await.unwrap();
    mgr.config_set(&k, "motd", "hi").unwrap();

    mgr.delete(&k).unwrap();

    assert!(!jar(&dir, "app-1.0.0.jar").exists());
    assert!(mgr.list().unwrap().is_empty());
    assert!(mgr.config_get(&k).unwrap().is_empty());

    // Deleting again reports not found.
    assert!(matches!(
        mgr.delete(&k).unwrap_err(),
        Error::PluginNotFound { .. }
    ));
}

#[tokio::test]
async fn test_disable_and_enable_roundtrip() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["1.0"], &[]),
    );
    let k = key("modrinth:app");

    mgr.install(k.clone(), VersionConstraint::Any).await.unwrap();
    mgr.config_set(&k, "motd", "hi").unwrap();

    mgr.disable(&k).unwrap();
    assert!(!jar(&dir, "app-1.0.0.jar").exists());
    assert!(jar(&dir, "app-1.0.0.jar.disabled").exists());
    let rec = &mgr.list().unwrap()[0];
    assert!(!rec.enabled);
    assert_eq!(rec.version, v("1.0"));

    // Disabling again is a no-op.
    mgr.disable(&k).unwrap();

    mgr.enable(&k).unwrap();
    assert!(jar(&dir, "app-1.0.0.jar").exists());
    assert!(!jar(&dir, "app-1.0.0.jar.disabled").exists());
    assert!(mgr.list().unwrap()[0].enabled);

    // Config rode through untouched.
    assert_eq!(mgr.config_get(&k).unwrap().get("motd").unwrap(), "hi");
}

#[tokio::test]
async fn test_enable_with_missing_artifact_is_integrity_error() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["1.0"], &[]),
    );
    let k = key("modrinth:app");

    mgr.install(k.clone(), VersionConstraint::Any).await.unwrap();
    std::fs::remove_file(jar(&dir, "app-1.0.0.jar")).unwrap();

    assert!(matches!(
        mgr.disable(&k).unwrap_err(),
        Error::Integrity { .. }
    ));
}

#[tokio::test]
async fn test_disabled_plugin_upgrades_in_place() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["2.0", "1.0"], &[]),
    );
    let k = key("modrinth:app");

    mgr.install(k.clone(), "1.0".parse().unwrap()).await.unwrap();
    mgr.disable(&k).unwrap();

    mgr.update(k.clone(), false).await.unwrap();

    assert!(jar(&dir, "app-2.0.0.jar.disabled").exists());
    assert!(!jar(&dir, "app-2.0.0.jar").exists());
    assert!(!jar(&dir, "app-1.0.0.jar.disabled").exists());
    let rec = &mgr.list().unwrap()[0];
    assert!(!rec.enabled);
    assert_eq!(rec.version, v("2.0"));
}

#[tokio::test]
async fn test_pin_blocks_update_until_forced() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["2.0", "1.0"], &[]),
    );
    let k = key("modrinth:app");

    mgr.install(k.clone(), "1.0".parse().unwrap()).await.unwrap();
    mgr.pin(&k, "1.0", false).await.unwrap();
    assert!(mgr.list().unwrap()[0].pinned);

    assert!(matches!(
        mgr.update(k.clone(), false).await.unwrap_err(),
        Error::PinViolation { .. }
    ));

    // The refused update changed nothing.
    let rec = &mgr.list().unwrap()[0];
    assert_eq!(rec.version, v("1.0"));
    assert!(rec.pinned);
    assert!(jar(&dir, "app-1.0.0.jar").exists());
    assert!(!jar(&dir, "app-2.0.0.jar").exists());

    let report = mgr.update(k.clone(), true).await.unwrap();
    assert!(report.is_success());
    let rec = &mgr.list().unwrap()[0];
    assert_eq!(rec.version, v("2.0"));
    assert!(!rec.pinned);
}

#[tokio::test]
async fn test_conflict_leaves_registry_unchanged() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth")
            .with_plugin("app", &["1.0"], &[("modrinth:lib", ">=2.0")])
            .with_plugin("lib", &["2.0", "1.0"], &[]),
    );

    mgr.install(key("modrinth:lib"), "1.0".parse().unwrap())
        .await
        .unwrap();
    mgr.pin(&key("modrinth:lib"), "1.0", false).await.unwrap();

    let registry = PluginRegistry::open(dir.path());
    let before = registry.load().unwrap();

    let err = mgr
        .install(key("modrinth:app"), VersionConstraint::Any)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));

    // The failed resolve left the durable state exactly as it was.
    assert_eq!(registry.load().unwrap(), before);
    assert!(!jar(&dir, "app-1.0.0.jar").exists());
    assert!(jar(&dir, "lib-1.0.0.jar").exists());
}

#[tokio::test]
async fn test_list_reports_untracked_jars() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["1.0"], &[]),
    );

    mgr.install(key("modrinth:app"), VersionConstraint::Any)
        .await
        .unwrap();
    std::fs::write(jar(&dir, "LegacyMap.jar"), b"jar").unwrap();
    std::fs::write(jar(&dir, "notes.txt"), b"not a jar").unwrap();

    // The managed artifact, the text file, and disabled artifacts are
    // not reported; the stray jar is.
    assert_eq!(mgr.scan_untracked().unwrap(), vec!["LegacyMap.jar"]);

    mgr.disable(&key("modrinth:app")).unwrap();
    assert_eq!(mgr.scan_untracked().unwrap(), vec!["LegacyMap.jar"]);
}

#[tokio::test]
async fn test_unpin_allows_update() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["2.0", "1.0"], &[]),
    );
    let k = key("modrinth:app");

    mgr.install(k.clone(), "1.0".parse().unwrap()).await.unwrap();
    mgr.pin(&k, "1.0", false).await.unwrap();
    mgr.unpin(&k).unwrap();

    mgr.update(k.clone(), false).await.unwrap();
    assert_eq!(mgr.list().unwrap()[0].version, v("2.0"));
}

#[tokio::test]
async fn test_pin_other_version_requires_upgrade() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["2.0", "1.0"], &[]),
    );
    let k = key("modrinth:app");

    mgr.install(k.clone(), "1.0".parse().unwrap()).await.unwrap();

    assert!(matches!(
        mgr.pin(&k, "2.0", false).await.unwrap_err(),
        Error::VersionMismatch { .. }
    ));

    mgr.pin(&k, "2.0", true).await.unwrap();
    let rec = &mgr.list().unwrap()[0];
    assert_eq!(rec.version, v("2.0"));
    assert!(rec.pinned);
    assert!(jar(&dir, "app-2.0.0.jar").exists());
}

#[tokio::test]
async fn test_check_dependencies() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth")
            .with_plugin(
                "app",
                &["1.0"],
                &[("modrinth:lib", ">=1.0"), ("modrinth:extra", "any")],
            )
            .with_plugin("lib", &["1.5"], &[])
            .with_plugin("extra", &["1.0"], &[]),
    );
    let k = key("modrinth:app");

    mgr.install(k.clone(), VersionConstraint::Any).await.unwrap();
    mgr.delete(&key("modrinth:extra")).unwrap();

    let statuses = mgr.check_dependencies(&k).unwrap();
    assert_eq!(statuses.len(), 2);

    let lib = statuses.iter().find(|s| s.target == key("modrinth:lib")).unwrap();
    assert_eq!(
        lib.state,
        DependencyState::Satisfied {
            installed: v("1.5"),
        }
    );

    let extra = statuses
        .iter()
        .find(|s| s.target == key("modrinth:extra"))
        .unwrap();
    assert_eq!(extra.state, DependencyState::Missing);
}

#[tokio::test]
async fn test_config_requires_installed_plugin() {
    let dir = TempDir::new().unwrap();
    let mgr = manager(
        &dir,
        StaticSource::new("modrinth").with_plugin("app", &["2.0", "1.0"], &[]),
    );
    let k = key("modrinth:app");

    assert!(matches!(
        mgr.config_set(&k, "motd", "hi").unwrap_err(),
        Error::PluginNotFound { .. }
    ));

    mgr.install(k.clone(), "1.0".parse().unwrap()).await.unwrap();
    mgr.config_set(&k, "motd", "hi").unwrap();

    // Config survives an update.
    mgr.update(k.clone(), false).await.unwrap();
    assert_eq!(mgr.config_get(&k).unwrap().get("motd").unwrap(), "hi");

    assert!(mgr.config_unset(&k, "motd").unwrap());
    assert!(!mgr.config_unset(&k, "motd").unwrap());
}
