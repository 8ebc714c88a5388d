use std::sync::Arc;

use cachekey_lib::{ContentHashes, Graph, ProductKind};

use super::common::*;

/// App -> { Feature, Ui }, Feature -> Core, Ui -> Core, plus unrelated Tool.
fn app_graph() -> Graph {
  Graph::new(
    [project()],
    [
      target("Core", ProductKind::Library),
      target("Feature", ProductKind::Framework).with_dependency(id("Core")),
      target("Ui", ProductKind::Framework).with_dependency(id("Core")),
      target("App", ProductKind::Executable)
        .with_dependency(id("Ui"))
        .with_dependency(id("Feature")),
      target("Tool", ProductKind::Executable),
    ],
  )
  .unwrap()
}

async fn hashes(graph: &Graph, leaf: Arc<MockLeafHasher>) -> ContentHashes {
  subject(leaf)
    .content_hashes(graph, Some("Debug"), None, no_exclusions(), None)
    .await
    .unwrap()
}

#[tokio::test]
async fn every_hashable_node_gets_a_digest() {
  let result = hashes(&app_graph(), Arc::new(MockLeafHasher::default())).await;

  assert_eq!(result.len(), 5);
  for name in ["Core", "Feature", "Ui", "App", "Tool"] {
    let digest = result.get(&id(name)).unwrap();
    assert_eq!(digest.as_str().len(), 64);
  }
}

#[tokio::test]
async fn repeated_runs_are_identical() {
  let graph = app_graph();
  let first = hashes(&graph, Arc::new(MockLeafHasher::default())).await;
  let second = hashes(&graph, Arc::new(MockLeafHasher::default())).await;

  assert_eq!(first, second);
  assert_eq!(
    serde_json::to_string(&first).unwrap(),
    serde_json::to_string(&second).unwrap()
  );
}

#[tokio::test]
async fn dependency_declaration_order_does_not_matter() {
  let reordered = Graph::new(
    [project()],
    [
      target("Core", ProductKind::Library),
      target("Feature", ProductKind::Framework).with_dependency(id("Core")),
      target("Ui", ProductKind::Framework).with_dependency(id("Core")),
      target("App", ProductKind::Executable)
        .with_dependency(id("Feature"))
        .with_dependency(id("Ui")),
      target("Tool", ProductKind::Executable),
    ],
  )
  .unwrap();

  let original = hashes(&app_graph(), Arc::new(MockLeafHasher::default())).await;
  let reordered = hashes(&reordered, Arc::new(MockLeafHasher::default())).await;

  assert_eq!(original, reordered);
}

#[tokio::test]
async fn leaf_change_reaches_all_transitive_dependents() {
  let graph = app_graph();
  let before = hashes(&graph, Arc::new(MockLeafHasher::default())).await;

  let leaf = Arc::new(MockLeafHasher::default());
  leaf.set_content("Core", "Core v2");
  let after = hashes(&graph, leaf).await;

  for name in ["Core", "Feature", "Ui", "App"] {
    assert_ne!(before.get(&id(name)), after.get(&id(name)), "{name} should change");
  }
  assert_eq!(before.get(&id("Tool")), after.get(&id("Tool")));
}

#[tokio::test]
async fn leaf_change_leaves_siblings_alone() {
  let graph = app_graph();
  let before = hashes(&graph, Arc::new(MockLeafHasher::default())).await;

  let leaf = Arc::new(MockLeafHasher::default());
  leaf.set_content("Ui", "Ui v2");
  let after = hashes(&graph, leaf).await;

  assert_ne!(before.get(&id("Ui")), after.get(&id("Ui")));
  assert_ne!(before.get(&id("App")), after.get(&id("App")));
  assert_eq!(before.get(&id("Feature")), after.get(&id("Feature")));
  assert_eq!(before.get(&id("Core")), after.get(&id("Core")));
}

#[tokio::test]
async fn configuration_changes_every_digest() {
  let graph = app_graph();
  let subject = subject(Arc::new(MockLeafHasher::default()));

  let debug = subject
    .content_hashes(&graph, Some("Debug"), None, no_exclusions(), None)
    .await
    .unwrap();
  let release = subject
    .content_hashes(&graph, Some("Release"), None, no_exclusions(), None)
    .await
    .unwrap();

  for (node, digest) in debug.iter() {
    assert_ne!(Some(digest), release.get(node), "{node} should change");
  }
}

#[tokio::test]
async fn toolchain_version_changes_every_digest() {
  let graph = app_graph();
  let baseline = hashes(&graph, Arc::new(MockLeafHasher::default())).await;

  let changed = subject_with(
    Arc::new(MockLeafHasher::default()),
    MockConfiguration(Some("Debug".to_string())),
    MockVersion::of("16.0.0"),
    MockVersion::of("5.10.0"),
  )
  .content_hashes(&graph, Some("Debug"), None, no_exclusions(), None)
  .await
  .unwrap();

  for (node, digest) in baseline.iter() {
    assert_ne!(Some(digest), changed.get(node), "{node} should change");
  }
}

#[tokio::test]
async fn language_version_changes_every_digest() {
  let graph = app_graph();
  let baseline = hashes(&graph, Arc::new(MockLeafHasher::default())).await;

  let changed = subject_with(
    Arc::new(MockLeafHasher::default()),
    MockConfiguration(Some("Debug".to_string())),
    MockVersion::of("15.0.0"),
    MockVersion::of("6.0.0"),
  )
  .content_hashes(&graph, Some("Debug"), None, no_exclusions(), None)
  .await
  .unwrap();

  for (node, digest) in baseline.iter() {
    assert_ne!(Some(digest), changed.get(node), "{node} should change");
  }
}

#[tokio::test]
async fn resolved_default_matches_explicit_configuration() {
  let graph = app_graph();
  let subject = subject(Arc::new(MockLeafHasher::default()));

  let explicit = subject
    .content_hashes(&graph, Some("Debug"), None, no_exclusions(), None)
    .await
    .unwrap();
  let resolved = subject
    .content_hashes(&graph, None, None, no_exclusions(), None)
    .await
    .unwrap();

  assert_eq!(explicit, resolved);
}

#[tokio::test]
async fn diamond_dependency_is_leaf_hashed_once() {
  let leaf = Arc::new(MockLeafHasher::default());
  hashes(&app_graph(), leaf.clone()).await;

  assert_eq!(leaf.calls_for(&id("Core")), 1);
  assert_eq!(leaf.called().len(), 5);
}

#[tokio::test]
async fn transparent_node_forwards_dependency_digests() {
  // App -> Group (metadata only) -> Core
  let graph = Graph::new(
    [project()],
    [
      target("Core", ProductKind::Library),
      target("Group", ProductKind::Other).with_dependency(id("Core")),
      target("App", ProductKind::Executable).with_dependency(id("Group")),
    ],
  )
  .unwrap();

  let leaf = Arc::new(MockLeafHasher::default());
  let before = hashes(&graph, leaf.clone()).await;

  assert!(!before.contains(&id("Group")));
  assert_eq!(leaf.calls_for(&id("Group")), 0);

  let leaf = Arc::new(MockLeafHasher::default());
  leaf.set_content("Core", "Core v2");
  let after = hashes(&graph, leaf).await;

  assert_ne!(before.get(&id("App")), after.get(&id("App")));
}

#[tokio::test]
async fn transparent_node_matches_direct_dependency() {
  // Looking through Group, App depends on exactly Core either way
  let through_group = Graph::new(
    [project()],
    [
      target("Core", ProductKind::Library),
      target("Group", ProductKind::Other).with_dependency(id("Core")),
      target("App", ProductKind::Executable).with_dependency(id("Group")),
    ],
  )
  .unwrap();
  let direct = Graph::new(
    [project()],
    [
      target("Core", ProductKind::Library),
      target("App", ProductKind::Executable).with_dependency(id("Core")),
    ],
  )
  .unwrap();

  let a = hashes(&through_group, Arc::new(MockLeafHasher::default())).await;
  let b = hashes(&direct, Arc::new(MockLeafHasher::default())).await;

  assert_eq!(a.get(&id("App")), b.get(&id("App")));
}
