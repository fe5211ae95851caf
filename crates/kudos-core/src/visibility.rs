//! Read-time visibility policy.
//!
//! Public records are visible to everyone. A private record is visible only to
//! its sender, its recipient, and the managers above the recipient (direct
//! manager, their manager, and so on). Callers without a verified identity
//! only ever see public records.
//!
//! The policy runs after the repository query, so a read asking for `limit`
//! records may return fewer once private ones are dropped.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{kudos::Kudos, store::KudosStore};

/// Upper bound on manager-chain walks; relationships are user-editable and
/// may contain cycles or absurdly deep chains.
pub const MAX_CHAIN_DEPTH: usize = 16;

/// The identity a read is performed on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewer {
  #[default]
  Anonymous,
  /// A caller whose user id has been verified by the HTTP layer.
  User(String),
}

impl Viewer {
  pub fn user(id: impl Into<String>) -> Self { Self::User(id.into()) }

  pub fn user_id(&self) -> Option<&str> {
    match self {
      Self::Anonymous => None,
      Self::User(id) => Some(id),
    }
  }
}

/// Walk upward from `user_id` through manager relationships and return the
/// chain, nearest manager first. Stops at the top of the chain, at a cycle,
/// or after [`MAX_CHAIN_DEPTH`] hops.
pub async fn manager_chain<S>(store: &S, user_id: &str) -> Result<Vec<String>, S::Error>
where
  S: KudosStore + ?Sized,
{
  ManagerLookup::new(store).chain(user_id).await
}

/// Memoised `get_manager` calls, so chains that share managers cost one
/// lookup per person rather than one per hop per chain.
struct ManagerLookup<'s, S: ?Sized> {
  store:    &'s S,
  managers: HashMap<String, Option<String>>,
}

impl<'s, S> ManagerLookup<'s, S>
where
  S: KudosStore + ?Sized,
{
  fn new(store: &'s S) -> Self { Self { store, managers: HashMap::new() } }

  async fn manager(&mut self, user_id: &str) -> Result<Option<String>, S::Error> {
    if let Some(known) = self.managers.get(user_id) {
      return Ok(known.clone());
    }
    let manager = self.store.get_manager(user_id).await?;
    self.managers.insert(user_id.to_owned(), manager.clone());
    Ok(manager)
  }

  async fn chain(&mut self, user_id: &str) -> Result<Vec<String>, S::Error> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([user_id.to_owned()]);
    let mut current = user_id.to_owned();

    while chain.len() < MAX_CHAIN_DEPTH {
      let Some(manager) = self.manager(&current).await? else {
        break;
      };
      if !seen.insert(manager.clone()) {
        debug!(%user_id, %manager, "manager cycle detected");
        break;
      }
      chain.push(manager.clone());
      current = manager;
    }

    Ok(chain)
  }
}

/// Decide whether `viewer` may see `kudos`, given the recipient's manager
/// chain.
pub fn can_view(viewer: &Viewer, kudos: &Kudos, recipient_chain: &[String]) -> bool {
  if !kudos.visibility.is_private() {
    return true;
  }
  match viewer {
    Viewer::Anonymous => false,
    Viewer::User(id) => kudos.involves(id) || recipient_chain.iter().any(|m| m == id),
  }
}

/// Drop every record in `records` that `viewer` may not see, preserving
/// order. Manager relationships are looked up lazily and at most once per
/// person for the whole batch.
pub async fn retain_visible<S>(
  store: &S,
  viewer: &Viewer,
  records: Vec<Kudos>,
) -> Result<Vec<Kudos>, S::Error>
where
  S: KudosStore + ?Sized,
{
  let Some(viewer_id) = viewer.user_id() else {
    return Ok(records.into_iter().filter(|k| !k.visibility.is_private()).collect());
  };

  let mut lookup = ManagerLookup::new(store);
  let mut chains: HashMap<String, Vec<String>> = HashMap::new();
  let mut visible = Vec::with_capacity(records.len());

  for kudos in records {
    if !kudos.visibility.is_private() || kudos.involves(viewer_id) {
      visible.push(kudos);
      continue;
    }
    if !chains.contains_key(&kudos.to_user_id) {
      let chain = lookup.chain(&kudos.to_user_id).await?;
      chains.insert(kudos.to_user_id.clone(), chain);
    }
    let chain = chains.get(&kudos.to_user_id).map(Vec::as_slice).unwrap_or(&[]);
    if can_view(viewer, &kudos, chain) {
      visible.push(kudos);
    }
  }

  Ok(visible)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    kudos::{NewKudos, Visibility},
    testing::MemoryStore,
  };

  async fn seeded() -> MemoryStore {
    let store = MemoryStore::default();
    store
      .insert(NewKudos::new("U1", "Ann", "U2", "Bob", "thanks for the review"))
      .await
      .unwrap();
    store
      .insert(
        NewKudos::new("U1", "Ann", "U2", "Bob", "quiet thanks for the help")
          .with_visibility(Visibility::Private),
      )
      .await
      .unwrap();
    store
  }

  #[tokio::test]
  async fn anonymous_sees_only_public() {
    let store = seeded().await;
    let all = store.list_all(10, None).await.unwrap();
    let visible = retain_visible(&store, &Viewer::Anonymous, all).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert!(visible.iter().all(|k| k.visibility == Visibility::Public));
  }

  #[tokio::test]
  async fn sender_and_recipient_see_private() {
    let store = seeded().await;
    for id in ["U1", "U2"] {
      let all = store.list_all(10, None).await.unwrap();
      let visible = retain_visible(&store, &Viewer::user(id), all).await.unwrap();
      assert_eq!(visible.len(), 2, "viewer {id}");
    }
  }

  #[tokio::test]
  async fn unrelated_user_does_not_see_private() {
    let store = seeded().await;
    let all = store.list_all(10, None).await.unwrap();
    let visible = retain_visible(&store, &Viewer::user("U9"), all).await.unwrap();
    assert_eq!(visible.len(), 1);
  }

  #[tokio::test]
  async fn manager_chain_sees_private() {
    let store = seeded().await;
    store.set_manager("U2", "M1").await.unwrap();
    store.set_manager("M1", "M2").await.unwrap();

    for id in ["M1", "M2"] {
      let all = store.list_all(10, None).await.unwrap();
      let visible = retain_visible(&store, &Viewer::user(id), all).await.unwrap();
      assert_eq!(visible.len(), 2, "manager {id}");
    }

    // The sender's manager is not in the recipient's chain.
    store.set_manager("U1", "M9").await.unwrap();
    let all = store.list_all(10, None).await.unwrap();
    let visible = retain_visible(&store, &Viewer::user("M9"), all).await.unwrap();
    assert_eq!(visible.len(), 1);
  }

  #[tokio::test]
  async fn manager_chain_stops_at_cycles() {
    let store = MemoryStore::default();
    store.set_manager("A", "B").await.unwrap();
    store.set_manager("B", "C").await.unwrap();
    store.set_manager("C", "A").await.unwrap();

    let chain = manager_chain(&store, "A").await.unwrap();
    assert_eq!(chain, vec!["B".to_string(), "C".to_string()]);
  }

  #[tokio::test]
  async fn manager_chain_is_bounded() {
    let store = MemoryStore::default();
    for i in 0..(MAX_CHAIN_DEPTH + 10) {
      store.set_manager(&format!("U{i}"), &format!("U{}", i + 1)).await.unwrap();
    }
    let chain = manager_chain(&store, "U0").await.unwrap();
    assert_eq!(chain.len(), MAX_CHAIN_DEPTH);
    assert_eq!(chain[0], "U1");
  }

  #[tokio::test]
  async fn shared_managers_are_looked_up_once() {
    let store = MemoryStore::default();
    for i in 1..=5 {
      let to = format!("U{i}");
      let kudos = NewKudos::new("U0", "Zoe", &to, "Someone", "quiet thanks for the help");
      store.insert(kudos.with_visibility(Visibility::Private)).await.unwrap();
      store.set_manager(&to, "M1").await.unwrap();
    }
    store.set_manager("M1", "M2").await.unwrap();
    store.set_manager("M2", "M3").await.unwrap();

    let all = store.list_all(10, None).await.unwrap();
    let visible = retain_visible(&store, &Viewer::user("X"), all).await.unwrap();
    assert!(visible.is_empty());
    // Five recipients plus M1, M2 and M3, each asked once.
    assert_eq!(store.manager_lookups(), 8);

    let all = store.list_all(10, None).await.unwrap();
    assert_eq!(retain_visible(&store, &Viewer::user("M3"), all).await.unwrap().len(), 5);
  }
}
