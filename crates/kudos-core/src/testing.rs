//! In-process test doubles for the store and chat traits.

use std::{
  collections::BTreeMap,
  convert::Infallible,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use chrono::Utc;

use crate::{
  chat::{ChannelProfile, ChannelSummary, ChatPlatform, TeamMember, UserProfile},
  kudos::{Kudos, LeaderboardEntry, NewKudos, Stats, Visibility},
  store::{KudosQuery, KudosStore},
};

// ─── MemoryStore ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
  kudos:           Mutex<Vec<Kudos>>,
  managers:        Mutex<BTreeMap<String, String>>,
  manager_lookups: AtomicUsize,
}

impl MemoryStore {
  pub fn all(&self) -> Vec<Kudos> { self.kudos.lock().unwrap().clone() }

  /// How many times `get_manager` has been called.
  pub fn manager_lookups(&self) -> usize { self.manager_lookups.load(Ordering::SeqCst) }
}

impl KudosStore for MemoryStore {
  type Error = Infallible;

  async fn insert(&self, input: NewKudos) -> Result<i64, Infallible> {
    let mut kudos = self.kudos.lock().unwrap();
    let id = kudos.len() as i64 + 1;
    kudos.push(Kudos {
      id,
      from_user_id: input.from_user_id,
      from_user_name: input.from_user_name,
      to_user_id: input.to_user_id,
      to_user_name: input.to_user_name,
      message: input.message,
      channel_id: input.channel_id,
      channel_name: input.channel_name,
      sent_dm: input.sent_dm,
      sent_channel: input.sent_channel,
      visibility: input.visibility,
      created_at: Utc::now(),
    });
    Ok(id)
  }

  async fn query(&self, query: KudosQuery, limit: u32) -> Result<Vec<Kudos>, Infallible> {
    let kudos = self.kudos.lock().unwrap();
    Ok(
      kudos
        .iter()
        .rev()
        .filter(|k| match &query {
          KudosQuery::Recipient { user_id, include_private } => {
            &k.to_user_id == user_id && (*include_private || k.visibility == Visibility::Public)
          }
          KudosQuery::Sender { user_id } => &k.from_user_id == user_id,
          KudosQuery::All { visibility } => visibility.is_none_or(|v| k.visibility == v),
        })
        .take(limit as usize)
        .cloned()
        .collect(),
    )
  }

  async fn stats(&self) -> Result<Stats, Infallible> { unimplemented!() }

  async fn leaderboard(&self, _: u32) -> Result<Vec<LeaderboardEntry>, Infallible> {
    unimplemented!()
  }

  async fn set_manager<'a>(&'a self, user_id: &'a str, manager_id: &'a str) -> Result<(), Infallible> {
    self.managers.lock().unwrap().insert(user_id.to_owned(), manager_id.to_owned());
    Ok(())
  }

  async fn get_manager<'a>(&'a self, user_id: &'a str) -> Result<Option<String>, Infallible> {
    self.manager_lookups.fetch_add(1, Ordering::SeqCst);
    Ok(self.managers.lock().unwrap().get(user_id).cloned())
  }

  async fn direct_reports<'a>(&'a self, manager_id: &'a str) -> Result<Vec<String>, Infallible> {
    Ok(
      self
        .managers
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, m)| m.as_str() == manager_id)
        .map(|(u, _)| u.clone())
        .collect(),
    )
  }

  async fn close(&self) -> Result<(), Infallible> { Ok(()) }
}

// ─── FakeChat ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("chat call failed: {0}")]
pub struct ChatFailure(pub &'static str);

/// A chat platform whose individual calls can be made to fail.
#[derive(Default)]
pub struct FakeChat {
  pub fail_dm:             bool,
  pub fail_channel:        bool,
  pub fail_user_lookup:    bool,
  pub fail_channel_lookup: bool,
  pub calls:               AtomicUsize,
  pub sent:                Mutex<Vec<(String, String)>>,
}

impl FakeChat {
  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl ChatPlatform for FakeChat {
  type Error = ChatFailure;

  async fn post_direct_message<'a>(&'a self, user_id: &'a str, text: &'a str) -> Result<(), ChatFailure> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_dm {
      return Err(ChatFailure("dm"));
    }
    self.sent.lock().unwrap().push((user_id.to_owned(), text.to_owned()));
    Ok(())
  }

  async fn post_to_channel<'a>(&'a self, channel_id: &'a str, text: &'a str) -> Result<(), ChatFailure> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_channel {
      return Err(ChatFailure("channel"));
    }
    self.sent.lock().unwrap().push((channel_id.to_owned(), text.to_owned()));
    Ok(())
  }

  async fn lookup_user<'a>(&'a self, user_id: &'a str) -> Result<UserProfile, ChatFailure> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_user_lookup {
      return Err(ChatFailure("users.info"));
    }
    Ok(UserProfile { id: user_id.to_owned(), display_name: format!("Name of {user_id}") })
  }

  async fn lookup_channel<'a>(&'a self, channel_id: &'a str) -> Result<ChannelProfile, ChatFailure> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_channel_lookup {
      return Err(ChatFailure("conversations.info"));
    }
    Ok(ChannelProfile { id: channel_id.to_owned(), name: "general".to_owned() })
  }

  async fn team_members(&self) -> Result<Vec<TeamMember>, ChatFailure> { Ok(Vec::new()) }

  async fn channels(&self) -> Result<Vec<ChannelSummary>, ChatFailure> { Ok(Vec::new()) }
}
