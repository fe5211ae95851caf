//! Integration tests for `SqliteStore` against an in-memory database.

use kudos_core::{
  kudos::{NewKudos, Visibility},
  store::{KudosQuery, KudosStore, QueryShape},
};

use crate::{SqliteStore, statements};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn kudos(from: &str, to: &str) -> NewKudos {
  NewKudos::new(
    from,
    format!("{from} name"),
    to,
    format!("{to} name"),
    format!("thanks {to}, from {from}"),
  )
}

fn private(from: &str, to: &str) -> NewKudos { kudos(from, to).with_visibility(Visibility::Private) }

// ─── Insert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_returns_increasing_ids() {
  let s = store().await;
  let a = s.insert(kudos("U1", "U2")).await.unwrap();
  let b = s.insert(kudos("U1", "U3")).await.unwrap();
  assert!(b > a);
}

#[tokio::test]
async fn insert_then_read_back_roundtrips() {
  let s = store().await;

  let mut input = kudos("U1", "U2");
  input.channel_id   = Some("C1".into());
  input.channel_name = Some("general".into());
  input.sent_dm      = true;
  input.sent_channel = true;

  let id = s.insert(input.clone()).await.unwrap();

  let got = s.list_by_recipient("U2", 10, true).await.unwrap();
  assert_eq!(got.len(), 1);
  let k = &got[0];
  assert_eq!(k.id, id);
  assert_eq!(k.from_user_id, input.from_user_id);
  assert_eq!(k.from_user_name, input.from_user_name);
  assert_eq!(k.to_user_id, input.to_user_id);
  assert_eq!(k.to_user_name, input.to_user_name);
  assert_eq!(k.message, input.message);
  assert_eq!(k.channel_id, input.channel_id);
  assert_eq!(k.channel_name, input.channel_name);
  assert!(k.sent_dm);
  assert!(k.sent_channel);
  assert_eq!(k.visibility, Visibility::Public);
}

#[tokio::test]
async fn optional_fields_default() {
  let s = store().await;
  s.insert(kudos("U1", "U2")).await.unwrap();

  let k = s.list_all(1, None).await.unwrap().remove(0);
  assert_eq!(k.channel_id, None);
  assert_eq!(k.channel_name, None);
  assert!(!k.sent_dm);
  assert!(!k.sent_channel);
  assert_eq!(k.visibility, Visibility::Public);
}

#[tokio::test]
async fn untrusted_text_is_stored_verbatim() {
  let s = store().await;
  let mut input = kudos("U1", "U2");
  input.message = "'); DROP TABLE kudos; -- nice work".into();
  s.insert(input.clone()).await.unwrap();

  let got = s.list_by_recipient("U2", 10, true).await.unwrap();
  assert_eq!(got[0].message, input.message);
  assert_eq!(s.stats().await.unwrap().total, 1);
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn recipient_scenario_with_private_records() {
  let s = store().await;
  s.insert(kudos("U1", "A")).await.unwrap();
  s.insert(kudos("U2", "A")).await.unwrap();
  s.insert(private("U3", "A")).await.unwrap();
  s.insert(kudos("U1", "B")).await.unwrap();

  let public_only = s.list_by_recipient("A", 10, false).await.unwrap();
  assert_eq!(public_only.len(), 2);
  assert!(public_only.iter().all(|k| k.visibility == Visibility::Public));

  let everything = s.list_by_recipient("A", 10, true).await.unwrap();
  assert_eq!(everything.len(), 3);

  let board = s.leaderboard(10).await.unwrap();
  assert_eq!(board[0].to_user_id, "A");
  assert_eq!(board[0].kudos_count, 3);
  assert_eq!(board[1].to_user_id, "B");
  assert_eq!(board[1].kudos_count, 1);
}

#[tokio::test]
async fn reads_are_newest_first_and_limited() {
  let s = store().await;
  let mut ids = Vec::new();
  for _ in 0..5 {
    ids.push(s.insert(kudos("U1", "U2")).await.unwrap());
  }

  let got = s.list_by_recipient("U2", 3, true).await.unwrap();
  let got_ids: Vec<i64> = got.iter().map(|k| k.id).collect();
  assert_eq!(got_ids, vec![ids[4], ids[3], ids[2]]);
}

#[tokio::test]
async fn sender_view_includes_private() {
  let s = store().await;
  s.insert(kudos("U1", "U2")).await.unwrap();
  s.insert(private("U1", "U3")).await.unwrap();
  s.insert(kudos("U9", "U2")).await.unwrap();

  let sent = s.list_by_sender("U1", 10).await.unwrap();
  assert_eq!(sent.len(), 2);
  assert!(sent.iter().all(|k| k.from_user_id == "U1"));
}

#[tokio::test]
async fn list_all_visibility_filters() {
  let s = store().await;
  s.insert(kudos("U1", "U2")).await.unwrap();
  s.insert(private("U1", "U2")).await.unwrap();
  s.insert(kudos("U2", "U1")).await.unwrap();

  assert_eq!(s.list_all(10, None).await.unwrap().len(), 3);

  let public = s.list_all(10, Some(Visibility::Public)).await.unwrap();
  assert_eq!(public.len(), 2);
  assert!(public.iter().all(|k| k.visibility == Visibility::Public));

  let private = s.list_all(10, Some(Visibility::Private)).await.unwrap();
  assert_eq!(private.len(), 1);
  assert_eq!(private[0].visibility, Visibility::Private);

  assert_eq!(s.list_public(10).await.unwrap(), public);
}

#[tokio::test]
async fn every_query_shape_runs() {
  let s = store().await;
  s.insert(kudos("U1", "U2")).await.unwrap();
  s.insert(private("U2", "U1")).await.unwrap();

  let queries = [
    KudosQuery::Recipient { user_id: "U1".into(), include_private: true },
    KudosQuery::Recipient { user_id: "U1".into(), include_private: false },
    KudosQuery::Sender { user_id: "U2".into() },
    KudosQuery::All { visibility: None },
    KudosQuery::All { visibility: Some(Visibility::Private) },
  ];
  let expected = [1, 0, 1, 2, 1];

  for (query, n) in queries.into_iter().zip(expected) {
    let shape = query.shape();
    let got = s.query(query, 10).await.unwrap();
    assert_eq!(got.len(), n, "{shape:?}");
  }
}

#[test]
fn statements_filter_visibility_only_where_expected() {
  for shape in QueryShape::ALL {
    let sql = statements::for_shape(shape);
    let filters_visibility = sql.contains("visibility =");
    let expected = matches!(shape, QueryShape::RecipientPublic | QueryShape::AllWithVisibility);
    assert_eq!(filters_visibility, expected, "{shape:?}");
    assert!(sql.contains("ORDER BY created_at DESC"), "{shape:?}");
    assert!(sql.contains("LIMIT ?"), "{shape:?}");
  }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_on_empty_store() {
  let s = store().await;
  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total, 0);
  assert_eq!(stats.unique_recipients, 0);
  assert_eq!(stats.unique_senders, 0);
  assert_eq!(stats.last_7_days, 0);
}

#[tokio::test]
async fn stats_counts_distinct_users() {
  let s = store().await;
  s.insert(kudos("U1", "U2")).await.unwrap();
  s.insert(kudos("U1", "U3")).await.unwrap();
  s.insert(private("U4", "U2")).await.unwrap();

  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total, 3);
  assert_eq!(stats.unique_recipients, 2);
  assert_eq!(stats.unique_senders, 2);
  assert_eq!(stats.last_7_days, 3);
}

#[tokio::test]
async fn stats_window_excludes_old_records() {
  let s = store().await;
  s.insert(kudos("U1", "U2")).await.unwrap();
  s.conn
    .call(|conn| {
      conn.execute(
        "INSERT INTO kudos (from_user_id, from_user_name, to_user_id, to_user_name, message, created_at)
         VALUES ('U1', 'a', 'U2', 'b', 'from long ago', datetime('now', '-30 days'))",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total, 2);
  assert_eq!(stats.last_7_days, 1);
}

#[tokio::test]
async fn leaderboard_is_sorted_and_limited() {
  let s = store().await;
  for (to, n) in [("U1", 1), ("U2", 4), ("U3", 2), ("U4", 3)] {
    for _ in 0..n {
      s.insert(kudos("U9", to)).await.unwrap();
    }
  }

  let board = s.leaderboard(3).await.unwrap();
  assert_eq!(board.len(), 3);
  let counts: Vec<i64> = board.iter().map(|e| e.kudos_count).collect();
  assert_eq!(counts, vec![4, 3, 2]);
  assert_eq!(board[0].to_user_id, "U2");
  assert_eq!(board[0].to_user_name, "U2 name");
}

// ─── Manager relationships ───────────────────────────────────────────────────

#[tokio::test]
async fn set_manager_overwrites() {
  let s = store().await;
  assert_eq!(s.get_manager("U1").await.unwrap(), None);

  s.set_manager("U1", "U2").await.unwrap();
  assert_eq!(s.get_manager("U1").await.unwrap().as_deref(), Some("U2"));

  s.set_manager("U1", "U3").await.unwrap();
  assert_eq!(s.get_manager("U1").await.unwrap().as_deref(), Some("U3"));

  // Idempotent.
  s.set_manager("U1", "U3").await.unwrap();
  assert_eq!(s.get_manager("U1").await.unwrap().as_deref(), Some("U3"));
}

#[tokio::test]
async fn direct_reports_are_not_recursive() {
  let s = store().await;
  s.set_manager("U1", "M").await.unwrap();
  s.set_manager("U2", "M").await.unwrap();
  s.set_manager("U3", "U1").await.unwrap();

  assert_eq!(s.direct_reports("M").await.unwrap(), vec!["U1", "U2"]);
  assert_eq!(s.direct_reports("U1").await.unwrap(), vec!["U3"]);
  assert!(s.direct_reports("nobody").await.unwrap().is_empty());

  s.set_manager("U2", "N").await.unwrap();
  assert_eq!(s.direct_reports("M").await.unwrap(), vec!["U1"]);
}

// ─── Schema & lifecycle ──────────────────────────────────────────────────────

#[tokio::test]
async fn legacy_schema_gains_visibility_column() {
  let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
  conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TABLE kudos (
           id INTEGER PRIMARY KEY AUTOINCREMENT,
           from_user_id TEXT NOT NULL,
           from_user_name TEXT NOT NULL,
           to_user_id TEXT NOT NULL,
           to_user_name TEXT NOT NULL,
           message TEXT NOT NULL,
           channel_id TEXT,
           channel_name TEXT,
           sent_dm BOOLEAN DEFAULT 0,
           sent_channel BOOLEAN DEFAULT 0,
           created_at DATETIME DEFAULT CURRENT_TIMESTAMP
         );
         INSERT INTO kudos (from_user_id, from_user_name, to_user_id, to_user_name, message)
         VALUES ('U1', 'Ann', 'U2', 'Bob', 'written before visibility existed');",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let s = SqliteStore::from_connection(conn).await.unwrap();
  let got = s.list_all(10, None).await.unwrap();
  assert_eq!(got.len(), 1);
  assert_eq!(got[0].visibility, Visibility::Public);

  // Re-applying the schema is a no-op.
  let migrated = s.conn.call(|conn| Ok(crate::schema::apply(conn)?)).await.unwrap();
  assert!(!migrated);
}

#[tokio::test]
async fn reopening_a_file_keeps_records() {
  let path = std::env::temp_dir().join(format!("kudos-store-test-{}.db", std::process::id()));
  let _ = std::fs::remove_file(&path);

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.insert(kudos("U1", "U2")).await.unwrap();
    s.set_manager("U2", "U1").await.unwrap();
    s.close().await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.stats().await.unwrap().total, 1);
  assert_eq!(s.get_manager("U2").await.unwrap().as_deref(), Some("U1"));
  s.close().await.unwrap();

  let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn close_is_idempotent() {
  let s = store().await;
  s.close().await.unwrap();
  s.close().await.unwrap();
  s.clone().close().await.unwrap();
}
