//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use santuario_core::{
  content::{ContentSnapshot, Meditation, Philosopher, Reading},
  document::{SectionKind, ritual_block},
  journal::{ChallengeStatus, JournalEntry, Mood},
  store::{EntryQuery, SantuarioStore},
  xp::Interaction,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, d).unwrap() }

fn snapshot() -> ContentSnapshot {
  ContentSnapshot {
    readings: vec![
      Reading {
        title: "Sobre la brevedad".into(),
        quote: "No es que tengamos poco tiempo.".into(),
        author: Some("Séneca".into()),
        ..Default::default()
      },
      Reading {
        title: "Dicotomía".into(),
        quote: "Algunas cosas dependen de nosotros.".into(),
        author: Some("Epicteto".into()),
        tags: vec!["control".into()],
        ..Default::default()
      },
    ],
    philosophers: vec![Philosopher {
      name: "Lucio Anneo Séneca".into(),
      key_ideas: vec!["tiempo".into()],
      ..Default::default()
    }],
    meditations: vec![Meditation {
      title: "Vista desde arriba".into(),
      duration_minutes: Some(10),
      ..Default::default()
    }],
    ..Default::default()
  }
}

// ─── Content ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_has_empty_snapshot() {
  let s = store().await;
  assert!(s.content_snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn import_round_trips_in_order() {
  let s = store().await;
  let summary = s.import_content(snapshot()).await.unwrap();
  assert_eq!(summary.readings, 2);
  assert_eq!(summary.philosophers, 1);
  assert_eq!(summary.tasks, 0);

  let loaded = s.content_snapshot().await.unwrap();
  assert_eq!(loaded, snapshot());
  assert_eq!(loaded.readings[1].title, "Dicotomía");
}

#[tokio::test]
async fn import_replaces_previous_content() {
  let s = store().await;
  s.import_content(snapshot()).await.unwrap();

  let smaller = ContentSnapshot {
    readings: vec![snapshot().readings[1].clone()],
    ..Default::default()
  };
  s.import_content(smaller.clone()).await.unwrap();

  assert_eq!(s.content_snapshot().await.unwrap(), smaller);
}

// ─── User settings ───────────────────────────────────────────────────────────

#[tokio::test]
async fn salt_defaults_to_none_and_can_be_replaced() {
  let s = store().await;
  assert!(s.user_salt("marco").await.unwrap().is_none());

  s.set_user_salt("marco", "a".into()).await.unwrap();
  s.set_user_salt("marco", "b".into()).await.unwrap();
  assert_eq!(s.user_salt("marco").await.unwrap().as_deref(), Some("b"));
  assert!(s.user_salt("lucilio").await.unwrap().is_none());
}

// ─── Journal ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_entry_returns_none() {
  let s = store().await;
  assert!(s.get_entry("marco", day(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_then_get_preserves_fields() {
  let s = store().await;

  let mut entry = JournalEntry::new("marco", day(15));
  entry.apply_fragment(
    &ritual_block(SectionKind::Morning, "<p>Intención</p>"),
    SectionKind::Morning,
  );
  entry.mood = Mood::new(4).unwrap();
  entry.question_response = Some("La paciencia".into());
  entry.set_challenge(Some("Ducha fría".into()), Some(ChallengeStatus::Success));

  let saved = s.upsert_entry(entry.clone()).await.unwrap();
  assert!(saved.updated_at > entry.updated_at);

  let fetched = s.get_entry("marco", day(15)).await.unwrap().unwrap();
  assert_eq!(fetched.text, entry.text);
  assert_eq!(fetched.mood.value(), 4);
  assert_eq!(fetched.question_response.as_deref(), Some("La paciencia"));
  assert_eq!(fetched.challenge_status, Some(ChallengeStatus::Success));
  assert!(fetched.challenge_completed);
  assert_eq!(fetched.updated_at, saved.updated_at);
}

#[tokio::test]
async fn upsert_overwrites_same_day() {
  let s = store().await;

  let mut first = JournalEntry::new("marco", day(2));
  first.text = "uno".into();
  s.upsert_entry(first).await.unwrap();

  let mut second = JournalEntry::new("marco", day(2));
  second.text = "dos".into();
  second.mood = Mood::new(2).unwrap();
  s.upsert_entry(second).await.unwrap();

  let all = s.list_entries("marco", &EntryQuery::default()).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].text, "dos");
  assert_eq!(all[0].mood.value(), 2);
}

#[tokio::test]
async fn conditional_replace_rejects_the_second_of_two_writers() {
  let s = store().await;
  let v1 = s.upsert_entry(JournalEntry::new("marco", day(4))).await.unwrap();

  let mut first = v1.clone();
  first.text = "primero".into();
  let mut second = v1.clone();
  second.text = "segundo".into();

  let landed = s
    .replace_entry_if(first, v1.updated_at)
    .await
    .unwrap()
    .expect("first writer holds the current version");
  assert!(landed.updated_at > v1.updated_at);
  assert!(s.replace_entry_if(second, v1.updated_at).await.unwrap().is_none());

  let stored = s.get_entry("marco", day(4)).await.unwrap().unwrap();
  assert_eq!(stored.text, "primero");
  assert_eq!(stored.updated_at, landed.updated_at);

  // A version read back from the store matches again.
  let mut third = stored.clone();
  third.mood = Mood::new(2).unwrap();
  assert!(s.replace_entry_if(third, stored.updated_at).await.unwrap().is_some());
}

#[tokio::test]
async fn conditional_replace_needs_an_existing_entry() {
  let s = store().await;
  let entry = JournalEntry::new("marco", day(5));
  let at = entry.updated_at;
  assert!(s.replace_entry_if(entry, at).await.unwrap().is_none());
  assert!(s.get_entry("marco", day(5)).await.unwrap().is_none());
}

#[tokio::test]
async fn entries_are_scoped_per_user() {
  let s = store().await;
  s.upsert_entry(JournalEntry::new("marco", day(3))).await.unwrap();
  s.upsert_entry(JournalEntry::new("lucilio", day(3))).await.unwrap();

  let marco = s.list_entries("marco", &EntryQuery::default()).await.unwrap();
  assert_eq!(marco.len(), 1);
  assert_eq!(marco[0].user_id, "marco");
}

#[tokio::test]
async fn list_is_newest_first_with_bounds_and_paging() {
  let s = store().await;
  for d in 1..=5 {
    s.upsert_entry(JournalEntry::new("marco", day(d))).await.unwrap();
  }

  let all = s.list_entries("marco", &EntryQuery::default()).await.unwrap();
  let dates: Vec<_> = all.iter().map(|e| e.date).collect();
  assert_eq!(dates, vec![day(5), day(4), day(3), day(2), day(1)]);

  let bounded = s
    .list_entries("marco", &EntryQuery {
      from: Some(day(2)),
      to: Some(day(4)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(bounded.len(), 3);
  assert_eq!(bounded[0].date, day(4));

  let page = s
    .list_entries("marco", &EntryQuery {
      limit: Some(2),
      offset: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();
  let dates: Vec<_> = page.iter().map(|e| e.date).collect();
  assert_eq!(dates, vec![day(4), day(3)]);
}

#[tokio::test]
async fn clear_entries_removes_only_that_user() {
  let s = store().await;
  s.upsert_entry(JournalEntry::new("marco", day(1))).await.unwrap();
  s.upsert_entry(JournalEntry::new("marco", day(2))).await.unwrap();
  s.upsert_entry(JournalEntry::new("lucilio", day(1))).await.unwrap();

  assert_eq!(s.clear_entries("marco").await.unwrap(), 2);
  assert!(s.get_entry("marco", day(1)).await.unwrap().is_none());
  assert!(s.get_entry("lucilio", day(1)).await.unwrap().is_some());
  assert_eq!(s.clear_entries("marco").await.unwrap(), 0);
}

// ─── XP ledger ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn award_is_once_per_day_per_interaction() {
  let s = store().await;

  let first = s
    .award_xp("marco", day(1), Interaction::MorningRitual)
    .await
    .unwrap();
  let award = first.expect("first award");
  assert_eq!(award.xp, 20);
  assert_eq!(award.interaction, Interaction::MorningRitual);

  let again = s
    .award_xp("marco", day(1), Interaction::MorningRitual)
    .await
    .unwrap();
  assert!(again.is_none());

  s.award_xp("marco", day(2), Interaction::MorningRitual)
    .await
    .unwrap()
    .expect("next day awards again");
  s.award_xp("marco", day(1), Interaction::MoodLogged)
    .await
    .unwrap()
    .expect("different interaction awards");

  assert_eq!(s.xp_total("marco").await.unwrap(), 20 + 20 + 5);
}

#[tokio::test]
async fn xp_total_is_zero_for_new_user() {
  let s = store().await;
  assert_eq!(s.xp_total("nadie").await.unwrap(), 0);
}

#[tokio::test]
async fn clearing_entries_keeps_xp() {
  let s = store().await;
  s.upsert_entry(JournalEntry::new("marco", day(1))).await.unwrap();
  s.award_xp("marco", day(1), Interaction::FreeWriting)
    .await
    .unwrap();

  s.clear_entries("marco").await.unwrap();
  assert_eq!(s.xp_total("marco").await.unwrap(), 10);
}

#[tokio::test]
async fn open_on_disk_persists_across_reopen() {
  let dir = std::env::temp_dir().join(format!("santuario-{}", uuid::Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("store.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.set_user_salt("marco", "x".into()).await.unwrap();
  }
  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.user_salt("marco").await.unwrap().as_deref(), Some("x"));

  let _ = std::fs::remove_dir_all(&dir);
}
