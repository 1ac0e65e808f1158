//! Unit tests for the BookmarkViewModel: loading, optimistic mutations,
//! confirmation/rollback and merging of change-feed events.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::rstest;

use vault::managers::bookmark_view_model::{BookmarkViewModel, BookmarkViewModelTrait, RemoteOutcome};
use vault::managers::pending_mutation::{StoreRequest, StoreResponse};
use vault::types::bookmark::{Bookmark, RecordId};
use vault::types::change::ChangeEvent;
use vault::types::errors::{BookmarkError, StoreError};
use vault::types::settings::SyncStrategy;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

fn bm(id: &str, title: &str, url: &str, created_at: DateTime<Utc>) -> Bookmark {
    Bookmark {
        id: RecordId::from(id),
        title: title.to_string(),
        url: url.to_string(),
        created_at,
    }
}

/// The record a store would return for a confirmed insert.
fn stored(id: &str, title: &str, url: &str) -> Bookmark {
    bm(id, title, url, at(20, 12))
}

fn loaded(strategy: SyncStrategy) -> BookmarkViewModel {
    let mut vm = BookmarkViewModel::new(strategy);
    vm.load(vec![
        bm("1", "One", "https://one.com", at(1, 0)),
        bm("2", "Two", "https://two.com", at(2, 0)),
        bm("3", "Three", "https://three.com", at(3, 0)),
    ]);
    vm
}

fn ids(vm: &BookmarkViewModel) -> Vec<String> {
    vm.bookmarks().iter().map(|b| b.id.to_string()).collect()
}

// === Loading ===

#[test]
fn test_load_orders_newest_first() {
    let vm = loaded(SyncStrategy::Optimistic);
    assert_eq!(ids(&vm), vec!["3", "2", "1"]);
}

#[test]
fn test_load_drops_repeated_ids() {
    let mut vm = BookmarkViewModel::default();
    vm.load(vec![
        bm("7", "First", "https://a.com", at(1, 0)),
        bm("7", "Second", "https://b.com", at(2, 0)),
    ]);
    assert_eq!(vm.len(), 1);
    assert_eq!(vm.bookmarks()[0].title, "First");
}

#[test]
fn test_load_normalizes_numeric_and_string_ids() {
    let mut vm = BookmarkViewModel::default();
    vm.load(vec![bm("5", "Five", "https://five.com", at(1, 0))]);
    let outcome = vm.apply_remote_event(ChangeEvent::Insert(Bookmark {
        id: RecordId::from(5_i64),
        ..bm("5", "Five", "https://five.com", at(1, 0))
    }));
    assert_eq!(outcome, RemoteOutcome::Ignored);
    assert_eq!(vm.len(), 1);
}

// === Create ===

#[test]
fn test_optimistic_create_shows_placeholder_first() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_create(" Rust ", "rust-lang.org", at(20, 11)).unwrap();

    let placeholder = ticket.optimistic.clone().unwrap();
    assert!(placeholder.is_placeholder());
    assert_eq!(vm.bookmarks()[0], placeholder);
    assert_eq!(vm.len(), 4);
    match ticket.request {
        StoreRequest::Insert(draft) => {
            assert_eq!(draft.title, "Rust");
            assert_eq!(draft.url, "https://rust-lang.org");
        }
        other => panic!("unexpected request {:?}", other),
    }
}

#[rstest]
#[case("", "example.com")]
#[case("Title", "   ")]
fn test_invalid_create_changes_nothing(#[case] title: &str, #[case] url: &str) {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let before = vm.bookmarks().to_vec();

    let err = vm.begin_create(title, url, at(20, 11)).unwrap_err();

    assert!(matches!(err, BookmarkError::Validation(_)));
    assert_eq!(vm.bookmarks(), before.as_slice());
    assert!(vm.pending().is_empty());
}

#[test]
fn test_confirm_replaces_placeholder_in_place() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();
    let record = stored("99", "Rust", "https://rust-lang.org");

    let confirmed = vm
        .resolve(ticket.mutation, Ok(StoreResponse::Inserted(record.clone())))
        .unwrap();

    assert_eq!(confirmed, Some(record.clone()));
    assert_eq!(vm.bookmarks()[0], record);
    assert_eq!(vm.len(), 4);
    assert!(vm.bookmarks().iter().all(|b| !b.is_placeholder()));
    assert!(vm.pending().is_empty());
}

#[test]
fn test_feed_insert_then_confirm_yields_one_entry() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();
    let record = stored("99", "Rust", "https://rust-lang.org");

    let outcome = vm.apply_remote_event(ChangeEvent::Insert(record.clone()));
    assert_eq!(outcome, RemoteOutcome::Adopted(ticket.mutation));
    vm.resolve(ticket.mutation, Ok(StoreResponse::Inserted(record.clone())))
        .unwrap();

    assert_eq!(vm.len(), 4);
    assert_eq!(vm.bookmarks().iter().filter(|b| b.id == record.id).count(), 1);
    assert!(vm.bookmarks().iter().all(|b| !b.is_placeholder()));
}

#[test]
fn test_confirm_then_feed_insert_yields_one_entry() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();
    let record = stored("99", "Rust", "https://rust-lang.org");

    vm.resolve(ticket.mutation, Ok(StoreResponse::Inserted(record.clone())))
        .unwrap();
    let outcome = vm.apply_remote_event(ChangeEvent::Insert(record));

    assert_eq!(outcome, RemoteOutcome::Ignored);
    assert_eq!(vm.len(), 4);
}

#[test]
fn test_rejected_create_removes_placeholder() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();

    let err = vm
        .resolve(ticket.mutation, Err(StoreError::Rejected("quota exceeded".to_string())))
        .unwrap_err();

    assert_eq!(err.to_string(), "quota exceeded");
    assert_eq!(ids(&vm), vec!["3", "2", "1"]);
    assert!(vm.pending().is_empty());
}

#[test]
fn test_identical_creates_adopt_oldest_placeholder_first() {
    let mut vm = BookmarkViewModel::default();
    let first = vm.begin_create("Same", "same.com", at(20, 10)).unwrap();
    let second = vm.begin_create("Same", "same.com", at(20, 11)).unwrap();

    let outcome = vm.apply_remote_event(ChangeEvent::Insert(stored("a", "Same", "https://same.com")));
    assert_eq!(outcome, RemoteOutcome::Adopted(first.mutation));

    let outcome = vm.apply_remote_event(ChangeEvent::Insert(stored("b", "Same", "https://same.com")));
    assert_eq!(outcome, RemoteOutcome::Adopted(second.mutation));

    vm.resolve(first.mutation, Ok(StoreResponse::Inserted(stored("a", "Same", "https://same.com"))))
        .unwrap();
    vm.resolve(second.mutation, Ok(StoreResponse::Inserted(stored("b", "Same", "https://same.com"))))
        .unwrap();
    assert_eq!(vm.len(), 2);
    assert!(vm.bookmarks().iter().all(|b| !b.is_placeholder()));
}

#[test]
fn test_pessimistic_create_waits_for_confirmation() {
    let mut vm = loaded(SyncStrategy::Pessimistic);
    let ticket = vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();
    assert!(ticket.optimistic.is_none());
    assert_eq!(vm.len(), 3);

    let record = stored("99", "Rust", "https://rust-lang.org");
    vm.resolve(ticket.mutation, Ok(StoreResponse::Inserted(record.clone())))
        .unwrap();

    assert_eq!(vm.bookmarks()[0], record);
    assert_eq!(vm.len(), 4);
}

#[test]
fn test_pessimistic_feed_first_then_confirm_yields_one_entry() {
    let mut vm = loaded(SyncStrategy::Pessimistic);
    let ticket = vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();
    let record = stored("99", "Rust", "https://rust-lang.org");

    assert_eq!(
        vm.apply_remote_event(ChangeEvent::Insert(record.clone())),
        RemoteOutcome::Applied
    );
    vm.resolve(ticket.mutation, Ok(StoreResponse::Inserted(record)))
        .unwrap();

    assert_eq!(vm.len(), 4);
}

// === Update ===

#[test]
fn test_update_applies_before_confirmation() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let id = RecordId::from("2");
    let ticket = vm.begin_update(&id, "Deux", "two.fr").unwrap();

    let entry = vm.get(&id).unwrap();
    assert_eq!(entry.title, "Deux");
    assert_eq!(entry.url, "https://two.fr");
    assert_eq!(entry.created_at, at(2, 0));
    assert!(matches!(ticket.request, StoreRequest::Update(ref target, _) if target == &id));
}

#[test]
fn test_rejected_update_restores_snapshot() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let before = vm.bookmarks().to_vec();
    let ticket = vm.begin_update(&RecordId::from("2"), "Deux", "two.fr").unwrap();

    let err = vm
        .resolve(ticket.mutation, Err(StoreError::Unavailable("offline".to_string())))
        .unwrap_err();

    assert_eq!(err, BookmarkError::StoreUnavailable("offline".to_string()));
    assert_eq!(vm.bookmarks(), before.as_slice());
}

#[test]
fn test_stale_rollback_keeps_newer_remote_update() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let id = RecordId::from("2");
    let ticket = vm.begin_update(&id, "Deux", "two.fr").unwrap();

    let remote = bm("2", "Dos", "https://two.es", at(2, 0));
    assert_eq!(
        vm.apply_remote_event(ChangeEvent::Update(remote.clone())),
        RemoteOutcome::Applied
    );
    let _ = vm.resolve(ticket.mutation, Err(StoreError::Rejected("conflict".to_string())));

    assert_eq!(vm.get(&id), Some(&remote));
}

#[test]
fn test_rollback_does_not_resurrect_remotely_deleted_row() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let id = RecordId::from("2");
    let ticket = vm.begin_update(&id, "Deux", "two.fr").unwrap();

    vm.apply_remote_event(ChangeEvent::Delete(id.clone()));
    let _ = vm.resolve(ticket.mutation, Err(StoreError::Rejected("gone".to_string())));

    assert!(vm.get(&id).is_none());
    assert_eq!(vm.len(), 2);
}

#[test]
fn test_successive_updates_roll_back_to_last_confirmed_value() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let id = RecordId::from("1");
    let first = vm.begin_update(&id, "Uno", "one.it").unwrap();
    let second = vm.begin_update(&id, "Ein", "one.de").unwrap();

    let confirmed = bm("1", "Uno", "https://one.it", at(1, 0));
    vm.resolve(first.mutation, Ok(StoreResponse::Updated(confirmed.clone())))
        .unwrap();
    let _ = vm.resolve(second.mutation, Err(StoreError::Rejected("no".to_string())));

    assert_eq!(vm.get(&id), Some(&confirmed));
}

#[rstest]
#[case("missing")]
fn test_update_unknown_id_is_not_found(#[case] id: &str) {
    let mut vm = loaded(SyncStrategy::Optimistic);
    assert_eq!(
        vm.begin_update(&RecordId::from(id), "T", "t.com"),
        Err(BookmarkError::NotFound(id.to_string()))
    );
}

#[test]
fn test_placeholders_cannot_be_edited() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();
    let placeholder = ticket.optimistic.unwrap().id;

    assert!(matches!(
        vm.begin_update(&placeholder, "Rusty", "rust-lang.org"),
        Err(BookmarkError::Pending(_))
    ));
    assert!(matches!(vm.begin_delete(&placeholder), Err(BookmarkError::Pending(_))));
}

// === Delete ===

#[test]
fn test_delete_removes_optimistically() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_delete(&RecordId::from("2")).unwrap();

    assert_eq!(ids(&vm), vec!["3", "1"]);
    vm.resolve(ticket.mutation, Ok(StoreResponse::Deleted)).unwrap();
    assert_eq!(ids(&vm), vec!["3", "1"]);
}

#[test]
fn test_rejected_delete_restores_original_position() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let before = vm.bookmarks().to_vec();
    let ticket = vm.begin_delete(&RecordId::from("2")).unwrap();

    let _ = vm.resolve(ticket.mutation, Err(StoreError::Rejected("locked".to_string())));

    assert_eq!(vm.bookmarks(), before.as_slice());
}

#[test]
fn test_pessimistic_delete_keeps_entry_until_confirmed() {
    let mut vm = loaded(SyncStrategy::Pessimistic);
    let id = RecordId::from("2");
    let ticket = vm.begin_delete(&id).unwrap();
    assert!(vm.get(&id).is_some());

    vm.resolve(ticket.mutation, Ok(StoreResponse::Deleted)).unwrap();
    assert!(vm.get(&id).is_none());
}

#[test]
fn test_second_delete_of_same_row_is_pending() {
    let mut vm = loaded(SyncStrategy::Pessimistic);
    let id = RecordId::from("2");
    vm.begin_delete(&id).unwrap();
    assert_eq!(vm.begin_delete(&id), Err(BookmarkError::Pending("2".to_string())));
}

#[test]
fn test_row_with_delete_in_flight_cannot_be_updated() {
    let mut vm = loaded(SyncStrategy::Pessimistic);
    let id = RecordId::from("2");
    vm.begin_delete(&id).unwrap();
    assert_eq!(
        vm.begin_update(&id, "Deux", "two.fr"),
        Err(BookmarkError::Pending("2".to_string()))
    );
    assert!(vm.begin_update(&RecordId::from("1"), "Uno", "one.it").is_ok());
}

#[test]
fn test_late_insert_does_not_resurrect_deleted_row() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let id = RecordId::from("2");
    let ticket = vm.begin_delete(&id).unwrap();
    vm.resolve(ticket.mutation, Ok(StoreResponse::Deleted)).unwrap();

    let outcome = vm.apply_remote_event(ChangeEvent::Insert(bm("2", "Two", "https://two.com", at(2, 0))));

    assert_eq!(outcome, RemoteOutcome::Ignored);
    assert!(vm.get(&id).is_none());
}

#[test]
fn test_rejected_delete_restores_remote_edit() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_delete(&RecordId::from("2")).unwrap();

    let edited = bm("2", "Two (edited)", "https://two.com", at(2, 0));
    vm.apply_remote_event(ChangeEvent::Update(edited.clone()));
    let _ = vm.resolve(ticket.mutation, Err(StoreError::Rejected("locked".to_string())));

    assert_eq!(vm.get(&RecordId::from("2")), Some(&edited));
}

// === Remote events ===

#[test]
fn test_remote_insert_is_idempotent() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let record = stored("42", "Remote", "https://remote.com");

    assert_eq!(vm.apply_remote_event(ChangeEvent::Insert(record.clone())), RemoteOutcome::Applied);
    assert_eq!(vm.apply_remote_event(ChangeEvent::Insert(record.clone())), RemoteOutcome::Ignored);
    assert_eq!(vm.bookmarks()[0], record);
    assert_eq!(vm.len(), 4);
}

#[test]
fn test_remote_update_of_unknown_row_is_ignored() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let before = vm.bookmarks().to_vec();
    let outcome = vm.apply_remote_event(ChangeEvent::Update(stored("404", "Ghost", "https://ghost.io")));
    assert_eq!(outcome, RemoteOutcome::Ignored);
    assert_eq!(vm.bookmarks(), before.as_slice());
}

#[test]
fn test_remote_update_replaces_in_place() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let updated = bm("2", "Zwei", "https://two.de", at(2, 0));
    vm.apply_remote_event(ChangeEvent::Update(updated.clone()));
    assert_eq!(vm.bookmarks()[1], updated);
}

#[test]
fn test_remote_delete_of_absent_row_is_noop() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    assert_eq!(
        vm.apply_remote_event(ChangeEvent::Delete(RecordId::from("404"))),
        RemoteOutcome::Ignored
    );
    assert_eq!(vm.len(), 3);
}

// === Reload with pending work ===

#[test]
fn test_reload_keeps_pending_changes_visible() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let create = vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();
    vm.begin_update(&RecordId::from("1"), "Uno", "one.it").unwrap();
    vm.begin_delete(&RecordId::from("3")).unwrap();

    vm.load(vec![
        bm("1", "One", "https://one.com", at(1, 0)),
        bm("2", "Two", "https://two.com", at(2, 0)),
        bm("3", "Three", "https://three.com", at(3, 0)),
    ]);

    let placeholder = create.optimistic.unwrap().id;
    assert_eq!(vm.bookmarks()[0].id, placeholder);
    assert_eq!(vm.bookmarks()[0].created_at, at(20, 11));
    assert_eq!(vm.get(&RecordId::from("1")).map(|b| b.title.as_str()), Some("Uno"));
    assert!(vm.get(&RecordId::from("3")).is_none());
    assert_eq!(vm.len(), 3);
}

#[test]
fn test_placeholder_keeps_its_timestamp_across_reloads() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();
    let snapshot = vm.bookmarks()[1..].to_vec();

    vm.load(snapshot.clone());
    vm.load(snapshot);

    assert_eq!(vm.bookmarks()[0].created_at, at(20, 11));
}

#[test]
fn test_stale_reload_keeps_remote_insert_applied_meanwhile() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let snapshot = vm.bookmarks().to_vec();

    let epoch = vm.begin_reload();
    vm.apply_remote_event(ChangeEvent::Insert(stored("9", "Remote", "https://remote.com")));
    vm.finish_reload(epoch, snapshot);

    assert_eq!(ids(&vm), vec!["9", "3", "2", "1"]);
}

#[test]
fn test_stale_reload_keeps_create_confirmed_meanwhile() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let snapshot = vm.bookmarks().to_vec();

    let epoch = vm.begin_reload();
    let ticket = vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();
    let record = stored("10", "Rust", "https://rust-lang.org");
    vm.resolve(ticket.mutation, Ok(StoreResponse::Inserted(record.clone()))).unwrap();
    vm.finish_reload(epoch, snapshot);

    assert_eq!(vm.get(&record.id), Some(&record));
    assert!(vm.bookmarks().iter().all(|b| !b.is_placeholder()));
    assert_eq!(vm.len(), 4);
}

#[test]
fn test_stale_reload_applies_updates_and_deletes_made_meanwhile() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let snapshot = vm.bookmarks().to_vec();

    let epoch = vm.begin_reload();
    vm.apply_remote_event(ChangeEvent::Update(bm("1", "Uno", "https://one.it", at(1, 0))));
    let ticket = vm.begin_delete(&RecordId::from("2")).unwrap();
    vm.resolve(ticket.mutation, Ok(StoreResponse::Deleted)).unwrap();
    vm.finish_reload(epoch, snapshot);

    assert_eq!(ids(&vm), vec!["3", "1"]);
    assert_eq!(vm.get(&RecordId::from("1")).map(|b| b.title.as_str()), Some("Uno"));
}

#[test]
fn test_overlapping_reloads_each_replay_their_own_window() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let before_both = vm.bookmarks().to_vec();

    let first = vm.begin_reload();
    vm.apply_remote_event(ChangeEvent::Insert(stored("8", "Early", "https://early.com")));
    let second = vm.begin_reload();
    let between = vm.bookmarks().to_vec();
    vm.apply_remote_event(ChangeEvent::Insert(stored("9", "Late", "https://late.com")));

    vm.finish_reload(first, before_both);
    assert_eq!(vm.len(), 5);
    vm.finish_reload(second, between);
    assert_eq!(vm.len(), 5);
    assert!(vm.get(&RecordId::from("8")).is_some());
    assert!(vm.get(&RecordId::from("9")).is_some());
}

#[test]
fn test_failed_reload_leaves_collection_alone() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let epoch = vm.begin_reload();
    vm.apply_remote_event(ChangeEvent::Delete(RecordId::from("3")));
    vm.abandon_reload(epoch);
    assert_eq!(ids(&vm), vec!["2", "1"]);
}

#[test]
fn test_reload_forgets_tombstones_of_rows_gone_from_store() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    vm.apply_remote_event(ChangeEvent::Delete(RecordId::from("3")));
    vm.apply_remote_event(ChangeEvent::Delete(RecordId::from("2")));
    assert_eq!(vm.tombstone_count(), 2);

    let epoch = vm.begin_reload();
    vm.finish_reload(epoch, vec![bm("1", "One", "https://one.com", at(1, 0))]);

    assert_eq!(vm.tombstone_count(), 0);
    assert_eq!(ids(&vm), vec!["1"]);
}

#[test]
fn test_reload_keeps_tombstones_while_mutations_are_pending() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    vm.apply_remote_event(ChangeEvent::Delete(RecordId::from("3")));
    vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();

    vm.load(vec![bm("1", "One", "https://one.com", at(1, 0))]);

    assert_eq!(vm.tombstone_count(), 1);
}

// === Disposal and stray answers ===

#[test]
fn test_disposed_model_ignores_answers_and_events() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_create("Rust", "rust-lang.org", at(20, 11)).unwrap();
    let before = vm.bookmarks().to_vec();
    vm.dispose();

    assert_eq!(
        vm.resolve(ticket.mutation, Ok(StoreResponse::Inserted(stored("9", "Rust", "https://rust-lang.org")))),
        Err(BookmarkError::SessionClosed)
    );
    assert_eq!(
        vm.apply_remote_event(ChangeEvent::Delete(RecordId::from("1"))),
        RemoteOutcome::Ignored
    );
    assert_eq!(vm.bookmarks(), before.as_slice());
}

#[test]
fn test_answer_for_settled_mutation_is_ignored() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_delete(&RecordId::from("1")).unwrap();
    vm.resolve(ticket.mutation, Ok(StoreResponse::Deleted)).unwrap();

    assert_eq!(vm.resolve(ticket.mutation, Ok(StoreResponse::Deleted)), Ok(None));
}

#[test]
fn test_mismatched_response_rolls_back() {
    let mut vm = loaded(SyncStrategy::Optimistic);
    let ticket = vm.begin_delete(&RecordId::from("1")).unwrap();

    let result = vm.resolve(ticket.mutation, Ok(StoreResponse::Updated(stored("1", "x", "https://x.com"))));

    assert!(matches!(result, Err(BookmarkError::StoreRejected(_))));
    assert_eq!(ids(&vm), vec!["3", "2", "1"]);
}

// === Derived views ===

#[test]
fn test_filter_matches_title_or_url_case_insensitively() {
    let vm = loaded(SyncStrategy::Optimistic);
    let shown: Vec<_> = vm.filter("TWO").into_iter().map(|b| b.id.to_string()).collect();
    assert_eq!(shown, vec!["2"]);
    let shown: Vec<_> = vm.filter("three.COM").into_iter().map(|b| b.id.to_string()).collect();
    assert_eq!(shown, vec!["3"]);
    assert_eq!(vm.filter("").len(), 3);
}

#[test]
fn test_stats_count_domains_and_today() {
    let mut vm = BookmarkViewModel::default();
    let now = at(10, 15);
    vm.load(vec![
        bm("1", "A", "https://www.example.com/a", now - Duration::hours(2)),
        bm("2", "B", "https://example.com/b", now - Duration::days(3)),
        bm("3", "C", "https://exa mple", now - Duration::hours(1)),
    ]);

    let stats = vm.stats(&now);

    assert_eq!(stats.total, 3);
    assert_eq!(stats.domain_count(), 2);
    assert!(stats.domains.contains("example.com"));
    assert!(stats.domains.contains("invalid"));
    assert_eq!(stats.today, 2);
}
