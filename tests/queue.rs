//! Queue item lifecycle and cancellation token tests.

use framezip::{CancellationToken, FramezipError, ItemStatus, QueueItem, SourceVideo};

fn item() -> QueueItem {
    QueueItem::new(SourceVideo::new("clip.mp4", 2048, "/videos/clip.mp4"))
}

// ── ItemStatus ───────────────────────────────────────────────

#[test]
fn only_forward_transitions_are_allowed() {
    use ItemStatus::*;

    let all = [Pending, Processing, Done, Error];
    let allowed = [(Pending, Processing), (Processing, Done), (Processing, Error)];
    for from in all {
        for to in all {
            assert_eq!(
                from.can_transition_to(to),
                allowed.contains(&(from, to)),
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn terminal_statuses() {
    assert!(!ItemStatus::Pending.is_terminal());
    assert!(!ItemStatus::Processing.is_terminal());
    assert!(ItemStatus::Done.is_terminal());
    assert!(ItemStatus::Error.is_terminal());
}

#[test]
fn status_display_is_lowercase() {
    assert_eq!(ItemStatus::Processing.to_string(), "processing");
    assert_eq!(ItemStatus::Error.to_string(), "error");
}

// ── QueueItem ────────────────────────────────────────────────

#[test]
fn new_item_is_pending_without_error() {
    let item = item();
    assert_eq!(item.status(), ItemStatus::Pending);
    assert_eq!(item.error(), None);
    assert_eq!(item.source.name, "clip.mp4");
}

#[test]
fn successful_lifecycle() {
    let mut item = item();
    item.start().unwrap();
    assert_eq!(item.status(), ItemStatus::Processing);
    item.complete().unwrap();
    assert_eq!(item.status(), ItemStatus::Done);
    assert_eq!(item.error(), None);
}

#[test]
fn failure_records_the_message() {
    let mut item = item();
    item.start().unwrap();
    item.fail("no video stream").unwrap();
    assert_eq!(item.status(), ItemStatus::Error);
    assert_eq!(item.error(), Some("no video stream"));
}

#[test]
fn pending_item_cannot_finish() {
    let mut item = item();
    let result = item.complete();
    assert!(matches!(
        result,
        Err(FramezipError::InvalidTransition {
            from: ItemStatus::Pending,
            to: ItemStatus::Done,
        })
    ));
    assert!(item.fail("boom").is_err());
    assert_eq!(item.status(), ItemStatus::Pending);
    assert_eq!(item.error(), None);
}

#[test]
fn finished_item_cannot_restart() {
    let mut item = item();
    item.start().unwrap();
    item.complete().unwrap();

    assert!(item.start().is_err());
    assert!(item.fail("late failure").is_err());
    assert_eq!(item.status(), ItemStatus::Done);
    assert_eq!(item.error(), None);
}

#[test]
fn item_cannot_start_twice() {
    let mut item = item();
    item.start().unwrap();
    let error = item.start().unwrap_err();
    assert!(error.to_string().contains("processing"));
}

// ── CancellationToken ────────────────────────────────────────

#[test]
fn token_starts_uncancelled() {
    assert!(!CancellationToken::new().is_cancelled());
    assert!(!CancellationToken::default().is_cancelled());
}

#[test]
fn cancel_is_shared_between_clones_and_idempotent() {
    let token = CancellationToken::new();
    let clone = token.clone();
    clone.cancel();
    clone.cancel();
    assert!(token.is_cancelled());
    assert!(clone.is_cancelled());
}

#[test]
fn cancel_from_another_thread() {
    let token = CancellationToken::new();
    let remote = token.clone();
    std::thread::spawn(move || remote.cancel()).join().unwrap();
    assert!(token.is_cancelled());
}
