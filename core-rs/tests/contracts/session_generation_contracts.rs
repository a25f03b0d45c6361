// Session Generation Contract Tests
//
// These tests pin the ordering rules of the session store.
// **Problem**: async profile loads finish in any order; a late response from
// an abandoned sign-in can resurrect a session the user already left.
// **Solution**: every transition bumps a generation counter and completions
// carry the generation they started under.

use std::sync::{Arc, Barrier};
use std::thread;
use wms_access::{AccessError, Session, SessionState, SessionStore, UserProfile};

fn session(id: &str, token: &str) -> Session {
    Session::from_profile(UserProfile::new(id, "Gen", "Test"), token)
}

/// WHY: Every applied transition strictly increases the generation
/// REASON: Observers use the generation to tell "new state" from "same state"
/// BREAKS: Route guards redirect twice, or never re-evaluate
#[test]
fn generation_is_monotonic() {
    let store = SessionStore::in_memory();
    let mut last = store.generation();

    let ticket = store.begin_load();
    assert!(store.generation() > last);
    last = store.generation();

    assert!(store.complete(ticket, Ok(session("1", "a"))));
    assert!(store.generation() > last);
    last = store.generation();

    store.sign_out();
    assert!(store.generation() > last);
    last = store.generation();

    store.invalidate();
    assert!(store.generation() > last);
}

/// WHY: A completion under a stale ticket is discarded
/// REASON: Sign-out (or a newer sign-in) happened while the fetch was in flight
/// BREAKS: Signing out during a slow profile fetch signs the user back in
#[test]
fn stale_completion_is_discarded() {
    let store = SessionStore::in_memory();
    let ticket = store.begin_load();

    store.sign_out();
    let applied = store.complete(ticket, Ok(session("1", "late")));

    assert!(!applied);
    assert!(matches!(store.state(), SessionState::Unauthenticated { .. }));
    assert_eq!(store.stored_token().unwrap(), None);
}

/// WHY: Of overlapping loads, the most recently started wins
/// REASON: The user's last sign-in attempt is the one they mean
/// BREAKS: A slow earlier attempt overwrites the account just signed into
#[test]
fn latest_started_load_wins() {
    let store = SessionStore::in_memory();
    let first = store.begin_load();
    let second = store.begin_load();

    assert!(store.complete(second, Ok(session("2", "second"))));
    assert!(!store.complete(first, Ok(session("1", "first"))));

    assert_eq!(store.current_session().unwrap().profile.id, "2");
    assert_eq!(store.bearer_token().as_deref(), Some("second"));
}

/// WHY: Authenticated implies the credential is persisted
/// REASON: A restart must restore exactly the session that was shown
/// BREAKS: Users are signed out on reload, or restored into a stale account
#[test]
fn authenticated_implies_persisted_token() {
    let store = SessionStore::in_memory();
    let ticket = store.begin_load();
    store.complete(ticket, Ok(session("1", "tok-1")));

    assert!(store.has_user());
    assert_eq!(store.stored_token().unwrap().as_deref(), Some("tok-1"));
}

/// WHY: Rejected credentials land in Unauthenticated; other failures in Error
/// REASON: Only a 401 proves the token is bad; a 500 may be transient
/// BREAKS: A backend outage deletes every user's stored credential
#[test]
fn failure_classification() {
    let store = SessionStore::in_memory();
    store.persist_token("keep-me").unwrap();

    let ticket = store.begin_load();
    store.complete(
        ticket,
        Err(AccessError::Api {
            status: 500,
            message: "db down".to_string(),
        }),
    );
    assert_eq!(store.state().error(), Some("db down"));
    assert_eq!(store.stored_token().unwrap().as_deref(), Some("keep-me"));

    let ticket = store.begin_load();
    store.complete(
        ticket,
        Err(AccessError::Api {
            status: 401,
            message: "expired".to_string(),
        }),
    );
    assert!(matches!(store.state(), SessionState::Unauthenticated { .. }));
    assert_eq!(store.stored_token().unwrap(), None);
}

/// WHY: After sign-out no credential remains, whatever order a pending load lands in
/// REASON: The token is cleared in the same critical section as the generation bump
/// BREAKS: Requests after sign-out still carry the signed-out user's bearer token
#[test]
fn sign_out_clears_credential_in_every_ordering() {
    // Load lands first, then sign-out
    let store = SessionStore::in_memory();
    let ticket = store.begin_load();
    store.complete(ticket, Ok(session("1", "early")));
    store.sign_out();
    assert_eq!(store.stored_token().unwrap(), None);
    assert_eq!(store.bearer_token(), None);

    // Sign-out first, then the load lands
    let store = SessionStore::in_memory();
    let ticket = store.begin_load();
    store.sign_out();
    store.complete(ticket, Ok(session("1", "late")));
    assert_eq!(store.stored_token().unwrap(), None);
    assert_eq!(store.bearer_token(), None);

    // Racing on two threads
    for _ in 0..200 {
        let store = Arc::new(SessionStore::in_memory());
        let ticket = store.begin_load();
        let barrier = Arc::new(Barrier::new(2));

        let loader = {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                store.complete(ticket, Ok(session("1", "raced")));
            })
        };
        barrier.wait();
        store.sign_out();
        loader.join().unwrap();

        assert!(!store.has_user());
        assert_eq!(store.stored_token().unwrap(), None);
        assert_eq!(store.bearer_token(), None);
    }
}

/// WHY: A 401 for a replaced credential does not touch the newer session
/// REASON: Rejections are results of the request's own generation; stale ones are discarded
/// BREAKS: A slow request from a previous login signs the current user out
#[test]
fn stale_rejection_keeps_newer_session() {
    let store = SessionStore::in_memory();
    let ticket = store.begin_load();
    store.complete(ticket, Ok(session("1", "old")));

    store.sign_out();
    let ticket = store.begin_load();
    store.complete(ticket, Ok(session("2", "new")));

    assert!(!store.invalidate_token("old"));
    assert_eq!(store.current_session().unwrap().profile.id, "2");
    assert_eq!(store.stored_token().unwrap().as_deref(), Some("new"));

    assert!(store.invalidate_token("new"));
    assert!(!store.has_user());
    assert_eq!(store.stored_token().unwrap(), None);
}
