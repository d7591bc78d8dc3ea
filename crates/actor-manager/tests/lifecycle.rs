//! Actor lifecycle on a single instance: create, store, get, rename,
//! delete, choose and unchoose, plus initialization and expiry.
#![allow(clippy::unwrap_used)]

mod common;

use actor_core::effects::{StorageEffects, TtlPolicy};
use actor_core::{Actor, ActorError, ActorEvent, ActorUri, Result, RootSecret};
use actor_effects::GatedStorageAccess;
use actor_manager::InitPhase;
use assert_matches::assert_matches;
use common::{random_referrer, settled, Profile};
use std::time::Duration;

/// Creating an actor persists it and announces an update
#[tokio::test]
async fn test_create_and_get() -> Result<()> {
    let profile = Profile::new();
    let (manager, mut announcements) = profile.tab(&random_referrer()).await;

    let uri = manager.create_actor("alice").await?;
    assert!(uri.as_str().starts_with("actor:"));

    let actor = manager.get_actor(&uri).await?;
    assert_eq!(actor.nickname, "alice");
    assert_eq!(actor.uri()?, uri);

    assert_eq!(announcements.drain(), vec![ActorEvent::Update(uri)]);
    Ok(())
}

/// Looking up an unknown URI fails with NotFound
#[tokio::test]
async fn test_get_missing_actor() {
    let profile = Profile::new();
    let (manager, _) = profile.tab(&random_referrer()).await;

    let unknown = RootSecret::generate().actor_uri();
    let err = manager.get_actor(&unknown).await.unwrap_err();
    assert_matches!(err, ActorError::NotFound { .. });
    assert!(err.to_string().contains(unknown.as_str()));
}

/// A padded spelling of a URI finds the same stored actor
#[tokio::test]
async fn test_padded_uri_finds_actor() -> Result<()> {
    let profile = Profile::new();
    let (manager, _) = profile.tab(&random_referrer()).await;
    let uri = manager.create_actor("alice").await?;

    let padded = ActorUri::parse(&format!("{uri}="))?;
    assert_eq!(padded, uri);
    assert_eq!(manager.get_actor(&padded).await?.nickname, "alice");
    manager.choose_actor(&padded).await?;
    assert_eq!(manager.get_chosen().await?, Some(uri));
    Ok(())
}

/// Each created actor gets its own identity
#[tokio::test]
async fn test_created_actors_are_distinct() -> Result<()> {
    let profile = Profile::new();
    let (manager, _) = profile.tab(&random_referrer()).await;

    let first = manager.create_actor("same name").await?;
    let second = manager.create_actor("same name").await?;
    assert_ne!(first, second);
    Ok(())
}

/// Importing a record keeps its identity
#[tokio::test]
async fn test_store_actor() -> Result<()> {
    let profile = Profile::new();
    let (manager, mut announcements) = profile.tab(&random_referrer()).await;

    let secret = RootSecret::generate();
    let uri = manager.store_actor(Actor::new("imported", &secret)).await?;
    assert_eq!(uri, secret.actor_uri());
    assert_eq!(manager.get_actor(&uri).await?.nickname, "imported");
    assert_eq!(announcements.drain(), vec![ActorEvent::Update(uri)]);

    let broken = Actor {
        nickname: "broken".to_string(),
        root_secret_base64: "not base64!".to_string(),
    };
    assert_matches!(
        manager.store_actor(broken).await,
        Err(ActorError::InvalidInput { .. })
    );
    Ok(())
}

/// Renaming changes only the nickname; an unchanged name is a no-op
#[tokio::test]
async fn test_rename() -> Result<()> {
    let profile = Profile::new();
    let (manager, mut announcements) = profile.tab(&random_referrer()).await;

    let uri = manager.create_actor("alice").await?;
    let before = manager.get_actor(&uri).await?;
    announcements.drain();

    manager.rename_actor(&uri, "bob").await?;
    let after = manager.get_actor(&uri).await?;
    assert_eq!(after.nickname, "bob");
    assert_eq!(after.root_secret_base64, before.root_secret_base64);
    assert_eq!(announcements.drain(), vec![ActorEvent::Update(uri.clone())]);

    manager.rename_actor(&uri, "bob").await?;
    assert!(announcements.drain().is_empty());

    let unknown = RootSecret::generate().actor_uri();
    assert_matches!(
        manager.rename_actor(&unknown, "carol").await,
        Err(ActorError::NotFound { .. })
    );
    Ok(())
}

/// A declined confirmation leaves the actor intact
#[tokio::test]
async fn test_delete_requires_confirmation() -> Result<()> {
    let profile = Profile::new();
    let (manager, mut announcements) = profile.tab(&random_referrer()).await;
    let uri = manager.create_actor("alice").await?;
    announcements.drain();

    profile.confirmation.set_answer(false);
    assert_matches!(
        manager.delete_actor(&uri).await,
        Err(ActorError::PermissionDenied { .. })
    );
    assert_eq!(manager.get_actor(&uri).await?.nickname, "alice");
    assert!(announcements.drain().is_empty());

    let prompts = profile.confirmation.prompts().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("alice"));

    profile.confirmation.set_answer(true);
    manager.delete_actor(&uri).await?;
    assert_matches!(
        manager.get_actor(&uri).await,
        Err(ActorError::NotFound { .. })
    );
    assert_eq!(announcements.drain(), vec![ActorEvent::Delete(uri.clone())]);

    // Already gone: NotFound, and no prompt shown
    assert_matches!(
        manager.delete_actor(&uri).await,
        Err(ActorError::NotFound { .. })
    );
    assert_eq!(profile.confirmation.prompts().await.len(), 2);
    Ok(())
}

/// Choosing sets the per-referrer pointer; unchoosing clears it
#[tokio::test]
async fn test_choose_and_unchoose() -> Result<()> {
    let profile = Profile::new();
    let (manager, mut announcements) = profile.tab(&random_referrer()).await;
    let uri = manager.create_actor("alice").await?;
    announcements.drain();

    assert_eq!(manager.get_chosen().await?, None);
    manager.choose_actor(&uri).await?;
    assert_eq!(manager.get_chosen().await?, Some(uri.clone()));

    manager.unchoose_actor().await?;
    assert_eq!(manager.get_chosen().await?, None);

    assert_eq!(
        announcements.drain(),
        vec![ActorEvent::Choose(Some(uri)), ActorEvent::Choose(None)]
    );

    let unknown = RootSecret::generate().actor_uri();
    assert_matches!(
        manager.choose_actor(&unknown).await,
        Err(ActorError::NotFound { .. })
    );
    assert_eq!(manager.get_chosen().await?, None);
    Ok(())
}

/// Deleting the chosen actor unchooses it first
#[tokio::test]
async fn test_delete_chosen_actor() -> Result<()> {
    let profile = Profile::new();
    let (manager, mut announcements) = profile.tab(&random_referrer()).await;
    let uri = manager.create_actor("alice").await?;
    manager.choose_actor(&uri).await?;
    announcements.drain();

    manager.delete_actor(&uri).await?;
    assert_eq!(manager.get_chosen().await?, None);
    assert_eq!(
        announcements.drain(),
        vec![ActorEvent::Choose(None), ActorEvent::Delete(uri)]
    );
    Ok(())
}

/// Operations wait while storage access is missing, and `initialize`
/// obtains it
#[tokio::test]
async fn test_storage_access_gate() -> Result<()> {
    let profile = Profile::new();
    let gate = GatedStorageAccess::denied();
    let manager = profile.open_gated(&random_referrer(), gate.clone());

    let pending = tokio::time::timeout(Duration::from_millis(50), manager.get_chosen()).await;
    assert!(pending.is_err());
    assert_eq!(manager.phase(), InitPhase::Uninitialized);

    assert_matches!(
        manager.initialize().await,
        Err(ActorError::PermissionDenied { .. })
    );
    assert!(!manager.is_initialized());

    gate.set_grantable(true);
    manager.initialize().await?;
    assert_eq!(manager.phase(), InitPhase::Initialized);
    assert_eq!(manager.get_chosen().await?, None);
    Ok(())
}

/// A call blocked on the gate completes once access is granted
#[tokio::test]
async fn test_blocked_call_resumes_after_initialize() -> Result<()> {
    let profile = Profile::new();
    let manager = profile.open_gated(&random_referrer(), GatedStorageAccess::grantable());

    let blocked = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.create_actor("patient").await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!blocked.is_finished());

    manager.initialize().await?;
    let uri = blocked.await.unwrap()?;
    assert_eq!(manager.get_actor(&uri).await?.nickname, "patient");
    Ok(())
}

/// Repeated initialization loads state exactly once
#[tokio::test]
async fn test_initialize_is_idempotent() -> Result<()> {
    let profile = Profile::new();
    let manager = profile.open(&random_referrer());
    let mut announcements = manager.subscribe();

    let (a, b) = tokio::join!(manager.initialize(), manager.initialize());
    a?;
    b?;
    manager.until_initialized().await?;
    manager.initialize().await?;

    let initial = settled(&mut announcements).await;
    assert_eq!(initial, vec![ActorEvent::Choose(None)]);
    Ok(())
}

/// Entries expire unless refreshed; initialization refreshes them
#[tokio::test]
async fn test_expiry_and_refresh() -> Result<()> {
    let profile = Profile::with_ttl(TtlPolicy {
        long: Duration::from_millis(400),
        short: Duration::from_millis(150),
    });
    let referrer = random_referrer();
    let (manager, _) = profile.tab(&referrer).await;

    let kept = manager.create_actor("kept").await?;
    manager.choose_actor(&kept).await?;

    // The chosen pointer lapses first
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(manager.get_chosen().await?, None);

    // A fresh instance refreshes the record's lifetime
    let (_refresher, _) = profile.tab(&referrer).await;
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(manager.get_actor(&kept).await?.nickname, "kept");

    // Without further refreshes it lapses too
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_matches!(
        manager.get_actor(&kept).await,
        Err(ActorError::NotFound { .. })
    );
    assert!(profile.storage.get(kept.as_str()).await?.is_none());
    Ok(())
}
