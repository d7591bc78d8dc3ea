//! The actor manager
//!
//! One `ActorManager` plays the role of one embedded context ("tab"). All
//! durable state lives in the injected storage handler; the manager caches
//! nothing and re-reads storage on every call. Every storage-touching
//! operation first waits for the instance to reach
//! [`InitPhase::Initialized`].

use crate::announcements::{AnnouncementBus, AnnouncementStream};
use crate::builder::ActorManagerBuilder;
use crate::lifecycle::{InitPhase, Lifecycle};
use crate::tasks::TaskRegistry;
use actor_core::crypto::{self, SIGNATURE_LENGTH};
use actor_core::effects::{
    BroadcastEffects, ConfirmationEffects, StorageAccessEffects, StorageEffects, TtlClass,
};
use actor_core::{
    Actor, ActorError, ActorEvent, ActorPublicKey, ActorSigningKey, ActorUri, ChannelId,
    ChannelMessage, ManagerConfig, Referrer, Result, RootSecret, SharedSecret,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Shared instance state
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct Inner {
    pub(crate) config: ManagerConfig,
    pub(crate) referrer: Referrer,
    pub(crate) channel_id: ChannelId,
    pub(crate) storage: Arc<dyn StorageEffects>,
    pub(crate) broadcast: Arc<dyn BroadcastEffects>,
    pub(crate) confirmation: Arc<dyn ConfirmationEffects>,
    pub(crate) access: Arc<dyn StorageAccessEffects>,
    pub(crate) announcements: AnnouncementBus,
    pub(crate) lifecycle: Lifecycle,
    /// Serializes initialization attempts
    pub(crate) init_lock: Mutex<()>,
    pub(crate) tasks: TaskRegistry,
}

impl Inner {
    pub(crate) async fn load_actor(&self, uri: &ActorUri) -> Result<Option<Actor>> {
        match self.storage.get(uri.as_str()).await? {
            Some(json) => Ok(Some(Actor::from_json(&json)?)),
            None => Ok(None),
        }
    }

    async fn require_actor(&self, uri: &ActorUri) -> Result<Actor> {
        self.load_actor(uri)
            .await?
            .ok_or_else(|| ActorError::actor_not_found(uri))
    }

    async fn save_actor(&self, uri: &ActorUri, actor: &Actor) -> Result<()> {
        self.storage
            .set(uri.as_str(), &actor.to_json()?, TtlClass::Long)
            .await
    }

    /// The chosen pointer for this referrer. A malformed pointer reads as
    /// unset.
    pub(crate) async fn read_chosen(&self) -> Result<Option<ActorUri>> {
        let Some(raw) = self.storage.get(&self.referrer.chosen_key()).await? else {
            return Ok(None);
        };
        match ActorUri::parse(&raw) {
            Ok(uri) => Ok(Some(uri)),
            Err(e) => {
                debug!(error = %e, "Chosen pointer is malformed");
                Ok(None)
            }
        }
    }

    pub(crate) async fn clear_chosen(&self) -> Result<()> {
        self.storage.delete(&self.referrer.chosen_key()).await
    }

    /// Announce locally, then tell the other instances once initialized.
    ///
    /// Called during loading (from the channel listener) this parks until
    /// the load finishes, so the broadcast is delayed rather than lost.
    pub(crate) async fn publish(&self, event: ActorEvent) {
        self.announcements.announce(event.clone());
        if let Err(e) = self.lifecycle.wait_initialized().await {
            warn!(error = %e, action = %event.action(), "Dropping broadcast");
            return;
        }
        self.post(event).await;
    }

    async fn post(&self, event: ActorEvent) {
        let message = ChannelMessage {
            event,
            referrer: self.referrer.clone(),
            sender: self.channel_id.clone(),
        };
        let payload = match message.encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to encode channel message");
                return;
            }
        };
        if let Err(e) = self.broadcast.post(&self.config.channel_name, payload).await {
            warn!(error = %e, action = %message.event.action(), "Failed to broadcast");
        }
    }

    async fn chosen_secret(&self) -> Result<RootSecret> {
        let uri = self.read_chosen().await?.ok_or(ActorError::NoActorChosen)?;
        let actor = self
            .load_actor(&uri)
            .await?
            .ok_or(ActorError::NoActorChosen)?;
        actor.root_secret()
    }

    async fn chosen_signing_key(&self, nonce: Option<&[u8]>) -> Result<ActorSigningKey> {
        self.chosen_secret().await?.derive_signing_key(nonce)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Initialization
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessMode {
    /// Proceed only if access is already granted
    Ambient,
    /// Ask for access, failing if refused
    Request,
}

impl Inner {
    /// Run the load sequence once. Concurrent callers queue on the init
    /// lock and return as soon as the instance is initialized.
    async fn initialize(self: &Arc<Self>, mode: AccessMode) -> Result<()> {
        let _guard = self.init_lock.lock().await;
        if self.lifecycle.is_initialized() {
            return Ok(());
        }

        if self.lifecycle.phase() < InitPhase::StorageGranted {
            match mode {
                AccessMode::Ambient => {
                    if !self.access.has_storage_access().await {
                        warn!(
                            referrer = %self.referrer,
                            "No storage access; operations wait for initialize()"
                        );
                        return Ok(());
                    }
                }
                AccessMode::Request => self.access.request_storage_access().await?,
            }
            self.open_channel().await?;
            self.lifecycle.advance(InitPhase::StorageGranted);
        }

        let deferred = self.load_state().await?;
        self.lifecycle.advance(InitPhase::Loaded);
        self.lifecycle.advance(InitPhase::Initialized);

        if let Some(event) = deferred {
            self.post(event).await;
        }
        Ok(())
    }

    /// Announce every stored actor and the validated chosen pointer,
    /// refreshing their lifetimes. Returns the self-heal event that still
    /// has to be broadcast.
    async fn load_state(&self) -> Result<Option<ActorEvent>> {
        for entry in self.storage.get_all().await? {
            if !ActorUri::is_actor_key(&entry.name) {
                continue;
            }
            let uri = match ActorUri::parse(&entry.name) {
                Ok(uri) => uri,
                Err(e) => {
                    debug!(error = %e, "Skipping entry with a malformed actor key");
                    continue;
                }
            };
            if let Err(e) = Actor::from_json(&entry.value) {
                warn!(uri = %uri, error = %e, "Skipping unreadable actor record");
                continue;
            }
            self.storage
                .set(&entry.name, &entry.value, TtlClass::Long)
                .await?;
            self.announcements.announce(ActorEvent::Update(uri));
        }

        let key = self.referrer.chosen_key();
        let Some(raw) = self.storage.get(&key).await? else {
            self.announcements.announce(ActorEvent::Choose(None));
            return Ok(None);
        };

        let live = match ActorUri::parse(&raw) {
            Ok(uri) => {
                let exists = self.storage.get(uri.as_str()).await?.is_some();
                exists.then_some(uri)
            }
            Err(_) => None,
        };
        match live {
            Some(uri) => {
                self.storage.set(&key, uri.as_str(), TtlClass::Short).await?;
                self.announcements.announce(ActorEvent::Choose(Some(uri)));
                Ok(None)
            }
            None => {
                info!(referrer = %self.referrer, "Clearing stale chosen actor");
                self.storage.delete(&key).await?;
                self.announcements.announce(ActorEvent::Choose(None));
                Ok(Some(ActorEvent::Choose(None)))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public handle
// ─────────────────────────────────────────────────────────────────────────────

/// Manages actor identities for one referrer.
///
/// Cheap to clone; clones are the same instance. Dropping the last clone
/// (or calling [`ActorManager::close`]) stops listening to other instances.
#[derive(Clone)]
pub struct ActorManager {
    inner: Arc<Inner>,
}

impl ActorManager {
    /// Start configuring a manager
    pub fn builder() -> ActorManagerBuilder {
        ActorManagerBuilder::new()
    }

    /// Wrap fresh state and schedule the ambient storage-access check.
    ///
    /// Must be called within a Tokio runtime.
    pub(crate) fn start(inner: Inner) -> Self {
        let inner = Arc::new(inner);
        let weak = Arc::downgrade(&inner);
        let delay = inner.config.init_delay();
        inner.tasks.spawn_cancellable(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Err(e) = inner.initialize(AccessMode::Ambient).await {
                warn!(error = %e, "Actor manager initialization failed");
            }
        });
        info!(
            referrer = %inner.referrer,
            id = %inner.channel_id,
            "Actor manager created"
        );
        Self { inner }
    }

    async fn ready(&self) -> Result<()> {
        self.inner.lifecycle.wait_initialized().await
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Generate a new actor and persist it. Returns its URI.
    pub async fn create_actor(&self, nickname: impl Into<String>) -> Result<ActorUri> {
        self.ready().await?;
        let secret = RootSecret::generate();
        let actor = Actor::new(nickname, &secret);
        let uri = secret.actor_uri();
        self.inner.save_actor(&uri, &actor).await?;
        info!(uri = %uri, "Actor created");
        self.inner.publish(ActorEvent::Update(uri.clone())).await;
        Ok(uri)
    }

    /// Persist an existing actor record (an import). Returns its URI.
    pub async fn store_actor(&self, actor: Actor) -> Result<ActorUri> {
        self.ready().await?;
        let uri = actor.uri()?;
        self.inner.save_actor(&uri, &actor).await?;
        info!(uri = %uri, "Actor stored");
        self.inner.publish(ActorEvent::Update(uri.clone())).await;
        Ok(uri)
    }

    /// The actor record at `uri`.
    pub async fn get_actor(&self, uri: &ActorUri) -> Result<Actor> {
        self.ready().await?;
        self.inner.require_actor(uri).await
    }

    /// Change an actor's nickname. Renaming to the current name does nothing.
    pub async fn rename_actor(&self, uri: &ActorUri, nickname: impl Into<String>) -> Result<()> {
        self.ready().await?;
        let nickname = nickname.into();
        let mut actor = self.inner.require_actor(uri).await?;
        if actor.nickname == nickname {
            return Ok(());
        }
        actor.nickname = nickname;
        self.inner.save_actor(uri, &actor).await?;
        debug!(uri = %uri, "Actor renamed");
        self.inner.publish(ActorEvent::Update(uri.clone())).await;
        Ok(())
    }

    /// Delete an actor after the user confirms.
    ///
    /// Fails with `PermissionDenied` (and changes nothing) when the
    /// confirmation is declined. Deleting the chosen actor unchooses it first.
    pub async fn delete_actor(&self, uri: &ActorUri) -> Result<()> {
        self.ready().await?;
        let actor = self.inner.require_actor(uri).await?;

        let prompt = format!(
            "Are you sure you want to delete the actor \"{}\"? This cannot be undone.",
            actor.nickname
        );
        if !self.inner.confirmation.confirm(&prompt).await {
            debug!(uri = %uri, "Actor deletion declined");
            return Err(ActorError::permission_denied("User declined deleting the actor"));
        }

        if self.inner.read_chosen().await?.as_ref() == Some(uri) {
            self.inner.clear_chosen().await?;
            self.inner.publish(ActorEvent::Choose(None)).await;
        }
        self.inner.storage.delete(uri.as_str()).await?;
        info!(uri = %uri, "Actor deleted");
        self.inner.publish(ActorEvent::Delete(uri.clone())).await;
        Ok(())
    }

    /// Make `uri` the chosen actor for this referrer.
    pub async fn choose_actor(&self, uri: &ActorUri) -> Result<()> {
        self.ready().await?;
        self.inner.require_actor(uri).await?;
        self.inner
            .storage
            .set(&self.inner.referrer.chosen_key(), uri.as_str(), TtlClass::Short)
            .await?;
        debug!(uri = %uri, referrer = %self.inner.referrer, "Actor chosen");
        self.inner.publish(ActorEvent::Choose(Some(uri.clone()))).await;
        Ok(())
    }

    /// Clear this referrer's chosen actor.
    pub async fn unchoose_actor(&self) -> Result<()> {
        self.ready().await?;
        self.inner.clear_chosen().await?;
        debug!(referrer = %self.inner.referrer, "Actor unchosen");
        self.inner.publish(ActorEvent::Choose(None)).await;
        Ok(())
    }

    /// This referrer's chosen actor, if any.
    pub async fn get_chosen(&self) -> Result<Option<ActorUri>> {
        self.ready().await?;
        self.inner.read_chosen().await
    }

    // ── Crypto with the chosen actor ─────────────────────────────────────

    /// Sign `message` with the chosen actor's main key, or with its
    /// one-time key for `nonce`.
    pub async fn sign(&self, message: &[u8], nonce: Option<&[u8]>) -> Result<[u8; SIGNATURE_LENGTH]> {
        self.ready().await?;
        Ok(self.inner.chosen_signing_key(nonce).await?.sign(message))
    }

    /// Public key matching [`ActorManager::sign`] for the same `nonce`.
    pub async fn get_public_key(&self, nonce: Option<&[u8]>) -> Result<ActorPublicKey> {
        self.ready().await?;
        Ok(self.inner.chosen_signing_key(nonce).await?.public_key())
    }

    /// Key agreement with `their_public_key`; without one, the chosen
    /// actor's self-encryption key.
    pub async fn shared_secret(
        &self,
        their_public_key: Option<&ActorPublicKey>,
        nonce: Option<&[u8]>,
    ) -> Result<SharedSecret> {
        self.ready().await?;
        self.inner
            .chosen_signing_key(nonce)
            .await?
            .shared_secret(their_public_key)
    }

    /// Encrypt `message` under [`ActorManager::shared_secret`].
    pub async fn encrypt_private_message(
        &self,
        message: &[u8],
        their_public_key: Option<&ActorPublicKey>,
        nonce: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let key = self.shared_secret(their_public_key, nonce).await?;
        crypto::encrypt(&key, message)
    }

    /// Decrypt output of [`ActorManager::encrypt_private_message`].
    pub async fn decrypt_private_message(
        &self,
        ciphertext: &[u8],
        their_public_key: Option<&ActorPublicKey>,
        nonce: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let key = self.shared_secret(their_public_key, nonce).await?;
        crypto::decrypt(&key, ciphertext)
    }

    // ── Instance ─────────────────────────────────────────────────────────

    /// Subscribe to this instance's announcements.
    pub fn subscribe(&self) -> AnnouncementStream {
        self.inner.announcements.subscribe()
    }

    /// Ask for storage access and load state. Needed when access was not
    /// already granted; may require a user gesture in embedded contexts.
    pub async fn initialize(&self) -> Result<()> {
        self.inner.initialize(AccessMode::Request).await
    }

    /// Wait until the instance is initialized.
    pub async fn until_initialized(&self) -> Result<()> {
        self.ready().await
    }

    /// Whether initialization has completed.
    pub fn is_initialized(&self) -> bool {
        self.inner.lifecycle.is_initialized()
    }

    /// Current initialization phase.
    pub fn phase(&self) -> InitPhase {
        self.inner.lifecycle.phase()
    }

    /// Identifier this instance tags its channel messages with.
    pub fn channel_id(&self) -> &ChannelId {
        &self.inner.channel_id
    }

    /// Referrer scoping this instance's chosen actor.
    pub fn referrer(&self) -> &Referrer {
        &self.inner.referrer
    }

    /// Active configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Stop listening to other instances and stop background tasks.
    pub fn close(&self) {
        debug!(id = %self.inner.channel_id, "Closing actor manager");
        self.inner.tasks.shutdown();
    }
}

impl std::fmt::Debug for ActorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorManager")
            .field("referrer", &self.inner.referrer)
            .field("channel_id", &self.inner.channel_id)
            .field("phase", &self.inner.lifecycle.phase())
            .finish_non_exhaustive()
    }
}
