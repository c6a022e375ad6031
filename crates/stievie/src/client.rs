//! The Stievie session client.
//!
//! One long-lived instance owns the device identity, the session credential
//! and both catalog caches. Callers get owned snapshots; all mutation goes
//! through the operations here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::StievieError;
use crate::guide::resolve_guides;
use crate::models::{
    Channel, ChannelsPayload, Envelope, GuidePayload, LoginResult, ProgramGuide,
    SessionCredential,
};
use crate::settings::{JsonSettingsStore, Settings, SettingsStore};
use crate::sign::sign_request_data;
use crate::transport::{HttpTransport, Transport};

const BASE_URL_V1: &str = "https://vinson-stievie.triple-it.nl/V1Api/";
const BASE_URL_V2: &str = "https://vinson-stievie.triple-it.nl/V2Api/";
const PLAYLIST_BASE: &str = "https://playlistsvr-stievie.triple-it.nl:443/";

const API_KEY: &str = "androidprod";
const DEVICE_TYPE: &str = "asus - Nexus 7";

/// Seconds a cached catalog stays fresh.
const CACHE_TTL_SECS: i64 = 30 * 60;
/// Period of the background catalog refresh.
const REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// A cached catalog with its own staleness window.
#[derive(Debug)]
struct CacheEntry<T> {
    data: Vec<T>,
    last_updated: i64,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            last_updated: 0,
        }
    }
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: i64) -> bool {
        !self.data.is_empty() && now - self.last_updated < CACHE_TTL_SECS
    }

    fn replace(&mut self, data: Vec<T>, now: i64) {
        self.data = data;
        self.last_updated = now;
    }
}

/// Client for the Stievie backend: device sign-in, session upkeep, channel
/// catalog and program guide with 30-minute caches, playlist retrieval.
pub struct Stievie {
    transport: Arc<dyn Transport>,
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    /// Per-installation identity, generated once and never regenerated.
    device_id: String,
    credential: parking_lot::Mutex<SessionCredential>,
    // One async mutex per cache entry, held across the fetch: concurrent
    // callers of the same operation serialize, and so does the background
    // refresh. Lock order is guide -> channels.
    channels: Mutex<CacheEntry<Channel>>,
    guide: Mutex<CacheEntry<ProgramGuide>>,
    refresh_armed: AtomicBool,
    refresh_cancel: CancellationToken,
    weak_self: Weak<Stievie>,
}

impl Stievie {
    /// Build a client from its collaborators. Loads persisted settings and
    /// generates + persists a device identity if none exists yet.
    pub async fn new(
        transport: Arc<dyn Transport>,
        settings: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<Self>, StievieError> {
        let mut stored = settings.load().await?;

        if stored.device_id.is_empty() {
            stored.device_id = uuid::Uuid::new_v4().to_string();
            info!(device_id = %stored.device_id, "generated device identity");
            settings.save(&stored).await?;
        }

        let credential = SessionCredential {
            hash: stored.auth_hash.clone(),
            valid_until: stored.auth_hash_valid_until,
        };

        Ok(Arc::new_cyclic(|weak| Self {
            transport,
            settings,
            clock,
            device_id: stored.device_id,
            credential: parking_lot::Mutex::new(credential),
            channels: Mutex::new(CacheEntry::default()),
            guide: Mutex::new(CacheEntry::default()),
            refresh_armed: AtomicBool::new(false),
            refresh_cancel: CancellationToken::new(),
            weak_self: weak.clone(),
        }))
    }

    /// Client with the stock HTTP transport, a JSON settings file and the
    /// system clock.
    pub async fn open(
        settings_path: impl Into<std::path::PathBuf>,
    ) -> Result<Arc<Self>, StievieError> {
        Self::new(
            Arc::new(HttpTransport::default()),
            Arc::new(JsonSettingsStore::new(settings_path)),
            Arc::new(SystemClock),
        )
        .await
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Whether the stored credential's validity window is still open.
    pub fn has_valid_credential(&self) -> bool {
        self.credential.lock().is_valid(self.now())
    }

    /// Sign in with an account. When a valid credential is already held, the
    /// remote sign-in is skipped in favor of a logon refresh and the held
    /// credential is returned unchanged.
    pub async fn sign_in(
        &self,
        login: &str,
        password: &str,
    ) -> Result<SessionCredential, StievieError> {
        if self.has_valid_credential() {
            debug!("skipping sign-in, session credential still valid");
            self.log_on().await?;
            return Ok(self.credential.lock().clone());
        }

        info!("signing in");
        let endpoint = "User/SignIn";
        // Sign-in is the one call spelling the key parameter `apiKey`.
        let body = format!(
            "apiKey={API_KEY}&deviceid={}&devicetype={DEVICE_TYPE}&password={password}&sigtime={}&username={login}",
            self.device_id,
            self.now(),
        );

        let envelope = self.post_signed(BASE_URL_V1, endpoint, body).await?;
        if envelope.response_code != 200 {
            return Err(StievieError::Authentication(format!(
                "failed to login ({}), check username and password",
                envelope.response_code
            )));
        }

        let result: LoginResult = envelope.object("sign-in")?;
        if !result.result {
            return Err(StievieError::Authentication(
                "login unsuccessful, check username and password".into(),
            ));
        }

        let credential = SessionCredential {
            hash: result.auth_hash,
            valid_until: result.valid_until,
        };
        *self.credential.lock() = credential.clone();
        self.persist_credential().await?;

        info!(valid_until = credential.valid_until, "signed in");
        Ok(credential)
    }

    /// Revalidate the held credential without a password and force-refresh
    /// both catalogs. A 403 means the backend no longer honors the session:
    /// the credential is dropped before the error so it is never retried
    /// blindly.
    pub async fn log_on(&self) -> Result<(), StievieError> {
        let endpoint = "User/LogOn";
        let auth_hash = self.credential.lock().hash.clone();
        let body = format!(
            "apikey={API_KEY}&authhash={auth_hash}&deviceid={}&devicetype={DEVICE_TYPE}&sigtime={}&",
            self.device_id,
            self.now(),
        );

        let envelope = self.post_signed(BASE_URL_V1, endpoint, body).await?;
        match envelope.response_code {
            200 => {}
            403 => {
                self.log_out().await?;
                return Err(StievieError::Authentication("session timed out".into()));
            }
            code => {
                return Err(StievieError::Authentication(format!(
                    "failed to logon ({code})"
                )));
            }
        }

        self.get_channels(true).await?;
        self.get_guide(true).await?;
        Ok(())
    }

    /// Forget the credential. Idempotent.
    pub async fn log_out(&self) -> Result<(), StievieError> {
        self.credential.lock().clear();
        self.persist_credential().await?;
        info!("logged out");
        Ok(())
    }

    /// Channel catalog. Serves the cache inside its staleness window unless
    /// `force_update` is set; a successful fetch arms the periodic refresh.
    pub async fn get_channels(&self, force_update: bool) -> Result<Vec<Channel>, StievieError> {
        let mut cache = self.channels.lock().await;
        if !force_update && cache.is_fresh(self.now()) {
            debug!(channels = cache.data.len(), "channel cache hit");
            return Ok(cache.data.clone());
        }

        let endpoint = "Channel/GetChannelsWithStreams";
        let auth_hash = self.credential.lock().hash.clone();
        let body = format!(
            "apikey={API_KEY}&authhash={auth_hash}&deviceid={}&devicetype={DEVICE_TYPE}&includeofflinechannels=true&sigtime={}&streamType=hd&",
            self.device_id,
            self.now(),
        );

        let envelope = self.post_signed(BASE_URL_V1, endpoint, body).await?;
        if envelope.response_code != 200 {
            return Err(StievieError::Api {
                code: envelope.response_code,
                context: "retrieve channels",
            });
        }

        let payload: ChannelsPayload = envelope.object("channels")?;
        self.arm_periodic_refresh();

        info!(channels = payload.channels.len(), "channel catalog refreshed");
        cache.replace(payload.channels, self.now());
        Ok(cache.data.clone())
    }

    /// Program guides for all known channels, resolved before caching. An
    /// empty channel catalog (after one population attempt) yields an empty
    /// guide list without a remote call.
    pub async fn get_guide(&self, force_update: bool) -> Result<Vec<ProgramGuide>, StievieError> {
        let mut cache = self.guide.lock().await;
        if !force_update && cache.is_fresh(self.now()) {
            debug!(guides = cache.data.len(), "guide cache hit");
            return Ok(cache.data.clone());
        }

        // The guide request needs channel ids; populate the channel cache
        // first if nothing is known yet.
        let mut channel_ids = {
            let channels = self.channels.lock().await;
            channels.data.iter().map(|c| c.id.to_string()).collect::<Vec<_>>()
        };
        if channel_ids.is_empty() {
            channel_ids = self
                .get_channels(false)
                .await?
                .iter()
                .map(|c| c.id.to_string())
                .collect();
        }
        if channel_ids.is_empty() {
            debug!("no channels known, skipping guide request");
            return Ok(Vec::new());
        }

        let endpoint = "Program/GetOverview";
        let auth_hash = self.credential.lock().hash.clone();
        let body = format!(
            "apikey={API_KEY}&authhash={auth_hash}&channelID={}&deviceid={}&devicetype={DEVICE_TYPE}&sigtime={}&",
            channel_ids.join(","),
            self.device_id,
            self.now(),
        );

        // The guide overview lives on the V2 api.
        let envelope = self.post_signed(BASE_URL_V2, endpoint, body).await?;
        if envelope.response_code != 200 {
            return Err(StievieError::Api {
                code: envelope.response_code,
                context: "retrieve program guide",
            });
        }

        let payload: GuidePayload = envelope.object("program guide")?;
        let guides = resolve_guides(payload)?;

        info!(guides = guides.len(), "program guide refreshed");
        cache.replace(guides, self.now());
        Ok(cache.data.clone())
    }

    /// Fetch a playlist document from the playlist server: unauthenticated,
    /// uncached, same transport and user agent as every other call.
    pub async fn get_playlist(&self, relative_url: &str) -> Result<String, StievieError> {
        let body = self
            .transport
            .get(&format!("{PLAYLIST_BASE}{relative_url}"))
            .await?;
        Ok(body.trim().to_owned())
    }

    fn now(&self) -> i64 {
        self.clock.now_epoch()
    }

    async fn persist_credential(&self) -> Result<(), StievieError> {
        let credential = self.credential.lock().clone();
        self.settings
            .save(&Settings {
                device_id: self.device_id.clone(),
                auth_hash: credential.hash,
                auth_hash_valid_until: credential.valid_until,
            })
            .await
    }

    async fn post_signed(
        &self,
        base: &str,
        endpoint: &str,
        body: String,
    ) -> Result<Envelope, StievieError> {
        let signed = sign_request_data(endpoint, &body);
        let response = self
            .transport
            .post(&format!("{base}{endpoint}"), &signed)
            .await?;

        let envelope = Envelope::parse(&response)?;
        debug!(
            endpoint,
            code = envelope.response_code,
            key = envelope.response_key.as_deref().unwrap_or(""),
            server_time = envelope.response_timestamp.unwrap_or(0),
            "api envelope"
        );
        Ok(envelope)
    }

    /// Start the periodic forced refresh of both catalogs. One-shot: later
    /// calls are no-ops. The task holds only a weak reference and stops when
    /// the client is dropped or cancelled.
    fn arm_periodic_refresh(&self) {
        if self.refresh_armed.swap(true, Ordering::SeqCst) {
            return;
        }

        let weak = self.weak_self.clone();
        let cancel = self.refresh_cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
            // The first tick completes immediately and the fetch that armed
            // us already happened; consume it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(client) = weak.upgrade() else { break };
                debug!("periodic catalog refresh");
                if let Err(e) = client.get_channels(true).await {
                    warn!(error = %e, "periodic channel refresh failed");
                }
                if let Err(e) = client.get_guide(true).await {
                    warn!(error = %e, "periodic guide refresh failed");
                }
            }
        });
    }
}

impl Drop for Stievie {
    fn drop(&mut self) {
        self.refresh_cancel.cancel();
    }
}
