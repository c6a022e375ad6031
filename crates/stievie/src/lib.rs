//! Client for the Stievie streaming backend.
//!
//! Signs a device in, keeps the session credential alive, caches the channel
//! catalog and per-channel program guides (30-minute windows with a
//! background refresh), and fetches playback playlists.
//!
//! ```rust,no_run
//! # async fn doc() -> Result<(), stievie_client::StievieError> {
//! let client = stievie_client::Stievie::open("stievie-settings.json").await?;
//! client.sign_in("user@example.com", "secret").await?;
//!
//! for channel in client.get_channels(false).await? {
//!     println!("{} {}", channel.position, channel.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod error;
pub mod models;
pub mod settings;
pub mod sign;
pub mod transport;

mod client;
mod guide;

pub use client::Stievie;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::StievieError;
pub use models::{Channel, ChannelStream, LoginResult, Program, ProgramGuide, SessionCredential};
pub use settings::{JsonSettingsStore, MemorySettingsStore, Settings, SettingsStore};
pub use transport::{HttpTransport, Transport, default_client};
