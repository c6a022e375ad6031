//! Typed entities for the Vinson API.
//!
//! The backend wraps every response in a `{ResponseCode, ResponseKey,
//! ResponseObject, ResponseTimestamp}` envelope and PascalCases most keys.
//! `ResponseObject` is projected in a second stage so non-200 envelopes are
//! classified by their application code before any shape check runs.

use serde::Deserialize;

use crate::error::StievieError;

/// Session credential for a device. Replaced wholesale on sign-in or logon,
/// cleared wholesale on logout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredential {
    pub hash: String,
    pub valid_until: i64,
}

impl SessionCredential {
    /// Valid iff the validity timestamp lies strictly in the future.
    pub fn is_valid(&self, now: i64) -> bool {
        self.valid_until > now
    }

    pub(crate) fn clear(&mut self) {
        self.hash.clear();
        self.valid_until = 0;
    }
}

/// `User/SignIn` response object. The backend has emitted the hash key in
/// both casings over time.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResult {
    pub result: bool,
    #[serde(rename = "authHash", alias = "authhash", default)]
    pub auth_hash: String,
    #[serde(rename = "validUntil", default)]
    pub valid_until: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Position", default)]
    pub position: i64,
    #[serde(rename = "DarkIcon", default)]
    pub dark_icon_url: String,
    #[serde(rename = "LightIcon", default)]
    pub light_icon_url: String,
    #[serde(rename = "HashTags", default)]
    pub hash_tags: String,
    #[serde(rename = "SpecificThumbnailUrl", default)]
    pub thumbnail_url: String,
    #[serde(rename = "ThumbnailDelay", default)]
    pub thumbnail_delay: i64,
    #[serde(rename = "DisplayDelay", default)]
    pub display_delay: i64,
    #[serde(rename = "AllowForwardTimeshift", default)]
    pub allow_forward_timeshift: bool,
    #[serde(rename = "Streams", default)]
    pub streams: Vec<ChannelStream>,
}

impl Channel {
    /// Small thumbnail, the base variant served by the backend. All variants
    /// derive from the same base each time they are read.
    pub fn thumb_small_url(&self) -> String {
        self.thumbnail_url.clone()
    }

    pub fn thumb_large_url(&self) -> String {
        self.thumbnail_url.replace(".jpg", "l.jpg")
    }

    pub fn thumb_original_url(&self) -> String {
        self.thumbnail_url.replace(".jpg", "o.jpg")
    }

    /// Thumbnail metadata document.
    pub fn thumb_metadata_url(&self) -> String {
        self.thumbnail_url.replace(".jpg", ".json")
    }
}

/// A playable rendition of a channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelStream {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Url", default)]
    pub url: String,
    #[serde(rename = "OffsetFromNow", default)]
    pub offset_from_now: i64,
}

/// Program guide for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramGuide {
    pub channel_id: i64,
    pub programs: Vec<Program>,
}

/// A fully resolved guide entry. Only this form leaves the crate; the
/// index-encoded wire form is resolved in one pass before caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub series_name: Option<String>,
    pub series_id: Option<String>,
    /// Broadcast time, epoch seconds.
    pub time: i64,
    pub description: String,
    pub tag: Option<String>,
    pub url: Option<String>,
    pub video_links: Vec<String>,
    pub blackouts: i64,
}

/// Wire form of a guide: channel id plus index-encoded programs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawGuide {
    #[serde(rename = "ID")]
    pub channel_id: i64,
    #[serde(rename = "Programs", default)]
    pub programs: Vec<RawProgram>,
}

/// Wire form of a guide entry: `Name`, `SeriesName`, `SeriesID`, `Url` and
/// `Tag` hold string-encoded indices into the payload's lookup tables.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawProgram {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SeriesName", default)]
    pub series_name: String,
    #[serde(rename = "SeriesID", default)]
    pub series_id: String,
    #[serde(rename = "Time", default)]
    pub time: i64,
    #[serde(rename = "Desc", default)]
    pub description: String,
    #[serde(rename = "Tag", default)]
    pub tag: String,
    #[serde(rename = "RBlackouts", default)]
    pub blackouts: i64,
    #[serde(rename = "VideoLinks", default)]
    pub video_links: Vec<String>,
    #[serde(rename = "Url", default)]
    pub url: String,
}

/// `Channel/GetChannelsWithStreams` response object.
#[derive(Debug, Deserialize)]
pub(crate) struct ChannelsPayload {
    #[serde(rename = "Channels", default)]
    pub channels: Vec<Channel>,
}

/// `Program/GetOverview` response object: raw guides plus the parallel
/// lookup tables their indices point into.
#[derive(Debug, Deserialize)]
pub(crate) struct GuidePayload {
    #[serde(rename = "Channels", default)]
    pub channels: Vec<RawGuide>,
    #[serde(rename = "SeriesIDs", default)]
    pub series_ids: Vec<String>,
    #[serde(rename = "SeriesNames", default)]
    pub series_names: Vec<String>,
    #[serde(rename = "Names", default)]
    pub names: Vec<String>,
    #[serde(rename = "Urls", default)]
    pub urls: Vec<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
}

/// Response envelope shared by every API call.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(rename = "ResponseCode")]
    pub response_code: i64,
    #[serde(rename = "ResponseKey", default)]
    pub response_key: Option<String>,
    #[serde(rename = "ResponseObject", default)]
    pub response_object: Option<serde_json::Value>,
    #[serde(rename = "ResponseTimestamp", default)]
    pub response_timestamp: Option<i64>,
}

impl Envelope {
    pub fn parse(body: &str) -> Result<Self, StievieError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Project `ResponseObject` into the shape a call expects.
    pub fn object<T: serde::de::DeserializeOwned>(
        self,
        context: &'static str,
    ) -> Result<T, StievieError> {
        let value = self.response_object.ok_or(StievieError::Api {
            code: self.response_code,
            context,
        })?;
        Ok(serde_json::from_value(value)?)
    }
}
