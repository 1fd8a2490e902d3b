use serde::{Deserialize, Serialize};

/// A journal record as the record store hands it out.
///
/// Every field is optional upstream. The feed only reads the title and the
/// two cover urls; the detail view also reads the description and photos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_cover_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
}

impl StoreRecord {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_cover(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }

    pub fn with_thumb(mut self, thumb_cover_url: impl Into<String>) -> Self {
        self.thumb_cover_url = Some(thumb_cover_url.into());
        self
    }

    /// Cover for scrolling feeds: the thumbnail when there is one, so long
    /// lists don't pull full resolution images.
    pub fn feed_cover(&self) -> Option<&str> {
        self.thumb_cover_url
            .as_deref()
            .or(self.cover_url.as_deref())
    }

    /// Cover for the detail view, which always wants the full image.
    pub fn detail_cover(&self) -> Option<&str> {
        self.cover_url.as_deref()
    }

    /// Upsert-merge: fields present in `patch` replace ours, missing fields
    /// are left alone.
    pub fn merge(&mut self, patch: StoreRecord) {
        if patch.title.is_some() {
            self.title = patch.title;
        }
        if patch.cover_url.is_some() {
            self.cover_url = patch.cover_url;
        }
        if patch.thumb_cover_url.is_some() {
            self.thumb_cover_url = patch.thumb_cover_url;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if !patch.photos.is_empty() {
            self.photos = patch.photos;
        }
    }
}

/// What the feed keeps about a day that has a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayEntry {
    pub cover_ref: Option<String>,
    pub title: Option<String>,
}

impl DayEntry {
    pub fn from_record(record: &StoreRecord) -> Self {
        Self {
            cover_ref: record.feed_cover().map(ToOwned::to_owned),
            title: record.title.clone(),
        }
    }
}

/// A resolved day. Days that were never resolved have no `DayState` at all,
/// see [`CacheLookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayState {
    /// Confirmed missing upstream
    Absent,
    Present(DayEntry),
}

impl DayState {
    pub fn from_fetch(record: Option<&StoreRecord>) -> Self {
        match record {
            Some(record) => DayState::Present(DayEntry::from_record(record)),
            None => DayState::Absent,
        }
    }

    pub fn exists(&self) -> bool {
        matches!(self, DayState::Present(_))
    }
}

/// The three ways a day can look to a renderer.
///
/// `Unresolved` and `Absent` must not be merged: the lazy resolver only
/// fetches days that are `Unresolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup<'a> {
    Unresolved,
    Absent,
    Present(&'a DayEntry),
}

impl<'a> CacheLookup<'a> {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, CacheLookup::Unresolved)
    }

    /// `None` while unresolved, otherwise whether the record exists.
    pub fn exists(&self) -> Option<bool> {
        match self {
            CacheLookup::Unresolved => None,
            CacheLookup::Absent => Some(false),
            CacheLookup::Present(_) => Some(true),
        }
    }

    pub fn entry(&self) -> Option<&'a DayEntry> {
        match *self {
            CacheLookup::Present(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn cover_ref(&self) -> Option<&'a str> {
        self.entry().and_then(|e| e.cover_ref.as_deref())
    }

    pub fn title(&self) -> Option<&'a str> {
        self.entry().and_then(|e| e.title.as_deref())
    }

    /// Flattened `{exists, cover_ref, title}` view, `None` when unresolved.
    pub fn record(&self) -> Option<DayRecord> {
        match self {
            CacheLookup::Unresolved => None,
            CacheLookup::Absent => Some(DayRecord {
                exists: false,
                cover_ref: None,
                title: None,
            }),
            CacheLookup::Present(entry) => Some(DayRecord {
                exists: true,
                cover_ref: entry.cover_ref.clone(),
                title: entry.title.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    pub exists: bool,
    pub cover_ref: Option<String>,
    pub title: Option<String>,
}
