use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::entities::image::PendingImage;

/// Images one user has staged for a listing that is not submitted yet.
#[derive(Debug, Clone)]
pub struct Draft {
    pub images: Vec<PendingImage>,
    /// Names claimed by an in-flight submit or removal.
    pub held: HashSet<String>,
    pub touched_at: DateTime<Utc>,
}

impl Draft {
    fn new() -> Self {
        Draft {
            images: Vec::new(),
            held: HashSet::new(),
            touched_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldError {
    /// The image is not in the owner's draft
    Missing,
    /// Another operation holds the image
    Busy,
}

/// Result of a bounded push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Staged(usize),
    DraftFull,
}

/// In-memory registry of drafts keyed by owner id.
///
/// Every mutation of a draft happens under its map entry, so concurrent
/// requests from the same user never observe a half-applied change. Empty
/// drafts are dropped from the map.
///
/// An image can be held by at most one operation at a time. Held images
/// are skipped by `take` and never expire.
#[derive(Debug, Default)]
pub struct PendingUploads {
    drafts: DashMap<Uuid, Draft>,
}

/// Claim on some images of one draft.
///
/// Dropping the claim releases the images untouched; `commit` removes
/// them from the draft instead.
#[derive(Debug)]
pub struct Hold<'a> {
    uploads: &'a PendingUploads,
    owner: Uuid,
    images: Vec<PendingImage>,
    settled: bool,
}

impl Hold<'_> {
    pub fn images(&self) -> &[PendingImage] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn names(&self) -> Vec<String> {
        self.images.iter().map(|i| i.reference.name.clone()).collect()
    }

    /// Drops the held images from the draft and returns how many images
    /// are still staged.
    pub fn commit(mut self) -> usize {
        self.settled = true;
        let names = self.names();
        self.uploads.remove_held(&self.owner, &names)
    }
}

impl Drop for Hold<'_> {
    fn drop(&mut self) {
        if !self.settled && !self.images.is_empty() {
            let names = self.names();
            self.uploads.release(&self.owner, &names);
        }
    }
}

impl PendingUploads {
    pub fn new() -> Self {
        PendingUploads::default()
    }

    /// Appends an image to the owner's draft and returns the new draft size.
    pub fn push(&self, owner: &Uuid, image: PendingImage) -> usize {
        let mut draft = self.drafts.entry(*owner).or_insert_with(Draft::new);
        draft.images.push(image);
        draft.touched_at = Utc::now();
        draft.images.len()
    }

    /// Appends an image unless the draft already holds `limit` images.
    pub fn push_within(&self, owner: &Uuid, image: PendingImage, limit: usize) -> PushOutcome {
        let mut draft = self.drafts.entry(*owner).or_insert_with(Draft::new);
        if draft.images.len() >= limit {
            return PushOutcome::DraftFull;
        }
        draft.images.push(image);
        draft.touched_at = Utc::now();
        PushOutcome::Staged(draft.images.len())
    }

    /// Ordered copy of the owner's draft.
    pub fn snapshot(&self, owner: &Uuid) -> Vec<PendingImage> {
        self.drafts
            .get(owner)
            .map(|draft| draft.images.clone())
            .unwrap_or_default()
    }

    pub fn find(&self, owner: &Uuid, name: &str) -> Option<PendingImage> {
        self.drafts
            .get(owner)
            .and_then(|draft| draft.images.iter().find(|i| i.reference.name == name).cloned())
    }

    pub fn len(&self, owner: &Uuid) -> usize {
        self.drafts.get(owner).map_or(0, |draft| draft.images.len())
    }

    pub fn is_empty(&self, owner: &Uuid) -> bool {
        self.len(owner) == 0
    }

    /// Number of users with at least one staged image.
    pub fn draft_count(&self) -> usize {
        self.drafts.len()
    }

    /// Claims a single image, for removal.
    pub fn hold(&self, owner: &Uuid, name: &str) -> Result<Hold<'_>, HoldError> {
        let image = {
            let mut draft = self.drafts.get_mut(owner).ok_or(HoldError::Missing)?;
            let image = draft
                .images
                .iter()
                .find(|i| i.reference.name == name)
                .cloned()
                .ok_or(HoldError::Missing)?;

            if !draft.held.insert(name.to_string()) {
                return Err(HoldError::Busy);
            }
            draft.touched_at = Utc::now();
            image
        };

        Ok(Hold {
            uploads: self,
            owner: *owner,
            images: vec![image],
            settled: false,
        })
    }

    /// Claims every image of the draft no other operation holds, in upload
    /// order.
    pub fn hold_all(&self, owner: &Uuid) -> Hold<'_> {
        let images = match self.drafts.get_mut(owner) {
            Some(mut draft) => {
                let free: Vec<PendingImage> = draft
                    .images
                    .iter()
                    .filter(|i| !draft.held.contains(&i.reference.name))
                    .cloned()
                    .collect();

                for image in &free {
                    draft.held.insert(image.reference.name.clone());
                }
                draft.touched_at = Utc::now();
                free
            }
            None => Vec::new(),
        };

        Hold {
            uploads: self,
            owner: *owner,
            images,
            settled: false,
        }
    }

    fn release(&self, owner: &Uuid, names: &[String]) {
        if let Some(mut draft) = self.drafts.get_mut(owner) {
            for name in names {
                draft.held.remove(name);
            }
            draft.touched_at = Utc::now();
        }
    }

    fn remove_held(&self, owner: &Uuid, names: &[String]) -> usize {
        let remaining = match self.drafts.get_mut(owner) {
            Some(mut draft) => {
                draft.images.retain(|i| !names.contains(&i.reference.name));
                for name in names {
                    draft.held.remove(name);
                }
                draft.touched_at = Utc::now();
                draft.images.len()
            }
            None => 0,
        };

        self.drafts.remove_if(owner, |_, draft| draft.images.is_empty());
        remaining
    }

    /// Empties the owner's draft of every image nobody holds and returns
    /// them. Held images stay behind.
    pub fn take(&self, owner: &Uuid) -> Vec<PendingImage> {
        let taken = match self.drafts.get_mut(owner) {
            Some(mut draft) => {
                let (held, free): (Vec<PendingImage>, Vec<PendingImage>) = std::mem::take(&mut draft.images)
                    .into_iter()
                    .partition(|i| draft.held.contains(&i.reference.name));
                draft.images = held;
                draft.touched_at = Utc::now();
                free
            }
            None => Vec::new(),
        };

        self.drafts.remove_if(owner, |_, draft| draft.images.is_empty());
        taken
    }

    /// Removes every draft untouched for longer than `ttl`. Drafts with held
    /// images are in use and never expire.
    pub fn take_expired(&self, ttl: Duration) -> Vec<(Uuid, Vec<PendingImage>)> {
        let cutoff = Utc::now() - ttl;
        let is_stale = |draft: &Draft| draft.touched_at < cutoff && draft.held.is_empty();

        let stale: Vec<Uuid> = self
            .drafts
            .iter()
            .filter(|entry| is_stale(entry.value()))
            .map(|entry| *entry.key())
            .collect();

        stale
            .into_iter()
            // A draft touched since the scan is no longer stale
            .filter_map(|owner| self.drafts.remove_if(&owner, |_, draft| is_stale(draft)))
            .map(|(owner, draft)| (owner, draft.images))
            .collect()
    }
}
