use chrono::{Duration, Utc};
use futures::future::join_all;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        image::{object_path, CleanupReport, ImageFile, ImageReference, PendingImage, UploadLimits},
        listing::{Listing, ListingCreatedResponse, ListingDeletionReport, NewListingForm},
        token::Identity,
    },
    errors::AppError,
    pending_uploads::{HoldError, PendingUploads, PushOutcome},
    repositories::{
        listing::ListingRepository,
        object_store::{ObjectStore, StorageError},
    },
    utils::valid_uuid::valid_uuid,
};

/// Every object store failure reaches the caller as a retryable store error.
fn store_error(err: StorageError) -> AppError {
    AppError::StoreError(err.to_string())
}

pub struct ListingHandler<R, S>
where
    R: ListingRepository,
    S: ObjectStore,
{
    pub listing_repo: R,
    pub object_store: S,
    pub pending: PendingUploads,
    limits: UploadLimits,
}

impl<R, S> ListingHandler<R, S>
where
    R: ListingRepository,
    S: ObjectStore,
{
    pub fn new(listing_repo: R, object_store: S, limits: UploadLimits) -> Self {
        ListingHandler {
            listing_repo,
            object_store,
            pending: PendingUploads::new(),
            limits,
        }
    }

    fn draft_full(&self) -> AppError {
        AppError::InvalidInput(format!(
            "A listing can have at most {} images",
            self.limits.max_draft_images
        ))
    }

    /// Stores an image and stages it in the caller's draft.
    ///
    /// Only JPEG and PNG are accepted. Nothing is staged unless both the
    /// write and the URL resolution succeed.
    #[instrument(skip(self, file), fields(owner = %identity.user_id))]
    pub async fn add_image(&self, identity: &Identity, file: ImageFile) -> Result<PendingImage, AppError> {
        let media_type = file.media_type()?;

        if file.bytes.is_empty() {
            return Err(AppError::InvalidInput("Image is empty".into()));
        }
        if file.size() > self.limits.max_image_bytes {
            return Err(AppError::InvalidInput(format!(
                "Image exceeds the maximum size of {} bytes",
                self.limits.max_image_bytes
            )));
        }
        if self.pending.len(&identity.user_id) >= self.limits.max_draft_images {
            return Err(self.draft_full());
        }

        let name = Uuid::new_v4().to_string();
        let path = object_path(&identity.user_id, &name);

        let handle = self.object_store.put(&path, &file.bytes).await.map_err(|e| {
            tracing::error!("Failed to store image {}: {}", path, e);
            store_error(e)
        })?;

        let url = match self.object_store.get_url(&handle).await {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Failed to resolve URL for {}: {}", path, e);
                if let Err(cleanup) = self.object_store.delete(&path).await {
                    tracing::warn!("Could not remove unreferenced image {}: {}", path, cleanup);
                }
                return Err(store_error(e));
            }
        };

        let image = PendingImage {
            reference: ImageReference {
                uid: identity.user_id,
                name,
                url,
            },
            file_name: file.file_name.clone(),
            media_type: media_type.as_str().to_string(),
            size: handle.size,
            uploaded_at: Utc::now(),
        };

        match self.pending.push_within(&identity.user_id, image.clone(), self.limits.max_draft_images) {
            PushOutcome::Staged(staged) => {
                tracing::info!("Staged image {} ({} in draft)", image.reference.name, staged);
                Ok(image)
            }
            PushOutcome::DraftFull => {
                // A concurrent upload filled the draft after the early check
                if let Err(cleanup) = self.object_store.delete(&path).await {
                    tracing::warn!("Could not remove unreferenced image {}: {}", path, cleanup);
                }
                Err(self.draft_full())
            }
        }
    }

    /// Deletes a staged image and drops it from the caller's draft.
    ///
    /// Images claimed by a submit in flight cannot be removed.
    #[instrument(skip(self), fields(owner = %identity.user_id))]
    pub async fn remove_image(&self, identity: &Identity, name: &str) -> Result<(), AppError> {
        let hold = self.pending.hold(&identity.user_id, name).map_err(|e| match e {
            HoldError::Missing => AppError::NotFound("Image is not part of your draft".into()),
            HoldError::Busy => AppError::Conflict("Image is being submitted with a listing".into()),
        })?;

        let path = hold.images()[0].reference.object_path();

        match self.object_store.delete(&path).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                // A reference without an object is never kept
                tracing::warn!("Image {} was already gone, dropping its reference", path);
            }
            Err(e) => {
                tracing::error!("Failed to delete image {}: {}", path, e);
                return Err(store_error(e));
            }
        }

        hold.commit();
        Ok(())
    }

    /// Images currently staged by the caller, in upload order
    pub fn get_draft(&self, identity: &Identity) -> Vec<PendingImage> {
        self.pending.snapshot(&identity.user_id)
    }

    /// Drops the caller's draft and deletes every staged image. Images
    /// claimed by a submit in flight are left to that submit.
    #[instrument(skip(self), fields(owner = %identity.user_id))]
    pub async fn discard_draft(&self, identity: &Identity) -> CleanupReport {
        let images: Vec<ImageReference> = self.pending
            .take(&identity.user_id)
            .into_iter()
            .map(|pending| pending.reference)
            .collect();

        self.delete_objects(&images).await
    }

    /// Publishes a listing built from the form and the caller's draft.
    ///
    /// The submitted images are held until the document store answers, so
    /// nothing can delete them meanwhile. The draft keeps its images when
    /// the store fails, so the caller can submit again without uploading
    /// anything twice.
    #[instrument(skip(self, form), fields(owner = %identity.user_id))]
    pub async fn submit(
        &self,
        identity: &Identity,
        form: NewListingForm,
    ) -> Result<ListingCreatedResponse, AppError> {
        let form = form.normalized();
        form.validate()?;

        let hold = self.pending.hold_all(&identity.user_id);
        if hold.is_empty() {
            if self.pending.is_empty(&identity.user_id) {
                tracing::warn!("Listing submitted without images");
                return Err(AppError::MissingImages);
            }
            return Err(AppError::Conflict("A listing with these images is already being submitted".into()));
        }

        let images: Vec<ImageReference> = hold.images().iter().map(|p| p.reference.clone()).collect();
        let count = images.len();

        let insert = form.prepare_for_insert(identity, images);

        // Dropping the hold on failure puts the images back in play
        let id = self.listing_repo.create_listing(&insert).await.map_err(|e| {
            tracing::error!("Failed to create listing: {}", e);
            e
        })?;

        let remaining = hold.commit();
        tracing::info!("Created listing {} with {} images ({} still staged)", id, count, remaining);

        Ok(ListingCreatedResponse {
            id,
            images: count,
            message: "Listing created successfully".to_string(),
        })
    }

    /// Deletes one of the caller's listings, then its images.
    ///
    /// The listing is gone once the record is deleted. Image deletions are
    /// attempted independently and their outcomes reported together.
    #[instrument(skip(self), fields(owner = %identity.user_id))]
    pub async fn delete_listing(
        &self,
        identity: &Identity,
        listing_id: &str,
    ) -> Result<ListingDeletionReport, AppError> {
        let valid_id = valid_uuid(listing_id)?;

        let listing = self.listing_repo
            .delete_listing(&valid_id, &identity.user_id)
            .await?;

        let cleanup = self.delete_objects(&listing.images).await;

        if cleanup.orphaned_images.is_empty() {
            tracing::info!("Deleted listing {} and {} images", valid_id, cleanup.removed_images);
        } else {
            tracing::warn!(
                "Deleted listing {} but {} images could not be removed",
                valid_id,
                cleanup.orphaned_images.len()
            );
        }

        Ok(ListingDeletionReport {
            listing_id: valid_id,
            removed_images: cleanup.removed_images,
            orphaned_images: cleanup.orphaned_images,
        })
    }

    /// Listings newest first, optionally narrowed by a name search
    pub async fn list_listings(&self, search: Option<&str>) -> Result<Vec<Listing>, AppError> {
        match search.map(str::trim) {
            Some(term) if !term.is_empty() => self.listing_repo.search_listings(term).await,
            _ => self.listing_repo.list_listings().await,
        }
    }

    pub async fn get_listing(&self, listing_id: &str) -> Result<Listing, AppError> {
        let valid_id = valid_uuid(listing_id)?;
        self.listing_repo.get_listing_by_id(&valid_id).await
    }

    /// Listings owned by the caller, for the dashboard
    pub async fn list_owner_listings(&self, identity: &Identity) -> Result<Vec<Listing>, AppError> {
        self.listing_repo.list_listings_by_owner(&identity.user_id).await
    }

    /// Reads a stored image for public download.
    pub async fn read_image(&self, uid: &str, name: &str) -> Result<Vec<u8>, AppError> {
        let owner = valid_uuid(uid)?;
        let name = valid_uuid(name)?;

        self.object_store
            .get(&object_path(&owner, &name.to_string()))
            .await
            .map_err(AppError::from)
    }

    /// Drops drafts idle for longer than `ttl` and deletes their images.
    pub async fn purge_expired_drafts(&self, ttl: Duration) -> CleanupReport {
        let mut report = CleanupReport::default();

        for (owner, images) in self.pending.take_expired(ttl) {
            let references: Vec<ImageReference> = images.into_iter().map(|p| p.reference).collect();
            tracing::info!("Draft of {} expired with {} images", owner, references.len());
            report.merge(self.delete_objects(&references).await);
        }

        report
    }

    async fn delete_objects(&self, images: &[ImageReference]) -> CleanupReport {
        let outcomes = join_all(images.iter().map(|image| async move {
            let path = image.object_path();
            let outcome = self.object_store.delete(&path).await;
            (image, path, outcome)
        }))
        .await;

        let mut report = CleanupReport::default();

        for (image, path, outcome) in outcomes {
            match outcome {
                Ok(()) => report.removed_images += 1,
                Err(StorageError::NotFound(_)) => {
                    // Nothing left behind to orphan
                    tracing::debug!("Image {} was already gone", path);
                    report.removed_images += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to delete image {}: {}", path, e);
                    report.orphaned_images.push(image.clone());
                }
            }
        }

        report
    }
}
