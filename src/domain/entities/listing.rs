use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{image::ImageReference, token::Identity};

// ───── Constants ──────────────────────────────────────────────────────
const MIN_NAME_LENGTH: u64 = 3;

/// Brazilian phone number with area code, digits only.
static WHATSAPP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{11,12}$").expect("valid whatsapp regex")
});

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct ListingRow {
    pub id: Uuid,
    pub name: String,
    pub model: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub whatsapp: String,
    pub description: String,
    pub owner: String,
    pub uid: Uuid,
    pub created: DateTime<Utc>,
    pub images: Json<Vec<ImageReference>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub id: Uuid,
    pub name: String,
    pub model: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub whatsapp: String,
    pub description: String,
    pub owner: String,
    pub uid: Uuid,
    pub created: DateTime<Utc>,
    pub images: Vec<ImageReference>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Listing {
            id: row.id,
            name: row.name,
            model: row.model,
            year: row.year,
            km: row.km,
            price: row.price,
            city: row.city,
            whatsapp: row.whatsapp,
            description: row.description,
            owner: row.owner,
            uid: row.uid,
            created: row.created,
            images: row.images.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListingInsert {
    pub name: String,
    pub model: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub whatsapp: String,
    pub description: String,
    pub owner: String,
    pub uid: Uuid,
    pub created: DateTime<Utc>,
    pub images: Vec<ImageReference>,
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewListingForm {
    #[validate(length(min = MIN_NAME_LENGTH, message = "Write the full name of the car"))]
    pub name: String,

    #[validate(length(min = 1, message = "Model is required"))]
    pub model: String,

    #[validate(length(min = 1, message = "Year is required"))]
    pub year: String,

    #[validate(length(min = 1, message = "Mileage is required"))]
    pub km: String,

    #[validate(length(min = 1, message = "Price is required"))]
    pub price: String,

    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,

    #[validate(regex(path = *WHATSAPP_REGEX, message = "Invalid phone number"))]
    pub whatsapp: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

impl NewListingForm {
    /// Copy with surrounding whitespace stripped from every field. Validate
    /// the normalized form, since that is what gets stored.
    pub fn normalized(self) -> Self {
        NewListingForm {
            name: self.name.trim().to_string(),
            model: self.model.trim().to_string(),
            year: self.year.trim().to_string(),
            km: self.km.trim().to_string(),
            price: self.price.trim().to_string(),
            city: self.city.trim().to_string(),
            whatsapp: self.whatsapp.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }

    pub fn prepare_for_insert(&self, identity: &Identity, images: Vec<ImageReference>) -> ListingInsert {
        ListingInsert {
            name: self.name.clone(),
            model: self.model.clone(),
            year: self.year.clone(),
            km: self.km.clone(),
            price: self.price.clone(),
            city: self.city.clone(),
            whatsapp: self.whatsapp.clone(),
            description: self.description.clone(),
            owner: identity.name.clone(),
            uid: identity.user_id,
            created: Utc::now(),
            images,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingSearchQuery {
    pub search: Option<String>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ListingCreatedResponse {
    pub id: Uuid,
    pub images: usize,
    pub message: String,
}

/// Outcome of deleting a listing and its image objects, reported once.
#[derive(Debug, Serialize)]
pub struct ListingDeletionReport {
    pub listing_id: Uuid,
    pub removed_images: usize,
    pub orphaned_images: Vec<ImageReference>,
}

impl ListingDeletionReport {
    pub fn is_complete(&self) -> bool {
        self.orphaned_images.is_empty()
    }
}
