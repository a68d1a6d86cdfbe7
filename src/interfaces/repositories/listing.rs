use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    entities::listing::{Listing, ListingInsert, ListingRow},
    errors::AppError,
    repositories::sqlx_repo::SqlxListingRepo,
};

/// Escapes LIKE wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Case-insensitive substring search on the listing name, newest first.
fn search_query(term: &str) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM listings WHERE name ILIKE ");
    builder.push_bind(like_pattern(term));
    builder.push(" ORDER BY created DESC");
    builder
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;

    /// Creates a listing and returns its id
    async fn create_listing(&self, listing: &ListingInsert) -> Result<Uuid, AppError>;

    async fn get_listing_by_id(&self, id: &Uuid) -> Result<Listing, AppError>;

    /// All listings, newest first
    async fn list_listings(&self) -> Result<Vec<Listing>, AppError>;

    /// Case-insensitive substring match on the listing name, newest first
    async fn search_listings(&self, name: &str) -> Result<Vec<Listing>, AppError>;

    async fn list_listings_by_owner(&self, uid: &Uuid) -> Result<Vec<Listing>, AppError>;

    /// Deletes a listing owned by `uid` and returns the deleted record
    async fn delete_listing(&self, id: &Uuid, uid: &Uuid) -> Result<Listing, AppError>;
}

impl SqlxListingRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxListingRepo { pool }
    }
}

#[async_trait]
impl ListingRepository for SqlxListingRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn create_listing(&self, listing: &ListingInsert) -> Result<Uuid, AppError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO listings (
                name, model, year, km, price, city, whatsapp,
                description, owner, uid, created, images
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#
        )
        .bind(&listing.name)
        .bind(&listing.model)
        .bind(&listing.year)
        .bind(&listing.km)
        .bind(&listing.price)
        .bind(&listing.city)
        .bind(&listing.whatsapp)
        .bind(&listing.description)
        .bind(&listing.owner)
        .bind(listing.uid)
        .bind(listing.created)
        .bind(Json(listing.images.clone()))
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_listing_by_id(&self, id: &Uuid) -> Result<Listing, AppError> {
        let row = sqlx::query_as::<_, ListingRow>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Listing not found".into()))?;

        Ok(row.into())
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, AppError> {
        let listings = sqlx::query_as::<_, ListingRow>(
            "SELECT * FROM listings ORDER BY created DESC"
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Listing::from)
        .collect();

        Ok(listings)
    }

    async fn search_listings(&self, name: &str) -> Result<Vec<Listing>, AppError> {
        let mut builder = search_query(name);

        let listings = builder
            .build_query_as::<ListingRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Listing::from)
            .collect();

        Ok(listings)
    }

    async fn list_listings_by_owner(&self, uid: &Uuid) -> Result<Vec<Listing>, AppError> {
        let listings = sqlx::query_as::<_, ListingRow>(
            "SELECT * FROM listings WHERE uid = $1 ORDER BY created DESC"
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Listing::from)
        .collect();

        Ok(listings)
    }

    async fn delete_listing(&self, id: &Uuid, uid: &Uuid) -> Result<Listing, AppError> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            DELETE FROM listings
            WHERE id = $1 AND uid = $2
            RETURNING *
            "#
        )
        .bind(id)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing not found".into()))?;

        Ok(row.into())
    }
}
