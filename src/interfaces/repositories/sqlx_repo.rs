use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxListingRepo {
    pub pool: PgPool,
}
