//! Venue data access
//!
//! Store failures are returned raw as [`OperationError::Store`]; the gateway
//! pipeline translates them.

use gateway::application::envelope::{Page, PageRequest};
use gateway::application::execute::OperationError;
use kernel::error::store::StoreError;
use parking_lot::RwLock;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::venue::model::{Customer, InventoryItem, NewCustomer, RoyaltyStatement};

pub type VenueResult<T> = Result<T, OperationError>;

/// Venue repository trait
#[trait_variant::make(VenueRepository: Send)]
pub trait LocalVenueRepository {
    async fn list_customers(&self, page: PageRequest) -> VenueResult<Page<Customer>>;

    async fn find_customer(&self, customer_id: Uuid) -> VenueResult<Option<Customer>>;

    /// Insert a validated customer; a duplicate email is a unique violation
    async fn create_customer(&self, new: NewCustomer) -> VenueResult<Customer>;

    async fn list_inventory(&self, page: PageRequest) -> VenueResult<Page<InventoryItem>>;

    async fn list_royalties(&self) -> VenueResult<Vec<RoyaltyStatement>>;
}

// ============================================================================
// PostgreSQL
// ============================================================================

/// PostgreSQL-backed venue repository
#[derive(Clone)]
pub struct PgVenueRepository {
    pool: PgPool,
}

impl PgVenueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl VenueRepository for PgVenueRepository {
    async fn list_customers(&self, page: PageRequest) -> VenueResult<Page<Customer>> {
        let items = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, name, email, phone, created_at
            FROM customers
            ORDER BY created_at DESC, customer_id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn find_customer(&self, customer_id: Uuid) -> VenueResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, name, email, phone, created_at
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn create_customer(&self, new: NewCustomer) -> VenueResult<Customer> {
        let customer = new.into_customer();

        sqlx::query(
            r#"
            INSERT INTO customers (customer_id, name, email, phone, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(customer.customer_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn list_inventory(&self, page: PageRequest) -> VenueResult<Page<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT item_id, sku, name, quantity, unit_price_cents
            FROM inventory_items
            ORDER BY sku
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inventory_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn list_royalties(&self) -> VenueResult<Vec<RoyaltyStatement>> {
        let statements = sqlx::query_as::<_, RoyaltyStatement>(
            r#"
            SELECT
                r.statement_id,
                a.name AS artist_name,
                r.period,
                r.amount_cents,
                r.status
            FROM royalty_statements r
            JOIN artists a ON a.artist_id = r.artist_id
            ORDER BY r.period DESC, a.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(statements)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// In-memory venue repository for tests; the binary always uses [`PgVenueRepository`]
#[derive(Clone, Default)]
pub struct MemoryVenueRepository {
    customers: Arc<RwLock<Vec<Customer>>>,
    inventory: Arc<RwLock<Vec<InventoryItem>>>,
    royalties: Arc<RwLock<Vec<RoyaltyStatement>>>,
}

impl MemoryVenueRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_inventory(&self, item: InventoryItem) {
        self.inventory.write().push(item);
    }

    pub fn add_royalty(&self, statement: RoyaltyStatement) {
        self.royalties.write().push(statement);
    }
}

fn page_of<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let start = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let len = usize::try_from(page.limit()).unwrap_or(0);
    Page {
        items: items.iter().skip(start).take(len).cloned().collect(),
        total: items.len() as u64,
    }
}

impl VenueRepository for MemoryVenueRepository {
    async fn list_customers(&self, page: PageRequest) -> VenueResult<Page<Customer>> {
        Ok(page_of(&self.customers.read(), page))
    }

    async fn find_customer(&self, customer_id: Uuid) -> VenueResult<Option<Customer>> {
        Ok(self
            .customers
            .read()
            .iter()
            .find(|c| c.customer_id == customer_id)
            .cloned())
    }

    async fn create_customer(&self, new: NewCustomer) -> VenueResult<Customer> {
        let customer = new.into_customer();
        let mut customers = self.customers.write();

        if customers.iter().any(|c| c.email == customer.email) {
            return Err(StoreError::with_code(
                "23505",
                "duplicate key value violates unique constraint \"customers_email_key\"",
            )
            .with_constraint("customers_email_key")
            .into());
        }

        customers.push(customer.clone());
        Ok(customer)
    }

    async fn list_inventory(&self, page: PageRequest) -> VenueResult<Page<InventoryItem>> {
        Ok(page_of(&self.inventory.read(), page))
    }

    async fn list_royalties(&self) -> VenueResult<Vec<RoyaltyStatement>> {
        Ok(self.royalties.read().clone())
    }
}
