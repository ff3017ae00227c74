//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | PostgreSQL code | Meaning | `StoreError` |
//! |---|---|---|
//! | `23505` | unique violation | `Duplicate(<field for the constraint>)` |
//! | `23503` | foreign key violation | `NotFound(<referenced entity>)` |
//! | anything else | | `Backend` |

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use menuhub_auth::{AdminAccount, CustomerAccount, NewAdminAccount, NewCustomerAccount};
use menuhub_catalog::{
    Branch, Category, DeliveryMethod, NewBranch, NewCategory, NewProduct, Order, OrderDraft,
    Pricing, Product, Subcategory, SubcategoryDraft, VariantPrices,
};
use menuhub_core::{
    AdminId, BranchId, CategoryId, CustomerId, OrderId, ProductId, SubcategoryId,
};

use super::{CatalogStore, CredentialStore, OrderStore, StoreError};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const ADMIN_COLUMNS: &str = "id, username, password_hash, is_staff, is_superuser";
const CUSTOMER_COLUMNS: &str = "id, username, password_hash, name, email, phone";
const PRODUCT_COLUMNS: &str = "id, name, image_ref, price, prices, branch_id, subcategory_id";
const ORDER_COLUMNS: &str =
    "id, customer_id, name, phone, address, delivery_method, cart, created_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::backend(format!("connect: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Apply embedded migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::backend(format!("migrate: {e}")))
    }

    async fn count(&self, sql: &'static str, id: i64, operation: &str) -> Result<u64, StoreError> {
        let row = sqlx::query(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        let count: i64 = row.try_get(0).map_err(|e| decode_error(operation, e))?;
        Ok(count.max(0) as u64)
    }

    async fn delete_by_id(
        &self,
        sql: &'static str,
        id: i64,
        what: &'static str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(what));
        }
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(duplicate_field(&constraint)),
                Some("23503") => StoreError::NotFound(referenced_entity(&constraint)),
                _ => StoreError::backend(format!(
                    "database error in {operation}: {}",
                    db_err.message()
                )),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::backend(format!("connection pool closed in {operation}"))
        }
        other => StoreError::backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn decode_error(operation: &str, err: sqlx::Error) -> StoreError {
    StoreError::backend(format!("failed to decode row in {operation}: {err}"))
}

fn duplicate_field(constraint: &str) -> &'static str {
    match constraint {
        "admin_accounts_username_key" | "customer_accounts_username_key" => "username",
        "customer_accounts_email_key" => "email",
        "branches_name_key" => "branch name",
        "subcategories_category_name_key" => "subcategory name in category",
        "products_name_branch_subcategory_key" => "product in branch and subcategory",
        _ => "record",
    }
}

fn referenced_entity(constraint: &str) -> &'static str {
    if constraint.contains("branch_id") {
        "branch"
    } else if constraint.contains("subcategory_id") {
        "subcategory"
    } else if constraint.contains("category_id") {
        "category"
    } else if constraint.contains("customer_id") {
        "customer"
    } else {
        "referenced record"
    }
}

fn admin_from_row(row: &PgRow) -> Result<AdminAccount, sqlx::Error> {
    Ok(AdminAccount {
        id: AdminId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
    })
}

fn customer_from_row(row: &PgRow) -> Result<CustomerAccount, sqlx::Error> {
    Ok(CustomerAccount {
        id: CustomerId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
    })
}

fn branch_from_row(row: &PgRow) -> Result<Branch, sqlx::Error> {
    Ok(Branch {
        id: BranchId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        city: row.try_get("city")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, sqlx::Error> {
    Ok(Category {
        id: CategoryId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        emoji: row.try_get("emoji")?,
    })
}

fn subcategory_from_row(row: &PgRow) -> Result<Subcategory, sqlx::Error> {
    Ok(Subcategory {
        id: SubcategoryId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        category_id: CategoryId::new(row.try_get("category_id")?),
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    let price: Option<Decimal> = row.try_get("price")?;
    let prices: Option<JsonValue> = row.try_get("prices")?;
    let prices = prices
        .map(serde_json::from_value::<VariantPrices>)
        .transpose()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let pricing = Pricing::from_columns(price, prices).ok_or_else(|| {
        sqlx::Error::Decode("product row must carry exactly one of price/prices".into())
    })?;

    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        image_ref: row.try_get("image_ref")?,
        branch_id: BranchId::new(row.try_get("branch_id")?),
        subcategory_id: SubcategoryId::new(row.try_get("subcategory_id")?),
        pricing,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, sqlx::Error> {
    let method: String = row.try_get("delivery_method")?;
    let delivery_method = DeliveryMethod::parse(&method).ok_or_else(|| {
        sqlx::Error::Decode(format!("unknown delivery method {method:?}").into())
    })?;
    let customer_id: Option<i64> = row.try_get("customer_id")?;

    Ok(Order {
        id: OrderId::new(row.try_get("id")?),
        customer_id: customer_id.map(CustomerId::new),
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        delivery_method,
        cart: row.try_get("cart")?,
        created_at: row.try_get("created_at")?,
    })
}

fn pricing_columns(pricing: &Pricing) -> Result<(Option<Decimal>, Option<JsonValue>), StoreError> {
    let prices = pricing
        .prices()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| StoreError::backend(format!("encode prices: {e}")))?;
    Ok((pricing.price(), prices))
}

macro_rules! decode_all {
    ($rows:expr, $f:ident, $op:literal) => {
        $rows
            .iter()
            .map($f)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_error($op, e))
    };
}

macro_rules! decode_opt {
    ($row:expr, $f:ident, $op:literal) => {
        $row.as_ref()
            .map($f)
            .transpose()
            .map_err(|e| decode_error($op, e))
    };
}

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn count_admins(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) FROM admin_accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_admins", e))?;
        let count: i64 = row.try_get(0).map_err(|e| decode_error("count_admins", e))?;
        Ok(count.max(0) as u64)
    }

    async fn insert_admin(&self, account: NewAdminAccount) -> Result<AdminAccount, StoreError> {
        let sql = format!(
            "INSERT INTO admin_accounts (username, password_hash, is_staff, is_superuser) \
             VALUES ($1, $2, $3, $4) RETURNING {ADMIN_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&account.username)
            .bind(&account.password_hash)
            .bind(account.is_staff)
            .bind(account.is_superuser)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_admin", e))?;
        admin_from_row(&row).map_err(|e| decode_error("insert_admin", e))
    }

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<AdminAccount>, StoreError> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admin_accounts WHERE username = $1");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_admin_by_username", e))?;
        decode_opt!(row, admin_from_row, "find_admin_by_username")
    }

    async fn list_staff_usernames(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT username FROM admin_accounts WHERE is_staff ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_staff_usernames", e))?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("username"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_error("list_staff_usernames", e))
    }

    async fn insert_customer(&self, account: NewCustomerAccount) -> Result<CustomerAccount, StoreError> {
        let sql = format!(
            "INSERT INTO customer_accounts (username, password_hash, name, email, phone) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&account.username)
            .bind(&account.password_hash)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.phone)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_customer", e))?;
        customer_from_row(&row).map_err(|e| decode_error("insert_customer", e))
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<CustomerAccount>, StoreError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customer_accounts WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_customer_by_email", e))?;
        decode_opt!(row, customer_from_row, "find_customer_by_email")
    }

    async fn find_customer_by_username(&self, username: &str) -> Result<Option<CustomerAccount>, StoreError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customer_accounts WHERE username = $1");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_customer_by_username", e))?;
        decode_opt!(row, customer_from_row, "find_customer_by_username")
    }

    async fn list_customers(&self) -> Result<Vec<CustomerAccount>, StoreError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customer_accounts ORDER BY id");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_customers", e))?;
        decode_all!(rows, customer_from_row, "list_customers")
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<(), StoreError> {
        self.delete_by_id("DELETE FROM customer_accounts WHERE id = $1", id.get(), "customer")
            .await
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn list_branches(&self) -> Result<Vec<Branch>, StoreError> {
        let rows = sqlx::query("SELECT id, name, city FROM branches ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_branches", e))?;
        decode_all!(rows, branch_from_row, "list_branches")
    }

    async fn get_branch(&self, id: BranchId) -> Result<Option<Branch>, StoreError> {
        let row = sqlx::query("SELECT id, name, city FROM branches WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_branch", e))?;
        decode_opt!(row, branch_from_row, "get_branch")
    }

    async fn insert_branch(&self, branch: NewBranch) -> Result<Branch, StoreError> {
        let row = sqlx::query(
            "INSERT INTO branches (name, city) VALUES ($1, $2) RETURNING id, name, city",
        )
        .bind(&branch.name)
        .bind(&branch.city)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_branch", e))?;
        branch_from_row(&row).map_err(|e| decode_error("insert_branch", e))
    }

    async fn update_branch(&self, id: BranchId, branch: NewBranch) -> Result<Branch, StoreError> {
        let row = sqlx::query(
            "UPDATE branches SET name = $2, city = $3 WHERE id = $1 RETURNING id, name, city",
        )
        .bind(id.get())
        .bind(&branch.name)
        .bind(&branch.city)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_branch", e))?;
        decode_opt!(row, branch_from_row, "update_branch")?.ok_or(StoreError::NotFound("branch"))
    }

    async fn delete_branch(&self, id: BranchId) -> Result<(), StoreError> {
        self.delete_by_id("DELETE FROM branches WHERE id = $1", id.get(), "branch")
            .await
    }

    async fn count_branch_products(&self, id: BranchId) -> Result<u64, StoreError> {
        self.count(
            "SELECT COUNT(*) FROM products WHERE branch_id = $1",
            id.get(),
            "count_branch_products",
        )
        .await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query("SELECT id, name, emoji FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        decode_all!(rows, category_from_row, "list_categories")
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, name, emoji FROM categories WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_category", e))?;
        decode_opt!(row, category_from_row, "get_category")
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category, StoreError> {
        let row = sqlx::query(
            "INSERT INTO categories (name, emoji) VALUES ($1, $2) RETURNING id, name, emoji",
        )
        .bind(&category.name)
        .bind(&category.emoji)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;
        category_from_row(&row).map_err(|e| decode_error("insert_category", e))
    }

    async fn update_category(&self, id: CategoryId, category: NewCategory) -> Result<Category, StoreError> {
        let row = sqlx::query(
            "UPDATE categories SET name = $2, emoji = $3 WHERE id = $1 RETURNING id, name, emoji",
        )
        .bind(id.get())
        .bind(&category.name)
        .bind(&category.emoji)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_category", e))?;
        decode_opt!(row, category_from_row, "update_category")?
            .ok_or(StoreError::NotFound("category"))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        self.delete_by_id("DELETE FROM categories WHERE id = $1", id.get(), "category")
            .await
    }

    async fn count_category_subcategories(&self, id: CategoryId) -> Result<u64, StoreError> {
        self.count(
            "SELECT COUNT(*) FROM subcategories WHERE category_id = $1",
            id.get(),
            "count_category_subcategories",
        )
        .await
    }

    async fn list_subcategories(&self) -> Result<Vec<Subcategory>, StoreError> {
        let rows = sqlx::query("SELECT id, name, category_id FROM subcategories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_subcategories", e))?;
        decode_all!(rows, subcategory_from_row, "list_subcategories")
    }

    async fn get_subcategory(&self, id: SubcategoryId) -> Result<Option<Subcategory>, StoreError> {
        let row = sqlx::query("SELECT id, name, category_id FROM subcategories WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_subcategory", e))?;
        decode_opt!(row, subcategory_from_row, "get_subcategory")
    }

    async fn insert_subcategory(&self, subcategory: SubcategoryDraft) -> Result<Subcategory, StoreError> {
        let row = sqlx::query(
            "INSERT INTO subcategories (name, category_id) VALUES ($1, $2) \
             RETURNING id, name, category_id",
        )
        .bind(&subcategory.name)
        .bind(subcategory.category_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_subcategory", e))?;
        subcategory_from_row(&row).map_err(|e| decode_error("insert_subcategory", e))
    }

    async fn update_subcategory(
        &self,
        id: SubcategoryId,
        subcategory: SubcategoryDraft,
    ) -> Result<Subcategory, StoreError> {
        let row = sqlx::query(
            "UPDATE subcategories SET name = $2, category_id = $3 WHERE id = $1 \
             RETURNING id, name, category_id",
        )
        .bind(id.get())
        .bind(&subcategory.name)
        .bind(subcategory.category_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_subcategory", e))?;
        decode_opt!(row, subcategory_from_row, "update_subcategory")?
            .ok_or(StoreError::NotFound("subcategory"))
    }

    async fn delete_subcategory(&self, id: SubcategoryId) -> Result<(), StoreError> {
        self.delete_by_id("DELETE FROM subcategories WHERE id = $1", id.get(), "subcategory")
            .await
    }

    async fn count_subcategory_products(&self, id: SubcategoryId) -> Result<u64, StoreError> {
        self.count(
            "SELECT COUNT(*) FROM products WHERE subcategory_id = $1",
            id.get(),
            "count_subcategory_products",
        )
        .await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        decode_all!(rows, product_from_row, "list_products")
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        decode_opt!(row, product_from_row, "get_product")
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let (price, prices) = pricing_columns(&product.pricing)?;
        let sql = format!(
            "INSERT INTO products (name, image_ref, price, prices, branch_id, subcategory_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&product.name)
            .bind(&product.image_ref)
            .bind(price)
            .bind(prices)
            .bind(product.branch_id.get())
            .bind(product.subcategory_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_product", e))?;
        product_from_row(&row).map_err(|e| decode_error("insert_product", e))
    }

    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<Product, StoreError> {
        let (price, prices) = pricing_columns(&product.pricing)?;
        let sql = format!(
            "UPDATE products SET name = $2, image_ref = $3, price = $4, prices = $5, \
             branch_id = $6, subcategory_id = $7 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(&product.name)
            .bind(&product.image_ref)
            .bind(price)
            .bind(prices)
            .bind(product.branch_id.get())
            .bind(product.subcategory_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;
        decode_opt!(row, product_from_row, "update_product")?
            .ok_or(StoreError::NotFound("product"))
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        self.delete_by_id("DELETE FROM products WHERE id = $1", id.get(), "product")
            .await
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: OrderDraft) -> Result<Order, StoreError> {
        let sql = format!(
            "INSERT INTO orders (customer_id, name, phone, address, delivery_method, cart) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(order.customer_id.map(|id| id.get()))
            .bind(&order.name)
            .bind(&order.phone)
            .bind(&order.address)
            .bind(order.delivery_method.as_str())
            .bind(&order.cart)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;
        order_from_row(&row).map_err(|e| decode_error("insert_order", e))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?;
        decode_all!(rows, order_from_row, "list_orders")
    }
}
