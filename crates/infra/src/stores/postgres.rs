//! Postgres backends for the two contended ledgers.
//!
//! The never-below-zero and never-past-cap guarantees ride on conditional
//! UPDATEs (`WHERE quantity >= $n`, `WHERE usage_count < max_usage`):
//! Postgres row locking serializes writers per row, which is exactly the
//! per-key discipline the in-memory stores implement with slot mutexes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use threadcart_core::{DomainError, DomainResult, ProductId, Size};
use threadcart_inventory::{guard_amount, DecrementOutcome, StockKey, StockLedger};
use threadcart_vouchers::{UsageOutcome, Voucher, VoucherLedger, VoucherValidation};

fn store_err(err: sqlx::Error) -> DomainError {
    DomainError::store_unavailable(err.to_string())
}

fn to_u64(value: i64, what: &str) -> DomainResult<u64> {
    u64::try_from(value).map_err(|_| DomainError::invariant(format!("negative {what} in store")))
}

pub struct PgStockLedger {
    pool: PgPool,
}

impl PgStockLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> DomainResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS stock_levels (
                product_id UUID NOT NULL,
                size TEXT NOT NULL,
                quantity BIGINT NOT NULL CHECK (quantity >= 0),
                PRIMARY KEY (product_id, size)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl StockLedger for PgStockLedger {
    async fn get_available(&self, product_id: ProductId) -> DomainResult<BTreeMap<Size, u64>> {
        let rows = sqlx::query("SELECT size, quantity FROM stock_levels WHERE product_id = $1")
            .bind(*product_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        let mut available = BTreeMap::new();
        for row in rows {
            let size: String = row.try_get("size").map_err(store_err)?;
            let quantity: i64 = row.try_get("quantity").map_err(store_err)?;
            available.insert(Size::new(size)?, to_u64(quantity, "quantity")?);
        }
        Ok(available)
    }

    async fn try_decrement(&self, key: &StockKey, amount: u64) -> DomainResult<DecrementOutcome> {
        guard_amount(amount)?;
        let amount = i64::try_from(amount)
            .map_err(|_| DomainError::validation("amount exceeds storable range"))?;

        let result = sqlx::query(
            "UPDATE stock_levels SET quantity = quantity - $3
             WHERE product_id = $1 AND size = $2 AND quantity >= $3",
        )
        .bind(*key.product_id.as_uuid())
        .bind(key.size.as_str())
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 1 {
            return Ok(DecrementOutcome::Committed);
        }

        let available = sqlx::query(
            "SELECT quantity FROM stock_levels WHERE product_id = $1 AND size = $2",
        )
        .bind(*key.product_id.as_uuid())
        .bind(key.size.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .map(|row| row.try_get::<i64, _>("quantity").map_err(store_err))
        .transpose()?
        .unwrap_or(0);

        Ok(DecrementOutcome::Insufficient {
            available: to_u64(available, "quantity")?,
        })
    }

    async fn increment(&self, key: &StockKey, amount: u64) -> DomainResult<()> {
        guard_amount(amount)?;
        let amount = i64::try_from(amount)
            .map_err(|_| DomainError::validation("amount exceeds storable range"))?;

        sqlx::query(
            "INSERT INTO stock_levels (product_id, size, quantity) VALUES ($1, $2, $3)
             ON CONFLICT (product_id, size)
             DO UPDATE SET quantity = stock_levels.quantity + EXCLUDED.quantity",
        )
        .bind(*key.product_id.as_uuid())
        .bind(key.size.as_str())
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn set_quantity(&self, key: &StockKey, quantity: u64) -> DomainResult<()> {
        let quantity = i64::try_from(quantity)
            .map_err(|_| DomainError::validation("quantity exceeds storable range"))?;

        sqlx::query(
            "INSERT INTO stock_levels (product_id, size, quantity) VALUES ($1, $2, $3)
             ON CONFLICT (product_id, size)
             DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(*key.product_id.as_uuid())
        .bind(key.size.as_str())
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

pub struct PgVoucherLedger {
    pool: PgPool,
}

impl PgVoucherLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> DomainResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS vouchers (
                code TEXT PRIMARY KEY,
                discount_percentage SMALLINT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                max_usage BIGINT NOT NULL,
                usage_count BIGINT NOT NULL DEFAULT 0,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                CHECK (usage_count >= 0 AND usage_count <= max_usage)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn fetch(&self, code: &str) -> DomainResult<Option<Voucher>> {
        let row = sqlx::query(
            "SELECT code, discount_percentage, expires_at, max_usage, usage_count, active
             FROM vouchers WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let code: String = row.try_get("code").map_err(store_err)?;
        let discount_percentage: i16 = row.try_get("discount_percentage").map_err(store_err)?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at").map_err(store_err)?;
        let max_usage: i64 = row.try_get("max_usage").map_err(store_err)?;
        let usage_count: i64 = row.try_get("usage_count").map_err(store_err)?;
        let active: bool = row.try_get("active").map_err(store_err)?;

        let voucher = Voucher::from_parts(
            code,
            u8::try_from(discount_percentage)
                .map_err(|_| DomainError::invariant("discount percentage out of range in store"))?,
            expires_at,
            u32::try_from(max_usage)
                .map_err(|_| DomainError::invariant("max_usage out of range in store"))?,
            u32::try_from(usage_count)
                .map_err(|_| DomainError::invariant("usage_count out of range in store"))?,
            active,
        )?;
        Ok(Some(voucher))
    }
}

#[async_trait]
impl VoucherLedger for PgVoucherLedger {
    async fn validate(&self, code: &str, now: DateTime<Utc>) -> DomainResult<VoucherValidation> {
        Ok(match self.fetch(code).await? {
            Some(voucher) => voucher.validation(now),
            None => VoucherValidation::NotFound,
        })
    }

    async fn try_increment_usage(&self, code: &str) -> DomainResult<UsageOutcome> {
        let result = sqlx::query(
            "UPDATE vouchers SET usage_count = usage_count + 1
             WHERE code = $1 AND usage_count < max_usage",
        )
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 1 {
            return Ok(UsageOutcome::Committed);
        }
        match self.fetch(code).await? {
            Some(_) => Ok(UsageOutcome::Exhausted),
            None => Err(DomainError::NotFound),
        }
    }

    async fn decrement_usage(&self, code: &str) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE vouchers SET usage_count = usage_count - 1
             WHERE code = $1 AND usage_count > 0",
        )
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(DomainError::invariant(
                "usage_count cannot go negative",
            ))
        }
    }

    async fn upsert(&self, voucher: Voucher) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO vouchers
                (code, discount_percentage, expires_at, max_usage, usage_count, active)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (code) DO UPDATE SET
                discount_percentage = EXCLUDED.discount_percentage,
                expires_at = EXCLUDED.expires_at,
                max_usage = EXCLUDED.max_usage,
                usage_count = EXCLUDED.usage_count,
                active = EXCLUDED.active",
        )
        .bind(voucher.code())
        .bind(i16::from(voucher.discount_percentage()))
        .bind(voucher.expires_at())
        .bind(i64::from(voucher.max_usage()))
        .bind(i64::from(voucher.usage_count()))
        .bind(voucher.is_active())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get(&self, code: &str) -> DomainResult<Option<Voucher>> {
        self.fetch(code).await
    }
}

/// Connect helper for binary wiring.
pub async fn connect(database_url: &str) -> DomainResult<PgPool> {
    PgPool::connect(database_url).await.map_err(store_err)
}
