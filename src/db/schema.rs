use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Orders: one row per payment attempt, never deleted by this workflow.
        -- status is monotonic (pending -> completed); entitlement_id presence
        -- is the authoritative "already provisioned" flag.
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            gateway_order_id TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            amount_due INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed')),
            payment_id TEXT,
            signature TEXT,
            entitlement_id TEXT,
            invoice_id TEXT,
            verified_at INTEGER,
            created_at INTEGER NOT NULL,

            -- pricing breakdown at creation time (display/audit only)
            base_amount INTEGER NOT NULL,
            discount_percentage INTEGER NOT NULL DEFAULT 0,
            discount_amount INTEGER NOT NULL DEFAULT 0,
            tax_percentage INTEGER NOT NULL DEFAULT 0,
            tax_amount INTEGER NOT NULL DEFAULT 0,
            coupon_code TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id);
        CREATE INDEX IF NOT EXISTS idx_orders_unprovisioned ON orders(gateway_order_id) WHERE entitlement_id IS NULL;

        -- Entitlements: the provisioned downstream resource
        CREATE TABLE IF NOT EXISTS entitlements (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_entitlements_user ON entitlements(user_id);

        -- Coupons: discount lookup, absence degrades to no discount
        CREATE TABLE IF NOT EXISTS coupons (
            coupon_code TEXT PRIMARY KEY,
            percentage INTEGER NOT NULL,
            valid INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
}
