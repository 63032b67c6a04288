use std::env;

/// Process-wide configuration, read once at startup and passed explicitly.
/// Gateway credentials and the webhook secret are never mutated after load.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub dev_mode: bool,

    /// Razorpay key ID (public half, echoed to clients for checkout)
    pub key_id: String,
    /// Razorpay key secret (signs the `order_id|payment_id` confirmation proof)
    pub key_secret: String,
    /// Webhook shared secret (signs raw webhook payloads)
    pub webhook_secret: String,

    /// Display name of the single package on sale
    pub package_name: String,
    /// Retail price of the package in minor units (paise)
    pub base_amount: i64,
    /// Tax percentage applied to the payable amount
    pub tax_percentage: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("PAYGATE_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "paygate.db".to_string()),
            dev_mode,
            key_id: env::var("RAZORPAY_KEY_ID").expect("RAZORPAY_KEY_ID must be set"),
            key_secret: env::var("RAZORPAY_KEY_SECRET")
                .expect("RAZORPAY_KEY_SECRET must be set"),
            webhook_secret: env::var("RAZORPAY_WEBHOOK_SECRET")
                .expect("RAZORPAY_WEBHOOK_SECRET must be set"),
            package_name: env::var("PACKAGE_NAME")
                .unwrap_or_else(|_| "Package 1".to_string()),
            base_amount: env::var("ORDER_AMOUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_000_000),
            tax_percentage: env::var("TAX_PERCENTAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(18),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
