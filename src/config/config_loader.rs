use anyhow::{Ok, Result};

use super::config_model::{AuthSecret, Database, DotEnvyConfig, PhonePeSettings, Server};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let phonepe = PhonePeSettings {
        variant: std::env::var("PHONEPE_VARIANT").unwrap_or_else(|_| "legacy".to_string()),
        environment: std::env::var("PHONEPE_ENV").unwrap_or_else(|_| "sandbox".to_string()),
        merchant_id: std::env::var("PHONEPE_MERCHANT_ID").ok(),
        salt_key: std::env::var("PHONEPE_SALT_KEY").ok(),
        salt_index: std::env::var("PHONEPE_SALT_INDEX").ok(),
        client_id: std::env::var("PHONEPE_CLIENT_ID").ok(),
        client_secret: std::env::var("PHONEPE_CLIENT_SECRET").ok(),
        client_version: std::env::var("PHONEPE_CLIENT_VERSION").ok(),
        redirect_url: std::env::var("PAYMENT_REDIRECT_URL")
            .unwrap_or_else(|_| "http://localhost:3000/payment/status".to_string()),
        callback_url: std::env::var("PAYMENT_CALLBACK_URL")
            .unwrap_or_else(|_| "http://localhost:5000/api/v1/payments/callback".to_string()),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        phonepe,
    })
}

pub fn get_auth_secret() -> Result<AuthSecret> {
    dotenvy::dotenv().ok();

    Ok(AuthSecret {
        jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET is invalid"),
    })
}
