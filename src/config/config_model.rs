#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub phonepe: PhonePeSettings,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct AuthSecret {
    pub jwt_secret: String,
}

/// Gateway credentials as they arrive from the environment. Which fields are
/// required depends on the selected variant; `PhonePeClient::from_settings`
/// validates the combination once at startup.
#[derive(Debug, Clone)]
pub struct PhonePeSettings {
    pub variant: String,
    pub environment: String,
    pub merchant_id: Option<String>,
    pub salt_key: Option<String>,
    pub salt_index: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub client_version: Option<String>,
    pub redirect_url: String,
    pub callback_url: String,
}
