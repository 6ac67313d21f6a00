use anyhow::Context;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub auth_secret: String,
    pub seed_products: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let auth_secret = env::var("AUTH_SECRET").context("AUTH_SECRET must be set")?;
        let seed_products = env::var("SEED_PRODUCTS").ok();
        Ok(Self {
            server_port,
            database_url,
            auth_secret,
            seed_products,
        })
    }
}
