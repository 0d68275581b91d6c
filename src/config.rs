use anyhow::{Context, Result};

/// Datastore connection settings, supplied through the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            supabase_url: std::env::var("SUPABASE_URL")
                .context("SUPABASE_URL must be set")?,
            supabase_key: std::env::var("SUPABASE_KEY")
                .context("SUPABASE_KEY must be set")?,
        })
    }
}
