use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root of the film-logging site the profile pages are scraped from
    #[serde(default = "default_source_base_url")]
    pub source_base_url: String,

    /// Browser-like User-Agent; the source site rejects unidentified clients
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Number of pagination pages fetched concurrently
    #[serde(default = "default_fetch_batch_size")]
    pub fetch_batch_size: usize,

    /// JSON document with catalog titles, norms and vector size
    #[serde(default = "default_catalog_metadata_path")]
    pub catalog_metadata_path: String,

    /// Flat little-endian f32 blob, one row per catalog title
    #[serde(default = "default_catalog_vectors_path")]
    pub catalog_vectors_path: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_source_base_url() -> String {
    "https://letterboxd.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_fetch_batch_size() -> usize {
    5
}

fn default_catalog_metadata_path() -> String {
    "data/model_metadata.json".to_string()
}

fn default_catalog_vectors_path() -> String {
    "data/model_vectors.bin".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.fetch_batch_size = config.fetch_batch_size.max(1);
        config.source_base_url = config.source_base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
