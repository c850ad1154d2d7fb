use crate::{Config, Query, QueryError, WeatherResponse, provider::weatherstack::WeatherstackProvider};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod weatherstack;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, query: &Query) -> Result<WeatherResponse, QueryError>;
}

/// Construct the Weatherstack client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let access_key = config.require_access_key()?;
    let provider = WeatherstackProvider::new(access_key, config.base_url())?;

    Ok(Arc::new(provider))
}
