use std::{sync::Arc, time::Duration};

use crate::{
    accounts::AccountStore,
    config::Config,
    database::init_mongo,
    donations::DonationRegistry,
    geocode::{Geocoder, NominatimGeocoder},
};

pub struct AppState {
    pub config: Config,
    pub accounts: Arc<dyn AccountStore>,
    pub donations: Arc<dyn DonationRegistry>,
    pub geocoder: Arc<dyn Geocoder>,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store = Arc::new(init_mongo(&config.mongo_uri).await);
        let geocoder = Arc::new(NominatimGeocoder::new(
            &config.geocoder_url,
            Duration::from_millis(config.geocoder_timeout_ms),
        ));

        Self::with_parts(config, store.clone(), store, geocoder)
    }

    /// Assemble state from explicit parts. Tests use this to swap the store
    /// and geocoder for doubles.
    pub fn with_parts(
        config: Config,
        accounts: Arc<dyn AccountStore>,
        donations: Arc<dyn DonationRegistry>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            accounts,
            donations,
            geocoder,
        })
    }
}
