//! Wires config, durable storage, transport, tokens, cart and session client.

use crate::cart::{CartStore, SharedCart};
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::session::SessionClient;
use crate::storage::{FileStore, KeyValueStore};
use crate::tokens::{CredentialStore, SystemClock, TokenLifecycle};
use crate::transport::{HttpTransport, Transport};

use std::path::Path;
use std::sync::Arc;

use log::info;

pub struct Storefront {
    pub session: SessionClient,
    pub cart: SharedCart,
}

impl Storefront {
    /// Open the persisted state under `data_dir` and connect to the API
    /// configured in `config`.
    pub fn open(config: &ClientConfig, data_dir: &Path) -> Result<Self, CoreError> {
        config.validate()?;

        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(config.store_path(data_dir))?);
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config.api)?);

        Ok(Self::with_parts(
            transport,
            store,
            config.session.keep_logged_in_default,
        ))
    }

    /// Assemble from existing parts, using the system clock.
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
        keep_logged_in_default: bool,
    ) -> Self {
        let credentials = CredentialStore::new(Arc::clone(&store))
            .with_keep_logged_in_default(keep_logged_in_default);
        let tokens = TokenLifecycle::new(Arc::clone(&transport), credentials, Arc::new(SystemClock));
        let cart = CartStore::load(store).into_shared();
        let session = SessionClient::new(transport, tokens).with_cart(Arc::clone(&cart));

        info!(
            "Storefront ready (logged in: {})",
            session.is_logged_in()
        );
        Self { session, cart }
    }
}
