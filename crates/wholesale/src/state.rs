//! Application state shared across handlers.

use std::sync::Arc;

use crate::checkout::CheckoutService;
use crate::code::{Clock, SystemClock};
use crate::config::{DiscountPolicy, WholesaleConfig};
use crate::directory::WholesaleDirectory;
use crate::provision::DiscountPlatform;
use crate::shopify::{ShopifyClient, ShopifyError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// wholesale directory and the checkout service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    directory: Arc<dyn WholesaleDirectory>,
    checkout: CheckoutService,
}

impl AppState {
    /// Assemble state from its parts.
    #[must_use]
    pub fn new(
        directory: Arc<dyn WholesaleDirectory>,
        platform: Arc<dyn DiscountPlatform>,
        clock: Arc<dyn Clock>,
        policy: DiscountPolicy,
    ) -> Self {
        let checkout = CheckoutService::new(Arc::clone(&directory), platform, clock, policy);

        Self {
            inner: Arc::new(AppStateInner {
                directory,
                checkout,
            }),
        }
    }

    /// State for production: Shopify over REST and the wall clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the Shopify client cannot be built.
    pub fn from_config(
        config: &WholesaleConfig,
        directory: Arc<dyn WholesaleDirectory>,
    ) -> Result<Self, ShopifyError> {
        let shopify = ShopifyClient::new(&config.shopify)?;
        Ok(Self::new(
            directory,
            Arc::new(shopify),
            Arc::new(SystemClock),
            config.discount.clone(),
        ))
    }

    /// Get a reference to the wholesale directory.
    #[must_use]
    pub fn directory(&self) -> &dyn WholesaleDirectory {
        self.inner.directory.as_ref()
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
