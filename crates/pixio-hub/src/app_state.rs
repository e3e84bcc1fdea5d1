//! Shared application state for the hub server.
//!
//! Built once at startup from the validated config and the collaborators
//! (canvas store, token validator, pixel codec); cloned into every request.

use std::sync::Arc;

use crate::access::{CanvasStore, PixelCodec, TokenValidator};
use crate::config::HubConfig;
use crate::policy::OriginPolicy;
use crate::realtime::{Hub, HubSettings};
use crate::transport::SessionTimings;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    hub: Arc<Hub>,
}

struct AppStateInner {
    origins: OriginPolicy,
    timings: SessionTimings,
}

impl AppState {
    pub fn new(
        cfg: &HubConfig,
        store: Arc<dyn CanvasStore>,
        tokens: Arc<dyn TokenValidator>,
        codec: Arc<dyn PixelCodec>,
    ) -> Self {
        let hub = Arc::new(Hub::new(store, tokens, codec, HubSettings::from_config(&cfg.hub)));
        let origins = OriginPolicy::from_config(&cfg.hub.allowed_origins);
        if origins.is_open() {
            tracing::warn!("hub.allowed_origins is empty, accepting every origin");
        }
        Self::from_parts(hub, origins, SessionTimings::from_config(&cfg.hub))
    }

    pub fn from_parts(hub: Arc<Hub>, origins: OriginPolicy, timings: SessionTimings) -> Self {
        Self {
            inner: Arc::new(AppStateInner { origins, timings }),
            hub,
        }
    }

    pub fn hub(&self) -> Arc<Hub> {
        Arc::clone(&self.hub)
    }

    pub fn origin_policy(&self) -> &OriginPolicy {
        &self.inner.origins
    }

    pub fn timings(&self) -> SessionTimings {
        self.inner.timings
    }
}
