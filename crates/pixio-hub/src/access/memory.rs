use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use pixio_core::error::{PixioError, Result};

use super::pixels::ZlibPixelCodec;
use super::{AccessRole, CanvasRecord, CanvasStore, StoreError};
use crate::config::SeedSection;

/// In-process canvas store. Backs the dev binary and the test suites.
#[derive(Default)]
pub struct MemoryCanvasStore {
    canvases: DashMap<String, CanvasRecord>,
    // (canvas_id, user_id) -> role
    rules: DashMap<(String, String), AccessRole>,
}

impl MemoryCanvasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from config fixtures; every canvas starts blank.
    pub fn from_seed(seed: &SeedSection, codec: &ZlibPixelCodec) -> Result<Self> {
        let store = Self::new();
        for c in &seed.canvases {
            let blank = codec
                .blank(c.width, c.height)
                .map_err(|e| PixioError::Internal(format!("seed canvas {}: {e}", c.id)))?;
            store.insert_canvas(CanvasRecord {
                id: c.id.clone(),
                owner_id: c.owner_id.clone(),
                width: c.width,
                height: c.height,
                link_access: c.link_access,
                link_role: c.link_role,
                pixel_data: Bytes::from(blank),
            });
            for rule in &c.access {
                store.grant(&c.id, &rule.user_id, rule.role);
            }
        }
        Ok(store)
    }

    pub fn insert_canvas(&self, canvas: CanvasRecord) {
        self.canvases.insert(canvas.id.clone(), canvas);
    }

    pub fn grant(&self, canvas_id: &str, user_id: &str, role: AccessRole) {
        self.rules
            .insert((canvas_id.to_string(), user_id.to_string()), role);
    }

    /// Drop an explicit rule. Returns the role that was removed, if any.
    pub fn revoke(&self, canvas_id: &str, user_id: &str) -> Option<AccessRole> {
        self.rules
            .remove(&(canvas_id.to_string(), user_id.to_string()))
            .map(|(_, role)| role)
    }

    pub fn canvas_count(&self) -> usize {
        self.canvases.len()
    }
}

#[async_trait]
impl CanvasStore for MemoryCanvasStore {
    async fn get_canvas(&self, canvas_id: &str) -> std::result::Result<CanvasRecord, StoreError> {
        self.canvases
            .get(canvas_id)
            .map(|c| c.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn get_user_access(
        &self,
        canvas_id: &str,
        user_id: &str,
    ) -> std::result::Result<AccessRole, StoreError> {
        self.rules
            .get(&(canvas_id.to_string(), user_id.to_string()))
            .map(|r| *r.value())
            .ok_or(StoreError::NotFound)
    }
}
