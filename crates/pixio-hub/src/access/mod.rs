//! Access collaborators consumed by the hub.
//!
//! The hub never talks to a database or a token issuer directly. It asks
//! three seams:
//! - [`TokenValidator`]: "is this access token valid, and for which user".
//! - [`CanvasStore`]: canvas metadata + raw pixels, and per-user access rules.
//! - [`PixelCodec`]: compressed pixel bytes <-> decoded pixel buffer.
//!
//! Concrete adapters live in the submodules; tests and the dev binary use
//! them, production deployments can plug their own.

pub mod jwt;
pub mod memory;
pub mod pixels;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

pub use jwt::JwtTokenValidator;
pub use memory::MemoryCanvasStore;
pub use pixels::{Pixel, PixelCodec, PixelCodecError, ZlibPixelCodec};

/// Capability level on a canvas. Ordered: `Viewer < Editor < Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    #[default]
    Viewer,
    Editor,
    Owner,
}

impl AccessRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessRole::Viewer => "viewer",
            AccessRole::Editor => "editor",
            AccessRole::Owner => "owner",
        }
    }

    pub fn can_edit(self) -> bool {
        self >= AccessRole::Editor
    }
}

/// Whether holders of the canvas id get in without an explicit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAccess {
    #[default]
    Restricted,
    WithLink,
}

/// Static canvas metadata plus its compressed pixel buffer.
#[derive(Debug, Clone)]
pub struct CanvasRecord {
    pub id: String,
    pub owner_id: String,
    pub width: u16,
    pub height: u16,
    pub link_access: LinkAccess,
    /// Role granted through the link when `link_access` is `WithLink`.
    pub link_role: AccessRole,
    pub pixel_data: Bytes,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("backend: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CanvasStore: Send + Sync {
    async fn get_canvas(&self, canvas_id: &str) -> Result<CanvasRecord, StoreError>;

    /// Explicit access rule for `(canvas, user)`. `NotFound` when none exists.
    async fn get_user_access(&self, canvas_id: &str, user_id: &str)
        -> Result<AccessRole, StoreError>;
}

pub trait TokenValidator: Send + Sync {
    /// Returns the user id the token was issued for, or `None` if invalid.
    fn validate_access_token(&self, token: &str) -> Option<String>;
}

/// Effective role of `user_id` on `canvas`.
///
/// Precedence: the canvas owner is always `Owner`; an explicit rule wins over
/// the link policy; without a rule, `WithLink` grants `link_role` and
/// `Restricted` grants nothing.
pub fn resolve_role(
    canvas: &CanvasRecord,
    user_id: &str,
    explicit: Option<AccessRole>,
) -> Option<AccessRole> {
    if canvas.owner_id == user_id {
        return Some(AccessRole::Owner);
    }
    if let Some(role) = explicit {
        return Some(role);
    }
    match canvas.link_access {
        LinkAccess::WithLink => Some(canvas.link_role),
        LinkAccess::Restricted => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(link_access: LinkAccess, link_role: AccessRole) -> CanvasRecord {
        CanvasRecord {
            id: "c1".into(),
            owner_id: "owner".into(),
            width: 4,
            height: 4,
            link_access,
            link_role,
            pixel_data: Bytes::new(),
        }
    }

    #[test]
    fn roles_are_ordered() {
        assert!(AccessRole::Owner > AccessRole::Editor);
        assert!(AccessRole::Editor > AccessRole::Viewer);
        assert!(AccessRole::Editor.can_edit());
        assert!(!AccessRole::Viewer.can_edit());
    }

    #[test]
    fn owner_wins_over_everything() {
        let c = canvas(LinkAccess::Restricted, AccessRole::Viewer);
        assert_eq!(resolve_role(&c, "owner", Some(AccessRole::Viewer)), Some(AccessRole::Owner));
    }

    #[test]
    fn explicit_rule_overrides_link_policy() {
        let c = canvas(LinkAccess::WithLink, AccessRole::Editor);
        assert_eq!(resolve_role(&c, "u1", Some(AccessRole::Viewer)), Some(AccessRole::Viewer));
    }

    #[test]
    fn link_policy_applies_without_rule() {
        let open = canvas(LinkAccess::WithLink, AccessRole::Editor);
        assert_eq!(resolve_role(&open, "u1", None), Some(AccessRole::Editor));

        let closed = canvas(LinkAccess::Restricted, AccessRole::Editor);
        assert_eq!(resolve_role(&closed, "u1", None), None);
    }
}
