#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use prost::Message;
use tokio::sync::mpsc;

use pixio_core::protocol::{self, messages::WsError, Envelope, MessageType};
use pixio_hub::access::{
    AccessRole, CanvasRecord, JwtTokenValidator, LinkAccess, MemoryCanvasStore, ZlibPixelCodec,
};
use pixio_hub::realtime::{Hub, HubSettings};

pub const SECRET: &str = "pixio_integration_secret_long_enough_0123";

/// Canvases:
/// - `c1`: owner u1, restricted, u2 is an editor
/// - `open`: owner u1, anyone with the link is a viewer
pub fn store() -> Arc<MemoryCanvasStore> {
    let codec = ZlibPixelCodec::new();
    let store = MemoryCanvasStore::new();
    store.insert_canvas(canvas("c1", LinkAccess::Restricted, &codec));
    store.insert_canvas(canvas("open", LinkAccess::WithLink, &codec));
    store.grant("c1", "u2", AccessRole::Editor);
    Arc::new(store)
}

fn canvas(id: &str, link_access: LinkAccess, codec: &ZlibPixelCodec) -> CanvasRecord {
    CanvasRecord {
        id: id.to_string(),
        owner_id: "u1".to_string(),
        width: 4,
        height: 4,
        link_access,
        link_role: AccessRole::Viewer,
        pixel_data: Bytes::from(codec.blank(4, 4).unwrap()),
    }
}

pub fn tokens() -> JwtTokenValidator {
    JwtTokenValidator::new(SECRET).unwrap()
}

pub fn hub_with(settings: HubSettings) -> Arc<Hub> {
    Arc::new(Hub::new(
        store(),
        Arc::new(tokens()),
        Arc::new(ZlibPixelCodec::new()),
        settings,
    ))
}

pub fn hub() -> Arc<Hub> {
    hub_with(HubSettings::default())
}

pub fn frame<M: Message>(t: MessageType, payload: &M) -> Bytes {
    protocol::encode(t, payload).unwrap()
}

pub async fn next_envelope(rx: &mut mpsc::Receiver<Bytes>) -> Envelope {
    let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("outbound queue closed");
    protocol::decode(&frame).unwrap()
}

pub async fn expect_error(rx: &mut mpsc::Receiver<Bytes>) -> WsError {
    let env = next_envelope(rx).await;
    assert_eq!(env.r#type, "error");
    protocol::decode_payload(&env.payload).unwrap()
}

pub fn assert_silent(rx: &mut mpsc::Receiver<Bytes>) {
    assert!(
        matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Empty)),
        "expected no queued frames"
    );
}
