use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use pixio_core::error::{PixioError, Result};
use pixio_core::protocol::{Envelope, MessageType};

use crate::realtime::{Connection, Hub};

/// Handler for one inbound message type on an authenticated connection.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    fn message_type(&self) -> MessageType;
    async fn handle(&self, hub: &Hub, conn: &Arc<Connection>, payload: Bytes) -> Result<()>;
}

/// Fixed `MessageType -> handler` table, filled once when the hub is built.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<MessageType, Arc<dyn MessageHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, handler: Arc<dyn MessageHandler>) {
        self.handlers.insert(handler.message_type(), handler);
    }

    pub fn registered(&self) -> Vec<MessageType> {
        let mut types: Vec<MessageType> = self.handlers.keys().copied().collect();
        types.sort_by_key(|t| t.as_str());
        types
    }

    pub async fn dispatch(&self, hub: &Hub, conn: &Arc<Connection>, env: Envelope) -> Result<()> {
        let handler = env
            .message_type()
            .and_then(|t| self.handlers.get(&t))
            .ok_or_else(|| PixioError::UnsupportedMessageType(env.r#type.clone()))?
            .clone();
        handler.handle(hub, conn, env.payload).await
    }
}
