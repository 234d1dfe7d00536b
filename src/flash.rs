//! One-shot messages carried in the session until the next rendered page.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

const FLASH_KEY: &str = "_flashes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: Level,
    pub message: String,
}

pub async fn push(session: &Session, category: Level, message: impl Into<String>) -> anyhow::Result<()> {
    let mut pending: Vec<Flash> = session.get(FLASH_KEY).await?.unwrap_or_default();
    pending.push(Flash {
        category,
        message: message.into(),
    });
    session.insert(FLASH_KEY, pending).await?;
    Ok(())
}

/// Drain pending messages.
pub async fn take(session: &Session) -> anyhow::Result<Vec<Flash>> {
    Ok(session
        .remove::<Vec<Flash>>(FLASH_KEY)
        .await?
        .unwrap_or_default())
}
