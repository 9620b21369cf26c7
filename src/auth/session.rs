use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use time::OffsetDateTime;
use uuid::Uuid;

use super::{claims::Claims, repo_types::UserId};

/// Authenticated identity attached to a request. Passed explicitly into
/// every service call that needs to know who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
    pub session_id: Uuid,
}

impl From<Claims> for Session {
    fn from(c: Claims) -> Self {
        Self {
            user_id: c.sub,
            username: c.name,
            session_id: c.sid,
        }
    }
}

/// Sessions terminated by logout or refresh rotation. An entry is kept
/// until the last token that could carry its id has expired.
#[derive(Clone, Default)]
pub struct RevokedSessions {
    inner: Arc<Mutex<HashMap<Uuid, i64>>>,
}

impl RevokedSessions {
    pub fn revoke(&self, session_id: Uuid, until_unix: i64) {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.retain(|_, until| *until > now);
        map.insert(session_id, until_unix);
    }

    pub fn is_revoked(&self, session_id: &Uuid) -> bool {
        let map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.contains_key(session_id)
    }
}
