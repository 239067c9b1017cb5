use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PortalError;

/// OTP 验证成功后门户会话有效期
pub const SESSION_VALIDITY_HOURS: i64 = 6;

/// 已认证的 GST 门户会话 (由外部 OTP 登录流程产生)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSession {
    pub session_id: String,
    pub gstin: String,
    pub username: String,
    pub is_verified: bool,
    pub expires_at: DateTime<Utc>,
}

impl PortalSession {
    /// OTP 刚验证通过的会话
    pub fn verified(
        session_id: impl Into<String>,
        gstin: impl Into<String>,
        username: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            gstin: gstin.into(),
            username: username.into(),
            is_verified: true,
            expires_at: now + Duration::hours(SESSION_VALIDITY_HOURS),
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.is_verified && now < self.expires_at
    }

    pub fn ensure_active(&self, now: DateTime<Utc>) -> Result<(), PortalError> {
        if !self.is_verified {
            return Err(PortalError::NotVerified(self.session_id.clone()));
        }
        if now >= self.expires_at {
            return Err(PortalError::SessionExpired(self.session_id.clone()));
        }
        Ok(())
    }
}
