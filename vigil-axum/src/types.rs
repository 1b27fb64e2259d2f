use serde::{Deserialize, Serialize};
use vigil::{BlockedIp, IpRiskSummary, RiskEvent, RiskScore, TokenPair, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreQuery {
    pub ip: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    #[serde(flatten)]
    pub score: RiskScore,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockedIpsResponse {
    pub blocked: Vec<BlockedIp>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskEventsResponse {
    pub events: Vec<RiskEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopIpsResponse {
    pub top: Vec<IpRiskSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Connection metadata extracted by the transport layer.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}
