use serde::{Deserialize, Serialize};

/// Exchange trading-availability state
///
/// The session state machine only produces `Continuous` and `Closed`; the
/// auction states are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExchangeSession {
    OpenAuction,
    Continuous,
    IntraDayClose,
    IntraDayAuction,
    CloseAuction,
    #[default]
    Closed,
}

impl ExchangeSession {
    pub fn is_trading(&self) -> bool {
        matches!(self, ExchangeSession::Continuous)
    }
}
