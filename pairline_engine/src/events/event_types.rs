use crate::db_types::{PaymentRequest, UserId};

/// Emitted when two users have been paired and the session is live.
#[derive(Debug, Clone)]
pub struct SessionStartedEvent {
    pub user_a: UserId,
    pub user_b: UserId,
}

/// Emitted when a session ends, whichever side ended it.
#[derive(Debug, Clone)]
pub struct SessionEndedEvent {
    pub ended_by: UserId,
    pub partner: UserId,
}

/// Emitted when a payment request reaches a terminal state. `request.status` tells you which one;
/// coins have already been credited when the status is `Success`.
#[derive(Debug, Clone)]
pub struct PaymentSettledEvent {
    pub request: PaymentRequest,
}
