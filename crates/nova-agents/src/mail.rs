//! Message log writes.

use nova_types::{Message, MessageBody, MessageId, PlayerState, Timestamp};
use rand::Rng;

/// Append a message with an identifier drawn from `rng`, respecting the
/// log cap.
pub fn post<R: Rng>(
    state: &mut PlayerState,
    cap: usize,
    rng: &mut R,
    at: Timestamp,
    body: MessageBody,
) -> MessageId {
    let id = MessageId::from_u128(rng.random());
    state.push_message(
        Message {
            id,
            timestamp: at,
            read: false,
            body,
        },
        cap,
    );
    id
}

/// Title/text convenience for [`MessageBody::General`].
pub fn general(title: impl Into<String>, text: impl Into<String>) -> MessageBody {
    MessageBody::General {
        title: title.into(),
        text: text.into(),
    }
}
