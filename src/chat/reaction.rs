//! Folding reaction events into message state.

use super::message::ReactionEvent;
use super::store::MessageStore;

/// Result of applying a reaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// The target message was updated.
    Applied,
    /// No message with that id is stored yet; nothing changed.
    UnknownMessage,
}

/// Apply a reaction event to the store.
///
/// Afterwards the reacting nickname holds exactly the event's reaction on
/// the target message. Events for unknown messages are ignored, since they
/// can race ahead of the message itself.
pub fn apply(store: &mut MessageStore, event: &ReactionEvent) -> ReactionOutcome {
    match store.find_by_id_mut(event.message_id) {
        Some(message) => {
            message
                .reactions
                .set_choice(&event.nickname, event.reaction);
            ReactionOutcome::Applied
        }
        None => ReactionOutcome::UnknownMessage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Message, ReactionKind};

    fn store_with(ids: &[i64]) -> MessageStore {
        MessageStore::from_messages(
            ids.iter()
                .map(|&id| Message::compose(id, "alice", format!("message {id}"))),
        )
    }

    #[test]
    fn test_apply_records_reaction() {
        let mut store = store_with(&[1]);
        let outcome = apply(&mut store, &ReactionEvent::new(1, ReactionKind::Like, "bob"));

        assert_eq!(outcome, ReactionOutcome::Applied);
        let msg = store.find_by_id(1).unwrap();
        assert_eq!(msg.reactions.users(ReactionKind::Like), vec!["bob"]);
    }

    #[test]
    fn test_last_event_wins() {
        let mut store = store_with(&[1]);
        let sequence = [
            ReactionKind::Like,
            ReactionKind::Heart,
            ReactionKind::Dislike,
            ReactionKind::Dislike,
            ReactionKind::Heart,
        ];
        for kind in sequence {
            apply(&mut store, &ReactionEvent::new(1, kind, "bob"));
        }

        let msg = store.find_by_id(1).unwrap();
        assert_eq!(msg.reactions.kinds_of("bob"), vec![ReactionKind::Heart]);
    }

    #[test]
    fn test_users_are_independent() {
        let mut store = store_with(&[1]);
        apply(&mut store, &ReactionEvent::new(1, ReactionKind::Like, "bob"));
        apply(&mut store, &ReactionEvent::new(1, ReactionKind::Like, "carol"));
        apply(&mut store, &ReactionEvent::new(1, ReactionKind::Heart, "bob"));

        let msg = store.find_by_id(1).unwrap();
        assert_eq!(msg.reactions.users(ReactionKind::Like), vec!["carol"]);
        assert_eq!(msg.reactions.users(ReactionKind::Heart), vec!["bob"]);
    }

    #[test]
    fn test_same_reaction_twice_does_not_untoggle() {
        let mut store = store_with(&[1]);
        apply(&mut store, &ReactionEvent::new(1, ReactionKind::Heart, "bob"));
        apply(&mut store, &ReactionEvent::new(1, ReactionKind::Heart, "bob"));

        let msg = store.find_by_id(1).unwrap();
        assert_eq!(msg.reactions.count(ReactionKind::Heart), 1);
    }

    #[test]
    fn test_unknown_message_is_ignored() {
        let mut store = store_with(&[1, 2]);
        apply(&mut store, &ReactionEvent::new(1, ReactionKind::Like, "bob"));
        let before = store.all().to_vec();

        let outcome = apply(&mut store, &ReactionEvent::new(99, ReactionKind::Heart, "bob"));

        assert_eq!(outcome, ReactionOutcome::UnknownMessage);
        assert_eq!(store.all(), before.as_slice());
    }

    #[test]
    fn test_only_target_message_changes() {
        let mut store = store_with(&[1, 2]);
        apply(&mut store, &ReactionEvent::new(2, ReactionKind::Dislike, "bob"));

        assert!(store.find_by_id(1).unwrap().reactions.is_empty());
        assert_eq!(
            store.find_by_id(2).unwrap().reactions.count(ReactionKind::Dislike),
            1
        );
    }
}
