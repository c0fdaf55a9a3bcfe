//! Scripted chat assistant.
//!
//! Keyword lookup over canned answer pools. The pick within a pool is
//! keyed on a hash of the (lowercased) message, so different questions
//! about the same topic get different answers while any given question
//! always gets the same one.

use prodad_model::{now_ms, ChatMessage, Reaction, Sender};
use prodad_storage::{ProDadStore, StorageResult};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

const SLEEP_TIPS: &[&str] = &[
    "Consistent bedtime routines can significantly improve sleep quality for children.",
    "For better sleep, limit screen time at least an hour before bedtime and create a calm environment.",
    "Most toddlers need 11-14 hours of sleep per day, including naps.",
];

const FOOD_TIPS: &[&str] = &[
    "Introducing a variety of foods early can help prevent picky eating later on.",
    "Family meals are associated with better nutrition and closer family bonds.",
    "Let children serve themselves (with guidance) to help them develop healthy eating habits and recognize hunger cues.",
];

const TANTRUM_TIPS: &[&str] = &[
    "Tantrums are a normal part of development as children learn to express and manage emotions.",
    "Stay calm during a tantrum and acknowledge your child's feelings before trying to solve the problem.",
    "Distraction can be an effective strategy for younger children having a tantrum.",
];

const WORK_TIPS: &[&str] = &[
    "Setting boundaries between work and family time is crucial for being present with your children.",
    "Consider flexible work arrangements if available to balance parenting responsibilities.",
    "Quality time matters more than quantity - make the most of the time you have with your children.",
];

const APP_TIPS: &[&str] = &[
    "The ProDad app helps you organize your parenting responsibilities and track important milestones.",
    "You can access all your parenting resources in one place with our intuitive dashboard.",
    "Use the reminders feature to never miss important events or appointments.",
];

const APP_FEATURES: &[&str] = &[
    "The Reminders widget helps you keep track of important events and tasks. You can add new reminders directly from the dashboard.",
    "You can upload important documents in the Documents widget for easy access. Compatible formats include PDF, DOC, and images.",
    "The calendar feature allows you to organize family activities and appointments in one place.",
    "Your data in ProDad is stored locally on your device for privacy and security.",
    "You can customize your dashboard by rearranging widgets to suit your preferences.",
];

const PARENTING_TIPS: &[&str] = &[
    "Creating a consistent bedtime routine can help children fall asleep easier. Try including activities like reading a story, gentle music, or a warm bath.",
    "When dealing with tantrums, stay calm and acknowledge your child's feelings. Remember that tantrums are a normal part of emotional development.",
    "Quality time doesn't have to be elaborate. Even 10-15 minutes of focused, device-free interaction each day can strengthen your bond.",
    "Praise effort rather than results to help develop a growth mindset in your child.",
    "Model the behavior you want to see. Children learn more from what you do than what you say.",
];

const GENERAL_RESPONSES: &[&str] = &[
    "Thanks for reaching out! I'm here to help with any parenting questions you might have.",
    "I appreciate your question. As a ProDad assistant, I'm here to support your parenting journey.",
    "That's a great question. I'll provide the best guidance I can as your parenting assistant.",
];

/// Topic keywords in match-priority order.
const KEYWORD_POOLS: &[(&str, &[&str])] = &[
    ("sleep", SLEEP_TIPS),
    ("food", FOOD_TIPS),
    ("tantrum", TANTRUM_TIPS),
    ("work", WORK_TIPS),
    ("app", APP_TIPS),
];

/// Produces the scripted reply for a user message.
pub fn respond(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    for (keyword, pool) in KEYWORD_POOLS {
        if lower.contains(keyword) {
            return pick(&lower, pool);
        }
    }

    if lower.contains("how") && (lower.contains("use") || lower.contains("feature")) {
        return pick(&lower, APP_FEATURES);
    }

    if ["advice", "help", "tip", "suggestion"]
        .iter()
        .any(|k| lower.contains(k))
    {
        return pick(&lower, PARENTING_TIPS);
    }

    pick(&lower, GENERAL_RESPONSES)
}

fn pick<'a>(message: &str, pool: &[&'a str]) -> &'a str {
    let mut hasher = DefaultHasher::new();
    message.hash(&mut hasher);
    pool[(hasher.finish() % pool.len() as u64) as usize]
}

/// Chat flow over the store: persists the user message, then the scripted
/// reply, and hands the reply back for display.
#[derive(Clone)]
pub struct ChatSession {
    store: ProDadStore,
    /// Last issued timestamp. Message order must survive bursts of sends
    /// within the same millisecond, so stamps are forced strictly forward.
    clock: Arc<AtomicI64>,
}

impl ChatSession {
    pub fn new(store: ProDadStore) -> Self {
        Self {
            store,
            clock: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Appends the user message and the assistant's reply.
    pub fn send(&self, content: &str) -> StorageResult<ChatMessage> {
        let mut user = ChatMessage::new(content, Sender::User);
        user.timestamp = self.next_stamp();
        self.store.append_message(&user)?;

        let mut reply = ChatMessage::new(respond(content), Sender::Ai);
        reply.timestamp = self.next_stamp();
        self.store.append_message(&reply)?;
        Ok(reply)
    }

    fn next_stamp(&self) -> i64 {
        let now = now_ms();
        let prev = self
            .clock
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev + 1))
            })
            .unwrap_or(now);
        now.max(prev + 1)
    }

    /// Full conversation in timestamp order.
    pub fn history(&self) -> StorageResult<Vec<ChatMessage>> {
        self.store.all_messages()
    }

    /// Toggles a reaction on a message. See the store for the exclusive
    /// toggle semantics.
    pub fn react(&self, message_id: &str, reaction: Reaction) -> StorageResult<Option<Option<Reaction>>> {
        self.store.set_reaction(message_id, reaction)
    }

    /// Clears the conversation.
    pub fn reset(&self) -> StorageResult<()> {
        self.store.clear_messages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_beats_later_branches() {
        // "help" alone is the advice branch, but a topic keyword wins
        let reply = respond("help, my toddler won't sleep");
        assert!(SLEEP_TIPS.contains(&reply));

        let reply = respond("any help with picky eating food?");
        assert!(FOOD_TIPS.contains(&reply));
    }

    #[test]
    fn keyword_priority_follows_table_order() {
        // Both "sleep" and "work" present: "sleep" is listed first
        let reply = respond("work is ruining my sleep");
        assert!(SLEEP_TIPS.contains(&reply));
    }

    #[test]
    fn feature_questions_hit_the_feature_pool() {
        let reply = respond("how do I use the documents widget?");
        assert!(APP_FEATURES.contains(&reply));
    }

    #[test]
    fn advice_requests_hit_the_tips_pool() {
        let reply = respond("any suggestion for bonding?");
        assert!(PARENTING_TIPS.contains(&reply));
    }

    #[test]
    fn everything_else_falls_back_to_general() {
        let reply = respond("hello there");
        assert!(GENERAL_RESPONSES.contains(&reply));
    }

    #[test]
    fn replies_are_deterministic_per_message() {
        assert_eq!(respond("sleep troubles"), respond("sleep troubles"));
        assert_eq!(respond("SLEEP TROUBLES"), respond("sleep troubles"));
    }
}
