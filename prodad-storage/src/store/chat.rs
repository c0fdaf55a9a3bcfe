//! Chat log access functions.
//!
//! Messages are string-keyed (uuid v4) and read back in timestamp order.
//! Reactions are an exclusive per-message state: sending the same reaction
//! again clears it, sending the other one replaces it.

use super::ProDadStore;
use crate::error::StorageResult;
use crate::live::{ChangeEvent, ChangeKind};
use duckdb::params;
use prodad_model::{ChatMessage, Reaction, Sender};

impl ProDadStore {
    /// Appends a message to the log.
    pub fn append_message(&self, message: &ChatMessage) -> StorageResult<()> {
        {
            let conn = self.lock_conn();
            conn.execute(
                "INSERT INTO chat_messages (id, content, sender, ts, reaction) VALUES (?, ?, ?, ?, ?)",
                params![
                    message.id,
                    message.content,
                    sender_str(message.sender),
                    message.timestamp,
                    message.reaction.map(reaction_str),
                ],
            )?;
        }
        self.emit(ChangeEvent::chat(ChangeKind::Added));
        Ok(())
    }

    /// The full log, oldest first.
    pub fn all_messages(&self) -> StorageResult<Vec<ChatMessage>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT id, content, sender, ts, reaction FROM chat_messages ORDER BY ts ASC",
        )?;
        let rows: Vec<ChatMessage> = stmt
            .query_map([], |row| {
                Ok(ChatMessage {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    sender: parse_sender(&row.get::<_, String>(2)?),
                    timestamp: row.get(3)?,
                    reaction: row
                        .get::<_, Option<String>>(4)?
                        .as_deref()
                        .and_then(parse_reaction),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Toggles a reaction on a message. Returns the resulting state, or
    /// `Ok(None)` untouched when the message id is unknown.
    pub fn set_reaction(
        &self,
        message_id: &str,
        reaction: Reaction,
    ) -> StorageResult<Option<Option<Reaction>>> {
        let next = {
            let conn = self.lock_conn();
            let current = conn.query_row(
                "SELECT reaction FROM chat_messages WHERE id = ?",
                params![message_id],
                |row| row.get::<_, Option<String>>(0),
            );
            let current = match current {
                Ok(raw) => raw.as_deref().and_then(parse_reaction),
                Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let next = if current == Some(reaction) {
                None
            } else {
                Some(reaction)
            };
            conn.execute(
                "UPDATE chat_messages SET reaction = ? WHERE id = ?",
                params![next.map(reaction_str), message_id],
            )?;
            next
        };
        self.emit(ChangeEvent::chat(ChangeKind::Updated));
        Ok(Some(next))
    }

    /// Wipes the chat log.
    pub fn clear_messages(&self) -> StorageResult<()> {
        {
            let conn = self.lock_conn();
            conn.execute("DELETE FROM chat_messages", [])?;
        }
        self.emit(ChangeEvent::chat(ChangeKind::Cleared));
        Ok(())
    }
}

fn sender_str(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::Ai => "ai",
    }
}

fn parse_sender(raw: &str) -> Sender {
    match raw {
        "ai" => Sender::Ai,
        _ => Sender::User,
    }
}

fn reaction_str(reaction: Reaction) -> &'static str {
    match reaction {
        Reaction::Liked => "like",
        Reaction::Disliked => "dislike",
    }
}

fn parse_reaction(raw: &str) -> Option<Reaction> {
    match raw {
        "like" => Some(Reaction::Liked),
        "dislike" => Some(Reaction::Disliked),
        _ => None,
    }
}
