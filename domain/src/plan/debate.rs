//! Debate transcript messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a debate message. `Analysis` is used for round 0 only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Analysis,
    Critique,
    Defense,
    Revision,
    Final,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Analysis => "analysis",
            MessageType::Critique => "critique",
            MessageType::Defense => "defense",
            MessageType::Revision => "revision",
            MessageType::Final => "final",
        }
    }

    /// Parse a debate reply type. Anything unrecognized is a critique.
    pub fn from_reply(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "defense" | "defence" => MessageType::Defense,
            "revision" | "revise" => MessageType::Revision,
            "final" => MessageType::Final,
            _ => MessageType::Critique,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the append-only debate transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateMessage {
    /// 0 = initial analysis, 1.. = debate rounds
    pub round_number: u32,
    pub director_id: String,
    pub director_name: String,
    pub message_type: MessageType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl DebateMessage {
    pub fn new(
        round_number: u32,
        director_id: impl Into<String>,
        director_name: impl Into<String>,
        message_type: MessageType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            round_number,
            director_id: director_id.into(),
            director_name: director_name.into(),
            message_type,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Group a transcript for display: by round, emission order kept inside a round.
pub fn group_by_round(messages: &[DebateMessage]) -> Vec<(u32, Vec<&DebateMessage>)> {
    let mut groups: Vec<(u32, Vec<&DebateMessage>)> = Vec::new();
    for message in messages {
        match groups.iter_mut().find(|(round, _)| *round == message.round_number) {
            Some((_, group)) => group.push(message),
            None => groups.push((message.round_number, vec![message])),
        }
    }
    groups.sort_by_key(|(round, _)| *round);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_from_reply() {
        assert_eq!(MessageType::from_reply("FINAL"), MessageType::Final);
        assert_eq!(MessageType::from_reply("defence"), MessageType::Defense);
        assert_eq!(MessageType::from_reply("whatever"), MessageType::Critique);
    }

    #[test]
    fn test_group_by_round_keeps_emission_order() {
        let messages = vec![
            DebateMessage::new(0, "b", "B", MessageType::Analysis, "b0"),
            DebateMessage::new(0, "a", "A", MessageType::Analysis, "a0"),
            DebateMessage::new(1, "a", "A", MessageType::Critique, "a1"),
            DebateMessage::new(1, "b", "B", MessageType::Final, "b1"),
        ];
        let groups = group_by_round(&messages);
        assert_eq!(groups.len(), 2);
        let round0: Vec<_> = groups[0].1.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(round0, vec!["b0", "a0"]);
        assert_eq!(groups[1].0, 1);
    }
}
