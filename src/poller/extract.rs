//! Typed view over the parts of a Match-v5 payload the pipeline persists.

use serde_json::Value;
use thiserror::Error;

use crate::db::ParticipantStat;
use crate::riot::MatchDetail;

/// The payload does not have the shape needed to record the match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("match payload has no `info` object")]
    MissingInfo,

    #[error("match payload has no `info.participants` array")]
    MissingParticipants,

    #[error("{puuid} is not a participant of this match")]
    ParticipantNotFound { puuid: String },

    #[error("participant field `{field}` is missing or has the wrong type")]
    InvalidField { field: &'static str },
}

/// Everything persisted when a match record becomes processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Epoch milliseconds, `None` when the payload carries no usable time.
    pub end_timestamp: Option<i64>,
    pub game_mode: String,
    pub stat: ParticipantStat,
}

pub fn extract_outcome(
    detail: &MatchDetail,
    match_id: &str,
    puuid: &str,
) -> Result<MatchOutcome, ExtractError> {
    let info = detail
        .info()
        .filter(|i| i.is_object())
        .ok_or(ExtractError::MissingInfo)?;

    let participants = info
        .get("participants")
        .and_then(Value::as_array)
        .ok_or(ExtractError::MissingParticipants)?;

    let participant = participants
        .iter()
        .find(|p| p.get("puuid").and_then(Value::as_str) == Some(puuid))
        .ok_or_else(|| ExtractError::ParticipantNotFound {
            puuid: puuid.to_string(),
        })?;

    let stat = ParticipantStat {
        match_id: match_id.to_string(),
        puuid: puuid.to_string(),
        win: bool_field(participant, "win")?,
        role: str_field(participant, "role")?,
        champion_name: str_field(participant, "championName")?,
        kills: int_field(participant, "kills")?,
        deaths: int_field(participant, "deaths")?,
        assists: int_field(participant, "assists")?,
    };

    Ok(MatchOutcome {
        end_timestamp: game_end_timestamp(info),
        game_mode: game_mode(info),
        stat,
    })
}

/// `gameEndTimestamp`, falling back to `gameCreation` for older payloads.
fn game_end_timestamp(info: &Value) -> Option<i64> {
    epoch_millis(info, "gameEndTimestamp")
        .or_else(|| epoch_millis(info, "gameCreation"))
        .filter(|ms| *ms > 0)
}

fn epoch_millis(obj: &Value, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn game_mode(info: &Value) -> String {
    match info.get("gameMode") {
        Some(Value::String(mode)) => mode.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn bool_field(obj: &Value, field: &'static str) -> Result<bool, ExtractError> {
    obj.get(field)
        .and_then(Value::as_bool)
        .ok_or(ExtractError::InvalidField { field })
}

fn str_field(obj: &Value, field: &'static str) -> Result<String, ExtractError> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ExtractError::InvalidField { field })
}

fn int_field(obj: &Value, field: &'static str) -> Result<i32, ExtractError> {
    obj.get(field)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(ExtractError::InvalidField { field })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn participant(puuid: &str) -> Value {
        json!({
            "puuid": puuid,
            "championName": "Lux",
            "role": "SOLO",
            "teamPosition": "MIDDLE",
            "win": true,
            "kills": 5,
            "deaths": 2,
            "assists": 8
        })
    }

    fn detail(info: Value) -> MatchDetail {
        MatchDetail::new(json!({ "metadata": { "matchId": "EUW1_1" }, "info": info }))
    }

    #[test]
    fn extracts_the_tracked_participant() {
        let detail = detail(json!({
            "gameMode": "CLASSIC",
            "gameCreation": 1_700_000_000_000_i64,
            "gameEndTimestamp": 1_700_000_900_000_i64,
            "participants": [participant("other"), participant("abc")]
        }));

        let outcome = extract_outcome(&detail, "EUW1_1", "abc").unwrap();

        assert_eq!(outcome.end_timestamp, Some(1_700_000_900_000));
        assert_eq!(outcome.game_mode, "CLASSIC");
        assert_eq!(
            outcome.stat,
            ParticipantStat {
                match_id: "EUW1_1".into(),
                puuid: "abc".into(),
                win: true,
                role: "SOLO".into(),
                champion_name: "Lux".into(),
                kills: 5,
                deaths: 2,
                assists: 8,
            }
        );
    }

    #[test]
    fn end_time_falls_back_to_creation_then_unknown() {
        let with_creation = detail(json!({
            "gameMode": "ARAM",
            "gameCreation": "1700000000000",
            "participants": [participant("abc")]
        }));
        assert_eq!(
            extract_outcome(&with_creation, "EUW1_1", "abc")
                .unwrap()
                .end_timestamp,
            Some(1_700_000_000_000)
        );

        let without_time = detail(json!({ "participants": [participant("abc")] }));
        let outcome = extract_outcome(&without_time, "EUW1_1", "abc").unwrap();
        assert_eq!(outcome.end_timestamp, None);
        assert_eq!(outcome.game_mode, "");
    }

    #[test]
    fn missing_participant_is_a_validation_error() {
        let detail = detail(json!({ "participants": [participant("other")] }));

        assert_eq!(
            extract_outcome(&detail, "EUW1_1", "abc"),
            Err(ExtractError::ParticipantNotFound {
                puuid: "abc".into()
            })
        );
    }

    #[test]
    fn wrongly_typed_field_is_named() {
        let mut p = participant("abc");
        p["kills"] = json!("five");
        let detail = detail(json!({ "participants": [p] }));

        assert_eq!(
            extract_outcome(&detail, "EUW1_1", "abc"),
            Err(ExtractError::InvalidField { field: "kills" })
        );
    }

    #[test]
    fn absent_field_is_named() {
        let mut p = participant("abc");
        p.as_object_mut().unwrap().remove("win");
        let detail = detail(json!({ "participants": [p] }));

        assert_eq!(
            extract_outcome(&detail, "EUW1_1", "abc"),
            Err(ExtractError::InvalidField { field: "win" })
        );
    }

    #[test]
    fn malformed_envelope_is_rejected() {
        assert_eq!(
            extract_outcome(&MatchDetail::new(json!({})), "EUW1_1", "abc"),
            Err(ExtractError::MissingInfo)
        );
        assert_eq!(
            extract_outcome(&detail(json!({ "participants": {} })), "EUW1_1", "abc"),
            Err(ExtractError::MissingParticipants)
        );
    }
}
