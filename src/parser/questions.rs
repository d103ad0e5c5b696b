//! Forum service (`servicesPub.aspx`) payload parsing.

use super::values::parse_portal_datetime;
use crate::errors::AppResult;
use crate::models::{Answer, Question};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(rename = "idP")]
    id: i64,
    #[serde(rename = "Descripcion")]
    text: String,
    #[serde(rename = "FechaHora")]
    created_at: String,
    #[serde(rename = "RespuestaPublicada", default)]
    answer: Option<RawAnswer>,
}

#[derive(Debug, Deserialize)]
struct RawAnswer {
    #[serde(rename = "idR")]
    id: i64,
    #[serde(rename = "Descripcion")]
    text: String,
    #[serde(rename = "FechaHora")]
    created_at: String,
}

/// Parses the forum JSON list. Timestamps are `dd-mm-yyyy HH:MM:SS` in
/// Santiago time; unanswered questions come with a `null` answer.
pub fn questions(json: &str) -> AppResult<Vec<Question>> {
    let raw: Vec<RawQuestion> = serde_json::from_str(json)?;
    raw.into_iter().map(question_from_raw).collect()
}

fn question_from_raw(raw: RawQuestion) -> AppResult<Question> {
    let answer = raw
        .answer
        .map(|answer| -> AppResult<Answer> {
            Ok(Answer {
                id: answer.id,
                text: answer.text.trim().to_string(),
                created_at: parse_portal_datetime(&answer.created_at)?,
            })
        })
        .transpose()?;

    Ok(Question {
        id: raw.id,
        text: raw.text.trim().to_string(),
        created_at: parse_portal_datetime(&raw.created_at)?,
        answer,
    })
}
