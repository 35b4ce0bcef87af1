//! Slack Events API endpoint.
//!
//! `POST /slack/events`

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use recall_core::db::models::NewSlackUser;
use recall_core::db::queries::slack_user;

use crate::error::{AppError, AppResult};
use crate::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::state::AppState;

/// Outer envelope of an Events API request.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackPayload {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        team_id: String,
        event: SlackEvent,
    },
    #[serde(other)]
    Other,
}

/// Events the backend reacts to.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEvent {
    AppHomeOpened {
        user: String,
    },
    MemberJoinedChannel {
        user: String,
        #[serde(default)]
        inviter: Option<String>,
    },
    #[serde(other)]
    Other,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Handle a signed Events API request.
pub async fn events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    signature::verify(
        &state.config.slack_signing_secret,
        header(&headers, TIMESTAMP_HEADER),
        header(&headers, SIGNATURE_HEADER),
        &body,
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let payload: SlackPayload =
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;

    match payload {
        SlackPayload::UrlVerification { challenge } => {
            Ok(Json(json!({ "challenge": challenge })).into_response())
        }
        SlackPayload::EventCallback { team_id, event } => {
            handle_event(&state, &team_id, event).await?;
            Ok(StatusCode::OK.into_response())
        }
        SlackPayload::Other => Ok(StatusCode::OK.into_response()),
    }
}

async fn handle_event(state: &AppState, team_id: &str, event: SlackEvent) -> AppResult<()> {
    match event {
        SlackEvent::AppHomeOpened { user } => register_user(state, team_id, &user).await,
        SlackEvent::MemberJoinedChannel { user, inviter } => {
            if state.bot_user_id.as_deref() != Some(user.as_str()) {
                return Ok(());
            }
            match inviter {
                Some(inviter) => mark_onboarded(state, team_id, &inviter).await,
                None => Ok(()),
            }
        }
        SlackEvent::Other => Ok(()),
    }
}

/// Register a user the first time they open the app home.
async fn register_user(state: &AppState, team_id: &str, user_id: &str) -> AppResult<()> {
    if slack_user::get_slack_user(&state.db, team_id, user_id)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let new_user = NewSlackUser {
        user_id: user_id.to_string(),
        team_name: team_name(state, team_id).await,
        team_id: team_id.to_string(),
    };

    if let Some(id) = slack_user::create_slack_user(&state.db, &new_user).await? {
        tracing::info!(id, team_id = %team_id, user_id = %user_id, "Registered Slack user");
    }
    Ok(())
}

/// Workspace name from `team.info`, falling back to the team id.
async fn team_name(state: &AppState, team_id: &str) -> String {
    let Some(client) = &state.slack else {
        return team_id.to_string();
    };

    match client.team_info().await {
        Ok(team) => team["name"].as_str().unwrap_or(team_id).to_string(),
        Err(e) => {
            tracing::warn!(team_id = %team_id, error = %e, "team.info failed, using team id");
            team_id.to_string()
        }
    }
}

async fn mark_onboarded(state: &AppState, team_id: &str, user_id: &str) -> AppResult<()> {
    match slack_user::get_slack_user(&state.db, team_id, user_id).await? {
        Some(user) if !user.onboarded => {
            slack_user::set_slack_user_onboarded(&state.db, user.id, true).await?;
            tracing::info!(team_id = %team_id, user_id = %user_id, "Slack user onboarded");
        }
        Some(_) => {}
        None => {
            tracing::debug!(team_id = %team_id, user_id = %user_id, "Inviter is not registered");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_verification() {
        let payload: SlackPayload = serde_json::from_str(
            r#"{"token":"t","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P","type":"url_verification"}"#,
        )
        .unwrap();
        assert!(matches!(
            payload,
            SlackPayload::UrlVerification { ref challenge } if challenge.starts_with("3eZb")
        ));
    }

    #[test]
    fn test_parse_event_callback() {
        let payload: SlackPayload = serde_json::from_str(
            r#"{
                "type": "event_callback",
                "team_id": "T1",
                "event": {"type": "member_joined_channel", "user": "UBOT", "channel": "C1", "inviter": "U9"}
            }"#,
        )
        .unwrap();

        match payload {
            SlackPayload::EventCallback { team_id, event } => {
                assert_eq!(team_id, "T1");
                assert!(matches!(
                    event,
                    SlackEvent::MemberJoinedChannel { ref user, inviter: Some(ref inviter) }
                        if user == "UBOT" && inviter == "U9"
                ));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_unknown_types_parse_as_other() {
        let payload: SlackPayload =
            serde_json::from_str(r#"{"type":"app_rate_limited","team_id":"T1"}"#).unwrap();
        assert!(matches!(payload, SlackPayload::Other));

        let event: SlackEvent =
            serde_json::from_str(r#"{"type":"reaction_added","user":"U1"}"#).unwrap();
        assert!(matches!(event, SlackEvent::Other));
    }
}
