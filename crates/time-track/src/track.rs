//! Time track resources.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{Client, Result};

/// A time track: one unit of work against a project.
///
/// Unset fields are omitted from request bodies so that an update only
/// touches what the caller filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeTrack {
    /// Server-assigned id; zero until created.
    #[serde(skip_serializing_if = "is_zero")]
    pub id: u64,
    /// Project the work is booked on.
    #[serde(skip_serializing_if = "is_zero")]
    pub project_id: u64,
    /// RFC 3339 start time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "is_zero")]
    pub duration: u64,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Whether the time is billable.
    #[serde(skip_serializing_if = "is_false")]
    pub billable: bool,
    /// Tracking profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Server-side status (`running`, `stopped`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Free-form tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Creation timestamp, set by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp, set by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Owner, set by the server.
    #[serde(skip_serializing_if = "is_zero")]
    pub user_id: u64,
}

/// Request envelope: the API nests the record under `time_track`.
#[derive(Serialize)]
struct TimeTrackRequest<'a> {
    /// Wrapped record.
    time_track: &'a TimeTrack,
}

/// Serde helper for omitting zero ids and durations.
fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// Serde helper for omitting false flags.
fn is_false(v: &bool) -> bool {
    !*v
}

impl Client {
    /// Create a new running time track and return its id.
    pub async fn create_time_track(&self, track: &TimeTrack) -> Result<u64> {
        let created: TimeTrack = self
            .send(
                Method::POST,
                "time_tracks",
                Some(&TimeTrackRequest { time_track: track }),
            )
            .await?;
        Ok(created.id)
    }

    /// Update an existing time track.
    pub async fn update_time_track(&self, track: &TimeTrack) -> Result<TimeTrack> {
        self.send(
            Method::PUT,
            &format!("time_tracks/{}", track.id),
            Some(&TimeTrackRequest { time_track: track }),
        )
        .await
    }

    /// Fetch a time track by id.
    pub async fn show_time_track(&self, id: u64) -> Result<TimeTrack> {
        self.send::<TimeTrack, ()>(Method::GET, &format!("time_tracks/{}", id), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unset_fields_are_omitted() {
        let track = TimeTrack {
            project_id: 7,
            profile: Some("dev".into()),
            ..TimeTrack::default()
        };
        let body = serde_json::to_value(TimeTrackRequest { time_track: &track }).unwrap();
        assert_eq!(body, json!({"time_track": {"project_id": 7, "profile": "dev"}}));
    }

    #[test]
    fn server_records_decode_with_missing_fields() {
        let track: TimeTrack =
            serde_json::from_value(json!({"id": 3, "project_id": 7, "status": "running"}))
                .unwrap();
        assert_eq!(track.id, 3);
        assert_eq!(track.status.as_deref(), Some("running"));
        assert!(track.tags.is_empty());
    }
}
