use crate::components::MeetingRequest;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

/// Conference solution that yields a Google Meet link
pub const HANGOUTS_MEET: &str = "hangoutsMeet";
/// Entry point type of the video link
pub const VIDEO_ENTRY_POINT: &str = "video";

/// Calendar event insert payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    /// Left empty so the link is open to anyone who has it
    pub attendees: Vec<Attendee>,
    pub conference_data: ConferenceDataRequest,
}

impl EventRequest {
    /// Event for `request` asking Google to attach a new Meet conference
    pub fn new(request: &MeetingRequest, request_id: String) -> Self {
        Self {
            summary: request.title.clone(),
            description: "Google Meet created via slash command".to_string(),
            start: EventDateTime::utc(request.start_time),
            end: EventDateTime::utc(request.end_time),
            attendees: Vec::new(),
            conference_data: ConferenceDataRequest {
                create_request: CreateConferenceRequest {
                    request_id,
                    conference_solution_key: ConferenceSolutionKey {
                        key_type: HANGOUTS_MEET.to_string(),
                    },
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    fn utc(at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            date_time: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_zone: Some("UTC".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceDataRequest {
    pub create_request: CreateConferenceRequest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConferenceRequest {
    /// Must be unique per call or Google reuses an earlier conference
    pub request_id: String,
    pub conference_solution_key: ConferenceSolutionKey,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConferenceSolutionKey {
    #[serde(rename = "type")]
    pub key_type: String,
}

/// The parts of an inserted event we care about
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: Option<String>,
    pub hangout_link: Option<String>,
    pub conference_data: Option<ConferenceData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceData {
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPoint {
    pub entry_point_type: String,
    pub uri: Option<String>,
}

impl EventResponse {
    /// Video entry point URI, falling back to `hangoutLink`
    pub fn meeting_url(&self) -> Option<&str> {
        self.conference_data
            .as_ref()
            .and_then(|data| {
                data.entry_points
                    .iter()
                    .find(|ep| ep.entry_point_type == VIDEO_ENTRY_POINT)
                    .and_then(|ep| ep.uri.as_deref())
                    .filter(|url| !url.is_empty())
            })
            .or_else(|| self.hangout_link.as_deref().filter(|url| !url.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_event_payload_shape() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let request = MeetingRequest::new("Weekly Standup", start, 90).unwrap();
        let payload = serde_json::to_value(EventRequest::new(&request, "req-1".to_string())).unwrap();

        assert_eq!(payload["summary"], "Weekly Standup");
        assert_eq!(payload["start"]["dateTime"], "2024-05-01T09:00:00Z");
        assert_eq!(payload["end"]["dateTime"], "2024-05-01T10:30:00Z");
        assert_eq!(payload["attendees"], json!([]));
        assert_eq!(payload["conferenceData"]["createRequest"]["requestId"], "req-1");
        assert_eq!(
            payload["conferenceData"]["createRequest"]["conferenceSolutionKey"]["type"],
            "hangoutsMeet"
        );
    }

    #[test]
    fn test_video_entry_point_preferred() {
        let event: EventResponse = serde_json::from_value(json!({
            "id": "evt",
            "hangoutLink": "https://meet.google.com/fallback",
            "conferenceData": {
                "entryPoints": [
                    {"entryPointType": "phone", "uri": "tel:+1-555-0100"},
                    {"entryPointType": "video", "uri": "https://meet.google.com/abc-defg-hij"}
                ]
            }
        }))
        .unwrap();

        assert_eq!(event.meeting_url(), Some("https://meet.google.com/abc-defg-hij"));
    }

    #[test]
    fn test_hangout_link_fallback() {
        let event: EventResponse = serde_json::from_value(json!({
            "hangoutLink": "https://meet.google.com/xyz-abcd-efg",
            "conferenceData": {"entryPoints": [{"entryPointType": "phone", "uri": "tel:1"}]}
        }))
        .unwrap();

        assert_eq!(event.meeting_url(), Some("https://meet.google.com/xyz-abcd-efg"));
    }

    #[test]
    fn test_empty_video_uri_falls_back() {
        let event: EventResponse = serde_json::from_value(json!({
            "hangoutLink": "https://meet.google.com/xyz-abcd-efg",
            "conferenceData": {"entryPoints": [{"entryPointType": "video", "uri": ""}]}
        }))
        .unwrap();

        assert_eq!(event.meeting_url(), Some("https://meet.google.com/xyz-abcd-efg"));
    }

    #[test]
    fn test_no_link() {
        let event: EventResponse = serde_json::from_value(json!({"id": "evt"})).unwrap();
        assert_eq!(event.meeting_url(), None);

        let event: EventResponse =
            serde_json::from_value(json!({"id": "evt", "hangoutLink": ""})).unwrap();
        assert_eq!(event.meeting_url(), None);
    }
}
