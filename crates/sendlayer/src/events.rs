//! Delivery events query

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SendLayerError};
use crate::gateway::Gateway;
use crate::transport::Method;

/// Event kinds the events endpoint can filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Accepted,
    Rejected,
    Delivered,
    Opened,
    Clicked,
    Unsubscribed,
    Complained,
    Failed,
}

impl EventType {
    pub const ALL: [EventType; 8] = [
        EventType::Accepted,
        EventType::Rejected,
        EventType::Delivered,
        EventType::Opened,
        EventType::Clicked,
        EventType::Unsubscribed,
        EventType::Complained,
        EventType::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Accepted => "accepted",
            EventType::Rejected => "rejected",
            EventType::Delivered => "delivered",
            EventType::Opened => "opened",
            EventType::Clicked => "clicked",
            EventType::Unsubscribed => "unsubscribed",
            EventType::Complained => "complained",
            EventType::Failed => "failed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = SendLayerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(EventType::as_str).collect();
                SendLayerError::validation(format!(
                    "Invalid event type: '{}'. Valid types are: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// Filters for [`Events::get_all`]; every field is optional
#[derive(Debug, Clone, Default)]
pub struct GetEventsOptions {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub event: Option<EventType>,
    pub message_id: Option<String>,
    /// Number of events to return (1-100)
    pub retrieve_count: Option<u32>,
}

impl GetEventsOptions {
    /// Check the filters against the current time
    pub fn validate(&self) -> Result<()> {
        self.validate_at(Utc::now())
    }

    fn validate_at(&self, now: DateTime<Utc>) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end <= start
        {
            return Err(SendLayerError::validation(
                "End date must be after start date",
            ));
        }

        if self.start_date.is_some_and(|d| d > now) || self.end_date.is_some_and(|d| d > now) {
            return Err(SendLayerError::validation("Dates cannot be in the future"));
        }

        if let Some(count) = self.retrieve_count
            && !(1..=100).contains(&count)
        {
            return Err(SendLayerError::validation(
                "Retrieve count must be an integer between 1 and 100",
            ));
        }

        Ok(())
    }

    /// Query parameters for the present filters
    fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(start) = self.start_date {
            params.push(("StartDate".to_string(), start.timestamp().to_string()));
        }
        if let Some(end) = self.end_date {
            params.push(("EndDate".to_string(), end.timestamp().to_string()));
        }
        if let Some(event) = self.event {
            params.push(("Event".to_string(), event.as_str().to_string()));
        }
        if let Some(message_id) = &self.message_id {
            params.push(("MessageId".to_string(), message_id.clone()));
        }
        if let Some(count) = self.retrieve_count {
            params.push(("RetrieveCount".to_string(), count.to_string()));
        }
        params
    }
}

/// Response from `GET events`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetEventsResponse {
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// One delivery event
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    pub event: Option<String>,
    pub logged_at: Option<i64>,
    pub log_level: Option<String>,
    pub message: Option<EventMessage>,
    pub reason: Option<String>,
    pub ip: Option<String>,
    pub geo_location: Option<GeoLocation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventMessage {
    pub headers: Option<MessageHeaders>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MessageHeaders {
    pub message_id: Option<String>,
    pub from: Vec<String>,
    pub reply_to: Vec<Value>,
    pub to: Vec<String>,
    pub cc: Vec<Value>,
    pub bcc: Vec<Value>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GeoLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// Events resource
pub struct Events<'a> {
    gateway: &'a Gateway,
}

impl<'a> Events<'a> {
    pub(crate) fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    /// Query delivery events matching `options`
    pub fn get_all(&self, options: &GetEventsOptions) -> Result<GetEventsResponse> {
        options.validate()?;
        self.gateway
            .request_as(Method::Get, "events", options.to_params(), None)
    }
}
