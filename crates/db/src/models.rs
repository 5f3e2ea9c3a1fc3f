//! Row structs that map 1-to-1 onto the store's tables.
//!
//! Every table has three shapes: the persisted row, the insert payload
//! (server-generated columns omitted) and the update payload (every column
//! optional).  A static [`Table`] schema describes the columns so the
//! repository and the in-memory store can stay generic.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Column that holds the server-generated creation timestamp.
pub const CREATED_AT: &str = "created_at";

/// Column that holds the server-generated identifier.
pub const ID: &str = "id";

// ---------------------------------------------------------------------------
// Table schema
// ---------------------------------------------------------------------------

/// How rows of a table are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// A UUID `id` column generated by the store.
    Generated,
    /// A caller-supplied column that must be unique.
    Natural(&'static str),
}

/// Static description of a table's columns.
#[derive(Debug, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub identity: Identity,
}

impl Table {
    /// `true` if `column` exists on this table, generated columns included.
    pub fn has_column(&self, column: &str) -> bool {
        column == CREATED_AT
            || (column == ID && self.identity == Identity::Generated)
            || self.required.contains(&column)
            || self.optional.contains(&column)
    }
}

pub const CONTACT_MESSAGES: Table = Table {
    name: "contact_messages",
    required: &["first_name", "last_name", "email", "phone", "message"],
    optional: &["course_interest"],
    identity: Identity::Generated,
};

pub const COURSE_APPLICATIONS: Table = Table {
    name: "course_applications",
    required: &[
        "full_name",
        "email",
        "phone",
        "course_name",
        "experience_level",
        "interest_message",
    ],
    optional: &[],
    identity: Identity::Generated,
};

pub const DEMO_APPLICATIONS: Table = Table {
    name: "demo_applications",
    required: &["name", "phone", "email", "course_for_demo", "available_time"],
    optional: &["preferred_date"],
    identity: Identity::Generated,
};

pub const NEWSLETTER_SUBSCRIPTIONS: Table = Table {
    name: "newsletter_subscriptions",
    required: &["email"],
    optional: &[],
    identity: Identity::Natural("email"),
};

pub const EVENT_REGISTRATIONS: Table = Table {
    name: "event_registrations",
    required: &[
        "name",
        "degree",
        "year",
        "college_name",
        "university_name",
        "contact_number",
        "email_id",
        "certificate_code",
    ],
    optional: &["alternate_number"],
    identity: Identity::Generated,
};

/// Every table in the schema.
pub const TABLES: [&Table; 5] = [
    &CONTACT_MESSAGES,
    &COURSE_APPLICATIONS,
    &DEMO_APPLICATIONS,
    &NEWSLETTER_SUBSCRIPTIONS,
    &EVENT_REGISTRATIONS,
];

/// A persisted entity: its row type plus the payload types used to write it.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    type Insert: Serialize + Send + Sync;
    type Update: Serialize + Send + Sync;

    const TABLE: &'static Table;
}

// ---------------------------------------------------------------------------
// contact_messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub course_interest: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContactMessage {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub course_interest: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactMessageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// `Some(None)` clears the column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_interest: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Entity for ContactMessage {
    type Insert = NewContactMessage;
    type Update = ContactMessageUpdate;

    const TABLE: &'static Table = &CONTACT_MESSAGES;
}

// ---------------------------------------------------------------------------
// course_applications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseApplication {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub course_name: String,
    pub experience_level: String,
    pub interest_message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCourseApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub course_name: String,
    pub experience_level: String,
    pub interest_message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CourseApplicationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_message: Option<String>,
}

impl Entity for CourseApplication {
    type Insert = NewCourseApplication;
    type Update = CourseApplicationUpdate;

    const TABLE: &'static Table = &COURSE_APPLICATIONS;
}

// ---------------------------------------------------------------------------
// demo_applications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoApplication {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub course_for_demo: String,
    pub available_time: String,
    pub preferred_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDemoApplication {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub course_for_demo: String,
    pub available_time: String,
    #[serde(default)]
    pub preferred_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DemoApplicationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_for_demo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<Option<String>>,
}

impl Entity for DemoApplication {
    type Insert = NewDemoApplication;
    type Update = DemoApplicationUpdate;

    const TABLE: &'static Table = &DEMO_APPLICATIONS;
}

// ---------------------------------------------------------------------------
// newsletter_subscriptions
// ---------------------------------------------------------------------------

/// Keyed by `email`; there is no generated id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsletterSubscription {
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewNewsletterSubscription {
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewsletterSubscriptionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Entity for NewsletterSubscription {
    type Insert = NewNewsletterSubscription;
    type Update = NewsletterSubscriptionUpdate;

    const TABLE: &'static Table = &NEWSLETTER_SUBSCRIPTIONS;
}

// ---------------------------------------------------------------------------
// event_registrations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRegistration {
    pub id: Uuid,
    pub name: String,
    pub degree: String,
    pub year: String,
    pub college_name: String,
    pub university_name: String,
    pub contact_number: String,
    pub alternate_number: Option<String>,
    pub email_id: String,
    pub certificate_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEventRegistration {
    pub name: String,
    pub degree: String,
    pub year: String,
    pub college_name: String,
    pub university_name: String,
    pub contact_number: String,
    #[serde(default)]
    pub alternate_number: Option<String>,
    pub email_id: String,
    pub certificate_code: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EventRegistrationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_number: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_code: Option<String>,
}

impl Entity for EventRegistration {
    type Insert = NewEventRegistration;
    type Update = EventRegistrationUpdate;

    const TABLE: &'static Table = &EVENT_REGISTRATIONS;
}
