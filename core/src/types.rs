//! Response and payload DTOs for the three sandbox services.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently, the
//! same shapes the real hosted services return. Integration tests catch any
//! drift between the two crates.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User-management sandbox
// ---------------------------------------------------------------------------

/// Body of a successful `POST /api/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
}

/// Body of a rejected request, e.g. `{"error": "Missing password"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

/// `GET /api/users/{id}` wraps the user in a `data` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEnvelope {
    pub data: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPage {
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
    pub total_pages: u32,
    pub data: Vec<User>,
}

/// Payload for creating or updating a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInput {
    pub name: String,
    pub job: String,
}

/// `POST /api/users` echoes the payload with a generated id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedUser {
    pub id: String,
    pub name: String,
    pub job: String,
}

// ---------------------------------------------------------------------------
// Placeholder JSON API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

/// Payload for creating or replacing a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Inventory API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image: String,
}
