// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod friendship;
pub mod leaderboard;
pub mod run;
pub mod session;
pub mod user;

pub use friendship::{FriendEntry, Friendship, FriendshipStatus};
pub use leaderboard::{LeaderboardEntry, LeaderboardMetric};
pub use run::{BatchItemResult, BatchItemStatus, Run, RunSummary, RunUpload, UpsertOutcome};
pub use session::{SessionResult, TokenPair};
pub use user::{User, UserProfile};
