// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod apple;
pub mod friends;
pub mod invite_codes;
pub mod leaderboard;
pub mod runs;
pub mod session;

pub use accounts::AccountService;
pub use apple::{AppleIdentity, AppleIdentityVerifier, AppleTokenError};
pub use friends::FriendService;
pub use leaderboard::{Leaderboard, LeaderboardService};
pub use runs::{RunPage, RunService};
pub use session::SessionManager;
