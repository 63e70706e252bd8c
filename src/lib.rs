// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Ski-Tracker: run sync, friends and season leaderboards for skiers
//!
//! This crate provides the backend API for the mobile app: accounts
//! (email/password and Sign in with Apple), idempotent run upload, a friend
//! graph and season leaderboards, backed by PostgreSQL.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{
    AccountService, AppleIdentityVerifier, FriendService, LeaderboardService, RunService,
    SessionManager,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub sessions: Arc<SessionManager>,
    pub accounts: AccountService,
    pub runs: RunService,
    pub friends: FriendService,
    pub leaderboard: LeaderboardService,
}

impl AppState {
    /// Wire every service to the same database handle.
    pub fn new(config: Config, db: Db, apple: Arc<AppleIdentityVerifier>) -> Self {
        let sessions = Arc::new(SessionManager::new(&config, db.clone()));

        Self {
            accounts: AccountService::new(db.clone(), sessions.clone(), apple),
            runs: RunService::new(db.clone()),
            friends: FriendService::new(db.clone()),
            leaderboard: LeaderboardService::new(db.clone()),
            sessions,
            config,
            db,
        }
    }
}
