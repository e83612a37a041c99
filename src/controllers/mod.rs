// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Polling-driven lifecycle operations for apps.

pub mod app;

pub use app::{AppController, PollSettings, WatchStream};
