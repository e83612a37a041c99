// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Authenticated HTTP access to the control-plane API server.

pub mod client;

pub use client::{ApiClient, ApiResponse, ApiStream};
