// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod place;
pub mod route;
pub mod token;

pub use activity::ActivitySnapshot;
pub use place::{Coordinate, Place};
pub use route::{RouteLink, RouteRecord};
pub use token::TokenPair;
