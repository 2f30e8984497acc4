// Copyright 2026 Docket Contributors
// SPDX-License-Identifier: Apache-2.0

//! Docket library — court cause-list capture engine.
//!
//! Scrapes a paginated cause-list, drives a browser through the
//! view-details / go-back cycle for each case, snapshots detail pages to
//! PDF, consolidates everything belonging to one case into a single
//! artifact, and archives it all in SQLite.

#![allow(clippy::new_without_default)]

pub mod captcha;
pub mod capture;
pub mod cli;
pub mod fetch;
pub mod listing;
pub mod renderer;
pub mod store;
