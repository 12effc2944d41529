//! Order lifecycle, loyalty points and order tracking for the SapJuice apps.
//!
//! Each store (profiles, orders, reviews) runs as a [`ResourceActor`] owning its
//! table; typed clients implement the store traits in [`stores`], and the
//! services ([`OrderLifecycle`], [`OrderTracker`], [`AdminConsole`]) are written
//! against those traits.
//!
//! [`ResourceActor`]: actor_framework::ResourceActor
//! [`OrderLifecycle`]: lifecycle::OrderLifecycle
//! [`OrderTracker`]: tracking::OrderTracker
//! [`AdminConsole`]: admin::AdminConsole

pub mod actor_framework;
pub mod admin;
pub mod app_system;
pub mod clients;
pub mod config;
pub mod domain;
pub mod ledger;
pub mod lifecycle;
pub mod notification;
pub mod order_actor;
pub mod profile_actor;
pub mod review_actor;
pub mod reviews;
pub mod stores;
pub mod tracking;

#[cfg(test)]
mod mock_framework;
