//! Paygate - Razorpay payment verification and entitlement provisioning
//!
//! This library provides the core payment workflow: order creation against
//! the Razorpay gateway, signature verification of client confirmations and
//! gateway webhooks, idempotent status transitions, and exactly-once
//! provisioning of the purchased entitlement under at-least-once webhook
//! delivery.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod gateway;
pub mod handlers;
pub mod id;
pub mod models;
pub mod pricing;
pub mod provisioning;
pub mod signature;
