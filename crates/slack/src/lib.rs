//! Slack surface of the food-truck bot.
//!
//! - **Commands** (`commands`) - mention text grammar: `help`, `find trucks`, `find events`
//! - **Respond** (`respond`) - directory lookups per command, producing ordered sections
//! - **Format** (`format`) - mrkdwn fragments: links, stars, category emoji, time windows
//! - **Blocks** (`blocks`) - Block Kit rendering and pagination
//! - **Events** (`events`) - Events API payloads and the handler dispatcher
//! - **Client** (`client`) - `chat.postMessage` delivery
//!
//! # Architecture
//!
//! ```text
//! Events API → InboundEvent → EventDispatcher → MentionHandler
//!                                                   ↓
//!            chat.postMessage ← blocks::render ← Responder → FoodTruckDirectory
//! ```

pub mod blocks;
pub mod client;
pub mod commands;
pub mod events;
pub mod format;
pub mod respond;
