// Vault services
// Services provide stateless helpers and collaborator contracts: URLs, views, store, feed, identity, settings, themes.

pub mod bookmark_view;
pub mod change_feed;
pub mod data_store;
pub mod identity_service;
pub mod settings_engine;
pub mod theme_engine;
pub mod url_normalizer;
