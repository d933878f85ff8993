//! Bookmark content archiver library.
//!
//! When a bookmark record is created, this library fetches the content
//! behind it (article, image, audio, video), normalizes it into an
//! uploadable payload, and stores a durable copy in Backblaze B2,
//! returning a stable public URL. It also provides the thin provider
//! metadata lookups (GitHub, Scryfall, StackExchange, TMDB, YouTube,
//! MangaDex) used to enrich non-bookmark records.

pub mod archive;
pub mod config;
pub mod fetch;
pub mod filename;
pub mod media_type;
pub mod meta;
pub mod storage;
