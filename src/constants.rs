// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains. The first
//! group is the HAL vocabulary the normalizer reads; the rest are defaults
//! for the transport and the store.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Hypermedia vocabulary
// ---------------------------------------------------------------------------

/// Field holding a document's named link relations.
pub const LINKS_KEY: &str = "_links";

/// Field holding inlined documents; `items` inside it marks a collection page.
pub const EMBEDDED_KEY: &str = "_embedded";

/// The relation every resource and page must carry.
pub const SELF_REL: &str = "self";

/// Field under `_embedded` (and on a normalized page) holding the page items.
pub const ITEMS_KEY: &str = "items";

/// Key of the API root document.
pub const ROOT_KEY: &str = "/";

/// Pagination relations and count fields read by collection pages.
pub const NEXT_REL: &str = "next";
pub const PREV_REL: &str = "prev";
pub const TOTAL_ITEMS_KEY: &str = "totalItems";

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Environment variable consulted when no API root is given on the command line.
pub const API_ROOT_ENV: &str = "HALSTORE_API_ROOT";

// ---------------------------------------------------------------------------
// Transport defaults
// ---------------------------------------------------------------------------

/// Attempts per request, including the first one. 1 disables retries.
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 3;

/// Upper bound accepted for `--retries`.
pub const MAX_FETCH_ATTEMPTS: u32 = 10;

/// First backoff delay between attempts; doubles up to `RETRY_MAX_DELAY`.
pub const RETRY_INITIAL_DELAY: Duration = Duration::from_millis(200);
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// Per-request timeout for the HTTP transport.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// `Accept` header sent with every fetch.
pub const HAL_ACCEPT: &str = "application/hal+json, application/json;q=0.9";

// ---------------------------------------------------------------------------
// Store defaults
// ---------------------------------------------------------------------------

/// Buffered cache events per subscriber before slow receivers start lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Link-following depth for graph exploration from the command line.
pub const DEFAULT_EXPLORE_DEPTH: u8 = 2;

/// Hard ceiling on exploration depth.
pub const MAX_EXPLORE_DEPTH: u8 = 16;
