//! Fallback Content
//!
//! Synthesized responses served when neither the cache nor the network can
//! answer.

use crate::models::CachedResponse;
use crate::worker::manifest::AssetKind;

/// Self-contained offline notice. No external references.
const OFFLINE_DOCUMENT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Offline</title>
<style>
body { font-family: system-ui, sans-serif; margin: 0; display: flex; align-items: center; justify-content: center; min-height: 100vh; background: #f5f5f5; color: #333; }
main { text-align: center; padding: 2rem; }
</style>
</head>
<body>
<main>
<h1>You are offline</h1>
<p>This page is not available offline yet. Reconnect and reload to continue.</p>
</main>
</body>
</html>
"#;

const OFFLINE_SCRIPT: &str = "/* offline: script unavailable */\n";

/// The offline notice served for unresolvable navigations (always 200).
pub fn offline_document() -> CachedResponse {
    CachedResponse::ok("text/html; charset=utf-8", OFFLINE_DOCUMENT)
}

/// The typed fallback served for an unresolvable asset.
///
/// Stylesheets get an empty sheet and scripts a no-op so the page still
/// parses; anything else reports its absence with a 404.
pub fn asset_fallback(path: &str) -> CachedResponse {
    match AssetKind::from_path(path) {
        AssetKind::Stylesheet => CachedResponse::ok("text/css", ""),
        AssetKind::Script => CachedResponse::ok("application/javascript", OFFLINE_SCRIPT),
        _ => CachedResponse::new(
            404,
            "text/plain; charset=utf-8",
            format!("{} is not available offline", path),
        ),
    }
}
