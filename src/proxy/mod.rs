// Forward proxy for the embedded Facebook view.
//
// The portfolio frontend renders facebook.com inside the desktop simulation
// by routing every request through this mount. Bodies and redirects are
// rewritten so the browser never leaves the proxy path space.

pub mod handler;
pub mod rewriter;

pub use handler::proxy_request;
pub use rewriter::UrlRewriter;
