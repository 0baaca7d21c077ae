//! # Trellis Router
//!
//! File-based route resolution: the routes directory *is* the routing
//! table. Directories are static path segments, `[name]` directories and
//! filename stems are dynamic segments, and a `.get`/`.post`/`.put`/
//! `.delete`/`.patch` suffix before the extension pins a handler to one
//! HTTP method (no suffix means GET, and only GET).
//!
//! ```text
//! routes/
//! ├── index.php                          GET /
//! ├── about.php                          GET /about
//! ├── api/
//! │   ├── users.php                      GET /api/users
//! │   └── users.post.php                 POST /api/users
//! ├── users/[id]/index.php               GET /users/42   {id: "42"}
//! └── products/[category]-[id].php       GET /products/tools-7
//! ```
//!
//! Resolution either walks the live filesystem or consults a prebuilt
//! [`RouteIndex`] kept fresh by [`RouteCache`]: the index is persisted as
//! JSON and rebuilt whenever anything under the routes root is newer than
//! the last build.
//!
//! ## Example
//!
//! ```no_run
//! use trellis_router::{Router, RouterConfig, RouteRequest};
//!
//! let router = Router::new(RouterConfig::default()).unwrap();
//! let request = RouteRequest::parse("GET", "/users/42").unwrap();
//! if let Some(found) = router.resolve(&request).unwrap() {
//!     println!("{} {:?}", found.handler_path.display(), found.params);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod request;
pub mod resolver;
pub mod router;
pub mod segment;

pub use cache::{CacheInfo, CacheRecord, RouteCache};
pub use config::RouterConfig;
pub use error::RouterError;
pub use index::RouteIndex;
pub use request::RouteRequest;
pub use resolver::{resolve_from_fs, resolve_with_index, Resolved};
pub use router::{RouteMatch, Router};
pub use segment::Method;
