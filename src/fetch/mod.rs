//! URL fetching and redirect resolution.
//!
//! - `request`: single GET with redirects disabled
//! - `normalize`: transport-safe URLs and market URI rewriting
//! - `redirects`: one-hop resolver and the history walker

mod normalize;
mod redirects;
mod request;

pub use normalize::{fix_market_url, is_market_url, prepare_url};
pub use redirects::{
    get_redirect_history, Redirect, RedirectHistory, RedirectHop, RedirectType, ResolveHop,
    Resolver, UrlPatterns, WalkOptions,
};
pub use request::{FetchResponse, Fetcher, HttpFetcher};
