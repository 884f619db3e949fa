//! Upstream HTTP calls made during request verification.
//!
//! - [`ShopProbe`]: the live token check seam
//! - [`RestShopProbe`]: default probe hitting the Admin REST `shop` resource
//! - [`HttpError`]: failures of those calls
//!
//! No retries are performed; a failed probe is either a re-auth signal
//! (`401`) or an error for the caller.

mod errors;
mod shop_probe;

pub use errors::HttpError;
pub use shop_probe::{RestShopProbe, ShopProbe, SDK_VERSION};
