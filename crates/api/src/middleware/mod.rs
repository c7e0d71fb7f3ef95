pub mod logging;
pub mod metrics;
pub mod security_headers;
pub mod trace_id;
pub mod user_auth;

#[allow(unused_imports)]
pub use logging::init_logging;
#[allow(unused_imports)]
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
#[allow(unused_imports)]
pub use security_headers::security_headers_middleware;
#[allow(unused_imports)]
pub use trace_id::{trace_id_middleware, RequestId};
#[allow(unused_imports)]
pub use user_auth::{require_admin, require_staff, CurrentUser};
