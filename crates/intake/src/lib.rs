pub mod router;
pub mod sanitize;
pub mod validator;

pub use router::{route, route_raw, routing_table, GENERAL_ADMINISTRATION};
pub use sanitize::{SanitizePolicy, ScriptTagPolicy};
pub use validator::{Registration, ValidationError, ValidationRules, Validator};
