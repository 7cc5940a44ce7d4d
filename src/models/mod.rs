pub mod query;
pub mod record;
pub mod response;

pub use query::Query;
pub use record::{into_record, record_key, Record};
pub use response::{Response, StreamingResponse};
