pub mod transport;

pub use transport::{
    ByteStream, HttpRequest, HttpTransport, RawResponse, RawStreamingResponse, RequestBody,
    Transport,
};
