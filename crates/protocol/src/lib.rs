pub mod codec;
pub mod constants;
pub mod messages;

// Re-export primary types for convenience.
pub use codec::{DecodeError, decode_request, encode_line};
pub use constants::CommandKind;
pub use messages::{
    Action, DownloadRequest, InitRequest, InitResponse, Operation, Request, Response,
    UploadRequest, WireError,
};
