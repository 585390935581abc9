pub mod buffer;
pub mod errors;
pub mod mode;
pub mod pipe;
pub mod stream;

pub use errors::{Result, StreamError};
pub use mode::OpenMode;
pub use pipe::PipeRole;
pub use stream::Stream;

/// How many bytes a stream stages between the caller and its descriptor.
pub const BUFFER_CAPACITY: usize = 4096;
