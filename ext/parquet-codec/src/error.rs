use thiserror::Error;

/// Errors raised while decoding or encoding metadata and column values.
#[derive(Error, Debug)]
pub enum ParquetError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed compact protocol input. Fatal to the struct being parsed.
    #[error("protocol error at byte {offset} (fields [{context}]): {message}")]
    Protocol {
        offset: usize,
        context: String,
        message: String,
    },

    /// Zero or several codecs claimed a schema element
    #[error("codec mismatch: {0}")]
    CodecMismatch(String),

    #[error("buffer underflow at byte {offset}: needed {needed} bytes, {remaining} remaining")]
    BufferUnderflow {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A buffer came back to a pool that never rented it
    #[error("pool misuse: {0}")]
    PoolMisuse(String),

    #[error("invalid schema: {0}")]
    Schema(String),

    /// A value does not fit the physical or logical type of its column
    #[error("cannot convert value: {0}")]
    Conversion(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Page or footer contents disagree with what was declared
    #[error("invalid data: {0}")]
    DataValidation(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Another error annotated with what the caller was doing
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ParquetError>,
    },
}

pub type Result<T> = std::result::Result<T, ParquetError>;

macro_rules! message_constructors {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            pub fn $name<S: Into<String>>(msg: S) -> Self {
                ParquetError::$variant(msg.into())
            }
        )*
    };
}

impl ParquetError {
    message_constructors! {
        codec_mismatch => CodecMismatch,
        pool_misuse => PoolMisuse,
        schema => Schema,
        conversion => Conversion,
        invalid_argument => InvalidArgument,
        data_validation => DataValidation,
        unsupported => Unsupported,
        internal => Internal,
    }

    pub fn protocol<C: Into<String>, M: Into<String>>(offset: usize, context: C, message: M) -> Self {
        ParquetError::Protocol {
            offset,
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn underflow(offset: usize, needed: usize, remaining: usize) -> Self {
        ParquetError::BufferUnderflow {
            offset,
            needed,
            remaining,
        }
    }

    /// True for malformed metadata framing, looking through any context layers.
    pub fn is_protocol(&self) -> bool {
        match self {
            ParquetError::Protocol { .. } => true,
            ParquetError::Context { source, .. } => source.is_protocol(),
            _ => false,
        }
    }
}

/// Attach a description of the failing operation to an error.
pub trait ErrorContext<T> {
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    /// Like [`ErrorContext::context`], building the message only on failure.
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ParquetError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.with_context(|| ctx)
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| ParquetError::Context {
            context: f().into(),
            source: Box::new(e.into()),
        })
    }
}
