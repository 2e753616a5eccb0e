use std::fmt;

macro_rules! err {
    ($kind:ident, $msg:literal) => {
        $crate::dex::error::DexError::new($crate::dex::error::ErrorKind::$kind, $msg)
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        $crate::dex::error::DexError::new($crate::dex::error::ErrorKind::$kind, &format!($fmtstr, $($args)*))
    };
}

macro_rules! fail {
    ($kind:ident, $msg:literal) => {
        return Err(err!($kind, $msg))
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        return Err(err!($kind, $fmtstr, $($args)*))
    };
}

/// The category of a [`DexError`].
///
/// Everything except [`ErrorKind::MethodNotFound`] and [`ErrorKind::MethodHasNoCode`] means
/// the container itself could not be trusted and the operation was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind
{
    BadMagic,
    BadHeaderSize,
    IndexOutOfRange,
    Truncated,
    Malformed,
    CodeSizeMismatch,
    MethodNotFound,
    MethodHasNoCode,
    Io,
}

impl fmt::Display for ErrorKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let s = match self
        {
            ErrorKind::BadMagic => "bad magic",
            ErrorKind::BadHeaderSize => "bad header size",
            ErrorKind::IndexOutOfRange => "index out of range",
            ErrorKind::Truncated => "truncated",
            ErrorKind::Malformed => "malformed",
            ErrorKind::CodeSizeMismatch => "code size mismatch",
            ErrorKind::MethodNotFound => "method not found",
            ErrorKind::MethodHasNoCode => "method has no code",
            ErrorKind::Io => "io error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DexError
{
    kind: ErrorKind,
    msg: String,
    contexts: Vec<String>,
}

impl DexError
{
    pub(crate) fn new(kind: ErrorKind, msg: &str) -> Self
    {
        DexError {
            kind,
            msg: msg.to_string(),
            contexts: Vec::new(),
        }
    }

    pub(crate) fn with_context(base: DexError, context: String) -> Self
    {
        let mut contexts = base.contexts;
        contexts.push(context);
        DexError { kind: base.kind, msg: base.msg, contexts }
    }

    pub fn kind(&self) -> ErrorKind
    {
        self.kind
    }

    /// True for the two outcomes a caller may want to report rather than treat as corruption.
    pub fn is_lookup_failure(&self) -> bool
    {
        matches!(self.kind, ErrorKind::MethodNotFound | ErrorKind::MethodHasNoCode)
    }
}

impl fmt::Display for DexError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}: {}", self.kind, self.msg)?;
        let mut connector = " for ";
        for context in &self.contexts
        {
            write!(f, "{}{}", connector, context)?;
            connector = " of ";
        }
        Ok(())
    }
}

impl std::error::Error for DexError {}

impl From<std::io::Error> for DexError
{
    fn from(e: std::io::Error) -> Self
    {
        DexError::new(ErrorKind::Io, &e.to_string())
    }
}
