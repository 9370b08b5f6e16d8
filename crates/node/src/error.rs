//! A bunch of wrap errors.
use chord_core::consts::KEY_NOT_FOUND_CODE;
use chord_core::consts::RING_ERROR_CODE;
use chord_core::consts::ROUTING_EXHAUSTED_CODE;

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors enum mapping global custom errors.
/// The error type can be expressed in decimal, where the high decs represent
/// the error category and the low decs represent the error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
#[repr(u32)]
pub enum Error {
    #[error("Connect remote rpc server failed: {0}.")]
    RemoteRpcError(String) = 100,
    #[error("Invalid method.")]
    InvalidMethod = 101,
    #[error("Invalid params: {0}")]
    InvalidParams(String) = 102,
    #[error("Invalid address: {0}")]
    InvalidAddress(String) = 200,
    #[error("Bind listener failed: {0}")]
    BindError(String) = 201,
    #[error("Nameserver request failed: {0}")]
    NameserverError(String) = 300,
    #[error("Invalid logging level: {0}")]
    InvalidLoggingLevel(String) = 400,
    #[error("Create File Error: {0}")]
    CreateFileError(String) = 500,
    #[error("Open File Error: {0}")]
    OpenFileError(String) = 501,
    #[error("Cannot find home directory")]
    HomeDirError = 502,
    #[error("Cannot find parent directory")]
    ParentDirError = 503,
    #[error("Serde json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error) = 600,
    #[error("Serde yaml error: {0}")]
    SerdeYamlError(#[from] serde_yaml::Error) = 601,
    #[error("Core error: {0}")]
    CoreError(#[from] chord_core::error::Error) = 700,
}

impl Error {
    fn discriminant(&self) -> u32 {
        // SAFETY: `Self` is `repr(u32)`, so its layout is a `repr(C)` union of `repr(C)`
        // structs that all start with the `u32` discriminant.
        // ref: https://doc.rust-lang.org/std/mem/fn.discriminant.html
        unsafe { *<*const _>::from(self).cast::<u32>() }
    }

    pub fn code(&self) -> u32 {
        self.discriminant()
    }

    /// JSON-RPC error code put on the wire. Ring failures use the codes callers
    /// classify on, everything else the node's own code.
    pub fn rpc_code(&self) -> i64 {
        match self {
            Error::CoreError(e) if e.is_not_found() => KEY_NOT_FOUND_CODE,
            Error::CoreError(chord_core::error::Error::RoutingExhausted(_)) => {
                ROUTING_EXHAUSTED_CODE
            }
            Error::CoreError(_) => RING_ERROR_CODE,
            e => e.code().into(),
        }
    }
}

impl From<Error> for jsonrpc_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidMethod => jsonrpc_core::Error::method_not_found(),
            Error::InvalidParams(msg) => jsonrpc_core::Error::invalid_params(msg),
            e => Self {
                code: jsonrpc_core::ErrorCode::ServerError(e.rpc_code()),
                message: e.to_string(),
                data: None,
            },
        }
    }
}

impl From<chord_rpc::error::Error> for Error {
    fn from(e: chord_rpc::error::Error) -> Self {
        match e {
            chord_rpc::error::Error::InvalidMethod => Error::InvalidMethod,
            chord_rpc::error::Error::RpcError(v) => Error::RemoteRpcError(v.to_string()),
            e => Error::RemoteRpcError(e.to_string()),
        }
    }
}
