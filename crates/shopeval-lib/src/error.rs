use thiserror::Error;

/// Errors that can occur while orchestrating an evaluation run.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The agent endpoint could not be reached at all.
    #[error("endpoint unreachable at {url}: {source}")]
    EndpointUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// No response arrived within the transport's bounded timeout.
    #[error("request to {url} timed out")]
    RequestTimeout { url: String },

    /// The discovery document could not be parsed as an agent card.
    #[error("malformed agent card from {url}: {reason}")]
    EndpointMalformed { url: String, reason: String },

    /// The remote agent answered with a JSON-RPC error envelope.
    #[error("rpc failure from {url}: code {code}: {message}")]
    RpcFailure {
        url: String,
        code: i64,
        message: String,
    },

    /// A launched agent process never became ready.
    #[error("agent process '{name}' failed to start")]
    StartupFailed { name: String },

    /// The solver's reply yielded no usable action string.
    #[error("no usable action in solver reply: {reason}")]
    ActionParseError { reason: String },

    /// The environment rejected the forwarded action.
    #[error("environment rejected action '{action}': {reason}")]
    EnvironmentRejected { action: String, reason: String },

    /// The response message carried no extractable text part.
    #[error("response from {url} contained no text part")]
    EmptyReply { url: String },

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    /// Maps a reqwest failure for `url` onto the transport taxonomy.
    pub fn from_request(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::RequestTimeout {
                url: url.to_string(),
            }
        } else {
            Self::EndpointUnreachable {
                url: url.to_string(),
                source,
            }
        }
    }

    /// True for failures the evaluation loop recovers from in-episode.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ActionParseError { .. } | Self::EnvironmentRejected { .. }
        )
    }
}
