use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnigeError {
    #[error("Unsupported mediaserver URL: {0}")]
    UnsupportedUrl(String),

    #[error("Login required: no credentials for {0}")]
    LoginRequired(String),

    #[error("Unable to login: incorrect username and/or password")]
    LoginFailed,

    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error("No playable source found in page")]
    MediaNotFound,

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),
}

pub type UnigeResult<T> = Result<T, UnigeError>;
