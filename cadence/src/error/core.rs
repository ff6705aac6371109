use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable `{}` is not set", .0)]
    Missing(&'static str),
    #[error("environment variable `{key}` has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}
