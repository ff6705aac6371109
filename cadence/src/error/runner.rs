use thiserror::Error;

#[derive(Error, Debug)]
#[error("starting the bot failed: {:?}", .0)]
pub enum StartError {
    TwilightHttp(#[from] twilight_http::Error),
    DeserialiseBody(#[from] twilight_http::response::DeserializeBodyError),
    Reqwest(#[from] reqwest::Error),
    WaitUntilShutdown(#[from] WaitUntilShutdownError),
}

#[derive(Error, Debug)]
#[error("waiting for a shutdown signal failed: {:?}", .0)]
pub enum WaitForSignalError {
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
#[error("shutting down failed: {:?}", .0)]
pub enum WaitUntilShutdownError {
    WaitForSignal(#[from] WaitForSignalError),
}
