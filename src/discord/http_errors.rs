// Helpers for reading Discord HTTP failures.

use serenity::http::HttpError;

/// HTTP status of a failed Discord API call, if the failure came from Discord.
pub fn status_of(err: &serenity::Error) -> Option<u16> {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            Some(response.status_code.as_u16())
        }
        _ => None,
    }
}
