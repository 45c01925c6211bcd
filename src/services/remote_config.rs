use super::api::SourceHost;
use crate::config::error::ConfigError;
use crate::models::RemoteConfigReference;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Download a file through the source-hosting contents API.
///
/// # Arguments
/// * `host` - The source-hosting client
/// * `reference` - Repository coordinates and revision of the file
///
/// # Returns
/// The decoded file contents
///
/// # Errors
/// * [`ConfigError::FileDownload`] for any non-success status
/// * [`ConfigError::FileIsADirectory`] when the API returns a directory listing
/// * [`ConfigError::FileContentUnreadable`] when the response has no decodable `content`
pub async fn get_file_contents_using_api<H>(
    host: &H,
    reference: &RemoteConfigReference,
) -> Result<String, ConfigError>
where
    H: SourceHost + ?Sized,
{
    tracing::debug!("Fetching {} from the source host", reference);

    let response = host
        .get_contents(
            &reference.owner,
            &reference.repo,
            &reference.path,
            &reference.git_ref,
        )
        .await?;

    if !response.is_success() {
        return Err(ConfigError::FileDownload {
            reference: reference.to_string(),
            status: response.status,
        });
    }

    if response.data.is_array() {
        return Err(ConfigError::FileIsADirectory {
            reference: reference.to_string(),
        });
    }

    let unreadable = || ConfigError::FileContentUnreadable {
        reference: reference.to_string(),
    };

    let encoded = response
        .data
        .get("content")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(unreadable)?;

    // The API wraps base64 content at 60 columns
    let encoded: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(encoded).map_err(|_| unreadable())?;

    String::from_utf8(bytes).map_err(|_| unreadable())
}
