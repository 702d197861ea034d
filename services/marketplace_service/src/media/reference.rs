use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

/// Marker separating the host of an S3 object URL from the encoded object key.
const OBJECT_HOST_SUFFIX: &str = "amazonaws.com/";

/// Prefix of references to files served from the local upload directory.
pub const LOCAL_PREFIX: &str = "/uploads/";

/// Characters kept verbatim when encoding an object key into its URL.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'/').remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Where the bytes behind a stored asset reference live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    ObjectStore { key: String },
    Local { path: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Unrecognized asset reference format: {0}")]
    Unrecognized(String),

    #[error("Object key in asset reference is not valid UTF-8: {0}")]
    Encoding(String),
}

impl AssetLocation {
    pub fn parse(reference: &str) -> Result<Self, ReferenceError> {
        if let Some((_, encoded_key)) = reference.split_once(OBJECT_HOST_SUFFIX) {
            let key = percent_decode_str(encoded_key)
                .decode_utf8()
                .map_err(|_| ReferenceError::Encoding(reference.to_string()))?;
            return Ok(AssetLocation::ObjectStore { key: key.into_owned() });
        }

        if reference.starts_with(LOCAL_PREFIX) {
            return Ok(AssetLocation::Local {
                path: reference.to_string(),
            });
        }

        Err(ReferenceError::Unrecognized(reference.to_string()))
    }
}

/// Object URL recorded for an object uploaded to `bucket`.
pub fn object_url(bucket: &str, region: &str, key: &str) -> String {
    format!(
        "https://{}.s3.{}.{}{}",
        bucket,
        region,
        OBJECT_HOST_SUFFIX,
        utf8_percent_encode(key, KEY_ENCODE_SET)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_url_and_decodes_key() {
        let reference = "https://media.s3.us-east-1.amazonaws.com/courses/videos/abc-1700000000000-intro%20part%201.mp4";

        assert_eq!(
            AssetLocation::parse(reference),
            Ok(AssetLocation::ObjectStore {
                key: "courses/videos/abc-1700000000000-intro part 1.mp4".to_string()
            })
        );
    }

    #[test]
    fn parses_local_reference() {
        assert_eq!(
            AssetLocation::parse("/uploads/video-1.mp4"),
            Ok(AssetLocation::Local {
                path: "/uploads/video-1.mp4".to_string()
            })
        );
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(matches!(
            AssetLocation::parse("ftp://example.com/video.mp4"),
            Err(ReferenceError::Unrecognized(_))
        ));
        assert!(matches!(
            AssetLocation::parse("https://media.s3.amazonaws.com/%FF%FE"),
            Err(ReferenceError::Encoding(_))
        ));
    }

    #[test]
    fn object_url_round_trips_through_parse() {
        let key = "users/7c1e-1700000000000-my photo (1).png";
        let url = object_url("media", "eu-west-1", key);

        assert!(url.starts_with("https://media.s3.eu-west-1.amazonaws.com/users/7c1e-"));
        assert_eq!(
            AssetLocation::parse(&url),
            Ok(AssetLocation::ObjectStore { key: key.to_string() })
        );
    }
}
