use anyhow::Context;
use base64ct::{Base64, Encoding};

/// Decodes a Basic credential into `(email, password)`, splitting on the first colon.
///
/// Either part may come back empty; callers decide whether that is acceptable.
pub fn decode_basic(token: &str) -> anyhow::Result<(String, String)> {
    let bytes = Base64::decode_vec(token.trim()).map_err(|e| anyhow::anyhow!("invalid base64: {}", e))?;
    let decoded = String::from_utf8(bytes).context("basic credential is not utf-8")?;
    let (email, password) = decoded.split_once(':').unwrap_or((decoded.as_str(), ""));
    Ok((email.to_string(), password.to_string()))
}

#[cfg(test)]
pub(crate) fn encode_basic(email: &str, password: &str) -> String {
    Base64::encode_string(format!("{}:{}", email, password).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_colon() {
        let token = encode_basic("user@example.com", "pa:ss:word");
        let (email, password) = decode_basic(&token).unwrap();
        assert_eq!(email, "user@example.com");
        assert_eq!(password, "pa:ss:word");
    }

    #[test]
    fn missing_colon_yields_empty_password() {
        let token = Base64::encode_string(b"only-an-email");
        let (email, password) = decode_basic(&token).unwrap();
        assert_eq!(email, "only-an-email");
        assert!(password.is_empty());
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_basic("%%%not base64%%%").is_err());
    }
}
