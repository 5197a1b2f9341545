use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Value sent in the `sign_method` header.
pub const SIGN_METHOD: &str = "HMAC-SHA256";

/// The parts of a request that the signature binds.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    /// Either empty or starting with `?`.
    pub query: &'a str,
    /// Exact bytes sent on the wire; empty when there is no body.
    pub body: &'a [u8],
}

impl CanonicalRequest<'_> {
    /// `method \n sha256(body) \n <headers, always empty> \n path+query`
    pub fn string_to_sign(&self) -> String {
        format!(
            "{}\n{}\n\n{}{}",
            self.method,
            sha256_hex(self.body),
            self.path,
            self.query
        )
    }
}

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compute the request signature.
///
/// The signed message is `client_id + access_token? + timestamp + string_to_sign`,
/// keyed with the client secret, hex encoded in uppercase. Pure function of its
/// inputs; the caller supplies the timestamp.
pub fn sign(
    request: &CanonicalRequest<'_>,
    timestamp_millis: i64,
    client_id: &str,
    secret: &str,
    access_token: Option<&str>,
) -> String {
    let sign_base = format!(
        "{}{}{}{}",
        client_id,
        access_token.unwrap_or_default(),
        timestamp_millis,
        request.string_to_sign()
    );

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(sign_base.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}
