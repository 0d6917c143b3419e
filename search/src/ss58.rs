//! SS58 address decoding.
//!
//! The squid stores accounts as raw public-key hex, so filters on an
//! SS58-encoded address decode it before emission.

use error_stack::{Result, ResultExt};

/// Domain prefix mixed into the SS58 checksum.
const CHECKSUM_PREFIX: &[u8] = b"SS58PRE";

const PUBLIC_KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 2;

#[derive(Debug)]
pub enum Ss58DecodeError {
    InvalidEncoding,
    InvalidLength,
    InvalidChecksum,
    UnsupportedFormat,
}

impl error_stack::Context for Ss58DecodeError {}

impl std::fmt::Display for Ss58DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ss58DecodeError::InvalidEncoding => write!(f, "address is not valid base58"),
            Ss58DecodeError::InvalidLength => write!(f, "address payload has the wrong length"),
            Ss58DecodeError::InvalidChecksum => write!(f, "address checksum mismatch"),
            Ss58DecodeError::UnsupportedFormat => write!(f, "unsupported address format"),
        }
    }
}

/// Decode an SS58 address into its raw public-key hex form, without a `0x`
/// prefix.
///
/// The checksum is verified before the network prefix is stripped.
pub fn ss58_decode(address: &str) -> Result<String, Ss58DecodeError> {
    let data = bs58::decode(address)
        .into_vec()
        .change_context(Ss58DecodeError::InvalidEncoding)
        .attach_printable_lazy(|| format!("address: {address}"))?;

    // One or two bytes of network prefix, depending on the first byte.
    let prefix_len = match data.first().copied() {
        Some(0..=63) => 1,
        Some(64..=127) => 2,
        Some(_) => {
            return Err(Ss58DecodeError::UnsupportedFormat)
                .attach_printable_lazy(|| format!("address: {address}"))
        }
        None => {
            return Err(Ss58DecodeError::InvalidLength)
                .attach_printable_lazy(|| format!("address: {address}"))
        }
    };

    if data.len() != prefix_len + PUBLIC_KEY_LEN + CHECKSUM_LEN {
        return Err(Ss58DecodeError::InvalidLength)
            .attach_printable_lazy(|| format!("address: {address}"))
            .attach_printable_lazy(|| format!("payload length: {}", data.len()));
    }

    let body_len = data.len() - CHECKSUM_LEN;

    let mut state = blake2b_simd::State::new();
    state.update(CHECKSUM_PREFIX);
    state.update(&data[..body_len]);
    let hash = state.finalize();

    if hash.as_bytes()[..CHECKSUM_LEN] != data[body_len..] {
        return Err(Ss58DecodeError::InvalidChecksum)
            .attach_printable_lazy(|| format!("address: {address}"));
    }

    Ok(hex::encode(&data[prefix_len..body_len]))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::{ss58_decode, Ss58DecodeError};

    #[test]
    pub fn test_decode_substrate_address() {
        // Well-known development account.
        let decoded = ss58_decode("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY").unwrap();
        assert_eq!(
            decoded,
            "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d"
        );
    }

    #[test]
    pub fn test_decode_rejects_bad_checksum() {
        // Same address with the last character changed.
        let result = ss58_decode("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQX");
        let report = result.unwrap_err();
        assert_matches!(report.current_context(), Ss58DecodeError::InvalidChecksum);
    }

    #[test]
    pub fn test_decode_rejects_non_base58() {
        let result = ss58_decode("not an address");
        let report = result.unwrap_err();
        assert_matches!(report.current_context(), Ss58DecodeError::InvalidEncoding);
    }

    #[test]
    pub fn test_decode_rejects_short_payload() {
        // Decodes to a single zero byte.
        let result = ss58_decode("1");
        let report = result.unwrap_err();
        assert_matches!(report.current_context(), Ss58DecodeError::InvalidLength);
    }
}
