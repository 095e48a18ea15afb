use rand::RngCore;

/// A freshly minted reconnect token, returned to the client as plaintext
/// exactly once; only its hash is retained server-side, the same way the
/// identity store never keeps a recoverable copy of a credential.
pub struct ReconnectToken {
    pub plaintext: String,
    pub hash: Vec<u8>,
}

/// Mints a random 32-byte token, hex-encoded for transport, alongside the
/// SHA-256 digest that gets stored and compared against on the next
/// `identify`.
pub fn issue() -> ReconnectToken {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let plaintext = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
    ReconnectToken {
        hash: hash(&plaintext),
        plaintext,
    }
}

pub fn hash(token: &str) -> Vec<u8> {
    use sha2::Digest;
    sha2::Sha256::digest(token.as_bytes()).to_vec()
}
