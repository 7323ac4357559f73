use rand::distributions::Alphanumeric;
use rand::Rng;

/// Random alphanumeric API key of `length` characters, drawn from the OS RNG.
pub(crate) fn generate_key(length: usize) -> String {
    rand::rngs::OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::generate_key;

    #[test]
    fn key_has_requested_length_and_alphabet() {
        let key = generate_key(50);
        assert_eq!(key.len(), 50);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn keys_differ() {
        assert_ne!(generate_key(32), generate_key(32));
    }
}
