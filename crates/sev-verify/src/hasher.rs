use digest::Digest;

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

pub struct Sha1Hasher(sha1::Sha1);

impl Hasher for Sha1Hasher {
    fn update(&mut self, data: &[u8]) { Digest::update(&mut self.0, data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Sha1Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha1Hasher {
    pub fn new() -> Self { Self(sha1::Sha1::new()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_hasher() {
        let mut hasher = Sha1Hasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(
            hex::encode(hasher.finalize()),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
    }

    #[test]
    fn one_shot_digest_matches_streaming() {
        let mut hasher = Sha1Hasher::new();
        hasher.update(b"a");
        hasher.update(b"bc");
        assert_eq!(hasher.finalize(), sha1::Sha1::digest(b"abc").to_vec());
    }
}
