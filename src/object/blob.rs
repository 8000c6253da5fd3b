//! blobs: opaque byte strings. encode/decode are the identity function.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.data.clone()
    }

    pub fn deserialize(payload: &[u8]) -> Self {
        Self {
            data: payload.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_is_identity() {
        let blob = Blob::new(b"hello\n".to_vec());
        assert_eq!(blob.serialize(), b"hello\n");
    }

    #[test]
    fn deserialize_is_identity() {
        let blob = Blob::deserialize(b"hello\n");
        assert_eq!(blob.data, b"hello\n");
    }

    #[test]
    fn round_trips_arbitrary_bytes() {
        let raw = vec![0u8, 255, 1, 2, 3, 0, 10, 13];
        let blob = Blob::new(raw.clone());
        assert_eq!(Blob::deserialize(&blob.serialize()).data, raw);
    }
}
