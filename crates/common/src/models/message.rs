/// One raw record handed over by the stream collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl StreamMessage {
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    pub fn key_lossy(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }

    pub fn value_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}
