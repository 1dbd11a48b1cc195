use zeroize::Zeroize;

use crate::cipher::{Cipher, CipherBackend};
use crate::header::FrameContext;
use crate::types::{Processing, Task, TaskResult};

/// Per-chunk sealing and opening.
pub struct Pipeline {
    cipher: Cipher,
    frames: FrameContext,
    mode: Processing,
}

impl Pipeline {
    pub fn new(cipher: Cipher, frames: FrameContext, mode: Processing) -> Self {
        Self { cipher, frames, mode }
    }

    pub fn process(&self, task: Task) -> TaskResult {
        match self.mode {
            Processing::Encryption => self.encrypt_chunk(task),
            Processing::Decryption => self.decrypt_chunk(&task),
        }
    }

    fn encrypt_chunk(&self, mut task: Task) -> TaskResult {
        let nonce = self.frames.nonce(task.index);
        let aad = self.frames.associated_data(task.index, task.last);
        let size = task.data.len();

        let result = match self.cipher.encrypt_chunk(&nonce, &aad, &task.data) {
            Ok(sealed) => TaskResult::ok(&task, sealed, size),
            Err(e) => TaskResult::err(&task, e),
        };

        task.data.zeroize();
        result
    }

    fn decrypt_chunk(&self, task: &Task) -> TaskResult {
        let nonce = self.frames.nonce(task.index);
        let aad = self.frames.associated_data(task.index, task.last);

        match self.cipher.decrypt_chunk(&nonce, &aad, &task.data) {
            Ok(plaintext) => {
                let size = plaintext.len();
                TaskResult::ok(task, plaintext, size)
            }
            Err(e) => TaskResult::err(task, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::Algorithm;
    use crate::config::{NONCE_SIZE, TAG_SIZE};
    use crate::error::Error;
    use crate::secret::SecretBytes;

    fn pipeline(mode: Processing) -> Pipeline {
        let cipher = Cipher::new(Algorithm::ChaCha20Poly1305, &SecretBytes::from_vec(vec![4; 32])).unwrap();
        Pipeline::new(cipher, FrameContext::new(vec![0; NONCE_SIZE], b"header"), mode)
    }

    #[test]
    fn test_chunk_roundtrip() {
        let sealed = pipeline(Processing::Encryption).process(Task { data: b"chunk".to_vec(), index: 3, last: true });
        assert!(sealed.error.is_none());
        assert_eq!(sealed.size, 5);
        assert_eq!(sealed.data.len(), 5 + TAG_SIZE);

        let opened = pipeline(Processing::Decryption).process(Task { data: sealed.data, index: 3, last: true });
        assert!(opened.error.is_none());
        assert_eq!(opened.data, b"chunk");
        assert_eq!(opened.size, 5);
    }

    #[test]
    fn test_position_is_authenticated() {
        let sealed = pipeline(Processing::Encryption).process(Task { data: b"chunk".to_vec(), index: 0, last: false });

        let moved = pipeline(Processing::Decryption).process(Task { data: sealed.data.clone(), index: 1, last: false });
        assert!(matches!(moved.error, Some(Error::AuthenticationFailed)));

        let flipped = pipeline(Processing::Decryption).process(Task { data: sealed.data, index: 0, last: true });
        assert!(matches!(flipped.error, Some(Error::AuthenticationFailed)));
    }
}
