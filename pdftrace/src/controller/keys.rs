//! Keystroke input
//!
//! The pause point of the whole engine: [`wait_for_key`] blocks on one byte
//! from a [`KeySource`] and, if that byte opens a function-key sequence,
//! reads the rest of it to update the sticky [`KeyPolicy`].
//!
//! Recognised sequences:
//! - Linux console: `ESC [ [ C` (F3), `ESC [ [ D` (F4)
//! - xterm and friends: `ESC O R` (F3), `ESC O S` (F4)

use std::collections::VecDeque;
use std::io;

use log::debug;

use crate::interpose::FileOps;

const ESC: u8 = 0x1b;

/// Source of single input bytes.
///
/// `Ok(None)` means end of input.
pub trait KeySource {
    /// Block until one byte is available
    ///
    /// # Errors
    /// Returns the underlying read error
    fn next_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Sticky choice between pausing on every read and pausing on record change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPolicy {
    pub stop_on_every_read: bool,
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self { stop_on_every_read: true }
    }
}

/// Function keys that change the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKey {
    F3,
    F4,
}

impl FunctionKey {
    /// Apply this key to the sticky policy
    pub fn apply(self, policy: &mut KeyPolicy) {
        policy.stop_on_every_read = matches!(self, FunctionKey::F3);
    }
}

/// Block for one keystroke, decoding F3/F4 if present.
///
/// Any other key, an unknown sequence, end of input or a read error simply
/// dismisses the pause.
pub fn wait_for_key<K: KeySource + ?Sized>(keys: &mut K, policy: &mut KeyPolicy) -> Option<FunctionKey> {
    let key = match read_function_key(keys) {
        Ok(key) => key,
        Err(e) => {
            debug!("Key input failed: {e}");
            None
        }
    };
    if let Some(key) = key {
        key.apply(policy);
        debug!("{key:?} pressed, stop on every read: {}", policy.stop_on_every_read);
    }
    key
}

fn read_function_key<K: KeySource + ?Sized>(keys: &mut K) -> io::Result<Option<FunctionKey>> {
    if keys.next_byte()? != Some(ESC) {
        return Ok(None);
    }
    let key = match keys.next_byte()? {
        Some(b'[') => {
            if keys.next_byte()? != Some(b'[') {
                return Ok(None);
            }
            match keys.next_byte()? {
                Some(b'C') => Some(FunctionKey::F3),
                Some(b'D') => Some(FunctionKey::F4),
                _ => None,
            }
        }
        Some(b'O') => match keys.next_byte()? {
            Some(b'R') => Some(FunctionKey::F3),
            Some(b'S') => Some(FunctionKey::F4),
            _ => None,
        },
        _ => None,
    };
    Ok(key)
}

/// Reads keystrokes from standard input through the original `read`.
///
/// Going through [`FileOps`] rather than `std::io::stdin` keeps the read
/// from re-entering the interposed `read` of this very library.
pub struct StdinKeys<O: FileOps> {
    ops: O,
}

impl<O: FileOps> StdinKeys<O> {
    pub fn new(ops: O) -> Self {
        Self { ops }
    }
}

impl<O: FileOps> KeySource for StdinKeys<O> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        loop {
            // SAFETY: `byte` is a valid, writable one-byte buffer
            #[allow(unsafe_code)]
            let n = unsafe { self.ops.read(libc::STDIN_FILENO, std::ptr::addr_of_mut!(byte).cast(), 1) };
            match n {
                1 => return Ok(Some(byte)),
                0 => return Ok(None),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() != io::ErrorKind::Interrupted {
                        return Err(err);
                    }
                }
            }
        }
    }
}

/// Scripted key source for tests and non-interactive replays.
///
/// Yields the queued bytes in order, then end of input.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    bytes: VecDeque<u8>,
}

impl ScriptedKeys {
    pub fn new(bytes: &[u8]) -> Self {
        Self { bytes: bytes.iter().copied().collect() }
    }

    /// Bytes not consumed yet
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl KeySource for ScriptedKeys {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.bytes.pop_front())
    }
}
