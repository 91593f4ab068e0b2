//! Transport module - pluggable replay transmission.
//!
//! The replay engine never touches a socket itself. It hands each attempt to
//! a [`Transport`], which reports whether the frame was accepted:
//! - [`ScriptedTransport`]: deterministic outcome sequence (tests, dry runs)
//! - [`LossyTransport`]: seeded pseudo-random acceptance at a fixed rate
//! - [`FnTransport`]: any closure

mod lossy;
mod scripted;

pub use lossy::{LossyTransport, DEFAULT_SUCCESS_PERCENT};
pub use scripted::ScriptedTransport;

/// Transmission capability used by the replay engine.
pub trait Transport {
    /// Attempt to transmit one frame. Returns `true` if it was accepted.
    fn send(&mut self, frame: &[u8]) -> bool;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &[u8]) -> bool {
        (**self).send(frame)
    }
}

/// Transport backed by a closure.
pub struct FnTransport<F> {
    f: F,
}

/// Wrap a closure as a [`Transport`].
///
/// # Example
///
/// ```
/// use packet_monitor::transport::{from_fn, Transport};
///
/// let mut transport = from_fn(|frame: &[u8]| frame.len() < 100);
/// assert!(transport.send(b"short"));
/// ```
pub fn from_fn<F>(f: F) -> FnTransport<F>
where
    F: FnMut(&[u8]) -> bool,
{
    FnTransport { f }
}

impl<F> Transport for FnTransport<F>
where
    F: FnMut(&[u8]) -> bool,
{
    fn send(&mut self, frame: &[u8]) -> bool {
        (self.f)(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_transport() {
        let mut calls = 0;
        {
            let mut transport = from_fn(|_: &[u8]| {
                calls += 1;
                calls % 2 == 0
            });
            assert!(!transport.send(b"a"));
            assert!(transport.send(b"b"));
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_boxed_transport() {
        let mut boxed: Box<dyn Transport + Send> = Box::new(ScriptedTransport::new([false, true]));
        assert!(!boxed.send(b"x"));
        assert!(boxed.send(b"x"));
    }
}
