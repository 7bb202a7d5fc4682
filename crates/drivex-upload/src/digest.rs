use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::Bytes;
use drivex_store::ByteStream;
use futures::{Stream, StreamExt};

struct DigestState {
    context: md5::Context,
    bytes: u64,
}

/// Read side of a [`DigestStream`].
///
/// Stays valid after the stream itself has been handed to the store.
#[derive(Clone)]
pub struct DigestHandle {
    state: Arc<Mutex<DigestState>>,
}

impl DigestHandle {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DigestState {
                context: md5::Context::new(),
                bytes: 0,
            })),
        }
    }

    /// Lowercase hex MD5 of the bytes seen so far.
    pub fn hex(&self) -> String {
        let state = self.state.lock().expect("lock poisoned");
        format!("{:x}", state.context.clone().compute())
    }

    /// Number of bytes seen so far.
    pub fn bytes(&self) -> u64 {
        self.state.lock().expect("lock poisoned").bytes
    }
}

impl fmt::Debug for DigestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestHandle")
            .field("bytes", &self.bytes())
            .finish()
    }
}

/// Passes a byte stream through unchanged while feeding every chunk, once
/// and in order, into an MD5 context.
pub struct DigestStream {
    inner: ByteStream,
    handle: DigestHandle,
}

impl DigestStream {
    pub fn new(inner: ByteStream) -> (Self, DigestHandle) {
        let handle = DigestHandle::new();
        let stream = Self {
            inner,
            handle: handle.clone(),
        };
        (stream, handle)
    }

    pub fn boxed(self) -> ByteStream {
        Box::pin(self)
    }
}

impl Stream for DigestStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = self.inner.poll_next_unpin(cx);
        if let Poll::Ready(Some(Ok(chunk))) = &polled {
            let mut state = self.handle.state.lock().expect("lock poisoned");
            state.context.consume(chunk);
            state.bytes += chunk.len() as u64;
        }
        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
