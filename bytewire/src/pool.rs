/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Thread-local pools of reusable [`ByteWriter`] buffers.
//!
//! Nested-record and nested-sequence encoding (see [`crate::record`]) needs a scratch
//! buffer per recursion level so it can measure an embedded payload's exact length before
//! copying it into the parent buffer. Pulling that scratch buffer from a pool instead of
//! allocating it fresh on every call is what keeps deeply nested records from dominating an
//! encode call with allocator traffic. Buffers are acquired and released in stack
//! discipline: a frame acquires one on entry and returns it on exit, so a single
//! thread-local stack is enough to serve arbitrarily nested calls without contention.

use std::cell::RefCell;

use crate::writer::ByteWriter;

const POOL_CAPACITY: usize = 16;

struct Pool {
    stack: RefCell<Vec<ByteWriter>>,
}

impl Pool {
    fn new() -> Self {
        Self {
            stack: RefCell::new(Vec::with_capacity(POOL_CAPACITY)),
        }
    }

    fn acquire(&self) -> ByteWriter {
        self.stack.borrow_mut().pop().unwrap_or_default()
    }

    fn release(&self, mut w: ByteWriter) {
        w.reset(0);
        let mut stack = self.stack.borrow_mut();
        if stack.len() < POOL_CAPACITY {
            stack.push(w);
        }
    }
}

thread_local! {
    static WRITER_POOL: Pool = Pool::new();
}

pub fn acquire_writer() -> ByteWriter {
    WRITER_POOL.with(Pool::acquire)
}

pub fn release_writer(w: ByteWriter) {
    WRITER_POOL.with(|p| p.release(w));
}

/// An RAII handle on a pooled [`ByteWriter`]. Dropping it returns the buffer to the
/// thread-local pool; callers that need the encoded bytes past that point must copy them
/// out first (see [`ByteWriter::to_vec`]).
pub struct PooledWriter {
    inner: Option<ByteWriter>,
}

impl PooledWriter {
    pub fn acquire() -> Self {
        Self {
            inner: Some(acquire_writer()),
        }
    }
}

impl std::ops::Deref for PooledWriter {
    type Target = ByteWriter;
    fn deref(&self) -> &ByteWriter {
        self.inner.as_ref().expect("PooledWriter used after drop")
    }
}

impl std::ops::DerefMut for PooledWriter {
    fn deref_mut(&mut self) -> &mut ByteWriter {
        self.inner.as_mut().expect("PooledWriter used after drop")
    }
}

impl Drop for PooledWriter {
    fn drop(&mut self) {
        if let Some(w) = self.inner.take() {
            release_writer(w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_buffer_is_reused() {
        let mut w = acquire_writer();
        w.write_u8(1);
        let cap = w.as_slice().len();
        assert_eq!(cap, 1);
        release_writer(w);
        let w2 = acquire_writer();
        assert_eq!(w2.position(), 0);
    }

    #[test]
    fn pooled_writer_releases_on_drop() {
        {
            let mut guard = PooledWriter::acquire();
            guard.write_u8(9);
        }
        let w = acquire_writer();
        assert_eq!(w.position(), 0);
    }
}
