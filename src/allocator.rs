//! Global allocator for the command-line binary.
//!
//! Chunk buffers are allocated and freed at a high rate from many threads;
//! mimalloc handles that pattern better than the system allocator.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
