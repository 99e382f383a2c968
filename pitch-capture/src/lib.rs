//! # pitch-capture
//!
//! A `no_std`, zero-allocation acquisition core for an embedded pitch-to-MIDI
//! converter. A free-running ADC fills fixed-size blocks through DMA; this
//! crate hands each completed block to a pitch detector exactly once, in
//! order, and forwards the resulting note events to a MIDI transport.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Hardware | [`sampler`] | `SamplerEngine` trait, transfer descriptors |
//! | Memory | [`capture`] | Ping-pong raw capture buffers and swap protocol |
//! | DSP | [`dsp`] | Q16.16 samples and raw-to-fixed conversion |
//! | Detection | [`detector`] / [`midi`] | Detector adapter, note events |
//! | Output | [`forward`] | Transport writes and the note indicator pin |
//! | Loop | [`pipeline`] | The primary acquisition cycle |
//! | Debug | [`debug_log`] | Double-buffered sample log for a second core (feature-gated) |
//! | Setup | [`config`] / [`error`] | Startup configuration and its validation |
//!
//! ## Data flow
//!
//! ```text
//!  ADC ──DMA──► slot A ┐                  ┌─► detector ─► USB-MIDI + LED
//!              slot B ┴─► SampleConverter ┤
//!                                          └─► DebugCaptureLog ─► core 1 ─► UART
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `debug-capture` | yes | [`debug_log`] and `Pipeline::with_debug_log` |
//!
//! ## Audio parameters
//!
//! - **Block size:** 32 samples ([`constants::CAPTURE_DEPTH`])
//! - **Sample rate:** ~10 kHz (48 MHz / 4801)
//! - **Sample format:** 12-bit unsigned in, Q16.16 signed out
//! - **Debug log:** 2048 samples per block ([`constants::LOG_DEPTH`])

#![no_std]

#[cfg(test)]
extern crate std;

pub mod constants;
pub mod error;
pub mod config;
pub mod sampler;
pub mod capture;
pub mod dsp;
pub mod midi;
pub mod detector;
pub mod forward;
pub mod pipeline;

#[cfg(feature = "debug-capture")]
pub mod debug_log;

#[cfg(test)]
mod testing;

pub use capture::{CaptureBufferPair, CaptureStorage, ReadyBlock};
pub use config::PipelineConfig;
pub use forward::MirroredPin;
pub use error::ConfigError;
pub use pipeline::{Pipeline, PipelineStats};
