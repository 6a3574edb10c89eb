//! Sensitivity modulation: novelty bursts and learning-rate amplification.
//!
//! External novelty detection publishes [`LrBurst`] events on the
//! [`SensitivityEventBus`]; the [`LearningRateModulator`] subscribes and
//! folds each burst into per-tag amplification coefficients. The factor it
//! reports multiplies whatever the learning-rate policy produced before a
//! signal is dispatched, and decays back toward 1 on its own as the burst
//! half-life elapses.

mod burst;
mod bus;
mod modulator;

pub use burst::{LrBurst, ACTIVE_AMPLIFICATION_FLOOR, DEFAULT_AMPLIFICATION, DEFAULT_HALF_LIFE};
pub use bus::{BurstSubscriber, SensitivityEventBus};
pub use modulator::{LearningRateModulator, TagCoefficient};
