//! Ripple synchronization mechanisms.
//!
//! Serialized event delivery is ordering-sensitive and its critical sections
//! are short - one callback invocation - so the lock backing it is a
//! purpose-built spinlock rather than a parked OS mutex. Contending
//! producers back off for a randomized, exponentially growing number of spin
//! cycles between acquisition attempts.
pub mod spinlock;
