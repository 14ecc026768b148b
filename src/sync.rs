//! Abstracts over sync primitive implementations.
//!
//! Optionally, we allow the Rust standard library's `Mutex` to be replaced
//! with the `parking_lot` crate's implementation. This may provide improved
//! performance in some cases. However, the `parking_lot` dependency is an
//! opt-in feature flag. Because `parking_lot::Mutex` has a slightly
//! different API than `std::sync::Mutex` (it does not support poisoning on
//! panics), we wrap the `std::sync` version to ignore poisoning.

#[cfg(feature = "parking_lot")]
pub(crate) use parking_lot::{Mutex, MutexGuard};

#[cfg(not(feature = "parking_lot"))]
pub(crate) use self::std_impl::*;

#[cfg(not(feature = "parking_lot"))]
mod std_impl {
    use std::sync::{self, PoisonError};
    pub(crate) use std::sync::MutexGuard;

    #[derive(Debug)]
    pub(crate) struct Mutex<T> {
        inner: sync::Mutex<T>,
    }

    impl<T> Mutex<T> {
        pub(crate) fn new(val: T) -> Self {
            Self {
                inner: sync::Mutex::new(val),
            }
        }

        #[inline]
        pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}
