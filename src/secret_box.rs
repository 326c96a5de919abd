use alloc::boxed::Box;
use core::fmt;

use zeroize::Zeroize;

/// A container for secret data.
/// Makes the usage of secret data explicit and easy to track,
/// prevents the data from being copied around on moves,
/// and zeroizes it when the container goes out of scope
/// (including early returns and unwinding).
pub struct SecretBox<T>(Box<T>)
where
    T: Zeroize;

impl<T> SecretBox<T>
where
    T: Zeroize,
{
    /// Wraps a value.
    pub fn new(val: T) -> Self {
        Self(Box::new(val))
    }

    /// Returns an immutable reference to the secret data.
    pub fn as_secret(&self) -> &T {
        self.0.as_ref()
    }

    /// Returns a mutable reference to the secret data.
    pub fn as_mut_secret(&mut self) -> &mut T {
        self.0.as_mut()
    }
}

impl<T> Clone for SecretBox<T>
where
    T: Zeroize + Clone,
{
    fn clone(&self) -> Self {
        Self::new(self.as_secret().clone())
    }
}

impl<T> fmt::Debug for SecretBox<T>
where
    T: Zeroize,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBox(...)")
    }
}

impl<T> Drop for SecretBox<T>
where
    T: Zeroize,
{
    fn drop(&mut self) {
        self.0.zeroize()
    }
}
