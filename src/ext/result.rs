//! Extensions to `Result`.

/// Flip `Result<T, E>` to `Result<E, T>`.
pub trait FlipResult<T, E> {
    /// Flip `Result<T, E>` to `Result<E, T>`.
    fn flip(self) -> Result<E, T>;
}

impl<T, E> FlipResult<T, E> for Result<T, E> {
    fn flip(self) -> Result<E, T> {
        match self {
            Ok(t) => Err(t),
            Err(e) => Ok(e),
        }
    }
}

/// Wrap anything into `Ok`.
/// This is especially useful when performing long chains or when otherwise wrapping
/// would result in many nested parenthesis (which can be hard to read).
///
/// ```
/// # use packer_teamcity::ext::result::WrapOk;
/// # enum Error {}
/// fn some_fallible_function(input: &str) -> Result<String, Error> {
///   input.trim_end_matches('/').to_string().wrap_ok()
/// }
/// ```
pub trait WrapOk<T, E> {
    /// Wrap self in an `Ok`, returning the `Ok` variant
    /// of a result inferred by the destination type.
    fn wrap_ok(self) -> Result<T, E>;
}

impl<T, E> WrapOk<T, E> for T {
    fn wrap_ok(self) -> Result<T, E> {
        Ok(self)
    }
}
