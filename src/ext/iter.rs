//! Extensions to iterators.

use error_stack::Report;

use super::{error_stack::merge_error_stacks, result::FlipResult};

/// Implement `alternative`
pub trait AlternativeIter<T, E> {
    /// Given an iterator over `Result<T, Report<E>>`,
    /// serially fold over multiple fallible operation results, combining their errors into
    /// the final error stack and returning the result of the first successful operation.
    /// If none were successful, `Err` contains the stacked errors from all attempts.
    ///
    /// Returns `None` if the iterator was empty.
    fn alternative_fold(self) -> Option<Result<T, Report<E>>>;
}

impl<I: Iterator<Item = Result<T, Report<E>>>, T, E> AlternativeIter<T, E> for I {
    fn alternative_fold(self) -> Option<Result<T, Report<E>>> {
        // `try_fold` early exits on error; meanwhile we want to early exit on success.
        // Flip each `Result<T, E>` into `Result<E, T>`, fold the errors together,
        // then flip the final value back.
        let folded = self
            .map(|result| result.flip())
            .try_fold(None::<Report<E>>, |stack, operation| {
                operation.map(|err| match stack {
                    Some(stack) => Some(merge_error_stacks!(stack, err)),
                    None => Some(err),
                })
            });

        match folded {
            Ok(Some(stack)) => Some(Err(stack)),
            Ok(None) => None,
            Err(success) => Some(Ok(success)),
        }
    }
}
