use std::fmt;

/// A unit of work that can be scheduled
///
/// `run` is synchronous and may block; the runner executes it on the blocking
/// thread pool. A panic inside `run` is caught and logged, it never reaches
/// the caller or other jobs.
///
/// # Example
///
/// ```rust
/// use jobrunner_runtime::Runnable;
///
/// struct SendDigest {
///     recipients: Vec<String>,
/// }
///
/// impl Runnable for SendDigest {
///     fn run(&self) {
///         for r in &self.recipients {
///             println!("sending digest to {}", r);
///         }
///     }
///
///     fn name(&self) -> Option<&str> {
///         Some("SendDigest")
///     }
/// }
/// ```
pub trait Runnable: Send + Sync {
    /// Execute the job body
    fn run(&self);

    /// Display name used when the caller does not supply one
    fn name(&self) -> Option<&str> {
        None
    }
}

/// Adapter turning a plain closure or function into a [`Runnable`]
///
/// A `Func` has no inherent name; unless the caller passes one it shows up as
/// [`UNNAMED`](crate::UNNAMED).
pub struct Func<F>(F);

impl<F> Func<F>
where
    F: Fn() + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Func(f)
    }
}

impl<F> Runnable for Func<F>
where
    F: Fn() + Send + Sync + 'static,
{
    fn run(&self) {
        (self.0)()
    }
}

impl<F> fmt::Debug for Func<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Func")
    }
}
