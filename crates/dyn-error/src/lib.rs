use std::{error::Error, fmt};

/// A boxed error used as the `source` of the typed errors in this workspace.
///
/// `DynError` is transparent: it displays as the wrapped error and reports the
/// wrapped error's own source, so error chains do not print the same message
/// twice.
pub struct DynError(Box<dyn Error + Send + Sync + 'static>);

impl DynError {
	pub fn new<E: Error + Send + Sync + 'static>(error: E) -> Self {
		Self(Box::new(error))
	}
}

impl fmt::Debug for DynError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

impl fmt::Display for DynError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&*self.0, f)
	}
}

impl Error for DynError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		self.0.source()
	}
}
